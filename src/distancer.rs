use thiserror::Error;

/// Admits chords whose circular pin-index distance reaches the configured
/// minimum. A separation of at least 1 also rules out degenerate chords
/// between a pin and itself.
#[derive(Clone, Copy)]
pub struct PinDistancer {
    min: usize,
    count: usize,
}

impl PinDistancer {
    /// A separation larger than any achievable circular distance is
    /// accepted here; such a run exhausts its candidates on the first
    /// step instead of failing to start.
    pub fn new(count: usize, min_separation: usize) -> Result<Self, Error> {
        if min_separation == 0 {
            return Err(Error);
        }
        Ok(Self {
            min: min_separation,
            count,
        })
    }

    /// Circular distance between two pin indices: the shorter way around.
    pub fn distance(&self, a_idx: usize, b_idx: usize) -> usize {
        let diff = a_idx.abs_diff(b_idx);
        diff.min(self.count - diff)
    }

    pub fn is_valid(&self, a_idx: usize, b_idx: usize) -> bool {
        self.distance(a_idx, b_idx) >= self.min
    }
}

#[derive(Debug, Error)]
#[error("the minimum pin separation must be at least 1")]
pub struct Error;
