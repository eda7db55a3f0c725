use serde::{Deserialize, Serialize};

/// Decay applied to each cell of a committed chord. Implementations must
/// never return a value greater than their input.
pub trait Darkness: Send + Sync {
    fn compute(&self, value: u32) -> u32;
}

/// Subtracts a fixed amount of darkness, clamped at zero.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FlatDarkness(pub u32);

impl Darkness for FlatDarkness {
    fn compute(&self, value: u32) -> u32 {
        value.saturating_sub(self.0)
    }
}
