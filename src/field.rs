use image::GrayImage;
use thiserror::Error;

use crate::{darkness::Darkness, geometry::Point, Grid};

/// Upper bound for a cell intensity, one unit per grayscale step.
pub const MAX_DARKNESS: u32 = u8::MAX as u32;

/// Mutable grid of per-pixel darkness intensities. Cells stay within
/// `[0, MAX_DARKNESS]` for the whole run; decay only ever lowers them.
#[derive(Clone)]
pub struct DarknessField {
    cells: Vec<u32>,
    grid: Grid,
}

impl DarknessField {
    pub fn from_raw(cells: Vec<u32>, grid: Grid) -> Result<Self, Error> {
        if cells.len() != grid.len() {
            return Err(Error::SizeMismatch {
                expected: grid.len(),
                got: cells.len(),
            });
        }
        if let Some(&value) = cells.iter().find(|&&value| value > MAX_DARKNESS) {
            return Err(Error::IntensityOutOfRange(value));
        }
        Ok(Self { cells, grid })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Current darkness at `point`. The caller keeps points inside the
    /// grid; pin positions are validated once at startup.
    pub fn sample(&self, point: Point<i64>) -> u32 {
        self.cells[self.index(point)]
    }

    pub fn decay(&mut self, point: Point<i64>, darkness: &impl Darkness) {
        let idx = self.index(point);
        let value = self.cells[idx];
        self.cells[idx] = darkness.compute(value).min(value);
    }

    /// Total darkness along a rasterized chord, the score of a candidate.
    pub fn chord_darkness(&self, trace: impl Iterator<Item = Point<i64>>) -> u64 {
        trace.map(|point| self.sample(point) as u64).sum()
    }

    fn index(&self, point: Point<i64>) -> usize {
        debug_assert!(self.grid.contains(point));
        point.y as usize * self.grid.width + point.x as usize
    }
}

impl From<&GrayImage> for DarknessField {
    /// Inverts luma so darker pixels carry higher intensity.
    fn from(value: &GrayImage) -> Self {
        Self {
            cells: value
                .pixels()
                .map(|pixel| (u8::MAX - pixel.0[0]) as u32)
                .collect(),
            grid: Grid::new(value.height() as usize, value.width() as usize),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("the field expects {expected} cells but {got} were provided")]
    SizeMismatch { expected: usize, got: usize },
    #[error("cell intensity {0} exceeds the darkness ceiling")]
    IntensityOutOfRange(u32),
}

#[cfg(test)]
mod tests {
    use image::Luma;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;
    use crate::{darkness::FlatDarkness, geometry::Segment};

    fn field(cells: Vec<u32>, height: usize, width: usize) -> DarknessField {
        DarknessField::from_raw(cells, Grid::new(height, width)).unwrap()
    }

    #[test]
    fn rejects_a_mismatched_buffer() {
        assert!(matches!(
            DarknessField::from_raw(vec![0; 5], Grid::new(2, 3)),
            Err(Error::SizeMismatch {
                expected: 6,
                got: 5
            })
        ));
    }

    #[test]
    fn rejects_overbright_cells() {
        assert!(matches!(
            DarknessField::from_raw(vec![0, 300, 0, 0], Grid::new(2, 2)),
            Err(Error::IntensityOutOfRange(300))
        ));
    }

    #[test]
    fn decay_clamps_at_zero_and_never_raises() {
        let mut field = field(vec![200; 9], 3, 3);
        let mut rng = SmallRng::from_seed([7; 32]);
        let point = Point { x: 1, y: 1 };
        let mut previous = field.sample(point);
        for _ in 0..64 {
            field.decay(point, &FlatDarkness(rng.gen_range(5..90)));
            let value = field.sample(point);
            assert!(value <= previous);
            previous = value;
        }
        assert_eq!(field.sample(point), 0);
    }

    #[test]
    fn chord_darkness_sums_every_cell_of_the_trace() {
        let field = field((1..=9).collect(), 3, 3);
        let diagonal = Segment::new(Point { x: 0, y: 0 }, Point { x: 2, y: 2 });
        // Cells (0,0), (1,1) and (2,2) hold 1, 5 and 9.
        assert_eq!(field.chord_darkness(diagonal.points_between()), 15);
    }

    #[test]
    fn gray_images_convert_by_inverting_luma() {
        let mut image = GrayImage::new(2, 2);
        image.put_pixel(0, 0, Luma([0]));
        image.put_pixel(1, 1, Luma([255]));
        let field = DarknessField::from(&image);
        assert_eq!(field.sample(Point { x: 0, y: 0 }), MAX_DARKNESS);
        assert_eq!(field.sample(Point { x: 1, y: 1 }), 0);
        assert_eq!(*field.grid(), Grid::new(2, 2));
    }
}
