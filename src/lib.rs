pub mod geometry {
    pub mod point;
    pub mod segment;

    pub use point::Point;
    pub use segment::{Segment, Trace};
}

mod algorithm;
pub mod darkness;
pub mod distancer;
pub mod field;
mod float;
pub mod grid;
pub mod pins;
mod used_pairs;
pub mod verboser;

pub use algorithm::*;
pub use darkness::{Darkness, FlatDarkness};
pub use field::DarknessField;
pub use float::Float;
pub use grid::Grid;
pub use pins::PinTable;
pub use used_pairs::UsedPairs;
