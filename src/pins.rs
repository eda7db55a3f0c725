use num_traits::AsPrimitive;
use thiserror::Error;

use crate::{
    geometry::Point,
    verboser::{Message, Verboser},
    Float, Grid,
};

/// Fixed table of pin positions; the indices are the stable identifiers
/// every other component works with.
#[derive(Clone)]
pub struct PinTable<T = f32> {
    pins: Vec<Point<T>>,
}

impl<T: Float> PinTable<T>
where
    usize: AsPrimitive<T>,
{
    /// `count` pins on a circle, pin `k` at angle `2π·k/count` from the
    /// positive x-axis, floored to grid-cell granularity. Consecutive
    /// indices trace the circle in rotational order.
    pub fn circular(
        center: Point<T>,
        radius: T,
        count: usize,
        verboser: &mut impl Verboser,
    ) -> Result<Self, Error> {
        if count < 2 {
            return Err(Error::TooFewPins(count));
        }
        Ok(Self {
            pins: (0..count)
                .map(|i| {
                    verboser.verbose(Message::CreatingPin(i));
                    let theta = T::TWO * T::PI * i.as_() / count.as_();
                    (center
                        + Point {
                            x: theta.cos(),
                            y: theta.sin(),
                        } * radius)
                        .floor()
                })
                .collect(),
        })
    }

    /// Circle inscribed in `grid`: centered, radius one cell short of the
    /// half-extent so every pin stays inside the field.
    pub fn inscribed(
        grid: Grid,
        count: usize,
        verboser: &mut impl Verboser,
    ) -> Result<Self, Error> {
        let extent: T = grid.width.min(grid.height).as_();
        Self::circular(
            Point {
                x: grid.width.as_(),
                y: grid.height.as_(),
            } * T::HALF,
            extent * T::HALF - T::ONE,
            count,
            verboser,
        )
    }
}

impl<T: Float> PinTable<T> {
    /// Arbitrary layout; positions are floored like circular pins.
    pub fn from_points(points: impl IntoIterator<Item = Point<T>>) -> Result<Self, Error> {
        let pins: Vec<_> = points.into_iter().map(|point| point.floor()).collect();
        if pins.len() < 2 {
            return Err(Error::TooFewPins(pins.len()));
        }
        Ok(Self { pins })
    }

    pub fn pins(&self) -> &[Point<T>] {
        &self.pins
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("a pin table needs at least 2 pins, got {0}")]
    TooFewPins(usize),
}
