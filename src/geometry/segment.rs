use std::iter::FusedIterator;

use super::Point;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Segment<T> {
    pub start: Point<T>,
    pub end: Point<T>,
}

impl<T> Segment<T> {
    pub fn new(start: Point<T>, end: Point<T>) -> Self {
        Self { start, end }
    }
}

impl Segment<i64> {
    /// Ordered grid cells crossed by the chord, both endpoints included.
    /// The walk follows the major axis; the minor coordinate advances on a
    /// `2·dy - dx` error accumulator, yielding a connected 8-neighbourhood
    /// path of exactly `max(|dx|, |dy|) + 1` cells.
    pub fn points_between(&self) -> Trace {
        Trace::new(*self)
    }
}

pub struct Trace {
    origin: Point<i64>,
    major: Point<i64>,
    minor: Point<i64>,
    dx: i64,
    dy: i64,
    d: i64,
    taken: i64,
    shifted: i64,
}

impl Trace {
    fn new(segment: Segment<i64>) -> Self {
        let delta = segment.end - segment.start;
        // A zero delta steps negative.
        let xsign = if delta.x > 0 { 1 } else { -1 };
        let ysign = if delta.y > 0 { 1 } else { -1 };
        let (mut dx, mut dy) = (delta.x.abs(), delta.y.abs());
        let (major, minor) = if dx > dy {
            (Point { x: xsign, y: 0 }, Point { x: 0, y: ysign })
        } else {
            core::mem::swap(&mut dx, &mut dy);
            (Point { x: 0, y: ysign }, Point { x: xsign, y: 0 })
        };
        Self {
            origin: segment.start,
            major,
            minor,
            dx,
            dy,
            d: 2 * dy - dx,
            taken: 0,
            shifted: 0,
        }
    }
}

impl Iterator for Trace {
    type Item = Point<i64>;

    fn next(&mut self) -> Option<Point<i64>> {
        if self.taken > self.dx {
            return None;
        }
        let point = self.origin + self.major * self.taken + self.minor * self.shifted;
        if self.d > 0 {
            self.shifted += 1;
            self.d -= self.dx;
        }
        self.d += self.dy;
        self.taken += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.dx + 1 - self.taken) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Trace {}

impl FusedIterator for Trace {}
