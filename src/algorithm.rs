use std::ops::Range;

use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    darkness::Darkness,
    distancer::{self, PinDistancer},
    field::DarknessField,
    geometry::{Point, Segment},
    pins::PinTable,
    used_pairs::UsedPairs,
    verboser::{Message, Verboser},
    Float,
};

/// Every run starts at this pin.
pub const START_PIN: usize = 0;

/// Scalar knobs of a run. The step budget is a fixed iteration count,
/// not a convergence criterion.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub min_separation: usize,
    pub step_count: usize,
}

/// Runs the greedy selection over `field`: from the current pin, string
/// the darkest unused and sufficiently separated chord, deplete the
/// darkness beneath it, advance, repeat for `step_count` steps.
pub fn compute<T: Float>(
    table: &PinTable<T>,
    field: DarknessField,
    darkness: impl Darkness,
    settings: Settings,
    verboser: &mut impl Verboser,
) -> Result<Pattern, Error> {
    Ok(Algorithm::new(table, field, darkness, settings.min_separation)?
        .compute(settings.step_count, verboser))
}

/// The ordered pin indices of a finished run, handed to an external
/// renderer together with the pin table that produced them.
pub struct Pattern {
    sequence: Vec<usize>,
    outcome: Outcome,
}

impl Pattern {
    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn into_sequence(self) -> Vec<usize> {
        self.sequence
    }
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Every step of the budget committed a chord.
    BudgetSpent,
    /// No admissible chord remained at `step`; the sequence accumulated
    /// up to that point is returned unchanged.
    Exhausted { step: usize },
}

struct Algorithm<D> {
    pins: Vec<Point<i64>>,
    field: DarknessField,
    darkness: D,
    distancer: PinDistancer,
    used: UsedPairs,
    sequence: Vec<usize>,
    buffers: Vec<BatchBuffer>,
}

impl<D: Darkness> Algorithm<D> {
    fn new<T: Float>(
        table: &PinTable<T>,
        field: DarknessField,
        darkness: D,
        min_separation: usize,
    ) -> Result<Self, Error> {
        let pins = table
            .pins()
            .iter()
            .enumerate()
            .map(|(idx, pin)| {
                pin.cast::<i64>()
                    .filter(|pin| field.grid().contains(*pin))
                    .ok_or(Error::PinOutOfField { pin: idx })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let count = pins.len();
        let workers = num_cpus::get();
        let chunk_size = (count + workers - 1) / workers;
        Ok(Self {
            buffers: (0..count)
                .step_by(chunk_size)
                .map(|start| BatchBuffer {
                    range: start..count.min(start + chunk_size),
                    result: None,
                })
                .collect(),
            distancer: PinDistancer::new(count, min_separation)?,
            used: UsedPairs::new(count),
            sequence: vec![START_PIN],
            pins,
            field,
            darkness,
        })
    }

    fn compute(mut self, step_count: usize, verboser: &mut impl Verboser) -> Pattern {
        let mut current = START_PIN;
        for step in 0..step_count {
            verboser.verbose(Message::Computing(step));
            match self.select_next(current) {
                Some(next) => {
                    self.commit(current, next);
                    current = next;
                }
                None => {
                    verboser.verbose(Message::Exhausted(step));
                    return Pattern {
                        sequence: self.sequence,
                        outcome: Outcome::Exhausted { step },
                    };
                }
            }
        }
        Pattern {
            sequence: self.sequence,
            outcome: Outcome::BudgetSpent,
        }
    }

    /// Darkest unused, sufficiently separated chord out of `current`.
    /// Ties resolve to the lowest candidate index: each buffer keeps its
    /// first maximum under a strict comparison, and the buffers cover
    /// ascending index ranges reduced in order.
    fn select_next(&mut self, current: usize) -> Option<usize> {
        let from = self.pins[current];
        let pins = &self.pins;
        let field = &self.field;
        let distancer = self.distancer;
        let used = &self.used;
        self.buffers.par_iter_mut().for_each(|buffer| {
            buffer.result = None;
            for candidate in buffer.range.clone() {
                if !distancer.is_valid(current, candidate) || used.contains(current, candidate) {
                    continue;
                }
                let total =
                    field.chord_darkness(Segment::new(from, pins[candidate]).points_between());
                if buffer.result.map_or(true, |best| total > best.total) {
                    buffer.result = Some(Scored { total, candidate });
                }
            }
        });
        let mut best: Option<Scored> = None;
        for buffer in &self.buffers {
            if let Some(result) = buffer.result {
                if best.map_or(true, |best| result.total > best.total) {
                    best = Some(result);
                }
            }
        }
        best.map(|best| best.candidate)
    }

    fn commit(&mut self, current: usize, next: usize) {
        debug_assert_ne!(current, next);
        self.sequence.push(next);
        self.used.mark(current, next);
        for point in Segment::new(self.pins[current], self.pins[next]).points_between() {
            self.field.decay(point, &self.darkness);
        }
    }
}

#[derive(Clone, Copy)]
struct Scored {
    total: u64,
    candidate: usize,
}

struct BatchBuffer {
    range: Range<usize>,
    result: Option<Scored>,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Distancer(#[from] distancer::Error),
    #[error("pin {pin} lies outside the darkness field")]
    PinOutOfField { pin: usize },
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{darkness::FlatDarkness, verboser::Silent, Grid};

    fn uniform_field(extent: usize, value: u32) -> DarknessField {
        DarknessField::from_raw(vec![value; extent * extent], Grid::new(extent, extent)).unwrap()
    }

    fn corner_pins() -> PinTable<f32> {
        PinTable::from_points(
            [(0.0, 0.0), (3.0, 0.0), (3.0, 3.0), (0.0, 3.0)].map(|(x, y)| Point { x, y }),
        )
        .unwrap()
    }

    #[test]
    fn walks_the_corner_scenario_by_lowest_index_ties() {
        let pattern = compute(
            &corner_pins(),
            uniform_field(4, 10),
            FlatDarkness(10),
            Settings {
                min_separation: 1,
                step_count: 2,
            },
            &mut Silent,
        )
        .unwrap();
        assert_eq!(pattern.sequence(), [0, 1, 2]);
        assert_eq!(pattern.outcome(), Outcome::BudgetSpent);
    }

    #[test]
    fn reports_exhaustion_instead_of_appending_an_invalid_index() {
        let table = PinTable::from_points(
            [(0.0f64, 0.0), (3.0, 0.0), (0.0, 3.0)].map(|(x, y)| Point { x, y }),
        )
        .unwrap();
        struct Recorder(Option<usize>);
        impl Verboser for Recorder {
            fn verbose(&mut self, message: Message) {
                if let Message::Exhausted(step) = message {
                    self.0 = Some(step);
                }
            }
        }
        let mut recorder = Recorder(None);
        let pattern = compute(
            &table,
            uniform_field(4, 10),
            FlatDarkness(10),
            Settings {
                min_separation: 2,
                step_count: 5,
            },
            &mut recorder,
        )
        .unwrap();
        assert_eq!(pattern.sequence(), [START_PIN]);
        assert_eq!(pattern.outcome(), Outcome::Exhausted { step: 0 });
        assert_eq!(recorder.0, Some(0));
    }

    #[test]
    fn exhaustion_mid_run_keeps_the_accumulated_sequence() {
        // Only six distinct chords exist between four pins; a larger
        // budget must stop early.
        let pattern = compute(
            &corner_pins(),
            uniform_field(4, 10),
            FlatDarkness(1),
            Settings {
                min_separation: 1,
                step_count: 100,
            },
            &mut Silent,
        )
        .unwrap();
        assert!(matches!(pattern.outcome(), Outcome::Exhausted { .. }));
        assert_eq!(pattern.sequence()[0], START_PIN);
        assert!(pattern.sequence().len() >= 2);
        assert!(pattern.sequence().len() <= 7);
    }

    #[test]
    fn identical_inputs_yield_identical_sequences() {
        let grid = Grid::new(32, 32);
        let cells: Vec<u32> = (0..grid.len()).map(|i| (i as u32 * 37) % 256).collect();
        let table = PinTable::<f64>::inscribed(grid, 16, &mut Silent).unwrap();
        let settings = Settings {
            min_separation: 2,
            step_count: 64,
        };
        let first = compute(
            &table,
            DarknessField::from_raw(cells.clone(), grid).unwrap(),
            FlatDarkness(50),
            settings,
            &mut Silent,
        )
        .unwrap();
        let second = compute(
            &table,
            DarknessField::from_raw(cells, grid).unwrap(),
            FlatDarkness(50),
            settings,
            &mut Silent,
        )
        .unwrap();
        assert_eq!(first.sequence(), second.sequence());
        assert_eq!(first.outcome(), second.outcome());
    }

    #[test]
    fn no_chord_is_strung_twice() {
        let grid = Grid::new(32, 32);
        let cells: Vec<u32> = (0..grid.len()).map(|i| (i as u32 * 53) % 251).collect();
        let table = PinTable::<f64>::inscribed(grid, 12, &mut Silent).unwrap();
        let pattern = compute(
            &table,
            DarknessField::from_raw(cells, grid).unwrap(),
            FlatDarkness(40),
            Settings {
                min_separation: 2,
                step_count: 40,
            },
            &mut Silent,
        )
        .unwrap();
        let mut strung = HashSet::new();
        for pair in pattern.sequence().windows(2) {
            let key = (pair[0].min(pair[1]), pair[0].max(pair[1]));
            assert!(strung.insert(key), "chord {key:?} selected twice");
        }
    }

    #[test]
    fn rejects_a_pin_outside_the_field_at_startup() {
        let table = PinTable::from_points(
            [(0.0f32, 0.0), (5.0, 0.0), (2.0, 3.0)].map(|(x, y)| Point { x, y }),
        )
        .unwrap();
        assert!(matches!(
            compute(
                &table,
                uniform_field(4, 10),
                FlatDarkness(10),
                Settings {
                    min_separation: 1,
                    step_count: 1,
                },
                &mut Silent,
            ),
            Err(Error::PinOutOfField { pin: 1 })
        ));
    }

    #[test]
    fn rejects_a_zero_separation_at_startup() {
        assert!(matches!(
            compute(
                &corner_pins(),
                uniform_field(4, 10),
                FlatDarkness(10),
                Settings {
                    min_separation: 0,
                    step_count: 1,
                },
                &mut Silent,
            ),
            Err(Error::Distancer(_))
        ));
    }
}
