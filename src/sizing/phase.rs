//! Greedy assignment of single-phase loads to L1/L2/L3.
//!
//! One left-to-right pass over the consumers. Three-phase loads add their
//! current to every phase. The first three single-phase loads seed L1, L2,
//! and L3 in that order; each later one goes to the phase with the smallest
//! running total, ties resolved in L1, L2, L3 order. The result depends on
//! consumer order and is not a global optimum.

use std::fmt;

use serde::Serialize;

/// One supply phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    L1,
    L2,
    L3,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::L1, Phase::L2, Phase::L3];

    fn index(self) -> usize {
        match self {
            Phase::L1 => 0,
            Phase::L2 => 1,
            Phase::L3 => 2,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::L1 => "L1",
            Phase::L2 => "L2",
            Phase::L3 => "L3",
        })
    }
}

/// Phases a consumer is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum PhaseAssignment {
    Single(Phase),
    Three,
}

impl fmt::Display for PhaseAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseAssignment::Single(phase) => write!(f, "{phase}"),
            PhaseAssignment::Three => f.write_str("L1, L2, L3"),
        }
    }
}

impl From<PhaseAssignment> for String {
    fn from(assignment: PhaseAssignment) -> Self {
        assignment.to_string()
    }
}

/// Supply type of a load as seen by the balancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Supply {
    Single,
    Three,
}

/// Balancer input for one consumer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseLoad {
    /// `None` when the consumer's voltage could not be read.
    pub supply: Option<Supply>,
    /// Operating current (A); absent currents count as zero.
    pub current_a: Option<f64>,
}

/// Balancer output.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseBalance {
    /// One entry per input load, same order.
    pub assignments: Vec<Option<PhaseAssignment>>,
    /// Running totals after the pass, indexed L1, L2, L3 (A).
    pub totals: [f64; 3],
}

impl PhaseBalance {
    pub fn total(&self, phase: Phase) -> f64 {
        self.totals[phase.index()]
    }
}

/// Assigns phases in a single greedy pass.
///
/// # Examples
///
/// ```
/// use shield_sizer::sizing::phase::{balance, Phase, PhaseAssignment, PhaseLoad, Supply};
///
/// let loads: Vec<PhaseLoad> = [10.0, 10.0, 10.0, 1.0, 1.0]
///     .iter()
///     .map(|&i| PhaseLoad { supply: Some(Supply::Single), current_a: Some(i) })
///     .collect();
/// let result = balance(&loads);
/// assert_eq!(result.assignments[3], Some(PhaseAssignment::Single(Phase::L1)));
/// assert_eq!(result.assignments[4], Some(PhaseAssignment::Single(Phase::L2)));
/// assert_eq!(result.totals, [11.0, 11.0, 10.0]);
/// ```
pub fn balance(loads: &[PhaseLoad]) -> PhaseBalance {
    let mut totals = [0.0_f64; 3];
    let mut seeded = 0usize;
    let mut assignments = Vec::with_capacity(loads.len());

    for load in loads {
        let current = load.current_a.unwrap_or(0.0);
        let assignment = match load.supply {
            None => None,
            Some(Supply::Three) => {
                for total in &mut totals {
                    *total += current;
                }
                Some(PhaseAssignment::Three)
            }
            Some(Supply::Single) => {
                let phase = if seeded < Phase::ALL.len() {
                    let phase = Phase::ALL[seeded];
                    seeded += 1;
                    phase
                } else {
                    least_loaded(&totals)
                };
                totals[phase.index()] += current;
                Some(PhaseAssignment::Single(phase))
            }
        };
        assignments.push(assignment);
    }

    PhaseBalance {
        assignments,
        totals,
    }
}

/// First phase, in L1/L2/L3 order, holding the minimum running total.
fn least_loaded(totals: &[f64; 3]) -> Phase {
    let mut best = Phase::L1;
    for phase in [Phase::L2, Phase::L3] {
        if totals[phase.index()] < totals[best.index()] {
            best = phase;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(i: f64) -> PhaseLoad {
        PhaseLoad {
            supply: Some(Supply::Single),
            current_a: Some(i),
        }
    }

    fn three(i: f64) -> PhaseLoad {
        PhaseLoad {
            supply: Some(Supply::Three),
            current_a: Some(i),
        }
    }

    #[test]
    fn first_three_single_phase_loads_seed_in_order() {
        let result = balance(&[single(1.0), single(50.0), single(3.0)]);
        assert_eq!(
            result.assignments,
            vec![
                Some(PhaseAssignment::Single(Phase::L1)),
                Some(PhaseAssignment::Single(Phase::L2)),
                Some(PhaseAssignment::Single(Phase::L3)),
            ]
        );
        assert_eq!(result.totals, [1.0, 50.0, 3.0]);
    }

    #[test]
    fn ties_resolve_to_first_phase() {
        let loads: Vec<PhaseLoad> = [10.0, 10.0, 10.0, 1.0, 1.0]
            .into_iter()
            .map(single)
            .collect();
        let result = balance(&loads);
        assert_eq!(result.assignments[3], Some(PhaseAssignment::Single(Phase::L1)));
        assert_eq!(result.assignments[4], Some(PhaseAssignment::Single(Phase::L2)));
        assert_eq!(result.totals, [11.0, 11.0, 10.0]);
    }

    #[test]
    fn later_loads_go_to_smallest_total() {
        let result = balance(&[single(5.0), single(2.0), single(8.0), single(4.0), single(1.0)]);
        // after seeding: [5, 2, 8] → L2 gets 4 → [5, 6, 8] → L1 gets 1
        assert_eq!(result.assignments[3], Some(PhaseAssignment::Single(Phase::L2)));
        assert_eq!(result.assignments[4], Some(PhaseAssignment::Single(Phase::L1)));
        assert_eq!(result.totals, [6.0, 6.0, 8.0]);
    }

    #[test]
    fn three_phase_loads_add_to_all_phases_and_do_not_seed() {
        let result = balance(&[three(7.0), single(2.0), single(3.0)]);
        assert_eq!(result.assignments[0], Some(PhaseAssignment::Three));
        assert_eq!(result.assignments[1], Some(PhaseAssignment::Single(Phase::L1)));
        assert_eq!(result.assignments[2], Some(PhaseAssignment::Single(Phase::L2)));
        assert_eq!(result.totals, [9.0, 10.0, 7.0]);
    }

    #[test]
    fn unclassified_loads_are_skipped() {
        let unknown = PhaseLoad {
            supply: None,
            current_a: Some(100.0),
        };
        let result = balance(&[unknown, single(1.0)]);
        assert_eq!(result.assignments[0], None);
        assert_eq!(result.assignments[1], Some(PhaseAssignment::Single(Phase::L1)));
        assert_eq!(result.totals, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn missing_current_still_takes_a_seed() {
        let blank = PhaseLoad {
            supply: Some(Supply::Single),
            current_a: None,
        };
        let result = balance(&[blank, single(4.0)]);
        assert_eq!(result.assignments[1], Some(PhaseAssignment::Single(Phase::L2)));
        assert_eq!(result.total(Phase::L1), 0.0);
        assert_eq!(result.total(Phase::L2), 4.0);
    }

    #[test]
    fn labels() {
        assert_eq!(PhaseAssignment::Three.to_string(), "L1, L2, L3");
        assert_eq!(PhaseAssignment::Single(Phase::L3).to_string(), "L3");
    }
}
