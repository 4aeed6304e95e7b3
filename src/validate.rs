use crate::data::{Classification, DriverTag, Hours, Position, PositionId, Tier};
use crate::policy::Policy;
use itertools::Itertools;
use thiserror::Error;

/// Why a candidate set of positions was refused as a whole.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("no populated positions remain")]
    NoPopulatedPositions,
    #[error("position {id} has {hours}h, outside {min}-{max}h")]
    HoursOutOfRange {
        id: PositionId,
        hours: Hours,
        min: Hours,
        max: Hours,
    },
    #[error("position {id} spans {days} days, above the {max}-day cap")]
    TooManyDays { id: PositionId, days: u32, max: u32 },
    #[error("position {id} mixes driver and non-driver clients")]
    MixedDriverNeeds { id: PositionId },
}

/// Checks one populated position against the finalized-position rules.
pub fn check_position(position: &Position, policy: &Policy) -> Result<(), Rejection> {
    let id = position.id();
    let hours = position.total_hours();
    if hours < policy.min_hours || hours > policy.max_hours {
        return Err(Rejection::HoursOutOfRange {
            id,
            hours,
            min: policy.min_hours,
            max: policy.max_hours,
        });
    }
    if position.total_days() > policy.max_days {
        return Err(Rejection::TooManyDays {
            id,
            days: position.total_days(),
            max: policy.max_days,
        });
    }
    // the position's flag is derived from its clients, so homogeneity is the whole check
    if position.clients().iter().map(|c| c.needs_driver).all_equal() {
        Ok(())
    } else {
        Err(Rejection::MixedDriverNeeds { id })
    }
}

/// Checks every populated position; empty ones are ignored.
pub fn check_all(positions: &[Position], policy: &Policy) -> Result<(), Rejection> {
    positions
        .iter()
        .filter(|p| !p.is_empty())
        .try_for_each(|p| check_position(p, policy))
}

pub fn classify(position: &Position, policy: &Policy) -> Classification {
    let tier = if position.total_hours() <= policy.part_time_max_hours {
        Tier::PartTime
    } else {
        Tier::FullTime
    };
    let driver_tag = if position.requires_driver().is_driver() {
        DriverTag::Driver
    } else {
        DriverTag::NonDriver
    };
    Classification { tier, driver_tag }
}

/// Drops empty positions, validates the rest all-or-nothing, then renumbers
/// from `start_id` and stamps tier and driver tag.
pub fn validate_and_classify(
    positions: Vec<Position>,
    start_id: PositionId,
    policy: &Policy,
) -> Result<Vec<Position>, Rejection> {
    if positions.is_empty() {
        return Ok(Vec::new());
    }
    let mut populated: Vec<Position> = positions.into_iter().filter(|p| !p.is_empty()).collect();
    if populated.is_empty() {
        return Err(Rejection::NoPopulatedPositions);
    }

    check_all(&populated, policy)?;

    for (id, position) in (start_id..).zip(populated.iter_mut()) {
        let classification = classify(position, policy);
        position.finalize(id, classification);
    }
    Ok(populated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Client, DriverRequirement};

    fn position(id: PositionId, clients: &[(&str, Hours, u32, bool)]) -> Position {
        let mut position = Position::new(id);
        for (name, hours, days, needs_driver) in clients {
            position.assign(Client::new(*name, *hours, *days, *needs_driver, "Z1"));
        }
        position
    }

    #[test]
    fn drops_empty_positions_and_renumbers_from_offset() {
        let policy = Policy::default();
        let input = vec![
            Position::new(1),
            position(2, &[("a", 30, 3, true)]),
            Position::new(3),
            position(4, &[("b", 20, 2, false)]),
        ];
        let out = validate_and_classify(input, 10, &policy).unwrap();

        assert_eq!(out.iter().map(|p| p.id()).collect::<Vec<_>>(), vec![10, 11]);
        assert_eq!(out[0].classification().unwrap().to_string(), "Full-time Driver");
        assert_eq!(out[1].classification().unwrap().to_string(), "Part-time Non-driver");
    }

    #[test]
    fn tier_boundary_is_inclusive_for_part_time() {
        let policy = Policy::default();
        let out = validate_and_classify(
            vec![position(1, &[("a", 24, 2, false)]), position(2, &[("b", 25, 2, false)])],
            1,
            &policy,
        )
        .unwrap();
        assert_eq!(out[0].classification().unwrap().tier, Tier::PartTime);
        assert_eq!(out[1].classification().unwrap().tier, Tier::FullTime);
    }

    #[test]
    fn one_undersized_position_rejects_the_whole_set() {
        let policy = Policy::default();
        let result = validate_and_classify(
            vec![position(1, &[("a", 30, 3, false)]), position(2, &[("b", 10, 1, false)])],
            1,
            &policy,
        );
        assert_eq!(
            result,
            Err(Rejection::HoursOutOfRange {
                id: 2,
                hours: 10,
                min: 16,
                max: 45
            })
        );
    }

    #[test]
    fn day_cap_is_enforced_after_the_fact() {
        let policy = Policy::default();
        let result =
            validate_and_classify(vec![position(4, &[("a", 20, 3, false), ("b", 5, 3, false)])], 1, &policy);
        assert_eq!(result, Err(Rejection::TooManyDays { id: 4, days: 6, max: 5 }));
    }

    #[test]
    fn mixed_driver_needs_are_rejected() {
        let policy = Policy::default();
        let mixed = position(1, &[("a", 20, 2, true), ("b", 10, 1, false)]);
        assert_eq!(mixed.requires_driver(), DriverRequirement::Driver);
        assert_eq!(
            check_position(&mixed, &policy),
            Err(Rejection::MixedDriverNeeds { id: 1 })
        );
    }

    #[test]
    fn only_empty_positions_is_not_a_solution() {
        let policy = Policy::default();
        assert_eq!(
            validate_and_classify(vec![Position::new(1), Position::new(2)], 1, &policy),
            Err(Rejection::NoPopulatedPositions)
        );
        assert_eq!(validate_and_classify(Vec::new(), 1, &policy), Ok(Vec::new()));
    }

    #[test]
    fn reclassifying_only_shifts_ids() {
        let policy = Policy::default();
        let first = validate_and_classify(
            vec![position(9, &[("a", 30, 3, true)]), position(3, &[("b", 18, 2, false)])],
            1,
            &policy,
        )
        .unwrap();
        let second = validate_and_classify(first.clone(), 5, &policy).unwrap();

        for (a, b) in first.iter().zip(&second) {
            assert_eq!(b.id(), a.id() + 4);
            assert_eq!(a.classification(), b.classification());
            assert_eq!(a.clients(), b.clients());
        }
    }
}
