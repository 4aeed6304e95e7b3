use crate::data::{Days, Hours, Position};
use crate::policy::{MergeMode, Policy};

/// Post-search pass that may coalesce positions.
///
/// Implementations must keep every client: the output holds exactly the
/// clients of the input, possibly in fewer positions.
pub trait MergeStrategy: Send + Sync {
    fn merge(&self, positions: Vec<Position>) -> Vec<Position>;
}

/// Passes positions through untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityMerge;

impl MergeStrategy for IdentityMerge {
    fn merge(&self, positions: Vec<Position>) -> Vec<Position> {
        positions
    }
}

/// Folds each position, smallest first, into the first already-kept
/// position with the same driver requirement that still has room for its
/// hours and days.
#[derive(Debug, Clone, Copy)]
pub struct GreedyMerge {
    pub max_hours: Hours,
    pub max_days: Days,
}

impl GreedyMerge {
    pub fn from_policy(policy: &Policy) -> Self {
        Self {
            max_hours: policy.max_hours,
            max_days: policy.max_days,
        }
    }

    fn compatible(&self, host: &Position, guest: &Position) -> bool {
        host.requires_driver() == guest.requires_driver()
            && host
                .total_hours()
                .checked_add(guest.total_hours())
                .is_some_and(|hours| hours <= self.max_hours)
            && host
                .total_days()
                .checked_add(guest.total_days())
                .is_some_and(|days| days <= self.max_days)
    }
}

impl MergeStrategy for GreedyMerge {
    fn merge(&self, positions: Vec<Position>) -> Vec<Position> {
        let mut indexed: Vec<(usize, Position)> = positions.into_iter().enumerate().collect();
        indexed.sort_by_key(|(index, p)| (p.total_hours(), *index));

        let mut kept: Vec<(usize, Position)> = Vec::with_capacity(indexed.len());
        for (index, position) in indexed {
            if position.is_empty() {
                kept.push((index, position));
                continue;
            }
            match kept
                .iter_mut()
                .find(|(_, host)| !host.is_empty() && self.compatible(host, &position))
            {
                Some((_, host)) => host.absorb(position),
                None => kept.push((index, position)),
            }
        }

        // hosts go back to their input order so ids stay stable
        kept.sort_by_key(|(index, _)| *index);
        kept.into_iter().map(|(_, p)| p).collect()
    }
}

pub fn strategy_for(policy: &Policy) -> Box<dyn MergeStrategy> {
    match policy.merge {
        MergeMode::Identity => Box::new(IdentityMerge),
        MergeMode::Greedy => Box::new(GreedyMerge::from_policy(policy)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Client;

    fn single(id: u32, name: &str, hours: Hours, days: Days, needs_driver: bool) -> Position {
        Position::with_client(id, Client::new(name, hours, days, needs_driver, "Z1"))
    }

    #[test]
    fn identity_keeps_everything() {
        let input = vec![single(1, "a", 10, 1, false), single(2, "b", 10, 1, false)];
        assert_eq!(IdentityMerge.merge(input.clone()), input);
    }

    #[test]
    fn greedy_folds_small_compatible_positions() {
        let merge = GreedyMerge::from_policy(&Policy::default());
        let out = merge.merge(vec![
            single(1, "big", 30, 3, false),
            single(2, "small", 10, 1, false),
            single(3, "driver", 10, 1, true),
            single(4, "tiny", 6, 1, false),
        ]);

        let shape: Vec<(u32, Vec<&str>)> = out
            .iter()
            .map(|p| (p.id(), p.client_names().collect()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (1, vec!["big"]),
                (3, vec!["driver"]),
                (4, vec!["tiny", "small"]),
            ]
        );
    }

    #[test]
    fn greedy_respects_caps() {
        let merge = GreedyMerge::from_policy(&Policy::default());
        let out = merge.merge(vec![single(1, "a", 25, 2, false), single(2, "b", 25, 2, false)]);
        assert_eq!(out.len(), 2);

        let out = merge.merge(vec![single(1, "a", 10, 3, false), single(2, "b", 10, 3, false)]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn greedy_keeps_total_hours() {
        let merge = GreedyMerge::from_policy(&Policy::default());
        let input: Vec<Position> = (1..=6)
            .map(|i| single(i, &format!("c{i}"), 4 * i, 1, i % 2 == 0))
            .collect();
        let before: Hours = input.iter().map(|p| p.total_hours()).sum();
        let out = merge.merge(input);
        assert_eq!(out.iter().map(|p| p.total_hours()).sum::<Hours>(), before);
        assert_eq!(out.iter().map(|p| p.clients().len()).sum::<usize>(), 6);
    }

    #[test]
    fn policy_selects_the_strategy() {
        let policy = Policy {
            merge: MergeMode::Greedy,
            ..Policy::default()
        };
        let out = strategy_for(&policy).merge(vec![
            single(1, "a", 10, 1, false),
            single(2, "b", 10, 1, false),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(strategy_for(&Policy::default()).merge(Vec::new()), Vec::new());
    }
}
