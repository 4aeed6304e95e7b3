use crate::data::{Client, Position};
use crate::diagnostics::{Diagnostics, SolverEvent};
use crate::merge::{self, MergeStrategy};
use crate::policy::Policy;
use crate::records::{self, PositionRecord};
use crate::solver;
use crate::split;
use crate::validate;
use itertools::Itertools;
use serde_json::Value;
use std::time::Instant;

/// Record-level entry point: parses client records, builds the schedule and
/// renders position records. An empty result means no valid schedule.
pub fn generate_schedule(
    records: &[Value],
    policy: &Policy,
    diagnostics: &dyn Diagnostics,
) -> Vec<PositionRecord> {
    let clients = records::parse_clients(records, diagnostics);
    optimize(&clients, policy, diagnostics)
        .iter()
        .map(|p| PositionRecord::from_position(p, policy))
        .collect()
}

/// Builds the schedule with the merge strategy the policy names.
pub fn optimize(clients: &[Client], policy: &Policy, diagnostics: &dyn Diagnostics) -> Vec<Position> {
    let merge = merge::strategy_for(policy);
    optimize_with(clients, policy, merge.as_ref(), diagnostics)
}

/// Split oversized clients, search the rest, merge, then validate and
/// number the combined set from 1.
pub fn optimize_with(
    clients: &[Client],
    policy: &Policy,
    merge: &dyn MergeStrategy,
    diagnostics: &dyn Diagnostics,
) -> Vec<Position> {
    let start_time = Instant::now();
    if let Err(e) = policy.validate() {
        diagnostics.emit(SolverEvent::PolicyRejected {
            reason: e.to_string(),
        });
        return Vec::new();
    }
    let clients: Vec<Client> = clients
        .iter()
        .filter(|c| {
            let admitted = policy.admits(c.hours, c.days);
            if !admitted {
                diagnostics.emit(SolverEvent::ClientOutOfBounds {
                    name: c.name.clone(),
                    hours: c.hours,
                    days: c.days,
                });
            }
            admitted
        })
        .cloned()
        .collect();
    if clients.is_empty() {
        diagnostics.emit(SolverEvent::NoClients);
        return Vec::new();
    }

    let split = split::split_oversized(&clients, 1, policy, diagnostics);
    let next_id = split.next_id(1);

    let searched = if split.remainder.is_empty() {
        Vec::new()
    } else {
        solver::search_min_positions(&split.remainder, next_id, policy, diagnostics)
    };
    if searched.is_empty() {
        let stranded: Vec<String> = split
            .remainder
            .iter()
            .filter(|c| c.hours > 0)
            .map(|c| c.name.clone())
            .collect();
        if !stranded.is_empty() {
            diagnostics.emit(SolverEvent::RemainderUnassigned { clients: stranded });
        }
    }

    let combined = split.positions.into_iter().chain(searched).collect_vec();
    let before = combined.len();
    let merged = merge.merge(combined);
    diagnostics.emit(SolverEvent::Merged {
        before,
        after: merged.len(),
    });

    let schedule = match validate::validate_and_classify(merged, 1, policy) {
        Ok(schedule) => schedule,
        Err(reason) => {
            diagnostics.emit(SolverEvent::FinalRejected { reason });
            return Vec::new();
        }
    };

    let expected: u64 = clients.iter().map(|c| u64::from(c.hours)).sum();
    let actual: u64 = schedule.iter().map(|p| u64::from(p.total_hours())).sum();
    if expected != actual {
        diagnostics.emit(SolverEvent::HoursMismatch { expected, actual });
    }

    diagnostics.emit(SolverEvent::Completed {
        positions: schedule.len(),
        elapsed: start_time.elapsed(),
    });
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CollectingDiagnostics, NullDiagnostics};
    use crate::merge::GreedyMerge;

    #[test]
    fn split_positions_come_first_and_ids_restart_at_one() {
        let clients = vec![
            Client::new("small", 20, 2, false, "Z1"),
            Client::new("big", 60, 4, true, "Z2"),
        ];
        let schedule = optimize(&clients, &Policy::default(), &NullDiagnostics);

        let shape: Vec<(u32, Vec<&str>)> = schedule
            .iter()
            .map(|p| (p.id(), p.client_names().collect()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (1, vec!["big (Part 1/2)"]),
                (2, vec!["big (Part 2/2)"]),
                (3, vec!["small"]),
            ]
        );
    }

    #[test]
    fn stranded_remainder_is_reported_and_hours_mismatch_flagged() {
        let clients = vec![
            Client::new("big", 50, 4, false, "Z1"),
            Client::new("lonely", 10, 1, true, "Z1"),
        ];
        let sink = CollectingDiagnostics::new();
        let schedule = optimize(&clients, &Policy::default(), &sink);

        assert_eq!(schedule.len(), 2);
        let events = sink.events();
        assert!(events.contains(&SolverEvent::RemainderUnassigned {
            clients: vec!["lonely".to_string()]
        }));
        assert!(events.contains(&SolverEvent::HoursMismatch {
            expected: 60,
            actual: 50
        }));
    }

    #[test]
    fn custom_merge_strategy_is_honoured() {
        let clients = vec![
            Client::new("big", 50, 2, false, "Z1"),
            Client::new("other", 17, 1, false, "Z2"),
        ];
        let policy = Policy::default();
        let plain = optimize(&clients, &policy, &NullDiagnostics);
        let merged = optimize_with(&clients, &policy, &GreedyMerge::from_policy(&policy), &NullDiagnostics);

        assert_eq!(plain.len(), 3);
        assert_eq!(merged.len(), 2);
        assert_eq!(
            merged.iter().map(|p| p.total_hours()).sum::<u32>(),
            67
        );
    }

    #[test]
    fn clients_beyond_the_per_client_bounds_are_skipped() {
        let clients = vec![
            Client::new("a", 20, 1, false, "Z1"),
            Client::new("b", 10, u32::MAX, false, "Z1"),
            Client::new("c", 4_000_000_000, 5, false, "Z1"),
        ];
        let sink = CollectingDiagnostics::new();
        let schedule = optimize(&clients, &Policy::default(), &sink);

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].client_names().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(schedule[0].total_days(), 1);
        let events = sink.events();
        assert!(events.contains(&SolverEvent::ClientOutOfBounds {
            name: "b".to_string(),
            hours: 10,
            days: u32::MAX
        }));
        assert!(events.contains(&SolverEvent::ClientOutOfBounds {
            name: "c".to_string(),
            hours: 4_000_000_000,
            days: 5
        }));
        assert!(!events.iter().any(|e| matches!(e, SolverEvent::HoursMismatch { .. })));
    }

    #[test]
    fn invalid_policy_yields_empty_schedule() {
        let policy = Policy {
            max_hours: 0,
            ..Policy::default()
        };
        let sink = CollectingDiagnostics::new();
        let schedule = optimize(&[Client::new("a", 20, 2, false, "Z1")], &policy, &sink);
        assert!(schedule.is_empty());
        assert!(matches!(
            sink.events().as_slice(),
            [SolverEvent::PolicyRejected { .. }]
        ));
    }
}
