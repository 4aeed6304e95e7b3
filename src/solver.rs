use crate::data::{Client, Hours, Position, PositionId};
use crate::diagnostics::{AttemptFailure, Diagnostics, SolverEvent};
use crate::policy::Policy;
use crate::validate;
use itertools::Itertools;
use rayon::prelude::*;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Orders clients most-constrained first: driver-needing clients, then
/// descending hours, then descending days. Full ties keep input order.
pub fn sort_by_difficulty(clients: &[Client]) -> Vec<Client> {
    clients
        .iter()
        .cloned()
        .sorted_by_key(|c| (!c.needs_driver, Reverse(c.hours), Reverse(c.days)))
        .collect()
}

/// Stop conditions shared by every attempt of one search.
struct SearchControl {
    max_steps: Option<u64>,
    steps: AtomicU64,
    lowest_success: AtomicUsize,
    lowest_cut: AtomicUsize,
}

impl SearchControl {
    fn new(max_steps: Option<u64>) -> Self {
        Self {
            max_steps,
            steps: AtomicU64::new(0),
            lowest_success: AtomicUsize::new(usize::MAX),
            lowest_cut: AtomicUsize::new(usize::MAX),
        }
    }

    fn unbounded() -> Self {
        Self::new(None)
    }

    /// Spends one placement; false once the budget is gone.
    fn take_step(&self) -> bool {
        let used = self.steps.fetch_add(1, Ordering::Relaxed) + 1;
        self.max_steps.is_none_or(|limit| used <= limit)
    }

    fn budget_exhausted(&self) -> bool {
        self.max_steps
            .is_some_and(|limit| self.steps.load(Ordering::Relaxed) > limit)
    }

    /// A lower target already produced a schedule.
    fn superseded(&self, target: usize) -> bool {
        self.lowest_success.load(Ordering::Acquire) < target
    }

    fn record_success(&self, target: usize) {
        self.lowest_success.fetch_min(target, Ordering::AcqRel);
    }

    fn record_cut(&self, target: usize) {
        self.lowest_cut.fetch_min(target, Ordering::AcqRel);
    }

    fn lowest_cut(&self) -> usize {
        self.lowest_cut.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Placed,
    Failed,
    Stopped,
}

/// Depth-first placement of difficulty-ordered clients into a fixed set of
/// positions, first fit in position order.
struct Backtracker<'a> {
    clients: &'a [Client],
    policy: &'a Policy,
    control: &'a SearchControl,
    target: usize,
    // hours still to place from index i on, as [non-driver, driver]
    remaining: Vec<[u64; 2]>,
}

impl<'a> Backtracker<'a> {
    fn new(
        clients: &'a [Client],
        policy: &'a Policy,
        control: &'a SearchControl,
        target: usize,
    ) -> Self {
        let mut remaining = vec![[0; 2]; clients.len() + 1];
        for (i, client) in clients.iter().enumerate().rev() {
            remaining[i] = remaining[i + 1];
            remaining[i][usize::from(client.needs_driver)] += u64::from(client.hours);
        }
        Self {
            clients,
            policy,
            control,
            target,
            remaining,
        }
    }

    fn run(&self, positions: &mut [Position]) -> Step {
        self.place(positions, 0)
    }

    fn place(&self, positions: &mut [Position], index: usize) -> Step {
        if self.control.superseded(self.target) {
            return Step::Stopped;
        }
        if !self.floor_reachable(positions, index) {
            return Step::Failed;
        }
        let Some(client) = self.clients.get(index) else {
            return match validate::check_all(positions, self.policy) {
                Ok(()) => Step::Placed,
                Err(_) => Step::Failed,
            };
        };

        let mut tried_empty = false;
        for slot in 0..positions.len() {
            if positions[slot].is_empty() {
                // empty positions are interchangeable, the first one stands for all
                if tried_empty {
                    continue;
                }
                tried_empty = true;
            }
            if !positions[slot].can_accept(client, self.policy) {
                continue;
            }
            if !self.control.take_step() {
                return Step::Stopped;
            }

            positions[slot].assign(client.clone());
            match self.place(positions, index + 1) {
                Step::Failed => {
                    positions[slot].unassign(&client.name);
                }
                done => return done,
            }
        }
        Step::Failed
    }

    /// Whether the clients still to place can lift every populated position
    /// to the hour floor. Driver groups never share positions, so each group
    /// is checked against its own remaining hours.
    fn floor_reachable(&self, positions: &[Position], index: usize) -> bool {
        let min = u64::from(self.policy.min_hours);
        [false, true].into_iter().all(|driver| {
            let remaining = self.remaining[index][usize::from(driver)];
            let mut open = false;
            let mut deficit: u64 = 0;
            for position in positions
                .iter()
                .filter(|p| !p.is_empty() && p.requires_driver().is_driver() == driver)
            {
                open = true;
                deficit += min.saturating_sub(u64::from(position.total_hours()));
            }
            deficit <= remaining && (open || remaining == 0 || remaining >= min)
        })
    }
}

/// Places every client into `positions`, trying positions in order and
/// undoing placements on failure.
///
/// Only complete placements whose populated positions also pass the
/// finalized-position checks count as success. `None` means no such
/// placement exists.
pub fn backtrack_assignment(
    clients: &[Client],
    mut positions: Vec<Position>,
    policy: &Policy,
) -> Option<Vec<Position>> {
    let control = SearchControl::unbounded();
    let target = positions.len();
    match Backtracker::new(clients, policy, &control, target).run(&mut positions) {
        Step::Placed => Some(positions),
        Step::Failed | Step::Stopped => None,
    }
}

/// One attempt at a fixed position count, over clients already sorted.
fn attempt_assignment(
    sorted: &[Client],
    target: usize,
    start_id: PositionId,
    policy: &Policy,
    control: &SearchControl,
) -> Result<Vec<Position>, AttemptFailure> {
    if control.superseded(target) {
        return Err(AttemptFailure::Cancelled);
    }
    let mut positions: Vec<Position> = (start_id..)
        .take(target)
        .map(Position::new)
        .collect();

    match Backtracker::new(sorted, policy, control, target).run(&mut positions) {
        Step::Placed => {}
        Step::Failed => return Err(AttemptFailure::NoAssignment),
        Step::Stopped => {
            if control.budget_exhausted() {
                control.record_cut(target);
            }
            return Err(AttemptFailure::Cancelled);
        }
    }

    let validated = validate::validate_and_classify(positions, start_id, policy)
        .map_err(AttemptFailure::Rejected)?;

    let assigned: Vec<&str> = validated
        .iter()
        .flat_map(|p| p.client_names())
        .sorted()
        .collect();
    let expected: Vec<&str> = sorted.iter().map(|c| c.name.as_str()).sorted().collect();
    if assigned != expected {
        let missing = expected
            .iter()
            .filter(|name| !assigned.contains(name))
            .map(|name| name.to_string())
            .collect();
        return Err(AttemptFailure::MissingClients(missing));
    }

    control.record_success(target);
    Ok(validated)
}

/// Finds the smallest number of positions that holds every client with
/// hours, numbering positions from `start_id`.
///
/// Zero-hour clients are dropped first. An empty result means no valid
/// schedule exists in the searched range (or the step budget ran out).
pub fn search_min_positions(
    clients: &[Client],
    start_id: PositionId,
    policy: &Policy,
    diagnostics: &dyn Diagnostics,
) -> Vec<Position> {
    let schedulable: Vec<Client> = clients.iter().filter(|c| c.hours > 0).cloned().collect();
    let dropped = clients.len() - schedulable.len();
    if dropped > 0 {
        diagnostics.emit(SolverEvent::ZeroHourClientsDropped { count: dropped });
    }
    if schedulable.is_empty() {
        diagnostics.emit(SolverEvent::NoClients);
        return Vec::new();
    }

    let total_hours: u64 = schedulable.iter().map(|c| u64::from(c.hours)).sum();
    let theoretical_min = (total_hours.div_ceil(u64::from(policy.max_hours)) as usize).max(1);
    let practical_max = schedulable.len();
    diagnostics.emit(SolverEvent::SearchRange {
        clients: schedulable.len(),
        min: theoretical_min,
        max: practical_max,
        total_hours,
    });

    let sorted = sort_by_difficulty(&schedulable);
    let control = SearchControl::new(policy.search.max_steps);

    let attempt = |target: usize| -> Option<(usize, Vec<Position>)> {
        diagnostics.emit(SolverEvent::AttemptStarted { target });
        match attempt_assignment(&sorted, target, start_id, policy, &control) {
            Ok(positions) => Some((target, positions)),
            Err(reason) => {
                diagnostics.emit(SolverEvent::AttemptFailed { target, reason });
                None
            }
        }
    };

    let found = if policy.search.parallel {
        (theoretical_min..=practical_max)
            .into_par_iter()
            .find_map_first(attempt)
    } else {
        let mut found = None;
        for target in theoretical_min..=practical_max {
            found = attempt(target);
            if found.is_some() || control.budget_exhausted() {
                break;
            }
        }
        found
    };

    match found {
        // a success above a budget-cut target is not provably minimal
        Some((target, positions)) if target < control.lowest_cut() => {
            diagnostics.emit(SolverEvent::SolutionFound {
                positions: positions.len(),
                clients: sorted.len(),
            });
            positions
        }
        _ => {
            if control.budget_exhausted() {
                diagnostics.emit(SolverEvent::BudgetExhausted {
                    steps: policy.search.max_steps.unwrap_or_default(),
                });
            } else {
                diagnostics.emit(SolverEvent::SearchExhausted {
                    clients: sorted.len(),
                });
            }
            Vec::new()
        }
    }
}
