//! Diagnostics sink the solver reports its reasoning to.
//!
//! The solver never prints or logs on its own. Callers hand in a
//! [`Diagnostics`] implementation: [`LogDiagnostics`] forwards to the `log`
//! facade, [`CollectingDiagnostics`] keeps the events for inspection and
//! [`NullDiagnostics`] drops them.

use crate::data::{Days, Hours};
use crate::validate::Rejection;
use log::{Level, log};
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

pub trait Diagnostics: Sync {
    fn emit(&self, event: SolverEvent);
}

/// Why a single target-count attempt did not produce a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// Backtracking exhausted every placement.
    NoAssignment,
    /// A complete placement was refused by the validator.
    Rejected(Rejection),
    /// The validated result lost some clients.
    MissingClients(Vec<String>),
    /// A lower target already succeeded, or the step budget ran out.
    Cancelled,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::NoAssignment => write!(f, "no placement satisfies the caps"),
            AttemptFailure::Rejected(rejection) => write!(f, "rejected: {}", rejection),
            AttemptFailure::MissingClients(names) => {
                write!(f, "missing clients: {}", names.join(", "))
            }
            AttemptFailure::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverEvent {
    RecordSkipped { index: usize, reason: String },
    NoClients,
    ClientOutOfBounds { name: String, hours: Hours, days: Days },
    ZeroHourClientsDropped { count: usize },
    ClientSplit { name: String, hours: Hours, parts: u32 },
    SearchRange { clients: usize, min: usize, max: usize, total_hours: u64 },
    AttemptStarted { target: usize },
    AttemptFailed { target: usize, reason: AttemptFailure },
    SolutionFound { positions: usize, clients: usize },
    SearchExhausted { clients: usize },
    BudgetExhausted { steps: u64 },
    RemainderUnassigned { clients: Vec<String> },
    Merged { before: usize, after: usize },
    FinalRejected { reason: Rejection },
    HoursMismatch { expected: u64, actual: u64 },
    PolicyRejected { reason: String },
    Completed { positions: usize, elapsed: Duration },
}

impl SolverEvent {
    /// Severity used when the event is forwarded to `log`.
    pub fn level(&self) -> Level {
        match self {
            SolverEvent::RecordSkipped { .. }
            | SolverEvent::ClientOutOfBounds { .. }
            | SolverEvent::RemainderUnassigned { .. }
            | SolverEvent::FinalRejected { .. }
            | SolverEvent::HoursMismatch { .. }
            | SolverEvent::BudgetExhausted { .. } => Level::Warn,
            SolverEvent::PolicyRejected { .. } => Level::Error,
            SolverEvent::AttemptStarted { .. } | SolverEvent::AttemptFailed { .. } => Level::Trace,
            SolverEvent::ClientSplit { .. } | SolverEvent::Merged { .. } => Level::Debug,
            _ => Level::Info,
        }
    }
}

impl fmt::Display for SolverEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverEvent::RecordSkipped { index, reason } => {
                write!(f, "Skipping client record {}: {}", index, reason)
            }
            SolverEvent::NoClients => write!(f, "No schedulable clients; returning empty schedule."),
            SolverEvent::ClientOutOfBounds { name, hours, days } => write!(
                f,
                "Skipping client {}: {}h over {} days is beyond what one client can request.",
                name, hours, days
            ),
            SolverEvent::ZeroHourClientsDropped { count } => {
                write!(f, "Dropped {} zero-hour client(s) from scheduling.", count)
            }
            SolverEvent::ClientSplit { name, hours, parts } => {
                write!(f, "Client {} ({}h) split into {} parts.", name, hours, parts)
            }
            SolverEvent::SearchRange { clients, min, max, total_hours } => write!(
                f,
                "Searching {}-{} positions for {} clients ({}h total).",
                min, max, clients, total_hours
            ),
            SolverEvent::AttemptStarted { target } => {
                write!(f, "Attempting assignment with {} positions...", target)
            }
            SolverEvent::AttemptFailed { target, reason } => {
                write!(f, "No solution with {} positions: {}", target, reason)
            }
            SolverEvent::SolutionFound { positions, clients } => write!(
                f,
                "Optimal solution found: {} positions for {} clients.",
                positions, clients
            ),
            SolverEvent::SearchExhausted { clients } => write!(
                f,
                "No valid solution for {} clients in the searched range.",
                clients
            ),
            SolverEvent::BudgetExhausted { steps } => {
                write!(f, "Search budget of {} placements exhausted.", steps)
            }
            SolverEvent::RemainderUnassigned { clients } => write!(
                f,
                "Search found no positions for: {}",
                clients.join(", ")
            ),
            SolverEvent::Merged { before, after } => {
                write!(f, "Merge pass: {} positions in, {} out.", before, after)
            }
            SolverEvent::FinalRejected { reason } => {
                write!(f, "Combined solution failed final validation: {}", reason)
            }
            SolverEvent::HoursMismatch { expected, actual } => write!(
                f,
                "Mismatch in total hours. Input: {}h, schedule: {}h",
                expected, actual
            ),
            SolverEvent::PolicyRejected { reason } => {
                write!(f, "Refusing to schedule with an invalid policy: {}", reason)
            }
            SolverEvent::Completed { positions, elapsed } => write!(
                f,
                "Schedule complete: {} positions generated in {:.2?}.",
                positions, elapsed
            ),
        }
    }
}

/// Forwards every event to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn emit(&self, event: SolverEvent) {
        log!(target: "caregiver_solver", event.level(), "{}", event);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn emit(&self, _event: SolverEvent) {}
}

/// Keeps every event in emission order.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    events: Mutex<Vec<SolverEvent>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SolverEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn emit(&self, event: SolverEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
