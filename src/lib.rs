//! Packs care recipients into the fewest caregiver positions that satisfy a
//! fixed set of labor rules.
//!
//! Pipeline: oversized clients are split into per-position parts, the rest
//! go through a minimum-count backtracking search, the combined positions
//! pass a pluggable merge step and a final validation that numbers and
//! labels them. "No schedule" is an empty result, never an error.

pub mod data;
pub mod diagnostics;
pub mod merge;
pub mod policy;
pub mod records;
pub mod schedule;
pub mod solver;
pub mod split;
pub mod validate;

pub use data::{AssignError, Classification, Client, DriverRequirement, DriverTag, Position, PositionId, Tier};
pub use diagnostics::{CollectingDiagnostics, Diagnostics, LogDiagnostics, NullDiagnostics, SolverEvent};
pub use merge::{GreedyMerge, IdentityMerge, MergeStrategy};
pub use policy::{MergeMode, Policy, PolicyError, SearchOptions};
pub use records::{PositionRecord, RecordError};
pub use schedule::{generate_schedule, optimize, optimize_with};
