use crate::policy::Policy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

// Type aliases for clarity
pub type PositionId = u32;
pub type Hours = u32;
pub type Days = u32;

/// Represents a care recipient with a weekly workload to be covered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Client {
    pub name: String,
    pub hours: Hours,
    pub days: Days,
    pub needs_driver: bool,
    pub zip_code: String,
}

impl Client {
    pub fn new(
        name: impl Into<String>,
        hours: Hours,
        days: Days,
        needs_driver: bool,
        zip_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            hours,
            days,
            needs_driver,
            zip_code: zip_code.into(),
        }
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}h, {}d, {}, zip {})",
            self.name,
            self.hours,
            self.days,
            if self.needs_driver { "driver" } else { "non-driver" },
            self.zip_code
        )
    }
}

/// Accessibility requirement shared by every client of a position.
///
/// `Unset` only while the position holds no client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DriverRequirement {
    Unset,
    Driver,
    NonDriver,
}

impl DriverRequirement {
    pub fn of(needs_driver: bool) -> Self {
        if needs_driver {
            DriverRequirement::Driver
        } else {
            DriverRequirement::NonDriver
        }
    }

    /// Whether a client with the given need can join without breaking homogeneity.
    pub fn accepts(self, needs_driver: bool) -> bool {
        match self {
            DriverRequirement::Unset => true,
            DriverRequirement::Driver => needs_driver,
            DriverRequirement::NonDriver => !needs_driver,
        }
    }

    pub fn is_driver(self) -> bool {
        self == DriverRequirement::Driver
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Tier {
    PartTime,
    FullTime,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::PartTime => write!(f, "Part-time"),
            Tier::FullTime => write!(f, "Full-time"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DriverTag {
    Driver,
    NonDriver,
}

impl fmt::Display for DriverTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverTag::Driver => write!(f, "Driver"),
            DriverTag::NonDriver => write!(f, "Non-driver"),
        }
    }
}

/// Labels stamped on a position once it passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Classification {
    pub tier: Tier,
    pub driver_tag: DriverTag,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tier, self.driver_tag)
    }
}

/// Why a client could not join a position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignError {
    #[error("client {client} does not match the position's driver requirement")]
    DriverMismatch { client: String },
    #[error("client {client} would push the position past {max}h")]
    OverHours { client: String, max: Hours },
    #[error("client {client} would push the position past {max} days")]
    OverDays { client: String, max: Days },
}

/// One caregiver's weekly workload: the bin clients are packed into.
///
/// Totals are kept in lockstep with the client list. Outside the crate the
/// only ways in are [`Position::try_assign`] and [`Position::try_absorb`],
/// which refuse anything that would break the caps or driver homogeneity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    id: PositionId,
    clients: Vec<Client>,
    total_hours: Hours,
    // simplified: sum of client days, not a union over a real week
    total_days: Days,
    requires_driver: DriverRequirement,
    zip_codes: BTreeSet<String>,
    classification: Option<Classification>,
}

impl Position {
    pub fn new(id: PositionId) -> Self {
        Self {
            id,
            clients: Vec::new(),
            total_hours: 0,
            total_days: 0,
            requires_driver: DriverRequirement::Unset,
            zip_codes: BTreeSet::new(),
            classification: None,
        }
    }

    /// A position sealed around a single client.
    pub fn with_client(id: PositionId, client: Client) -> Self {
        let mut position = Self::new(id);
        position.assign(client);
        position
    }

    pub fn id(&self) -> PositionId {
        self.id
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn client_names(&self) -> impl Iterator<Item = &str> {
        self.clients.iter().map(|c| c.name.as_str())
    }

    pub fn total_hours(&self) -> Hours {
        self.total_hours
    }

    pub fn total_days(&self) -> Days {
        self.total_days
    }

    pub fn requires_driver(&self) -> DriverRequirement {
        self.requires_driver
    }

    pub fn zip_codes(&self) -> &BTreeSet<String> {
        &self.zip_codes
    }

    pub fn classification(&self) -> Option<Classification> {
        self.classification
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Checks the per-placement rules: driver homogeneity, hour cap, day cap.
    pub fn can_accept(&self, client: &Client, policy: &Policy) -> bool {
        self.requires_driver.accepts(client.needs_driver)
            && self.fits_hours(client.hours, policy)
            && self.fits_days(client.days, policy)
    }

    // overflow counts as over the cap
    fn fits_hours(&self, hours: Hours, policy: &Policy) -> bool {
        self.total_hours
            .checked_add(hours)
            .is_some_and(|total| total <= policy.max_hours)
    }

    fn fits_days(&self, days: Days, policy: &Policy) -> bool {
        self.total_days
            .checked_add(days)
            .is_some_and(|total| total <= policy.max_days)
    }

    /// Adds a client only if the position can take it.
    pub fn try_assign(&mut self, client: Client, policy: &Policy) -> Result<(), AssignError> {
        if !self.requires_driver.accepts(client.needs_driver) {
            return Err(AssignError::DriverMismatch { client: client.name });
        }
        if !self.fits_hours(client.hours, policy) {
            return Err(AssignError::OverHours {
                client: client.name,
                max: policy.max_hours,
            });
        }
        if !self.fits_days(client.days, policy) {
            return Err(AssignError::OverDays {
                client: client.name,
                max: policy.max_days,
            });
        }
        self.assign(client);
        Ok(())
    }

    /// Moves every client of `other` in, or leaves both untouched.
    pub fn try_absorb(&mut self, other: Position, policy: &Policy) -> Result<(), AssignError> {
        let mut trial = self.clone();
        for client in other.clients {
            trial.try_assign(client, policy)?;
        }
        *self = trial;
        Ok(())
    }

    /// Appends a client and updates the derived totals.
    ///
    /// Acceptance is the caller's job; see [`Position::can_accept`].
    pub(crate) fn assign(&mut self, client: Client) {
        self.total_hours = self.total_hours.saturating_add(client.hours);
        self.total_days = self.total_days.saturating_add(client.days);
        self.zip_codes.insert(client.zip_code.clone());
        self.clients.push(client);
        self.requires_driver = self.derived_driver_requirement();
        self.classification = None;
    }

    /// Removes the most recently assigned client with this name, reversing
    /// exactly what [`Position::assign`] added.
    pub fn unassign(&mut self, name: &str) -> Option<Client> {
        let index = self.clients.iter().rposition(|c| c.name == name)?;
        let client = self.clients.remove(index);
        self.total_hours = self.total_hours.saturating_sub(client.hours);
        self.total_days = self.total_days.saturating_sub(client.days);
        self.zip_codes = self.clients.iter().map(|c| c.zip_code.clone()).collect();
        self.requires_driver = self.derived_driver_requirement();
        self.classification = None;
        Some(client)
    }

    /// Moves every client of `other` into this position.
    pub(crate) fn absorb(&mut self, other: Position) {
        for client in other.clients {
            self.assign(client);
        }
    }

    /// Driver requirement recomputed from the clients alone.
    pub fn derived_driver_requirement(&self) -> DriverRequirement {
        if self.clients.is_empty() {
            DriverRequirement::Unset
        } else {
            DriverRequirement::of(self.clients.iter().any(|c| c.needs_driver))
        }
    }

    pub(crate) fn finalize(&mut self, id: PositionId, classification: Classification) {
        self.id = id;
        self.classification = Some(classification);
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.client_names().collect();
        write!(
            f,
            "position {} [{}] {}h {}d {:?}",
            self.id,
            names.join(", "),
            self.total_hours,
            self.total_days,
            self.requires_driver
        )?;
        if let Some(classification) = self.classification {
            write!(f, " ({})", classification)?;
        }
        Ok(())
    }
}
