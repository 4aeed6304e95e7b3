use crate::data::{Client, Position, PositionId};
use crate::diagnostics::{Diagnostics, SolverEvent};
use crate::policy::Policy;

/// Result of pulling oversized clients out before search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitOutcome {
    /// One sealed position per split part, numbered consecutively.
    pub positions: Vec<Position>,
    /// Clients that fit a single position, in input order.
    pub remainder: Vec<Client>,
}

impl SplitOutcome {
    /// First id free after the split positions.
    pub fn next_id(&self, start_id: PositionId) -> PositionId {
        self.positions
            .iter()
            .map(|p| p.id() + 1)
            .max()
            .unwrap_or(start_id)
    }
}

/// Breaks a client whose load exceeds one position into evenly sized parts.
///
/// Returns an empty vector when the client fits a single position.
pub fn split_client(client: &Client, policy: &Policy) -> Vec<Client> {
    if client.hours <= policy.max_hours {
        return Vec::new();
    }
    let parts = client.hours.div_ceil(policy.max_hours);
    let (base_hours, extra_hours) = (client.hours / parts, client.hours % parts);
    let (base_days, extra_days) = (client.days / parts, client.days % parts);

    (0..parts)
        .map(|i| {
            let hours = base_hours + u32::from(i < extra_hours);
            let mut days = base_days + u32::from(i < extra_days);
            if days == 0 && hours > 0 && client.days > 0 {
                days = 1;
            }
            Client {
                name: format!("{} (Part {}/{})", client.name, i + 1, parts),
                hours,
                days,
                needs_driver: client.needs_driver,
                zip_code: client.zip_code.clone(),
            }
        })
        .collect()
}

/// Seals every part of every oversized client into its own position.
pub fn split_oversized(
    clients: &[Client],
    start_id: PositionId,
    policy: &Policy,
    diagnostics: &dyn Diagnostics,
) -> SplitOutcome {
    let mut outcome = SplitOutcome::default();
    let mut next_id = start_id;

    for client in clients {
        let parts = split_client(client, policy);
        if parts.is_empty() {
            outcome.remainder.push(client.clone());
            continue;
        }
        diagnostics.emit(SolverEvent::ClientSplit {
            name: client.name.clone(),
            hours: client.hours,
            parts: parts.len() as u32,
        });
        for part in parts {
            outcome.positions.push(Position::with_client(next_id, part));
            next_id += 1;
        }
    }
    outcome
}
