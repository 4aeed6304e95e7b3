//! Plain records at the edge of the solver.
//!
//! Input records are loose JSON objects; every field is optional and a few
//! spellings are tolerated (numbers as strings, 0/1 flags). A record that
//! cannot be read is skipped with a diagnostic instead of failing the run.

use crate::data::{Client, Position};
use crate::diagnostics::{Diagnostics, SolverEvent};
use crate::policy::Policy;
use crate::validate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_ZIP_CODE: &str = "00000";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("field `{field}` {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl RecordError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        RecordError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// One caregiver position as handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub caregiver_id: String,
    #[serde(rename = "type")]
    pub position_type: String,
    pub weekly_hours: u32,
    pub working_days: u32,
    pub clients: Vec<String>,
    pub zip_codes: Vec<String>,
    pub driver_required: bool,
}

impl PositionRecord {
    pub fn from_position(position: &Position, policy: &Policy) -> Self {
        let label = position
            .classification()
            .unwrap_or_else(|| validate::classify(position, policy));
        Self {
            caregiver_id: format!("CG_{}", position.id()),
            position_type: label.to_string(),
            weekly_hours: position.total_hours(),
            working_days: position.total_days(),
            clients: position.client_names().map(str::to_string).collect(),
            zip_codes: position.zip_codes().iter().cloned().collect(),
            driver_required: position.requires_driver().is_driver(),
        }
    }
}

/// Reads one input record; `index` is zero-based and only feeds the
/// placeholder name.
pub fn parse_client(index: usize, record: &Value) -> Result<Client, RecordError> {
    let fields = record.as_object().ok_or(RecordError::NotAnObject)?;

    let name = text_field(fields, "name")?.unwrap_or_else(|| format!("Client_{}", index + 1));
    let hours = count_field(fields, "hours")?.unwrap_or(0);
    let days = count_field(fields, "days")?.unwrap_or(0);
    let needs_driver = flag_field(fields, "needs_driver")?.unwrap_or(false);
    let zip_code = text_field(fields, "zip_code")?.unwrap_or_else(|| DEFAULT_ZIP_CODE.to_string());

    Ok(Client {
        name,
        hours,
        days,
        needs_driver,
        zip_code,
    })
}

/// Reads every record, skipping the malformed ones.
pub fn parse_clients(records: &[Value], diagnostics: &dyn Diagnostics) -> Vec<Client> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match parse_client(index, record) {
            Ok(client) => Some(client),
            Err(e) => {
                diagnostics.emit(SolverEvent::RecordSkipped {
                    index,
                    reason: e.to_string(),
                });
                None
            }
        })
        .collect()
}

fn present<'v>(fields: &'v Map<String, Value>, field: &str) -> Option<&'v Value> {
    fields.get(field).filter(|v| !v.is_null())
}

fn text_field(fields: &Map<String, Value>, field: &'static str) -> Result<Option<String>, RecordError> {
    match present(fields, field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(RecordError::invalid(field, format!("must be text, got {}", other))),
    }
}

fn count_field(fields: &Map<String, Value>, field: &'static str) -> Result<Option<u32>, RecordError> {
    let value = match present(fields, field) {
        None => return Ok(None),
        Some(value) => value,
    };
    let parsed: i64 = match value {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
            _ => return Err(RecordError::invalid(field, format!("must be a whole number, got {}", n))),
        },
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| RecordError::invalid(field, format!("must be a whole number, got {:?}", s)))?,
        other => {
            return Err(RecordError::invalid(field, format!("must be a whole number, got {}", other)));
        }
    };
    if parsed < 0 {
        return Err(RecordError::invalid(field, format!("must not be negative, got {}", parsed)));
    }
    u32::try_from(parsed)
        .map(Some)
        .map_err(|_| RecordError::invalid(field, format!("is too large: {}", parsed)))
}

fn flag_field(fields: &Map<String, Value>, field: &'static str) -> Result<Option<bool>, RecordError> {
    match present(fields, field) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::Number(n)) => Ok(Some(n.as_f64().is_some_and(|f| f != 0.0))),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Ok(Some(true)),
            "false" | "no" | "n" | "0" | "" => Ok(Some(false)),
            _ => Err(RecordError::invalid(field, format!("must be a boolean, got {:?}", s))),
        },
        Some(other) => Err(RecordError::invalid(field, format!("must be a boolean, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnostics;
    use serde_json::json;

    #[test]
    fn missing_fields_take_defaults() {
        let client = parse_client(2, &json!({})).unwrap();
        assert_eq!(client, Client::new("Client_3", 0, 0, false, "00000"));
    }

    #[test]
    fn loose_spellings_are_accepted() {
        let client = parse_client(
            0,
            &json!({"name": "A", "hours": "20", "days": 2.0, "needs_driver": "yes", "zip_code": 90210}),
        )
        .unwrap();
        assert_eq!(client, Client::new("A", 20, 2, true, "90210"));

        let client = parse_client(0, &json!({"hours": 5, "needs_driver": 0, "name": null})).unwrap();
        assert_eq!(client.name, "Client_1");
        assert!(!client.needs_driver);
    }

    #[test]
    fn bad_values_name_the_field() {
        assert_eq!(
            parse_client(0, &json!({"hours": "lots"})),
            Err(RecordError::InvalidField {
                field: "hours",
                reason: "must be a whole number, got \"lots\"".to_string()
            })
        );
        assert!(matches!(
            parse_client(0, &json!({"days": -1})),
            Err(RecordError::InvalidField { field: "days", .. })
        ));
        assert!(matches!(
            parse_client(0, &json!({"hours": 7.5})),
            Err(RecordError::InvalidField { field: "hours", .. })
        ));
        assert!(matches!(
            parse_client(0, &json!({"needs_driver": "sometimes"})),
            Err(RecordError::InvalidField { field: "needs_driver", .. })
        ));
        assert_eq!(parse_client(0, &json!([1, 2])), Err(RecordError::NotAnObject));
    }

    #[test]
    fn malformed_records_are_skipped_with_a_warning() {
        let sink = CollectingDiagnostics::new();
        let clients = parse_clients(
            &[
                json!({"name": "ok", "hours": 20}),
                json!({"name": "bad", "hours": -4}),
                json!("not a record"),
            ],
            &sink,
        );

        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].name, "ok");
        let skipped: Vec<usize> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                SolverEvent::RecordSkipped { index, .. } => Some(index),
                _ => None,
            })
            .collect();
        assert_eq!(skipped, vec![1, 2]);
    }

    #[test]
    fn position_record_uses_output_field_names() {
        let mut position = Position::new(3);
        position.assign(Client::new("A", 30, 3, true, "Z2"));
        position.assign(Client::new("B", 10, 2, true, "Z1"));
        let record = PositionRecord::from_position(&position, &Policy::default());

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "caregiver_id": "CG_3",
                "type": "Full-time Driver",
                "weekly_hours": 40,
                "working_days": 5,
                "clients": ["A", "B"],
                "zip_codes": ["Z1", "Z2"],
                "driver_required": true
            })
        );
    }
}
