//! Wire types of the backend functions and the records the station keeps.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque identifier decoded from an attendee's pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassId(String);

impl PassId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PassId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Attendee details shown in the confirmation modal. Everything but the name
/// is display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendeeRecord {
    pub name: String,
    pub roll_no: Option<String>,
    pub dept: Option<String>,
    pub guest_count: Option<u32>,
    pub pass_id: Option<String>,
}

/// Result of a well-formed lookup response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassLookup {
    Found(AttendeeRecord),
    /// The response carried no identifying name: the code is not a valid pass.
    NotFound,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PassLookupBody {
    student_name: Option<String>,
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    roll_no: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    dept: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    guest_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pass_id: Option<String>,
}

impl PassLookupBody {
    pub(crate) fn into_lookup(self) -> PassLookup {
        let name = self
            .student_name
            .filter(|name| !name.is_empty())
            .or(self.name.filter(|name| !name.is_empty()));

        match name {
            Some(name) => PassLookup::Found(AttendeeRecord {
                name,
                roll_no: self.roll_no,
                dept: self.dept,
                guest_count: self.guest_count,
                pass_id: self.pass_id,
            }),
            None => PassLookup::NotFound,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MarkPresentRequest<'a> {
    pub pass_id: &'a str,
}

/// Successful commit payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommitReceipt {
    pub message: Option<String>,
    pub student_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CommitFailureBody {
    pub error: Option<String>,
}

/// Volunteer details used to assign a station at setup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VolunteerInfo {
    pub name: Option<String>,
    pub station: Option<String>,
}

// Roll numbers and pass ids come back as strings or numbers depending on the
// backing column type.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(value)) => Some(value),
        Some(Value::Number(value)) => Some(value.to_string()),
        _ => None,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(value)) => value.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(value)) => value.trim().parse().ok(),
        _ => None,
    })
}
