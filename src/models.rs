use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Identifier assigned by the task store. Stored as text whatever the wire type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => TaskId(n.to_string()),
            RawId::Text(s) => TaskId(s),
        })
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Lifecycle state of a task. Only the store moves a task out of `Ongoing`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    #[default]
    Ongoing,
    Success,
    Failure,
}

impl TaskStatus {
    pub fn as_tag(&self) -> &'static str {
        match self {
            TaskStatus::Ongoing => "ongoing",
            TaskStatus::Success => "success",
            TaskStatus::Failure => "failure",
        }
    }
}

// Absent, null and "" all mean the store has not assigned a status yet.
fn deserialize_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TaskStatus, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(TaskStatus::Ongoing),
        Some("success") => Ok(TaskStatus::Success),
        Some("failure") => Ok(TaskStatus::Failure),
        Some(other) => Err(serde::de::Error::unknown_variant(
            other,
            &["success", "failure"],
        )),
    }
}

fn deserialize_description<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// RFC 3339 first; a bare timestamp without an offset is UTC.
fn deserialize_deadline<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|err| serde::de::Error::custom(format!("invalid deadline {raw:?}: {err}")))
}

fn serialize_deadline<S: Serializer>(deadline: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&deadline.to_rfc3339_opts(SecondsFormat::Millis, true))
}

// Task struct
#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_description")]
    pub description: String,
    #[serde(deserialize_with = "deserialize_deadline")]
    pub deadline: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: TaskStatus,
}

impl Task {
    /// Only tasks that are still ongoing can be marked complete.
    pub fn can_complete(&self) -> bool {
        self.status == TaskStatus::Ongoing
    }
}

/// Payload for creating a task. The store assigns the id and leaves the status unset.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    #[serde(serialize_with = "serialize_deadline")]
    pub deadline: DateTime<Utc>,
}

impl TaskDraft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        deadline: DateTime<Utc>,
    ) -> Self {
        TaskDraft {
            title: title.into(),
            description: description.into(),
            deadline,
        }
    }
}
