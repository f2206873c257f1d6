use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};
use std::fmt;
use std::str::FromStr;

use crate::error::SafeError;
use crate::task::json_kind;

const STATUS_CONSTRAINT: &str =
    "Invalid status: must be string from (\"new\", \"in_progress\", \"done\")";

fn violation(kind: &str, raw: &str) -> SafeError {
    SafeError::new(format!("{STATUS_CONSTRAINT}, got {kind} {raw}"))
}

/// Progress of a task.
///
/// `Unset` is the in-memory default. It renders as `unknown` in messages and
/// is refused by every encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    Unset,
    New,
    InProgress,
    Done,
}

impl Status {
    /// Returns the canonical lowercase token.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unknown",
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Returns the token for output, refusing the unset sentinel.
    pub fn encode(self) -> Result<&'static str, SafeError> {
        match self {
            Self::Unset => Err(violation("unset", "\"unknown\"")),
            status => Ok(status.as_str()),
        }
    }

    /// Decodes a status read from the store, where NULL is possible.
    pub fn from_store(value: Option<String>) -> Result<Self, SafeError> {
        match value {
            Some(value) => value.parse(),
            None => Err(violation("null", "NULL")),
        }
    }

    /// Encodes the status for writing to the store.
    pub fn to_store(self) -> Result<String, SafeError> {
        self.encode().map(str::to_owned)
    }

    pub(crate) fn from_wire(value: serde_json::Value) -> Result<Self, SafeError> {
        match value {
            serde_json::Value::String(value) => value.parse(),
            other => Err(violation(json_kind(&other), &other.to_string())),
        }
    }
}

impl FromStr for Status {
    type Err = SafeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "new" => Ok(Self::New),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(violation("string", &format!("{other:?}"))),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.encode().map_err(<S::Error as ser::Error>::custom)?;
        serializer.serialize_str(value)
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_wire(value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_project_statuses_to_tokens() {
        assert_eq!(Status::New.to_string(), "new");
        assert_eq!(Status::InProgress.to_string(), "in_progress");
        assert_eq!(Status::Done.to_string(), "done");
        assert_eq!(Status::Unset.to_string(), "unknown");
        assert_eq!(Status::default(), Status::Unset);
    }

    #[test]
    fn can_parse_canonical_tokens() {
        assert_eq!("new".parse::<Status>().unwrap(), Status::New);
        assert_eq!("in_progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("done".parse::<Status>().unwrap(), Status::Done);
    }

    #[test]
    fn can_reject_tokens_outside_the_set() {
        let upper = "New".parse::<Status>().unwrap_err();
        let unknown = "unknown".parse::<Status>().unwrap_err();

        assert_eq!(
            upper.reason(),
            "Invalid status: must be string from (\"new\", \"in_progress\", \"done\"), got string \"New\""
        );
        assert_eq!(
            unknown.reason(),
            "Invalid status: must be string from (\"new\", \"in_progress\", \"done\"), got string \"unknown\""
        );
    }

    #[test]
    fn can_deserialize_status_from_json() {
        let status: Status = serde_json::from_str("\"in_progress\"").unwrap();

        assert_eq!(status, Status::InProgress);
    }

    #[test]
    fn can_reject_invalid_json_status() {
        let archived = serde_json::from_str::<Status>("\"archived\"").unwrap_err();
        let number = serde_json::from_str::<Status>("1").unwrap_err();

        assert!(archived.to_string().starts_with(
            "Invalid status: must be string from (\"new\", \"in_progress\", \"done\"), got string \"archived\""
        ));
        assert!(number.to_string().starts_with(
            "Invalid status: must be string from (\"new\", \"in_progress\", \"done\"), got number 1"
        ));
    }

    #[test]
    fn can_serialize_status() {
        assert_eq!(serde_json::to_string(&Status::Done).unwrap(), "\"done\"");
    }

    #[test]
    fn can_refuse_to_encode_unset_status() {
        let err = Status::Unset.encode().unwrap_err();

        assert_eq!(
            err.reason(),
            "Invalid status: must be string from (\"new\", \"in_progress\", \"done\"), got unset \"unknown\""
        );
        assert!(Status::Unset.to_store().is_err());
        assert!(serde_json::to_string(&Status::Unset).is_err());
    }

    #[test]
    fn can_decode_status_from_store() {
        let status = Status::from_store(Some("done".to_string())).unwrap();

        assert_eq!(status, Status::Done);
        assert_eq!(status.to_store().unwrap(), "done");
    }

    #[test]
    fn can_reject_null_or_unknown_status_from_store() {
        let null = Status::from_store(None).unwrap_err();
        let unknown = Status::from_store(Some("blocked".to_string())).unwrap_err();

        assert_eq!(
            null.reason(),
            "Invalid status: must be string from (\"new\", \"in_progress\", \"done\"), got null NULL"
        );
        assert!(unknown.reason().ends_with("got string \"blocked\""));
    }
}
