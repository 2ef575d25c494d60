// ── Entity identity ──
//
// Back-office collections are not consistent about ids: some use integer
// primary keys, some UUIDs, some opaque strings (e.g. Mongo ObjectIds).
// EntityId hides the difference behind one hashable type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical identifier for any back-office entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(u64),
    Uuid(Uuid),
    Text(String),
}

impl EntityId {
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Uuid(_) | Self::Text(_) => None,
        }
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Self::Uuid(u) => Some(u),
            Self::Number(_) | Self::Text(_) => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<Uuid> for EntityId {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        if let Ok(n) = s.parse::<u64>() {
            return Self::Number(n);
        }
        match Uuid::parse_str(&s) {
            Ok(u) => Self::Uuid(u),
            Err(_) => Self::Text(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn numeric_string_parses_as_number() {
        let id: EntityId = "42".parse().unwrap();
        assert_eq!(id.as_number(), Some(42));
    }

    #[test]
    fn uuid_string_parses_as_uuid() {
        let id = EntityId::from("550e8400-e29b-41d4-a716-446655440000");
        assert!(id.as_uuid().is_some());
    }

    #[test]
    fn object_id_stays_text() {
        let id = EntityId::from("507f1f77bcf86cd799439011");
        assert_eq!(id, EntityId::Text("507f1f77bcf86cd799439011".into()));
    }

    #[test]
    fn untagged_serde() {
        let ids: Vec<EntityId> = serde_json::from_str(
            r#"[7, "550e8400-e29b-41d4-a716-446655440000", "abc"]"#,
        )
        .unwrap();
        assert_eq!(ids[0], EntityId::Number(7));
        assert!(ids[1].as_uuid().is_some());
        assert_eq!(ids[2].to_string(), "abc");
        assert_eq!(serde_json::to_string(&ids[0]).unwrap(), "7");
    }
}
