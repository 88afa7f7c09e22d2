//! Core flag types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Default prefix of the store key that carries a flag's server override.
pub const DEFAULT_OVERRIDE_PREFIX: &str = "flag_override_";

/// Stable identifier of a flag.
///
/// Integer ids render as their decimal text, so `FlagId::from(1)` and
/// `FlagId::from("1")` name the same override key.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagId(String);

impl FlagId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u32> for FlagId {
    fn from(id: u32) -> Self {
        FlagId(id.to_string())
    }
}

impl From<&str> for FlagId {
    fn from(id: &str) -> Self {
        FlagId(id.to_string())
    }
}

impl From<String> for FlagId {
    fn from(id: String) -> Self {
        FlagId(id)
    }
}

impl fmt::Debug for FlagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlagId({})", self.0)
    }
}

impl fmt::Display for FlagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Release state of a flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    Released,
    Unreleased,
}

/// A boolean feature flag as defined by the flag system.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flag {
    pub id: FlagId,
    pub kind: FlagKind,
    /// Value used when no server override is present.
    pub default: bool,
}

impl Flag {
    pub fn new(id: impl Into<FlagId>, kind: FlagKind, default: bool) -> Self {
        Self {
            id: id.into(),
            kind,
            default,
        }
    }

    /// A released flag, enabled unless overridden.
    pub fn released(id: impl Into<FlagId>) -> Self {
        Self::new(id, FlagKind::Released, true)
    }

    /// An unreleased flag, disabled unless overridden.
    pub fn unreleased(id: impl Into<FlagId>) -> Self {
        Self::new(id, FlagKind::Unreleased, false)
    }
}

/// Build the override key for `id` under `prefix`.
pub fn override_key(prefix: &str, id: &FlagId) -> String {
    format!("{}{}", prefix, id.as_str())
}

/// Parse a stored override value.
///
/// Returns `None` for values that are not a recognised boolean.
pub fn parse_override(value: &str) -> Option<bool> {
    let value = value.trim();
    if value == "1" || value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value == "0" || value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// A change reported by the config store: the keys of one namespace whose
/// values changed in a single mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertiesChanged {
    pub namespace: String,
    pub keys: BTreeSet<String>,
}

impl PropertiesChanged {
    pub fn new<I, K>(namespace: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            namespace: namespace.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_key_for_numeric_and_named_ids() {
        assert_eq!(
            override_key(DEFAULT_OVERRIDE_PREFIX, &Flag::released(1).id),
            "flag_override_1"
        );
        assert_eq!(
            override_key(DEFAULT_OVERRIDE_PREFIX, &Flag::unreleased("new_shade").id),
            "flag_override_new_shade"
        );
        assert_eq!(FlagId::from(42), FlagId::from("42"));
    }

    #[test]
    fn test_kind_defaults() {
        assert!(Flag::released(1).default);
        assert!(!Flag::unreleased(1).default);
        assert_eq!(Flag::released(1).kind, FlagKind::Released);
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(parse_override("1"), Some(true));
        assert_eq!(parse_override("TRUE"), Some(true));
        assert_eq!(parse_override(" false "), Some(false));
        assert_eq!(parse_override("0"), Some(false));
        assert_eq!(parse_override("yes"), None);
        assert_eq!(parse_override(""), None);
    }

    #[test]
    fn test_flag_serde() {
        let flag = Flag::unreleased(3);
        let json = serde_json::to_string(&flag).unwrap();
        assert_eq!(json, r#"{"id":"3","kind":"unreleased","default":false}"#);
        let back: Flag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flag);
    }
}
