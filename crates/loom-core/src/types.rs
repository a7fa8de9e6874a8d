//! Core identifiers and enums
//!
//! - [`NodeId`]: monotonically allocated node identifier
//! - [`NodeType`]: how a revision came to exist
//! - [`Rating`]: tri-state user feedback

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique node identifier
///
/// Allocated from a per-tree monotonic counter, never reused. The root
/// always carries [`NodeId::ROOT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Reserved id of the root node
    pub const ROOT: NodeId = NodeId(1);

    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == Self::ROOT.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(NodeId)
    }
}

/// Origin of a revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// The single empty root
    Root,
    /// Human edit
    User,
    /// Machine-generated continuation
    Generated,
    /// Machine rewrite of existing text
    Rewrite,
    /// Text brought in from outside the tree
    Imported,
}

impl NodeType {
    /// Content of these nodes never changes after creation
    #[inline]
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Root | Self::Generated | Self::Rewrite)
    }

    /// Produced by a generation back-end
    #[inline]
    #[must_use]
    pub fn is_machine(&self) -> bool {
        matches!(self, Self::Generated | Self::Rewrite)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::User => "user",
            Self::Generated => "generated",
            Self::Rewrite => "rewrite",
            Self::Imported => "imported",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User feedback on a node
///
/// Persisted as `true` / `false` / `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Rating {
    Approved,
    Rejected,
    #[default]
    Unset,
}

impl Rating {
    #[inline]
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }

    #[inline]
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }
}

impl From<Option<bool>> for Rating {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Approved,
            Some(false) => Self::Rejected,
            None => Self::Unset,
        }
    }
}

impl From<Rating> for Option<bool> {
    fn from(value: Rating) -> Self {
        match value {
            Rating::Approved => Some(true),
            Rating::Rejected => Some(false),
            Rating::Unset => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display_and_parse() {
        let id = NodeId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(" 42 ".parse::<NodeId>().unwrap(), id);
        assert!("x".parse::<NodeId>().is_err());
    }

    #[test]
    fn root_id_is_reserved() {
        assert!(NodeId::ROOT.is_root());
        assert!(!NodeId::new(2).is_root());
    }

    #[test]
    fn node_type_mutability() {
        assert!(NodeType::Generated.is_immutable());
        assert!(NodeType::Rewrite.is_immutable());
        assert!(NodeType::Root.is_immutable());
        assert!(!NodeType::User.is_immutable());
        assert!(!NodeType::Imported.is_immutable());
    }

    #[test]
    fn node_type_serde_lowercase() {
        let json = serde_json::to_string(&NodeType::Generated).unwrap();
        assert_eq!(json, "\"generated\"");
        let decoded: NodeType = serde_json::from_str("\"imported\"").unwrap();
        assert_eq!(decoded, NodeType::Imported);
    }

    #[test]
    fn rating_persists_as_optional_bool() {
        assert_eq!(serde_json::to_string(&Rating::Approved).unwrap(), "true");
        assert_eq!(serde_json::to_string(&Rating::Rejected).unwrap(), "false");
        assert_eq!(serde_json::to_string(&Rating::Unset).unwrap(), "null");

        let decoded: Rating = serde_json::from_str("null").unwrap();
        assert_eq!(decoded, Rating::Unset);
    }
}
