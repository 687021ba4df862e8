//! Precedence relationships.
//!
//! A relationship constrains a successor activity relative to its
//! predecessor. The four kinds are a closed tagged variant — the solver
//! dispatches on them with a fixed-case match, never virtual calls.

use serde::{Deserialize, Serialize};

/// The four precedence semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    /// Successor starts after the predecessor finishes (+ lag).
    FinishToStart,
    /// Successor starts after the predecessor starts (+ lag).
    StartToStart,
    /// Successor finishes after the predecessor finishes (+ lag).
    FinishToFinish,
    /// Successor finishes after the predecessor starts (+ lag).
    StartToFinish,
}

impl RelationshipKind {
    /// Parses a two-letter type code (`FS`, `SS`, `FF`, `SF`), case-insensitive.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "FS" => Some(Self::FinishToStart),
            "SS" => Some(Self::StartToStart),
            "FF" => Some(Self::FinishToFinish),
            "SF" => Some(Self::StartToFinish),
            _ => None,
        }
    }

    /// The two-letter type code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::FinishToStart => "FS",
            Self::StartToStart => "SS",
            Self::FinishToFinish => "FF",
            Self::StartToFinish => "SF",
        }
    }
}

/// A precedence constraint between two activities.
///
/// Lag is in signed working minutes, measured on the successor's calendar;
/// negative lag is a lead. A relationship never references itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Predecessor activity id.
    pub predecessor_id: String,
    /// Successor activity id.
    pub successor_id: String,
    /// Precedence semantics.
    pub kind: RelationshipKind,
    /// Signed lag (working minutes); negative = lead.
    pub lag_min: i64,
}

impl Relationship {
    /// Creates a zero-lag relationship.
    pub fn new(
        predecessor_id: impl Into<String>,
        successor_id: impl Into<String>,
        kind: RelationshipKind,
    ) -> Self {
        Self {
            predecessor_id: predecessor_id.into(),
            successor_id: successor_id.into(),
            kind,
            lag_min: 0,
        }
    }

    /// Sets the lag.
    pub fn with_lag(mut self, lag_min: i64) -> Self {
        self.lag_min = lag_min;
        self
    }

    /// Creates a zero-lag finish-to-start relationship, the dominant kind.
    pub fn finish_to_start(
        predecessor_id: impl Into<String>,
        successor_id: impl Into<String>,
    ) -> Self {
        Self::new(predecessor_id, successor_id, RelationshipKind::FinishToStart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        assert_eq!(RelationshipKind::parse("FS"), Some(RelationshipKind::FinishToStart));
        assert_eq!(RelationshipKind::parse("ss"), Some(RelationshipKind::StartToStart));
        assert_eq!(RelationshipKind::parse(" ff "), Some(RelationshipKind::FinishToFinish));
        assert_eq!(RelationshipKind::parse("SF"), Some(RelationshipKind::StartToFinish));
        assert_eq!(RelationshipKind::parse("XX"), None);
    }

    #[test]
    fn test_code_round_trip() {
        for kind in [
            RelationshipKind::FinishToStart,
            RelationshipKind::StartToStart,
            RelationshipKind::FinishToFinish,
            RelationshipKind::StartToFinish,
        ] {
            assert_eq!(RelationshipKind::parse(kind.code()), Some(kind));
        }
    }

    #[test]
    fn test_builder() {
        let r = Relationship::finish_to_start("A", "B").with_lag(-120);
        assert_eq!(r.predecessor_id, "A");
        assert_eq!(r.successor_id, "B");
        assert_eq!(r.kind, RelationshipKind::FinishToStart);
        assert_eq!(r.lag_min, -120);
    }
}
