//! Quadruple facts: (head, relation, tail, qualifiers).
//!
//! Serialized as `["head", "relation", "tail", {"key": value, ...}]` where a
//! qualifier value is either a number or an array of integers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{QuadnetError, Result};

/// Qualifier key marking a short-term memory.
pub const CURRENT_TIME: &str = "current_time";
/// Qualifier key of episodic memories (a list of observation times).
pub const TIMESTAMP: &str = "timestamp";
/// Qualifier key of semantic memories.
pub const STRENGTH: &str = "strength";
/// Entity name of the agent node.
pub const AGENT: &str = "agent";

/// Insertion-ordered qualifier map. Order decides qualifier-triple order.
pub type Qualifiers = IndexMap<String, QualifierValue>;

/// A qualifier value before it is reified as an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QualifierValue {
    /// Single number, e.g. `"strength": 1.8`
    Scalar(f64),
    /// Ordered integers, e.g. `"timestamp": [0, 3]`; only the maximum is used
    Sequence(Vec<i64>),
}

impl QualifierValue {
    /// Numeric value used for reification: the maximum of a sequence, or the scalar.
    pub fn reduce(&self) -> Option<f64> {
        match self {
            QualifierValue::Scalar(v) => Some(*v),
            QualifierValue::Sequence(seq) => seq.iter().max().map(|&m| m as f64),
        }
    }

    /// Entity name this value maps to: rounded (half to even) and stringified.
    pub fn entity_name(&self, key: &str) -> Result<String> {
        let value = self.reduce().ok_or_else(|| QuadnetError::InvalidQualifier {
            key: key.to_string(),
            reason: "empty sequence".to_string(),
        })?;
        if !value.is_finite() {
            return Err(QuadnetError::InvalidQualifier {
                key: key.to_string(),
                reason: format!("non-finite value {}", value),
            });
        }
        Ok((value.round_ties_even() as i64).to_string())
    }
}

impl From<f64> for QualifierValue {
    fn from(v: f64) -> Self {
        QualifierValue::Scalar(v)
    }
}

impl From<i64> for QualifierValue {
    fn from(v: i64) -> Self {
        QualifierValue::Scalar(v as f64)
    }
}

impl From<i32> for QualifierValue {
    fn from(v: i32) -> Self {
        QualifierValue::Scalar(v as f64)
    }
}

impl From<Vec<i64>> for QualifierValue {
    fn from(v: Vec<i64>) -> Self {
        QualifierValue::Sequence(v)
    }
}

impl From<Vec<i32>> for QualifierValue {
    fn from(v: Vec<i32>) -> Self {
        QualifierValue::Sequence(v.into_iter().map(i64::from).collect())
    }
}

type QuadrupleRepr = (String, String, String, Qualifiers);

/// A fact in working memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "QuadrupleRepr", into = "QuadrupleRepr")]
pub struct Quadruple {
    pub head: String,
    pub relation: String,
    pub tail: String,
    pub qualifiers: Qualifiers,
}

impl Quadruple {
    /// Create a quadruple without qualifiers.
    pub fn new(head: impl Into<String>, relation: impl Into<String>, tail: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            relation: relation.into(),
            tail: tail.into(),
            qualifiers: Qualifiers::new(),
        }
    }

    /// Append a qualifier, keeping insertion order.
    pub fn with_qualifier(mut self, key: impl Into<String>, value: impl Into<QualifierValue>) -> Self {
        self.qualifiers.insert(key.into(), value.into());
        self
    }

    /// Whether this fact is a short-term memory.
    pub fn is_short_term(&self) -> bool {
        self.qualifiers.contains_key(CURRENT_TIME)
    }

    /// Whether the agent node is the head or the tail.
    pub fn mentions_agent(&self) -> bool {
        self.head == AGENT || self.tail == AGENT
    }

    /// Latest timestamp, if this is an episodic memory.
    pub fn latest_timestamp(&self) -> Option<f64> {
        self.qualifiers.get(TIMESTAMP).and_then(QualifierValue::reduce)
    }

    /// Strength, if this is a semantic memory.
    pub fn strength(&self) -> Option<f64> {
        self.qualifiers.get(STRENGTH).and_then(QualifierValue::reduce)
    }
}

impl From<QuadrupleRepr> for Quadruple {
    fn from((head, relation, tail, qualifiers): QuadrupleRepr) -> Self {
        Self {
            head,
            relation,
            tail,
            qualifiers,
        }
    }
}

impl From<Quadruple> for QuadrupleRepr {
    fn from(q: Quadruple) -> Self {
        (q.head, q.relation, q.tail, q.qualifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_quadruple() {
        let q: Quadruple = serde_json::from_str(
            r#"["room_000", "east", "room_001", {"current_time": 2, "timestamp": [0], "strength": 1}]"#,
        )
        .unwrap();

        assert_eq!(q.head, "room_000");
        assert_eq!(q.relation, "east");
        assert_eq!(q.tail, "room_001");
        let keys: Vec<&str> = q.qualifiers.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["current_time", "timestamp", "strength"]);
        assert_eq!(q.qualifiers[TIMESTAMP], QualifierValue::Sequence(vec![0]));
        assert!(q.is_short_term());
    }

    #[test]
    fn test_entity_name_rounding() {
        assert_eq!(QualifierValue::from(1.8).entity_name("strength").unwrap(), "2");
        assert_eq!(QualifierValue::from(2.5).entity_name("strength").unwrap(), "2");
        assert_eq!(QualifierValue::from(3.5).entity_name("strength").unwrap(), "4");
        assert_eq!(QualifierValue::from(-0.4).entity_name("strength").unwrap(), "0");
        assert_eq!(QualifierValue::from(vec![0, 7, 3]).entity_name("timestamp").unwrap(), "7");
    }

    #[test]
    fn test_invalid_qualifier_values() {
        let empty = QualifierValue::Sequence(vec![]);
        assert!(matches!(
            empty.entity_name("timestamp"),
            Err(QuadnetError::InvalidQualifier { .. })
        ));

        let nan = QualifierValue::Scalar(f64::NAN);
        assert!(nan.entity_name("strength").is_err());
    }

    #[test]
    fn test_agent_and_memory_kind() {
        let q = Quadruple::new("agent", "atlocation", "room_000").with_qualifier(TIMESTAMP, vec![1, 4]);
        assert!(q.mentions_agent());
        assert!(!q.is_short_term());
        assert_eq!(q.latest_timestamp(), Some(4.0));
        assert_eq!(q.strength(), None);
    }
}
