//! Test outcomes and the records persisted for them

use crate::digest::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Classified result of one test invocation.
///
/// Serializes with a `result` tag so reports read
/// `{"result":"success","output":"ok"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result")]
pub enum Outcome {
    /// The transpiler rejected the source
    #[serde(rename = "parser error")]
    ParseFailure { error: String },

    /// The agent reported a script-level error
    #[serde(rename = "runtime error")]
    RuntimeFailure { error: serde_json::Value },

    /// The agent finished within the deadline
    #[serde(rename = "success")]
    Success { output: String },

    /// The deadline elapsed first and the agent was terminated
    #[serde(rename = "timeout error")]
    TimeoutFailure { error: String },
}

/// Discriminant of an [`Outcome`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    ParseFailure,
    RuntimeFailure,
    Success,
    TimeoutFailure,
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::ParseFailure { .. } => OutcomeKind::ParseFailure,
            Outcome::RuntimeFailure { .. } => OutcomeKind::RuntimeFailure,
            Outcome::Success { .. } => OutcomeKind::Success,
            Outcome::TimeoutFailure { .. } => OutcomeKind::TimeoutFailure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Whether this outcome may be persisted. Parse failures short-circuit
    /// before a content hash exists, so they never are.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, Outcome::ParseFailure { .. })
    }
}

impl OutcomeKind {
    /// The wire label used in the `result` tag
    pub fn label(self) -> &'static str {
        match self {
            OutcomeKind::ParseFailure => "parser error",
            OutcomeKind::RuntimeFailure => "runtime error",
            OutcomeKind::Success => "success",
            OutcomeKind::TimeoutFailure => "timeout error",
        }
    }
}

impl Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the cache store keeps under a [`crate::CacheKey`].
///
/// The key identifies the test; `content_hash` pins the compiled form the
/// outcome was produced from. A record is reusable only while the freshly
/// computed content hash still matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub content_hash: ContentHash,
    pub outcome: Outcome,
}

impl CacheRecord {
    pub fn new(content_hash: ContentHash, outcome: Outcome) -> Self {
        Self {
            content_hash,
            outcome,
        }
    }

    /// Returns the stored outcome if it was produced from `current`
    pub fn reuse_for(&self, current: &ContentHash) -> Option<&Outcome> {
        (self.content_hash == *current).then_some(&self.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_wire_shapes() {
        let success = Outcome::Success {
            output: "ok".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&success).unwrap(),
            json!({"result": "success", "output": "ok"})
        );

        let runtime = Outcome::RuntimeFailure {
            error: json!({"name": "Test262Error", "message": "expected true"}),
        };
        assert_eq!(
            serde_json::to_value(&runtime).unwrap(),
            json!({
                "result": "runtime error",
                "error": {"name": "Test262Error", "message": "expected true"}
            })
        );

        let parse = Outcome::ParseFailure {
            error: "Unexpected token (1:4)".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&parse).unwrap()["result"],
            json!("parser error")
        );

        let timeout = Outcome::TimeoutFailure {
            error: "test a.js timed out after 10 ms".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&timeout).unwrap()["result"],
            json!("timeout error")
        );
    }

    #[test]
    fn test_kind_labels_match_wire_tags() {
        let outcomes = [
            Outcome::ParseFailure { error: String::new() },
            Outcome::RuntimeFailure { error: json!(null) },
            Outcome::Success { output: String::new() },
            Outcome::TimeoutFailure { error: String::new() },
        ];
        for outcome in outcomes {
            let value = serde_json::to_value(&outcome).unwrap();
            assert_eq!(value["result"], json!(outcome.kind().label()));
        }
    }

    #[test]
    fn test_only_parse_failures_are_uncacheable() {
        assert!(!Outcome::ParseFailure { error: String::new() }.is_cacheable());
        assert!(Outcome::TimeoutFailure { error: String::new() }.is_cacheable());
        assert!(Outcome::RuntimeFailure { error: json!("x") }.is_cacheable());
    }

    #[test]
    fn test_record_reuse_requires_matching_hash() {
        let record = CacheRecord::new(
            ContentHash::new("aaaa"),
            Outcome::Success {
                output: "ok".to_string(),
            },
        );
        assert!(record.reuse_for(&ContentHash::new("aaaa")).is_some());
        assert!(record.reuse_for(&ContentHash::new("bbbb")).is_none());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["contentHash"], json!("aaaa"));
    }
}
