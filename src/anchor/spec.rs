//! Anchor Specification
//!
//! The serialized, author-facing form of an anchor: an ordered list of
//! literal fences with optional gap bounds between them. Nothing here is
//! validated; see [`AnchorPattern::compile`](super::AnchorPattern::compile).
//!
//! # Example YAML Format
//!
//! ```yaml
//! anchor:
//!   fences:
//!     - "const serviceGenerator = new SpringBootServiceGenerator();"
//!     - "Spring Boot microservices locally.`;"
//!   gaps:
//!     - { min: 0 }
//!   not_followed_by: "\n      // deferred"
//! ```

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bounds on the text allowed between two adjacent fences.
///
/// Lengths count characters, not bytes. A missing `max` means the gap is
/// unbounded but still matched lazily.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GapSpec {
    /// Minimum number of characters in the gap
    #[serde(default)]
    pub min: i64,

    /// Maximum number of characters in the gap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

impl GapSpec {
    /// A gap of any length, matched as short as possible.
    pub fn unbounded() -> Self {
        Self { min: 0, max: None }
    }

    /// A gap between `min` and `max` characters long.
    pub fn between(min: i64, max: i64) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    /// A gap of at least `min` characters.
    pub fn at_least(min: i64) -> Self {
        Self { min, max: None }
    }
}

/// Literal-with-gaps description of the region a step replaces.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct AnchorSpec {
    /// Literal text segments, matched byte-for-byte in order
    #[serde(deserialize_with = "single_or_vec", default)]
    pub fences: Vec<String>,

    /// One bound per pair of adjacent fences; all unbounded when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaps: Option<Vec<GapSpec>>,

    /// Reject a match whose first fence directly follows this text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_preceded_by: Option<String>,

    /// Reject a match whose last fence is directly followed by this text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_followed_by: Option<String>,
}

/// Deserializes either a single string or array of strings into Vec<String>
fn single_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    match val {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s]),
        Value::Array(arr) => arr
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                _ => Err(de::Error::custom("Expected string in fence list")),
            })
            .collect(),
        _ => Err(de::Error::custom("Expected string or array of strings")),
    }
}

impl AnchorSpec {
    /// Creates an anchor from an ordered list of fences with unbounded gaps.
    pub fn new<I, S>(fences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fences: fences.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Creates an anchor consisting of a single literal fence.
    ///
    /// # Example
    ///
    /// ```
    /// use docmigrate::anchor::AnchorSpec;
    ///
    /// let spec = AnchorSpec::literal("STEP_A_MARK").with_not_followed_by("\nSTEP_B_MARK");
    /// assert_eq!(spec.fences, vec!["STEP_A_MARK"]);
    /// ```
    pub fn literal(text: impl Into<String>) -> Self {
        Self::new([text.into()])
    }

    /// Sets explicit gap bounds.
    pub fn with_gaps(mut self, gaps: Vec<GapSpec>) -> Self {
        self.gaps = Some(gaps);
        self
    }

    /// Sets the negative guard checked before the first fence.
    pub fn with_not_preceded_by(mut self, guard: impl Into<String>) -> Self {
        self.not_preceded_by = Some(guard.into());
        self
    }

    /// Sets the negative guard checked after the last fence.
    pub fn with_not_followed_by(mut self, guard: impl Into<String>) -> Self {
        self.not_followed_by = Some(guard.into());
        self
    }
}
