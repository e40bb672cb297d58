//! Compiled Anchor Matcher
//!
//! Locates every non-overlapping occurrence of a fence-and-gap anchor in a
//! buffer. Matching is leftmost-first and lazy: among candidates sharing a
//! start position, the shortest gaps win, and the matcher backtracks to the
//! next fence occurrence only when a later bound or guard fails.

use std::collections::HashSet;
use std::ops::Range;

use thiserror::Error;

use super::spec::{AnchorSpec, GapSpec};

/// Reasons an [`AnchorSpec`] cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("anchor has no fences")]
    NoFences,
    #[error("fence {0} is empty")]
    EmptyFence(usize),
    #[error("anchor with {fences} fences needs {expected} gaps, found {found}")]
    GapCountMismatch {
        fences: usize,
        expected: usize,
        found: usize,
    },
    #[error("gap {gap} has negative bound {bound}")]
    NegativeBound { gap: usize, bound: i64 },
    #[error("gap {gap} has min {min} greater than max {max}")]
    InvertedBounds { gap: usize, min: i64, max: i64 },
    #[error("{0} guard is empty")]
    EmptyGuard(&'static str),
}

/// Compiled bounds between two fences, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    pub min: usize,
    pub max: Option<usize>,
}

impl Gap {
    fn compile(index: usize, spec: &GapSpec) -> Result<Self, PatternError> {
        let min = usize::try_from(spec.min).map_err(|_| PatternError::NegativeBound {
            gap: index,
            bound: spec.min,
        })?;

        let max = match spec.max {
            Some(max) => {
                let bound = usize::try_from(max).map_err(|_| PatternError::NegativeBound {
                    gap: index,
                    bound: max,
                })?;
                if bound < min {
                    return Err(PatternError::InvertedBounds {
                        gap: index,
                        min: spec.min,
                        max,
                    });
                }
                Some(bound)
            }
            None => None,
        };

        Ok(Self { min, max })
    }
}

/// A located occurrence, as byte offsets into the searched buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
}

impl Match {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the matched text.
    pub fn as_str<'t>(&self, text: &'t str) -> &'t str {
        &text[self.range()]
    }
}

/// Immutable matcher compiled from an [`AnchorSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorPattern {
    fences: Vec<String>,
    gaps: Vec<Gap>,
    not_preceded_by: Option<String>,
    not_followed_by: Option<String>,
}

impl AnchorPattern {
    /// Validates and compiles an anchor specification.
    ///
    /// Fails when there are no fences, a fence or guard is empty, the gap
    /// list does not have exactly one entry per adjacent fence pair, or a
    /// gap bound is negative or inverted.
    pub fn compile(spec: &AnchorSpec) -> Result<Self, PatternError> {
        if spec.fences.is_empty() {
            return Err(PatternError::NoFences);
        }

        if let Some(index) = spec.fences.iter().position(|f| f.is_empty()) {
            return Err(PatternError::EmptyFence(index));
        }

        let expected = spec.fences.len() - 1;
        let gaps = match &spec.gaps {
            Some(gaps) => {
                if gaps.len() != expected {
                    return Err(PatternError::GapCountMismatch {
                        fences: spec.fences.len(),
                        expected,
                        found: gaps.len(),
                    });
                }
                gaps.iter()
                    .enumerate()
                    .map(|(i, g)| Gap::compile(i, g))
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => vec![Gap { min: 0, max: None }; expected],
        };

        if spec.not_preceded_by.as_deref() == Some("") {
            return Err(PatternError::EmptyGuard("not_preceded_by"));
        }
        if spec.not_followed_by.as_deref() == Some("") {
            return Err(PatternError::EmptyGuard("not_followed_by"));
        }

        Ok(Self {
            fences: spec.fences.clone(),
            gaps,
            not_preceded_by: spec.not_preceded_by.clone(),
            not_followed_by: spec.not_followed_by.clone(),
        })
    }

    /// Compiles a single-fence anchor.
    pub fn literal(text: impl Into<String>) -> Result<Self, PatternError> {
        Self::compile(&AnchorSpec::literal(text))
    }

    pub fn fences(&self) -> &[String] {
        &self.fences
    }

    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    /// Returns all non-overlapping matches, left to right.
    pub fn find_all(&self, text: &str) -> Vec<Match> {
        let mut matches = Vec::new();
        let mut dead_ends = HashSet::new();
        let first = self.fences[0].as_str();
        let mut cursor = 0;

        while let Some(offset) = text[cursor..].find(first) {
            let start = cursor + offset;
            match self.match_at(text, start, &mut dead_ends) {
                Some(end) => {
                    matches.push(Match { start, end });
                    cursor = end;
                }
                None => cursor = start + char_len_at(text, start),
            }
        }

        matches
    }

    /// Returns the number of non-overlapping matches.
    pub fn count(&self, text: &str) -> usize {
        self.find_all(text).len()
    }

    pub fn is_match(&self, text: &str) -> bool {
        let mut dead_ends = HashSet::new();
        let first = self.fences[0].as_str();
        let mut cursor = 0;

        while let Some(offset) = text[cursor..].find(first) {
            let start = cursor + offset;
            if self.match_at(text, start, &mut dead_ends).is_some() {
                return true;
            }
            cursor = start + char_len_at(text, start);
        }
        false
    }

    /// Tries a match whose first fence begins at `start`; returns its end.
    fn match_at(
        &self,
        text: &str,
        start: usize,
        dead_ends: &mut HashSet<(usize, usize)>,
    ) -> Option<usize> {
        if let Some(guard) = &self.not_preceded_by {
            if text[..start].ends_with(guard.as_str()) {
                return None;
            }
        }
        self.match_from(text, 0, start + self.fences[0].len(), dead_ends)
    }

    /// Matches gap `gap_index` and everything after it, starting at `pos`.
    ///
    /// A failing `(gap_index, pos)` pair fails regardless of where the match
    /// started, so failures are remembered across the whole scan.
    fn match_from(
        &self,
        text: &str,
        gap_index: usize,
        pos: usize,
        dead_ends: &mut HashSet<(usize, usize)>,
    ) -> Option<usize> {
        if gap_index == self.gaps.len() {
            if let Some(guard) = &self.not_followed_by {
                if text[pos..].starts_with(guard.as_str()) {
                    return None;
                }
            }
            return Some(pos);
        }

        if dead_ends.contains(&(gap_index, pos)) {
            return None;
        }

        let result = self.match_gap(text, gap_index, pos, dead_ends);
        if result.is_none() {
            dead_ends.insert((gap_index, pos));
        }
        result
    }

    /// Tries each occurrence of the fence after gap `gap_index`, nearest
    /// first, within the gap's bounds.
    fn match_gap(
        &self,
        text: &str,
        gap_index: usize,
        pos: usize,
        dead_ends: &mut HashSet<(usize, usize)>,
    ) -> Option<usize> {
        let gap = self.gaps[gap_index];
        let fence = self.fences[gap_index + 1].as_str();

        let lo = advance_chars(text, pos, gap.min)?;
        let hi = match gap.max {
            Some(max) => advance_chars(text, pos, max).unwrap_or(text.len()),
            None => text.len(),
        };

        let mut search = lo;
        while search <= hi {
            let candidate = search + text[search..].find(fence)?;
            if candidate > hi {
                return None;
            }
            if let Some(end) =
                self.match_from(text, gap_index + 1, candidate + fence.len(), dead_ends)
            {
                return Some(end);
            }
            search = candidate + char_len_at(text, candidate);
        }
        None
    }
}

/// Byte offset reached by moving `count` characters forward from `from`.
fn advance_chars(text: &str, from: usize, count: usize) -> Option<usize> {
    let rest = &text[from..];
    match rest.char_indices().nth(count) {
        Some((offset, _)) => Some(from + offset),
        None if rest.chars().count() == count => Some(text.len()),
        None => None,
    }
}

/// UTF-8 width of the character starting at `index` (1 at end of text).
fn char_len_at(text: &str, index: usize) -> usize {
    text[index..].chars().next().map_or(1, char::len_utf8)
}
