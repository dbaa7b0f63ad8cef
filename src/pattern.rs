//! Resource selectors with glob support.
//!
//! A selector is `[kind/]body` where `kind` is one of `command`, `skill`,
//! `agent` or `package` (singular or plural) and `body` is either an exact
//! name or a glob over names.
//!
//! # Pattern Syntax
//!
//! A body is a pattern when it contains any of `*`, `?`, `[` or `{`:
//!
//! - `*` matches any sequence of characters, including `/` in nested command names
//! - `?` matches any single character
//! - `[abc]` / `[a-z]` match one character from the set or range
//! - `{foo,bar}` matches either alternative
//!
//! Without a `kind/` prefix a selector matches across every kind.
//!
//! # Examples
//!
//! ```rust,no_run
//! use aimgr::pattern::{Candidate, expand};
//! use aimgr::core::ResourceKind;
//!
//! # fn example() -> anyhow::Result<()> {
//! let universe = vec![
//!     Candidate::resource(ResourceKind::Skill, "pdf-processing"),
//!     Candidate::resource(ResourceKind::Command, "pdf-export"),
//! ];
//!
//! assert_eq!(expand("skill/pdf*", &universe)?, vec!["skill/pdf-processing"]);
//! assert_eq!(expand("pdf*", &universe)?.len(), 2);
//! # Ok(())
//! # }
//! ```

use globset::{Glob, GlobMatcher};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, trace};

use crate::core::{AimgrError, ResourceKind};
use crate::resource::{PACKAGE_KIND, Resource};

const GLOB_METACHARACTERS: &[char] = &['*', '?', '[', '{'];

/// Kind filter of a selector: a resource kind or packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SelectorKind {
    /// A resource kind
    Resource(ResourceKind),
    /// Packages
    Package,
}

impl SelectorKind {
    /// Parse `command`, `skills`, `package`, ... case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        if lower == PACKAGE_KIND || lower == "packages" {
            return Some(Self::Package);
        }
        ResourceKind::parse(&lower).map(Self::Resource)
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(kind) => write!(f, "{kind}"),
            Self::Package => f.write_str(PACKAGE_KIND),
        }
    }
}

/// One item a selector can expand to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Candidate {
    /// Item kind
    pub kind: SelectorKind,
    /// Item name
    pub name: String,
}

impl Candidate {
    /// A resource candidate.
    pub fn resource(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Resource(kind),
            name: name.into(),
        }
    }

    /// A package candidate.
    pub fn package(name: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Package,
            name: name.into(),
        }
    }

    /// `kind/name` form.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }
}

/// A compiled selector.
#[derive(Debug, Clone)]
pub struct Selector {
    raw: String,
    kind: Option<SelectorKind>,
    body: String,
    matcher: Option<GlobMatcher>,
}

impl Selector {
    /// Parse and compile a selector.
    ///
    /// # Errors
    ///
    /// Empty selectors, empty bodies and malformed glob groups are rejected.
    pub fn parse(selector: &str) -> Result<Self, AimgrError> {
        let invalid = |reason: String| AimgrError::InvalidPattern {
            pattern: selector.to_string(),
            reason,
        };

        if selector.trim().is_empty() {
            return Err(invalid("selector cannot be empty".to_string()));
        }

        let (kind, body) = match selector.split_once('/') {
            Some((prefix, rest)) => match SelectorKind::parse(prefix) {
                Some(kind) => (Some(kind), rest),
                None => (None, selector),
            },
            None => (None, selector),
        };

        if body.is_empty() {
            return Err(invalid("missing name after type prefix".to_string()));
        }

        let matcher = if body.contains(GLOB_METACHARACTERS) {
            let glob = Glob::new(body).map_err(|e| invalid(e.to_string()))?;
            Some(glob.compile_matcher())
        } else {
            None
        };

        trace!("Parsed selector '{}' (kind: {:?}, pattern: {})", selector, kind, matcher.is_some());

        Ok(Self {
            raw: selector.to_string(),
            kind,
            body: body.to_string(),
            matcher,
        })
    }

    /// The selector as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Kind prefix, if any.
    #[must_use]
    pub const fn kind_filter(&self) -> Option<SelectorKind> {
        self.kind
    }

    /// Whether the body contains glob metacharacters.
    #[must_use]
    pub const fn is_pattern(&self) -> bool {
        self.matcher.is_some()
    }

    /// Name part after the kind prefix.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether the body matches `name` (exact comparison for literal selectors).
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        match &self.matcher {
            Some(matcher) => matcher.is_match(name),
            None => self.body == name,
        }
    }

    /// Whether the selector matches an item of `kind` named `name`.
    #[must_use]
    pub fn matches(&self, kind: SelectorKind, name: &str) -> bool {
        self.kind.is_none_or(|filter| filter == kind) && self.matches_name(name)
    }

    /// Resources matching this selector, in input order.
    #[must_use]
    pub fn filter<'a>(&self, resources: &'a [Resource]) -> Vec<&'a Resource> {
        resources
            .iter()
            .filter(|r| self.matches(SelectorKind::Resource(r.kind), &r.name))
            .collect()
    }
}

/// Expand a selector into references against `universe`.
///
/// - Literal selector with a kind: returned unchanged without consulting the
///   universe (existence is checked by whoever resolves it).
/// - Literal bare name: returned unchanged when some item has that name.
/// - Pattern: every match as `kind/name`, de-duplicated and sorted by
///   `(kind, name)`.
///
/// # Errors
///
/// Invalid selectors, and selectors (other than kinded literals) that match nothing.
pub fn expand(selector: &str, universe: &[Candidate]) -> Result<Vec<String>, AimgrError> {
    let compiled = Selector::parse(selector)?;

    if !compiled.is_pattern() {
        let known = compiled.kind_filter().is_some() || universe.iter().any(|c| c.name == compiled.body());
        if !known {
            return Err(AimgrError::NoMatches {
                pattern: selector.to_string(),
            });
        }
        return Ok(vec![selector.to_string()]);
    }

    let matched: BTreeSet<&Candidate> =
        universe.iter().filter(|c| compiled.matches(c.kind, &c.name)).collect();

    if matched.is_empty() {
        return Err(AimgrError::NoMatches {
            pattern: selector.to_string(),
        });
    }

    debug!("Selector '{}' matched {} item(s)", selector, matched.len());
    Ok(matched.into_iter().map(Candidate::reference).collect())
}
