// src/version/selector.rs

//! Selector expressions over versions
//!
//! A selector is a non-empty, `||`-combined list of criteria; it matches a
//! version when any criterion does. Criteria cover exact matches, the four
//! comparators, tilde/caret shorthands, inclusive ranges (`1.0 - 1.9.2`),
//! the universal `*`, and wildcard patterns (`x.6.x`).

use crate::error::{Error, Result};
use crate::version::Version;
use std::fmt;
use std::str::FromStr;

/// A comparison operator in a `Compare` criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn apply(self, candidate: &Version, bound: &Version) -> bool {
        match self {
            CompareOp::Lt => candidate < bound,
            CompareOp::Le => candidate <= bound,
            CompareOp::Gt => candidate > bound,
            CompareOp::Ge => candidate >= bound,
        }
    }

    fn token(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// One clause of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingleCriterion {
    /// Matches every version
    Any,
    /// Matches exactly one version
    Exact(Version),
    /// Matches versions on one side of a bound
    Compare(CompareOp, Version),
    /// Same major and minor, at or above the bound
    Tilde(Version),
    /// Same major, at or above the bound
    Caret(Version),
    /// Inclusive range
    Range(Version, Version),
    /// Component-wise wildcard match; `None` components match anything
    Pattern {
        major: Option<u64>,
        minor: Option<u64>,
        patch: Option<u64>,
        /// When true the prerelease component is a wildcard; otherwise only
        /// versions without a prerelease match.
        any_prerelease: bool,
    },
}

impl SingleCriterion {
    /// Whether a concrete version satisfies this criterion.
    pub fn matches(&self, candidate: &Version) -> bool {
        match self {
            SingleCriterion::Any => true,
            SingleCriterion::Exact(v) => candidate == v,
            SingleCriterion::Compare(op, v) => op.apply(candidate, v),
            // Tilde and caret are an equality conjunction with `>=`, not a
            // range with a computed upper bound.
            SingleCriterion::Tilde(v) => {
                candidate.major == v.major && candidate.minor == v.minor && candidate >= v
            }
            SingleCriterion::Caret(v) => candidate.major == v.major && candidate >= v,
            SingleCriterion::Range(lo, hi) => candidate >= lo && candidate <= hi,
            SingleCriterion::Pattern {
                major,
                minor,
                patch,
                any_prerelease,
            } => {
                major.is_none_or(|m| m == candidate.major)
                    && minor.is_none_or(|m| m == candidate.minor)
                    && patch.is_none_or(|p| p == candidate.patch)
                    && (*any_prerelease || candidate.prerelease.is_none())
            }
        }
    }
}

/// An OR-combination of criteria. Always non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    criteria: Vec<SingleCriterion>,
}

impl Selector {
    /// Parse a selector expression, e.g. `^1.2 || ~2.0.1`.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidSelector(text.to_string()));
        }
        let criteria = trimmed
            .split("||")
            .map(|clause| parse_criterion(clause.trim(), text))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { criteria })
    }

    /// Whether any criterion matches the candidate.
    pub fn matches(&self, candidate: &Version) -> bool {
        self.criteria.iter().any(|c| c.matches(candidate))
    }

    /// The highest matching version out of `candidates`, or `None` when
    /// nothing matches. On an exact tie the earliest candidate wins.
    pub fn best_of<'a, I>(&self, candidates: I) -> Option<Version>
    where
        I: IntoIterator<Item = &'a Version>,
    {
        let mut best: Option<&Version> = None;
        for candidate in candidates {
            if !self.matches(candidate) {
                continue;
            }
            match best {
                Some(current) if candidate <= current => {}
                _ => best = Some(candidate),
            }
        }
        best.cloned()
    }

    /// The pinned version when this selector is a single `Exact` criterion.
    /// Lets the installer special-case pinned dependencies without listing
    /// candidates.
    pub fn fixed_version(&self) -> Option<&Version> {
        match self.criteria.as_slice() {
            [SingleCriterion::Exact(v)] => Some(v),
            _ => None,
        }
    }
}

fn parse_criterion(clause: &str, whole: &str) -> Result<SingleCriterion> {
    if clause.is_empty() {
        return Err(Error::InvalidSelector(whole.to_string()));
    }

    if clause == "*" {
        return Ok(SingleCriterion::Any);
    }

    // Inclusive range: `A - B`, space-hyphen-space.
    if let Some((lo, hi)) = clause.split_once(" - ") {
        let lo = Version::parse(lo).map_err(|_| Error::InvalidSelector(whole.to_string()))?;
        let hi = Version::parse(hi).map_err(|_| Error::InvalidSelector(whole.to_string()))?;
        return Ok(SingleCriterion::Range(lo, hi));
    }

    // Leading operator token followed by a version string.
    for (token, build) in OPERATORS {
        if let Some(rest) = clause.strip_prefix(token) {
            let rest = rest.trim();
            if rest.is_empty() {
                return Err(Error::InvalidSelector(whole.to_string()));
            }
            let version =
                Version::parse(rest).map_err(|_| Error::InvalidSelector(whole.to_string()))?;
            return Ok(build(version));
        }
    }

    // `*` and `-` only appear in the forms handled above; combined with an
    // explicit version they are malformed.
    if clause.contains('*') || clause.contains(" -") || clause.contains("- ") {
        return Err(Error::InvalidSelector(whole.to_string()));
    }

    // A bare version with `x` placeholders in its numeric components is a
    // wildcard pattern; without them it is an exact match.
    if has_placeholder(clause) {
        return parse_pattern(clause, whole);
    }

    let version = Version::parse(clause).map_err(|_| Error::InvalidSelector(whole.to_string()))?;
    Ok(SingleCriterion::Exact(version))
}

type Build = fn(Version) -> SingleCriterion;

/// Operator tokens, longest first so `<=` wins over `<`.
const OPERATORS: [(&str, Build); 7] = [
    ("<=", |v| SingleCriterion::Compare(CompareOp::Le, v)),
    (">=", |v| SingleCriterion::Compare(CompareOp::Ge, v)),
    ("<", |v| SingleCriterion::Compare(CompareOp::Lt, v)),
    (">", |v| SingleCriterion::Compare(CompareOp::Gt, v)),
    ("=", SingleCriterion::Exact),
    ("~", SingleCriterion::Tilde),
    ("^", SingleCriterion::Caret),
];

/// Whether any numeric component of the clause is the literal `x`.
fn has_placeholder(clause: &str) -> bool {
    let numeric = clause.split_once('-').map_or(clause, |(n, _)| n);
    numeric.split('.').any(|c| c == "x")
}

fn parse_pattern(clause: &str, whole: &str) -> Result<SingleCriterion> {
    let (numeric, prerelease) = match clause.split_once('-') {
        Some((n, p)) => (n, Some(p)),
        None => (clause, None),
    };

    // Only `-x` is meaningful after a pattern; a concrete prerelease would
    // make the wildcard components ambiguous.
    let any_prerelease = match prerelease {
        None => false,
        Some("x") => true,
        Some(_) => return Err(Error::InvalidSelector(whole.to_string())),
    };

    let components: Vec<&str> = numeric.split('.').collect();
    if components.is_empty() || components.len() > 3 {
        return Err(Error::InvalidSelector(whole.to_string()));
    }
    let mut parsed = [None; 3];
    for (i, component) in components.iter().enumerate() {
        parsed[i] = match *component {
            "x" => None,
            c if !c.is_empty() && c.bytes().all(|b| b.is_ascii_digit()) => Some(
                c.parse()
                    .map_err(|_| Error::InvalidSelector(whole.to_string()))?,
            ),
            _ => return Err(Error::InvalidSelector(whole.to_string())),
        };
    }
    // Missing trailing components behave as wildcards, so `1.x` matches any
    // patch level of any 1.x minor.
    Ok(SingleCriterion::Pattern {
        major: parsed[0],
        minor: parsed[1],
        patch: parsed[2],
        any_prerelease,
    })
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, criterion) in self.criteria.iter().enumerate() {
            if i > 0 {
                write!(f, " || ")?;
            }
            match criterion {
                SingleCriterion::Any => write!(f, "*")?,
                SingleCriterion::Exact(v) => write!(f, "{}", v)?,
                SingleCriterion::Compare(op, v) => write!(f, "{}{}", op.token(), v)?,
                SingleCriterion::Tilde(v) => write!(f, "~{}", v)?,
                SingleCriterion::Caret(v) => write!(f, "^{}", v)?,
                SingleCriterion::Range(lo, hi) => write!(f, "{} - {}", lo, hi)?,
                SingleCriterion::Pattern {
                    major,
                    minor,
                    patch,
                    any_prerelease,
                } => {
                    let part = |c: &Option<u64>| match c {
                        Some(n) => n.to_string(),
                        None => "x".to_string(),
                    };
                    write!(f, "{}.{}.{}", part(major), part(minor), part(patch))?;
                    if *any_prerelease {
                        write!(f, "-x")?;
                    }
                }
            }
        }
        Ok(())
    }
}
