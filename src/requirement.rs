// src/requirement.rs

//! Dependency requirement lines
//!
//! One manifest dependency value is a single line of the form
//!
//! `[--flag]* [--option=value]* (<selector-expr> | <path> | git+<url>[@<ref>])`
//!
//! Flags are `pure`, `internal`, `link`, `optional`, and `recursive`, each
//! tri-state: a flag left unset inherits the caller-supplied default, and a
//! `--no-` prefix forces it off. The only option is `registry=<name>`.

use crate::error::{Error, Result};
use crate::version::Selector;
use std::path::PathBuf;
use tracing::warn;

/// A flag that may be explicitly on, explicitly off, or inherited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    #[default]
    Unset,
    On,
    Off,
}

impl TriState {
    /// Collapse to a concrete bool, falling back to the caller's default.
    pub fn resolve(self, default: bool) -> bool {
        match self {
            TriState::Unset => default,
            TriState::On => true,
            TriState::Off => false,
        }
    }
}

/// Where a requirement's package comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Resolved against the configured registries by selector
    Registry(Selector),
    /// A local directory, or a local archive file
    Path { path: PathBuf, link: bool },
    /// A git URL, optionally pinned to a ref
    VersionControl {
        url: String,
        reference: Option<String>,
        recursive: bool,
    },
}

/// The tri-state flag block of a requirement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    pub pure: TriState,
    pub internal: TriState,
    pub link: TriState,
    pub optional: TriState,
    pub recursive: TriState,
}

/// A parsed dependency line. Immutable once parsed; the name is filled in
/// from the manifest map key (path/URL requirements given on the command
/// line stay anonymous until their manifest is loaded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: Option<String>,
    pub source: Source,
    pub flags: Flags,
    pub registry: Option<String>,
}

impl Requirement {
    /// Parse a requirement line without a name.
    pub fn parse(line: &str) -> Result<Self> {
        let mut flags = Flags::default();
        let mut registry = None;

        let mut rest = line.trim();
        while let Some(stripped) = rest.strip_prefix("--") {
            let (token, tail) = match stripped.split_once(char::is_whitespace) {
                Some((t, tail)) => (t, tail.trim_start()),
                None => (stripped, ""),
            };
            if let Some(value) = token.strip_prefix("registry=") {
                if value.is_empty() {
                    return Err(Error::InvalidSelector(line.to_string()));
                }
                registry = Some(value.to_string());
            } else {
                let (name, state) = match token.strip_prefix("no-") {
                    Some(n) => (n, TriState::Off),
                    None => (token, TriState::On),
                };
                let slot = match name {
                    "pure" => &mut flags.pure,
                    "internal" => &mut flags.internal,
                    "link" => &mut flags.link,
                    "optional" => &mut flags.optional,
                    "recursive" => &mut flags.recursive,
                    _ => return Err(Error::InvalidSelector(line.to_string())),
                };
                *slot = state;
            }
            rest = tail;
        }

        if rest.is_empty() {
            return Err(Error::InvalidSelector(line.to_string()));
        }

        let source = parse_source(rest, &flags)?;
        if flags.link == TriState::On && !matches!(source, Source::Path { .. }) {
            warn!("--link only applies to path dependencies; ignoring for '{}'", rest);
        }
        Ok(Self {
            name: None,
            source,
            flags,
            registry,
        })
    }

    /// Parse a requirement line for a named dependency.
    pub fn parse_named(name: &str, line: &str) -> Result<Self> {
        let mut requirement = Self::parse(line)?;
        requirement.name = Some(name.to_string());
        Ok(requirement)
    }
}

fn parse_source(payload: &str, flags: &Flags) -> Result<Source> {
    if let Some(url_and_ref) = payload.strip_prefix("git+") {
        let (url, reference) = split_git_ref(url_and_ref);
        if url.is_empty() {
            return Err(Error::InvalidSelector(payload.to_string()));
        }
        return Ok(Source::VersionControl {
            url: url.to_string(),
            reference: reference.map(str::to_string),
            recursive: flags.recursive.resolve(false),
        });
    }

    if payload.starts_with("./")
        || payload.starts_with("../")
        || payload.starts_with('/')
        || payload.starts_with("~/")
    {
        return Ok(Source::Path {
            path: PathBuf::from(payload),
            link: flags.link.resolve(false),
        });
    }

    // Everything else must parse as a selector expression.
    let selector = Selector::parse(payload)?;
    Ok(Source::Registry(selector))
}

/// Split `url[@ref]`, leaving `@` alone when it belongs to the URL itself
/// (as in `ssh://git@host/...`): a ref never contains `/`.
fn split_git_ref(url_and_ref: &str) -> (&str, Option<&str>) {
    match url_and_ref.rsplit_once('@') {
        Some((url, reference)) if !reference.is_empty() && !reference.contains('/') => {
            (url, Some(reference))
        }
        _ => (url_and_ref, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    #[test]
    fn test_plain_selector_requirement() {
        let req = Requirement::parse_named("foo", "^1.2.0").unwrap();
        assert_eq!(req.name.as_deref(), Some("foo"));
        match &req.source {
            Source::Registry(selector) => {
                assert!(selector.matches(&Version::parse("1.3.5").unwrap()));
            }
            other => panic!("expected registry source, got {:?}", other),
        }
        assert_eq!(req.flags.link, TriState::Unset);
    }

    #[test]
    fn test_range_selector_survives_tokenizing() {
        let req = Requirement::parse("1.0 - 1.9.2").unwrap();
        match req.source {
            Source::Registry(selector) => {
                assert!(selector.matches(&Version::parse("1.8.0").unwrap()));
            }
            other => panic!("expected registry source, got {:?}", other),
        }
    }

    #[test]
    fn test_flags_and_registry_option() {
        let req = Requirement::parse("--internal --pure --registry=mirror ~2.0").unwrap();
        assert_eq!(req.flags.internal, TriState::On);
        assert_eq!(req.flags.pure, TriState::On);
        assert_eq!(req.flags.link, TriState::Unset);
        assert_eq!(req.registry.as_deref(), Some("mirror"));
    }

    #[test]
    fn test_no_prefix_forces_flag_off() {
        let req = Requirement::parse("--no-optional 1.0.0").unwrap();
        assert_eq!(req.flags.optional, TriState::Off);
        assert!(!req.flags.optional.resolve(true));
    }

    #[test]
    fn test_path_requirement() {
        let req = Requirement::parse("--link ../local-pkg").unwrap();
        match req.source {
            Source::Path { path, link } => {
                assert_eq!(path, PathBuf::from("../local-pkg"));
                assert!(link);
            }
            other => panic!("expected path source, got {:?}", other),
        }
    }

    #[test]
    fn test_git_requirement_with_ref() {
        let req = Requirement::parse("--recursive git+https://example.com/a/b.git@v1.2").unwrap();
        match req.source {
            Source::VersionControl {
                url,
                reference,
                recursive,
            } => {
                assert_eq!(url, "https://example.com/a/b.git");
                assert_eq!(reference.as_deref(), Some("v1.2"));
                assert!(recursive);
            }
            other => panic!("expected vcs source, got {:?}", other),
        }
    }

    #[test]
    fn test_git_ssh_at_sign_not_taken_as_ref() {
        let req = Requirement::parse("git+ssh://git@example.com/a/b.git").unwrap();
        match req.source {
            Source::VersionControl { url, reference, .. } => {
                assert_eq!(url, "ssh://git@example.com/a/b.git");
                assert!(reference.is_none());
            }
            other => panic!("expected vcs source, got {:?}", other),
        }
    }

    #[test]
    fn test_link_flag_on_selector_still_parses_as_registry() {
        let req = Requirement::parse("--link ^1.0").unwrap();
        assert_eq!(req.flags.link, TriState::On);
        assert!(matches!(req.source, Source::Registry(_)));
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Requirement::parse("--frobnicate 1.0.0").is_err());
        assert!(Requirement::parse("--registry= 1.0.0").is_err());
        assert!(Requirement::parse("--link").is_err());
    }

    #[test]
    fn test_empty_line_rejected() {
        assert!(Requirement::parse("").is_err());
        assert!(Requirement::parse("   ").is_err());
    }
}
