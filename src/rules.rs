//! Access rule matching — the path side of the authorization decision.
//!
//! Rules are compiled from configuration at startup into a [`RuleSet`] and
//! never change afterwards, so request-time matching is a read-only walk over
//! an ordered slice: the first rule whose pattern matches the request path
//! wins. Paths that match no rule fall through to the built-in
//! requires-authentication rule.

use tracing::debug;

/// A single path pattern: an exact path, or a prefix written with a trailing
/// `/**` segment.
///
/// Prefix patterns match the bare prefix itself as well as anything below it:
/// `/oauth2/**` matches `/oauth2`, `/oauth2/` and `/oauth2/callback`, but not
/// `/oauth2x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    Prefix(String),
}

impl PathPattern {
    /// Parse a pattern string. `"/oauth2/**"` becomes a prefix pattern on
    /// `/oauth2`; anything else is matched exactly.
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix("/**") {
            Some(base) => Self::Prefix(base.to_string()),
            None => Self::Exact(pattern.to_string()),
        }
    }

    /// Whether `path` matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Prefix(base) => {
                path == base
                    || (path.len() > base.len()
                        && path.starts_with(base.as_str())
                        && path.as_bytes()[base.len()] == b'/')
            }
        }
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(exact) => f.write_str(exact),
            Self::Prefix(base) => write!(f, "{base}/**"),
        }
    }
}

/// One access rule: a pattern and whether matching requests need an
/// authenticated session.
#[derive(Debug, Clone)]
pub struct AccessRule {
    pub pattern: PathPattern,
    pub requires_auth: bool,
}

impl AccessRule {
    pub fn public(pattern: &str) -> Self {
        Self {
            pattern: PathPattern::parse(pattern),
            requires_auth: false,
        }
    }

    pub fn authenticated(pattern: &str) -> Self {
        Self {
            pattern: PathPattern::parse(pattern),
            requires_auth: true,
        }
    }
}

/// Ordered, immutable rule list with an authenticated fallback.
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<AccessRule>,
    fallback: AccessRule,
}

impl RuleSet {
    /// Build a rule set from an explicit ordered rule list. The fallback for
    /// unmatched paths always requires authentication.
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self {
            rules,
            fallback: AccessRule {
                pattern: PathPattern::Prefix(String::new()),
                requires_auth: true,
            },
        }
    }

    /// Build the ordered public allow-list used by the gate: one public rule
    /// per configured pattern, everything else authenticated.
    pub fn public_paths<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            patterns
                .into_iter()
                .map(|p| AccessRule::public(p.as_ref()))
                .collect(),
        )
    }

    /// Return the first rule matching `path`, or the authenticated fallback.
    /// Deterministic and side-effect free.
    #[must_use]
    pub fn match_path(&self, path: &str) -> &AccessRule {
        for rule in &self.rules {
            if rule.pattern.matches(path) {
                debug!(path = %path, pattern = %rule.pattern, requires_auth = rule.requires_auth, "Access rule matched");
                return rule;
            }
        }
        debug!(path = %path, "No access rule matched, using authenticated fallback");
        &self.fallback
    }

    /// The configured rules, in match order (fallback excluded).
    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }
}
