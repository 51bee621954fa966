//! Module path matching logic.
//!
//! # Responsibilities
//! - Compile glob patterns into anchored regular expressions
//! - Match whole module paths against them
//!
//! # Design Decisions
//! - Every character except `*` matches literally (regex metacharacters are
//!   escaped first)
//! - `*` matches any substring, including `/` and the empty string
//! - Anchored at both ends: `github.com/acme/*` does not match `github.com/acme`

use regex::Regex;

/// Trait for matching module paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the module path matches this condition.
    fn matches(&self, module: &str) -> bool;
}

/// A compiled module glob.
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    glob: String,
    regex: Regex,
}

impl GlobMatcher {
    /// Compile a glob.
    pub fn new(glob: impl Into<String>) -> Result<Self, regex::Error> {
        let glob = glob.into();
        let regex = Regex::new(&glob_to_regex(&glob))?;
        Ok(Self { glob, regex })
    }

    /// The pattern as configured.
    pub fn glob(&self) -> &str {
        &self.glob
    }
}

impl Matcher for GlobMatcher {
    fn matches(&self, module: &str) -> bool {
        self.regex.is_match(module)
    }
}

/// Translate a glob into an anchored regular expression.
pub fn glob_to_regex(glob: &str) -> String {
    format!("^{}$", regex::escape(glob).replace(r"\*", "(.*)"))
}
