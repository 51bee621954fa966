//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every module pattern compiles to a matcher
//! - Detect duplicate patterns
//! - Check backend addressing is complete
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{BackendConfig, ProxyConfig};
use crate::routing::matcher::GlobMatcher;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("repos[{index}]: pattern must not be empty")]
    EmptyPattern { index: usize },

    #[error("repos[{index}]: pattern '{pattern}' must not contain '@'")]
    PatternContainsVersion { index: usize, pattern: String },

    #[error("repos[{index}]: malformed module glob '{pattern}': {reason}")]
    MalformedPattern {
        index: usize,
        pattern: String,
        reason: String,
    },

    #[error("repos[{index}]: pattern '{pattern}' is already configured")]
    DuplicatePattern { index: usize, pattern: String },

    #[error("repos[{index}]: '{field}' must not be empty")]
    MissingField { index: usize, field: &'static str },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, repo) in config.repos.iter().enumerate() {
        let pattern = repo.pattern.as_str();

        if pattern.trim().is_empty() {
            errors.push(ValidationError::EmptyPattern { index });
            continue;
        }
        if pattern.contains('@') {
            errors.push(ValidationError::PatternContainsVersion {
                index,
                pattern: pattern.to_string(),
            });
        }
        if let Err(e) = GlobMatcher::new(pattern) {
            errors.push(ValidationError::MalformedPattern {
                index,
                pattern: pattern.to_string(),
                reason: e.to_string(),
            });
        }
        if !seen.insert(pattern) {
            errors.push(ValidationError::DuplicatePattern {
                index,
                pattern: pattern.to_string(),
            });
        }

        match &repo.backend {
            BackendConfig::CodeArtifact(ca) => {
                if ca.domain.trim().is_empty() {
                    errors.push(ValidationError::MissingField { index, field: "domain" });
                }
                if ca.repository.trim().is_empty() {
                    errors.push(ValidationError::MissingField { index, field: "repository" });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{CodeArtifactConfig, RepoConfig};

    fn repo(pattern: &str, domain: &str, repository: &str) -> RepoConfig {
        RepoConfig {
            pattern: pattern.to_string(),
            backend: BackendConfig::CodeArtifact(CodeArtifactConfig {
                domain: domain.to_string(),
                domain_owner: None,
                repository: repository.to_string(),
                namespace: None,
                region: None,
            }),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = ProxyConfig {
            repos: vec![repo("github.com/acme/*", "acme", "go")],
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let config = ProxyConfig {
            repos: vec![
                repo("github.com/acme/*", "acme", "go"),
                repo("github.com/acme/*", "", "go"),
                repo("", "acme", "go"),
                repo("example.com/m@v1", "acme", " "),
            ],
            ..Default::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicatePattern {
                    index: 1,
                    pattern: "github.com/acme/*".into()
                },
                ValidationError::MissingField { index: 1, field: "domain" },
                ValidationError::EmptyPattern { index: 2 },
                ValidationError::PatternContainsVersion {
                    index: 3,
                    pattern: "example.com/m@v1".into()
                },
                ValidationError::MissingField { index: 3, field: "repository" },
            ]
        );
    }
}
