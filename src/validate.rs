//! Run form and its validation rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Renovate configuration the form is pre-filled with.
pub const DEFAULT_CONFIG_TEXT: &str = "{\n  \"extends\": [\"config:recommended\"]\n}";

const GITHUB_PREFIX: &str = "https://github.com/";

/// A single failing form field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Repository URL must look like https://github.com/<owner>/<repo>")]
    InvalidRepositoryUrl,

    #[error("A GitHub token is required")]
    MissingToken,

    #[error("Renovate config is not valid JSON: {0}")]
    InvalidConfig(String),
}

/// Every failing field of a submitted form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid form: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
pub struct FormErrors(pub Vec<FormError>);

/// User input for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunForm {
    pub repository_url: String,
    pub token: String,
    pub config_text: String,
}

impl RunForm {
    pub fn new(repository_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            repository_url: repository_url.into(),
            token: token.into(),
            config_text: DEFAULT_CONFIG_TEXT.to_string(),
        }
    }

    pub fn with_config(mut self, config_text: impl Into<String>) -> Self {
        self.config_text = config_text.into();
        self
    }

    /// Checks all fields and reports every failure, not just the first.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = Vec::new();

        if !is_github_repository_url(&self.repository_url) {
            errors.push(FormError::InvalidRepositoryUrl);
        }
        if self.token.is_empty() {
            errors.push(FormError::MissingToken);
        }
        if let Err(e) = serde_json::from_str::<serde_json::Value>(&self.config_text) {
            errors.push(FormError::InvalidConfig(e.to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FormErrors(errors))
        }
    }
}

/// Matches `^https://github\.com/[\w.-]+/[\w.-]+/?$`.
pub fn is_github_repository_url(url: &str) -> bool {
    let Some(path) = url.strip_prefix(GITHUB_PREFIX) else {
        return false;
    };
    let path = path.strip_suffix('/').unwrap_or(path);

    let mut segments = path.split('/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some(owner), Some(repo), None) => is_name_segment(owner) && is_name_segment(repo),
        _ => false,
    }
}

fn is_name_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_url_rule() {
        assert!(is_github_repository_url("https://github.com/renovatebot/renovate"));
        assert!(is_github_repository_url("https://github.com/my_org/my.repo-name/"));

        assert!(!is_github_repository_url("http://github.com/owner/repo"));
        assert!(!is_github_repository_url("https://github.com/owner"));
        assert!(!is_github_repository_url("https://github.com/owner/"));
        assert!(!is_github_repository_url("https://github.com/owner/repo//"));
        assert!(!is_github_repository_url("https://github.com/owner/repo/tree"));
        assert!(!is_github_repository_url("https://gitlab.com/owner/repo"));
        assert!(!is_github_repository_url("https://github.com/own er/repo"));
        assert!(!is_github_repository_url(""));
    }

    #[test]
    fn test_default_form_config_is_valid() {
        let form = RunForm::new("https://github.com/owner/repo", "ghp_token");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_validate_collects_every_error() {
        let form = RunForm::new("not a url", "").with_config("{ nope");
        let errors = form.validate().unwrap_err();

        assert_eq!(errors.0.len(), 3);
        assert_eq!(errors.0[0], FormError::InvalidRepositoryUrl);
        assert_eq!(errors.0[1], FormError::MissingToken);
        assert!(matches!(errors.0[2], FormError::InvalidConfig(_)));
    }
}
