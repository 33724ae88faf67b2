use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors produced when parsing an `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    #[error("repository must be in format 'owner/repo', got: '{0}'")]
    Format(String),
    #[error("repository owner must not be empty")]
    EmptyOwner,
    #[error("repository name must not be empty")]
    EmptyName,
}

/// A GitHub repository identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repo {
    owner: String,
    name: String,
}

impl Repo {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, RepoError> {
        let owner = owner.into();
        let name = name.into();
        if owner.is_empty() {
            return Err(RepoError::EmptyOwner);
        }
        if name.is_empty() {
            return Err(RepoError::EmptyName);
        }
        Ok(Self { owner, name })
    }

    pub fn parse(repo: &str) -> Result<Self, RepoError> {
        let repo = repo.trim();
        match repo.split_once('/') {
            Some((owner, name)) if !name.contains('/') => Self::new(owner, name),
            _ => Err(RepoError::Format(repo.to_string())),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for Repo {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The account that opened an issue or pull request.
#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub login: String,
    pub profile_url: String,
    pub avatar_url: String,
}

/// An open issue as returned by the GitHub issues API.
///
/// GitHub lists pull requests through the same endpoint as plain issues;
/// `is_pull_request` tells them apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub labels: Vec<String>,
    pub html_url: String,
    pub is_pull_request: bool,
    pub pull_request_url: Option<String>,
}

impl Issue {
    /// Link to the pull request page, falling back to the issue page.
    pub fn link(&self) -> &str {
        self.pull_request_url.as_deref().unwrap_or(&self.html_url)
    }
}
