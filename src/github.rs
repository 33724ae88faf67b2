use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::Config,
    types::{Author, Issue, Repo},
};

/// Source of open issues for a repository.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Lists open issues (pull requests included) for `repo`, restricted
    /// server-side to `label` when one is given.
    async fn open_issues(&self, repo: &Repo, label: Option<&str>) -> Result<Vec<Issue>>;
}

/// `Forge` backed by the GitHub REST API.
pub struct GitHub {
    client: Octocrab,
}

impl GitHub {
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Creates an authenticated client from the configured token and
    /// optional API base URL.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(config.github_token.clone());
        if let Some(api_url) = &config.github_api_url {
            builder = builder
                .base_uri(api_url.as_str())
                .with_context(|| format!("Invalid GitHub API URL: '{}'", api_url))?;
        }
        let client = builder.build().context("Failed to create GitHub client")?;
        Ok(Self::new(client))
    }
}

#[derive(Debug, Serialize)]
struct ListIssuesParams<'a> {
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<&'a str>,
    per_page: u8,
}

// Only the fields the notifier reads; octocrab's full `Issue` model
// requires many more.
#[derive(Debug, Deserialize)]
struct RestIssue {
    number: u64,
    title: String,
    user: RestUser,
    created_at: DateTime<Utc>,
    #[serde(default)]
    labels: Vec<RestLabel>,
    html_url: String,
    pull_request: Option<RestPullRequestLink>,
}

#[derive(Debug, Deserialize)]
struct RestUser {
    login: String,
    html_url: String,
    avatar_url: String,
}

#[derive(Debug, Deserialize)]
struct RestLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RestPullRequestLink {
    html_url: Option<String>,
}

impl From<RestIssue> for Issue {
    fn from(issue: RestIssue) -> Self {
        let is_pull_request = issue.pull_request.is_some();
        Issue {
            number: issue.number,
            title: issue.title,
            author: Author {
                login: issue.user.login,
                profile_url: issue.user.html_url,
                avatar_url: issue.user.avatar_url,
            },
            created_at: issue.created_at,
            labels: issue.labels.into_iter().map(|label| label.name).collect(),
            html_url: issue.html_url,
            is_pull_request,
            pull_request_url: issue.pull_request.and_then(|pr| pr.html_url),
        }
    }
}

#[async_trait]
impl Forge for GitHub {
    async fn open_issues(&self, repo: &Repo, label: Option<&str>) -> Result<Vec<Issue>> {
        let route = format!("/repos/{}/{}/issues", repo.owner(), repo.name());
        let params = ListIssuesParams {
            state: "open",
            labels: label,
            per_page: 100,
        };

        debug!(%repo, label, "Listing open issues");

        let issues: Vec<RestIssue> = self
            .client
            .get(&route, Some(&params))
            .await
            .with_context(|| match label {
                Some(label) => format!("Failed to list open issues for {repo} with label '{label}'"),
                None => format!("Failed to list open issues for {repo}"),
            })?;

        Ok(issues.into_iter().map(Issue::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_issue_conversion_for_pull_request() {
        let raw: RestIssue = serde_json::from_value(serde_json::json!({
            "number": 42,
            "title": "Add widget",
            "user": {
                "login": "alice",
                "html_url": "https://github.com/alice",
                "avatar_url": "https://avatars.githubusercontent.com/u/1"
            },
            "created_at": "2024-01-15T10:00:00Z",
            "labels": [{ "name": "Pending Review", "color": "fef2c0" }],
            "html_url": "https://github.com/octo/api/issues/42",
            "pull_request": { "html_url": "https://github.com/octo/api/pull/42" }
        }))
        .unwrap();

        let issue = Issue::from(raw);
        assert!(issue.is_pull_request);
        assert_eq!(issue.labels, vec!["Pending Review"]);
        assert_eq!(issue.author.login, "alice");
        assert_eq!(issue.link(), "https://github.com/octo/api/pull/42");
    }

    #[test]
    fn test_rest_issue_conversion_for_plain_issue() {
        let raw: RestIssue = serde_json::from_value(serde_json::json!({
            "number": 7,
            "title": "Bug report",
            "user": {
                "login": "bob",
                "html_url": "https://github.com/bob",
                "avatar_url": "https://avatars.githubusercontent.com/u/2"
            },
            "created_at": "2024-01-15T10:00:00Z",
            "html_url": "https://github.com/octo/api/issues/7"
        }))
        .unwrap();

        let issue = Issue::from(raw);
        assert!(!issue.is_pull_request);
        assert!(issue.labels.is_empty());
        assert_eq!(issue.link(), "https://github.com/octo/api/issues/7");
    }
}
