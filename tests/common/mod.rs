#![allow(dead_code)]

use std::sync::Mutex;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use squad_notifier::{
    Attachment, Author, ChannelError, ChatChannel, Config, Forge, Issue, Repo, parse_flags,
};

/// Builds a configuration from the required flags plus `extra`, ignoring
/// any `SQUAD_NOTIFIER_*` variables in the environment.
pub fn config(extra: &[&str]) -> Config {
    let required = [
        "squad-notifier",
        "--github-token",
        "ghp_test",
        "--slack-webhook",
        "https://hooks.slack.com/services/T000/B000/XXXX",
        "--target-channel",
        "#squad",
        "--schedules",
        "0 8 * * 1-5",
    ];
    let (config, _) = parse_flags(required.iter().chain(extra.iter()).copied()).unwrap();
    config
}

pub fn pull_request(number: u64, labels: &[&str]) -> Issue {
    Issue {
        number,
        title: format!("Pull request {number}"),
        author: Author {
            login: "alice".to_string(),
            profile_url: "https://github.com/alice".to_string(),
            avatar_url: "https://avatars.githubusercontent.com/u/1".to_string(),
        },
        created_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        html_url: format!("https://github.com/octo/api/issues/{number}"),
        is_pull_request: true,
        pull_request_url: Some(format!("https://github.com/octo/api/pull/{number}")),
    }
}

pub fn plain_issue(number: u64, labels: &[&str]) -> Issue {
    Issue {
        is_pull_request: false,
        pull_request_url: None,
        ..pull_request(number, labels)
    }
}

/// Mock forge that serves canned issues and records every query.
pub struct MockHub {
    pub issues: Vec<Issue>,
    pub failing_repo: Option<Repo>,
    pub calls: Mutex<Vec<(String, Option<String>)>>,
}

impl MockHub {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self {
            issues,
            failing_repo: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_for(mut self, repo: &str) -> Self {
        self.failing_repo = Some(Repo::parse(repo).unwrap());
        self
    }

    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Forge for MockHub {
    async fn open_issues(&self, repo: &Repo, label: Option<&str>) -> Result<Vec<Issue>> {
        self.calls
            .lock()
            .unwrap()
            .push((repo.to_string(), label.map(str::to_string)));

        if self.failing_repo.as_ref() == Some(repo) {
            bail!("401 Bad credentials");
        }

        Ok(self
            .issues
            .iter()
            .filter(|issue| label.is_none_or(|l| issue.labels.iter().any(|il| il == l)))
            .cloned()
            .collect())
    }
}

/// Channel that records every posted message.
#[derive(Default)]
pub struct RecordingChannel {
    pub posts: Mutex<Vec<(String, Vec<Attachment>)>>,
}

impl RecordingChannel {
    pub fn posts(&self) -> Vec<(String, Vec<Attachment>)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatChannel for RecordingChannel {
    async fn post(&self, text: &str, attachments: &[Attachment]) -> Result<(), ChannelError> {
        self.posts
            .lock()
            .unwrap()
            .push((text.to_string(), attachments.to_vec()));
        Ok(())
    }
}
