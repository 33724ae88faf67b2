use std::{fmt, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use tracing::info;

use crate::{
    config::Config,
    error::ConfigError,
    github::Forge,
    query::fetch_issues,
    slack::ChatChannel,
    summary::post_summary,
    types::Repo,
};

/// What caused a notification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    Schedule(String),
    Once,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Manual => write!(f, "Manual Refresh"),
            Trigger::Schedule(expression) => write!(f, "Schedule '{expression}'"),
            Trigger::Once => write!(f, "Single run"),
        }
    }
}

/// Totals for one notification run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub queries: usize,
    pub messages: usize,
    pub pull_requests: usize,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} queries, {} messages posted, {} pull requests reported",
            self.queries, self.messages, self.pull_requests
        )
    }
}

/// Notifies the channel of open pull requests for every configured
/// repository.
///
/// Repositories and labels are processed in configuration order, one at a
/// time. The first failure aborts the run; messages already posted stay
/// posted.
pub async fn run<F, C>(config: &Config, forge: &F, channel: &C) -> Result<RunReport>
where
    F: Forge + ?Sized,
    C: ChatChannel + ?Sized,
{
    if config.target_repos.is_empty() {
        return Err(ConfigError::NoTargetRepos.into());
    }

    let mut report = RunReport::default();

    for repo in &config.target_repos {
        if config.queries_unlabelled(repo) {
            notify_repo(config, forge, channel, repo, None, &mut report).await?;
        } else {
            for label in &config.target_labels {
                let label = Some(label.as_str());
                notify_repo(config, forge, channel, repo, label, &mut report).await?;
            }
        }
    }

    Ok(report)
}

async fn notify_repo<F, C>(
    config: &Config,
    forge: &F,
    channel: &C,
    repo: &Repo,
    label: Option<&str>,
    report: &mut RunReport,
) -> Result<()>
where
    F: Forge + ?Sized,
    C: ChatChannel + ?Sized,
{
    let issues = fetch_issues(forge, repo, label, &config.label_rules).await?;
    report.queries += 1;

    let now = Local::now();
    if post_summary(channel, repo, &issues, label, &config.label_rules, &now).await? {
        report.messages += 1;
        report.pull_requests += issues.len();
    }

    Ok(())
}

/// Something that can perform a complete notification run.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn execute(&self, trigger: &Trigger) -> Result<RunReport>;
}

/// The production runner: shared configuration plus the two clients.
pub struct Notifier<F, C> {
    config: Arc<Config>,
    forge: F,
    channel: C,
}

impl<F, C> Notifier<F, C> {
    pub fn new(config: Arc<Config>, forge: F, channel: C) -> Self {
        Self {
            config,
            forge,
            channel,
        }
    }
}

#[async_trait]
impl<F, C> Runner for Notifier<F, C>
where
    F: Forge + 'static,
    C: ChatChannel + 'static,
{
    async fn execute(&self, trigger: &Trigger) -> Result<RunReport> {
        info!(%trigger, "EXECUTING: Notify Slack of open Pull Requests");

        let report = run(&self.config, &self.forge, &self.channel).await?;

        info!(
            %trigger,
            queries = report.queries,
            messages = report.messages,
            pull_requests = report.pull_requests,
            "COMPLETE: Notify Slack of open Pull Requests"
        );
        Ok(report)
    }
}
