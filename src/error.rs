use thiserror::Error;

use crate::types::RepoError;

/// Problems with the notifier's configuration.
///
/// Everything except `NoTargetRepos` is detected while loading
/// configuration and stops the process before it starts serving.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("at least one cron schedule must be configured")]
    NoSchedules,

    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidSchedule { expression: String, reason: String },

    #[error("invalid repository '{repo}': {source}")]
    InvalidRepo {
        repo: String,
        #[source]
        source: RepoError,
    },

    #[error("No target repos configured")]
    NoTargetRepos,
}

/// Errors raised while posting to the chat webhook.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Slack returned {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}
