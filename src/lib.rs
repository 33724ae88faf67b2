//! Squad notifier: scheduled Slack summaries of open pull requests.
//!
//! Queries GitHub for the open pull requests of a configured set of
//! repositories, classifies each one by review/QA/merge status from its
//! labels, and posts one summary per repository (or per repository and team
//! label) to a Slack channel. Runs are triggered by cron schedules or by a
//! manual HTTP request.

pub mod attachments;
pub mod config;
pub mod error;
pub mod github;
pub mod query;
pub mod schedule;
pub mod server;
pub mod slack;
pub mod status;
pub mod summary;
pub mod tasks;
pub mod types;

pub use attachments::{Attachment, AttachmentField, build_attachments};
pub use config::{Config, RunMode, parse_args, parse_flags};
pub use error::{ChannelError, ConfigError};
pub use github::{Forge, GitHub};
pub use query::fetch_issues;
pub use schedule::{CronSchedule, spawn_schedules};
pub use server::{build_router, run_server};
pub use slack::{ChatChannel, SlackChannel};
pub use status::{LabelRules, Status};
pub use summary::post_summary;
pub use tasks::{Notifier, RunReport, Runner, Trigger, run};
pub use types::{Author, Issue, Repo, RepoError};
