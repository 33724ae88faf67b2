//! Slack attachment rendering for pull request summaries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    status::{LabelRules, Status},
    types::Issue,
};

pub const COLOR_AMBER: &str = "#fef2c0";
pub const COLOR_PALE_BLUE: &str = "#c5def5";
pub const COLOR_PALE_GREEN: &str = "#bfe5bf";
pub const COLOR_ORANGE: &str = "#eb6420";

/// A Slack message attachment describing one pull request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub color: String,
    pub fallback: String,
    pub author_name: String,
    pub author_link: String,
    pub author_icon: String,
    pub title: String,
    pub title_link: String,
    pub fields: Vec<AttachmentField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

impl AttachmentField {
    fn short(title: &str, value: String) -> Self {
        Self {
            title: title.to_string(),
            value,
            short: true,
        }
    }
}

pub fn status_color(status: Status) -> &'static str {
    match status {
        Status::PendingReview => COLOR_AMBER,
        Status::ReadyForQa => COLOR_PALE_BLUE,
        Status::ReadyForMerge => COLOR_PALE_GREEN,
        Status::Open | Status::NoLabels => COLOR_ORANGE,
    }
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn build_attachment(issue: &Issue, rules: &LabelRules) -> Attachment {
    let status = rules.classify(&issue.labels);
    let created_at = format_timestamp(&issue.created_at);

    Attachment {
        color: status_color(status).to_string(),
        fallback: format!("There is an outstanding PR {status} created at {created_at}"),
        author_name: issue.author.login.clone(),
        author_link: issue.author.profile_url.clone(),
        author_icon: issue.author.avatar_url.clone(),
        title: issue.title.clone(),
        title_link: issue.link().to_string(),
        fields: vec![
            AttachmentField::short("Status", status.to_string()),
            AttachmentField::short("Created At", created_at),
        ],
    }
}

pub fn build_attachments(issues: &[Issue], rules: &LabelRules) -> Vec<Attachment> {
    issues
        .iter()
        .map(|issue| build_attachment(issue, rules))
        .collect()
}
