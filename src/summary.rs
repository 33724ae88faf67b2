use chrono::Timelike;
use tracing::info;

use crate::{
    attachments::build_attachments,
    error::ChannelError,
    slack::ChatChannel,
    status::LabelRules,
    types::{Issue, Repo},
};

/// "Morning" for hours 0 through 11, "Afternoon" otherwise.
pub fn greeting(hour: u32) -> &'static str {
    if hour <= 11 { "Morning" } else { "Afternoon" }
}

pub fn summary_message(repo: &Repo, count: usize, label: Option<&str>, hour: u32) -> String {
    let mut message = format!(
        "{} team, here is a summary of {} open pull requests for `{}`",
        greeting(hour),
        count,
        repo
    );
    if let Some(label) = label {
        message.push_str(&format!(" and label `{label}`"));
    }
    message
}

/// Posts one summary message for `issues` to the chat channel.
///
/// Returns `Ok(false)` without contacting the channel when there is nothing
/// to report. `now` supplies the local time used for the greeting.
pub async fn post_summary<C, T>(
    channel: &C,
    repo: &Repo,
    issues: &[Issue],
    label: Option<&str>,
    rules: &LabelRules,
    now: &T,
) -> Result<bool, ChannelError>
where
    C: ChatChannel + ?Sized,
    T: Timelike + Sync,
{
    if issues.is_empty() {
        info!(%repo, label, "No open pull requests to report");
        return Ok(false);
    }

    let message = summary_message(repo, issues.len(), label, now.hour());
    let attachments = build_attachments(issues, rules);

    channel.post(&message, &attachments).await?;

    info!(%repo, label, count = issues.len(), "Posted pull request summary");
    Ok(true)
}
