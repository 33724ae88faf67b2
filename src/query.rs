use tracing::debug;

use crate::{
    github::Forge,
    status::LabelRules,
    types::{Issue, Repo},
};

/// Fetches the open pull requests worth reporting for `repo`.
///
/// Plain issues are dropped, as are pull requests whose labels are all
/// outside the tracked review/QA/merge vocabularies. Unlabelled pull
/// requests are always kept.
pub async fn fetch_issues<F>(
    forge: &F,
    repo: &Repo,
    label: Option<&str>,
    rules: &LabelRules,
) -> anyhow::Result<Vec<Issue>>
where
    F: Forge + ?Sized,
{
    let all_issues = forge.open_issues(repo, label).await?;
    let fetched = all_issues.len();

    let filtered: Vec<Issue> = all_issues
        .into_iter()
        .filter(|issue| is_reportable(issue, rules))
        .collect();

    debug!(
        %repo,
        label,
        fetched,
        kept = filtered.len(),
        "Filtered open issues"
    );

    Ok(filtered)
}

pub fn is_reportable(issue: &Issue, rules: &LabelRules) -> bool {
    issue.is_pull_request && rules.is_tracked(&issue.labels)
}
