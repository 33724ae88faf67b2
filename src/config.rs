use std::{collections::HashSet, fmt, net::SocketAddr};

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches, Parser};
use url::Url;

use crate::{
    error::ConfigError,
    schedule::CronSchedule,
    status::LabelRules,
    types::Repo,
};

const BUILD_INFO_HUMAN: &str = env!("BUILD_INFO_HUMAN");

#[derive(Parser, Debug)]
#[command(
    name = "squad-notifier",
    version,
    about = "Posts a summary of open pull requests, grouped by review status, to a Slack channel on a schedule"
)]
#[command(long_version = BUILD_INFO_HUMAN)]
struct ConfigArgs {
    /// GitHub personal access token
    #[arg(long, env = "SQUAD_NOTIFIER_GITHUB_TOKEN", hide_env_values = true)]
    github_token: String,

    /// GitHub API base URL (for GitHub Enterprise)
    #[arg(long, env = "SQUAD_NOTIFIER_GITHUB_API_URL", value_name = "URL")]
    github_api_url: Option<Url>,

    /// Slack incoming webhook URL
    #[arg(long, env = "SQUAD_NOTIFIER_SLACK_WEBHOOK", hide_env_values = true)]
    slack_webhook: Url,

    /// Slack channel to post to
    #[arg(long, env = "SQUAD_NOTIFIER_TARGET_CHANNEL", value_name = "CHANNEL")]
    target_channel: String,

    /// Display name of the bot in Slack
    #[arg(
        long,
        env = "SQUAD_NOTIFIER_SLACK_USERNAME",
        default_value = "Squad Bot",
        value_name = "NAME"
    )]
    slack_username: String,

    /// Repositories to report on
    #[arg(
        long,
        env = "SQUAD_NOTIFIER_TARGET_REPOS",
        value_delimiter = ',',
        value_name = "OWNER/REPO"
    )]
    target_repos: Vec<String>,

    /// Repositories always queried without a label filter
    #[arg(
        long,
        env = "SQUAD_NOTIFIER_UNLABELLED_REPOS",
        value_delimiter = ',',
        value_name = "OWNER/REPO"
    )]
    unlabelled_repos: Vec<String>,

    /// Team labels; each one gets its own query and message per repository
    #[arg(
        long,
        env = "SQUAD_NOTIFIER_TARGET_LABELS",
        value_delimiter = ',',
        value_name = "LABEL"
    )]
    target_labels: Vec<String>,

    /// Labels meaning a pull request is waiting for review
    #[arg(
        long,
        env = "SQUAD_NOTIFIER_REVIEW_LABELS",
        value_delimiter = ',',
        default_values = ["Pending Review"],
        value_name = "LABEL"
    )]
    review_labels: Vec<String>,

    /// Labels meaning a pull request is ready for QA
    #[arg(
        long,
        env = "SQUAD_NOTIFIER_QA_LABELS",
        value_delimiter = ',',
        default_values = ["Ready for QA", "Passed Review"],
        value_name = "LABEL"
    )]
    qa_labels: Vec<String>,

    /// Labels meaning a pull request is ready to merge
    #[arg(
        long,
        env = "SQUAD_NOTIFIER_MERGE_LABELS",
        value_delimiter = ',',
        default_values = ["Passed QA", "No QA Required"],
        value_name = "LABEL"
    )]
    merge_labels: Vec<String>,

    /// Cron expressions that trigger a notification run, separated by `;`
    /// or by commas between complete expressions
    #[arg(
        long,
        env = "SQUAD_NOTIFIER_SCHEDULES",
        required = true,
        value_name = "CRON"
    )]
    schedules: Vec<String>,

    /// Address the HTTP trigger endpoint listens on
    #[arg(
        long,
        env = "SQUAD_NOTIFIER_LISTEN_ADDR",
        default_value = "0.0.0.0:4567",
        value_name = "ADDR"
    )]
    listen_addr: SocketAddr,

    /// Run once, post the summaries and exit
    #[arg(long)]
    once: bool,
}

/// How the binary should behave after loading its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Serve the HTTP trigger endpoint and run the cron schedules.
    Serve,
    /// Perform a single notification pass and exit.
    Once,
}

/// Immutable process-wide configuration.
#[derive(Clone)]
pub struct Config {
    pub github_token: String,
    pub github_api_url: Option<Url>,
    pub slack_webhook: Url,
    pub target_channel: String,
    pub slack_username: String,
    pub target_repos: Vec<Repo>,
    pub unlabelled_repos: HashSet<Repo>,
    pub target_labels: Vec<String>,
    pub label_rules: LabelRules,
    pub schedules: Vec<CronSchedule>,
    pub listen_addr: SocketAddr,
}

impl Config {
    /// Whether `repo` should be queried once without a label filter.
    pub fn queries_unlabelled(&self, repo: &Repo) -> bool {
        self.target_labels.is_empty() || self.unlabelled_repos.contains(repo)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("github_token", &"<redacted>")
            .field("github_api_url", &self.github_api_url)
            .field("slack_webhook", &"<redacted>")
            .field("target_channel", &self.target_channel)
            .field("slack_username", &self.slack_username)
            .field("target_repos", &self.target_repos)
            .field("unlabelled_repos", &self.unlabelled_repos)
            .field("target_labels", &self.target_labels)
            .field("label_rules", &self.label_rules)
            .field("schedules", &self.schedules)
            .field("listen_addr", &self.listen_addr)
            .finish()
    }
}

impl ConfigArgs {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.github_token.trim().is_empty() {
            return Err(ConfigError::Empty("SQUAD_NOTIFIER_GITHUB_TOKEN"));
        }
        if self.target_channel.trim().is_empty() {
            return Err(ConfigError::Empty("SQUAD_NOTIFIER_TARGET_CHANNEL"));
        }
        if split_schedules(&self.schedules).is_empty() {
            return Err(ConfigError::NoSchedules);
        }
        Ok(())
    }
}

/// Trims every entry and drops the empty ones left by stray commas.
fn clean_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Number of fields in a crontab line without seconds.
const CRONTAB_FIELDS: usize = 5;

/// Splits raw schedule values into cron expressions.
///
/// `;` and newlines always separate expressions. Commas separate them too,
/// except where a comma belongs to a list field such as `1,3,5`: a piece
/// continues the previous expression while that expression is still short
/// of five fields, or when the piece is a bare list item with no
/// whitespace. Use `;` for anything this leaves ambiguous.
fn split_schedules(values: &[String]) -> Vec<String> {
    let mut expressions = Vec::new();

    for value in values {
        for chunk in value.split([';', '\n']) {
            let mut current: Option<String> = None;

            for piece in chunk.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                current = Some(match current.take() {
                    Some(previous)
                        if previous.split_whitespace().count() < CRONTAB_FIELDS
                            || !piece.contains(char::is_whitespace) =>
                    {
                        format!("{previous},{piece}")
                    }
                    Some(previous) => {
                        expressions.push(previous);
                        piece.to_string()
                    }
                    None => piece.to_string(),
                });
            }

            expressions.extend(current);
        }
    }

    expressions
}

fn parse_repos(values: &[String]) -> Result<Vec<Repo>, ConfigError> {
    clean_list(values)
        .into_iter()
        .map(|repo| {
            Repo::parse(&repo).map_err(|source| ConfigError::InvalidRepo { repo, source })
        })
        .collect()
}

fn build_config(args: ConfigArgs) -> Result<(Config, RunMode), ConfigError> {
    args.validate()?;

    let schedules = split_schedules(&args.schedules)
        .iter()
        .map(|expression| CronSchedule::parse(expression))
        .collect::<Result<Vec<_>, _>>()?;

    let label_rules = LabelRules::new(
        clean_list(&args.review_labels),
        clean_list(&args.qa_labels),
        clean_list(&args.merge_labels),
    );

    let mode = if args.once {
        RunMode::Once
    } else {
        RunMode::Serve
    };

    let config = Config {
        github_token: args.github_token.trim().to_string(),
        github_api_url: args.github_api_url,
        slack_webhook: args.slack_webhook,
        target_channel: args.target_channel.trim().to_string(),
        slack_username: args.slack_username,
        target_repos: parse_repos(&args.target_repos)?,
        unlabelled_repos: parse_repos(&args.unlabelled_repos)?.into_iter().collect(),
        target_labels: clean_list(&args.target_labels),
        label_rules,
        schedules,
        listen_addr: args.listen_addr,
    };

    Ok((config, mode))
}

/// Parses configuration from command-line arguments, falling back to
/// `SQUAD_NOTIFIER_*` environment variables for anything not given as a
/// flag.
pub fn parse_args<I, T>(args: I) -> Result<(Config, RunMode)>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    parse_with(ConfigArgs::command(), args)
}

/// Like [`parse_args`], but reads command-line flags only and ignores any
/// `SQUAD_NOTIFIER_*` environment variables.
pub fn parse_flags<I, T>(args: I) -> Result<(Config, RunMode)>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let command = ConfigArgs::command().mut_args(|arg| arg.env(None::<&'static str>));
    parse_with(command, args)
}

fn parse_with<I, T>(command: clap::Command, args: I) -> Result<(Config, RunMode)>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = command.try_get_matches_from(args)?;
    let args = ConfigArgs::from_arg_matches(&matches)?;
    Ok(build_config(args)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: &[&str] = &[
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

    fn parse(extra: &[&str]) -> Result<(Config, RunMode)> {
        parse_flags(REQUIRED.iter().chain(extra.iter()).copied())
    }

    /// The required flags minus `flag` and its value, followed by `extra`.
    fn parse_without(flag: &str, extra: &[&str]) -> Result<(Config, RunMode)> {
        let mut args = vec![REQUIRED[0]];
        for pair in REQUIRED[1..].chunks(2) {
            if pair[0] != flag {
                args.extend_from_slice(pair);
            }
        }
        args.extend_from_slice(extra);
        parse_flags(args)
    }

    fn assert_missing_argument(result: Result<(Config, RunMode)>) {
        let err = result.unwrap_err();
        let clap_err = err
            .downcast_ref::<clap::Error>()
            .expect("expected a clap error");
        assert_eq!(
            clap_err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_defaults() {
        let (config, mode) = parse(&[]).unwrap();

        assert_eq!(mode, RunMode::Serve);
        assert_eq!(config.slack_username, "Squad Bot");
        assert!(config.target_repos.is_empty());
        assert!(config.unlabelled_repos.is_empty());
        assert!(config.target_labels.is_empty());
        assert_eq!(config.listen_addr, "0.0.0.0:4567".parse().unwrap());
        assert!(config.github_api_url.is_none());
        assert!(config.label_rules.review().contains("Pending Review"));
        assert!(config.label_rules.qa().contains("Ready for QA"));
        assert!(config.label_rules.qa().contains("Passed Review"));
        assert!(config.label_rules.merge().contains("Passed QA"));
        assert!(config.label_rules.merge().contains("No QA Required"));
        assert_eq!(config.schedules.len(), 1);
    }

    #[test]
    fn test_comma_separated_lists_are_trimmed() {
        let (config, _) = parse(&[
            "--target-repos",
            "octo/api, octo/web,,",
            "--target-labels",
            "backend , frontend",
            "--review-labels",
            "Needs Review",
        ])
        .unwrap();

        assert_eq!(
            config.target_repos,
            vec![
                Repo::parse("octo/api").unwrap(),
                Repo::parse("octo/web").unwrap()
            ]
        );
        assert_eq!(config.target_labels, vec!["backend", "frontend"]);
        assert!(config.label_rules.review().contains("Needs Review"));
        assert!(!config.label_rules.review().contains("Pending Review"));
    }

    #[test]
    fn test_multiple_schedules() {
        let (config, _) = parse(&["--schedules", "30 12 * * 1-5"]).unwrap();
        let expressions: Vec<&str> = config.schedules.iter().map(|s| s.expression()).collect();
        assert_eq!(expressions, vec!["0 8 * * 1-5", "30 12 * * 1-5"]);
    }

    #[test]
    fn test_once_mode() {
        let (_, mode) = parse(&["--once"]).unwrap();
        assert_eq!(mode, RunMode::Once);
    }

    #[test]
    fn test_missing_token_is_fatal() {
        assert_missing_argument(parse_without("--github-token", &[]));
    }

    #[test]
    fn test_missing_webhook_is_fatal() {
        assert_missing_argument(parse_without("--slack-webhook", &[]));
    }

    #[test]
    fn test_missing_channel_is_fatal() {
        assert_missing_argument(parse_without("--target-channel", &[]));
    }

    #[test]
    fn test_missing_schedules_is_fatal() {
        assert_missing_argument(parse_without("--schedules", &[]));
    }

    #[test]
    fn test_blank_token_is_rejected() {
        let err = parse_without("--github-token", &["--github-token", "  "]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Empty("SQUAD_NOTIFIER_GITHUB_TOKEN"))
        ));
    }

    #[test]
    fn test_schedule_with_weekday_list() {
        let (config, _) = parse_without("--schedules", &["--schedules", "0 9 * * 1,3,5"]).unwrap();
        let expressions: Vec<&str> = config.schedules.iter().map(|s| s.expression()).collect();
        assert_eq!(expressions, vec!["0 9 * * 1,3,5"]);
    }

    #[test]
    fn test_schedules_with_lists_separated_by_commas() {
        let (config, _) =
            parse_without("--schedules", &["--schedules", "0 9 1,15 * *, 30 17 * * 1,5"]).unwrap();
        let expressions: Vec<&str> = config.schedules.iter().map(|s| s.expression()).collect();
        assert_eq!(expressions, vec!["0 9 1,15 * *", "30 17 * * 1,5"]);
    }

    #[test]
    fn test_schedules_separated_by_semicolons() {
        let (config, _) =
            parse_without("--schedules", &["--schedules", "0,30 9 * * *; 0 12 * * 1-5"]).unwrap();
        let expressions: Vec<&str> = config.schedules.iter().map(|s| s.expression()).collect();
        assert_eq!(expressions, vec!["0,30 9 * * *", "0 12 * * 1-5"]);
    }

    #[test]
    fn test_blank_schedules_are_rejected() {
        let err = parse_flags([
            "squad-notifier",
            "--github-token",
            "ghp_test",
            "--slack-webhook",
            "https://hooks.slack.com/services/x",
            "--target-channel",
            "#squad",
            "--schedules",
            " , ",
        ])
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NoSchedules)
        ));
    }

    #[test]
    fn test_invalid_repo_is_rejected() {
        let err = parse(&["--target-repos", "not-a-repo"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidRepo { .. })
        ));
    }

    #[test]
    fn test_invalid_schedule_is_rejected() {
        let err = parse(&["--schedules", "whenever"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidSchedule { .. })
        ));
    }

    #[test]
    fn test_queries_unlabelled() {
        let (config, _) = parse(&[
            "--target-repos",
            "octo/api,octo/docs",
            "--unlabelled-repos",
            "octo/docs",
            "--target-labels",
            "backend",
        ])
        .unwrap();

        assert!(!config.queries_unlabelled(&Repo::parse("octo/api").unwrap()));
        assert!(config.queries_unlabelled(&Repo::parse("octo/docs").unwrap()));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let (config, _) = parse(&[]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("ghp_test"));
        assert!(!debug.contains("hooks.slack.com"));
    }
}
