//! Cron-driven triggering of notification runs.
//!
//! Expressions may be written in classic five-field crontab form
//! (`min hour day-of-month month day-of-week`, with `0` or `7` for Sunday).
//! They are normalised to the seconds-first form the `cron` crate parses,
//! with numeric weekdays rewritten to names so `1-5` keeps meaning Monday to
//! Friday.

use std::{str::FromStr, sync::Arc, time::Duration};

use chrono::{DateTime, Local};
use cron::Schedule;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::{
    error::ConfigError,
    tasks::{Runner, Trigger},
};

const WEEKDAYS: [&str; 8] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];

/// A parsed cron schedule together with the expression it came from.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    schedule: Schedule,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, ConfigError> {
        let expression = expression.trim().to_string();
        let normalised = normalise_expression(&expression);
        let schedule =
            Schedule::from_str(&normalised).map_err(|err| ConfigError::InvalidSchedule {
                expression: expression.clone(),
                reason: err.to_string(),
            })?;

        Ok(Self {
            expression,
            schedule,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The first occurrence strictly after `now`.
    pub fn next_after(&self, now: &DateTime<Local>) -> Option<DateTime<Local>> {
        self.schedule.after(now).next()
    }
}

/// Rewrites a five-field crontab expression into the six-field form with a
/// leading seconds column. Other field counts are passed through untouched.
pub fn normalise_expression(expression: &str) -> String {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    if fields.len() != 5 {
        return fields.join(" ");
    }

    format!(
        "0 {} {} {} {} {}",
        fields[0],
        fields[1],
        fields[2],
        fields[3],
        weekday_names(fields[4])
    )
}

fn weekday_names(field: &str) -> String {
    field
        .split(',')
        .map(|part| match part.split_once('/') {
            Some((range, step)) => format!("{}/{}", weekday_range(range), step),
            None => weekday_range(part),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn weekday_range(range: &str) -> String {
    match range.split_once('-') {
        Some((start, end)) => format!("{}-{}", weekday_name(start), weekday_name(end)),
        None => weekday_name(range).to_string(),
    }
}

fn weekday_name(token: &str) -> &str {
    token
        .parse::<usize>()
        .ok()
        .and_then(|day| WEEKDAYS.get(day).copied())
        .unwrap_or(token)
}

/// Spawns one background task per schedule. Each task sleeps until the next
/// occurrence and then runs a full notification pass before sleeping
/// again. Failures are logged and do not stop the schedule.
pub fn spawn_schedules<R>(runner: Arc<R>, schedules: &[CronSchedule]) -> Vec<JoinHandle<()>>
where
    R: Runner + 'static,
{
    schedules
        .iter()
        .cloned()
        .map(|schedule| {
            let runner = Arc::clone(&runner);
            tokio::spawn(async move { run_schedule(runner, schedule).await })
        })
        .collect()
}

async fn run_schedule<R>(runner: Arc<R>, schedule: CronSchedule)
where
    R: Runner,
{
    info!(schedule = schedule.expression(), "Schedule registered");

    loop {
        let now = Local::now();
        let Some(next) = schedule.next_after(&now) else {
            warn!(
                schedule = schedule.expression(),
                "Schedule has no future occurrence, stopping"
            );
            return;
        };

        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        info!(
            schedule = schedule.expression(),
            next = %next.format("%Y-%m-%d %H:%M:%S %Z"),
            "Waiting for next scheduled run"
        );
        tokio::time::sleep(wait).await;

        let trigger = Trigger::Schedule(schedule.expression().to_string());
        if let Err(err) = runner.execute(&trigger).await {
            error!(
                schedule = schedule.expression(),
                error = %format!("{err:#}"),
                "Scheduled run failed"
            );
        }
    }
}
