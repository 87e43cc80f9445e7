use std::sync::LazyLock;

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
    Now,
}

/// Relative time expressions in priority order. The first pattern that
/// matches anywhere in the text wins, not the leftmost match.
static RELATIVE_PATTERNS: LazyLock<Vec<(Regex, TimeUnit)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(?i)(\d+)\s*d(?:ays?)?\b").unwrap(), TimeUnit::Days),
        (Regex::new(r"(?i)(\d+)\s*h(?:rs?|ours?)?\b").unwrap(), TimeUnit::Hours),
        (Regex::new(r"(?i)(\d+)\s*m(?:ins?|inutes?)?\b").unwrap(), TimeUnit::Minutes),
        (Regex::new(r"(?i)(\d+)\s*s(?:ecs?|econds?)?\b").unwrap(), TimeUnit::Seconds),
        (Regex::new(r"(?i)just now").unwrap(), TimeUnit::Now),
    ]
});

/// How a publication time was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeSource {
    /// Parsed from a relative expression, e.g. "3h"
    Parsed(String),
    /// Estimated from the block's position
    Estimated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTime {
    pub at: DateTime<Utc>,
    pub source: TimeSource,
}

/// Resolve the publication time of a block from its text.
///
/// Falls back to `now - index days` when no expression matches or the
/// magnitude cannot be represented, which keeps unparsed posts in page order.
pub fn resolve(text: &str, index: usize, now: DateTime<Utc>) -> ResolvedTime {
    match parse_relative(text, now) {
        Some((at, matched)) => ResolvedTime {
            at,
            source: TimeSource::Parsed(matched),
        },
        None => ResolvedTime {
            at: estimate_from_position(index, now),
            source: TimeSource::Estimated,
        },
    }
}

/// Parse the first relative time expression, in pattern priority order.
pub fn parse_relative(text: &str, now: DateTime<Utc>) -> Option<(DateTime<Utc>, String)> {
    for (pattern, unit) in RELATIVE_PATTERNS.iter() {
        let Some(captures) = pattern.captures(text) else {
            continue;
        };
        let matched = captures.get(0)?.as_str().to_string();

        if *unit == TimeUnit::Now {
            return Some((now, matched));
        }

        let value: i64 = captures.get(1)?.as_str().parse().ok()?;
        let delta = match unit {
            TimeUnit::Days => TimeDelta::try_days(value),
            TimeUnit::Hours => TimeDelta::try_hours(value),
            TimeUnit::Minutes => TimeDelta::try_minutes(value),
            TimeUnit::Seconds => TimeDelta::try_seconds(value),
            TimeUnit::Now => Some(TimeDelta::zero()),
        }?;

        return now.checked_sub_signed(delta).map(|at| (at, matched));
    }
    None
}

pub fn estimate_from_position(index: usize, now: DateTime<Utc>) -> DateTime<Utc> {
    i64::try_from(index)
        .ok()
        .and_then(TimeDelta::try_days)
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(now)
}
