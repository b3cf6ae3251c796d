use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::error::{Result, SchedulerError};

/// When an entry fires.
#[derive(Debug, Clone)]
pub enum Schedule {
    /// Calendar expression (normalised to the 6/7-field form the `cron`
    /// crate understands).
    Cron(Box<cron::Schedule>),

    /// Fixed interval measured from the previous firing.
    Every(Duration),

    /// Fire once at the given instant, then never again.
    Once(DateTime<Local>),
}

impl Schedule {
    /// Parse a textual schedule expression.
    pub fn parse(expr: &str) -> Result<Self> {
        let trimmed = expr.trim();
        let invalid = |reason: String| SchedulerError::InvalidSchedule {
            expr: expr.to_string(),
            reason,
        };

        if let Some(rest) = trimmed.strip_prefix("@every") {
            let every = humantime::parse_duration(rest.trim()).map_err(|e| invalid(e.to_string()))?;
            if every < Duration::from_secs(1) {
                return Err(invalid("interval must be at least 1s".into()));
            }
            let schedule = Schedule::Every(every);
            if schedule.first_after(Local::now()).is_none() {
                return Err(invalid("interval is out of range".into()));
            }
            return Ok(schedule);
        }

        if let Some(rest) = trimmed.strip_prefix("@at") {
            let at = DateTime::parse_from_rfc3339(rest.trim())
                .map_err(|e| invalid(e.to_string()))?
                .with_timezone(&Local);
            if at <= Local::now() {
                return Err(invalid("instant is in the past".into()));
            }
            return Ok(Schedule::Once(at));
        }

        let normalised = if trimmed.starts_with('@') {
            descriptor(trimmed)
                .ok_or_else(|| invalid(format!("unknown descriptor {trimmed}")))?
                .to_string()
        } else {
            let mut fields: Vec<String> = trimmed.split_whitespace().map(str::to_string).collect();
            let dow = match fields.len() {
                // classic crontab: no seconds field
                5 => {
                    fields.insert(0, "0".to_string());
                    5
                }
                6 | 7 => 5,
                n => return Err(invalid(format!("expected 5 to 7 fields, got {n}"))),
            };
            fields[dow] = crontab_weekdays(&fields[dow]).map_err(invalid)?;
            fields.join(" ")
        };

        let parsed = cron::Schedule::from_str(&normalised).map_err(|e| invalid(e.to_string()))?;
        let schedule = Schedule::Cron(Box::new(parsed));
        if schedule.first_after(Local::now()).is_none() {
            return Err(invalid("schedule never fires".into()));
        }
        Ok(schedule)
    }

    /// Parse a schedule that can drive a job: anything [`parse`](Self::parse)
    /// accepts except one-shots.
    pub fn parse_recurring(expr: &str) -> Result<Self> {
        let schedule = Schedule::parse(expr)?;
        if schedule.is_one_shot() {
            return Err(SchedulerError::InvalidSchedule {
                expr: expr.to_string(),
                reason: "one-shot schedules cannot drive a job".into(),
            });
        }
        Ok(schedule)
    }

    /// One-shot schedule firing at `at`.
    pub fn once(at: DateTime<Local>) -> Self {
        Schedule::Once(at)
    }

    pub fn is_one_shot(&self) -> bool {
        matches!(self, Schedule::Once(_))
    }

    /// First fire time for an entry registered at `now`.
    ///
    /// A one-shot whose instant already passed fires on the next tick.
    pub fn first_after(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        match self {
            Schedule::Once(at) => Some((*at).max(now)),
            _ => self.next_after(now),
        }
    }

    /// Next fire time strictly after `after`. `None` once the schedule is
    /// exhausted; one-shots are always exhausted after their first firing.
    pub fn next_after(&self, after: DateTime<Local>) -> Option<DateTime<Local>> {
        match self {
            Schedule::Cron(cron) => cron.after(&after).next(),
            Schedule::Every(every) => {
                let every = chrono::Duration::from_std(*every).ok()?;
                // whole-second boundaries keep intervals from drifting
                let subsec = chrono::Duration::nanoseconds(after.timestamp_subsec_nanos() as i64);
                let base = after - subsec;
                base.checked_add_signed(every)
            }
            Schedule::Once(_) => None,
        }
    }
}

impl FromStr for Schedule {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self> {
        Schedule::parse(s)
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Cron(cron) => write!(f, "{cron}"),
            Schedule::Every(every) => write!(f, "@every {}", humantime::format_duration(*every)),
            Schedule::Once(at) => write!(f, "@at {}", at.to_rfc3339()),
        }
    }
}

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Rewrite a crontab day-of-week field (0 or 7 is Sunday) as weekday names,
/// which the `cron` crate reads unambiguously. Named terms pass through.
fn crontab_weekdays(field: &str) -> std::result::Result<String, String> {
    if field == "*" || field == "?" {
        return Ok(field.to_string());
    }

    let mut days = [false; 7];
    let mut named = Vec::new();
    for term in field.split(',') {
        if term.chars().any(|c| c.is_ascii_alphabetic()) {
            named.push(term.to_string());
            continue;
        }

        let (range, step) = match term.split_once('/') {
            Some((range, step)) => {
                let step: u8 = step.parse().map_err(|_| format!("bad step in {term}"))?;
                if step == 0 {
                    return Err(format!("zero step in {term}"));
                }
                (range, Some(step))
            }
            None => (term, None),
        };
        let (lo, hi) = match range {
            "*" => (0, 6),
            _ => match range.split_once('-') {
                Some((lo, hi)) => (weekday_number(lo)?, weekday_number(hi)?),
                // `n/step` runs to the end of the week
                None if step.is_some() => (weekday_number(range)?, 7),
                None => {
                    let day = weekday_number(range)?;
                    (day, day)
                }
            },
        };
        if lo > hi {
            return Err(format!("day-of-week range {range} runs backwards"));
        }
        for day in (lo..=hi).step_by(step.unwrap_or(1) as usize) {
            days[day as usize % 7] = true;
        }
    }

    let mut out: Vec<String> = days
        .iter()
        .zip(WEEKDAYS)
        .filter(|(set, _)| **set)
        .map(|(_, name)| name.to_string())
        .collect();
    out.extend(named);
    Ok(out.join(","))
}

fn weekday_number(s: &str) -> std::result::Result<u8, String> {
    match s.parse::<u8>() {
        Ok(n) if n <= 7 => Ok(n),
        _ => Err(format!("day-of-week {s} is outside 0-7")),
    }
}

fn descriptor(name: &str) -> Option<&'static str> {
    let expr = match name {
        "@yearly" | "@annually" => "0 0 0 1 1 *",
        "@monthly" => "0 0 0 1 * *",
        "@weekly" => "0 0 0 * * Sun",
        "@daily" | "@midnight" => "0 0 0 * * *",
        "@hourly" => "0 0 * * * *",
        _ => return None,
    };
    Some(expr)
}
