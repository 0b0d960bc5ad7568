use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

/// A parsed cron expression.
///
/// Five-field crontab expressions get an implicit `0` seconds field; six and seven
/// field expressions (with seconds, optional year) are used as written. Day-of-week
/// values follow the `cron` crate: `1`-`7` with Sunday as `1`, or `MON`..`SUN`.
#[derive(Debug, Clone)]
pub struct Cadence {
    expression: String,
    schedule: Schedule,
}

impl Cadence {
    pub fn parse(expression: &str) -> Result<Self, String> {
        let expression = expression.trim();
        let normalized = match expression.split_whitespace().count() {
            5 => format!("0 {expression}"),
            6 | 7 => expression.to_string(),
            n => return Err(format!("expected 5 to 7 cron fields, found {n}")),
        };

        let schedule = Schedule::from_str(&normalized)
            .map_err(|e| format!("invalid cron expression '{expression}': {e}"))?;

        Ok(Self {
            expression: expression.to_string(),
            schedule,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First occurrence strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn five_field_expression_fires_on_the_minute() {
        let cadence = Cadence::parse("*/15 * * * *").expect("parse");
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 7, 30).unwrap();

        let next = cadence.next_after(now).expect("next");
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap());
        assert_eq!(cadence.expression(), "*/15 * * * *");
    }

    #[test]
    fn six_field_expression_keeps_seconds() {
        let cadence = Cadence::parse("*/10 * * * * *").expect("parse");
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 1).unwrap();

        assert_eq!(
            cadence.next_after(now),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 10).unwrap())
        );
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(Cadence::parse("* *").is_err());
        assert!(Cadence::parse("61 * * * *").is_err());
        assert!(Cadence::parse("not a cron at all x").is_err());
    }
}
