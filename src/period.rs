use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A logical reporting period selected in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    CurrentMonth,
    LastMonth,
    Last90Days,
    Last12Months,
    /// Any anchor date; resolves to the Sunday-aligned week containing it.
    Week(NaiveDate),
}

impl Period {
    /// Parses the query-string token. Anything that parses as a date is
    /// treated as a week anchor.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "current-month" => Some(Self::CurrentMonth),
            "last-month" => Some(Self::LastMonth),
            "last-90-days" => Some(Self::Last90Days),
            "last-12-months" => Some(Self::Last12Months),
            other => other.parse::<NaiveDate>().ok().map(Self::Week),
        }
    }

    pub fn token(&self) -> String {
        match self {
            Self::CurrentMonth => "current-month".to_string(),
            Self::LastMonth => "last-month".to_string(),
            Self::Last90Days => "last-90-days".to_string(),
            Self::Last12Months => "last-12-months".to_string(),
            Self::Week(anchor) => anchor.to_string(),
        }
    }

    pub fn resolve(&self, today: NaiveDate) -> DateRange {
        match self {
            Self::CurrentMonth => DateRange {
                start: month_start(today),
                end: today,
            },
            Self::LastMonth => {
                let end = month_start(today) - Duration::days(1);
                DateRange {
                    start: month_start(end),
                    end,
                }
            }
            Self::Last90Days => DateRange {
                start: today - Duration::days(90),
                end: today,
            },
            Self::Last12Months => DateRange {
                start: today
                    .checked_sub_months(Months::new(12))
                    .unwrap_or(today - Duration::days(365)),
                end: today,
            },
            Self::Week(anchor) => {
                let start = week_anchor(*anchor);
                DateRange {
                    start,
                    end: start + Duration::days(6),
                }
            }
        }
    }
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

/// Most recent Sunday at or before `date`. Weeks here are Sunday-anchored,
/// not ISO Monday-anchored.
pub fn week_anchor(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// Week number by elapsed 7-day buckets from January 1, offset by the weekday
/// of January 1 counting Sunday as 0. Used uniformly wherever a week label is
/// shown.
pub fn week_number(date: NaiveDate) -> u32 {
    let jan_first = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date);
    let past_days = (date - jan_first).num_days();
    let offset = jan_first.weekday().num_days_from_sunday() as i64;
    ((past_days + offset + 1 + 6) / 7) as u32
}

pub fn week_label(date: NaiveDate) -> String {
    format!("Week {} of {}", week_number(date), date.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn current_month_starts_on_the_first() {
        let range = Period::CurrentMonth.resolve(date(2026, 3, 17));
        assert_eq!(range.start, date(2026, 3, 1));
        assert_eq!(range.end, date(2026, 3, 17));
    }

    #[test]
    fn last_month_covers_the_full_calendar_month() {
        let range = Period::LastMonth.resolve(date(2026, 3, 17));
        assert_eq!(range.start, date(2026, 2, 1));
        assert_eq!(range.end, date(2026, 2, 28));

        let range = Period::LastMonth.resolve(date(2026, 1, 5));
        assert_eq!(range.start, date(2025, 12, 1));
        assert_eq!(range.end, date(2025, 12, 31));
    }

    #[test]
    fn rolling_windows_use_calendar_arithmetic() {
        let today = date(2026, 3, 17);
        let range = Period::Last90Days.resolve(today);
        assert_eq!(range.end, today);
        assert_eq!((range.end - range.start).num_days(), 90);

        let range = Period::Last12Months.resolve(today);
        assert_eq!(range.start, date(2025, 3, 17));
    }

    #[test]
    fn week_anchor_is_the_most_recent_sunday() {
        // 2024-01-07 is a Sunday.
        assert_eq!(week_anchor(date(2024, 1, 7)), date(2024, 1, 7));
        assert_eq!(week_anchor(date(2024, 1, 10)), date(2024, 1, 7));
        assert_eq!(week_anchor(date(2024, 1, 13)), date(2024, 1, 7));
        assert_eq!(week_anchor(date(2024, 1, 14)), date(2024, 1, 14));
    }

    #[test]
    fn week_period_spans_sunday_through_saturday() {
        let range = Period::Week(date(2024, 1, 10)).resolve(date(2024, 6, 1));
        assert_eq!(range.start, date(2024, 1, 7));
        assert_eq!(range.end, date(2024, 1, 13));
    }

    #[test]
    fn week_numbers_are_consistent_within_a_week() {
        let sunday = date(2024, 1, 7);
        let n = week_number(sunday);
        for offset in 0..7 {
            assert_eq!(week_number(sunday + Duration::days(offset)), n);
        }
        // The next Sunday lands in the next bucket.
        assert_eq!(week_number(date(2024, 1, 14)), n + 1);
    }

    #[test]
    fn parse_accepts_tokens_and_anchor_dates() {
        assert_eq!(Period::parse("current-month"), Some(Period::CurrentMonth));
        assert_eq!(Period::parse("last-90-days"), Some(Period::Last90Days));
        assert_eq!(
            Period::parse("2024-01-07"),
            Some(Period::Week(date(2024, 1, 7)))
        );
        assert_eq!(Period::parse("whenever"), None);
    }
}
