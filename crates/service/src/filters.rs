//! Query helpers shared by the listing endpoints: date ranges, case-insensitive
//! substring matching and the six-month reporting window.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use sea_orm::sea_query::{Expr, Func, IntoColumnRef, SimpleExpr};

use crate::errors::ServiceError;

/// Inclusive creation-time window.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates. A plain end
    /// date covers the whole day.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, ServiceError> {
        let start = start
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_instant(s, false))
            .transpose()?;
        let end = end
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_instant(s, true))
            .transpose()?;
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ServiceError::validation("startDate must not be after endDate"));
            }
        }
        Ok(Self { start, end })
    }
}

fn parse_instant(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, ServiceError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ServiceError::validation(format!("invalid date: {raw}")))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| ServiceError::validation(format!("invalid date: {raw}")))?;
    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}

/// Escape LIKE wildcards in user input.
pub fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.trim().to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// `lower(col) LIKE '%term%'`
pub fn contains_ci<C: IntoColumnRef>(col: C, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).like(like_pattern(term))
}

/// Trimmed, non-empty search term.
pub fn search_term(q: Option<&str>) -> Option<&str> {
    q.map(str::trim).filter(|s| !s.is_empty())
}

/// Number of months shown in the monthly series.
pub const REPORT_MONTHS: u32 = 6;

/// Start of the reporting window (first day of the month `REPORT_MONTHS - 1`
/// months back) and the ordered `YYYY-MM` keys it spans.
pub fn monthly_window(now: DateTime<Utc>) -> (DateTime<Utc>, Vec<String>) {
    let first_of_month = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    let start = first_of_month
        .checked_sub_months(Months::new(REPORT_MONTHS - 1))
        .unwrap_or(first_of_month);
    let keys = (0..REPORT_MONTHS)
        .filter_map(|i| start.checked_add_months(Months::new(i)))
        .map(|d| d.format("%Y-%m").to_string())
        .collect();
    (start, keys)
}

/// Percentage rounded to two decimals; zero when the denominator is zero.
pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((part as f64 / total as f64) * 10000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_end_date_is_inclusive() {
        let r = DateRange::parse(Some("2024-03-01"), Some("2024-03-31")).unwrap();
        assert_eq!(r.start.unwrap().to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(r.end.unwrap().format("%H:%M:%S").to_string(), "23:59:59");
    }

    #[test]
    fn rfc3339_is_accepted_and_converted() {
        let r = DateRange::parse(Some("2024-03-01T10:00:00+01:00"), None).unwrap();
        assert_eq!(r.start.unwrap().to_rfc3339(), "2024-03-01T09:00:00+00:00");
        assert!(r.end.is_none());
    }

    #[test]
    fn bad_or_inverted_ranges_fail() {
        assert!(DateRange::parse(Some("yesterday"), None).is_err());
        assert!(DateRange::parse(Some("2024-05-01"), Some("2024-04-01")).is_err());
        assert_eq!(DateRange::parse(Some(" "), None).unwrap(), DateRange::default());
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" Brake "), "%brake%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn monthly_window_spans_six_months_across_year_end() {
        let now = Utc.with_ymd_and_hms(2024, 2, 15, 12, 0, 0).unwrap();
        let (start, keys) = monthly_window(now);
        assert_eq!(start.to_rfc3339(), "2023-09-01T00:00:00+00:00");
        assert_eq!(keys, vec!["2023-09", "2023-10", "2023-11", "2023-12", "2024-01", "2024-02"]);
    }

    #[test]
    fn percent_handles_zero_total() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 3), 33.33);
        assert_eq!(percent(2, 2), 100.0);
    }
}
