use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};

/// Sunday of the calendar week containing `date`.
pub fn sunday_week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// Elapsed minutes between two instants with millisecond precision. Negative spans (a clock
/// moved backwards) count as nothing.
pub fn minutes_between<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> f64 {
    let millis = end.clone().signed_duration_since(start.clone()).num_milliseconds();
    millis.max(0) as f64 / 60_000.
}

/// `Xh Ym`, truncating. Presentation only.
pub fn format_hours_minutes(minutes: f64) -> String {
    let total = minutes.max(0.).floor() as u64;
    format!("{}h {}m", total / 60, total % 60)
}

/// `HH:MM:SS`, truncating. Presentation only.
pub fn format_clock(minutes: f64) -> String {
    let seconds = (minutes.max(0.) * 60.).floor() as u64;
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}
