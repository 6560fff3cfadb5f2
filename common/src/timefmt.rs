//! 日時表示モジュール
//!
//! 「5 minutes ago」形式の相対表示、ロケール書式の絶対表示、期日までの日数。
//! 現在時刻は必ず引数で受け取る。

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
/// 1か月 = 30日として数える
const MONTH_DAYS: i64 = 30;

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// 相対表示
///
/// | 経過          | 表示            |
/// |---------------|-----------------|
/// | 60秒未満      | just now        |
/// | 60分未満      | N minute(s) ago |
/// | 24時間未満    | N hour(s) ago   |
/// | 30日未満      | N day(s) ago    |
/// | 12か月未満    | N month(s) ago  |
/// | それ以上      | N year(s) ago   |
///
/// 未来の時刻は just now。
pub fn format_relative(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - timestamp).num_seconds();

    if elapsed < MINUTE {
        return "just now".to_string();
    }
    if elapsed < HOUR {
        return plural(elapsed / MINUTE, "minute");
    }
    if elapsed < DAY {
        return plural(elapsed / HOUR, "hour");
    }

    let days = elapsed / DAY;
    if days < MONTH_DAYS {
        return plural(days, "day");
    }

    let months = days / MONTH_DAYS;
    if months < 12 {
        return plural(months, "month");
    }

    plural(months / 12, "year")
}

/// 絶対表示（chrono の書式文字列、例: "%b %-d, %Y %H:%M"）
pub fn format_absolute(timestamp: DateTime<Utc>, offset: FixedOffset, pattern: &str) -> String {
    timestamp.with_timezone(&offset).format(pattern).to_string()
}

/// 分単位のUTCオフセットから FixedOffset を作る（範囲外はUTC）
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// 期日までの日数（過ぎていれば負）
pub fn days_until(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

/// 期日の説明（"due today" / "due in 3 days" / "overdue by 1 day"）
pub fn describe_due(due: NaiveDate, today: NaiveDate) -> String {
    let days = days_until(due, today);
    let unit = |n: i64| if n == 1 { "day" } else { "days" };
    match days {
        0 => "due today".to_string(),
        d if d > 0 => format!("due in {} {}", d, unit(d)),
        d => format!("overdue by {} {}", -d, unit(-d)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn ago(seconds: i64) -> String {
        format_relative(now() - Duration::seconds(seconds), now())
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(ago(0), "just now");
        assert_eq!(ago(59), "just now");
        assert_eq!(ago(60), "1 minute ago");
        assert_eq!(ago(119), "1 minute ago");
        assert_eq!(ago(120), "2 minutes ago");
        assert_eq!(ago(3599), "59 minutes ago");
        assert_eq!(ago(3600), "1 hour ago");
        assert_eq!(ago(86_399), "23 hours ago");
        assert_eq!(ago(86_400), "1 day ago");
        assert_eq!(ago(29 * 86_400), "29 days ago");
        assert_eq!(ago(30 * 86_400), "1 month ago");
        assert_eq!(ago(359 * 86_400), "11 months ago");
        assert_eq!(ago(360 * 86_400), "1 year ago");
        assert_eq!(ago(800 * 86_400), "2 years ago");
    }

    #[test]
    fn test_future_is_just_now() {
        assert_eq!(format_relative(now() + Duration::hours(3), now()), "just now");
    }

    #[test]
    fn test_format_absolute_with_offset() {
        let tokyo = offset_from_minutes(9 * 60);
        assert_eq!(format_absolute(now(), tokyo, "%Y-%m-%d %H:%M"), "2024-06-15 21:00");
        assert_eq!(format_absolute(now(), offset_from_minutes(0), "%b %-d, %Y"), "Jun 15, 2024");
    }

    #[test]
    fn test_offset_out_of_range_falls_back_to_utc() {
        assert_eq!(offset_from_minutes(100_000).local_minus_utc(), 0);
    }

    #[test]
    fn test_describe_due() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(describe_due(d(2024, 6, 15), today), "due today");
        assert_eq!(describe_due(d(2024, 6, 16), today), "due in 1 day");
        assert_eq!(describe_due(d(2024, 6, 18), today), "due in 3 days");
        assert_eq!(describe_due(d(2024, 6, 13), today), "overdue by 2 days");
        assert_eq!(days_until(d(2024, 7, 15), today), 30);
    }
}
