use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// 解析过期时间，支持：
/// - RFC3339：2026-10-01T12:00:00Z（前端 `toISOString()` 的格式）
/// - 无时区日期时间：2026-10-01T12:00 或 2026-10-01T12:00:00（按 UTC）
/// - 日期：2026-10-01（当天结束，UTC）
/// - 相对时间：1d, 2w, 1h30m, 1M, 1y
pub fn parse_expire_time(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("过期时间不能为空".to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        return Ok(date.and_time(end_of_day).and_utc());
    }

    parse_relative_time(input, now)
}

fn parse_relative_time(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
    let mut total = Duration::zero();
    let mut rest = input;

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(format!("无效的时间格式: '{}'", input));
        }
        let num: i64 = rest[..digits_end]
            .parse()
            .map_err(|_| format!("无效的数字: '{}'", &rest[..digits_end]))?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        if unit_end == 0 {
            return Err(format!("缺少时间单位，数字 '{}' 后应跟时间单位", num));
        }
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        // `M` 是月，`m` 是分钟
        let duration = match unit {
            "M" => Duration::days(num * 30),
            _ => match unit.to_lowercase().as_str() {
                "s" | "sec" | "second" | "seconds" => Duration::seconds(num),
                "m" | "min" | "minute" | "minutes" => Duration::minutes(num),
                "h" | "hour" | "hours" => Duration::hours(num),
                "d" | "day" | "days" => Duration::days(num),
                "w" | "week" | "weeks" => Duration::weeks(num),
                "month" | "months" => Duration::days(num * 30),
                "y" | "year" | "years" => Duration::days(num * 365),
                _ => return Err(format!("不支持的时间单位: '{}'", unit)),
            },
        };
        total += duration;
    }

    if total == Duration::zero() {
        return Err("时间间隔不能为零".to_string());
    }

    now.checked_add_signed(total)
        .ok_or_else(|| "计算的过期时间超出了有效范围".to_string())
}
