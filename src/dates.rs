use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

/// Format attempts in priority order. The bool marks formats carrying a
/// time-of-day component; the rest parse as dates at midnight. Every
/// attempt must consume the whole string, so "2024/12/20 10:00" never
/// half-matches the date-only pattern.
const DATE_FORMATS: &[(&str, bool)] = &[
    ("%Y/%m/%d", false),
    ("%Y-%m-%d", false),
    ("%Y年%m月%d日", false),
    ("%Y/%m/%d %H:%M:%S", true),
    ("%Y-%m-%d %H:%M:%S", true),
    ("%Y年%m月%d日 %H:%M:%S", true),
    ("%Y/%m/%d %H:%M", true),
    ("%Y-%m-%d %H:%M", true),
];

/// Normalizes the portal's assorted date spellings into timestamps.
pub struct DateParser {
    ymd_fallback: Regex,
}

impl Default for DateParser {
    fn default() -> Self {
        DateParser::new()
    }
}

impl DateParser {
    pub fn new() -> Self {
        DateParser {
            // Loose year/month/day extraction used when no structured
            // format matches the whole string.
            ymd_fallback: Regex::new(r"(\d{4})[/\-年](\d{1,2})[/\-月](\d{1,2})").unwrap(),
        }
    }

    /// `None` means the date is unknown, not that the row is bad;
    /// callers keep rows with unknown dates.
    pub fn parse(&self, raw: &str) -> Option<NaiveDateTime> {
        // Masked-date markers show up on listings behind a login wall.
        let cleaned = raw.trim().replace("****", "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return None;
        }

        for (format, has_time) in DATE_FORMATS {
            if *has_time {
                if let Ok(datetime) = NaiveDateTime::parse_from_str(cleaned, format) {
                    return Some(datetime);
                }
            } else if let Ok(date) = NaiveDate::parse_from_str(cleaned, format) {
                return date.and_hms_opt(0, 0, 0);
            }
        }

        let caps = self.ymd_fallback.captures(cleaned)?;
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
    }
}
