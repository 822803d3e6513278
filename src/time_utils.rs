use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Zone in which "now" is taken when bucketing due dates by calendar month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayZone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl Default for DisplayZone {
    fn default() -> Self {
        DisplayZone::Fixed(utc_offset())
    }
}

impl DisplayZone {
    /// Accepts IANA names (`Europe/Lisbon`), `UTC`/`GMT`, and fixed offsets
    /// such as `UTC+01:00` or `-0330`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("gmt") {
            return Some(DisplayZone::default());
        }

        let prefixed = trimmed
            .get(..3)
            .is_some_and(|p| p.eq_ignore_ascii_case("utc") || p.eq_ignore_ascii_case("gmt"));
        if prefixed {
            let offset = &trimmed[3..];
            if offset.is_empty() {
                return Some(DisplayZone::default());
            }
            return parse_fixed_offset(offset).map(DisplayZone::Fixed);
        }

        if let Some(offset) = parse_fixed_offset(trimmed) {
            return Some(DisplayZone::Fixed(offset));
        }

        trimmed.parse::<Tz>().ok().map(DisplayZone::Named)
    }

    pub fn localize(&self, utc_dt: DateTime<Utc>) -> NaiveDateTime {
        match self {
            DisplayZone::Named(tz) => utc_dt.with_timezone(tz).naive_local(),
            DisplayZone::Fixed(offset) => utc_dt.with_timezone(offset).naive_local(),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.localize(Utc::now())
    }
}

fn utc_offset() -> FixedOffset {
    FixedOffset::east_opt(0).expect("zero offset is always valid")
}

fn parse_fixed_offset(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    let (sign, rest) = match trimmed.chars().next()? {
        '+' => (1, &trimmed[1..]),
        '-' => (-1, &trimmed[1..]),
        _ => return None,
    };

    let rest = rest.trim();
    // digits with an optional colon; keeps the byte split below on a char boundary
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit() || b == b':') {
        return None;
    }

    let (hours, minutes) = if let Some((h, m)) = rest.split_once(':') {
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else if rest.len() > 2 {
        let (h, m) = rest.split_at(rest.len() - 2);
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else {
        (rest.parse::<i32>().ok()?, 0)
    };

    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parses the ISO forms the backend emits: a bare date (`2024-06-01`, read as
/// midnight), a naive date-time, or RFC 3339 with an offset. Values carrying
/// an offset are converted into `zone`, so `2024-06-30T23:00:00Z` lands on
/// July 1st in Lisbon; offset-less values are already local.
pub fn parse_iso(raw: &str, zone: &DisplayZone) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(zone.localize(dt.with_timezone(&Utc)));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

/// `dd/MM/yyyy`, or `-` when the value is missing or unparseable.
pub fn format_display_date(raw: Option<&str>, zone: &DisplayZone) -> String {
    raw.and_then(|r| parse_iso(r, zone))
        .map(|dt| dt.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Calendar month following `(year, month)`, rolling December into January.
pub fn following_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

pub fn same_month(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

pub fn month_abbrev(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "Unknown",
    }
}
