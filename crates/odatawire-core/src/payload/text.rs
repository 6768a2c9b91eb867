//! ISO 8601 text forms for temporal values.
//!
//! Formatting is written out by hand so the wire form stays stable
//! (`YYYY-MM-DD`, `hh:mm:ss[.f]`, RFC 3339 timestamps, `[-]P[nD]T[nH][nM]nS`)
//! independent of which well-known descriptions the time crate ships.

use time::{Date, Duration, Month, OffsetDateTime, Time, format_description::well_known::Rfc3339};

const SECONDS_PER_DAY: i64 = 86_400;

#[must_use]
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

#[must_use]
pub fn format_time(time: Time) -> String {
    let (h, m, s, nanos) = time.as_hms_nano();

    format!("{h:02}:{m:02}:{s:02}{}", fraction(nanos))
}

#[must_use]
pub fn format_datetime(value: OffsetDateTime) -> String {
    let offset = value.offset();
    let zone = if offset.is_utc() {
        "Z".to_string()
    } else {
        let (h, m, _) = offset.as_hms();
        let sign = if offset.is_negative() { '-' } else { '+' };
        format!("{sign}{:02}:{:02}", h.unsigned_abs(), m.unsigned_abs())
    };

    format!(
        "{}T{}{zone}",
        format_date(value.date()),
        format_time(value.time())
    )
}

#[must_use]
pub fn format_duration(value: Duration) -> String {
    let negative = value.is_negative();
    let value = value.abs();
    let total = value.whole_seconds();
    let nanos = value.subsec_nanoseconds().unsigned_abs();

    let days = total / SECONDS_PER_DAY;
    let hours = (total % SECONDS_PER_DAY) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let mut out = String::from(if negative { "-P" } else { "P" });
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    out.push('T');
    if hours > 0 {
        out.push_str(&format!("{hours}H"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}M"));
    }
    out.push_str(&format!("{seconds}{}S", fraction(nanos)));

    out
}

// ".5" for 500_000_000ns, empty for whole seconds
fn fraction(nanos: u32) -> String {
    if nanos == 0 {
        return String::new();
    }
    let digits = format!("{nanos:09}");

    format!(".{}", digits.trim_end_matches('0'))
}

#[must_use]
pub fn parse_date(text: &str) -> Option<Date> {
    let mut parts = text.trim().splitn(3, '-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u8>().ok()?;
    let day = parts.next()?.parse::<u8>().ok()?;

    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}

#[must_use]
pub fn parse_time(text: &str) -> Option<Time> {
    let (clock, frac) = match text.trim().split_once('.') {
        Some((clock, frac)) => (clock, Some(frac)),
        None => (text.trim(), None),
    };

    let mut parts = clock.split(':');
    let hour = parts.next()?.parse::<u8>().ok()?;
    let minute = parts.next()?.parse::<u8>().ok()?;
    let second = parts.next().map_or(Some(0), |s| s.parse::<u8>().ok())?;
    if parts.next().is_some() {
        return None;
    }
    let nanos = match frac {
        Some(frac) => parse_fraction(frac)?,
        None => 0,
    };

    Time::from_hms_nano(hour, minute, second, nanos).ok()
}

#[must_use]
pub fn parse_datetime(text: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(text.trim(), &Rfc3339).ok()
}

/// Parse `[-]P[nD][T[nH][nM][n[.f]S]]`.
#[must_use]
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let rest = rest.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };

    let mut total = Duration::ZERO;
    let mut seen = false;

    if !date_part.is_empty() {
        let days = date_part.strip_suffix('D')?.parse::<i64>().ok()?;
        total += Duration::days(days);
        seen = true;
    }

    if let Some(mut time_part) = time_part {
        for (unit, seconds) in [('H', 3_600), ('M', 60)] {
            if let Some((amount, tail)) = time_part.split_once(unit) {
                total += Duration::seconds(amount.parse::<i64>().ok()?.checked_mul(seconds)?);
                time_part = tail;
                seen = true;
            }
        }
        if let Some(amount) = time_part.strip_suffix('S') {
            let (whole, frac) = match amount.split_once('.') {
                Some((whole, frac)) => (whole, parse_fraction(frac)?),
                None => (amount, 0),
            };
            total += Duration::new(whole.parse::<i64>().ok()?, i32::try_from(frac).ok()?);
            seen = true;
        } else if !time_part.is_empty() {
            return None;
        }
    }

    if !seen {
        return None;
    }

    Some(if negative { -total } else { total })
}

fn parse_fraction(frac: &str) -> Option<u32> {
    if frac.is_empty() || frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let padded = format!("{frac:0<9}");

    padded.parse().ok()
}

///
/// TESTS
///
