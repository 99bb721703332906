//! Tenant-local time from the platform's UTC-offset strings.

use {
    chrono::{DateTime, FixedOffset, Offset, Timelike, Utc},
    tracing::warn,
};

/// Parse a platform offset token (`-0500`, `+05:30`) into a fixed offset.
///
/// The platform reports `shop.timezoneOffset` as a signed `HHMM` pair with
/// an optional colon. Anything that does not match degrades to UTC instead
/// of failing the run.
#[must_use]
pub fn parse_utc_offset(raw: &str) -> FixedOffset {
    let trimmed = raw.trim();
    match offset_from_token(trimmed) {
        Some(offset) => offset,
        None => {
            if !trimmed.is_empty() {
                warn!(offset = trimmed, "unparseable timezone offset, using UTC");
            }
            Utc.fix()
        },
    }
}

fn offset_from_token(token: &str) -> Option<FixedOffset> {
    let (sign, rest) = match token.as_bytes().first()? {
        b'+' => (1, &token[1..]),
        b'-' => (-1, &token[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Hour of day (0-23) at the tenant's offset for a UTC instant.
#[must_use]
pub fn local_hour(now: DateTime<Utc>, offset: FixedOffset) -> u8 {
    now.with_timezone(&offset).hour() as u8
}
