//! # Deadline Gate
//!
//! A two-state machine transitioning on a pure clock comparison: an order is
//! closed iff now (UTC) is past its deadline. No persisted "closed" flag
//! exists; the state is recomputed on every check. Admins write regardless
//! of state, which is what lets them make last-minute corrections and reopen
//! an already-closed order by extending the deadline.
//!
//! Deadlines arrive as naive local-time strings (an HTML `datetime-local`
//! value), are interpreted in the configured fixed UTC offset, and are
//! stored as UTC.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::errors::{AppError, AppResult};

/// Write-permission state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineState {
    Open,
    Closed,
}

/// Closed iff `now > deadline`, on the second boundary
pub fn deadline_state(deadline: DateTime<Utc>, now: DateTime<Utc>) -> DeadlineState {
    if now > deadline {
        DeadlineState::Closed
    } else {
        DeadlineState::Open
    }
}

/// Gate a mutating item operation: closed orders reject non-admin writes
pub fn check_write_allowed(
    deadline: DateTime<Utc>,
    now: DateTime<Utc>,
    is_admin: bool,
) -> AppResult<()> {
    if !is_admin && deadline_state(deadline, now) == DeadlineState::Closed {
        return Err(AppError::forbidden("order is closed"));
    }
    Ok(())
}

/// Parse a naive local-time string in the given offset, yielding UTC.
///
/// Accepts `%Y-%m-%dT%H:%M` with optional seconds.
pub fn parse_local_deadline(raw: &str, offset: FixedOffset) -> AppResult<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .map_err(|_| AppError::InvalidInput(format!("invalid deadline format: {}", raw)))?;

    let local = offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| AppError::InvalidInput(format!("ambiguous deadline: {}", raw)))?;

    Ok(local.with_timezone(&Utc))
}

/// Render a UTC instant back in the given offset, `datetime-local` shaped
pub fn format_local(instant: DateTime<Utc>, offset: FixedOffset) -> String {
    instant
        .with_timezone(&offset)
        .format("%Y-%m-%dT%H:%M")
        .to_string()
}

/// ISO-8601 UTC with trailing `Z`, as carried in update notices
pub fn wire_timestamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn offset(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    #[test]
    fn test_state_transitions_on_clock() {
        let deadline = Utc::now();

        assert_eq!(
            deadline_state(deadline, deadline - Duration::seconds(1)),
            DeadlineState::Open
        );
        // Exactly at the deadline is still open
        assert_eq!(deadline_state(deadline, deadline), DeadlineState::Open);
        assert_eq!(
            deadline_state(deadline, deadline + Duration::seconds(1)),
            DeadlineState::Closed
        );
    }

    #[test]
    fn test_closed_order_blocks_non_admin_writes() {
        let deadline = Utc::now() - Duration::hours(1);
        let now = Utc::now();

        assert!(matches!(
            check_write_allowed(deadline, now, false),
            Err(AppError::Forbidden(_))
        ));
        // Admins always write
        assert!(check_write_allowed(deadline, now, true).is_ok());
    }

    #[test]
    fn test_open_order_allows_writes() {
        let deadline = Utc::now() + Duration::hours(1);
        assert!(check_write_allowed(deadline, Utc::now(), false).is_ok());
    }

    #[test]
    fn test_parse_local_converts_to_utc() {
        // 18:30 at +02:00 is 16:30 UTC
        let parsed = parse_local_deadline("2026-06-01T18:30", offset(2)).unwrap();
        assert_eq!(wire_timestamp(parsed), "2026-06-01T16:30:00Z");

        let with_seconds = parse_local_deadline("2026-06-01T18:30:15", offset(2)).unwrap();
        assert_eq!(wire_timestamp(with_seconds), "2026-06-01T16:30:15Z");
    }

    #[test]
    fn test_local_roundtrip_exact() {
        for tz in [offset(-5), offset(0), offset(2)] {
            let raw = "2026-12-24T11:45";
            let parsed = parse_local_deadline(raw, tz).unwrap();
            assert_eq!(format_local(parsed, tz), raw);
        }
    }

    #[test]
    fn test_malformed_deadline_rejected() {
        assert!(matches!(
            parse_local_deadline("tomorrow", offset(0)),
            Err(AppError::InvalidInput(_))
        ));
        assert!(parse_local_deadline("2026-13-01T10:00", offset(0)).is_err());
        assert!(parse_local_deadline("", offset(0)).is_err());
    }
}
