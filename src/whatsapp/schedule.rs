use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime, Timelike};

use super::SendError;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Hour and minute of `now + delay`, seconds dropped.
pub fn fallback_time(now: NaiveDateTime, delay: chrono::Duration) -> (u32, u32) {
    let at = now + delay;
    (at.hour(), at.minute())
}

/// Whole seconds from `now` until the next `hour:minute:00`. A time already
/// passed today rolls over to tomorrow.
pub fn seconds_until(now: NaiveTime, hour: u32, minute: u32) -> Result<u64, SendError> {
    let target =
        NaiveTime::from_hms_opt(hour, minute, 0).ok_or(SendError::InvalidTime { hour, minute })?;

    let left = i64::from(target.num_seconds_from_midnight())
        - i64::from(now.num_seconds_from_midnight());
    Ok(left.rem_euclid(SECONDS_PER_DAY) as u64)
}

/// How long to sleep before opening the chat so the message goes out at
/// `hour:minute`.
pub fn delay_before_send(
    now: NaiveTime,
    hour: u32,
    minute: u32,
    wait_time: Duration,
) -> Result<Duration, SendError> {
    let left = seconds_until(now, hour, minute)?;
    let wait = wait_time.as_secs();
    if left < wait {
        return Err(SendError::CallTime { left, wait });
    }
    Ok(Duration::from_secs(left - wait))
}
