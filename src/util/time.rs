use chrono::{DateTime, Duration, FixedOffset, Utc};

/// Fixed destination offset for all stored timestamps: +05:30.
const TARGET_OFFSET_SECS: i32 = 330 * 60;

/// Grace interval subtracted when stamping lifecycle timestamps, compensating
/// for the lag between the actual status change and this run observing it.
const LIFECYCLE_GRACE_SECS: i64 = 60;

fn target_offset() -> FixedOffset {
    FixedOffset::east_opt(TARGET_OFFSET_SECS).expect("offset is within +/-24h")
}

/// Re-express an absolute instant as wall-clock time at the target offset.
pub fn to_target_offset(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&target_offset())
}

/// Current time at the target offset.
pub fn now_in_target_offset() -> DateTime<FixedOffset> {
    to_target_offset(Utc::now())
}

/// Current time at the target offset, backdated by the grace interval.
pub fn adjusted_now() -> DateTime<FixedOffset> {
    now_in_target_offset() - Duration::seconds(LIFECYCLE_GRACE_SECS)
}
