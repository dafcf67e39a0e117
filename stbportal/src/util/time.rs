use chrono::{DateTime, Utc};

/// Get the current time as a UTC datetime.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as whole seconds since the Unix epoch.
///
/// Boxes read profile timestamps as plain integers, not ISO strings.
pub fn unix_timestamp() -> i64 {
    now().timestamp()
}
