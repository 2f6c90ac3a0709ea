use chrono::{Local, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};

/// Length of a calendar day bucket in milliseconds.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Current wall-clock time as epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Inclusive epoch-millisecond bounds of today in the device's local calendar.
pub fn today_bounds() -> (i64, i64) {
    day_bounds_in(&Local, Local::now().date_naive())
}

/// Inclusive bounds `[start_of_day, start_of_day + DAY_MS - 1]` of `date` in `tz`.
///
/// When midnight falls into a DST gap the day starts at the first valid
/// local instant after it.
pub fn day_bounds_in<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> (i64, i64) {
    let midnight = date.and_time(NaiveTime::MIN);
    let start = (0..=3)
        .filter_map(|hours| {
            tz.from_local_datetime(&(midnight + TimeDelta::hours(hours)))
                .earliest()
        })
        .next()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| midnight.and_utc().timestamp_millis());

    (start, start + DAY_MS - 1)
}
