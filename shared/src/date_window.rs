//! Calendar dates relative to "today" in the service time zone
//!
//! All date-bounded queries and the cache freshness check run on the
//! Asia/Kolkata civil calendar, whatever the host clock's zone is.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::types::HORIZON_DAYS;

/// Time zone every civil date in the system is computed in
pub const SERVICE_TIME_ZONE: Tz = chrono_tz::Asia::Kolkata;

/// Wire format of a calendar date
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Civil date `days` days from `now` (negative = past)
pub fn local_date_from(now: DateTime<Utc>, days: i64) -> NaiveDate {
    let today = now.with_timezone(&SERVICE_TIME_ZONE).date_naive();
    today + Duration::days(days)
}

/// Same as [`local_date_from`], formatted `YYYY-MM-DD`
pub fn date_offset_from(now: DateTime<Utc>, days: i64) -> String {
    local_date_from(now, days).format(DATE_FORMAT).to_string()
}

/// Civil date `days` days from the current instant, formatted `YYYY-MM-DD`
pub fn date_offset(days: i64) -> String {
    date_offset_from(Utc::now(), days)
}

/// Month numbers (1-12) of today through six days ahead
pub fn months_from(now: DateTime<Utc>) -> [u32; HORIZON_DAYS] {
    std::array::from_fn(|day| local_date_from(now, day as i64).month())
}

pub fn next_seven_day_months() -> [u32; HORIZON_DAYS] {
    months_from(Utc::now())
}
