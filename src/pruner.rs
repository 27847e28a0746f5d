//! Background thread that auto-cancels `GoodForDay` orders at a configured
//! local wall-clock boundary (default 16:00). Grounded directly in
//! `original_source/src/Orderbook.cpp`'s `PruneGoodForDayOrders`.

use std::time::Duration;

use chrono::{Local, NaiveTime};

/// A small wake-up safety margin to absorb condvar/scheduler jitter, as in
/// the original's `milliseconds(100)`.
const WAKE_MARGIN: Duration = Duration::from_millis(100);

/// Computes how long to sleep until the next occurrence of `prune_at` local
/// time, starting from `now`. If `now` is already at or past `prune_at`
/// today, targets tomorrow.
pub fn time_until_next_prune(now: chrono::DateTime<Local>, prune_at: NaiveTime) -> Duration {
    let today = now.date_naive();
    let mut target = today.and_time(prune_at);
    if now.naive_local() >= target {
        target += chrono::Duration::days(1);
    }
    let till = target - now.naive_local();
    till.to_std().unwrap_or(Duration::ZERO) + WAKE_MARGIN
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, mi: u32) -> chrono::DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, mi, 0).unwrap()
    }

    #[test]
    fn targets_today_when_before_prune_time() {
        let now = at(2026, 7, 31, 9, 0);
        let till = time_until_next_prune(now, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert_eq!(till, Duration::from_secs(7 * 3600) + WAKE_MARGIN);
    }

    #[test]
    fn targets_tomorrow_when_at_or_past_prune_time() {
        let now = at(2026, 7, 31, 16, 0);
        let till = time_until_next_prune(now, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert_eq!(till, Duration::from_secs(24 * 3600) + WAKE_MARGIN);

        let now_past = at(2026, 7, 31, 23, 59);
        let till_past = time_until_next_prune(now_past, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert_eq!(till_past, Duration::from_secs((16 * 3600) + 60) + WAKE_MARGIN);
    }
}
