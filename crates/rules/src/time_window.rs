//! Time-window evaluation for rule time conditions.

use chrono::{DateTime, Datelike, Timelike, Utc};
use tracing::debug;

use alertflow_core::{TimeCondition, TimeWindow};

/// Evaluate a time condition at instant `t`.
///
/// The instant is converted to the condition's timezone (unknown names fall
/// back to UTC) and the condition matches iff at least one window matches.
/// A condition with no windows matches always.
pub fn time_condition_matches(tc: &TimeCondition, t: DateTime<Utc>) -> bool {
    if tc.windows.is_empty() {
        return true;
    }

    let tz: chrono_tz::Tz = tc.timezone.parse().unwrap_or_else(|_| {
        debug!(timezone = %tc.timezone, "unknown timezone, falling back to UTC");
        chrono_tz::UTC
    });
    let local = t.with_timezone(&tz);
    let day = u8::try_from(local.weekday().number_from_monday()).unwrap_or(1);
    let minute_of_day = local.hour() * 60 + local.minute();

    tc.windows
        .iter()
        .any(|w| window_matches(w, day, minute_of_day))
}

/// Evaluate a single window at the local `(day, minute)` position.
///
/// `end < start` denotes an overnight span crossing midnight. `invert`
/// flips membership for this window only. A malformed `HH:MM` bound makes
/// the window non-matching regardless of `invert`.
fn window_matches(window: &TimeWindow, day: u8, minute_of_day: u32) -> bool {
    let (Some(start), Some(end)) = (
        parse_hhmm(&window.start_time),
        parse_hhmm(&window.end_time),
    ) else {
        debug!(
            start = %window.start_time,
            end = %window.end_time,
            "malformed time window bounds, treating as non-matching"
        );
        return false;
    };

    let day_ok = window.days_of_week.is_empty() || window.days_of_week.contains(&day);

    let in_span = if end < start {
        // Overnight window spanning midnight.
        minute_of_day >= start || minute_of_day < end
    } else {
        minute_of_day >= start && minute_of_day < end
    };

    let natural = day_ok && in_span;
    if window.invert { !natural } else { natural }
}

/// Parse an `HH:MM` string into a minute-of-day value.
fn parse_hhmm(s: &str) -> Option<u32> {
    let (hours, minutes) = s.split_once(':')?;
    let h: u32 = hours.parse().ok()?;
    let m: u32 = minutes.parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn window(days: &[u8], start: &str, end: &str, invert: bool) -> TimeWindow {
        TimeWindow {
            days_of_week: days.to_vec(),
            start_time: start.to_owned(),
            end_time: end.to_owned(),
            invert,
        }
    }

    fn condition(timezone: &str, windows: Vec<TimeWindow>) -> TimeCondition {
        TimeCondition {
            timezone: timezone.to_owned(),
            windows,
        }
    }

    /// Tuesday 2026-03-03.
    fn tuesday_at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 3, hour, minute, 0).unwrap()
    }

    #[test]
    fn empty_windows_match_always() {
        let tc = condition("UTC", vec![]);
        assert!(time_condition_matches(&tc, tuesday_at(12, 0)));
    }

    #[test]
    fn business_hours_window() {
        let tc = condition("UTC", vec![window(&[1, 2, 3, 4, 5], "09:00", "17:00", false)]);
        assert!(time_condition_matches(&tc, tuesday_at(9, 0)));
        assert!(time_condition_matches(&tc, tuesday_at(16, 59)));
        assert!(!time_condition_matches(&tc, tuesday_at(17, 0)), "end is exclusive");
        assert!(!time_condition_matches(&tc, tuesday_at(8, 59)));
    }

    #[test]
    fn overnight_window_spans_midnight() {
        let tc = condition("UTC", vec![window(&[1, 2, 3, 4, 5], "22:00", "06:00", false)]);
        assert!(time_condition_matches(&tc, tuesday_at(2, 30)));
        assert!(time_condition_matches(&tc, tuesday_at(23, 0)));
        assert!(!time_condition_matches(&tc, tuesday_at(7, 0)));
        assert!(!time_condition_matches(&tc, tuesday_at(21, 59)));
    }

    #[test]
    fn day_filter_applies() {
        // Saturday only (6).
        let tc = condition("UTC", vec![window(&[6], "00:00", "23:59", false)]);
        assert!(!time_condition_matches(&tc, tuesday_at(12, 0)));
    }

    #[test]
    fn empty_days_match_every_day() {
        let tc = condition("UTC", vec![window(&[], "00:00", "23:59", false)]);
        assert!(time_condition_matches(&tc, tuesday_at(12, 0)));
    }

    #[test]
    fn invert_flips_single_window() {
        let tc = condition("UTC", vec![window(&[], "09:00", "17:00", true)]);
        assert!(!time_condition_matches(&tc, tuesday_at(12, 0)));
        assert!(time_condition_matches(&tc, tuesday_at(20, 0)));
    }

    #[test]
    fn any_window_matching_is_enough() {
        let tc = condition(
            "UTC",
            vec![
                window(&[6, 7], "00:00", "23:59", false),
                window(&[], "11:00", "13:00", false),
            ],
        );
        assert!(time_condition_matches(&tc, tuesday_at(12, 0)));
    }

    #[test]
    fn timezone_conversion_applies() {
        // 08:00 UTC is 09:00 in Berlin (winter), inside business hours there.
        let tc = condition(
            "Europe/Berlin",
            vec![window(&[1, 2, 3, 4, 5], "09:00", "17:00", false)],
        );
        let t = Utc.with_ymd_and_hms(2026, 1, 6, 8, 0, 0).unwrap();
        assert!(time_condition_matches(&tc, t));

        let utc_tc = condition("UTC", vec![window(&[1, 2, 3, 4, 5], "09:00", "17:00", false)]);
        assert!(!time_condition_matches(&utc_tc, t));
    }

    #[test]
    fn unknown_timezone_falls_back_to_utc() {
        let tc = condition("Not/AZone", vec![window(&[], "11:00", "13:00", false)]);
        assert!(time_condition_matches(&tc, tuesday_at(12, 0)));
    }

    #[test]
    fn malformed_bounds_never_match_even_inverted() {
        let tc = condition("UTC", vec![window(&[], "9am", "17:00", false)]);
        assert!(!time_condition_matches(&tc, tuesday_at(12, 0)));

        let tc = condition("UTC", vec![window(&[], "25:00", "17:00", true)]);
        assert!(!time_condition_matches(&tc, tuesday_at(12, 0)));
    }

    #[test]
    fn parse_hhmm_bounds() {
        assert_eq!(parse_hhmm("00:00"), Some(0));
        assert_eq!(parse_hhmm("23:59"), Some(1439));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("12:60"), None);
        assert_eq!(parse_hhmm("noon"), None);
    }
}
