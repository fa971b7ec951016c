//! Display formatting shared by the view-model.

use chrono::{Datelike, NaiveDate, TimeZone};

/// Icon host template; `{}` is the icon code.
pub const ICON_URL_TEMPLATE: &str = "https://openweathermap.org/img/wn/{}@2x.png";

pub const TOMORROW_LABEL: &str = "Tomorrow";

/// Round half up to a whole number (so `-2.5` becomes `-2`).
pub fn round_half_up(value: f64) -> i64 {
    let floor = value.floor();
    if value - floor >= 0.5 { floor as i64 + 1 } else { floor as i64 }
}

/// Current-conditions temperature, e.g. `18°C`.
pub fn celsius(value: f64) -> String {
    format!("{}°C", round_half_up(value))
}

/// Forecast temperature, e.g. `18°`.
pub fn degrees(value: f64) -> String {
    format!("{}°", round_half_up(value))
}

/// Server-provided measurement as sent, minus binary float noise
/// (`14.760000000000002` shows as `14.76`, `10.0` as `10`).
pub fn number(value: f64) -> String {
    const SCALE: f64 = 1e6;
    // Adding 0.0 turns -0.0 into 0.0.
    let cleaned = (value * SCALE).round() / SCALE + 0.0;
    cleaned.to_string()
}

/// `HH:MM` (24-hour) wall-clock time of `epoch_secs` in `tz`, using the
/// zone's offset at that instant.
pub fn clock_time<Tz: TimeZone>(epoch_secs: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match tz.timestamp_opt(epoch_secs, 0).single() {
        Some(dt) => dt.format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

pub fn icon_url(icon: &str) -> String {
    ICON_URL_TEMPLATE.replace("{}", icon)
}

/// `M/D` without leading zeros.
pub fn short_date(date: NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}

/// Card label: "Tomorrow" for the day after `today`, else the server's day name.
pub fn day_label(date: NaiveDate, day_name: &str, today: NaiveDate) -> String {
    if today.succ_opt() == Some(date) {
        TOMORROW_LABEL.to_string()
    } else {
        day_name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, LocalResult, NaiveDateTime, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rounds_half_up_like_a_browser() {
        assert_eq!(round_half_up(17.5), 18);
        assert_eq!(round_half_up(17.49), 17);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.51), -3);
        assert_eq!(round_half_up(0.0), 0);
    }

    #[test]
    fn temperature_markers() {
        assert_eq!(celsius(17.6), "18°C");
        assert_eq!(celsius(-0.4), "0°C");
        assert_eq!(degrees(20.4), "20°");
        assert_eq!(degrees(-3.7), "-4°");
    }

    #[test]
    fn numbers_keep_server_precision() {
        assert_eq!(number(9.876), "9.876");
        assert_eq!(number(0.25), "0.25");
        assert_eq!(number(72.0), "72");
        assert_eq!(number(-0.0), "0");
    }

    #[test]
    fn numbers_drop_float_noise() {
        assert_eq!(number(14.760000000000002), "14.76");
        assert_eq!(number(0.1 + 0.2), "0.3");
        assert_eq!(number(9.999999999999998), "10");
    }

    #[test]
    fn clock_time_uses_the_given_zone() {
        // 2024-05-01T04:30:00Z
        let epoch = 1_714_537_800;
        assert_eq!(clock_time(epoch, &Utc), "04:30");

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(clock_time(epoch, &plus_two), "06:30");

        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(clock_time(epoch, &minus_five), "23:30");
    }

    #[test]
    fn clock_time_follows_offset_changes_within_a_day() {
        let zone = ShiftingZone { switch_at: SWITCH_AT };
        // 04:30Z is before the switch (+01:00), 19:25Z after it (+02:00).
        assert_eq!(clock_time(1_714_537_800, &zone), "05:30");
        assert_eq!(clock_time(1_714_591_500, &zone), "21:25");
    }

    /// 2024-05-01T12:00:00Z
    const SWITCH_AT: i64 = 1_714_564_800;

    /// Zone moving from +01:00 to +02:00 at `switch_at`, like a DST change.
    #[derive(Debug, Clone, Copy)]
    struct ShiftingZone {
        switch_at: i64,
    }

    impl ShiftingZone {
        fn offset_at(&self, epoch: i64) -> FixedOffset {
            let hours = if epoch < self.switch_at { 1 } else { 2 };
            FixedOffset::east_opt(hours * 3600).unwrap()
        }
    }

    impl TimeZone for ShiftingZone {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            ShiftingZone { switch_at: SWITCH_AT }
        }

        fn offset_from_local_date(&self, _: &NaiveDate) -> LocalResult<FixedOffset> {
            LocalResult::Single(self.offset_at(i64::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            LocalResult::Single(self.offset_at(local.and_utc().timestamp() - 3600))
        }

        fn offset_from_utc_date(&self, _: &NaiveDate) -> FixedOffset {
            self.offset_at(i64::MIN)
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            self.offset_at(utc.and_utc().timestamp())
        }
    }

    #[test]
    fn icon_url_fills_template() {
        assert_eq!(icon_url("10d"), "https://openweathermap.org/img/wn/10d@2x.png");
    }

    #[test]
    fn short_date_has_no_padding() {
        assert_eq!(short_date(date(2024, 5, 2)), "5/2");
        assert_eq!(short_date(date(2024, 12, 31)), "12/31");
    }

    #[test]
    fn tomorrow_label_only_for_next_day() {
        let today = date(2024, 12, 31);
        assert_eq!(day_label(date(2025, 1, 1), "Wednesday", today), "Tomorrow");
        assert_eq!(day_label(date(2025, 1, 2), "Thursday", today), "Thursday");
        assert_eq!(day_label(today, "Tuesday", today), "Tuesday");
        assert_eq!(day_label(date(2024, 12, 30), "Monday", today), "Monday");
    }
}
