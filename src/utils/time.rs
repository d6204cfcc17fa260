use chrono::{DateTime, SecondsFormat, Utc};

/// Zoom expects `yyyy-MM-ddTHH:mm:ssZ` for scheduled meetings.
pub fn to_zoom_time(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn zoom_time_has_no_fraction_and_utc_suffix() {
        let dt = Utc.with_ymd_and_hms(2025, 4, 2, 15, 30, 0).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(to_zoom_time(dt), "2025-04-02T15:30:00Z");
    }
}
