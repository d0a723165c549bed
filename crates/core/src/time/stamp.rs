use chrono::{Local, NaiveDateTime};

// Record identifiers have one-second resolution; two saves for the same symbol within the same
// second share a file name and the later one wins.
const REPORT_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

// Fixed-width so that string order matches chronological order.
const GENERATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

const HEADER_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn report_id(now: NaiveDateTime) -> String {
    now.format(REPORT_ID_FORMAT).to_string()
}

pub fn generated_at(now: NaiveDateTime) -> String {
    now.format(GENERATED_AT_FORMAT).to_string()
}

pub fn header_timestamp(now: NaiveDateTime) -> String {
    now.format(HEADER_FORMAT).to_string()
}

/// Parses a stored `generated_at` value. The fractional part is optional.
pub fn parse_generated_at(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M:%S%.f").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32, micro: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_micro_opt(h, m, s, micro)
            .unwrap()
    }

    #[test]
    fn formats_all_three_stamps() {
        let now = at(9, 7, 3, 120);
        assert_eq!(report_id(now), "20260105_090703");
        assert_eq!(generated_at(now), "2026-01-05T09:07:03.000120");
        assert_eq!(header_timestamp(now), "2026-01-05 09:07:03");
    }

    #[test]
    fn generated_at_is_fixed_width_on_whole_seconds() {
        assert_eq!(generated_at(at(10, 0, 0, 0)), "2026-01-05T10:00:00.000000");
    }

    #[test]
    fn parses_with_and_without_fraction() {
        assert_eq!(
            parse_generated_at("2026-01-05T09:07:03.000120"),
            Some(at(9, 7, 3, 120))
        );
        assert_eq!(parse_generated_at("2026-01-05T09:07:03"), Some(at(9, 7, 3, 0)));
        assert_eq!(parse_generated_at("yesterday"), None);
    }
}
