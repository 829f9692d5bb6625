// by default, chrono will format with 10 or so fractional digits but python's
// builtin iso datetime parser only supports 6 digits, so this makes it a pain
// for postprocessing
pub const ISO_8601_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%:z";

/// Format used to name photos, videos and interval directories, e.g.
/// `March_04_24_17_09_55`.
pub const FILE_STAMP_FORMAT: &str = "%B_%d_%y_%H_%M_%S";

pub fn serialize_time<S>(
    this: &chrono::DateTime<chrono::Local>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::ser::Serializer,
{
    serializer.collect_str(&this.format(ISO_8601_FORMAT).to_string())
}

pub fn file_stamp(time: &chrono::DateTime<chrono::Local>) -> String {
    time.format(FILE_STAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Stamped {
        #[serde(serialize_with = "serialize_time")]
        at: chrono::DateTime<chrono::Local>,
    }

    #[test]
    fn file_stamp_is_month_day_year_time() {
        let time = chrono::Local.with_ymd_and_hms(2024, 3, 4, 17, 9, 55).unwrap();
        assert_eq!(file_stamp(&time), "March_04_24_17_09_55");
    }

    #[test]
    fn time_serializes_with_six_fractional_digits() {
        let time = chrono::Local.with_ymd_and_hms(2024, 3, 4, 17, 9, 55).unwrap();
        let json = serde_json::to_string(&Stamped { at: time }).unwrap();
        assert!(json.contains("2024-03-04T17:09:55.000000"), "{json}");
    }
}
