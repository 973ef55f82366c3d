//! RFC 3339 timestamps with millisecond precision, as JavaScript's
//! `Date.prototype.toISOString` writes them. The signed message is built
//! from these strings, so the JSON form and the message form must agree.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    let millis = now.timestamp_millis();
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(now)
}

pub fn format(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn serialize<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(time))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_like_javascript() {
        let time = DateTime::parse_from_rfc3339("2024-03-01T12:30:05.5+00:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format(&time), "2024-03-01T12:30:05.500Z");
    }

    #[test]
    fn now_is_truncated_to_millis() {
        let now = now();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
