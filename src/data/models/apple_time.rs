use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de::Error as _, Deserialize, Deserializer};
use serde_with::DeserializeAs;

use crate::errors::RelayError;

/// Layout of the formatted dates in verifyReceipt responses and status update
/// notifications, e.g. "2019-03-13 19:11:36 Etc/GMT".
const APPLE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S Etc/GMT";

/// Decodes an App Store date value. Accepts the formatted string layout or a
/// string of epoch milliseconds. An empty string or "0" means absent.
pub(crate) fn parse(value: &str) -> Result<Option<DateTime<Utc>>, RelayError> {
    let value = value.trim();
    if value.is_empty() || value == "0" {
        return Ok(None);
    }
    if value.bytes().all(|b| b.is_ascii_digit()) {
        let millis: i64 = value
            .parse()
            .map_err(|_| RelayError::MalformedTimestamp(value.to_string()))?;
        return from_millis(millis).map(Some);
    }
    NaiveDateTime::parse_from_str(value, APPLE_TIME_FORMAT)
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| RelayError::MalformedTimestamp(value.to_string()))
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, RelayError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| RelayError::MalformedTimestamp(millis.to_string()))
}

/// `serde_with` adapter for optional App Store date fields. Missing, null,
/// empty and "0" values all decode to `None`.
pub(crate) struct AppleTime;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAppleTime {
    Text(String),
    Millis(i64),
}

impl<'de> DeserializeAs<'de, Option<DateTime<Utc>>> for AppleTime {
    fn deserialize_as<D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<RawAppleTime>::deserialize(deserializer)? {
            None => Ok(None),
            Some(RawAppleTime::Text(text)) => parse(&text).map_err(D::Error::custom),
            Some(RawAppleTime::Millis(0)) => Ok(None),
            Some(RawAppleTime::Millis(millis)) => {
                from_millis(millis).map(Some).map_err(D::Error::custom)
            }
        }
    }
}
