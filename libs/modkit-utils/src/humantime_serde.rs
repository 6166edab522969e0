//! Serde helpers for human-readable durations (`"30s"`, `"1h 15m"`).
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Foo {
//!     #[serde(with = "modkit_utils::humantime_serde")]
//!     timeout: Duration,
//! }
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserializer, Serializer, de};

/// Deserialize a `Duration` from a humantime string.
///
/// # Errors
///
/// Returns a deserializer error if the input is not a string or does not
/// parse as a humantime duration.
pub fn deserialize<'de, D>(d: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    d.deserialize_str(DurationVisitor)
}

/// Serialize a `Duration` as a humantime string.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.collect_str(&humantime::format_duration(*d))
}

struct DurationVisitor;

impl de::Visitor<'_> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a duration such as \"15s\" or \"1h 30m\"")
    }

    fn visit_str<E>(self, v: &str) -> Result<Duration, E>
    where
        E: de::Error,
    {
        humantime::parse_duration(v).map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]

    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Serialize, Deserialize)]
    struct Plain {
        #[serde(with = "super")]
        every: Duration,
    }

    #[test]
    fn plain_duration() {
        let foo: Plain = serde_json::from_str(r#"{"every": "10m 10s"}"#).unwrap();
        assert_eq!(foo.every, Duration::new(610, 0));
        assert_eq!(serde_json::to_string(&foo).unwrap(), r#"{"every":"10m 10s"}"#);
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Plain>(r#"{"every": "soon"}"#).is_err());
    }
}
