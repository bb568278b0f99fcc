//! Movie running time.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

pub const MIN_RUNTIME_MINUTES: i32 = 2;
pub const MAX_RUNTIME_MINUTES: i32 = 200;

/// Running time in whole minutes. Written and read as `"<n> mins"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Runtime(i32);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("must be of the form \"<minutes> mins\"")]
    Shape,

    #[error("minutes must be an integer")]
    NotAnInteger,

    #[error("must be between {MIN_RUNTIME_MINUTES} and {MAX_RUNTIME_MINUTES} mins")]
    OutOfRange,
}

impl Runtime {
    /// # Errors
    ///
    /// Returns [`RuntimeError::OutOfRange`] outside the accepted bounds.
    pub const fn from_minutes(minutes: i32) -> Result<Self, RuntimeError> {
        if minutes < MIN_RUNTIME_MINUTES || minutes > MAX_RUNTIME_MINUTES {
            return Err(RuntimeError::OutOfRange);
        }

        Ok(Self(minutes))
    }

    #[must_use]
    pub const fn minutes(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl FromStr for Runtime {
    type Err = RuntimeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.split(' ');

        let (Some(minutes), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(RuntimeError::Shape);
        };

        let minutes: i32 = minutes.parse().map_err(|_| RuntimeError::NotAnInteger)?;

        if unit != "mins" {
            return Err(RuntimeError::Shape);
        }

        Self::from_minutes(minutes)
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;

        value.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_with_unit() {
        assert_eq!("102 mins".parse::<Runtime>().map(Runtime::minutes), Ok(102));
        assert_eq!("2 mins".parse::<Runtime>().map(Runtime::minutes), Ok(2));
        assert_eq!("200 mins".parse::<Runtime>().map(Runtime::minutes), Ok(200));
    }

    #[test]
    fn rejects_bad_shapes() {
        assert_eq!("102".parse::<Runtime>(), Err(RuntimeError::Shape));
        assert_eq!("102 mins long".parse::<Runtime>(), Err(RuntimeError::Shape));
        assert_eq!("102  mins".parse::<Runtime>(), Err(RuntimeError::Shape));
        assert_eq!("102 minutes".parse::<Runtime>(), Err(RuntimeError::Shape));
        assert_eq!("ten mins".parse::<Runtime>(), Err(RuntimeError::NotAnInteger));
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!("1 mins".parse::<Runtime>(), Err(RuntimeError::OutOfRange));
        assert_eq!("201 mins".parse::<Runtime>(), Err(RuntimeError::OutOfRange));
        assert_eq!("-5 mins".parse::<Runtime>(), Err(RuntimeError::OutOfRange));
    }

    #[test]
    fn json_form_is_a_string() -> Result<(), serde_json::Error> {
        let runtime = Runtime::from_minutes(95).map_err(serde::ser::Error::custom)?;

        assert_eq!(serde_json::to_string(&runtime)?, "\"95 mins\"");
        assert_eq!(serde_json::from_str::<Runtime>("\"95 mins\"")?, runtime);
        assert!(serde_json::from_str::<Runtime>("95").is_err());

        Ok(())
    }
}
