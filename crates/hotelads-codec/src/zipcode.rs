//! US zipcode value type.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::CodecError;

fn zipcode_regex() -> &'static Regex {
    static ZIPCODE: OnceLock<Regex> = OnceLock::new();
    ZIPCODE.get_or_init(|| Regex::new(r"^[0-9]{5}$").expect("zipcode pattern is valid"))
}

/// A five-digit US zipcode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Zipcode(String);

impl Zipcode {
    /// Validate and wrap a zipcode.
    pub fn new(value: impl Into<String>) -> Result<Self, CodecError> {
        let value = value.into();
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(CodecError::InvalidZipcode(value))
        }
    }

    /// Check a string against the five-digit pattern.
    pub fn is_valid(value: &str) -> bool {
        zipcode_regex().is_match(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Zipcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Zipcode {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Zipcode {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Zipcode> for String {
    fn from(zipcode: Zipcode) -> Self {
        zipcode.0
    }
}

impl AsRef<str> for Zipcode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
