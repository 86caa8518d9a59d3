//! Snowflake IDs for type-safe Discord entity references.
//!
//! Discord identifies every entity with a 64-bit "snowflake" that travels as a
//! decimal string in JSON. The `define_snowflake!` macro creates a newtype per
//! entity so a `UserId` can never be passed where a `MessageId` is expected.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing a snowflake ID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SnowflakeError {
    /// The input string is empty.
    #[error("snowflake cannot be empty")]
    Empty,
    /// The input is not an unsigned 64-bit decimal number.
    #[error("invalid snowflake: {0}")]
    Invalid(String),
}

/// Parse a decimal snowflake string.
///
/// # Errors
///
/// Returns [`SnowflakeError`] if the string is empty or not a valid `u64`.
pub fn parse_snowflake(value: &str) -> Result<u64, SnowflakeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SnowflakeError::Empty);
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| SnowflakeError::Invalid(trimmed.to_string()))
}

/// Wire representation accepted on input: Discord sends strings, but
/// hand-written payloads sometimes carry bare numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSnowflake {
    Text(String),
    Number(u64),
}

fn deserialize_snowflake<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawSnowflake::deserialize(deserializer)? {
        RawSnowflake::Text(text) => parse_snowflake(&text).map_err(serde::de::Error::custom),
        RawSnowflake::Number(number) => Ok(number),
    }
}

/// Macro to define a type-safe snowflake wrapper.
///
/// Creates a newtype around `u64` with:
/// - `Serialize` as a decimal string, `Deserialize` from a string or number
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `new()`, `as_u64()`, `Display` and `FromStr`
macro_rules! define_snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Create a new ID from a raw snowflake value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the underlying snowflake value.
            #[must_use]
            pub const fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = SnowflakeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_snowflake(s).map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserialize_snowflake(deserializer).map(Self)
            }
        }
    };
}

define_snowflake!(
    /// A Discord message ID.
    MessageId
);
define_snowflake!(
    /// A Discord user ID.
    UserId
);
define_snowflake!(
    /// A Discord guild (server) ID.
    GuildId
);
define_snowflake!(
    /// A Discord channel ID.
    ChannelId
);
define_snowflake!(
    /// A Discord application ID.
    ApplicationId
);
