//! Data models.
//!
//! Row types derive `sqlx::FromRow` and double as response bodies; request
//! types carry a `validate` method checked before anything is written.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// Text-backed enumeration stored as its string value.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($field:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $value)] $variant, )+
        }

        impl $name {
            #[allow(dead_code)]
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::validation::ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    other => Err(crate::validation::ValidationError::field(
                        $field,
                        format!("unknown value {other:?}"),
                    )),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = crate::validation::ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

pub mod alarm;
pub mod device;
pub mod license;
pub mod maintenance;
pub mod movement;
pub mod route;
pub mod user;
pub mod vehicle;
pub mod work_order;

/// International Mobile Equipment Identity (IMEI)
///
/// Device key, up to fifteen decimal digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Imei(String);

impl TryFrom<&str> for Imei {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim();
        if value.is_empty() || value.len() > 15 || !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::field(
                "imei",
                format!("{value:?} is not a valid IMEI"),
            ));
        }
        Ok(Self(value.to_string()))
    }
}

impl TryFrom<String> for Imei {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Imei> for String {
    fn from(value: Imei) -> Self {
        value.0
    }
}

impl std::fmt::Display for Imei {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Imei {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Current time in seconds from Unix epoch
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Round a coordinate to the stored precision of seven decimal places
pub fn round_coordinate(value: f64) -> f64 {
    (value * 1e7).round() / 1e7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_imei() {
        let imei = Imei::try_from("869066062080357").unwrap();
        assert_eq!(imei.as_str(), "869066062080357");
        assert_eq!(Imei::try_from(" 123 ").unwrap().as_str(), "123");

        assert!(Imei::try_from("").is_err());
        assert!(Imei::try_from("8690660620803571").is_err());
        assert!(Imei::try_from("86906606208035A").is_err());
    }

    #[test]
    fn deserialize_imei() {
        let imei: Imei = serde_json::from_str("\"000000000000000\"").unwrap();
        assert_eq!(imei.to_string(), "000000000000000");
        assert!(serde_json::from_str::<Imei>("\"not-an-imei\"").is_err());
    }

    #[test]
    fn coordinate_rounding() {
        assert_eq!(round_coordinate(10.123456789), 10.1234568);
        assert_eq!(round_coordinate(-70.0), -70.0);
    }
}
