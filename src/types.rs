//! Core types for code delivery.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// ValidationError
// =============================================================================

/// Malformed phone or code input, rejected before any provider is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Phone number is empty.
    #[error("phone number cannot be empty")]
    EmptyPhone,
    /// Phone number contains something other than digits after an optional '+'.
    #[error("phone number must contain only digits after an optional '+'")]
    PhoneNonDigit,
    /// Phone number has invalid length.
    #[error("phone number must have between 8 and 15 digits")]
    PhoneLength,
    /// Code is empty.
    #[error("code cannot be empty")]
    EmptyCode,
    /// Code is not 4 to 8 ASCII digits.
    #[error("code must be 4 to 8 digits")]
    InvalidCode,
}

// =============================================================================
// RegionClass
// =============================================================================

/// Region class of a phone number, used to pick regional carriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionClass {
    /// Russian numbers (`+7` prefix).
    Russia,
    /// Everything else.
    International,
}

impl Display for RegionClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Russia => write!(f, "russia"),
            Self::International => write!(f, "international"),
        }
    }
}

// =============================================================================
// PhoneNumber
// =============================================================================

/// Phone number in E.164-ish form (e.g., "+79991234567").
///
/// # Validation Rules
///
/// - Optional leading '+', then digits only
/// - Between 8 and 15 digits
///
/// # Example
///
/// ```rust
/// use otp_gateway::{PhoneNumber, RegionClass};
///
/// let phone = PhoneNumber::new("+79991234567").unwrap();
/// assert_eq!(phone.region(), RegionClass::Russia);
///
/// let phone = PhoneNumber::new("+14155550123").unwrap();
/// assert_eq!(phone.region(), RegionClass::International);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Create a new PhoneNumber from a string.
    pub fn new(s: impl AsRef<str>) -> Result<Self, ValidationError> {
        let s = s.as_ref().trim();
        if s.is_empty() {
            return Err(ValidationError::EmptyPhone);
        }
        let digits = s.strip_prefix('+').unwrap_or(s);
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::PhoneNonDigit);
        }
        if !(8..=15).contains(&digits.len()) {
            return Err(ValidationError::PhoneLength);
        }
        Ok(Self(s.to_string()))
    }

    /// Region class derived from the country prefix.
    pub fn region(&self) -> RegionClass {
        if self.0.starts_with("+7") {
            RegionClass::Russia
        } else {
            RegionClass::International
        }
    }

    /// Get the number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PhoneNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for PhoneNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for PhoneNumber {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        PhoneNumber::new(raw).map_err(de::Error::custom)
    }
}

impl Serialize for PhoneNumber {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

// =============================================================================
// AuthCode
// =============================================================================

/// One-time verification code (4 to 8 digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AuthCode(String);

impl AuthCode {
    /// Create a new AuthCode.
    pub fn new(code: impl AsRef<str>) -> Result<Self, ValidationError> {
        let code = code.as_ref().trim();
        if code.is_empty() {
            return Err(ValidationError::EmptyCode);
        }
        if !(4..=8).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidCode);
        }
        Ok(Self(code.to_string()))
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AuthCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AuthCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for AuthCode {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        AuthCode::new(raw).map_err(de::Error::custom)
    }
}

// =============================================================================
// RequestId
// =============================================================================

/// Opaque verification request token issued by the chat gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Create a new RequestId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// =============================================================================
// DeliveryId
// =============================================================================

/// Identifier a provider returns for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryId(String);

impl DeliveryId {
    /// Create a new DeliveryId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Display for DeliveryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for DeliveryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for DeliveryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DeliveryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// =============================================================================
// SendAuthCodeResult
// =============================================================================

/// Terminal success of a code delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAuthCodeResult {
    /// The delivered code.
    pub code: AuthCode,
    /// Whether the chat gateway delivered it (`false` means a regional carrier did).
    pub telegram_way: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_valid() {
        assert!(PhoneNumber::new("+79991234567").is_ok());
        assert!(PhoneNumber::new("14155550123").is_ok());
        assert!(PhoneNumber::new("  +14155550123 ").is_ok());
    }

    #[test]
    fn test_phone_invalid() {
        assert_eq!(PhoneNumber::new(""), Err(ValidationError::EmptyPhone));
        assert_eq!(
            PhoneNumber::new("+7999abc4567"),
            Err(ValidationError::PhoneNonDigit)
        );
        assert_eq!(PhoneNumber::new("+7999"), Err(ValidationError::PhoneLength));
        assert_eq!(
            PhoneNumber::new("+1234567890123456"),
            Err(ValidationError::PhoneLength)
        );
    }

    #[test]
    fn test_phone_region() {
        let ru = PhoneNumber::new("+79998887766").unwrap();
        assert_eq!(ru.region(), RegionClass::Russia);

        let us = PhoneNumber::new("+14155550123").unwrap();
        assert_eq!(us.region(), RegionClass::International);

        // Without '+' the prefix rule does not apply
        let bare = PhoneNumber::new("79998887766").unwrap();
        assert_eq!(bare.region(), RegionClass::International);
    }

    #[test]
    fn test_auth_code() {
        assert_eq!(AuthCode::new("4821").unwrap().as_str(), "4821");
        assert_eq!(AuthCode::new(""), Err(ValidationError::EmptyCode));
        assert_eq!(AuthCode::new("12"), Err(ValidationError::InvalidCode));
        assert_eq!(AuthCode::new("12a4"), Err(ValidationError::InvalidCode));
        assert_eq!(AuthCode::new("123456789"), Err(ValidationError::InvalidCode));
    }

    #[test]
    fn test_phone_serde() {
        let phone: PhoneNumber = serde_json::from_str(r#""+79991234567""#).unwrap();
        assert_eq!(phone.as_str(), "+79991234567");
        assert!(serde_json::from_str::<PhoneNumber>(r#""nope""#).is_err());
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = SendAuthCodeResult {
            code: AuthCode::new("4821").unwrap(),
            telegram_way: true,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"code": "4821", "telegramWay": true}));
    }
}
