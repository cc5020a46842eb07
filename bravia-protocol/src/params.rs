//! The 16-byte parameter field and its encodings.
//!
//! Three shapes are used on the wire:
//!
//! ```text
//! text      : "eth0############"   right-padded with '#'
//! int pair  : "0000000100000003"   two 8-digit zero-padded decimals
//! sentinels : "0000000000000000"   success
//!             "FFFFFFFFFFFFFFFF"   device error
//!             "NNNNNNNNNNNNNNNN"   not available / not found
//! ```
//!
//! Booleans and single integers are integer pairs whose first field is zero.

use crate::error::ProtocolError;
use std::fmt;

/// Length of the parameter field in bytes.
pub const PARAMS_LEN: usize = 16;

/// Fill byte used to pad text parameters.
pub const FILL: u8 = b'#';

/// Largest value that fits an 8-digit decimal field.
pub const MAX_FIELD_VALUE: u32 = 99_999_999;

const FIELD_LEN: usize = 8;

/// A fixed 16-byte parameter field.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Parameters([u8; PARAMS_LEN]);

impl Parameters {
    /// All fill bytes; used by enquiries that carry no argument.
    pub const EMPTY: Self = Self([FILL; PARAMS_LEN]);
    /// All-zero success sentinel.
    pub const SUCCESS: Self = Self([b'0'; PARAMS_LEN]);
    /// All-`F` device error sentinel.
    pub const DEVICE_ERROR: Self = Self([b'F'; PARAMS_LEN]);
    /// All-`N` not-available sentinel.
    pub const NOT_AVAILABLE: Self = Self([b'N'; PARAMS_LEN]);

    /// Wraps raw bytes without validation.
    pub const fn from_bytes(bytes: [u8; PARAMS_LEN]) -> Self {
        Self(bytes)
    }

    /// Encodes a text parameter, right-padding it with `#`.
    ///
    /// Text longer than 16 bytes is rejected rather than truncated.
    pub fn text(text: &str) -> Result<Self, ProtocolError> {
        let bytes = text.as_bytes();
        if bytes.len() > PARAMS_LEN {
            return Err(ProtocolError::ParametersTooLong { len: bytes.len() });
        }
        let mut field = [FILL; PARAMS_LEN];
        field[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(field))
    }

    /// Encodes two values as 8-digit zero-padded decimals.
    pub fn int_pair(first: u32, second: u32) -> Result<Self, ProtocolError> {
        for value in [first, second] {
            if value > MAX_FIELD_VALUE {
                return Err(ProtocolError::ValueOutOfRange(value));
            }
        }
        let encoded = format!("{first:08}{second:08}");
        let mut field = [0u8; PARAMS_LEN];
        field.copy_from_slice(encoded.as_bytes());
        Ok(Self(field))
    }

    /// Encodes a single integer as the pair `(0, value)`.
    pub fn int(value: u32) -> Result<Self, ProtocolError> {
        Self::int_pair(0, value)
    }

    /// Encodes a boolean as the pair `(0, 0)` or `(0, 1)`.
    pub fn bool(flag: bool) -> Self {
        let mut field = [b'0'; PARAMS_LEN];
        if flag {
            field[PARAMS_LEN - 1] = b'1';
        }
        Self(field)
    }

    /// Returns the raw field bytes.
    pub fn as_bytes(&self) -> &[u8; PARAMS_LEN] {
        &self.0
    }

    /// Returns the raw field as a string, replacing invalid UTF-8.
    pub fn raw(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    fn check_sentinel(&self) -> Result<(), ProtocolError> {
        if *self == Self::DEVICE_ERROR {
            Err(ProtocolError::DeviceError(self.raw()))
        } else if *self == Self::NOT_AVAILABLE {
            Err(ProtocolError::NotAvailable(self.raw()))
        } else {
            Ok(())
        }
    }

    fn unexpected(&self) -> ProtocolError {
        ProtocolError::UnexpectedParameters(self.raw())
    }

    /// Decodes a text parameter, stripping trailing fill bytes.
    pub fn as_string(&self) -> Result<String, ProtocolError> {
        self.check_sentinel()?;
        let end = self
            .0
            .iter()
            .rposition(|&b| b != FILL)
            .map_or(0, |pos| pos + 1);
        std::str::from_utf8(&self.0[..end])
            .map(str::to_string)
            .map_err(|_| self.unexpected())
    }

    /// Decodes both 8-digit decimal fields.
    pub fn as_int_pair(&self) -> Result<(u32, u32), ProtocolError> {
        self.check_sentinel()?;
        let (first, second) = self.0.split_at(FIELD_LEN);
        match (parse_field(first), parse_field(second)) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(self.unexpected()),
        }
    }

    /// Decodes a single integer; the first field must be zero.
    pub fn as_int(&self) -> Result<u32, ProtocolError> {
        match self.as_int_pair()? {
            (0, value) => Ok(value),
            _ => Err(self.unexpected()),
        }
    }

    /// Decodes a boolean; only `(0, 0)` and `(0, 1)` are accepted.
    pub fn as_bool(&self) -> Result<bool, ProtocolError> {
        match self.as_int_pair()? {
            (0, 0) => Ok(false),
            (0, 1) => Ok(true),
            _ => Err(self.unexpected()),
        }
    }

    /// Succeeds iff the field is the all-zero success sentinel.
    pub fn as_error(&self) -> Result<(), ProtocolError> {
        self.check_sentinel()?;
        if *self == Self::SUCCESS {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }
}

fn parse_field(field: &[u8]) -> Option<u32> {
    if field.len() != FIELD_LEN || !field.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        field
            .iter()
            .fold(0u32, |acc, &digit| acc * 10 + u32::from(digit - b'0')),
    )
}

impl Default for Parameters {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parameters({:?})", self.raw())
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn field(s: &str) -> Parameters {
        let mut bytes = [0u8; PARAMS_LEN];
        bytes.copy_from_slice(s.as_bytes());
        Parameters::from_bytes(bytes)
    }

    #[test]
    fn test_text_padding() {
        let params = Parameters::text("eth0").unwrap();
        assert_eq!(params.as_bytes(), b"eth0############");
        assert_eq!(params.as_string().unwrap(), "eth0");

        let empty = Parameters::text("").unwrap();
        assert_eq!(empty, Parameters::EMPTY);
        assert_eq!(empty.as_string().unwrap(), "");
    }

    #[test]
    fn test_text_exactly_sixteen() {
        let params = Parameters::text("auto24pSync#####").unwrap();
        assert_eq!(params.as_string().unwrap(), "auto24pSync");

        let params = Parameters::text("0123456789abcdef").unwrap();
        assert_eq!(params.as_string().unwrap(), "0123456789abcdef");
    }

    #[test]
    fn test_text_too_long_rejected() {
        let result = Parameters::text("0123456789abcdefg");
        assert_eq!(result, Err(ProtocolError::ParametersTooLong { len: 17 }));
    }

    #[test]
    fn test_int_pair_encoding() {
        let params = Parameters::int_pair(1, 3).unwrap();
        assert_eq!(params.as_bytes(), b"0000000100000003");

        let params = Parameters::int(29).unwrap();
        assert_eq!(params.as_bytes(), b"0000000000000029");
    }

    #[test]
    fn test_int_pair_out_of_range() {
        assert_eq!(
            Parameters::int_pair(100_000_000, 0),
            Err(ProtocolError::ValueOutOfRange(100_000_000))
        );
        assert_eq!(
            Parameters::int(u32::MAX),
            Err(ProtocolError::ValueOutOfRange(u32::MAX))
        );
        assert!(Parameters::int_pair(MAX_FIELD_VALUE, MAX_FIELD_VALUE).is_ok());
    }

    #[test]
    fn test_bool_encoding() {
        assert_eq!(Parameters::bool(true).as_bytes(), b"0000000000000001");
        assert_eq!(Parameters::bool(false).as_bytes(), b"0000000000000000");
    }

    #[test]
    fn test_as_bool_accepts_only_zero_and_one() {
        assert_eq!(field("0000000000000000").as_bool(), Ok(false));
        assert_eq!(field("0000000000000001").as_bool(), Ok(true));
        assert!(field("0000000000000002").as_bool().is_err());
        assert!(field("0000000100000001").as_bool().is_err());
        assert!(field("################").as_bool().is_err());
        assert!(matches!(
            Parameters::DEVICE_ERROR.as_bool(),
            Err(ProtocolError::DeviceError(_))
        ));
        assert!(matches!(
            Parameters::NOT_AVAILABLE.as_bool(),
            Err(ProtocolError::NotAvailable(_))
        ));
    }

    #[test]
    fn test_as_int_requires_zero_first_field() {
        assert_eq!(field("0000000000000025").as_int(), Ok(25));
        assert_eq!(
            field("0000000100000025").as_int(),
            Err(ProtocolError::UnexpectedParameters(
                "0000000100000025".to_string()
            ))
        );
    }

    #[test]
    fn test_as_int_pair_rejects_non_digits() {
        assert!(field("0000000+00000001").as_int_pair().is_err());
        assert!(field(" 000000100000001").as_int_pair().is_err());
        assert!(field("eth0############").as_int_pair().is_err());
    }

    #[test]
    fn test_as_error_sentinels() {
        assert_eq!(Parameters::SUCCESS.as_error(), Ok(()));
        assert_eq!(
            Parameters::DEVICE_ERROR.as_error(),
            Err(ProtocolError::DeviceError("FFFFFFFFFFFFFFFF".to_string()))
        );
        assert_eq!(
            Parameters::NOT_AVAILABLE.as_error(),
            Err(ProtocolError::NotAvailable("NNNNNNNNNNNNNNNN".to_string()))
        );
        assert!(matches!(
            field("0000000000000001").as_error(),
            Err(ProtocolError::UnexpectedParameters(_))
        ));
    }

    #[test]
    fn test_as_string_sentinels() {
        assert!(matches!(
            Parameters::DEVICE_ERROR.as_string(),
            Err(ProtocolError::DeviceError(_))
        ));
        assert!(matches!(
            Parameters::NOT_AVAILABLE.as_string(),
            Err(ProtocolError::NotAvailable(_))
        ));
    }

    #[test]
    fn test_as_string_keeps_inner_fill() {
        assert_eq!(field("a#b#############").as_string().unwrap(), "a#b");
    }

    #[test]
    fn test_as_string_invalid_utf8() {
        let mut bytes = [FILL; PARAMS_LEN];
        bytes[0] = 0xFF;
        let params = Parameters::from_bytes(bytes);
        assert!(matches!(
            params.as_string(),
            Err(ProtocolError::UnexpectedParameters(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_int_pair_recovers_values(a in 0u32..=MAX_FIELD_VALUE, b in 0u32..=MAX_FIELD_VALUE) {
            let params = Parameters::int_pair(a, b).unwrap();
            prop_assert_eq!(params.as_int_pair().unwrap(), (a, b));
        }

        #[test]
        fn prop_text_recovers_value(text in "[a-zA-Z0-9.:_-]{0,16}") {
            let params = Parameters::text(&text).unwrap();
            prop_assert_eq!(params.as_string().unwrap(), text);
        }

        #[test]
        fn prop_as_bool_only_for_canonical_fields(bytes in proptest::array::uniform16(any::<u8>())) {
            let params = Parameters::from_bytes(bytes);
            let canonical = params == Parameters::bool(false) || params == Parameters::bool(true);
            prop_assert_eq!(params.as_bool().is_ok(), canonical);
        }

        #[test]
        fn prop_as_error_only_for_success(bytes in proptest::array::uniform16(any::<u8>())) {
            let params = Parameters::from_bytes(bytes);
            prop_assert_eq!(params.as_error().is_ok(), params == Parameters::SUCCESS);
        }
    }
}
