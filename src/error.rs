//! Error types for KNXnet/IP codecs and the secure engine.
//!
//! Every category carries an internal kind plus a backtrace when the `std`
//! feature is enabled. Callers query the category through the `is_*` helpers
//! instead of matching on private kinds.

use core::fmt;

#[cfg(feature = "std")]
use std::backtrace::Backtrace;

/// Result type alias for KNX operations.
pub type Result<T> = core::result::Result<T, KnxError>;

// =============================================================================
// Error Kind Enums (Internal)
// =============================================================================

/// Protocol error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum ProtocolErrorKind {
    InvalidFrame,
    UnsupportedVersion,
    UnsupportedServiceType,
    UnexpectedServiceType,
    PayloadTooLarge,
    InvalidMessageCode,
    InvalidControlField,
    InvalidAdditionalInfo,
    InvalidStatus,
}

/// Buffer error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum BufferErrorKind {
    TooSmall,
    CapacityExceeded,
}

/// Addressing error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum AddressingErrorKind {
    InvalidIndividualAddress,
    InvalidGroupAddress,
    InvalidIpAddress,
    OutOfRange,
    UnexpectedAddressType,
}

/// TPDU error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum TpduErrorKind {
    InvalidTransportControlField,
    InvalidApplicationControlField,
    InvalidDataLength,
    InvalidParameter,
}

/// Crypto error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum CryptoErrorKind {
    Unavailable,
    InvalidKey,
    KeyTypeMismatch,
    EmptyInput,
    UnsupportedServiceType,
    InvalidMac,
}

/// Configuration error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum ConfigErrorKind {
    MalformedLine,
    InvalidValue,
}

// =============================================================================
// Main Error Type
// =============================================================================

/// KNX error type.
///
/// Returned by every fallible codec and crypto operation. Decoders never hand
/// out a partially populated value: they either succeed or return one of these.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KnxError {
    /// Malformed or unsupported wire data (header, frame, cEMI)
    Protocol(ProtocolError),
    /// Output buffer too small or fixed capacity exceeded
    Buffer(BufferError),
    /// Address formatting or address type mismatch
    Addressing(AddressingError),
    /// Application unit construction or decoding errors
    Tpdu(TpduError),
    /// Crypto primitive, key material and MAC errors
    Crypto(CryptoError),
    /// Configuration parsing errors
    Config(ConfigError),
}

// =============================================================================
// Structured Error Types
// =============================================================================

/// Protocol error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProtocolError {
    kind: ProtocolErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl ProtocolError {
    pub(crate) fn new(kind: ProtocolErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if this is an invalid frame error
    pub fn is_invalid_frame(&self) -> bool {
        matches!(self.kind, ProtocolErrorKind::InvalidFrame)
    }

    /// Check if this is an unsupported version error
    pub fn is_unsupported_version(&self) -> bool {
        matches!(self.kind, ProtocolErrorKind::UnsupportedVersion)
    }

    /// Check if the service type identifier is unknown
    pub fn is_unsupported_service_type(&self) -> bool {
        matches!(self.kind, ProtocolErrorKind::UnsupportedServiceType)
    }

    /// Check if a known service type arrived where another one was expected
    pub fn is_unexpected_service_type(&self) -> bool {
        matches!(self.kind, ProtocolErrorKind::UnexpectedServiceType)
    }

    /// Check if the cEMI message code is unknown
    pub fn is_invalid_message_code(&self) -> bool {
        matches!(self.kind, ProtocolErrorKind::InvalidMessageCode)
    }

    /// Check if an additional info block was rejected
    pub fn is_invalid_additional_info(&self) -> bool {
        matches!(self.kind, ProtocolErrorKind::InvalidAdditionalInfo)
    }
}

/// Buffer error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferError {
    kind: BufferErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl BufferError {
    pub(crate) fn new(kind: BufferErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if the input or output buffer is too small
    pub fn is_too_small(&self) -> bool {
        matches!(self.kind, BufferErrorKind::TooSmall)
    }

    /// Check if a fixed-capacity buffer would overflow
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self.kind, BufferErrorKind::CapacityExceeded)
    }
}

/// Addressing error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AddressingError {
    kind: AddressingErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl AddressingError {
    pub(crate) fn new(kind: AddressingErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if address is out of range
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::OutOfRange)
    }

    /// Check if an individual address was required but a group address given (or vice versa)
    pub fn is_unexpected_address_type(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::UnexpectedAddressType)
    }
}

/// TPDU error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TpduError {
    kind: TpduErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl TpduError {
    pub(crate) fn new(kind: TpduErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if the transport control field could not be decoded
    pub fn is_invalid_transport_control_field(&self) -> bool {
        matches!(self.kind, TpduErrorKind::InvalidTransportControlField)
    }

    /// Check if the application control field could not be decoded
    pub fn is_invalid_application_control_field(&self) -> bool {
        matches!(self.kind, TpduErrorKind::InvalidApplicationControlField)
    }

    /// Check if the data does not fit the service layout
    pub fn is_invalid_data_length(&self) -> bool {
        matches!(self.kind, TpduErrorKind::InvalidDataLength)
    }

    /// Check if a service parameter was out of range
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self.kind, TpduErrorKind::InvalidParameter)
    }
}

/// Crypto error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CryptoError {
    kind: CryptoErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl CryptoError {
    pub(crate) fn new(kind: CryptoErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if the crypto primitives failed their readiness checks
    pub fn is_unavailable(&self) -> bool {
        matches!(self.kind, CryptoErrorKind::Unavailable)
    }

    /// Check if key material was malformed
    pub fn is_invalid_key(&self) -> bool {
        matches!(self.kind, CryptoErrorKind::InvalidKey)
    }

    /// Check if a private key was given where a public key was expected (or vice versa)
    pub fn is_key_type_mismatch(&self) -> bool {
        matches!(self.kind, CryptoErrorKind::KeyTypeMismatch)
    }

    /// Check if a required input was empty
    pub fn is_empty_input(&self) -> bool {
        matches!(self.kind, CryptoErrorKind::EmptyInput)
    }

    /// Check if the frame's service type cannot be authenticated
    pub fn is_unsupported_service_type(&self) -> bool {
        matches!(self.kind, CryptoErrorKind::UnsupportedServiceType)
    }

    /// Check if a message authentication code did not verify
    pub fn is_invalid_mac(&self) -> bool {
        matches!(self.kind, CryptoErrorKind::InvalidMac)
    }
}

/// Configuration error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigError {
    kind: ConfigErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl ConfigError {
    pub(crate) fn new(kind: ConfigErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if a line was not in `KEY=VALUE` form
    pub fn is_malformed_line(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::MalformedLine)
    }

    /// Check if a known key carried an unparsable value
    pub fn is_invalid_value(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::InvalidValue)
    }
}

// =============================================================================
// Convenience Constructors for KnxError
// =============================================================================

impl KnxError {
    // Protocol errors
    pub(crate) fn invalid_frame() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::InvalidFrame))
    }

    pub(crate) fn unsupported_version() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::UnsupportedVersion))
    }

    pub(crate) fn unsupported_service_type() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::UnsupportedServiceType))
    }

    pub(crate) fn unexpected_service_type() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::UnexpectedServiceType))
    }

    pub(crate) fn payload_too_large() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::PayloadTooLarge))
    }

    pub(crate) fn invalid_message_code() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::InvalidMessageCode))
    }

    pub(crate) fn invalid_control_field() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::InvalidControlField))
    }

    pub(crate) fn invalid_additional_info() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::InvalidAdditionalInfo))
    }

    pub(crate) fn invalid_status() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::InvalidStatus))
    }

    // Buffer errors
    pub(crate) fn buffer_too_small() -> Self {
        Self::Buffer(BufferError::new(BufferErrorKind::TooSmall))
    }

    pub(crate) fn capacity_exceeded() -> Self {
        Self::Buffer(BufferError::new(BufferErrorKind::CapacityExceeded))
    }

    // Addressing errors
    pub(crate) fn invalid_group_address() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::InvalidGroupAddress))
    }

    pub(crate) fn invalid_individual_address() -> Self {
        Self::Addressing(AddressingError::new(
            AddressingErrorKind::InvalidIndividualAddress,
        ))
    }

    pub(crate) fn invalid_ip_address() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::InvalidIpAddress))
    }

    pub(crate) fn address_out_of_range() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::OutOfRange))
    }

    pub(crate) fn unexpected_address_type() -> Self {
        Self::Addressing(AddressingError::new(
            AddressingErrorKind::UnexpectedAddressType,
        ))
    }

    // TPDU errors
    pub(crate) fn invalid_transport_control_field() -> Self {
        Self::Tpdu(TpduError::new(TpduErrorKind::InvalidTransportControlField))
    }

    pub(crate) fn invalid_application_control_field() -> Self {
        Self::Tpdu(TpduError::new(TpduErrorKind::InvalidApplicationControlField))
    }

    pub(crate) fn invalid_data_length() -> Self {
        Self::Tpdu(TpduError::new(TpduErrorKind::InvalidDataLength))
    }

    pub(crate) fn invalid_parameter() -> Self {
        Self::Tpdu(TpduError::new(TpduErrorKind::InvalidParameter))
    }

    // Crypto errors
    pub(crate) fn crypto_unavailable() -> Self {
        Self::Crypto(CryptoError::new(CryptoErrorKind::Unavailable))
    }

    pub(crate) fn invalid_key() -> Self {
        Self::Crypto(CryptoError::new(CryptoErrorKind::InvalidKey))
    }

    pub(crate) fn key_type_mismatch() -> Self {
        Self::Crypto(CryptoError::new(CryptoErrorKind::KeyTypeMismatch))
    }

    pub(crate) fn empty_input() -> Self {
        Self::Crypto(CryptoError::new(CryptoErrorKind::EmptyInput))
    }

    pub(crate) fn unsupported_secure_service() -> Self {
        Self::Crypto(CryptoError::new(CryptoErrorKind::UnsupportedServiceType))
    }

    pub(crate) fn invalid_mac() -> Self {
        Self::Crypto(CryptoError::new(CryptoErrorKind::InvalidMac))
    }

    // Configuration errors
    pub(crate) fn malformed_config_line() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::MalformedLine))
    }

    pub(crate) fn invalid_config_value() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::InvalidValue))
    }

    /// Check if this is a crypto error of any kind
    pub fn is_crypto(&self) -> bool {
        matches!(self, Self::Crypto(_))
    }

    /// Check if this is a protocol error of any kind
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}

// =============================================================================
// Display Implementation
// =============================================================================

impl fmt::Display for KnxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnxError::Protocol(e) => write!(f, "Protocol error: {:?}", e.kind),
            KnxError::Buffer(e) => write!(f, "Buffer error: {:?}", e.kind),
            KnxError::Addressing(e) => write!(f, "Addressing error: {:?}", e.kind),
            KnxError::Tpdu(e) => write!(f, "TPDU error: {:?}", e.kind),
            KnxError::Crypto(e) => write!(f, "Crypto error: {:?}", e.kind),
            KnxError::Config(e) => write!(f, "Configuration error: {:?}", e.kind),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KnxError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_helpers() {
        let err = KnxError::invalid_mac();
        assert!(err.is_crypto());
        assert!(!err.is_protocol());
        match err {
            KnxError::Crypto(e) => assert!(e.is_invalid_mac()),
            _ => panic!("expected crypto error"),
        }
    }

    #[test]
    fn test_display() {
        let err = KnxError::unsupported_version();
        assert_eq!(format!("{err}"), "Protocol error: UnsupportedVersion");

        let err = KnxError::key_type_mismatch();
        assert_eq!(format!("{err}"), "Crypto error: KeyTypeMismatch");
    }
}
