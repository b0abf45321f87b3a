//! Transport protocol data units (TPDU).
//!
//! A TPDU is the transport control field (TPCI) followed by the application
//! control field (APCI) and service data.
//!
//! ```text
//!        octet 0                    octet 1              octet 2..
//! ┌──────────────────┬─────┬──────────────┬────────┬────────────────┐
//! │ TPCI (6 bits)    │APCI │ APCI (2 or 8 │ packed │  trailing data │
//! │                  │hi 2 │ more bits)   │ 6 bits │  (0..254)      │
//! └──────────────────┴─────┴──────────────┴────────┴────────────────┘
//! ```
//!
//! 4-bit services leave the low six bits of octet 1 free. Depending on the
//! service those bits carry a small value (group value write `0x3f`, memory
//! read byte count, ...) or stay zero. 10-bit services use the whole octet.
//!
//! Transport control TPDUs (connect, disconnect, acknowledgements) are a
//! single octet without application layer.

use crate::error::{KnxError, Result};
use heapless::Vec;

/// Maximum number of data bytes a TPDU carries.
pub const MAX_DATA_SIZE: usize = 254;

/// Maximum encoded TPDU size.
pub const MAX_TPDU_SIZE: usize = MAX_DATA_SIZE + 2;

/// Application data of a TPDU.
pub type TpduData = Vec<u8, MAX_DATA_SIZE>;

/// Encoded TPDU.
pub type TpduBuffer = Vec<u8, MAX_TPDU_SIZE>;

const PACKED_MASK: u8 = 0x3F;

// =============================================================================
// Transport Control Field
// =============================================================================

/// Addressing context used to resolve unnumbered data TPDUs.
///
/// The TPCI bits of `T_Data_Group`, `T_Data_Broadcast`,
/// `T_Data_SystemBroadcast` and `T_Data_Individual` are identical; the frame
/// around the TPDU tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataContext {
    Group,
    Broadcast,
    SystemBroadcast,
    Individual,
}

/// Transport layer control field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransportControlField {
    DataGroup,
    DataBroadcast,
    DataSystemBroadcast,
    DataTagGroup,
    DataIndividual,
    DataConnected { sequence: u8 },
    Connect,
    Disconnect,
    Acknowledge { sequence: u8 },
    NoAcknowledge { sequence: u8 },
    #[default]
    Invalid,
}

impl TransportControlField {
    /// Decode the TPCI from the first TPDU octet.
    pub const fn decode(octet: u8, context: DataContext) -> Self {
        let sequence = (octet >> 2) & 0x0F;
        match octet & 0xC0 {
            0x00 => match octet & 0xFC {
                0x00 => match context {
                    DataContext::Group => Self::DataGroup,
                    DataContext::Broadcast => Self::DataBroadcast,
                    DataContext::SystemBroadcast => Self::DataSystemBroadcast,
                    DataContext::Individual => Self::DataIndividual,
                },
                0x04 => Self::DataTagGroup,
                _ => Self::Invalid,
            },
            0x40 => Self::DataConnected { sequence },
            0x80 => match octet {
                0x80 => Self::Connect,
                0x81 => Self::Disconnect,
                _ => Self::Invalid,
            },
            _ => match octet & 0x03 {
                0x02 => Self::Acknowledge { sequence },
                0x03 => Self::NoAcknowledge { sequence },
                _ => Self::Invalid,
            },
        }
    }

    /// TPCI bits of the first octet, `None` for `Invalid`.
    ///
    /// For data TPDUs the two low bits are left clear for the APCI.
    pub const fn bits(self) -> Option<u8> {
        match self {
            Self::DataGroup | Self::DataBroadcast | Self::DataSystemBroadcast | Self::DataIndividual => {
                Some(0x00)
            }
            Self::DataTagGroup => Some(0x04),
            Self::DataConnected { sequence } => Some(0x40 | (sequence & 0x0F) << 2),
            Self::Connect => Some(0x80),
            Self::Disconnect => Some(0x81),
            Self::Acknowledge { sequence } => Some(0xC2 | (sequence & 0x0F) << 2),
            Self::NoAcknowledge { sequence } => Some(0xC3 | (sequence & 0x0F) << 2),
            Self::Invalid => None,
        }
    }

    /// Transport control TPDUs have no application layer.
    #[inline(always)]
    pub const fn is_control(self) -> bool {
        matches!(
            self,
            Self::Connect | Self::Disconnect | Self::Acknowledge { .. } | Self::NoAcknowledge { .. }
        )
    }

    /// Sequence number of numbered TPDUs.
    #[inline(always)]
    pub const fn sequence_number(self) -> Option<u8> {
        match self {
            Self::DataConnected { sequence }
            | Self::Acknowledge { sequence }
            | Self::NoAcknowledge { sequence } => Some(sequence),
            _ => None,
        }
    }
}

// =============================================================================
// Application Control Field
// =============================================================================

/// How a service lays out its data around the APCI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataLayout {
    /// No data at all.
    None,
    /// A single value ≤ 0x3f is packed into the APCI octet, anything else follows it.
    Optimized,
    /// The first data byte always lives in the six spare APCI bits.
    Packed,
    /// Data follows the APCI octet.
    Appended,
}

/// Application layer service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum ApplicationControlField {
    // 4-bit services
    GroupValueRead = 0x000,
    GroupValueResponse = 0x040,
    GroupValueWrite = 0x080,
    IndividualAddressWrite = 0x0C0,
    IndividualAddressRead = 0x100,
    IndividualAddressResponse = 0x140,
    AdcRead = 0x180,
    AdcResponse = 0x1C0,
    MemoryRead = 0x200,
    MemoryResponse = 0x240,
    MemoryWrite = 0x280,
    DeviceDescriptorRead = 0x300,
    DeviceDescriptorResponse = 0x340,
    Restart = 0x380,

    // 10-bit services
    SystemNetworkParameterRead = 0x1C8,
    SystemNetworkParameterResponse = 0x1C9,
    SystemNetworkParameterWrite = 0x1CA,
    UserMemoryRead = 0x2C0,
    UserMemoryResponse = 0x2C1,
    UserMemoryWrite = 0x2C2,
    UserMemoryBitWrite = 0x2C4,
    UserManufacturerInfoRead = 0x2C5,
    UserManufacturerInfoResponse = 0x2C6,
    FunctionPropertyCommand = 0x2C7,
    FunctionPropertyStateRead = 0x2C8,
    FunctionPropertyStateResponse = 0x2C9,
    MemoryBitWrite = 0x3D0,
    AuthorizeRequest = 0x3D1,
    AuthorizeResponse = 0x3D2,
    KeyWrite = 0x3D3,
    KeyResponse = 0x3D4,
    PropertyValueRead = 0x3D5,
    PropertyValueResponse = 0x3D6,
    PropertyValueWrite = 0x3D7,
    PropertyDescriptionRead = 0x3D8,
    PropertyDescriptionResponse = 0x3D9,
    NetworkParameterRead = 0x3DA,
    NetworkParameterResponse = 0x3DB,
    IndividualAddressSerialNumberRead = 0x3DC,
    IndividualAddressSerialNumberResponse = 0x3DD,
    IndividualAddressSerialNumberWrite = 0x3DE,
    DomainAddressWrite = 0x3E0,
    DomainAddressRead = 0x3E1,
    DomainAddressResponse = 0x3E2,
    DomainAddressSelectiveRead = 0x3E3,
    NetworkParameterWrite = 0x3E4,
    LinkRead = 0x3E5,
    LinkResponse = 0x3E6,
    LinkWrite = 0x3E7,
    GroupPropValueRead = 0x3E8,
    GroupPropValueResponse = 0x3E9,
    GroupPropValueWrite = 0x3EA,
    GroupPropValueInfoReport = 0x3EB,
    DomainAddressSerialNumberRead = 0x3EC,
    DomainAddressSerialNumberResponse = 0x3ED,
    DomainAddressSerialNumberWrite = 0x3EE,
    FileStreamInfoReport = 0x3F0,

    #[default]
    Invalid = 0xFFFF,
}

impl ApplicationControlField {
    /// Resolve the 10 APCI bits.
    ///
    /// An exact 10-bit code wins; otherwise the six spare bits are masked and
    /// the 4-bit service is returned. On connection-oriented links the 4-bit
    /// `A_ADC_Response` takes precedence, its channel bits overlap the system
    /// network parameter codes.
    pub const fn from_bits(bits: u16, tpci: TransportControlField) -> Self {
        let bits = bits & 0x03FF;
        let four_bit = bits & 0x03C0;

        if four_bit == 0x1C0 && matches!(tpci, TransportControlField::DataConnected { .. }) {
            return Self::AdcResponse;
        }

        match bits {
            0x1C8 => Self::SystemNetworkParameterRead,
            0x1C9 => Self::SystemNetworkParameterResponse,
            0x1CA => Self::SystemNetworkParameterWrite,
            0x2C0 => Self::UserMemoryRead,
            0x2C1 => Self::UserMemoryResponse,
            0x2C2 => Self::UserMemoryWrite,
            0x2C4 => Self::UserMemoryBitWrite,
            0x2C5 => Self::UserManufacturerInfoRead,
            0x2C6 => Self::UserManufacturerInfoResponse,
            0x2C7 => Self::FunctionPropertyCommand,
            0x2C8 => Self::FunctionPropertyStateRead,
            0x2C9 => Self::FunctionPropertyStateResponse,
            0x3D0 => Self::MemoryBitWrite,
            0x3D1 => Self::AuthorizeRequest,
            0x3D2 => Self::AuthorizeResponse,
            0x3D3 => Self::KeyWrite,
            0x3D4 => Self::KeyResponse,
            0x3D5 => Self::PropertyValueRead,
            0x3D6 => Self::PropertyValueResponse,
            0x3D7 => Self::PropertyValueWrite,
            0x3D8 => Self::PropertyDescriptionRead,
            0x3D9 => Self::PropertyDescriptionResponse,
            0x3DA => Self::NetworkParameterRead,
            0x3DB => Self::NetworkParameterResponse,
            0x3DC => Self::IndividualAddressSerialNumberRead,
            0x3DD => Self::IndividualAddressSerialNumberResponse,
            0x3DE => Self::IndividualAddressSerialNumberWrite,
            0x3E0 => Self::DomainAddressWrite,
            0x3E1 => Self::DomainAddressRead,
            0x3E2 => Self::DomainAddressResponse,
            0x3E3 => Self::DomainAddressSelectiveRead,
            0x3E4 => Self::NetworkParameterWrite,
            0x3E5 => Self::LinkRead,
            0x3E6 => Self::LinkResponse,
            0x3E7 => Self::LinkWrite,
            0x3E8 => Self::GroupPropValueRead,
            0x3E9 => Self::GroupPropValueResponse,
            0x3EA => Self::GroupPropValueWrite,
            0x3EB => Self::GroupPropValueInfoReport,
            0x3EC => Self::DomainAddressSerialNumberRead,
            0x3ED => Self::DomainAddressSerialNumberResponse,
            0x3EE => Self::DomainAddressSerialNumberWrite,
            0x3F0 => Self::FileStreamInfoReport,
            _ => match four_bit {
                0x000 => Self::GroupValueRead,
                0x040 => Self::GroupValueResponse,
                0x080 => Self::GroupValueWrite,
                0x0C0 => Self::IndividualAddressWrite,
                0x100 => Self::IndividualAddressRead,
                0x140 => Self::IndividualAddressResponse,
                0x180 => Self::AdcRead,
                0x1C0 => Self::AdcResponse,
                0x200 => Self::MemoryRead,
                0x240 => Self::MemoryResponse,
                0x280 => Self::MemoryWrite,
                0x300 => Self::DeviceDescriptorRead,
                0x340 => Self::DeviceDescriptorResponse,
                0x380 => Self::Restart,
                _ => Self::Invalid,
            },
        }
    }

    /// APCI bits, `None` for `Invalid`.
    #[inline(always)]
    pub const fn bits(self) -> Option<u16> {
        match self {
            Self::Invalid => None,
            other => Some(other as u16),
        }
    }

    pub const fn layout(self) -> DataLayout {
        match self {
            Self::GroupValueRead
            | Self::IndividualAddressRead
            | Self::IndividualAddressResponse
            | Self::UserManufacturerInfoRead
            | Self::DomainAddressRead
            | Self::Invalid => DataLayout::None,
            Self::GroupValueResponse | Self::GroupValueWrite => DataLayout::Optimized,
            Self::AdcRead
            | Self::AdcResponse
            | Self::MemoryRead
            | Self::MemoryResponse
            | Self::MemoryWrite
            | Self::DeviceDescriptorRead
            | Self::DeviceDescriptorResponse
            | Self::Restart => DataLayout::Packed,
            _ => DataLayout::Appended,
        }
    }

    /// Accepted data length range, packed byte included.
    pub const fn data_length(self) -> (usize, usize) {
        const ANY: usize = MAX_DATA_SIZE;
        match self {
            Self::GroupValueRead
            | Self::IndividualAddressRead
            | Self::IndividualAddressResponse
            | Self::UserManufacturerInfoRead
            | Self::DomainAddressRead
            | Self::Invalid => (0, 0),
            Self::GroupValueResponse | Self::GroupValueWrite => (0, ANY),
            Self::IndividualAddressWrite => (2, 2),
            Self::AdcRead => (2, 2),
            Self::AdcResponse => (4, 4),
            Self::SystemNetworkParameterRead
            | Self::SystemNetworkParameterResponse
            | Self::SystemNetworkParameterWrite => (4, ANY),
            Self::MemoryRead | Self::UserMemoryRead => (3, 3),
            Self::MemoryResponse
            | Self::MemoryWrite
            | Self::UserMemoryResponse
            | Self::UserMemoryWrite
            | Self::UserMemoryBitWrite
            | Self::MemoryBitWrite => (3, ANY),
            Self::UserManufacturerInfoResponse => (3, 3),
            Self::FunctionPropertyCommand
            | Self::FunctionPropertyStateRead
            | Self::FunctionPropertyStateResponse => (2, ANY),
            Self::DeviceDescriptorRead => (1, 1),
            Self::DeviceDescriptorResponse | Self::Restart => (1, ANY),
            Self::AuthorizeRequest | Self::KeyWrite => (5, 5),
            Self::AuthorizeResponse | Self::KeyResponse => (1, 1),
            Self::PropertyValueRead => (4, 4),
            Self::PropertyValueResponse | Self::PropertyValueWrite => (4, ANY),
            Self::PropertyDescriptionRead => (3, 3),
            Self::PropertyDescriptionResponse => (7, 7),
            Self::NetworkParameterRead
            | Self::NetworkParameterResponse
            | Self::NetworkParameterWrite => (3, ANY),
            Self::IndividualAddressSerialNumberRead => (6, 6),
            Self::IndividualAddressSerialNumberResponse => (6, ANY),
            Self::IndividualAddressSerialNumberWrite => (12, 12),
            Self::DomainAddressWrite | Self::DomainAddressResponse => (2, 6),
            Self::DomainAddressSelectiveRead => (1, ANY),
            Self::LinkRead => (2, 2),
            Self::LinkResponse => (4, ANY),
            Self::LinkWrite => (4, 4),
            Self::GroupPropValueRead => (4, 4),
            Self::GroupPropValueResponse
            | Self::GroupPropValueWrite
            | Self::GroupPropValueInfoReport => (4, ANY),
            Self::DomainAddressSerialNumberRead => (6, 6),
            Self::DomainAddressSerialNumberResponse => (8, ANY),
            Self::DomainAddressSerialNumberWrite => (8, 8),
            Self::FileStreamInfoReport => (1, ANY),
        }
    }
}

// =============================================================================
// TPDU
// =============================================================================

/// Transport protocol data unit.
///
/// ```
/// use knx_secure::protocol::tpdu::{ApplicationControlField, DataContext, Tpdu, TransportControlField};
///
/// let tpdu = Tpdu::new(
///     TransportControlField::DataGroup,
///     ApplicationControlField::GroupValueWrite,
///     &[0x3F],
/// )?;
/// assert_eq!(tpdu.bytes()?.as_slice(), &[0x00, 0xBF]);
///
/// let decoded = Tpdu::decode(&[0x00, 0xBF], DataContext::Group)?;
/// assert_eq!(decoded.data(), &[0x3F]);
/// # Ok::<(), knx_secure::KnxError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tpdu {
    tpci: TransportControlField,
    apci: ApplicationControlField,
    data: TpduData,
}

impl Tpdu {
    /// Data TPDU.
    pub fn new(
        tpci: TransportControlField,
        apci: ApplicationControlField,
        data: &[u8],
    ) -> Result<Self> {
        let mut tpdu = Self {
            tpci,
            apci,
            data: TpduData::new(),
        };
        tpdu.set_data(data)?;
        Ok(tpdu)
    }

    /// TPDU without data, for services that carry none.
    pub const fn empty(tpci: TransportControlField, apci: ApplicationControlField) -> Self {
        Self {
            tpci,
            apci,
            data: TpduData::new(),
        }
    }

    /// Single-octet transport control TPDU.
    pub fn control(tpci: TransportControlField) -> Result<Self> {
        if !tpci.is_control() {
            return Err(KnxError::invalid_transport_control_field());
        }
        Ok(Self {
            tpci,
            apci: ApplicationControlField::Invalid,
            data: TpduData::new(),
        })
    }

    /// Decode from wire bytes.
    ///
    /// `context` resolves unnumbered data TPDUs, see [`DataContext`].
    pub fn decode(bytes: &[u8], context: DataContext) -> Result<Self> {
        let (&first, rest) = bytes.split_first().ok_or_else(KnxError::buffer_too_small)?;

        let tpci = TransportControlField::decode(first, context);
        if tpci == TransportControlField::Invalid {
            knx_log!(debug, "invalid TPCI {:?}", first);
            return Err(KnxError::invalid_transport_control_field());
        }
        if tpci.is_control() {
            return Self::control(tpci);
        }

        let (&second, trailing) = rest.split_first().ok_or_else(KnxError::buffer_too_small)?;
        let bits = (u16::from(first & 0x03) << 8) | u16::from(second);
        let apci = ApplicationControlField::from_bits(bits, tpci);
        if apci == ApplicationControlField::Invalid {
            knx_log!(debug, "invalid APCI {:?}", bits);
            return Err(KnxError::invalid_application_control_field());
        }

        let packed = second & PACKED_MASK;
        let mut data = TpduData::new();
        let filled = match apci.layout() {
            DataLayout::Optimized if trailing.is_empty() => data.push(packed).map_err(|_| ()),
            DataLayout::None | DataLayout::Appended | DataLayout::Optimized => {
                data.extend_from_slice(trailing).map_err(|_| ())
            }
            DataLayout::Packed => data
                .push(packed)
                .map_err(|_| ())
                .and_then(|()| data.extend_from_slice(trailing).map_err(|_| ())),
        };
        filled.map_err(|_| KnxError::invalid_data_length())?;

        Ok(Self { tpci, apci, data })
    }

    /// Encode into `buf`, returning the bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let tpci = self
            .tpci
            .bits()
            .ok_or_else(KnxError::invalid_transport_control_field)?;

        if self.tpci.is_control() {
            let out = buf.first_mut().ok_or_else(KnxError::buffer_too_small)?;
            *out = tpci;
            return Ok(1);
        }

        let apci = self
            .apci
            .bits()
            .ok_or_else(KnxError::invalid_application_control_field)?;
        let (packed, trailing) = self.split_packed();

        let size = 2 + trailing.len();
        let out = buf.get_mut(..size).ok_or_else(KnxError::buffer_too_small)?;
        out[0] = tpci | ((apci >> 8) as u8 & 0x03);
        out[1] = apci as u8 | packed;
        out[2..].copy_from_slice(trailing);
        Ok(size)
    }

    /// Wire bytes.
    pub fn bytes(&self) -> Result<TpduBuffer> {
        let mut buf = [0u8; MAX_TPDU_SIZE];
        let len = self.encode(&mut buf)?;
        TpduBuffer::from_slice(&buf[..len]).map_err(|_| KnxError::capacity_exceeded())
    }

    /// Known TPCI and APCI, and data that fits the service layout.
    pub fn is_valid(&self) -> bool {
        if self.tpci == TransportControlField::Invalid {
            return false;
        }
        if self.tpci.is_control() {
            return self.data.is_empty();
        }
        if self.apci == ApplicationControlField::Invalid {
            return false;
        }

        let (min, max) = self.apci.data_length();
        let len = self.data.len();
        if len < min || len > max {
            return false;
        }

        match (self.apci.layout(), self.data.first()) {
            (DataLayout::Packed, Some(&first)) => first <= PACKED_MASK,
            _ => true,
        }
    }

    /// Replace the data.
    pub fn set_data(&mut self, data: &[u8]) -> Result<()> {
        self.data = TpduData::from_slice(data).map_err(|_| KnxError::invalid_data_length())?;
        Ok(())
    }

    pub fn set_transport_control_field(&mut self, tpci: TransportControlField) {
        self.tpci = tpci;
    }

    pub fn set_application_control_field(&mut self, apci: ApplicationControlField) {
        self.apci = apci;
    }

    #[inline(always)]
    pub const fn transport_control_field(&self) -> TransportControlField {
        self.tpci
    }

    #[inline(always)]
    pub const fn application_control_field(&self) -> ApplicationControlField {
        self.apci
    }

    #[inline(always)]
    pub const fn sequence_number(&self) -> Option<u8> {
        self.tpci.sequence_number()
    }

    /// Logical data, packed byte included.
    #[inline(always)]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        if self.tpci.is_control() {
            return 1;
        }
        2 + self.split_packed().1.len()
    }

    /// Size without the TPCI octet, the value of the cEMI length field.
    #[inline(always)]
    pub fn data_size(&self) -> usize {
        self.size() - 1
    }

    /// Split the data into the six packed bits and the trailing bytes.
    fn split_packed(&self) -> (u8, &[u8]) {
        match (self.apci.layout(), self.data.as_slice()) {
            (DataLayout::Optimized, [value]) if *value <= PACKED_MASK => (*value, &[]),
            (DataLayout::Packed, [first, rest @ ..]) if *first <= PACKED_MASK => (*first, rest),
            (_, data) => (0, data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationControlField as Apci;
    use TransportControlField as Tpci;

    #[test]
    fn test_group_value_optimized() {
        let mut tpdu = Tpdu::new(Tpci::DataGroup, Apci::GroupValueResponse, &[0x3F]).unwrap();
        assert_eq!(tpdu.bytes().unwrap().as_slice(), &[0x00, 0x7F]);
        assert_eq!(tpdu.size(), 2);

        tpdu.set_application_control_field(Apci::GroupValueWrite);
        assert_eq!(tpdu.bytes().unwrap().as_slice(), &[0x00, 0xBF]);

        tpdu.set_data(&[0x43]).unwrap();
        assert_eq!(tpdu.data(), &[0x43]);
        assert_eq!(tpdu.bytes().unwrap().as_slice(), &[0x00, 0x80, 0x43]);
        assert_eq!(tpdu.size(), 3);

        tpdu.set_data(&[0x00]).unwrap();
        assert_eq!(tpdu.bytes().unwrap().as_slice(), &[0x00, 0x80]);

        tpdu.set_data(&[0x01, 0x01]).unwrap();
        assert_eq!(tpdu.size(), 4);
        assert_eq!(tpdu.data_size(), 3);
    }

    #[test]
    fn test_group_value_read_rejects_data() {
        let mut tpdu = Tpdu::new(Tpci::DataGroup, Apci::GroupValueRead, &[]).unwrap();
        assert!(tpdu.is_valid());
        assert_eq!(tpdu.size(), 2);

        tpdu.set_data(&[0x3F, 0x3F]).unwrap();
        assert!(!tpdu.is_valid());

        tpdu.set_data(&[]).unwrap();
        assert!(tpdu.is_valid());
        assert!(tpdu.data().is_empty());
    }

    #[test]
    fn test_packed_layout() {
        let tpdu = Tpdu::new(Tpci::DataIndividual, Apci::MemoryRead, &[0x05, 0xAB, 0xCD]).unwrap();
        assert!(tpdu.is_valid());
        assert_eq!(tpdu.bytes().unwrap().as_slice(), &[0x02, 0x05, 0xAB, 0xCD]);
        assert_eq!(tpdu.size(), 4);

        let too_large = Tpdu::new(Tpci::DataIndividual, Apci::MemoryRead, &[0x40, 0xAB, 0xCD]).unwrap();
        assert!(!too_large.is_valid());
    }

    #[test]
    fn test_control_tpdu() {
        let ack = Tpdu::control(Tpci::Acknowledge { sequence: 5 }).unwrap();
        assert_eq!(ack.bytes().unwrap().as_slice(), &[0xD6]);
        assert_eq!(ack.size(), 1);
        assert_eq!(ack.data_size(), 0);
        assert_eq!(ack.sequence_number(), Some(5));
        assert!(ack.is_valid());

        assert!(Tpdu::control(Tpci::DataGroup).is_err());
    }

    #[test]
    fn test_decode_tpci() {
        assert_eq!(Tpci::decode(0x00, DataContext::Broadcast), Tpci::DataBroadcast);
        assert_eq!(Tpci::decode(0x03, DataContext::Individual), Tpci::DataIndividual);
        assert_eq!(Tpci::decode(0x04, DataContext::Group), Tpci::DataTagGroup);
        assert_eq!(Tpci::decode(0x5C, DataContext::Group), Tpci::DataConnected { sequence: 7 });
        assert_eq!(Tpci::decode(0x80, DataContext::Group), Tpci::Connect);
        assert_eq!(Tpci::decode(0x81, DataContext::Group), Tpci::Disconnect);
        assert_eq!(Tpci::decode(0xC3, DataContext::Group), Tpci::NoAcknowledge { sequence: 0 });
        assert_eq!(Tpci::decode(0x08, DataContext::Group), Tpci::Invalid);
        assert_eq!(Tpci::decode(0x84, DataContext::Group), Tpci::Invalid);
        assert_eq!(Tpci::decode(0xC0, DataContext::Group), Tpci::Invalid);
    }

    #[test]
    fn test_apci_resolution() {
        assert_eq!(Apci::from_bits(0x0BF, Tpci::DataGroup), Apci::GroupValueWrite);
        assert_eq!(Apci::from_bits(0x3D5, Tpci::DataIndividual), Apci::PropertyValueRead);
        assert_eq!(
            Apci::from_bits(0x1C8, Tpci::DataSystemBroadcast),
            Apci::SystemNetworkParameterRead
        );
        assert_eq!(
            Apci::from_bits(0x1C8, Tpci::DataConnected { sequence: 0 }),
            Apci::AdcResponse
        );
        assert_eq!(Apci::from_bits(0x1C3, Tpci::DataConnected { sequence: 0 }), Apci::AdcResponse);
        assert_eq!(Apci::from_bits(0x3C0, Tpci::DataIndividual), Apci::Invalid);
        assert_eq!(Apci::from_bits(0x2CF, Tpci::DataIndividual), Apci::Invalid);
    }

    #[test]
    fn test_decode_round_trip() {
        let tpdu = Tpdu::new(
            Tpci::DataConnected { sequence: 3 },
            Apci::PropertyValueWrite,
            &[0x00, 0x01, 0x10, 0x01, 0xAA, 0xBB],
        )
        .unwrap();
        let bytes = tpdu.bytes().unwrap();
        assert_eq!(Tpdu::decode(&bytes, DataContext::Individual).unwrap(), tpdu);
    }

    #[test]
    fn test_decode_errors() {
        assert!(Tpdu::decode(&[], DataContext::Group).is_err());
        assert!(Tpdu::decode(&[0x00], DataContext::Group).is_err());
        assert!(Tpdu::decode(&[0x08, 0x80], DataContext::Group).is_err());
        assert!(Tpdu::decode(&[0x03, 0xC0], DataContext::Individual).is_err());
    }

    #[test]
    fn test_data_capacity() {
        let data = [0u8; MAX_DATA_SIZE];
        let tpdu = Tpdu::new(Tpci::DataGroup, Apci::GroupValueWrite, &data).unwrap();
        assert!(tpdu.is_valid());
        assert_eq!(tpdu.size(), 256);

        let data = [0u8; MAX_DATA_SIZE + 1];
        assert!(Tpdu::new(Tpci::DataGroup, Apci::GroupValueWrite, &data).is_err());
    }

    #[test]
    fn test_invalid_fields() {
        assert!(!Tpdu::default().is_valid());
        assert!(Tpdu::default().bytes().is_err());
    }
}
