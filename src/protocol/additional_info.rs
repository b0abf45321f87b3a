//! cEMI additional information blocks.
//!
//! ```text
//! ┌──────────┬──────────┬────────────────────┐
//! │ Type ID  │ Length   │ Data (Length bytes)│
//! │ (1 byte) │ (1 byte) │                    │
//! └──────────┴──────────┴────────────────────┘
//! ```
//!
//! Blocks are concatenated after the aggregate length octet of a cEMI frame.

use crate::error::{KnxError, Result};
use heapless::Vec;

/// Largest data field of a single block.
pub const MAX_ADDITIONAL_INFO_DATA: usize = 252;

/// Block data.
pub type AdditionalInfoData = Vec<u8, MAX_ADDITIONAL_INFO_DATA>;

/// Encoded block.
pub type AdditionalInfoBuffer = Vec<u8, { MAX_ADDITIONAL_INFO_DATA + 2 }>;

/// Additional information type identifiers, ordered by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AdditionalInfoType {
    /// Domain address of a powerline device
    PlMediumInformation = 0x01,
    /// RF-Info, serial number or domain address, LFN
    RfMediumInformation = 0x02,
    /// Busmonitor error flags
    BusmonitorStatusInfo = 0x03,
    TimestampRelative = 0x04,
    TimeDelayUntilSending = 0x05,
    ExtendedRelativeTimestamp = 0x06,
    BiBatInformation = 0x07,
    RfMultiInformation = 0x08,
    PreambleAndPostamble = 0x09,
    /// Status and error flags of fast acknowledges, two octets each
    RfFastAckInformation = 0x0A,
    /// Manufacturer code followed by a subfunction and data
    ManufacturerSpecificData = 0xFE,
}

impl AdditionalInfoType {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::PlMediumInformation),
            0x02 => Some(Self::RfMediumInformation),
            0x03 => Some(Self::BusmonitorStatusInfo),
            0x04 => Some(Self::TimestampRelative),
            0x05 => Some(Self::TimeDelayUntilSending),
            0x06 => Some(Self::ExtendedRelativeTimestamp),
            0x07 => Some(Self::BiBatInformation),
            0x08 => Some(Self::RfMultiInformation),
            0x09 => Some(Self::PreambleAndPostamble),
            0x0A => Some(Self::RfFastAckInformation),
            0xFE => Some(Self::ManufacturerSpecificData),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Fixed data length, `None` for variable sized blocks.
    pub const fn expected_data_size(self) -> Option<usize> {
        match self {
            Self::PlMediumInformation
            | Self::TimestampRelative
            | Self::BiBatInformation => Some(2),
            Self::RfMediumInformation => Some(8),
            Self::BusmonitorStatusInfo => Some(1),
            Self::TimeDelayUntilSending
            | Self::ExtendedRelativeTimestamp
            | Self::RfMultiInformation => Some(4),
            Self::PreambleAndPostamble => Some(3),
            Self::RfFastAckInformation | Self::ManufacturerSpecificData => None,
        }
    }

    /// Whether `len` data bytes are acceptable for this type.
    pub const fn accepts_data_size(self, len: usize) -> bool {
        if len > MAX_ADDITIONAL_INFO_DATA {
            return false;
        }
        match self {
            Self::RfFastAckInformation => len % 2 == 0,
            Self::ManufacturerSpecificData => len >= 3,
            fixed => match fixed.expected_data_size() {
                Some(size) => size == len,
                None => false,
            },
        }
    }
}

/// A single additional information block.
///
/// ```
/// use knx_secure::protocol::additional_info::{AdditionalInfo, AdditionalInfoType};
///
/// let info = AdditionalInfo::new(AdditionalInfoType::BiBatInformation, &[0x10, 0x20])?;
/// assert_eq!(info.size(), 4);
/// assert_eq!(info.bytes()?.as_slice(), &[0x07, 0x02, 0x10, 0x20]);
/// # Ok::<(), knx_secure::KnxError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdditionalInfo {
    info_type: AdditionalInfoType,
    data: AdditionalInfoData,
}

impl AdditionalInfo {
    pub fn new(info_type: AdditionalInfoType, data: &[u8]) -> Result<Self> {
        if !info_type.accepts_data_size(data.len()) {
            knx_log!(debug, "rejected {:?} block with {} bytes", info_type, data.len());
            return Err(KnxError::invalid_additional_info());
        }
        let data = AdditionalInfoData::from_slice(data)
            .map_err(|_| KnxError::invalid_additional_info())?;
        Ok(Self { info_type, data })
    }

    /// Decode one block from the start of `bytes`.
    ///
    /// Trailing bytes after the block are ignored; use [`size`](Self::size)
    /// to advance.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let [type_id, len, rest @ ..] = bytes else {
            return Err(KnxError::buffer_too_small());
        };
        let info_type =
            AdditionalInfoType::from_u8(*type_id).ok_or_else(KnxError::invalid_additional_info)?;
        let data = rest
            .get(..usize::from(*len))
            .ok_or_else(KnxError::buffer_too_small)?;
        Self::new(info_type, data)
    }

    #[inline(always)]
    pub const fn info_type(&self) -> AdditionalInfoType {
        self.info_type
    }

    #[inline(always)]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Encoded size, type and length octets included.
    #[inline(always)]
    pub fn size(&self) -> usize {
        2 + self.data.len()
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let size = self.size();
        let out = buf.get_mut(..size).ok_or_else(KnxError::buffer_too_small)?;
        out[0] = self.info_type.to_u8();
        out[1] = self.data.len() as u8;
        out[2..].copy_from_slice(&self.data);
        Ok(size)
    }

    pub fn bytes(&self) -> Result<AdditionalInfoBuffer> {
        let mut buf = [0u8; MAX_ADDITIONAL_INFO_DATA + 2];
        let len = self.encode(&mut buf)?;
        AdditionalInfoBuffer::from_slice(&buf[..len]).map_err(|_| KnxError::capacity_exceeded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ordering() {
        assert!(AdditionalInfoType::PlMediumInformation < AdditionalInfoType::BiBatInformation);
        assert!(
            AdditionalInfoType::RfFastAckInformation < AdditionalInfoType::ManufacturerSpecificData
        );
        assert_eq!(AdditionalInfoType::from_u8(0x0B), None);
        assert_eq!(AdditionalInfoType::from_u8(0xFE), Some(AdditionalInfoType::ManufacturerSpecificData));
    }

    #[test]
    fn test_fixed_lengths() {
        assert!(AdditionalInfo::new(AdditionalInfoType::PlMediumInformation, &[1, 2]).is_ok());
        assert!(AdditionalInfo::new(AdditionalInfoType::PlMediumInformation, &[1]).is_err());
        assert!(AdditionalInfo::new(AdditionalInfoType::RfMediumInformation, &[0; 8]).is_ok());
        assert!(AdditionalInfo::new(AdditionalInfoType::BusmonitorStatusInfo, &[0; 2]).is_err());
        assert!(AdditionalInfo::new(AdditionalInfoType::PreambleAndPostamble, &[0; 3]).is_ok());
        assert!(AdditionalInfo::new(AdditionalInfoType::TimeDelayUntilSending, &[0; 4]).is_ok());
    }

    #[test]
    fn test_variable_lengths() {
        let fast_ack = AdditionalInfoType::RfFastAckInformation;
        assert!(AdditionalInfo::new(fast_ack, &[0; 4]).is_ok());
        assert!(AdditionalInfo::new(fast_ack, &[0; 3]).is_err());

        let manufacturer = AdditionalInfoType::ManufacturerSpecificData;
        assert!(AdditionalInfo::new(manufacturer, &[0; 2]).is_err());
        assert!(AdditionalInfo::new(manufacturer, &[0; MAX_ADDITIONAL_INFO_DATA]).is_ok());
        assert!(AdditionalInfo::new(manufacturer, &[0; MAX_ADDITIONAL_INFO_DATA + 1]).is_err());
    }

    #[test]
    fn test_decode() {
        let bytes = [0x03, 0x01, 0x80, 0xFF];
        let info = AdditionalInfo::decode(&bytes).unwrap();
        assert_eq!(info.info_type(), AdditionalInfoType::BusmonitorStatusInfo);
        assert_eq!(info.data(), &[0x80]);
        assert_eq!(info.size(), 3);
        assert_eq!(info.bytes().unwrap().as_slice(), &bytes[..3]);

        assert!(AdditionalInfo::decode(&[0x03]).is_err());
        assert!(AdditionalInfo::decode(&[0x03, 0x02, 0x80]).is_err());
        assert!(AdditionalInfo::decode(&[0x0C, 0x01, 0x80]).is_err());
    }

    #[test]
    fn test_bytes_of_largest_block() {
        let data = [0xA5; MAX_ADDITIONAL_INFO_DATA];
        let info = AdditionalInfo::new(AdditionalInfoType::ManufacturerSpecificData, &data).unwrap();
        let bytes = info.bytes().unwrap();
        assert_eq!(bytes.len(), MAX_ADDITIONAL_INFO_DATA + 2);
        assert_eq!(&bytes[..2], &[0xFE, 0xFC]);
        assert_eq!(&bytes[2..], &data[..]);
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let info = AdditionalInfo::new(AdditionalInfoType::TimestampRelative, &[0x12, 0x34]).unwrap();
        let mut buf = [0u8; 3];
        assert!(info.encode(&mut buf).is_err());
        let mut buf = [0u8; 4];
        assert_eq!(info.encode(&mut buf).unwrap(), 4);
        assert_eq!(buf, [0x04, 0x02, 0x12, 0x34]);
    }
}
