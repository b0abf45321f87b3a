//! Common External Message Interface (cEMI) link layer frames.
//!
//! A [`LinkLayerFrame`] is the `L_Data` style message exchanged through a
//! KNXnet/IP tunnel: message code, additional information blocks, the two
//! control fields, source and destination addresses and a [`Tpdu`].
//!
//! ## Frame Structure
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Message Code (1 byte)                    │
//! ├──────────────────────────────────────────┤
//! │ Additional Info Length (1 byte)          │
//! ├──────────────────────────────────────────┤
//! │ Additional Info blocks (0..254 bytes)    │
//! ├──────────────────────────────────────────┤
//! │ Service Information                      │
//! │  ├─ Control Field (1 byte)               │
//! │  ├─ Extended Control Field (1 byte)      │
//! │  ├─ Source Address (2 bytes)             │
//! │  ├─ Destination Address (2 bytes)        │
//! │  ├─ Length (1 byte, TPCI not counted)    │
//! │  └─ TPDU (1..256 bytes)                  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use knx_secure::protocol::catalog::multicast;
//! use knx_secure::{ga, ia, LinkLayerFrame, MessageCode};
//!
//! let frame = LinkLayerFrame::builder()
//!     .message_code(MessageCode::DataInd)
//!     .source(ia!(1, 1, 1))
//!     .destination(ga!(5/6/7))
//!     .tpdu(multicast::group_value_read())
//!     .build()?;
//!
//! let bytes = frame.bytes()?;
//! let decoded = LinkLayerFrame::decode(frame.medium_type(), &bytes)?;
//! assert_eq!(decoded, frame);
//! # Ok::<(), knx_secure::KnxError>(())
//! ```

use crate::addressing::{AddressType, KnxAddress};
use crate::error::{KnxError, Result};
use crate::protocol::additional_info::{AdditionalInfo, AdditionalInfoType};
use crate::protocol::constants::{MediumType, MessageCode, Priority, MAX_CEMI_SIZE};
use crate::protocol::tpdu::{DataContext, Tpdu, MAX_TPDU_SIZE};
use heapless::Vec;

/// Largest aggregate size of the additional information blocks; 0xFF is reserved.
pub const MAX_ADDITIONAL_INFO_SIZE: usize = 0xFE;

/// Most additional information blocks that fit in the aggregate size, at two
/// bytes per empty block.
pub const MAX_ADDITIONAL_INFOS: usize = MAX_ADDITIONAL_INFO_SIZE / 2;

/// Largest standard frame TPDU, length field included.
const MAX_STANDARD_DATA_SIZE: usize = 15;

/// TPDUs above this size are long frames and must be sent with low priority.
const MAX_SHORT_TPDU_SIZE: usize = 16;

/// Encoded cEMI frame.
pub type CemiBuffer = Vec<u8, MAX_CEMI_SIZE>;

// =============================================================================
// Control Field
// =============================================================================

/// Standard or extended frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameFormat {
    Extended,
    Standard,
}

/// Scope of a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BroadcastType {
    System,
    Domain,
}

/// Control field of an `L_Data` frame.
///
/// ```text
/// Bit 7: Frame Format (0=extended, 1=standard)
/// Bit 6: Reserved
/// Bit 5: Repeat (0=repeat, 1=do not repeat)
/// Bit 4: Broadcast (0=system, 1=domain)
/// Bit 3-2: Priority (00=system, 01=normal, 10=urgent, 11=low)
/// Bit 1: Acknowledge Request (0=no ack, 1=ack requested)
/// Bit 0: Confirm (0=no error, 1=error)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlField {
    raw: u8,
}

impl From<u8> for ControlField {
    #[inline(always)]
    fn from(raw: u8) -> Self {
        Self { raw }
    }
}

impl From<ControlField> for u8 {
    #[inline(always)]
    fn from(ctrl: ControlField) -> u8 {
        ctrl.raw
    }
}

impl Default for ControlField {
    /// Standard frame, do not repeat, domain broadcast, low priority: `0xBC`.
    #[inline]
    fn default() -> Self {
        Self { raw: 0xBC }
    }
}

impl ControlField {
    #[inline]
    pub const fn builder() -> ControlFieldBuilder {
        ControlFieldBuilder { raw: 0xBC }
    }

    #[inline(always)]
    pub const fn raw(self) -> u8 {
        self.raw
    }

    #[inline(always)]
    pub const fn frame_format(self) -> FrameFormat {
        if self.raw & 0x80 != 0 {
            FrameFormat::Standard
        } else {
            FrameFormat::Extended
        }
    }

    /// `true` when the frame may be repeated on transmission errors.
    #[inline(always)]
    pub const fn repeat(self) -> bool {
        self.raw & 0x20 == 0
    }

    #[inline(always)]
    pub const fn broadcast(self) -> BroadcastType {
        if self.raw & 0x10 != 0 {
            BroadcastType::Domain
        } else {
            BroadcastType::System
        }
    }

    #[inline(always)]
    pub const fn priority(self) -> Priority {
        Priority::from_u8((self.raw >> 2) & 0x03)
    }

    #[inline(always)]
    pub const fn acknowledge_request(self) -> bool {
        self.raw & 0x02 != 0
    }

    #[inline(always)]
    pub const fn confirm_error(self) -> bool {
        self.raw & 0x01 != 0
    }
}

/// Builder for [`ControlField`], starting from the default `0xBC`.
#[derive(Debug, Clone, Copy)]
pub struct ControlFieldBuilder {
    raw: u8,
}

impl ControlFieldBuilder {
    const fn flag(mut self, mask: u8, set: bool) -> Self {
        if set {
            self.raw |= mask;
        } else {
            self.raw &= !mask;
        }
        self
    }

    pub const fn frame_format(self, format: FrameFormat) -> Self {
        self.flag(0x80, matches!(format, FrameFormat::Standard))
    }

    pub const fn repeat(self, repeat: bool) -> Self {
        self.flag(0x20, !repeat)
    }

    pub const fn broadcast(self, broadcast: BroadcastType) -> Self {
        self.flag(0x10, matches!(broadcast, BroadcastType::Domain))
    }

    pub const fn priority(mut self, priority: Priority) -> Self {
        self.raw = (self.raw & !0x0C) | ((priority.to_u8() & 0x03) << 2);
        self
    }

    pub const fn acknowledge_request(self, request: bool) -> Self {
        self.flag(0x02, request)
    }

    pub const fn confirm_error(self, error: bool) -> Self {
        self.flag(0x01, error)
    }

    #[inline]
    pub const fn build(self) -> ControlField {
        ControlField { raw: self.raw }
    }
}

// =============================================================================
// Extended Control Field
// =============================================================================

/// Extended control field of an `L_Data` frame.
///
/// ```text
/// Bit 7: Destination Address Type (0=individual, 1=group)
/// Bit 6-4: Hop Count (0-7)
/// Bit 3-0: Extended Frame Format (0000=standard)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtendedControlField {
    raw: u8,
}

impl From<u8> for ExtendedControlField {
    #[inline(always)]
    fn from(raw: u8) -> Self {
        Self { raw }
    }
}

impl From<ExtendedControlField> for u8 {
    #[inline(always)]
    fn from(ctrl: ExtendedControlField) -> u8 {
        ctrl.raw
    }
}

impl Default for ExtendedControlField {
    /// Group destination, hop count 6, standard format: `0xE0`.
    #[inline]
    fn default() -> Self {
        Self { raw: 0xE0 }
    }
}

impl ExtendedControlField {
    #[inline]
    pub const fn builder() -> ExtendedControlFieldBuilder {
        ExtendedControlFieldBuilder { raw: 0xE0 }
    }

    #[inline(always)]
    pub const fn raw(self) -> u8 {
        self.raw
    }

    #[inline(always)]
    pub const fn destination_address_type(self) -> AddressType {
        if self.raw & 0x80 != 0 {
            AddressType::Group
        } else {
            AddressType::Individual
        }
    }

    #[inline(always)]
    pub const fn hop_count(self) -> u8 {
        (self.raw >> 4) & 0x07
    }

    #[inline(always)]
    pub const fn extended_frame_format(self) -> u8 {
        self.raw & 0x0F
    }
}

/// Builder for [`ExtendedControlField`], starting from the default `0xE0`.
#[derive(Debug, Clone, Copy)]
pub struct ExtendedControlFieldBuilder {
    raw: u8,
}

impl ExtendedControlFieldBuilder {
    pub const fn destination_address_type(mut self, address_type: AddressType) -> Self {
        match address_type {
            AddressType::Group => self.raw |= 0x80,
            AddressType::Individual => self.raw &= !0x80,
        }
        self
    }

    /// Hop count, masked to three bits.
    pub const fn hop_count(mut self, hop_count: u8) -> Self {
        self.raw = (self.raw & !0x70) | ((hop_count & 0x07) << 4);
        self
    }

    /// Extended frame format, masked to four bits.
    pub const fn extended_frame_format(mut self, format: u8) -> Self {
        self.raw = (self.raw & !0x0F) | (format & 0x0F);
        self
    }

    #[inline]
    pub const fn build(self) -> ExtendedControlField {
        ExtendedControlField { raw: self.raw }
    }
}

// =============================================================================
// Link Layer Frame
// =============================================================================

/// cEMI link layer frame.
///
/// Additional information blocks are kept sorted by type id. The aggregate
/// length octet is derived from the blocks whenever the frame is encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkLayerFrame {
    message_code: MessageCode,
    medium_type: MediumType,
    additional_infos: Vec<AdditionalInfo, MAX_ADDITIONAL_INFOS>,
    control_field: ControlField,
    extended_control_field: ExtendedControlField,
    source: KnxAddress,
    destination: KnxAddress,
    tpdu: Tpdu,
}

impl LinkLayerFrame {
    /// Empty frame with default control fields.
    ///
    /// The source is `0.0.0`, the destination the broadcast address and the
    /// TPDU invalid until set.
    pub fn new(medium_type: MediumType, message_code: MessageCode) -> Self {
        Self {
            message_code,
            medium_type,
            additional_infos: Vec::new(),
            control_field: ControlField::default(),
            extended_control_field: ExtendedControlField::default(),
            source: KnxAddress::new(AddressType::Individual, 0),
            destination: KnxAddress::BROADCAST,
            tpdu: Tpdu::default(),
        }
    }

    pub fn builder() -> LinkLayerFrameBuilder {
        LinkLayerFrameBuilder::default()
    }

    /// Decode a frame received over `medium_type`.
    ///
    /// The destination address type comes from the extended control field; the
    /// TPDU's data context is resolved from the destination and the broadcast
    /// bit of the control field.
    pub fn decode(medium_type: MediumType, bytes: &[u8]) -> Result<Self> {
        let [code, info_len, rest @ ..] = bytes else {
            return Err(KnxError::buffer_too_small());
        };

        let message_code = MessageCode::from_u8(*code).ok_or_else(|| {
            knx_log!(debug, "unknown cEMI message code {:?}", code);
            KnxError::invalid_message_code()
        })?;

        // 0xFF is reserved and means no blocks
        let info_len = if *info_len == 0xFF { 0 } else { usize::from(*info_len) };
        let (mut region, service) = rest
            .split_at_checked(info_len)
            .ok_or_else(KnxError::buffer_too_small)?;

        let mut additional_infos = Vec::new();
        while !region.is_empty() {
            let info = AdditionalInfo::decode(region)?;
            region = &region[info.size()..];
            // the region is at most 0xFE bytes, so the list cannot fill up
            additional_infos
                .push(info)
                .map_err(|_| KnxError::capacity_exceeded())?;
        }

        let [ctrl, ext_ctrl, src_hi, src_lo, dst_hi, dst_lo, len, tpdu @ ..] = service else {
            return Err(KnxError::buffer_too_small());
        };

        let control_field = ControlField::from(*ctrl);
        let extended_control_field = ExtendedControlField::from(*ext_ctrl);
        let source = KnxAddress::new(AddressType::Individual, u16::from_be_bytes([*src_hi, *src_lo]));
        let destination = KnxAddress::new(
            extended_control_field.destination_address_type(),
            u16::from_be_bytes([*dst_hi, *dst_lo]),
        );

        let tpdu = tpdu
            .get(..usize::from(*len) + 1)
            .ok_or_else(KnxError::buffer_too_small)?;
        let tpdu = Tpdu::decode(tpdu, data_context(control_field, destination))?;

        Ok(Self {
            message_code,
            medium_type,
            additional_infos,
            control_field,
            extended_control_field,
            source,
            destination,
            tpdu,
        })
    }

    /// Encode into `buf`, returning the bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let info_size = self.additional_info_size();
        let header_end = 2 + info_size;
        let service_end = header_end + 7;
        if buf.len() < service_end {
            return Err(KnxError::buffer_too_small());
        }

        buf[0] = self.message_code.to_u8();
        buf[1] = info_size as u8;

        let mut offset = 2;
        for info in &self.additional_infos {
            offset += info.encode(&mut buf[offset..header_end])?;
        }

        let service = &mut buf[header_end..service_end];
        service[0] = self.control_field.raw();
        service[1] = self.extended_control_field.raw();
        service[2..4].copy_from_slice(&self.source.to_bytes());
        service[4..6].copy_from_slice(&self.destination.to_bytes());
        service[6] = self.tpdu.data_size() as u8;

        let written = self.tpdu.encode(&mut buf[service_end..])?;
        Ok(service_end + written)
    }

    /// Wire bytes.
    pub fn bytes(&self) -> Result<CemiBuffer> {
        let mut buf = [0u8; MAX_CEMI_SIZE];
        let len = self.encode(&mut buf)?;
        CemiBuffer::from_slice(&buf[..len]).map_err(|_| KnxError::capacity_exceeded())
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        2 + self.additional_info_size() + 7 + self.tpdu.size()
    }

    /// Medium used for validation: the explicit medium, or the one implied by
    /// the message code when none was given.
    pub const fn effective_medium_type(&self) -> MediumType {
        match self.medium_type {
            MediumType::Unknown => self.message_code.default_medium(),
            medium => medium,
        }
    }

    /// Whether the message code may be sent through a KNXnet/IP tunnel.
    pub fn is_message_code_valid(&self) -> bool {
        match self.message_code {
            MessageCode::BusmonitorInd
            | MessageCode::DataReq
            | MessageCode::DataCon
            | MessageCode::DataInd
            | MessageCode::RawReq
            | MessageCode::RawInd
            | MessageCode::RawCon
            | MessageCode::ResetReq => self.effective_medium_type() == MediumType::NetIp,
            _ => false,
        }
    }

    /// Check the frame against the KNXnet/IP tunnelling rules.
    ///
    /// Only KNXnet/IP frames are modelled; every other medium is invalid.
    pub fn is_valid(&self) -> bool {
        if !self.is_message_code_valid() {
            return false;
        }
        if !self.tpdu.is_valid() {
            return false;
        }
        if self.effective_medium_type() != MediumType::NetIp {
            return false;
        }
        if self.destination.address_type() != self.extended_control_field.destination_address_type() {
            return false;
        }
        if self.message_code.is_data() && !self.source.is_individual() {
            return false;
        }

        let format = self.control_field.frame_format();
        if format == FrameFormat::Extended && self.tpdu.size() > MAX_TPDU_SIZE {
            return false;
        }
        // long frames are low priority only
        if self.tpdu.size() > MAX_SHORT_TPDU_SIZE && self.control_field.priority() != Priority::Low {
            return false;
        }
        if format == FrameFormat::Standard && self.tpdu.data_size() > MAX_STANDARD_DATA_SIZE {
            return false;
        }
        true
    }

    // -------------------------------------------------------------------------
    // Additional information
    // -------------------------------------------------------------------------

    /// Insert `info` before the first block with an equal or higher type id.
    ///
    /// Returns `false` and leaves the frame untouched if the aggregate size
    /// would exceed 254 bytes.
    pub fn add_additional_info(&mut self, info: AdditionalInfo) -> bool {
        if self.additional_info_size() + info.size() > MAX_ADDITIONAL_INFO_SIZE {
            knx_log!(debug, "additional info {:?} exceeds the aggregate size", info.info_type());
            return false;
        }

        let index = self
            .additional_infos
            .iter()
            .position(|existing| existing.info_type() >= info.info_type())
            .unwrap_or(self.additional_infos.len());

        if self.additional_infos.insert(index, info).is_err() {
            knx_log!(debug, "no room for another additional info block");
            return false;
        }
        true
    }

    /// Drop every block of `info_type`.
    pub fn remove_additional_info_type(&mut self, info_type: AdditionalInfoType) {
        self.additional_infos.retain(|info| info.info_type() != info_type);
    }

    /// Drop every block equal to `info`.
    pub fn remove_additional_info(&mut self, info: &AdditionalInfo) {
        self.additional_infos.retain(|existing| existing != info);
    }

    pub fn clear_additional_info(&mut self) {
        self.additional_infos.clear();
    }

    /// Aggregate size of all blocks, the value of the length octet.
    pub fn additional_info_size(&self) -> usize {
        self.additional_infos.iter().map(AdditionalInfo::size).sum()
    }

    #[inline(always)]
    pub fn additional_infos(&self) -> &[AdditionalInfo] {
        &self.additional_infos
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[inline(always)]
    pub const fn message_code(&self) -> MessageCode {
        self.message_code
    }

    pub fn set_message_code(&mut self, code: MessageCode) {
        self.message_code = code;
    }

    /// Medium the frame was created for, `Unknown` if none was given.
    #[inline(always)]
    pub const fn medium_type(&self) -> MediumType {
        self.medium_type
    }

    pub fn set_medium_type(&mut self, medium_type: MediumType) {
        self.medium_type = medium_type;
    }

    #[inline(always)]
    pub const fn control_field(&self) -> ControlField {
        self.control_field
    }

    pub fn set_control_field(&mut self, control_field: ControlField) {
        self.control_field = control_field;
    }

    #[inline(always)]
    pub const fn extended_control_field(&self) -> ExtendedControlField {
        self.extended_control_field
    }

    pub fn set_extended_control_field(&mut self, extended_control_field: ExtendedControlField) {
        self.extended_control_field = extended_control_field;
    }

    #[inline(always)]
    pub const fn source(&self) -> KnxAddress {
        self.source
    }

    pub fn set_source(&mut self, source: impl Into<KnxAddress>) {
        self.source = source.into();
    }

    #[inline(always)]
    pub const fn destination(&self) -> KnxAddress {
        self.destination
    }

    /// Set the destination. The extended control field is left untouched.
    pub fn set_destination(&mut self, destination: impl Into<KnxAddress>) {
        self.destination = destination.into();
    }

    #[inline(always)]
    pub const fn tpdu(&self) -> &Tpdu {
        &self.tpdu
    }

    pub fn set_tpdu(&mut self, tpdu: Tpdu) {
        self.tpdu = tpdu;
    }
}

/// Context of an unnumbered data TPDU carried to `destination`.
fn data_context(control_field: ControlField, destination: KnxAddress) -> DataContext {
    match destination.address_type() {
        AddressType::Individual => DataContext::Individual,
        AddressType::Group if destination.raw() != 0 => DataContext::Group,
        AddressType::Group => match control_field.broadcast() {
            BroadcastType::System => DataContext::SystemBroadcast,
            BroadcastType::Domain => DataContext::Broadcast,
        },
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`LinkLayerFrame`].
///
/// Without an explicit extended control field the destination address type
/// is taken from the destination.
#[derive(Debug, Clone, Default)]
pub struct LinkLayerFrameBuilder {
    message_code: Option<MessageCode>,
    medium_type: MediumType,
    additional_infos: Vec<AdditionalInfo, MAX_ADDITIONAL_INFOS>,
    control_field: ControlField,
    extended_control_field: Option<ExtendedControlField>,
    source: Option<KnxAddress>,
    destination: Option<KnxAddress>,
    tpdu: Option<Tpdu>,
    info_overflow: bool,
}

impl LinkLayerFrameBuilder {
    /// Defaults to `L_Data.req`.
    #[must_use]
    pub fn message_code(mut self, code: MessageCode) -> Self {
        self.message_code = Some(code);
        self
    }

    #[must_use]
    pub fn medium_type(mut self, medium_type: MediumType) -> Self {
        self.medium_type = medium_type;
        self
    }

    /// Queue a block; [`build`](Self::build) fails if it cannot be added.
    #[must_use]
    pub fn additional_info(mut self, info: AdditionalInfo) -> Self {
        if self.additional_infos.push(info).is_err() {
            self.info_overflow = true;
        }
        self
    }

    #[must_use]
    pub fn control_field(mut self, control_field: ControlField) -> Self {
        self.control_field = control_field;
        self
    }

    #[must_use]
    pub fn extended_control_field(mut self, extended_control_field: ExtendedControlField) -> Self {
        self.extended_control_field = Some(extended_control_field);
        self
    }

    #[must_use]
    pub fn source(mut self, source: impl Into<KnxAddress>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn destination(mut self, destination: impl Into<KnxAddress>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    #[must_use]
    pub fn tpdu(mut self, tpdu: Tpdu) -> Self {
        self.tpdu = Some(tpdu);
        self
    }

    /// Fails if no TPDU was given or an additional info block does not fit.
    pub fn build(self) -> Result<LinkLayerFrame> {
        let tpdu = self.tpdu.ok_or_else(KnxError::invalid_frame)?;
        if self.info_overflow {
            return Err(KnxError::invalid_additional_info());
        }
        let destination = self.destination.unwrap_or(KnxAddress::BROADCAST);
        let extended_control_field = self.extended_control_field.unwrap_or_else(|| {
            ExtendedControlField::builder()
                .destination_address_type(destination.address_type())
                .build()
        });

        let mut frame = LinkLayerFrame::new(
            self.medium_type,
            self.message_code.unwrap_or(MessageCode::DataReq),
        );
        frame.control_field = self.control_field;
        frame.extended_control_field = extended_control_field;
        frame.source = self.source.unwrap_or(frame.source);
        frame.destination = destination;
        frame.tpdu = tpdu;

        for info in self.additional_infos {
            if !frame.add_additional_info(info) {
                return Err(KnxError::invalid_additional_info());
            }
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::{GroupAddress, IndividualAddress};
    use crate::protocol::catalog::{broadcast, multicast, point_to_point_connection_oriented};
    use crate::protocol::tpdu::{ApplicationControlField, TransportControlField, MAX_DATA_SIZE};

    fn group_write_frame() -> LinkLayerFrame {
        LinkLayerFrame::builder()
            .message_code(MessageCode::DataReq)
            .source(IndividualAddress::new(1, 1, 10).unwrap())
            .destination(GroupAddress::new(1, 2, 3).unwrap())
            .tpdu(multicast::group_value_write(&[0x01]).unwrap())
            .build()
            .unwrap()
    }

    fn info(info_type: AdditionalInfoType, data: &[u8]) -> AdditionalInfo {
        AdditionalInfo::new(info_type, data).unwrap()
    }

    #[test]
    fn test_control_field_default() {
        let ctrl = ControlField::default();
        assert_eq!(ctrl.raw(), 0xBC);
        assert_eq!(ctrl.frame_format(), FrameFormat::Standard);
        assert!(!ctrl.repeat());
        assert_eq!(ctrl.broadcast(), BroadcastType::Domain);
        assert_eq!(ctrl.priority(), Priority::Low);
        assert!(!ctrl.acknowledge_request());
        assert!(!ctrl.confirm_error());
        assert_eq!(ControlField::builder().build(), ctrl);
    }

    #[test]
    fn test_control_field_builder() {
        let ctrl = ControlField::builder()
            .frame_format(FrameFormat::Extended)
            .repeat(true)
            .broadcast(BroadcastType::System)
            .priority(Priority::Normal)
            .acknowledge_request(true)
            .confirm_error(true)
            .build();
        assert_eq!(ctrl.raw(), 0x07);
        assert_eq!(ctrl.frame_format(), FrameFormat::Extended);
        assert!(ctrl.repeat());
        assert_eq!(ctrl.broadcast(), BroadcastType::System);
        assert_eq!(ctrl.priority(), Priority::Normal);
        assert!(ctrl.acknowledge_request());
        assert!(ctrl.confirm_error());
    }

    #[test]
    fn test_extended_control_field() {
        let ext = ExtendedControlField::default();
        assert_eq!(ext.raw(), 0xE0);
        assert_eq!(ext.destination_address_type(), AddressType::Group);
        assert_eq!(ext.hop_count(), 6);
        assert_eq!(ext.extended_frame_format(), 0);

        let ext = ExtendedControlField::builder()
            .destination_address_type(AddressType::Individual)
            .hop_count(5)
            .extended_frame_format(0x04)
            .build();
        assert_eq!(ext.raw(), 0x54);
        assert_eq!(ext.destination_address_type(), AddressType::Individual);
        assert_eq!(ext.hop_count(), 5);
    }

    #[test]
    fn test_encode_group_write() {
        let frame = group_write_frame();
        assert!(frame.is_valid());
        assert_eq!(frame.size(), 11);
        assert_eq!(
            frame.bytes().unwrap().as_slice(),
            &[0x11, 0x00, 0xBC, 0xE0, 0x11, 0x0A, 0x0A, 0x03, 0x01, 0x00, 0x81]
        );
    }

    #[test]
    fn test_decode_group_read() {
        let data = [0x29, 0x00, 0xBC, 0xE0, 0x12, 0x05, 0x2E, 0x07, 0x01, 0x00, 0x00];
        let frame = LinkLayerFrame::decode(MediumType::NetIp, &data).unwrap();
        assert_eq!(frame.message_code(), MessageCode::DataInd);
        assert_eq!(frame.source().individual().unwrap(), IndividualAddress::new(1, 2, 5).unwrap());
        assert_eq!(frame.destination().group().unwrap(), GroupAddress::new(5, 6, 7).unwrap());
        assert_eq!(frame.tpdu().transport_control_field(), TransportControlField::DataGroup);
        assert_eq!(frame.tpdu().application_control_field(), ApplicationControlField::GroupValueRead);
        assert!(frame.is_valid());
        assert_eq!(frame.bytes().unwrap().as_slice(), &data);
    }

    #[test]
    fn test_decode_resolves_data_context() {
        // broadcast address with domain broadcast bit
        let data = [0x29, 0x00, 0xBC, 0xE0, 0x11, 0x01, 0x00, 0x00, 0x01, 0x01, 0x00];
        let frame = LinkLayerFrame::decode(MediumType::NetIp, &data).unwrap();
        assert_eq!(frame.tpdu().transport_control_field(), TransportControlField::DataBroadcast);
        assert_eq!(
            frame.tpdu().application_control_field(),
            ApplicationControlField::IndividualAddressRead
        );

        // system broadcast
        let data = [0x29, 0x00, 0xAC, 0xE0, 0x11, 0x01, 0x00, 0x00, 0x01, 0x01, 0x00];
        let frame = LinkLayerFrame::decode(MediumType::NetIp, &data).unwrap();
        assert_eq!(
            frame.tpdu().transport_control_field(),
            TransportControlField::DataSystemBroadcast
        );

        // individual destination
        let data = [0x29, 0x00, 0xBC, 0x60, 0x11, 0x01, 0x11, 0x02, 0x01, 0x01, 0x00];
        let frame = LinkLayerFrame::decode(MediumType::NetIp, &data).unwrap();
        assert_eq!(frame.destination().address_type(), AddressType::Individual);
        assert_eq!(frame.tpdu().transport_control_field(), TransportControlField::DataIndividual);
    }

    #[test]
    fn test_decode_errors() {
        assert!(LinkLayerFrame::decode(MediumType::NetIp, &[0x29]).is_err());
        assert!(LinkLayerFrame::decode(MediumType::NetIp, &[0x00, 0x00]).is_err());
        // additional info longer than the frame
        assert!(LinkLayerFrame::decode(MediumType::NetIp, &[0x29, 0x04, 0x03, 0x01]).is_err());
        // length octet points past the end
        let data = [0x29, 0x00, 0xBC, 0xE0, 0x11, 0x01, 0x0A, 0x03, 0x05, 0x00, 0x80];
        assert!(LinkLayerFrame::decode(MediumType::NetIp, &data).is_err());
    }

    #[test]
    fn test_decode_additional_info() {
        let data = [
            0x2B, 0x07, 0x03, 0x01, 0x00, 0x04, 0x02, 0x12, 0x34, 0xBC, 0xE0, 0x11, 0x01, 0x0A,
            0x03, 0x01, 0x00, 0x80,
        ];
        let frame = LinkLayerFrame::decode(MediumType::NetIp, &data).unwrap();
        assert_eq!(frame.additional_infos().len(), 2);
        assert_eq!(frame.additional_info_size(), 7);
        assert_eq!(frame.additional_infos()[1].data(), &[0x12, 0x34]);
        assert_eq!(frame.bytes().unwrap().as_slice(), &data);
    }

    #[test]
    fn test_reserved_additional_info_length() {
        let data = [0x29, 0xFF, 0xBC, 0xE0, 0x11, 0x01, 0x0A, 0x03, 0x01, 0x00, 0x80];
        let frame = LinkLayerFrame::decode(MediumType::NetIp, &data).unwrap();
        assert_eq!(frame.additional_info_size(), 0);
        assert_eq!(frame.bytes().unwrap()[1], 0x00);
    }

    #[test]
    fn test_additional_info_sorted_insert() {
        let mut frame = group_write_frame();
        assert!(frame.add_additional_info(info(AdditionalInfoType::BiBatInformation, &[1, 2])));
        assert!(frame.add_additional_info(info(AdditionalInfoType::PlMediumInformation, &[3, 4])));
        assert!(frame.add_additional_info(info(AdditionalInfoType::ManufacturerSpecificData, &[5, 6, 7])));
        assert!(frame.add_additional_info(info(AdditionalInfoType::TimestampRelative, &[8, 9])));

        let types: Vec<AdditionalInfoType, 4> =
            frame.additional_infos().iter().map(AdditionalInfo::info_type).collect();
        assert_eq!(
            types.as_slice(),
            &[
                AdditionalInfoType::PlMediumInformation,
                AdditionalInfoType::TimestampRelative,
                AdditionalInfoType::BiBatInformation,
                AdditionalInfoType::ManufacturerSpecificData,
            ]
        );
        assert_eq!(frame.additional_info_size(), 4 + 4 + 4 + 5);

        let bytes = frame.bytes().unwrap();
        assert_eq!(bytes[1], 17);
        assert_eq!(&bytes[2..6], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(LinkLayerFrame::decode(MediumType::NetIp, &bytes).unwrap(), frame);
    }

    #[test]
    fn test_additional_info_same_type_goes_first() {
        let mut frame = group_write_frame();
        assert!(frame.add_additional_info(info(AdditionalInfoType::TimestampRelative, &[0, 1])));
        assert!(frame.add_additional_info(info(AdditionalInfoType::TimestampRelative, &[0, 2])));
        assert_eq!(frame.additional_infos()[0].data(), &[0, 2]);
        assert_eq!(frame.additional_infos()[1].data(), &[0, 1]);
    }

    #[test]
    fn test_additional_info_size_limit() {
        let mut frame = group_write_frame();
        let large = info(AdditionalInfoType::ManufacturerSpecificData, &[0; 250]);
        assert!(frame.add_additional_info(large));
        assert_eq!(frame.additional_info_size(), 252);

        let before = frame.clone();
        assert!(!frame.add_additional_info(info(AdditionalInfoType::BusmonitorStatusInfo, &[0])));
        assert_eq!(frame, before);

        assert!(frame.add_additional_info(info(AdditionalInfoType::RfFastAckInformation, &[])));
        assert_eq!(frame.additional_info_size(), 254);
    }

    #[test]
    fn test_additional_info_block_count_bound_by_size_only() {
        let mut frame = group_write_frame();
        for id in 0..9u8 {
            assert!(frame.add_additional_info(info(AdditionalInfoType::TimestampRelative, &[0, id])));
        }
        assert_eq!(frame.additional_infos().len(), 9);

        let mut frame = group_write_frame();
        for _ in 0..MAX_ADDITIONAL_INFOS {
            assert!(frame.add_additional_info(info(AdditionalInfoType::RfFastAckInformation, &[])));
        }
        assert_eq!(frame.additional_info_size(), MAX_ADDITIONAL_INFO_SIZE);
        assert!(!frame.add_additional_info(info(AdditionalInfoType::RfFastAckInformation, &[])));
    }

    #[test]
    fn test_builder_accepts_more_than_eight_blocks() {
        let mut builder = LinkLayerFrame::builder()
            .source(IndividualAddress::new(1, 1, 10).unwrap())
            .destination(GroupAddress::new(1, 2, 3).unwrap())
            .tpdu(multicast::group_value_write(&[0x01]).unwrap());
        for id in 0..9u8 {
            builder = builder.additional_info(info(AdditionalInfoType::BiBatInformation, &[id, 0]));
        }
        let frame = builder.build().unwrap();
        assert_eq!(frame.additional_infos().len(), 9);
        assert_eq!(frame.additional_info_size(), 36);
    }

    #[test]
    fn test_decode_nine_additional_info_blocks() {
        let mut data = vec![0x29, 36];
        for id in 0..9u8 {
            data.extend_from_slice(&[0x04, 0x02, 0x00, id]);
        }
        data.extend_from_slice(&[0xBC, 0xE0, 0x11, 0x0A, 0x0A, 0x03, 0x01, 0x00, 0x81]);

        let frame = LinkLayerFrame::decode(MediumType::NetIp, &data).unwrap();
        assert_eq!(frame.additional_infos().len(), 9);
        assert_eq!(frame.additional_info_size(), 36);
        assert!(frame.is_valid());
        assert_eq!(frame.bytes().unwrap().as_slice(), data.as_slice());
    }

    #[test]
    fn test_extended_frame_with_largest_tpdu() {
        let mut frame = group_write_frame();
        frame.set_control_field(ControlField::builder().frame_format(FrameFormat::Extended).build());
        frame.set_tpdu(
            Tpdu::new(
                TransportControlField::DataGroup,
                ApplicationControlField::GroupValueWrite,
                &[0x5A; MAX_DATA_SIZE],
            )
            .unwrap(),
        );
        assert_eq!(frame.tpdu().size(), MAX_TPDU_SIZE);
        assert!(frame.is_valid());

        let bytes = frame.bytes().unwrap();
        assert_eq!(bytes[8], 0xFF);
        assert_eq!(bytes.len(), 2 + 7 + MAX_TPDU_SIZE);
        let decoded = LinkLayerFrame::decode(MediumType::NetIp, &bytes).unwrap();
        assert_eq!(decoded, frame);
        assert!(decoded.is_valid());

        // one more data byte makes a 257 byte TPDU
        assert!(Tpdu::new(
            TransportControlField::DataGroup,
            ApplicationControlField::GroupValueWrite,
            &[0x5A; MAX_DATA_SIZE + 1],
        )
        .is_err());
        let mut tpdu = frame.tpdu().clone();
        assert!(tpdu.set_data(&[0x5A; MAX_DATA_SIZE + 1]).is_err());
    }

    #[test]
    fn test_remove_and_clear_additional_info() {
        let mut frame = group_write_frame();
        frame.remove_additional_info_type(AdditionalInfoType::BiBatInformation);
        assert_eq!(frame.additional_info_size(), 0);

        let first = info(AdditionalInfoType::BiBatInformation, &[1, 2]);
        let second = info(AdditionalInfoType::BiBatInformation, &[3, 4]);
        let other = info(AdditionalInfoType::TimestampRelative, &[5, 6]);
        assert!(frame.add_additional_info(first.clone()));
        assert!(frame.add_additional_info(second.clone()));
        assert!(frame.add_additional_info(other.clone()));

        frame.remove_additional_info(&first);
        assert_eq!(frame.additional_infos(), &[other.clone(), second]);

        frame.remove_additional_info_type(AdditionalInfoType::BiBatInformation);
        assert_eq!(frame.additional_infos(), &[other]);

        frame.clear_additional_info();
        assert!(frame.additional_infos().is_empty());
        assert_eq!(frame.bytes().unwrap()[1], 0x00);
    }

    #[test]
    fn test_message_code_validity() {
        let mut frame = group_write_frame();
        assert!(frame.is_message_code_valid());

        frame.set_message_code(MessageCode::DataConnectedReq);
        assert!(!frame.is_message_code_valid());
        assert!(!frame.is_valid());

        frame.set_message_code(MessageCode::PollDataReq);
        assert!(!frame.is_message_code_valid());

        frame.set_message_code(MessageCode::DataInd);
        frame.set_medium_type(MediumType::Tp);
        assert!(!frame.is_message_code_valid());
        assert!(!frame.is_valid());

        frame.set_medium_type(MediumType::NetIp);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_validity_address_types() {
        let mut frame = group_write_frame();
        frame.set_destination(IndividualAddress::new(1, 1, 2).unwrap());
        assert!(!frame.is_valid());

        frame.set_extended_control_field(
            ExtendedControlField::builder()
                .destination_address_type(AddressType::Individual)
                .build(),
        );
        assert!(frame.is_valid());

        frame.set_source(GroupAddress::new(1, 1, 1).unwrap());
        assert!(!frame.is_valid());

        frame.set_message_code(MessageCode::RawReq);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_validity_frame_length() {
        let mut frame = group_write_frame();
        frame.set_tpdu(multicast::group_value_write(&[0u8; 14]).unwrap());
        assert_eq!(frame.tpdu().data_size(), 15);
        assert!(frame.is_valid());

        frame.set_tpdu(multicast::group_value_write(&[0u8; 15]).unwrap());
        assert!(!frame.is_valid());

        frame.set_control_field(ControlField::builder().frame_format(FrameFormat::Extended).build());
        assert!(frame.is_valid());

        frame.set_control_field(
            ControlField::builder()
                .frame_format(FrameFormat::Extended)
                .priority(Priority::Normal)
                .build(),
        );
        assert!(!frame.is_valid());
    }

    #[test]
    fn test_validity_invalid_tpdu() {
        let mut frame = group_write_frame();
        frame.set_tpdu(Tpdu::default());
        assert!(!frame.is_valid());
        assert!(frame.bytes().is_err());
    }

    #[test]
    fn test_builder() {
        assert!(LinkLayerFrame::builder().build().is_err());

        let frame = LinkLayerFrame::builder()
            .destination(IndividualAddress::new(1, 1, 5).unwrap())
            .tpdu(point_to_point_connection_oriented::connect())
            .additional_info(info(AdditionalInfoType::BiBatInformation, &[1, 2]))
            .build()
            .unwrap();
        assert_eq!(frame.message_code(), MessageCode::DataReq);
        assert_eq!(frame.extended_control_field().destination_address_type(), AddressType::Individual);
        assert_eq!(frame.medium_type(), MediumType::Unknown);
        assert_eq!(frame.effective_medium_type(), MediumType::NetIp);
        assert!(frame.is_valid());

        let bytes = frame.bytes().unwrap();
        assert_eq!(&bytes[bytes.len() - 2..], &[0x00, 0x80]);

        let broadcast = LinkLayerFrame::builder()
            .tpdu(broadcast::individual_address_read())
            .build()
            .unwrap();
        assert_eq!(broadcast.destination(), KnxAddress::BROADCAST);
        assert!(broadcast.is_valid());
    }
}
