//! KNXnet/IP frame header and owned frames.
//!
//! ## Frame Structure
//!
//! ```text
//! ┌─────────────────────────────┐
//! │  Header (6 bytes)           │
//! │  - Header Length: 0x06      │
//! │  - Protocol Version: 0x10   │
//! │  - Service Type: 2 bytes    │
//! │  - Total Length: 2 bytes    │
//! ├─────────────────────────────┤
//! │  Payload (variable)         │
//! │  - Service-specific data    │
//! └─────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use knx_secure::protocol::frame::Frame;
//! use knx_secure::ServiceType;
//!
//! let frame = Frame::new(ServiceType::DescriptionRequest, &[])?;
//! assert_eq!(frame.bytes()?.as_slice(), &[0x06, 0x10, 0x02, 0x03, 0x00, 0x06]);
//!
//! let decoded = Frame::decode_expecting(&frame.bytes()?, 0, ServiceType::DescriptionRequest)?;
//! assert_eq!(decoded, frame);
//! # Ok::<(), knx_secure::KnxError>(())
//! ```

use crate::error::{KnxError, Result};
use crate::net::{Ipv4Addr, SocketAddrV4};
use crate::protocol::constants::{
    HostProtocol, ServiceType, HEADER_SIZE_10, KNXNETIP_DEFAULT_PORT, KNXNETIP_VERSION_10,
    MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE,
};
use heapless::Vec;

/// Owned buffer holding one encoded frame.
pub type FrameBuffer = Vec<u8, MAX_FRAME_SIZE>;

/// Owned frame payload.
pub type Payload = Vec<u8, MAX_PAYLOAD_SIZE>;

/// KNXnet/IP frame header (6 bytes)
///
/// ```text
/// ┌──────────────┬──────────────┬─────────────────────┐
/// │ Header Len   │ Protocol Ver │  Service Type ID    │
/// │   (1 byte)   │   (1 byte)   │     (2 bytes)       │
/// ├──────────────┴──────────────┴─────────────────────┤
/// │           Total Length (2 bytes)                   │
/// └────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameHeader {
    header_size: u8,
    protocol_version: u8,
    service_type: ServiceType,
    total_size: u16,
}

impl FrameHeader {
    /// Size of the header in bytes
    pub const SIZE: usize = 6;

    /// Header for a frame carrying `payload_size` bytes after the header.
    pub const fn new(service_type: ServiceType, payload_size: u16) -> Self {
        Self {
            header_size: HEADER_SIZE_10,
            protocol_version: KNXNETIP_VERSION_10,
            service_type,
            total_size: payload_size.saturating_add(Self::SIZE as u16),
        }
    }

    /// Decode a header starting at `offset`.
    ///
    /// # Errors
    ///
    /// - fewer than 6 bytes available at `offset`
    /// - header length byte is not 6
    /// - protocol version is not 1.0
    /// - service type is unknown
    pub fn decode(bytes: &[u8], offset: usize) -> Result<Self> {
        let Some([header_size, protocol_version, st_hi, st_lo, len_hi, len_lo]) = bytes
            .get(offset..)
            .and_then(|rest| rest.first_chunk::<6>())
        else {
            knx_log!(debug, "frame header truncated at offset {}", offset);
            return Err(KnxError::buffer_too_small());
        };

        if *header_size != HEADER_SIZE_10 {
            return Err(KnxError::invalid_frame());
        }
        if *protocol_version != KNXNETIP_VERSION_10 {
            return Err(KnxError::unsupported_version());
        }

        let raw_service = u16::from_be_bytes([*st_hi, *st_lo]);
        let service_type = ServiceType::from_u16(raw_service).ok_or_else(|| {
            knx_log!(debug, "unknown service type {:?}", raw_service);
            KnxError::unsupported_service_type()
        })?;

        Ok(Self {
            header_size: *header_size,
            protocol_version: *protocol_version,
            service_type,
            total_size: u16::from_be_bytes([*len_hi, *len_lo]),
        })
    }

    /// Encode the header into `buf`, returning the bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let out = buf
            .get_mut(..Self::SIZE)
            .ok_or_else(KnxError::buffer_too_small)?;
        out.copy_from_slice(&self.bytes());
        Ok(Self::SIZE)
    }

    /// Header in wire form.
    pub const fn bytes(&self) -> [u8; 6] {
        let st = self.service_type.to_u16().to_be_bytes();
        let len = self.total_size.to_be_bytes();
        [
            self.header_size,
            self.protocol_version,
            st[0],
            st[1],
            len[0],
            len[1],
        ]
    }

    /// Header length 6, version 1.0 and a total size that covers the header.
    pub const fn is_valid(&self) -> bool {
        self.header_size == HEADER_SIZE_10
            && self.protocol_version == KNXNETIP_VERSION_10
            && self.total_size >= Self::SIZE as u16
    }

    #[inline(always)]
    pub const fn header_size(&self) -> u8 {
        self.header_size
    }

    #[inline(always)]
    pub const fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    #[inline(always)]
    pub const fn service_type(&self) -> ServiceType {
        self.service_type
    }

    /// Header plus payload length as announced on the wire.
    #[inline(always)]
    pub const fn total_size(&self) -> u16 {
        self.total_size
    }

    /// Payload length implied by `total_size`.
    #[inline(always)]
    pub const fn payload_size(&self) -> u16 {
        self.total_size.saturating_sub(Self::SIZE as u16)
    }
}

/// Header plus owned payload.
///
/// Frames built through [`Frame::new`] always carry a consistent total size.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    header: FrameHeader,
    payload: Payload,
}

impl Frame {
    /// Build a frame around `payload`.
    pub fn new(service_type: ServiceType, payload: &[u8]) -> Result<Self> {
        let payload = Payload::from_slice(payload).map_err(|_| KnxError::payload_too_large())?;
        Ok(Self {
            header: FrameHeader::new(service_type, payload.len() as u16),
            payload,
        })
    }

    /// Decode a frame starting at `offset`.
    ///
    /// Only `total_size` bytes are consumed; trailing bytes are ignored.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<Self> {
        let header = FrameHeader::decode(bytes, offset)?;
        if !header.is_valid() {
            return Err(KnxError::invalid_frame());
        }

        let start = offset + FrameHeader::SIZE;
        let end = offset + usize::from(header.total_size());
        let payload = bytes.get(start..end).ok_or_else(|| {
            knx_log!(debug, "frame announces {} bytes, only {} present", end - offset, bytes.len() - offset);
            KnxError::invalid_frame()
        })?;

        Ok(Self {
            header,
            payload: Payload::from_slice(payload).map_err(|_| KnxError::payload_too_large())?,
        })
    }

    /// Like [`Frame::decode`] but fails unless the service type is `expected`.
    pub fn decode_expecting(bytes: &[u8], offset: usize, expected: ServiceType) -> Result<Self> {
        let frame = Self::decode(bytes, offset)?;
        if frame.service_type() != expected {
            return Err(KnxError::unexpected_service_type());
        }
        Ok(frame)
    }

    pub fn is_valid(&self) -> bool {
        self.header.is_valid()
            && usize::from(self.header.total_size()) == FrameHeader::SIZE + self.payload.len()
    }

    /// Encode into `buf`, returning the bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let size = self.size();
        if buf.len() < size {
            return Err(KnxError::buffer_too_small());
        }
        self.header.encode(buf)?;
        buf[FrameHeader::SIZE..size].copy_from_slice(&self.payload);
        Ok(size)
    }

    /// Header followed by payload.
    pub fn bytes(&self) -> Result<FrameBuffer> {
        let mut out = FrameBuffer::new();
        out.extend_from_slice(&self.header.bytes())
            .and_then(|()| out.extend_from_slice(&self.payload))
            .map_err(|_| KnxError::capacity_exceeded())?;
        Ok(out)
    }

    #[inline(always)]
    pub const fn header(&self) -> &FrameHeader {
        &self.header
    }

    #[inline(always)]
    pub const fn service_type(&self) -> ServiceType {
        self.header.service_type()
    }

    #[inline(always)]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Encoded size in bytes.
    #[inline(always)]
    pub fn size(&self) -> usize {
        FrameHeader::SIZE + self.payload.len()
    }
}

/// Host Protocol Address Information (HPAI)
///
/// ```text
/// ┌──────────────┬──────────────┬─────────────────────┐
/// │ Structure Len│ Host Protocol│   IP Address        │
/// │   (1 byte)   │   (1 byte)   │   (4 bytes IPv4)    │
/// ├──────────────┴──────────────┴─────────────────────┤
/// │                Port (2 bytes)                      │
/// └────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hpai {
    pub host_protocol: HostProtocol,
    pub endpoint: SocketAddrV4,
}

impl Hpai {
    /// Size of HPAI structure for IPv4
    pub const SIZE: usize = 8;

    /// Route-back endpoint (0.0.0.0:0) used behind NAT.
    pub const NAT: Self = Self::udp(Ipv4Addr::UNSPECIFIED, 0);

    /// UDP endpoint.
    pub const fn udp(ip: Ipv4Addr, port: u16) -> Self {
        Self {
            host_protocol: HostProtocol::Udp4,
            endpoint: SocketAddrV4::new(ip, port),
        }
    }

    /// TCP endpoint.
    pub const fn tcp(ip: Ipv4Addr, port: u16) -> Self {
        Self {
            host_protocol: HostProtocol::Tcp4,
            endpoint: SocketAddrV4::new(ip, port),
        }
    }

    /// UDP endpoint on the default KNXnet/IP port.
    pub const fn default_port(ip: Ipv4Addr) -> Self {
        Self::udp(ip, KNXNETIP_DEFAULT_PORT)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let Some([len, protocol, a, b, c, d, port_hi, port_lo]) = data.first_chunk::<8>() else {
            return Err(KnxError::buffer_too_small());
        };
        if usize::from(*len) != Self::SIZE {
            return Err(KnxError::invalid_frame());
        }
        let host_protocol = HostProtocol::from_u8(*protocol).ok_or_else(KnxError::invalid_frame)?;

        Ok(Self {
            host_protocol,
            endpoint: SocketAddrV4::new(
                Ipv4Addr::new(*a, *b, *c, *d),
                u16::from_be_bytes([*port_hi, *port_lo]),
            ),
        })
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let out = buf
            .get_mut(..Self::SIZE)
            .ok_or_else(KnxError::buffer_too_small)?;
        out.copy_from_slice(&self.bytes());
        Ok(Self::SIZE)
    }

    pub const fn bytes(&self) -> [u8; 8] {
        let [a, b, c, d] = self.endpoint.ip.octets();
        let [hi, lo] = self.endpoint.port.to_be_bytes();
        [Self::SIZE as u8, self.host_protocol.to_u8(), a, b, c, d, hi, lo]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_decode() {
        let data = [0xFF, 0x06, 0x10, 0x02, 0x01, 0x00, 0x0E];

        let header = FrameHeader::decode(&data, 1).unwrap();
        assert_eq!(header.header_size(), 0x06);
        assert_eq!(header.protocol_version(), 0x10);
        assert_eq!(header.service_type(), ServiceType::SearchRequest);
        assert_eq!(header.total_size(), 14);
        assert_eq!(header.payload_size(), 8);
        assert!(header.is_valid());
    }

    #[test]
    fn test_header_decode_errors() {
        assert!(FrameHeader::decode(&[0x06, 0x10, 0x02], 0).is_err());
        assert!(FrameHeader::decode(&[0x06, 0x10, 0x02, 0x01, 0x00, 0x06], 1).is_err());

        match FrameHeader::decode(&[0x07, 0x10, 0x02, 0x01, 0x00, 0x06], 0) {
            Err(KnxError::Protocol(e)) => assert!(e.is_invalid_frame()),
            other => panic!("unexpected {other:?}"),
        }
        match FrameHeader::decode(&[0x06, 0x20, 0x02, 0x01, 0x00, 0x06], 0) {
            Err(KnxError::Protocol(e)) => assert!(e.is_unsupported_version()),
            other => panic!("unexpected {other:?}"),
        }
        match FrameHeader::decode(&[0x06, 0x10, 0xAB, 0xCD, 0x00, 0x06], 0) {
            Err(KnxError::Protocol(e)) => assert!(e.is_unsupported_service_type()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_header_short_total_size_is_invalid() {
        let header = FrameHeader::decode(&[0x06, 0x10, 0x02, 0x01, 0x00, 0x04], 0).unwrap();
        assert!(!header.is_valid());
        assert_eq!(header.payload_size(), 0);
    }

    #[test]
    fn test_header_encode() {
        let header = FrameHeader::new(ServiceType::SearchRequest, 8);
        let mut buf = [0u8; 6];
        assert_eq!(header.encode(&mut buf).unwrap(), 6);
        assert_eq!(buf, [0x06, 0x10, 0x02, 0x01, 0x00, 0x0E]);

        assert!(header.encode(&mut [0u8; 5]).is_err());
    }

    #[test]
    fn test_frame_decode() {
        let data = [0x06, 0x10, 0x02, 0x01, 0x00, 0x0A, 0x01, 0x02, 0x03, 0x04, 0xEE];

        let frame = Frame::decode(&data, 0).unwrap();
        assert_eq!(frame.service_type(), ServiceType::SearchRequest);
        assert_eq!(frame.payload(), &[0x01, 0x02, 0x03, 0x04]);
        assert!(frame.is_valid());
        assert_eq!(frame.size(), 10);
    }

    #[test]
    fn test_frame_decode_truncated() {
        let data = [0x06, 0x10, 0x02, 0x01, 0x00, 0x0A, 0x01, 0x02];
        assert!(Frame::decode(&data, 0).is_err());
    }

    #[test]
    fn test_frame_decode_expecting() {
        let frame = Frame::new(ServiceType::ConnectionStateResponse, &[0x01, 0x00]).unwrap();
        let bytes = frame.bytes().unwrap();

        assert!(Frame::decode_expecting(&bytes, 0, ServiceType::ConnectionStateResponse).is_ok());
        match Frame::decode_expecting(&bytes, 0, ServiceType::ConnectionStateRequest) {
            Err(KnxError::Protocol(e)) => assert!(e.is_unexpected_service_type()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_frame_encode() {
        let frame = Frame::new(ServiceType::SearchRequest, &[0x01, 0x02, 0x03, 0x04]).unwrap();

        let mut buf = [0u8; 32];
        let size = frame.encode(&mut buf).unwrap();
        assert_eq!(size, 10);
        assert_eq!(&buf[..size], frame.bytes().unwrap().as_slice());
        assert_eq!(buf[4..6], [0x00, 0x0A]);

        assert!(frame.encode(&mut [0u8; 9]).is_err());
    }

    #[test]
    fn test_frame_payload_too_large() {
        let payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        assert!(Frame::new(ServiceType::TunnellingRequest, &payload).is_err());
    }

    #[test]
    fn test_hpai() {
        let hpai = Hpai::udp(Ipv4Addr::new(192, 168, 1, 100), 3671);
        assert_eq!(hpai.bytes(), [0x08, 0x01, 192, 168, 1, 100, 0x0E, 0x57]);
        assert_eq!(Hpai::decode(&hpai.bytes()).unwrap(), hpai);

        let tcp = Hpai::tcp(Ipv4Addr::LOCALHOST, 1);
        assert_eq!(tcp.bytes()[1], 0x02);
    }

    #[test]
    fn test_hpai_decode_errors() {
        assert!(Hpai::decode(&[0x08, 0x01, 0, 0, 0, 0, 0]).is_err());
        assert!(Hpai::decode(&[0x07, 0x01, 0, 0, 0, 0, 0, 0]).is_err());
        assert!(Hpai::decode(&[0x08, 0x03, 0, 0, 0, 0, 0, 0]).is_err());
    }
}
