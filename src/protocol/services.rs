//! KNXnet/IP service views.
//!
//! Each service is a plain value that builds its [`Frame`] with `to_frame` and
//! is read back from a received frame with `from_frame`. Decoding checks the
//! service type and the structure lengths; semantic checks are left to the
//! per-service `is_valid`.
//!
//! ## Example
//!
//! ```
//! use knx_secure::net::Ipv4Addr;
//! use knx_secure::protocol::frame::Hpai;
//! use knx_secure::protocol::services::DescriptionRequest;
//!
//! let request = DescriptionRequest::new(Some(Hpai::default_port(Ipv4Addr::LOCALHOST)));
//! let frame = request.to_frame()?;
//! assert_eq!(
//!     frame.bytes()?.as_slice(),
//!     &[0x06, 0x10, 0x02, 0x03, 0x00, 0x0E, 0x08, 0x01, 0x7F, 0x00, 0x00, 0x01, 0x0E, 0x57]
//! );
//! assert_eq!(DescriptionRequest::from_frame(&frame)?, request);
//! # Ok::<(), knx_secure::KnxError>(())
//! ```
//!
//! ## Protocol Flow
//!
//! ```text
//! Client                          Gateway
//!   |                                |
//!   |------- SEARCH_REQUEST -------->|
//!   |------ DESCRIPTION_REQUEST ---->|
//!   |                                |
//!   |----- TUNNELLING_REQUEST ------>|
//!   |<----- TUNNELLING_ACK ----------|
//!   |                                |
//!   |--- CONNECTIONSTATE_REQUEST --->|
//!   |<-- CONNECTIONSTATE_RESPONSE ---|
//! ```

use crate::error::{KnxError, Result};
use crate::protocol::cemi::LinkLayerFrame;
use crate::protocol::constants::{HostProtocol, MediumType, ServiceType, Status, MAX_PAYLOAD_SIZE};
use crate::protocol::frame::{Frame, FrameHeader, Hpai, Payload};

pub(crate) fn expect_service(frame: &Frame, expected: ServiceType) -> Result<()> {
    if frame.service_type() != expected {
        return Err(KnxError::unexpected_service_type());
    }
    Ok(())
}

/// Decode an optional HPAI that must fill the whole payload.
fn optional_hpai(payload: &[u8]) -> Result<Option<Hpai>> {
    match payload.len() {
        0 => Ok(None),
        Hpai::SIZE => Hpai::decode(payload).map(Some),
        _ => Err(KnxError::invalid_frame()),
    }
}

// =============================================================================
// Connection Header
// =============================================================================

/// Connection header of tunnelling and device management services.
///
/// ```text
/// ┌──────────┬────────────┬────────────┬─────────────────┐
/// │ Length 4 │ Channel ID │ Sequence   │ Status/Reserved │
/// └──────────┴────────────┴────────────┴─────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionHeader {
    pub channel_id: u8,
    pub sequence_number: u8,
    /// Status on acknowledgements, reserved (zero) on requests
    pub status: u8,
}

impl ConnectionHeader {
    pub const SIZE: usize = 4;

    pub const fn new(channel_id: u8, sequence_number: u8) -> Self {
        Self {
            channel_id,
            sequence_number,
            status: 0,
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let Some([len, channel_id, sequence_number, status]) = data.first_chunk::<4>() else {
            return Err(KnxError::buffer_too_small());
        };
        if usize::from(*len) != Self::SIZE {
            return Err(KnxError::invalid_frame());
        }
        Ok(Self {
            channel_id: *channel_id,
            sequence_number: *sequence_number,
            status: *status,
        })
    }

    pub const fn bytes(&self) -> [u8; 4] {
        [Self::SIZE as u8, self.channel_id, self.sequence_number, self.status]
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// `DESCRIPTION_REQUEST` (0x0203)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DescriptionRequest {
    pub control_endpoint: Option<Hpai>,
}

impl DescriptionRequest {
    pub const fn new(control_endpoint: Option<Hpai>) -> Self {
        Self { control_endpoint }
    }

    /// Header-only frame when there is no endpoint.
    pub fn to_frame(&self) -> Result<Frame> {
        match &self.control_endpoint {
            Some(hpai) => Frame::new(ServiceType::DescriptionRequest, &hpai.bytes()),
            None => Frame::new(ServiceType::DescriptionRequest, &[]),
        }
    }

    pub fn from_frame(frame: &Frame) -> Result<Self> {
        expect_service(frame, ServiceType::DescriptionRequest)?;
        Ok(Self {
            control_endpoint: optional_hpai(frame.payload())?,
        })
    }

    pub const fn is_valid(&self) -> bool {
        self.control_endpoint.is_some()
    }
}

/// `SEARCH_REQUEST` (0x0201)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SearchRequest {
    pub discovery_endpoint: Option<Hpai>,
}

impl SearchRequest {
    pub const fn new(discovery_endpoint: Option<Hpai>) -> Self {
        Self { discovery_endpoint }
    }

    pub fn to_frame(&self) -> Result<Frame> {
        match &self.discovery_endpoint {
            Some(hpai) => Frame::new(ServiceType::SearchRequest, &hpai.bytes()),
            None => Frame::new(ServiceType::SearchRequest, &[]),
        }
    }

    pub fn from_frame(frame: &Frame) -> Result<Self> {
        expect_service(frame, ServiceType::SearchRequest)?;
        Ok(Self {
            discovery_endpoint: optional_hpai(frame.payload())?,
        })
    }

    /// Discovery runs over UDP multicast only.
    pub fn is_valid(&self) -> bool {
        matches!(
            self.discovery_endpoint,
            Some(Hpai {
                host_protocol: HostProtocol::Udp4,
                ..
            })
        )
    }
}

// =============================================================================
// Connection State
// =============================================================================

/// `CONNECTIONSTATE_REQUEST` (0x0207)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionStateRequest {
    pub channel_id: u8,
    pub control_endpoint: Hpai,
}

impl ConnectionStateRequest {
    /// Encoded frame size.
    pub const SIZE: usize = 16;

    pub const fn new(channel_id: u8, control_endpoint: Hpai) -> Self {
        Self {
            channel_id,
            control_endpoint,
        }
    }

    pub fn to_frame(&self) -> Result<Frame> {
        let mut payload = [0u8; 2 + Hpai::SIZE];
        payload[0] = self.channel_id;
        // payload[1] reserved
        self.control_endpoint.encode(&mut payload[2..])?;
        Frame::new(ServiceType::ConnectionStateRequest, &payload)
    }

    pub fn from_frame(frame: &Frame) -> Result<Self> {
        expect_service(frame, ServiceType::ConnectionStateRequest)?;
        if frame.size() != Self::SIZE {
            return Err(KnxError::invalid_frame());
        }
        let [channel_id, _reserved, hpai @ ..] = frame.payload() else {
            return Err(KnxError::buffer_too_small());
        };
        Ok(Self {
            channel_id: *channel_id,
            control_endpoint: Hpai::decode(hpai)?,
        })
    }
}

/// `CONNECTIONSTATE_RESPONSE` (0x0208)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionStateResponse {
    pub channel_id: u8,
    pub status: Status,
}

impl ConnectionStateResponse {
    /// Encoded frame size.
    pub const SIZE: usize = 8;

    pub const fn new(channel_id: u8, status: Status) -> Self {
        Self { channel_id, status }
    }

    pub fn to_frame(&self) -> Result<Frame> {
        Frame::new(
            ServiceType::ConnectionStateResponse,
            &[self.channel_id, self.status.to_u8()],
        )
    }

    pub fn from_frame(frame: &Frame) -> Result<Self> {
        expect_service(frame, ServiceType::ConnectionStateResponse)?;
        let [channel_id, status] = frame.payload() else {
            return Err(KnxError::invalid_frame());
        };
        Ok(Self {
            channel_id: *channel_id,
            status: Status::try_from(*status)?,
        })
    }
}

// =============================================================================
// Device Management
// =============================================================================

/// `DEVICE_CONFIGURATION_REQUEST` (0x0310)
///
/// The cEMI management message is carried as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfigurationRequest {
    pub channel_id: u8,
    pub sequence_number: u8,
    cemi: Payload,
}

impl DeviceConfigurationRequest {
    /// Smallest valid frame: header, connection header and a two byte cEMI.
    pub const MIN_SIZE: usize = 12;

    pub fn new(channel_id: u8, sequence_number: u8, cemi: &[u8]) -> Result<Self> {
        let cemi = Payload::from_slice(cemi).map_err(|_| KnxError::payload_too_large())?;
        Ok(Self {
            channel_id,
            sequence_number,
            cemi,
        })
    }

    #[inline(always)]
    pub fn cemi(&self) -> &[u8] {
        &self.cemi
    }

    pub fn to_frame(&self) -> Result<Frame> {
        let header = ConnectionHeader::new(self.channel_id, self.sequence_number);
        let mut payload = Payload::new();
        payload
            .extend_from_slice(&header.bytes())
            .and_then(|()| payload.extend_from_slice(&self.cemi))
            .map_err(|_| KnxError::payload_too_large())?;
        Frame::new(ServiceType::DeviceConfigurationRequest, &payload)
    }

    pub fn from_frame(frame: &Frame) -> Result<Self> {
        expect_service(frame, ServiceType::DeviceConfigurationRequest)?;
        let header = ConnectionHeader::decode(frame.payload())?;
        Self::new(
            header.channel_id,
            header.sequence_number,
            &frame.payload()[ConnectionHeader::SIZE..],
        )
    }

    /// A cEMI message code and additional info length at least.
    pub fn is_valid(&self) -> bool {
        FrameHeader::SIZE + ConnectionHeader::SIZE + self.cemi.len() >= Self::MIN_SIZE
    }
}

/// `DEVICE_CONFIGURATION_ACK` (0x0311)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfigurationAck {
    pub channel_id: u8,
    pub sequence_number: u8,
    pub status: Status,
}

impl DeviceConfigurationAck {
    pub const fn new(channel_id: u8, sequence_number: u8, status: Status) -> Self {
        Self {
            channel_id,
            sequence_number,
            status,
        }
    }

    pub fn to_frame(&self) -> Result<Frame> {
        let header = ConnectionHeader {
            channel_id: self.channel_id,
            sequence_number: self.sequence_number,
            status: self.status.to_u8(),
        };
        Frame::new(ServiceType::DeviceConfigurationAck, &header.bytes())
    }

    pub fn from_frame(frame: &Frame) -> Result<Self> {
        expect_service(frame, ServiceType::DeviceConfigurationAck)?;
        if frame.payload().len() != ConnectionHeader::SIZE {
            return Err(KnxError::invalid_frame());
        }
        let header = ConnectionHeader::decode(frame.payload())?;
        Ok(Self {
            channel_id: header.channel_id,
            sequence_number: header.sequence_number,
            status: Status::try_from(header.status)?,
        })
    }
}

// =============================================================================
// Tunnelling
// =============================================================================

/// `TUNNELLING_REQUEST` (0x0420)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TunnellingRequest {
    pub connection_header: ConnectionHeader,
    pub cemi: LinkLayerFrame,
}

impl TunnellingRequest {
    pub const fn new(connection_header: ConnectionHeader, cemi: LinkLayerFrame) -> Self {
        Self {
            connection_header,
            cemi,
        }
    }

    pub fn to_frame(&self) -> Result<Frame> {
        let mut payload = [0u8; MAX_PAYLOAD_SIZE];
        payload[..ConnectionHeader::SIZE].copy_from_slice(&self.connection_header.bytes());
        let len = self.cemi.encode(&mut payload[ConnectionHeader::SIZE..])?;
        Frame::new(ServiceType::TunnellingRequest, &payload[..ConnectionHeader::SIZE + len])
    }

    /// The cEMI frame is decoded as a KNXnet/IP frame.
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        expect_service(frame, ServiceType::TunnellingRequest)?;
        let connection_header = ConnectionHeader::decode(frame.payload())?;
        let cemi = LinkLayerFrame::decode(
            MediumType::NetIp,
            &frame.payload()[ConnectionHeader::SIZE..],
        )?;
        Ok(Self {
            connection_header,
            cemi,
        })
    }
}

/// `TUNNELLING_ACK` (0x0421)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TunnellingAck {
    pub channel_id: u8,
    pub sequence_number: u8,
    pub status: Status,
}

impl TunnellingAck {
    pub const fn new(channel_id: u8, sequence_number: u8, status: Status) -> Self {
        Self {
            channel_id,
            sequence_number,
            status,
        }
    }

    pub fn to_frame(&self) -> Result<Frame> {
        let header = ConnectionHeader {
            channel_id: self.channel_id,
            sequence_number: self.sequence_number,
            status: self.status.to_u8(),
        };
        Frame::new(ServiceType::TunnellingAck, &header.bytes())
    }

    pub fn from_frame(frame: &Frame) -> Result<Self> {
        expect_service(frame, ServiceType::TunnellingAck)?;
        let header = ConnectionHeader::decode(frame.payload())?;
        Ok(Self {
            channel_id: header.channel_id,
            sequence_number: header.sequence_number,
            status: Status::try_from(header.status)?,
        })
    }

    #[inline(always)]
    pub fn is_ok(&self) -> bool {
        self.status == Status::NoError
    }
}
