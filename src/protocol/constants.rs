//! KNXnet/IP and cEMI protocol constants.

use crate::error::{KnxError, Result};

/// KNXnet/IP protocol version 1.0
pub const KNXNETIP_VERSION_10: u8 = 0x10;

/// Standard KNXnet/IP header length (6 bytes)
pub const HEADER_SIZE_10: u8 = 0x06;

/// Standard UDP port for KNXnet/IP communication
pub const KNXNETIP_DEFAULT_PORT: u16 = 3671;

/// Maximum size of an owned KNXnet/IP frame, header included.
///
/// Large enough for a secure wrapper around a tunnelling request that carries
/// an extended cEMI frame.
pub const MAX_FRAME_SIZE: usize = 1024;

/// Maximum payload behind the 6-byte header.
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_SIZE - HEADER_SIZE_10 as usize;

/// Maximum size of an encoded cEMI link-layer frame.
///
/// message code, additional info (length + 254 bytes), control fields,
/// addresses, length octet and a 256-byte TPDU.
pub const MAX_CEMI_SIZE: usize = 2 + 254 + 2 + 4 + 1 + 256;

// =============================================================================
// Service Type Identifiers
// =============================================================================

/// KNXnet/IP service type identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum ServiceType {
    // Core services (0x02xx)
    /// `SEARCH_REQUEST` - Device discovery request
    SearchRequest = 0x0201,
    /// `SEARCH_RESPONSE` - Device discovery response
    SearchResponse = 0x0202,
    /// `DESCRIPTION_REQUEST` - Device description request
    DescriptionRequest = 0x0203,
    /// `DESCRIPTION_RESPONSE` - Device description response
    DescriptionResponse = 0x0204,
    /// `CONNECT_REQUEST` - Connection request
    ConnectRequest = 0x0205,
    /// `CONNECT_RESPONSE` - Connection response
    ConnectResponse = 0x0206,
    /// `CONNECTIONSTATE_REQUEST` - Connection state request (heartbeat)
    ConnectionStateRequest = 0x0207,
    /// `CONNECTIONSTATE_RESPONSE` - Connection state response
    ConnectionStateResponse = 0x0208,
    /// `DISCONNECT_REQUEST` - Disconnect request
    DisconnectRequest = 0x0209,
    /// `DISCONNECT_RESPONSE` - Disconnect response
    DisconnectResponse = 0x020A,
    /// `SEARCH_REQUEST_EXTENDED` - Discovery with search parameters
    ExtendedSearchRequest = 0x020B,
    /// `SEARCH_RESPONSE_EXTENDED`
    ExtendedSearchResponse = 0x020C,

    // Device Management (0x03xx)
    /// `DEVICE_CONFIGURATION_REQUEST`
    DeviceConfigurationRequest = 0x0310,
    /// `DEVICE_CONFIGURATION_ACK`
    DeviceConfigurationAck = 0x0311,

    // Tunnelling (0x04xx)
    /// `TUNNELLING_REQUEST` - Tunnelling data request
    TunnellingRequest = 0x0420,
    /// `TUNNELLING_ACK` - Tunnelling acknowledgement
    TunnellingAck = 0x0421,

    // Routing (0x05xx)
    /// `ROUTING_INDICATION` - Routing indication (multicast)
    RoutingIndication = 0x0530,
    /// `ROUTING_LOST_MESSAGE` - Routing lost message indication
    RoutingLostMessage = 0x0531,
    /// `ROUTING_BUSY` - Routing busy indication
    RoutingBusy = 0x0532,

    // Remote diagnosis and configuration (0x07xx)
    /// `REMOTE_DIAGNOSTIC_REQUEST`
    RemoteDiagnosticRequest = 0x0740,
    /// `REMOTE_DIAGNOSTIC_RESPONSE`
    RemoteDiagnosticResponse = 0x0741,

    // Secure services (0x09xx)
    /// `SECURE_WRAPPER` - Encrypted and authenticated frame
    SecureWrapper = 0x0950,
    /// `SESSION_REQUEST` - Secure session request
    SessionRequest = 0x0951,
    /// `SESSION_RESPONSE` - Secure session response
    SessionResponse = 0x0952,
    /// `SESSION_AUTHENTICATE` - Secure session authentication
    SessionAuthenticate = 0x0953,
    /// `SESSION_STATUS` - Secure session status
    SessionStatus = 0x0954,
    /// `TIMER_NOTIFY` - Multicast timer synchronisation
    TimerNotify = 0x0955,
}

impl ServiceType {
    /// Convert a u16 to `ServiceType`
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0201 => Some(Self::SearchRequest),
            0x0202 => Some(Self::SearchResponse),
            0x0203 => Some(Self::DescriptionRequest),
            0x0204 => Some(Self::DescriptionResponse),
            0x0205 => Some(Self::ConnectRequest),
            0x0206 => Some(Self::ConnectResponse),
            0x0207 => Some(Self::ConnectionStateRequest),
            0x0208 => Some(Self::ConnectionStateResponse),
            0x0209 => Some(Self::DisconnectRequest),
            0x020A => Some(Self::DisconnectResponse),
            0x020B => Some(Self::ExtendedSearchRequest),
            0x020C => Some(Self::ExtendedSearchResponse),
            0x0310 => Some(Self::DeviceConfigurationRequest),
            0x0311 => Some(Self::DeviceConfigurationAck),
            0x0420 => Some(Self::TunnellingRequest),
            0x0421 => Some(Self::TunnellingAck),
            0x0530 => Some(Self::RoutingIndication),
            0x0531 => Some(Self::RoutingLostMessage),
            0x0532 => Some(Self::RoutingBusy),
            0x0740 => Some(Self::RemoteDiagnosticRequest),
            0x0741 => Some(Self::RemoteDiagnosticResponse),
            0x0950 => Some(Self::SecureWrapper),
            0x0951 => Some(Self::SessionRequest),
            0x0952 => Some(Self::SessionResponse),
            0x0953 => Some(Self::SessionAuthenticate),
            0x0954 => Some(Self::SessionStatus),
            0x0955 => Some(Self::TimerNotify),
            _ => None,
        }
    }

    /// Convert `ServiceType` to u16
    #[inline(always)]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// True for the KNXnet/IP Secure family (0x0950..=0x0955).
    #[inline(always)]
    pub const fn is_secure(self) -> bool {
        matches!(self.to_u16() & 0xFF00, 0x0900)
    }
}

// =============================================================================
// Host Protocol Codes
// =============================================================================

/// Transport of a host protocol address information block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum HostProtocol {
    /// IPv4 UDP
    Udp4 = 0x01,
    /// IPv4 TCP
    Tcp4 = 0x02,
}

impl HostProtocol {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Udp4),
            0x02 => Some(Self::Tcp4),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

// =============================================================================
// Status Codes
// =============================================================================

/// Status codes carried by connection headers and state responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Status {
    /// Operation successful
    NoError = 0x00,
    /// Unknown or inactive communication channel
    ConnectionId = 0x21,
    /// Connection type not supported
    ConnectionType = 0x22,
    /// Connection option not supported
    ConnectionOption = 0x23,
    /// No more connections available
    NoMoreConnections = 0x24,
    /// Error in the data connection
    DataConnection = 0x26,
    /// Error in the KNX subnetwork connection
    KnxConnection = 0x27,
    /// Requested tunnelling layer not supported
    TunnellingLayer = 0x29,
}

impl Status {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::NoError),
            0x21 => Some(Self::ConnectionId),
            0x22 => Some(Self::ConnectionType),
            0x23 => Some(Self::ConnectionOption),
            0x24 => Some(Self::NoMoreConnections),
            0x26 => Some(Self::DataConnection),
            0x27 => Some(Self::KnxConnection),
            0x29 => Some(Self::TunnellingLayer),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Status {
    type Error = KnxError;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value).ok_or_else(KnxError::invalid_status)
    }
}

// =============================================================================
// cEMI Message Codes
// =============================================================================

/// Communication medium a link-layer frame travels on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MediumType {
    /// Not known, inferred from the message code where possible
    #[default]
    Unknown,
    /// Twisted pair
    Tp,
    /// Powerline
    Pl,
    /// Radio frequency
    Rf,
    /// KNXnet/IP
    NetIp,
}

/// cEMI message codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MessageCode {
    /// `L_Raw.req` - Raw frame request
    RawReq = 0x10,
    /// `L_Data.req` - Data request
    DataReq = 0x11,
    /// `L_Poll_Data.req` - Poll data request
    PollDataReq = 0x13,
    /// `L_Poll_Data.con` - Poll data confirmation
    PollDataCon = 0x25,
    /// `L_Data.ind` - Data indication
    DataInd = 0x29,
    /// `L_Busmon.ind` - Bus monitor indication
    BusmonitorInd = 0x2B,
    /// `L_Raw.ind` - Raw frame indication
    RawInd = 0x2D,
    /// `L_Data.con` - Data confirmation
    DataCon = 0x2E,
    /// `L_Raw.con` - Raw frame confirmation
    RawCon = 0x2F,
    /// `T_Data_Connected.req`
    DataConnectedReq = 0x41,
    /// `T_Data_Individual.req`
    DataIndividualReq = 0x4A,
    /// `T_Data_Connected.ind`
    DataConnectedInd = 0x89,
    /// `T_Data_Individual.ind`
    DataIndividualInd = 0x94,
    /// `M_Reset.req`
    ResetReq = 0xF1,
}

impl MessageCode {
    /// Convert u8 to `MessageCode`
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x10 => Some(Self::RawReq),
            0x11 => Some(Self::DataReq),
            0x13 => Some(Self::PollDataReq),
            0x25 => Some(Self::PollDataCon),
            0x29 => Some(Self::DataInd),
            0x2B => Some(Self::BusmonitorInd),
            0x2D => Some(Self::RawInd),
            0x2E => Some(Self::DataCon),
            0x2F => Some(Self::RawCon),
            0x41 => Some(Self::DataConnectedReq),
            0x4A => Some(Self::DataIndividualReq),
            0x89 => Some(Self::DataConnectedInd),
            0x94 => Some(Self::DataIndividualInd),
            0xF1 => Some(Self::ResetReq),
            _ => None,
        }
    }

    /// Convert `MessageCode` to u8
    #[inline(always)]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Medium implied by the code when none was given explicitly.
    ///
    /// Data link layer and management codes are only exchanged over
    /// KNXnet/IP; transport layer codes do not pin a medium.
    pub const fn default_medium(self) -> MediumType {
        match self {
            Self::DataConnectedReq
            | Self::DataIndividualReq
            | Self::DataConnectedInd
            | Self::DataIndividualInd => MediumType::Unknown,
            _ => MediumType::NetIp,
        }
    }

    /// `L_Data` request, confirmation or indication.
    #[inline(always)]
    pub const fn is_data(self) -> bool {
        matches!(self, Self::DataReq | Self::DataCon | Self::DataInd)
    }
}

// =============================================================================
// KNX Priority
// =============================================================================

/// KNX message priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Priority {
    /// System priority
    System = 0b00,
    /// Normal priority
    Normal = 0b01,
    /// Urgent priority
    Urgent = 0b10,
    /// Low priority, the control field default
    #[default]
    Low = 0b11,
}

impl Priority {
    /// Convert the low two bits of `value` to a priority
    pub const fn from_u8(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Self::System,
            0b01 => Self::Normal,
            0b10 => Self::Urgent,
            _ => Self::Low,
        }
    }

    #[inline(always)]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}
