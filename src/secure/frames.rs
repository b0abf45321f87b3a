//! KNXnet/IP Secure service frames (0x0950..=0x0955).
//!
//! ```text
//! Client                                 Server
//!   |------- SESSION_REQUEST ----------->|   HPAI | client public key
//!   |<------ SESSION_RESPONSE -----------|   session id | server public key | MAC
//!   |------- SECURE_WRAPPER ------------>|   wraps SESSION_AUTHENTICATE
//!   |<------ SECURE_WRAPPER -------------|   wraps SESSION_STATUS
//!   |                                    |
//!   |<====== SECURE_WRAPPER ============>|   tunnelling, device management
//!   |                                    |
//!   |<------ TIMER_NOTIFY ---------------|   multicast, backbone key
//! ```
//!
//! Every MAC travels CTR encrypted. The handshake frames use sequence
//! number, serial number and message tag zero for that step.

use super::context::CryptoContext;
use super::engine::{CryptoEngine, Key, Mac, MAC_SIZE, SERIAL_NUMBER_SIZE};
use super::key::{KeyType, SecureKey, KEY_SIZE};
use crate::error::{KnxError, Result};
use crate::protocol::constants::ServiceType;
use crate::protocol::frame::{Frame, FrameHeader, Hpai, Payload};
use crate::protocol::services::expect_service;

/// Session id, sequence, serial number, tag and MAC around the encrypted frame.
pub const SECURE_WRAPPER_OVERHEAD: usize = 2 + 6 + SERIAL_NUMBER_SIZE + 2 + MAC_SIZE;

fn split_mac(bytes: &[u8]) -> Result<(&[u8], Mac)> {
    let split = bytes
        .len()
        .checked_sub(MAC_SIZE)
        .ok_or_else(KnxError::invalid_frame)?;
    let (body, mac) = bytes.split_at(split);
    let mut out = [0u8; MAC_SIZE];
    out.copy_from_slice(mac);
    Ok((body, out))
}

fn u48_from_be(bytes: &[u8; 6]) -> u64 {
    let mut wide = [0u8; 8];
    wide[2..].copy_from_slice(bytes);
    u64::from_be_bytes(wide)
}

fn u48_to_be(value: u64) -> [u8; 6] {
    let wide = value.to_be_bytes();
    [wide[2], wide[3], wide[4], wide[5], wide[6], wide[7]]
}

fn public_bytes(key: &SecureKey) -> Result<[u8; KEY_SIZE]> {
    if !key.is_public() {
        return Err(KnxError::key_type_mismatch());
    }
    Ok(key.bytes())
}

/// `client public key XOR server public key`, the data both handshake MACs cover.
fn handshake_data(client_public: &SecureKey, server_public: &SecureKey) -> Result<[u8; KEY_SIZE]> {
    let client = public_bytes(client_public)?;
    let server = public_bytes(server_public)?;
    let mut out = [0u8; KEY_SIZE];
    for (o, (c, s)) in out.iter_mut().zip(client.iter().zip(server)) {
        *o = c ^ s;
    }
    Ok(out)
}

// =============================================================================
// SECURE_WRAPPER
// =============================================================================

/// `SECURE_WRAPPER` (0x0950)
///
/// ```text
/// ┌────────────┬──────────┬────────────┬─────────┬─────────────────┬──────────┐
/// │ Session ID │ Sequence │ Serial No. │ Msg Tag │ Encrypted frame │ MAC (16) │
/// │ (2 bytes)  │ (6 bytes)│ (6 bytes)  │ (2)     │ (variable)      │          │
/// └────────────┴──────────┴────────────┴─────────┴─────────────────┴──────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SecureWrapper {
    pub session_id: u16,
    /// 48-bit sequence counter
    pub sequence_number: u64,
    pub serial_number: [u8; SERIAL_NUMBER_SIZE],
    pub message_tag: u16,
    encrypted_frame: Payload,
    /// CTR encrypted MAC
    pub mac: Mac,
}

impl SecureWrapper {
    pub fn new(
        session_id: u16,
        sequence_number: u64,
        serial_number: [u8; SERIAL_NUMBER_SIZE],
        message_tag: u16,
        encrypted_frame: &[u8],
        mac: Mac,
    ) -> Result<Self> {
        if encrypted_frame.is_empty() {
            return Err(KnxError::empty_input());
        }
        Ok(Self {
            session_id,
            sequence_number,
            serial_number,
            message_tag,
            encrypted_frame: Payload::from_slice(encrypted_frame)
                .map_err(|_| KnxError::payload_too_large())?,
            mac,
        })
    }

    #[inline(always)]
    pub fn encrypted_frame(&self) -> &[u8] {
        &self.encrypted_frame
    }

    pub fn from_frame(frame: &Frame) -> Result<Self> {
        expect_service(frame, ServiceType::SecureWrapper)?;
        let payload = frame.payload();
        if payload.len() <= SECURE_WRAPPER_OVERHEAD {
            return Err(KnxError::invalid_frame());
        }
        let (body, mac) = split_mac(payload)?;
        let (fixed, encrypted) = body.split_at(SECURE_WRAPPER_OVERHEAD - MAC_SIZE);
        let [s0, s1, seq @ .., t0, t1] = fixed else {
            return Err(KnxError::invalid_frame());
        };
        let (sequence, serial) = seq.split_at(6);

        let mut sequence_bytes = [0u8; 6];
        sequence_bytes.copy_from_slice(sequence);
        let mut serial_number = [0u8; SERIAL_NUMBER_SIZE];
        serial_number.copy_from_slice(serial);

        Self::new(
            u16::from_be_bytes([*s0, *s1]),
            u48_from_be(&sequence_bytes),
            serial_number,
            u16::from_be_bytes([*t0, *t1]),
            encrypted,
            mac,
        )
    }

    pub fn to_frame(&self) -> Result<Frame> {
        let mut payload = Payload::new();
        payload
            .extend_from_slice(&self.session_id.to_be_bytes())
            .and_then(|()| payload.extend_from_slice(&u48_to_be(self.sequence_number)))
            .and_then(|()| payload.extend_from_slice(&self.serial_number))
            .and_then(|()| payload.extend_from_slice(&self.message_tag.to_be_bytes()))
            .and_then(|()| payload.extend_from_slice(&self.encrypted_frame))
            .and_then(|()| payload.extend_from_slice(&self.mac))
            .map_err(|_| KnxError::payload_too_large())?;
        Frame::new(ServiceType::SecureWrapper, &payload)
    }

    /// Encrypt and authenticate `inner` into a wrapper frame.
    pub fn seal(
        ctx: &CryptoContext,
        key: &Key,
        session_id: u16,
        sequence_number: u64,
        serial_number: &[u8; SERIAL_NUMBER_SIZE],
        message_tag: u16,
        inner: &Frame,
    ) -> Result<Frame> {
        let plain = inner.bytes()?;
        let encrypted = CryptoEngine::encrypt_secure_wrapper_payload(
            ctx,
            key,
            inner,
            sequence_number,
            Some(serial_number),
            message_tag,
        )?;
        let total = SECURE_WRAPPER_OVERHEAD + encrypted.len();
        let header = FrameHeader::new(
            ServiceType::SecureWrapper,
            u16::try_from(total).map_err(|_| KnxError::payload_too_large())?,
        );
        let mac = CryptoEngine::compute_message_authentication_code(
            ctx,
            key,
            &header,
            session_id,
            &plain,
            sequence_number,
            Some(serial_number),
            message_tag,
        )?;
        let mac = CryptoEngine::encrypt_message_authentication_code(
            ctx,
            key,
            &mac,
            sequence_number,
            Some(serial_number),
            message_tag,
        );

        Self::new(
            session_id,
            sequence_number,
            *serial_number,
            message_tag,
            &encrypted,
            mac,
        )?
        .to_frame()
    }

    /// Decrypt a wrapper frame, check its MAC and decode the inner frame.
    pub fn open(ctx: &CryptoContext, key: &Key, frame: &Frame) -> Result<Frame> {
        let wrapper = Self::from_frame(frame)?;
        let serial = Some(&wrapper.serial_number);
        let plain = CryptoEngine::decrypt_secure_wrapper_payload(
            ctx,
            key,
            &wrapper.encrypted_frame,
            wrapper.sequence_number,
            serial,
            wrapper.message_tag,
        )?;
        let mac = CryptoEngine::decrypt_message_authentication_code(
            ctx,
            key,
            &wrapper.mac,
            wrapper.sequence_number,
            serial,
            wrapper.message_tag,
        );
        CryptoEngine::verify_message_authentication_code(
            ctx,
            key,
            frame.header(),
            wrapper.session_id,
            &plain,
            wrapper.sequence_number,
            serial,
            wrapper.message_tag,
            &mac,
        )?;
        Frame::decode(&plain, 0)
    }
}

// =============================================================================
// SESSION_REQUEST / SESSION_RESPONSE / SESSION_AUTHENTICATE
// =============================================================================

/// `SESSION_REQUEST` (0x0951)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionRequest {
    pub control_endpoint: Hpai,
    pub public_key: [u8; KEY_SIZE],
}

impl SessionRequest {
    pub const SIZE: usize = Hpai::SIZE + KEY_SIZE;

    pub fn new(control_endpoint: Hpai, client_public: &SecureKey) -> Result<Self> {
        Ok(Self {
            control_endpoint,
            public_key: public_bytes(client_public)?,
        })
    }

    pub fn public_key(&self) -> Result<SecureKey> {
        SecureKey::from_bytes(KeyType::Public, &self.public_key, 0)
    }

    pub fn to_frame(&self) -> Result<Frame> {
        let mut payload = [0u8; Self::SIZE];
        payload[..Hpai::SIZE].copy_from_slice(&self.control_endpoint.bytes());
        payload[Hpai::SIZE..].copy_from_slice(&self.public_key);
        Frame::new(ServiceType::SessionRequest, &payload)
    }

    pub fn from_frame(frame: &Frame) -> Result<Self> {
        expect_service(frame, ServiceType::SessionRequest)?;
        let payload = frame.payload();
        if payload.len() != Self::SIZE {
            return Err(KnxError::invalid_frame());
        }
        let (hpai, key) = payload.split_at(Hpai::SIZE);
        let mut public_key = [0u8; KEY_SIZE];
        public_key.copy_from_slice(key);
        Ok(Self {
            control_endpoint: Hpai::decode(hpai)?,
            public_key,
        })
    }
}

/// `SESSION_RESPONSE` (0x0952)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionResponse {
    pub session_id: u16,
    pub public_key: [u8; KEY_SIZE],
    /// CTR encrypted MAC
    pub mac: Mac,
}

impl SessionResponse {
    pub const SIZE: usize = 2 + KEY_SIZE + MAC_SIZE;

    const HEADER: FrameHeader = FrameHeader::new(ServiceType::SessionResponse, Self::SIZE as u16);

    /// Server side: answer a session request, authenticated with the device
    /// authentication code hash.
    pub fn new_authenticated(
        ctx: &CryptoContext,
        device_authentication_hash: &Key,
        session_id: u16,
        server_public: &SecureKey,
        client_public: &SecureKey,
    ) -> Result<Self> {
        let data = handshake_data(client_public, server_public)?;
        let mac = CryptoEngine::compute_message_authentication_code(
            ctx,
            device_authentication_hash,
            &Self::HEADER,
            session_id,
            &data,
            0,
            None,
            0,
        )?;
        Ok(Self {
            session_id,
            public_key: public_bytes(server_public)?,
            mac: CryptoEngine::encrypt_message_authentication_code(
                ctx,
                device_authentication_hash,
                &mac,
                0,
                None,
                0,
            ),
        })
    }

    /// Client side: check the server's MAC against our public key.
    pub fn verify(
        &self,
        ctx: &CryptoContext,
        device_authentication_hash: &Key,
        client_public: &SecureKey,
    ) -> Result<()> {
        let data = handshake_data(client_public, &self.public_key()?)?;
        let mac = CryptoEngine::decrypt_message_authentication_code(
            ctx,
            device_authentication_hash,
            &self.mac,
            0,
            None,
            0,
        );
        CryptoEngine::verify_message_authentication_code(
            ctx,
            device_authentication_hash,
            &Self::HEADER,
            self.session_id,
            &data,
            0,
            None,
            0,
            &mac,
        )
    }

    pub fn public_key(&self) -> Result<SecureKey> {
        SecureKey::from_bytes(KeyType::Public, &self.public_key, 0)
    }

    pub fn to_frame(&self) -> Result<Frame> {
        let mut payload = [0u8; Self::SIZE];
        payload[..2].copy_from_slice(&self.session_id.to_be_bytes());
        payload[2..2 + KEY_SIZE].copy_from_slice(&self.public_key);
        payload[2 + KEY_SIZE..].copy_from_slice(&self.mac);
        Frame::new(ServiceType::SessionResponse, &payload)
    }

    pub fn from_frame(frame: &Frame) -> Result<Self> {
        expect_service(frame, ServiceType::SessionResponse)?;
        let payload = frame.payload();
        if payload.len() != Self::SIZE {
            return Err(KnxError::invalid_frame());
        }
        let (body, mac) = split_mac(payload)?;
        let (id, key) = body.split_at(2);
        let mut public_key = [0u8; KEY_SIZE];
        public_key.copy_from_slice(key);
        Ok(Self {
            session_id: u16::from_be_bytes([id[0], id[1]]),
            public_key,
            mac,
        })
    }
}

/// `SESSION_AUTHENTICATE` (0x0953)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionAuthenticate {
    pub user_id: u8,
    /// CTR encrypted MAC
    pub mac: Mac,
}

impl SessionAuthenticate {
    pub const SIZE: usize = 2 + MAC_SIZE;

    /// Management user, always present on a secure device.
    pub const MANAGEMENT_USER: u8 = 0x01;

    const HEADER: FrameHeader = FrameHeader::new(ServiceType::SessionAuthenticate, Self::SIZE as u16);

    /// Client side: prove knowledge of the user password.
    pub fn new_authenticated(
        ctx: &CryptoContext,
        user_password_hash: &Key,
        user_id: u8,
        client_public: &SecureKey,
        server_public: &SecureKey,
    ) -> Result<Self> {
        let data = handshake_data(client_public, server_public)?;
        let mac = CryptoEngine::compute_message_authentication_code(
            ctx,
            user_password_hash,
            &Self::HEADER,
            u16::from(user_id),
            &data,
            0,
            None,
            0,
        )?;
        Ok(Self {
            user_id,
            mac: CryptoEngine::encrypt_message_authentication_code(
                ctx,
                user_password_hash,
                &mac,
                0,
                None,
                0,
            ),
        })
    }

    /// Server side: check the client's MAC.
    pub fn verify(
        &self,
        ctx: &CryptoContext,
        user_password_hash: &Key,
        client_public: &SecureKey,
        server_public: &SecureKey,
    ) -> Result<()> {
        let data = handshake_data(client_public, server_public)?;
        let mac = CryptoEngine::decrypt_message_authentication_code(
            ctx,
            user_password_hash,
            &self.mac,
            0,
            None,
            0,
        );
        CryptoEngine::verify_message_authentication_code(
            ctx,
            user_password_hash,
            &Self::HEADER,
            u16::from(self.user_id),
            &data,
            0,
            None,
            0,
            &mac,
        )
    }

    pub fn to_frame(&self) -> Result<Frame> {
        let mut payload = [0u8; Self::SIZE];
        payload[1] = self.user_id;
        payload[2..].copy_from_slice(&self.mac);
        Frame::new(ServiceType::SessionAuthenticate, &payload)
    }

    pub fn from_frame(frame: &Frame) -> Result<Self> {
        expect_service(frame, ServiceType::SessionAuthenticate)?;
        let payload = frame.payload();
        if payload.len() != Self::SIZE {
            return Err(KnxError::invalid_frame());
        }
        let (body, mac) = split_mac(payload)?;
        Ok(Self { user_id: body[1], mac })
    }
}

// =============================================================================
// SESSION_STATUS
// =============================================================================

/// Secure session status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SecureSessionStatus {
    AuthenticationSuccess = 0x00,
    AuthenticationFailed = 0x01,
    Unauthenticated = 0x02,
    Timeout = 0x03,
    KeepAlive = 0x04,
    Close = 0x05,
}

impl SecureSessionStatus {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::AuthenticationSuccess),
            0x01 => Some(Self::AuthenticationFailed),
            0x02 => Some(Self::Unauthenticated),
            0x03 => Some(Self::Timeout),
            0x04 => Some(Self::KeepAlive),
            0x05 => Some(Self::Close),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// `SESSION_STATUS` (0x0954)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionStatus {
    pub status: SecureSessionStatus,
}

impl SessionStatus {
    pub const SIZE: usize = 2;

    pub const fn new(status: SecureSessionStatus) -> Self {
        Self { status }
    }

    pub fn to_frame(&self) -> Result<Frame> {
        Frame::new(ServiceType::SessionStatus, &[self.status.to_u8(), 0x00])
    }

    pub fn from_frame(frame: &Frame) -> Result<Self> {
        expect_service(frame, ServiceType::SessionStatus)?;
        let [status, _reserved] = frame.payload() else {
            return Err(KnxError::invalid_frame());
        };
        let status = SecureSessionStatus::from_u8(*status).ok_or_else(KnxError::invalid_status)?;
        Ok(Self { status })
    }
}

// =============================================================================
// TIMER_NOTIFY
// =============================================================================

/// `TIMER_NOTIFY` (0x0955)
///
/// ```text
/// ┌─────────────┬────────────┬─────────┬──────────┐
/// │ Timer value │ Serial No. │ Msg Tag │ MAC (16) │
/// │ (6 bytes)   │ (6 bytes)  │ (2)     │          │
/// └─────────────┴────────────┴─────────┴──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerNotify {
    /// 48-bit timer value
    pub timer_value: u64,
    pub serial_number: [u8; SERIAL_NUMBER_SIZE],
    pub message_tag: u16,
    /// CTR encrypted MAC
    pub mac: Mac,
}

impl TimerNotify {
    pub const SIZE: usize = 6 + SERIAL_NUMBER_SIZE + 2 + MAC_SIZE;

    const HEADER: FrameHeader = FrameHeader::new(ServiceType::TimerNotify, Self::SIZE as u16);

    /// Timer notification authenticated with the backbone key.
    pub fn new_authenticated(
        ctx: &CryptoContext,
        backbone_key: &Key,
        timer_value: u64,
        serial_number: [u8; SERIAL_NUMBER_SIZE],
        message_tag: u16,
    ) -> Result<Self> {
        let mac = CryptoEngine::compute_message_authentication_code(
            ctx,
            backbone_key,
            &Self::HEADER,
            0,
            &[],
            timer_value,
            Some(&serial_number),
            message_tag,
        )?;
        Ok(Self {
            timer_value,
            serial_number,
            message_tag,
            mac: CryptoEngine::encrypt_message_authentication_code(
                ctx,
                backbone_key,
                &mac,
                timer_value,
                Some(&serial_number),
                message_tag,
            ),
        })
    }

    pub fn verify(&self, ctx: &CryptoContext, backbone_key: &Key) -> Result<()> {
        let serial = Some(&self.serial_number);
        let mac = CryptoEngine::decrypt_message_authentication_code(
            ctx,
            backbone_key,
            &self.mac,
            self.timer_value,
            serial,
            self.message_tag,
        );
        CryptoEngine::verify_message_authentication_code(
            ctx,
            backbone_key,
            &Self::HEADER,
            0,
            &[],
            self.timer_value,
            serial,
            self.message_tag,
            &mac,
        )
    }

    pub fn to_frame(&self) -> Result<Frame> {
        let mut payload = [0u8; Self::SIZE];
        payload[..6].copy_from_slice(&u48_to_be(self.timer_value));
        payload[6..12].copy_from_slice(&self.serial_number);
        payload[12..14].copy_from_slice(&self.message_tag.to_be_bytes());
        payload[14..].copy_from_slice(&self.mac);
        Frame::new(ServiceType::TimerNotify, &payload)
    }

    pub fn from_frame(frame: &Frame) -> Result<Self> {
        expect_service(frame, ServiceType::TimerNotify)?;
        let payload = frame.payload();
        if payload.len() != Self::SIZE {
            return Err(KnxError::invalid_frame());
        }
        let (body, mac) = split_mac(payload)?;
        let mut timer = [0u8; 6];
        timer.copy_from_slice(&body[..6]);
        let mut serial_number = [0u8; SERIAL_NUMBER_SIZE];
        serial_number.copy_from_slice(&body[6..12]);
        Ok(Self {
            timer_value: u48_from_be(&timer),
            serial_number,
            message_tag: u16::from_be_bytes([body[12], body[13]]),
            mac,
        })
    }
}
