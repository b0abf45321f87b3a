//! KNXnet/IP Secure crypto engine.
//!
//! Session keys, password hashes and the CCM flavoured authenticated
//! encryption used by the secure service family.
//!
//! ## MAC input
//!
//! ```text
//! B0  = sequence (6) | serial (6) | tag (2) | length field (2)
//!
//! SECURE_WRAPPER              B0(len = payload) | len(A) | A=header|id | payload
//! SESSION_RESPONSE/AUTH       B0(len = 0)       | len(A)+len(payload) | A=header|id | payload
//! TIMER_NOTIFY                B0(len = 0)       | len(A) | A=header
//! ```
//!
//! The concatenation is zero padded to a multiple of 16 (aligned input gets
//! no padding) and run through AES-128-CBC with a zero IV; the last cipher
//! block is the MAC.
//!
//! ## Counter blocks
//!
//! ```text
//! Ctr0 = sequence (6) | serial (6) | tag (2) | 0xFF 0x00
//! ```
//!
//! Keystream block `n` (starting at 1) is `AES(Ctr0)` after `n` increments
//! of the last byte, which wraps without carrying into byte 14. The MAC is
//! XORed with block 1, payload block `n` with block `n`.

use super::context::CryptoContext;
use super::key::SecureKey;
use crate::error::{KnxError, Result};
use crate::protocol::constants::ServiceType;
use crate::protocol::frame::{Frame, FrameBuffer, FrameHeader};
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// AES block and key length.
pub const BLOCK_SIZE: usize = 16;

/// Length of a KNXnet/IP Secure message authentication code.
pub const MAC_SIZE: usize = 16;

/// Length of a KNX serial number.
pub const SERIAL_NUMBER_SIZE: usize = 6;

/// AES-128 key derived from the X25519 shared secret.
pub type SessionKey = [u8; BLOCK_SIZE];

/// Message authentication code.
pub type Mac = [u8; MAC_SIZE];

/// Key material accepted by the MAC and CTR operations.
pub type Key = [u8; BLOCK_SIZE];

const USER_PASSWORD_SALT: &[u8] = b"user-password.1.secure.ip.knx.org";
const DEVICE_AUTHENTICATION_SALT: &[u8] = b"device-authentication-code.1.secure.ip.knx.org";
const PBKDF2_ROUNDS: u32 = 65_536;

/// Length field value that turns a B0 layout into `Ctr0`.
const CTR0_MARKER: u16 = 0xFF00;

/// Stateless KNXnet/IP Secure operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct CryptoEngine;

impl CryptoEngine {
    /// First 16 bytes of SHA-256 over the shared secret.
    pub fn session_key(_ctx: &CryptoContext, shared_secret: &[u8]) -> Result<SessionKey> {
        if shared_secret.is_empty() {
            return Err(KnxError::empty_input());
        }
        let digest = Sha256::digest(shared_secret);
        let mut key = [0u8; BLOCK_SIZE];
        key.copy_from_slice(&digest[..BLOCK_SIZE]);
        Ok(key)
    }

    /// Session key straight from our private key and the peer's public key.
    pub fn session_key_from_keys(
        ctx: &CryptoContext,
        private: &SecureKey,
        peer_public: &SecureKey,
    ) -> Result<SessionKey> {
        let shared = SecureKey::shared_secret(private, peer_public)?;
        Self::session_key(ctx, shared.as_slice())
    }

    /// PBKDF2-HMAC-SHA256 hash of a user password.
    pub fn user_password_hash(_ctx: &CryptoContext, password: &[u8]) -> Key {
        derive_password_key(password, USER_PASSWORD_SALT)
    }

    /// PBKDF2-HMAC-SHA256 hash of a device authentication code.
    pub fn device_authentication_code_hash(_ctx: &CryptoContext, password: &[u8]) -> Key {
        derive_password_key(password, DEVICE_AUTHENTICATION_SALT)
    }

    /// Bytewise XOR.
    ///
    /// The result is as long as the shorter input, or as long as the longer
    /// one with missing bytes read as zero when `adjust` is set.
    pub fn xor(left: &[u8], right: &[u8], adjust: bool) -> Result<FrameBuffer> {
        let len = if adjust {
            left.len().max(right.len())
        } else {
            left.len().min(right.len())
        };
        let mut out = FrameBuffer::new();
        for i in 0..len {
            let byte = left.get(i).copied().unwrap_or(0) ^ right.get(i).copied().unwrap_or(0);
            out.push(byte).map_err(|_| KnxError::capacity_exceeded())?;
        }
        Ok(out)
    }

    /// CBC-MAC over the associated data for `header`'s service type.
    ///
    /// `id` is the secure session id (wrapper, session response) or the user
    /// id (session authenticate) and is not used for timer notify.
    ///
    /// # Errors
    ///
    /// - `header` is not a valid header
    /// - `data` is empty for a wrapper, session response or authenticate
    /// - the service type carries no MAC
    pub fn compute_message_authentication_code(
        _ctx: &CryptoContext,
        key: &Key,
        header: &FrameHeader,
        id: u16,
        data: &[u8],
        sequence_number: u64,
        serial_number: Option<&[u8; SERIAL_NUMBER_SIZE]>,
        message_tag: u16,
    ) -> Result<Mac> {
        if !header.is_valid() {
            return Err(KnxError::invalid_frame());
        }

        let header_bytes = header.bytes();
        let id_bytes = id.to_be_bytes();
        let a_len = (header_bytes.len() + id_bytes.len()) as u16;
        let mut mac = CbcMac::new(key);

        match header.service_type() {
            ServiceType::SecureWrapper => {
                if data.is_empty() {
                    return Err(KnxError::empty_input());
                }
                mac.update(&counter_block(sequence_number, serial_number, message_tag, data.len() as u16));
                mac.update(&a_len.to_be_bytes());
                mac.update(&header_bytes);
                mac.update(&id_bytes);
                mac.update(data);
            }
            ServiceType::SessionResponse | ServiceType::SessionAuthenticate => {
                if data.is_empty() {
                    return Err(KnxError::empty_input());
                }
                let total = a_len.wrapping_add(data.len() as u16);
                mac.update(&counter_block(sequence_number, serial_number, message_tag, 0));
                mac.update(&total.to_be_bytes());
                mac.update(&header_bytes);
                mac.update(&id_bytes);
                mac.update(data);
            }
            ServiceType::TimerNotify => {
                mac.update(&counter_block(sequence_number, serial_number, message_tag, 0));
                mac.update(&(header_bytes.len() as u16).to_be_bytes());
                mac.update(&header_bytes);
            }
            other => {
                knx_log!(debug, "no MAC defined for {:?}", other);
                return Err(KnxError::unsupported_secure_service());
            }
        }

        Ok(mac.finalize())
    }

    /// Recompute the MAC and compare it with `received` in constant time.
    pub fn verify_message_authentication_code(
        ctx: &CryptoContext,
        key: &Key,
        header: &FrameHeader,
        id: u16,
        data: &[u8],
        sequence_number: u64,
        serial_number: Option<&[u8; SERIAL_NUMBER_SIZE]>,
        message_tag: u16,
        received: &Mac,
    ) -> Result<()> {
        let expected = Self::compute_message_authentication_code(
            ctx,
            key,
            header,
            id,
            data,
            sequence_number,
            serial_number,
            message_tag,
        )?;
        if bool::from(expected.as_slice().ct_eq(received.as_slice())) {
            Ok(())
        } else {
            knx_log!(warn, "MAC verification failed for {:?}", header.service_type());
            Err(KnxError::invalid_mac())
        }
    }

    /// Encrypt a whole frame (header included) for a secure wrapper.
    pub fn encrypt_secure_wrapper_payload(
        _ctx: &CryptoContext,
        key: &Key,
        frame: &Frame,
        sequence_number: u64,
        serial_number: Option<&[u8; SERIAL_NUMBER_SIZE]>,
        message_tag: u16,
    ) -> Result<FrameBuffer> {
        if !frame.is_valid() {
            return Err(KnxError::invalid_frame());
        }
        let mut bytes = frame.bytes()?;
        apply_keystream(key, &mut bytes, sequence_number, serial_number, message_tag);
        Ok(bytes)
    }

    /// Decrypt the encrypted frame bytes of a secure wrapper.
    pub fn decrypt_secure_wrapper_payload(
        _ctx: &CryptoContext,
        key: &Key,
        bytes: &[u8],
        sequence_number: u64,
        serial_number: Option<&[u8; SERIAL_NUMBER_SIZE]>,
        message_tag: u16,
    ) -> Result<FrameBuffer> {
        if bytes.is_empty() {
            return Err(KnxError::empty_input());
        }
        let mut out = FrameBuffer::from_slice(bytes).map_err(|_| KnxError::payload_too_large())?;
        apply_keystream(key, &mut out, sequence_number, serial_number, message_tag);
        Ok(out)
    }

    /// XOR the MAC with the first keystream block.
    pub fn encrypt_message_authentication_code(
        _ctx: &CryptoContext,
        key: &Key,
        mac: &Mac,
        sequence_number: u64,
        serial_number: Option<&[u8; SERIAL_NUMBER_SIZE]>,
        message_tag: u16,
    ) -> Mac {
        let mut out = *mac;
        apply_keystream(key, &mut out, sequence_number, serial_number, message_tag);
        out
    }

    /// Inverse of [`encrypt_message_authentication_code`](Self::encrypt_message_authentication_code).
    pub fn decrypt_message_authentication_code(
        ctx: &CryptoContext,
        key: &Key,
        mac: &Mac,
        sequence_number: u64,
        serial_number: Option<&[u8; SERIAL_NUMBER_SIZE]>,
        message_tag: u16,
    ) -> Mac {
        Self::encrypt_message_authentication_code(
            ctx,
            key,
            mac,
            sequence_number,
            serial_number,
            message_tag,
        )
    }
}

// =============================================================================
// Internals
// =============================================================================

fn derive_password_key(password: &[u8], salt: &[u8]) -> Key {
    let mut out = [0u8; BLOCK_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ROUNDS, &mut out);
    out
}

/// `sequence | serial | tag | length`, the shared layout of B0 and Ctr0.
fn counter_block(
    sequence_number: u64,
    serial_number: Option<&[u8; SERIAL_NUMBER_SIZE]>,
    message_tag: u16,
    length: u16,
) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    // 48-bit sequence number, upper two bytes of the u64 are dropped
    block[..6].copy_from_slice(&sequence_number.to_be_bytes()[2..]);
    if let Some(serial) = serial_number {
        block[6..12].copy_from_slice(serial);
    }
    block[12..14].copy_from_slice(&message_tag.to_be_bytes());
    block[14..].copy_from_slice(&length.to_be_bytes());
    block
}

fn encrypt_block(cipher: &Aes128, input: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
    let mut block = aes::Block::from(*input);
    cipher.encrypt_block(&mut block);
    let mut out = [0u8; BLOCK_SIZE];
    out.copy_from_slice(&block);
    out
}

fn apply_keystream(
    key: &Key,
    data: &mut [u8],
    sequence_number: u64,
    serial_number: Option<&[u8; SERIAL_NUMBER_SIZE]>,
    message_tag: u16,
) {
    let cipher = Aes128::new(key.into());
    let mut ctr = counter_block(sequence_number, serial_number, message_tag, CTR0_MARKER);
    for chunk in data.chunks_mut(BLOCK_SIZE) {
        ctr[BLOCK_SIZE - 1] = ctr[BLOCK_SIZE - 1].wrapping_add(1);
        let keystream = encrypt_block(&cipher, &ctr);
        chunk.iter_mut().zip(keystream).for_each(|(b, k)| *b ^= k);
    }
}

/// AES-128-CBC with a zero IV, keeping only the running block.
///
/// `finalize` zero pads a trailing partial block; aligned input is not padded.
struct CbcMac {
    cipher: Aes128,
    state: [u8; BLOCK_SIZE],
    pending: [u8; BLOCK_SIZE],
    filled: usize,
}

impl CbcMac {
    fn new(key: &Key) -> Self {
        Self {
            cipher: Aes128::new(key.into()),
            state: [0; BLOCK_SIZE],
            pending: [0; BLOCK_SIZE],
            filled: 0,
        }
    }

    fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let take = (BLOCK_SIZE - self.filled).min(data.len());
            self.pending[self.filled..self.filled + take].copy_from_slice(&data[..take]);
            self.filled += take;
            data = &data[take..];
            if self.filled == BLOCK_SIZE {
                self.absorb();
            }
        }
    }

    fn absorb(&mut self) {
        for (s, p) in self.state.iter_mut().zip(self.pending) {
            *s ^= p;
        }
        self.state = encrypt_block(&self.cipher, &self.state);
        self.pending = [0; BLOCK_SIZE];
        self.filled = 0;
    }

    fn finalize(mut self) -> Mac {
        // pending is zeroed past `filled`
        if self.filled != 0 {
            self.absorb();
        }
        self.state
    }
}
