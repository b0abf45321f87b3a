//! X25519 key material for KNXnet/IP Secure session setup.
//!
//! ```text
//! Client                                 Server
//!   |  private x, public X = x*G           |
//!   |------- SESSION_REQUEST (X) --------->|
//!   |<------ SESSION_RESPONSE (Y) ---------|  private y, public Y = y*G
//!   |                                      |
//!   |  shared = x*Y == y*X                 |
//!   |  session key = SHA-256(shared)[..16] |
//! ```
//!
//! Private keys are wiped on drop; shared secrets are handed out in
//! [`Zeroizing`] buffers.

use super::context::CryptoContext;
use crate::error::{KnxError, Result};
use rand::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

/// Raw key length for both key types.
pub const KEY_SIZE: usize = 32;

/// PKCS#8 prefix of an X25519 private key.
pub const PKCS8_PRIVATE_KEY_PREFIX: [u8; 16] = [
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x6e, 0x04, 0x22, 0x04, 0x20,
];

/// SubjectPublicKeyInfo prefix of an X25519 public key.
pub const SPKI_PUBLIC_KEY_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x6e, 0x03, 0x21, 0x00,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyType {
    Private,
    Public,
}

impl KeyType {
    const fn der_prefix(self) -> &'static [u8] {
        match self {
            Self::Private => &PKCS8_PRIVATE_KEY_PREFIX,
            Self::Public => &SPKI_PUBLIC_KEY_PREFIX,
        }
    }
}

/// Exactly one Curve25519 key, private or public.
#[derive(Clone)]
pub enum SecureKey {
    Private(StaticSecret),
    Public(PublicKey),
}

impl SecureKey {
    /// Fresh private key from the operating system's random source.
    #[cfg(feature = "std")]
    pub fn generate_private_key(ctx: &CryptoContext) -> Result<Self> {
        Self::generate_private_key_with_rng(ctx, &mut rand::rngs::OsRng)
    }

    pub fn generate_private_key_with_rng<R: RngCore + CryptoRng>(
        _ctx: &CryptoContext,
        rng: &mut R,
    ) -> Result<Self> {
        Ok(Self::Private(StaticSecret::random_from_rng(rng)))
    }

    /// Fresh private key plus the matching public key.
    #[cfg(feature = "std")]
    pub fn generate_keys(ctx: &CryptoContext) -> Result<(Self, Self)> {
        let private = Self::generate_private_key(ctx)?;
        let public = Self::public_key_from_private(&private)?;
        Ok((private, public))
    }

    /// Derive the public key belonging to a private key.
    pub fn public_key_from_private(private: &SecureKey) -> Result<Self> {
        match private {
            Self::Private(secret) => Ok(Self::Public(PublicKey::from(secret))),
            Self::Public(_) => Err(KnxError::key_type_mismatch()),
        }
    }

    /// Import a key from `data` starting at `offset`.
    ///
    /// Accepts the 32 raw key bytes, or the DER form (PKCS#8 for private
    /// keys, SubjectPublicKeyInfo for public keys) when the slice from
    /// `offset` is exactly a DER encoded key.
    pub fn from_bytes(key_type: KeyType, data: &[u8], offset: usize) -> Result<Self> {
        let rest = data.get(offset..).ok_or_else(KnxError::invalid_key)?;
        let raw = Self::strip_der_prefix(key_type, rest)
            .or_else(|| rest.first_chunk::<KEY_SIZE>())
            .ok_or_else(|| {
                knx_log!(debug, "key import needs {} bytes, got {}", KEY_SIZE, rest.len());
                KnxError::invalid_key()
            })?;

        Ok(match key_type {
            KeyType::Private => Self::Private(StaticSecret::from(*raw)),
            KeyType::Public => Self::Public(PublicKey::from(*raw)),
        })
    }

    fn strip_der_prefix(key_type: KeyType, bytes: &[u8]) -> Option<&[u8; KEY_SIZE]> {
        let prefix = key_type.der_prefix();
        if bytes.len() != prefix.len() + KEY_SIZE {
            return None;
        }
        bytes
            .strip_prefix(prefix)
            .and_then(|raw| raw.first_chunk::<KEY_SIZE>())
    }

    /// Raw 32-byte form of the key.
    pub fn bytes(&self) -> [u8; KEY_SIZE] {
        match self {
            Self::Private(secret) => secret.to_bytes(),
            Self::Public(public) => *public.as_bytes(),
        }
    }

    /// X25519 shared secret between a private key and a peer public key.
    ///
    /// An all-zero result (low order peer point) is rejected.
    pub fn shared_secret(
        private: &SecureKey,
        peer_public: &SecureKey,
    ) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
        let (Self::Private(secret), Self::Public(public)) = (private, peer_public) else {
            return Err(KnxError::key_type_mismatch());
        };
        let shared = secret.diffie_hellman(public);
        if !shared.was_contributory() {
            knx_log!(warn, "peer public key produced a non-contributory shared secret");
            return Err(KnxError::invalid_key());
        }
        Ok(Zeroizing::new(shared.to_bytes()))
    }

    #[inline(always)]
    pub const fn key_type(&self) -> KeyType {
        match self {
            Self::Private(_) => KeyType::Private,
            Self::Public(_) => KeyType::Public,
        }
    }

    #[inline(always)]
    pub const fn is_private(&self) -> bool {
        matches!(self, Self::Private(_))
    }

    #[inline(always)]
    pub const fn is_public(&self) -> bool {
        matches!(self, Self::Public(_))
    }
}

impl PartialEq for SecureKey {
    fn eq(&self, other: &Self) -> bool {
        if self.key_type() != other.key_type() {
            return false;
        }
        let (lhs, rhs) = (Zeroizing::new(self.bytes()), Zeroizing::new(other.bytes()));
        lhs.as_slice().ct_eq(rhs.as_slice()).into()
    }
}

impl Eq for SecureKey {}

impl core::fmt::Debug for SecureKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Private(_) => f.write_str("SecureKey::Private(..)"),
            Self::Public(public) => f.debug_tuple("SecureKey::Public").field(public.as_bytes()).finish(),
        }
    }
}
