//! KNXnet/IP Secure: key agreement, key derivation and frame protection.
//!
//! Nothing in here works before [`ensure_crypto_ready`] (or
//! [`ensure_crypto_ready_with_rng`] on targets without an OS random source)
//! has returned a [`CryptoContext`].
//!
//! ```rust
//! use knx_secure::secure::{ensure_crypto_ready_with_rng, CryptoEngine, SecureKey};
//!
//! let mut rng = rand::thread_rng();
//! let ctx = ensure_crypto_ready_with_rng(&mut rng)?;
//!
//! let client = SecureKey::generate_private_key_with_rng(&ctx, &mut rng)?;
//! let server = SecureKey::generate_private_key_with_rng(&ctx, &mut rng)?;
//! let client_public = SecureKey::public_key_from_private(&client)?;
//! let server_public = SecureKey::public_key_from_private(&server)?;
//!
//! let a = CryptoEngine::session_key_from_keys(&ctx, &client, &server_public)?;
//! let b = CryptoEngine::session_key_from_keys(&ctx, &server, &client_public)?;
//! assert_eq!(a, b);
//! # Ok::<(), knx_secure::KnxError>(())
//! ```

pub mod context;
pub mod engine;
pub mod frames;
pub mod key;

#[cfg(feature = "std")]
pub use context::ensure_crypto_ready;
pub use context::{ensure_crypto_ready_with_rng, CryptoContext};
pub use engine::{CryptoEngine, Key, Mac, SessionKey};
pub use frames::{
    SecureSessionStatus, SecureWrapper, SessionAuthenticate, SessionRequest, SessionResponse,
    SessionStatus, TimerNotify,
};
pub use key::{KeyType, SecureKey};
