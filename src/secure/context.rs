//! One-time readiness check for the crypto primitives.
//!
//! The first caller runs a short self test inside a critical section:
//!
//! 1. the random source must hand out bytes that are not all zero
//! 2. X25519 must reproduce the RFC 7748 section 5.2 vector
//! 3. AES-128 must reproduce the FIPS-197 appendix C.1 vector
//!
//! The outcome is stored once. A failed self test is permanent, every later
//! call reports [`KnxError::Crypto`] with the unavailable kind.

use crate::error::{KnxError, Result};
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use core::sync::atomic::{AtomicU8, Ordering};
use rand::{CryptoRng, RngCore};

const STATE_UNINITIALIZED: u8 = 0;
const STATE_READY: u8 = 1;
const STATE_FAILED: u8 = 2;

static GLOBAL_GATE: CryptoGate = CryptoGate::new();

/// Proof that the primitives passed their self test.
///
/// Only obtainable through [`ensure_crypto_ready`] or
/// [`ensure_crypto_ready_with_rng`]; every engine operation that touches a
/// primitive takes one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CryptoContext {
    _private: (),
}

/// Run the self test on first use and hand out a context.
///
/// `rng` is only consulted by the very first call in the process.
pub fn ensure_crypto_ready_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Result<CryptoContext> {
    GLOBAL_GATE.ensure(rng)
}

/// [`ensure_crypto_ready_with_rng`] seeded from the operating system.
#[cfg(feature = "std")]
pub fn ensure_crypto_ready() -> Result<CryptoContext> {
    ensure_crypto_ready_with_rng(&mut rand::rngs::OsRng)
}

pub(crate) struct CryptoGate {
    state: AtomicU8,
}

impl CryptoGate {
    pub(crate) const fn new() -> Self {
        Self {
            state: AtomicU8::new(STATE_UNINITIALIZED),
        }
    }

    pub(crate) fn ensure<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<CryptoContext> {
        let state = match self.state.load(Ordering::Acquire) {
            STATE_UNINITIALIZED => critical_section::with(|_cs| {
                // Another caller may have finished while we waited.
                let current = self.state.load(Ordering::Acquire);
                if current != STATE_UNINITIALIZED {
                    return current;
                }
                let next = if self_test(rng) {
                    knx_log!(info, "crypto primitives ready");
                    STATE_READY
                } else {
                    knx_log!(warn, "crypto self test failed, secure services disabled");
                    STATE_FAILED
                };
                self.state.store(next, Ordering::Release);
                next
            }),
            other => other,
        };

        if state == STATE_READY {
            Ok(CryptoContext { _private: () })
        } else {
            Err(KnxError::crypto_unavailable())
        }
    }
}

impl core::fmt::Debug for CryptoGate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CryptoGate")
            .field("state", &self.state.load(Ordering::Relaxed))
            .finish()
    }
}

fn self_test<R: RngCore + CryptoRng>(rng: &mut R) -> bool {
    rng_is_seeded(rng) && x25519_known_answer() && aes_known_answer()
}

fn rng_is_seeded<R: RngCore>(rng: &mut R) -> bool {
    let mut probe = [0u8; 32];
    if rng.try_fill_bytes(&mut probe).is_err() {
        return false;
    }
    probe.iter().any(|&b| b != 0)
}

fn x25519_known_answer() -> bool {
    const SCALAR: [u8; 32] = [
        0xa5, 0x46, 0xe3, 0x6b, 0xf0, 0x52, 0x7c, 0x9d, 0x3b, 0x16, 0x15, 0x4b, 0x82, 0x46, 0x5e,
        0xdd, 0x62, 0x14, 0x4c, 0x0a, 0xc1, 0xfc, 0x5a, 0x18, 0x50, 0x6a, 0x22, 0x44, 0xba, 0x44,
        0x9a, 0xc4,
    ];
    const U_COORDINATE: [u8; 32] = [
        0xe6, 0xdb, 0x68, 0x67, 0x58, 0x30, 0x30, 0xdb, 0x35, 0x94, 0xc1, 0xa4, 0x24, 0xb1, 0x5f,
        0x7c, 0x72, 0x66, 0x24, 0xec, 0x26, 0xb3, 0x35, 0x3b, 0x10, 0xa9, 0x03, 0xa6, 0xd0, 0xab,
        0x1c, 0x4c,
    ];
    const EXPECTED: [u8; 32] = [
        0xc3, 0xda, 0x55, 0x37, 0x9d, 0xe9, 0xc6, 0x90, 0x8e, 0x94, 0xea, 0x4d, 0xf2, 0x8d, 0x08,
        0x4f, 0x32, 0xec, 0xcf, 0x03, 0x49, 0x1c, 0x71, 0xf7, 0x54, 0xb4, 0x07, 0x55, 0x77, 0xa2,
        0x85, 0x52,
    ];
    x25519_dalek::x25519(SCALAR, U_COORDINATE) == EXPECTED
}

fn aes_known_answer() -> bool {
    const KEY: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f,
    ];
    const PLAINTEXT: [u8; 16] = [
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee,
        0xff,
    ];
    const EXPECTED: [u8; 16] = [
        0x69, 0xc4, 0xe0, 0xd8, 0x6a, 0x7b, 0x04, 0x30, 0xd8, 0xcd, 0xb7, 0x80, 0x70, 0xb4, 0xc5,
        0x5a,
    ];
    let cipher = Aes128::new(&KEY.into());
    let mut block = aes::Block::from(PLAINTEXT);
    cipher.encrypt_block(&mut block);
    block.as_slice() == EXPECTED
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stands in for an entropy source that was never seeded.
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), rand::Error> {
            dest.fill(0);
            Ok(())
        }
    }

    impl CryptoRng for ZeroRng {}

    #[test]
    fn test_known_answers() {
        assert!(x25519_known_answer());
        assert!(aes_known_answer());
    }

    #[test]
    fn test_global_gate_is_idempotent() {
        let first = ensure_crypto_ready_with_rng(&mut rand::thread_rng()).unwrap();
        // Once ready, the rng is no longer consulted.
        let second = ensure_crypto_ready_with_rng(&mut ZeroRng).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failure_is_remembered() {
        let gate = CryptoGate::new();
        match gate.ensure(&mut ZeroRng) {
            Err(KnxError::Crypto(e)) => assert!(e.is_unavailable()),
            other => panic!("unexpected {other:?}"),
        }
        // A good rng later does not revive a failed gate.
        match gate.ensure(&mut rand::thread_rng()) {
            Err(KnxError::Crypto(e)) => assert!(e.is_unavailable()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_local_gate_ready() {
        let gate = CryptoGate::new();
        assert!(gate.ensure(&mut rand::thread_rng()).is_ok());
        assert!(gate.ensure(&mut ZeroRng).is_ok());
    }
}
