#![cfg_attr(all(not(test), not(feature = "std")), no_std)]

//! # knx-secure
//!
//! KNXnet/IP frame codecs, cEMI link-layer frames, transport/application
//! unit builders and the KNXnet/IP Secure crypto engine.
//!
//! The crate is `no_std` by default and keeps every buffer in fixed-capacity
//! `heapless` storage, so it runs unchanged on microcontrollers and hosts.
//!
//! ## Layers
//!
//! - [`protocol::frame`]: the 6-byte KNXnet/IP header and whole frames
//! - [`protocol::cemi`]: link-layer frames with additional info blocks
//! - [`protocol::tpdu`] and [`protocol::catalog`]: transport/application units
//! - [`protocol::services`]: typed views over common KNXnet/IP services
//! - [`secure`]: X25519 keys, session keys, password hashes, CBC-MAC and CTR
//!
//! ## Example
//!
//! ```rust
//! use knx_secure::protocol::catalog::multicast;
//! use knx_secure::protocol::cemi::LinkLayerFrame;
//! use knx_secure::{ga, ia, MessageCode};
//!
//! let tpdu = multicast::group_value_write(&[0x01])?;
//! let frame = LinkLayerFrame::builder()
//!     .message_code(MessageCode::DataReq)
//!     .source(ia!(1, 1, 10))
//!     .destination(ga!(1/2/3))
//!     .tpdu(tpdu)
//!     .build()?;
//!
//! assert!(frame.is_valid());
//! assert_eq!(frame.bytes()?.as_slice(), &[0x11, 0x00, 0xBC, 0xE0, 0x11, 0x0A, 0x0A, 0x03, 0x01, 0x00, 0x81]);
//! # Ok::<(), knx_secure::KnxError>(())
//! ```

// Macro modules (must be declared before use)
#[macro_use]
pub mod macros;
#[macro_use]
pub mod logging;

pub mod addressing;
pub mod configuration;
pub mod error;
pub mod net;
pub mod protocol;
pub mod secure;
pub mod utility;

#[cfg(feature = "log")]
#[doc(hidden)]
pub use log;

// Re-export commonly used types
#[doc(inline)]
pub use addressing::{AddressType, GroupAddress, IndividualAddress, KnxAddress};
#[doc(inline)]
pub use configuration::SecureConfig;
#[doc(inline)]
pub use error::{KnxError, Result};
#[doc(inline)]
pub use net::Ipv4Addr;
#[doc(inline)]
pub use protocol::cemi::LinkLayerFrame;
#[doc(inline)]
pub use protocol::constants::{MessageCode, ServiceType};
#[doc(inline)]
pub use protocol::frame::{Frame, FrameHeader};
#[doc(inline)]
pub use protocol::tpdu::Tpdu;
#[doc(inline)]
pub use secure::{CryptoContext, CryptoEngine, SecureKey};
