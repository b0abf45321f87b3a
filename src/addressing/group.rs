//! Group addresses in 3-level (`main/middle/sub`) and 2-level (`main/sub`) notation.
//!
//! ```text
//!  15       11 10  8 7              0
//! ┌───────────┬─────┬────────────────┐
//! │   main    │ mid │      sub       │
//! └───────────┴─────┴────────────────┘
//! ```

use crate::error::{KnxError, Result};
use core::fmt;

/// Group address used for multicast communication.
///
/// ```
/// use knx_secure::GroupAddress;
///
/// let addr = GroupAddress::new(1, 2, 3)?;
/// assert_eq!(addr.raw(), 0x0A03);
///
/// let two_level: GroupAddress = "1/234".parse()?;
/// assert_eq!(two_level.sub_2level(), 234);
/// # Ok::<(), knx_secure::KnxError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupAddress {
    raw: u16,
}

impl GroupAddress {
    /// Maximum main group value (5 bits)
    pub const MAX_MAIN: u8 = 31;
    /// Maximum middle group value (3 bits)
    pub const MAX_MIDDLE: u8 = 7;
    /// Maximum sub value for 2-level format (11 bits)
    pub const MAX_SUB_2LEVEL: u16 = 2047;

    /// Group address 0/0/0, used as the broadcast destination.
    pub const BROADCAST: Self = Self { raw: 0 };

    /// Create a 3-level address.
    pub fn new(main: u8, middle: u8, sub: u8) -> Result<Self> {
        if main > Self::MAX_MAIN || middle > Self::MAX_MIDDLE {
            return Err(KnxError::address_out_of_range());
        }
        Ok(Self {
            raw: (u16::from(main) << 11) | (u16::from(middle) << 8) | u16::from(sub),
        })
    }

    /// Create a 2-level address.
    pub fn new_2level(main: u8, sub: u16) -> Result<Self> {
        if main > Self::MAX_MAIN || sub > Self::MAX_SUB_2LEVEL {
            return Err(KnxError::address_out_of_range());
        }
        Ok(Self {
            raw: (u16::from(main) << 11) | sub,
        })
    }

    /// Raw 16-bit value.
    #[inline(always)]
    pub const fn raw(self) -> u16 {
        self.raw
    }

    #[inline(always)]
    pub const fn main(self) -> u8 {
        (self.raw >> 11) as u8 & 0x1F
    }

    #[inline(always)]
    pub const fn middle(self) -> u8 {
        (self.raw >> 8) as u8 & 0x07
    }

    #[inline(always)]
    pub const fn sub(self) -> u8 {
        self.raw as u8
    }

    #[inline(always)]
    pub const fn sub_2level(self) -> u16 {
        self.raw & 0x07FF
    }

    /// Big-endian wire form.
    #[inline(always)]
    pub const fn to_bytes(self) -> [u8; 2] {
        self.raw.to_be_bytes()
    }

    /// Decode from the first two bytes of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        match buf {
            [hi, lo, ..] => Ok(Self::from(u16::from_be_bytes([*hi, *lo]))),
            _ => Err(KnxError::buffer_too_small()),
        }
    }
}

impl From<u16> for GroupAddress {
    #[inline(always)]
    fn from(raw: u16) -> Self {
        Self { raw }
    }
}

impl From<GroupAddress> for u16 {
    #[inline(always)]
    fn from(addr: GroupAddress) -> u16 {
        addr.raw
    }
}

impl fmt::Display for GroupAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.main(), self.middle(), self.sub())
    }
}

impl core::str::FromStr for GroupAddress {
    type Err = KnxError;

    /// Accepts both `main/middle/sub` and `main/sub`.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('/');
        let main = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(KnxError::invalid_group_address)?;
        let second = parts
            .next()
            .and_then(|p| p.parse::<u16>().ok())
            .ok_or_else(KnxError::invalid_group_address)?;

        match (parts.next(), parts.next()) {
            (None, None) => Self::new_2level(main, second),
            (Some(sub), None) => {
                let middle = u8::try_from(second).map_err(|_| KnxError::invalid_group_address())?;
                let sub = sub
                    .parse::<u8>()
                    .map_err(|_| KnxError::invalid_group_address())?;
                Self::new(main, middle, sub)
            }
            _ => Err(KnxError::invalid_group_address()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_3level() {
        let addr = GroupAddress::new(31, 7, 255).unwrap();
        assert_eq!(addr.raw(), 0xFFFF);
        assert_eq!(addr.to_string(), "31/7/255");
        assert!(GroupAddress::new(32, 0, 0).is_err());
        assert!(GroupAddress::new(0, 8, 0).is_err());
    }

    #[test]
    fn test_2level() {
        let addr = GroupAddress::new_2level(1, 234).unwrap();
        assert_eq!(addr.main(), 1);
        assert_eq!(addr.sub_2level(), 234);
        assert!(GroupAddress::new_2level(0, 2048).is_err());
    }

    #[test]
    fn test_broadcast() {
        assert_eq!(GroupAddress::BROADCAST.to_bytes(), [0, 0]);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("1/2/3".parse::<GroupAddress>().unwrap().raw(), 0x0A03);
        assert_eq!("1/234".parse::<GroupAddress>().unwrap().sub_2level(), 234);

        assert!("1".parse::<GroupAddress>().is_err());
        assert!("32/0/0".parse::<GroupAddress>().is_err());
        assert!("1/2/3/4".parse::<GroupAddress>().is_err());
        assert!("a/b/c".parse::<GroupAddress>().is_err());
        assert!("1/2048".parse::<GroupAddress>().is_err());
        assert!("1/300/1".parse::<GroupAddress>().is_err());
    }
}
