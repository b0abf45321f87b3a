//! KNX addressing.
//!
//! Individual addresses name physical devices, group addresses name logical
//! functions. On the wire both are two bytes; which one a link-layer frame
//! carries is decided by the extended control field, so [`KnxAddress`] keeps
//! the type next to the raw value.

pub mod group;
pub mod individual;

pub use group::GroupAddress;
pub use individual::IndividualAddress;

use crate::error::{KnxError, Result};
use core::fmt;

/// Address type as signalled by the extended control field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddressType {
    Individual,
    Group,
}

/// Type-tagged 2-byte bus address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnxAddress {
    address_type: AddressType,
    raw: u16,
}

impl KnxAddress {
    /// Group address 0/0/0.
    pub const BROADCAST: Self = Self::new(AddressType::Group, 0);

    #[inline(always)]
    pub const fn new(address_type: AddressType, raw: u16) -> Self {
        Self { address_type, raw }
    }

    /// Decode two big-endian bytes as an address of the given type.
    pub fn decode(address_type: AddressType, buf: &[u8]) -> Result<Self> {
        match buf {
            [hi, lo, ..] => Ok(Self::new(address_type, u16::from_be_bytes([*hi, *lo]))),
            _ => Err(KnxError::buffer_too_small()),
        }
    }

    #[inline(always)]
    pub const fn address_type(self) -> AddressType {
        self.address_type
    }

    #[inline(always)]
    pub const fn raw(self) -> u16 {
        self.raw
    }

    #[inline(always)]
    pub const fn to_bytes(self) -> [u8; 2] {
        self.raw.to_be_bytes()
    }

    #[inline(always)]
    pub const fn is_individual(self) -> bool {
        matches!(self.address_type, AddressType::Individual)
    }

    /// True for group address 0/0/0.
    #[inline(always)]
    pub const fn is_broadcast(self) -> bool {
        matches!(self.address_type, AddressType::Group) && self.raw == 0
    }

    /// The individual address, if this is one.
    pub fn individual(self) -> Result<IndividualAddress> {
        match self.address_type {
            AddressType::Individual => Ok(IndividualAddress::from(self.raw)),
            AddressType::Group => Err(KnxError::unexpected_address_type()),
        }
    }

    /// The group address, if this is one.
    pub fn group(self) -> Result<GroupAddress> {
        match self.address_type {
            AddressType::Group => Ok(GroupAddress::from(self.raw)),
            AddressType::Individual => Err(KnxError::unexpected_address_type()),
        }
    }
}

impl From<IndividualAddress> for KnxAddress {
    fn from(addr: IndividualAddress) -> Self {
        Self::new(AddressType::Individual, addr.raw())
    }
}

impl From<GroupAddress> for KnxAddress {
    fn from(addr: GroupAddress) -> Self {
        Self::new(AddressType::Group, addr.raw())
    }
}

impl fmt::Display for KnxAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address_type {
            AddressType::Individual => IndividualAddress::from(self.raw).fmt(f),
            AddressType::Group => GroupAddress::from(self.raw).fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_conversions() {
        let ia = IndividualAddress::new(1, 1, 1).unwrap();
        let addr = KnxAddress::from(ia);
        assert!(addr.is_individual());
        assert_eq!(addr.individual().unwrap(), ia);
        assert!(addr.group().is_err());
        assert_eq!(addr.to_string(), "1.1.1");
    }

    #[test]
    fn test_broadcast() {
        assert!(KnxAddress::BROADCAST.is_broadcast());
        assert!(!KnxAddress::new(AddressType::Individual, 0).is_broadcast());
        assert_eq!(KnxAddress::BROADCAST.to_string(), "0/0/0");
    }

    #[test]
    fn test_decode() {
        let addr = KnxAddress::decode(AddressType::Group, &[0x0A, 0x03]).unwrap();
        assert_eq!(addr.group().unwrap(), GroupAddress::new(1, 2, 3).unwrap());
        assert!(KnxAddress::decode(AddressType::Group, &[0x0A]).is_err());
    }
}
