//! KNXnet/IP protocol implementation.
//!
//! This module contains the KNXnet/IP frame codec, the service views built on
//! top of it, cEMI link layer frames and the transport/application layer units
//! they carry.

pub mod additional_info;
pub mod catalog;
pub mod cemi;
pub mod constants;
pub mod frame;
pub mod services;
pub mod tpdu;

pub use additional_info::{AdditionalInfo, AdditionalInfoType};
pub use cemi::{
    BroadcastType, ControlField, ExtendedControlField, FrameFormat, LinkLayerFrame,
    LinkLayerFrameBuilder,
};
pub use constants::{HostProtocol, MediumType, MessageCode, Priority, ServiceType, Status};
pub use frame::{Frame, FrameHeader, Hpai};
pub use services::ConnectionHeader;
pub use tpdu::{ApplicationControlField, DataContext, Tpdu, TransportControlField};
