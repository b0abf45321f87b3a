//! Ready-made TPDUs for the application layer services.
//!
//! Services are grouped by how they are addressed: [`multicast`] for group
//! communication, [`broadcast`] for (system) broadcast, [`point_to_point`] for
//! services that run connectionless or on a transport connection, and
//! [`point_to_point_connection_oriented`] for services only allowed on a
//! transport connection.
//!
//! ```
//! use knx_secure::protocol::catalog::point_to_point::{self, Mode};
//!
//! let tpdu = point_to_point::memory_read(Mode::ConnectionOriented { sequence: 2 }, 2, 0xABCD)?;
//! assert_eq!(tpdu.size(), 4);
//! assert_eq!(tpdu.sequence_number(), Some(2));
//! # Ok::<(), knx_secure::KnxError>(())
//! ```

use crate::addressing::{AddressType, KnxAddress};
use crate::error::{KnxError, Result};
use crate::protocol::tpdu::{
    ApplicationControlField as Apci, Tpdu, TpduData, TransportControlField as Tpci,
};

const MAX_SEQUENCE: u8 = 0x0F;
const MAX_PACKED: u8 = 0x3F;

/// Assemble the data from parts and reject anything the service does not accept.
fn build(tpci: Tpci, apci: Apci, parts: &[&[u8]]) -> Result<Tpdu> {
    let mut data = TpduData::new();
    for part in parts {
        data.extend_from_slice(part)
            .map_err(|_| KnxError::invalid_data_length())?;
    }

    let tpdu = Tpdu::new(tpci, apci, &data)?;
    if !tpdu.is_valid() {
        knx_log!(debug, "rejected {:?} with {} data bytes", apci, data.len());
        return Err(KnxError::invalid_data_length());
    }
    Ok(tpdu)
}

fn check_serial(serial: &[u8]) -> Result<()> {
    if serial.len() != 6 {
        return Err(KnxError::invalid_parameter());
    }
    Ok(())
}

fn check_sequence(sequence: u8) -> Result<Tpci> {
    if sequence > MAX_SEQUENCE {
        return Err(KnxError::invalid_parameter());
    }
    Ok(Tpci::DataConnected { sequence })
}

fn expect_type(address: KnxAddress, expected: AddressType) -> Result<[u8; 2]> {
    if address.address_type() != expected {
        return Err(KnxError::unexpected_address_type());
    }
    Ok(address.to_bytes())
}

// =============================================================================
// Multicast
// =============================================================================

pub mod multicast {
    use super::*;

    pub fn group_value_read() -> Tpdu {
        Tpdu::empty(Tpci::DataGroup, Apci::GroupValueRead)
    }

    pub fn group_value_response(data: &[u8]) -> Result<Tpdu> {
        build(Tpci::DataGroup, Apci::GroupValueResponse, &[data])
    }

    pub fn group_value_write(data: &[u8]) -> Result<Tpdu> {
        build(Tpci::DataGroup, Apci::GroupValueWrite, &[data])
    }

    fn group_property(
        apci: Apci,
        object_type: u16,
        object_instance: u8,
        property_id: u8,
        data: &[u8],
    ) -> Result<Tpdu> {
        build(
            Tpci::DataTagGroup,
            apci,
            &[
                &object_type.to_be_bytes(),
                &[property_id, object_instance],
                data,
            ],
        )
    }

    pub fn group_property_value_read(
        object_type: u16,
        object_instance: u8,
        property_id: u8,
    ) -> Result<Tpdu> {
        group_property(Apci::GroupPropValueRead, object_type, object_instance, property_id, &[])
    }

    pub fn group_property_value_write(
        object_type: u16,
        object_instance: u8,
        property_id: u8,
        data: &[u8],
    ) -> Result<Tpdu> {
        group_property(Apci::GroupPropValueWrite, object_type, object_instance, property_id, data)
    }

    pub fn group_property_value_response(
        object_type: u16,
        object_instance: u8,
        property_id: u8,
        data: &[u8],
    ) -> Result<Tpdu> {
        group_property(Apci::GroupPropValueResponse, object_type, object_instance, property_id, data)
    }

    pub fn group_property_value_info_report(
        object_type: u16,
        object_instance: u8,
        property_id: u8,
        data: &[u8],
    ) -> Result<Tpdu> {
        group_property(
            Apci::GroupPropValueInfoReport,
            object_type,
            object_instance,
            property_id,
            data,
        )
    }
}

// =============================================================================
// Broadcast
// =============================================================================

pub mod broadcast {
    use super::*;

    pub fn individual_address_read() -> Tpdu {
        Tpdu::empty(Tpci::DataBroadcast, Apci::IndividualAddressRead)
    }

    pub fn individual_address_response() -> Tpdu {
        Tpdu::empty(Tpci::DataBroadcast, Apci::IndividualAddressResponse)
    }

    /// Assign `address`, which must be an individual address.
    pub fn individual_address_write(address: KnxAddress) -> Result<Tpdu> {
        let address = expect_type(address, AddressType::Individual)?;
        build(Tpci::DataBroadcast, Apci::IndividualAddressWrite, &[&address])
    }

    pub fn individual_address_serial_number_read(serial: &[u8]) -> Result<Tpdu> {
        check_serial(serial)?;
        build(Tpci::DataBroadcast, Apci::IndividualAddressSerialNumberRead, &[serial])
    }

    /// Assign `address` to the device with `serial`. Four reserved zero
    /// octets follow the address.
    pub fn individual_address_serial_number_write(
        serial: &[u8],
        address: KnxAddress,
    ) -> Result<Tpdu> {
        check_serial(serial)?;
        let address = expect_type(address, AddressType::Individual)?;
        build(
            Tpci::DataBroadcast,
            Apci::IndividualAddressSerialNumberWrite,
            &[serial, &address, &[0; 4]],
        )
    }

    pub fn domain_address_read() -> Tpdu {
        Tpdu::empty(Tpci::DataBroadcast, Apci::DomainAddressRead)
    }

    pub fn domain_address_write(domain: &[u8]) -> Result<Tpdu> {
        build(Tpci::DataBroadcast, Apci::DomainAddressWrite, &[domain])
    }

    pub fn domain_address_serial_number_read(serial: &[u8]) -> Result<Tpdu> {
        check_serial(serial)?;
        build(Tpci::DataBroadcast, Apci::DomainAddressSerialNumberRead, &[serial])
    }

    /// `domain` must be two octets.
    pub fn domain_address_serial_number_write(serial: &[u8], domain: &[u8]) -> Result<Tpdu> {
        check_serial(serial)?;
        if domain.len() != 2 {
            return Err(KnxError::invalid_parameter());
        }
        build(
            Tpci::DataBroadcast,
            Apci::DomainAddressSerialNumberWrite,
            &[serial, domain],
        )
    }

    fn system_network_parameter(
        apci: Apci,
        object_type: u16,
        property_id: u16,
        test_info: &[u8],
    ) -> Result<Tpdu> {
        if property_id > 0x0FFF {
            return Err(KnxError::invalid_parameter());
        }
        // 12-bit property id followed by four reserved bits
        build(
            Tpci::DataSystemBroadcast,
            apci,
            &[
                &object_type.to_be_bytes(),
                &(property_id << 4).to_be_bytes(),
                test_info,
            ],
        )
    }

    pub fn system_network_parameter_read(
        object_type: u16,
        property_id: u16,
        test_info: &[u8],
    ) -> Result<Tpdu> {
        system_network_parameter(Apci::SystemNetworkParameterRead, object_type, property_id, test_info)
    }

    pub fn system_network_parameter_write(
        object_type: u16,
        property_id: u16,
        value: &[u8],
    ) -> Result<Tpdu> {
        system_network_parameter(Apci::SystemNetworkParameterWrite, object_type, property_id, value)
    }

    pub fn system_network_parameter_response(
        object_type: u16,
        property_id: u16,
        test_info: &[u8],
        test_result: &[u8],
    ) -> Result<Tpdu> {
        let mut info = TpduData::new();
        info.extend_from_slice(test_info)
            .and_then(|()| info.extend_from_slice(test_result))
            .map_err(|_| KnxError::invalid_data_length())?;
        system_network_parameter(Apci::SystemNetworkParameterResponse, object_type, property_id, &info)
    }

    pub fn network_parameter_read(
        object_type: u16,
        property_id: u8,
        test_info: &[u8],
    ) -> Result<Tpdu> {
        build(
            Tpci::DataBroadcast,
            Apci::NetworkParameterRead,
            &[&object_type.to_be_bytes(), &[property_id], test_info],
        )
    }

    pub fn network_parameter_write(object_type: u16, property_id: u8, value: &[u8]) -> Result<Tpdu> {
        build(
            Tpci::DataBroadcast,
            Apci::NetworkParameterWrite,
            &[&object_type.to_be_bytes(), &[property_id], value],
        )
    }

    pub fn network_parameter_response(
        object_type: u16,
        property_id: u8,
        test_info: &[u8],
        test_result: &[u8],
    ) -> Result<Tpdu> {
        build(
            Tpci::DataBroadcast,
            Apci::NetworkParameterResponse,
            &[&object_type.to_be_bytes(), &[property_id], test_info, test_result],
        )
    }
}

// =============================================================================
// Point to point
// =============================================================================

pub mod point_to_point {
    use super::*;

    /// Transport used for a point-to-point service.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Mode {
        /// `T_Data_Individual`
        Connectionless,
        /// `T_Data_Connected` with the given sequence number (0-15)
        ConnectionOriented { sequence: u8 },
    }

    impl Mode {
        fn tpci(self) -> Result<Tpci> {
            match self {
                Self::Connectionless => Ok(Tpci::DataIndividual),
                Self::ConnectionOriented { sequence } => check_sequence(sequence),
            }
        }
    }

    /// `A_LinkWrite` flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[repr(u8)]
    pub enum LinkWriteFlags {
        AddGroupAddress = 0x00,
        AddSendingGroupAddress = 0x01,
        DeleteGroupAddress = 0x02,
    }

    /// Start index and element count share two octets: 4 bits count, 12 bits index.
    fn elements(count: u8, start_index: u16) -> Result<[u8; 2]> {
        if count > 0x0F || start_index > 0x0FFF {
            return Err(KnxError::invalid_parameter());
        }
        Ok(((u16::from(count) << 12) | start_index).to_be_bytes())
    }

    pub fn property_value_read(
        mode: Mode,
        object_index: u8,
        property_id: u8,
        count: u8,
        start_index: u16,
    ) -> Result<Tpdu> {
        build(
            mode.tpci()?,
            Apci::PropertyValueRead,
            &[&[object_index, property_id], &elements(count, start_index)?],
        )
    }

    pub fn property_value_write(
        mode: Mode,
        object_index: u8,
        property_id: u8,
        count: u8,
        start_index: u16,
        data: &[u8],
    ) -> Result<Tpdu> {
        build(
            mode.tpci()?,
            Apci::PropertyValueWrite,
            &[&[object_index, property_id], &elements(count, start_index)?, data],
        )
    }

    pub fn property_description_read(
        mode: Mode,
        object_index: u8,
        property_id: u8,
        property_index: u8,
    ) -> Result<Tpdu> {
        build(
            mode.tpci()?,
            Apci::PropertyDescriptionRead,
            &[&[object_index, property_id, property_index]],
        )
    }

    pub fn function_property_command(
        mode: Mode,
        object_index: u8,
        property_id: u8,
        data: &[u8],
    ) -> Result<Tpdu> {
        build(
            mode.tpci()?,
            Apci::FunctionPropertyCommand,
            &[&[object_index, property_id], data],
        )
    }

    pub fn function_property_state_read(
        mode: Mode,
        object_index: u8,
        property_id: u8,
        data: &[u8],
    ) -> Result<Tpdu> {
        build(
            mode.tpci()?,
            Apci::FunctionPropertyStateRead,
            &[&[object_index, property_id], data],
        )
    }

    pub fn link_read(mode: Mode, group_object_number: u8, start_index: u8) -> Result<Tpdu> {
        build(
            mode.tpci()?,
            Apci::LinkRead,
            &[&[group_object_number, start_index]],
        )
    }

    /// `address` must be a group address.
    pub fn link_write(
        mode: Mode,
        group_object_number: u8,
        flags: LinkWriteFlags,
        address: KnxAddress,
    ) -> Result<Tpdu> {
        let address = expect_type(address, AddressType::Group)?;
        build(
            mode.tpci()?,
            Apci::LinkWrite,
            &[&[group_object_number, flags as u8], &address],
        )
    }

    /// `descriptor_type` must fit the six spare APCI bits.
    pub fn device_descriptor_read(mode: Mode, descriptor_type: u8) -> Result<Tpdu> {
        if descriptor_type > MAX_PACKED {
            return Err(KnxError::invalid_parameter());
        }
        build(mode.tpci()?, Apci::DeviceDescriptorRead, &[&[descriptor_type]])
    }

    pub fn device_descriptor_response(
        mode: Mode,
        descriptor_type: u8,
        descriptor: &[u8],
    ) -> Result<Tpdu> {
        if descriptor_type > MAX_PACKED {
            return Err(KnxError::invalid_parameter());
        }
        build(
            mode.tpci()?,
            Apci::DeviceDescriptorResponse,
            &[&[descriptor_type], descriptor],
        )
    }

    /// Read `number` octets (1-63) starting at `address`.
    pub fn memory_read(mode: Mode, number: u8, address: u16) -> Result<Tpdu> {
        if number > MAX_PACKED {
            return Err(KnxError::invalid_parameter());
        }
        build(mode.tpci()?, Apci::MemoryRead, &[&[number], &address.to_be_bytes()])
    }

    pub fn memory_write(mode: Mode, number: u8, address: u16, data: &[u8]) -> Result<Tpdu> {
        if number > MAX_PACKED {
            return Err(KnxError::invalid_parameter());
        }
        build(
            mode.tpci()?,
            Apci::MemoryWrite,
            &[&[number], &address.to_be_bytes(), data],
        )
    }

    /// Basic restart.
    pub fn restart(mode: Mode) -> Result<Tpdu> {
        build(mode.tpci()?, Apci::Restart, &[&[0x00]])
    }

    /// Master reset with erase code and channel number.
    pub fn restart_master_reset(mode: Mode, erase_code: u8, channel: u8) -> Result<Tpdu> {
        build(mode.tpci()?, Apci::Restart, &[&[0x01, erase_code, channel]])
    }

    /// Connectionless `A_NetworkParameter_Write` to a single device.
    pub fn network_parameter_write(object_type: u16, property_id: u8, value: &[u8]) -> Result<Tpdu> {
        build(
            Tpci::DataIndividual,
            Apci::NetworkParameterWrite,
            &[&object_type.to_be_bytes(), &[property_id], value],
        )
    }
}

// =============================================================================
// Point to point, connection oriented only
// =============================================================================

pub mod point_to_point_connection_oriented {
    use super::*;

    pub fn adc_read(channel: u8, read_count: u8, sequence: u8) -> Result<Tpdu> {
        if channel > MAX_PACKED {
            return Err(KnxError::invalid_parameter());
        }
        build(check_sequence(sequence)?, Apci::AdcRead, &[&[channel, read_count]])
    }

    /// Extension and number share one octet, four bits each.
    fn user_memory_prefix(extension: u8, number: u8) -> Result<u8> {
        if extension > 0x0F || number > 0x0F {
            return Err(KnxError::invalid_parameter());
        }
        Ok((extension << 4) | number)
    }

    pub fn user_memory_read(extension: u8, number: u8, address: u16, sequence: u8) -> Result<Tpdu> {
        build(
            check_sequence(sequence)?,
            Apci::UserMemoryRead,
            &[&[user_memory_prefix(extension, number)?], &address.to_be_bytes()],
        )
    }

    pub fn user_memory_write(
        extension: u8,
        number: u8,
        address: u16,
        data: &[u8],
        sequence: u8,
    ) -> Result<Tpdu> {
        build(
            check_sequence(sequence)?,
            Apci::UserMemoryWrite,
            &[
                &[user_memory_prefix(extension, number)?],
                &address.to_be_bytes(),
                data,
            ],
        )
    }

    pub fn user_manufacturer_info_read(sequence: u8) -> Result<Tpdu> {
        build(check_sequence(sequence)?, Apci::UserManufacturerInfoRead, &[])
    }

    pub fn connect() -> Tpdu {
        Tpdu::empty(Tpci::Connect, Apci::Invalid)
    }

    pub fn disconnect() -> Tpdu {
        Tpdu::empty(Tpci::Disconnect, Apci::Invalid)
    }

    pub fn acknowledge(sequence: u8) -> Result<Tpdu> {
        check_sequence(sequence)?;
        Tpdu::control(Tpci::Acknowledge { sequence })
    }

    pub fn no_acknowledge(sequence: u8) -> Result<Tpdu> {
        check_sequence(sequence)?;
        Tpdu::control(Tpci::NoAcknowledge { sequence })
    }
}

#[cfg(test)]
mod tests {
    use super::point_to_point::{LinkWriteFlags, Mode};
    use super::*;
    use crate::addressing::{GroupAddress, IndividualAddress};
    use crate::protocol::tpdu::{DataContext, MAX_DATA_SIZE};

    const CONNECTED: Mode = Mode::ConnectionOriented { sequence: 2 };

    #[test]
    fn test_group_value_read() {
        let tpdu = multicast::group_value_read();
        assert!(tpdu.is_valid());
        assert_eq!(tpdu.size(), 2);
        assert_eq!(tpdu.transport_control_field(), Tpci::DataGroup);
        assert_eq!(tpdu.application_control_field(), Apci::GroupValueRead);
    }

    #[test]
    fn test_group_value_write_sizes() {
        let tpdu = multicast::group_value_write(&[0x01]).unwrap();
        assert_eq!(tpdu.data(), &[0x01]);
        assert_eq!(tpdu.size(), 2);

        for (data, size) in [(&[0x01, 0x01][..], 4), (&[0x40], 3), (&[0xF0], 3), (&[0xFF], 3)] {
            let tpdu = multicast::group_value_write(data).unwrap();
            assert_eq!(tpdu.size(), size);
            assert_eq!(tpdu.data(), data);
        }

        let tpdu = multicast::group_value_write(b"KNX is awesome").unwrap();
        assert!(tpdu.is_valid());
        assert_eq!(tpdu.size(), 16);
        assert_eq!(tpdu.data_size(), 15);
    }

    #[test]
    fn test_group_property_value() {
        let tpdu = multicast::group_property_value_read(0, 5, 0x13).unwrap();
        assert_eq!(tpdu.size(), 6);
        assert_eq!(tpdu.transport_control_field(), Tpci::DataTagGroup);
        assert_eq!(tpdu.application_control_field(), Apci::GroupPropValueRead);

        let tpdu = multicast::group_property_value_write(0, 5, 0x13, &[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(tpdu.size(), 9);
        assert_eq!(tpdu.data(), &[0x00, 0x00, 0x13, 0x05, 0x01, 0x02, 0x03]);

        let tpdu = multicast::group_property_value_write(0, 5, 0x13, &[0u8; 249]).unwrap();
        assert!(tpdu.is_valid());
        assert_eq!(tpdu.size(), 255);
        assert_eq!(tpdu.data_size(), 254);

        assert!(multicast::group_property_value_write(0, 5, 0x13, &[0u8; 251]).is_err());
    }

    #[test]
    fn test_individual_address() {
        let tpdu = broadcast::individual_address_read();
        assert_eq!(tpdu.size(), 2);
        assert_eq!(tpdu.transport_control_field(), Tpci::DataBroadcast);

        let group = KnxAddress::from(GroupAddress::new(1, 1, 1).unwrap());
        assert!(broadcast::individual_address_write(group).is_err());

        let address = KnxAddress::from(IndividualAddress::new(1, 1, 1).unwrap());
        let tpdu = broadcast::individual_address_write(address).unwrap();
        assert_eq!(tpdu.size(), 4);
        assert_eq!(tpdu.application_control_field(), Apci::IndividualAddressWrite);
        assert_eq!(
            KnxAddress::decode(AddressType::Individual, tpdu.data()).unwrap(),
            address
        );
    }

    #[test]
    fn test_serial_number_services() {
        assert!(broadcast::individual_address_serial_number_read(&[1, 2, 3]).is_err());
        let serial = [1, 2, 3, 4, 5, 6];
        let tpdu = broadcast::individual_address_serial_number_read(&serial).unwrap();
        assert_eq!(tpdu.size(), 8);

        let address = KnxAddress::from(IndividualAddress::new(1, 1, 1).unwrap());
        assert!(broadcast::individual_address_serial_number_write(&[1, 2, 3], address).is_err());
        let tpdu = broadcast::individual_address_serial_number_write(&serial, address).unwrap();
        assert_eq!(tpdu.size(), 14);
        assert_eq!(&tpdu.data()[6..], &[0x11, 0x01, 0, 0, 0, 0]);

        let tpdu = broadcast::domain_address_serial_number_read(&serial).unwrap();
        assert_eq!(tpdu.size(), 8);

        assert!(broadcast::domain_address_serial_number_write(&serial, &serial).is_err());
        let tpdu = broadcast::domain_address_serial_number_write(&serial, &[0x11, 0x01]).unwrap();
        assert_eq!(tpdu.size(), 10);
    }

    #[test]
    fn test_domain_address() {
        let tpdu = broadcast::domain_address_read();
        assert!(tpdu.is_valid());
        assert_eq!(tpdu.size(), 2);

        let tpdu = broadcast::domain_address_write(&[0x11, 0x01]).unwrap();
        assert_eq!(tpdu.size(), 4);
        assert_eq!(tpdu.application_control_field(), Apci::DomainAddressWrite);
    }

    #[test]
    fn test_network_parameters() {
        let info = [0x01, 0x02, 0x03, 0x04];
        let tpdu = broadcast::system_network_parameter_read(0, 11, &info).unwrap();
        assert_eq!(tpdu.size(), 10);
        assert_eq!(tpdu.transport_control_field(), Tpci::DataSystemBroadcast);
        assert_eq!(&tpdu.data()[..4], &[0x00, 0x00, 0x00, 0xB0]);
        assert!(broadcast::system_network_parameter_write(0, 0x1000, &info).is_err());

        let tpdu = broadcast::network_parameter_read(0, 53, &info).unwrap();
        assert_eq!(tpdu.size(), 9);
        let tpdu = broadcast::network_parameter_write(0, 53, &info).unwrap();
        assert_eq!(tpdu.size(), 9);
        let tpdu = broadcast::network_parameter_read(0, 53, &[0u8; 250]).unwrap();
        assert_eq!(tpdu.size(), 255);
        assert_eq!(tpdu.data_size(), 254);

        let tpdu = broadcast::network_parameter_response(0, 53, &[], &[1u8; 11]).unwrap();
        assert_eq!(tpdu.size(), 16);
        assert_eq!(tpdu.data_size(), 15);

        let tpdu = point_to_point::network_parameter_write(0, 53, &info).unwrap();
        assert_eq!(tpdu.size(), 9);
        assert_eq!(tpdu.transport_control_field(), Tpci::DataIndividual);
    }

    #[test]
    fn test_property_services() {
        let tpdu = point_to_point::property_value_read(Mode::Connectionless, 0, 53, 1, 1).unwrap();
        assert_eq!(tpdu.size(), 6);
        assert_eq!(tpdu.transport_control_field(), Tpci::DataIndividual);
        assert_eq!(tpdu.data(), &[0x00, 53, 0x10, 0x01]);

        let tpdu = point_to_point::property_value_read(CONNECTED, 0, 53, 1, 1).unwrap();
        assert_eq!(tpdu.sequence_number(), Some(2));
        assert_eq!(tpdu.transport_control_field(), Tpci::DataConnected { sequence: 2 });

        let tpdu =
            point_to_point::property_value_write(CONNECTED, 0, 53, 1, 1, &[1, 2, 3, 4]).unwrap();
        assert_eq!(tpdu.size(), 10);

        let tpdu = point_to_point::property_description_read(Mode::Connectionless, 0, 53, 1).unwrap();
        assert_eq!(tpdu.size(), 5);

        let data = [1, 2, 3, 4, 5];
        let tpdu = point_to_point::function_property_command(CONNECTED, 0, 53, &data).unwrap();
        assert_eq!(tpdu.size(), 9);
        let tpdu =
            point_to_point::function_property_state_read(Mode::Connectionless, 0, 53, &data).unwrap();
        assert_eq!(tpdu.size(), 9);

        assert!(point_to_point::property_value_read(Mode::Connectionless, 0, 53, 16, 1).is_err());
        assert!(
            point_to_point::property_value_read(Mode::ConnectionOriented { sequence: 16 }, 0, 53, 1, 1)
                .is_err()
        );
    }

    #[test]
    fn test_link_services() {
        let tpdu = point_to_point::link_read(Mode::Connectionless, 0, 1).unwrap();
        assert_eq!(tpdu.size(), 4);

        let individual = KnxAddress::from(IndividualAddress::new(1, 1, 1).unwrap());
        assert!(point_to_point::link_write(
            Mode::Connectionless,
            0,
            LinkWriteFlags::AddGroupAddress,
            individual
        )
        .is_err());

        let group = KnxAddress::from(GroupAddress::new_2level(1, 1).unwrap());
        let tpdu =
            point_to_point::link_write(CONNECTED, 0, LinkWriteFlags::AddGroupAddress, group).unwrap();
        assert_eq!(tpdu.size(), 6);
        assert_eq!(tpdu.sequence_number(), Some(2));
        assert_eq!(tpdu.application_control_field(), Apci::LinkWrite);
    }

    #[test]
    fn test_device_descriptor() {
        assert!(point_to_point::device_descriptor_read(Mode::Connectionless, 64).is_err());

        let tpdu = point_to_point::device_descriptor_read(Mode::Connectionless, 63).unwrap();
        assert_eq!(tpdu.size(), 2);
        assert_eq!(tpdu.bytes().unwrap().as_slice(), &[0x03, 0x3F]);

        let tpdu = point_to_point::device_descriptor_read(CONNECTED, 0).unwrap();
        assert_eq!(tpdu.sequence_number(), Some(2));

        let tpdu =
            point_to_point::device_descriptor_response(Mode::Connectionless, 63, &[0u8; 253]).unwrap();
        assert_eq!(tpdu.size(), 255);
        assert_eq!(tpdu.data_size(), 254);
    }

    #[test]
    fn test_memory_services() {
        let tpdu = point_to_point::memory_read(CONNECTED, 2, 0xABCD).unwrap();
        assert_eq!(tpdu.size(), 4);
        assert_eq!(tpdu.application_control_field(), Apci::MemoryRead);

        let tpdu = point_to_point::memory_write(CONNECTED, 2, 0x1502, &[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(tpdu.size(), 9);
        assert_eq!(tpdu.sequence_number(), Some(2));
    }

    #[test]
    fn test_restart() {
        let tpdu = point_to_point::restart(Mode::Connectionless).unwrap();
        assert_eq!(tpdu.bytes().unwrap().as_slice(), &[0x03, 0x80]);

        let tpdu = point_to_point::restart_master_reset(CONNECTED, 0x02, 0x00).unwrap();
        assert_eq!(tpdu.size(), 4);
    }

    #[test]
    fn test_connection_oriented_only() {
        let tpdu = point_to_point_connection_oriented::adc_read(2, 40, 2).unwrap();
        assert_eq!(tpdu.size(), 3);
        assert_eq!(tpdu.application_control_field(), Apci::AdcRead);

        let tpdu = point_to_point_connection_oriented::user_memory_read(1, 3, 0xFFFF, 2).unwrap();
        assert_eq!(tpdu.size(), 5);
        assert_eq!(tpdu.data(), &[0x13, 0xFF, 0xFF]);

        let tpdu = point_to_point_connection_oriented::user_memory_write(1, 2, 0x0000, &[1, 2, 3, 4, 5], 2)
            .unwrap();
        assert_eq!(tpdu.size(), 10);
        assert_eq!(tpdu.data(), &[0x12, 0x00, 0x00, 1, 2, 3, 4, 5]);

        let tpdu = point_to_point_connection_oriented::user_manufacturer_info_read(2).unwrap();
        assert_eq!(tpdu.size(), 2);
        assert_eq!(tpdu.sequence_number(), Some(2));
    }

    #[test]
    fn test_transport_control() {
        let connect = point_to_point_connection_oriented::connect();
        assert!(connect.is_valid());
        assert_eq!(connect.bytes().unwrap().as_slice(), &[0x80]);

        let disconnect = point_to_point_connection_oriented::disconnect();
        assert_eq!(disconnect.bytes().unwrap().as_slice(), &[0x81]);

        let nak = point_to_point_connection_oriented::no_acknowledge(15).unwrap();
        assert_eq!(nak.bytes().unwrap().as_slice(), &[0xFF]);
        assert!(point_to_point_connection_oriented::acknowledge(16).is_err());
    }

    #[test]
    fn test_catalog_round_trips_on_the_wire() {
        let tpdu = point_to_point_connection_oriented::adc_read(8, 1, 0).unwrap();
        let decoded = Tpdu::decode(&tpdu.bytes().unwrap(), DataContext::Individual).unwrap();
        assert_eq!(decoded.application_control_field(), Apci::AdcRead);

        let long = [0xAA; MAX_DATA_SIZE - 3];
        let tpdu = broadcast::network_parameter_write(1, 2, &long).unwrap();
        let decoded = Tpdu::decode(&tpdu.bytes().unwrap(), DataContext::Broadcast).unwrap();
        assert_eq!(decoded, tpdu);
    }
}
