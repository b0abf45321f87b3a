//! Secure gateway configuration in `KEY=VALUE` form.
//!
//! ```text
//! # KNXnet/IP Secure gateway
//! KNX_GATEWAY_IP=192.168.1.10
//! KNX_GATEWAY_PORT=3671
//! KNX_USER_ID=2
//! KNX_USER_PASSWORD=secret
//! KNX_DEVICE_AUTH_CODE=trustme
//! KNX_SERIAL_NUMBER=00fa12345678
//! KNX_BACKBONE_KEY=000102030405060708090a0b0c0d0e0f
//! ```
//!
//! Unknown keys are ignored so one file can also feed other components.

use crate::error::{KnxError, Result};
use crate::net::Ipv4Addr;
use crate::protocol::constants::KNXNETIP_DEFAULT_PORT;
use crate::protocol::frame::Hpai;
use crate::secure::engine::{Key, SERIAL_NUMBER_SIZE};
use crate::secure::{CryptoContext, CryptoEngine};
use crate::utility::{config_lines, parse_hex, split_key_value};

/// Configuration used when nothing else is supplied.
pub const DEFAULT_CONFIG: &str = r#"
KNX_GATEWAY_IP=192.168.1.10
KNX_GATEWAY_PORT=3671
KNX_USER_ID=1
"#;

/// Parsed secure gateway settings, borrowing the passwords from the source text.
#[derive(Clone, PartialEq, Eq)]
pub struct SecureConfig<'a> {
    pub gateway_ip: Ipv4Addr,
    pub gateway_port: u16,
    pub user_id: u8,
    pub user_password: Option<&'a str>,
    pub device_authentication_code: Option<&'a str>,
    pub serial_number: [u8; SERIAL_NUMBER_SIZE],
    pub backbone_key: Option<Key>,
}

impl Default for SecureConfig<'_> {
    fn default() -> Self {
        Self {
            gateway_ip: Ipv4Addr::new(192, 168, 1, 10),
            gateway_port: KNXNETIP_DEFAULT_PORT,
            user_id: 1,
            user_password: None,
            device_authentication_code: None,
            serial_number: [0; SERIAL_NUMBER_SIZE],
            backbone_key: None,
        }
    }
}

impl<'a> SecureConfig<'a> {
    /// Parse `text`, starting from the defaults.
    pub fn parse(text: &'a str) -> Result<Self> {
        let mut config = Self::default();
        for (line_number, line) in config_lines(text) {
            let (key, value) = split_key_value(line).inspect_err(|_| {
                knx_log!(debug, "config line {} has no KEY=VALUE form", line_number);
            })?;
            config.apply(key, value).inspect_err(|_| {
                knx_log!(debug, "config line {}: bad value for {}", line_number, key);
            })?;
        }
        Ok(config)
    }

    fn apply(&mut self, key: &str, value: &'a str) -> Result<()> {
        match key {
            "KNX_GATEWAY_IP" => {
                self.gateway_ip = value.parse().map_err(|_| KnxError::invalid_config_value())?;
            }
            "KNX_GATEWAY_PORT" => self.gateway_port = parse_number(value)?,
            "KNX_USER_ID" => self.user_id = parse_number(value)?,
            "KNX_USER_PASSWORD" => self.user_password = non_empty(value),
            "KNX_DEVICE_AUTH_CODE" => self.device_authentication_code = non_empty(value),
            "KNX_SERIAL_NUMBER" => self.serial_number = parse_hex(value)?,
            "KNX_BACKBONE_KEY" => self.backbone_key = Some(parse_hex(value)?),
            _ => knx_log!(trace, "ignoring config key {}", key),
        }
        Ok(())
    }

    /// UDP endpoint of the gateway's control channel.
    pub const fn control_endpoint(&self) -> Hpai {
        Hpai::udp(self.gateway_ip, self.gateway_port)
    }

    /// PBKDF2 hash of the user password, if one is configured.
    pub fn user_password_hash(&self, ctx: &CryptoContext) -> Option<Key> {
        self.user_password
            .map(|password| CryptoEngine::user_password_hash(ctx, password.as_bytes()))
    }

    /// PBKDF2 hash of the device authentication code, if one is configured.
    pub fn device_authentication_code_hash(&self, ctx: &CryptoContext) -> Option<Key> {
        self.device_authentication_code
            .map(|code| CryptoEngine::device_authentication_code_hash(ctx, code.as_bytes()))
    }
}

// Secrets stay out of logs and panic messages.
impl core::fmt::Debug for SecureConfig<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SecureConfig")
            .field("gateway_ip", &self.gateway_ip)
            .field("gateway_port", &self.gateway_port)
            .field("user_id", &self.user_id)
            .field("user_password", &self.user_password.map(|_| ".."))
            .field("device_authentication_code", &self.device_authentication_code.map(|_| ".."))
            .field("serial_number", &self.serial_number)
            .field("backbone_key", &self.backbone_key.map(|_| ".."))
            .finish()
    }
}

fn parse_number<T: core::str::FromStr>(value: &str) -> Result<T> {
    value.parse().map_err(|_| KnxError::invalid_config_value())
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}
