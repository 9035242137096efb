//! Out-of-band HTTP management capability.
//!
//! This crate only consumes Redfish: reads that IPMI cannot answer well (UUID, board
//! identity, power and identify state as the BMC reports them). The protocol client
//! lives elsewhere and is plugged in through [`RedfishConnector`].

use uuid::Uuid;

use crate::board::BoardIdentity;
use crate::error::Result;
use crate::secret::SecretString;
use crate::types::{IdentifyLedState, PowerState};

/// Default HTTPS port for Redfish services.
pub const DEFAULT_PORT: u16 = 443;

/// Where and how to reach a BMC's Redfish service.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Hostname or IP address of the BMC.
    pub host: String,
    /// HTTPS port.
    pub port: u16,
    /// BMC username.
    pub username: String,
    /// BMC password.
    pub password: SecretString,
}

impl Endpoint {
    /// `host:port`, for diagnostics.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// An established Redfish session.
pub trait Redfish: Send + Sync {
    /// System power state.
    fn power_state(&self) -> Result<PowerState>;

    /// Chassis indicator LED state.
    fn identify_led(&self) -> Result<IdentifyLedState>;

    /// System UUID.
    fn uuid(&self) -> Result<Uuid>;

    /// Manufacturer, model, serial numbers and BIOS version of the system.
    fn board_info(&self) -> Result<BoardIdentity>;
}

/// Opens Redfish sessions.
pub trait RedfishConnector: Send + Sync {
    /// Connect and authenticate to `endpoint`.
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Redfish>>;
}
