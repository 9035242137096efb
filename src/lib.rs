#![deny(unsafe_code)]
#![warn(missing_docs)]

//! A blocking hardware-abstraction layer over server baseboard management controllers.
//!
//! The crate provides:
//! - byte-exact encoding of the IPMI 2.0 commands used for power, boot, identify and
//!   user management
//! - vendor detection and per-vendor boot qualifier dispatch
//! - one façade per band: [`InBand`] from the managed host, [`OutBand`] over the network
//! - power-state convergence and BMC user provisioning with bounded retries
//!
//! Commands reach the BMC through `ipmitool`; out-of-band reads additionally go through
//! a caller-supplied [`Redfish`] session.

mod board;
pub mod commands;
mod connect;
pub mod convergence;
mod debug;
mod error;
mod hal;
mod ipmi;
mod observe;
pub mod parse;
mod password;
mod provision;
mod redfish;
mod secret;
pub mod transport;
mod types;
pub mod vendor;

pub use crate::board::{Bios, Bmc, Board, BoardIdentity, BoardSource};
pub use crate::commands::{PasswordCheck, PasswordWidth};
pub use crate::connect::{Connection, ConnectionBuilder};
pub use crate::convergence::{ConvergencePolicy, PowerStateSource};
pub use crate::error::{Error, ExecutionCause, Result};
pub use crate::hal::{Hal, InBand, OutBand};
pub use crate::ipmi::{DEFAULT_LAN_CHANNEL, Ipmi, raw_args};
pub use crate::password::PasswordConstraints;
pub use crate::provision::{BmcUser, Provisioner, RetryPolicy};
pub use crate::redfish::{Endpoint, Redfish, RedfishConnector};
pub use crate::secret::SecretString;
pub use crate::types::{
    Band, BootTarget, ChassisControl, ChassisStatus, FirmwareMode, IdentifyLedState, Outcome,
    PowerRestorePolicy, PowerState, PrivilegeLevel, RawResponse, SystemGuid,
};
pub use crate::vendor::{Qualifiers, Support, Vendor, VendorProfile};
