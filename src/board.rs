//! Board identity, read once when a connection is opened.

use crate::ipmi::{DEFAULT_LAN_CHANNEL, Ipmi};
use crate::parse::{BmcInfo, Fru, LanConfig};
use crate::vendor::Vendor;

/// Identity fields as reported by a board source (DMI tables, Redfish, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardIdentity {
    /// Free-text vendor, e.g. `Supermicro` or `LENOVO`.
    pub vendor: String,
    /// Board or system model.
    pub model: String,
    /// Part number.
    pub part_number: String,
    /// Serial number.
    pub serial_number: String,
    /// BIOS version.
    pub bios_version: String,
    /// BIOS vendor, when the source reports one.
    pub bios_vendor: Option<String>,
    /// BIOS release date, when the source reports one.
    pub bios_date: Option<String>,
}

/// Reads the local board identity.
pub trait BoardSource: Send + Sync {
    /// `None` when the identity cannot be read, e.g. inside a VM without DMI data.
    fn read_board(&self) -> Option<BoardIdentity>;
}

/// What the BMC reports about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bmc {
    /// `lan print` of the default LAN channel.
    pub lan: LanConfig,
    /// `bmc info`.
    pub info: BmcInfo,
    /// `fru print 0`.
    pub fru: Fru,
}

impl Bmc {
    /// Read all three records. Best effort: `None` if any read fails.
    pub fn read(ipmi: &Ipmi) -> Option<Self> {
        let read = || -> crate::Result<Self> {
            Ok(Self {
                lan: ipmi.lan_config(DEFAULT_LAN_CHANNEL)?,
                info: ipmi.bmc_info()?,
                fru: ipmi.fru()?,
            })
        };
        match read() {
            Ok(bmc) => Some(bmc),
            Err(err) => {
                tracing::debug!(error = %err, "bmc record unavailable");
                None
            }
        }
    }
}

/// Firmware details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bios {
    /// Version string.
    pub version: String,
    /// Vendor.
    pub vendor: String,
    /// Release date.
    pub date: String,
}

/// A server board and its vendor classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Vendor text as read.
    pub vendor_string: String,
    /// Detected vendor.
    pub vendor: Vendor,
    /// Model.
    pub model: String,
    /// Part number.
    pub part_number: String,
    /// Serial number.
    pub serial_number: String,
    /// BIOS version.
    pub bios_version: String,
    /// BMC details, when readable.
    pub bmc: Option<Bmc>,
    /// BIOS details, when the source reports vendor or date.
    pub bios: Option<Bios>,
}

impl Board {
    /// Classify an identity.
    pub fn from_identity(identity: BoardIdentity) -> Self {
        let bios = (identity.bios_vendor.is_some() || identity.bios_date.is_some()).then(|| {
            Bios {
                version: identity.bios_version.clone(),
                vendor: identity.bios_vendor.clone().unwrap_or_default(),
                date: identity.bios_date.clone().unwrap_or_default(),
            }
        });
        Self {
            vendor: Vendor::detect(&identity.vendor),
            vendor_string: identity.vendor,
            model: identity.model,
            part_number: identity.part_number,
            serial_number: identity.serial_number,
            bios_version: identity.bios_version,
            bmc: None,
            bios,
        }
    }

    /// The board reported for hosts whose identity cannot be read.
    pub fn virtual_machine() -> Self {
        let name = Vendor::Vagrant.name();
        Self {
            vendor_string: name.to_string(),
            vendor: Vendor::Vagrant,
            model: name.to_string(),
            part_number: String::new(),
            serial_number: String::new(),
            bios_version: String::new(),
            bmc: None,
            bios: None,
        }
    }

    /// Attach the BMC record.
    pub fn with_bmc(mut self, bmc: Option<Bmc>) -> Self {
        self.bmc = bmc;
        self
    }
}
