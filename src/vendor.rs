//! Vendor detection and the per-vendor strategy every façade is parameterized with.

use core::fmt;

use crate::commands::SetBootFlags;
use crate::error::{Error, Result};
use crate::types::{BootTarget, FirmwareMode};

/// Server vendor, resolved once per connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    /// Not recognised.
    Unknown,
    /// Supermicro.
    Supermicro,
    /// Lenovo.
    Lenovo,
    /// Dell.
    Dell,
    /// Vagrant virtual machine.
    Vagrant,
}

impl Vendor {
    /// Detection order; the first match wins.
    pub const DETECTION_ORDER: [Self; 4] =
        [Self::Supermicro, Self::Lenovo, Self::Dell, Self::Vagrant];

    /// Canonical display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Supermicro => "Supermicro",
            Self::Lenovo => "Lenovo",
            Self::Dell => "Dell",
            Self::Vagrant => "Vagrant",
        }
    }

    /// Classify a free-text vendor string, e.g. DMI `sys_vendor` or a Redfish
    /// `Manufacturer`. Never fails; unmatched text is [`Vendor::Unknown`].
    pub fn detect(text: &str) -> Self {
        let text = text.to_ascii_lowercase();
        Self::DETECTION_ORDER
            .into_iter()
            .find(|v| text.contains(&v.name().to_ascii_lowercase()))
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Boot flags data byte 1 values.
pub mod uefi_qualifier {
    /// Valid, persistent, EFI boot type.
    pub const PERSISTENT_UEFI: u8 = 0xE0;
    /// Valid, next boot only, EFI boot type.
    pub const UEFI: u8 = 0xA0;
    /// Valid, persistent, PC-compatible boot type.
    pub const PERSISTENT_LEGACY: u8 = 0xC0;
}

/// Boot flags data byte 2 values.
pub mod device_qualifier {
    /// No override.
    pub const NONE: u8 = 0x00;
    /// Force PXE.
    pub const PXE: u8 = 0x04;
    /// Force boot from default hard drive.
    pub const DISK: u8 = 0x08;
    /// Disk selector Supermicro firmware honours in UEFI mode.
    pub const DISK_LEGACY_COMPAT: u8 = 0x24;
    /// Force boot into BIOS setup.
    pub const BIOS: u8 = 0x18;
}

/// The qualifier pair placed into the boot flags parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Qualifiers {
    /// Boot flags data byte 1.
    pub uefi: u8,
    /// Boot flags data byte 2.
    pub device: u8,
}

impl From<Qualifiers> for SetBootFlags {
    fn from(q: Qualifiers) -> Self {
        SetBootFlags {
            uefi_qualifier: q.uefi,
            device_qualifier: q.device,
        }
    }
}

/// Documented vendor deviations from the generic device qualifier.
const DEVICE_QUIRKS: &[(BootTarget, Vendor, u8)] = &[(
    BootTarget::Disk,
    Vendor::Supermicro,
    device_qualifier::DISK_LEGACY_COMPAT,
)];

/// Qualifier pair for `target` on `vendor`. Total over both enumerations.
pub fn qualifiers(target: BootTarget, vendor: Vendor) -> Qualifiers {
    let (uefi, generic_device) = match target {
        BootTarget::Pxe => (uefi_qualifier::PERSISTENT_UEFI, device_qualifier::PXE),
        BootTarget::Disk => (uefi_qualifier::PERSISTENT_UEFI, device_qualifier::DISK),
        BootTarget::Bios => (uefi_qualifier::UEFI, device_qualifier::BIOS),
    };
    let device = DEVICE_QUIRKS
        .iter()
        .find(|(t, v, _)| *t == target && *v == vendor)
        .map_or(generic_device, |(_, _, q)| *q);
    Qualifiers { uefi, device }
}

/// Boot flags that switch the firmware boot type without overriding the device.
pub(crate) fn firmware_mode_flags(mode: FirmwareMode) -> Option<Qualifiers> {
    let uefi = match mode {
        FirmwareMode::Uefi => uefi_qualifier::PERSISTENT_UEFI,
        FirmwareMode::Legacy => uefi_qualifier::PERSISTENT_LEGACY,
        FirmwareMode::Unknown => return None,
    };
    Some(Qualifiers {
        uefi,
        device: device_qualifier::NONE,
    })
}

/// How a vendor handles one optional capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Implemented.
    Supported,
    /// The target has no such hardware; calls report [`crate::Outcome::Unsupported`].
    NotApplicable,
    /// Real hardware, but no implementation exists; calls fail with
    /// [`Error::NotImplemented`].
    NotImplemented,
}

/// Per-vendor strategy: qualifier lookup plus capability gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorProfile {
    vendor: Vendor,
}

impl VendorProfile {
    /// Dispatch a detected vendor to its profile. `Unknown` has none.
    pub fn for_vendor(vendor: Vendor, vendor_string: &str) -> Result<Self> {
        match vendor {
            Vendor::Unknown => Err(Error::UnsupportedVendor {
                vendor: vendor_string.to_string(),
            }),
            _ => Ok(Self { vendor }),
        }
    }

    /// Vendor this profile serves.
    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    /// Qualifier pair for a boot target.
    pub fn qualifiers(&self, target: BootTarget) -> Qualifiers {
        qualifiers(target, self.vendor)
    }

    /// Whether chassis power and boot flags can be driven.
    pub fn chassis_control(&self) -> Support {
        match self.vendor {
            Vendor::Vagrant => Support::NotApplicable,
            _ => Support::Supported,
        }
    }

    /// Whether the chassis identify LED can be driven.
    pub fn identify_led(&self) -> Support {
        match self.vendor {
            Vendor::Vagrant => Support::NotApplicable,
            _ => Support::Supported,
        }
    }

    /// Whether the firmware boot mode can be switched.
    pub fn firmware_mode_switch(&self) -> Support {
        match self.vendor {
            Vendor::Supermicro => Support::Supported,
            Vendor::Vagrant => Support::NotApplicable,
            _ => Support::NotImplemented,
        }
    }

    pub(crate) fn not_implemented(&self, operation: &'static str) -> Error {
        Error::NotImplemented {
            operation,
            vendor: self.vendor,
        }
    }
}
