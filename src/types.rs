use core::fmt;

use uuid::Uuid;

/// The privilege level granted to a BMC user on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PrivilegeLevel {
    /// Callback privilege.
    Callback = 0x01,
    /// User privilege.
    User = 0x02,
    /// Operator privilege.
    Operator = 0x03,
    /// Administrator privilege.
    Administrator = 0x04,
    /// OEM-defined privilege.
    Oem = 0x05,
    /// No access.
    NoAccess = 0x0F,
}

impl PrivilegeLevel {
    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A raw IPMI response.
#[derive(Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// IPMI completion code.
    pub completion_code: u8,
    /// Payload bytes after the completion code.
    pub data: Vec<u8>,
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field(
                "completion_code",
                &format_args!("{:#04x}", self.completion_code),
            )
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// Raw system GUID bytes as returned by `Get System GUID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemGuid {
    /// Raw GUID bytes.
    pub bytes: [u8; 16],
}

impl SystemGuid {
    /// Interpret the GUID with SMBIOS field order (first three fields little-endian),
    /// which is how the host firmware reports the same machine UUID.
    pub fn to_uuid(self) -> Uuid {
        Uuid::from_bytes_le(self.bytes)
    }
}

/// Power restore policy reported by `Get Chassis Status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerRestorePolicy {
    /// Always remain off after AC loss.
    AlwaysOff,
    /// Restore previous power state after AC loss.
    Previous,
    /// Always power on after AC loss.
    AlwaysOn,
    /// Reserved or unknown value.
    Unknown(u8),
}

/// Parsed response for the `Get Chassis Status` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChassisStatus {
    /// System power state.
    pub system_power_on: bool,
    /// Power overload state.
    pub power_overload: bool,
    /// Main power fault state.
    pub main_power_fault: bool,
    /// Power restore policy.
    pub power_restore_policy: PowerRestorePolicy,
    /// Chassis identify state as reported in byte 3, when the BMC supports it.
    pub identify: Option<IdentifyLedState>,
}

/// Chassis control operations (IPMI 2.0 table 28, `Chassis Control`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChassisControl {
    /// Power down the system.
    PowerDown,
    /// Power up the system.
    PowerUp,
    /// Power cycle the system.
    PowerCycle,
    /// Hard reset the system.
    HardReset,
    /// Pulse diagnostic interrupt.
    PulseDiagnostic,
    /// ACPI soft shutdown.
    AcpiSoft,
}

impl ChassisControl {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::PowerDown => 0x00,
            Self::PowerUp => 0x01,
            Self::PowerCycle => 0x02,
            Self::HardReset => 0x03,
            Self::PulseDiagnostic => 0x04,
            Self::AcpiSoft => 0x05,
        }
    }
}

/// Management channel a façade talks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// From the running host OS.
    InBand,
    /// Over the network, directly against the BMC.
    OutBand,
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InBand => "in-band",
            Self::OutBand => "out-band",
        })
    }
}

/// Result of a mutating call that reached the transport layer, or deliberately did not.
///
/// `Applied` only means the command was accepted; it says nothing about the machine's
/// state afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command was issued and accepted.
    Applied,
    /// The target already was in the requested state; nothing was issued.
    Unchanged,
    /// The target has no such capability; nothing was issued.
    Unsupported(&'static str),
}

impl Outcome {
    /// True when a command was issued.
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

fn guess_from<T: Copy>(text: &str, table: &[(&str, T)], fallback: T) -> T {
    let text = text.to_ascii_lowercase();
    table
        .iter()
        .find(|(needle, _)| text.contains(needle))
        .map_or(fallback, |(_, value)| *value)
}

/// Machine power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Powered on.
    On,
    /// Powered off.
    Off,
    /// Could not be determined.
    Unknown,
}

impl PowerState {
    // Checked in order; "off" wins when both needles appear and "none" is not "on".
    const GUESSES: &'static [(&'static str, Self)] = &[
        ("off", Self::Off),
        ("none", Self::Unknown),
        ("on", Self::On),
    ];

    /// Canonical string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Unknown => "unknown",
        }
    }

    /// Map free text (tool output, API strings) onto a power state.
    pub fn guess(text: &str) -> Self {
        guess_from(text, Self::GUESSES, Self::Unknown)
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chassis identify LED state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifyLedState {
    /// Lit or blinking.
    On,
    /// Dark.
    Off,
    /// Could not be determined.
    Unknown,
}

impl IdentifyLedState {
    const GUESSES: &'static [(&'static str, Self)] = &[
        ("off", Self::Off),
        ("on", Self::On),
        ("lit", Self::On),
        ("blink", Self::On),
    ];

    /// Canonical string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Unknown => "unknown",
        }
    }

    /// Map free text onto an identify LED state.
    pub fn guess(text: &str) -> Self {
        guess_from(text, Self::GUESSES, Self::Unknown)
    }
}

impl fmt::Display for IdentifyLedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device the machine boots from next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootTarget {
    /// Network boot.
    Pxe,
    /// Local disk.
    Disk,
    /// Firmware setup.
    Bios,
}

impl BootTarget {
    /// All boot targets.
    pub const ALL: [Self; 3] = [Self::Pxe, Self::Disk, Self::Bios];

    /// Canonical string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pxe => "pxe",
            Self::Disk => "disk",
            Self::Bios => "bios",
        }
    }

    /// Map free text onto a boot target. `None` is the unknown target.
    pub fn guess(text: &str) -> Option<Self> {
        let text = text.to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| text.contains(t.as_str()))
    }
}

impl fmt::Display for BootTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Firmware boot mode of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareMode {
    /// PC-compatible BIOS boot.
    Legacy,
    /// UEFI boot.
    Uefi,
    /// Could not be determined.
    Unknown,
}

impl FirmwareMode {
    const GUESSES: &'static [(&'static str, Self)] = &[
        ("legacy", Self::Legacy),
        ("uefi", Self::Uefi),
        ("efi", Self::Uefi),
    ];

    /// Canonical string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Uefi => "uefi",
            Self::Unknown => "unknown",
        }
    }

    /// Map free text onto a firmware mode.
    pub fn guess(text: &str) -> Self {
        guess_from(text, Self::GUESSES, Self::Unknown)
    }
}

impl fmt::Display for FirmwareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_state_guess() {
        assert_eq!(PowerState::guess("Chassis Power is on"), PowerState::On);
        assert_eq!(PowerState::guess("Chassis Power is off"), PowerState::Off);
        assert_eq!(PowerState::guess("ON"), PowerState::On);
        assert_eq!(PowerState::guess("PoweringOff"), PowerState::Off);
        assert_eq!(PowerState::guess(""), PowerState::Unknown);
        assert_eq!(PowerState::guess("standby"), PowerState::Unknown);
        assert_eq!(PowerState::guess("None"), PowerState::Unknown);
    }

    #[test]
    fn canonical_forms_guess_back() {
        for state in [PowerState::On, PowerState::Off] {
            assert_eq!(PowerState::guess(state.as_str()), state);
        }
        for state in [IdentifyLedState::On, IdentifyLedState::Off] {
            assert_eq!(IdentifyLedState::guess(state.as_str()), state);
        }
        for target in BootTarget::ALL {
            assert_eq!(BootTarget::guess(target.as_str()), Some(target));
        }
        for mode in [FirmwareMode::Legacy, FirmwareMode::Uefi] {
            assert_eq!(FirmwareMode::guess(mode.as_str()), mode);
        }
    }

    #[test]
    fn identify_guess_accepts_redfish_values() {
        assert_eq!(IdentifyLedState::guess("Lit"), IdentifyLedState::On);
        assert_eq!(IdentifyLedState::guess("Blinking"), IdentifyLedState::On);
        assert_eq!(IdentifyLedState::guess("Off"), IdentifyLedState::Off);
        assert_eq!(IdentifyLedState::guess("?"), IdentifyLedState::Unknown);
    }

    #[test]
    fn boot_target_guess_unknown_is_none() {
        assert_eq!(BootTarget::guess("PXE"), Some(BootTarget::Pxe));
        assert_eq!(BootTarget::guess("hard disk"), Some(BootTarget::Disk));
        assert_eq!(BootTarget::guess("floppy"), None);
    }

    #[test]
    fn system_guid_uses_smbios_order() {
        let guid = SystemGuid {
            bytes: [
                0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xaa, 0xbb, 0xcc,
                0xdd, 0xee, 0xff,
            ],
        };
        assert_eq!(
            guid.to_uuid().to_string(),
            "00112233-4455-6677-8899-aabbccddeeff"
        );
    }
}
