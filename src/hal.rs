//! Vendor-neutral façades over one BMC, one per band.
//!
//! Every mutation encodes one IPMI command and reports what the transport did with it.
//! Nothing reads back to confirm the effect; use the `*_and_wait` helpers or
//! [`crate::convergence::wait_for`] for that.

use std::path::{Path, PathBuf};

use tracing::Span;
use uuid::Uuid;

use crate::board::{Bmc, Board};
use crate::commands::{
    ChassisControlCommand, ChassisIdentify, PasswordCheck, PasswordWidth, SetBootFlags,
};
use crate::convergence::{self, ConvergencePolicy, PowerStateSource};
use crate::error::{Error, Result};
use crate::ipmi::Ipmi;
use crate::password::PasswordConstraints;
use crate::provision::{BmcUser, Provisioner, RetryPolicy};
use crate::redfish::Redfish;
use crate::secret::SecretString;
use crate::types::{
    BootTarget, ChassisControl, FirmwareMode, IdentifyLedState, Outcome, PowerState,
    PrivilegeLevel,
};
use crate::vendor::{self, Support, VendorProfile};

/// Operations both bands provide.
pub trait Hal: Send + Sync {
    /// Board read when the connection was opened.
    fn board(&self) -> &Board;

    /// Machine UUID.
    fn uuid(&self) -> Result<Uuid>;

    /// Hard power off.
    fn power_off(&self) -> Result<Outcome>;

    /// Power off, then on.
    fn power_cycle(&self) -> Result<Outcome>;

    /// Hard reset.
    fn power_reset(&self) -> Result<Outcome>;

    /// Persistently boot from `target`; [`BootTarget::Bios`] applies to the next boot only.
    fn set_boot_target(&self, target: BootTarget) -> Result<Outcome>;
}

const NO_CHASSIS: &str = "virtual machine has no chassis controller";
const NO_IDENTIFY_LED: &str = "virtual machine has no identify LED";
const NO_FIRMWARE_SWITCH: &str = "virtual machine firmware mode is fixed";

/// State both façades share.
#[derive(Debug)]
struct Shared {
    ipmi: Ipmi,
    profile: VendorProfile,
    board: Board,
    span: Span,
}

impl Shared {
    fn chassis_control(&self, control: ChassisControl) -> Result<Outcome> {
        let _enter = self.span.enter();
        if self.profile.chassis_control() == Support::NotApplicable {
            return Ok(Outcome::Unsupported(NO_CHASSIS));
        }
        self.ipmi.execute(ChassisControlCommand { control })?;
        tracing::info!(?control, "chassis control issued");
        Ok(Outcome::Applied)
    }

    fn set_boot_target(&self, target: BootTarget) -> Result<Outcome> {
        let _enter = self.span.enter();
        if self.profile.chassis_control() == Support::NotApplicable {
            return Ok(Outcome::Unsupported(NO_CHASSIS));
        }
        let qualifiers = self.profile.qualifiers(target);
        self.ipmi.execute(SetBootFlags::from(qualifiers))?;
        tracing::info!(
            %target,
            uefi = qualifiers.uefi,
            device = qualifiers.device,
            "boot target set"
        );
        Ok(Outcome::Applied)
    }
}

/// Façade for software running on the managed host itself.
#[derive(Debug)]
pub struct InBand {
    shared: Shared,
    efi_dir: PathBuf,
    provisioner: Provisioner,
}

impl InBand {
    pub(crate) fn new(
        ipmi: Ipmi,
        profile: VendorProfile,
        board: Board,
        span: Span,
        efi_dir: PathBuf,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provisioner: Provisioner::new(ipmi.clone()).retry_policy(retry),
            shared: Shared {
                ipmi,
                profile,
                board,
                span,
            },
            efi_dir,
        }
    }

    /// Vendor strategy in use.
    pub fn profile(&self) -> VendorProfile {
        self.shared.profile
    }

    /// Mode the running system booted in: UEFI when the firmware exposes its EFI
    /// directory, legacy otherwise.
    pub fn firmware_mode(&self) -> FirmwareMode {
        firmware_mode_at(&self.efi_dir)
    }

    /// Switch the firmware boot type for subsequent boots.
    pub fn set_firmware_mode(&self, mode: FirmwareMode) -> Result<Outcome> {
        let _enter = self.shared.span.enter();
        match self.shared.profile.firmware_mode_switch() {
            Support::Supported => {}
            Support::NotApplicable => return Ok(Outcome::Unsupported(NO_FIRMWARE_SWITCH)),
            Support::NotImplemented => {
                return Err(self.shared.profile.not_implemented("set firmware mode"));
            }
        }
        let flags = vendor::firmware_mode_flags(mode)
            .ok_or(Error::InvalidArgument("firmware mode must be legacy or uefi"))?;
        if self.firmware_mode() == mode {
            return Ok(Outcome::Unchanged);
        }
        self.shared.ipmi.execute(SetBootFlags::from(flags))?;
        tracing::info!(%mode, "firmware mode switched");
        Ok(Outcome::Applied)
    }

    /// LAN, controller and FRU records of the local BMC. `None` when unreadable.
    pub fn bmc(&self) -> Option<Bmc> {
        let _enter = self.shared.span.enter();
        Bmc::read(&self.shared.ipmi)
    }

    /// Create or overwrite a BMC account and return its password.
    pub fn create_bmc_user(
        &self,
        user: &BmcUser,
        privilege: PrivilegeLevel,
        password: Option<SecretString>,
        constraints: PasswordConstraints,
    ) -> Result<SecretString> {
        let _enter = self.shared.span.enter();
        self.provisioner
            .create_user(user, privilege, password, constraints)
    }

    /// Replace the password of `user_id` and return the new one.
    pub fn change_bmc_password(
        &self,
        user_id: u8,
        password: Option<SecretString>,
        constraints: PasswordConstraints,
    ) -> Result<SecretString> {
        let _enter = self.shared.span.enter();
        self.provisioner
            .change_password(user_id, password, constraints)
    }

    /// Test `candidate` against the stored password of `user_id`.
    pub fn check_bmc_password(
        &self,
        user_id: u8,
        candidate: &SecretString,
        width: PasswordWidth,
    ) -> Result<PasswordCheck> {
        let _enter = self.shared.span.enter();
        self.provisioner.check_password(user_id, candidate, width)
    }
}

fn firmware_mode_at(efi_dir: &Path) -> FirmwareMode {
    if efi_dir.is_dir() {
        FirmwareMode::Uefi
    } else {
        FirmwareMode::Legacy
    }
}

impl Hal for InBand {
    fn board(&self) -> &Board {
        &self.shared.board
    }

    fn uuid(&self) -> Result<Uuid> {
        let _enter = self.shared.span.enter();
        Ok(self.shared.ipmi.system_guid()?.to_uuid())
    }

    fn power_off(&self) -> Result<Outcome> {
        self.shared.chassis_control(ChassisControl::PowerDown)
    }

    fn power_cycle(&self) -> Result<Outcome> {
        self.shared.chassis_control(ChassisControl::PowerCycle)
    }

    fn power_reset(&self) -> Result<Outcome> {
        self.shared.chassis_control(ChassisControl::HardReset)
    }

    fn set_boot_target(&self, target: BootTarget) -> Result<Outcome> {
        self.shared.set_boot_target(target)
    }
}

/// Façade for a BMC reached over the network.
pub struct OutBand {
    shared: Shared,
    redfish: Box<dyn Redfish>,
    convergence: ConvergencePolicy,
}

impl core::fmt::Debug for OutBand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OutBand")
            .field("shared", &self.shared)
            .field("convergence", &self.convergence)
            .finish_non_exhaustive()
    }
}

impl OutBand {
    pub(crate) fn new(
        ipmi: Ipmi,
        profile: VendorProfile,
        board: Board,
        span: Span,
        redfish: Box<dyn Redfish>,
        convergence: ConvergencePolicy,
    ) -> Self {
        Self {
            shared: Shared {
                ipmi,
                profile,
                board,
                span,
            },
            redfish,
            convergence,
        }
    }

    /// Vendor strategy in use.
    pub fn profile(&self) -> VendorProfile {
        self.shared.profile
    }

    /// Current power state, from Redfish or, when Redfish cannot tell, chassis status.
    pub fn power_state(&self) -> Result<PowerState> {
        let _enter = self.shared.span.enter();
        match self.redfish.power_state()? {
            PowerState::Unknown => {
                tracing::debug!("redfish power state unknown, asking chassis status");
                let status = self.shared.ipmi.chassis_status()?;
                Ok(if status.system_power_on {
                    PowerState::On
                } else {
                    PowerState::Off
                })
            }
            state => Ok(state),
        }
    }

    /// Power on.
    pub fn power_on(&self) -> Result<Outcome> {
        self.shared.chassis_control(ChassisControl::PowerUp)
    }

    /// Power on and poll until the machine reports on.
    pub fn power_on_and_wait(&self) -> Result<PowerState> {
        self.apply_and_wait(self.power_on()?, PowerState::On)
    }

    /// Power off and poll until the machine reports off.
    pub fn power_off_and_wait(&self) -> Result<PowerState> {
        self.apply_and_wait(self.power_off()?, PowerState::Off)
    }

    fn apply_and_wait(&self, outcome: Outcome, target: PowerState) -> Result<PowerState> {
        if let Outcome::Unsupported(_) = outcome {
            return self.power_state();
        }
        convergence::wait_for(self, target, self.convergence)
    }

    /// Identify LED state, from Redfish or, when Redfish cannot tell, chassis status.
    pub fn identify_led_state(&self) -> Result<IdentifyLedState> {
        let _enter = self.shared.span.enter();
        if self.shared.profile.identify_led() == Support::NotApplicable {
            return Ok(IdentifyLedState::Unknown);
        }
        match self.redfish.identify_led()? {
            IdentifyLedState::Unknown => Ok(self
                .shared
                .ipmi
                .chassis_status()?
                .identify
                .unwrap_or(IdentifyLedState::Unknown)),
            state => Ok(state),
        }
    }

    /// Drive the identify LED to `state`.
    pub fn set_identify_led(&self, state: IdentifyLedState) -> Result<Outcome> {
        let _enter = self.shared.span.enter();
        match self.shared.profile.identify_led() {
            Support::Supported => {}
            Support::NotApplicable => return Ok(Outcome::Unsupported(NO_IDENTIFY_LED)),
            Support::NotImplemented => {
                return Err(self.shared.profile.not_implemented("set identify led"));
            }
        }
        let command = match state {
            IdentifyLedState::On => ChassisIdentify::on(),
            IdentifyLedState::Off => ChassisIdentify::off(),
            IdentifyLedState::Unknown => {
                return Err(Error::InvalidArgument("identify led state must be on or off"));
            }
        };
        self.shared.ipmi.execute(command)?;
        tracing::info!(%state, "identify led set");
        Ok(Outcome::Applied)
    }

    /// Light the identify LED.
    pub fn identify_led_on(&self) -> Result<Outcome> {
        self.set_identify_led(IdentifyLedState::On)
    }

    /// Turn the identify LED off.
    pub fn identify_led_off(&self) -> Result<Outcome> {
        self.set_identify_led(IdentifyLedState::Off)
    }
}

impl PowerStateSource for OutBand {
    fn power_state(&self) -> Result<PowerState> {
        OutBand::power_state(self)
    }
}

impl Hal for OutBand {
    fn board(&self) -> &Board {
        &self.shared.board
    }

    fn uuid(&self) -> Result<Uuid> {
        let _enter = self.shared.span.enter();
        self.redfish.uuid()
    }

    fn power_off(&self) -> Result<Outcome> {
        self.shared.chassis_control(ChassisControl::PowerDown)
    }

    fn power_cycle(&self) -> Result<Outcome> {
        self.shared.chassis_control(ChassisControl::PowerCycle)
    }

    fn power_reset(&self) -> Result<Outcome> {
        self.shared.chassis_control(ChassisControl::HardReset)
    }

    fn set_boot_target(&self, target: BootTarget) -> Result<Outcome> {
        self.shared.set_boot_target(target)
    }
}
