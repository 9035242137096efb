//! IPMI 2.0 request encoding for the commands this crate issues.
//!
//! Every command is a plain value; encoding is a pure function of that value, so the
//! byte sequences below can be compared literally against the IPMI specification tables.

use crate::error::{Error, Result};
use crate::secret::SecretString;
use crate::types::{
    ChassisControl, ChassisStatus, IdentifyLedState, PowerRestorePolicy, PrivilegeLevel,
    RawResponse, SystemGuid,
};

/// Network function codes.
pub mod netfn {
    /// Chassis requests.
    pub const CHASSIS: u8 = 0x00;
    /// Application requests.
    pub const APP: u8 = 0x06;
}

/// Width of the user name field in `Set User Name`.
pub const USER_NAME_LEN: usize = 16;

/// Width of the password field in 20-byte password mode.
pub const PASSWORD_LEN: usize = 20;

/// Largest user id addressable by the user management commands.
pub const MAX_USER_ID: u8 = 0x3F;

/// Boot flags parameter selector for `Set System Boot Options`.
const BOOT_FLAGS_PARAMETER: u8 = 0x05;

/// A typed IPMI command (single request/response).
pub trait Command {
    /// Parsed output type.
    type Output;

    /// Network Function (NetFn) for the request.
    const NETFN: u8;

    /// Command number.
    const CMD: u8;

    /// Payload offset from which bytes are secret. Those bytes are masked in hex
    /// dumps and in the command line of execution errors.
    const SECRET_OFFSET: Option<usize> = None;

    /// Encode request payload bytes (excluding NetFn/Cmd framing).
    fn request_data(&self) -> Vec<u8>;

    /// Parse a raw response into the typed output.
    fn parse_response(&self, response: RawResponse) -> Result<Self::Output>;

    /// Full request: NetFn, command, then payload.
    fn encode(&self) -> Vec<u8> {
        let data = self.request_data();
        let mut out = Vec::with_capacity(data.len() + 2);
        out.push(Self::NETFN);
        out.push(Self::CMD);
        out.extend_from_slice(&data);
        out
    }
}

fn ok_data<C: Command + ?Sized>(response: &RawResponse) -> Result<&[u8]> {
    if response.completion_code != 0x00 {
        return Err(Error::CompletionCode {
            netfn: C::NETFN,
            cmd: C::CMD,
            completion_code: response.completion_code,
        });
    }
    Ok(&response.data)
}

/// Copy `src` into a field of exactly `N` bytes: shorter input is zero padded,
/// longer input is truncated.
pub fn fixed_width<const N: usize>(src: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    let n = src.len().min(N);
    out[..n].copy_from_slice(&src[..n]);
    out
}

/// `Get System GUID` (App NetFn, cmd 0x37).
#[derive(Debug, Clone, Copy)]
pub struct GetSystemGuid;

impl Command for GetSystemGuid {
    type Output = SystemGuid;
    const NETFN: u8 = netfn::APP;
    const CMD: u8 = 0x37;

    fn request_data(&self) -> Vec<u8> {
        Vec::new()
    }

    fn parse_response(&self, response: RawResponse) -> Result<Self::Output> {
        parse_system_guid(ok_data::<Self>(&response)?)
    }
}

/// `Get Chassis Status` (Chassis NetFn, cmd 0x01).
#[derive(Debug, Clone, Copy)]
pub struct GetChassisStatus;

impl Command for GetChassisStatus {
    type Output = ChassisStatus;
    const NETFN: u8 = netfn::CHASSIS;
    const CMD: u8 = 0x01;

    fn request_data(&self) -> Vec<u8> {
        Vec::new()
    }

    fn parse_response(&self, response: RawResponse) -> Result<Self::Output> {
        parse_chassis_status(ok_data::<Self>(&response)?)
    }
}

/// `Chassis Control` (Chassis NetFn, cmd 0x02).
#[derive(Debug, Clone, Copy)]
pub struct ChassisControlCommand {
    /// Control operation.
    pub control: ChassisControl,
}

impl Command for ChassisControlCommand {
    type Output = ();
    const NETFN: u8 = netfn::CHASSIS;
    const CMD: u8 = 0x02;

    fn request_data(&self) -> Vec<u8> {
        vec![self.control.as_u8()]
    }

    fn parse_response(&self, response: RawResponse) -> Result<Self::Output> {
        let _ = ok_data::<Self>(&response)?;
        Ok(())
    }
}

/// `Chassis Identify` (Chassis NetFn, cmd 0x04).
#[derive(Debug, Clone, Copy)]
pub struct ChassisIdentify {
    /// Identify interval in seconds; zero turns the LED off unless `force` is set.
    pub interval: u8,
    /// Keep the LED on until told otherwise.
    pub force: bool,
}

impl ChassisIdentify {
    /// Light the LED indefinitely.
    pub fn on() -> Self {
        Self {
            interval: 0,
            force: true,
        }
    }

    /// Turn the LED off.
    pub fn off() -> Self {
        Self {
            interval: 0,
            force: false,
        }
    }
}

impl Command for ChassisIdentify {
    type Output = ();
    const NETFN: u8 = netfn::CHASSIS;
    const CMD: u8 = 0x04;

    fn request_data(&self) -> Vec<u8> {
        vec![self.interval, u8::from(self.force)]
    }

    fn parse_response(&self, response: RawResponse) -> Result<Self::Output> {
        let _ = ok_data::<Self>(&response)?;
        Ok(())
    }
}

/// `Set System Boot Options` (Chassis NetFn, cmd 0x08) writing the boot flags parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBootFlags {
    /// Boot flags data byte 1: valid, persistence and BIOS boot type bits.
    pub uefi_qualifier: u8,
    /// Boot flags data byte 2: boot device selector.
    pub device_qualifier: u8,
}

impl Command for SetBootFlags {
    type Output = ();
    const NETFN: u8 = netfn::CHASSIS;
    const CMD: u8 = 0x08;

    fn request_data(&self) -> Vec<u8> {
        vec![
            BOOT_FLAGS_PARAMETER,
            self.uefi_qualifier,
            self.device_qualifier,
            0x00,
            0x00,
            0x00,
        ]
    }

    fn parse_response(&self, response: RawResponse) -> Result<Self::Output> {
        let _ = ok_data::<Self>(&response)?;
        Ok(())
    }
}

/// `Set User Access` (App NetFn, cmd 0x43).
#[derive(Debug, Clone, Copy)]
pub struct SetUserAccess {
    /// Channel number (low nibble).
    pub channel: u8,
    /// User id.
    pub user_id: u8,
    /// Maximum privilege on the channel.
    pub privilege: PrivilegeLevel,
    /// Restrict the user to callback sessions.
    pub callback_only: bool,
    /// Enable link authentication.
    pub link_auth: bool,
    /// Enable IPMI messaging.
    pub ipmi_messaging: bool,
}

impl SetUserAccess {
    /// Access for a management user: messaging and link auth on, no callback restriction.
    pub fn new(channel: u8, user_id: u8, privilege: PrivilegeLevel) -> Self {
        Self {
            channel,
            user_id,
            privilege,
            callback_only: false,
            link_auth: true,
            ipmi_messaging: true,
        }
    }
}

impl Command for SetUserAccess {
    type Output = ();
    const NETFN: u8 = netfn::APP;
    const CMD: u8 = 0x43;

    fn request_data(&self) -> Vec<u8> {
        // Bit 7 asks the BMC to apply bits 6..4.
        let flags = 0x80
            | (u8::from(self.callback_only) << 6)
            | (u8::from(self.link_auth) << 5)
            | (u8::from(self.ipmi_messaging) << 4)
            | (self.channel & 0x0F);
        vec![
            flags,
            self.user_id & MAX_USER_ID,
            self.privilege.as_u8() & 0x0F,
            0x00,
        ]
    }

    fn parse_response(&self, response: RawResponse) -> Result<Self::Output> {
        let _ = ok_data::<Self>(&response)?;
        Ok(())
    }
}

/// `Set User Name` (App NetFn, cmd 0x45).
#[derive(Debug, Clone)]
pub struct SetUserName {
    /// User id.
    pub user_id: u8,
    /// Name; encoded as exactly 16 bytes.
    pub name: String,
}

impl Command for SetUserName {
    type Output = ();
    const NETFN: u8 = netfn::APP;
    const CMD: u8 = 0x45;

    fn request_data(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + USER_NAME_LEN);
        out.push(self.user_id & MAX_USER_ID);
        out.extend_from_slice(&fixed_width::<USER_NAME_LEN>(self.name.as_bytes()));
        out
    }

    fn parse_response(&self, response: RawResponse) -> Result<Self::Output> {
        let _ = ok_data::<Self>(&response)?;
        Ok(())
    }
}

const PASSWORD_OP_DISABLE: u8 = 0x00;
const PASSWORD_OP_ENABLE: u8 = 0x01;
const PASSWORD_OP_SET: u8 = 0x02;
const PASSWORD_OP_TEST: u8 = 0x03;

/// Bit 7 of the user id byte selects 20-byte password storage.
const PASSWORD_20_BYTES: u8 = 0x80;

/// `Set User Password` (App NetFn, cmd 0x47), operation "set password".
#[derive(Debug, Clone)]
pub struct SetUserPassword {
    /// User id.
    pub user_id: u8,
    /// Password; encoded as exactly 20 bytes.
    pub password: SecretString,
}

impl Command for SetUserPassword {
    type Output = ();
    const NETFN: u8 = netfn::APP;
    const CMD: u8 = 0x47;
    const SECRET_OFFSET: Option<usize> = Some(2);

    fn request_data(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + PASSWORD_LEN);
        out.push((self.user_id & MAX_USER_ID) | PASSWORD_20_BYTES);
        out.push(PASSWORD_OP_SET);
        out.extend_from_slice(&fixed_width::<PASSWORD_LEN>(self.password.expose().as_bytes()));
        out
    }

    fn parse_response(&self, response: RawResponse) -> Result<Self::Output> {
        let _ = ok_data::<Self>(&response)?;
        Ok(())
    }
}

/// `Set User Password` (App NetFn, cmd 0x47), operations "enable user" / "disable user".
#[derive(Debug, Clone, Copy)]
pub struct SetUserEnabled {
    /// User id.
    pub user_id: u8,
    /// Enable (true) or disable (false).
    pub enabled: bool,
}

impl Command for SetUserEnabled {
    type Output = ();
    const NETFN: u8 = netfn::APP;
    const CMD: u8 = 0x47;

    fn request_data(&self) -> Vec<u8> {
        let op = if self.enabled {
            PASSWORD_OP_ENABLE
        } else {
            PASSWORD_OP_DISABLE
        };
        vec![self.user_id & MAX_USER_ID, op]
    }

    fn parse_response(&self, response: RawResponse) -> Result<Self::Output> {
        let _ = ok_data::<Self>(&response)?;
        Ok(())
    }
}

/// Password storage width used by `Set User Password`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordWidth {
    /// IPMI 1.5 style 16-byte password.
    Sixteen,
    /// IPMI 2.0 style 20-byte password.
    Twenty,
}

/// Result of a password test against the BMC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    /// The candidate password is the stored one.
    Valid,
    /// The BMC rejected the candidate; the password needs changing.
    Incorrect,
    /// The stored password uses the other width.
    WrongSize,
}

/// `Set User Password` (App NetFn, cmd 0x47), operation "test password".
#[derive(Debug, Clone)]
pub struct TestUserPassword {
    /// User id.
    pub user_id: u8,
    /// Candidate password.
    pub password: SecretString,
    /// Width the candidate is compared with.
    pub width: PasswordWidth,
}

impl Command for TestUserPassword {
    type Output = PasswordCheck;
    const NETFN: u8 = netfn::APP;
    const CMD: u8 = 0x47;
    const SECRET_OFFSET: Option<usize> = Some(2);

    fn request_data(&self) -> Vec<u8> {
        let bytes = self.password.expose().as_bytes();
        let mut out = Vec::with_capacity(2 + PASSWORD_LEN);
        match self.width {
            PasswordWidth::Sixteen => {
                out.push(self.user_id & MAX_USER_ID);
                out.push(PASSWORD_OP_TEST);
                out.extend_from_slice(&fixed_width::<16>(bytes));
            }
            PasswordWidth::Twenty => {
                out.push((self.user_id & MAX_USER_ID) | PASSWORD_20_BYTES);
                out.push(PASSWORD_OP_TEST);
                out.extend_from_slice(&fixed_width::<PASSWORD_LEN>(bytes));
            }
        }
        out
    }

    fn parse_response(&self, response: RawResponse) -> Result<Self::Output> {
        match response.completion_code {
            0x00 => Ok(PasswordCheck::Valid),
            0x80 => Ok(PasswordCheck::Incorrect),
            0x81 => Ok(PasswordCheck::WrongSize),
            _ => ok_data::<Self>(&response).map(|_| PasswordCheck::Valid),
        }
    }
}

/// Serial-over-LAN bit in the standard payload bitmap.
const PAYLOAD_SOL: u8 = 0x02;

/// `Set User Payload Access` (App NetFn, cmd 0x4C).
#[derive(Debug, Clone, Copy)]
pub struct SetUserPayloadAccess {
    /// Channel number (low nibble).
    pub channel: u8,
    /// User id.
    pub user_id: u8,
    /// Enable (true) or disable (false) the selected payloads.
    pub enable: bool,
    /// Select the serial-over-LAN payload.
    pub sol: bool,
}

impl Command for SetUserPayloadAccess {
    type Output = ();
    const NETFN: u8 = netfn::APP;
    const CMD: u8 = 0x4C;

    fn request_data(&self) -> Vec<u8> {
        let operation = if self.enable { 0x00 } else { 0x40 };
        let payloads = if self.sol { PAYLOAD_SOL } else { 0x00 };
        vec![
            self.channel & 0x0F,
            operation | (self.user_id & MAX_USER_ID),
            payloads,
            0x00,
            0x00,
            0x00,
        ]
    }

    fn parse_response(&self, response: RawResponse) -> Result<Self::Output> {
        let _ = ok_data::<Self>(&response)?;
        Ok(())
    }
}

pub(crate) fn parse_system_guid(data: &[u8]) -> Result<SystemGuid> {
    if data.len() < 16 {
        return Err(Error::Protocol("Get System GUID response too short"));
    }

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&data[..16]);
    Ok(SystemGuid { bytes })
}

pub(crate) fn parse_chassis_status(data: &[u8]) -> Result<ChassisStatus> {
    if data.len() < 3 {
        return Err(Error::Protocol("Get Chassis Status response too short"));
    }

    let b1 = data[0];
    let b3 = data[2];

    let power_restore_policy = match (b1 >> 5) & 0x03 {
        0x00 => PowerRestorePolicy::AlwaysOff,
        0x01 => PowerRestorePolicy::Previous,
        0x02 => PowerRestorePolicy::AlwaysOn,
        other => PowerRestorePolicy::Unknown(other),
    };

    // Bits 5:4 hold the identify state, valid only when bit 6 is set.
    let identify = if b3 & 0x40 != 0 {
        Some(match (b3 >> 4) & 0x03 {
            0x00 => IdentifyLedState::Off,
            0x01 | 0x02 => IdentifyLedState::On,
            _ => IdentifyLedState::Unknown,
        })
    } else {
        None
    };

    Ok(ChassisStatus {
        system_power_on: b1 & 0x01 != 0,
        power_overload: b1 & 0x02 != 0,
        main_power_fault: b1 & 0x08 != 0,
        power_restore_policy,
        identify,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_width_pads_truncates_and_keeps() {
        assert_eq!(fixed_width::<4>(b"ab"), *b"ab\0\0");
        assert_eq!(fixed_width::<4>(b"abcdef"), *b"abcd");
        assert_eq!(fixed_width::<4>(b"abcd"), *b"abcd");
        assert_eq!(fixed_width::<4>(b""), [0u8; 4]);
    }

    #[test]
    fn parse_system_guid_copies_bytes() {
        let mut data = [0u8; 16];
        for (i, b) in data.iter_mut().enumerate() {
            *b = i as u8;
        }
        let guid = parse_system_guid(&data).expect("parse");
        assert_eq!(guid.bytes, data);
        assert!(parse_system_guid(&data[..15]).is_err());
    }

    #[test]
    fn parse_chassis_status_fields() {
        let data = [0x5F, 0x19, 0x7F];
        let status = parse_chassis_status(&data).expect("parse");

        assert!(status.system_power_on);
        assert!(status.power_overload);
        assert!(status.main_power_fault);
        assert!(matches!(
            status.power_restore_policy,
            PowerRestorePolicy::AlwaysOn
        ));
        assert_eq!(status.identify, Some(IdentifyLedState::Unknown));

        let status = parse_chassis_status(&[0x00, 0x00, 0x60]).expect("parse");
        assert!(!status.system_power_on);
        assert_eq!(status.identify, Some(IdentifyLedState::On));

        let status = parse_chassis_status(&[0x01, 0x00, 0x00]).expect("parse");
        assert_eq!(status.identify, None);
    }

    #[test]
    fn test_password_decodes_completion_codes() {
        let cmd = TestUserPassword {
            user_id: 2,
            password: SecretString::from("secret"),
            width: PasswordWidth::Twenty,
        };
        let check = |cc| {
            cmd.parse_response(RawResponse {
                completion_code: cc,
                data: Vec::new(),
            })
        };
        assert_eq!(check(0x00).expect("valid"), PasswordCheck::Valid);
        assert_eq!(check(0x80).expect("incorrect"), PasswordCheck::Incorrect);
        assert_eq!(check(0x81).expect("wrong size"), PasswordCheck::WrongSize);
        assert!(matches!(
            check(0xC1),
            Err(Error::CompletionCode {
                netfn: 0x06,
                cmd: 0x47,
                completion_code: 0xC1
            })
        ));
    }

    #[test]
    fn test_password_sixteen_byte_mode_clears_width_bit() {
        let cmd = TestUserPassword {
            user_id: 3,
            password: SecretString::from("pw"),
            width: PasswordWidth::Sixteen,
        };
        let data = cmd.request_data();
        assert_eq!(data.len(), 18);
        assert_eq!(&data[..4], &[0x03, 0x03, b'p', b'w']);
    }
}
