//! Executes encoded commands through a [`Transport`].
//!
//! Raw requests go out as `ipmitool raw <netfn> <cmd> <data...>`. A command the BMC
//! rejects makes `ipmitool` exit non-zero with `rsp=0xNN` in its message; that code is
//! recovered and handed back to the command's own response parser.

use core::fmt;
use std::sync::Arc;
use std::time::Instant;

use zeroize::Zeroize;

use crate::commands::{Command, GetChassisStatus, GetSystemGuid};
use crate::error::{Error, Result};
use crate::parse::{BmcInfo, Fru, LanConfig, Record};
use crate::transport::Transport;
use crate::types::{ChassisStatus, RawResponse, SystemGuid};

/// Default LAN channel printed by [`Ipmi::lan_config`].
pub const DEFAULT_LAN_CHANNEL: u8 = 1;

/// A command executor bound to one transport.
#[derive(Clone)]
pub struct Ipmi {
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Ipmi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ipmi").finish_non_exhaustive()
    }
}

impl Ipmi {
    /// Wrap a transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Execute a typed command (single request/response).
    pub fn execute<C: Command>(&self, command: C) -> Result<C::Output> {
        let mut request = command.encode();
        let secret_from = C::SECRET_OFFSET.map(|offset| offset + 2);
        let response = self.send(&request, secret_from);
        if secret_from.is_some() {
            request.zeroize();
        }
        command.parse_response(response?)
    }

    /// Send an encoded request (`[netfn, cmd, data...]`) and return the raw response.
    ///
    /// A non-zero completion code is returned inside the response, not as an error.
    pub fn send_raw(&self, request: &[u8]) -> Result<RawResponse> {
        self.send(request, None)
    }

    fn send(&self, request: &[u8], secret_from: Option<usize>) -> Result<RawResponse> {
        let &[netfn, cmd, ..] = request else {
            return Err(Error::InvalidArgument("raw request needs netfn and cmd"));
        };
        crate::debug::dump_hex("request", request, secret_from);

        let start = Instant::now();
        let mut args = raw_args(request);
        let result = match self.transport.run(&args) {
            Ok(output) => parse_raw_output(&output).map(|data| RawResponse {
                completion_code: 0x00,
                data,
            }),
            Err(err) => match rejected_completion_code(&err) {
                Some(completion_code) => Ok(RawResponse {
                    completion_code,
                    data: Vec::new(),
                }),
                None => Err(match secret_from {
                    Some(from) => redact(err, &args, from),
                    None => err,
                }),
            },
        };
        let elapsed = start.elapsed();
        if secret_from.is_some() {
            args.zeroize();
        }

        match &result {
            Ok(resp) => {
                crate::debug::dump_hex("response", &resp.data, None);
                crate::observe::record_ok(netfn, cmd, elapsed, resp.completion_code)
            }
            Err(err) => crate::observe::record_err(netfn, cmd, elapsed, err),
        }
        result
    }

    /// Run a text subcommand (e.g. `["bmc", "info"]`) and return its output.
    pub fn run_text(&self, args: &[&str]) -> Result<String> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let result = self.transport.run(&args);
        if let Err(err) = &result {
            tracing::warn!(command = args.join(" "), error = %err, "ipmitool command failed");
        }
        result
    }

    /// `Get System GUID` (App NetFn, cmd 0x37).
    pub fn system_guid(&self) -> Result<SystemGuid> {
        self.execute(GetSystemGuid)
    }

    /// `Get Chassis Status` (Chassis NetFn, cmd 0x01).
    pub fn chassis_status(&self) -> Result<ChassisStatus> {
        self.execute(GetChassisStatus)
    }

    /// `ipmitool lan print <channel>`.
    pub fn lan_config(&self, channel: u8) -> Result<LanConfig> {
        let channel = channel.to_string();
        Ok(LanConfig::parse(&self.run_text(&["lan", "print", &channel])?))
    }

    /// `ipmitool bmc info`.
    pub fn bmc_info(&self) -> Result<BmcInfo> {
        Ok(BmcInfo::parse(&self.run_text(&["bmc", "info"])?))
    }

    /// `ipmitool fru print 0`.
    pub fn fru(&self) -> Result<Fru> {
        Ok(Fru::parse(&self.run_text(&["fru", "print", "0"])?))
    }
}

/// Argument vector for `ipmitool raw`: the verb, then every request byte as `0x%02x`.
pub fn raw_args(request: &[u8]) -> Vec<String> {
    let mut args = Vec::with_capacity(request.len() + 1);
    args.push("raw".to_string());
    args.extend(request.iter().map(|b| format!("0x{b:02x}")));
    args
}

/// Replace the request bytes from `secret_from` on with `0x**` in an execution error's
/// command line. `args` is the vector built by [`raw_args`].
fn redact(err: Error, args: &[String], secret_from: usize) -> Error {
    let (mut command, output, cause) = match err {
        Error::Execution {
            command,
            output,
            cause,
        } => (command, output, cause),
        other => return other,
    };
    let masked: Vec<&str> = args
        .iter()
        .enumerate()
        .map(|(i, arg)| if i > secret_from { "0x**" } else { arg.as_str() })
        .collect();
    let masked = masked.join(" ");
    let mut sent = args.join(" ");
    let redacted = match command.find(&sent) {
        Some(at) => format!("{}{masked}{}", &command[..at], &command[at + sent.len()..]),
        None => masked,
    };
    sent.zeroize();
    command.zeroize();
    Error::Execution {
        command: redacted,
        output,
        cause,
    }
}

fn parse_raw_output(output: &str) -> Result<Vec<u8>> {
    output
        .split_whitespace()
        .map(|token| {
            let digits = token.strip_prefix("0x").unwrap_or(token);
            u8::from_str_radix(digits, 16)
                .map_err(|_| Error::Protocol("unparseable raw response byte"))
        })
        .collect()
}

/// Completion code from an `ipmitool raw` failure message (`... rsp=0xcc): ...`).
fn rejected_completion_code(err: &Error) -> Option<u8> {
    let Error::Execution { output, .. } = err else {
        return None;
    };
    let start = output.find("rsp=0x")? + "rsp=0x".len();
    let digits: String = output[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .take(2)
        .collect();
    u8::from_str_radix(&digits, 16).ok()
}
