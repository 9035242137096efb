use std::path::PathBuf;
use std::process::Command;
use std::sync::Mutex;

use crate::error::{Error, ExecutionCause, Result};
use crate::secret::SecretString;
use crate::transport::Transport;

const DEFAULT_PROGRAM: &str = "ipmitool";

/// Environment variable `ipmitool -E` reads the session password from.
const PASSWORD_ENV: &str = "IPMITOOL_PASSWORD";

/// Default RMCP+ port.
pub const DEFAULT_PORT: u16 = 623;

/// Remote BMC reached through an `ipmitool -I lanplus` session.
#[derive(Debug, Clone)]
pub struct LanEndpoint {
    /// BMC host name or address.
    pub host: String,
    /// RMCP+ port.
    pub port: u16,
    /// Session user.
    pub username: String,
    /// Session password.
    pub password: SecretString,
}

impl LanEndpoint {
    /// `host:port`, for diagnostics.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Blocking [`Transport`] that runs the `ipmitool` binary.
///
/// One invocation runs at a time per instance. The LAN password only ever reaches the
/// child process environment, inside that critical section, and is never part of the
/// argument vector or of error messages.
#[derive(Debug)]
pub struct IpmiTool {
    program: PathBuf,
    lan: Option<LanEndpoint>,
    lock: Mutex<()>,
}

impl IpmiTool {
    /// Talk to the local BMC through the host's IPMI device.
    pub fn local() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            lan: None,
            lock: Mutex::new(()),
        }
    }

    /// Talk to a remote BMC over a LAN+ session.
    pub fn lanplus(endpoint: LanEndpoint) -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            lan: Some(endpoint),
            lock: Mutex::new(()),
        }
    }

    /// Use a different `ipmitool` binary.
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// The LAN endpoint, if this is a remote transport.
    pub fn endpoint(&self) -> Option<&LanEndpoint> {
        self.lan.as_ref()
    }

    /// Arguments passed to the program: interface selection, then `args`.
    fn command_line(&self, args: &[String]) -> Vec<String> {
        let mut line = Vec::with_capacity(args.len() + 9);
        if let Some(lan) = &self.lan {
            line.extend([
                "-I".to_string(),
                "lanplus".to_string(),
                "-H".to_string(),
                lan.host.clone(),
                "-p".to_string(),
                lan.port.to_string(),
                "-U".to_string(),
                lan.username.clone(),
                "-E".to_string(),
            ]);
        }
        line.extend(args.iter().cloned());
        line
    }

    fn display(&self, line: &[String]) -> String {
        let mut out = self.program.display().to_string();
        for arg in line {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }

    fn run_locked(&self, args: &[String]) -> Result<String> {
        let line = self.command_line(args);
        let mut command = Command::new(&self.program);
        command.args(&line);
        if let Some(lan) = &self.lan {
            command.env(PASSWORD_ENV, lan.password.expose());
        }

        let output = match command.output() {
            Ok(output) => output,
            Err(e) => {
                return Err(Error::execution(
                    self.display(&line),
                    String::new(),
                    ExecutionCause::Spawn(e),
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let mut captured = stdout;
        captured.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(Error::execution(
            self.display(&line),
            captured.trim().to_string(),
            ExecutionCause::Status(output.status.code()),
        ))
    }
}

impl Transport for IpmiTool {
    fn run(&self, args: &[String]) -> Result<String> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::Protocol("transport lock poisoned"))?;
        self.run_locked(args)
    }
}
