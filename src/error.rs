use std::io;

use thiserror::Error;

use crate::types::PowerState;
use crate::vendor::Vendor;

/// Result type used across this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The command tool could not be run or exited unsuccessfully.
    ///
    /// `command` is the argument vector as run, with credentials left out.
    #[error("`{command}` failed: {cause}: {output}")]
    Execution {
        /// Command line that was executed.
        command: String,
        /// Captured stdout and stderr.
        output: String,
        /// Why the execution is considered failed.
        #[source]
        cause: ExecutionCause,
    },

    /// An IPMI command completed with a non-zero completion code.
    #[error("ipmi netfn {netfn:#04x} cmd {cmd:#04x} completion code: {completion_code:#04x}")]
    CompletionCode {
        /// Network function of the rejected request.
        netfn: u8,
        /// Command number of the rejected request.
        cmd: u8,
        /// Raw completion code returned by the BMC.
        completion_code: u8,
    },

    /// Peer responded with an unexpected or unparseable payload.
    #[error("protocol error: {0}")]
    Protocol(&'static str),

    /// Invalid caller-supplied argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The board vendor has no façade implementation.
    #[error("unsupported vendor: {vendor:?}")]
    UnsupportedVendor {
        /// Vendor string as read from the board.
        vendor: String,
    },

    /// The operation exists but has no implementation for this vendor.
    #[error("{operation} is not implemented for {vendor}")]
    NotImplemented {
        /// Operation name.
        operation: &'static str,
        /// Vendor the operation was dispatched to.
        vendor: Vendor,
    },

    /// The BMC endpoint could not be reached.
    #[error("{endpoint} is unreachable: {reason}")]
    Unreachable {
        /// `host:port` of the BMC.
        endpoint: String,
        /// Underlying failure.
        reason: String,
    },

    /// Power state did not reach the target within the polling budget.
    #[error("power state did not reach {target} after {attempts} reads, last observed {last}")]
    ConvergenceTimeout {
        /// Requested terminal state.
        target: PowerState,
        /// State returned by the final read.
        last: PowerState,
        /// Number of reads performed.
        attempts: u32,
    },

    /// A user-provisioning step failed after all of its attempts.
    #[error("user provisioning step `{step}` failed after {attempts} attempt(s)")]
    Provisioning {
        /// Step name.
        step: &'static str,
        /// Attempts made before giving up.
        attempts: u32,
        /// Error of the final attempt.
        #[source]
        source: Box<Error>,
    },

    /// Error reported by the out-of-band HTTP capability.
    #[error("redfish: {0}")]
    Redfish(String),
}

/// Reason an [`Error::Execution`] was raised.
#[derive(Debug, Error)]
pub enum ExecutionCause {
    /// The process could not be spawned.
    #[error("spawn failed: {0}")]
    Spawn(#[from] io::Error),

    /// The process exited with a non-zero status (`None` when killed by a signal).
    #[error("exit status {}", describe_status(.0))]
    Status(Option<i32>),
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

impl Error {
    pub(crate) fn execution(
        command: impl Into<String>,
        output: impl Into<String>,
        cause: ExecutionCause,
    ) -> Self {
        Self::Execution {
            command: command.into(),
            output: output.into(),
            cause,
        }
    }

    /// Captured tool output, when the error carries one.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Execution { output, .. } => Some(output),
            Self::Provisioning { source, .. } => source.output(),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Execution { .. } => "execution",
            Self::CompletionCode { .. } => "completion_code",
            Self::Protocol(_) => "protocol",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::UnsupportedVendor { .. } => "unsupported_vendor",
            Self::NotImplemented { .. } => "not_implemented",
            Self::Unreachable { .. } => "unreachable",
            Self::ConvergenceTimeout { .. } => "convergence_timeout",
            Self::Provisioning { .. } => "provisioning",
            Self::Redfish(_) => "redfish",
        }
    }
}
