//! Running the management tool that carries IPMI requests.

use crate::error::Result;

/// Executes one management-tool invocation and returns its output.
///
/// Implementations decide whether the command runs against the local BMC device or a
/// remote LAN+ session; callers only see arguments in and text out.
pub trait Transport: Send + Sync {
    /// Run the tool with `args` and return its captured output.
    fn run(&self, args: &[String]) -> Result<String>;
}

pub(crate) mod process;

pub use process::{IpmiTool, LanEndpoint};
