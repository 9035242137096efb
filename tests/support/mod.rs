#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use bmc_hal::transport::Transport;
use bmc_hal::{
    BoardIdentity, BoardSource, Endpoint, Error, ExecutionCause, IdentifyLedState, PowerState,
    Redfish, RedfishConnector, Result,
};
use uuid::Uuid;

/// Records every invocation and answers from canned outputs. Unscripted commands
/// succeed with empty output.
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<Vec<String>>>,
    outputs: Mutex<HashMap<Vec<String>, String>>,
    failures: Mutex<Vec<(Vec<String>, u32)>>,
    rejections: Mutex<Vec<(Vec<String>, u8)>>,
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `args` with `output`.
    pub fn respond(&self, args: &[&str], output: &str) {
        self.outputs
            .lock()
            .unwrap()
            .insert(owned(args), output.to_string());
    }

    /// Fail the next `times` invocations starting with `prefix`.
    pub fn fail(&self, prefix: &[&str], times: u32) {
        self.failures.lock().unwrap().push((owned(prefix), times));
    }

    /// Reject every invocation starting with `prefix` with completion code `code`.
    pub fn reject(&self, prefix: &[&str], code: u8) {
        self.rejections.lock().unwrap().push((owned(prefix), code));
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Request bytes of every `raw` invocation, in order.
    pub fn raw_requests(&self) -> Vec<Vec<u8>> {
        self.calls()
            .iter()
            .filter(|args| args.first().map(String::as_str) == Some("raw"))
            .map(|args| {
                args[1..]
                    .iter()
                    .map(|b| u8::from_str_radix(b.trim_start_matches("0x"), 16).unwrap())
                    .collect()
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl Transport for MockTransport {
    fn run(&self, args: &[String]) -> Result<String> {
        self.calls.lock().unwrap().push(args.to_vec());
        let command = format!("ipmitool {}", args.join(" "));

        for (prefix, remaining) in self.failures.lock().unwrap().iter_mut() {
            if *remaining > 0 && args.starts_with(prefix) {
                *remaining -= 1;
                return Err(failed(
                    command,
                    "Error: Unable to establish IPMI session",
                ));
            }
        }
        for (prefix, code) in self.rejections.lock().unwrap().iter() {
            if args.starts_with(prefix) {
                return Err(failed(
                    command,
                    &format!("Unable to send RAW command (channel=0x0 netfn=0x6 lun=0x0 cmd=0x47 rsp=0x{code:02x}): Unknown"),
                ));
            }
        }
        Ok(self
            .outputs
            .lock()
            .unwrap()
            .get(args)
            .cloned()
            .unwrap_or_default())
    }
}

fn failed(command: String, output: &str) -> Error {
    Error::Execution {
        command,
        output: output.to_string(),
        cause: ExecutionCause::Status(Some(1)),
    }
}

pub struct MockBoard(pub Option<BoardIdentity>);

impl MockBoard {
    pub fn vendor(vendor: &str) -> Arc<Self> {
        Arc::new(Self(Some(identity(vendor))))
    }

    pub fn unreadable() -> Arc<Self> {
        Arc::new(Self(None))
    }
}

impl BoardSource for MockBoard {
    fn read_board(&self) -> Option<BoardIdentity> {
        self.0.clone()
    }
}

pub fn identity(vendor: &str) -> BoardIdentity {
    BoardIdentity {
        vendor: vendor.to_string(),
        model: "SYS-1029U".to_string(),
        part_number: "PN-42".to_string(),
        serial_number: "S123456".to_string(),
        bios_version: "3.4".to_string(),
        bios_vendor: Some("American Megatrends Inc.".to_string()),
        bios_date: Some("2021-05-04".to_string()),
    }
}

pub const UUID: &str = "4c4c4544-0042-3510-8052-b4c04f4e4432";

/// Redfish session replaying a power-state sequence; the last state repeats.
#[derive(Clone)]
pub struct MockRedfish {
    power: Arc<Mutex<VecDeque<PowerState>>>,
    identify: IdentifyLedState,
    board: BoardIdentity,
    pub reads: Arc<Mutex<u32>>,
}

impl MockRedfish {
    pub fn new(vendor: &str, power: &[PowerState]) -> Self {
        Self {
            power: Arc::new(Mutex::new(power.iter().copied().collect())),
            identify: IdentifyLedState::Off,
            board: identity(vendor),
            reads: Arc::new(Mutex::new(0)),
        }
    }

    pub fn identify(mut self, state: IdentifyLedState) -> Self {
        self.identify = state;
        self
    }

    pub fn power_reads(&self) -> u32 {
        *self.reads.lock().unwrap()
    }
}

impl Redfish for MockRedfish {
    fn power_state(&self) -> Result<PowerState> {
        *self.reads.lock().unwrap() += 1;
        let mut states = self.power.lock().unwrap();
        let state = if states.len() > 1 {
            states.pop_front()
        } else {
            states.front().copied()
        };
        Ok(state.unwrap_or(PowerState::Unknown))
    }

    fn identify_led(&self) -> Result<IdentifyLedState> {
        Ok(self.identify)
    }

    fn uuid(&self) -> Result<Uuid> {
        Ok(Uuid::parse_str(UUID).unwrap())
    }

    fn board_info(&self) -> Result<BoardIdentity> {
        Ok(self.board.clone())
    }
}

pub struct MockConnector {
    pub session: Option<MockRedfish>,
    pub endpoints: Mutex<Vec<String>>,
}

impl MockConnector {
    pub fn new(session: MockRedfish) -> Arc<Self> {
        Arc::new(Self {
            session: Some(session),
            endpoints: Mutex::new(Vec::new()),
        })
    }

    pub fn refusing() -> Arc<Self> {
        Arc::new(Self {
            session: None,
            endpoints: Mutex::new(Vec::new()),
        })
    }
}

impl RedfishConnector for MockConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Redfish>> {
        self.endpoints.lock().unwrap().push(endpoint.address());
        match &self.session {
            Some(session) => Ok(Box::new(session.clone())),
            None => Err(Error::Redfish("connection refused".to_string())),
        }
    }
}
