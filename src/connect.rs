use core::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::Span;

use crate::board::{Bmc, Board, BoardSource};
use crate::convergence::ConvergencePolicy;
use crate::error::{Error, Result};
use crate::hal::{Hal, InBand, OutBand};
use crate::ipmi::Ipmi;
use crate::provision::RetryPolicy;
use crate::redfish::{self, Endpoint, RedfishConnector};
use crate::secret::SecretString;
use crate::transport::process::DEFAULT_PORT;
use crate::transport::{IpmiTool, LanEndpoint, Transport};
use crate::types::Band;
use crate::vendor::{Vendor, VendorProfile};

const DEFAULT_EFI_DIR: &str = "/sys/firmware/efi";

/// An opened façade.
#[derive(Debug)]
pub enum Connection {
    /// Running on the managed host.
    InBand(InBand),
    /// Talking to the BMC over the network.
    OutBand(OutBand),
}

impl Connection {
    /// Open a connection with default settings; see [`ConnectionBuilder`].
    pub fn builder(band: Band) -> ConnectionBuilder {
        ConnectionBuilder::new(band)
    }

    /// Band of this connection.
    pub fn band(&self) -> Band {
        match self {
            Self::InBand(_) => Band::InBand,
            Self::OutBand(_) => Band::OutBand,
        }
    }

    /// Operations both bands share.
    pub fn hal(&self) -> &dyn Hal {
        match self {
            Self::InBand(hal) => hal,
            Self::OutBand(hal) => hal,
        }
    }

    /// The in-band façade, if this is one.
    pub fn in_band(&self) -> Option<&InBand> {
        match self {
            Self::InBand(hal) => Some(hal),
            Self::OutBand(_) => None,
        }
    }

    /// The out-of-band façade, if this is one.
    pub fn out_band(&self) -> Option<&OutBand> {
        match self {
            Self::OutBand(hal) => Some(hal),
            Self::InBand(_) => None,
        }
    }
}

/// Builder for [`Connection`].
pub struct ConnectionBuilder {
    band: Band,
    host: Option<String>,
    port: u16,
    redfish_port: u16,
    username: Option<String>,
    password: Option<SecretString>,
    program: Option<PathBuf>,
    board_source: Option<Arc<dyn BoardSource>>,
    redfish: Option<Arc<dyn RedfishConnector>>,
    transport: Option<Arc<dyn Transport>>,
    efi_dir: PathBuf,
    convergence: ConvergencePolicy,
    retry: RetryPolicy,
    span: Option<Span>,
}

impl fmt::Debug for ConnectionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionBuilder")
            .field("band", &self.band)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("redfish_port", &self.redfish_port)
            .field("username", &self.username)
            .field("password", &self.password)
            .field("program", &self.program)
            .field("efi_dir", &self.efi_dir)
            .field("convergence", &self.convergence)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ConnectionBuilder {
    /// Create a new builder.
    pub fn new(band: Band) -> Self {
        Self {
            band,
            host: None,
            port: DEFAULT_PORT,
            redfish_port: redfish::DEFAULT_PORT,
            username: None,
            password: None,
            program: None,
            board_source: None,
            redfish: None,
            transport: None,
            efi_dir: PathBuf::from(DEFAULT_EFI_DIR),
            convergence: ConvergencePolicy::default(),
            retry: RetryPolicy::default(),
            span: None,
        }
    }

    /// BMC host name or address (out-of-band).
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// RMCP+ port (out-of-band, default 623).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Redfish HTTPS port (out-of-band, default 443).
    pub fn redfish_port(mut self, port: u16) -> Self {
        self.redfish_port = port;
        self
    }

    /// BMC user (out-of-band).
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// BMC password (out-of-band).
    pub fn password(mut self, password: impl Into<SecretString>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Path of the `ipmitool` binary.
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Board identity reader (required in-band).
    pub fn board_source(mut self, source: Arc<dyn BoardSource>) -> Self {
        self.board_source = Some(source);
        self
    }

    /// Redfish connector (required out-of-band).
    pub fn redfish(mut self, connector: Arc<dyn RedfishConnector>) -> Self {
        self.redfish = Some(connector);
        self
    }

    /// Replace the `ipmitool` subprocess transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Directory whose presence means the host booted in UEFI mode.
    pub fn efi_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.efi_dir = dir.into();
        self
    }

    /// Polling used by the `*_and_wait` operations.
    pub fn convergence(mut self, policy: ConvergencePolicy) -> Self {
        self.convergence = policy;
        self
    }

    /// Retry used by user provisioning.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Parent span for the connection's `bmc` span.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Read the board, resolve the vendor and build the façade.
    pub fn connect(self) -> Result<Connection> {
        match self.band {
            Band::InBand => self.connect_in_band().map(Connection::InBand),
            Band::OutBand => self.connect_out_band().map(Connection::OutBand),
        }
    }

    fn connect_in_band(self) -> Result<InBand> {
        let source = self
            .board_source
            .clone()
            .ok_or(Error::InvalidArgument("in-band connection needs a board source"))?;
        let span = self.make_span("localhost");
        let entered = span.enter();

        let board = match source.read_board() {
            Some(identity) => Board::from_identity(identity),
            None => {
                tracing::info!("board identity unreadable, assuming virtual machine");
                Board::virtual_machine()
            }
        };
        span.record("vendor", board.vendor.name());
        let profile = VendorProfile::for_vendor(board.vendor, &board.vendor_string)?;

        let transport: Arc<dyn Transport> = match &self.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(self.program_for(IpmiTool::local())),
        };
        let ipmi = Ipmi::new(transport);
        let bmc = match board.vendor {
            Vendor::Vagrant => None,
            _ => Bmc::read(&ipmi),
        };
        let board = board.with_bmc(bmc);
        tracing::debug!(model = %board.model, "connected");

        drop(entered);
        Ok(InBand::new(ipmi, profile, board, span, self.efi_dir, self.retry))
    }

    fn connect_out_band(self) -> Result<OutBand> {
        let host = self
            .host
            .clone()
            .ok_or(Error::InvalidArgument("out-of-band connection needs a host"))?;
        let username = self
            .username
            .clone()
            .ok_or(Error::InvalidArgument("out-of-band connection needs a username"))?;
        let password = self
            .password
            .clone()
            .ok_or(Error::InvalidArgument("out-of-band connection needs a password"))?;
        let connector = self
            .redfish
            .clone()
            .ok_or(Error::InvalidArgument("out-of-band connection needs a redfish connector"))?;
        let span = self.make_span(&host);
        let entered = span.enter();

        let endpoint = Endpoint {
            host: host.clone(),
            port: self.redfish_port,
            username: username.clone(),
            password: password.clone(),
        };
        let unreachable = |err: Error| Error::Unreachable {
            endpoint: endpoint.address(),
            reason: err.to_string(),
        };
        let session = connector.connect(&endpoint).map_err(unreachable)?;
        let identity = session.board_info().map_err(unreachable)?;

        let board = Board::from_identity(identity);
        span.record("vendor", board.vendor.name());
        let profile = VendorProfile::for_vendor(board.vendor, &board.vendor_string)?;

        let transport: Arc<dyn Transport> = match &self.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(self.program_for(IpmiTool::lanplus(LanEndpoint {
                host,
                port: self.port,
                username,
                password,
            }))),
        };
        tracing::debug!(model = %board.model, "connected");

        drop(entered);
        Ok(OutBand::new(
            Ipmi::new(transport),
            profile,
            board,
            span,
            session,
            self.convergence,
        ))
    }

    fn program_for(&self, tool: IpmiTool) -> IpmiTool {
        match &self.program {
            Some(program) => tool.program(program.clone()),
            None => tool,
        }
    }

    fn make_span(&self, host: &str) -> Span {
        let band = self.band;
        match &self.span {
            Some(parent) => tracing::info_span!(
                parent: parent,
                "bmc",
                %band,
                host,
                vendor = tracing::field::Empty
            ),
            None => tracing::info_span!("bmc", %band, host, vendor = tracing::field::Empty),
        }
    }
}
