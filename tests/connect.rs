mod support;

use std::time::Duration;

use bmc_hal::{
    Band, BootTarget, Connection, ConnectionBuilder, ConvergencePolicy, Error, FirmwareMode,
    Hal, IdentifyLedState, InBand, OutBand, Outcome, PowerState, Vendor,
};
use support::{MockBoard, MockConnector, MockRedfish, MockTransport, UUID};

const MISSING_EFI_DIR: &str = "/nonexistent/bmc-hal/efi";

fn in_band(vendor: &str, transport: &std::sync::Arc<MockTransport>) -> InBand {
    let connection = ConnectionBuilder::new(Band::InBand)
        .board_source(MockBoard::vendor(vendor))
        .transport(transport.clone())
        .efi_dir(MISSING_EFI_DIR)
        .connect()
        .expect("connect");
    match connection {
        Connection::InBand(hal) => hal,
        Connection::OutBand(_) => panic!("expected in-band"),
    }
}

fn out_band(redfish: MockRedfish, transport: &std::sync::Arc<MockTransport>) -> OutBand {
    let connection = ConnectionBuilder::new(Band::OutBand)
        .host("10.0.0.5")
        .username("admin")
        .password("secret")
        .redfish(MockConnector::new(redfish))
        .transport(transport.clone())
        .convergence(ConvergencePolicy {
            attempts: 3,
            delay: Duration::ZERO,
        })
        .connect()
        .expect("connect");
    assert_eq!(connection.band(), Band::OutBand);
    match connection {
        Connection::OutBand(hal) => hal,
        Connection::InBand(_) => panic!("expected out-of-band"),
    }
}

#[test]
fn in_band_reads_board_and_bmc_record() {
    let transport = MockTransport::new();
    transport.respond(&["lan", "print", "1"], "IP Address : 10.1.2.3\n");
    transport.respond(&["bmc", "info"], "Firmware Revision : 3.77\n");
    transport.respond(&["fru", "print", "0"], "Board Serial : ZM123\n");

    let hal = in_band("Supermicro", &transport);
    let board = hal.board();
    assert_eq!(board.vendor, Vendor::Supermicro);
    assert_eq!(board.serial_number, "S123456");
    let bmc = board.bmc.as_ref().expect("bmc record");
    assert_eq!(bmc.lan.ip_address, "10.1.2.3");
    assert_eq!(bmc.info.firmware_revision, "3.77");
    assert_eq!(bmc.fru.board_serial, "ZM123");
    assert_eq!(board.bios.as_ref().expect("bios").date, "2021-05-04");
}

#[test]
fn bmc_record_is_best_effort() {
    let transport = MockTransport::new();
    transport.fail(&["bmc", "info"], 1);
    let hal = in_band("Dell Inc.", &transport);
    assert!(hal.board().bmc.is_none());
}

#[test]
fn boot_target_uses_vendor_qualifier() {
    let transport = MockTransport::new();
    let hal = in_band("Supermicro", &transport);
    transport.clear();

    assert_eq!(hal.set_boot_target(BootTarget::Disk).unwrap(), Outcome::Applied);
    assert_eq!(
        transport.raw_requests(),
        vec![vec![0x00, 0x08, 0x05, 0xE0, 0x24, 0x00, 0x00, 0x00]]
    );
}

#[test]
fn unreadable_board_is_a_virtual_machine() {
    let transport = MockTransport::new();
    let connection = ConnectionBuilder::new(Band::InBand)
        .board_source(MockBoard::unreadable())
        .transport(transport.clone())
        .connect()
        .expect("connect");
    let hal = connection.in_band().expect("in-band");

    assert_eq!(hal.board().vendor, Vendor::Vagrant);
    assert_eq!(hal.board().model, "Vagrant");
    assert!(matches!(hal.power_off().unwrap(), Outcome::Unsupported(_)));
    assert!(matches!(
        hal.set_boot_target(BootTarget::Pxe).unwrap(),
        Outcome::Unsupported(_)
    ));
    assert!(matches!(
        hal.set_firmware_mode(FirmwareMode::Uefi).unwrap(),
        Outcome::Unsupported(_)
    ));
    assert!(transport.calls().is_empty());
}

#[test]
fn unknown_vendor_is_rejected_at_connect() {
    let err = ConnectionBuilder::new(Band::InBand)
        .board_source(MockBoard::vendor("Acme Corp"))
        .transport(MockTransport::new())
        .connect()
        .expect_err("unsupported");
    assert!(matches!(err, Error::UnsupportedVendor { vendor } if vendor == "Acme Corp"));
}

#[test]
fn in_band_uuid_comes_from_system_guid() {
    let transport = MockTransport::new();
    transport.respond(
        &["raw", "0x06", "0x37"],
        " 44 45 4c 4c 42 00 10 35 80 52 b4 c0 4f 4e 44 32\n",
    );
    let hal = in_band("LENOVO", &transport);
    assert_eq!(hal.uuid().unwrap().to_string(), UUID);
}

#[test]
fn firmware_mode_switch_by_vendor() {
    let transport = MockTransport::new();
    let smc = in_band("Supermicro", &transport);
    assert_eq!(smc.firmware_mode(), FirmwareMode::Legacy);
    assert_eq!(
        smc.set_firmware_mode(FirmwareMode::Legacy).unwrap(),
        Outcome::Unchanged
    );
    transport.clear();
    assert_eq!(
        smc.set_firmware_mode(FirmwareMode::Uefi).unwrap(),
        Outcome::Applied
    );
    assert_eq!(
        transport.raw_requests(),
        vec![vec![0x00, 0x08, 0x05, 0xE0, 0x00, 0x00, 0x00, 0x00]]
    );
    assert!(matches!(
        smc.set_firmware_mode(FirmwareMode::Unknown),
        Err(Error::InvalidArgument(_))
    ));

    let lenovo = in_band("Lenovo", &transport);
    assert!(matches!(
        lenovo.set_firmware_mode(FirmwareMode::Uefi),
        Err(Error::NotImplemented {
            vendor: Vendor::Lenovo,
            ..
        })
    ));
}

#[test]
fn execution_failure_carries_output() {
    let transport = MockTransport::new();
    let hal = in_band("Dell", &transport);
    transport.fail(&["raw", "0x00", "0x02"], 1);

    let err = hal.power_cycle().expect_err("transport failure");
    assert!(matches!(err, Error::Execution { .. }));
    assert_eq!(err.output(), Some("Error: Unable to establish IPMI session"));
    assert!(err.to_string().contains("ipmitool raw 0x00 0x02 0x02"));
}

#[test]
fn shared_vocabulary_through_trait_object() {
    let transport = MockTransport::new();
    let connection = ConnectionBuilder::new(Band::OutBand)
        .host("bmc-1")
        .username("root")
        .password("calvin")
        .redfish(MockConnector::new(MockRedfish::new("Dell Inc.", &[])))
        .transport(transport.clone())
        .connect()
        .expect("connect");

    let hal: &dyn Hal = connection.hal();
    assert_eq!(hal.power_reset().unwrap(), Outcome::Applied);
    assert_eq!(hal.power_off().unwrap(), Outcome::Applied);
    assert_eq!(hal.uuid().unwrap().to_string(), UUID);
    assert_eq!(
        transport.raw_requests(),
        vec![vec![0x00, 0x02, 0x03], vec![0x00, 0x02, 0x00]]
    );
}

#[test]
fn out_band_unreachable_when_redfish_refuses() {
    let connector = MockConnector::refusing();
    let err = ConnectionBuilder::new(Band::OutBand)
        .host("10.0.0.9")
        .username("admin")
        .password("secret")
        .redfish(connector.clone())
        .transport(MockTransport::new())
        .connect()
        .expect_err("unreachable");
    match err {
        Error::Unreachable { endpoint, reason } => {
            assert_eq!(endpoint, "10.0.0.9:443");
            assert!(reason.contains("connection refused"));
            assert!(!reason.contains("secret"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(connector.endpoints.lock().unwrap().len(), 1);
}

#[test]
fn out_band_requires_credentials() {
    let err = ConnectionBuilder::new(Band::OutBand)
        .host("10.0.0.9")
        .redfish(MockConnector::new(MockRedfish::new("Dell", &[])))
        .connect()
        .expect_err("missing username");
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn out_band_power_state_falls_back_to_chassis_status() {
    let transport = MockTransport::new();
    transport.respond(&["raw", "0x00", "0x01"], " 01 00 00 00\n");
    let hal = out_band(MockRedfish::new("Dell", &[PowerState::Unknown]), &transport);
    assert_eq!(hal.power_state().unwrap(), PowerState::On);

    let transport = MockTransport::new();
    let hal = out_band(MockRedfish::new("Dell", &[PowerState::Off]), &transport);
    assert_eq!(hal.power_state().unwrap(), PowerState::Off);
    assert!(transport.raw_requests().is_empty());
}

#[test]
fn power_on_and_wait_polls_until_on() {
    let transport = MockTransport::new();
    let redfish = MockRedfish::new(
        "Supermicro",
        &[PowerState::Off, PowerState::Off, PowerState::On],
    );
    let hal = out_band(redfish.clone(), &transport);

    assert_eq!(hal.power_on_and_wait().unwrap(), PowerState::On);
    assert_eq!(redfish.power_reads(), 3);
    assert_eq!(transport.raw_requests(), vec![vec![0x00, 0x02, 0x01]]);
}

#[test]
fn power_off_and_wait_times_out() {
    let transport = MockTransport::new();
    let redfish = MockRedfish::new("Lenovo", &[PowerState::On]);
    let hal = out_band(redfish.clone(), &transport);

    let err = hal.power_off_and_wait().expect_err("timeout");
    assert!(matches!(
        err,
        Error::ConvergenceTimeout {
            target: PowerState::Off,
            last: PowerState::On,
            attempts: 3
        }
    ));
    assert_eq!(redfish.power_reads(), 3);
}

#[test]
fn identify_led_commands() {
    let transport = MockTransport::new();
    let hal = out_band(MockRedfish::new("Dell", &[]), &transport);

    assert_eq!(hal.identify_led_on().unwrap(), Outcome::Applied);
    assert_eq!(hal.identify_led_off().unwrap(), Outcome::Applied);
    assert_eq!(
        transport.raw_requests(),
        vec![vec![0x00, 0x04, 0x00, 0x01], vec![0x00, 0x04, 0x00, 0x00]]
    );
    assert!(matches!(
        hal.set_identify_led(IdentifyLedState::Unknown),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn identify_led_state_falls_back_to_chassis_status() {
    let transport = MockTransport::new();
    transport.respond(&["raw", "0x00", "0x01"], " 01 00 60 00\n");
    let redfish = MockRedfish::new("Dell", &[]).identify(IdentifyLedState::Unknown);
    let hal = out_band(redfish, &transport);
    assert_eq!(hal.identify_led_state().unwrap(), IdentifyLedState::On);

    let redfish = MockRedfish::new("Dell", &[]).identify(IdentifyLedState::Off);
    let hal = out_band(redfish, &MockTransport::new());
    assert_eq!(hal.identify_led_state().unwrap(), IdentifyLedState::Off);
}

#[test]
fn virtual_target_identify_led_is_unsupported() {
    let transport = MockTransport::new();
    let hal = out_band(MockRedfish::new("vagrant", &[]), &transport);
    assert_eq!(hal.board().vendor, Vendor::Vagrant);
    assert!(matches!(
        hal.identify_led_on().unwrap(),
        Outcome::Unsupported(_)
    ));
    assert_eq!(
        hal.identify_led_state().unwrap(),
        IdentifyLedState::Unknown
    );
    assert!(transport.calls().is_empty());
}
