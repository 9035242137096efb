use std::fs;
use std::sync::Arc;

use bmc_hal::{Band, BoardIdentity, BoardSource, BootTarget, Connection};

/// Board identity from the kernel's DMI export.
struct Dmi;

impl Dmi {
    fn read(name: &str) -> Option<String> {
        fs::read_to_string(format!("/sys/class/dmi/id/{name}"))
            .ok()
            .map(|s| s.trim().to_string())
    }
}

impl BoardSource for Dmi {
    fn read_board(&self) -> Option<BoardIdentity> {
        Some(BoardIdentity {
            vendor: Self::read("sys_vendor")?,
            model: Self::read("product_name").unwrap_or_default(),
            part_number: Self::read("board_name").unwrap_or_default(),
            serial_number: Self::read("product_serial").unwrap_or_default(),
            bios_version: Self::read("bios_version").unwrap_or_default(),
            bios_vendor: Self::read("bios_vendor"),
            bios_date: Self::read("bios_date"),
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example (on the managed host, as root):
    //   cargo run --example power_control -- pxe
    let action = std::env::args().nth(1).ok_or("missing <action>")?;

    let connection = Connection::builder(Band::InBand)
        .board_source(Arc::new(Dmi))
        .connect()?;
    let hal = connection.hal();
    println!(
        "{} {} ({})",
        hal.board().vendor,
        hal.board().model,
        hal.uuid()?
    );

    let outcome = match action.to_ascii_lowercase().as_str() {
        "off" => hal.power_off()?,
        "cycle" => hal.power_cycle()?,
        "reset" => hal.power_reset()?,
        other => match BootTarget::guess(other) {
            Some(target) => hal.set_boot_target(target)?,
            None => return Err("invalid action (off|cycle|reset|pxe|disk|bios)".into()),
        },
    };
    println!("{action}: {outcome:?}");

    Ok(())
}
