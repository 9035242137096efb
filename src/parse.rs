//! Colon-delimited `ipmitool` output into typed records.
//!
//! Records declare an ordered list of `(key, setter)` pairs. Keys the BMC omits leave
//! the field at its default; hardware routinely leaves fields out, so that is not an error.

use std::collections::HashMap;

/// Split `output` into a key/value map.
///
/// Each line is split at its first colon and both sides are trimmed. Lines without a
/// colon or with an empty key (continuations, headers) are skipped. A repeated key
/// keeps its last value.
pub fn fields(output: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        map.insert(key.to_string(), value.trim().to_string());
    }
    map
}

/// Setter for one record field.
pub type Setter<R> = fn(&mut R, &str);

/// A record populated from tool output through a static key table.
pub trait Record: Default + 'static {
    /// Tool output key and the field it fills, in declaration order.
    const FIELDS: &'static [(&'static str, Setter<Self>)];

    /// Populate a record from already split fields. Returns the record and the
    /// number of declared keys that were present.
    fn from_fields(fields: &HashMap<String, String>) -> (Self, usize) {
        let mut record = Self::default();
        let mut matched = 0;
        for (key, set) in Self::FIELDS {
            if let Some(value) = fields.get(*key) {
                set(&mut record, value.as_str());
                matched += 1;
            }
        }
        (record, matched)
    }

    /// Populate a record from raw tool output.
    fn parse(output: &str) -> Self {
        let (record, matched) = Self::from_fields(&fields(output));
        if matched == 0 {
            tracing::debug!(
                record = std::any::type_name::<Self>(),
                "no known keys in tool output"
            );
        }
        record
    }
}

/// `ipmitool lan print <channel>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanConfig {
    /// BMC IP address.
    pub ip_address: String,
    /// Static, DHCP, ...
    pub ip_address_source: String,
    /// Netmask.
    pub subnet_mask: String,
    /// Default gateway.
    pub default_gateway: String,
    /// BMC MAC address.
    pub mac_address: String,
}

impl Record for LanConfig {
    const FIELDS: &'static [(&'static str, Setter<Self>)] = &[
        ("IP Address", |r, v| r.ip_address = v.to_string()),
        ("IP Address Source", |r, v| r.ip_address_source = v.to_string()),
        ("Subnet Mask", |r, v| r.subnet_mask = v.to_string()),
        ("Default Gateway IP", |r, v| r.default_gateway = v.to_string()),
        ("MAC Address", |r, v| r.mac_address = v.to_string()),
    ];
}

/// `ipmitool bmc info`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BmcInfo {
    /// Device id.
    pub device_id: String,
    /// BMC firmware revision.
    pub firmware_revision: String,
    /// Supported IPMI version.
    pub ipmi_version: String,
    /// Manufacturer name.
    pub manufacturer_name: String,
    /// Product name.
    pub product_name: String,
}

impl Record for BmcInfo {
    const FIELDS: &'static [(&'static str, Setter<Self>)] = &[
        ("Device ID", |r, v| r.device_id = v.to_string()),
        ("Firmware Revision", |r, v| r.firmware_revision = v.to_string()),
        ("IPMI Version", |r, v| r.ipmi_version = v.to_string()),
        ("Manufacturer Name", |r, v| r.manufacturer_name = v.to_string()),
        ("Product Name", |r, v| r.product_name = v.to_string()),
    ];
}

/// `ipmitool fru print 0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fru {
    /// Chassis part number.
    pub chassis_part_number: String,
    /// Chassis serial.
    pub chassis_serial: String,
    /// Board manufacturer.
    pub board_mfg: String,
    /// Board serial.
    pub board_serial: String,
    /// Board part number.
    pub board_part_number: String,
    /// Product manufacturer.
    pub product_manufacturer: String,
    /// Product part number.
    pub product_part_number: String,
    /// Product serial.
    pub product_serial: String,
}

impl Record for Fru {
    const FIELDS: &'static [(&'static str, Setter<Self>)] = &[
        ("Chassis Part Number", |r, v| r.chassis_part_number = v.to_string()),
        ("Chassis Serial", |r, v| r.chassis_serial = v.to_string()),
        ("Board Mfg", |r, v| r.board_mfg = v.to_string()),
        ("Board Serial", |r, v| r.board_serial = v.to_string()),
        ("Board Part Number", |r, v| r.board_part_number = v.to_string()),
        ("Product Manufacturer", |r, v| r.product_manufacturer = v.to_string()),
        ("Product Part Number", |r, v| r.product_part_number = v.to_string()),
        ("Product Serial", |r, v| r.product_serial = v.to_string()),
    ];
}
