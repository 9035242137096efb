pub(crate) fn enabled() -> bool {
    std::env::var("BMC_HAL_DEBUG")
        .map(|v| !v.is_empty())
        .unwrap_or(false)
}

/// Trace a hex dump of `bytes`; bytes from `secret_from` on are printed as `**`.
pub(crate) fn dump_hex(label: &str, bytes: &[u8], secret_from: Option<usize>) {
    if !enabled() {
        return;
    }
    tracing::trace!("{}", format_hex(label, bytes, secret_from));
}

fn format_hex(label: &str, bytes: &[u8], secret_from: Option<usize>) -> String {
    let mut out = String::with_capacity(label.len() + bytes.len() * 3 + 8);
    out.push_str(label);
    out.push_str(" (");
    out.push_str(&bytes.len().to_string());
    out.push_str("):");
    for (i, b) in bytes.iter().enumerate() {
        out.push(' ');
        match secret_from {
            Some(from) if i >= from => out.push_str("**"),
            _ => out.push_str(&format!("{b:02x}")),
        }
    }
    out
}
