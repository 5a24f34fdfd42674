const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable file size using 1024-based units, e.g. `1.5 KB`
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut idx = 0;
    let mut threshold = 1024u64;
    while idx < UNITS.len() - 1 && bytes >= threshold {
        idx += 1;
        threshold = threshold.saturating_mul(1024);
    }
    let scaled = bytes as f64 / 1024f64.powi(idx as i32);

    format!("{} {}", trim_decimals(scaled), UNITS[idx])
}

/// Two decimal places with trailing zeros removed
fn trim_decimals(value: f64) -> String {
    let s = format!("{:.2}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
