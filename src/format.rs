use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Humanize a byte count with a binary-unit suffix.
pub fn format_bytes(bytes: u64) -> String {
    const SCALE: [(u64, &str); 3] = [(1 << 30, "GB"), (1 << 20, "MB"), (1 << 10, "KB")];

    for (unit, suffix) in SCALE {
        if bytes >= unit {
            return format!("{:.1} {suffix}", bytes as f64 / unit as f64);
        }
    }
    format!("{bytes} B")
}

/// Group the digits of a tick counter for readability.
pub fn format_ticks(ticks: u64) -> String {
    let digits = ticks.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i).is_multiple_of(3) {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Truncate a process name to `max_width` terminal cells, appending an
/// ellipsis when anything was cut. Width-aware so wide glyphs in
/// executable names cannot break column alignment.
pub fn truncate_name(name: &str, max_width: usize) -> String {
    if name.width() <= max_width {
        return name.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in name.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result.push('\u{2026}');
    result
}
