/// Format a byte rate for display: plain count below 1 KiB, then two
/// decimals per 1024 step.
pub fn format_rate(bytes_per_sec: u64) -> String {
    if bytes_per_sec < 1024 {
        return format!("{bytes_per_sec} Bytes/s");
    }

    let mut value = bytes_per_sec as f64 / 1024.0;
    if value < 1024.0 {
        return format!("{value:.2} KB/s");
    }

    value /= 1024.0;
    if value < 1024.0 {
        return format!("{value:.2} MBs/s");
    }

    value /= 1024.0;
    format!("{value:.2} GBs/s")
}

/// The one-line summary shown in the header (and usable as a tooltip).
pub fn status_line(sent_rate: u64, recv_rate: u64) -> String {
    format!(
        "Send: {}; Receive: {}",
        format_rate(sent_rate),
        format_rate(recv_rate)
    )
}
