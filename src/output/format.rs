//! Human-readable throughput formatting

/// Format a throughput value given in Kbps, scaling the unit by magnitude.
///
/// Values above 1,000,000 Kbps render as Gbps and values above 1,000 Kbps
/// as Mbps, both with two decimals; everything else stays in Kbps with no
/// decimals.
pub fn format_throughput(kbps: f64) -> String {
    if kbps > 1_000_000.0 {
        format!("{:.2} Gbps", kbps / 1_000_000.0)
    } else if kbps > 1_000.0 {
        format!("{:.2} Mbps", kbps / 1_000.0)
    } else {
        format!("{:.0} Kbps", kbps)
    }
}
