//! Summary output for the ferrozst CLI

use console::style;
use ferrozst_config::Config;
use ferrozst_types::{StreamKind, StreamStats};
use std::path::Path;
use std::time::Duration;

/// Print the outcome of a compress or decompress command
pub fn print_stream_summary(kind: StreamKind, output: &Path, stats: &StreamStats, elapsed: Duration) {
    let heading = match kind {
        StreamKind::Compress => "Compression Statistics:",
        StreamKind::Decompress => "Decompression Statistics:",
    };

    println!();
    println!("{}", style(heading).bold().underlined());
    println!("  Output: {}", style(output.display()).cyan());
    println!("  Bytes read: {}", style(format_bytes(stats.bytes_in)).green());
    println!(
        "  Bytes written: {}",
        style(format_bytes(stats.bytes_out)).green()
    );
    println!(
        "  Chunks: {} in, {} out",
        style(stats.chunks_in).yellow(),
        style(stats.chunks_out).yellow()
    );
    println!("  Ratio: {}", style(format_ratio(stats.ratio())).blue());
    println!("  Duration: {}", style(format_duration(elapsed)).blue());
    println!(
        "  Throughput: {}",
        style(format_rate(stats.bytes_in, elapsed)).blue()
    );
}

/// Print a configuration under a heading
pub fn print_config(heading: &str, config: &Config, rendered: &str) {
    println!("{} {}", style("⚙").blue().bold(), style(heading).bold());
    println!(
        "  compression level {} / chunk size {}",
        style(config.compression.level.get()).cyan(),
        style(format_bytes(config.stream.chunk_size.get() as u64)).cyan()
    );
    println!();
    print!("{}", rendered);
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Output size as a percentage of input size
pub fn format_ratio(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

fn format_rate(bytes: u64, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        format!("{}/s", format_bytes((bytes as f64 / secs) as u64))
    } else {
        "n/a".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0.00 B")]
    #[case(1023, "1023.00 B")]
    #[case(1536, "1.50 KB")]
    #[case(128 * 1024 * 1024, "128.00 MB")]
    fn test_format_bytes(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(format_bytes(bytes), expected);
    }

    #[rstest]
    #[case(Duration::from_millis(1500), "1.50s")]
    #[case(Duration::from_secs(125), "2m 5s")]
    #[case(Duration::from_secs(3723), "1h 2m 3s")]
    fn test_format_duration(#[case] duration: Duration, #[case] expected: &str) {
        assert_eq!(format_duration(duration), expected);
    }

    #[test]
    fn test_format_ratio_and_rate() {
        assert_eq!(format_ratio(0.25), "25.0%");
        assert_eq!(format_rate(2048, Duration::from_secs(2)), "1.00 KB/s");
        assert_eq!(format_rate(2048, Duration::ZERO), "n/a");
    }
}
