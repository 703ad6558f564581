const SIZE_UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

/// Formats a byte count using binary (1024-based) units, keeping at
/// most two decimal places and dropping trailing zeros.
///
/// `0` renders as `0 B`, `1536` as `1.5 KiB`.
pub fn format_size(bytes: u64) -> String {
  if bytes == 0 {
    return "0 B".to_string();
  }
  let mut exponent = 0;
  while exponent < SIZE_UNITS.len() - 1 && bytes >= 1024u64.pow(exponent as u32 + 1) {
    exponent += 1;
  }
  let scaled = bytes as f64 / 1024f64.powi(exponent as i32);
  let rounded = (scaled * 100.0).round() / 100.0;
  format!("{rounded} {}", SIZE_UNITS[exponent])
}

/// Converts a byte rate to decimal kilobits per second, with two
/// decimal places. `1000` bytes/s renders as `8.00 Kbit/s`.
pub fn format_kbits(bytes_per_second: u64) -> String {
  format!("{:.2} Kbit/s", bytes_per_second as f64 * 8.0 / 1000.0)
}

/// Scales a packet rate to a short human-readable string.
pub fn scale_packets(n: u64) -> String {
  if n > 1_000_000_000 {
    format!("{:.2} gpps", n as f32 / 1_000_000_000.0)
  } else if n > 1_000_000 {
    format!("{:.2} mpps", n as f32 / 1_000_000.0)
  } else if n > 1_000 {
    format!("{:.2} kpps", n as f32 / 1_000.0)
  } else {
    format!("{n} pps")
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn zero_bytes() {
    assert_eq!(format_size(0), "0 B");
  }

  #[test]
  fn sizes_use_binary_units() {
    assert_eq!(format_size(512), "512 B");
    assert_eq!(format_size(1024), "1 KiB");
    assert_eq!(format_size(1536), "1.5 KiB");
    assert_eq!(format_size(10_000), "9.77 KiB");
    assert_eq!(format_size(5 * 1024 * 1024), "5 MiB");
  }

  #[test]
  fn huge_sizes_stay_in_petabytes() {
    assert!(format_size(u64::MAX).ends_with(" PiB"));
  }

  #[test]
  fn bit_rate_is_decimal_kbits() {
    assert_eq!(format_kbits(0), "0.00 Kbit/s");
    assert_eq!(format_kbits(1000), "8.00 Kbit/s");
    assert_eq!(format_kbits(12_500), "100.00 Kbit/s");
  }

  #[test]
  fn packet_scaling() {
    assert_eq!(scale_packets(999), "999 pps");
    assert_eq!(scale_packets(1_500), "1.50 kpps");
  }
}
