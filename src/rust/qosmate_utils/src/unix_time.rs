use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::error;

/// Retrieves the current wall-clock time as fractional seconds since
/// the UNIX epoch. Rate calculations divide by differences of these
/// values, so sub-second precision is retained.
///
/// It can fail if the clock isn't ready.
pub fn unix_now_secs_f64() -> Result<f64, TimeError> {
  match SystemTime::now().duration_since(UNIX_EPOCH) {
    Ok(t) => Ok(t.as_secs_f64()),
    Err(e) => {
      error!("Error determining the time in UNIX land: {:?}", e);
      Err(TimeError::ClockNotReady)
    }
  }
}

/// Error type for time functions.
#[derive(Error, Debug)]
pub enum TimeError {
  /// The clock isn't ready yet.
  #[error("Clock not ready")]
  ClockNotReady,
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn clock_is_after_2020() {
    let now = unix_now_secs_f64().unwrap();
    assert!(now > 1_577_836_800.0);
  }
}
