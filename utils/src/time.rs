//! Rendering of wait times in log lines and error messages.

use std::time::Duration;

/// Compact rendering of a wait: `250ms`, `1.5s`, `2m 5s`, `1h 2m`.
pub fn format_wait(wait: Duration) -> String {
    let millis = wait.as_millis();
    match wait.as_secs() {
        0 => format!("{millis}ms"),
        s if s < 60 => {
            let tenths = (millis % 1000) / 100;
            if tenths == 0 {
                format!("{s}s")
            } else {
                format!("{s}.{tenths}s")
            }
        }
        s if s < 3600 => format!("{}m {}s", s / 60, s % 60),
        s => format!("{}h {}m", s / 3600, (s % 3600) / 60),
    }
}
