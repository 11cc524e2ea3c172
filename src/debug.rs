//! Stage diagnostics for the detection and decoding pipeline.
//!
//! Silent by default; set `QRCODEC_DEBUG` in the environment (to anything
//! but `0` or the empty string) to get per-stage prints on stderr.

use std::sync::OnceLock;

/// Result of the environment probe, taken once per process.
static VERBOSE: OnceLock<bool> = OnceLock::new();

pub(crate) fn debug_enabled() -> bool {
    *VERBOSE.get_or_init(|| {
        std::env::var_os("QRCODEC_DEBUG")
            .map(|value| !value.is_empty() && value != "0")
            .unwrap_or(false)
    })
}

/// Print a diagnostic line when debugging is switched on.
macro_rules! trace {
    ($($arg:tt)*) => {
        if $crate::debug::debug_enabled() {
            eprintln!($($arg)*);
        }
    };
}

pub(crate) use trace;
