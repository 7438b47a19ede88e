//! Simulation fallback: a local stand-in for the conversion service.
//!
//! Lets a user exercise the whole select → convert → download flow without a
//! running backend. The output is a short placeholder text, not a real
//! conversion; only the latency and the artifact shape are modelled.

use crate::task::suggested_filename;
use std::time::Duration;
use tracing::debug;

/// The synthetic result of a simulated conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedArtifact {
    pub content: Vec<u8>,
    pub suggested_filename: String,
}

/// Produce the placeholder artifact for `original_filename` → `target_format`.
///
/// Deterministic and infallible.
pub fn simulate_conversion(original_filename: &str, target_format: &str) -> SimulatedArtifact {
    let content = format!("Simulated {target_format} content for {original_filename}");
    SimulatedArtifact {
        content: content.into_bytes(),
        suggested_filename: suggested_filename(original_filename, target_format),
    }
}

/// Wait `delay` (standing in for network latency), then simulate.
pub async fn run_simulation(
    original_filename: &str,
    target_format: &str,
    delay: Duration,
) -> SimulatedArtifact {
    debug!(
        "Simulating {} → {} ({}ms)",
        original_filename,
        target_format,
        delay.as_millis()
    );
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    simulate_conversion(original_filename, target_format)
}
