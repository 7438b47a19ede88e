//! # typeshift
//!
//! Client-side workflow for converting a file through a remote conversion
//! service: discover the formats a file can become, pick one, submit it, and
//! download the result. When the service is offline a local simulation
//! fallback produces a placeholder artifact so the rest of the flow can still
//! be exercised.
//!
//! ## Workflow Overview
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Select    catalog lookup by extension → candidate targets
//!  ├─ 2. Choose    pick a target (default: first candidate)
//!  ├─ 3. Convert   multipart POST /convert → artifact temp file
//!  │      └─ offline? → Simulate (placeholder artifact after a delay)
//!  └─ 4. Download  single-use artifact handle → bytes or saved file
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use typeshift::{ClientConfig, SelectedFile, WorkflowController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::default();
//!     let controller = WorkflowController::from_config(&config)?;
//!
//!     controller.select_file(SelectedFile::load("report.pdf").await?)?;
//!     controller.choose_target("XLSX")?;
//!
//!     let mut snapshot = controller.convert().await?;
//!     if snapshot.offers_simulation() {
//!         snapshot = controller.simulate().await?;
//!     }
//!     if let Some(artifact) = snapshot.artifact {
//!         let path = controller.save_artifact(".").await?;
//!         eprintln!("saved {} → {}", artifact.suggested_filename, path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `typeshift` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifact;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod observer;
pub mod simulate;
pub mod task;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalog::{lookup, TargetFormatOption};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use controller::WorkflowController;
pub use error::{TaskError, TaskErrorKind, TypeShiftError};
pub use gateway::{ConversionGateway, ConversionRequest, ConvertedFile, GatewayError, HttpGateway};
pub use observer::{NoopObserver, SharedObserver, WorkflowObserver};
pub use simulate::simulate_conversion;
pub use task::{DownloadableArtifact, FileInfo, SelectedFile, TaskSnapshot, TaskStatus};
