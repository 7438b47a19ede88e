//! The workflow controller: owns one conversion task and drives it through
//! file selection, target choice, remote conversion and the simulation
//! fallback.
//!
//! ## State machine
//!
//! ```text
//!            select_file                convert / simulate
//!   Idle ───────────────▶ Ready ───────────────────────▶ Converting
//!    ▲                    ▲  ▲                              │    │
//!    │ reset (any state)  │  └── choose_target ──┐    ok   │    │ gateway error
//!    │                    │                      │         ▼    ▼
//!    └────────────────────┴──── choose_target ── Succeeded   Failed ── simulate ─▶ Converting
//! ```
//!
//! Only one conversion or simulation is outstanding at a time: while the task
//! is `Converting`, every operation except [`WorkflowController::reset`] is
//! rejected with [`TypeShiftError::InvalidState`].
//!
//! ## Stale responses
//!
//! There is no cancellation. Each outstanding request is tagged with the task
//! generation it was issued under; `reset` and `select_file` advance the
//! generation. A response that arrives for an older generation is dropped
//! (its artifact file deleted) and the caller gets
//! [`TypeShiftError::Superseded`].
//!
//! ## Locking
//!
//! Task state sits behind a `std::sync::Mutex` that is never held across an
//! `.await`, so the controller is `Send + Sync` and can be shared via `Arc`
//! between a UI task and the task awaiting the gateway.

use crate::artifact::ArtifactHandle;
use crate::catalog::{self, TargetFormatOption};
use crate::config::ClientConfig;
use crate::error::{TaskError, TypeShiftError};
use crate::gateway::{ConversionGateway, ConversionRequest, HttpGateway};
use crate::observer::{NoopObserver, SharedObserver};
use crate::simulate;
use crate::task::{suggested_filename, SelectedFile, TaskSnapshot, TaskStatus};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Mutable task state. Only the controller touches it.
#[derive(Debug, Default)]
struct TaskState {
    generation: u64,
    status: TaskStatus,
    file: Option<SelectedFile>,
    target: Option<&'static TargetFormatOption>,
    artifact: Option<ArtifactHandle>,
    error: Option<TaskError>,
    is_simulated: bool,
}

impl TaskState {
    fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            status: self.status,
            selected_file: self.file.as_ref().map(SelectedFile::info),
            target_format: self.target.copied(),
            candidates: self.candidates().to_vec(),
            artifact: self.artifact.as_ref().map(ArtifactHandle::describe),
            error: self.error.clone(),
            is_simulated: self.is_simulated,
        }
    }

    /// Targets for the current file, always re-derived from the catalog.
    fn candidates(&self) -> &'static [TargetFormatOption] {
        self.file
            .as_ref()
            .map(|f| catalog::lookup(f.filename()))
            .unwrap_or(&[])
    }

    /// Drop the result and error of the previous attempt.
    fn clear_outcome(&mut self) {
        if let Some(mut artifact) = self.artifact.take() {
            artifact.release();
        }
        self.error = None;
        self.is_simulated = false;
    }

    /// Discard everything and start a new task generation.
    fn start_over(&mut self) {
        self.clear_outcome();
        self.generation += 1;
        self.status = TaskStatus::Idle;
        self.file = None;
        self.target = None;
    }

    fn ensure(&self, operation: &'static str, allowed: &[TaskStatus]) -> Result<(), TypeShiftError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(TypeShiftError::InvalidState {
                operation,
                status: self.status,
            })
        }
    }

    /// The selected file and target; present in every non-idle state.
    fn selection(
        &self,
        operation: &'static str,
    ) -> Result<(&SelectedFile, &'static TargetFormatOption), TypeShiftError> {
        match (self.file.as_ref(), self.target) {
            (Some(file), Some(target)) => Ok((file, target)),
            _ => Err(TypeShiftError::InvalidState {
                operation,
                status: self.status,
            }),
        }
    }
}

/// Result of an outstanding operation, ready to be applied to the task.
enum Outcome {
    Converted(ArtifactHandle),
    Failed(TaskError),
}

/// Drives a single conversion task. See the [module docs](self).
pub struct WorkflowController {
    gateway: Arc<dyn ConversionGateway>,
    observer: SharedObserver,
    simulation_delay: Duration,
    next_artifact_id: AtomicU64,
    state: Mutex<TaskState>,
}

impl WorkflowController {
    /// Controller using `gateway` and the default simulation delay.
    pub fn new(gateway: Arc<dyn ConversionGateway>) -> Self {
        Self::with_gateway(gateway, &ClientConfig::default())
    }

    /// Controller talking to the HTTP service described by `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TypeShiftError> {
        let gateway = HttpGateway::new(config)?;
        Ok(Self::with_gateway(Arc::new(gateway), config))
    }

    /// Controller using `gateway`, other settings from `config`.
    pub fn with_gateway(gateway: Arc<dyn ConversionGateway>, config: &ClientConfig) -> Self {
        Self {
            gateway,
            observer: Arc::new(NoopObserver),
            simulation_delay: config.simulation_delay(),
            next_artifact_id: AtomicU64::new(1),
            state: Mutex::new(TaskState::default()),
        }
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_simulation_delay(mut self, delay: Duration) -> Self {
        self.simulation_delay = delay;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Current state of the task.
    pub fn snapshot(&self) -> TaskSnapshot {
        self.lock().snapshot()
    }

    pub fn status(&self) -> TaskStatus {
        self.lock().status
    }

    /// Target formats offered for the currently selected file.
    pub fn candidates(&self) -> &'static [TargetFormatOption] {
        self.lock().candidates()
    }

    // ── Operations ───────────────────────────────────────────────────────

    /// Select `file`, replacing any current file and result.
    ///
    /// An unsupported extension leaves the task file-less in `Idle` with an
    /// `UnsupportedType` error recorded, and returns
    /// [`TypeShiftError::UnsupportedType`].
    pub fn select_file(&self, file: SelectedFile) -> Result<TaskSnapshot, TypeShiftError> {
        let (from, snapshot, result) = {
            let mut st = self.lock();
            st.ensure(
                "select a file",
                &[
                    TaskStatus::Idle,
                    TaskStatus::Ready,
                    TaskStatus::Succeeded,
                    TaskStatus::Failed,
                ],
            )?;
            let from = st.status;
            st.start_over();

            let result = match catalog::default_target(file.filename()) {
                Some(target) => {
                    info!(
                        "Selected {} ({} bytes), default target {}",
                        file.filename(),
                        file.size(),
                        target.code
                    );
                    st.file = Some(file);
                    st.target = Some(target);
                    st.status = TaskStatus::Ready;
                    Ok(())
                }
                None => {
                    warn!("Unsupported file type: {}", file.filename());
                    st.error = Some(TaskError::unsupported_type());
                    Err(TypeShiftError::UnsupportedType {
                        filename: file.filename().to_string(),
                    })
                }
            };
            (from, st.snapshot(), result)
        };

        self.publish(from, &snapshot);
        result.map(|()| snapshot)
    }

    /// Choose the target format for the current file.
    ///
    /// `format` is matched case-insensitively against the catalog entries for
    /// the current file. Choosing the already-selected format changes nothing.
    pub fn choose_target(&self, format: &str) -> Result<TaskSnapshot, TypeShiftError> {
        let (from, snapshot) = {
            let mut st = self.lock();
            st.ensure(
                "choose a target format",
                &[TaskStatus::Ready, TaskStatus::Succeeded, TaskStatus::Failed],
            )?;
            let (file, current) = st.selection("choose a target format")?;

            let chosen = catalog::find_target(file.filename(), format).ok_or_else(|| {
                TypeShiftError::UnknownTarget {
                    format: format.to_string(),
                    source_ext: catalog::extension_of(file.filename()).unwrap_or_default(),
                }
            })?;

            if chosen == current {
                debug!("Target {} already selected", chosen.code);
                return Ok(st.snapshot());
            }

            let from = st.status;
            st.clear_outcome();
            st.target = Some(chosen);
            st.status = TaskStatus::Ready;
            info!("Target changed to {}", chosen.code);
            (from, st.snapshot())
        };

        self.publish(from, &snapshot);
        Ok(snapshot)
    }

    /// Send the file to the gateway and wait for the result.
    ///
    /// Gateway failures are not errors of this call: they leave the task
    /// `Failed` with the classified [`TaskError`] in the returned snapshot.
    pub async fn convert(&self) -> Result<TaskSnapshot, TypeShiftError> {
        let (generation, request, filename) = {
            let mut st = self.lock();
            st.ensure("convert", &[TaskStatus::Ready])?;
            let (file, target) = st.selection("convert")?;
            let request = ConversionRequest {
                filename: file.filename().to_string(),
                payload: file.payload().clone(),
                target_format: target.code,
            };
            let filename = suggested_filename(file.filename(), target.code);

            st.clear_outcome();
            st.status = TaskStatus::Converting;
            let snapshot = st.snapshot();
            let generation = st.generation;
            drop(st);

            self.publish(TaskStatus::Ready, &snapshot);
            (generation, request, filename)
        };

        info!(
            "Converting {} → {} via {}",
            request.filename,
            request.target_format,
            self.gateway.name()
        );

        let outcome = match self.gateway.convert(request).await {
            Ok(converted) => match self.store_artifact(filename, &converted.bytes) {
                Ok(handle) => Outcome::Converted(handle),
                Err(e) => return Err(self.abandon_attempt(generation, e)),
            },
            Err(e) => {
                warn!("Conversion failed: {}", e);
                Outcome::Failed(e.into())
            }
        };

        self.finish(generation, outcome, false)
    }

    /// Produce a placeholder artifact locally, without contacting the gateway.
    ///
    /// Valid from `Ready` or `Failed`; after the configured delay the task is
    /// `Succeeded` with `is_simulated` set.
    pub async fn simulate(&self) -> Result<TaskSnapshot, TypeShiftError> {
        let (generation, original, target) = {
            let mut st = self.lock();
            st.ensure("simulate", &[TaskStatus::Ready, TaskStatus::Failed])?;
            let (file, target) = st.selection("simulate")?;
            let original = file.filename().to_string();

            let from = st.status;
            st.clear_outcome();
            st.is_simulated = true;
            st.status = TaskStatus::Converting;
            let snapshot = st.snapshot();
            let generation = st.generation;
            drop(st);

            self.publish(from, &snapshot);
            (generation, original, target)
        };

        info!("Simulating conversion of {} → {}", original, target.code);
        let simulated = simulate::run_simulation(&original, target.code, self.simulation_delay).await;

        let handle = self
            .store_artifact(simulated.suggested_filename, &simulated.content)
            .map_err(|e| self.abandon_attempt(generation, e))?;

        self.finish(generation, Outcome::Converted(handle), true)
    }

    /// Discard the file, target, result and error; back to `Idle`.
    ///
    /// Valid in every state. An outstanding conversion keeps running but its
    /// response will be discarded.
    pub fn reset(&self) -> TaskSnapshot {
        let (from, snapshot) = {
            let mut st = self.lock();
            let from = st.status;
            if from == TaskStatus::Converting {
                info!("Reset while converting; pending response will be discarded");
            }
            st.start_over();
            (from, st.snapshot())
        };
        debug!("Task reset");
        self.publish(from, &snapshot);
        snapshot
    }

    // ── Artifact retrieval ───────────────────────────────────────────────

    /// Read the artifact bytes. The handle is single-use.
    pub async fn retrieve_artifact(&self) -> Result<Vec<u8>, TypeShiftError> {
        let claimed = self.claim_artifact()?;
        claimed.into_bytes().await
    }

    /// Copy the artifact to `dest` (a file path, or a directory that receives
    /// the suggested filename). The handle is single-use.
    pub async fn save_artifact(&self, dest: impl AsRef<Path>) -> Result<PathBuf, TypeShiftError> {
        let claimed = self.claim_artifact()?;
        claimed.save_to(dest).await
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, from: TaskStatus, snapshot: &TaskSnapshot) {
        if from != snapshot.status {
            debug!("Task {} → {}", from, snapshot.status);
            self.observer.on_transition(from, snapshot.status);
        }
        self.observer.on_snapshot(snapshot);
    }

    fn store_artifact(&self, filename: String, bytes: &[u8]) -> Result<ArtifactHandle, TypeShiftError> {
        let id = self.next_artifact_id.fetch_add(1, Ordering::Relaxed);
        ArtifactHandle::create(id, filename, bytes)
    }

    fn claim_artifact(&self) -> Result<crate::artifact::ClaimedArtifact, TypeShiftError> {
        let (claimed, snapshot) = {
            let mut st = self.lock();
            if st.status != TaskStatus::Succeeded {
                return Err(TypeShiftError::NoArtifact);
            }
            let claimed = st
                .artifact
                .as_mut()
                .ok_or(TypeShiftError::NoArtifact)?
                .claim()?;
            (claimed, st.snapshot())
        };
        self.publish(snapshot.status, &snapshot);
        Ok(claimed)
    }

    /// Apply the outcome of the attempt issued under `generation`.
    fn finish(
        &self,
        generation: u64,
        outcome: Outcome,
        simulated: bool,
    ) -> Result<TaskSnapshot, TypeShiftError> {
        let mut st = self.lock();
        if st.generation != generation || st.status != TaskStatus::Converting {
            drop(st);
            info!(
                "Discarding response for superseded task generation {}",
                generation
            );
            drop(outcome);
            return Err(TypeShiftError::Superseded);
        }

        match outcome {
            Outcome::Converted(handle) => {
                info!(
                    "Conversion succeeded{}: {}",
                    if simulated { " (simulated)" } else { "" },
                    handle.suggested_filename()
                );
                st.artifact = Some(handle);
                st.status = TaskStatus::Succeeded;
            }
            Outcome::Failed(error) => {
                st.error = Some(error);
                st.status = TaskStatus::Failed;
            }
        }
        st.is_simulated = simulated;
        let snapshot = st.snapshot();
        drop(st);

        self.publish(TaskStatus::Converting, &snapshot);
        Ok(snapshot)
    }

    /// The attempt could not store its artifact locally: put the task back
    /// to `Ready` (if it is still ours) so it can be retried.
    fn abandon_attempt(&self, generation: u64, error: TypeShiftError) -> TypeShiftError {
        warn!("Could not store artifact: {}", error);
        let snapshot = {
            let mut st = self.lock();
            if st.generation != generation || st.status != TaskStatus::Converting {
                return error;
            }
            st.status = TaskStatus::Ready;
            st.is_simulated = false;
            st.snapshot()
        };
        self.publish(TaskStatus::Converting, &snapshot);
        error
    }
}

impl std::fmt::Debug for WorkflowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowController")
            .field("gateway", &self.gateway.name())
            .field("simulation_delay", &self.simulation_delay)
            .field("state", &*self.lock())
            .finish()
    }
}
