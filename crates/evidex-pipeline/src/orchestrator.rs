// crates/evidex-pipeline/src/orchestrator.rs
// ============================================================================
// Module: Pipeline Orchestrator
// Description: Ordered, resumable multi-stage analysis runs over one case.
// Purpose: Implement the Playbook/Stage/PipelineTracker contract.
// Dependencies: evidex-core, evidex-broker, evidex-fusion, evidex-hypothesis, tokio
// ============================================================================

//! ## Overview
//! A [`Playbook`] is an ordered list of stage names plus per-stage config
//! overrides. [`PipelineTracker::run`] executes a playbook's stages
//! sequentially against one shared, mutated-in-place [`StageContext`],
//! persisting a [`evidex_core::interfaces::Checkpoint`] after every
//! successful stage so a resumed run replays only what follows the last
//! one. `RunState` lives in-memory behind a
//! `parking_lot::Mutex<BTreeMap<Uid<RunKind>, RunState>>` (spec §5: run
//! state updates are serialized per `run_id`, the checkpoint store is the
//! cross-process source of truth) and a `tokio::sync::watch` channel per
//! run feeds server-sent progress streams.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use evidex_core::core::Assertion;
use evidex_core::core::CaseKind;
use evidex_core::core::Evidence;
use evidex_core::core::Hypothesis;
use evidex_core::core::Judgment;
use evidex_core::core::Narrative;
use evidex_core::core::RunKind;
use evidex_core::core::SourceClaim;
use evidex_core::core::Timestamp;
use evidex_core::core::Uid;
use evidex_core::interfaces::Checkpoint;
use evidex_core::interfaces::CheckpointError;
use evidex_core::interfaces::CheckpointStore;
use parking_lot::Mutex;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tokio::sync::watch;

// ============================================================================
// SECTION: Playbook
// ============================================================================

/// The default eight-stage order.
pub const DEFAULT_STAGE_ORDER: [&str; 8] = [
    "assertion_fuse",
    "hypothesis_analyze",
    "adversarial_evaluate",
    "narrative_build",
    "kg_build",
    "forecast_generate",
    "quality_score",
    "report_generate",
];

/// Replaces `hypothesis_analyze` with a multi-perspective generation pass.
#[must_use]
pub fn hypothesis_multi_perspective_stage_order() -> Vec<String> {
    DEFAULT_STAGE_ORDER
        .iter()
        .map(|&stage| if stage == "hypothesis_analyze" { "hypothesis_multi_perspective" } else { stage })
        .map(str::to_string)
        .collect()
}

/// Prepends `osint_collect` to the default order.
#[must_use]
pub fn osint_collect_stage_order() -> Vec<String> {
    std::iter::once("osint_collect".to_string())
        .chain(DEFAULT_STAGE_ORDER.iter().map(|&stage| stage.to_string()))
        .collect()
}

/// An ordered list of stage names plus per-stage configuration overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playbook {
    /// Stable label for this playbook, e.g. `"default"`.
    pub name: String,
    /// Stage names, in execution order.
    pub stages: Vec<String>,
    /// Per-stage config overrides, keyed by stage name.
    pub stage_config: BTreeMap<String, Value>,
}

impl Playbook {
    /// The default eight-stage playbook with no overrides.
    #[must_use]
    pub fn default_playbook() -> Self {
        Self {
            name: "default".to_string(),
            stages: DEFAULT_STAGE_ORDER.iter().map(|&stage| stage.to_string()).collect(),
            stage_config: BTreeMap::new(),
        }
    }

    /// The default order with `hypothesis_analyze` replaced by
    /// `hypothesis_multi_perspective`.
    #[must_use]
    pub fn hypothesis_multi_perspective() -> Self {
        Self {
            name: "hypothesis_multi_perspective".to_string(),
            stages: hypothesis_multi_perspective_stage_order(),
            stage_config: BTreeMap::new(),
        }
    }

    /// The default order with `osint_collect` prepended.
    #[must_use]
    pub fn osint_collect() -> Self {
        Self {
            name: "osint_collect".to_string(),
            stages: osint_collect_stage_order(),
            stage_config: BTreeMap::new(),
        }
    }
}

// ============================================================================
// SECTION: Stage Context and Result
// ============================================================================

/// The accumulated evidence model state a playbook's stages read and
/// mutate in place. Entities without a dedicated type in
/// `evidex_core::core` (knowledge-graph edges, forecasts, the rendered
/// report) are carried as opaque JSON in `stage_outputs`, keyed by stage
/// name, matching the `Action.outputs` convention used elsewhere.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageContext {
    /// Case this run belongs to.
    pub case_uid: Option<Uid<CaseKind>>,
    /// Source claims accumulated so far.
    pub source_claims: Vec<SourceClaim>,
    /// Evidence accumulated so far, one per ingested chunk.
    pub evidence: Vec<Evidence>,
    /// Assertions accumulated so far.
    pub assertions: Vec<Assertion>,
    /// Hypotheses accumulated so far.
    pub hypotheses: Vec<Hypothesis>,
    /// Narratives built so far.
    pub narratives: Vec<Narrative>,
    /// The finished judgment, once `report_generate` has run.
    pub judgment: Option<Judgment>,
    /// Opaque per-stage outputs for stages with no dedicated entity type.
    pub stage_outputs: BTreeMap<String, Value>,
}

/// Outcome of running one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// The stage ran and produced output.
    Success,
    /// The stage's `should_skip` returned a reason.
    Skipped,
    /// The stage failed; the pipeline halts.
    Error,
}

/// The result of running one stage against a [`StageContext`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    /// The stage's name.
    pub stage: String,
    /// Outcome.
    pub status: StageStatus,
    /// Wall-clock duration of the stage run, in milliseconds.
    pub duration_ms: u64,
    /// Opaque structured output, mirrored into
    /// [`StageContext::stage_outputs`].
    pub output: Value,
    /// Error message, set only when `status == Error`.
    pub error: Option<String>,
}

/// One stage in a playbook.
///
/// # Errors
///
/// `run` returns a human-readable error string on failure; the
/// orchestrator halts the pipeline and leaves already-committed stages in
/// place.
#[async_trait]
pub trait Stage: Send + Sync {
    /// The stable name this stage is registered under in a [`Playbook`].
    fn name(&self) -> &'static str;

    /// Returns a skip reason if this stage has nothing to do given the
    /// current context (e.g. `narrative_build` with no source claims).
    fn should_skip(&self, ctx: &StageContext) -> Option<String>;

    /// Runs the stage, mutating `ctx` in place.
    ///
    /// # Errors
    ///
    /// Returns an error string describing the failure.
    async fn run(&self, ctx: &mut StageContext, config: &Value) -> Result<Value, String>;
}

// ============================================================================
// SECTION: Run State
// ============================================================================

/// In-memory state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Run uid, doubling as the checkpoint store's `thread_id`.
    pub run_id: Uid<RunKind>,
    /// Owning case.
    pub case_uid: Uid<CaseKind>,
    /// Name of the playbook this run executes.
    pub playbook: String,
    /// Overall run status.
    pub status: RunStatus,
    /// Name of the stage currently running, if any.
    pub current_stage: Option<String>,
    /// Number of stages that have completed (success or skipped).
    pub stages_completed: u32,
    /// Total number of stages in the playbook.
    pub stages_total: u32,
    /// `stages_completed / stages_total`, as a percentage.
    pub progress_pct: f64,
    /// Human-readable status message.
    pub message: String,
    /// Run start timestamp.
    pub started_at: Timestamp,
    /// Run completion timestamp, set once `status != Running`.
    pub completed_at: Option<Timestamp>,
}

/// Overall lifecycle status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Currently executing stages.
    Running,
    /// Every stage completed (or was skipped) successfully.
    Completed,
    /// A stage returned `status = error`; the run halted.
    Failed,
}

/// Errors raised while orchestrating a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage's name did not match any registered [`Stage`].
    #[error("unknown stage: {0}")]
    UnknownStage(String),
    /// A stage returned an error, halting the run.
    #[error("stage {stage} failed: {message}")]
    StageFailed {
        /// The failing stage's name.
        stage: String,
        /// The stage's error message.
        message: String,
    },
    /// The checkpoint store failed to persist or load a checkpoint.
    #[error("checkpoint store error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl PipelineError {
    /// Maps this error onto the shared wire taxonomy.
    #[must_use]
    pub fn kind(&self) -> evidex_core::error::ErrorKind {
        match self {
            Self::UnknownStage(_) => evidex_core::error::ErrorKind::NotFound,
            Self::StageFailed { .. } => evidex_core::error::ErrorKind::Internal,
            Self::Checkpoint(err) => err.kind(),
        }
    }
}

// ============================================================================
// SECTION: Pipeline Tracker
// ============================================================================

/// Runs playbooks against a registry of [`Stage`] implementations,
/// tracking in-memory [`RunState`] and checkpointing progress.
pub struct PipelineTracker {
    stages: BTreeMap<&'static str, Arc<dyn Stage>>,
    checkpoint_store: Arc<dyn CheckpointStore>,
    runs: Mutex<BTreeMap<Uid<RunKind>, RunState>>,
    watches: Mutex<BTreeMap<Uid<RunKind>, watch::Sender<RunState>>>,
}

impl PipelineTracker {
    /// Builds a tracker over `stages` (keyed by [`Stage::name`]) and the
    /// given checkpoint backend.
    #[must_use]
    pub fn new(stages: Vec<Arc<dyn Stage>>, checkpoint_store: Arc<dyn CheckpointStore>) -> Self {
        let stages = stages.into_iter().map(|stage| (stage.name(), stage)).collect();
        Self { stages, checkpoint_store, runs: Mutex::new(BTreeMap::new()), watches: Mutex::new(BTreeMap::new()) }
    }

    /// Returns a receiver that fires on every [`RunState`] change for
    /// `run_id`, for server-sent progress streams. Returns `None` if no
    /// run with that id has started.
    #[must_use]
    pub fn subscribe(&self, run_id: Uid<RunKind>) -> Option<watch::Receiver<RunState>> {
        self.watches.lock().get(&run_id).map(watch::Sender::subscribe)
    }

    /// Returns a snapshot of `run_id`'s current state, if it exists.
    #[must_use]
    pub fn run_state(&self, run_id: Uid<RunKind>) -> Option<RunState> {
        self.runs.lock().get(&run_id).cloned()
    }

    /// Executes `playbook` against `ctx` from the beginning, stage by
    /// stage, checkpointing after every successful stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if a stage name is unregistered, a stage
    /// fails, or the checkpoint store errors. Already-completed stages'
    /// mutations to `ctx` are preserved even on failure.
    pub async fn run(
        &self,
        run_id: Uid<RunKind>,
        case_uid: Uid<CaseKind>,
        playbook: &Playbook,
        ctx: &mut StageContext,
        now: Timestamp,
    ) -> Result<Vec<StageResult>, PipelineError> {
        self.init_run(run_id, case_uid, playbook, now);
        self.run_from(run_id, playbook, ctx, 0, now).await
    }

    /// Resumes `run_id` from its last checkpoint: loads the checkpointed
    /// context and replays stages from the one after `step`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Checkpoint`] if no checkpoint exists, or
    /// the same errors as [`PipelineTracker::run`] for the replayed
    /// stages.
    pub async fn resume(
        &self,
        run_id: Uid<RunKind>,
        case_uid: Uid<CaseKind>,
        playbook: &Playbook,
        now: Timestamp,
    ) -> Result<(StageContext, Vec<StageResult>), PipelineError> {
        let checkpoint = self
            .checkpoint_store
            .load_latest(run_id)
            .await?
            .ok_or_else(|| PipelineError::Checkpoint(CheckpointError::Io("no checkpoint for run".to_string())))?;
        let mut ctx: StageContext =
            serde_json::from_value(checkpoint.state_json).map_err(|err| {
                PipelineError::Checkpoint(CheckpointError::Io(format!("corrupt checkpoint state: {err}")))
            })?;
        let resume_from = playbook
            .stages
            .iter()
            .position(|stage| stage == &checkpoint.step)
            .map(|index| index + 1)
            .unwrap_or(0);
        self.init_run(run_id, case_uid, playbook, now);
        let results = self.run_from(run_id, playbook, &mut ctx, resume_from, now).await?;
        Ok((ctx, results))
    }

    fn init_run(&self, run_id: Uid<RunKind>, case_uid: Uid<CaseKind>, playbook: &Playbook, now: Timestamp) {
        let state = RunState {
            run_id,
            case_uid,
            playbook: playbook.name.clone(),
            status: RunStatus::Running,
            current_stage: None,
            stages_completed: 0,
            stages_total: playbook.stages.len() as u32,
            progress_pct: 0.0,
            message: "starting".to_string(),
            started_at: now,
            completed_at: None,
        };
        self.runs.lock().insert(run_id, state.clone());
        self.watches.lock().entry(run_id).or_insert_with(|| watch::channel(state).0);
    }

    async fn run_from(
        &self,
        run_id: Uid<RunKind>,
        playbook: &Playbook,
        ctx: &mut StageContext,
        start_index: usize,
        now: Timestamp,
    ) -> Result<Vec<StageResult>, PipelineError> {
        let mut results = Vec::new();
        let mut parent_checkpoint: Option<Uid<evidex_core::core::CheckpointKind>> = None;

        for (index, stage_name) in playbook.stages.iter().enumerate() {
            if index < start_index {
                continue;
            }
            let stage = self
                .stages
                .get(stage_name.as_str())
                .ok_or_else(|| PipelineError::UnknownStage(stage_name.clone()))?;

            self.update_state(run_id, |state| {
                state.current_stage = Some(stage_name.clone());
                state.message = format!("running {stage_name}");
            });

            if let Some(reason) = stage.should_skip(ctx) {
                let result = StageResult {
                    stage: stage_name.clone(),
                    status: StageStatus::Skipped,
                    duration_ms: 0,
                    output: json!({"skip_reason": reason}),
                    error: None,
                };
                ctx.stage_outputs.insert(stage_name.clone(), result.output.clone());
                results.push(result);
                self.checkpoint_stage(run_id, stage_name, ctx, parent_checkpoint, now).await?;
                parent_checkpoint = self.latest_checkpoint_uid(run_id).await?;
                self.advance_progress(run_id, playbook.stages.len() as u32);
                continue;
            }

            let config = playbook.stage_config.get(stage_name).cloned().unwrap_or(json!({}));
            let started = std::time::Instant::now();
            match stage.run(ctx, &config).await {
                Ok(output) => {
                    let duration_ms = started.elapsed().as_millis() as u64;
                    ctx.stage_outputs.insert(stage_name.clone(), output.clone());
                    results.push(StageResult {
                        stage: stage_name.clone(),
                        status: StageStatus::Success,
                        duration_ms,
                        output,
                        error: None,
                    });
                    self.checkpoint_stage(run_id, stage_name, ctx, parent_checkpoint, now).await?;
                    parent_checkpoint = self.latest_checkpoint_uid(run_id).await?;
                    self.advance_progress(run_id, playbook.stages.len() as u32);
                }
                Err(message) => {
                    let duration_ms = started.elapsed().as_millis() as u64;
                    results.push(StageResult {
                        stage: stage_name.clone(),
                        status: StageStatus::Error,
                        duration_ms,
                        output: Value::Null,
                        error: Some(message.clone()),
                    });
                    self.update_state(run_id, |state| {
                        state.status = RunStatus::Failed;
                        state.message = format!("stage {stage_name} failed: {message}");
                        state.completed_at = Some(now);
                    });
                    return Err(PipelineError::StageFailed { stage: stage_name.clone(), message });
                }
            }
        }

        self.update_state(run_id, |state| {
            state.status = RunStatus::Completed;
            state.message = "completed".to_string();
            state.completed_at = Some(now);
        });
        Ok(results)
    }

    async fn checkpoint_stage(
        &self,
        run_id: Uid<RunKind>,
        stage_name: &str,
        ctx: &StageContext,
        parent_checkpoint: Option<Uid<evidex_core::core::CheckpointKind>>,
        now: Timestamp,
    ) -> Result<(), PipelineError> {
        let state_json = serde_json::to_value(ctx)
            .map_err(|err| PipelineError::Checkpoint(CheckpointError::Io(format!("state serialize: {err}"))))?;
        let checkpoint = Checkpoint {
            uid: Uid::random(),
            thread_id: run_id,
            state_json,
            step: stage_name.to_string(),
            parent_checkpoint_id: parent_checkpoint,
            metadata: json!({}),
            created_at: now,
        };
        self.checkpoint_store.save(checkpoint).await?;
        Ok(())
    }

    async fn latest_checkpoint_uid(
        &self,
        run_id: Uid<RunKind>,
    ) -> Result<Option<Uid<evidex_core::core::CheckpointKind>>, PipelineError> {
        Ok(self.checkpoint_store.load_latest(run_id).await?.map(|checkpoint| checkpoint.uid))
    }

    fn advance_progress(&self, run_id: Uid<RunKind>, stages_total: u32) {
        self.update_state(run_id, |state| {
            state.stages_completed += 1;
            state.progress_pct = if stages_total == 0 {
                100.0
            } else {
                f64::from(state.stages_completed) / f64::from(stages_total) * 100.0
            };
        });
    }

    fn update_state(&self, run_id: Uid<RunKind>, mutate: impl FnOnce(&mut RunState)) {
        let mut runs = self.runs.lock();
        let Some(state) = runs.get_mut(&run_id) else { return };
        mutate(state);
        let snapshot = state.clone();
        drop(runs);
        if let Some(sender) = self.watches.lock().get(&run_id) {
            let _ = sender.send(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use evidex_core::interfaces::CheckpointError;

    use super::*;

    struct InMemoryCheckpointStore {
        latest: Mutex<BTreeMap<Uid<RunKind>, Checkpoint>>,
    }

    impl InMemoryCheckpointStore {
        fn new() -> Self {
            Self { latest: Mutex::new(BTreeMap::new()) }
        }
    }

    #[async_trait]
    impl CheckpointStore for InMemoryCheckpointStore {
        async fn save(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError> {
            self.latest.lock().insert(checkpoint.thread_id, checkpoint);
            Ok(())
        }

        async fn load_latest(&self, thread_id: Uid<RunKind>) -> Result<Option<Checkpoint>, CheckpointError> {
            Ok(self.latest.lock().get(&thread_id).cloned())
        }
    }

    struct EchoStage {
        stage_name: &'static str,
    }

    #[async_trait]
    impl Stage for EchoStage {
        fn name(&self) -> &'static str {
            self.stage_name
        }

        fn should_skip(&self, _ctx: &StageContext) -> Option<String> {
            None
        }

        async fn run(&self, _ctx: &mut StageContext, _config: &Value) -> Result<Value, String> {
            Ok(json!({"ran": self.stage_name}))
        }
    }

    fn ts() -> Timestamp {
        "2026-01-01T00:00:00Z".parse().expect("ts")
    }

    #[tokio::test]
    async fn runs_every_stage_in_order_and_reaches_completed() {
        let stages: Vec<Arc<dyn Stage>> = DEFAULT_STAGE_ORDER
            .iter()
            .map(|&name| Arc::new(EchoStage { stage_name: name }) as Arc<dyn Stage>)
            .collect();
        let tracker = PipelineTracker::new(stages, Arc::new(InMemoryCheckpointStore::new()));
        let run_id = Uid::random();
        let case_uid = Uid::random();
        let mut ctx = StageContext { case_uid: Some(case_uid), ..StageContext::default() };

        let results = tracker.run(run_id, case_uid, &Playbook::default_playbook(), &mut ctx, ts()).await.unwrap();

        assert_eq!(results.len(), DEFAULT_STAGE_ORDER.len());
        assert!(results.iter().all(|result| result.status == StageStatus::Success));
        let state = tracker.run_state(run_id).unwrap();
        assert_eq!(state.status, RunStatus::Completed);
        assert_eq!(state.stages_completed, DEFAULT_STAGE_ORDER.len() as u32);
    }

    struct FailingStage;

    #[async_trait]
    impl Stage for FailingStage {
        fn name(&self) -> &'static str {
            "hypothesis_analyze"
        }

        fn should_skip(&self, _ctx: &StageContext) -> Option<String> {
            None
        }

        async fn run(&self, _ctx: &mut StageContext, _config: &Value) -> Result<Value, String> {
            Err("broker unreachable".to_string())
        }
    }

    #[tokio::test]
    async fn failing_stage_halts_the_run_and_marks_it_failed() {
        let stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(EchoStage { stage_name: "assertion_fuse" }),
            Arc::new(FailingStage),
            Arc::new(EchoStage { stage_name: "adversarial_evaluate" }),
        ];
        let tracker = PipelineTracker::new(stages, Arc::new(InMemoryCheckpointStore::new()));
        let run_id = Uid::random();
        let case_uid = Uid::random();
        let mut ctx = StageContext { case_uid: Some(case_uid), ..StageContext::default() };
        let playbook = Playbook {
            name: "test".to_string(),
            stages: vec![
                "assertion_fuse".to_string(),
                "hypothesis_analyze".to_string(),
                "adversarial_evaluate".to_string(),
            ],
            stage_config: BTreeMap::new(),
        };

        let err = tracker.run(run_id, case_uid, &playbook, &mut ctx, ts()).await.unwrap_err();

        assert!(matches!(err, PipelineError::StageFailed { .. }));
        let state = tracker.run_state(run_id).unwrap();
        assert_eq!(state.status, RunStatus::Failed);
        assert_eq!(state.stages_completed, 1);
    }

    #[test]
    fn hypothesis_multi_perspective_playbook_swaps_one_stage() {
        let playbook = Playbook::hypothesis_multi_perspective();
        assert!(!playbook.stages.contains(&"hypothesis_analyze".to_string()));
        assert!(playbook.stages.contains(&"hypothesis_multi_perspective".to_string()));
        assert_eq!(playbook.stages.len(), DEFAULT_STAGE_ORDER.len());
    }

    #[test]
    fn osint_collect_playbook_prepends_one_stage() {
        let playbook = Playbook::osint_collect();
        assert_eq!(playbook.stages.first(), Some(&"osint_collect".to_string()));
        assert_eq!(playbook.stages.len(), DEFAULT_STAGE_ORDER.len() + 1);
    }
}
