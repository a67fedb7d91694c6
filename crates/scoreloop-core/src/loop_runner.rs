use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use scoreloop_agent::{Agent, AgentConfig, AgentError};
use scoreloop_evidence::{EvidenceLedger, TestOutputInterpreter};
use scoreloop_hooks::{create_supervisor_hooks, HookSet};
use scoreloop_logging::{LogEvent, LogFormat, Logger, ProcessContext};
use scoreloop_quality::{assess, compare};

use crate::context::IterationRecord;
use crate::error::LoopError;
use crate::outcome::LoopOutcome;
use crate::termination::{check_termination, TerminationReason};
use crate::{LoopConfig, LoopContext};

/// Warning key for scoring weights that do not sum to 1.0
pub const WEIGHTS_WARNING: &str = "scoring_weights_not_normalized";

/// Observer called after every completed iteration
pub type IterationCallback<'a> = Box<dyn Fn(&IterationRecord) + Send + Sync + 'a>;

/// Drives an engine through scored iterations until a stop condition fires
pub struct LoopRunner<'a> {
    agent: &'a dyn Agent,
    logger: Arc<Logger>,
    process: Arc<ProcessContext>,
    interrupted: Arc<AtomicBool>,
    extra_hooks: HookSet,
    interpreter: Option<Arc<dyn TestOutputInterpreter>>,
    on_iteration: Option<IterationCallback<'a>>,
}

impl<'a> LoopRunner<'a> {
    pub fn new(agent: &'a dyn Agent, logger: Arc<Logger>, process: Arc<ProcessContext>) -> Self {
        Self {
            agent,
            logger,
            process,
            interrupted: Arc::new(AtomicBool::new(false)),
            extra_hooks: HookSet::new(),
            interpreter: None,
            on_iteration: None,
        }
    }

    /// Hooks to run after the built-in safety and evidence hooks
    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.extra_hooks = hooks;
        self
    }

    /// Replace the heuristic test-output interpreter
    pub fn with_interpreter(mut self, interpreter: Arc<dyn TestOutputInterpreter>) -> Self {
        self.interpreter = Some(interpreter);
        self
    }

    pub fn on_iteration<F>(mut self, callback: F) -> Self
    where
        F: Fn(&IterationRecord) + Send + Sync + 'a,
    {
        self.on_iteration = Some(Box::new(callback));
        self
    }

    /// Get a handle to signal interruption. Checked between iterations.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    /// Run the loop until a termination condition fires
    pub async fn run(
        &self,
        mut context: LoopContext,
        config: &LoopConfig,
    ) -> Result<LoopOutcome, LoopError> {
        config.validate()?;
        let max_iterations = config.effective_max_iterations();
        if !config.weights.is_normalized() {
            self.process.warn_once(
                WEIGHTS_WARNING,
                &format!(
                    "Scoring weights sum to {:.3}, not 1.0; scores may leave the 0-100 range before clamping",
                    config.weights.sum()
                ),
            );
        }

        self.logger.log(&LogEvent::LoopStarted {
            task: context.task.clone(),
            working_dir: context.working_dir.clone(),
            max_iterations,
            quality_threshold: config.quality_threshold,
        });

        let ledger = match &self.interpreter {
            Some(interpreter) => EvidenceLedger::with_interpreter(interpreter.clone()),
            None => EvidenceLedger::new(),
        }
        .shared();
        let hooks = create_supervisor_hooks(ledger.clone()).merge(self.extra_hooks.clone());
        let scoring = config.scoring_config();
        let iteration_timeout = config.iteration_timeout();

        let mut reason = TerminationReason::MaxIterationsReached;
        let mut engine_error = None;
        let mut previous_assessment = None;

        while context.iteration < max_iterations {
            if self.interrupted.load(Ordering::SeqCst) {
                info!(iteration = context.iteration, "Loop interrupted by user");
                reason = TerminationReason::UserCancelled;
                break;
            }

            let iteration = context.iteration;
            EvidenceLedger::lock(&ledger).reset();

            let prompt = context.current_prompt();
            self.logger.log(&LogEvent::IterationStarted {
                iteration,
                prompt_preview: prompt.chars().take(100).collect(),
            });

            let mut agent_config = AgentConfig::new(context.working_dir.clone())
                .with_iteration(iteration)
                .with_timeout(iteration_timeout);
            agent_config.model = config.model.clone();
            agent_config.max_turns = config.max_turns;

            debug!(iteration, agent = self.agent.name(), "Running engine");
            let started = Instant::now();
            let result = tokio::time::timeout(
                iteration_timeout,
                self.agent.execute(&prompt, &agent_config, &hooks),
            )
            .await
            .unwrap_or(Err(AgentError::Timeout(iteration_timeout)));

            let output = match result {
                Ok(output) => output,
                Err(e) => {
                    warn!(iteration, error = %e, "Engine run failed");
                    self.logger.log(&LogEvent::ErrorEncountered {
                        iteration,
                        error: e.to_string(),
                    });
                    reason = TerminationReason::Error;
                    engine_error = Some(e.to_string());
                    break;
                }
            };

            self.logger.log(&LogEvent::EngineCompleted {
                iteration,
                event_count: output.event_count,
                denied_count: output.denied_count,
                duration_secs: output.duration.as_secs_f64(),
            });

            let evidence = EvidenceLedger::lock(&ledger).snapshot();
            let summary = evidence.summary();
            self.logger.log(&LogEvent::EvidenceCollected {
                iteration,
                files_modified: summary.total_files_modified,
                commands_run: summary.commands_run,
                tests_run: summary.tests_run,
                tests_passed: summary.tests_passed,
                tests_failed: summary.tests_failed,
            });

            let assessment = assess(&evidence, &scoring);
            if let Some(previous) = &previous_assessment {
                let delta = compare(&assessment, previous);
                debug!(
                    iteration,
                    delta = delta.score_delta,
                    band_changed = delta.band_changed,
                    "Score change"
                );
            }
            self.logger.log(&LogEvent::AssessmentCompleted {
                iteration,
                score: assessment.score,
                band: assessment.band.to_string(),
                passed: assessment.passed,
                improvements: assessment.improvements_needed.clone(),
            });
            info!(
                iteration = iteration + 1,
                score = assessment.score,
                passed = assessment.passed,
                "Iteration complete"
            );

            let passed = assessment.passed;
            previous_assessment = Some(assessment.clone());
            let record =
                IterationRecord::new(iteration, assessment, summary, &output, started.elapsed());
            context.push_record(record);
            if let (Some(callback), Some(record)) = (&self.on_iteration, context.history.last()) {
                callback(record);
            }

            if let Some(stop) =
                check_termination(&context.scores(), passed, config, context.total_duration())
            {
                reason = stop;
                break;
            }

            context.increment_iteration();
        }

        let duration = context.total_duration();
        let mut outcome = LoopOutcome::new(reason, context.history, duration);
        if let Some(error) = engine_error {
            outcome = outcome.with_error(error);
        }

        self.logger.log(&LogEvent::LoopTerminated {
            status: if outcome.is_success() { "success" } else { "terminated" }.to_string(),
            reason: outcome.reason.to_string(),
            final_score: outcome.final_score,
            iterations: outcome.iteration_count,
            duration_secs: outcome.total_duration_secs,
        });

        Ok(outcome)
    }
}

/// Run a loop in the current directory with a private process context.
///
/// Output goes to tracing only. Use [`LoopRunner`] directly to share a
/// [`ProcessContext`] across runs or to log events to the console.
pub async fn run_loop(
    agent: &dyn Agent,
    task: &str,
    config: &LoopConfig,
    extra_hooks: Option<HookSet>,
    on_iteration: Option<IterationCallback<'_>>,
) -> Result<LoopOutcome, LoopError> {
    let logger = Arc::new(Logger::new(LogFormat::Compact).without_console());
    let mut runner = LoopRunner::new(agent, logger, ProcessContext::without_tracing());
    if let Some(hooks) = extra_hooks {
        runner = runner.with_hooks(hooks);
    }
    runner.on_iteration = on_iteration;

    let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    runner
        .run(LoopContext::new(task.to_string(), working_dir), config)
        .await
}
