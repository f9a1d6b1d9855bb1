//! The generate/validate iteration controller.
//!
//! Drives the generator and validator against each other until the
//! validator passes the candidate or the iteration ceiling is reached.
//! Validator findings from each failed pass are rendered into feedback for
//! the next generator invocation; both sub-calls append to the shared
//! transcript so later iterations can reference earlier attempts.

use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::retry::{RetryPolicy, Transient};
use crate::review::{render_feedback, FeedbackOptions, Finding, Review, Verdict};
use crate::transcript::Transcript;

/// Produces candidate artifacts from a plan.
///
/// The candidate payload is opaque to the loop; the generator and validator
/// agree on its shape between themselves.
#[async_trait]
pub trait CandidateGenerator: Send + Sync {
    /// Propose a candidate for the plan.
    ///
    /// `feedback` carries the rendered findings from the previous failed
    /// pass, or `None` on the first iteration.
    async fn propose(
        &self,
        plan: &Value,
        feedback: Option<&str>,
        transcript: &mut Transcript,
    ) -> CoreResult<Value>;
}

/// Reviews candidate artifacts and produces a verdict with findings.
#[async_trait]
pub trait CandidateValidator: Send + Sync {
    async fn review(&self, candidate: &Value, transcript: &mut Transcript) -> CoreResult<Review>;
}

/// One completed pass of the loop.
///
/// Records are appended to the history in order and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based iteration number
    pub iteration: u32,
    /// The candidate produced this pass
    pub candidate: Value,
    pub verdict: Verdict,
    pub findings: Vec<Finding>,
}

/// Terminal state of a loop run.
///
/// Exhaustion is a normal result, not an error: the caller receives the
/// last candidate and the full history for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum LoopOutcome {
    Converged {
        candidate: Value,
        iterations: u32,
        history: Vec<IterationRecord>,
    },
    Exhausted {
        candidate: Value,
        history: Vec<IterationRecord>,
    },
}

impl LoopOutcome {
    pub fn converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }

    /// The last candidate produced, converged or not.
    pub fn candidate(&self) -> &Value {
        match self {
            Self::Converged { candidate, .. } | Self::Exhausted { candidate, .. } => candidate,
        }
    }

    pub fn history(&self) -> &[IterationRecord] {
        match self {
            Self::Converged { history, .. } | Self::Exhausted { history, .. } => history,
        }
    }

    /// Number of iterations the loop ran.
    pub fn iterations(&self) -> u32 {
        self.history().len() as u32
    }

    /// Every finding seen across all passes, in order.
    pub fn all_findings(&self) -> Vec<&Finding> {
        self.history()
            .iter()
            .flat_map(|r| r.findings.iter())
            .collect()
    }
}

/// The iteration controller.
pub struct ValidationLoop {
    max_iterations: u32,
    retry: RetryPolicy,
    feedback: FeedbackOptions,
    history_path: Option<PathBuf>,
}

impl ValidationLoop {
    /// Create a controller with the given iteration ceiling.
    pub fn new(max_iterations: u32) -> Self {
        Self {
            max_iterations,
            retry: RetryPolicy::default(),
            feedback: FeedbackOptions::default(),
            history_path: None,
        }
    }

    /// Override the retry policy applied to each sub-call.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override feedback rendering options.
    pub fn with_feedback(mut self, feedback: FeedbackOptions) -> Self {
        self.feedback = feedback;
        self
    }

    /// Persist the history after each pass so an aborted run keeps its
    /// records for diagnostics.
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }

    /// Drive the loop to convergence or exhaustion.
    pub async fn run(
        &self,
        plan: &Value,
        generator: &dyn CandidateGenerator,
        validator: &dyn CandidateValidator,
        transcript: &mut Transcript,
    ) -> CoreResult<LoopOutcome> {
        if self.max_iterations == 0 {
            return Err(CoreError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        let mut history: Vec<IterationRecord> = Vec::new();
        let mut feedback: Option<String> = None;

        for iteration in 1..=self.max_iterations {
            info!(
                "Validation iteration {}/{}",
                iteration, self.max_iterations
            );

            let candidate = self
                .generate_with_retry(plan, feedback.as_deref(), generator, transcript)
                .await?;
            let review = self
                .validate_with_retry(&candidate, validator, transcript)
                .await?;

            let record = IterationRecord {
                iteration,
                candidate: candidate.clone(),
                verdict: review.verdict,
                findings: review.findings,
            };
            history.push(record);
            self.save_history(&history)?;

            if review.verdict == Verdict::Pass {
                info!("Validation passed on iteration {}", iteration);
                return Ok(LoopOutcome::Converged {
                    candidate,
                    iterations: iteration,
                    history,
                });
            }

            if iteration == self.max_iterations {
                warn!(
                    "Iteration ceiling of {} reached without a pass",
                    self.max_iterations
                );
                return Ok(LoopOutcome::Exhausted { candidate, history });
            }

            let last = history.last().map(|r| r.findings.as_slice()).unwrap_or(&[]);
            let rendered = render_feedback(last, self.feedback);
            debug!("Feedback for next iteration:\n{}", rendered);
            feedback = Some(rendered);
        }

        unreachable!("loop terminates inside the iteration bounds");
    }

    async fn generate_with_retry(
        &self,
        plan: &Value,
        feedback: Option<&str>,
        generator: &dyn CandidateGenerator,
        transcript: &mut Transcript,
    ) -> CoreResult<Value> {
        let mut attempt = 1u32;
        loop {
            match generator.propose(plan, feedback, transcript).await {
                Ok(candidate) => return Ok(candidate),
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay(attempt);
                    warn!(
                        "Generator attempt {}/{} failed: {} (retrying in {:?})",
                        attempt, self.retry.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    return Err(CoreError::RetryExhausted {
                        operation: "generate".to_string(),
                        attempts: attempt,
                        last: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn validate_with_retry(
        &self,
        candidate: &Value,
        validator: &dyn CandidateValidator,
        transcript: &mut Transcript,
    ) -> CoreResult<Review> {
        let mut attempt = 1u32;
        loop {
            match validator.review(candidate, transcript).await {
                Ok(review) => return Ok(review),
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay(attempt);
                    warn!(
                        "Validator attempt {}/{} failed: {} (retrying in {:?})",
                        attempt, self.retry.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    return Err(CoreError::RetryExhausted {
                        operation: "validate".to_string(),
                        attempts: attempt,
                        last: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn save_history(&self, history: &[IterationRecord]) -> CoreResult<()> {
        let Some(path) = &self.history_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(history)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        fs::write(path, json)?;
        debug!("Saved iteration history to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::Severity;
    use crate::transcript::Role;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct CountingGenerator {
        calls: AtomicU32,
        transient_failures: u32,
    }

    impl CountingGenerator {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
                transient_failures: 0,
            }
        }

        fn with_transient_failures(failures: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                transient_failures: failures,
            }
        }
    }

    #[async_trait]
    impl CandidateGenerator for CountingGenerator {
        async fn propose(
            &self,
            _plan: &Value,
            feedback: Option<&str>,
            transcript: &mut Transcript,
        ) -> CoreResult<Value> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.transient_failures {
                return Err(CoreError::external("rate limited", true));
            }
            transcript.append("generate", Role::User, feedback.unwrap_or("initial"));
            transcript.append("generate", Role::Assistant, format!("candidate-{}", call));
            Ok(json!({ "candidate": call }))
        }
    }

    struct ScriptedValidator {
        calls: AtomicU32,
        pass_on: Option<u32>,
    }

    impl ScriptedValidator {
        fn always_fail() -> Self {
            Self {
                calls: AtomicU32::new(0),
                pass_on: None,
            }
        }

        fn pass_on(call: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                pass_on: Some(call),
            }
        }
    }

    #[async_trait]
    impl CandidateValidator for ScriptedValidator {
        async fn review(
            &self,
            _candidate: &Value,
            transcript: &mut Transcript,
        ) -> CoreResult<Review> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            transcript.append("validate", Role::Assistant, format!("review-{}", call));
            if self.pass_on == Some(call) {
                Ok(Review::from_findings(Vec::new()))
            } else {
                Ok(Review::from_findings(vec![Finding::error(
                    "main.tf",
                    "unbalanced braces",
                )]))
            }
        }
    }

    fn fast_loop(max_iterations: u32) -> ValidationLoop {
        ValidationLoop::new(max_iterations).with_retry(RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            multiplier: 2,
        })
    }

    #[tokio::test]
    async fn test_always_fail_exhausts_at_ceiling() {
        let looper = fast_loop(3);
        let generator = CountingGenerator::new();
        let validator = ScriptedValidator::always_fail();
        let mut transcript = Transcript::new();

        let outcome = looper
            .run(&json!({}), &generator, &validator, &mut transcript)
            .await
            .unwrap();

        assert!(!outcome.converged());
        assert_eq!(outcome.history().len(), 3);
        assert_eq!(outcome.history().last().unwrap().iteration, 3);
        assert_eq!(outcome.all_findings().len(), 3);
    }

    #[tokio::test]
    async fn test_pass_on_second_converges_with_two_records() {
        let looper = fast_loop(5);
        let generator = CountingGenerator::new();
        let validator = ScriptedValidator::pass_on(2);
        let mut transcript = Transcript::new();

        let outcome = looper
            .run(&json!({}), &generator, &validator, &mut transcript)
            .await
            .unwrap();

        assert!(outcome.converged());
        assert_eq!(outcome.iterations(), 2);
        assert_eq!(outcome.history().len(), 2);
        match outcome {
            LoopOutcome::Converged { iterations, .. } => assert_eq!(iterations, 2),
            LoopOutcome::Exhausted { .. } => panic!("expected convergence"),
        }
    }

    #[tokio::test]
    async fn test_iteration_numbers_are_gapless() {
        let looper = fast_loop(4);
        let generator = CountingGenerator::new();
        let validator = ScriptedValidator::always_fail();
        let mut transcript = Transcript::new();

        let outcome = looper
            .run(&json!({}), &generator, &validator, &mut transcript)
            .await
            .unwrap();

        let numbers: Vec<u32> = outcome.history().iter().map(|r| r.iteration).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_pass_record_is_last() {
        let looper = fast_loop(5);
        let generator = CountingGenerator::new();
        let validator = ScriptedValidator::pass_on(3);
        let mut transcript = Transcript::new();

        let outcome = looper
            .run(&json!({}), &generator, &validator, &mut transcript)
            .await
            .unwrap();

        let history = outcome.history();
        assert_eq!(history.last().unwrap().verdict, Verdict::Pass);
        assert!(history[..history.len() - 1]
            .iter()
            .all(|r| r.verdict == Verdict::Fail));
    }

    #[tokio::test]
    async fn test_retried_call_consumes_no_iteration() {
        let looper = fast_loop(5);
        // Two transient failures, then success on every call.
        let generator = CountingGenerator::with_transient_failures(2);
        let validator = ScriptedValidator::pass_on(1);
        let mut transcript = Transcript::new();

        let outcome = looper
            .run(&json!({}), &generator, &validator, &mut transcript)
            .await
            .unwrap();

        assert!(outcome.converged());
        assert_eq!(outcome.iterations(), 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion_is_fatal() {
        let looper = fast_loop(5);
        let generator = CountingGenerator::with_transient_failures(10);
        let validator = ScriptedValidator::pass_on(1);
        let mut transcript = Transcript::new();

        let err = looper
            .run(&json!({}), &generator, &validator, &mut transcript)
            .await
            .unwrap_err();

        match err {
            CoreError::RetryExhausted { operation, attempts, .. } => {
                assert_eq!(operation, "generate");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_transcript_grows_monotonically() {
        let looper = fast_loop(3);
        let generator = CountingGenerator::new();
        let validator = ScriptedValidator::always_fail();
        let mut transcript = Transcript::new();

        looper
            .run(&json!({}), &generator, &validator, &mut transcript)
            .await
            .unwrap();

        // Three iterations, each appending two generator exchanges and one
        // validator exchange.
        assert_eq!(transcript.len(), 9);
    }

    #[tokio::test]
    async fn test_history_persisted_after_each_pass() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("iterations.json");
        let looper = fast_loop(2).with_history_path(&path);
        let generator = CountingGenerator::new();
        let validator = ScriptedValidator::always_fail();
        let mut transcript = Transcript::new();

        looper
            .run(&json!({}), &generator, &validator, &mut transcript)
            .await
            .unwrap();

        let saved: Vec<IterationRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].findings[0].severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_zero_ceiling_is_rejected() {
        let looper = fast_loop(0);
        let generator = CountingGenerator::new();
        let validator = ScriptedValidator::always_fail();
        let mut transcript = Transcript::new();

        let err = looper
            .run(&json!({}), &generator, &validator, &mut transcript)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }
}
