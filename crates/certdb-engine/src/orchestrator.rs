//! Sequential pipeline over the configured states.
//!
//! Each state runs `pending → discovering → [validating] → [inferring] →
//! persisting → done`. All rows for a state (tests, objectives, the refresh
//! timestamp and the success audit) commit in one transaction. A failure
//! inside it rolls back, records a `failed` audit and moves on to the next
//! state. Reports are written once every state has been processed.

use chrono::{DateTime, Utc};

use certdb_config::{CertdbConfig, RunTarget};
use certdb_core::drafts::{NewAudit, NewObjective, NewTest};
use certdb_core::entities::{CertTest, State};
use certdb_core::enums::{AuditStatus, ObjectivePath, PipelinePhase, ValidationStatus};
use certdb_core::errors::CoreError;
use certdb_db::error::DatabaseError;
use certdb_db::{CertDb, Writer};
use certdb_report::{ReportFiles, Reporter};

use crate::context::{RunContext, StateOutcome};
use crate::discovery::{DiscoveredObjective, Discovery, DiscoveryResult};
use crate::error::EngineError;
use crate::inference::{GenerationContext, generate_with_floor};
use crate::run_log::RunLog;
use crate::validator::{apply_validation, clean_text, validate_test};

/// Guards the per-state phase machine.
struct PhaseTracker<'s> {
    unit: &'s str,
    phase: PipelinePhase,
}

impl<'s> PhaseTracker<'s> {
    const fn new(unit: &'s str) -> Self {
        Self {
            unit,
            phase: PipelinePhase::Pending,
        }
    }

    fn advance(&mut self, next: PipelinePhase) -> Result<(), CoreError> {
        if !self.phase.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                unit: self.unit.to_string(),
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        tracing::debug!(state = self.unit, from = %self.phase, to = %next, "phase transition");
        self.phase = next;
        Ok(())
    }
}

/// One test of the state being processed and the objectives chosen for it.
struct TestPlan {
    test: NewTest,
    /// Set when `dedupe_tests` matched a stored test; nothing is written.
    existing: Option<CertTest>,
    candidates: Vec<DiscoveredObjective>,
    supporting_sources: usize,
    objectives: Vec<NewObjective>,
    path: ObjectivePath,
}

impl TestPlan {
    fn fresh(test: NewTest, candidates: Vec<DiscoveredObjective>, supporting_sources: usize) -> Self {
        Self {
            test,
            existing: None,
            candidates,
            supporting_sources,
            objectives: Vec::new(),
            path: ObjectivePath::None,
        }
    }

    fn reused(test: NewTest, existing: CertTest) -> Self {
        Self {
            test,
            existing: Some(existing),
            candidates: Vec::new(),
            supporting_sources: 0,
            objectives: Vec::new(),
            path: ObjectivePath::None,
        }
    }

    fn needs_inference(&self) -> bool {
        self.existing.is_none() && self.objectives.is_empty()
    }
}

fn same_test(a: &NewTest, b: &NewTest) -> bool {
    a.test_system == b.test_system
        && a.test_name == b.test_name
        && a.test_code.as_deref().unwrap_or("") == b.test_code.as_deref().unwrap_or("")
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Drives discovery, validation, inference and persistence for each state,
/// then emits the reports.
pub struct Orchestrator<'a, D: Discovery> {
    db: &'a CertDb,
    config: &'a CertdbConfig,
    discovery: D,
}

impl<'a, D: Discovery> Orchestrator<'a, D> {
    pub const fn new(db: &'a CertDb, config: &'a CertdbConfig, discovery: D) -> Self {
        Self {
            db,
            config,
            discovery,
        }
    }

    /// Process the configured states and write every report.
    ///
    /// # Errors
    ///
    /// Per-state persistence failures are recorded as `failed` audits and do
    /// not surface here. Returns `EngineError` when reports cannot be
    /// written or a phase transition is illegal.
    pub async fn run(&self, ctx: &mut RunContext) -> Result<ReportFiles, EngineError> {
        let targets = self.config.run.resolve_states();
        self.run_targets(ctx, &targets).await
    }

    /// Process `targets` in order and write every report.
    ///
    /// # Errors
    ///
    /// See [`Self::run`].
    pub async fn run_targets(
        &self,
        ctx: &mut RunContext,
        targets: &[RunTarget],
    ) -> Result<ReportFiles, EngineError> {
        ctx.log.info(format!(
            "Starting run: {} state(s), {} configured test(s) per state",
            targets.len(),
            self.config.run.tests.len()
        ));
        if targets.is_empty() {
            ctx.log.warn("No states configured; reports will be empty");
        }

        for target in targets {
            ctx.log.begin_state(&target.name);
            let outcome = self.process_state(&mut ctx.log, target).await;
            ctx.log.end_state();
            ctx.record(outcome?);
        }

        log_summary(ctx);

        let files = Reporter::new(self.db, &self.config.paths).emit_all().await?;
        ctx.log.info(format!(
            "Reports written: {} state file(s), {}, {}",
            files.state_records.len(),
            files.aggregate_json.display(),
            files.coverage_report.display()
        ));
        Ok(files)
    }

    /// Run the full pipeline for one state.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Core` only for an illegal phase transition.
    pub async fn process_state(
        &self,
        log: &mut RunLog,
        target: &RunTarget,
    ) -> Result<StateOutcome, EngineError> {
        let started = Utc::now();
        let mut phase = PhaseTracker::new(&target.name);
        let mut outcome = StateOutcome::new(&target.name);
        log.info(format!("Processing state: {} ({})", target.name, target.abbrev));

        let state = match self.db.writer().upsert_state(&target.name, &target.abbrev).await {
            Ok(state) => state,
            Err(error) => {
                phase.advance(PipelinePhase::Failed)?;
                log.error(format!("Could not register state {}: {error}", target.name));
                // The audit needs a state row; record it when one exists.
                if let Ok(Some(state)) = self.db.get_state_by_name(&target.name).await {
                    return Ok(self.fail(log, &state, outcome, started, &error).await);
                }
                log.error(format!("No failed audit recorded for {}: state row missing", target.name));
                outcome.status = AuditStatus::Failed;
                outcome.error = Some(error.to_string());
                return Ok(outcome);
            }
        };

        phase.advance(PipelinePhase::Discovering)?;
        let mut plans = match self.discover(log, &state, target, &mut outcome).await {
            Ok(plans) => plans,
            Err(error) => {
                phase.advance(PipelinePhase::Failed)?;
                return Ok(self.fail(log, &state, outcome, started, &error).await);
            }
        };

        if plans.iter().any(|p| !p.candidates.is_empty()) {
            phase.advance(PipelinePhase::Validating)?;
            for plan in &mut plans {
                validate_discovered(log, plan);
            }
        }

        if phase.phase == PipelinePhase::Discovering || plans.iter().any(TestPlan::needs_inference) {
            phase.advance(PipelinePhase::Inferring)?;
            for plan in plans.iter_mut().filter(|p| p.needs_inference()) {
                self.infer(log, plan);
            }
        }

        phase.advance(PipelinePhase::Persisting)?;
        tally(&plans, &mut outcome);
        let audit = NewAudit {
            status: outcome.status,
            objective_path: outcome.objective_path,
            tests_found: outcome.tests_found,
            objectives_found: outcome.objectives_found,
            objectives_inferred: outcome.objectives_inferred,
            queries_attempted: outcome.queries_attempted,
            run_started_at: started,
            run_ended_at: Some(Utc::now()),
            notes: Some(format!(
                "{} test(s), {} objective(s) via {} path, {} flagged",
                outcome.tests_found,
                outcome.objectives(),
                outcome.objective_path,
                outcome.objectives_flagged
            )),
        };

        if let Err(error) = self.persist(&state, &plans, &audit).await {
            phase.advance(PipelinePhase::Failed)?;
            return Ok(self.fail(log, &state, outcome, started, &error).await);
        }

        phase.advance(PipelinePhase::Done)?;
        log.info(format!(
            "Completed {}: {} test(s), {} discovered, {} inferred, {} flagged ({})",
            state.name,
            outcome.tests_found,
            outcome.objectives_found,
            outcome.objectives_inferred,
            outcome.objectives_flagged,
            outcome.status
        ));
        Ok(outcome)
    }

    /// Build the state's test list: configured tests first, each followed
    /// by any additional tests its discovery call reported.
    async fn discover(
        &self,
        log: &mut RunLog,
        state: &State,
        target: &RunTarget,
        outcome: &mut StateOutcome,
    ) -> Result<Vec<TestPlan>, DatabaseError> {
        let mut plans: Vec<TestPlan> = Vec::new();

        for test in self.config.run.tests_for(target) {
            for issue in validate_test(&test) {
                log.warn(format!("Test metadata issue for {}: {issue}", test.descriptor()));
            }
            if let Some(existing) = self.existing_test(state, &test).await? {
                log.info(format!(
                    "Reusing stored test {} (id {})",
                    test.descriptor(),
                    existing.id
                ));
                plans.push(TestPlan::reused(test, existing));
                continue;
            }

            let DiscoveryResult {
                candidate_tests,
                candidate_objectives,
                supporting_sources,
                queries_attempted,
            } = self.discover_one(log, &state.name, &test).await;
            outcome.queries_attempted += queries_attempted;
            log.info(format!(
                "Discovery for {}: {queries_attempted} queries, {} candidate objective(s), {} supporting source(s)",
                test.descriptor(),
                candidate_objectives.len(),
                supporting_sources.len()
            ));
            plans.push(TestPlan::fresh(test, candidate_objectives, supporting_sources.len()));

            for extra in candidate_tests {
                if plans.iter().any(|p| same_test(&p.test, &extra)) {
                    continue;
                }
                log.info(format!("Discovered additional test: {}", extra.descriptor()));
                match self.existing_test(state, &extra).await? {
                    Some(existing) => plans.push(TestPlan::reused(extra, existing)),
                    None => plans.push(TestPlan::fresh(extra, Vec::new(), 0)),
                }
            }
        }
        Ok(plans)
    }

    async fn existing_test(&self, state: &State, test: &NewTest) -> Result<Option<CertTest>, DatabaseError> {
        if !self.config.run.dedupe_tests {
            return Ok(None);
        }
        self.db.find_test_by_natural_key(state.id, test).await
    }

    /// One discovery call bounded by the configured timeout. A timeout
    /// counts as an empty result.
    async fn discover_one(&self, log: &mut RunLog, state: &str, test: &NewTest) -> DiscoveryResult {
        let timeout = self.config.discovery.timeout();
        if let Ok(result) = tokio::time::timeout(timeout, self.discovery.discover(state, test)).await {
            result
        } else {
            log.warn(format!(
                "Discovery timed out after {}ms for {}",
                timeout.as_millis(),
                test.descriptor()
            ));
            DiscoveryResult::empty(0)
        }
    }

    fn infer(&self, log: &mut RunLog, plan: &mut TestPlan) {
        let ctx = GenerationContext::from(&plan.test);
        let mut generation = generate_with_floor(&ctx, self.config.run.confidence_floor);
        if plan.candidates.is_empty() && plan.supporting_sources > 0 {
            generation.apply_evidence_boost(plan.supporting_sources);
        }
        log.info(format!(
            "Generated {} objective(s) for {} via {} (confidence {:.2})",
            generation.objectives.len(),
            plan.test.descriptor(),
            generation.strategy,
            generation.objectives.first().map_or(0.0, |o| o.confidence)
        ));

        let mut drafts = generation.into_drafts();
        for draft in &mut drafts {
            let issues = apply_validation(draft);
            if !issues.is_empty() {
                log.warn(format!("Generated objective {} flagged", draft.index));
            }
        }
        plan.objectives = drafts;
        plan.path = ObjectivePath::Inferred;
    }

    async fn persist(&self, state: &State, plans: &[TestPlan], audit: &NewAudit) -> Result<(), DatabaseError> {
        let uow = self.db.begin().await?;
        let written = write_state(uow.writer(), state.id, plans, audit).await;
        match written {
            Ok(()) => uow.commit().await,
            Err(error) => {
                if let Err(rollback) = uow.rollback().await {
                    tracing::warn!(state = %state.name, %rollback, "rollback failed");
                }
                Err(error)
            }
        }
    }

    /// Record a persistence failure: `failed` audit outside the rolled-back
    /// transaction, zeroed counts on the outcome.
    async fn fail(
        &self,
        log: &mut RunLog,
        state: &State,
        mut outcome: StateOutcome,
        started: DateTime<Utc>,
        error: &DatabaseError,
    ) -> StateOutcome {
        log.error(format!("Persistence failure for {}: {error}", state.name));
        let audit = NewAudit {
            status: AuditStatus::Failed,
            objective_path: ObjectivePath::None,
            tests_found: 0,
            objectives_found: 0,
            objectives_inferred: 0,
            queries_attempted: outcome.queries_attempted,
            run_started_at: started,
            run_ended_at: Some(Utc::now()),
            notes: Some(format!("persistence failure: {error}")),
        };
        if let Err(audit_error) = self.db.writer().insert_audit(state.id, &audit).await {
            log.error(format!("Could not record failed audit for {}: {audit_error}", state.name));
        }

        outcome.status = AuditStatus::Failed;
        outcome.objective_path = ObjectivePath::None;
        outcome.tests_found = 0;
        outcome.objectives_found = 0;
        outcome.objectives_inferred = 0;
        outcome.objectives_flagged = 0;
        outcome.error = Some(error.to_string());
        outcome
    }
}

/// Clean, number and validate a plan's discovered objectives. The set is
/// kept when at least one objective passes; otherwise the plan falls
/// through to inference.
fn validate_discovered(log: &mut RunLog, plan: &mut TestPlan) {
    if plan.candidates.is_empty() {
        return;
    }
    let drafts: Vec<NewObjective> = plan
        .candidates
        .iter()
        .filter_map(|candidate| {
            let text = clean_text(&candidate.text);
            (!text.is_empty()).then_some((text, candidate))
        })
        .zip(0u32..)
        .map(|((text, candidate), index)| {
            let mut draft = NewObjective::discovered(index, &text, candidate.source_url.as_deref());
            draft.evidence_locator.clone_from(&candidate.locator);
            apply_validation(&mut draft);
            draft
        })
        .collect();

    let passed = drafts
        .iter()
        .filter(|d| d.validation_status == ValidationStatus::Verified)
        .count();
    if passed == 0 {
        log.warn(format!(
            "No discovered objective for {} passed validation ({} candidate(s)); falling back to inference",
            plan.test.descriptor(),
            plan.candidates.len()
        ));
        return;
    }
    log.info(format!(
        "Validated discovered objectives for {}: {passed} of {} passed",
        plan.test.descriptor(),
        drafts.len()
    ));
    plan.objectives = drafts;
    plan.path = ObjectivePath::Discovered;
}

/// Fill the outcome's counts from the plans about to be written.
fn tally(plans: &[TestPlan], outcome: &mut StateOutcome) {
    outcome.tests_found = count_u32(plans.len());
    let objectives = || plans.iter().flat_map(|p| p.objectives.iter());
    outcome.objectives_found = count_u32(objectives().filter(|o| !o.is_inferred).count());
    outcome.objectives_inferred = count_u32(objectives().filter(|o| o.is_inferred).count());
    outcome.objectives_flagged = count_u32(
        objectives()
            .filter(|o| o.validation_status == ValidationStatus::Flagged)
            .count(),
    );
    outcome.objective_path = plans
        .iter()
        .fold(ObjectivePath::None, |acc, p| acc.combine(p.path));
    outcome.status = if plans.is_empty() {
        AuditStatus::Partial
    } else {
        AuditStatus::Success
    };
}

async fn write_state(
    writer: Writer<'_>,
    state_id: i64,
    plans: &[TestPlan],
    audit: &NewAudit,
) -> Result<(), DatabaseError> {
    for plan in plans {
        let test_id = match &plan.existing {
            Some(existing) => existing.id,
            None => writer.insert_test(state_id, &plan.test).await?.id,
        };
        for objective in &plan.objectives {
            writer.insert_objective(test_id, objective).await?;
        }
    }
    writer.touch_state_refresh(state_id).await?;
    writer.insert_audit(state_id, audit).await?;
    Ok(())
}

fn log_summary(ctx: &mut RunContext) {
    let summary = ctx.summary.clone();
    ctx.log.info(format!(
        "Run complete: {} state(s), {} test(s), {} objective(s)",
        summary.states_processed, summary.total_tests, summary.total_objectives
    ));
    ctx.log.info(format!(
        "Verified: {} ({:.1}%), Inferred: {} ({:.1}%), Flagged: {}",
        summary.total_verified,
        summary.verified_pct(),
        summary.total_inferred,
        summary.inferred_pct(),
        summary.total_flagged
    ));
    if !summary.failed_states.is_empty() {
        ctx.log.error(format!("Failed states: {}", summary.failed_states.join(", ")));
    }
    let elapsed = Utc::now() - ctx.started_at();
    ctx.log.info(format!("Elapsed: {}ms", elapsed.num_milliseconds()));
}
