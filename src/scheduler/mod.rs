mod conflicts;
mod feasibility;
mod moves;
mod score;
mod tabu;
mod types;
mod util;

pub use conflicts::detect_violations;
pub use feasibility::{FeasibilityError, FeasibilitySolver, InfeasibilityReport, DEFAULT_NODE_LIMIT};
pub use moves::{neighborhood, Move};
pub use score::{Evaluator, Satisfaction, ScoreBreakdown};
pub use tabu::{StopReason, TabuConfig, TabuOutcome, TabuSearch};
pub use types::{Budget, CancelToken, Interrupt, SchedError, Violation, ViolationKind};

use crate::model::{InputError, Roster, Schedule};
use rayon::prelude::*;
use serde::Serialize;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Budget et réglages d'un run complet.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub tabu: TabuConfig,
    /// Échéance interne, mêmes effets qu'une annulation.
    pub time_limit: Option<Duration>,
    /// Recherches tabou indépendantes depuis le même départ (>= 1).
    pub restarts: usize,
    /// Mouvements aléatoires avant chaque redémarrage `k > 0`.
    pub warmup_moves: usize,
    pub feasibility_node_limit: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tabu: TabuConfig::default(),
            time_limit: None,
            restarts: 1,
            warmup_moves: 10,
            feasibility_node_limit: DEFAULT_NODE_LIMIT,
        }
    }
}

impl RunOptions {
    pub fn with_tabu(mut self, tabu: TabuConfig) -> Self {
        self.tabu = tabu;
        self
    }
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts.max(1);
        self
    }
    pub fn with_warmup_moves(mut self, moves: usize) -> Self {
        self.warmup_moves = moves;
        self
    }
    pub fn with_feasibility_node_limit(mut self, limit: u64) -> Self {
        self.feasibility_node_limit = limit.max(1);
        self
    }
}

/// Issue d'un run, sérialisable telle quelle pour l'appelant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Infeasible { report: InfeasibilityReport },
    InvalidInput { message: String },
    Cancelled,
    TimedOut,
    InternalError { detail: String },
}

/// Compte rendu d'un run. L'affectation elle-même est exportée à part
/// (voir `io::ScheduleExport`).
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    #[serde(flatten)]
    pub status: RunStatus,
    #[serde(skip)]
    pub schedule: Option<Schedule>,
    pub initial_score: Option<f64>,
    pub final_score: Option<f64>,
    pub iterations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_restart: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopReason>,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satisfaction: Option<Satisfaction>,
}

impl RunReport {
    fn new(run_id: Uuid, status: RunStatus) -> Self {
        Self {
            run_id,
            status,
            schedule: None,
            initial_score: None,
            final_score: None,
            iterations: 0,
            best_restart: None,
            stop: None,
            elapsed_ms: 0,
            breakdown: None,
            satisfaction: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Meilleur redémarrage d'une optimisation.
#[derive(Debug, Clone)]
pub struct Optimized {
    pub restart: usize,
    pub outcome: TabuOutcome,
    /// Itérations cumulées sur tous les redémarrages.
    pub total_iterations: usize,
    /// Interruption vue par au moins un redémarrage.
    pub interrupted: Option<Interrupt>,
}

/// Scheduler : un Roster validé et les étapes d'un run
#[derive(Debug, Clone)]
pub struct Scheduler {
    roster: Roster,
}

impl Scheduler {
    pub fn new(roster: Roster) -> Result<Self, InputError> {
        roster.validate()?;
        Ok(Self { roster })
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.roster)
    }

    pub fn find_feasible(&self, budget: &Budget, node_limit: u64) -> Result<Schedule, FeasibilityError> {
        FeasibilitySolver::new(&self.roster, budget)
            .with_node_limit(node_limit)
            .solve()
    }

    /// Contraintes dures violées par une affectation de la bonne forme.
    pub fn detect_violations(&self, schedule: &Schedule) -> Result<Vec<Violation>, SchedError> {
        self.check_shape(schedule)?;
        Ok(detect_violations(&self.roster, schedule))
    }

    pub fn check_shape(&self, schedule: &Schedule) -> Result<(), SchedError> {
        let (staff, days) = (self.roster.staff.len(), self.roster.horizon.len());
        if schedule.staff_count() != staff || schedule.days() != days {
            return Err(SchedError::ShapeMismatch {
                staff,
                days,
                got_staff: schedule.staff_count(),
                got_days: schedule.days(),
            });
        }
        Ok(())
    }

    /// Lance `opts.restarts` recherches tabou depuis `start` et garde la
    /// meilleure (à score égal, le plus petit indice de redémarrage).
    pub fn optimize(
        &self,
        start: Schedule,
        opts: &RunOptions,
        budget: &Budget,
    ) -> Result<Optimized, SchedError> {
        let search = TabuSearch::new(&self.roster, opts.tabu.clone());
        let restarts = opts.restarts.max(1);
        let seed = opts.tabu.seed;
        let one = |k: usize| {
            let warmup = if k == 0 { 0 } else { opts.warmup_moves };
            search.run_seeded(start.clone(), seed.wrapping_add(k as u64), warmup, budget)
        };

        let outcomes: Vec<TabuOutcome> = if opts.tabu.parallel && restarts > 1 {
            (0..restarts)
                .into_par_iter()
                .map(one)
                .collect::<Result<_, _>>()?
        } else {
            (0..restarts).map(one).collect::<Result<_, _>>()?
        };

        let total_iterations = outcomes.iter().map(|o| o.iterations).sum();
        let interrupted = outcomes
            .iter()
            .find_map(|o| match o.stop {
                StopReason::Cancelled => Some(Interrupt::Cancelled),
                _ => None,
            })
            .or_else(|| {
                outcomes
                    .iter()
                    .any(|o| o.stop == StopReason::TimedOut)
                    .then_some(Interrupt::TimedOut)
            });

        let mut best: Option<(usize, TabuOutcome)> = None;
        for (k, outcome) in outcomes.into_iter().enumerate() {
            let wins = match &best {
                None => true,
                Some((_, b)) => outcome.best_score > b.best_score + 1e-9,
            };
            if wins {
                best = Some((k, outcome));
            }
        }
        let (restart, outcome) = best.ok_or_else(|| {
            SchedError::InvariantViolation("no restart produced an outcome".to_string())
        })?;

        Ok(Optimized {
            restart,
            outcome,
            total_iterations,
            interrupted,
        })
    }

    /// Faisabilité puis optimisation. Les échecs sont rendus dans le
    /// statut, jamais propagés.
    pub fn run(&self, opts: &RunOptions, cancel: &CancelToken) -> RunReport {
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        let budget = Budget::new(opts.time_limit, cancel.clone());
        log_info!(
            "run {}: {} staff, {} day(s) from {}, {} restart(s)",
            run_id,
            self.roster.staff.len(),
            self.roster.horizon.len(),
            self.roster.horizon.start,
            opts.restarts.max(1)
        );

        let mut report = match self.find_feasible(&budget, opts.feasibility_node_limit) {
            Err(FeasibilityError::Infeasible(report)) => {
                RunReport::new(run_id, RunStatus::Infeasible { report })
            }
            Err(FeasibilityError::Cancelled) => RunReport::new(run_id, RunStatus::Cancelled),
            Err(FeasibilityError::TimedOut) => RunReport::new(run_id, RunStatus::TimedOut),
            Err(FeasibilityError::SearchLimit(nodes)) => {
                log_info!("run {}: feasibility node limit of {} reached", run_id, nodes);
                let mut report = RunReport::new(run_id, RunStatus::TimedOut);
                report.stop = Some(StopReason::NodeLimit);
                report
            }
            Ok(start) => self.optimized_report(run_id, start, opts, &budget),
        };

        report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        log_info!(
            "run {}: {:?} in {} ms, score {:?} after {} iteration(s)",
            run_id,
            report.status,
            report.elapsed_ms,
            report.final_score,
            report.iterations
        );
        report
    }

    fn optimized_report(
        &self,
        run_id: Uuid,
        start: Schedule,
        opts: &RunOptions,
        budget: &Budget,
    ) -> RunReport {
        let optimized = match self.optimize(start, opts, budget) {
            Ok(o) => o,
            Err(e) => {
                log_warn!("run {}: aborted: {}", run_id, e);
                return RunReport::new(
                    run_id,
                    RunStatus::InternalError {
                        detail: e.to_string(),
                    },
                );
            }
        };

        let status = match optimized.interrupted {
            Some(Interrupt::Cancelled) => RunStatus::Cancelled,
            Some(Interrupt::TimedOut) => RunStatus::TimedOut,
            None => RunStatus::Success,
        };
        let evaluator = self.evaluator();
        let outcome = optimized.outcome;
        let mut report = RunReport::new(run_id, status);
        report.initial_score = Some(outcome.initial_score);
        report.final_score = Some(outcome.best_score);
        report.iterations = optimized.total_iterations;
        report.best_restart = Some(optimized.restart);
        report.stop = Some(outcome.stop);
        report.breakdown = Some(evaluator.breakdown(&outcome.best));
        report.satisfaction = Some(evaluator.satisfaction(&outcome.best));
        report.schedule = Some(outcome.best);
        report
    }
}

/// Valide `roster` puis exécute un run ; une entrée invalide donne un
/// rapport `InvalidInput`.
pub fn solve(roster: Roster, opts: &RunOptions, cancel: &CancelToken) -> RunReport {
    match Scheduler::new(roster) {
        Ok(scheduler) => scheduler.run(opts, cancel),
        Err(e) => {
            log_warn!("rejected roster: {}", e);
            RunReport::new(
                Uuid::new_v4(),
                RunStatus::InvalidInput {
                    message: e.to_string(),
                },
            )
        }
    }
}
