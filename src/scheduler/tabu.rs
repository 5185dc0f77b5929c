//! Recherche tabou sur une affectation faisable.
//!
//! 1. Voisinage complet (réaffectations + échanges), échantillonné au-delà de
//!    `max_candidates`
//! 2. Candidats infaisables écartés, les autres notés (en parallèle si demandé)
//! 3. Meilleur candidat non tabou, ou tabou s'il bat le meilleur connu
//!    (aspiration)
//! 4. Le mouvement inverse entre dans la liste tabou (FIFO, `tenure` entrées)
//!
//! Arrêt : itérations max, stagnation, aucun mouvement admissible,
//! annulation ou échéance. La meilleure affectation rencontrée est renvoyée.

use super::moves::{self, Move};
use super::score::Evaluator;
use super::{conflicts, Budget, Interrupt, SchedError};
use crate::model::{Roster, Schedule};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};

const EPS: f64 = 1e-9;

/// Paramètres de la recherche tabou.
#[derive(Debug, Clone, PartialEq)]
pub struct TabuConfig {
    pub max_iterations: usize,
    /// Nombre d'itérations pendant lesquelles un mouvement inverse reste interdit.
    pub tenure: usize,
    pub aspiration: bool,
    pub max_no_improve: usize,
    /// Taille maximale du voisinage évalué à chaque itération.
    pub max_candidates: usize,
    pub seed: u64,
    /// Note les candidats sur le pool rayon.
    pub parallel: bool,
    /// Vérification complète des contraintes après chaque mouvement.
    pub verify_moves: bool,
}

impl Default for TabuConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tenure: 10,
            aspiration: true,
            max_no_improve: 200,
            max_candidates: 2_000,
            seed: 42,
            parallel: false,
            verify_moves: false,
        }
    }
}

impl TabuConfig {
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }
    pub fn with_tenure(mut self, tenure: usize) -> Self {
        self.tenure = tenure;
        self
    }
    pub fn with_aspiration(mut self, aspiration: bool) -> Self {
        self.aspiration = aspiration;
        self
    }
    pub fn with_max_no_improve(mut self, n: usize) -> Self {
        self.max_no_improve = n.max(1);
        self
    }
    pub fn with_max_candidates(mut self, n: usize) -> Self {
        self.max_candidates = n.max(1);
        self
    }
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn with_verify_moves(mut self, verify: bool) -> Self {
        self.verify_moves = verify;
        self
    }
}

/// Cause d'arrêt d'une recherche.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxIterations,
    Stagnation,
    NoAdmissibleMove,
    Cancelled,
    TimedOut,
    /// Budget de nœuds de la recherche de faisabilité épuisé.
    NodeLimit,
}

impl From<Interrupt> for StopReason {
    fn from(i: Interrupt) -> Self {
        match i {
            Interrupt::Cancelled => StopReason::Cancelled,
            Interrupt::TimedOut => StopReason::TimedOut,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TabuOutcome {
    pub best: Schedule,
    pub best_score: f64,
    pub initial_score: f64,
    pub iterations: usize,
    /// Itération (1-based) du dernier meilleur ; 0 si jamais amélioré.
    pub best_iteration: usize,
    pub stop: StopReason,
    /// Meilleur score après chaque itération.
    pub score_history: Vec<f64>,
    /// Mouvements appliqués, un par itération (hors échauffement).
    pub moves: Vec<Move>,
}

struct Candidate {
    mv: Move,
    score: f64,
}

pub struct TabuSearch<'a> {
    roster: &'a Roster,
    evaluator: Evaluator<'a>,
    config: TabuConfig,
}

impl<'a> TabuSearch<'a> {
    pub fn new(roster: &'a Roster, config: TabuConfig) -> Self {
        Self {
            roster,
            evaluator: Evaluator::new(roster),
            config,
        }
    }

    pub fn config(&self) -> &TabuConfig {
        &self.config
    }

    pub fn run(&self, start: Schedule, budget: &Budget) -> Result<TabuOutcome, SchedError> {
        self.run_seeded(start, self.config.seed, 0, budget)
    }

    /// Comme `run`, avec une graine explicite et `warmup` mouvements
    /// faisables tirés au hasard avant la recherche (diversification des
    /// redémarrages). Le point de départ reste la référence du score initial.
    pub fn run_seeded(
        &self,
        start: Schedule,
        seed: u64,
        warmup: usize,
        budget: &Budget,
    ) -> Result<TabuOutcome, SchedError> {
        let expected = (self.roster.staff.len(), self.roster.horizon.len());
        if (start.staff_count(), start.days()) != expected {
            return Err(SchedError::ShapeMismatch {
                staff: expected.0,
                days: expected.1,
                got_staff: start.staff_count(),
                got_days: start.days(),
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let initial_score = self.evaluator.score(&start);
        let mut best = start.clone();
        let mut best_score = initial_score;
        let mut best_iteration = 0;
        let mut current = start;
        let mut current_score = initial_score;

        for _ in 0..warmup {
            let mut pool = moves::neighborhood(&current);
            pool.shuffle(&mut rng);
            let Some(mv) = pool.into_iter().find(|mv| {
                let mut next = current.clone();
                mv.apply(&mut next);
                mv.keeps_feasible(self.roster, &next)
            }) else {
                break;
            };
            mv.apply(&mut current);
        }
        if warmup > 0 {
            current_score = self.evaluator.score(&current);
            if current_score > best_score + EPS {
                best = current.clone();
                best_score = current_score;
            }
        }

        let mut tabu_queue: VecDeque<Move> = VecDeque::with_capacity(self.config.tenure);
        let mut tabu_set: HashSet<Move> = HashSet::with_capacity(self.config.tenure);
        let mut score_history = Vec::with_capacity(self.config.max_iterations);
        let mut applied = Vec::with_capacity(self.config.max_iterations);
        let mut no_improve = 0;
        let mut stop = StopReason::MaxIterations;

        for iteration in 1..=self.config.max_iterations {
            if let Some(i) = budget.interrupted() {
                stop = i.into();
                break;
            }

            let mut pool = moves::neighborhood(&current);
            if pool.len() > self.config.max_candidates {
                pool.shuffle(&mut rng);
                pool.truncate(self.config.max_candidates);
            }
            let candidates = self.score_candidates(&current, &pool);

            let rewards = self.evaluator.staff_rewards(&current);
            let mut chosen: Option<&Candidate> = None;
            for cand in &candidates {
                let is_tabu = tabu_set.contains(&cand.mv);
                let aspires = self.config.aspiration && cand.score > best_score + EPS;
                if is_tabu && !aspires {
                    continue;
                }
                let better = match chosen {
                    None => true,
                    Some(cur) => self.compare(cand, cur, &rewards) == Ordering::Less,
                };
                if better {
                    chosen = Some(cand);
                }
            }

            let Some(&Candidate { mv, score }) = chosen else {
                stop = StopReason::NoAdmissibleMove;
                break;
            };

            mv.apply(&mut current);
            current_score = score;
            applied.push(mv);

            if self.config.tenure > 0 {
                if tabu_queue.len() >= self.config.tenure {
                    // une copie plus récente reste interdite
                    if let Some(old) = tabu_queue.pop_front() {
                        if !tabu_queue.contains(&old) {
                            tabu_set.remove(&old);
                        }
                    }
                }
                let rev = mv.reverse();
                tabu_queue.push_back(rev);
                tabu_set.insert(rev);
            }

            if self.config.verify_moves {
                let found = conflicts::detect_violations(self.roster, &current);
                if let Some(v) = found.first() {
                    return Err(SchedError::InvariantViolation(format!(
                        "move {mv:?} at iteration {iteration} produced {v}"
                    )));
                }
            }

            if current_score > best_score + EPS {
                best = current.clone();
                best_score = current_score;
                best_iteration = iteration;
                no_improve = 0;
                log_debug!("tabu: iteration {} new best {:.3}", iteration, best_score);
            } else {
                no_improve += 1;
            }
            score_history.push(best_score);

            if no_improve >= self.config.max_no_improve {
                stop = StopReason::Stagnation;
                break;
            }
        }

        let found = conflicts::detect_violations(self.roster, &best);
        if !found.is_empty() {
            let detail = found
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(SchedError::InvariantViolation(format!(
                "optimizer produced an invalid schedule: {detail}"
            )));
        }

        log_debug!(
            "tabu: stop {:?} after {} iteration(s), best {:.3} (initial {:.3}, current {:.3})",
            stop,
            score_history.len(),
            best_score,
            initial_score,
            current_score
        );

        Ok(TabuOutcome {
            best,
            best_score,
            initial_score,
            iterations: score_history.len(),
            best_iteration,
            stop,
            score_history,
            moves: applied,
        })
    }

    /// Applique chaque mouvement sur une copie ; seuls les faisables sont notés.
    fn score_candidates(&self, current: &Schedule, pool: &[Move]) -> Vec<Candidate> {
        let eval = |mv: &Move| {
            let mut next = current.clone();
            mv.apply(&mut next);
            mv.keeps_feasible(self.roster, &next).then(|| Candidate {
                mv: *mv,
                score: self.evaluator.score(&next),
            })
        };
        if self.config.parallel {
            pool.par_iter().filter_map(eval).collect()
        } else {
            pool.iter().filter_map(eval).collect()
        }
    }

    /// `Less` = `a` préféré : meilleur score, puis personne la moins servie,
    /// puis ordre (identifiant, jour, garde).
    fn compare(&self, a: &Candidate, b: &Candidate, rewards: &[f64]) -> Ordering {
        if a.score > b.score + EPS {
            return Ordering::Less;
        }
        if b.score > a.score + EPS {
            return Ordering::Greater;
        }
        let least = |mv: &Move| {
            mv.staff()
                .map(|s| rewards[s])
                .fold(f64::INFINITY, f64::min)
        };
        let (ra, rb) = (least(&a.mv), least(&b.mv));
        if ra + EPS < rb {
            return Ordering::Less;
        }
        if rb + EPS < ra {
            return Ordering::Greater;
        }
        a.mv.tie_key(self.roster).cmp(&b.mv.tie_key(self.roster))
    }
}
