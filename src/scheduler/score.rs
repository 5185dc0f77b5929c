//! Objectif souple : fonction pure (affectation, modèle) -> réel.
//!
//! Les préférences hors horizon sont écartées dès la construction de
//! l'évaluateur ; `score` ne fait ensuite que parcourir la grille.

use crate::model::{FairnessMeasure, Roster, Schedule, Seniority, ShiftKind};
use serde::Serialize;

/// Détail des termes de l'objectif. `total` = récompenses - pénalités.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    pub shift_reward: f64,
    pub day_off_reward: f64,
    pub day_off_penalty: f64,
    pub fairness_penalty: f64,
    pub weekend_penalty: f64,
    pub consecutive_penalty: f64,
    pub total: f64,
}

/// Préférences satisfaites dans l'horizon (poids nuls exclus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Satisfaction {
    pub shift_met: usize,
    pub shift_total: usize,
    pub day_off_met: usize,
    pub day_off_total: usize,
}

struct ShiftWish {
    day: usize,
    shift: ShiftKind,
    value: f64,
}

struct DayOffWish {
    day: usize,
    value: f64,
}

pub struct Evaluator<'a> {
    roster: &'a Roster,
    shifts: Vec<Vec<ShiftWish>>,
    days_off: Vec<Vec<DayOffWish>>,
    weekend_days: Vec<usize>,
}

impl<'a> Evaluator<'a> {
    pub fn new(roster: &'a Roster) -> Self {
        let horizon = &roster.horizon;
        let boost = roster.objective.seniority_boost;
        let mut shifts = Vec::with_capacity(roster.staff.len());
        let mut days_off = Vec::with_capacity(roster.staff.len());

        for staff in &roster.staff {
            let factor = if staff.is_senior() { 1.0 + boost } else { 1.0 };
            shifts.push(
                staff
                    .preferred_shifts
                    .iter()
                    .filter(|p| !p.weight.is_none())
                    .filter_map(|p| {
                        horizon.day_of(p.day).map(|day| ShiftWish {
                            day,
                            shift: p.shift,
                            value: f64::from(p.weight.value()) * factor,
                        })
                    })
                    .collect(),
            );
            days_off.push(
                staff
                    .preferred_days_off
                    .iter()
                    .filter(|p| !p.weight.is_none())
                    .filter_map(|p| {
                        horizon.day_of(p.day).map(|day| DayOffWish {
                            day,
                            value: f64::from(p.weight.value()) * factor,
                        })
                    })
                    .collect(),
            );
        }

        let weekend_days = (0..horizon.len()).filter(|&d| horizon.is_weekend(d)).collect();

        Self {
            roster,
            shifts,
            days_off,
            weekend_days,
        }
    }

    pub fn score(&self, schedule: &Schedule) -> f64 {
        self.breakdown(schedule).total
    }

    pub fn breakdown(&self, schedule: &Schedule) -> ScoreBreakdown {
        let obj = &self.roster.objective;
        let mut b = ScoreBreakdown::default();

        for staff in 0..self.shifts.len() {
            let (shift, off, worked_off) = self.preference_terms(schedule, staff);
            b.shift_reward += shift;
            b.day_off_reward += off;
            b.day_off_penalty += obj.day_off_penalty * worked_off;
        }

        if obj.fairness > 0.0 {
            b.fairness_penalty = obj.fairness * self.fairness_spread(schedule);
        }
        if obj.weekend_balance > 0.0 && !self.weekend_days.is_empty() {
            let counts: Vec<f64> = (0..schedule.staff_count())
                .map(|s| {
                    self.weekend_days
                        .iter()
                        .filter(|&&d| schedule.get(s, d).is_some())
                        .count() as f64
                })
                .collect();
            b.weekend_penalty = obj.weekend_balance * variance(&counts);
        }
        if !obj.consecutive_penalties.is_empty() {
            b.consecutive_penalty = (0..schedule.staff_count())
                .map(|s| consecutive_cost(schedule.row(s), &obj.consecutive_penalties))
                .sum();
        }

        b.total = b.shift_reward + b.day_off_reward
            - b.day_off_penalty
            - b.fairness_penalty
            - b.weekend_penalty
            - b.consecutive_penalty;
        b
    }

    /// Récompense nette de chaque personne (préférences seules), utilisée
    /// pour départager les mouvements.
    pub fn staff_rewards(&self, schedule: &Schedule) -> Vec<f64> {
        (0..self.shifts.len())
            .map(|s| self.staff_reward(schedule, s))
            .collect()
    }

    pub fn staff_reward(&self, schedule: &Schedule, staff: usize) -> f64 {
        let (shift, off, worked_off) = self.preference_terms(schedule, staff);
        shift + off - self.roster.objective.day_off_penalty * worked_off
    }

    pub fn satisfaction(&self, schedule: &Schedule) -> Satisfaction {
        let mut out = Satisfaction::default();
        for (staff, wishes) in self.shifts.iter().enumerate() {
            out.shift_total += wishes.len();
            out.shift_met += wishes
                .iter()
                .filter(|w| schedule.get(staff, w.day) == Some(w.shift))
                .count();
        }
        for (staff, wishes) in self.days_off.iter().enumerate() {
            out.day_off_total += wishes.len();
            out.day_off_met += wishes
                .iter()
                .filter(|w| schedule.get(staff, w.day).is_none())
                .count();
        }
        out
    }

    /// (garde souhaitée obtenue, repos obtenu, repos travaillé)
    fn preference_terms(&self, schedule: &Schedule, staff: usize) -> (f64, f64, f64) {
        let shift = self.shifts[staff]
            .iter()
            .filter(|w| schedule.get(staff, w.day) == Some(w.shift))
            .map(|w| w.value)
            .sum();
        let mut off = 0.0;
        let mut worked = 0.0;
        for w in &self.days_off[staff] {
            if schedule.get(staff, w.day).is_none() {
                off += w.value;
            } else {
                worked += w.value;
            }
        }
        (shift, off, worked)
    }

    fn fairness_spread(&self, schedule: &Schedule) -> f64 {
        let measure = self.roster.objective.fairness_measure;
        [Seniority::Junior, Seniority::Senior]
            .into_iter()
            .map(|class| {
                let counts: Vec<f64> = self
                    .roster
                    .staff
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.seniority == class)
                    .map(|(idx, _)| schedule.shifts_of(idx) as f64)
                    .collect();
                match measure {
                    FairnessMeasure::Variance => variance(&counts),
                    FairnessMeasure::Range => range(&counts),
                }
            })
            .sum()
    }
}

/// Variance de population ; 0 pour moins de deux valeurs.
fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

fn range(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    if values.is_empty() {
        0.0
    } else {
        max - min
    }
}

/// Chaque jour travaillé coûte `table[k]` où `k + 1` est la longueur de la
/// série en cours (dernière case réutilisée au-delà).
fn consecutive_cost(row: &[Option<ShiftKind>], table: &[f64]) -> f64 {
    let last = table.len() - 1;
    let mut run = 0usize;
    let mut cost = 0.0;
    for cell in row {
        if cell.is_some() {
            cost += table[run.min(last)];
            run += 1;
        } else {
            run = 0;
        }
    }
    cost
}
