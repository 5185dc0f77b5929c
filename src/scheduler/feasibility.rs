//! Recherche d'une première affectation respectant toutes les contraintes dures.
//!
//! Chaque garde `(jour, type)` demande exactement son minimum de couverture
//! (une garde à minimum nul reste vide). On remplit les places une à une :
//!
//! - propagation à la racine (effectif par jour, seniors disponibles,
//!   charge sur chaque fenêtre glissante) ;
//! - choix dynamique de la garde la plus contrainte (moins de marge
//!   candidats / places restantes) ;
//! - seniors d'abord sur une garde qui n'en a pas, puis charge la plus faible ;
//! - ordre canonique dans une garde (seniors puis juniors, indices
//!   croissants) pour ne pas explorer les permutations ;
//! - retour arrière dès qu'une garde n'a plus assez de candidats.
//!
//! Une fois toutes les gardes pourvues, le minimum de charge est complété
//! en ajoutant des gardes sous leur maximum, jours croissants par personne.

use super::{conflicts, util, Budget, Interrupt, Violation, ViolationKind};
use crate::model::{Roster, Schedule, ShiftKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Contraintes impossibles à satisfaire, avec le jour / la garde en cause
/// quand on peut les déterminer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfeasibilityReport {
    pub unsatisfiable: Vec<Violation>,
}

impl fmt::Display for InfeasibilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.unsatisfiable.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeasibilityError {
    #[error("no schedule satisfies the hard constraints: {0}")]
    Infeasible(InfeasibilityReport),
    #[error("cancelled before a feasible schedule was found")]
    Cancelled,
    #[error("time limit reached before a feasible schedule was found")]
    TimedOut,
    #[error("search limit of {0} nodes reached")]
    SearchLimit(u64),
}

impl From<Interrupt> for FeasibilityError {
    fn from(i: Interrupt) -> Self {
        match i {
            Interrupt::Cancelled => FeasibilityError::Cancelled,
            Interrupt::TimedOut => FeasibilityError::TimedOut,
        }
    }
}

pub const DEFAULT_NODE_LIMIT: u64 = 200_000;

/// Solveur de faisabilité (sans objectif, déterministe).
pub struct FeasibilitySolver<'a> {
    roster: &'a Roster,
    budget: &'a Budget,
    node_limit: u64,
}

impl<'a> FeasibilitySolver<'a> {
    pub fn new(roster: &'a Roster, budget: &'a Budget) -> Self {
        Self {
            roster,
            budget,
            node_limit: DEFAULT_NODE_LIMIT,
        }
    }

    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = limit.max(1);
        self
    }

    pub fn solve(&self) -> Result<Schedule, FeasibilityError> {
        let root = root_violations(self.roster);
        if !root.is_empty() {
            log_info!("feasibility: {} root conflict(s)", root.len());
            return Err(FeasibilityError::Infeasible(InfeasibilityReport {
                unsatisfiable: root,
            }));
        }

        let mut search = Search::new(self.roster, self.budget, self.node_limit);
        if search.descend()? {
            log_debug!("feasibility: solved in {} node(s)", search.nodes);
            return Ok(search.schedule);
        }
        let report = search.blame();
        log_info!("feasibility: exhausted after {} node(s): {}", search.nodes, report);
        Err(FeasibilityError::Infeasible(report))
    }
}

/// Propagation à la racine : bornes globales qui ne dépendent d'aucun choix.
fn root_violations(roster: &Roster) -> Vec<Violation> {
    let mut out = Vec::new();
    let horizon = &roster.horizon;
    let days = horizon.len();
    let headcount = roster.staff.len();
    let seniors = roster.seniors();

    for day in 0..days {
        let mut demand = 0usize;
        let mut senior_demand = 0usize;
        let mut short_reported = false;
        let mut mix_reported = false;
        for kind in ShiftKind::ALL {
            let min = roster.coverage(day, kind).min as usize;
            demand += min;
            senior_demand += util::min_seniors(roster, min);
            if demand > headcount && !short_reported {
                short_reported = true;
                out.push(Violation {
                    kind: ViolationKind::CoverageShortfall,
                    day: Some(day),
                    date: Some(horizon.date(day)),
                    shift: Some(kind),
                    staff: None,
                    detail: format!(
                        "insufficient staff for {kind} coverage: {demand} needed by the end of the day, {headcount} available"
                    ),
                });
            }
            if senior_demand > seniors && !mix_reported {
                mix_reported = true;
                out.push(Violation {
                    kind: ViolationKind::SeniorityMix,
                    day: Some(day),
                    date: Some(horizon.date(day)),
                    shift: Some(kind),
                    staff: None,
                    detail: format!(
                        "{senior_demand} senior(s) needed by the end of the day, {seniors} available"
                    ),
                });
            }
        }
    }

    let window = roster.rules.workload_window_days as usize;
    let cap = roster.rules.workload_cap as usize;
    let min = roster.rules.workload_min as usize;
    for start in 0..=days.saturating_sub(window) {
        let len = util::window_len(start, days, window);
        let (demand, senior_demand) = (start..start + len)
            .flat_map(|d| ShiftKind::ALL.into_iter().map(move |k| (d, k)))
            .map(|(d, k)| roster.coverage(d, k).min as usize)
            .fold((0, 0), |(all, sen), min| {
                (all + min, sen + util::min_seniors(roster, min))
            });
        if senior_demand > seniors * cap && senior_demand <= seniors * len {
            out.push(Violation {
                kind: ViolationKind::SeniorityMix,
                day: Some(start),
                date: Some(horizon.date(start)),
                shift: None,
                staff: None,
                detail: format!(
                    "{senior_demand} senior shifts required over {len} days, capacity {} ({seniors} senior(s) x {cap})",
                    seniors * cap
                ),
            });
        }
        if demand > headcount * cap {
            out.push(Violation {
                kind: ViolationKind::WorkloadCap,
                day: Some(start),
                date: Some(horizon.date(start)),
                shift: None,
                staff: None,
                detail: format!(
                    "{demand} shifts required over {len} days, capacity {} ({headcount} staff x {cap})",
                    headcount * cap
                ),
            });
        }
        if min > 0 {
            let places: usize = (start..start + len)
                .map(|d| {
                    ShiftKind::ALL
                        .iter()
                        .map(|&k| roster.coverage(d, k).max as usize)
                        .sum::<usize>()
                        .min(headcount)
                })
                .sum();
            if headcount * min > places {
                out.push(Violation {
                    kind: ViolationKind::WorkloadMin,
                    day: Some(start),
                    date: Some(horizon.date(start)),
                    shift: None,
                    staff: None,
                    detail: format!(
                        "{} shifts needed over {len} days ({headcount} staff x {min}), {places} place(s) available",
                        headcount * min
                    ),
                });
            }
        }
    }

    out
}

struct Slot {
    day: usize,
    kind: ShiftKind,
    need: usize,
    seniors: Vec<usize>,
    juniors: Vec<usize>,
}

impl Slot {
    fn filled(&self) -> usize {
        self.seniors.len() + self.juniors.len()
    }
    fn remaining(&self) -> usize {
        self.need - self.filled()
    }
}

enum Pick {
    Done,
    DeadEnd(usize, ViolationKind),
    Branch(usize, Vec<usize>),
    /// Personne sous le minimum de charge, gardes où la placer.
    TopUp(usize, Vec<(usize, ShiftKind)>),
    /// (personne, début de fenêtre) impossible à compléter.
    Underloaded(usize, usize),
}

/// Candidats d'une garde pour la prochaine place.
struct Candidates {
    /// Personnes que l'ordre canonique autorise maintenant.
    next: Vec<usize>,
    /// Personnes encore utilisables pour l'une des places restantes.
    reachable: usize,
    /// Motif dominant des exclusions.
    reason: ViolationKind,
}

struct Search<'a> {
    roster: &'a Roster,
    budget: &'a Budget,
    node_limit: u64,
    nodes: u64,
    schedule: Schedule,
    slots: Vec<Slot>,
    load: Vec<usize>,
    failures: Vec<u32>,
    reasons: Vec<ViolationKind>,
    /// Jours ajoutés par personne pendant le complément de charge.
    topups: Vec<Vec<usize>>,
    underloaded: BTreeMap<(usize, usize), u32>,
}

impl<'a> Search<'a> {
    fn new(roster: &'a Roster, budget: &'a Budget, node_limit: u64) -> Self {
        let days = roster.horizon.len();
        let slots: Vec<Slot> = (0..days)
            .flat_map(|day| ShiftKind::ALL.into_iter().map(move |kind| (day, kind)))
            .filter_map(|(day, kind)| {
                let need = roster.coverage(day, kind).min as usize;
                (need > 0).then(|| Slot {
                    day,
                    kind,
                    need,
                    seniors: Vec::new(),
                    juniors: Vec::new(),
                })
            })
            .collect();
        let n = slots.len();
        Self {
            roster,
            budget,
            node_limit,
            nodes: 0,
            schedule: Schedule::for_roster(roster),
            slots,
            load: vec![0; roster.staff.len()],
            failures: vec![0; n],
            reasons: vec![ViolationKind::CoverageShortfall; n],
            topups: vec![Vec::new(); roster.staff.len()],
            underloaded: BTreeMap::new(),
        }
    }

    fn descend(&mut self) -> Result<bool, FeasibilityError> {
        self.nodes += 1;
        if self.nodes > self.node_limit {
            return Err(FeasibilityError::SearchLimit(self.node_limit));
        }
        if self.nodes % 64 == 0 {
            if let Some(i) = self.budget.interrupted() {
                return Err(i.into());
            }
        }

        match self.pick() {
            Pick::Done => Ok(true),
            Pick::DeadEnd(slot, reason) => {
                self.failures[slot] = self.failures[slot].saturating_add(1);
                self.reasons[slot] = reason;
                Ok(false)
            }
            Pick::Branch(slot, next) => {
                for staff in next {
                    self.place(slot, staff);
                    if self.descend()? {
                        return Ok(true);
                    }
                    self.unplace(slot, staff);
                }
                Ok(false)
            }
            Pick::TopUp(staff, cells) => {
                for (day, kind) in cells {
                    self.top_up(staff, day, kind);
                    if self.descend()? {
                        return Ok(true);
                    }
                    self.undo_top_up(staff, day);
                }
                Ok(false)
            }
            Pick::Underloaded(staff, start) => {
                let count = self.underloaded.entry((staff, start)).or_insert(0);
                *count = count.saturating_add(1);
                Ok(false)
            }
        }
    }

    /// Garde ouverte la plus contrainte, ou impasse si l'une d'elles ne peut
    /// plus être complétée.
    fn pick(&self) -> Pick {
        let mut best: Option<(usize, usize, Vec<usize>)> = None;
        for (idx, slot) in self.slots.iter().enumerate() {
            let remaining = slot.remaining();
            if remaining == 0 {
                continue;
            }
            let c = self.candidates(slot);
            if c.reachable < remaining || c.next.is_empty() {
                return Pick::DeadEnd(idx, c.reason);
            }
            let slack = c.reachable - remaining;
            if best.as_ref().map_or(true, |(_, s, _)| slack < *s) {
                best = Some((idx, slack, c.next));
            }
        }
        match best {
            None => self.pick_top_up(),
            Some((idx, _, next)) => Pick::Branch(idx, next),
        }
    }

    /// Personne sous le minimum avec le moins de marge, sur sa première
    /// fenêtre en défaut. Les seniors passent avant les juniors, qui ne
    /// rejoignent que des gardes déjà encadrées.
    fn pick_top_up(&self) -> Pick {
        if self.roster.rules.workload_min == 0 {
            return Pick::Done;
        }
        match self.pick_top_up_among(true) {
            Pick::Done => self.pick_top_up_among(false),
            pick => pick,
        }
    }

    fn pick_top_up_among(&self, seniors: bool) -> Pick {
        let min = self.roster.rules.workload_min as usize;
        let days = self.roster.horizon.len();
        let window = self.roster.rules.workload_window_days as usize;

        let mut best: Option<(usize, usize, Vec<(usize, ShiftKind)>)> = None;
        for staff in 0..self.roster.staff.len() {
            if self.is_senior(staff) != seniors {
                continue;
            }
            let row = self.schedule.row(staff);
            let deficit = (0..=days.saturating_sub(window)).find_map(|start| {
                let worked = util::worked_in(row, start, util::window_len(start, days, window));
                (worked < min).then(|| (start, min - worked))
            });
            let Some((start, missing)) = deficit else {
                continue;
            };
            let cells = self.top_up_cells(staff, start);
            let mut open: Vec<usize> = cells.iter().map(|&(day, _)| day).collect();
            open.dedup();
            if open.len() < missing {
                return Pick::Underloaded(staff, start);
            }
            let slack = open.len() - missing;
            if best.as_ref().map_or(true, |(_, s, _)| slack < *s) {
                best = Some((staff, slack, cells));
            }
        }
        match best {
            None => Pick::Done,
            Some((staff, _, mut cells)) => {
                cells.sort_by_key(|&(day, kind)| self.schedule.count(day, kind));
                Pick::TopUp(staff, cells)
            }
        }
    }

    /// Gardes de la fenêtre où `staff` peut s'ajouter sans dépasser le
    /// maximum ni casser la mixité, en jours croissants.
    fn top_up_cells(&self, staff: usize, start: usize) -> Vec<(usize, ShiftKind)> {
        let days = self.roster.horizon.len();
        let len = util::window_len(start, days, self.roster.rules.workload_window_days as usize);
        let after = self.topups[staff].last().copied();
        let senior = self.is_senior(staff);
        let mut trial = self.schedule.clone();
        let mut cells = Vec::new();

        for day in start..start + len {
            if after.is_some_and(|last| day <= last) || self.schedule.get(staff, day).is_some() {
                continue;
            }
            for kind in ShiftKind::ALL {
                let (seniors, juniors) = util::slot_mix(self.roster, &self.schedule, day, kind);
                if seniors + juniors >= self.roster.coverage(day, kind).max as usize {
                    continue;
                }
                if !senior && seniors < self.roster.rules.seniors_required(juniors + 1) {
                    continue;
                }
                trial.set(staff, day, Some(kind));
                let ok = conflicts::staff_violation(self.roster, &trial, staff, day).is_none();
                trial.set(staff, day, None);
                if ok {
                    cells.push((day, kind));
                }
            }
        }
        cells
    }

    fn is_senior(&self, staff: usize) -> bool {
        self.roster.staff[staff].is_senior()
    }

    fn candidates(&self, slot: &Slot) -> Candidates {
        let remaining = slot.remaining();
        let senior_phase = slot.juniors.is_empty();
        // Une fois un junior placé, toutes les places restantes sont juniors.
        let juniors_now = !slot.seniors.is_empty()
            && self
                .roster
                .rules
                .seniors_required(slot.juniors.len() + remaining)
                <= slot.seniors.len();
        let after_senior = slot.seniors.last().copied();
        let after_junior = slot.juniors.last().copied();

        let mut busy = 0u32;
        let mut blocked = [0u32; 3];
        let mut next = Vec::new();
        let mut reachable = 0usize;
        let mut trial = self.schedule.clone();

        for (staff, member) in self.roster.staff.iter().enumerate() {
            let (in_order, allowed_now) = if member.is_senior() {
                let ok = senior_phase && after_senior.map_or(true, |last| staff > last);
                (ok, ok)
            } else {
                let ok = after_junior.map_or(true, |last| staff > last);
                (ok, ok && juniors_now)
            };
            if !in_order {
                continue;
            }
            if self.schedule.get(staff, slot.day).is_some() {
                busy += 1;
                continue;
            }
            trial.set(staff, slot.day, Some(slot.kind));
            let verdict = conflicts::staff_violation(self.roster, &trial, staff, slot.day);
            trial.set(staff, slot.day, None);
            match verdict {
                None => {
                    reachable += 1;
                    if allowed_now {
                        next.push(staff);
                    }
                }
                Some(ViolationKind::RestRule) => blocked[0] += 1,
                Some(ViolationKind::WorkloadCap) => blocked[1] += 1,
                Some(_) => blocked[2] += 1,
            }
        }

        let prefer_senior = slot.seniors.is_empty();
        next.sort_by_key(|&s| (self.is_senior(s) != prefer_senior, self.load[s], s));

        let reason = if next.is_empty() && reachable >= remaining {
            ViolationKind::SeniorityMix
        } else {
            let mut reason = ViolationKind::SeniorityMix;
            let mut top = 0;
            for (count, kind) in [
                (busy, ViolationKind::CoverageShortfall),
                (blocked[0], ViolationKind::RestRule),
                (blocked[1], ViolationKind::WorkloadCap),
                (blocked[2], ViolationKind::NightRecovery),
            ] {
                if count > top {
                    top = count;
                    reason = kind;
                }
            }
            reason
        };

        Candidates {
            next,
            reachable,
            reason,
        }
    }

    fn place(&mut self, slot: usize, staff: usize) {
        let (day, kind) = (self.slots[slot].day, self.slots[slot].kind);
        self.schedule.set(staff, day, Some(kind));
        self.load[staff] += 1;
        if self.is_senior(staff) {
            self.slots[slot].seniors.push(staff);
        } else {
            self.slots[slot].juniors.push(staff);
        }
    }

    fn unplace(&mut self, slot: usize, staff: usize) {
        let day = self.slots[slot].day;
        self.schedule.set(staff, day, None);
        self.load[staff] -= 1;
        if self.is_senior(staff) {
            self.slots[slot].seniors.pop();
        } else {
            self.slots[slot].juniors.pop();
        }
    }

    fn top_up(&mut self, staff: usize, day: usize, kind: ShiftKind) {
        self.schedule.set(staff, day, Some(kind));
        self.load[staff] += 1;
        self.topups[staff].push(day);
    }

    fn undo_top_up(&mut self, staff: usize, day: usize) {
        self.schedule.set(staff, day, None);
        self.load[staff] -= 1;
        self.topups[staff].pop();
    }

    /// Garde (ou fenêtre de charge) le plus souvent trouvée dans une impasse.
    fn blame(&self) -> InfeasibilityReport {
        let mut worst: Option<usize> = None;
        for (idx, &count) in self.failures.iter().enumerate() {
            if count > 0 && worst.map_or(true, |w| count > self.failures[w]) {
                worst = Some(idx);
            }
        }
        let slot_count = worst.map_or(0, |w| self.failures[w]);

        let mut under: Option<((usize, usize), u32)> = None;
        for (&key, &count) in &self.underloaded {
            if under.map_or(true, |(_, c)| count > c) {
                under = Some((key, count));
            }
        }
        if let Some(((staff, start), count)) = under {
            if count > slot_count {
                let window = self.roster.rules.workload_window_days as usize;
                let len = util::window_len(start, self.roster.horizon.len(), window);
                return InfeasibilityReport {
                    unsatisfiable: vec![Violation {
                        kind: ViolationKind::WorkloadMin,
                        day: Some(start),
                        date: Some(self.roster.horizon.date(start)),
                        shift: None,
                        staff: Some(self.roster.staff[staff].id.clone()),
                        detail: format!(
                            "cannot reach {} shift(s) in {len} days from here",
                            self.roster.rules.workload_min
                        ),
                    }],
                };
            }
        }

        let unsatisfiable = worst
            .map(|idx| {
                let slot = &self.slots[idx];
                let kind = self.reasons[idx];
                let why = match kind {
                    ViolationKind::SeniorityMix => "no valid senior/junior mix is left",
                    ViolationKind::RestRule => "remaining staff would break the rest rule",
                    ViolationKind::WorkloadCap => "remaining staff would exceed the workload cap",
                    ViolationKind::NightRecovery => "remaining staff are recovering from nights",
                    _ => "not enough staff free that day",
                };
                Violation {
                    kind,
                    day: Some(slot.day),
                    date: Some(self.roster.horizon.date(slot.day)),
                    shift: Some(slot.kind),
                    staff: None,
                    detail: format!("cannot staff {} with {} people: {why}", slot.kind, slot.need),
                }
            })
            .into_iter()
            .collect();
        InfeasibilityReport { unsatisfiable }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coverage, CoverageOverride, CoverageRules, Horizon, Seniority, Staff};
    use chrono::NaiveDate;

    fn roster(seniors: usize, juniors: usize, days: u32) -> Roster {
        let start = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut roster = Roster::new(Horizon::new(start, days));
        for i in 0..seniors {
            roster.staff.push(Staff::new(format!("s{i}"), Seniority::Senior));
        }
        for i in 0..juniors {
            roster.staff.push(Staff::new(format!("j{i}"), Seniority::Junior));
        }
        roster
    }

    #[test]
    fn min_zero_everywhere_gives_empty_schedule() {
        let mut r = roster(1, 1, 3);
        r.rules.coverage = CoverageRules::uniform(Coverage::new(0, 2));
        let budget = Budget::unlimited();
        let s = FeasibilitySolver::new(&r, &budget).solve().unwrap();
        assert_eq!(s.total_assigned(), 0);
    }

    #[test]
    fn senior_shortage_is_reported_at_root() {
        let r = roster(2, 6, 7);
        let budget = Budget::unlimited();
        let err = FeasibilitySolver::new(&r, &budget).solve().unwrap_err();
        match err {
            FeasibilityError::Infeasible(report) => {
                let v = &report.unsatisfiable[0];
                assert_eq!(v.kind, ViolationKind::SeniorityMix);
                assert_eq!(v.day, Some(0));
                assert_eq!(v.shift, Some(ShiftKind::Night));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rest_rule_dead_end_is_blamed() {
        // Un seul senior : il devrait faire nuit puis matin.
        let mut r = roster(1, 0, 2);
        r.rules.coverage = CoverageRules::uniform(Coverage::new(0, 1));
        r.rules.coverage.overrides = vec![
            CoverageOverride { day: 0, shift: ShiftKind::Night, min: 1, max: 1 },
            CoverageOverride { day: 1, shift: ShiftKind::Morning, min: 1, max: 1 },
        ];
        let budget = Budget::unlimited();
        let err = FeasibilitySolver::new(&r, &budget).solve().unwrap_err();
        let FeasibilityError::Infeasible(report) = err else {
            panic!("expected infeasible");
        };
        let v = &report.unsatisfiable[0];
        assert_eq!(v.kind, ViolationKind::RestRule);
        assert_eq!((v.day, v.shift), (Some(1), Some(ShiftKind::Morning)));
    }

    #[test]
    fn workload_minimum_is_topped_up() {
        let mut r = roster(2, 1, 7);
        r.rules.coverage = CoverageRules::uniform(Coverage::new(0, 2));
        r.rules.workload_min = 2;
        let budget = Budget::unlimited();
        let s = FeasibilitySolver::new(&r, &budget).solve().unwrap();
        assert!(conflicts::detect_violations(&r, &s).is_empty());
        for staff in 0..3 {
            assert_eq!(s.shifts_of(staff), 2);
        }
    }

    #[test]
    fn unreachable_minimum_is_reported_at_root() {
        let mut r = roster(1, 0, 3);
        r.rules.coverage = CoverageRules::uniform(Coverage::new(0, 1));
        r.rules.workload_min = 4;
        let budget = Budget::unlimited();
        let err = FeasibilitySolver::new(&r, &budget).solve().unwrap_err();
        let FeasibilityError::Infeasible(report) = err else {
            panic!("expected infeasible");
        };
        assert_eq!(report.unsatisfiable.len(), 1);
        assert_eq!(report.unsatisfiable[0].kind, ViolationKind::WorkloadMin);
        assert_eq!(report.unsatisfiable[0].day, Some(0));
    }

    #[test]
    fn junior_without_senior_cannot_reach_minimum() {
        let mut r = roster(0, 1, 3);
        r.rules.coverage = CoverageRules::uniform(Coverage::new(0, 1));
        r.rules.workload_min = 1;
        let budget = Budget::unlimited();
        let err = FeasibilitySolver::new(&r, &budget).solve().unwrap_err();
        let FeasibilityError::Infeasible(report) = err else {
            panic!("expected infeasible");
        };
        let v = &report.unsatisfiable[0];
        assert_eq!(v.kind, ViolationKind::WorkloadMin);
        assert_eq!(v.staff.as_ref().map(|id| id.as_str()), Some("j0"));
    }

    #[test]
    fn node_limit_is_reported() {
        let r = roster(5, 4, 7);
        let budget = Budget::unlimited();
        let err = FeasibilitySolver::new(&r, &budget)
            .with_node_limit(1)
            .solve()
            .unwrap_err();
        assert_eq!(err, FeasibilityError::SearchLimit(1));
    }
}
