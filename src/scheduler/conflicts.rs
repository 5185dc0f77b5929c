use super::{util, Violation, ViolationKind};
use crate::model::{Roster, Schedule, ShiftKind};

/// Première contrainte individuelle (repos, charge, récupération) violée
/// par les cellules qui touchent `day` pour `staff`. Les cellules vides
/// sont ignorées : utilisable sur une affectation partielle.
pub(crate) fn staff_violation(
    roster: &Roster,
    schedule: &Schedule,
    staff: usize,
    day: usize,
) -> Option<ViolationKind> {
    let row = schedule.row(staff);
    let days = row.len();

    match row[day] {
        Some(ShiftKind::Morning) if day > 0 && row[day - 1] == Some(ShiftKind::Night) => {
            return Some(ViolationKind::RestRule);
        }
        Some(ShiftKind::Night) if day + 1 < days && row[day + 1] == Some(ShiftKind::Morning) => {
            return Some(ViolationKind::RestRule);
        }
        _ => {}
    }

    let window = roster.rules.workload_window_days as usize;
    let cap = roster.rules.workload_cap as usize;
    for start in util::window_starts(day, days, window) {
        let len = util::window_len(start, days, window);
        if util::worked_in(row, start, len) > cap {
            return Some(ViolationKind::WorkloadCap);
        }
    }

    if roster.rules.night_recovery && days >= 2 {
        let first = day.saturating_sub(3);
        let last = day.min(days - 2);
        for t in first..=last {
            if recovery_broken(row, t) {
                return Some(ViolationKind::NightRecovery);
            }
        }
    }

    None
}

/// Contraintes individuelles sur une affectation complète, minimum de
/// charge compris.
pub(crate) fn staff_ok(roster: &Roster, schedule: &Schedule, staff: usize, day: usize) -> bool {
    staff_violation(roster, schedule, staff, day).is_none()
        && workload_min_ok(roster, schedule, staff, day)
}

/// Chaque fenêtre contenant `day` atteint le minimum de gardes.
pub(crate) fn workload_min_ok(roster: &Roster, schedule: &Schedule, staff: usize, day: usize) -> bool {
    let min = roster.rules.workload_min as usize;
    if min == 0 {
        return true;
    }
    let row = schedule.row(staff);
    let days = row.len();
    let window = roster.rules.workload_window_days as usize;
    util::window_starts(day, days, window)
        .all(|start| util::worked_in(row, start, util::window_len(start, days, window)) >= min)
}

/// Couverture et mixité d'une garde complète.
pub(crate) fn slot_ok(roster: &Roster, schedule: &Schedule, day: usize, kind: ShiftKind) -> bool {
    slot_violation(roster, schedule, day, kind).is_none()
}

fn slot_violation(
    roster: &Roster,
    schedule: &Schedule,
    day: usize,
    kind: ShiftKind,
) -> Option<(ViolationKind, String)> {
    let cov = roster.coverage(day, kind);
    let (seniors, juniors) = util::slot_mix(roster, schedule, day, kind);
    let count = seniors + juniors;
    if count < cov.min as usize {
        return Some((
            ViolationKind::CoverageShortfall,
            format!("{count} assigned, minimum {}", cov.min),
        ));
    }
    if count > cov.max as usize {
        return Some((
            ViolationKind::CoverageExcess,
            format!("{count} assigned, maximum {}", cov.max),
        ));
    }
    if count > 0 && seniors < roster.rules.seniors_required(juniors) {
        return Some((
            ViolationKind::SeniorityMix,
            format!(
                "{seniors} senior(s) for {juniors} junior(s), {} required",
                roster.rules.seniors_required(juniors)
            ),
        ));
    }
    None
}

fn recovery_broken(row: &[Option<ShiftKind>], t: usize) -> bool {
    let night = |d: usize| row.get(d).copied().flatten() == Some(ShiftKind::Night);
    let worked = |d: usize| row.get(d).copied().flatten().is_some();
    night(t) && night(t + 1) && (worked(t + 2) || worked(t + 3))
}

/// Vérifie toutes les contraintes dures sur une affectation complète.
pub fn detect_violations(roster: &Roster, schedule: &Schedule) -> Vec<Violation> {
    let mut out = Vec::new();
    let horizon = &roster.horizon;
    let days = schedule.days();

    for day in 0..days {
        for kind in ShiftKind::ALL {
            if let Some((vk, detail)) = slot_violation(roster, schedule, day, kind) {
                out.push(Violation {
                    kind: vk,
                    day: Some(day),
                    date: Some(horizon.date(day)),
                    shift: Some(kind),
                    staff: None,
                    detail,
                });
            }
        }
    }

    let window = roster.rules.workload_window_days as usize;
    let cap = roster.rules.workload_cap as usize;
    let min = roster.rules.workload_min as usize;

    for (idx, staff) in roster.staff.iter().enumerate() {
        let row = schedule.row(idx);
        let mut push = |kind: ViolationKind, day: usize, detail: String| {
            out.push(Violation {
                kind,
                day: Some(day),
                date: Some(horizon.date(day)),
                shift: row[day],
                staff: Some(staff.id.clone()),
                detail,
            });
        };

        for day in 1..days {
            if row[day - 1] == Some(ShiftKind::Night) && row[day] == Some(ShiftKind::Morning) {
                push(
                    ViolationKind::RestRule,
                    day,
                    "morning shift right after a night shift".to_string(),
                );
            }
        }

        let last_start = days.saturating_sub(window);
        for start in 0..=last_start {
            let len = util::window_len(start, days, window);
            let worked = util::worked_in(row, start, len);
            if worked > cap {
                push(
                    ViolationKind::WorkloadCap,
                    start,
                    format!("{worked} shifts in {len} days starting here, cap {cap}"),
                );
            }
            if worked < min {
                push(
                    ViolationKind::WorkloadMin,
                    start,
                    format!("{worked} shifts in {len} days starting here, minimum {min}"),
                );
            }
        }

        if roster.rules.night_recovery {
            for t in 0..days.saturating_sub(1) {
                if recovery_broken(row, t) {
                    push(
                        ViolationKind::NightRecovery,
                        t,
                        "two nights in a row must be followed by two days off".to_string(),
                    );
                }
            }
        }
    }

    out
}
