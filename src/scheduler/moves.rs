use super::conflicts;
use crate::model::{Roster, Schedule, ShiftKind, StaffId};

/// Mouvement élémentaire sur une affectation. Le mouvement sert lui-même de
/// clé tabou : deux mouvements égaux ont la même signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    /// Change la garde d'une personne un jour donné (`None` = repos).
    Reassign {
        staff: usize,
        day: usize,
        from: Option<ShiftKind>,
        to: Option<ShiftKind>,
    },
    /// Échange les gardes de deux personnes le même jour (`a < b`).
    Swap {
        day: usize,
        a: usize,
        b: usize,
        a_from: Option<ShiftKind>,
        b_from: Option<ShiftKind>,
    },
}

/// Ordre de départage : (identifiant, jour, garde reçue, type de mouvement).
pub type TieKey<'r> = (&'r StaffId, usize, Option<ShiftKind>, u8);

impl Move {
    pub fn day(&self) -> usize {
        match *self {
            Move::Reassign { day, .. } | Move::Swap { day, .. } => day,
        }
    }

    /// Personnes touchées (une ou deux).
    pub fn staff(&self) -> impl Iterator<Item = usize> {
        let (first, second) = match *self {
            Move::Reassign { staff, .. } => (staff, None),
            Move::Swap { a, b, .. } => (a, Some(b)),
        };
        std::iter::once(first).chain(second)
    }

    pub fn apply(&self, schedule: &mut Schedule) {
        match *self {
            Move::Reassign { staff, day, to, .. } => {
                schedule.set(staff, day, to);
            }
            Move::Swap {
                day,
                a,
                b,
                a_from,
                b_from,
            } => {
                schedule.set(a, day, b_from);
                schedule.set(b, day, a_from);
            }
        }
    }

    /// Mouvement qui annule celui-ci une fois appliqué.
    pub fn reverse(&self) -> Move {
        match *self {
            Move::Reassign {
                staff,
                day,
                from,
                to,
            } => Move::Reassign {
                staff,
                day,
                from: to,
                to: from,
            },
            Move::Swap {
                day,
                a,
                b,
                a_from,
                b_from,
            } => Move::Swap {
                day,
                a,
                b,
                a_from: b_from,
                b_from: a_from,
            },
        }
    }

    /// Vrai si `applied` (le mouvement déjà appliqué) respecte encore les
    /// contraintes dures. Seules les cellules et gardes touchées sont revues.
    pub fn keeps_feasible(&self, roster: &Roster, applied: &Schedule) -> bool {
        let day = self.day();
        let (k1, k2) = match *self {
            Move::Reassign { from, to, .. } => (from, to),
            Move::Swap { a_from, b_from, .. } => (a_from, b_from),
        };
        let slots_ok = [k1, k2]
            .into_iter()
            .flatten()
            .all(|kind| conflicts::slot_ok(roster, applied, day, kind));
        slots_ok && self.staff().all(|s| conflicts::staff_ok(roster, applied, s, day))
    }

    pub fn tie_key<'r>(&self, roster: &'r Roster) -> TieKey<'r> {
        match *self {
            Move::Reassign { staff, day, to, .. } => (&roster.staff[staff].id, day, to, 0),
            Move::Swap {
                day,
                a,
                b,
                a_from,
                b_from,
            } => {
                let (ia, ib) = (&roster.staff[a].id, &roster.staff[b].id);
                if ia <= ib {
                    (ia, day, b_from, 1)
                } else {
                    (ib, day, a_from, 1)
                }
            }
        }
    }
}

const CELL_VALUES: [Option<ShiftKind>; 4] = [
    None,
    Some(ShiftKind::Morning),
    Some(ShiftKind::Afternoon),
    Some(ShiftKind::Night),
];

/// Voisinage complet : réaffectations puis échanges, ordre déterministe.
pub fn neighborhood(schedule: &Schedule) -> Vec<Move> {
    let staff = schedule.staff_count();
    let days = schedule.days();
    let mut out = Vec::new();

    for s in 0..staff {
        for day in 0..days {
            let from = schedule.get(s, day);
            for to in CELL_VALUES {
                if to != from {
                    out.push(Move::Reassign {
                        staff: s,
                        day,
                        from,
                        to,
                    });
                }
            }
        }
    }

    for day in 0..days {
        for a in 0..staff {
            let a_from = schedule.get(a, day);
            for b in a + 1..staff {
                let b_from = schedule.get(b, day);
                if a_from != b_from {
                    out.push(Move::Swap {
                        day,
                        a,
                        b,
                        a_from,
                        b_from,
                    });
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_reverse_restores_cells() {
        let mut s = Schedule::empty(2, 1);
        s.set(0, 0, Some(ShiftKind::Night));
        let before = s.clone();
        let mv = Move::Swap {
            day: 0,
            a: 0,
            b: 1,
            a_from: Some(ShiftKind::Night),
            b_from: None,
        };
        mv.apply(&mut s);
        assert_eq!(s.get(1, 0), Some(ShiftKind::Night));
        assert_eq!(s.get(0, 0), None);
        mv.reverse().apply(&mut s);
        assert_eq!(s, before);
    }

    #[test]
    fn dropping_below_workload_minimum_is_rejected() {
        use crate::model::{Coverage, CoverageRules, Horizon, Seniority, Staff};
        let start = chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut r = Roster::new(Horizon::new(start, 3));
        r.rules.coverage = CoverageRules::uniform(Coverage::new(0, 1));
        r.rules.workload_min = 1;
        r.staff = vec![Staff::new("s0", Seniority::Senior)];

        let mut s = Schedule::for_roster(&r);
        s.set(0, 1, Some(ShiftKind::Afternoon));
        let off = Move::Reassign {
            staff: 0,
            day: 1,
            from: Some(ShiftKind::Afternoon),
            to: None,
        };
        let mut applied = s.clone();
        off.apply(&mut applied);
        assert!(!off.keeps_feasible(&r, &applied));

        let moved = Move::Reassign {
            staff: 0,
            day: 1,
            from: Some(ShiftKind::Afternoon),
            to: Some(ShiftKind::Night),
        };
        let mut applied = s;
        moved.apply(&mut applied);
        assert!(moved.keeps_feasible(&r, &applied));
    }

    #[test]
    fn neighborhood_size() {
        let mut s = Schedule::empty(3, 2);
        s.set(0, 0, Some(ShiftKind::Morning));
        // 6 cellules x 3 valeurs ; jour 0 : (0,1) et (0,2) diffèrent, jour 1 : aucun
        assert_eq!(neighborhood(&s).len(), 18 + 2);
    }
}
