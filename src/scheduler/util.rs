use crate::model::{Roster, Schedule, ShiftKind};
use std::ops::RangeInclusive;

/// Débuts des fenêtres glissantes de `window` jours qui contiennent `day`.
/// Un horizon plus court que la fenêtre forme une seule fenêtre.
pub(crate) fn window_starts(day: usize, days: usize, window: usize) -> RangeInclusive<usize> {
    if days <= window {
        return 0..=0;
    }
    let last_start = days - window;
    let lo = (day + 1).saturating_sub(window);
    let hi = day.min(last_start);
    lo..=hi
}

pub(crate) fn window_len(start: usize, days: usize, window: usize) -> usize {
    window.min(days - start)
}

pub(crate) fn worked_in(row: &[Option<ShiftKind>], start: usize, len: usize) -> usize {
    row[start..start + len].iter().filter(|c| c.is_some()).count()
}

/// (seniors, juniors) affectés à une garde.
pub(crate) fn slot_mix(roster: &Roster, schedule: &Schedule, day: usize, kind: ShiftKind) -> (usize, usize) {
    schedule
        .assigned_to(day, kind)
        .fold((0, 0), |(s, j), idx| {
            if roster.staff[idx].is_senior() {
                (s + 1, j)
            } else {
                (s, j + 1)
            }
        })
}

/// Plus petit nombre de seniors qui rend une garde de `size` personnes valide.
pub(crate) fn min_seniors(roster: &Roster, size: usize) -> usize {
    if size == 0 {
        return 0;
    }
    (1..=size)
        .find(|&k| k >= roster.rules.seniors_required(size - k))
        .unwrap_or(size)
}
