#![forbid(unsafe_code)]
use chrono::NaiveDate;
use garde::model::{Coverage, CoverageRules, Horizon, Roster, Schedule, Seniority, ShiftKind, Staff};
use garde::scheduler::{
    detect_violations, Budget, Evaluator, Move, SchedError, Scheduler, StopReason, TabuConfig,
    TabuOutcome, TabuSearch, DEFAULT_NODE_LIMIT,
};

/// Deux seniors identiques, aucune couverture minimale.
fn twins(days: u32) -> Roster {
    let start = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let mut roster = Roster::new(Horizon::new(start, days));
    roster.rules.coverage = CoverageRules::uniform(Coverage::new(0, 1));
    roster.objective.fairness = 0.0;
    roster.staff = vec![
        Staff::new("a", Seniority::Senior).with_shift_preference(0, ShiftKind::Night, 2),
        Staff::new("b", Seniority::Senior).with_shift_preference(0, ShiftKind::Night, 2),
    ];
    roster
}

fn one_step(roster: &Roster) -> (Schedule, f64) {
    let search = TabuSearch::new(roster, TabuConfig::default().with_max_iterations(1));
    let out = search
        .run(Schedule::for_roster(roster), &Budget::unlimited())
        .unwrap();
    assert_eq!(out.iterations, 1);
    (out.best, out.best_score)
}

#[test]
fn equal_moves_break_ties_by_staff_id() {
    let (best, score) = one_step(&twins(1));
    assert_eq!(score, 2.0);
    assert_eq!(best.get(0, 0), Some(ShiftKind::Night));
    assert_eq!(best.get(1, 0), None);
}

#[test]
fn equal_moves_prefer_the_least_rewarded_staff() {
    // `a` profite déjà d'un repos souhaité : `b` passe devant.
    let mut r = twins(2);
    r.staff[0] = r.staff[0].clone().with_day_off(1, 1);
    let (best, score) = one_step(&r);
    assert_eq!(score, 3.0);
    assert_eq!(best.get(1, 0), Some(ShiftKind::Night));
    assert_eq!(best.get(0, 0), None);
}

fn week() -> Roster {
    let start = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let mut roster = Roster::new(Horizon::new(start, 7));
    for i in 0..5 {
        roster.staff.push(
            Staff::new(format!("s{i}"), Seniority::Senior)
                .with_shift_preference(i, ShiftKind::Night, 3)
                .with_day_off(6 - i, 2),
        );
    }
    for i in 0..3 {
        roster
            .staff
            .push(Staff::new(format!("j{i}"), Seniority::Junior).with_shift_preference(i + 1, ShiftKind::Morning, 2));
    }
    roster.objective.seniority_boost = 0.25;
    roster.objective.consecutive_penalties = vec![0.0, 0.0, 0.5, 1.0];
    roster
}

#[test]
fn best_never_worse_than_start_and_stays_feasible() {
    let roster = week();
    let scheduler = Scheduler::new(roster.clone()).unwrap();
    let budget = Budget::unlimited();
    let start = scheduler.find_feasible(&budget, DEFAULT_NODE_LIMIT).unwrap();
    let initial = scheduler.evaluator().score(&start);

    let config = TabuConfig::default()
        .with_max_iterations(40)
        .with_max_no_improve(15)
        .with_verify_moves(true);
    let out = TabuSearch::new(&roster, config).run(start, &budget).unwrap();

    assert_eq!(out.initial_score, initial);
    assert!(out.best_score >= initial);
    assert!(detect_violations(&roster, &out.best).is_empty());
    assert_eq!(Evaluator::new(&roster).score(&out.best), out.best_score);
    assert!(out.score_history.windows(2).all(|w| w[1] >= w[0]));
    assert_eq!(out.iterations, out.score_history.len());
    assert!(out.best_iteration <= out.iterations);
    assert!(matches!(
        out.stop,
        StopReason::MaxIterations | StopReason::Stagnation | StopReason::NoAdmissibleMove
    ));
}

#[test]
fn sampling_is_reproducible() {
    let roster = week();
    let scheduler = Scheduler::new(roster.clone()).unwrap();
    let budget = Budget::unlimited();
    let start = scheduler.find_feasible(&budget, DEFAULT_NODE_LIMIT).unwrap();
    let config = TabuConfig::default()
        .with_max_iterations(20)
        .with_max_candidates(50)
        .with_seed(7);
    let search = TabuSearch::new(&roster, config);
    let a = search.run(start.clone(), &budget).unwrap();
    let b = search.run(start, &budget).unwrap();
    assert_eq!(a.best, b.best);
    assert_eq!(a.score_history, b.score_history);
}

#[test]
fn stagnation_stops_the_search() {
    let start = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let mut r = Roster::new(Horizon::new(start, 1));
    r.rules.coverage = CoverageRules::uniform(Coverage::new(0, 1));
    r.staff = vec![Staff::new("solo", Seniority::Senior)];
    let config = TabuConfig::default().with_max_no_improve(3);
    let out = TabuSearch::new(&r, config)
        .run(Schedule::for_roster(&r), &Budget::unlimited())
        .unwrap();
    assert_eq!(out.stop, StopReason::Stagnation);
    assert_eq!(out.iterations, 3);
    assert_eq!(out.best_iteration, 0);
}

#[test]
fn wrong_shape_is_rejected() {
    let r = twins(1);
    let err = TabuSearch::new(&r, TabuConfig::default())
        .run(Schedule::empty(3, 1), &Budget::unlimited())
        .unwrap_err();
    assert!(matches!(err, SchedError::ShapeMismatch { got_staff: 3, .. }));
}

/// Un senior seul, garde de 0 à 1 personne.
fn lone(days: u32, wishes: &[(i32, ShiftKind, u32)]) -> Roster {
    let start = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let mut roster = Roster::new(Horizon::new(start, days));
    roster.rules.coverage = CoverageRules::uniform(Coverage::new(0, 1));
    let mut staff = Staff::new("solo", Seniority::Senior);
    for &(day, shift, weight) in wishes {
        staff = staff.with_shift_preference(day, shift, weight);
    }
    roster.staff = vec![staff];
    roster
}

fn search(roster: &Roster, config: TabuConfig, start: Schedule) -> TabuOutcome {
    TabuSearch::new(roster, config)
        .run(start, &Budget::unlimited())
        .unwrap()
}

fn reassign(staff: usize, day: usize, from: Option<ShiftKind>, to: Option<ShiftKind>) -> Move {
    Move::Reassign { staff, day, from, to }
}

#[test]
fn undo_is_forbidden_while_tabu() {
    let r = lone(1, &[(0, ShiftKind::Night, 2)]);
    let config = TabuConfig::default().with_max_iterations(2);
    let night = Some(ShiftKind::Night);

    let free = search(&r, config.clone().with_tenure(0), Schedule::for_roster(&r));
    assert_eq!(free.moves, vec![reassign(0, 0, None, night), reassign(0, 0, night, None)]);

    let held = search(&r, config.with_tenure(2), Schedule::for_roster(&r));
    assert_eq!(held.moves[0], reassign(0, 0, None, night));
    assert_eq!(held.moves[1], reassign(0, 0, night, Some(ShiftKind::Morning)));
    assert_eq!(held.score_history, vec![2.0, 2.0]);
}

#[test]
fn oldest_tabu_entry_expires_first() {
    let r = lone(2, &[(0, ShiftKind::Morning, 3), (1, ShiftKind::Afternoon, 3)]);
    let config = TabuConfig::default().with_max_iterations(3);
    let morning = Some(ShiftKind::Morning);

    // matin puis après-midi : l'interdiction du retour au repos du jour 0
    // est la plus ancienne
    let short = search(&r, config.clone().with_tenure(1), Schedule::for_roster(&r));
    assert_eq!(short.moves[0], reassign(0, 0, None, morning));
    assert_eq!(short.moves[1], reassign(0, 1, None, Some(ShiftKind::Afternoon)));
    assert_eq!(short.moves[2], reassign(0, 0, morning, None));

    let long = search(&r, config.with_tenure(2), Schedule::for_roster(&r));
    assert_eq!(long.moves[2], reassign(0, 0, morning, Some(ShiftKind::Afternoon)));
}

#[test]
fn aspiration_admits_tabu_move_beating_the_best() {
    let start_date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let mut r = Roster::new(Horizon::new(start_date, 3));
    r.rules.coverage = CoverageRules::uniform(Coverage::new(0, 2));
    r.staff = vec![
        Staff::new("a", Seniority::Senior)
            .with_shift_preference(0, ShiftKind::Afternoon, 1)
            .with_shift_preference(2, ShiftKind::Night, 1),
        Staff::new("b", Seniority::Senior)
            .with_shift_preference(1, ShiftKind::Morning, 3)
            .with_day_off(1, 1),
    ];
    let mut start = Schedule::for_roster(&r);
    for (day, shift) in [ShiftKind::Afternoon, ShiftKind::Morning, ShiftKind::Night]
        .into_iter()
        .enumerate()
    {
        start.set(0, day, Some(shift));
    }
    start.set(1, 0, Some(ShiftKind::Night));
    start.set(1, 2, Some(ShiftKind::Night));
    assert_eq!(Evaluator::new(&r).score(&start), 2.75);

    let config = TabuConfig::default().with_max_iterations(4);
    let taken = search(&r, config.clone(), start.clone());
    let undo = taken.moves[0].reverse();
    assert_eq!(undo, reassign(0, 1, None, Some(ShiftKind::Morning)));
    assert_eq!(taken.score_history, vec![3.0, 3.0, 3.75, 4.0]);
    assert_eq!(taken.moves[3], undo);

    let skipped = search(&r, config.with_aspiration(false), start);
    assert_eq!(skipped.moves[3], reassign(0, 1, None, Some(ShiftKind::Afternoon)));
    assert_eq!(skipped.best_score, 4.0);
}
