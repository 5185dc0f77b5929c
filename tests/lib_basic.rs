#![forbid(unsafe_code)]
use chrono::NaiveDate;
use garde::model::{Horizon, Roster, Seniority, ShiftKind, Staff};
use garde::scheduler::{
    detect_violations, solve, CancelToken, RunOptions, RunStatus, Scheduler, TabuConfig,
};

fn nine_staff() -> Roster {
    let start = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(); // lundi
    let mut roster = Roster::new(Horizon::new(start, 7));
    for (id, seniority) in [
        ("ana", Seniority::Senior),
        ("bea", Seniority::Senior),
        ("cyr", Seniority::Senior),
        ("dan", Seniority::Senior),
        ("eve", Seniority::Senior),
        ("fab", Seniority::Junior),
        ("gus", Seniority::Junior),
        ("hal", Seniority::Junior),
        ("ivy", Seniority::Junior),
    ] {
        roster.staff.push(Staff::new(id, seniority));
    }
    roster.staff[0] = roster.staff[0]
        .clone()
        .with_shift_preference(0, ShiftKind::Morning, 3)
        .with_day_off(5, 2);
    roster.staff[5] = roster.staff[5]
        .clone()
        .with_shift_preference(2, ShiftKind::Night, 2)
        .with_day_off(6, 1);
    roster
}

fn quick() -> RunOptions {
    RunOptions::default().with_tabu(
        TabuConfig::default()
            .with_max_iterations(60)
            .with_max_no_improve(25),
    )
}

#[test]
fn nine_staff_week_is_solved_without_violations() {
    let roster = nine_staff();
    let report = solve(roster.clone(), &quick(), &CancelToken::new());
    assert_eq!(report.status, RunStatus::Success);

    let schedule = report.schedule.as_ref().unwrap();
    assert!(detect_violations(&roster, schedule).is_empty());
    for day in 0..7 {
        for kind in ShiftKind::ALL {
            let assigned: Vec<usize> = schedule.assigned_to(day, kind).collect();
            assert!((1..=3).contains(&assigned.len()), "day {day} {kind}");
            assert!(assigned.iter().any(|&s| roster.staff[s].is_senior()));
        }
    }
    assert!(report.final_score.unwrap() >= report.initial_score.unwrap());
}

#[test]
fn feasible_start_covers_every_shift_with_a_senior() {
    let scheduler = Scheduler::new(nine_staff()).unwrap();
    let budget = garde::scheduler::Budget::unlimited();
    let start = scheduler
        .find_feasible(&budget, garde::scheduler::DEFAULT_NODE_LIMIT)
        .unwrap();
    assert!(scheduler.detect_violations(&start).unwrap().is_empty());
    for day in 0..7 {
        for kind in ShiftKind::ALL {
            assert!(start
                .assigned_to(day, kind)
                .any(|s| scheduler.roster().staff[s].is_senior()));
        }
    }
}

#[test]
fn same_seed_same_schedule() {
    let a = solve(nine_staff(), &quick(), &CancelToken::new());
    let b = solve(nine_staff(), &quick(), &CancelToken::new());
    assert_eq!(a.schedule, b.schedule);
    assert_eq!(a.final_score, b.final_score);
    assert_eq!(a.iterations, b.iterations);
    assert_ne!(a.run_id, b.run_id);
}

#[test]
fn parallel_scoring_matches_sequential() {
    let seq = solve(nine_staff(), &quick(), &CancelToken::new());
    let mut opts = quick();
    opts.tabu = opts.tabu.with_parallel(true);
    let par = solve(nine_staff(), &opts, &CancelToken::new());
    assert_eq!(seq.schedule, par.schedule);
    assert_eq!(seq.final_score, par.final_score);
}

#[test]
fn zero_staff_is_infeasible() {
    let start = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let roster = Roster::new(Horizon::new(start, 7));
    let report = solve(roster, &quick(), &CancelToken::new());
    assert!(matches!(report.status, RunStatus::Infeasible { .. }));
    assert!(report.schedule.is_none());
    assert_eq!(report.iterations, 0);
}
