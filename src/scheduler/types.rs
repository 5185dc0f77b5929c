use crate::model::{ShiftKind, StaffId};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Famille de contrainte dure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    CoverageShortfall,
    CoverageExcess,
    SeniorityMix,
    RestRule,
    WorkloadCap,
    WorkloadMin,
    NightRecovery,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::CoverageShortfall => "coverage_shortfall",
            ViolationKind::CoverageExcess => "coverage_excess",
            ViolationKind::SeniorityMix => "seniority_mix",
            ViolationKind::RestRule => "rest_rule",
            ViolationKind::WorkloadCap => "workload_cap",
            ViolationKind::WorkloadMin => "workload_min",
            ViolationKind::NightRecovery => "night_recovery",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contrainte dure non respectée (ou impossible à respecter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<ShiftKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff: Option<StaffId>,
    pub detail: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(shift) = self.shift {
            write!(f, " {shift}")?;
        }
        if let (Some(day), Some(date)) = (self.day, self.date) {
            write!(f, " day {day} ({date})")?;
        }
        if let Some(staff) = &self.staff {
            write!(f, " staff {staff}")?;
        }
        write!(f, ": {}", self.detail)
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
    #[error("schedule is {got_staff}x{got_days}, roster expects {staff}x{days}")]
    ShapeMismatch {
        staff: usize,
        days: usize,
        got_staff: usize,
        got_days: usize,
    },
    #[error("unknown staff id: {0}")]
    UnknownStaff(String),
    #[error("date {0} is outside the planning horizon")]
    DateOutsideHorizon(NaiveDate),
}

/// Signal d'annulation partagé, consulté entre deux itérations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Raison d'une interruption externe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Interrupt {
    Cancelled,
    TimedOut,
}

/// Annulation + échéance interne d'un run.
#[derive(Debug, Clone)]
pub struct Budget {
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl Budget {
    pub fn new(time_limit: Option<Duration>, cancel: CancelToken) -> Self {
        Self {
            deadline: time_limit.map(|d| Instant::now() + d),
            cancel,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None, CancelToken::new())
    }

    pub fn interrupted(&self) -> Option<Interrupt> {
        if self.cancel.is_cancelled() {
            return Some(Interrupt::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interrupt::TimedOut),
            _ => None,
        }
    }
}
