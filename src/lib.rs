#![forbid(unsafe_code)]
//! Garde — planification de gardes (matin / après-midi / nuit) sous contraintes.
//!
//! - Modèle immuable par run : personnel, horizon, règles dures, objectif.
//! - Recherche d'une affectation faisable (propagation + retour arrière).
//! - Amélioration par recherche tabou, redémarrages parallèles possibles.
//! - Échecs rendus sous forme de statut structuré, jamais de panique.
//! - Entrées / sorties JSON et CSV, écritures atomiques.

#[macro_use]
mod logging;

pub mod io;
pub mod model;
pub mod scheduler;
pub mod storage;

pub use model::{
    Coverage, CoverageRules, HardRules, Horizon, InputError, ObjectiveWeights, Roster, Schedule,
    Seniority, ShiftKind, Staff, StaffId, Weight,
};
pub use scheduler::{
    solve, CancelToken, Evaluator, RunOptions, RunReport, RunStatus, SchedError, Scheduler,
    TabuConfig, Violation, ViolationKind,
};
pub use storage::{JsonStorage, Storage};
