use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Erreurs structurelles d'entrée : rejetées avant toute résolution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("malformed roster: {0}")]
    Malformed(String),
    #[error("duplicate staff id: {0}")]
    DuplicateStaff(String),
    #[error("planning horizon must contain at least one day")]
    EmptyHorizon,
    #[error("planning horizon of {days} days exceeds {max} days", max = Horizon::MAX_DAYS)]
    HorizonTooLong { days: u32 },
    #[error("planning horizon starting {0} runs past the last representable date")]
    HorizonOutOfRange(NaiveDate),
    #[error("invalid coverage for {shift} (day {day:?}): min {min} > max {max}")]
    InvalidCoverage {
        shift: ShiftKind,
        day: Option<u32>,
        min: u32,
        max: u32,
    },
    #[error("coverage override for day {day} is outside the {days}-day horizon")]
    OverrideOutOfHorizon { day: u32, days: u32 },
    #[error("duplicate coverage override for {shift} on day {day}")]
    DuplicateOverride { day: u32, shift: ShiftKind },
    #[error("workload cap must be > 0")]
    InvalidWorkloadCap,
    #[error("workload window must be > 0 days")]
    InvalidWorkloadWindow,
    #[error("workload minimum {min} exceeds the cap {cap}")]
    InvalidWorkloadMin { min: u32, cap: u32 },
    #[error("juniors_per_senior must be > 0")]
    InvalidRatio,
    #[error("invalid preference weight: {0} (expected 0..={max})", max = Weight::MAX)]
    InvalidWeight(i64),
    #[error("staff {staff}: duplicate preferred shift {shift} on day offset {day}")]
    DuplicatePreference {
        staff: String,
        day: i32,
        shift: ShiftKind,
    },
    #[error("invalid objective weight {0}: must be finite and >= 0")]
    InvalidObjective(&'static str),
    #[error("unknown shift kind: {0}")]
    UnknownShift(String),
    #[error("unknown seniority: {0}")]
    UnknownSeniority(String),
}

/// Identifiant fort pour un membre du personnel
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StaffId(String);

impl StaffId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    #[serde(alias = "Junior", alias = "JUNIOR")]
    Junior,
    #[serde(alias = "Senior", alias = "SENIOR")]
    Senior,
}

impl FromStr for Seniority {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "junior" | "j" => Ok(Seniority::Junior),
            "senior" | "s" => Ok(Seniority::Senior),
            _ => Err(InputError::UnknownSeniority(s.to_string())),
        }
    }
}

/// Les trois gardes fixes de la journée, 8 heures chacune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShiftKind {
    #[serde(alias = "morning", alias = "M")]
    Morning,
    #[serde(alias = "afternoon", alias = "A")]
    Afternoon,
    #[serde(alias = "night", alias = "N")]
    Night,
}

impl ShiftKind {
    pub const ALL: [ShiftKind; 3] = [ShiftKind::Morning, ShiftKind::Afternoon, ShiftKind::Night];

    pub fn index(self) -> usize {
        match self {
            ShiftKind::Morning => 0,
            ShiftKind::Afternoon => 1,
            ShiftKind::Night => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShiftKind::Morning => "Morning",
            ShiftKind::Afternoon => "Afternoon",
            ShiftKind::Night => "Night",
        }
    }

    pub fn start_time(self) -> NaiveTime {
        let h = match self {
            ShiftKind::Morning => 7,
            ShiftKind::Afternoon => 15,
            ShiftKind::Night => 23,
        };
        NaiveTime::from_hms_opt(h, 0, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Fin de garde ; la nuit se termine le lendemain.
    pub fn end_time(self) -> NaiveTime {
        self.start_time() + Duration::hours(8)
    }

    /// Plage horaire affichable, ex. `07:00-15:00`.
    pub fn time_range(self) -> String {
        format!(
            "{}-{}",
            self.start_time().format("%H:%M"),
            self.end_time().format("%H:%M")
        )
    }
}

impl fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ShiftKind {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" | "m" => Ok(ShiftKind::Morning),
            "afternoon" | "a" => Ok(ShiftKind::Afternoon),
            "night" | "n" => Ok(ShiftKind::Night),
            _ => Err(InputError::UnknownShift(s.to_string())),
        }
    }
}

/// Niveau d'une préférence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WeightTier {
    Low,
    Medium,
    High,
}

/// Poids d'une préférence individuelle.
///
/// `0` signifie « pas de préférence ». Paliers : 1 = faible, 2 = moyen,
/// 3 et plus = fort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Weight(u32);

impl Weight {
    pub const MAX: u32 = 1_000;
    pub const LOW_MAX: u32 = 1;
    pub const MEDIUM_MAX: u32 = 2;

    pub fn new(value: u32) -> Result<Self, InputError> {
        Self::try_from(i64::from(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn tier(self) -> Option<WeightTier> {
        match self.0 {
            0 => None,
            w if w <= Self::LOW_MAX => Some(WeightTier::Low),
            w if w <= Self::MEDIUM_MAX => Some(WeightTier::Medium),
            _ => Some(WeightTier::High),
        }
    }
}

impl TryFrom<i64> for Weight {
    type Error = InputError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 0 || value > i64::from(Self::MAX) {
            return Err(InputError::InvalidWeight(value));
        }
        Ok(Self(value as u32))
    }
}

impl From<Weight> for u32 {
    fn from(w: Weight) -> Self {
        w.0
    }
}

/// Garde souhaitée : (décalage de jour, type de garde, poids).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftPreference {
    pub day: i32,
    pub shift: ShiftKind,
    pub weight: Weight,
}

/// Jour de repos souhaité.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOffPreference {
    pub day: i32,
    pub weight: Weight,
}

/// Membre du personnel. Un éventuel champ `schedule` hérité d'un planning
/// précédent est ignoré à la lecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub id: StaffId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub seniority: Seniority,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_shifts: Vec<ShiftPreference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_days_off: Vec<DayOffPreference>,
}

impl Staff {
    pub fn new<S: AsRef<str>>(id: S, seniority: Seniority) -> Self {
        Self {
            id: StaffId::new(id),
            name: None,
            seniority,
            preferred_shifts: Vec::new(),
            preferred_days_off: Vec::new(),
        }
    }

    pub fn with_shift_preference(mut self, day: i32, shift: ShiftKind, weight: u32) -> Self {
        self.preferred_shifts.push(ShiftPreference {
            day,
            shift,
            weight: Weight(weight.min(Weight::MAX)),
        });
        self
    }

    pub fn with_day_off(mut self, day: i32, weight: u32) -> Self {
        self.preferred_days_off.push(DayOffPreference {
            day,
            weight: Weight(weight.min(Weight::MAX)),
        });
        self
    }

    pub fn is_senior(&self) -> bool {
        self.seniority == Seniority::Senior
    }
}

fn default_days() -> u32 {
    7
}

/// Horizon de planification : jours consécutifs à partir de `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub start: NaiveDate,
    #[serde(default = "default_days")]
    pub days: u32,
}

impl Horizon {
    /// Une dizaine d'années.
    pub const MAX_DAYS: u32 = 3660;

    pub fn new(start: NaiveDate, days: u32) -> Self {
        Self { start, days }
    }

    pub fn len(&self) -> usize {
        self.days as usize
    }

    pub fn is_empty(&self) -> bool {
        self.days == 0
    }

    /// Jour de l'horizon correspondant à un décalage relatif à `start`.
    pub fn day_of(&self, offset: i32) -> Option<usize> {
        if offset < 0 || offset as u32 >= self.days {
            return None;
        }
        Some(offset as usize)
    }

    /// Date du jour `day`. Saturée à `NaiveDate::MAX` : un horizon validé
    /// n'y arrive jamais.
    pub fn date(&self, day: usize) -> NaiveDate {
        i64::try_from(day)
            .ok()
            .and_then(|d| self.start.checked_add_signed(Duration::days(d)))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn end(&self) -> Option<NaiveDate> {
        let last = i64::from(self.days.saturating_sub(1));
        self.start.checked_add_signed(Duration::days(last))
    }

    pub fn day_of_date(&self, date: NaiveDate) -> Option<usize> {
        let offset = date.signed_duration_since(self.start).num_days();
        i32::try_from(offset).ok().and_then(|o| self.day_of(o))
    }

    pub fn is_weekend(&self, day: usize) -> bool {
        matches!(self.date(day).weekday(), Weekday::Sat | Weekday::Sun)
    }
}

/// Bornes de couverture d'une garde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub min: u32,
    pub max: u32,
}

impl Coverage {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

impl Default for Coverage {
    fn default() -> Self {
        Self { min: 1, max: 3 }
    }
}

/// Couverture propre à un jour donné.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageOverride {
    pub day: u32,
    pub shift: ShiftKind,
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRules {
    #[serde(default)]
    pub morning: Coverage,
    #[serde(default)]
    pub afternoon: Coverage,
    #[serde(default)]
    pub night: Coverage,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<CoverageOverride>,
}

impl CoverageRules {
    pub fn uniform(coverage: Coverage) -> Self {
        Self {
            morning: coverage,
            afternoon: coverage,
            night: coverage,
            overrides: Vec::new(),
        }
    }

    pub fn for_shift(&self, kind: ShiftKind) -> Coverage {
        match kind {
            ShiftKind::Morning => self.morning,
            ShiftKind::Afternoon => self.afternoon,
            ShiftKind::Night => self.night,
        }
    }

    pub fn for_slot(&self, day: usize, kind: ShiftKind) -> Coverage {
        self.overrides
            .iter()
            .find(|o| o.day as usize == day && o.shift == kind)
            .map(|o| Coverage::new(o.min, o.max))
            .unwrap_or_else(|| self.for_shift(kind))
    }
}

fn default_workload_cap() -> u32 {
    5
}

fn default_window() -> u32 {
    7
}

/// Paramètres des contraintes dures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardRules {
    #[serde(default)]
    pub coverage: CoverageRules,
    /// Nombre maximal de gardes sur toute fenêtre glissante.
    #[serde(default = "default_workload_cap")]
    pub workload_cap: u32,
    /// Nombre minimal de gardes sur chaque fenêtre glissante (0 : aucun).
    #[serde(default)]
    pub workload_min: u32,
    #[serde(default = "default_window")]
    pub workload_window_days: u32,
    /// Si défini : `ratio * seniors >= juniors` sur chaque garde.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub juniors_per_senior: Option<u32>,
    /// Deux nuits consécutives imposent deux jours de repos.
    #[serde(default)]
    pub night_recovery: bool,
}

impl Default for HardRules {
    fn default() -> Self {
        Self {
            coverage: CoverageRules::default(),
            workload_cap: default_workload_cap(),
            workload_min: 0,
            workload_window_days: default_window(),
            juniors_per_senior: None,
            night_recovery: false,
        }
    }
}

impl HardRules {
    /// Nombre de seniors requis pour `juniors` juniors sur une garde non vide.
    pub fn seniors_required(&self, juniors: usize) -> usize {
        match self.juniors_per_senior {
            Some(ratio) if ratio > 0 => juniors.div_ceil(ratio as usize).max(1),
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FairnessMeasure {
    #[default]
    Variance,
    Range,
}

fn default_one() -> f64 {
    1.0
}

/// Pondérations de l'objectif souple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    /// Multiplicateur du poids quand un jour de repos souhaité est travaillé.
    #[serde(default = "default_one")]
    pub day_off_penalty: f64,
    #[serde(default = "default_one")]
    pub fairness: f64,
    #[serde(default)]
    pub fairness_measure: FairnessMeasure,
    /// Bonus relatif des préférences des seniors (`1 + boost`).
    #[serde(default)]
    pub seniority_boost: f64,
    #[serde(default)]
    pub weekend_balance: f64,
    /// Pénalité par jour selon la longueur de la série travaillée en cours.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consecutive_penalties: Vec<f64>,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            day_off_penalty: 1.0,
            fairness: 1.0,
            fairness_measure: FairnessMeasure::Variance,
            seniority_boost: 0.0,
            weekend_balance: 0.0,
            consecutive_penalties: Vec::new(),
        }
    }
}

/// Modèle complet d'un run : personnel, horizon, règles, objectif.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub staff: Vec<Staff>,
    pub horizon: Horizon,
    #[serde(default)]
    pub rules: HardRules,
    #[serde(default)]
    pub objective: ObjectiveWeights,
}

impl Roster {
    pub fn new(horizon: Horizon) -> Self {
        Self {
            staff: Vec::new(),
            horizon,
            rules: HardRules::default(),
            objective: ObjectiveWeights::default(),
        }
    }

    pub fn staff_index(&self, id: &StaffId) -> Option<usize> {
        self.staff.iter().position(|s| &s.id == id)
    }

    pub fn seniors(&self) -> usize {
        self.staff.iter().filter(|s| s.is_senior()).count()
    }

    pub fn coverage(&self, day: usize, kind: ShiftKind) -> Coverage {
        self.rules.coverage.for_slot(day, kind)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.horizon.is_empty() {
            return Err(InputError::EmptyHorizon);
        }
        if self.horizon.days > Horizon::MAX_DAYS {
            return Err(InputError::HorizonTooLong {
                days: self.horizon.days,
            });
        }
        if self.horizon.end().is_none() {
            return Err(InputError::HorizonOutOfRange(self.horizon.start));
        }

        let mut ids = HashSet::new();
        for staff in &self.staff {
            if !ids.insert(&staff.id) {
                return Err(InputError::DuplicateStaff(staff.id.to_string()));
            }
            let mut seen = HashSet::new();
            for pref in staff.preferred_shifts.iter().filter(|p| !p.weight.is_none()) {
                if !seen.insert((pref.day, pref.shift)) {
                    return Err(InputError::DuplicatePreference {
                        staff: staff.id.to_string(),
                        day: pref.day,
                        shift: pref.shift,
                    });
                }
            }
        }

        let cov = &self.rules.coverage;
        for kind in ShiftKind::ALL {
            let c = cov.for_shift(kind);
            if c.min > c.max {
                return Err(InputError::InvalidCoverage {
                    shift: kind,
                    day: None,
                    min: c.min,
                    max: c.max,
                });
            }
        }
        let mut pinned = HashSet::new();
        for o in &cov.overrides {
            if o.day >= self.horizon.days {
                return Err(InputError::OverrideOutOfHorizon {
                    day: o.day,
                    days: self.horizon.days,
                });
            }
            if o.min > o.max {
                return Err(InputError::InvalidCoverage {
                    shift: o.shift,
                    day: Some(o.day),
                    min: o.min,
                    max: o.max,
                });
            }
            if !pinned.insert((o.day, o.shift)) {
                return Err(InputError::DuplicateOverride {
                    day: o.day,
                    shift: o.shift,
                });
            }
        }

        if self.rules.workload_cap == 0 {
            return Err(InputError::InvalidWorkloadCap);
        }
        if self.rules.workload_window_days == 0 {
            return Err(InputError::InvalidWorkloadWindow);
        }
        if self.rules.workload_min > self.rules.workload_cap {
            return Err(InputError::InvalidWorkloadMin {
                min: self.rules.workload_min,
                cap: self.rules.workload_cap,
            });
        }
        if self.rules.juniors_per_senior == Some(0) {
            return Err(InputError::InvalidRatio);
        }

        let obj = &self.objective;
        let checks = [
            ("day_off_penalty", obj.day_off_penalty),
            ("fairness", obj.fairness),
            ("seniority_boost", obj.seniority_boost),
            ("weekend_balance", obj.weekend_balance),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(InputError::InvalidObjective(name));
            }
        }
        if obj
            .consecutive_penalties
            .iter()
            .any(|p| !p.is_finite() || *p < 0.0)
        {
            return Err(InputError::InvalidObjective("consecutive_penalties"));
        }
        Ok(())
    }
}

/// Affectation : au plus une garde par (personne, jour).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Schedule {
    staff: usize,
    days: usize,
    cells: Vec<Option<ShiftKind>>,
}

impl Schedule {
    pub fn empty(staff: usize, days: usize) -> Self {
        Self {
            staff,
            days,
            cells: vec![None; staff * days],
        }
    }

    pub fn for_roster(roster: &Roster) -> Self {
        Self::empty(roster.staff.len(), roster.horizon.len())
    }

    pub fn staff_count(&self) -> usize {
        self.staff
    }

    pub fn days(&self) -> usize {
        self.days
    }

    pub fn get(&self, staff: usize, day: usize) -> Option<ShiftKind> {
        self.cells[staff * self.days + day]
    }

    /// Remplace la cellule et renvoie l'ancienne valeur.
    pub fn set(&mut self, staff: usize, day: usize, shift: Option<ShiftKind>) -> Option<ShiftKind> {
        std::mem::replace(&mut self.cells[staff * self.days + day], shift)
    }

    pub fn row(&self, staff: usize) -> &[Option<ShiftKind>] {
        &self.cells[staff * self.days..(staff + 1) * self.days]
    }

    pub fn assigned_to(&self, day: usize, kind: ShiftKind) -> impl Iterator<Item = usize> + '_ {
        (0..self.staff).filter(move |&s| self.get(s, day) == Some(kind))
    }

    pub fn count(&self, day: usize, kind: ShiftKind) -> usize {
        self.assigned_to(day, kind).count()
    }

    pub fn shifts_of(&self, staff: usize) -> usize {
        self.row(staff).iter().filter(|c| c.is_some()).count()
    }

    pub fn total_assigned(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}
