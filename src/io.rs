use crate::model::{InputError, Roster, Schedule, ShiftKind, StaffId};
use crate::scheduler::SchedError;
use crate::storage::write_atomic;
use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

#[cfg(feature = "csv")]
use crate::model::{DayOffPreference, Seniority, ShiftPreference, Staff, Weight};
#[cfg(feature = "csv")]
use crate::scheduler::Violation;
#[cfg(feature = "csv")]
use anyhow::bail;
#[cfg(feature = "csv")]
use csv::{ReaderBuilder, WriterBuilder};

/// Lit un roster JSON et le valide. Un éventuel champ `schedule` sur les
/// membres du personnel est ignoré.
pub fn parse_roster_json(s: &str) -> Result<Roster, InputError> {
    let roster: Roster =
        serde_json::from_str(s).map_err(|e| InputError::Malformed(e.to_string()))?;
    roster.validate()?;
    Ok(roster)
}

pub fn load_roster_json<P: AsRef<Path>>(path: P) -> anyhow::Result<Roster> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let roster = parse_roster_json(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(roster)
}

/// Affectation exportée : identifiant -> date -> garde. Une date absente
/// signifie « pas de garde ».
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleExport(pub BTreeMap<StaffId, BTreeMap<NaiveDate, ShiftKind>>);

impl ScheduleExport {
    pub fn from_schedule(roster: &Roster, schedule: &Schedule) -> Self {
        let mut out = BTreeMap::new();
        for (idx, staff) in roster.staff.iter().enumerate() {
            let days: BTreeMap<NaiveDate, ShiftKind> = schedule
                .row(idx)
                .iter()
                .enumerate()
                .filter_map(|(day, cell)| cell.map(|k| (roster.horizon.date(day), k)))
                .collect();
            out.insert(staff.id.clone(), days);
        }
        Self(out)
    }

    /// Reconstruit la grille ; les personnes absentes de l'export sont au repos.
    pub fn to_schedule(&self, roster: &Roster) -> Result<Schedule, SchedError> {
        let mut schedule = Schedule::for_roster(roster);
        for (id, days) in &self.0 {
            let idx = roster
                .staff_index(id)
                .ok_or_else(|| SchedError::UnknownStaff(id.to_string()))?;
            for (date, kind) in days {
                let day = roster
                    .horizon
                    .day_of_date(*date)
                    .ok_or(SchedError::DateOutsideHorizon(*date))?;
                schedule.set(idx, day, Some(*kind));
            }
        }
        Ok(schedule)
    }

    pub fn get(&self, id: &StaffId, date: NaiveDate) -> Option<ShiftKind> {
        self.0.get(id).and_then(|days| days.get(&date)).copied()
    }
}

pub fn export_schedule_json<P: AsRef<Path>>(
    path: P,
    roster: &Roster,
    schedule: &Schedule,
) -> anyhow::Result<()> {
    let export = ScheduleExport::from_schedule(roster, schedule);
    let json = serde_json::to_vec_pretty(&export)?;
    write_atomic(path.as_ref(), &json)
}

pub fn load_schedule_json<P: AsRef<Path>>(path: P, roster: &Roster) -> anyhow::Result<Schedule> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let export: ScheduleExport =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    let schedule = export.to_schedule(roster)?;
    Ok(schedule)
}

/// Rapport JSON (statut, scores...) écrit de manière atomique.
pub fn write_report_json<P: AsRef<Path>, T: Serialize>(path: P, report: &T) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(report)?;
    write_atomic(path.as_ref(), &json)
}

/// Grille texte : une ligne par personne, une colonne par jour (`M`/`A`/`N`/`.`).
pub fn format_table(roster: &Roster, schedule: &Schedule) -> String {
    let width = roster
        .staff
        .iter()
        .map(|s| s.id.as_str().len())
        .max()
        .unwrap_or(0)
        .max(5);
    let mut out = String::new();
    let _ = write!(out, "{:width$}", "staff");
    for day in 0..roster.horizon.len() {
        let _ = write!(out, " {}", roster.horizon.date(day).format("%d"));
    }
    out.push('\n');
    for (idx, staff) in roster.staff.iter().enumerate() {
        let _ = write!(out, "{:width$}", staff.id.as_str());
        for cell in schedule.row(idx) {
            let code = match cell {
                Some(ShiftKind::Morning) => 'M',
                Some(ShiftKind::Afternoon) => 'A',
                Some(ShiftKind::Night) => 'N',
                None => '.',
            };
            let _ = write!(out, "  {code}");
        }
        out.push('\n');
    }
    out
}

/// Import de personnel depuis CSV: header
/// `id,seniority[,name][,preferred_shifts][,days_off]`.
///
/// `preferred_shifts` : `jour:garde:poids;...`, `days_off` : `jour:poids;...`.
#[cfg(feature = "csv")]
pub fn import_staff_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Staff>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let id = rec.get(0).context("missing id")?.trim();
        let seniority = rec.get(1).context("missing seniority")?.trim();
        if id.is_empty() {
            bail!("invalid staff row (empty id)");
        }
        let seniority: Seniority = seniority
            .parse()
            .with_context(|| format!("invalid seniority for {id}"))?;
        let mut staff = Staff::new(id, seniority);
        if let Some(name) = rec.get(2).map(str::trim).filter(|n| !n.is_empty()) {
            staff.name = Some(name.to_string());
        }
        if let Some(raw) = rec.get(3).map(str::trim).filter(|r| !r.is_empty()) {
            staff.preferred_shifts = parse_shift_preferences(raw)
                .with_context(|| format!("invalid preferred_shifts for {id}"))?;
        }
        if let Some(raw) = rec.get(4).map(str::trim).filter(|r| !r.is_empty()) {
            staff.preferred_days_off = parse_days_off(raw)
                .with_context(|| format!("invalid days_off for {id}"))?;
        }
        out.push(staff);
    }
    Ok(out)
}

#[cfg(feature = "csv")]
fn parse_shift_preferences(raw: &str) -> anyhow::Result<Vec<ShiftPreference>> {
    raw.split(';')
        .filter(|chunk| !chunk.trim().is_empty())
        .map(|chunk| {
            let parts: Vec<&str> = chunk.trim().split(':').collect();
            let [day, shift, weight] = parts.as_slice() else {
                bail!("expected day:shift:weight, got {chunk:?}");
            };
            Ok(ShiftPreference {
                day: day.trim().parse().context("day offset")?,
                shift: shift.parse()?,
                weight: parse_weight(weight)?,
            })
        })
        .collect()
}

#[cfg(feature = "csv")]
fn parse_days_off(raw: &str) -> anyhow::Result<Vec<DayOffPreference>> {
    raw.split(';')
        .filter(|chunk| !chunk.trim().is_empty())
        .map(|chunk| {
            let (day, weight) = chunk
                .trim()
                .split_once(':')
                .with_context(|| format!("expected day:weight, got {chunk:?}"))?;
            Ok(DayOffPreference {
                day: day.trim().parse().context("day offset")?,
                weight: parse_weight(weight)?,
            })
        })
        .collect()
}

#[cfg(feature = "csv")]
fn parse_weight(raw: &str) -> anyhow::Result<Weight> {
    let value: i64 = raw.trim().parse().context("weight")?;
    Ok(Weight::try_from(value)?)
}

/// Rendu CSV de l'affectation: header `staff_id,date,shift,time_range`,
/// une ligne par garde affectée.
#[cfg(feature = "csv")]
pub fn render_schedule_csv(roster: &Roster, schedule: &Schedule) -> anyhow::Result<String> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    write_schedule_records(&mut w, roster, schedule)?;
    let bytes = w
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing csv: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(feature = "csv")]
pub fn export_schedule_csv<P: AsRef<Path>>(
    path: P,
    roster: &Roster,
    schedule: &Schedule,
) -> anyhow::Result<()> {
    let csv = render_schedule_csv(roster, schedule)?;
    write_atomic(path.as_ref(), csv.as_bytes())
}

#[cfg(feature = "csv")]
fn write_schedule_records<W: std::io::Write>(
    w: &mut csv::Writer<W>,
    roster: &Roster,
    schedule: &Schedule,
) -> anyhow::Result<()> {
    w.write_record(["staff_id", "date", "shift", "time_range"])?;
    for (idx, staff) in roster.staff.iter().enumerate() {
        for (day, cell) in schedule.row(idx).iter().enumerate() {
            let Some(kind) = cell else { continue };
            let date = roster.horizon.date(day).to_string();
            let range = kind.time_range();
            w.write_record([staff.id.as_str(), date.as_str(), kind.label(), range.as_str()])?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des violations: header `kind,date,shift,staff_id,detail`
#[cfg(feature = "csv")]
pub fn export_violations_csv<P: AsRef<Path>>(path: P, violations: &[Violation]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    w.write_record(["kind", "date", "shift", "staff_id", "detail"])?;
    for v in violations {
        let date = v.date.map(|d| d.to_string()).unwrap_or_default();
        let shift = v.shift.map(ShiftKind::label).unwrap_or("");
        let staff = v.staff.as_ref().map(StaffId::as_str).unwrap_or("");
        w.write_record([v.kind.as_str(), date.as_str(), shift, staff, v.detail.as_str()])?;
    }
    let bytes = w
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing csv: {}", e.error()))?;
    write_atomic(path.as_ref(), &bytes)
}
