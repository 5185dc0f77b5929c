#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use garde::{
    io,
    model::{Horizon, Roster},
    scheduler::{solve, CancelToken, RunOptions, RunStatus, Scheduler, StopReason, TabuConfig},
    storage::{JsonStorage, Storage},
};
use std::time::Duration;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification de gardes (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de roster
    #[arg(long, global = true, default_value = "roster.json")]
    roster: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Calculer une affectation (faisabilité puis tabou)
    Solve {
        /// Export JSON de l'affectation
        #[arg(long)]
        out: Option<String>,
        /// Export CSV de l'affectation
        #[arg(long)]
        csv: Option<String>,
        /// Rapport JSON du run
        #[arg(long)]
        report: Option<String>,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 500)]
        max_iterations: usize,
        #[arg(long, default_value_t = 200)]
        max_no_improve: usize,
        #[arg(long, default_value_t = 10)]
        tenure: usize,
        #[arg(long, default_value_t = 2_000)]
        max_candidates: usize,
        #[arg(long, default_value_t = 1)]
        restarts: usize,
        /// Budget total en millisecondes
        #[arg(long)]
        time_limit_ms: Option<u64>,
        /// Évaluation des voisins et redémarrages en parallèle
        #[arg(long)]
        parallel: bool,
    },

    /// Vérifier les contraintes dures d'une affectation
    Check {
        #[arg(long)]
        schedule: String,
        /// Export CSV des violations (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Score détaillé d'une affectation
    Score {
        #[arg(long)]
        schedule: String,
    },

    /// Ajouter du personnel depuis un CSV (crée le roster si absent)
    ImportStaff {
        #[arg(long)]
        csv: String,
        /// Date de début si le roster est créé (défaut : aujourd'hui)
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.roster);

    let code = match cli.cmd {
        Commands::Solve {
            out,
            csv,
            report,
            seed,
            max_iterations,
            max_no_improve,
            tenure,
            max_candidates,
            restarts,
            time_limit_ms,
            parallel,
        } => {
            let roster = storage.load()?;
            let tabu = TabuConfig::default()
                .with_seed(seed)
                .with_max_iterations(max_iterations)
                .with_max_no_improve(max_no_improve)
                .with_tenure(tenure)
                .with_max_candidates(max_candidates)
                .with_parallel(parallel);
            let mut opts = RunOptions::default().with_tabu(tabu).with_restarts(restarts);
            if let Some(ms) = time_limit_ms {
                opts = opts.with_time_limit(Duration::from_millis(ms));
            }

            let result = solve(roster.clone(), &opts, &CancelToken::new());
            if let Some(path) = &report {
                io::write_report_json(path, &result)?;
            }
            if let Some(schedule) = &result.schedule {
                if let Some(path) = &out {
                    io::export_schedule_json(path, &roster, schedule)?;
                }
                if let Some(path) = &csv {
                    io::export_schedule_csv(path, &roster, schedule)?;
                }
                print!("{}", io::format_table(&roster, schedule));
            }

            match &result.status {
                RunStatus::Success => {
                    println!(
                        "OK: score {:.3} (initial {:.3}), {} iteration(s)",
                        result.final_score.unwrap_or_default(),
                        result.initial_score.unwrap_or_default(),
                        result.iterations
                    );
                    0
                }
                RunStatus::Infeasible { report } => {
                    eprintln!("Infeasible: {report}");
                    2
                }
                RunStatus::Cancelled | RunStatus::TimedOut => {
                    match result.stop {
                        Some(StopReason::NodeLimit) => {
                            eprintln!("Stopped early: feasibility node limit reached")
                        }
                        _ => eprintln!("Stopped early: {:?}", result.status),
                    }
                    2
                }
                RunStatus::InvalidInput { message } => bail!("invalid roster: {message}"),
                RunStatus::InternalError { detail } => bail!("internal error: {detail}"),
            }
        }
        Commands::Check { schedule, report } => {
            let scheduler = Scheduler::new(storage.load()?)?;
            let schedule = io::load_schedule_json(&schedule, scheduler.roster())?;
            let violations = scheduler.detect_violations(&schedule)?;
            if violations.is_empty() {
                println!("OK: no violations");
                0
            } else {
                eprintln!("Found {} violation(s)", violations.len());
                for v in &violations {
                    eprintln!("  {v}");
                }
                if let Some(path) = report {
                    io::export_violations_csv(path, &violations)?;
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::Score { schedule } => {
            let scheduler = Scheduler::new(storage.load()?)?;
            let schedule = io::load_schedule_json(&schedule, scheduler.roster())?;
            let evaluator = scheduler.evaluator();
            let summary = serde_json::json!({
                "breakdown": evaluator.breakdown(&schedule),
                "satisfaction": evaluator.satisfaction(&schedule),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
            0
        }
        Commands::ImportStaff { csv, start, days } => {
            let mut roster = if storage.exists() {
                storage.load()?
            } else {
                let start = start.unwrap_or_else(|| Utc::now().date_naive());
                Roster::new(Horizon::new(start, days))
            };
            let staff = io::import_staff_csv(&csv)?;
            let added = staff.len();
            roster.staff.extend(staff);
            roster
                .validate()
                .with_context(|| format!("importing {csv}"))?;
            storage.save(&roster)?;
            println!("Imported {added} staff into {}", storage.path().display());
            0
        }
    };

    std::process::exit(code);
}
