#![forbid(unsafe_code)]
use affectation::{
    config::EngineConfig,
    model::{AssignmentId, Schedule, WorkerId},
    notification::{diff_warnings, has_critical, render_all, TextWarningRenderer},
    scheduler::{generate_schedule, GenerateRequest, Strategy},
    session::EditingSession,
    storage::{JsonStorage, Storage},
};
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::time::Instant;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI d'affectation de personnel (fichiers JSON, sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de session
    #[arg(long, global = true, default_value = "session.json")]
    session: String,

    /// Configuration du moteur (JSON, optionnelle)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Générer un planning depuis une demande JSON
    Generate {
        #[arg(long)]
        request: String,
        /// Remplace la stratégie de la demande
        #[arg(long)]
        strategy: Option<Strategy>,
        /// Export complet du résultat (optionnel)
        #[arg(long)]
        out_json: Option<String>,
    },

    /// Balayage complet du planning de la session
    Validate {
        /// Affiche aussi les actions suggérées
        #[arg(long)]
        actions: bool,
    },

    /// Métriques de couverture (JSON)
    Coverage,

    /// Déplacer une affectation vers une autre personne ou une autre date
    Move {
        #[arg(long)]
        assignment_id: String,
        #[arg(long)]
        to_worker: String,
        /// AAAA-MM-JJ ; par défaut la date actuelle de l'affectation
        #[arg(long)]
        to_date: Option<NaiveDate>,
        /// Confirme la dérogation si le déplacement est dérogeable
        #[arg(long)]
        force: bool,
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

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let storage = JsonStorage::open(&cli.session)?;

    let code = match cli.cmd {
        Commands::Generate {
            request,
            strategy,
            out_json,
        } => {
            let data = std::fs::read(&request).with_context(|| format!("reading {request}"))?;
            let mut req: GenerateRequest =
                serde_json::from_slice(&data).with_context(|| "parsing request")?;
            if let Some(s) = strategy {
                req.strategy = s;
            }
            let result = generate_schedule(&req, &config)?;
            if let Some(path) = out_json {
                std::fs::write(&path, serde_json::to_vec_pretty(&result)?)?;
            }
            println!(
                "{} | {}/{} shifts covered ({:.1}%) | hard {} soft {} | {} ms",
                result.algorithm_used,
                result.assigned_shifts,
                result.total_shifts,
                result.coverage_percentage,
                result.total_hard_violations,
                result.total_soft_violations,
                result.generation_time_ms
            );
            for c in &result.conflicts {
                eprintln!("{} {} | {}", c.shift_id, c.date, c.reasons.join("; "));
            }

            let schedule = schedule_for(&req)?;
            let incomplete = !result.conflicts.is_empty();
            let session =
                EditingSession::from_generation(schedule, req.shifts, req.workers, result, config);
            storage.save(&session.to_stored())?;
            // Code 2 = WARNING/INCOMPLETE
            if incomplete {
                2
            } else {
                0
            }
        }
        Commands::Validate { actions } => {
            let mut session = EditingSession::from_stored(storage.load()?, config);
            let previous = session.warnings().to_vec();
            let current = session.validate_now().to_vec();
            let diff = diff_warnings(&previous, &current);

            if current.is_empty() {
                println!("OK: no warnings");
            } else {
                let renderer = TextWarningRenderer {
                    with_action: actions,
                };
                println!("{}", render_all(&current, &renderer));
            }
            if !diff.is_empty() {
                eprintln!(
                    "{} new, {} resolved since last validation",
                    diff.added.len(),
                    diff.resolved.len()
                );
            }
            storage.save(&session.to_stored())?;
            if has_critical(&current) {
                2
            } else {
                0
            }
        }
        Commands::Coverage => {
            let session = EditingSession::from_stored(storage.load()?, config);
            println!("{}", serde_json::to_string_pretty(&session.coverage())?);
            0
        }
        Commands::Move {
            assignment_id,
            to_worker,
            to_date,
            force,
        } => {
            let mut session = EditingSession::from_stored(storage.load()?, config);
            let id = AssignmentId::new(&assignment_id);
            let date = match to_date {
                Some(d) => d,
                None => session
                    .find(&id)
                    .map(|a| a.date)
                    .ok_or_else(|| anyhow!("unknown assignment: {assignment_id}"))?,
            };
            let outcome =
                session.apply_move(&id, &WorkerId::new(&to_worker), date, force, Instant::now())?;
            for w in &outcome.validation.warnings {
                eprintln!("warning: {}", w.message);
            }
            for e in &outcome.validation.errors {
                eprintln!("error: {}", e.message);
            }
            if outcome.applied {
                session.validate_now();
                storage.save(&session.to_stored())?;
                println!("moved {assignment_id} to {to_worker} on {date}");
                0
            } else if outcome.validation.can_override {
                bail!("move rejected; rerun with --force to override");
            } else {
                bail!("move rejected");
            }
        }
    };

    std::process::exit(code);
}

/// Période du planning : celle de la demande, sinon l'étendue des créneaux.
fn schedule_for(req: &GenerateRequest) -> Result<Schedule> {
    let start = req
        .period_start
        .or_else(|| req.shifts.iter().map(|s| s.date).min())
        .ok_or_else(|| anyhow!("request has no shifts"))?;
    let end = req
        .period_end
        .or_else(|| req.shifts.iter().map(|s| s.date).max())
        .unwrap_or(start);
    let mut schedule =
        Schedule::with_random_id(&req.organization_id, start, end).map_err(|e| anyhow!(e))?;
    schedule.department_id = req.department_id.clone();
    Ok(schedule)
}
