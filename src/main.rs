use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

mod db;
mod models;
mod predict;
mod report;

use models::{PredictionResult, StudentInput};

#[derive(Parser)]
#[command(name = "student-performance-report")]
#[command(about = "Student performance reports and intervention tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import students from a CSV file, predicting and recording each row
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Run the local heuristic predictor on a student payload
    Predict {
        #[arg(long)]
        student: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        record: bool,
    },
    /// Compose a structured report from a prediction and a student payload
    Compose {
        #[arg(long)]
        prediction: PathBuf,
        #[arg(long)]
        student: PathBuf,
        #[arg(long, default_value = "report.json")]
        out: PathBuf,
        #[arg(long)]
        markdown: Option<PathBuf>,
    },
    /// List recent predictions
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Show summary statistics across recorded predictions
    Stats,
    /// List interventions, optionally filtered by status
    Interventions {
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    /// Update the status of an intervention
    SetIntervention {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        status: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect().await?;
            let imported = db::import_csv(&pool, &csv).await?;
            println!("Imported {imported} students from {}.", csv.display());
        }
        Commands::Predict {
            student,
            out,
            record,
        } => {
            let student: StudentInput = read_json(&student, "student input")?;
            let prediction = predict::predict(&student);

            let name = if student.name.is_empty() {
                "Unknown Student"
            } else {
                student.name.as_str()
            };
            println!(
                "{name}: score {:.1} (grade {}, {} risk, confidence {:.0}%)",
                prediction.score, prediction.grade, prediction.risk_level, prediction.confidence
            );
            for rec in prediction.recommendations.iter() {
                println!("- P{} {}: {}", rec.priority, rec.title, rec.description);
            }

            if let Some(out) = out {
                std::fs::write(&out, serde_json::to_string_pretty(&prediction)?)?;
                println!("Prediction written to {}.", out.display());
            }

            if record {
                let pool = connect().await?;
                let student_id =
                    db::record_prediction(&pool, &student, &prediction, Utc::now()).await?;
                println!("Recorded prediction {student_id}.");
            }
        }
        Commands::Compose {
            prediction,
            student,
            out,
            markdown,
        } => {
            let prediction: PredictionResult = read_json(&prediction, "prediction")?;
            let student: StudentInput = read_json(&student, "student input")?;

            let document = report::compose_report(&prediction, &student, Utc::now());
            std::fs::write(&out, serde_json::to_string_pretty(&document)?)?;
            println!("Report written to {}.", out.display());

            if let Some(path) = markdown {
                std::fs::write(&path, report::render_markdown(&document))?;
                println!("Summary written to {}.", path.display());
            }
        }
        Commands::Recent { limit } => {
            let pool = connect().await?;
            let predictions = db::fetch_recent(&pool, limit).await?;

            if predictions.is_empty() {
                println!("No predictions recorded yet.");
                return Ok(());
            }

            for row in predictions.iter() {
                println!(
                    "- {} ({}) score {:.1} (grade {}, {} risk) on {}",
                    row.name,
                    row.student_id,
                    row.predicted_score,
                    row.predicted_grade,
                    row.risk_level,
                    row.predicted_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Commands::Stats => {
            let pool = connect().await?;
            let summary = db::fetch_summary(&pool).await?;

            println!("Students: {}", summary.total_students);
            println!("Average score: {:.1}", summary.average_score);
            println!("High risk: {}", summary.high_risk_count);
            println!("Interventions: {}", summary.intervention_count);

            let risks = db::fetch_risk_distribution(&pool).await?;
            if !risks.is_empty() {
                println!("Risk distribution:");
                for slice in risks.iter() {
                    println!("- {}: {}", slice.risk_level, slice.count);
                }
            }

            let grades = db::fetch_grade_distribution(&pool).await?;
            if !grades.is_empty() {
                println!("Grade distribution:");
                for slice in grades.iter() {
                    println!("- {}: {}", slice.grade, slice.count);
                }
            }
        }
        Commands::Interventions { status, limit } => {
            let pool = connect().await?;
            let interventions = db::fetch_interventions(&pool, status.as_deref(), limit).await?;

            if interventions.is_empty() {
                println!("No interventions found.");
                return Ok(());
            }

            for row in interventions.iter() {
                println!(
                    "- {} [{}] {} ({}) for {} (P{}, created {})",
                    row.id,
                    row.status,
                    row.title,
                    row.category,
                    row.student_name,
                    row.priority,
                    row.created_at.format("%Y-%m-%d")
                );
            }
        }
        Commands::SetIntervention { id, status } => {
            let pool = connect().await?;
            db::update_intervention_status(&pool, id, &status).await?;
            println!("Intervention {id} marked as {status}.");
        }
    }

    Ok(())
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid {what} payload in {}", path.display()))
}
