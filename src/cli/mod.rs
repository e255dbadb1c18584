//! Cropwise CLI Module
//!
//! Command-line interface for training, recommending, and inspecting artifacts.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::DatasetLoader;
use crate::export::ModelArtifact;
use crate::inference::{CropRecommender, DEFAULT_TOP_K};
use crate::pipeline::{PipelineConfig, TrainingPipeline};
use crate::schema::{SoilReading, SoilType};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) {
    println!("  {:<16} {}", muted(key), val.white());
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_warn(msg: &str) {
    println!("  {} {}", "!".yellow(), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn bar(fraction: f64, width: usize) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "cropwise")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Crop recommendation from soil and climate readings")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a model and write the artifact
    Train {
        /// Input CSV with the ten feature columns and `label`
        #[arg(short, long)]
        data: PathBuf,

        /// Artifact destination
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON pipeline config; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        seed: Option<u64>,

        /// Held-out fraction
        #[arg(long)]
        test_size: Option<f64>,

        #[arg(long)]
        cv_folds: Option<usize>,
    },

    /// Rank crops for one soil reading
    Recommend {
        /// Trained artifact
        #[arg(short, long)]
        model: PathBuf,

        /// Nitrogen
        #[arg(long = "n", default_value_t = 50.0)]
        nitrogen: f64,

        /// Phosphorus
        #[arg(long = "p", default_value_t = 30.0)]
        phosphorus: f64,

        /// Potassium
        #[arg(long = "k", default_value_t = 40.0)]
        potassium: f64,

        #[arg(long, default_value_t = 25.0)]
        temperature: f64,

        #[arg(long, default_value_t = 70.0)]
        humidity: f64,

        #[arg(long, default_value_t = 6.5)]
        ph: f64,

        #[arg(long, default_value_t = 200.0)]
        rainfall: f64,

        #[arg(long, default_value_t = 50.0)]
        soil_moisture: f64,

        /// Sandy, Clay, Loamy, Peaty, Silty or Chalky
        #[arg(long, default_value = "Loamy")]
        soil_type: SoilType,

        /// Hours per day
        #[arg(long, default_value_t = 6.0)]
        sunlight_exposure: f64,

        /// Number of crops to return
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
    },

    /// Describe a trained artifact
    Inspect {
        #[arg(short, long)]
        model: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show dataset information
    Info {
        #[arg(short, long)]
        data: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    data_path: &Path,
    output: Option<PathBuf>,
    config_path: Option<&Path>,
    seed: Option<u64>,
    test_size: Option<f64>,
    cv_folds: Option<usize>,
) -> anyhow::Result<()> {
    section("Train");

    let mut config = match config_path {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(output) = output {
        config = config.with_output(output);
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    if let Some(test_size) = test_size {
        config = config.with_test_size(test_size);
    }
    if let Some(folds) = cv_folds {
        config = config.with_cv_folds(folds);
    }
    config.validate()?;

    step_run("Loading data");
    let start = Instant::now();
    let dataset = DatasetLoader::load_csv(data_path)?;
    step_done(&format!(
        "{} rows × {} features in {:?}",
        dataset.n_samples(),
        dataset.n_features(),
        start.elapsed()
    ));

    step_run(&format!("Training {} candidates", config.grid.len().min(config.n_iter)));
    let report = TrainingPipeline::new(config).run(&dataset)?;
    step_done(&format!("{:.2}s", report.duration_secs));

    if let Some(path) = &report.output {
        step_ok(&format!("Saved → {}", path.display()));
    }

    section("Classes");
    println!("  {:<16} {:>8} {:>10}", muted("Crop"), muted("Rows"), muted("Balanced"));
    for (crop, count) in &report.class_distribution {
        let balanced = report.balanced_distribution.get(crop).copied().unwrap_or(0);
        println!("  {:<16} {:>8} {:>10}", crop, count, balanced);
    }
    println!();
    kv("Synthetic", &report.n_synthetic.to_string());
    kv("Tomek removed", &report.n_removed.to_string());

    section("Search");
    println!("  {:<36} {:>10} {:>8}", muted("Params"), muted("CV mean"), muted("Std"));
    for trial in &report.search.results {
        let line = format!(
            "  {:<36} {:>10.4} {:>8.4}",
            trial.params.to_string(),
            trial.cv.mean_score,
            trial.cv.std_score
        );
        if trial.params == report.search.best_params {
            println!("{}", line.white().bold());
        } else {
            println!("{}", line);
        }
    }

    section("Result");
    kv("Best params", &report.search.best_params.to_string());
    kv("CV accuracy", &format!("{:.4}", report.search.best_score));
    println!(
        "  {:<16} {}",
        muted("Test accuracy"),
        format!("{:.4}", report.test_accuracy).white().bold()
    );
    let top = report
        .top_features(3)
        .into_iter()
        .map(|(name, _)| name)
        .collect::<Vec<_>>()
        .join(", ");
    kv("Top features", &top);
    println!();

    Ok(())
}

pub fn cmd_recommend(model_path: &Path, reading: &SoilReading, top_k: usize) -> anyhow::Result<()> {
    section("Recommend");

    step_run("Loading model");
    let start = Instant::now();
    let recommender = CropRecommender::load(model_path)?;
    step_done(&format!("{} crops in {:?}", recommender.n_classes(), start.elapsed()));

    for warning in reading.advisory_warnings() {
        step_warn(&warning.to_string());
    }

    let recommendations = recommender.recommend_top_k(reading, top_k)?;

    println!();
    for (rank, rec) in recommendations.iter().enumerate() {
        println!(
            "  {} {:<14} {} {:>6.2}%",
            accent(&format!("{}.", rank + 1)),
            rec.crop.white().bold(),
            ok(&bar(rec.probability, 20)),
            rec.probability * 100.0
        );
        if let Some(profile) = &rec.profile {
            println!(
                "     {}",
                dim(&format!(
                    "{} · {} · {}",
                    profile.best_season, profile.required_nutrients, profile.expected_yield
                ))
            );
        }
    }
    println!();

    Ok(())
}

pub fn cmd_inspect(model_path: &Path, json: bool) -> anyhow::Result<()> {
    let artifact = ModelArtifact::load(model_path)?;
    let summary = artifact.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    section("Artifact");
    kv("File", &model_path.display().to_string());
    for line in summary.to_string().lines() {
        println!("  {}", line);
    }
    println!();

    Ok(())
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let dataset = DatasetLoader::load_csv(data_path)?;

    kv("File", &data_path.display().to_string());
    kv("Rows", &dataset.n_samples().to_string());
    kv("Features", &dataset.n_features().to_string());
    println!();

    println!("  {:<20} {:>10} {:>10} {:>10}", muted("Column"), muted("Min"), muted("Mean"), muted("Max"));
    println!("  {}", dim(&"─".repeat(54)));
    for (name, min, mean, max) in dataset.column_summary() {
        println!("  {:<20} {:>10.2} {:>10.2} {:>10.2}", name, min, mean, max);
    }

    section("Classes");
    let distribution = dataset.class_distribution();
    let largest = distribution.values().copied().max().unwrap_or(1).max(1);
    for (crop, count) in &distribution {
        println!(
            "  {:<16} {:>6} {}",
            crop,
            count,
            dim(&bar(*count as f64 / largest as f64, 24))
        );
    }
    println!();

    Ok(())
}
