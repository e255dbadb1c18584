//! Cropwise - Main Entry Point

use clap::Parser;
use cropwise::cli::{cmd_info, cmd_inspect, cmd_recommend, cmd_train, Cli, Commands};
use cropwise::schema::SoilReading;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cropwise=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, output, config, seed, test_size, cv_folds } => {
            cmd_train(&data, output, config.as_deref(), seed, test_size, cv_folds)?;
        }
        Commands::Recommend {
            model,
            nitrogen,
            phosphorus,
            potassium,
            temperature,
            humidity,
            ph,
            rainfall,
            soil_moisture,
            soil_type,
            sunlight_exposure,
            top_k,
        } => {
            let reading = SoilReading {
                nitrogen,
                phosphorus,
                potassium,
                temperature,
                humidity,
                ph,
                rainfall,
                soil_moisture,
                soil_type,
                sunlight_exposure,
            };
            cmd_recommend(&model, &reading, top_k)?;
        }
        Commands::Inspect { model, json } => {
            cmd_inspect(&model, json)?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
    }

    Ok(())
}
