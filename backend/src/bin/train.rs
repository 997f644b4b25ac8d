//! Crop Advisor - offline trainer
//!
//! Generates synthetic Punjab field data, fits the model bundle and writes
//! it to the artifact directory the server loads from.

use std::path::PathBuf;

use clap::Parser;
use crop_advisor_backend::{training, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "cra-train", about = "Train the crop advisor model bundle")]
struct Args {
    /// Output directory (defaults to models.artifact_dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of synthetic samples
    #[arg(long)]
    samples: Option<usize>,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Trees per forest
    #[arg(long)]
    trees: Option<usize>,

    /// Cross-validation folds (0 disables)
    #[arg(long)]
    cv_folds: Option<usize>,

    /// Print the training report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cra_train=info,crop_advisor_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = Config::load()?;

    let mut settings = config.training.clone();
    if let Some(samples) = args.samples {
        settings.samples = samples;
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if let Some(trees) = args.trees {
        settings.n_trees = trees;
    }
    if let Some(folds) = args.cv_folds {
        settings.cv_folds = folds;
    }
    let output = args.output.unwrap_or(config.models.artifact_dir);

    tracing::info!(samples = settings.samples, seed = settings.seed, "Generating synthetic training data");
    let rows = training::synthetic_dataset(settings.samples, settings.seed);
    let artifacts = training::train_bundle(&rows, &settings)?;
    artifacts.save(&output)?;

    let report = &artifacts.metadata.report;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&artifacts.metadata)?);
    } else {
        println!("Bundle {} written to {}", artifacts.metadata.bundle_id, output.display());
        println!(
            "Classifier accuracy {:.3} (cv {:.3} ± {:.3})",
            report.classifier_accuracy, report.cv_accuracy_mean, report.cv_accuracy_std
        );
        println!("Yield RMSE {:.1}, R² {:.3}", report.regressor_rmse, report.regressor_r2);
        for item in &report.feature_importances {
            println!("  {:<20} {:.4}", item.feature, item.importance);
        }
    }

    Ok(())
}
