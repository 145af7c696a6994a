use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use biteguard::{
    load_image, resolve, BiteClassifier, BuiltinModel, KnowledgeBase, ModelManager, Resolution,
};
use clap::Parser;
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Photo of the bite to analyze
    image: PathBuf,

    /// Force a fresh download of the model files
    #[arg(short, long)]
    fresh: bool,

    /// Emit the resolution as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

async fn ensure_model_downloaded(fresh: bool) -> Result<()> {
    let manager = ModelManager::new_default()?;
    let model = BuiltinModel::BiteNetV1;

    if fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove_download(model)?;
    }

    if !manager.is_model_downloaded(model) {
        info!("Downloading model...");
        manager.download_model(model).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("=== Starting Bite Analysis ===");

    // Ensure model is downloaded before proceeding
    ensure_model_downloaded(args.fresh).await?;

    let start_time = Instant::now();
    info!("Building classifier...");
    let classifier = BiteClassifier::builder()
        .with_model(BuiltinModel::BiteNetV1)?
        .build()?;
    info!("Classifier ready (took {:.2?})", start_time.elapsed());

    let image = load_image(&args.image)?;
    info!("Analyzing {:?} ({}x{})", args.image, image.width(), image.height());

    let predictions = classifier.predict_image(&image)?;
    let resolution = resolve(&predictions, KnowledgeBase::builtin());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else {
        print_resolution(&resolution);
    }

    info!("Total time: {:.2?}", start_time.elapsed());
    Ok(())
}

fn print_resolution(resolution: &Resolution) {
    println!("\nIdentification: {}", resolution.name());
    println!("\nTop predictions:");
    for pred in resolution.top_predictions() {
        println!(
            "  {:<24} {:>5.1}%  [{}]",
            pred.class_name,
            pred.probability * 100.0,
            pred.tier
        );
    }

    match resolution.guidance() {
        Some(info) => {
            println!("\nSeverity: {}", info.severity.to_string().to_uppercase());
            print_section("Symptoms", &info.symptoms);
            print_section("First aid", &info.treatment);
            print_section("Seek care if", &info.seek_doctor);
        }
        None => {
            let confidence = resolution
                .top_probability()
                .map(|p| format!("{:.0}%", p * 100.0))
                .unwrap_or_else(|| "no".to_string());
            println!("\nLow confidence result ({} confident).", confidence);
            println!(
                "This often happens with blurry photos, poor lighting, or bites not in the database."
            );
            println!("Try improved lighting or getting closer to the subject.");
        }
    }
}

fn print_section(title: &str, items: &[String]) {
    println!("\n{}:", title);
    for item in items {
        println!("  - {}", item);
    }
}
