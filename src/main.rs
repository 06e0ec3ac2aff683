//! SkinTrack command line
//!
//! Usage:
//!     skintrack face.jpg --config ./skintrack.toml
//!     skintrack --set-key <GEMINI_API_KEY>
//!     skintrack --export ./history.json

use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser};
use skintrack::config::{default_config, load_config};
use skintrack::credentials;
use skintrack::{ScanOutcome, SkinTrack};

#[derive(Parser, Debug)]
#[command(name = "skintrack", about = "Analyze a face photo and report skin progress")]
#[command(group(
    ArgGroup::new("action")
        .args(["image", "set_key", "delete_key", "export", "toggle_favorite"])
        .multiple(true)
        .required(true)
))]
struct Args {
    /// JPEG photo to analyze
    image: Option<PathBuf>,

    /// TOML config file (embedded defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Store the Gemini API key in the OS keychain and exit
    #[arg(long, value_name = "KEY")]
    set_key: Option<String>,

    /// Remove the Gemini API key from the OS keychain and exit
    #[arg(long)]
    delete_key: bool,

    /// Write the scan history to a JSON file
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Mark or unmark an ingredient as favorite
    #[arg(long, value_name = "INGREDIENT")]
    toggle_favorite: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    skintrack::init_tracing();

    let args = Args::parse();

    if let Some(key) = &args.set_key {
        credentials::set_api_key(key.trim())?;
        println!("API key stored in keychain");
        return Ok(());
    }
    if args.delete_key {
        credentials::delete_api_key()?;
        println!("API key removed from keychain");
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => default_config(),
    };
    let app = SkinTrack::open(&config)?;

    if let Some(name) = &args.toggle_favorite {
        let favorite = app.toggle_favorite(name);
        println!(
            "{} {} favorites",
            name,
            if favorite { "added to" } else { "removed from" }
        );
    }

    if let Some(image_path) = &args.image {
        let image = std::fs::read(image_path)
            .with_context(|| format!("Failed to read image {:?}", image_path))?;

        match app.scan(&image).await {
            ScanOutcome::Completed(result) => {
                tracing::info!("Scan {} stored", result.id);
                for ingredient in app.recommended_ingredients(&result) {
                    let marker = if app.is_favorite(&ingredient.name) { "*" } else { "-" };
                    eprintln!("{} {}: {}", marker, ingredient.name, ingredient.description);
                }
            }
            ScanOutcome::Failed(message) => anyhow::bail!("Analysis failed: {}", message),
            ScanOutcome::Skipped => anyhow::bail!("Analysis already in progress"),
        }

        let data = app.progress_data();
        println!("{}", serde_json::to_string_pretty(&data)?);
    }

    if let Some(path) = &args.export {
        let count = app.export_history(path)?;
        println!("Exported {} scans to {}", count, path.display());
    }

    Ok(())
}
