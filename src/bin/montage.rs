// Montage - multi-modal content generation from the command line

use anyhow::Context;
use clap::{Parser, Subcommand};
use montage::orchestration::batch::parse_batch;
use montage::orchestration::{
    ContentConfig, ContentOrchestrator, ContentRequest, ContentResult, ContentType, ModelInfo,
};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate text, images, video and audio with hosted models")]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output directory (overrides config)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a single piece of content
    Generate {
        /// text, image, video or audio
        content_type: ContentType,
        prompt: String,
        #[command(flatten)]
        options: RequestOptions,
    },

    /// Generate every request in a JSON batch file concurrently
    Batch { file: PathBuf },

    /// Create a text + image + video (+ audio) story from one prompt
    Story {
        prompt: String,
        /// Skip the background music
        #[arg(long)]
        no_audio: bool,
    },

    /// Generate one variation of the prompt per style
    Variations {
        content_type: ContentType,
        prompt: String,
        /// Style for one variation (repeatable)
        #[arg(short, long = "style", required = true)]
        styles: Vec<String>,
        #[arg(short, long)]
        dimensions: Option<String>,
    },

    /// Show the model registry
    Models,
}

#[derive(clap::Args, Debug)]
struct RequestOptions {
    #[arg(short, long)]
    style: Option<String>,

    /// WIDTHxHEIGHT
    #[arg(short, long)]
    dimensions: Option<String>,

    /// Model key from the registry
    #[arg(short, long)]
    model: Option<String>,

    /// Seconds, for video and audio
    #[arg(long)]
    duration: Option<u32>,

    /// Extra tuning parameter as key=value; values are parsed as JSON when possible
    #[arg(short, long = "param", value_parser = parse_param)]
    params: Vec<(String, Value)>,
}

fn parse_param(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.trim().to_string(), value))
}

impl RequestOptions {
    fn into_request(self, content_type: ContentType, prompt: String) -> ContentRequest {
        let mut request = ContentRequest::new(content_type, prompt);
        request.style = self.style;
        request.dimensions = self.dimensions;
        request.model_version = self.model;
        request.duration = self.duration;
        for (key, value) in self.params {
            request = request.with_param(key, value);
        }
        request
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("montage=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = ContentConfig::load(args.config.as_deref())?;
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    match args.command {
        Command::Models => print_models(&config.models.info(&config.output_dir)),
        command => run(command, config).await?,
    }

    Ok(())
}

/// Print the registry; needs no credential
fn print_models(info: &ModelInfo) {
    println!("🧠 Models (output directory: {})\n", info.output_directory.display());
    for content_type in &info.supported_content_types {
        println!("{} - {}", content_type, content_type.description());

        let default = info.default_models.get(content_type);
        if let Some(models) = info.available_models.get(content_type) {
            for (key, reference) in models {
                let marker = if default == Some(key) { " (default)" } else { "" };
                println!("  - {}{}: {}", key, marker, reference);
            }
        }
        println!();
    }
}

async fn run(command: Command, config: ContentConfig) -> anyhow::Result<()> {
    let orchestrator = ContentOrchestrator::new(config)?;

    println!("🎬 Montage Content Pipeline");
    println!("===========================\n");

    match command {
        Command::Generate {
            content_type,
            prompt,
            options,
        } => {
            let request = options.into_request(content_type, prompt);
            println!("🔄 Generating {}...\n", content_type);
            let result = orchestrator.generate(&request).await;
            print_result(content_type.as_str(), &result);
        }

        Command::Batch { file } => {
            let contents = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read batch file {}", file.display()))?;
            let batch = parse_batch(&contents)?;

            for rejected in &batch.rejected {
                println!("⚠️  Skipped: {}", rejected);
            }

            println!("🔄 Generating {} request(s)...\n", batch.requests.len());
            let results = orchestrator.generate_content_batch(&batch.requests).await;

            for (position, result) in batch.positions.iter().zip(&results) {
                print_result(&format!("#{} {}", position, result.content_type), result);
            }
        }

        Command::Story { prompt, no_audio } => {
            println!("📖 Creating story: {}\n", prompt);
            let story = orchestrator.create_multimedia_story(&prompt, !no_audio).await?;

            for (content_type, result) in &story.results {
                print_result(content_type.as_str(), result);
            }

            println!(
                "📊 Total generation time: {:.2}s",
                story.summary.total_generation_time
            );
            println!("📝 Summary: {}", story.summary_path.display());
        }

        Command::Variations {
            content_type,
            prompt,
            styles,
            dimensions,
        } => {
            let mut base = ContentRequest::new(content_type, prompt);
            base.dimensions = dimensions;

            println!("🎨 Generating {} variation(s)...\n", styles.len());
            let results = orchestrator.generate_variations(&base, &styles).await;

            for (style, result) in styles.iter().zip(&results) {
                print_result(style, result);
            }
        }

        Command::Models => print_models(&orchestrator.get_model_info()),
    }

    println!("✓ Done!");

    Ok(())
}

fn print_result(label: &str, result: &ContentResult) {
    if result.is_completed() {
        println!("✅ {}: {}", label, result.urls.join(", "));
        println!("   📊 Generated in {:.2}s", result.generation_time);
    } else {
        println!(
            "❌ {} failed: {}",
            label,
            result.error().unwrap_or("Unknown error")
        );
    }
    println!();
}
