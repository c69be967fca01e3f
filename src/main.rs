use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use genai_text::utils::init_logging;
use genai_text::{Settings, TextGenerationClient};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate text with Gemini / Vertex AI", long_about = None)]
struct Cli {
    /// Image to send before the prompt
    #[arg(long)]
    image: Option<PathBuf>,

    /// Thinking budget in tokens (0 disables thinking)
    #[arg(long, default_value_t = 0)]
    thinking_budget: u32,

    /// The prompt text
    #[arg(required = true, trailing_var_arg = true)]
    prompt: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load();
    let _log_guard = init_logging(settings.log_dir.as_deref());

    let config = settings
        .client_config()
        .context("Invalid GenAI configuration")?;
    info!("✅ Configuration loaded: {:?}", config);

    let client = TextGenerationClient::new(config)?;
    let prompt = cli.prompt.join(" ");

    let result = match cli.image {
        Some(ref path) => {
            client
                .generate_with_image_file(&prompt, path, cli.thinking_budget)
                .await
        }
        None => client.generate_text(&prompt, cli.thinking_budget).await,
    };

    match result {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) => {
            error!("Generation failed: {}", e);
            Err(e.into())
        }
    }
}
