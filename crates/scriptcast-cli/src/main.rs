//! scriptcast CLI — script-to-speech server and local pipeline.
//!
//! ```text
//! scriptcast serve [--port 2004] [--host 127.0.0.1] [--provider elevenlabs]
//! scriptcast segment script.txt [--voices voices.json] [--policy selective]
//! scriptcast synth script.txt --out episode.mp3 [--api-key ...]
//! scriptcast slides deck.pptx
//! scriptcast scrape https://example.com/article
//! ```

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use scriptcast_lib::orchestrator::synthesize_with_deadline;
use scriptcast_lib::scriptcast_core::script::segment;
use scriptcast_lib::scriptcast_core::types::{
    CleaningPolicy, DEFAULT_REQUEST_TIMEOUT, PipelineConfig, ProviderKind, VoiceRegistry,
};
use scriptcast_lib::{server, slides, synth, webpage};

/// scriptcast — turn multi-speaker scripts into one audio file
#[derive(Parser)]
#[command(name = "scriptcast", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API
    Serve {
        /// Listen port
        #[arg(long, default_value = "2004")]
        port: u16,
        /// Listen host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Print the segments a script splits into, as JSON
    Segment {
        /// Script file, or `-` for stdin
        script: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Synthesize a script into one audio file
    Synth {
        /// Script file, or `-` for stdin
        script: PathBuf,
        /// Output audio file
        #[arg(long, short)]
        out: PathBuf,
        /// Provider API key
        #[arg(long, env = "SCRIPTCAST_API_KEY", hide_env_values = true)]
        api_key: String,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Print the text of a PPTX deck
    Slides {
        /// PPTX file
        deck: PathBuf,
    },
    /// Print the main text of a webpage
    Scrape {
        /// Page URL
        url: String,
    },
}

#[derive(Args)]
struct PipelineArgs {
    /// Speech provider
    #[arg(long, default_value_t = ProviderKind::ElevenLabs)]
    provider: ProviderKind,
    /// Provider API base URL override
    #[arg(long)]
    base_url: Option<String>,
    /// Voice registry JSON: {"default": "...", "voices": [{"label": "...", "voice": "..."}]}
    #[arg(long)]
    voices: Option<PathBuf>,
    /// Emphasis cleaning policy (strict | selective)
    #[arg(long, default_value_t = CleaningPolicy::Strict)]
    policy: CleaningPolicy,
    /// Deadline for one synthesis request, in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    timeout_secs: u64,
}

impl PipelineArgs {
    fn into_config(self) -> Result<PipelineConfig, Box<dyn Error>> {
        let registry = match &self.voices {
            Some(path) => load_registry(path)?,
            None => VoiceRegistry::for_provider(self.provider),
        };
        Ok(PipelineConfig {
            provider: self.provider,
            base_url: self.base_url,
            policy: self.policy,
            request_timeout: Duration::from_secs(self.timeout_secs),
            registry,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scriptcast=info,scriptcast_lib=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            host,
            pipeline,
        } => {
            let config = pipeline.into_config()?;
            info!(
                "provider {}, policy {}, {} voices",
                config.provider,
                config.policy,
                config.registry.entries().len()
            );
            let app = server::router(server::AppState::new(config));

            let addr = format!("{host}:{port}");
            info!("scriptcast listening on {addr}");

            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app).await?;
        }

        Command::Segment { script, pipeline } => {
            let config = pipeline.into_config()?;
            let text = read_script(&script)?;
            let segments = segment(&text, &config.registry, config.policy);
            println!("{}", serde_json::to_string_pretty(&segments)?);
        }

        Command::Synth {
            script,
            out,
            api_key,
            pipeline,
        } => {
            let config = pipeline.into_config()?;
            let text = read_script(&script)?;
            let segments = segment(&text, &config.registry, config.policy);
            if segments.is_empty() {
                return Err("no speakable text in script".into());
            }
            info!("parsed {} segments", segments.len());

            let provider = synth::build(config.provider, config.base_url, reqwest::Client::new());
            let audio =
                synthesize_with_deadline(&segments, &api_key, provider.as_ref(), config.request_timeout)
                    .await?;

            tokio::fs::write(&out, &audio).await?;
            info!("wrote {} bytes to {}", audio.len(), out.display());
        }

        Command::Slides { deck } => {
            let bytes = tokio::fs::read(&deck).await?;
            let extracted = slides::extract_from_bytes(&bytes)?;
            info!("{} slides", extracted.slide_count);
            println!("{}", extracted.text);
        }

        Command::Scrape { url } => {
            let content = webpage::scrape(&reqwest::Client::new(), &url).await?;
            println!("{content}");
        }
    }

    Ok(())
}

fn load_registry(path: &Path) -> Result<VoiceRegistry, Box<dyn Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read voices file {}: {e}", path.display()))?;
    let registry = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid voices file {}: {e}", path.display()))?;
    Ok(registry)
}

fn read_script(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin())
    } else {
        std::fs::read_to_string(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn pipeline_flags_parse() {
        let cli = Cli::try_parse_from([
            "scriptcast",
            "segment",
            "script.txt",
            "--policy",
            "selective",
            "--provider",
            "speechify",
            "--timeout-secs",
            "30",
        ])
        .unwrap();
        let Command::Segment { pipeline, .. } = cli.command else {
            panic!("expected segment");
        };
        let config = pipeline.into_config().unwrap();
        assert_eq!(config.policy, CleaningPolicy::Selective);
        assert_eq!(config.provider, ProviderKind::Speechify);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.registry.default_voice(), "henry");
    }

    #[test]
    fn defaults_use_stock_registry() {
        let cli = Cli::try_parse_from(["scriptcast", "serve"]).unwrap();
        let Command::Serve { port, pipeline, .. } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(port, 2004);
        let config = pipeline.into_config().unwrap();
        assert_eq!(config.registry, VoiceRegistry::default());
        assert_eq!(config.policy, CleaningPolicy::Strict);
    }

    #[test]
    fn bad_policy_is_rejected() {
        assert!(Cli::try_parse_from(["scriptcast", "segment", "-", "--policy", "loose"]).is_err());
    }
}
