//! Binary entry point for the transcript fetcher.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use ytscribe_core::transport::http::ReqwestTransport;
use ytscribe_core::{srt, ClientConfig, TranscriptApi, TranscriptOptions};

/// How the fetched transcript is printed.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// Segment texts joined by spaces.
    Text,
    /// Track metadata and segments as JSON.
    Json,
    /// Numbered SRT cues.
    Srt,
}

/// Command line options for the binary.
#[derive(Parser)]
struct Cli {
    /// Preferred language codes, most preferred first.
    #[arg(long = "lang", default_value = "en")]
    languages: Vec<String>,

    /// Keep inline formatting tags like <i> in the text.
    #[arg(long)]
    preserve_formatting: bool,

    /// Output format for the transcript.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// List available transcripts instead of fetching one.
    #[arg(long)]
    list: bool,

    /// Enable verbose debug and trace logs.
    #[arg(long)]
    debug: bool,

    /// Override the platform address.
    #[arg(long, hide = true)]
    base_url: Option<String>,

    /// Id of the video, not its URL.
    video_id: String,
}

/// Application entry point which parses CLI args and performs actions.
/// Logging goes to stderr so the transcript on stdout can be piped.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.debug {
        EnvFilter::default()
            .add_directive("ytscribe=trace".parse()?)
            .add_directive("ytscribe_core=trace".parse()?)
            .add_directive("info".parse()?)
    } else {
        EnvFilter::default()
            .add_directive("ytscribe=info".parse()?)
            .add_directive("ytscribe_core=info".parse()?)
            .add_directive("warn".parse()?)
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::default();
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }
    let api = TranscriptApi::with_transport(ReqwestTransport::new(), config);

    if cli.list {
        let catalog = api.list_transcripts(&cli.video_id).await?;
        println!("{catalog}");
        return Ok(());
    }

    let options = TranscriptOptions {
        languages: cli.languages,
        preserve_formatting: cli.preserve_formatting,
    };
    debug!("fetching transcript for {} in {:?}", cli.video_id, options.languages);
    let transcript = api.fetch_transcript(&cli.video_id, &options).await?;
    match cli.format {
        Format::Text => println!("{}", transcript.text()),
        Format::Json => println!("{}", serde_json::to_string_pretty(&transcript)?),
        Format::Srt => print!("{}", srt::format(&transcript.segments)),
    }
    Ok(())
}
