//! Entry points tying the pipeline together:
//! watch page -> manifest -> catalog -> track -> segments.

use crate::catalog::TranscriptCatalog;
use crate::config::{ClientConfig, TranscriptOptions};
use crate::error::Result;
use crate::manifest::ManifestExtractor;
use crate::parser::Segment;
use crate::session::Session;
use crate::transport::http::ReqwestTransport;
use crate::transport::Transport;
use serde::Serialize;
use tracing::{info, trace};

/// Segments of one fetched track plus which track they came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchedTranscript {
    pub video_id: String,
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub segments: Vec<Segment>,
}

impl FetchedTranscript {
    /// All segment texts joined by a single space.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Transcript client over a transport, a cookie session and a configuration.
/// Each call builds its catalog from scratch; only the session persists.
pub struct TranscriptApi<T: Transport> {
    transport: T,
    session: Session,
    config: ClientConfig,
}

impl TranscriptApi<ReqwestTransport> {
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new(), ClientConfig::default())
    }
}

impl Default for TranscriptApi<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> TranscriptApi<T> {
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self::with_session(transport, Session::new(), config)
    }

    pub fn with_session(transport: T, session: Session, config: ClientConfig) -> Self {
        Self {
            transport,
            session,
            config,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Every caption track available for `video_id`.
    pub async fn list_transcripts(&self, video_id: &str) -> Result<TranscriptCatalog> {
        trace!("list_transcripts video_id={video_id}");
        let manifest = ManifestExtractor::new(&self.transport, &self.session, &self.config)
            .fetch(video_id)
            .await?;
        TranscriptCatalog::build(video_id, manifest)
    }

    /// Fetch the best track for the preferred languages as segments.
    pub async fn fetch_transcript(
        &self,
        video_id: &str,
        options: &TranscriptOptions,
    ) -> Result<FetchedTranscript> {
        let catalog = self.list_transcripts(video_id).await?;
        let track = catalog.find_track(options.languages.as_slice())?;
        let segments = track
            .fetch(
                &self.transport,
                &self.config.accept_language,
                options.preserve_formatting,
            )
            .await?;
        info!(
            "fetched {} segments of {} transcript for video {video_id}",
            segments.len(),
            track.language_code()
        );
        Ok(FetchedTranscript {
            video_id: video_id.to_string(),
            language: track.language().to_string(),
            language_code: track.language_code().to_string(),
            is_generated: track.is_generated(),
            segments,
        })
    }

    /// Transcript text of the best track, segments joined by spaces.
    pub async fn get_transcript(&self, video_id: &str, options: &TranscriptOptions) -> Result<String> {
        Ok(self.fetch_transcript(video_id, options).await?.text())
    }
}

/// One-shot transcript lookup with a fresh HTTP client and session.
pub async fn get_transcript(video_id: &str, options: &TranscriptOptions) -> Result<String> {
    TranscriptApi::new().get_transcript(video_id, options).await
}
