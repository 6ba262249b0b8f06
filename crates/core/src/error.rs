//! Error kinds surfaced by the transcript pipeline.
//! Every variant is terminal: nothing in the crate retries on failure.

use crate::parser::ParseError;
use crate::transport::TransportError;
use std::fmt;
use thiserror::Error;

/// Pipeline stage that produced a wrapped error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchWatchPage,
    ExtractManifest,
    DecodeJson,
    FetchTrack,
    ParseDocument,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::FetchWatchPage => "fetch watch page",
            Stage::ExtractManifest => "extract manifest",
            Stage::DecodeJson => "decode JSON",
            Stage::FetchTrack => "fetch track",
            Stage::ParseDocument => "parse document",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("invalid video id {0:?}: pass the bare video id, not a URL")]
    InvalidVideoId(String),

    #[error("too many requests for video {0}: the platform answered with a CAPTCHA, try again later")]
    TooManyRequests(String),

    #[error("video {0} is unavailable")]
    VideoUnavailable(String),

    #[error("transcripts are disabled for video {0}")]
    TranscriptDisabled(String),

    #[error("no transcript found for video {video_id} in languages {requested:?}")]
    NoTranscriptFound {
        video_id: String,
        requested: Vec<String>,
    },

    #[error("transcript {language_code} of video {video_id} is not translatable")]
    NotTranslatable {
        video_id: String,
        language_code: String,
    },

    #[error("failed to bypass the consent page for video {0}")]
    ConsentCookieFailed(String),

    #[error("platform request to {url} failed with status {status}")]
    PlatformRequestFailed { url: String, status: u16 },

    #[error("{stage}: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: TransportError,
    },

    #[error("decode JSON: {0}")]
    ManifestJson(#[source] serde_json::Error),

    #[error("extract manifest: caption track is missing `{field}`")]
    MalformedManifest { field: &'static str },

    #[error("parse document: {0}")]
    Document(#[from] ParseError),
}

impl TranscriptError {
    /// The stage a wrapped error came from, `None` for the named kinds.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            TranscriptError::Transport { stage, .. } => Some(*stage),
            TranscriptError::ManifestJson(_) => Some(Stage::DecodeJson),
            TranscriptError::MalformedManifest { .. } => Some(Stage::ExtractManifest),
            TranscriptError::Document(_) => Some(Stage::ParseDocument),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TranscriptError>;
