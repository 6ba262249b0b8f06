//! Fetch video transcripts by scraping the caption manifest out of the watch
//! page, choosing a track by language preference and parsing its timed-text
//! document into segments.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod formatting;
pub mod manifest;
pub mod parser;
pub mod session;
pub mod srt;
pub mod transport;

pub use api::{get_transcript, FetchedTranscript, TranscriptApi};
pub use catalog::{TranscriptCatalog, TranscriptTrack, TranslationLanguage};
pub use config::{ClientConfig, TranscriptOptions};
pub use error::{Result, Stage, TranscriptError};
pub use parser::Segment;
