//! Caption tracks available for a video and the language-preference search
//! over them.

use crate::error::{Result, Stage, TranscriptError};
use crate::manifest::{RawCaptionTrack, RawManifest, RawTranslationLanguage};
use crate::parser::{self, Segment};
use crate::transport::{HttpRequest, Transport};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, trace};

/// A language the platform can machine-translate tracks into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationLanguage {
    pub language: String,
    pub language_code: String,
}

/// One fetchable caption track.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptTrack {
    video_id: String,
    url: String,
    language: String,
    language_code: String,
    is_generated: bool,
    is_translatable: bool,
    translation_languages: Vec<TranslationLanguage>,
}

impl TranscriptTrack {
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Display name, e.g. "English (auto-generated)".
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    pub fn is_generated(&self) -> bool {
        self.is_generated
    }

    pub fn is_translatable(&self) -> bool {
        self.is_translatable
    }

    /// Languages this track could be translated into; empty when the track is
    /// not translatable.
    pub fn translation_languages(&self) -> &[TranslationLanguage] {
        &self.translation_languages
    }

    /// Check that a translation into `language_code` is advertised.
    pub fn translation_language(&self, language_code: &str) -> Result<&TranslationLanguage> {
        if !self.is_translatable {
            return Err(TranscriptError::NotTranslatable {
                video_id: self.video_id.clone(),
                language_code: self.language_code.clone(),
            });
        }
        self.translation_languages
            .iter()
            .find(|t| t.language_code == language_code)
            .ok_or_else(|| TranscriptError::NoTranscriptFound {
                video_id: self.video_id.clone(),
                requested: vec![language_code.to_string()],
            })
    }

    /// Download this track and parse it into segments.
    pub async fn fetch<T: Transport + ?Sized>(
        &self,
        transport: &T,
        accept_language: &str,
        preserve_formatting: bool,
    ) -> Result<Vec<Segment>> {
        debug!(
            "fetching {} track {} for video {}",
            if self.is_generated { "generated" } else { "manual" },
            self.language_code,
            self.video_id
        );
        let request = HttpRequest::get(&self.url).header("Accept-Language", accept_language);
        let resp = transport
            .get(&request)
            .await
            .map_err(|source| TranscriptError::Transport {
                stage: Stage::FetchTrack,
                source,
            })?;
        if !resp.is_ok() {
            return Err(TranscriptError::PlatformRequestFailed {
                url: self.url.clone(),
                status: resp.status,
            });
        }
        Ok(parser::parse(&resp.body, preserve_formatting)?)
    }
}

impl fmt::Display for TranscriptTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (\"{}\")", self.language_code, self.language)?;
        if self.is_translatable {
            f.write_str("[TRANSLATABLE]")?;
        }
        Ok(())
    }
}

/// All caption tracks of one video, split into manual and generated.
#[derive(Debug, Clone)]
pub struct TranscriptCatalog {
    video_id: String,
    manual: BTreeMap<String, TranscriptTrack>,
    generated: BTreeMap<String, TranscriptTrack>,
    translation_languages: Vec<TranslationLanguage>,
}

impl TranscriptCatalog {
    /// Validate the raw manifest and sort its tracks into partitions. A later
    /// track with the same language code replaces an earlier one in the same
    /// partition.
    pub fn build(video_id: &str, manifest: RawManifest) -> Result<Self> {
        let translation_languages = manifest
            .translation_languages
            .into_iter()
            .map(build_translation_language)
            .collect::<Result<Vec<_>>>()?;

        let mut manual = BTreeMap::new();
        let mut generated = BTreeMap::new();
        for raw in manifest.caption_tracks {
            let track = build_track(video_id, raw, &translation_languages)?;
            let partition = if track.is_generated {
                &mut generated
            } else {
                &mut manual
            };
            if let Some(old) = partition.insert(track.language_code.clone(), track) {
                trace!("track {} replaced by a later manifest entry", old.language_code);
            }
        }
        debug!(
            manual = manual.len(),
            generated = generated.len(),
            translations = translation_languages.len(),
            "built transcript catalog for video {video_id}"
        );
        Ok(Self {
            video_id: video_id.to_string(),
            manual,
            generated,
            translation_languages,
        })
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Manually created tracks, ordered by language code.
    pub fn manual_tracks(&self) -> impl Iterator<Item = &TranscriptTrack> {
        self.manual.values()
    }

    /// Automatically generated tracks, ordered by language code.
    pub fn generated_tracks(&self) -> impl Iterator<Item = &TranscriptTrack> {
        self.generated.values()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &TranscriptTrack> {
        self.manual_tracks().chain(self.generated_tracks())
    }

    pub fn translation_languages(&self) -> &[TranslationLanguage] {
        &self.translation_languages
    }

    /// First track matching the preference order. For each code a manual
    /// track beats a generated one, but an earlier code always beats a later
    /// code.
    pub fn find_track<S: AsRef<str>>(&self, language_codes: &[S]) -> Result<&TranscriptTrack> {
        self.find_in(language_codes, &[&self.manual, &self.generated])
    }

    pub fn find_manual_track<S: AsRef<str>>(
        &self,
        language_codes: &[S],
    ) -> Result<&TranscriptTrack> {
        self.find_in(language_codes, &[&self.manual])
    }

    pub fn find_generated_track<S: AsRef<str>>(
        &self,
        language_codes: &[S],
    ) -> Result<&TranscriptTrack> {
        self.find_in(language_codes, &[&self.generated])
    }

    fn find_in<'a, S: AsRef<str>>(
        &'a self,
        language_codes: &[S],
        partitions: &[&'a BTreeMap<String, TranscriptTrack>],
    ) -> Result<&'a TranscriptTrack> {
        for code in language_codes {
            for partition in partitions {
                if let Some(track) = partition.get(code.as_ref()) {
                    debug!(
                        "selected {} track {}",
                        if track.is_generated { "generated" } else { "manual" },
                        track.language_code
                    );
                    return Ok(track);
                }
            }
        }
        Err(TranscriptError::NoTranscriptFound {
            video_id: self.video_id.clone(),
            requested: language_codes
                .iter()
                .map(|c| c.as_ref().to_string())
                .collect(),
        })
    }
}

impl fmt::Display for TranscriptCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(items: impl Iterator<Item = String>) -> String {
            let lines: Vec<String> = items.map(|i| format!(" - {i}")).collect();
            if lines.is_empty() {
                "None".to_string()
            } else {
                lines.join("\n")
            }
        }
        writeln!(
            f,
            "For this video ({}) transcripts are available in the following languages:",
            self.video_id
        )?;
        writeln!(f)?;
        writeln!(f, "(MANUALLY CREATED)")?;
        writeln!(f, "{}", list(self.manual_tracks().map(|t| t.to_string())))?;
        writeln!(f)?;
        writeln!(f, "(GENERATED)")?;
        writeln!(f, "{}", list(self.generated_tracks().map(|t| t.to_string())))?;
        writeln!(f)?;
        writeln!(f, "(TRANSLATION LANGUAGES)")?;
        write!(
            f,
            "{}",
            list(
                self.translation_languages
                    .iter()
                    .map(|t| format!("{} (\"{}\")", t.language_code, t.language))
            )
        )
    }
}

fn build_translation_language(raw: RawTranslationLanguage) -> Result<TranslationLanguage> {
    let language_code = raw
        .language_code
        .ok_or(TranscriptError::MalformedManifest {
            field: "translationLanguages.languageCode",
        })?;
    let language = raw
        .language_name
        .and_then(|n| n.text())
        .ok_or(TranscriptError::MalformedManifest {
            field: "translationLanguages.languageName",
        })?;
    Ok(TranslationLanguage {
        language,
        language_code,
    })
}

fn build_track(
    video_id: &str,
    raw: RawCaptionTrack,
    translation_languages: &[TranslationLanguage],
) -> Result<TranscriptTrack> {
    let url = raw
        .base_url
        .ok_or(TranscriptError::MalformedManifest { field: "baseUrl" })?;
    let language_code = raw
        .language_code
        .ok_or(TranscriptError::MalformedManifest {
            field: "languageCode",
        })?;
    let language = raw
        .name
        .and_then(|n| n.text())
        .ok_or(TranscriptError::MalformedManifest { field: "name" })?;
    let is_translatable = raw.is_translatable.unwrap_or(false);
    Ok(TranscriptTrack {
        video_id: video_id.to_string(),
        url,
        language,
        language_code,
        is_generated: raw.kind.as_deref() == Some("asr"),
        is_translatable,
        translation_languages: if is_translatable {
            translation_languages.to_vec()
        } else {
            Vec::new()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::RawText;
    use crate::transport::stub::StubTransport;

    fn raw_track(code: &str, url: &str, generated: bool) -> RawCaptionTrack {
        RawCaptionTrack {
            base_url: Some(url.to_string()),
            name: Some(RawText {
                simple_text: Some(format!("{code} name")),
                runs: Vec::new(),
            }),
            language_code: Some(code.to_string()),
            kind: generated.then(|| "asr".to_string()),
            is_translatable: Some(true),
        }
    }

    fn catalog(tracks: Vec<RawCaptionTrack>) -> TranscriptCatalog {
        TranscriptCatalog::build(
            "vid",
            RawManifest {
                caption_tracks: tracks,
                translation_languages: vec![RawTranslationLanguage {
                    language_code: Some("de".to_string()),
                    language_name: Some(RawText {
                        simple_text: Some("German".to_string()),
                        runs: Vec::new(),
                    }),
                }],
            },
        )
        .unwrap()
    }

    #[test]
    fn manual_beats_generated_for_same_code() {
        let c = catalog(vec![
            raw_track("en", "U1-gen", true),
            raw_track("en", "U1", false),
        ]);
        let track = c.find_track(&["en"]).unwrap();
        assert_eq!(track.url(), "U1");
        assert!(!track.is_generated());
    }

    #[test]
    fn earlier_code_beats_manual_track_of_later_code() {
        let c = catalog(vec![
            raw_track("en", "U-en", false),
            raw_track("fr", "U-fr", true),
        ]);
        let track = c.find_track(&["fr", "en"]).unwrap();
        assert_eq!(track.language_code(), "fr");
        assert!(track.is_generated());

        let c = catalog(vec![
            raw_track("en", "U-en", true),
            raw_track("de", "U-de", true),
        ]);
        assert_eq!(c.find_track(&["de", "en"]).unwrap().url(), "U-de");
    }

    #[test]
    fn empty_preference_never_matches() {
        let c = catalog(vec![raw_track("en", "U1", false)]);
        let none: [&str; 0] = [];
        assert!(matches!(
            c.find_track(&none),
            Err(TranscriptError::NoTranscriptFound { .. })
        ));
    }

    #[test]
    fn unmatched_codes_report_request() {
        let c = catalog(vec![raw_track("en", "U1", false)]);
        match c.find_track(&["ja", "ko"]) {
            Err(TranscriptError::NoTranscriptFound {
                video_id,
                requested,
            }) => {
                assert_eq!(video_id, "vid");
                assert_eq!(requested, vec!["ja", "ko"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn last_track_wins_within_a_partition() {
        let c = catalog(vec![
            raw_track("en", "first", false),
            raw_track("en", "second", false),
        ]);
        assert_eq!(c.manual_tracks().count(), 1);
        assert_eq!(c.find_track(&["en"]).unwrap().url(), "second");
    }

    #[test]
    fn partition_specific_search() {
        let c = catalog(vec![
            raw_track("en", "U-en", false),
            raw_track("en", "U-en-gen", true),
        ]);
        assert_eq!(c.find_generated_track(&["en"]).unwrap().url(), "U-en-gen");
        assert_eq!(c.find_manual_track(&["en"]).unwrap().url(), "U-en");
        assert!(c.find_manual_track(&["fr"]).is_err());
    }

    #[test]
    fn translation_availability() {
        let mut raw = raw_track("en", "U1", false);
        raw.is_translatable = None;
        let c = catalog(vec![raw, raw_track("fr", "U2", false)]);

        let en = c.find_track(&["en"]).unwrap();
        assert!(en.translation_languages().is_empty());
        assert!(matches!(
            en.translation_language("de"),
            Err(TranscriptError::NotTranslatable { .. })
        ));

        let fr = c.find_track(&["fr"]).unwrap();
        assert_eq!(fr.translation_language("de").unwrap().language, "German");
        assert!(matches!(
            fr.translation_language("ja"),
            Err(TranscriptError::NoTranscriptFound { .. })
        ));
        assert_eq!(c.translation_languages().len(), 1);
    }

    #[test]
    fn missing_required_field_is_reported() {
        let mut raw = raw_track("en", "U1", false);
        raw.base_url = None;
        let manifest = RawManifest {
            caption_tracks: vec![raw],
            translation_languages: Vec::new(),
        };
        let err = TranscriptCatalog::build("vid", manifest).unwrap_err();
        assert!(matches!(
            err,
            TranscriptError::MalformedManifest { field: "baseUrl" }
        ));
    }

    #[test]
    fn display_lists_partitions() {
        let c = catalog(vec![raw_track("en", "U1", false)]);
        let text = c.to_string();
        assert!(text.contains("(MANUALLY CREATED)\n - en (\"en name\")[TRANSLATABLE]"));
        assert!(text.contains("(GENERATED)\nNone"));
        assert!(text.contains(" - de (\"German\")"));
    }

    #[tokio::test]
    async fn fetch_sends_accept_language_and_parses() {
        let c = catalog(vec![raw_track("en", "https://example.com/t", false)]);
        let transport = StubTransport::new().respond(
            200,
            r#"<transcript><text start="0.5" dur="2.3">Hello &amp; welcome</text></transcript>"#,
        );
        let segments = c
            .find_track(&["en"])
            .unwrap()
            .fetch(&transport, "en-US", false)
            .await
            .unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Hello & welcome");
        let requests = transport.recorded();
        assert_eq!(requests[0].url, "https://example.com/t");
        assert_eq!(requests[0].header_value("Accept-Language"), Some("en-US"));
    }

    #[tokio::test]
    async fn fetch_rejects_non_200() {
        let c = catalog(vec![raw_track("en", "https://example.com/t", false)]);
        let transport = StubTransport::new().respond(429, "slow down");
        let err = c
            .find_track(&["en"])
            .unwrap()
            .fetch(&transport, "en-US", false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TranscriptError::PlatformRequestFailed { status: 429, .. }
        ));
        assert_eq!(transport.recorded().len(), 1);
    }

    #[tokio::test]
    async fn fetch_wraps_parse_errors() {
        let c = catalog(vec![raw_track("en", "https://example.com/t", false)]);
        let transport = StubTransport::new()
            .respond(200, r#"<transcript><text start="abc" dur="1">x</text></transcript>"#);
        let err = c
            .find_track(&["en"])
            .unwrap()
            .fetch(&transport, "en-US", false)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::ParseDocument));
    }
}
