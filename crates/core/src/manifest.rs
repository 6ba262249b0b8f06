//! Locating the caption manifest embedded in the video watch page.
//!
//! The watch page is not an API: the manifest is a JSON literal inlined in a
//! script, found by splitting on literal markers. Everything that depends on
//! the page layout lives here so the catalog and parser never see HTML.

use crate::config::ClientConfig;
use crate::error::{Result, Stage, TranscriptError};
use crate::session::Session;
use crate::transport::{HttpRequest, Transport};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::{debug, info, trace};

const CAPTIONS_MARKER: &str = "\"captions\":";
const VIDEO_DETAILS_MARKER: &str = ",\"videoDetails";
const CONSENT_MARKER: &str = "action=\"https://consent.youtube.com/s\"";
const CAPTCHA_MARKER: &str = "class=\"g-recaptcha";
const PLAYABILITY_MARKER: &str = "\"playabilityStatus\":";

static CONSENT_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name="v" value="(.*?)""#).expect("consent token pattern is valid")
});

/// Display text as the platform encodes it: either `simpleText` or a list of
/// `runs` whose texts concatenate to the full string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawText {
    #[serde(rename = "simpleText")]
    pub simple_text: Option<String>,
    #[serde(default)]
    pub runs: Vec<RawRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRun {
    #[serde(default)]
    pub text: String,
}

impl RawText {
    pub fn text(&self) -> Option<String> {
        if let Some(t) = &self.simple_text {
            return Some(t.clone());
        }
        if self.runs.is_empty() {
            None
        } else {
            Some(self.runs.iter().map(|r| r.text.as_str()).collect())
        }
    }
}

/// One entry of `captionTracks`. Fields stay optional here; the catalog
/// validates them when it is built.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCaptionTrack {
    pub base_url: Option<String>,
    pub name: Option<RawText>,
    pub language_code: Option<String>,
    pub kind: Option<String>,
    pub is_translatable: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTranslationLanguage {
    pub language_code: Option<String>,
    pub language_name: Option<RawText>,
}

/// The `playerCaptionsTracklistRenderer` object, guaranteed to carry a
/// `captionTracks` list.
#[derive(Debug, Clone, Default)]
pub struct RawManifest {
    pub caption_tracks: Vec<RawCaptionTrack>,
    pub translation_languages: Vec<RawTranslationLanguage>,
}

#[derive(Deserialize)]
struct CaptionsJson {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    renderer: Option<RendererJson>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RendererJson {
    caption_tracks: Option<Vec<RawCaptionTrack>>,
    translation_languages: Option<Vec<RawTranslationLanguage>>,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

impl RendererJson {
    fn is_empty(&self) -> bool {
        self.caption_tracks.is_none() && self.translation_languages.is_none() && self.rest.is_empty()
    }
}

/// Fetches watch pages and pulls the caption manifest out of them.
pub struct ManifestExtractor<'a, T: Transport + ?Sized> {
    transport: &'a T,
    session: &'a Session,
    config: &'a ClientConfig,
}

impl<'a, T: Transport + ?Sized> ManifestExtractor<'a, T> {
    pub fn new(transport: &'a T, session: &'a Session, config: &'a ClientConfig) -> Self {
        Self {
            transport,
            session,
            config,
        }
    }

    pub async fn fetch(&self, video_id: &str) -> Result<RawManifest> {
        let html = self.fetch_video_html(video_id).await?;
        extract_manifest(&html, video_id)
    }

    /// Fetch the watch page, getting past the consent interstitial at most once.
    async fn fetch_video_html(&self, video_id: &str) -> Result<String> {
        let html = self.fetch_html(video_id).await?;
        if !html.contains(CONSENT_MARKER) {
            return Ok(html);
        }
        info!("consent page served for video {video_id}, setting consent cookie");
        let token = consent_token(&html)
            .ok_or_else(|| TranscriptError::ConsentCookieFailed(video_id.to_string()))?;
        self.session.set_cookie(
            "CONSENT",
            &format!("YES+{token}"),
            &self.config.consent_cookie_domain,
        );
        let html = self.fetch_html(video_id).await?;
        if html.contains(CONSENT_MARKER) {
            return Err(TranscriptError::ConsentCookieFailed(video_id.to_string()));
        }
        Ok(html)
    }

    async fn fetch_html(&self, video_id: &str) -> Result<String> {
        let url = watch_url(self.config, video_id)?;
        debug!("fetching watch page {url}");
        let mut request = HttpRequest::get(url).header("User-Agent", &self.config.user_agent);
        if let Some(cookie) = self.session.cookie_header(&request.url) {
            request = request.header("Cookie", cookie);
        }
        let resp = self
            .transport
            .get(&request)
            .await
            .map_err(|source| TranscriptError::Transport {
                stage: Stage::FetchWatchPage,
                source,
            })?;
        // The page body is classified below regardless of status: CAPTCHA and
        // unavailable pages are served with non-200 codes too.
        trace!(status = resp.status, "watch page fetched");
        Ok(resp.text())
    }
}

fn watch_url(config: &ClientConfig, video_id: &str) -> Result<String> {
    let url = url::Url::parse_with_params(&config.watch_url(), &[("v", video_id)]).map_err(
        |e| TranscriptError::Transport {
            stage: Stage::FetchWatchPage,
            source: Box::new(e),
        },
    )?;
    Ok(url.into())
}

fn consent_token(html: &str) -> Option<&str> {
    CONSENT_TOKEN_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Split the manifest JSON out of a watch page and validate its outer shape.
pub fn extract_manifest(html: &str, video_id: &str) -> Result<RawManifest> {
    let Some((_, after)) = html.split_once(CAPTIONS_MARKER) else {
        return Err(classify_missing_captions(html, video_id));
    };
    let json = after
        .split_once(VIDEO_DETAILS_MARKER)
        .map_or(after, |(before, _)| before)
        .replace('\n', "");

    let captions: CaptionsJson =
        serde_json::from_str(&json).map_err(TranscriptError::ManifestJson)?;
    let renderer = match captions.renderer {
        Some(r) if !r.is_empty() => r,
        _ => return Err(TranscriptError::TranscriptDisabled(video_id.to_string())),
    };
    let Some(caption_tracks) = renderer.caption_tracks else {
        return Err(TranscriptError::NoTranscriptFound {
            video_id: video_id.to_string(),
            requested: Vec::new(),
        });
    };
    debug!(
        tracks = caption_tracks.len(),
        "extracted caption manifest for video {video_id}"
    );
    Ok(RawManifest {
        caption_tracks,
        translation_languages: renderer.translation_languages.unwrap_or_default(),
    })
}

fn classify_missing_captions(html: &str, video_id: &str) -> TranscriptError {
    if video_id.starts_with("http://") || video_id.starts_with("https://") {
        TranscriptError::InvalidVideoId(video_id.to_string())
    } else if html.contains(CAPTCHA_MARKER) {
        TranscriptError::TooManyRequests(video_id.to_string())
    } else if !html.contains(PLAYABILITY_MARKER) {
        TranscriptError::VideoUnavailable(video_id.to_string())
    } else {
        TranscriptError::TranscriptDisabled(video_id.to_string())
    }
}
