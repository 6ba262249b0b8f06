//! Parser for the timed-text caption document.
//!
//! The document is a root element holding `<text start=".." dur="..">`
//! children. Character content is HTML-escaped once and may contain real
//! inline markup. Escaped text is decoded a single time; real markup is kept
//! as tags and, unless formatting is preserved, the formatting tags among
//! them are stripped. Escaped angle brackets therefore survive as visible
//! text and are never mistaken for formatting.

use crate::formatting::strip_formatting;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::num::ParseFloatError;
use std::str::Utf8Error;
use thiserror::Error;
use tracing::trace;

/// One timestamped unit of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),

    #[error("caption text is not UTF-8: {0}")]
    Utf8(#[from] Utf8Error),

    #[error("invalid `{attribute}` value {value:?}: {source}")]
    InvalidNumber {
        attribute: &'static str,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("document ended inside an open element")]
    Truncated,

    #[error("document has no root element")]
    MissingRoot,

    #[error("content outside the root element")]
    OutsideRoot,
}

/// Piece of a `text` element's content.
enum Piece {
    Text(String),
    Markup(String),
}

/// Parse a caption document into segments in document order.
pub fn parse(document: &[u8], preserve_formatting: bool) -> Result<Vec<Segment>, ParseError> {
    let mut reader = Reader::from_reader(document);
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut root_closed = false;
    // Timing and collected content of the `text` element being read.
    let mut current: Option<(f64, f64, Vec<Piece>)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if root_closed {
                    return Err(ParseError::OutsideRoot);
                }
                depth += 1;
                seen_root = true;
                if let Some((_, _, pieces)) = current.as_mut() {
                    pieces.push(Piece::Markup(format!("<{}>", std::str::from_utf8(&e)?)));
                } else if depth == 2 && e.name().as_ref() == b"text" {
                    let (start, duration) = timing(&e)?;
                    current = Some((start, duration, Vec::new()));
                }
            }
            Event::End(e) => {
                if depth == 2 {
                    if let Some((start, duration, pieces)) = current.take() {
                        segments.push(Segment {
                            text: assemble(pieces, preserve_formatting),
                            start,
                            duration,
                        });
                    }
                } else if let Some((_, _, pieces)) = current.as_mut() {
                    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
                    pieces.push(Piece::Markup(format!("</{name}>")));
                }
                depth = depth.saturating_sub(1);
                root_closed = depth == 0;
            }
            Event::Empty(e) => {
                if root_closed {
                    return Err(ParseError::OutsideRoot);
                }
                seen_root = true;
                if depth == 0 {
                    root_closed = true;
                } else if let Some((_, _, pieces)) = current.as_mut() {
                    pieces.push(Piece::Markup(format!("<{}/>", std::str::from_utf8(&e)?)));
                } else if depth == 1 && e.name().as_ref() == b"text" {
                    let (start, duration) = timing(&e)?;
                    segments.push(Segment {
                        text: String::new(),
                        start,
                        duration,
                    });
                }
            }
            Event::Text(e) => {
                let raw = std::str::from_utf8(&e)?;
                if depth == 0 && !raw.trim().is_empty() {
                    return Err(ParseError::OutsideRoot);
                }
                if let Some((_, _, pieces)) = current.as_mut() {
                    pieces.push(Piece::Text(
                        html_escape::decode_html_entities(raw).into_owned(),
                    ));
                }
            }
            Event::CData(e) => {
                if depth == 0 {
                    return Err(ParseError::OutsideRoot);
                }
                if let Some((_, _, pieces)) = current.as_mut() {
                    pieces.push(Piece::Text(std::str::from_utf8(&e)?.to_string()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(ParseError::Truncated);
    }
    if !seen_root {
        return Err(ParseError::MissingRoot);
    }
    trace!("parsed {} segments", segments.len());
    Ok(segments)
}

/// Read `start` and `dur`; a missing attribute counts as zero.
fn timing(element: &BytesStart<'_>) -> Result<(f64, f64), ParseError> {
    let mut start = 0.0;
    let mut duration = 0.0;
    for attr in element.attributes() {
        let attr = attr?;
        let name = match attr.key.as_ref() {
            b"start" => "start",
            b"dur" => "dur",
            _ => continue,
        };
        let value = attr.unescape_value()?;
        let parsed = value
            .trim()
            .parse::<f64>()
            .map_err(|source| ParseError::InvalidNumber {
                attribute: name,
                value: value.to_string(),
                source,
            })?;
        if name == "start" {
            start = parsed;
        } else {
            duration = parsed;
        }
    }
    Ok((start, duration))
}

fn assemble(pieces: Vec<Piece>, preserve_formatting: bool) -> String {
    let mut text = String::new();
    for piece in pieces {
        match piece {
            Piece::Text(t) => text.push_str(&t),
            Piece::Markup(m) if preserve_formatting => text.push_str(&m),
            Piece::Markup(m) => text.push_str(&strip_formatting(&m)),
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(doc: &str, preserve: bool) -> Result<Vec<Segment>, ParseError> {
        parse(doc.as_bytes(), preserve)
    }

    #[test]
    fn parses_single_segment_with_entity() {
        let doc = r#"<transcript><text start="0.5" dur="2.3">Hello &amp; welcome</text></transcript>"#;
        let segments = parse_str(doc, false).unwrap();
        assert_eq!(
            segments,
            vec![Segment {
                text: "Hello & welcome".to_string(),
                start: 0.5,
                duration: 2.3,
            }]
        );
    }

    #[test]
    fn keeps_document_order_and_count() {
        let doc = r#"<?xml version="1.0" encoding="utf-8" ?>
<transcript>
    <text start="0.21" dur="2.34">one</text>
    <text start="2.55" dur="1.5">two</text>
    <text start="4.05" dur="1">three</text>
</transcript>"#;
        let segments = parse_str(doc, false).unwrap();
        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, ["one", "two", "three"]);
        assert_eq!(segments[2].start, 4.05);
        assert_eq!(segments[2].duration, 1.0);
    }

    #[test]
    fn strips_real_formatting_markup() {
        let doc = r#"<transcript><text start="1" dur="1"><strong>hi</strong> there</text></transcript>"#;
        assert_eq!(parse_str(doc, false).unwrap()[0].text, "hi there");
        assert_eq!(
            parse_str(doc, true).unwrap()[0].text,
            "<strong>hi</strong> there"
        );
    }

    #[test]
    fn non_formatting_markup_survives_stripping() {
        let doc = r#"<transcript><text start="1" dur="1"><i>a</i><font color="red">b</font></text></transcript>"#;
        assert_eq!(
            parse_str(doc, false).unwrap()[0].text,
            r#"a<font color="red">b</font>"#
        );
    }

    #[test]
    fn escaped_tags_are_text_not_formatting() {
        let doc = r#"<transcript><text start="0" dur="1">&lt;strong&gt;x&lt;/strong&gt;</text></transcript>"#;
        assert_eq!(parse_str(doc, false).unwrap()[0].text, "<strong>x</strong>");
    }

    #[test]
    fn unescapes_exactly_once() {
        let doc = r#"<transcript><text start="0" dur="1">&amp;amp; it&#39;s</text></transcript>"#;
        assert_eq!(parse_str(doc, false).unwrap()[0].text, "&amp; it's");
    }

    #[test]
    fn missing_timing_defaults_to_zero() {
        let doc = r#"<transcript><text>no timing</text><text start="3"/></transcript>"#;
        let segments = parse_str(doc, false).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!((segments[0].start, segments[0].duration), (0.0, 0.0));
        assert_eq!((segments[1].start, segments[1].duration), (3.0, 0.0));
        assert_eq!(segments[1].text, "");
    }

    #[test]
    fn ignores_non_text_children() {
        let doc = r#"<transcript><head><text start="9" dur="9">nested</text></head><p>x</p><text start="1" dur="2">kept</text></transcript>"#;
        let segments = parse_str(doc, false).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "kept");
    }

    #[test]
    fn malformed_number_fails_whole_parse() {
        let doc = r#"<transcript><text start="1" dur="1">ok</text><text start="abc" dur="1">bad</text></transcript>"#;
        let err = parse_str(doc, false).unwrap_err();
        match err {
            ParseError::InvalidNumber {
                attribute, value, ..
            } => {
                assert_eq!(attribute, "start");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_str("<transcript><text start=\"1\">x</p></transcript>", false).is_err());
        assert!(parse_str("<transcript><text start=\"1\">x</text>", false).is_err());
        assert!(matches!(parse_str("", false), Err(ParseError::MissingRoot)));
    }

    #[test]
    fn only_the_root_element_is_read() {
        let doc = r#"<a><text start="0" dur="1">x</text></a><b><text start="1" dur="1">y</text></b>"#;
        assert!(matches!(parse_str(doc, false), Err(ParseError::OutsideRoot)));

        let doc = r#"<transcript><text start="0" dur="1">x</text></transcript><extra/>"#;
        assert!(matches!(parse_str(doc, false), Err(ParseError::OutsideRoot)));

        let doc = "<transcript/>trailing";
        assert!(matches!(parse_str(doc, false), Err(ParseError::OutsideRoot)));
    }

    #[test]
    fn whitespace_around_the_root_is_fine() {
        let doc = "\n<transcript><text start=\"1\" dur=\"1\">x</text></transcript>\n";
        assert_eq!(parse_str(doc, false).unwrap().len(), 1);
    }

    #[test]
    fn empty_transcript_has_no_segments() {
        assert!(parse_str("<transcript></transcript>", false)
            .unwrap()
            .is_empty());
        assert!(parse_str("<transcript/>", false).unwrap().is_empty());
    }
}
