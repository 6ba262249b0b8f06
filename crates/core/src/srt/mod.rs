//! This module renders transcript segments as SRT subtitles.
//! Segment timing is in fractional seconds; SRT wants whole milliseconds.

use crate::parser::Segment;

/// Format segments as numbered SRT blocks.
/// The way this works is by writing each block sequentially with blank lines,
/// numbering from 1 and ending each cue at `start + duration`.
pub fn format(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        let start_ms = to_ms(segment.start);
        let end_ms = to_ms(segment.start + segment.duration);
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_time(start_ms),
            format_time(end_ms),
            segment.text
        ));
    }
    out
}

/// Seconds to milliseconds, rounding to the nearest and clamping negatives.
fn to_ms(seconds: f64) -> u64 {
    (seconds * 1000.0).round().max(0.0) as u64
}

/// Format milliseconds as `HH:MM:SS,mmm`.
fn format_time(ms: u64) -> String {
    let h = ms / 3_600_000;
    let m = (ms % 3_600_000) / 60_000;
    let s = (ms % 60_000) / 1000;
    let ms = ms % 1000;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}
