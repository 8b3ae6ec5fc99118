//! Header-only song file parser
//!
//! Stand-in for the host's structured-song parser. Reads the `#KEY:VALUE`
//! header block of an UltraStar-style text file and keeps the remaining lines
//! verbatim as the song body; the note grammar is not interpreted.

use crate::catalog::song::{ParseError, ParsedSong, SongIssue, SongMeta, SongParser};
use std::path::Path;

const KNOWN_TAGS: &[&str] = &[
    "ARTIST", "AUDIO", "AUTHOR", "BACKGROUND", "BPM", "CALCMEDLEY", "COMMENT", "COVER",
    "CREATOR", "DUETSINGERP1", "DUETSINGERP2", "EDITION", "ENCODING", "END", "GAP", "GENRE",
    "INSTRUMENTAL", "LANGUAGE", "MEDLEYENDBEAT", "MEDLEYSTARTBEAT", "MP3", "NOTESGAP", "P1",
    "P2", "PREVIEWSTART", "PROVIDEDBY", "RELATIVE", "RESOLUTION", "START", "TAGS", "TITLE",
    "VERSION", "VIDEO", "VIDEOGAP", "VOCALS", "YEAR",
];

/// End-of-song marker line
const END_MARKER: &str = "E";

#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderParser;

impl HeaderParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse song file content already in memory
    pub fn parse_str(&self, content: &str, path: &Path) -> Result<ParsedSong, ParseError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut song = SongMeta::default();
        let mut issues = Vec::new();
        let mut in_header = true;
        let mut saw_end_marker = false;

        for (index, raw_line) in content.lines().enumerate() {
            let line_number = index + 1;
            let line = raw_line.trim_end();

            if in_header {
                if line.is_empty() {
                    continue;
                }
                if let Some(tag_line) = line.strip_prefix('#') {
                    match tag_line.split_once(':') {
                        Some((key, value)) => {
                            let key = key.trim().to_uppercase();
                            if !KNOWN_TAGS.contains(&key.as_str()) {
                                issues.push(SongIssue::warning(
                                    format!("Unknown header tag #{}", key),
                                    Some(line_number),
                                ));
                            }
                            song.headers.insert(key, value.trim().to_string());
                        }
                        None => issues.push(SongIssue::warning(
                            format!("Malformed header line '{}'", line),
                            Some(line_number),
                        )),
                    }
                    continue;
                }
                in_header = false;
            }

            if line.trim() == END_MARKER {
                saw_end_marker = true;
                break;
            }
            song.body.push(line.to_string());
        }

        song.title = required_header(&song, "TITLE", path)?;
        song.artist = required_header(&song, "ARTIST", path)?;

        if song.body.is_empty() {
            issues.push(SongIssue::warning("Song has no body lines", None));
        }
        if !saw_end_marker {
            issues.push(SongIssue::warning("Missing end marker 'E'", None));
        }

        Ok(ParsedSong { song, issues })
    }
}

fn required_header(song: &SongMeta, tag: &str, path: &Path) -> Result<String, ParseError> {
    song.header(tag)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ParseError::MissingHeader {
            path: path.to_path_buf(),
            tag: tag.to_string(),
        })
}

impl SongParser for HeaderParser {
    fn parse_file(&self, path: &Path) -> Result<ParsedSong, ParseError> {
        let bytes = std::fs::read(path).map_err(|e| ParseError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let content = String::from_utf8(bytes).map_err(|e| ParseError::Invalid {
            path: path.to_path_buf(),
            message: format!("not valid UTF-8: {}", e),
        })?;
        self.parse_str(&content, path)
    }
}
