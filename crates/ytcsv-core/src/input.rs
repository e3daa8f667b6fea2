//! Song list parsing
//!
//! Input is semicolon-delimited text, one song per line: `Song;Artist` or just
//! `Song`. Fields past the second are ignored.

use crate::error::InputError;
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, warn};

const DELIMITER: u8 = b';';
const QUOTE: char = '"';

/// One song to look up and download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub song: String,
    pub artist: Option<String>,
    /// 1-based line in the input file
    pub line: u64,
}

impl Record {
    pub fn new(song: impl Into<String>, artist: Option<String>) -> Self {
        Self {
            song: song.into(),
            artist,
            line: 0,
        }
    }

    /// Search query: song and artist joined by a space
    pub fn query(&self) -> String {
        match self.artist {
            Some(ref artist) => format!("{} {}", self.song, artist),
            None => self.song.clone(),
        }
    }
}

/// Read and parse a song list from disk
pub async fn read_records(path: &Path) -> Result<Vec<Record>, InputError> {
    let contents = tokio::fs::read(path)
        .await
        .map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let records = parse_records(&contents)?;
    debug!("Parsed {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Parse song list contents, preserving input order
pub fn parse_records(contents: &[u8]) -> Result<Vec<Record>, InputError> {
    check_quotes(contents)?;

    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(contents);

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|e| InputError::Parse {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            reason: e.to_string(),
        })?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        let song = row.get(0).map(str::trim).unwrap_or_default();
        if song.is_empty() {
            warn!("Skipping line {}: no song title", line);
            continue;
        }

        let artist = row
            .get(1)
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(String::from);

        records.push(Record {
            song: song.to_string(),
            artist,
            line,
        });
    }

    Ok(records)
}

/// Reject input with a quoted field that never closes.
///
/// The csv reader treats an unterminated quote as running to end of input,
/// which would silently fold the rest of the file into one field.
fn check_quotes(contents: &[u8]) -> Result<(), InputError> {
    let text = String::from_utf8_lossy(contents);

    let mut line = 1u64;
    let mut opened_at = None;
    let mut at_field_start = true;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match opened_at {
            Some(_) => {
                if c == QUOTE {
                    if chars.peek() == Some(&QUOTE) {
                        chars.next();
                    } else {
                        opened_at = None;
                    }
                } else if c == '\n' {
                    line += 1;
                }
            }
            None => {
                if c == QUOTE && at_field_start {
                    opened_at = Some(line);
                    at_field_start = false;
                    continue;
                }
                if c == '\n' {
                    line += 1;
                }
                at_field_start = c == '\n' || c == DELIMITER as char;
            }
        }
    }

    match opened_at {
        Some(line) => Err(InputError::Parse {
            line,
            reason: "unbalanced quote".to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_joins_song_and_artist() {
        let record = Record::new("Song", Some("Artist".into()));
        assert_eq!(record.query(), "Song Artist");

        let record = Record::new("Song", None);
        assert_eq!(record.query(), "Song");
    }

    #[test]
    fn test_parse_preserves_order() {
        let records = parse_records(b"A;X\nB;Y\nC\n").unwrap();
        let queries: Vec<_> = records.iter().map(Record::query).collect();
        assert_eq!(queries, ["A X", "B Y", "C"]);
        assert_eq!(records[2].line, 3);
    }

    #[test]
    fn test_extra_fields_ignored() {
        let records = parse_records(b"Hey Jude;The Beatles;1968;extra\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].song, "Hey Jude");
        assert_eq!(records[0].artist.as_deref(), Some("The Beatles"));
    }

    #[test]
    fn test_blank_and_empty_fields() {
        let records = parse_records(b"  Song One ; \n\n;Nobody\r\nSong Two;Band\r\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].song, "Song One");
        assert_eq!(records[0].artist, None);
        assert_eq!(records[1].song, "Song Two");
        assert_eq!(records[1].artist.as_deref(), Some("Band"));
    }

    #[test]
    fn test_quoted_fields() {
        let records = parse_records(b"\"Hello; Goodbye\";\"The \"\"Fab\"\" Four\"\n").unwrap();
        assert_eq!(records[0].song, "Hello; Goodbye");
        assert_eq!(records[0].artist.as_deref(), Some("The \"Fab\" Four"));
    }

    #[test]
    fn test_unbalanced_quote_is_error() {
        let err = parse_records(b"Fine;Artist\n\"Broken;Artist\nAnother;One\n").unwrap_err();
        match err {
            InputError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_utf8_is_error() {
        let err = parse_records(b"Song;\xff\xfe\n").unwrap_err();
        assert!(matches!(err, InputError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let err = read_records(Path::new("/nonexistent/songs.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, InputError::Read { .. }));
    }
}
