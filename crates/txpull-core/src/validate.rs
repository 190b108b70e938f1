//! Download validation: size floor plus a shallow CSV parse check.
//!
//! The shallow check reads only a bounded prefix of the file to detect gross
//! corruption (truncation, binary junk, ragged rows) without doing full
//! schema validation.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Why a downloaded file was rejected. The caller decides on cleanup.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// File size is below the configured floor; likely an incomplete download.
    #[error("file is {size} bytes, below the {min}-byte minimum; likely incomplete")]
    TooSmall { size: u64, min: u64 },
    /// The row prefix does not parse as CSV.
    #[error("malformed content at line {line}: {reason}")]
    MalformedContent { line: usize, reason: String },
    /// I/O failure while reading the file back.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Validates a downloaded file: size floor first, then a shallow parse of the
/// first `preview_rows` CSV lines.
pub fn validate_file(
    path: &Path,
    min_bytes: u64,
    preview_rows: usize,
) -> Result<(), ValidationError> {
    let size = fs::metadata(path)?.len();
    if size < min_bytes {
        return Err(ValidationError::TooSmall {
            size,
            min: min_bytes,
        });
    }
    shallow_csv_check(path, preview_rows)
}

/// Reads up to `rows` lines and checks they look like consistent CSV: valid
/// UTF-8, balanced quotes, and a stable field count.
fn shallow_csv_check(path: &Path, rows: usize) -> Result<(), ValidationError> {
    let mut reader = BufReader::new(fs::File::open(path)?);
    let mut line = String::new();
    let mut header_fields = None;

    for line_no in 1..=rows {
        line.clear();
        let n = match reader.read_line(&mut line) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Err(ValidationError::MalformedContent {
                    line: line_no,
                    reason: "not valid UTF-8".to_string(),
                });
            }
            Err(e) => return Err(ValidationError::Io(e)),
        };
        if n == 0 {
            if line_no == 1 {
                return Err(ValidationError::MalformedContent {
                    line: 1,
                    reason: "file is empty".to_string(),
                });
            }
            break;
        }

        let record = line.trim_end_matches(|c| c == '\n' || c == '\r');
        let fields =
            count_fields(record).map_err(|reason| ValidationError::MalformedContent {
                line: line_no,
                reason,
            })?;
        match header_fields {
            None => header_fields = Some(fields),
            Some(expected) if fields != expected => {
                return Err(ValidationError::MalformedContent {
                    line: line_no,
                    reason: format!("expected {expected} fields, found {fields}"),
                });
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// Quote-aware field count for a single CSV record. `""` escapes a quote
/// inside a quoted field. A quote left open at end of record is an error;
/// the shallow check does not follow multi-line quoted fields.
fn count_fields(record: &str) -> Result<usize, String> {
    let mut fields = 1usize;
    let mut in_quotes = false;
    let mut chars = record.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields += 1,
            _ => {}
        }
    }

    if in_quotes {
        Err("unterminated quoted field".to_string())
    } else {
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn valid_csv_passes() {
        let f = write_temp(b"id,merchant,amount\n1,\"Acme, Inc\",9.99\n2,Beta,1.50\n");
        assert!(validate_file(f.path(), 0, 5).is_ok());
    }

    #[test]
    fn small_file_is_too_small() {
        let f = write_temp(b"id,amount\n1,2\n");
        match validate_file(f.path(), 100 * 1024, 5) {
            Err(ValidationError::TooSmall { size, min }) => {
                assert_eq!(size, 14);
                assert_eq!(min, 100 * 1024);
            }
            other => panic!("expected TooSmall, got {:?}", other),
        }
    }

    #[test]
    fn size_check_runs_before_parse_check() {
        // garbage content, but the size floor trips first
        let f = write_temp(b"\"unterminated\n");
        assert!(matches!(
            validate_file(f.path(), 100 * 1024, 5),
            Err(ValidationError::TooSmall { .. })
        ));
    }

    #[test]
    fn ragged_row_is_malformed() {
        let f = write_temp(b"a,b,c\n1,2,3,4\n");
        match validate_file(f.path(), 0, 5) {
            Err(ValidationError::MalformedContent { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("expected 3 fields"));
            }
            other => panic!("expected MalformedContent, got {:?}", other),
        }
    }

    #[test]
    fn ragged_row_past_preview_is_not_seen() {
        let f = write_temp(b"a,b\n1,2\n3,4\n5,6\n7,8\n9,10,11\n");
        assert!(validate_file(f.path(), 0, 5).is_ok());
    }

    #[test]
    fn unterminated_quote_is_malformed() {
        let f = write_temp(b"a,b\n1,\"oops\n");
        match validate_file(f.path(), 0, 5) {
            Err(ValidationError::MalformedContent { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("unterminated"));
            }
            other => panic!("expected MalformedContent, got {:?}", other),
        }
    }

    #[test]
    fn empty_file_is_malformed() {
        let f = write_temp(b"");
        assert!(matches!(
            validate_file(f.path(), 0, 5),
            Err(ValidationError::MalformedContent { line: 1, .. })
        ));
    }

    #[test]
    fn non_utf8_is_malformed() {
        let f = write_temp(&[0xff, 0xfe, 0x00, 0x01, b'\n']);
        assert!(matches!(
            validate_file(f.path(), 0, 5),
            Err(ValidationError::MalformedContent { .. })
        ));
    }

    #[test]
    fn quoted_commas_and_escaped_quotes_count_as_one_field() {
        assert_eq!(count_fields(r#"1,"Acme, Inc",9.99"#), Ok(3));
        assert_eq!(count_fields(r#""say ""hi"", ok",2"#), Ok(2));
        assert_eq!(count_fields(""), Ok(1));
    }
}
