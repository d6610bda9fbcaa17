//! One line of a `.gcov` artifact.
//!
//! Lines look like `execMark:lineNumber:text`. Metadata hides behind a
//! `-:0:` prefix and carries `tag:value`; anything that does not split
//! into three fields passes through untouched.

use crate::CovError;
use std::fmt;

/// Execution mark used in front of metadata records
const INFO_MARK: &str = "-";
const EXEC_WIDTH: usize = 9;
const LINE_WIDTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverageRecord {
    /// `-:0:tag:value` metadata
    Info { tag: String, value: String },
    /// An annotated source line. `exec_mark` is kept as text: it may be a
    /// count, `-`, `#####` or any other marker the producer chose.
    Text {
        exec_mark: String,
        line_number: u32,
        text: String,
    },
    /// Anything else, kept byte for byte
    Raw(String),
}

impl CoverageRecord {
    pub fn info(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Info {
            tag: tag.into(),
            value: value.into(),
        }
    }

    /// Parse one line (without its line terminator)
    pub fn parse(line: &str) -> crate::Result<Self> {
        let fields: Vec<&str> = line.splitn(3, ':').collect();
        if fields.len() < 3 {
            return Ok(Self::Raw(line.to_string()));
        }

        let exec_mark = fields[0].trim();
        let number = fields[1].trim();

        if exec_mark == INFO_MARK && number == "0" {
            return Self::parse_info(fields[2]);
        }

        let line_number = number.parse::<u32>().map_err(|_| {
            CovError::format("line", format!("invalid line number '{}'", number))
        })?;

        // Source text keeps its indentation
        Ok(Self::Text {
            exec_mark: exec_mark.to_string(),
            line_number,
            text: fields[2].to_string(),
        })
    }

    fn parse_info(body: &str) -> crate::Result<Self> {
        match body.split_once(':') {
            Some((tag, value)) => Ok(Self::info(tag.trim(), value.trim())),
            None => Err(CovError::format(
                "line",
                format!("metadata '{}' is not of the form tag:value", body),
            )),
        }
    }

    pub fn is_info(&self) -> bool {
        matches!(self, Self::Info { .. })
    }
}

impl fmt::Display for CoverageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info { tag, value } => write!(
                f,
                "{:>ew$}:{:>lw$}:{}:{}",
                INFO_MARK,
                0,
                tag,
                value,
                ew = EXEC_WIDTH,
                lw = LINE_WIDTH
            ),
            Self::Text {
                exec_mark,
                line_number,
                text,
            } => write!(
                f,
                "{:>ew$}:{:>lw$}:{}",
                exec_mark,
                line_number,
                text,
                ew = EXEC_WIDTH,
                lw = LINE_WIDTH
            ),
            Self::Raw(line) => f.write_str(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_info() {
        let rec = CoverageRecord::parse("-:0:Source:/opt/install/src/foo.c").unwrap();
        assert_eq!(rec, CoverageRecord::info("Source", "/opt/install/src/foo.c"));
        assert_eq!(
            rec.to_string(),
            "        -:     0:Source:/opt/install/src/foo.c"
        );
    }

    #[test]
    fn test_parse_padded_info() {
        let rec = CoverageRecord::parse("        -:    0:Runs:3").unwrap();
        assert_eq!(rec, CoverageRecord::info("Runs", "3"));
    }

    #[test]
    fn test_info_value_may_contain_colons() {
        let rec = CoverageRecord::parse("-:0:Source:C:/src/foo.c").unwrap();
        assert_eq!(rec, CoverageRecord::info("Source", "C:/src/foo.c"));
    }

    #[test]
    fn test_parse_text_keeps_indentation() {
        let rec = CoverageRecord::parse("        5:    12:    return x;").unwrap();
        assert_eq!(
            rec,
            CoverageRecord::Text {
                exec_mark: "5".to_string(),
                line_number: 12,
                text: "    return x;".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_unexecuted_marks() {
        let rec = CoverageRecord::parse("    #####:    7:  abort();").unwrap();
        match rec {
            CoverageRecord::Text { exec_mark, .. } => assert_eq!(exec_mark, "#####"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_text_may_contain_colons() {
        let line = "        1:     3:label: goto label;";
        let rec = CoverageRecord::parse(line).unwrap();
        assert_eq!(rec.to_string(), line);
    }

    #[test]
    fn test_raw_lines() {
        for line in ["", "function main called 1 returned 100%", "branch  0 taken 1"] {
            let rec = CoverageRecord::parse(line).unwrap();
            assert_eq!(rec, CoverageRecord::Raw(line.to_string()));
            assert_eq!(rec.to_string(), line);
        }
    }

    #[test]
    fn test_bad_metadata_is_format_error() {
        let err = CoverageRecord::parse("-:0:nocolon").unwrap_err();
        assert!(matches!(err, CovError::Format { .. }));
    }

    #[test]
    fn test_bad_line_number_is_format_error() {
        let err = CoverageRecord::parse("1:abc:text").unwrap_err();
        assert!(matches!(err, CovError::Format { .. }));
    }

    proptest! {
        #[test]
        fn prop_emitted_lines_round_trip(
            mark in "([0-9]{1,9}|-|#####|=====)",
            line_number in 0u32..1_000_000,
            text in "[ -~]{0,60}",
        ) {
            let rec = if mark == "-" && line_number == 0 {
                CoverageRecord::info("Source", text.trim().replace(':', "_"))
            } else {
                CoverageRecord::Text { exec_mark: mark, line_number, text }
            };
            let emitted = rec.to_string();
            let reparsed = CoverageRecord::parse(&emitted).unwrap();
            prop_assert_eq!(reparsed.to_string(), emitted);
        }
    }
}
