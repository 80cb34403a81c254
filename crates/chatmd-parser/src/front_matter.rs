//! Front-matter splitting.
//!
//! A document may open with a `---`-delimited YAML block. The splitter
//! detects it, parses the YAML into an ordered mapping, and returns the
//! remaining body untouched. At most one block is recognized and only at
//! the very start of the document.

use chatmd_core::FrontMatter;
use serde_yaml::{Mapping, Value};

use crate::errors::{ParseError, Result};

const DELIMITER: &str = "---";

/// Split a document into front matter and body.
///
/// A document without a leading delimiter line, or with an unterminated
/// block, has no front matter: the whole input is the body.
///
/// # Errors
///
/// Returns [`ParseError::FrontMatter`] when the delimited block is not
/// valid YAML or does not parse to a mapping.
pub fn split_front_matter(input: &str) -> Result<(FrontMatter, &str)> {
    let Some(yaml_start) = leading_delimiter_end(input) else {
        return Ok((FrontMatter::empty(), input));
    };

    // Find the closing delimiter line.
    let mut pos = yaml_start;
    while pos <= input.len() {
        let line_end = input[pos..]
            .find('\n')
            .map_or(input.len(), |i| pos + i);
        if input[pos..line_end].trim_end_matches('\r') == DELIMITER {
            let yaml = &input[yaml_start..pos];
            let body_start = (line_end + 1).min(input.len());
            return Ok((parse_yaml(yaml)?, &input[body_start..]));
        }
        if line_end == input.len() {
            break;
        }
        pos = line_end + 1;
    }

    // Unterminated block: not front matter.
    Ok((FrontMatter::empty(), input))
}

/// Byte offset just past the opening `---` line, when the input starts
/// with one.
fn leading_delimiter_end(input: &str) -> Option<usize> {
    let line_end = input.find('\n')?;
    if input[..line_end].trim_end_matches('\r') == DELIMITER {
        Some(line_end + 1)
    } else {
        None
    }
}

fn parse_yaml(yaml: &str) -> Result<FrontMatter> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::empty());
    }
    let value: Value =
        serde_yaml::from_str(yaml).map_err(|source| ParseError::FrontMatter { source })?;
    match value {
        Value::Null => Ok(FrontMatter::empty()),
        Value::Mapping(mapping) => Ok(FrontMatter::new(mapping)),
        other => {
            // A scalar or sequence at the top level is not a front matter
            // shape; produce the same error kind as malformed YAML.
            let source = serde_yaml::from_value::<Mapping>(other)
                .expect_err("non-mapping value cannot deserialize to a mapping");
            Err(ParseError::FrontMatter { source })
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn document_without_front_matter() {
        let input = "**user** Hello\n";
        let (fm, body) = split_front_matter(input).unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, input);
    }

    #[test]
    fn splits_leading_block_and_leaves_body_untouched() {
        let input = "---\nsystem: Be helpful.\n---\n**user** Hi\n";
        let (fm, body) = split_front_matter(input).unwrap();
        assert_eq!(fm.system(), Some("Be helpful."));
        assert_eq!(body, "**user** Hi\n");
    }

    #[test]
    fn empty_block() {
        let (fm, body) = split_front_matter("---\n---\nbody\n").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, "body\n");
    }

    #[test]
    fn delimiter_must_be_on_first_line() {
        let input = "\n---\nsystem: x\n---\n";
        let (fm, body) = split_front_matter(input).unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, input);
    }

    #[test]
    fn unterminated_block_is_body() {
        let input = "---\nsystem: x\nno closing delimiter\n";
        let (fm, body) = split_front_matter(input).unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, input);
    }

    #[test]
    fn malformed_yaml_fails_the_parse() {
        let err = split_front_matter("---\nsystem: [unclosed\n---\n").unwrap_err();
        assert_matches!(err, ParseError::FrontMatter { .. });
    }

    #[test]
    fn non_mapping_yaml_fails_the_parse() {
        let err = split_front_matter("---\n- just\n- a list\n---\n").unwrap_err();
        assert_matches!(err, ParseError::FrontMatter { .. });
    }

    #[test]
    fn crlf_delimiters() {
        let input = "---\r\nsystem: x\r\n---\r\nbody";
        let (fm, body) = split_front_matter(input).unwrap();
        assert_eq!(fm.system(), Some("x"));
        assert_eq!(body, "body");
    }

    #[test]
    fn later_dashes_do_not_start_front_matter() {
        let input = "**user** thematic break below\n\n---\n\nmore\n";
        let (fm, body) = split_front_matter(input).unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, input);
    }
}
