//! Code-cell extraction.
//!
//! Cells are fenced code blocks inside message content. The grammar keeps
//! fenced regions opaque during sectioning; this module re-reads a
//! message's content and pulls the cells out on demand. Execution is the
//! caller's concern — cells are identified positionally.

use chatmd_core::CodeCell;

use crate::segment::{LineIter, fence_closes, fence_open_len};

/// Marker suffix on a fence info string that requests evaluation.
const EVAL_MARKER: &str = ".eval";

/// Extract all fenced code cells from message content, in order.
///
/// A cell whose closing fence is missing at end of content is returned
/// with `truncated` set and its body running to the end.
#[must_use]
pub fn extract_code_cells(content: &str) -> Vec<CodeCell> {
    let mut cells = Vec::new();
    let mut open: Option<OpenCell> = None;

    for line in LineIter::new(content) {
        match open.take() {
            Some(cell) => {
                if fence_closes(line.text, cell.fence_len) {
                    let body = trim_final_newline(&content[cell.body_start..line.start]);
                    cells.push(cell.finish(body, false));
                } else {
                    open = Some(cell);
                }
            }
            None => {
                if let Some(fence_len) = fence_open_len(line.text) {
                    let (language, eval) = parse_info_string(&line.text[fence_len..]);
                    open = Some(OpenCell {
                        fence_len,
                        language,
                        eval,
                        body_start: line.next_start,
                    });
                }
            }
        }
    }

    if let Some(cell) = open {
        let body = content[cell.body_start..].to_owned();
        cells.push(cell.finish(body, true));
    }

    cells
}

struct OpenCell {
    fence_len: usize,
    language: String,
    eval: bool,
    body_start: usize,
}

impl OpenCell {
    fn finish(&self, body: impl Into<String>, truncated: bool) -> CodeCell {
        CodeCell {
            language: self.language.clone(),
            eval: self.eval,
            body: body.into(),
            truncated,
        }
    }
}

/// Split a fence info string into language and eval marker.
fn parse_info_string(info: &str) -> (String, bool) {
    let info = info.trim();
    if let Some(language) = info.strip_suffix(EVAL_MARKER) {
        let language = language.trim_end();
        // Bare `.eval` means an unnamed evaluable cell.
        return (language.to_owned(), true);
    }
    (info.to_owned(), false)
}

/// Drop the single newline that separates the body from the closing fence.
fn trim_final_newline(body: &str) -> String {
    body.strip_suffix('\n')
        .map_or(body, |s| s.strip_suffix('\r').unwrap_or(s))
        .to_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_cell_with_language_and_eval() {
        let cells = extract_code_cells("before\n```python .eval\nprint(1)\n```\nafter\n");
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].language, "python");
        assert!(cells[0].eval);
        assert_eq!(cells[0].body, "print(1)");
        assert!(!cells[0].truncated);
    }

    #[test]
    fn display_only_cell() {
        let cells = extract_code_cells("```rust\nfn main() {}\n```\n");
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].language, "rust");
        assert!(!cells[0].eval);
    }

    #[test]
    fn bare_eval_marker_has_empty_language() {
        let cells = extract_code_cells("```.eval\nx = 1\n```\n");
        assert_eq!(cells[0].language, "");
        assert!(cells[0].eval);
    }

    #[test]
    fn unterminated_cell_is_truncated() {
        let cells = extract_code_cells("```python .eval\nwhile True:\n    pass\n");
        assert_eq!(cells.len(), 1);
        assert!(cells[0].truncated);
        assert_eq!(cells[0].body, "while True:\n    pass\n");
    }

    #[test]
    fn nested_shorter_fence_stays_inside() {
        let content = "````markdown\n```python\nprint(1)\n```\n````\n";
        let cells = extract_code_cells(content);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].language, "markdown");
        assert_eq!(cells[0].body, "```python\nprint(1)\n```");
    }

    #[test]
    fn multiple_cells_in_order() {
        let content = "```a\n1\n```\ntext\n```b .eval\n2\n```\n";
        let cells = extract_code_cells(content);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].language, "a");
        assert_eq!(cells[1].language, "b");
        assert!(cells[1].eval);
    }

    #[test]
    fn body_is_byte_exact_with_blank_lines() {
        let cells = extract_code_cells("```python\n\nx = 1\n\n```\n");
        assert_eq!(cells[0].body, "\nx = 1\n");
    }

    #[test]
    fn no_cells() {
        assert!(extract_code_cells("just text\n").is_empty());
    }
}
