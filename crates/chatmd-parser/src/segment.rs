//! Segmentation primitives.
//!
//! The segmenter locates *candidate* section boundaries: line starts
//! beginning with `**` (message headers) or `###### ` (execution headers).
//! Candidates are not validated here — the grammar parser decides whether a
//! candidate is a real header, and skips candidates that fall inside fenced
//! code regions, which it tracks by fence length.

/// A line of the body with its byte span.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Line<'a> {
    /// Byte offset of the line start.
    pub start: usize,
    /// Byte offset of the next line start (past this line's newline).
    pub next_start: usize,
    /// Line text without the trailing newline.
    pub text: &'a str,
    /// 1-based line number.
    pub number: usize,
}

/// Iterator over body lines with byte offsets.
pub(crate) struct LineIter<'a> {
    body: &'a str,
    pos: usize,
    number: usize,
}

impl<'a> LineIter<'a> {
    pub(crate) fn new(body: &'a str) -> Self {
        Self { body, pos: 0, number: 0 }
    }
}

impl<'a> Iterator for LineIter<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Line<'a>> {
        if self.pos >= self.body.len() {
            return None;
        }
        let start = self.pos;
        let rest = &self.body[start..];
        let (text_len, next_start) = match rest.find('\n') {
            Some(i) => (i, start + i + 1),
            None => (rest.len(), self.body.len()),
        };
        self.pos = next_start;
        self.number += 1;
        let text = &rest[..text_len];
        Some(Line {
            start,
            next_start,
            // Header matching is carriage-return agnostic; spans are not.
            text: text.strip_suffix('\r').unwrap_or(text),
            number: self.number,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Candidate boundaries
// ─────────────────────────────────────────────────────────────────────────────

/// What kind of section a candidate line could start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateKind {
    /// Starts with `**` — a chat message header candidate.
    Message,
    /// Starts with `###### ` — an execution-family header candidate.
    Heading,
}

/// A candidate section boundary located by the segmenter.
#[derive(Clone, Copy, Debug)]
pub struct Candidate {
    /// Byte offset of the candidate line start.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// Candidate kind.
    pub kind: CandidateKind,
}

/// Classify a line as a candidate section start.
#[must_use]
pub fn candidate_kind(line: &str) -> Option<CandidateKind> {
    if line.starts_with("**") {
        Some(CandidateKind::Message)
    } else if line.starts_with("###### ") {
        Some(CandidateKind::Heading)
    } else {
        None
    }
}

/// Locates candidate section boundaries in a body.
pub struct Segmenter;

impl Segmenter {
    /// All candidate boundaries, in document order.
    ///
    /// Candidates inside fenced code regions are included — validating and
    /// discarding them is the grammar parser's job, because only it tracks
    /// fence extents.
    #[must_use]
    pub fn candidates(body: &str) -> Vec<Candidate> {
        LineIter::new(body)
            .filter_map(|line| {
                candidate_kind(line.text).map(|kind| Candidate {
                    offset: line.start,
                    line: line.number,
                    kind,
                })
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Code fences
// ─────────────────────────────────────────────────────────────────────────────

/// Byte length of the opening backtick run if this line opens a fence.
///
/// Fences are at least three backticks at the very start of a line; the
/// remainder of the line is the info string.
#[must_use]
pub fn fence_open_len(line: &str) -> Option<usize> {
    let run = line.bytes().take_while(|&b| b == b'`').count();
    (run >= 3).then_some(run)
}

/// Returns `true` if `line` closes a fence opened with `len` backticks.
///
/// Fences match by literal backtick count, so a nested triple-backtick
/// fence inside a longer outer fence does not close it.
#[must_use]
pub fn fence_closes(line: &str, len: usize) -> bool {
    let run = line.bytes().take_while(|&b| b == b'`').count();
    run == len && line[run..].trim().is_empty()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
