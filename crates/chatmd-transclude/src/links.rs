//! Transclusion link scanning.
//!
//! Two syntaxes are recognized:
//!
//! - wiki-style: `#[[path]]` (text inlining) and `![[path]]` (embedding)
//! - standard markdown images: `![alt](path)` (embedding)

use regex::Regex;

/// How a link asks for its target to be included.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
    /// `#[[path]]` — substitute the link with the file's text.
    Text,
    /// `![[path]]` / `![alt](path)` — embed the file.
    Embed,
}

/// A transclusion link found in message content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransclusionLink<'a> {
    /// Link kind.
    pub kind: LinkKind,
    /// The target path or glob as written.
    pub target: &'a str,
    /// Byte span of the whole link in the content.
    pub span: (usize, usize),
}

/// Compile the link pattern.
///
/// Alternation order matters: the wiki forms are tried before the standard
/// image form so `![[path]]` is never read as an image with a bracketed alt.
pub(crate) fn link_pattern() -> Regex {
    Regex::new(r"([#!])\[\[([^\[\]]+)\]\]|!\[[^\]]*\]\(([^()]+)\)").unwrap()
}

/// Scan content for transclusion links, in document order.
#[must_use]
pub fn scan_links<'a>(pattern: &Regex, content: &'a str) -> Vec<TransclusionLink<'a>> {
    pattern
        .captures_iter(content)
        .map(|caps| {
            let whole = caps.get(0).expect("capture 0 always present");
            let (kind, target) = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(marker), Some(target), _) => {
                    let kind = if marker.as_str() == "#" {
                        LinkKind::Text
                    } else {
                        LinkKind::Embed
                    };
                    (kind, target.as_str())
                }
                (_, _, Some(target)) => (LinkKind::Embed, target.as_str()),
                _ => unreachable!("pattern matched without a target group"),
            };
            TransclusionLink {
                kind,
                target,
                span: (whole.start(), whole.end()),
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
