//! # chatmd-transclude
//!
//! Content post-processing: expands transclusion links inside each
//! message's content.
//!
//! Text links (`#[[path]]`) substitute the link with the target file's
//! content wrapped in a delimiter block citing the absolute path. Embed
//! links (`![[path]]`, `![alt](path)`) inline images: the message content
//! becomes a structured list with the original text retained first and one
//! base64 data-URI part appended per resolved file, glob-expanded and
//! sorted. An embed whose matched file turns out to be text falls back to
//! text substitution.
//!
//! File reads are simple blocking I/O with no partial-result semantics: a
//! failed read fails the whole post-processing step.

#![deny(unsafe_code)]

pub mod errors;
pub mod links;

pub use errors::{Result, TranscludeError};
pub use links::{LinkKind, TransclusionLink, scan_links};

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chatmd_core::{ContentPart, MessageContent, ResolvedMessage};
use globset::Glob;
use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

/// Extensions accepted for image embedding.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// How many leading bytes are inspected when deciding text vs binary.
const BINARY_SNIFF_LEN: usize = 8192;

/// Expands transclusion links against a base directory.
pub struct Transcluder {
    base_dir: PathBuf,
    pattern: Regex,
}

impl Transcluder {
    /// Create a transcluder resolving relative targets against `base_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            pattern: links::link_pattern(),
        }
    }

    /// Expand transclusion links in every message.
    ///
    /// # Errors
    ///
    /// Fails on the first link with zero matches, an unsupported matched
    /// extension, or a failed file read.
    pub fn post_process(&self, messages: &mut [ResolvedMessage]) -> Result<()> {
        for message in messages {
            self.process_message(message)?;
        }
        Ok(())
    }

    /// Expand links in a single message's content.
    pub fn process_message(&self, message: &mut ResolvedMessage) -> Result<()> {
        let MessageContent::Text(original) = &message.content else {
            return Ok(());
        };
        let found = scan_links(&self.pattern, original);
        if found.is_empty() {
            return Ok(());
        }

        let mut rebuilt = String::with_capacity(original.len());
        let mut images: Vec<ContentPart> = Vec::new();
        let mut cursor = 0;
        let mut substituted = false;

        for link in &found {
            let outcome = match link.kind {
                LinkKind::Text => Outcome {
                    text_blocks: vec![self.inline_text_file(link.target)?],
                    images: Vec::new(),
                },
                LinkKind::Embed => self.resolve_embed(link.target)?,
            };

            if outcome.text_blocks.is_empty() {
                // Pure image embed: the link text stays in the content.
                rebuilt.push_str(&original[cursor..link.span.1]);
            } else {
                rebuilt.push_str(&original[cursor..link.span.0]);
                rebuilt.push_str(&outcome.text_blocks.join("\n"));
                substituted = true;
            }
            cursor = link.span.1;
            images.extend(outcome.images);
        }
        rebuilt.push_str(&original[cursor..]);

        if images.is_empty() {
            if substituted {
                message.content = MessageContent::Text(rebuilt);
            }
            return Ok(());
        }

        debug!(
            name = %message.name,
            images = images.len(),
            "inlining transcluded images"
        );
        let mut parts = Vec::with_capacity(images.len() + 1);
        parts.push(ContentPart::text(rebuilt));
        parts.extend(images);
        message.content = MessageContent::Blocks(parts);
        Ok(())
    }

    /// Text transclusion: read a single file and wrap it in a delimiter
    /// block citing the absolute path. No glob expansion on this path.
    fn inline_text_file(&self, target: &str) -> Result<String> {
        let path = self.absolute(target);
        if !path.is_file() {
            return Err(TranscludeError::NotFound {
                link: target.to_owned(),
            });
        }
        let content = read_file(&path)?;
        let content = String::from_utf8_lossy(&content);
        Ok(wrap_text_block(&display_path(&path), content.trim_end_matches('\n')))
    }

    /// Embed transclusion: resolve the target (glob-expanded for relative
    /// paths), turning binary image files into data-URI parts and text
    /// files into substitution blocks.
    fn resolve_embed(&self, target: &str) -> Result<Outcome> {
        let extension = Path::new(target)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let supported = extension
            .as_deref()
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext));
        if !supported {
            return Err(TranscludeError::UnsupportedType {
                path: target.to_owned(),
            });
        }

        let files = self.expand(target)?;
        let mut outcome = Outcome {
            text_blocks: Vec::new(),
            images: Vec::new(),
        };
        for file in files {
            let bytes = read_file(&file)?;
            if is_binary(&bytes) {
                let mime = file
                    .extension()
                    .and_then(|e| e.to_str())
                    .and_then(image_mime)
                    .ok_or_else(|| TranscludeError::UnsupportedType {
                        path: display_path(&file),
                    })?;
                let uri = format!("data:{mime};base64,{}", STANDARD.encode(&bytes));
                outcome.images.push(ContentPart::image_url(uri));
            } else {
                // Image extension but text content: fall back to inlining.
                debug!(path = %file.display(), "embed target is text, inlining");
                let content = String::from_utf8_lossy(&bytes);
                outcome.text_blocks.push(wrap_text_block(
                    &display_path(&file),
                    content.trim_end_matches('\n'),
                ));
            }
        }
        Ok(outcome)
    }

    /// Resolve a target into matching files.
    ///
    /// Absolute paths bypass globbing entirely; relative targets are glob
    /// patterns matched over a walk of the base directory, results sorted.
    fn expand(&self, target: &str) -> Result<Vec<PathBuf>> {
        let path = Path::new(target);
        if path.is_absolute() {
            if !path.is_file() {
                return Err(TranscludeError::NotFound {
                    link: target.to_owned(),
                });
            }
            return Ok(vec![path.to_path_buf()]);
        }

        let matcher = Glob::new(target)
            .map_err(|source| TranscludeError::Pattern {
                pattern: target.to_owned(),
                source,
            })?
            .compile_matcher();

        let mut matches: Vec<PathBuf> = WalkDir::new(&self.base_dir)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.base_dir)
                    .is_ok_and(|rel| matcher.is_match(rel))
            })
            .map(walkdir::DirEntry::into_path)
            .collect();
        matches.sort();

        if matches.is_empty() {
            return Err(TranscludeError::NotFound {
                link: target.to_owned(),
            });
        }
        Ok(matches)
    }

    fn absolute(&self, target: &str) -> PathBuf {
        let path = Path::new(target);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// Files produced by one embed link.
struct Outcome {
    text_blocks: Vec<String>,
    images: Vec<ContentPart>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| TranscludeError::Io {
        path: display_path(path),
        source,
    })
}

/// Absolute display form of a path, canonicalized when possible.
fn display_path(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

/// Wrap transcluded text in a delimiter block citing its source.
fn wrap_text_block(path: &str, content: &str) -> String {
    format!("<!-- begin transclusion: {path} -->\n{content}\n<!-- end transclusion: {path} -->")
}

/// Binary detection: a NUL byte in the leading window.
fn is_binary(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(BINARY_SNIFF_LEN)].contains(&0)
}

/// MIME type for a supported image extension.
fn image_mime(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
