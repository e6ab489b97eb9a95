//! Page content serialization.
//!
//! # Responsibility
//! - Encode an ordered block sequence into the opaque `content` string.
//! - Decode stored content, including the legacy markup blob format.
//!
//! # Invariants
//! - Encoding preserves block id, kind, text and order.
//! - Decoding never fails and never yields an empty sequence.
//! - Decoded block ids are unique.

use crate::model::block::{Block, BlockKind};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Envelope version written by this crate.
pub const CONTENT_VERSION: u32 = 1;

static EDITABLE_BLOCK_OPEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<div[^>]*class="[^"]*\beditable-block\b[^"]*"[^>]*>"#)
        .expect("valid editable block regex")
});
static DIV_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(/?)div\b[^>]*>").expect("valid div tag regex"));
static EMPTY_LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>\s*</div>").expect("valid empty line regex"));
static LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line break regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

#[derive(Debug, Serialize, Deserialize)]
struct ContentEnvelope {
    version: u32,
    blocks: Vec<StoredBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredBlock {
    id: Uuid,
    #[serde(default)]
    kind: BlockKind,
    #[serde(default)]
    text: String,
}

/// Serializes blocks into the versioned JSON envelope.
pub fn encode_content(blocks: &[Block]) -> String {
    let envelope = ContentEnvelope {
        version: CONTENT_VERSION,
        blocks: blocks
            .iter()
            .map(|block| StoredBlock {
                id: block.id,
                kind: block.kind,
                text: block.text.clone(),
            })
            .collect(),
    };
    // Serializing plain strings, uuids and unit enums cannot fail.
    serde_json::to_string(&envelope).unwrap_or_else(|_| String::from("{\"version\":1,\"blocks\":[]}"))
}

/// Parses stored content into blocks.
///
/// Accepted forms, tried in order:
/// 1. the versioned JSON envelope written by [`encode_content`];
/// 2. a markup blob made of `editable-block` elements, one paragraph each;
/// 3. any other non-blank text, kept as a single paragraph.
pub fn decode_content(content: &str) -> Vec<Block> {
    let blocks = match serde_json::from_str::<ContentEnvelope>(content) {
        Ok(envelope) => {
            if envelope.version > CONTENT_VERSION {
                warn!(
                    "event=content_decode module=content status=newer_version version={} supported={}",
                    envelope.version, CONTENT_VERSION
                );
            }
            envelope
                .blocks
                .into_iter()
                .map(|stored| Block::with_id(stored.id, stored.kind, stored.text))
                .collect()
        }
        Err(err) if looks_like_envelope(content) => {
            warn!(
                "event=content_decode module=content status=error format=json error={}",
                err
            );
            plain_text_blocks(content)
        }
        Err(_) if EDITABLE_BLOCK_OPEN_RE.is_match(content) => decode_legacy_markup(content),
        Err(_) => plain_text_blocks(content),
    };

    ensure_valid_sequence(blocks)
}

fn looks_like_envelope(content: &str) -> bool {
    content.trim_start().starts_with('{')
}

fn decode_legacy_markup(content: &str) -> Vec<Block> {
    editable_block_fragments(content)
        .into_iter()
        .map(|inner| Block::paragraph(markup_to_text(inner)))
        .collect()
}

/// Inner markup of every `editable-block` element, nested `div`s included.
///
/// An element left unclosed runs to the end of the content.
fn editable_block_fragments(content: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut cursor = 0;
    while let Some(open) = EDITABLE_BLOCK_OPEN_RE.find_at(content, cursor) {
        let body_start = open.end();
        let mut body_end = content.len();
        let mut next = content.len();
        let mut depth = 1usize;
        for tag in DIV_TAG_RE.captures_iter(&content[body_start..]) {
            let closing = tag.get(1).is_some_and(|slash| !slash.as_str().is_empty());
            if !closing {
                depth += 1;
                continue;
            }
            depth -= 1;
            if depth == 0 {
                if let Some(whole) = tag.get(0) {
                    body_end = body_start + whole.start();
                    next = body_start + whole.end();
                }
                break;
            }
        }
        fragments.push(&content[body_start..body_end]);
        cursor = next;
    }
    fragments
}

fn plain_text_blocks(content: &str) -> Vec<Block> {
    if content.trim().is_empty() {
        Vec::new()
    } else {
        vec![Block::paragraph(content)]
    }
}

/// Extracts visible text from a block's inner markup.
///
/// Browsers wrap every line after the first in its own `div`, and an empty
/// line is `<div><br></div>`; both become single newlines.
fn markup_to_text(fragment: &str) -> String {
    let fragment = EMPTY_LINE_BREAK_RE.replace_all(fragment, "</div>");
    let starts_with_line = fragment.trim_start().to_ascii_lowercase().starts_with("<div");
    let with_lines = DIV_TAG_RE.replace_all(&fragment, |caps: &regex::Captures<'_>| {
        if caps.get(1).is_some_and(|slash| !slash.as_str().is_empty()) {
            String::new()
        } else {
            "\n".to_string()
        }
    });
    let with_breaks = LINE_BREAK_RE.replace_all(&with_lines, "\n");
    let stripped = TAG_RE.replace_all(&with_breaks, "");
    let text: &str = if starts_with_line {
        let leading = stripped.trim_start_matches([' ', '\t', '\r']);
        leading.strip_prefix('\n').unwrap_or(leading)
    } else {
        stripped.as_ref()
    };
    decode_entities(text)
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn ensure_valid_sequence(blocks: Vec<Block>) -> Vec<Block> {
    if blocks.is_empty() {
        return vec![Block::new()];
    }

    let mut seen = HashSet::with_capacity(blocks.len());
    blocks
        .into_iter()
        .map(|mut block| {
            if !seen.insert(block.id) {
                block.id = Uuid::new_v4();
                seen.insert(block.id);
            }
            block
        })
        .collect()
}
