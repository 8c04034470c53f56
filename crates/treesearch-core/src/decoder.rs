//! CoNLL-U line decoding and tree building.
//!
//! Line-oriented, streaming over a `BufRead` source one sentence block
//! at a time: underscore handling is per-column (required string
//! columns collapse `_` to empty, nullable columns treat it as absent),
//! multi-word and empty-node IDs are skipped, and a malformed sentence
//! is quarantined as an error rather than best-effort recovered.

use crate::error::{DecodeError, DecodeResult};
use crate::tree::Tree;
use crate::word::{AttrMap, Word};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A single decoded sentence block, ready for tree building.
struct SentenceBlock {
    sent_id: String,
    metadata: AttrMap,
    token_lines: Vec<(usize, String)>,
}

/// Splits an ordered sequence of UTF-8 lines into sentence blocks and
/// builds a [`Tree`] for each well-formed one.
///
/// Malformed sentences (wrong field count, bad structure) are quarantined:
/// a `tracing::warn!` is emitted and decoding continues with the next
/// blank line. I/O errors from the `lines` iterator itself abort the
/// whole stream for that file.
pub struct Decoder<I> {
    lines: I,
    pending_comments: Vec<String>,
    pending_tokens: Vec<(usize, String)>,
    line_no: usize,
    sent_counter: usize,
    done: bool,
}

impl<I, E> Decoder<I>
where
    I: Iterator<Item = Result<String, E>>,
    E: std::error::Error + 'static,
{
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            pending_comments: Vec::new(),
            pending_tokens: Vec::new(),
            line_no: 0,
            sent_counter: 0,
            done: false,
        }
    }

    fn flush_block(&mut self) -> Option<SentenceBlock> {
        if self.pending_tokens.is_empty() {
            self.pending_comments.clear();
            return None;
        }
        self.sent_counter += 1;
        let mut metadata = AttrMap::new();
        let mut sent_id = None;
        for comment in self.pending_comments.drain(..) {
            let body = comment.trim_start_matches('#').trim_start();
            if let Some(eq) = body.find('=') {
                let key = body[..eq].trim().to_string();
                let value = body[eq + 1..].trim().to_string();
                if key == "sent_id" {
                    sent_id = Some(value.clone());
                }
                if let Some(existing) = metadata.get_mut(&key) {
                    existing.push('\n');
                    existing.push_str(&value);
                } else {
                    metadata.insert(key, value);
                }
            } else {
                let entry = metadata.entry(String::new()).or_default();
                if !entry.is_empty() {
                    entry.push('\n');
                }
                entry.push_str(body);
            }
        }
        let sent_id = sent_id.unwrap_or_else(|| format!("sent-{}", self.sent_counter));
        Some(SentenceBlock {
            sent_id,
            metadata,
            token_lines: std::mem::take(&mut self.pending_tokens),
        })
    }
}

impl<I, E> Iterator for Decoder<I>
where
    I: Iterator<Item = Result<String, E>>,
    E: std::error::Error + 'static,
{
    type Item = DecodeResult<Tree>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            let Some(line) = self.lines.next() else {
                self.done = true;
                if let Some(block) = self.flush_block() {
                    return Some(build_sentence(block));
                }
                return None;
            };
            self.line_no += 1;
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    self.done = true;
                    return Some(Err(DecodeError::io(
                        format!("line {}", self.line_no),
                        std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
                    )));
                }
            };

            if line.is_empty() {
                if let Some(block) = self.flush_block() {
                    return Some(build_sentence(block));
                }
                continue;
            } else if let Some(rest) = line.strip_prefix('#') {
                self.pending_comments.push(format!("#{rest}"));
            } else {
                self.pending_tokens.push((self.line_no, line));
            }
        }
    }
}

fn build_sentence(block: SentenceBlock) -> DecodeResult<Tree> {
    let mut raw_by_token_id: HashMap<u32, usize> = HashMap::new();
    let mut words: Vec<RawWord> = Vec::new();

    for (line_no, line) in &block.token_lines {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 10 {
            warn!(
                sent_id = %block.sent_id,
                line = line_no,
                "quarantining sentence: expected 10 fields, got {}",
                fields.len()
            );
            return Err(DecodeError::malformed(
                &block.sent_id,
                format!("line {line_no}: expected 10 fields, got {}", fields.len()),
            ));
        }

        let id_field = fields[0];
        if id_field.contains('-') || id_field.contains('.') {
            // Multi-word token range or empty/enhanced node: skip.
            debug!(sent_id = %block.sent_id, id = id_field, "skipping non-token line");
            continue;
        }
        let token_id: u32 = match id_field.parse() {
            Ok(v) => v,
            Err(_) => {
                return Err(DecodeError::malformed(
                    &block.sent_id,
                    format!("line {line_no}: invalid token id {id_field:?}"),
                ))
            }
        };

        let form = required(fields[1]);
        let lemma = required(fields[2]);
        let upos = required(fields[3]);
        let xpos = nullable(fields[4]);
        let feats = parse_attrs(fields[5]);
        let head_field = fields[6];
        let deprel = required(fields[7]);
        let deps_field = fields[8];
        let misc = parse_attrs(fields[9]);

        let head_raw: Option<u32> = if head_field == "_" {
            None
        } else {
            match head_field.parse::<u32>() {
                Ok(0) => None,
                Ok(v) => Some(v),
                Err(_) => {
                    return Err(DecodeError::malformed(
                        &block.sent_id,
                        format!("line {line_no}: invalid head {head_field:?}"),
                    ))
                }
            }
        };

        let mut enhanced_deps_raw = Vec::new();
        if deps_field != "_" && !deps_field.is_empty() {
            for dep in deps_field.split('|') {
                if let Some((head_str, rel)) = dep.split_once(':') {
                    if let Ok(0) = head_str.parse::<u32>() {
                        enhanced_deps_raw.push((None, rel.to_string()));
                    } else if let Ok(h) = head_str.parse::<u32>() {
                        enhanced_deps_raw.push((Some(h), rel.to_string()));
                    }
                }
            }
        }

        raw_by_token_id.insert(token_id, words.len());
        words.push(RawWord {
            token_id,
            form,
            lemma,
            upos,
            xpos,
            deprel,
            feats,
            misc,
            head_raw,
            enhanced_deps_raw,
        });
    }

    if words.is_empty() {
        return Err(DecodeError::malformed(&block.sent_id, "no tokens"));
    }

    let mut resolved: Vec<Word> = Vec::with_capacity(words.len());
    for (i, raw) in words.into_iter().enumerate() {
        let head_index = match raw.head_raw {
            None => None,
            Some(h) => match raw_by_token_id.get(&h) {
                Some(&idx) => Some(idx),
                None => {
                    return Err(DecodeError::invalid_structure(
                        &block.sent_id,
                        format!("word {i} has out-of-range head token-id {h}"),
                    ))
                }
            },
        };
        let enhanced_deps = raw
            .enhanced_deps_raw
            .into_iter()
            .map(|(h, rel)| (h.and_then(|h| raw_by_token_id.get(&h).copied()), rel))
            .collect();
        resolved.push(Word {
            index: i,
            token_id: raw.token_id,
            form: raw.form,
            lemma: raw.lemma,
            upos: raw.upos,
            xpos: raw.xpos,
            deprel: raw.deprel,
            head_index,
            feats: raw.feats,
            misc: raw.misc,
            enhanced_deps,
        });
    }

    Tree::build(&block.sent_id, resolved, block.metadata)
}

struct RawWord {
    token_id: u32,
    form: String,
    lemma: String,
    upos: String,
    xpos: Option<String>,
    deprel: String,
    feats: AttrMap,
    misc: AttrMap,
    head_raw: Option<u32>,
    enhanced_deps_raw: Vec<(Option<u32>, String)>,
}

fn nullable(field: &str) -> Option<String> {
    if field == "_" {
        None
    } else {
        Some(field.to_string())
    }
}

/// Required string columns (FORM, LEMMA, UPOS, DEPREL) keep `_` as an
/// empty value rather than treating it as absent.
fn required(field: &str) -> String {
    if field == "_" {
        String::new()
    } else {
        field.to_string()
    }
}

/// Parses a `|`-separated `name=value` FEATS/MISC field. Duplicate names
/// take the last value; `_` alone yields an empty map.
fn parse_attrs(field: &str) -> AttrMap {
    let mut map = AttrMap::new();
    if field == "_" || field.is_empty() {
        return map;
    }
    for pair in field.split('|') {
        if let Some((k, v)) = pair.split_once('=') {
            map.insert(k.to_string(), v.to_string());
        } else {
            map.insert(pair.to_string(), String::new());
        }
    }
    map
}
