//! The `Tree` type — a complete dependency parse for one sentence.

use crate::error::{DecodeError, DecodeResult};
use crate::word::{AttrMap, Word, WordRef};
use serde::{Deserialize, Serialize};

/// A complete, immutable dependency tree for one sentence.
///
/// Built once by [`crate::decoder`] from a block of CoNLL-U lines; `words`
/// and `children` never change afterward. The matcher borrows a `Tree`
/// but never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub(crate) words: Vec<Word>,
    /// `children[i]` is the ascending list of `i`'s child indices.
    pub(crate) children: Vec<Vec<usize>>,
    /// Ordered comment-key → value metadata (`# key = value` lines).
    /// Comments with no `=` are stored verbatim under the empty-string key.
    pub metadata: AttrMap,
    root: usize,
}

impl Tree {
    /// Number of words in the tree.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Borrow the word at `index`. Panics if `index` is out of range —
    /// callers (the matcher, embedders) only ever pass indices obtained
    /// from this same tree.
    pub fn word(&self, index: usize) -> WordRef<'_> {
        WordRef::new(self, index)
    }

    pub fn raw_word(&self, index: usize) -> &Word {
        &self.words[index]
    }

    pub fn words(&self) -> impl Iterator<Item = WordRef<'_>> {
        (0..self.words.len()).map(move |i| self.word(i))
    }

    /// Ascending child indices of `index`.
    pub fn children(&self, index: usize) -> &[usize] {
        &self.children[index]
    }

    pub fn root(&self) -> usize {
        self.root
    }

    /// The value of the `text` metadata comment, if present, else a
    /// best-effort join of word forms respecting `SpaceAfter=No` in MISC,
    /// so `sentence_text` always resolves to something printable.
    pub fn sentence_text(&self) -> Option<String> {
        if let Some(text) = self.metadata.get("text") {
            return Some(text.clone());
        }
        if self.words.is_empty() {
            return None;
        }
        let mut out = String::new();
        for (i, w) in self.words.iter().enumerate() {
            out.push_str(&w.form);
            let space_after = !matches!(w.misc.get("SpaceAfter").map(String::as_str), Some("No"));
            if space_after && i + 1 < self.words.len() {
                out.push(' ');
            }
        }
        Some(out)
    }

    /// Assemble a tree from already-parsed words (head fields already
    /// 0-based/`None`) and validate the structural invariants: every
    /// head in range, exactly one root, full connectivity from the
    /// root, no cycles.
    pub(crate) fn build(
        sent_id: &str,
        mut words: Vec<Word>,
        metadata: AttrMap,
    ) -> DecodeResult<Tree> {
        let n = words.len();

        let mut roots = Vec::new();
        for (i, w) in words.iter().enumerate() {
            match w.head_index {
                None => roots.push(i),
                Some(h) if h >= n => {
                    return Err(DecodeError::invalid_structure(
                        sent_id,
                        format!("word {i} has out-of-range head {h}"),
                    ))
                }
                Some(h) if h == i => {
                    return Err(DecodeError::invalid_structure(
                        sent_id,
                        format!("word {i} is its own head"),
                    ))
                }
                Some(_) => {}
            }
        }

        if roots.len() != 1 {
            return Err(DecodeError::invalid_structure(
                sent_id,
                format!("expected exactly one root, found {}", roots.len()),
            ));
        }
        let root = roots[0];

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, w) in words.iter().enumerate() {
            if let Some(h) = w.head_index {
                children[h].push(i);
            }
        }
        // words are pushed in ascending index order by construction, so
        // each child list is already sorted.

        // Connectivity + cycle check: BFS from root must reach every word.
        let mut seen = vec![false; n];
        let mut stack = vec![root];
        seen[root] = true;
        let mut visited = 0usize;
        while let Some(cur) = stack.pop() {
            visited += 1;
            for &c in &children[cur] {
                if !seen[c] {
                    seen[c] = true;
                    stack.push(c);
                }
            }
        }
        if visited != n {
            return Err(DecodeError::invalid_structure(
                sent_id,
                format!("tree rooted at {root} reaches {visited} of {n} words (cycle or disconnected word)"),
            ));
        }

        for (i, w) in words.iter_mut().enumerate() {
            w.index = i;
            w.token_id = (i + 1) as u32;
        }

        Ok(Tree {
            words,
            children,
            metadata,
            root,
        })
    }
}
