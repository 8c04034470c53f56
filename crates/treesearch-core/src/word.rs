//! The `Word` type — a single node in a dependency tree.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered key/value annotations on a token (FEATS or MISC column).
pub type AttrMap = IndexMap<String, String>;

/// A node in a dependency tree.
///
/// `index` is the word's 0-based position inside its sentence; `token_id`
/// is the 1-based identifier as printed in the CoNLL-U `ID` column (always
/// `index + 1` once multi-word ranges and empty nodes have been filtered
/// out during parsing — see `treesearch_core::decoder`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub index: usize,
    pub token_id: u32,
    pub form: String,
    pub lemma: String,
    pub upos: String,
    pub xpos: Option<String>,
    pub deprel: String,
    /// 0-based index of the parent word, or `None` for the root.
    pub head_index: Option<usize>,
    pub feats: AttrMap,
    pub misc: AttrMap,
    /// Enhanced dependencies parsed from the DEPS column — `(head_index,
    /// relation)` pairs. Not consulted by the matcher; carried for
    /// embedders that want the enhanced graph.
    pub enhanced_deps: Vec<(Option<usize>, String)>,
}

impl Word {
    /// Looks up a recognised attribute field by name (`form`, `lemma`,
    /// `upos`/`pos`, `xpos`, `deprel`). Returns `None` for `xpos` when
    /// absent and for unrecognised field names.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "form" => Some(&self.form),
            "lemma" => Some(&self.lemma),
            "upos" | "pos" => Some(&self.upos),
            "xpos" => self.xpos.as_deref(),
            "deprel" => Some(&self.deprel),
            _ => None,
        }
    }

    pub fn feat(&self, name: &str) -> Option<&str> {
        self.feats.get(name).map(String::as_str)
    }

    pub fn misc(&self, name: &str) -> Option<&str> {
        self.misc.get(name).map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.head_index.is_none()
    }
}

/// A `(tree, index)` handle that resolves navigation without mutual
/// ownership between `Word` and `Tree`.
#[derive(Debug, Clone, Copy)]
pub struct WordRef<'a> {
    tree: &'a super::tree::Tree,
    pub index: usize,
}

impl<'a> WordRef<'a> {
    pub(crate) fn new(tree: &'a super::tree::Tree, index: usize) -> Self {
        Self { tree, index }
    }

    pub fn word(&self) -> &'a Word {
        &self.tree.words[self.index]
    }

    pub fn parent(&self) -> Option<WordRef<'a>> {
        self.word()
            .head_index
            .map(|i| WordRef::new(self.tree, i))
    }

    pub fn children(&self) -> Vec<WordRef<'a>> {
        self.tree.children(self.index)
            .iter()
            .map(|&i| WordRef::new(self.tree, i))
            .collect()
    }

    pub fn children_by_deprel(&self, relation: &str) -> Vec<WordRef<'a>> {
        self.children()
            .into_iter()
            .filter(|c| c.word().deprel == relation)
            .collect()
    }
}

impl<'a> std::ops::Deref for WordRef<'a> {
    type Target = Word;

    fn deref(&self) -> &Word {
        self.word()
    }
}
