//! Embedding boundary for the treesearch engine.
//!
//! This crate is a thin facade: it re-exports the stable surface that
//! `treesearch-core`, `treesearch-query`, and `treesearch-bank` already
//! implement, so embedders depend on one crate instead of three.

pub use treesearch_core::{decode_str, AttrMap, DecodeError, DecodeResult, Decoder, Tree, Word, WordRef};
pub use treesearch_query::{compile_query as compile, find_matches, Binding, Pattern, QueryError, QueryResult};
pub use treesearch_bank::{BankError, BankResult, Options, Treebank};

/// Opens a treebank over `paths` (plain paths or glob patterns; see
/// [`Treebank::open`]).
pub fn open<I, S>(paths: I) -> BankResult<Treebank>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Treebank::open(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_and_search_round_trip() {
        let pattern = compile(r#"V [upos = "VERB"]; S [upos = "PRON"]; V -[nsubj]-> S;"#)
            .expect("query should compile");
        let bank = Treebank::open_str(
            "1\tHe\the\tPRON\t_\t_\t2\tnsubj\t_\t_\n\
2\tsleeps\tsleep\tVERB\t_\t_\t0\troot\t_\t_\n",
        );
        let results: Vec<_> = bank
            .search(&pattern, true)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(results.len(), 1);
        let (tree, binding) = &results[0];
        assert_eq!(tree.word(binding["V"]).lemma, "sleep");
        assert_eq!(tree.word(binding["S"]).lemma, "he");
    }
}
