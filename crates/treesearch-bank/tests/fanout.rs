use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::tempdir;
use treesearch_bank::Treebank;
use treesearch_query::compile_query;

const SENT_A: &str = "1\tCats\tcat\tNOUN\t_\t_\t2\tnsubj\t_\t_\n\
2\tsleep\tsleep\tVERB\t_\t_\t0\troot\t_\t_\n";
const SENT_B: &str = "1\tDogs\tdog\tNOUN\t_\t_\t2\tnsubj\t_\t_\n\
2\trun\trun\tVERB\t_\t_\t0\troot\t_\t_\n";

#[test]
fn ordered_fanout_preserves_file_list_order() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.conllu");
    let b = dir.path().join("b.conllu");
    std::fs::write(&a, SENT_A).unwrap();
    std::fs::write(&b, SENT_B).unwrap();

    let bank = Treebank::open([a.to_str().unwrap(), b.to_str().unwrap()]).unwrap();
    let trees: Vec<_> = bank.trees(true).collect::<Result<_, _>>().unwrap();
    assert_eq!(trees.len(), 2);
    assert_eq!(trees[0].raw_word(0).form, "Cats");
    assert_eq!(trees[1].raw_word(0).form, "Dogs");
}

#[test]
fn transparently_decodes_gzip_compressed_files() {
    let dir = tempdir().unwrap();
    let gz_path = dir.path().join("a.conllu.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(SENT_A.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();
    std::fs::write(&gz_path, compressed).unwrap();

    let bank = Treebank::open([gz_path.to_str().unwrap()]).unwrap();
    let trees: Vec<_> = bank.trees(true).collect::<Result<_, _>>().unwrap();
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].raw_word(0).form, "Cats");
}

#[test]
fn glob_pattern_expands_to_every_matching_file() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("1.conllu"), SENT_A).unwrap();
    std::fs::write(dir.path().join("2.conllu"), SENT_B).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let pattern = format!("{}/*.conllu", dir.path().display());
    let bank = Treebank::open([pattern.as_str()]).unwrap();
    assert_eq!(bank.len(), 2);
    let trees: Vec<_> = bank.trees(true).collect::<Result<_, _>>().unwrap();
    assert_eq!(trees.len(), 2);
}

#[test]
fn unordered_fanout_yields_every_tree_exactly_once() {
    let dir = tempdir().unwrap();
    for i in 0..6 {
        std::fs::write(dir.path().join(format!("{i}.conllu")), SENT_A).unwrap();
    }
    let pattern = format!("{}/*.conllu", dir.path().display());
    let bank = Treebank::open([pattern.as_str()]).unwrap();
    let trees: Vec<_> = bank.trees(false).collect::<Result<_, _>>().unwrap();
    assert_eq!(trees.len(), 6);
}

#[test]
fn search_streams_tree_binding_pairs_across_the_treebank() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.conllu"), SENT_A).unwrap();
    std::fs::write(dir.path().join("b.conllu"), SENT_B).unwrap();
    let pattern_str = format!("{}/*.conllu", dir.path().display());
    let bank = Treebank::open([pattern_str.as_str()]).unwrap();

    let pattern = compile_query(r#"V [upos = "VERB"]; S [upos = "NOUN"]; V -[nsubj]-> S;"#)
        .unwrap();
    let results: Vec<_> = bank
        .search(&pattern, true)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(results.len(), 2);
}

#[test]
fn in_memory_treebank_decodes_without_touching_the_filesystem() {
    let bank = Treebank::open_str(SENT_A);
    let trees: Vec<_> = bank.trees(true).collect::<Result<_, _>>().unwrap();
    assert_eq!(trees.len(), 1);
}
