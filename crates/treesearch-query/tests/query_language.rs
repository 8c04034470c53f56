//! Integration tests against `treesearch_query`'s public surface: regex
//! constraints, FEATS/MISC constraints, and compile-time error surfacing.

use treesearch_core::decode_str;
use treesearch_query::{compile_query, find_matches, QueryError};

const SENT: &str = "1\tCats\tcat\tNOUN\tNNS\tNumber=Plur\t2\tnsubj\t_\t_\n\
2\tpurr\tpurr\tVERB\tVBP\tTense=Pres\t0\troot\t_\t_\n\
3\tloudly\tloudly\tADV\tRB\t_\t2\tadvmod\t_\t_\n";

fn tree() -> treesearch_core::Tree {
    decode_str(SENT).next().unwrap().unwrap()
}

#[test]
fn regex_constraint_matches_substring_unanchored() {
    let pattern = compile_query(r#"W [form ~ "ou"];"#).unwrap();
    let matches = find_matches(&pattern, &tree());
    // "loudly" and nothing else contains "ou".
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["W"], 2);
}

#[test]
fn negated_regex_constraint_excludes_matching_words() {
    let pattern = compile_query(r#"W [form !~ "^[a-z]"];"#).unwrap();
    let matches = find_matches(&pattern, &tree());
    // Only "Cats" starts with an uppercase letter.
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["W"], 0);
}

#[test]
fn feats_constraint_reads_the_feature_map() {
    let pattern = compile_query(r#"W [feats.Number = "Plur"];"#).unwrap();
    let matches = find_matches(&pattern, &tree());
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["W"], 0);
}

#[test]
fn immediate_precedence_requires_adjacency() {
    let pattern = compile_query(r#"A [upos = "VERB"]; B [upos = "ADV"]; A < B;"#).unwrap();
    let matches = find_matches(&pattern, &tree());
    assert_eq!(matches.len(), 1);
}

#[test]
fn syntax_error_reports_line_and_column() {
    let err = compile_query("V [upos = ];").unwrap_err();
    match err {
        QueryError::Syntax { line, .. } => assert_eq!(line, 1),
        other => panic!("expected Syntax error, got {other:?}"),
    }
}

#[test]
fn unknown_field_is_a_semantic_error_not_a_silent_no_match() {
    let err = compile_query(r#"V [surfaceform = "cats"];"#).unwrap_err();
    assert!(matches!(err, QueryError::UnknownField(ref f) if f == "surfaceform"));
}

#[test]
fn bare_clause_query_and_match_block_query_compile_to_equivalent_patterns() {
    let bare = compile_query(r#"V [upos = "VERB"];"#).unwrap();
    let wrapped = compile_query(r#"MATCH { V [upos = "VERB"]; }"#).unwrap();
    let t = tree();
    assert_eq!(find_matches(&bare, &t), find_matches(&wrapped, &t));
}
