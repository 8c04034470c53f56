//! spec.md §8 structural invariants, exercised as integration tests
//! against the public `treesearch_core` surface.

use treesearch_core::decode_str;

const SENT: &str = "# sent_id = 1\n\
# text = The quick fox jumps.\n\
1\tThe\tthe\tDET\t_\t_\t3\tdet\t_\t_\n\
2\tquick\tquick\tADJ\t_\t_\t3\tamod\t_\t_\n\
3\tfox\tfox\tNOUN\t_\t_\t4\tnsubj\t_\t_\n\
4\tjumps\tjump\tVERB\t_\t_\t0\troot\t_\t_\n\
5\t.\t.\tPUNCT\t_\t_\t4\tpunct\t_\t_\n";

#[test]
fn word_index_equals_position_and_token_id_is_index_plus_one() {
    let tree = decode_str(SENT).next().unwrap().unwrap();
    for i in 0..tree.len() {
        let w = tree.raw_word(i);
        assert_eq!(w.index, i);
        assert_eq!(w.token_id as usize, i + 1);
    }
}

#[test]
fn exactly_one_root_and_children_reach_every_word() {
    let tree = decode_str(SENT).next().unwrap().unwrap();
    let roots: Vec<usize> = (0..tree.len())
        .filter(|&i| tree.raw_word(i).head_index.is_none())
        .collect();
    assert_eq!(roots.len(), 1);

    let mut seen = vec![false; tree.len()];
    let mut stack = vec![roots[0]];
    seen[roots[0]] = true;
    let mut count = 0;
    while let Some(cur) = stack.pop() {
        count += 1;
        for &c in tree.children(cur) {
            assert!(!seen[c], "child {c} reached twice: not a tree");
            seen[c] = true;
            stack.push(c);
        }
    }
    assert_eq!(count, tree.len());
}

#[test]
fn children_lists_agree_with_head_index_and_are_strictly_increasing() {
    let tree = decode_str(SENT).next().unwrap().unwrap();
    for i in 0..tree.len() {
        let kids = tree.children(i);
        for w in kids.windows(2) {
            assert!(w[0] < w[1], "children of {i} not strictly increasing");
        }
        for &c in kids {
            assert_eq!(tree.raw_word(c).head_index, Some(i));
        }
    }
}

#[test]
fn feats_and_misc_preserve_declaration_order() {
    let text = "1\tx\tx\tX\t_\tNumber=Sing|Case=Nom|Gender=Masc\t0\troot\t_\tSpaceAfter=No|Foo=Bar\n";
    let tree = decode_str(text).next().unwrap().unwrap();
    let w = tree.raw_word(0);
    let feat_keys: Vec<&str> = w.feats.keys().map(String::as_str).collect();
    assert_eq!(feat_keys, vec!["Number", "Case", "Gender"]);
    let misc_keys: Vec<&str> = w.misc.keys().map(String::as_str).collect();
    assert_eq!(misc_keys, vec!["SpaceAfter", "Foo"]);
}

#[test]
fn sentence_text_comment_takes_precedence_over_reconstruction() {
    let tree = decode_str(SENT).next().unwrap().unwrap();
    assert_eq!(
        tree.sentence_text().as_deref(),
        Some("The quick fox jumps.")
    );
}

#[test]
fn sentence_text_falls_back_to_joined_forms_without_a_text_comment() {
    let text = "1\tHello\thello\tINTJ\t_\t_\t0\troot\t_\tSpaceAfter=No\n\
2\t,\t,\tPUNCT\t_\t_\t1\tpunct\t_\t_\n";
    let tree = decode_str(text).next().unwrap().unwrap();
    assert_eq!(tree.sentence_text().as_deref(), Some("Hello,"));
}

#[test]
fn multiword_token_range_is_excluded_from_the_tree() {
    let text = "1-2\tdidn't\t_\t_\t_\t_\t_\t_\t_\t_\n\
1\tdid\tdo\tAUX\t_\t_\t0\troot\t_\t_\n\
2\tn't\tnot\tPART\t_\t_\t1\tadvmod\t_\t_\n";
    let tree = decode_str(text).next().unwrap().unwrap();
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.raw_word(0).form, "did");
    assert_eq!(tree.raw_word(1).form, "n't");
}

#[test]
fn enhanced_deps_are_parsed_but_not_part_of_the_primary_tree() {
    let text = "1\tI\tI\tPRON\t_\t_\t2\tnsubj\t2:nsubj\t_\n\
2\trun\trun\tVERB\t_\t_\t0\troot\t0:root\t_\n";
    let tree = decode_str(text).next().unwrap().unwrap();
    assert_eq!(tree.raw_word(0).enhanced_deps, vec![(Some(1), "nsubj".to_string())]);
    assert_eq!(tree.raw_word(1).enhanced_deps, vec![(None, "root".to_string())]);
}
