//! AST -> [`Pattern`] compilation.
//!
//! Two passes: first, every negated edge clause (`A !-[label]-> B;`) is
//! rewritten into a synthetic `EXCEPT` block asserting the non-negated
//! edge — "reject this MATCH binding if such an edge *can* be completed"
//! is exactly EXCEPT's own semantics, so negation needs no separate
//! evaluation path in the matcher. Second, each block (MATCH, and every
//! EXCEPT/OPTIONAL, synthetic or explicit) is planned independently: a
//! greedy "most selective constraint, tie-broken by edge-reachability
//! from an already-bound variable" heuristic picks the variable order,
//! and whatever isn't used to generate candidates becomes a guard
//! checked once both of its variables are bound.

use std::collections::HashSet;

use regex::Regex;

use crate::ast::{Block, BlockKind, CmpOp, EdgeClause, FieldRef, Query};
use crate::error::{QueryError, QueryResult};
use crate::pattern::{CompiledConstraint, GuardEdge, GuardPrec, Plan, PlanStep, VarSource};

/// Field names recognised on a plain (non-`feats.`/`misc.`) constraint —
/// spec.md §4.2's "Recognised fields" list, `pos` included as the `upos`
/// alias.
const RECOGNISED_FIELDS: &[&str] = &["form", "lemma", "upos", "pos", "xpos", "deprel"];

pub fn compile(query: &Query) -> QueryResult<crate::pattern::Pattern> {
    let match_raw = query
        .blocks
        .iter()
        .find(|b| b.kind == BlockKind::Match)
        .ok_or(QueryError::MatchBlockCount(0))?;

    let mut match_block = match_raw.block.clone();
    let mut except_blocks: Vec<Block> = Vec::new();
    let mut optional_blocks: Vec<Block> = Vec::new();

    extract_negations(&mut match_block, &mut except_blocks);

    for raw in &query.blocks {
        match raw.kind {
            BlockKind::Match => {}
            BlockKind::Except => {
                let mut block = raw.block.clone();
                extract_negations(&mut block, &mut except_blocks);
                except_blocks.push(block);
            }
            BlockKind::Optional => {
                let mut block = raw.block.clone();
                extract_negations(&mut block, &mut except_blocks);
                optional_blocks.push(block);
            }
        }
    }

    let match_vars = collect_vars(&match_block);
    let match_plan = compile_block(&match_block, &HashSet::new())?;

    let except_plans = except_blocks
        .iter()
        .map(|b| compile_block(b, &match_vars))
        .collect::<QueryResult<Vec<_>>>()?;
    let optional_plans = optional_blocks
        .iter()
        .map(|b| compile_block(b, &match_vars))
        .collect::<QueryResult<Vec<_>>>()?;

    Ok(crate::pattern::Pattern {
        match_plan,
        except_plans,
        optional_plans,
    })
}

/// Drains every negated edge clause out of `block` and appends a
/// single-edge-clause synthetic EXCEPT block per negation.
fn extract_negations(block: &mut Block, except_blocks: &mut Vec<Block>) {
    let mut kept = Vec::with_capacity(block.edge_clauses.len());
    for edge in block.edge_clauses.drain(..) {
        if edge.negated {
            except_blocks.push(Block {
                node_clauses: Vec::new(),
                edge_clauses: vec![EdgeClause {
                    from: edge.from,
                    to: edge.to,
                    label: edge.label,
                    negated: false,
                }],
                prec_clauses: Vec::new(),
            });
        } else {
            kept.push(edge);
        }
    }
    block.edge_clauses = kept;
}

/// Every variable name mentioned anywhere in `block`, in first-seen
/// (deterministic, plan-order-stable) order.
fn collect_vars(block: &Block) -> HashSet<String> {
    let mut out = HashSet::new();
    for n in &block.node_clauses {
        out.insert(n.var.clone());
    }
    for e in &block.edge_clauses {
        out.insert(e.from.clone());
        out.insert(e.to.clone());
    }
    for p in &block.prec_clauses {
        out.insert(p.left.clone());
        out.insert(p.right.clone());
    }
    out
}

fn ordered_vars(block: &Block) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut push = |v: &str, seen: &mut HashSet<String>, out: &mut Vec<String>| {
        if seen.insert(v.to_string()) {
            out.push(v.to_string());
        }
    };
    for n in &block.node_clauses {
        push(&n.var, &mut seen, &mut out);
    }
    for e in &block.edge_clauses {
        push(&e.from, &mut seen, &mut out);
        push(&e.to, &mut seen, &mut out);
    }
    for p in &block.prec_clauses {
        push(&p.left, &mut seen, &mut out);
        push(&p.right, &mut seen, &mut out);
    }
    out
}

fn constraint_count(block: &Block, var: &str) -> usize {
    block
        .node_clauses
        .iter()
        .filter(|n| n.var == var)
        .map(|n| n.constraints.len())
        .sum()
}

/// Finds an edge clause connecting `var` to some already-bound variable,
/// returning the edge index and whether `var` is the clause's `to` side
/// (i.e. the child).
fn find_reachable_edge<'a>(
    block: &'a Block,
    var: &str,
    bound: &HashSet<String>,
    used: &HashSet<usize>,
) -> Option<(usize, &'a EdgeClause, bool)> {
    for (i, e) in block.edge_clauses.iter().enumerate() {
        if used.contains(&i) {
            continue;
        }
        if e.to == var && bound.contains(&e.from) {
            return Some((i, e, true));
        }
        if e.from == var && bound.contains(&e.to) {
            return Some((i, e, false));
        }
    }
    None
}

fn compile_block(block: &Block, given: &HashSet<String>) -> QueryResult<Plan> {
    let all_vars = ordered_vars(block);
    let mut bound: HashSet<String> = given.clone();
    let mut remaining: Vec<String> = all_vars
        .into_iter()
        .filter(|v| !given.contains(v))
        .collect();

    let mut steps = Vec::new();
    let mut used_edges: HashSet<usize> = HashSet::new();

    while !remaining.is_empty() {
        // Greedy pick: most constraints, tie-broken by edge-reachability
        // from the already-bound set.
        let mut best_idx = 0;
        let mut best_score = (usize::MAX, false);
        for (idx, var) in remaining.iter().enumerate() {
            let cc = constraint_count(block, var);
            let reachable = find_reachable_edge(block, var, &bound, &used_edges).is_some();
            let score = (cc, reachable);
            if idx == 0 || score > best_score {
                best_score = score;
                best_idx = idx;
            }
        }
        let var = remaining.remove(best_idx);

        let source = match find_reachable_edge(block, &var, &bound, &used_edges) {
            Some((edge_idx, edge, is_to)) => {
                used_edges.insert(edge_idx);
                if is_to {
                    VarSource::ChildOf {
                        parent: edge.from.clone(),
                        label: edge.label.clone(),
                    }
                } else {
                    VarSource::ParentOf {
                        child: edge.to.clone(),
                        label: edge.label.clone(),
                    }
                }
            }
            None => VarSource::AnyWord,
        };

        let constraints = compile_constraints(block, &var)?;
        steps.push(PlanStep {
            var: var.clone(),
            source,
            constraints,
        });
        bound.insert(var);
    }

    let guard_edges = block
        .edge_clauses
        .iter()
        .enumerate()
        .filter(|(i, _)| !used_edges.contains(i))
        .map(|(_, e)| GuardEdge {
            from: e.from.clone(),
            to: e.to.clone(),
            label: e.label.clone(),
        })
        .collect();

    let guard_precs = block
        .prec_clauses
        .iter()
        .map(|p| GuardPrec {
            left: p.left.clone(),
            right: p.right.clone(),
            kind: p.kind,
        })
        .collect();

    Ok(Plan {
        steps,
        guard_edges,
        guard_precs,
    })
}

fn compile_constraints(block: &Block, var: &str) -> QueryResult<Vec<CompiledConstraint>> {
    let mut out = Vec::new();
    for clause in block.node_clauses.iter().filter(|n| n.var == var) {
        for c in &clause.constraints {
            if let FieldRef::Plain(name) = &c.field {
                if !RECOGNISED_FIELDS.contains(&name.as_str()) {
                    return Err(QueryError::UnknownField(name.clone()));
                }
            }
            let regex = match c.op {
                CmpOp::Match | CmpOp::NotMatch => Some(Regex::new(&c.value).map_err(|source| {
                    QueryError::InvalidRegex {
                        pattern: c.value.clone(),
                        source,
                    }
                })?),
                CmpOp::Eq | CmpOp::NotEq => None,
            };
            out.push(CompiledConstraint {
                field: c.field.clone(),
                op: c.op,
                value: c.value.clone(),
                regex,
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::pattern::VarSource;

    #[test]
    fn orders_most_constrained_variable_first() {
        let query = parse(
            r#"
            V [upos = "VERB" & lemma = "help"];
            S [upos = "PRON"];
            S -[nsubj]-> V;
            "#,
        )
        .unwrap();
        let pattern = compile(&query).unwrap();
        assert_eq!(pattern.match_plan.steps[0].var, "V");
        match &pattern.match_plan.steps[1].source {
            VarSource::ParentOf { child, label } => {
                assert_eq!(child, "V");
                assert_eq!(label.as_deref(), Some("nsubj"));
            }
            other => panic!("expected ParentOf, got {other:?}"),
        }
    }

    #[test]
    fn negated_edge_becomes_synthetic_except_block() {
        let query = parse(r#"V [upos = "VERB"]; V !-[advmod]-> _;"#).unwrap();
        let pattern = compile(&query).unwrap();
        assert_eq!(pattern.match_plan.steps.len(), 1);
        assert_eq!(pattern.except_plans.len(), 1);
        let except = &pattern.except_plans[0];
        assert_eq!(except.steps.len(), 1);
        match &except.steps[0].source {
            VarSource::ChildOf { parent, label } => {
                assert_eq!(parent, "V");
                assert_eq!(label.as_deref(), Some("advmod"));
            }
            other => panic!("expected ChildOf, got {other:?}"),
        }
    }

    #[test]
    fn optional_block_shares_match_variable_as_given() {
        let query = parse(
            r#"
            MATCH { V [upos = "VERB"]; }
            OPTIONAL { D [upos = "DET"]; V -[det]-> D; }
            "#,
        )
        .unwrap();
        let pattern = compile(&query).unwrap();
        assert_eq!(pattern.optional_plans.len(), 1);
        assert_eq!(pattern.optional_plans[0].steps.len(), 1);
        assert_eq!(pattern.optional_plans[0].steps[0].var, "D");
    }

    #[test]
    fn rejects_invalid_regex_literal() {
        let query = parse(r#"V [form ~ "(unterminated"];"#).unwrap();
        let err = compile(&query).unwrap_err();
        assert!(matches!(err, QueryError::InvalidRegex { .. }));
    }

    #[test]
    fn rejects_unknown_field_name() {
        let query = parse(r#"V [surface = "dog"];"#).unwrap();
        let err = compile(&query).unwrap_err();
        assert!(matches!(err, QueryError::UnknownField(ref f) if f == "surface"));
    }

    #[test]
    fn accepts_pos_alias_for_upos() {
        let query = parse(r#"V [pos = "VERB"];"#).unwrap();
        assert!(compile(&query).is_ok());
    }
}
