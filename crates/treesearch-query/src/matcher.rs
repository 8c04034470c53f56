//! Backtracking join that walks a [`Plan`] against a [`Tree`].
//!
//! Enumeration at every plan step proceeds in ascending word-index order,
//! so two runs against the same tree and pattern always produce bindings
//! in the same order. A MATCH binding is rejected if any EXCEPT plan can
//! be completed at least once from it;
//! OPTIONAL plans each contribute either their own completions or (if
//! none exist) leave the binding unchanged, and multiple OPTIONAL blocks
//! combine as a Cartesian product.

use std::collections::HashMap;

use treesearch_core::Tree;

use crate::ast::PrecKind;
use crate::pattern::{project_binding, Binding, Pattern, Plan, PlanStep, VarSource};

type RawBinding = HashMap<String, usize>;

/// Every MATCH binding (after EXCEPT rejection and OPTIONAL expansion)
/// that `pattern` produces against `tree`, in deterministic order.
pub fn find_matches(pattern: &Pattern, tree: &Tree) -> Vec<Binding> {
    let mut out = Vec::new();
    let mut binding = RawBinding::new();
    enumerate_plan(&pattern.match_plan, tree, &mut binding, &mut |complete| {
        if except_blocks_reject(pattern, tree, complete) {
            return;
        }
        for expanded in expand_optionals(pattern, tree, complete) {
            out.push(project_binding(&expanded));
        }
    });
    out
}

fn except_blocks_reject(pattern: &Pattern, tree: &Tree, match_binding: &RawBinding) -> bool {
    pattern.except_plans.iter().any(|plan| {
        let mut found = false;
        let mut binding = match_binding.clone();
        enumerate_plan(plan, tree, &mut binding, &mut |_| {
            found = true;
        });
        found
    })
}

fn expand_optionals(
    pattern: &Pattern,
    tree: &Tree,
    match_binding: &RawBinding,
) -> Vec<RawBinding> {
    let mut results = vec![match_binding.clone()];
    for plan in &pattern.optional_plans {
        let mut completions: Vec<RawBinding> = Vec::new();
        let mut binding = match_binding.clone();
        enumerate_plan(plan, tree, &mut binding, &mut |complete| {
            let mut extension = RawBinding::new();
            for step in &plan.steps {
                extension.insert(step.var.clone(), complete[&step.var]);
            }
            completions.push(extension);
        });
        let options = if completions.is_empty() {
            vec![RawBinding::new()]
        } else {
            completions
        };

        let mut next = Vec::with_capacity(results.len() * options.len());
        for base in &results {
            for opt in &options {
                let mut merged = base.clone();
                merged.extend(opt.iter().map(|(k, v)| (k.clone(), *v)));
                next.push(merged);
            }
        }
        results = next;
    }
    results
}

/// Recursively binds every step of `plan`, invoking `on_complete` once
/// per full binding that also satisfies the plan's guards.
fn enumerate_plan(
    plan: &Plan,
    tree: &Tree,
    binding: &mut RawBinding,
    on_complete: &mut dyn FnMut(&RawBinding),
) {
    step(plan, 0, tree, binding, on_complete);
}

fn step(
    plan: &Plan,
    step_idx: usize,
    tree: &Tree,
    binding: &mut RawBinding,
    on_complete: &mut dyn FnMut(&RawBinding),
) {
    if step_idx == plan.steps.len() {
        if guards_satisfied(plan, tree, binding) {
            on_complete(binding);
        }
        return;
    }

    let plan_step = &plan.steps[step_idx];
    for candidate in candidates_for(plan_step, tree, binding) {
        let word = tree.raw_word(candidate);
        if plan_step
            .constraints
            .iter()
            .all(|c| c.is_satisfied_by(word))
        {
            binding.insert(plan_step.var.clone(), candidate);
            step(plan, step_idx + 1, tree, binding, on_complete);
            binding.remove(&plan_step.var);
        }
    }
}

/// Whether `pattern` has at least one MATCH binding against `tree` that
/// survives EXCEPT rejection, without enumerating every binding or
/// expanding OPTIONAL blocks — OPTIONAL always contributes at least the
/// unextended binding, so the first surviving MATCH completion is enough
/// to answer the question. Used by `Treebank::filter`'s per-tree dedup.
pub fn has_match(pattern: &Pattern, tree: &Tree) -> bool {
    let mut binding = RawBinding::new();
    step_any(&pattern.match_plan, 0, tree, &mut binding, &mut |complete| {
        !except_blocks_reject(pattern, tree, complete)
    })
}

/// Like [`step`], but short-circuits as soon as `accept` returns `true`
/// for some complete, guard-satisfying binding.
fn step_any(
    plan: &Plan,
    step_idx: usize,
    tree: &Tree,
    binding: &mut RawBinding,
    accept: &mut dyn FnMut(&RawBinding) -> bool,
) -> bool {
    if step_idx == plan.steps.len() {
        return guards_satisfied(plan, tree, binding) && accept(binding);
    }

    let plan_step = &plan.steps[step_idx];
    for candidate in candidates_for(plan_step, tree, binding) {
        let word = tree.raw_word(candidate);
        if plan_step
            .constraints
            .iter()
            .all(|c| c.is_satisfied_by(word))
        {
            binding.insert(plan_step.var.clone(), candidate);
            let hit = step_any(plan, step_idx + 1, tree, binding, accept);
            binding.remove(&plan_step.var);
            if hit {
                return true;
            }
        }
    }
    false
}

fn candidates_for(plan_step: &PlanStep, tree: &Tree, binding: &RawBinding) -> Vec<usize> {
    match &plan_step.source {
        VarSource::AnyWord => (0..tree.len()).collect(),
        VarSource::ChildOf { parent, label } => {
            let parent_idx = binding[parent];
            tree.children(parent_idx)
                .iter()
                .copied()
                .filter(|&c| label_matches(tree, c, label))
                .collect()
        }
        VarSource::ParentOf { child, label } => {
            let child_idx = binding[child];
            match tree.raw_word(child_idx).head_index {
                Some(p) if label_matches(tree, child_idx, label) => vec![p],
                _ => Vec::new(),
            }
        }
    }
}

fn label_matches(tree: &Tree, child_idx: usize, label: &Option<String>) -> bool {
    match label {
        Some(l) => tree.raw_word(child_idx).deprel == *l,
        None => true,
    }
}

fn guards_satisfied(plan: &Plan, tree: &Tree, binding: &RawBinding) -> bool {
    for guard in &plan.guard_edges {
        let parent_idx = binding[&guard.from];
        let child_idx = binding[&guard.to];
        if tree.raw_word(child_idx).head_index != Some(parent_idx) {
            return false;
        }
        if !label_matches(tree, child_idx, &guard.label) {
            return false;
        }
    }
    for guard in &plan.guard_precs {
        let left_idx = binding[&guard.left];
        let right_idx = binding[&guard.right];
        let ok = match guard.kind {
            PrecKind::Before => left_idx < right_idx,
            PrecKind::ImmediatelyBefore => left_idx + 1 == right_idx,
        };
        if !ok {
            return false;
        }
    }
    true
}
