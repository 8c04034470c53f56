//! Compiled query representation consumed by [`crate::matcher`]. A
//! [`Pattern`] is produced once by [`crate::compiler::compile`] and then
//! reused across every tree in a treebank.

use std::collections::HashMap;

use regex::Regex;
use treesearch_core::Word;

use crate::ast::{CmpOp, FieldRef, PrecKind};

/// How a plan step's candidate word is discovered.
#[derive(Debug, Clone)]
pub enum VarSource {
    /// Enumerate every word in the tree, in ascending index order.
    AnyWord,
    /// Enumerate the already-bound variable's children (optionally
    /// filtered to a DEPREL label).
    ChildOf { parent: String, label: Option<String> },
    /// Enumerate the already-bound variable's parent (at most one
    /// candidate, but represented uniformly with `ChildOf`).
    ParentOf { child: String, label: Option<String> },
}

#[derive(Debug, Clone)]
pub struct CompiledConstraint {
    pub field: FieldRef,
    pub op: CmpOp,
    pub value: String,
    pub regex: Option<Regex>,
}

impl CompiledConstraint {
    pub fn is_satisfied_by(&self, word: &Word) -> bool {
        let actual = resolve_field(word, &self.field);
        match self.op {
            CmpOp::Eq => actual == Some(self.value.as_str()),
            CmpOp::NotEq => actual != Some(self.value.as_str()),
            CmpOp::Match => actual
                .map(|a| self.regex.as_ref().expect("compiled").is_match(a))
                .unwrap_or(false),
            CmpOp::NotMatch => !actual
                .map(|a| self.regex.as_ref().expect("compiled").is_match(a))
                .unwrap_or(false),
        }
    }
}

pub fn resolve_field<'a>(word: &'a Word, field: &FieldRef) -> Option<&'a str> {
    match field {
        FieldRef::Plain(name) => word.field(name),
        FieldRef::Feat(name) => word.feat(name),
        FieldRef::Misc(name) => word.misc(name),
    }
}

/// One variable's binding step within a [`Plan`].
#[derive(Debug, Clone)]
pub struct PlanStep {
    pub var: String,
    pub source: VarSource,
    pub constraints: Vec<CompiledConstraint>,
}

/// A guard checked once both endpoints of an edge clause are bound,
/// rather than used to generate candidates for either of them.
#[derive(Debug, Clone)]
pub struct GuardEdge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GuardPrec {
    pub left: String,
    pub right: String,
    pub kind: PrecKind,
}

/// A fully ordered, compiled block: the sequence of variable-binding
/// steps plus the guards checked once all of a block's variables are
/// bound.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
    pub guard_edges: Vec<GuardEdge>,
    pub guard_precs: Vec<GuardPrec>,
}

/// A compiled query: one MATCH plan plus zero or more EXCEPT/OPTIONAL
/// plans that extend MATCH bindings.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub match_plan: Plan,
    pub except_plans: Vec<Plan>,
    pub optional_plans: Vec<Plan>,
}

/// One complete MATCH binding: variable name -> word index in the tree
/// it was matched against. Anonymous (`_`) endpoints are never present
/// here — they're existential, not part of the result.
pub type Binding = HashMap<String, usize>;

pub(crate) fn is_anonymous(var: &str) -> bool {
    var.starts_with("__anon")
}

/// Projects a raw (possibly anon-containing) binding map down to the
/// public result a caller sees.
pub(crate) fn project_binding(raw: &HashMap<String, usize>) -> Binding {
    raw.iter()
        .filter(|(k, _)| !is_anonymous(k))
        .map(|(k, v)| (k.clone(), *v))
        .collect()
}
