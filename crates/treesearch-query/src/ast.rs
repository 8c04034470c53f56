//! AST produced by [`crate::lexer`]/[`crate::parser`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Match,
    NotMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    /// `form`, `lemma`, `upos`/`pos`, `xpos`, `deprel`.
    Plain(String),
    Feat(String),
    Misc(String),
}

#[derive(Debug, Clone)]
pub struct NodeConstraint {
    pub field: FieldRef,
    pub op: CmpOp,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct NodeClause {
    pub var: String,
    pub constraints: Vec<NodeConstraint>,
}

#[derive(Debug, Clone)]
pub struct EdgeClause {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub negated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecKind {
    /// `left.index < right.index`
    Before,
    /// `left.index + 1 == right.index`
    ImmediatelyBefore,
}

#[derive(Debug, Clone)]
pub struct PrecedenceClause {
    pub left: String,
    pub right: String,
    pub kind: PrecKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Match,
    Except,
    Optional,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub node_clauses: Vec<NodeClause>,
    pub edge_clauses: Vec<EdgeClause>,
    pub prec_clauses: Vec<PrecedenceClause>,
}

#[derive(Debug, Clone)]
pub struct RawBlock {
    pub kind: BlockKind,
    pub block: Block,
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    pub blocks: Vec<RawBlock>,
}
