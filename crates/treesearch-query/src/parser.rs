//! Recursive-descent parser: token stream -> [`crate::ast::Query`].
//!
//! Supports the block-structured form (`MATCH { ... } EXCEPT { ... }
//! OPTIONAL { ... }`, exactly one `MATCH`) and the bare-clause form (a
//! sequence of clauses with no enclosing block, treated as an implicit
//! single `MATCH` block) for backward compatibility.

use crate::ast::{
    Block, BlockKind, CmpOp, EdgeClause, FieldRef, NodeClause, NodeConstraint, PrecKind,
    PrecedenceClause, Query, RawBlock,
};
use crate::error::{QueryError, QueryResult};
use crate::lexer::{Lexer, Spanned, Tok};

pub fn parse(src: &str) -> QueryResult<Query> {
    let tokens = Lexer::new(src).tokenize()?;
    Parser::new(tokens).parse_query()
}

struct Parser {
    toks: Vec<Spanned>,
    pos: usize,
    anon_counter: usize,
}

impl Parser {
    fn new(toks: Vec<Spanned>) -> Self {
        Self {
            toks,
            pos: 0,
            anon_counter: 0,
        }
    }

    fn peek(&self) -> &Tok {
        &self.toks[self.pos].tok
    }

    fn peek_loc(&self) -> (usize, usize) {
        let s = &self.toks[self.pos];
        (s.line, s.column)
    }

    fn advance(&mut self) -> Tok {
        let tok = self.toks[self.pos].tok.clone();
        if self.pos + 1 < self.toks.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: &Tok, what: &str) -> QueryResult<()> {
        if self.peek() == want {
            self.advance();
            Ok(())
        } else {
            let (line, column) = self.peek_loc();
            Err(QueryError::syntax(
                line,
                column,
                format!("expected {what}, found {:?}", self.peek()),
            ))
        }
    }

    fn fresh_anon(&mut self) -> String {
        self.anon_counter += 1;
        format!("__anon{}", self.anon_counter)
    }

    fn parse_query(&mut self) -> QueryResult<Query> {
        let mut query = Query::default();
        if matches!(self.peek(), Tok::Match | Tok::Except | Tok::Optional) {
            loop {
                let kind = match self.advance() {
                    Tok::Match => BlockKind::Match,
                    Tok::Except => BlockKind::Except,
                    Tok::Optional => BlockKind::Optional,
                    other => {
                        let (line, column) = self.peek_loc();
                        return Err(QueryError::syntax(
                            line,
                            column,
                            format!("expected MATCH/EXCEPT/OPTIONAL, found {other:?}"),
                        ));
                    }
                };
                self.expect(&Tok::LBrace, "`{`")?;
                let block = self.parse_block()?;
                self.expect(&Tok::RBrace, "`}`")?;
                query.blocks.push(RawBlock { kind, block });
                if !matches!(self.peek(), Tok::Match | Tok::Except | Tok::Optional) {
                    break;
                }
            }
        } else if !matches!(self.peek(), Tok::Eof) {
            // Bare-clause form: everything up to EOF is one implicit MATCH block.
            let block = self.parse_block()?;
            query.blocks.push(RawBlock {
                kind: BlockKind::Match,
                block,
            });
        }

        self.expect(&Tok::Eof, "end of query")?;

        let match_count = query
            .blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Match)
            .count();
        if match_count != 1 {
            return Err(QueryError::MatchBlockCount(match_count));
        }
        Ok(query)
    }

    /// Parses clauses until `}` or EOF.
    fn parse_block(&mut self) -> QueryResult<Block> {
        let mut block = Block::default();
        loop {
            if matches!(self.peek(), Tok::RBrace | Tok::Eof) {
                break;
            }
            self.parse_clause(&mut block)?;
        }
        Ok(block)
    }

    fn parse_var_or_anon(&mut self) -> QueryResult<String> {
        match self.advance() {
            Tok::Ident(name) if name == "_" => Ok(self.fresh_anon()),
            Tok::Ident(name) => Ok(name),
            other => {
                let (line, column) = self.peek_loc();
                Err(QueryError::syntax(
                    line,
                    column,
                    format!("expected identifier, found {other:?}"),
                ))
            }
        }
    }

    fn parse_clause(&mut self, block: &mut Block) -> QueryResult<()> {
        let left = self.parse_var_or_anon()?;

        match self.peek() {
            Tok::LBracket => {
                self.advance();
                let constraints = self.parse_constraints()?;
                self.expect(&Tok::RBracket, "`]`")?;
                self.expect(&Tok::Semi, "`;`")?;
                block.node_clauses.push(NodeClause {
                    var: left,
                    constraints,
                });
            }
            Tok::Arrow => {
                self.advance();
                let right = self.parse_var_or_anon()?;
                self.expect(&Tok::Semi, "`;`")?;
                block.edge_clauses.push(EdgeClause {
                    from: left,
                    to: right,
                    label: None,
                    negated: false,
                });
            }
            Tok::NegArrow => {
                self.advance();
                let right = self.parse_var_or_anon()?;
                self.expect(&Tok::Semi, "`;`")?;
                block.edge_clauses.push(EdgeClause {
                    from: left,
                    to: right,
                    label: None,
                    negated: true,
                });
            }
            Tok::EdgeOpen | Tok::NegEdgeOpen => {
                let negated = matches!(self.peek(), Tok::NegEdgeOpen);
                self.advance();
                let label = match self.advance() {
                    Tok::Ident(s) => s,
                    Tok::Str(s) => s,
                    other => {
                        let (line, column) = self.peek_loc();
                        return Err(QueryError::syntax(
                            line,
                            column,
                            format!("expected edge label, found {other:?}"),
                        ));
                    }
                };
                self.expect(&Tok::EdgeClose, "`]->`")?;
                let right = self.parse_var_or_anon()?;
                self.expect(&Tok::Semi, "`;`")?;
                block.edge_clauses.push(EdgeClause {
                    from: left,
                    to: right,
                    label: Some(label),
                    negated,
                });
            }
            Tok::PrecBefore | Tok::PrecImmBefore | Tok::PrecAfter | Tok::PrecImmAfter => {
                let tok = self.advance();
                let right = self.parse_var_or_anon()?;
                self.expect(&Tok::Semi, "`;`")?;
                let (left, right, kind) = match tok {
                    Tok::PrecBefore => (left, right, PrecKind::Before),
                    Tok::PrecImmBefore => (left, right, PrecKind::ImmediatelyBefore),
                    Tok::PrecAfter => (right, left, PrecKind::Before),
                    Tok::PrecImmAfter => (right, left, PrecKind::ImmediatelyBefore),
                    _ => unreachable!(),
                };
                block.prec_clauses.push(PrecedenceClause { left, right, kind });
            }
            other => {
                let (line, column) = self.peek_loc();
                return Err(QueryError::syntax(
                    line,
                    column,
                    format!(
                        "expected `[`, `->`, `!->`, `-[`, `!-[`, `<<`, `<`, `>>`, or `>` after identifier, found {other:?}"
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Parses `&`-joined constraints inside `[...]`. An empty bracket
    /// (`A [];`) is a node clause with no constraints — matches any word,
    /// used purely to declare a variable.
    fn parse_constraints(&mut self) -> QueryResult<Vec<NodeConstraint>> {
        if matches!(self.peek(), Tok::RBracket) {
            return Ok(Vec::new());
        }
        let mut out = vec![self.parse_constraint()?];
        while matches!(self.peek(), Tok::Amp) {
            self.advance();
            out.push(self.parse_constraint()?);
        }
        Ok(out)
    }

    fn parse_constraint(&mut self) -> QueryResult<NodeConstraint> {
        let field = self.parse_field_ref()?;
        let op = match self.advance() {
            Tok::Eq => CmpOp::Eq,
            Tok::NotEq => CmpOp::NotEq,
            Tok::Tilde => CmpOp::Match,
            Tok::NotTilde => CmpOp::NotMatch,
            other => {
                let (line, column) = self.peek_loc();
                return Err(QueryError::syntax(
                    line,
                    column,
                    format!("expected comparison operator, found {other:?}"),
                ));
            }
        };
        let value = match self.advance() {
            Tok::Str(s) => s,
            other => {
                let (line, column) = self.peek_loc();
                return Err(QueryError::syntax(
                    line,
                    column,
                    format!("expected quoted string literal, found {other:?}"),
                ));
            }
        };
        Ok(NodeConstraint { field, op, value })
    }

    fn parse_field_ref(&mut self) -> QueryResult<FieldRef> {
        let name = match self.advance() {
            Tok::Ident(s) => s,
            other => {
                let (line, column) = self.peek_loc();
                return Err(QueryError::syntax(
                    line,
                    column,
                    format!("expected field name, found {other:?}"),
                ));
            }
        };
        if matches!(self.peek(), Tok::Dot) && (name == "feats" || name == "misc") {
            self.advance();
            let sub = match self.advance() {
                Tok::Ident(s) => s,
                other => {
                    let (line, column) = self.peek_loc();
                    return Err(QueryError::syntax(
                        line,
                        column,
                        format!("expected attribute name after `{name}.`, found {other:?}"),
                    ));
                }
            };
            return Ok(if name == "feats" {
                FieldRef::Feat(sub)
            } else {
                FieldRef::Misc(sub)
            });
        }
        Ok(FieldRef::Plain(name))
    }
}
