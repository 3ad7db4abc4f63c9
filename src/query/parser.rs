//! Parser for boolean query expressions.
//!
//! Parses text such as `content:within(TEXT, 3, termOffsetMap, 'quick', 'fox') && TEXT == 'quick'`
//! into a [`QueryTree`]. Redundant parentheses disappear and nested
//! conjunctions or disjunctions are flattened into a single node.

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::error::{ProximaError, Result};
use crate::query::tree::{CompareOp, Literal, NodeId, NodeKind, QueryTree};

/// Pest grammar parser for query expressions.
#[derive(Parser)]
#[grammar = "query/parser.pest"]
struct QueryExpressionParser;

/// Intermediate form, flattened before it is written into the arena.
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Delayed(Box<Expr>),
    Function {
        namespace: String,
        name: String,
        args: Vec<Expr>,
    },
    Comparison(CompareOp, Box<Expr>, Box<Expr>),
    Identifier(String),
    Literal(Literal),
}

/// Parser for query expressions.
///
/// # Supported Syntax
///
/// - `A && B`, `A || B`, `!A`, `( ... )`
/// - `FIELD == 'value'`, `!=`, `=~`, `!~`, `<`, `<=`, `>`, `>=`
/// - `namespace:name(arg, ...)` function calls
/// - `((_Delayed_ = true) && (...))` marks a deferred subtree
/// - string (single or double quoted), number, `true`/`false` and `null` literals
///
/// # Example
///
/// ```
/// use proxima::query::{NodeKind, QueryParser};
///
/// let tree = QueryParser::new()
///     .parse("content:phrase(TEXT, termOffsetMap, 'quick', 'fox') && TEXT == 'quick'")
///     .unwrap();
/// let and = tree.children(tree.root())[0];
/// assert_eq!(tree.kind(and), Some(&NodeKind::And));
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryParser;

impl QueryParser {
    pub fn new() -> Self {
        QueryParser
    }

    /// Parse query text into a tree.
    pub fn parse(&self, query: &str) -> Result<QueryTree> {
        let mut pairs = QueryExpressionParser::parse(Rule::script, query)
            .map_err(|e| ProximaError::parse(format!("Failed to parse query: {e}")))?;

        let script = pairs
            .next()
            .ok_or_else(|| ProximaError::parse("Query must contain an expression"))?;
        let expr_pair = script
            .into_inner()
            .find(|p| p.as_rule() == Rule::expr)
            .ok_or_else(|| ProximaError::parse("Query must contain an expression"))?;

        let expr = build(expr_pair)?;
        let mut tree = QueryTree::new();
        let root = tree.root();
        insert(&mut tree, root, expr);
        Ok(tree)
    }
}

fn build(pair: Pair<Rule>) -> Result<Expr> {
    match pair.as_rule() {
        Rule::expr => {
            let operands = pair.into_inner().map(build).collect::<Result<Vec<_>>>()?;
            Ok(flatten(operands, false))
        }
        Rule::and_expr => {
            let operands = pair.into_inner().map(build).collect::<Result<Vec<_>>>()?;
            Ok(flatten(operands, true))
        }
        Rule::unary => {
            let mut negations = 0;
            let mut primary = None;
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::not_op {
                    negations += 1;
                } else {
                    primary = Some(build(inner)?);
                }
            }
            let mut expr = primary.ok_or_else(|| ProximaError::parse("Negation without an operand"))?;
            for _ in 0..negations {
                expr = Expr::Not(Box::new(expr));
            }
            Ok(expr)
        }
        Rule::delayed => {
            let inner = pair
                .into_inner()
                .next()
                .ok_or_else(|| ProximaError::parse("Delayed marker without a subtree"))?;
            Ok(Expr::Delayed(Box::new(build(inner)?)))
        }
        Rule::function => {
            let mut namespace = String::new();
            let mut name = String::new();
            let mut args = Vec::new();
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::namespace => namespace = inner.as_str().to_string(),
                    Rule::name => name = inner.as_str().to_string(),
                    _ => args.push(build(inner)?),
                }
            }
            Ok(Expr::Function { namespace, name, args })
        }
        Rule::comparison => {
            let mut inner = pair.into_inner();
            let (Some(left), Some(op), Some(right)) = (inner.next(), inner.next(), inner.next()) else {
                return Err(ProximaError::parse("Incomplete comparison"));
            };
            let op = compare_op(op.as_str())?;
            Ok(Expr::Comparison(op, Box::new(build(left)?), Box::new(build(right)?)))
        }
        Rule::string => {
            let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Ok(Expr::Literal(Literal::String(unescape(raw))))
        }
        Rule::number => {
            let n = pair
                .as_str()
                .parse::<f64>()
                .map_err(|e| ProximaError::parse(format!("Invalid number `{}`: {e}", pair.as_str())))?;
            Ok(Expr::Literal(Literal::Number(n)))
        }
        Rule::boolean => Ok(Expr::Literal(Literal::Boolean(pair.as_str() == "true"))),
        Rule::null => Ok(Expr::Literal(Literal::Null)),
        Rule::identifier => Ok(Expr::Identifier(pair.as_str().to_string())),
        rule => Err(ProximaError::parse(format!("Unexpected rule {rule:?}"))),
    }
}

/// Collapse a single operand and pull same-kind children up into the parent.
fn flatten(mut operands: Vec<Expr>, conjunction: bool) -> Expr {
    if operands.len() == 1 {
        return operands.remove(0);
    }
    let mut flat = Vec::with_capacity(operands.len());
    for operand in operands {
        match operand {
            Expr::And(children) if conjunction => flat.extend(children),
            Expr::Or(children) if !conjunction => flat.extend(children),
            other => flat.push(other),
        }
    }
    if conjunction { Expr::And(flat) } else { Expr::Or(flat) }
}

fn compare_op(symbol: &str) -> Result<CompareOp> {
    Ok(match symbol {
        "==" => CompareOp::Eq,
        "!=" => CompareOp::Ne,
        "=~" => CompareOp::RegexMatch,
        "!~" => CompareOp::RegexNotMatch,
        "<" => CompareOp::Lt,
        "<=" => CompareOp::Le,
        ">" => CompareOp::Gt,
        ">=" => CompareOp::Ge,
        other => return Err(ProximaError::parse(format!("Unknown operator `{other}`"))),
    })
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn insert(tree: &mut QueryTree, parent: NodeId, expr: Expr) -> NodeId {
    match expr {
        Expr::And(children) => insert_with_children(tree, parent, NodeKind::And, children),
        Expr::Or(children) => insert_with_children(tree, parent, NodeKind::Or, children),
        Expr::Not(child) => insert_with_children(tree, parent, NodeKind::Not, vec![*child]),
        Expr::Delayed(child) => insert_with_children(tree, parent, NodeKind::Delayed, vec![*child]),
        Expr::Function { namespace, name, args } => {
            insert_with_children(tree, parent, NodeKind::Function { namespace, name }, args)
        }
        Expr::Comparison(op, left, right) => {
            insert_with_children(tree, parent, NodeKind::Comparison(op), vec![*left, *right])
        }
        Expr::Identifier(name) => tree.add_node(parent, NodeKind::Identifier(name)),
        Expr::Literal(lit) => tree.add_node(parent, NodeKind::Literal(lit)),
    }
}

fn insert_with_children(tree: &mut QueryTree, parent: NodeId, kind: NodeKind, children: Vec<Expr>) -> NodeId {
    let id = tree.add_node(parent, kind);
    for child in children {
        insert(tree, id, child);
    }
    id
}
