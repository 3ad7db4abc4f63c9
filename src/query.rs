//! Query expression trees and their parser.

pub mod parser;
pub mod tree;

pub use parser::QueryParser;
pub use tree::{CompareOp, Literal, Node, NodeId, NodeKind, QueryTree};

/// Parse query text with the default parser.
pub fn parse(query: &str) -> crate::error::Result<QueryTree> {
    QueryParser::new().parse(query)
}
