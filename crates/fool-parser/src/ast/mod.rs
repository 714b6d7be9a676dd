//! Syntax tree for FOOL.
//!
//! This module provides:
//! - the arena [`Tree`] and its [`Node`] variants
//! - the closed set of FOOL [`Type`]s
//! - the parser that builds a tree from source text
//! - an indented printer for debugging

pub mod node;
pub mod ops;
pub mod printer;
pub mod tree;
pub mod types;

mod expr_parser;
mod parser;

pub use fool_core::{ParseError, ParseErrorKind, ParseErrors};

pub use node::*;
pub use ops::*;
pub use parser::Parser;
pub use printer::{NodeAnnotations, TreeDump};
pub use tree::Tree;
pub use types::*;
