//! FOOL front end and syntax tree.
//!
//! This crate provides:
//! - Lexical analysis (tokenization)
//! - The arena syntax tree shared by every compiler pass
//! - A parser from source text to tree
//!
//! # Example
//!
//! ```
//! use fool_parser::Parser;
//!
//! let source = "let var x:int = 5; in print(x);";
//!
//! match Parser::parse(source) {
//!     Ok(tree) => println!("parsed {} nodes", tree.len()),
//!     Err(errors) => eprintln!("parse errors: {}", errors),
//! }
//! ```

pub mod ast;
pub mod lexer;

pub use ast::{Node, NodeId, Parser, Tree, Type};
pub use lexer::{Lexer, Token, TokenKind};
