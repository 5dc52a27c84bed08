// Phae Language Interpreter Library
//
// Scanner, recursive-descent parser and tree-walking evaluator for Phae, a
// small interactive scripting language with integers, strings, functions
// and console input.

// Public modules
pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod value;

// Re-export commonly used items
pub use ast::{BinaryOp, Expr, FunctionDecl, Program, RangeExpr, Stmt};
pub use error::{ErrorKind, PhaeError, RuntimeErrorKind, Span};
pub use evaluator::{ControlFlow, Evaluator, Scope};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::Parser;
pub use value::Value;

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::{compile, dump_tokens, on_interpreter_stack, read_source, run, run_source};
