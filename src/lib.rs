// File: src/lib.rs
//
// Library interface for the Sprig interpreter.
// Exposes the lexer, parser, interpreter and session for the binary,
// integration tests and embedders.

pub mod ast;
pub mod builtins;
pub mod errors;
pub mod interpreter;
pub mod lexer;
pub mod module;
pub mod parser;
pub mod repl;
pub mod session;
pub mod snapshot;
pub mod symtable;

pub use errors::{ErrorKind, SprigError};
pub use interpreter::Value;
pub use session::{Config, Session};
