// File: src/session.rs
//
// Program entry point for the Sprig language.
// A Session owns the lexer, the symbol table and the interpreter so that
// consecutive inputs (REPL lines, or a script followed by more code) see the
// names and values declared by earlier ones.

use crate::ast::Program;
use crate::errors::SprigError;
use crate::interpreter::{Interpreter, Value};
use crate::lexer::{Lexer, MAIN_SOURCE};
use crate::module::{FsModuleReader, ModuleReader};
use crate::parser::Parser;
use crate::symtable::{BlockScopeVisibility, SymbolTable};
use std::path::PathBuf;

/// Runtime settings, normally assembled by the CLI
#[derive(Debug, Clone)]
pub struct Config {
    /// Directories searched, in order, for `from "<module>"`
    pub search_paths: Vec<PathBuf>,
    pub block_scope: BlockScopeVisibility,
    /// Values returned by `arg(i)`
    pub args: Vec<Value>,
}

impl Config {
    /// Converts raw command-line arguments with `Value::from_arg`
    pub fn with_args<S: AsRef<str>>(mut self, args: &[S]) -> Self {
        self.args = args.iter().map(|arg| Value::from_arg(arg.as_ref())).collect();
        self
    }

    pub fn reader(&self) -> FsModuleReader {
        FsModuleReader::with_search_paths(self.search_paths.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            search_paths: FsModuleReader::new().search_paths().to_vec(),
            block_scope: BlockScopeVisibility::default(),
            args: Vec::new(),
        }
    }
}

pub struct Session {
    reader: Box<dyn ModuleReader>,
    lexer: Lexer,
    symtable: SymbolTable,
    interpreter: Interpreter,
}

impl Session {
    /// Creates a session reading modules from the configured search paths
    pub fn new(config: Config) -> Self {
        let reader = config.reader();
        Self::with_reader(Box::new(reader), config)
    }

    /// Creates a session with a custom module reader; `config.search_paths` is unused
    pub fn with_reader(reader: Box<dyn ModuleReader>, config: Config) -> Self {
        Session {
            reader,
            lexer: Lexer::default(),
            symtable: SymbolTable::with_policy(config.block_scope),
            interpreter: Interpreter::with_args(config.args),
        }
    }

    /// Names the main source in error locations (a script path, `<repl>`)
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.lexer = Lexer::new(name, Vec::new());
        self
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn symtable(&self) -> &SymbolTable {
        &self.symtable
    }

    /// Queues source bytes as-is; they are consumed by the next `parse` or `run`
    ///
    /// A token may span two writes.
    pub fn write(&mut self, bytes: &[u8]) {
        self.lexer.write(bytes);
    }

    /// Parses every queued byte into a Program
    ///
    /// On failure the queued input is dropped and the symbol table is
    /// restored to what it was before the call.
    pub fn parse(&mut self) -> Result<Program, SprigError> {
        let checkpoint = self.symtable.clone();
        let lexer = std::mem::take(&mut self.lexer);
        let symtable = std::mem::take(&mut self.symtable);

        let mut parser = Parser::new(self.reader.as_ref(), symtable);
        let result = parser.parse(lexer);
        let (lexer, symtable) = parser.into_parts();

        match result {
            Ok(program) => {
                self.lexer = lexer;
                self.symtable = symtable;
                Ok(program)
            }
            Err(error) => {
                self.lexer = Lexer::new(lexer.name(), Vec::new());
                self.symtable = checkpoint;
                Err(error)
            }
        }
    }

    /// Parses and evaluates every queued byte
    ///
    /// Results of a failed evaluation are discarded; bindings made before the
    /// failure stay in place.
    pub fn run(&mut self) -> Result<Vec<String>, SprigError> {
        let program = self.parse()?;
        self.interpreter.run(&program)
    }

    /// Runs `source` as one complete input line
    pub fn eval(&mut self, source: &str) -> Result<Vec<String>, SprigError> {
        self.write(source.as_bytes());
        if !source.ends_with('\n') {
            self.write(b"\n");
        }
        self.run()
    }

    /// Forgets every declared name and global binding
    pub fn reset(&mut self) {
        let name = self.lexer.name().to_string();
        self.lexer = Lexer::new(name, Vec::new());
        self.symtable = SymbolTable::with_policy(self.symtable.policy());
        self.interpreter.reset();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Config::default()).with_source_name(MAIN_SOURCE)
    }
}
