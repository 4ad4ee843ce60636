// File: src/repl.rs
//
// Interactive REPL (Read-Eval-Print Loop) for the Sprig language.
// Provides an interactive shell for executing Sprig code with features like:
// - Multi-line input until braces, brackets and parentheses balance
// - Command history with up/down arrow navigation
// - Special commands (:help, :quit, :vars, :reset)
// - Persistent state across inputs through a single Session

use crate::builtins::BUILTIN_NAMES;
use crate::errors::SprigError;
use crate::interpreter::Value;
use crate::session::{Config, Session};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Source name used in error locations for REPL input
pub const REPL_SOURCE: &str = "<repl>";

/// REPL session that keeps lexer, symbol table and bindings between inputs
pub struct Repl {
    session: Session,
    editor: DefaultEditor,
}

impl Repl {
    pub fn new(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let editor = DefaultEditor::new()?;
        Ok(Repl { session: Session::new(config).with_source_name(REPL_SOURCE), editor })
    }

    fn show_banner(&self) {
        println!(
            "{} {}",
            "Sprig REPL".bright_cyan().bold(),
            format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
        );
        println!(
            "  Type {} for commands or {} to exit",
            ":help".bright_yellow(),
            ":quit".bright_yellow()
        );
        println!();
    }

    /// Starts the REPL loop
    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.show_banner();

        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() {
                "sprig> ".bright_green().to_string()
            } else {
                "....> ".bright_blue().to_string()
            };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(line.as_str());

                    // Commands are only recognised outside multi-line input
                    if buffer.is_empty() && line.trim().starts_with(':') {
                        if self.handle_command(line.trim()) {
                            continue;
                        }
                        break;
                    }

                    buffer.push_str(&line);
                    buffer.push('\n');

                    if is_input_complete(&buffer) {
                        self.eval_input(&buffer);
                        buffer.clear();
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C (:quit to exit)".bright_yellow());
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "Goodbye!".bright_cyan());
                    break;
                }
                Err(err) => {
                    eprintln!("{} {}", "Error:".bright_red(), err);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handles commands starting with ':'; returns false to quit
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":help" | ":h" => {
                self.show_help();
                true
            }
            ":quit" | ":q" | ":exit" => {
                println!("{}", "Goodbye!".bright_cyan());
                false
            }
            ":vars" | ":v" => {
                self.show_variables();
                true
            }
            ":reset" | ":r" => {
                self.session.reset();
                println!("{}", "Environment reset".bright_green());
                true
            }
            _ => {
                println!(
                    "{} Unknown command: {}. Type {} for available commands.",
                    "Error:".bright_red(),
                    cmd.bright_yellow(),
                    ":help".bright_yellow()
                );
                true
            }
        }
    }

    fn show_help(&self) {
        println!();
        println!("{}", "REPL Commands:".bright_cyan().bold());
        println!("  {}{}  Display this help message", ":help".bright_yellow(), " or :h ".dimmed());
        println!("  {}{}  Exit the REPL", ":quit".bright_yellow(), " or :q ".dimmed());
        println!("  {}{}  Show global bindings", ":vars".bright_yellow(), " or :v ".dimmed());
        println!("  {}{}  Forget every declaration", ":reset".bright_yellow(), " or :r".dimmed());
        println!();
        println!("{} {}", "Built-ins:".bright_cyan().bold(), BUILTIN_NAMES.join(", "));
        println!();
        println!("{}", "Example:".bright_cyan().bold());
        println!("  {}", "sprig> func add(a, b) : \"sum of two ints\" {".dimmed());
        println!("  {}", "....>     return a + b".dimmed());
        println!("  {}", "....> }".dimmed());
        println!("  {}", "sprig> add(2, 3)".dimmed());
        println!();
    }

    fn show_variables(&self) {
        let globals = self.session.interpreter().globals();
        let globals = globals.borrow();
        let names = globals.names();

        println!();
        if names.is_empty() {
            println!("  {}", "(no bindings)".dimmed());
        }
        for name in names {
            let Some(value) = globals.get(&name) else {
                continue;
            };
            match &value {
                Value::Function(function) => {
                    let description = function
                        .description
                        .as_ref()
                        .map(|d| format!("  # {}", d))
                        .unwrap_or_default();
                    println!("  {} {}", value.to_string().bright_cyan(), description.dimmed());
                }
                _ => println!(
                    "  {} = {} {}",
                    name.bright_yellow(),
                    value,
                    format!("({})", value.type_name()).dimmed()
                ),
            }
        }
        println!();
    }

    fn eval_input(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }
        match self.session.eval(input) {
            Ok(results) => {
                for result in results {
                    println!("{} {}", "=>".bright_blue(), result.bright_white());
                }
            }
            Err(err) => self.print_error(&err),
        }
    }

    fn print_error(&self, err: &SprigError) {
        eprint!("{}", err);
    }
}

/// True when every brace, bracket and parenthesis outside strings and
/// comments is closed
pub fn is_input_complete(input: &str) -> bool {
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escape_next = false;
    let mut in_comment = false;

    for ch in input.chars() {
        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
            continue;
        }
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '#' if !in_string => in_comment = true,
            '{' | '[' | '(' if !in_string => depth += 1,
            '}' | ']' | ')' if !in_string => depth -= 1,
            _ => {}
        }
    }

    !in_string && depth <= 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_completeness() {
        assert!(is_input_complete("1 + 1\n"));
        assert!(!is_input_complete("func f() {\n"));
        assert!(is_input_complete("func f() {\n return 1\n}\n"));
        assert!(is_input_complete("print(\"{\")\n"));
        assert!(!is_input_complete("print(\"unterminated\n"));
        assert!(is_input_complete("1 # (\n"));
    }
}
