// File: src/lexer.rs
//
// Lexical analyzer (tokenizer) for the Sprig language.
// Produces tokens one at a time from a growable byte buffer (pull model).
//
// Supports:
// - Declarations: `var name =`, `func name`, and the `:` description marker
// - Keywords: if, return, from, as, print, arg, concat, map, filter, true, false
// - Identifiers, integers with `_` separators, string literals with escapes
// - Operators: + - * / > < == != && || !
// - Punctuation: ( ) { } [ ] ,
// - Separators: whitespace and `;`; comments starting with #
//
// A lexer may be chained to the lexer of the file that imported it. The chain
// is not used for tokenizing; the parser walks it back once a module's token
// stream is exhausted.

use crate::errors::{SourceLocation, SprigError};
use log::trace;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::fmt;

/// Source name used for the entry program
pub const MAIN_SOURCE: &str = "<main>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenTag {
    // Literals
    Num,
    Str,
    Log,
    Ident,
    // Keywords
    If,
    DeclFn,
    Return,
    ReturnVoid,
    From,
    As,
    CallPrint,
    CallArg,
    CallConcat,
    CallMap,
    CallFilter,
    DescFunc,
    // Operators
    OpAdd,
    OpSub,
    OpMul,
    OpDiv,
    RelGt,
    RelLt,
    RelEq,
    RelDif,
    LogAnd,
    LogOr,
    Neg,
    Assign,
    // Punctuation
    ParenO,
    ParenC,
    BrackO,
    BrackC,
    SBrackO,
    SBrackC,
    Comma,
    Eof,
}

impl fmt::Display for TokenTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TokenTag::Num => "NUM",
            TokenTag::Str => "STR",
            TokenTag::Log => "LOG",
            TokenTag::Ident => "IDENT",
            TokenTag::If => "IF",
            TokenTag::DeclFn => "DECL_FN",
            TokenTag::Return => "RETURN",
            TokenTag::ReturnVoid => "RETURN_VOID",
            TokenTag::From => "FROM",
            TokenTag::As => "AS",
            TokenTag::CallPrint => "CALL_PRINT",
            TokenTag::CallArg => "CALL_ARG",
            TokenTag::CallConcat => "CALL_CONCAT",
            TokenTag::CallMap => "CALL_MAP",
            TokenTag::CallFilter => "CALL_FILTER",
            TokenTag::DescFunc => "DESC_FUNC",
            TokenTag::OpAdd => "OP_ADD",
            TokenTag::OpSub => "OP_SUB",
            TokenTag::OpMul => "OP_MUL",
            TokenTag::OpDiv => "OP_DIV",
            TokenTag::RelGt => "REL_GT",
            TokenTag::RelLt => "REL_LT",
            TokenTag::RelEq => "REL_EQ",
            TokenTag::RelDif => "REL_DIF",
            TokenTag::LogAnd => "LOG_AND",
            TokenTag::LogOr => "LOG_OR",
            TokenTag::Neg => "NEG",
            TokenTag::Assign => "ASSIGN",
            TokenTag::ParenO => "PAREN_O",
            TokenTag::ParenC => "PAREN_C",
            TokenTag::BrackO => "BRACK_O",
            TokenTag::BrackC => "BRACK_C",
            TokenTag::SBrackO => "S_BRACK_O",
            TokenTag::SBrackC => "S_BRACK_C",
            TokenTag::Comma => "COMMA",
            TokenTag::Eof => "EOF",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub tag: TokenTag,
    pub value: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(tag: TokenTag, value: impl Into<String>, line: usize, column: usize) -> Self {
        Token { tag, value: value.into(), line, column }
    }

    fn eof(line: usize, column: usize) -> Self {
        Token::new(TokenTag::Eof, "", line, column)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}, {:?}> at {}:{}", self.tag, self.value, self.line, self.column)
    }
}

/// Whitespace, `;` separators and `#` comments
static SKIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[ \t\r\n;]+|#[^\n]*)+").expect("valid skip pattern"));

/// Ordered rule table; the first matching rule wins.
/// Rules with a capture group use the first group as the token value.
static RULES: Lazy<Vec<(Regex, TokenTag)>> = Lazy::new(|| {
    let table: &[(&str, TokenTag)] = &[
        (r"^var[ \t\r\n]+([A-Za-z_][A-Za-z0-9_]*)[ \t\r\n]*=", TokenTag::Assign),
        (r"^func[ \t\r\n]+([A-Za-z_][A-Za-z0-9_]*)", TokenTag::DeclFn),
        (r"^[0-9][0-9_]*", TokenTag::Num),
        (r#"^"((?:[^"\\]|\\(?s:.))*)""#, TokenTag::Str),
        (r"^[A-Za-z_][A-Za-z0-9_]*", TokenTag::Ident),
        (r"^==", TokenTag::RelEq),
        (r"^!=", TokenTag::RelDif),
        (r"^&&", TokenTag::LogAnd),
        (r"^\|\|", TokenTag::LogOr),
        (r"^>", TokenTag::RelGt),
        (r"^<", TokenTag::RelLt),
        (r"^!", TokenTag::Neg),
        (r"^\+", TokenTag::OpAdd),
        (r"^-", TokenTag::OpSub),
        (r"^\*", TokenTag::OpMul),
        (r"^/", TokenTag::OpDiv),
        (r"^:", TokenTag::DescFunc),
        (r"^\(", TokenTag::ParenO),
        (r"^\)", TokenTag::ParenC),
        (r"^\{", TokenTag::BrackO),
        (r"^\}", TokenTag::BrackC),
        (r"^\[", TokenTag::SBrackO),
        (r"^\]", TokenTag::SBrackC),
        (r"^,", TokenTag::Comma),
    ];

    table
        .iter()
        .map(|(pattern, tag)| (Regex::new(pattern).expect("valid token pattern"), *tag))
        .collect()
});

/// Maps identifier-shaped words to their keyword tags
fn keyword(word: &str) -> Option<TokenTag> {
    match word {
        "if" => Some(TokenTag::If),
        "return" => Some(TokenTag::Return),
        "from" => Some(TokenTag::From),
        "as" => Some(TokenTag::As),
        "print" => Some(TokenTag::CallPrint),
        "arg" => Some(TokenTag::CallArg),
        "concat" => Some(TokenTag::CallConcat),
        "map" => Some(TokenTag::CallMap),
        "filter" => Some(TokenTag::CallFilter),
        "true" | "false" => Some(TokenTag::Log),
        _ => None,
    }
}

fn unescape(raw: &str) -> String {
    let mut s = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            s.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => s.push('\n'),
            Some('t') => s.push('\t'),
            Some('\\') => s.push('\\'),
            Some('"') => s.push('"'),
            Some(other) => s.push(other),
            None => s.push('\\'),
        }
    }
    s
}

/// Pull-model tokenizer over a byte buffer
#[derive(Debug)]
pub struct Lexer {
    name: String,
    buffer: Vec<u8>,
    cursor: usize,
    line: usize,
    column: usize,
    current: Token,
    previous: Option<Box<Lexer>>,
}

impl Lexer {
    /// Creates a lexer over `source`; `name` identifies the source in error locations
    pub fn new(name: impl Into<String>, source: impl Into<Vec<u8>>) -> Self {
        Lexer {
            name: name.into(),
            buffer: source.into(),
            cursor: 0,
            line: 1,
            column: 1,
            current: Token::eof(1, 1),
            previous: None,
        }
    }

    /// Creates a lexer for an imported module that remembers the importing lexer
    pub fn chained(name: impl Into<String>, source: impl Into<Vec<u8>>, previous: Lexer) -> Self {
        let mut lexer = Lexer::new(name, source);
        lexer.previous = Some(Box::new(previous));
        lexer
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends bytes to the buffer without moving the cursor
    pub fn write(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// The most recently produced token
    pub fn current_token(&self) -> &Token {
        &self.current
    }

    pub fn previous(&self) -> Option<&Lexer> {
        self.previous.as_deref()
    }

    /// Detaches and returns the lexer this one was chained to
    pub fn take_previous(&mut self) -> Option<Lexer> {
        self.previous.take().map(|previous| *previous)
    }

    /// Text of a 1-based source line, used for error context
    pub fn source_line(&self, line: usize) -> Option<String> {
        if line == 0 {
            return None;
        }
        self.buffer
            .split(|b| *b == b'\n')
            .nth(line - 1)
            .map(|bytes| String::from_utf8_lossy(bytes).trim_end_matches('\r').to_string())
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::with_file(self.line, self.column, self.name.clone())
    }

    fn advance(&mut self, len: usize) {
        let end = self.cursor + len;
        for ch in String::from_utf8_lossy(&self.buffer[self.cursor..end]).chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.cursor = end;
    }

    /// `return` directly followed by a statement boundary carries no value
    fn is_void_return(&self) -> bool {
        let rest = &self.buffer[self.cursor..];
        match rest.iter().find(|b| !matches!(b, b' ' | b'\t' | b'\r')) {
            None => true,
            Some(b) => matches!(b, b';' | b'}' | b'\n' | b'#'),
        }
    }

    /// Produces the next token, or Eof once the buffer is exhausted
    pub fn next_token(&mut self) -> Result<Token, SprigError> {
        if let Some(m) = SKIP.find(&self.buffer[self.cursor..]) {
            self.advance(m.end());
        }

        let (line, column) = (self.line, self.column);
        if self.cursor >= self.buffer.len() {
            self.current = Token::eof(line, column);
            return Ok(self.current.clone());
        }

        let rest = &self.buffer[self.cursor..];
        let matched = RULES.iter().find_map(|(pattern, tag)| {
            pattern.captures(rest).map(|caps| {
                let whole = caps.get(0).map(|m| m.end()).unwrap_or(0);
                let value = caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_bytes()).unwrap_or(&[]);
                (*tag, String::from_utf8_lossy(value).into_owned(), whole)
            })
        });

        let Some((tag, value, len)) = matched else {
            let message = if rest[0] == b'"' {
                "Unterminated string literal".to_string()
            } else {
                let text = String::from_utf8_lossy(rest);
                let ch = text.chars().next().unwrap_or('?');
                format!("Unexpected character '{}'", ch)
            };
            let error = SprigError::lex_error(message, self.location());
            return Err(match self.source_line(line) {
                Some(source) => error.with_source(source),
                None => error,
            });
        };

        self.advance(len);

        let (tag, value) = match tag {
            TokenTag::Ident => match keyword(&value) {
                Some(TokenTag::Return) if self.is_void_return() => (TokenTag::ReturnVoid, value),
                Some(kw) => (kw, value),
                None => (TokenTag::Ident, value),
            },
            TokenTag::Str => (TokenTag::Str, unescape(&value)),
            other => (other, value),
        };

        let token = Token::new(tag, value, line, column);
        trace!("{} token {}", self.name, token);
        self.current = token.clone();
        Ok(token)
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Lexer::new(MAIN_SOURCE, Vec::new())
    }
}

/// Tokenizes a whole source string, including the trailing Eof token
pub fn tokenize(source: &str) -> Result<Vec<Token>, SprigError> {
    let mut lexer = Lexer::new(MAIN_SOURCE, source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.tag == TokenTag::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn tags(source: &str) -> Vec<TokenTag> {
        tokenize(source).unwrap().into_iter().map(|t| t.tag).collect()
    }

    #[test]
    fn test_declaration_tokens_carry_names() {
        let tokens = tokenize("var total = 1_000\nfunc add(a, b) : \"sum\" {}").unwrap();
        assert_eq!(tokens[0], Token::new(TokenTag::Assign, "total", 1, 1));
        assert_eq!(tokens[1], Token::new(TokenTag::Num, "1_000", 1, 13));
        assert_eq!(tokens[2], Token::new(TokenTag::DeclFn, "add", 2, 1));
        assert_eq!(tokens[3].tag, TokenTag::ParenO);
        assert_eq!(tokens[8], Token::new(TokenTag::DescFunc, ":", 2, 16));
        assert_eq!(tokens[9], Token::new(TokenTag::Str, "sum", 2, 18));
    }

    #[test]
    fn test_operators_and_punctuation() {
        assert_eq!(
            tags("a == b != c && d || !e > 1 < 2 + 3 - 4 * 5 / 6 [ ] , ( ) { }"),
            vec![
                TokenTag::Ident,
                TokenTag::RelEq,
                TokenTag::Ident,
                TokenTag::RelDif,
                TokenTag::Ident,
                TokenTag::LogAnd,
                TokenTag::Ident,
                TokenTag::LogOr,
                TokenTag::Neg,
                TokenTag::Ident,
                TokenTag::RelGt,
                TokenTag::Num,
                TokenTag::RelLt,
                TokenTag::Num,
                TokenTag::OpAdd,
                TokenTag::Num,
                TokenTag::OpSub,
                TokenTag::Num,
                TokenTag::OpMul,
                TokenTag::Num,
                TokenTag::OpDiv,
                TokenTag::Num,
                TokenTag::SBrackO,
                TokenTag::SBrackC,
                TokenTag::Comma,
                TokenTag::ParenO,
                TokenTag::ParenC,
                TokenTag::BrackO,
                TokenTag::BrackC,
                TokenTag::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_are_whole_words() {
        assert_eq!(
            tags("if iffy print printer from as mapper map filter concat arg true falsey"),
            vec![
                TokenTag::If,
                TokenTag::Ident,
                TokenTag::CallPrint,
                TokenTag::Ident,
                TokenTag::From,
                TokenTag::As,
                TokenTag::Ident,
                TokenTag::CallMap,
                TokenTag::CallFilter,
                TokenTag::CallConcat,
                TokenTag::CallArg,
                TokenTag::Log,
                TokenTag::Ident,
                TokenTag::Eof,
            ]
        );
    }

    #[test]
    fn test_return_void_detection() {
        assert_eq!(tags("return 1"), vec![TokenTag::Return, TokenTag::Num, TokenTag::Eof]);
        assert_eq!(tags("return;"), vec![TokenTag::ReturnVoid, TokenTag::Eof]);
        assert_eq!(tags("{ return }"), vec![TokenTag::BrackO, TokenTag::ReturnVoid, TokenTag::BrackC, TokenTag::Eof]);
        assert_eq!(tags("return\nx"), vec![TokenTag::ReturnVoid, TokenTag::Ident, TokenTag::Eof]);
        assert_eq!(tags("return"), vec![TokenTag::ReturnVoid, TokenTag::Eof]);
    }

    #[test]
    fn test_string_escapes_and_comments() {
        let tokens = tokenize("# heading\n\"a\\\"b\\n\" # trailing").unwrap();
        assert_eq!(tokens[0], Token::new(TokenTag::Str, "a\"b\n", 2, 1));
        assert_eq!(tokens[1].tag, TokenTag::Eof);
    }

    #[test]
    fn test_unknown_character_is_a_lex_error() {
        let err = tokenize("1 + @").unwrap_err();
        assert_eq!(err.kind, ErrorKind::LexError);
        assert_eq!(err.location, Some(SourceLocation::with_file(1, 5, MAIN_SOURCE)));

        let err = tokenize("\"open").unwrap_err();
        assert_eq!(err.message, "Unterminated string literal");
    }

    #[test]
    fn test_write_extends_buffer_after_eof() {
        let mut lexer = Lexer::default();
        lexer.write(b"1 +");
        assert_eq!(lexer.next_token().unwrap().tag, TokenTag::Num);
        assert_eq!(lexer.next_token().unwrap().tag, TokenTag::OpAdd);
        assert_eq!(lexer.next_token().unwrap().tag, TokenTag::Eof);
        assert_eq!(lexer.next_token().unwrap().tag, TokenTag::Eof);

        lexer.write(b" 2");
        let token = lexer.next_token().unwrap();
        assert_eq!(token, Token::new(TokenTag::Num, "2", 1, 5));
        assert_eq!(lexer.current_token(), &token);
    }

    #[test]
    fn test_chained_lexer_hands_back_previous() {
        let mut outer = Lexer::new(MAIN_SOURCE, "from \"lib\" 10");
        outer.next_token().unwrap();
        outer.next_token().unwrap();
        let resume = outer.next_token().unwrap();

        let mut nested = Lexer::chained("lib", "func f() {}", outer);
        assert_eq!(nested.previous().map(|p| p.name()), Some(MAIN_SOURCE));
        assert_eq!(nested.next_token().unwrap().tag, TokenTag::DeclFn);

        let outer = nested.take_previous().unwrap();
        assert_eq!(outer.current_token(), &resume);
        assert!(nested.previous().is_none());
    }

    #[test]
    fn test_source_line_lookup() {
        let lexer = Lexer::new(MAIN_SOURCE, "first\r\nsecond\n");
        assert_eq!(lexer.source_line(1).as_deref(), Some("first"));
        assert_eq!(lexer.source_line(2).as_deref(), Some("second"));
        assert_eq!(lexer.source_line(0), None);
    }
}
