// File: src/parser.rs
//
// Recursive descent parser for the Sprig language.
// Pulls tokens from a Lexer with a single token of lookahead and builds the
// AST, consulting the SymbolTable so that every referenced name has been
// declared in a visible scope.
//
// Expression levels, from tightest to loosest binding:
//   factor  literals, identifiers, calls, ( log ), arrays, built-ins, imports
//   unary   (+|-) unary | factor
//   term    unary ((*|/) unary)*
//   expr    term ((+|-) term)*
//   rel     expr ((>|<|==|!=) expr)*
//   neg     ! rel | rel
//   log     neg ((&&||) neg)*
// Binary levels fold to the left, so `10 - 5 - 2` is `(10 - 5) - 2`.
//
// Imports (`from "id" [as alias]`) read the module through the ModuleReader,
// parse it with a nested Lexer chained to the current one, then resume the
// importing file at the token that followed the import.
//
// Parsing is fail-fast: the first error aborts the parse.

use crate::ast::{
    Arity, AsClause, BinaryOperator, Block, FromClause, Import, LogicOperator, Node, Program,
    RelOperator, UnaryOperator,
};
use crate::errors::{find_closest_match, ErrorKind, SourceLocation, SprigError};
use crate::lexer::{Lexer, Token, TokenTag, MAIN_SOURCE};
use crate::module::ModuleReader;
use crate::symtable::{ScopeKind, SymbolTable};
use log::debug;

/// Parser state: the active lexer, the lookahead token and the symbol table
pub struct Parser<'r> {
    reader: &'r dyn ModuleReader,
    symtable: SymbolTable,
    lexer: Lexer,
    lookahead: Token,
    /// Ids of the modules whose parse is in progress, outermost first
    importing: Vec<String>,
    function_depth: usize,
}

impl<'r> Parser<'r> {
    pub fn new(reader: &'r dyn ModuleReader, symtable: SymbolTable) -> Self {
        Parser {
            reader,
            symtable,
            lexer: Lexer::default(),
            lookahead: Token::new(TokenTag::Eof, "", 1, 1),
            importing: Vec::new(),
            function_depth: 0,
        }
    }

    pub fn symtable(&self) -> &SymbolTable {
        &self.symtable
    }

    /// Parse everything `lexer` produces up to Eof
    ///
    /// When `lexer` is chained to a previous lexer (an import), the previous
    /// lexer becomes active again afterwards and the lookahead is restored to
    /// its last produced token.
    pub fn parse(&mut self, lexer: Lexer) -> Result<Program, SprigError> {
        self.lexer = lexer;
        self.lookahead = self.lexer.next_token()?;

        let program = Program { statements: self.statements(TokenTag::Eof)? };

        if let Some(previous) = self.lexer.take_previous() {
            self.lexer = previous;
            self.lookahead = self.lexer.current_token().clone();
        }

        Ok(program)
    }

    /// Hands back the outermost lexer and the symbol table
    ///
    /// After a failed parse the lexer chain and the open scopes are unwound.
    pub fn into_parts(mut self) -> (Lexer, SymbolTable) {
        let mut lexer = self.lexer;
        while let Some(previous) = lexer.take_previous() {
            lexer = previous;
        }
        self.symtable.unwind();
        (lexer, self.symtable)
    }

    fn location(&self, token: &Token) -> SourceLocation {
        SourceLocation::with_file(token.line, token.column, self.lexer.name())
    }

    /// Build an error pointing at `token` with the offending source line attached
    fn error_at(&self, kind: ErrorKind, message: String, token: &Token) -> SprigError {
        let error = SprigError::new(kind, message).at(self.location(token));
        match self.lexer.source_line(token.line) {
            Some(source) => error.with_source(source),
            None => error,
        }
    }

    fn unexpected(&self, expected: &str) -> SprigError {
        let token = &self.lookahead;
        let message = if token.tag == TokenTag::Eof {
            format!("Unexpected end of input, expected {}", expected)
        } else {
            format!("Unexpected token '{}' ({}), expected {}", token.value, token.tag, expected)
        };
        self.error_at(ErrorKind::SyntaxError, message, token)
    }

    fn check(&self, tag: TokenTag) -> bool {
        self.lookahead.tag == tag
    }

    /// Consume the lookahead if it has tag `tag`, failing otherwise
    fn eat(&mut self, tag: TokenTag) -> Result<Token, SprigError> {
        if self.lookahead.tag != tag {
            return Err(self.unexpected(&tag.to_string()));
        }
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.lookahead, next))
    }

    fn require_declared(&self, token: &Token) -> Result<(), SprigError> {
        if self.symtable.contains(&token.value) {
            return Ok(());
        }
        let error = self.error_at(
            ErrorKind::NameError,
            format!("Name '{}' is not declared", token.value),
            token,
        );
        let candidates = self.symtable.visible_names();
        Err(match find_closest_match(&token.value, &candidates) {
            Some(suggestion) => error.with_suggestion(suggestion.to_string()),
            None => error,
        })
    }

    fn statements(&mut self, end: TokenTag) -> Result<Vec<Node>, SprigError> {
        let mut list = Vec::new();
        while !self.check(end) {
            if self.check(TokenTag::Eof) {
                return Err(self.unexpected(&end.to_string()));
            }
            list.push(self.statement()?);
        }
        Ok(list)
    }

    fn statement(&mut self) -> Result<Node, SprigError> {
        match self.lookahead.tag {
            TokenTag::ReturnVoid => {
                self.ensure_in_function()?;
                self.eat(TokenTag::ReturnVoid)?;
                Ok(Node::ReturnVoid)
            }
            TokenTag::Return => {
                self.ensure_in_function()?;
                self.eat(TokenTag::Return)?;
                Ok(Node::Return(Box::new(self.log()?)))
            }
            TokenTag::CallPrint => self.print(),
            TokenTag::DeclFn => self.declfunc(),
            TokenTag::Assign => self.assign(),
            TokenTag::If => self.if_stmt(),
            TokenTag::BrackO => Ok(Node::Block(self.block()?)),
            _ => self.log(),
        }
    }

    fn ensure_in_function(&self) -> Result<(), SprigError> {
        if self.function_depth > 0 {
            return Ok(());
        }
        Err(self
            .error_at(ErrorKind::SyntaxError, "'return' outside of a function".to_string(), &self.lookahead)
            .with_help("move the statement into a `func` body"))
    }

    /// block -> { statements }
    fn block(&mut self) -> Result<Block, SprigError> {
        self.symtable.push(ScopeKind::Block);
        self.eat(TokenTag::BrackO)?;
        let statements = self.statements(TokenTag::BrackC)?;
        self.eat(TokenTag::BrackC)?;
        self.symtable.close_block();
        Ok(Block { statements })
    }

    /// if -> IF log block
    fn if_stmt(&mut self) -> Result<Node, SprigError> {
        self.eat(TokenTag::If)?;
        let condition = self.log()?;
        let block = self.block()?;
        Ok(Node::If { condition: Box::new(condition), block })
    }

    /// assign -> ASSIGN log
    fn assign(&mut self) -> Result<Node, SprigError> {
        let target = self.eat(TokenTag::Assign)?;
        let value = self.log()?;
        self.symtable.set(&target.value);
        Ok(Node::Assign { name: target.value, value: Box::new(value) })
    }

    /// declfunc -> DECL_FN ( arity ) [: STR] block
    fn declfunc(&mut self) -> Result<Node, SprigError> {
        let func = self.eat(TokenTag::DeclFn)?;
        self.eat(TokenTag::ParenO)?;
        let arity = self.arity()?;
        self.eat(TokenTag::ParenC)?;
        let description = self.descfn()?;

        // Declared before the body so the function can call itself
        self.symtable.set(&func.value);

        self.symtable.push(ScopeKind::Function);
        for param in &arity.params {
            self.symtable.set(param);
        }
        self.function_depth += 1;
        let block = self.block()?;
        self.function_depth -= 1;
        self.symtable.close_function();

        Ok(Node::DeclFunc { name: func.value, description, arity, block })
    }

    /// arity -> IDENT (, IDENT)* | nothing
    fn arity(&mut self) -> Result<Arity, SprigError> {
        let mut params: Vec<String> = Vec::new();
        if !self.check(TokenTag::Ident) {
            return Ok(Arity { params });
        }

        loop {
            let param = self.eat(TokenTag::Ident)?;
            if params.contains(&param.value) {
                return Err(self.error_at(
                    ErrorKind::SyntaxError,
                    format!("Duplicate parameter '{}'", param.value),
                    &param,
                ));
            }
            params.push(param.value);

            if !self.check(TokenTag::Comma) {
                break;
            }
            self.eat(TokenTag::Comma)?;
        }

        Ok(Arity { params })
    }

    /// descfn -> : STR | nothing
    fn descfn(&mut self) -> Result<Option<String>, SprigError> {
        if !self.check(TokenTag::DescFunc) {
            return Ok(None);
        }
        self.eat(TokenTag::DescFunc)?;
        Ok(Some(self.eat(TokenTag::Str)?.value))
    }

    /// print -> CALL_PRINT ( log )
    fn print(&mut self) -> Result<Node, SprigError> {
        self.eat(TokenTag::CallPrint)?;
        self.eat(TokenTag::ParenO)?;
        let value = self.log()?;
        self.eat(TokenTag::ParenC)?;
        Ok(Node::CallPrint(Box::new(value)))
    }

    fn log(&mut self) -> Result<Node, SprigError> {
        let mut left = self.neg()?;
        loop {
            let op = match self.lookahead.tag {
                TokenTag::LogAnd => LogicOperator::And,
                TokenTag::LogOr => LogicOperator::Or,
                _ => return Ok(left),
            };
            self.eat(self.lookahead.tag)?;
            let right = self.neg()?;
            left = Node::logic(left, op, right);
        }
    }

    fn neg(&mut self) -> Result<Node, SprigError> {
        if self.check(TokenTag::Neg) {
            self.eat(TokenTag::Neg)?;
            return Ok(Node::Negative(Box::new(self.rel()?)));
        }
        self.rel()
    }

    fn rel(&mut self) -> Result<Node, SprigError> {
        let mut left = self.expr()?;
        loop {
            let op = match self.lookahead.tag {
                TokenTag::RelGt => RelOperator::Gt,
                TokenTag::RelLt => RelOperator::Lt,
                TokenTag::RelEq => RelOperator::Eq,
                TokenTag::RelDif => RelOperator::Dif,
                _ => return Ok(left),
            };
            self.eat(self.lookahead.tag)?;
            let right = self.expr()?;
            left = Node::relative(left, op, right);
        }
    }

    fn expr(&mut self) -> Result<Node, SprigError> {
        let mut left = self.term()?;
        loop {
            let op = match self.lookahead.tag {
                TokenTag::OpAdd => BinaryOperator::Add,
                TokenTag::OpSub => BinaryOperator::Sub,
                _ => return Ok(left),
            };
            self.eat(self.lookahead.tag)?;
            let right = self.term()?;
            left = Node::binary(left, op, right);
        }
    }

    fn term(&mut self) -> Result<Node, SprigError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.lookahead.tag {
                TokenTag::OpMul => BinaryOperator::Mul,
                TokenTag::OpDiv => BinaryOperator::Div,
                _ => return Ok(left),
            };
            self.eat(self.lookahead.tag)?;
            let right = self.unary()?;
            left = Node::binary(left, op, right);
        }
    }

    fn unary(&mut self) -> Result<Node, SprigError> {
        let op = match self.lookahead.tag {
            TokenTag::OpAdd => UnaryOperator::Plus,
            TokenTag::OpSub => UnaryOperator::Minus,
            _ => return self.factor(),
        };
        self.eat(self.lookahead.tag)?;
        let operand = self.unary()?;
        Ok(Node::UnaryOp { op, operand: Box::new(operand) })
    }

    fn factor(&mut self) -> Result<Node, SprigError> {
        match self.lookahead.tag {
            TokenTag::ParenO => {
                self.eat(TokenTag::ParenO)?;
                let inner = self.log()?;
                self.eat(TokenTag::ParenC)?;
                Ok(inner)
            }
            TokenTag::CallArg => self.arg(),
            TokenTag::CallConcat => self.concat(),
            TokenTag::CallMap => {
                let (collection, function) = self.higher_order(TokenTag::CallMap)?;
                Ok(Node::CallMap { collection, function })
            }
            TokenTag::CallFilter => {
                let (collection, function) = self.higher_order(TokenTag::CallFilter)?;
                Ok(Node::CallFilter { collection, function })
            }
            TokenTag::Ident => self.call(),
            TokenTag::Log => {
                let token = self.eat(TokenTag::Log)?;
                Ok(Node::Logical(token.value == "true"))
            }
            TokenTag::Str => Ok(Node::String(self.eat(TokenTag::Str)?.value)),
            TokenTag::Num => self.num(),
            TokenTag::SBrackO => self.array(),
            TokenTag::From => self.import(),
            TokenTag::Eof => Err(self.unexpected("an expression")),
            _ => Err(self.error_at(
                ErrorKind::SyntaxError,
                format!("Unknown token {}", self.lookahead),
                &self.lookahead,
            )),
        }
    }

    fn num(&mut self) -> Result<Node, SprigError> {
        let token = self.eat(TokenTag::Num)?;
        let digits: String = token.value.chars().filter(|c| *c != '_').collect();
        match digits.parse::<i64>() {
            Ok(value) => Ok(Node::Numerical(value)),
            Err(_) => Err(self.error_at(
                ErrorKind::SyntaxError,
                format!("Value {} is not a number", token.value),
                &token,
            )),
        }
    }

    /// array -> [ ] | [ log (, log)* ]
    fn array(&mut self) -> Result<Node, SprigError> {
        self.eat(TokenTag::SBrackO)?;
        let mut items = Vec::new();
        if !self.check(TokenTag::SBrackC) {
            items.push(self.log()?);
            while self.check(TokenTag::Comma) {
                self.eat(TokenTag::Comma)?;
                items.push(self.log()?);
            }
        }
        self.eat(TokenTag::SBrackC)?;
        Ok(Node::Array(items))
    }

    /// call -> IDENT | IDENT ( ) | IDENT ( log (, log)* )
    fn call(&mut self) -> Result<Node, SprigError> {
        let ident = self.eat(TokenTag::Ident)?;
        self.require_declared(&ident)?;

        if !self.check(TokenTag::ParenO) {
            return Ok(Node::Ident(ident.value));
        }

        self.eat(TokenTag::ParenO)?;
        let mut args = Vec::new();
        if !self.check(TokenTag::ParenC) {
            args.push(self.log()?);
            while self.check(TokenTag::Comma) {
                self.eat(TokenTag::Comma)?;
                args.push(self.log()?);
            }
        }
        self.eat(TokenTag::ParenC)?;

        Ok(Node::CallFunc { name: ident.value, args })
    }

    /// arg -> CALL_ARG ( term )
    fn arg(&mut self) -> Result<Node, SprigError> {
        self.eat(TokenTag::CallArg)?;
        self.eat(TokenTag::ParenO)?;
        let index = self.term()?;
        self.eat(TokenTag::ParenC)?;
        Ok(Node::CallArg(Box::new(index)))
    }

    /// concat -> CALL_CONCAT ( term (, term)* )
    fn concat(&mut self) -> Result<Node, SprigError> {
        self.eat(TokenTag::CallConcat)?;
        self.eat(TokenTag::ParenO)?;
        let mut parts = vec![self.term()?];
        while self.check(TokenTag::Comma) {
            self.eat(TokenTag::Comma)?;
            parts.push(self.term()?);
        }
        self.eat(TokenTag::ParenC)?;
        Ok(Node::CallConcat(parts))
    }

    /// map / filter -> KEYWORD ( factor , factor )
    fn higher_order(&mut self, keyword: TokenTag) -> Result<(Box<Node>, Box<Node>), SprigError> {
        self.eat(keyword)?;
        self.eat(TokenTag::ParenO)?;
        let collection = self.factor()?;
        self.eat(TokenTag::Comma)?;
        let function = self.factor()?;
        self.eat(TokenTag::ParenC)?;
        Ok((Box::new(collection), Box::new(function)))
    }

    /// import -> FROM STR [AS IDENT]
    fn import(&mut self) -> Result<Node, SprigError> {
        self.eat(TokenTag::From)?;
        let module_token = self.eat(TokenTag::Str)?;
        let alias = if self.check(TokenTag::As) {
            self.eat(TokenTag::As)?;
            Some(AsClause { alias: self.eat(TokenTag::Ident)?.value })
        } else {
            None
        };

        let module = module_token.value.clone();
        if module.is_empty() {
            return Err(self.error_at(
                ErrorKind::SyntaxError,
                "Empty module name in import".to_string(),
                &module_token,
            ));
        }

        if self.importing.contains(&module) {
            let mut chain = self.importing.clone();
            chain.push(module.clone());
            return Err(self
                .error_at(
                    ErrorKind::ImportCycle,
                    format!("Circular import detected: {}", module),
                    &module_token,
                )
                .with_note(chain.join(" -> ")));
        }

        let source = self.reader.read(&module).map_err(|error| {
            if error.location.is_some() {
                return error;
            }
            let located = self.error_at(error.kind, error.message, &module_token);
            match error.note {
                Some(note) => located.with_note(note),
                None => located,
            }
        })?;

        debug!("import '{}' from {}", module, self.lexer.name());

        let outer = std::mem::take(&mut self.lexer);
        let nested = Lexer::chained(module.clone(), source, outer);

        self.importing.push(module.clone());
        let saved_depth = std::mem::replace(&mut self.function_depth, 0);
        let program = self.parse(nested)?;
        self.function_depth = saved_depth;
        self.importing.pop();

        debug!("import '{}' done: {} statement(s)", module, program.statements.len());

        Ok(Node::Import(Import { from: FromClause { module }, alias, program }))
    }
}

/// Parse a standalone source string with a fresh symbol table
pub fn parse_source(source: &str, reader: &dyn ModuleReader) -> Result<Program, SprigError> {
    let mut parser = Parser::new(reader, SymbolTable::new());
    parser.parse(Lexer::new(MAIN_SOURCE, source))
}
