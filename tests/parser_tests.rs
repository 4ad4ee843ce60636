// Parser tests for the Sprig language
//
// These tests check the shape of the AST the parser builds: operator
// precedence and associativity, declarations, and inline module imports.

use sprig::ast::{
    Arity, AsClause, BinaryOperator, Block, FromClause, Import, LogicOperator, Node, Program,
    RelOperator, UnaryOperator,
};
use sprig::errors::ErrorKind;
use sprig::lexer::{tokenize, Lexer, TokenTag};
use sprig::module::MemoryReader;
use sprig::parser::{parse_source, Parser};
use sprig::symtable::SymbolTable;

fn parse(code: &str) -> Program {
    parse_source(code, &MemoryReader::new()).unwrap()
}

fn num(n: i64) -> Node {
    Node::Numerical(n)
}

#[test]
fn test_subtraction_is_left_associative() {
    let program = parse("10 - 5 - 2");
    let expected = Node::binary(
        Node::binary(num(10), BinaryOperator::Sub, num(5)),
        BinaryOperator::Sub,
        num(2),
    );
    assert_eq!(program.statements, vec![expected]);
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let program = parse("1 + 2 * 3");
    let expected = Node::binary(num(1), BinaryOperator::Add, Node::binary(num(2), BinaryOperator::Mul, num(3)));
    assert_eq!(program.statements, vec![expected]);
}

#[test]
fn test_logic_over_negation_over_relations() {
    let program = parse("!1 > 2 && true");
    let expected = Node::logic(
        Node::Negative(Box::new(Node::relative(num(1), RelOperator::Gt, num(2)))),
        LogicOperator::And,
        Node::Logical(true),
    );
    assert_eq!(program.statements, vec![expected]);
}

#[test]
fn test_unary_nests() {
    let program = parse("- -3");
    let expected = Node::UnaryOp {
        op: UnaryOperator::Minus,
        operand: Box::new(Node::UnaryOp { op: UnaryOperator::Minus, operand: Box::new(num(3)) }),
    };
    assert_eq!(program.statements, vec![expected]);
}

#[test]
fn test_numbers_with_underscores() {
    assert_eq!(parse("1_000 + 10").statements, vec![Node::binary(num(1000), BinaryOperator::Add, num(10))]);
}

#[test]
fn test_function_declaration() {
    let program = parse("func add(a, b) : \"sum of two ints\" {\n  return a + b\n}");
    let expected = Node::DeclFunc {
        name: "add".to_string(),
        description: Some("sum of two ints".to_string()),
        arity: Arity { params: vec!["a".to_string(), "b".to_string()] },
        block: Block {
            statements: vec![Node::Return(Box::new(Node::binary(
                Node::ident("a"),
                BinaryOperator::Add,
                Node::ident("b"),
            )))],
        },
    };
    assert_eq!(program.statements, vec![expected]);
}

#[test]
fn test_bare_return_forms() {
    let program = parse("func a() { return }\nfunc b() { return; }\nfunc c() {\n  return\n}");
    for statement in &program.statements {
        let Node::DeclFunc { block, .. } = statement else {
            panic!("expected a function declaration, got {:?}", statement);
        };
        assert_eq!(block.statements, vec![Node::ReturnVoid]);
    }
}

#[test]
fn test_calls_and_builtins() {
    let program = parse("func f(x) { return x }\nf(1, 2)\nprint(arg(0))\nconcat(\"a\", 1)\nmap([1], f)");
    assert_eq!(
        program.statements[1],
        Node::CallFunc { name: "f".to_string(), args: vec![num(1), num(2)] }
    );
    assert_eq!(program.statements[2], Node::CallPrint(Box::new(Node::CallArg(Box::new(num(0))))));
    assert_eq!(program.statements[3], Node::CallConcat(vec![Node::String("a".to_string()), num(1)]));
    assert_eq!(
        program.statements[4],
        Node::CallMap { collection: Box::new(Node::Array(vec![num(1)])), function: Box::new(Node::ident("f")) }
    );
}

#[test]
fn test_reparsing_is_idempotent() {
    let code = "var x = [1, \"two\", true]\nif x == x { print(concat(\"ok\", 1)) }";
    assert_eq!(parse(code), parse(code));
}

#[test]
fn test_import_embeds_module_program() {
    let reader = MemoryReader::new().with_module("testing", "func hello() { return 10 }");
    let program = parse_source("from \"testing\" as t\nhello()", &reader).unwrap();

    let expected_import = Node::Import(Import {
        from: FromClause { module: "testing".to_string() },
        alias: Some(AsClause { alias: "t".to_string() }),
        program: Program {
            statements: vec![Node::DeclFunc {
                name: "hello".to_string(),
                description: None,
                arity: Arity::default(),
                block: Block { statements: vec![Node::Return(Box::new(num(10)))] },
            }],
        },
    });
    assert_eq!(program.statements[0], expected_import);
    // Parsing resumes in the importing file right after the import
    assert_eq!(program.statements[1], Node::CallFunc { name: "hello".to_string(), args: vec![] });
}

#[test]
fn test_importing_twice_yields_equal_programs() {
    let reader = MemoryReader::new().with_module("testing", "func hello() { return 10 }");
    let program = parse_source("from \"testing\"\nfrom \"testing\"", &reader).unwrap();
    let (Node::Import(first), Node::Import(second)) = (&program.statements[0], &program.statements[1]) else {
        panic!("expected two imports, got {:?}", program.statements);
    };
    assert_eq!(first.program, second.program);
    assert_eq!(first.alias, None);
}

#[test]
fn test_errors_inside_modules_name_the_module() {
    let reader = MemoryReader::new().with_module("broken", "\n1 +");
    let err = parse_source("from \"broken\"", &reader).unwrap_err();
    assert_eq!(err.kind, ErrorKind::SyntaxError);
    let location = err.location.unwrap();
    assert_eq!(location.file.as_deref(), Some("broken"));
    assert_eq!(location.line, 2);
}

#[test]
fn test_missing_module_points_at_the_import() {
    let err = parse_source("\nfrom \"nowhere\"", &MemoryReader::new()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ImportError);
    assert_eq!(err.location.map(|l| (l.line, l.column)), Some((2, 6)));
}

#[test]
fn test_parser_hands_back_unwound_parts() {
    let reader = MemoryReader::new().with_module("broken", "func f() { 1 +");
    let mut parser = Parser::new(&reader, SymbolTable::new());
    assert!(parser.parse(Lexer::new("<main>", "from \"broken\"")).is_err());

    let (lexer, symtable) = parser.into_parts();
    assert_eq!(lexer.name(), "<main>");
    assert!(lexer.previous().is_none());
    assert_eq!(symtable.depth(), 1);
}

#[test]
fn test_ast_serializes_to_json() {
    let program = parse("var x = 1");
    let json = serde_json::to_value(&program).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "statements": [{ "Assign": { "name": "x", "value": { "Numerical": 1 } } }] })
    );
}

#[test]
fn test_tokenize_assign_and_function_forms() {
    let tokens = tokenize("var total = 1\nfunc add(a)").unwrap();
    let tags: Vec<TokenTag> = tokens.iter().map(|t| t.tag).collect();
    assert_eq!(
        tags,
        vec![
            TokenTag::Assign,
            TokenTag::Num,
            TokenTag::DeclFn,
            TokenTag::ParenO,
            TokenTag::Ident,
            TokenTag::ParenC,
            TokenTag::Eof
        ]
    );
    assert_eq!(tokens[0].value, "total");
    assert_eq!(tokens[2].value, "add");
}
