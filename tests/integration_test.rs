// Integration tests for the Sable front end: whole programs through both stages

use sable::parser::ast::*;
use sable::parser::{LexError, ParseError, SyntaxError};
use sable::{parse_module, tokenize};
use serde_json::Value;

const PROGRAM: &str = r#"
import std.io;
from std.collections import Vec, Map as Dict;

[@safe]
interface Greeter {
    fn greet(name: string) -> string;
}

template<T>
struct Stack {
    var items: Vec<T>*;
    var size: int = 0;

    constructor(capacity: int) : size = 0 {
        items = new Vec<T>(capacity);
    }

    destructor() {
        delete items;
    }

    fn push(item: T) {
        items[size++] = item;
    }

    static inline fn empty() -> Stack<T>* {
        return new Stack<T>(0);
    }

    union Slot {
        raw: int;
        ptr: T*;
    }
}

enum Level { Low, Mid = 5, High }

impl Greeter for Stack {
    fn greet(name: string) -> string {
        return "Hello, $name! You have ${size * 2} items";
    }
}

export const LIMIT: int = 1 << 4;

fn main() -> int {
    var pairs: [(int, string); 2] = [(1, "a"), (2, "b")];
    var total = 0;
    for (var i = 0; i < 2; i++) {
        total += pairs[i].0;
    }
    if (total > LIMIT) {
        return 1;
    } else if (total == 0) {
        return 2;
    } else {
        switch (total) {
            case 3: io.print("three"); break;
            default: io.print("other");
        }
    }
    var square = fn(x: int) -> int => x * x;
    do { total--; } while (total > 0 && !done);
    return total > 0 ? square(total) : -1;
}
"#;

fn parse_to_json(source: &str) -> Result<String, SyntaxError> {
    let tokens = tokenize(source)?;
    let module = parse_module(&tokens)?;
    Ok(module.to_json_pretty().unwrap())
}

#[test]
fn test_full_program_parses() {
    let tokens = tokenize(PROGRAM).unwrap();
    let module = parse_module(&tokens).unwrap();

    let names: Vec<_> = module.statements.iter().map(Stmt::kind_name).collect();
    assert_eq!(
        names,
        vec![
            "Import",
            "FromImport",
            "Interface",
            "Struct",
            "Enum",
            "Implementation",
            "Export",
            "Function"
        ]
    );

    match &module.statements[3] {
        Stmt::Struct(stack) => {
            assert!(stack.template.is_some());
            assert_eq!(stack.body.fields.len(), 2);
            assert_eq!(stack.body.methods.len(), 2);
            assert_eq!(stack.body.unions.len(), 1);
            assert!(stack.body.constructor.is_some());
            assert!(stack.body.destructor.is_some());
        }
        other => panic!("Expected struct, got {:?}", other),
    }

    match &module.statements[6] {
        Stmt::Export(export) => {
            assert!(matches!(&*export.declaration, Stmt::Variable(v) if v.is_const()));
        }
        other => panic!("Expected export, got {:?}", other),
    }

    match &module.statements[7] {
        Stmt::Function(main) => {
            assert_eq!(main.name.lexeme, "main");
            assert_eq!(main.body.statements.len(), 7);
        }
        other => panic!("Expected function, got {:?}", other),
    }
}

#[test]
fn test_structured_form_is_deterministic() {
    let first = parse_to_json(PROGRAM).unwrap();
    let second = parse_to_json(PROGRAM).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_structured_form_is_stable_under_reserialization() {
    let json = parse_to_json(PROGRAM).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    let again = serde_json::to_string_pretty(&value).unwrap();
    let reparsed: Value = serde_json::from_str(&again).unwrap();

    assert_eq!(value, reparsed);
    assert_eq!(serde_json::to_string_pretty(&reparsed).unwrap(), again);
}

#[test]
fn test_nodes_are_keyed_by_kind() {
    let json = parse_to_json("var x = a ? b : c;").unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();

    let statement = value["statements"][0].as_object().unwrap();
    assert_eq!(statement.keys().collect::<Vec<_>>(), vec!["Variable"]);

    let initializer = value["statements"][0]["Variable"]["initializer"].as_object().unwrap();
    assert_eq!(initializer.keys().collect::<Vec<_>>(), vec!["Ternary"]);
}

#[test]
fn test_interpolation_in_program() {
    let tokens = tokenize(PROGRAM).unwrap();
    let module = parse_module(&tokens).unwrap();

    let Stmt::Implementation(implementation) = &module.statements[5] else {
        panic!("Expected implementation");
    };
    let Some(Stmt::Return(ret)) = implementation.methods[0].body.statements.first() else {
        panic!("Expected return statement");
    };
    let Some(Expr::Interpolation(interpolation)) = &ret.value else {
        panic!("Expected interpolated string");
    };

    let kinds: Vec<_> = interpolation.parts.iter().map(Expr::kind_name).collect();
    assert_eq!(
        kinds,
        vec!["StringFragment", "Identifier", "StringFragment", "Binary", "StringFragment"]
    );
}

#[test]
fn test_syntax_error_from_either_stage() {
    match parse_to_json("var s = \"unterminated;") {
        Err(SyntaxError::Lex(LexError::UnterminatedLiteral { .. })) => {}
        other => panic!("Expected lexical error, got {:?}", other),
    }

    let err = parse_to_json("fn f() { return 1 }").unwrap_err();
    assert!(matches!(err, SyntaxError::Parse(ParseError::ExpectedToken { .. })));
    assert_eq!(err.location(), SourceLocation::new(1, 19));
    assert_eq!(
        err.to_string(),
        "Expected ';' after return value, found '}' at line 1, column 19"
    );
}

#[test]
fn test_failure_returns_no_partial_tree() {
    // The first statement is fine; the second is not.
    let tokens = tokenize("var ok = 1; var = 2;").unwrap();
    let err = parse_module(&tokens).unwrap_err();
    assert!(matches!(err, ParseError::ExpectedToken { .. }));
}
