use pgen_runtime::{
    action::ActionKind,
    definition::{ActionCode as A, StaticRule, StaticTable},
    lexer::Lexer,
    parser::parse_tokens,
    Action, ParseError, ParseTable, Parser, Token,
};

// e = e '+' NUM {binop 0 1 2} | NUM;
static SUMS: StaticTable = StaticTable {
    symbols: &["EOF", "EPSILON", "NUM", "+", "e", "S'"],
    terminal_count: 4,
    rules: &[
        StaticRule { lhs: 5, rhs: &[4], action: None, indexes: &[] },
        StaticRule { lhs: 4, rhs: &[4, 3, 2], action: Some(ActionKind::Binop), indexes: &[0, 1, 2] },
        StaticRule { lhs: 4, rhs: &[2], action: None, indexes: &[] },
    ],
    table: &[
        (A::Error, 0), (A::Error, 0), (A::Shift, 2), (A::Error, 0), (A::Goto, 1), (A::Error, 0),
        (A::Accept, 0), (A::Error, 0), (A::Error, 0), (A::Shift, 3), (A::Error, 0), (A::Error, 0),
        (A::Reduce, 2), (A::Error, 0), (A::Error, 0), (A::Reduce, 2), (A::Error, 0), (A::Error, 0),
        (A::Error, 0), (A::Error, 0), (A::Shift, 4), (A::Error, 0), (A::Error, 0), (A::Error, 0),
        (A::Reduce, 1), (A::Error, 0), (A::Error, 0), (A::Reduce, 1), (A::Error, 0), (A::Error, 0),
    ],
    kernels: &[
        "S' -> . e",
        "S' -> e .; e -> e . + NUM",
        "e -> NUM .",
        "e -> e + . NUM",
        "e -> e + NUM .",
    ],
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[test]
fn left_associative_sums() {
    init_tracing();
    let node = pgen_runtime::parse(&SUMS, Lexer::new("1 + 2 + 3")).unwrap();
    assert_eq!(node.to_string(), "((1+2)+3)");

    let node = pgen_runtime::parse(&SUMS, Lexer::new("42")).unwrap();
    assert_eq!(node.to_string(), "42");
}

#[test]
fn table_lookups() {
    assert_eq!(SUMS.action(1, 0), Action::Accept);
    assert_eq!(SUMS.goto(0, 4), Some(1));
    assert_eq!(SUMS.goto(0, 2), None);
    assert_eq!(SUMS.terminal_index("+"), Some(3));
    assert_eq!(SUMS.terminal_index("e"), None);
    assert_eq!(SUMS.symbol_name(5), Some("S'"));
}

#[test]
fn syntax_error_cell() {
    init_tracing();
    let err = pgen_runtime::parse(&SUMS, Lexer::new("1 2")).unwrap_err();
    assert_eq!(err.failing_cell(), Some((2, 2)));
    match err {
        ParseError::Syntax { name, location, .. } => {
            assert_eq!(name, "NUM");
            assert_eq!((location.line, location.column), (1, 3));
        }
        other => panic!("unexpected {:?}", other),
    }

    let err = parse_tokens(&SUMS, Vec::<Token>::new()).unwrap_err();
    assert_eq!(err.failing_cell(), Some((0, 0)));
}

#[test]
fn parser_is_reusable() {
    let mut parser = Parser::new(&SUMS);
    assert!(parser.parse(Lexer::new("1 +")).is_err());
    assert_eq!(parser.parse(Lexer::new("1 + 2")).unwrap().to_string(), "(1+2)");
    assert!(matches!(
        parser.parse(Lexer::new("1 * 2")),
        Err(ParseError::UnknownTerminal { ref name, .. }) if name == "*"
    ));
}
