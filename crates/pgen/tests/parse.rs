use pgen::{
    runtime::{
        ast::{Literal, NodeKind},
        lexer::{LexError, Lexer},
        parser::Parser,
        Action, AstNode, ParseError, ParseTable, Token,
    },
    Automaton, Config, GrammarError, SymbolRegistry,
};
use std::{env, fs, path::PathBuf, sync::Arc, thread};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn load(path: &str) -> Automaton {
    init_tracing();
    let path = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap()).join(path);
    let source = fs::read_to_string(path).unwrap();
    pgen::build(&source).unwrap()
}

fn parse(automaton: &Automaton, source: &str) -> Result<AstNode, ParseError<LexError>> {
    pgen::parse_str(automaton, source)
}

fn show(automaton: &Automaton, source: &str) -> String {
    parse(automaton, source).unwrap().to_string()
}

const SUM_TERM: &str = "
    sum = sum '+' term {binop 0 1 2} | term {0};
    term = term '*' factor {binop 0 1 2} | factor {0};
    factor = NUM {0};
";

#[test]
fn precedence_follows_grammar_structure() {
    init_tracing();
    let automaton = pgen::build(SUM_TERM).unwrap();
    assert_eq!(show(&automaton, "1+2*3"), "(1+(2*3))");
    assert_eq!(show(&automaton, "1*2+3"), "((1*2)+3)");
    assert_eq!(show(&automaton, "1+2+3"), "((1+2)+3)");
    assert_eq!(show(&automaton, "7"), "7");

    let automaton = load("tests/grammars/arithmetic.grammar");
    assert_eq!(show(&automaton, "(1+2)*3"), "((1+2)*3)");
    assert_eq!(show(&automaton, "((4))"), "4");
}

#[test]
fn unresolved_symbol_fails_before_parsing() {
    let err = pgen::build("sum = sum '+' term | NUM;").unwrap_err();
    assert!(matches!(
        err,
        GrammarError::UnresolvedSymbol { ref name, .. } if name == "term"
    ));
    assert!(err.to_string().ends_with("undefined nonterminal `term`"));
}

#[test]
fn syntax_error_reports_state_and_terminal() {
    let automaton = pgen::build(SUM_TERM).unwrap();
    let err = parse(&automaton, "1+*2").unwrap_err();

    let star = automaton.terminal_index("*").unwrap();
    let (state, terminal) = err.failing_cell().unwrap();
    assert_eq!(terminal, star);
    assert!(automaton.action(state, star).is_error());
    // `1` is reduced up to `sum` before `+` is shifted, and the parser
    // stops in the state entered by that shift.
    let sum = automaton.symbols().index_of("sum").unwrap().into_raw();
    let after_sum = automaton.goto(0, sum).unwrap();
    let plus = automaton.terminal_index("+").unwrap();
    let Action::Shift(after_one_plus) = automaton.action(after_sum, plus) else {
        panic!("expected a shift on `+`");
    };
    assert_eq!(state, after_one_plus);
    match err {
        ParseError::Syntax { name, location, .. } => {
            assert_eq!(name, "*");
            assert_eq!((location.line, location.column), (1, 3));
        }
        other => panic!("unexpected {:?}", other),
    }

    assert!(matches!(
        parse(&automaton, "1+"),
        Err(ParseError::Syntax { ref name, .. }) if name == "EOF"
    ));
    assert!(matches!(
        parse(&automaton, "1 $ 2"),
        Err(ParseError::Lexer(LexError::Unrecognized { .. }))
    ));
    assert!(matches!(
        parse(&automaton, "1 + x"),
        Err(ParseError::Syntax { ref name, .. }) if name == "IDENT"
    ));
}

#[test]
fn unknown_terminal_is_rejected() {
    let automaton = pgen::build(SUM_TERM).unwrap();
    let tokens = vec![Token::int(1, Default::default()), Token::keyword("+++", Default::default())];
    assert!(matches!(
        pgen::runtime::parser::parse_tokens(&automaton, tokens),
        Err(ParseError::UnknownTerminal { ref name, .. }) if name == "+++"
    ));
}

#[test]
fn failed_parse_leaves_automaton_usable() {
    let automaton = pgen::build(SUM_TERM).unwrap();
    let before = automaton.display().to_string();
    let mut parser = Parser::new(&automaton);

    for _ in 0..3 {
        let tokens = Lexer::new("1+2*3");
        assert_eq!(parser.parse(tokens).unwrap().to_string(), "(1+(2*3))");
        assert!(parser.parse(Lexer::new("1+")).is_err());
    }
    assert_eq!(automaton.display().to_string(), before);
}

#[test]
fn explicit_eof_is_accepted() {
    let automaton = pgen::build(SUM_TERM).unwrap();
    let tokens = vec![
        Token::int(2, Default::default()),
        Token::keyword("*", Default::default()),
        Token::int(3, Default::default()),
        Token::eof(Default::default()),
    ];
    let node = pgen::runtime::parser::parse_tokens(&automaton, tokens).unwrap();
    assert_eq!(node.to_string(), "(2*3)");
}

#[test]
fn shared_between_threads() {
    let automaton = Arc::new(pgen::build(SUM_TERM).unwrap());
    let handles: Vec<_> = (1..=4)
        .map(|n| {
            let automaton = Arc::clone(&automaton);
            thread::spawn(move || {
                let source = format!("{}+{}*{}", n, n, n);
                pgen::parse_str(&automaton, &source).unwrap().to_string()
            })
        })
        .collect();
    for (n, handle) in (1..=4).zip(handles) {
        assert_eq!(handle.join().unwrap(), format!("({}+({}*{}))", n, n, n));
    }
}

#[test]
fn m_grammar_programs() {
    let automaton = load("../../grammars/m.grammar");
    // A new statement may begin with `+` or `-`; shifting continues the
    // expression instead.
    assert_eq!(automaton.conflicts().shift_reduce(), 4);
    assert_eq!(automaton.conflicts().reduce_reduce(), 0);

    assert_eq!(show(&automaton, "1+2*3"), "(1+(2*3))");
    assert_eq!(show(&automaton, "-1+2"), "(-1+2)");
    assert_eq!(show(&automaton, "2^3^2"), "(2^(3^2))");
    assert_eq!(show(&automaton, "(1-2)%3"), "((1-2)%3)");
    assert_eq!(show(&automaton, "1 - 2"), "(1-2)");
    assert_eq!(
        show(&automaton, "f() = 1 + 2\n3 * 4"),
        "f() = (1+2)\n(3*4)"
    );
}

#[test]
fn m_grammar_function_node() {
    let automaton = load("../../grammars/m.grammar");
    let node = parse(&automaton, "sq() = 4^2").unwrap();
    match node.kind {
        NodeKind::Function { name, params, body } => {
            assert_eq!(name, "sq");
            assert!(params.is_empty());
            assert_eq!(body.to_string(), "(4^2)");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn statements() {
    let automaton = load("tests/grammars/statements.grammar");
    let node = parse(
        &automaton,
        "var x = 1;
         var y;
         y = f(x, 2 + 3);
         if x < 10 then x = x + 1; else { print(\"done\"); x = 0; }
         while (!done) tick();
         for (i in 0 .. 10) total = total * i;",
    )
    .unwrap();

    let NodeKind::Block(stmts) = &node.kind else {
        panic!("expected a block, got {:?}", node);
    };
    assert_eq!(stmts.len(), 6);
    assert_eq!(stmts[0].to_string(), "var x = 1");
    assert_eq!(stmts[1].to_string(), "var y");
    assert_eq!(stmts[2].to_string(), "y = f(x, (2+3))");
    assert!(matches!(
        &stmts[3].kind,
        NodeKind::If { otherwise: Some(otherwise), .. }
            if matches!(&otherwise.kind, NodeKind::Block(inner) if inner.len() == 2)
    ));
    assert!(matches!(&stmts[4].kind, NodeKind::While { .. }));
    match &stmts[5].kind {
        NodeKind::For { var, start, end, step, .. } => {
            assert_eq!(var, "i");
            assert_eq!(start.to_string(), "0");
            assert_eq!(end.to_string(), "10");
            assert!(step.is_none());
        }
        other => panic!("unexpected {:?}", other),
    }

    let node = parse(&automaton, "true;").unwrap();
    assert!(matches!(node.kind, NodeKind::Block(ref stmts)
        if matches!(stmts[0].kind, NodeKind::Literal(Literal::Bool(true)))));
}

#[test]
fn empty_argument_lists() {
    let automaton = load("tests/grammars/lists.grammar");
    assert_eq!(show(&automaton, "f()"), "f()");
    assert_eq!(show(&automaton, "f(1, x, 'c')"), "f(1, x, 'c')");
}

#[test]
fn slr_mode_rejects_assignments() {
    init_tracing();
    let path = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap())
        .join("tests/grammars/assign.grammar");
    let source = fs::read_to_string(path).unwrap();

    let lalr = pgen::build(&source).unwrap();
    assert!(lalr.conflicts().is_empty());
    assert_eq!(show(&lalr, "*x = y"), "*x = y");

    let slr = Config::new().use_slr().generate(&source).unwrap();
    assert_eq!(slr.conflicts().shift_reduce(), 1);
    assert_eq!(slr.conflicts().total(), 1);
}

#[test]
fn custom_terminals() {
    let registry = SymbolRegistry::with_terminals(["NUM", "+"]).unwrap();
    let automaton = Config::new()
        .generate_with_registry("e = e '+' NUM {binop 0 1 2} | NUM;", registry)
        .unwrap();
    assert_eq!(automaton.symbols().terminal_count(), 4);
    assert_eq!(show(&automaton, "1 + 2 + 3"), "((1+2)+3)");

    let registry = SymbolRegistry::with_terminals(["NUM"]).unwrap();
    assert!(matches!(
        Config::new().generate_with_registry("e = e '+' NUM | NUM;", registry),
        Err(GrammarError::UnresolvedSymbol { .. })
    ));
}

#[test]
fn reserved_words_as_rule_names() {
    init_tracing();
    let automaton = pgen::build(
        "
        stmt   = 'var' IDENT {var 1} | binary {0};
        binary = binary '+' unary {binop 0 1 2} | unary {0};
        unary  = '-' unary {unop 0 1} | NUM {0};
        ",
    )
    .unwrap();
    assert!(automaton.conflicts().is_empty());
    assert_eq!(automaton.symbols().terminal_index("binary"), None);
    assert_eq!(show(&automaton, "var x"), "var x");
    assert_eq!(show(&automaton, "1 + - 2"), "(1+-2)");
}

#[test]
fn empty_input_on_nullable_start() {
    init_tracing();
    let automaton = pgen::build("l = l NUM {block 0 1} | EPSILON;").unwrap();

    let node = parse(&automaton, "").unwrap();
    assert!(matches!(&node.kind, NodeKind::Block(nodes) if nodes.is_empty()));
    assert_eq!(show(&automaton, "1 2"), "1\n2");
}
