use pgen::{runtime::lexer::Lexer, Config};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let automaton = Config::new()
        .use_lalr()
        .generate(include_str!("../../../grammars/m.grammar"))
        .unwrap();
    println!("{}", automaton.display());

    let source = "sq() = 4 ^ 2\n-1 + 2 * (3 - 4)";
    let keywords = automaton.keywords().iter().map(String::as_str);
    let node = pgen::parse(&automaton, Lexer::new(source).with_keywords(keywords)).unwrap();
    println!("{}", node);
}
