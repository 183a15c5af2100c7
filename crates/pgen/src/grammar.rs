//! Grammar definition text and the model parsed from it.
//!
//! ```text
//! # comment
//! expr = expr [+-] term { binop 0 1 2 }
//!      | term { 0 }
//!      ;
//! term = NUM | '(' expr ')' { 1 }
//! ```

use crate::{
    error::GrammarError,
    symbol::{SymbolId, SymbolRegistry},
    types::{Map, Set},
    util::write_joined,
};
use logos::Logos;
use pgen_runtime::token::{names, Location};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// A reference to a rule, resolved once the whole text is read.
    Nonterminal(String),

    /// A token class such as `NUM` or `IDENT`.
    TokenClass(String),

    /// A quoted lexeme matched exactly.
    Literal(String),

    /// `[...]`, one alternative per member.
    CharClass { class: String, members: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprItem {
    pub kind: ItemKind,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticAction {
    /// The constructor name. `None` forwards a child unchanged.
    pub name: Option<String>,
    pub indexes: Vec<u8>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    pub items: Vec<ExprItem>,
    pub action: Option<SemanticAction>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub lhs: SymbolId,
    pub name: String,
    pub alternatives: Vec<Alternative>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct Grammar {
    start: SymbolId,
    rules: Map<SymbolId, Rule>,
    keywords: Set<String>,
}

impl Grammar {
    /// Parse the grammar text, registering the defined nonterminals.
    pub fn parse(source: &str, registry: &mut SymbolRegistry) -> Result<Self, GrammarError> {
        let span = tracing::trace_span!("grammar");
        let _entered = span.enter();

        let (tokens, end) = scan(source)?;
        reserve_literals(&tokens, registry)?;
        let mut parser = GrammarParser {
            tokens,
            pos: 0,
            end,
            registry,
            rules: Map::default(),
            keywords: Set::default(),
            start: None,
        };
        while parser.peek().is_some() {
            if parser.peek() == Some(Tok::Semi) {
                parser.bump();
                continue;
            }
            parser.parse_rule()?;
        }

        let start = parser
            .start
            .ok_or_else(|| GrammarError::syntax(end, "the grammar defines no rules"))?;
        tracing::debug!(
            "parsed {} rules, {} keywords",
            parser.rules.len(),
            parser.keywords.len()
        );
        Ok(Self {
            start,
            rules: parser.rules,
            keywords: parser.keywords,
        })
    }

    /// The left-hand side of the first rule.
    pub fn start(&self) -> SymbolId {
        self.start
    }

    /// Rules in the order their left-hand sides were first defined.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.values()
    }

    pub fn rule(&self, lhs: SymbolId) -> Option<&Rule> {
        self.rules.get(&lhs)
    }

    pub fn rule_by_name(&self, name: &str) -> Option<&Rule> {
        self.rules.values().find(|rule| rule.name == name)
    }

    /// Lexemes of every literal and character class member.
    pub fn keywords(&self) -> &Set<String> {
        &self.keywords
    }
}

impl fmt::Display for ExprItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ItemKind::Nonterminal(name) | ItemKind::TokenClass(name) => f.write_str(name),
            ItemKind::Literal(lexeme) if lexeme.contains('\'') => write!(f, "\"{}\"", lexeme),
            ItemKind::Literal(lexeme) => write!(f, "'{}'", lexeme),
            ItemKind::CharClass { class, .. } => write!(f, "[{}]", class),
        }
    }
}

impl fmt::Display for SemanticAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        if let Some(name) = &self.name {
            write!(f, " {}", name)?;
        }
        for index in &self.indexes {
            write!(f, " {}", index)?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            f.write_str(names::EPSILON)?;
        } else {
            write_joined(f, &self.items, " ")?;
        }
        if let Some(action) = &self.action {
            write!(f, " {}", action)?;
        }
        Ok(())
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in self.rules.values() {
            write!(f, "{} = ", rule.name)?;
            write_joined(f, &rule.alternatives, "\n    | ")?;
            writeln!(f, "\n    ;")?;
        }
        Ok(())
    }
}

// ==== scanner ====

#[derive(Logos, Debug, Copy, Clone, PartialEq)]
#[logos(skip r"([ \t\r\n\f]+|#[^\n]*)")]
enum Tok<'source> {
    #[token("=")]
    Eq,

    #[token("|")]
    Bar,

    #[token(";")]
    Semi,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident(&'source str),

    #[regex(r"[0-9]+")]
    Number(&'source str),

    #[regex(r"'[^'\n]*'")]
    #[regex(r#""[^"\n]*""#)]
    Literal(&'source str),

    #[regex(r"\[[^\]\n]*\]")]
    Class(&'source str),
}

impl fmt::Display for Tok<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => f.write_str("`=`"),
            Self::Bar => f.write_str("`|`"),
            Self::Semi => f.write_str("`;`"),
            Self::LBrace => f.write_str("`{`"),
            Self::RBrace => f.write_str("`}`"),
            Self::Ident(name) => write!(f, "identifier `{}`", name),
            Self::Number(n) => write!(f, "index `{}`", n),
            Self::Literal(text) | Self::Class(text) => write!(f, "`{}`", text),
        }
    }
}

/// Maps byte offsets to line/column locations, moving forward only.
struct LineTracker<'source> {
    source: &'source str,
    offset: usize,
    line: u32,
    line_start: usize,
}

impl<'source> LineTracker<'source> {
    fn new(source: &'source str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            line_start: 0,
        }
    }

    fn locate(&mut self, offset: usize) -> Location {
        if offset > self.offset {
            for (i, _) in self.source[self.offset..offset].match_indices('\n') {
                self.line += 1;
                self.line_start = self.offset + i + 1;
            }
            self.offset = offset;
        }
        let column = u32::try_from(offset - self.line_start + 1).unwrap_or(u32::MAX);
        Location::new(self.line, column)
    }
}

/// Tokenize the whole text, returning the tokens and the end location.
fn scan(source: &str) -> Result<(Vec<(Tok<'_>, Location)>, Location), GrammarError> {
    let mut tokens = vec![];
    let mut lines = LineTracker::new(source);

    for (tok, span) in Tok::lexer(source).spanned() {
        let location = lines.locate(span.start);
        match tok {
            Ok(tok) => tokens.push((tok, location)),
            Err(()) => {
                let message = match source[span.start..].chars().next() {
                    Some('[') => "unterminated character class".to_owned(),
                    Some('\'' | '"') => "unterminated literal".to_owned(),
                    Some(c) => format!("unexpected character {:?}", c),
                    None => "unexpected end of input".to_owned(),
                };
                return Err(GrammarError::syntax(location, message));
            }
        }
    }

    let end = lines.locate(source.len());
    Ok((tokens, end))
}

/// Register the reserved words the grammar quotes, ahead of any rule name.
fn reserve_literals(
    tokens: &[(Tok<'_>, Location)],
    registry: &mut SymbolRegistry,
) -> Result<(), GrammarError> {
    for (tok, _) in tokens {
        if let Tok::Literal(text) = tok {
            registry.reserved_word(&text[1..text.len() - 1])?;
        }
    }
    Ok(())
}

// ==== parser ====

struct GrammarParser<'source, 'r> {
    tokens: Vec<(Tok<'source>, Location)>,
    pos: usize,
    end: Location,
    registry: &'r mut SymbolRegistry,
    rules: Map<SymbolId, Rule>,
    keywords: Set<String>,
    start: Option<SymbolId>,
}

impl<'source> GrammarParser<'source, '_> {
    fn peek(&self) -> Option<Tok<'source>> {
        self.tokens.get(self.pos).map(|(tok, _)| *tok)
    }

    fn peek2(&self) -> Option<Tok<'source>> {
        self.tokens.get(self.pos + 1).map(|(tok, _)| *tok)
    }

    fn location(&self) -> Location {
        self.tokens
            .get(self.pos)
            .map_or(self.end, |(_, location)| *location)
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    /// `Ident =` starts the next rule, which also ends the current one.
    fn at_rule_start(&self) -> bool {
        matches!((self.peek(), self.peek2()), (Some(Tok::Ident(_)), Some(Tok::Eq)))
    }

    fn parse_rule(&mut self) -> Result<(), GrammarError> {
        let location = self.location();
        let name = match self.peek() {
            Some(Tok::Ident(name)) => name,
            Some(tok) => {
                return Err(GrammarError::syntax(
                    location,
                    format!("expected a rule name, found {}", tok),
                ))
            }
            None => return Err(GrammarError::syntax(location, "expected a rule name")),
        };
        self.bump();

        if self.peek() != Some(Tok::Eq) {
            return Err(GrammarError::syntax(
                self.location(),
                format!("missing `=` after rule name `{}`", name),
            ));
        }
        self.bump();

        let lhs = self.registry.nonterminal(name)?;
        self.start.get_or_insert(lhs);
        tracing::trace!("rule {} => {:?}", name, lhs);

        let mut alternatives = vec![];
        loop {
            alternatives.push(self.parse_alternative()?);
            if self.peek() == Some(Tok::Bar) {
                self.bump();
                continue;
            }
            break;
        }

        match self.peek() {
            Some(Tok::Semi) => self.bump(),
            None => {}
            Some(_) if self.at_rule_start() => {}
            Some(tok) => {
                return Err(GrammarError::syntax(
                    self.location(),
                    format!("expected `|` or `;`, found {}", tok),
                ))
            }
        }

        self.rules
            .entry(lhs)
            .or_insert_with(|| Rule {
                lhs,
                name: name.to_owned(),
                alternatives: vec![],
                location,
            })
            .alternatives
            .extend(alternatives);
        Ok(())
    }

    fn parse_alternative(&mut self) -> Result<Alternative, GrammarError> {
        let location = self.location();
        let mut items = vec![];
        let mut epsilon = false;

        loop {
            if self.at_rule_start() {
                break;
            }
            let item_location = self.location();
            let kind = match self.peek() {
                None | Some(Tok::Bar | Tok::Semi | Tok::LBrace) => break,
                Some(Tok::Ident(names::EPSILON)) => {
                    epsilon = true;
                    self.bump();
                    continue;
                }
                Some(Tok::Ident(name)) if is_token_class(name) => {
                    ItemKind::TokenClass(name.to_owned())
                }
                Some(Tok::Ident(name)) => ItemKind::Nonterminal(name.to_owned()),
                Some(Tok::Literal(text)) => {
                    let lexeme = &text[1..text.len() - 1];
                    if lexeme.is_empty() {
                        return Err(GrammarError::syntax(item_location, "empty literal"));
                    }
                    self.keywords.insert(lexeme.to_owned());
                    ItemKind::Literal(lexeme.to_owned())
                }
                Some(Tok::Class(text)) => {
                    let class = &text[1..text.len() - 1];
                    let members = class_members(class)
                        .map_err(|message| GrammarError::syntax(item_location, message))?;
                    self.keywords.extend(members.iter().cloned());
                    ItemKind::CharClass {
                        class: class.to_owned(),
                        members,
                    }
                }
                Some(tok @ (Tok::Eq | Tok::RBrace | Tok::Number(_))) => {
                    return Err(GrammarError::syntax(
                        item_location,
                        format!("unexpected {}", tok),
                    ))
                }
            };
            self.bump();
            items.push(ExprItem {
                kind,
                location: item_location,
            });
        }

        if epsilon && !items.is_empty() {
            return Err(GrammarError::syntax(
                location,
                "`EPSILON` cannot be combined with other symbols",
            ));
        }

        let action = match self.peek() {
            Some(Tok::LBrace) => self.parse_action()?,
            _ => None,
        };

        Ok(Alternative {
            items,
            action,
            location,
        })
    }

    /// `{ name i0 i1 ... }`, `{ i }` or `{}`. The empty block is no action.
    fn parse_action(&mut self) -> Result<Option<SemanticAction>, GrammarError> {
        let location = self.location();
        self.bump();

        let mut name = None;
        if let Some(Tok::Ident(ident)) = self.peek() {
            name = Some(ident.to_owned());
            self.bump();
        }

        let mut indexes = vec![];
        loop {
            match self.peek() {
                Some(Tok::Number(n)) => {
                    let index = n.parse::<u8>().map_err(|_| {
                        GrammarError::syntax(self.location(), format!("index {} is too large", n))
                    })?;
                    indexes.push(index);
                    self.bump();
                }
                Some(Tok::RBrace) => {
                    self.bump();
                    break;
                }
                Some(tok) => {
                    return Err(GrammarError::syntax(
                        location,
                        format!("unterminated semantic action block: expected `}}`, found {}", tok),
                    ))
                }
                None => {
                    return Err(GrammarError::syntax(
                        location,
                        "unterminated semantic action block",
                    ))
                }
            }
        }

        if name.is_none() && indexes.is_empty() {
            return Ok(None);
        }
        Ok(Some(SemanticAction {
            name,
            indexes,
            location,
        }))
    }
}

/// `NUM`, `IDENT`, `NEWLINE`: at least one uppercase letter and no lowercase.
fn is_token_class(name: &str) -> bool {
    name.bytes().any(|b| b.is_ascii_uppercase())
        && name
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

/// Expand a class body into its members. `a-z` between two alphanumerics is a range.
fn class_members(class: &str) -> Result<Vec<String>, String> {
    let chars: Vec<char> = class.chars().filter(|c| !c.is_whitespace()).collect();
    let mut members = Set::<String>::default();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match chars.get(i + 1..i + 3) {
            Some(&['-', end]) if c.is_ascii_alphanumeric() && end.is_ascii_alphanumeric() => {
                if c > end {
                    return Err(format!("invalid range `{}-{}` in character class", c, end));
                }
                members.extend((c..=end).map(String::from));
                i += 3;
            }
            _ => {
                members.insert(c.to_string());
                i += 1;
            }
        }
    }
    if members.is_empty() {
        return Err("empty character class".to_owned());
    }
    Ok(members.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::RegistryError;

    fn parse(source: &str) -> Result<(Grammar, SymbolRegistry), GrammarError> {
        let mut registry = SymbolRegistry::new();
        let grammar = Grammar::parse(source, &mut registry)?;
        Ok((grammar, registry))
    }

    fn syntax_message(source: &str) -> String {
        match parse(source) {
            Err(GrammarError::Syntax { message, .. }) => message,
            other => panic!("expected a syntax error, got {:?}", other.map(|(g, _)| g)),
        }
    }

    #[test]
    fn arithmetic_expression() {
        let (grammar, registry) = parse(
            r#"
            sum = sum '+' term {binop 0 1 2} | term {0};
            term = term '*' factor {binop 0 1 2} | factor {0};
            factor = '(' sum ')' {1} | NUM {0};
            "#,
        )
        .unwrap();

        assert_eq!(registry.name_of(grammar.start()), Some("sum"));
        let names: Vec<_> = grammar.rules().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["sum", "term", "factor"]);

        let sum = grammar.rule_by_name("sum").unwrap();
        assert_eq!(sum.alternatives.len(), 2);
        let first = &sum.alternatives[0];
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.items[1].kind, ItemKind::Literal("+".into()));
        let action = first.action.as_ref().unwrap();
        assert_eq!(action.name.as_deref(), Some("binop"));
        assert_eq!(action.indexes, [0, 1, 2]);

        let factor = grammar.rule_by_name("factor").unwrap();
        assert_eq!(
            factor.alternatives[1].items[0].kind,
            ItemKind::TokenClass("NUM".into())
        );
        assert_eq!(factor.alternatives[0].action.as_ref().unwrap().name, None);

        let keywords: Vec<_> = grammar.keywords().iter().map(String::as_str).collect();
        assert_eq!(keywords, ["+", "*", "(", ")"]);
    }

    #[test]
    fn semicolons_are_optional() {
        let (grammar, _) = parse(
            "
            expr = expr [+-] term {binop 0 1 2}
                 | term {0}
            term = term [*/%] factor {binop 0 1 2}
                 | factor {0}
            factor = '(' expr ')' {1}
                 | [+-] factor {unop 0 1}
                 | power {0}
            power = NUM '^' factor {binop 0 1 2}
                 | NUM {0}
            ",
        )
        .unwrap();
        assert_eq!(grammar.rules().count(), 4);
        let keywords: Vec<_> = grammar.keywords().iter().map(String::as_str).collect();
        assert_eq!(keywords, ["+", "-", "*", "/", "%", "(", ")", "^"]);
    }

    #[test]
    fn character_class_ranges() {
        assert_eq!(class_members("a-c_").unwrap(), ["a", "b", "c", "_"]);
        assert_eq!(class_members("+-").unwrap(), ["+", "-"]);
        assert!(class_members("z-a").is_err());
        assert!(class_members("").is_err());
    }

    #[test]
    fn epsilon_and_empty_alternatives() {
        let (grammar, _) = parse("list = list NUM {block 0 1} | EPSILON; opt = | NUM;").unwrap();
        assert!(grammar.rule_by_name("list").unwrap().alternatives[1]
            .items
            .is_empty());
        assert!(grammar.rule_by_name("opt").unwrap().alternatives[0]
            .items
            .is_empty());
        assert!(syntax_message("a = NUM EPSILON;").contains("EPSILON"));
    }

    #[test]
    fn repeated_rule_extends_alternatives() {
        let (grammar, _) = parse("a = NUM; a = IDENT;").unwrap();
        assert_eq!(grammar.rules().count(), 1);
        assert_eq!(grammar.rule_by_name("a").unwrap().alternatives.len(), 2);
    }

    #[test]
    fn malformed_rules() {
        assert!(syntax_message("expr NUM;").contains("missing `=`"));
        assert!(syntax_message("expr = [+-;").contains("unterminated character class"));
        assert!(syntax_message("expr = NUM {binop 0 1").contains("unterminated semantic action"));
        assert!(syntax_message("expr = NUM {binop 0 ;").contains("unterminated semantic action"));
        assert!(syntax_message("expr = 'abc").contains("unterminated literal"));
        assert!(syntax_message("expr = NUM } ;").contains("unexpected"));
        assert!(syntax_message("").contains("no rules"));
    }

    #[test]
    fn error_location() {
        match parse("a = NUM;\nb NUM;") {
            Err(GrammarError::Syntax { location, .. }) => assert_eq!(location, Location::new(2, 3)),
            other => panic!("unexpected result: {:?}", other.map(|(g, _)| g)),
        }
    }

    #[test]
    fn reserved_words_as_rule_names() {
        let (grammar, registry) =
            parse("unary = '-' unary {unop 0 1} | 'if' NUM {0} | NUM {0};").unwrap();
        let unary = grammar.rule_by_name("unary").unwrap();
        assert!(!registry.is_terminal(unary.lhs));
        assert!(registry.terminal_index("if").is_some());
        assert_eq!(registry.terminal_index("var"), None);

        assert!(matches!(
            parse("var = 'var' IDENT {var 1};"),
            Err(GrammarError::Registry(RegistryError::NotNonterminal(name))) if name == "var"
        ));
    }

    #[test]
    fn locations_skip_comments_and_blank_lines() {
        let (grammar, _) = parse("# header\n\na = NUM;\n  # note\n  b = IDENT;").unwrap();
        assert_eq!(grammar.rule_by_name("a").unwrap().location, Location::new(3, 1));
        let b = grammar.rule_by_name("b").unwrap();
        assert_eq!(b.location, Location::new(5, 3));
        assert_eq!(b.alternatives[0].items[0].location, Location::new(5, 7));
    }

    #[test]
    fn display_reparses_to_same_model() {
        let source = "e = e '+' t {binop 0 1 2} | t; t = NUM | \"'\" | EPSILON;";
        let (grammar, _) = parse(source).unwrap();
        let printed = grammar.to_string();
        let (reparsed, _) = parse(&printed).unwrap();
        let alts = |g: &Grammar| -> Vec<String> {
            g.rules()
                .flat_map(|r| r.alternatives.iter().map(|a| a.to_string()))
                .collect()
        };
        assert_eq!(alts(&grammar), alts(&reparsed));
    }
}
