use logos::Logos;
use std::fmt;
use std::ops::Range;

use crate::error::{EvalError, EvalResult};

/// Tokens of the expression subset templates embed.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token<'src> {
    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("null")]
    Null,

    #[token("undefined")]
    Undefined,

    #[token("var")]
    Var,

    #[token("let")]
    Let,

    #[token("const")]
    Const,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| lex.slice())]
    Ident(&'src str),

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    Number(&'src str),

    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| lex.slice())]
    #[regex(r"'([^'\\\n]|\\.)*'", |lex| lex.slice())]
    String(&'src str),

    #[regex(r"`([^`\\]|\\(.|\n))*`", |lex| lex.slice())]
    Template(&'src str),

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token("?")]
    Question,

    #[token("??")]
    Nullish,

    #[token("=")]
    Assign,

    #[token("==")]
    Equal,

    #[token("!=")]
    NotEqual,

    #[token("===")]
    StrictEqual,

    #[token("!==")]
    StrictNotEqual,

    #[token("<")]
    Less,

    #[token("<=")]
    LessEqual,

    #[token(">")]
    Greater,

    #[token(">=")]
    GreaterEqual,

    #[token("&&")]
    And,

    #[token("||")]
    Or,

    #[token("!")]
    Bang,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::Undefined => write!(f, "undefined"),
            Token::Var => write!(f, "var"),
            Token::Let => write!(f, "let"),
            Token::Const => write!(f, "const"),
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::Number(n) => write!(f, "number {}", n),
            Token::String(s) => write!(f, "string {}", s),
            Token::Template(s) => write!(f, "template {}", s),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::Question => write!(f, "?"),
            Token::Nullish => write!(f, "??"),
            Token::Assign => write!(f, "="),
            Token::Equal => write!(f, "=="),
            Token::NotEqual => write!(f, "!="),
            Token::StrictEqual => write!(f, "==="),
            Token::StrictNotEqual => write!(f, "!=="),
            Token::Less => write!(f, "<"),
            Token::LessEqual => write!(f, "<="),
            Token::Greater => write!(f, ">"),
            Token::GreaterEqual => write!(f, ">="),
            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
            Token::Bang => write!(f, "!"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
        }
    }
}

pub type Spanned<'src> = (Token<'src>, Range<usize>);

/// Tokenize `source`. Unlike a forgiving editor lexer, any character outside
/// the grammar is an error.
pub fn tokenize(source: &str) -> EvalResult<Vec<Spanned<'_>>> {
    Token::lexer(source)
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => Ok((token, span)),
            Err(()) => Err(EvalError::syntax(
                source,
                span.start,
                format!("unexpected character '{}'", source.get(span.clone()).unwrap_or("?")),
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token<'_>> {
        tokenize(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("true falsey null $$ item_1"),
            vec![
                Token::True,
                Token::Ident("falsey"),
                Token::Null,
                Token::Ident("$$"),
                Token::Ident("item_1"),
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds(r#"1.5 "a\"b" 'c' `x ${y}`"#),
            vec![
                Token::Number("1.5"),
                Token::String(r#""a\"b""#),
                Token::String("'c'"),
                Token::Template("`x ${y}`"),
            ]
        );
    }

    #[test]
    fn test_longest_operator_wins() {
        assert_eq!(
            kinds("a === b !== c <= d ?? e"),
            vec![
                Token::Ident("a"),
                Token::StrictEqual,
                Token::Ident("b"),
                Token::StrictNotEqual,
                Token::Ident("c"),
                Token::LessEqual,
                Token::Ident("d"),
                Token::Nullish,
                Token::Ident("e"),
            ]
        );
    }

    #[test]
    fn test_multiline_template() {
        assert_eq!(kinds("`a\nb`"), vec![Token::Template("`a\nb`")]);
    }

    #[test]
    fn test_unknown_character() {
        let err = tokenize("a # b").unwrap_err();
        assert!(matches!(err, EvalError::Syntax { pos: 2, .. }));
    }
}
