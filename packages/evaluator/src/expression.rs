use crate::error::{EvalError, EvalResult};
use crate::lexer::{tokenize, Spanned, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(f64),
    String(String),
    Template(Vec<TemplatePart>),
    Boolean(bool),
    Null,
    Variable(String),
    Member {
        object: Box<Expression>,
        property: String,
    },
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Array(Vec<Expression>),
    Object(Vec<(String, Expression)>),
    Unary {
        operator: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        operator: BinaryOp,
        right: Box<Expression>,
    },
    Conditional {
        test: Box<Expression>,
        consequent: Box<Expression>,
        alternate: Box<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Expression(Expression),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    And,
    Or,
    Nullish,
}

/// Unbuffered code line.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Declare { name: String, value: Option<Expression> },
    Assign { name: String, value: Expression },
    Expression(Expression),
}

pub fn parse_expression(source: &str) -> EvalResult<Expression> {
    let mut parser = Parser::new(source)?;
    let expression = parser.parse_expression()?;
    parser.expect_end()?;
    Ok(expression)
}

/// Comma separated argument list, as written between a mixin's parentheses.
pub fn parse_arguments(source: &str) -> EvalResult<Vec<Expression>> {
    let mut parser = Parser::new(source)?;
    let mut arguments = Vec::new();
    while !parser.is_at_end() {
        arguments.push(parser.parse_expression()?);
        if !parser.match_token(Token::Comma) {
            break;
        }
    }
    parser.expect_end()?;
    Ok(arguments)
}

pub fn parse_statements(source: &str) -> EvalResult<Vec<Statement>> {
    let mut parser = Parser::new(source)?;
    let mut statements = Vec::new();
    while !parser.is_at_end() {
        if parser.match_token(Token::Semicolon) {
            continue;
        }
        statements.push(parser.parse_statement()?);
        if !parser.match_token(Token::Semicolon) {
            break;
        }
    }
    parser.expect_end()?;
    Ok(statements)
}

/// Recursive descent over the token stream, one function per precedence
/// level.
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Spanned<'src>>,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> EvalResult<Self> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    pub fn parse_statement(&mut self) -> EvalResult<Statement> {
        if matches!(self.peek(), Some((Token::Var | Token::Let | Token::Const, _))) {
            self.advance();
            let name = self.expect_ident()?;
            let value = if self.match_token(Token::Assign) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            return Ok(Statement::Declare { name, value });
        }

        if let (Some((Token::Ident(name), _)), Some((Token::Assign, _))) = (self.peek(), self.peek_ahead(1)) {
            let name = name.to_string();
            self.pos += 2;
            let value = self.parse_expression()?;
            return Ok(Statement::Assign { name, value });
        }

        let expression = self.parse_expression()?;
        if self.check(Token::Assign) {
            return Err(EvalError::UnsupportedStatement {
                statement: self.source.to_string(),
            });
        }
        Ok(Statement::Expression(expression))
    }

    pub fn parse_expression(&mut self) -> EvalResult<Expression> {
        self.parse_conditional_expression()
    }

    fn parse_conditional_expression(&mut self) -> EvalResult<Expression> {
        let test = self.parse_nullish_expression()?;

        if !self.match_token(Token::Question) {
            return Ok(test);
        }

        let consequent = self.parse_expression()?;
        self.expect(Token::Colon)?;
        let alternate = self.parse_expression()?;

        Ok(Expression::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_nullish_expression(&mut self) -> EvalResult<Expression> {
        let mut left = self.parse_or_expression()?;
        while self.match_token(Token::Nullish) {
            let right = self.parse_or_expression()?;
            left = binary(left, BinaryOp::Nullish, right);
        }
        Ok(left)
    }

    fn parse_or_expression(&mut self) -> EvalResult<Expression> {
        let mut left = self.parse_and_expression()?;
        while self.match_token(Token::Or) {
            let right = self.parse_and_expression()?;
            left = binary(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> EvalResult<Expression> {
        let mut left = self.parse_equality_expression()?;
        while self.match_token(Token::And) {
            let right = self.parse_equality_expression()?;
            left = binary(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn parse_equality_expression(&mut self) -> EvalResult<Expression> {
        let mut left = self.parse_comparison_expression()?;
        while let Some(operator) = self.match_operator(|token| match token {
            Token::Equal => Some(BinaryOp::Equal),
            Token::NotEqual => Some(BinaryOp::NotEqual),
            Token::StrictEqual => Some(BinaryOp::StrictEqual),
            Token::StrictNotEqual => Some(BinaryOp::StrictNotEqual),
            _ => None,
        }) {
            let right = self.parse_comparison_expression()?;
            left = binary(left, operator, right);
        }
        Ok(left)
    }

    fn parse_comparison_expression(&mut self) -> EvalResult<Expression> {
        let mut left = self.parse_additive_expression()?;
        while let Some(operator) = self.match_operator(|token| match token {
            Token::Less => Some(BinaryOp::Less),
            Token::LessEqual => Some(BinaryOp::LessEqual),
            Token::Greater => Some(BinaryOp::Greater),
            Token::GreaterEqual => Some(BinaryOp::GreaterEqual),
            _ => None,
        }) {
            let right = self.parse_additive_expression()?;
            left = binary(left, operator, right);
        }
        Ok(left)
    }

    fn parse_additive_expression(&mut self) -> EvalResult<Expression> {
        let mut left = self.parse_multiplicative_expression()?;
        while let Some(operator) = self.match_operator(|token| match token {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Subtract),
            _ => None,
        }) {
            let right = self.parse_multiplicative_expression()?;
            left = binary(left, operator, right);
        }
        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> EvalResult<Expression> {
        let mut left = self.parse_unary_expression()?;
        while let Some(operator) = self.match_operator(|token| match token {
            Token::Star => Some(BinaryOp::Multiply),
            Token::Slash => Some(BinaryOp::Divide),
            Token::Percent => Some(BinaryOp::Remainder),
            _ => None,
        }) {
            let right = self.parse_unary_expression()?;
            left = binary(left, operator, right);
        }
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> EvalResult<Expression> {
        let operator = self.match_operator(|token| match token {
            Token::Bang => Some(UnaryOp::Not),
            Token::Minus => Some(UnaryOp::Negate),
            Token::Plus => Some(UnaryOp::Plus),
            _ => None,
        });

        match operator {
            Some(operator) => Ok(Expression::Unary {
                operator,
                operand: Box::new(self.parse_unary_expression()?),
            }),
            None => self.parse_postfix_expression(),
        }
    }

    fn parse_postfix_expression(&mut self) -> EvalResult<Expression> {
        let mut expression = self.parse_primary_expression()?;

        loop {
            if self.match_token(Token::Dot) {
                let property = self.expect_property_name()?;
                expression = Expression::Member {
                    object: Box::new(expression),
                    property,
                };
            } else if self.match_token(Token::LBracket) {
                let index = self.parse_expression()?;
                self.expect(Token::RBracket)?;
                expression = Expression::Index {
                    object: Box::new(expression),
                    index: Box::new(index),
                };
            } else if self.match_token(Token::LParen) {
                expression = Expression::Call {
                    callee: Box::new(expression),
                    arguments: self.parse_call_arguments()?,
                };
            } else {
                return Ok(expression);
            }
        }
    }

    fn parse_primary_expression(&mut self) -> EvalResult<Expression> {
        let Some((token, span)) = self.advance().cloned() else {
            return Err(self.error("unexpected end of expression"));
        };

        match token {
            Token::Number(n) => n
                .parse::<f64>()
                .map(Expression::Number)
                .map_err(|_| EvalError::syntax(self.source, span.start, format!("invalid number {}", n))),
            Token::String(s) => Ok(Expression::String(unescape(&s[1..s.len() - 1]))),
            Token::Template(t) => parse_template(&t[1..t.len() - 1], span.start + 1),
            Token::True => Ok(Expression::Boolean(true)),
            Token::False => Ok(Expression::Boolean(false)),
            Token::Null | Token::Undefined => Ok(Expression::Null),
            Token::Ident(name) => Ok(Expression::Variable(name.to_string())),
            Token::LParen => {
                let expression = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expression)
            }
            Token::LBracket => self.parse_array(),
            Token::LBrace => self.parse_object(),
            other => Err(EvalError::syntax(
                self.source,
                span.start,
                format!("unexpected {}", other),
            )),
        }
    }

    fn parse_call_arguments(&mut self) -> EvalResult<Vec<Expression>> {
        let mut arguments = Vec::new();
        while !self.match_token(Token::RParen) {
            arguments.push(self.parse_expression()?);
            if !self.match_token(Token::Comma) {
                self.expect(Token::RParen)?;
                break;
            }
        }
        Ok(arguments)
    }

    fn parse_array(&mut self) -> EvalResult<Expression> {
        let mut items = Vec::new();
        while !self.match_token(Token::RBracket) {
            items.push(self.parse_expression()?);
            if !self.match_token(Token::Comma) {
                self.expect(Token::RBracket)?;
                break;
            }
        }
        Ok(Expression::Array(items))
    }

    fn parse_object(&mut self) -> EvalResult<Expression> {
        let mut entries = Vec::new();
        while !self.match_token(Token::RBrace) {
            let (key, shorthand) = match self.advance().cloned() {
                Some((Token::Ident(name), _)) => (name.to_string(), true),
                Some((Token::String(s), _)) => (unescape(&s[1..s.len() - 1]), false),
                Some((Token::Number(n), _)) => (n.to_string(), false),
                Some((token @ (Token::True | Token::False | Token::Null), _)) => (token.to_string(), false),
                _ => return Err(self.error("expected property name")),
            };

            let value = if self.match_token(Token::Colon) {
                self.parse_expression()?
            } else if shorthand {
                Expression::Variable(key.clone())
            } else {
                return Err(self.error("expected ':'"));
            };
            entries.push((key, value));

            if !self.match_token(Token::Comma) {
                self.expect(Token::RBrace)?;
                break;
            }
        }
        Ok(Expression::Object(entries))
    }

    fn expect_property_name(&mut self) -> EvalResult<String> {
        match self.advance().cloned() {
            Some((Token::Ident(name), _)) => Ok(name.to_string()),
            Some((
                token @ (Token::True
                | Token::False
                | Token::Null
                | Token::Undefined
                | Token::Var
                | Token::Let
                | Token::Const),
                _,
            )) => Ok(token.to_string()),
            _ => Err(self.error("expected property name")),
        }
    }

    // Helper methods

    fn peek(&self) -> Option<&Spanned<'src>> {
        self.tokens.get(self.pos)
    }

    fn peek_ahead(&self, offset: usize) -> Option<&Spanned<'src>> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<&Spanned<'src>> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: Token) -> bool {
        if let Some((t, _)) = self.peek() {
            std::mem::discriminant(t) == std::mem::discriminant(&token)
        } else {
            false
        }
    }

    fn match_token(&mut self, token: Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn match_operator<T>(&mut self, select: impl Fn(&Token<'src>) -> Option<T>) -> Option<T> {
        let operator = self.peek().and_then(|(token, _)| select(token))?;
        self.pos += 1;
        Some(operator)
    }

    fn expect(&mut self, token: Token) -> EvalResult<()> {
        if self.check(token.clone()) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected {}", token)))
        }
    }

    fn expect_ident(&mut self) -> EvalResult<String> {
        match self.peek() {
            Some((Token::Ident(name), _)) => {
                let name = name.to_string();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error("expected identifier")),
        }
    }

    fn expect_end(&self) -> EvalResult<()> {
        match self.peek() {
            None => Ok(()),
            Some((token, _)) => Err(self.error(format!("unexpected {}", token))),
        }
    }

    fn error(&self, message: impl Into<String>) -> EvalError {
        let pos = self
            .tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map(|(_, span)| span.start)
            .unwrap_or(self.source.len());
        EvalError::syntax(self.source, pos, message)
    }
}

fn binary(left: Expression, operator: BinaryOp, right: Expression) -> Expression {
    Expression::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Split a template body into literal text and `${}` expressions.
/// `offset` is the body's position in the enclosing source, for errors.
fn parse_template(body: &str, offset: usize) -> EvalResult<Expression> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut rest = body;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("${") {
            let end = closing_brace(after).ok_or_else(|| {
                EvalError::syntax(body, offset + body.len() - rest.len(), "unterminated ${")
            })?;
            if !text.is_empty() {
                parts.push(TemplatePart::Text(unescape(&std::mem::take(&mut text))));
            }
            parts.push(TemplatePart::Expression(parse_expression(&after[..end])?));
            rest = &after[end + 1..];
            continue;
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            text.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    text.push(escaped);
                }
            }
        }
        rest = chars.as_str();
    }

    if !text.is_empty() {
        parts.push(TemplatePart::Text(unescape(&text)));
    }
    Ok(Expression::Template(parts))
}

/// Byte index of the `}` closing an interpolation that starts at `source`.
fn closing_brace(source: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (index, c) in source.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '{' => depth += 1,
            '}' if depth == 0 => return Some(index),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}
