//! Pratt parser producing the compiler's AST.

mod tests;

use crate::ast::{BlockStatement, Expr, Program, Stmt};
use crate::error::ParserError;
use crate::lexer::{Token, TokenKind};

/// Operator precedence levels (higher binds tighter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,      // == !=
    LessGreater, // < >
    Sum,         // + -
    Product,     // * /
    Prefix,      // -x !x
    Call,        // f(x)
    Index,       // a[i]
}

fn token_precedence(kind: &TokenKind) -> Precedence {
    match kind {
        TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equals,
        TokenKind::Less | TokenKind::Greater => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Star | TokenKind::Slash => Precedence::Product,
        TokenKind::LeftParen => Precedence::Call,
        TokenKind::LeftBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

/// The parser walks a pre-lexed token buffer with a one-token lookahead.
/// Errors are collected rather than fatal, so a single pass reports as many
/// problems as it can.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParserError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Parse a whole program. Returns every collected error on failure.
    pub fn parse(mut self) -> Result<Program, Vec<ParserError>> {
        let mut program = Program::default();

        while !matches!(self.cur(), TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
            self.next_token();
        }

        if self.errors.is_empty() {
            Ok(program)
        } else {
            Err(self.errors)
        }
    }

    // ===== Statements =====

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur() {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Stmt> {
        let name = self.expect_identifier()?;
        self.expect_peek(TokenKind::Equal)?;
        self.next_token();

        let mut value = self.parse_expression(Precedence::Lowest)?;
        // A function literal bound directly by a let knows its own name, so
        // its body can refer to it without capturing.
        if let Expr::Function { name: fn_name, .. } = &mut value {
            *fn_name = Some(name.clone());
        }

        if matches!(self.peek(), TokenKind::Semicolon) {
            self.next_token();
        }
        Some(Stmt::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        if matches!(self.peek(), TokenKind::Semicolon) {
            self.next_token();
        }
        Some(Stmt::Return(value))
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        if matches!(self.peek(), TokenKind::Semicolon) {
            self.next_token();
        }
        Some(Stmt::Expression(expr))
    }

    fn parse_block_statement(&mut self) -> BlockStatement {
        let mut block = BlockStatement::default();
        self.next_token();

        while !matches!(self.cur(), TokenKind::RightBrace | TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                block.statements.push(stmt);
            }
            self.next_token();
        }
        block
    }

    // ===== Expressions =====

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;

        while !matches!(self.peek(), TokenKind::Semicolon)
            && precedence < token_precedence(self.peek())
        {
            self.next_token();
            left = self.parse_infix(left)?;
        }
        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.cur().clone() {
            TokenKind::Identifier(name) => Some(Expr::Identifier(name)),
            TokenKind::Integer(literal) => match literal.parse::<i64>() {
                Ok(value) => Some(Expr::IntegerLiteral(value)),
                Err(_) => {
                    self.errors.push(ParserError::InvalidInteger(literal));
                    None
                }
            },
            TokenKind::Str(value) => Some(Expr::StringLiteral(value)),
            TokenKind::True => Some(Expr::BooleanLiteral(true)),
            TokenKind::False => Some(Expr::BooleanLiteral(false)),
            TokenKind::Bang => self.parse_prefix_operator("!"),
            TokenKind::Minus => self.parse_prefix_operator("-"),
            TokenKind::LeftParen => self.parse_grouped(),
            TokenKind::If => self.parse_if(),
            TokenKind::Function => self.parse_function(),
            TokenKind::LeftBracket => {
                let elements = self.parse_expression_list(TokenKind::RightBracket)?;
                Some(Expr::Array(elements))
            }
            TokenKind::LeftBrace => self.parse_hash(),
            TokenKind::Illegal(c) => {
                self.errors.push(ParserError::IllegalCharacter(c));
                None
            }
            other => {
                self.errors.push(ParserError::NoPrefixRule(other.to_string()));
                None
            }
        }
    }

    fn parse_prefix_operator(&mut self, operator: &str) -> Option<Expr> {
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expr::Prefix {
            operator: operator.to_string(),
            right: Box::new(right),
        })
    }

    fn parse_infix(&mut self, left: Expr) -> Option<Expr> {
        let operator = match self.cur() {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::EqualEqual => "==",
            TokenKind::BangEqual => "!=",
            TokenKind::LeftParen => return self.parse_call(left),
            TokenKind::LeftBracket => return self.parse_index(left),
            // Unreachable: parse_expression only descends here for the
            // kinds above.
            other => {
                let found = other.to_string();
                let (line, column) = self.cur_position();
                self.errors.push(ParserError::UnexpectedToken {
                    expected: "an infix operator".to_string(),
                    found,
                    line,
                    column,
                });
                return None;
            }
        };

        let precedence = token_precedence(self.cur());
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expr::Infix {
            operator: operator.to_string(),
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_grouped(&mut self) -> Option<Expr> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParen)?;
        Some(expr)
    }

    fn parse_if(&mut self) -> Option<Expr> {
        self.expect_peek(TokenKind::LeftParen)?;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParen)?;
        self.expect_peek(TokenKind::LeftBrace)?;
        let consequence = self.parse_block_statement();

        let alternative = if matches!(self.peek(), TokenKind::Else) {
            self.next_token();
            self.expect_peek(TokenKind::LeftBrace)?;
            Some(self.parse_block_statement())
        } else {
            None
        };

        Some(Expr::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function(&mut self) -> Option<Expr> {
        self.expect_peek(TokenKind::LeftParen)?;
        let parameters = self.parse_function_parameters()?;
        self.expect_peek(TokenKind::LeftBrace)?;
        let body = self.parse_block_statement();
        Some(Expr::Function {
            parameters,
            body,
            name: None,
        })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<String>> {
        let mut parameters = Vec::new();
        if matches!(self.peek(), TokenKind::RightParen) {
            self.next_token();
            return Some(parameters);
        }

        parameters.push(self.expect_identifier()?);
        while matches!(self.peek(), TokenKind::Comma) {
            self.next_token();
            parameters.push(self.expect_identifier()?);
        }
        self.expect_peek(TokenKind::RightParen)?;
        Some(parameters)
    }

    fn parse_call(&mut self, function: Expr) -> Option<Expr> {
        let arguments = self.parse_expression_list(TokenKind::RightParen)?;
        Some(Expr::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_index(&mut self, left: Expr) -> Option<Expr> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightBracket)?;
        Some(Expr::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut list = Vec::new();
        if self.peek() == &end {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while matches!(self.peek(), TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect_peek(end)?;
        Some(list)
    }

    fn parse_hash(&mut self) -> Option<Expr> {
        let mut pairs = Vec::new();
        while !matches!(self.peek(), TokenKind::RightBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(TokenKind::Colon)?;
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if !matches!(self.peek(), TokenKind::RightBrace) {
                self.expect_peek(TokenKind::Comma)?;
            }
        }
        self.expect_peek(TokenKind::RightBrace)?;
        Some(Expr::Hash(pairs))
    }

    // ===== Cursor helpers =====

    fn cur(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn cur_position(&self) -> (u32, u32) {
        let token = &self.tokens[self.pos];
        (token.line, token.column)
    }

    fn peek_token(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + 1).min(last)]
    }

    fn peek(&self) -> &TokenKind {
        &self.peek_token().kind
    }

    fn next_token(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn expect_peek(&mut self, expected: TokenKind) -> Option<()> {
        if self.peek() == &expected {
            self.next_token();
            Some(())
        } else {
            self.push_unexpected(expected.to_string());
            None
        }
    }

    fn expect_identifier(&mut self) -> Option<String> {
        if let TokenKind::Identifier(name) = self.peek() {
            let name = name.clone();
            self.next_token();
            Some(name)
        } else {
            self.push_unexpected("identifier".to_string());
            None
        }
    }

    fn push_unexpected(&mut self, expected: String) {
        let token = self.peek_token();
        let (found, line, column) = (token.kind.to_string(), token.line, token.column);
        self.errors.push(ParserError::UnexpectedToken {
            expected,
            found,
            line,
            column,
        });
    }
}
