//! Lexer for Marmoset source text.

pub mod token;

pub use token::{Token, TokenKind};

/// Hand-written lexer. Unknown characters are not fatal here; they become
/// `TokenKind::Illegal` tokens for the parser to report.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Consume the whole input and return its tokens, terminated by `Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let line = self.line;
        let column = self.column;
        let c = match self.peek() {
            Some(c) => c,
            None => return Token::new(TokenKind::Eof, line, column),
        };

        let kind = match c {
            '=' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                }
            }
            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                }
            }
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' => self.single(TokenKind::Star),
            '/' => self.single(TokenKind::Slash),
            '<' => self.single(TokenKind::Less),
            '>' => self.single(TokenKind::Greater),
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            ':' => self.single(TokenKind::Colon),
            '(' => self.single(TokenKind::LeftParen),
            ')' => self.single(TokenKind::RightParen),
            '{' => self.single(TokenKind::LeftBrace),
            '}' => self.single(TokenKind::RightBrace),
            '[' => self.single(TokenKind::LeftBracket),
            ']' => self.single(TokenKind::RightBracket),
            '"' => self.read_string(),
            c if c.is_ascii_digit() => self.read_number(),
            c if is_identifier_start(c) => self.read_identifier(),
            c => {
                self.advance();
                TokenKind::Illegal(c)
            }
        };

        Token::new(kind, line, column)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn read_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(is_identifier_continue) {
            self.advance();
        }
        let ident: String = self.chars[start..self.pos].iter().collect();
        TokenKind::keyword(&ident).unwrap_or(TokenKind::Identifier(ident))
    }

    fn read_number(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        TokenKind::Integer(self.chars[start..self.pos].iter().collect())
    }

    fn read_string(&mut self) -> TokenKind {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('"') => break,
                Some('\\') => {
                    self.advance();
                    let escaped = match self.peek() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some(other) => other,
                        None => break,
                    };
                    value.push(escaped);
                    self.advance();
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
        self.advance(); // closing quote (no-op at end of input)
        TokenKind::Str(value)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_token() {
        let input = r#"let five = 5;
let add = fn(x, y) { x + y; };
let result = add(five, 10);
!-/*5;
5 < 10 > 5;
if (5 < 10) { return true; } else { return false; }
10 == 10; 10 != 9;
"foobar" "foo bar"
[1, 2];
{"foo": "bar"}
"#;

        use TokenKind::*;
        let expected = vec![
            Let,
            Identifier("five".into()),
            Equal,
            Integer("5".into()),
            Semicolon,
            Let,
            Identifier("add".into()),
            Equal,
            Function,
            LeftParen,
            Identifier("x".into()),
            Comma,
            Identifier("y".into()),
            RightParen,
            LeftBrace,
            Identifier("x".into()),
            Plus,
            Identifier("y".into()),
            Semicolon,
            RightBrace,
            Semicolon,
            Let,
            Identifier("result".into()),
            Equal,
            Identifier("add".into()),
            LeftParen,
            Identifier("five".into()),
            Comma,
            Integer("10".into()),
            RightParen,
            Semicolon,
            Bang,
            Minus,
            Slash,
            Star,
            Integer("5".into()),
            Semicolon,
            Integer("5".into()),
            Less,
            Integer("10".into()),
            Greater,
            Integer("5".into()),
            Semicolon,
            If,
            LeftParen,
            Integer("5".into()),
            Less,
            Integer("10".into()),
            RightParen,
            LeftBrace,
            Return,
            True,
            Semicolon,
            RightBrace,
            Else,
            LeftBrace,
            Return,
            False,
            Semicolon,
            RightBrace,
            Integer("10".into()),
            EqualEqual,
            Integer("10".into()),
            Semicolon,
            Integer("10".into()),
            BangEqual,
            Integer("9".into()),
            Semicolon,
            Str("foobar".into()),
            Str("foo bar".into()),
            LeftBracket,
            Integer("1".into()),
            Comma,
            Integer("2".into()),
            RightBracket,
            Semicolon,
            LeftBrace,
            Str("foo".into()),
            Colon,
            Str("bar".into()),
            RightBrace,
            Eof,
        ];

        let tokens = Lexer::new(input).tokenize();
        let kinds: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(kinds, expected);
    }

    #[test]
    fn test_positions() {
        let tokens = Lexer::new("let x =\n  42;").tokenize();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 3));
    }

    #[test]
    fn test_illegal_character() {
        let tokens = Lexer::new("1 @ 2").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Illegal('@'));
    }

    #[test]
    fn test_string_escapes() {
        let tokens = Lexer::new(r#""a\nb\t\"c\"""#).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Str("a\nb\t\"c\"".into()));
    }
}
