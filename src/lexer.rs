use crate::error::{PhaeError, Span};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,

    // `=`; every other operator is an `Operator` carrying its lexeme
    Assign,
    Operator,

    // Literals
    Identifier,
    Number,
    String,

    // Keywords
    If,
    Else,
    While,
    For,
    In,
    Range,
    Print,
    Input,
    Function,
    Return,
    /// Reserved declaration keyword with no grammar production.
    Wow,

    // Special
    Eof,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TokenType::LeftParen => "'('",
            TokenType::RightParen => "')'",
            TokenType::LeftBrace => "'{'",
            TokenType::RightBrace => "'}'",
            TokenType::Comma => "','",
            TokenType::Semicolon => "';'",
            TokenType::Assign => "'='",
            TokenType::Operator => "operator",
            TokenType::Identifier => "identifier",
            TokenType::Number => "number",
            TokenType::String => "string",
            TokenType::If => "'if'",
            TokenType::Else => "'else'",
            TokenType::While => "'while'",
            TokenType::For => "'for'",
            TokenType::In => "'in'",
            TokenType::Range => "'range'",
            TokenType::Print => "'print'",
            TokenType::Input => "'input'",
            TokenType::Function => "'function'",
            TokenType::Return => "'return'",
            TokenType::Wow => "'WOW'",
            TokenType::Eof => "end of input",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    /// Source text of the token; for strings, the contents without quotes.
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span) -> Self {
        Self {
            token_type,
            lexeme,
            span,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:?}, {})", self.token_type, self.lexeme)
    }
}

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    keywords: HashMap<&'static str, TokenType>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("WOW", TokenType::Wow);
        keywords.insert("if", TokenType::If);
        keywords.insert("else", TokenType::Else);
        keywords.insert("while", TokenType::While);
        keywords.insert("for", TokenType::For);
        keywords.insert("in", TokenType::In);
        keywords.insert("range", TokenType::Range);
        keywords.insert("print", TokenType::Print);
        keywords.insert("input", TokenType::Input);
        keywords.insert("function", TokenType::Function);
        keywords.insert("return", TokenType::Return);

        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            keywords,
        }
    }

    pub fn scan_tokens(mut self) -> Result<Vec<Token>, PhaeError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            Span::single(self.current),
        ));

        debug!(count = self.tokens.len(), "scanned tokens");
        Ok(self.tokens)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) -> Result<(), PhaeError> {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            ';' => self.add_token(TokenType::Semicolon),
            '+' | '-' | '*' | '%' => self.add_token(TokenType::Operator),
            '/' => {
                if self.match_char('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Operator);
                }
            }
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::Operator
                } else {
                    TokenType::Assign
                };
                self.add_token(token_type);
            }
            '<' | '>' => {
                self.match_char('=');
                self.add_token(TokenType::Operator);
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::Operator);
                } else {
                    return Err(PhaeError::lex_error(
                        Span::single(self.start),
                        "Unexpected character: '!'".to_string(),
                    )
                    .with_help("'!' is only valid as part of '!='."));
                }
            }
            '"' => self.string()?,
            c if c.is_whitespace() => {}
            c if c.is_ascii_digit() => self.number()?,
            c if c.is_alphabetic() => self.identifier(),
            _ => {
                return Err(PhaeError::lex_error(
                    Span::single(self.start),
                    format!("Unexpected character: '{}'", c),
                ));
            }
        }

        Ok(())
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        self.current += 1;
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.current += 1;
            true
        }
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn text(&self, start: usize, end: usize) -> String {
        self.source[start..end].iter().collect()
    }

    fn string(&mut self) -> Result<(), PhaeError> {
        while self.peek() != '"' && !self.is_at_end() {
            self.advance();
        }

        if self.is_at_end() {
            return Err(PhaeError::lex_error(
                Span::new(self.start, self.current),
                "Unterminated string".to_string(),
            )
            .with_help("String literals must be closed with '\"' before the end of the program."));
        }

        // Closing quote
        self.advance();

        let contents = self.text(self.start + 1, self.current - 1);
        self.add_token_with_content(TokenType::String, contents);
        Ok(())
    }

    fn number(&mut self) -> Result<(), PhaeError> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let digits = self.text(self.start, self.current);
        if digits.parse::<i64>().is_err() {
            return Err(PhaeError::lex_error(
                Span::new(self.start, self.current),
                format!("Invalid integer: {}", digits),
            )
            .with_help(format!("Integer literals must not exceed {}.", i64::MAX)));
        }

        self.add_token_with_content(TokenType::Number, digits);
        Ok(())
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() {
            self.advance();
        }

        let text = self.text(self.start, self.current);
        let token_type = self
            .keywords
            .get(text.as_str())
            .copied()
            .unwrap_or(TokenType::Identifier);

        self.add_token_with_content(token_type, text);
    }

    fn add_token(&mut self, token_type: TokenType) {
        let text = self.text(self.start, self.current);
        self.add_token_with_content(token_type, text);
    }

    fn add_token_with_content(&mut self, token_type: TokenType, lexeme: String) {
        self.tokens.push(Token::new(
            token_type,
            lexeme,
            Span::new(self.start, self.current),
        ));
    }
}
