use crate::ast::{BinaryOp, Expr, FunctionDecl, Program, RangeExpr, Stmt};
use crate::error::{PhaeError, Span};
use crate::lexer::{Token, TokenType};
use crate::value::Value;
use std::rc::Rc;
use tracing::{debug, trace};

/// Recursive-descent parser. Expressions are flat and left-associative:
/// there is no precedence between operators, so `2 + 3 * 4` is `(2 + 3) * 4`.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    /// Token streams that do not end in `Eof` get one appended.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.token_type != TokenType::Eof) {
            let end = tokens.last().map_or(0, |t| t.span.end);
            tokens.push(Token {
                token_type: TokenType::Eof,
                lexeme: String::new(),
                span: Span::single(end),
            });
        }
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Program, PhaeError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.statement()?);
        }

        debug!(count = statements.len(), "parsed program");
        Ok(Program { statements })
    }

    fn statement(&mut self) -> Result<Stmt, PhaeError> {
        trace!(token = %self.peek(), "statement");
        let next = self.peek_next().token_type;
        match self.peek().token_type {
            TokenType::If => self.if_statement(),
            TokenType::While => self.while_statement(),
            TokenType::For => self.for_statement(),
            TokenType::Function => self.function_declaration(),
            TokenType::Return => self.return_statement(),
            TokenType::Print => self.print_statement(),
            TokenType::Input => self.input_statement(),
            TokenType::Identifier => match next {
                TokenType::Assign => self.assignment(),
                TokenType::LeftParen => self.call_statement(),
                _ => {
                    self.advance();
                    Err(self.unexpected("Expected '=' or '(' after identifier"))
                }
            },
            TokenType::Wow => Err(self
                .unexpected("Expected statement")
                .with_help("'WOW' is a reserved word and cannot be used here.")),
            _ => Err(self.unexpected("Expected statement")),
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>, PhaeError> {
        self.consume_with_help(
            TokenType::LeftBrace,
            "Expected '{' before block",
            "Bodies of if, while, for and function must be enclosed in braces: { ... }",
        )?;

        let mut statements = Vec::new();
        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.statement()?);
        }

        self.consume_with_help(
            TokenType::RightBrace,
            "Expected '}' after block",
            "Block statements must be closed with '}' after the opening '{'.",
        )?;
        Ok(statements)
    }

    fn if_statement(&mut self) -> Result<Stmt, PhaeError> {
        let start_span = self.advance().span.clone();

        self.consume_with_help(
            TokenType::LeftParen,
            "Expected '(' after 'if'",
            "If statements require parentheses around the condition: if (condition) { ... }",
        )?;
        let condition = self.expression()?;
        self.consume_with_help(
            TokenType::RightParen,
            "Expected ')' after if condition",
            "If conditions must be enclosed in parentheses: if (condition) { ... }",
        )?;

        let then_branch = self.block()?;
        let else_branch = if self.match_type(TokenType::Else) {
            Some(self.block()?)
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span: start_span.to(&self.previous().span),
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, PhaeError> {
        let start_span = self.advance().span.clone();

        self.consume(TokenType::LeftParen, "Expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expected ')' after while condition")?;
        let body = self.block()?;

        Ok(Stmt::While {
            condition,
            body,
            span: start_span.to(&self.previous().span),
        })
    }

    fn for_statement(&mut self) -> Result<Stmt, PhaeError> {
        let start_span = self.advance().span.clone();

        let variable = self
            .consume(TokenType::Identifier, "Expected loop variable after 'for'")?
            .lexeme
            .clone();
        self.consume(TokenType::In, "Expected 'in' after loop variable")?;

        if !self.check(TokenType::Range) {
            return Err(self
                .unexpected("Only 'range' iterables are supported")
                .with_help("Loop over a range: for i in range(start, end, step) { ... }"));
        }
        let range = self.range()?;
        let body = self.block()?;

        Ok(Stmt::For {
            variable,
            range,
            body,
            span: start_span.to(&self.previous().span),
        })
    }

    /// `range(end)`, `range(start, end)` or `range(start, end, step)`.
    fn range(&mut self) -> Result<RangeExpr, PhaeError> {
        let range_span = self.advance().span.clone();
        self.consume(TokenType::LeftParen, "Expected '(' after 'range'")?;

        let first = self.expression()?;
        let second = if self.match_type(TokenType::Comma) {
            Some(self.expression()?)
        } else {
            None
        };
        let third = if second.is_some() && self.match_type(TokenType::Comma) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume_with_help(
            TokenType::RightParen,
            "Expected ')' after range arguments",
            "range() takes one to three arguments: range(end), range(start, end) or range(start, end, step).",
        )?;

        let literal = |n: i64| Expr::Literal {
            value: Value::Int(n),
            span: range_span.clone(),
        };

        let (start, end) = match second {
            Some(end) => (first, end),
            None => (literal(0), first),
        };
        let step = third.unwrap_or_else(|| literal(1));

        Ok(RangeExpr { start, end, step })
    }

    fn function_declaration(&mut self) -> Result<Stmt, PhaeError> {
        let start_span = self.advance().span.clone();

        let name = self
            .consume(TokenType::Identifier, "Expected function name after 'function'")?
            .lexeme
            .clone();
        self.consume(TokenType::LeftParen, "Expected '(' after function name")?;

        let mut params = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                let param = self.consume(TokenType::Identifier, "Expected parameter name")?;
                params.push(param.lexeme.clone());
                if !self.match_type(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume_with_help(
            TokenType::RightParen,
            "Expected ')' after parameters",
            "Parameters are identifiers separated by commas: function name(a, b) { ... }",
        )?;

        let body = self.block()?;
        debug!(name = %name, arity = params.len(), "parsed function declaration");

        Ok(Stmt::Function(Rc::new(FunctionDecl {
            name,
            params,
            body,
            span: start_span.to(&self.previous().span),
        })))
    }

    fn return_statement(&mut self) -> Result<Stmt, PhaeError> {
        let start_span = self.advance().span.clone();

        let value = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenType::Semicolon, "Expected ';' after return value")?;

        Ok(Stmt::Return {
            value,
            span: start_span.to(&self.previous().span),
        })
    }

    fn print_statement(&mut self) -> Result<Stmt, PhaeError> {
        let start_span = self.advance().span.clone();

        self.consume(TokenType::LeftParen, "Expected '(' after 'print'")?;
        let expr = self.expression()?;
        self.consume(TokenType::RightParen, "Expected ')' after print argument")?;
        self.consume(TokenType::Semicolon, "Expected ';' after print statement")?;

        Ok(Stmt::Print {
            expr,
            span: start_span.to(&self.previous().span),
        })
    }

    fn input_statement(&mut self) -> Result<Stmt, PhaeError> {
        let start_span = self.advance().span.clone();

        self.consume(TokenType::LeftParen, "Expected '(' after 'input'")?;
        let name = self
            .consume_with_help(
                TokenType::Identifier,
                "Expected variable name in input statement",
                "input() stores the line it reads into a variable: input(name);",
            )?
            .lexeme
            .clone();
        self.consume(TokenType::RightParen, "Expected ')' after input variable")?;
        self.consume(TokenType::Semicolon, "Expected ';' after input statement")?;

        Ok(Stmt::Input {
            name,
            span: start_span.to(&self.previous().span),
        })
    }

    fn assignment(&mut self) -> Result<Stmt, PhaeError> {
        let name_token = self.advance().clone();
        self.advance(); // '='

        let value = self.expression()?;
        self.consume(TokenType::Semicolon, "Expected ';' after assignment")?;

        Ok(Stmt::Assign {
            name: name_token.lexeme,
            value,
            span: name_token.span.to(&self.previous().span),
        })
    }

    fn call_statement(&mut self) -> Result<Stmt, PhaeError> {
        let name_token = self.advance().clone();
        let args = self.arguments()?;
        self.consume(TokenType::Semicolon, "Expected ';' after function call")?;

        Ok(Stmt::Call {
            name: name_token.lexeme,
            args,
            span: name_token.span.to(&self.previous().span),
        })
    }

    /// `( expression ("," expression)* )` with the opening paren still unread.
    fn arguments(&mut self) -> Result<Vec<Expr>, PhaeError> {
        self.consume(TokenType::LeftParen, "Expected '(' before arguments")?;

        let mut args = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_type(TokenType::Comma) {
                    break;
                }
            }
        }

        self.consume_with_help(
            TokenType::RightParen,
            "Expected ')' after arguments",
            "Arguments are separated by commas, with no trailing comma: name(a, b)",
        )?;
        Ok(args)
    }

    fn expression(&mut self) -> Result<Expr, PhaeError> {
        let mut expr = self.primary()?;

        while self.check(TokenType::Operator) {
            let operator_token = self.advance().clone();
            let operator = BinaryOp::from_lexeme(&operator_token.lexeme).ok_or_else(|| {
                PhaeError::parse_error(
                    operator_token.span.clone(),
                    format!("Unknown operator '{}'", operator_token.lexeme),
                )
            })?;

            let right = self.primary().map_err(|error| {
                error.with_help(format!(
                    "The operator '{}' requires an expression on both sides.",
                    operator_token.lexeme
                ))
            })?;

            let span = expr.span().to(right.span());
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, PhaeError> {
        let token = self.peek().clone();

        match token.token_type {
            TokenType::Number => {
                self.advance();
                let n = token.lexeme.parse::<i64>().map_err(|_| {
                    PhaeError::parse_error(token.span.clone(), format!("Invalid integer: {}", token.lexeme))
                })?;
                Ok(Expr::Literal {
                    value: Value::Int(n),
                    span: token.span,
                })
            }
            TokenType::String => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::String(token.lexeme),
                    span: token.span,
                })
            }
            TokenType::Identifier => {
                self.advance();
                if self.check(TokenType::LeftParen) {
                    let args = self.arguments()?;
                    Ok(Expr::Call {
                        name: token.lexeme,
                        args,
                        span: token.span.to(&self.previous().span),
                    })
                } else {
                    Ok(Expr::Variable {
                        name: token.lexeme,
                        span: token.span,
                    })
                }
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenType::RightParen, "Expected ')' after expression")?;
                Ok(expr)
            }
            // Negation is written as `0 - operand`.
            TokenType::Operator if token.lexeme == "-" => {
                self.advance();
                let operand = self.primary()?;
                let span = token.span.to(operand.span());
                Ok(Expr::Binary {
                    left: Box::new(Expr::Literal {
                        value: Value::Int(0),
                        span: token.span,
                    }),
                    operator: BinaryOp::Subtract,
                    right: Box::new(operand),
                    span,
                })
            }
            _ => Err(self.unexpected("Expected expression")),
        }
    }

    fn match_type(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.peek().token_type == token_type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_next(&self) -> &Token {
        self.tokens
            .get(self.current + 1)
            .unwrap_or_else(|| self.peek())
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<&Token, PhaeError> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(message))
        }
    }

    fn consume_with_help(&mut self, token_type: TokenType, message: &str, help: &str) -> Result<&Token, PhaeError> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(message).with_help(help))
        }
    }

    /// Error at the current token naming what was found instead.
    fn unexpected(&self, message: &str) -> PhaeError {
        let token = self.peek();
        let found = match token.token_type {
            TokenType::Identifier | TokenType::Number | TokenType::Operator => {
                format!("{} '{}'", token.token_type, token.lexeme)
            }
            TokenType::String => format!("string \"{}\"", token.lexeme),
            other => other.to_string(),
        };

        // At end of input, point just past the last real token.
        let error_span = if self.is_at_end() && self.current > 0 {
            Span::single(self.tokens[self.current - 1].span.end)
        } else {
            token.span.clone()
        };

        PhaeError::parse_error(error_span, format!("{}, found {}", message, found))
    }
}
