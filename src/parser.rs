//! Recursive-descent parser: turns a token stream into an AST.
//!
//! The cursor machinery — `advance`/`consume`/`check`/`match_and_advance`, plus panic-mode
//! `synchronize` — is carried over from the teacher's `compiler.rs` Parser almost unchanged; what
//! differs is that each grammar rule here builds an [crate::ast] node instead of emitting bytecode,
//! since this interpreter walks the tree rather than compiling it. Desugaring `for` into `while`
//! follows `original_source/src/parser/rec_des_parser.py`.

use crate::ast::{expr, stmt, Expr, Stmt};
use crate::diagnostics::Diagnostics;
use crate::token::{Literal, Token, TokenType};
use crate::value::Value;

const MAX_ARGUMENTS: usize = 255;

/// Parses a full token stream (always ending in [TokenType::Eof]) into a list of statements.
/// Parse errors are reported to `diagnostics` and recovered from via panic-mode synchronization, so
/// a single malformed statement does not prevent the rest of the program from being parsed.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, diagnostics: &'a mut Diagnostics) -> Self {
        Parser {
            tokens,
            current: 0,
            diagnostics,
        }
    }

    pub fn parse(mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }
        statements
    }

    // ---------------------------------------------------------------- statements

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_and_advance(TokenType::Fun) {
            self.function_declaration("function")
        } else if self.match_and_advance(TokenType::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(statement) => Some(statement),
            Err(()) => {
                self.synchronize();
                None
            }
        }
    }

    fn function_declaration(&mut self, kind: &str) -> Result<Stmt, ()> {
        let name = self.consume(TokenType::Identifier, &format!("Expect {kind} name."))?;
        self.consume(TokenType::LeftParen, &format!("Expect '(' after {kind} name."))?;

        let mut params = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    self.error_at_current(&format!("Can't have more than {MAX_ARGUMENTS} parameters."));
                }
                params.push(self.consume(TokenType::Identifier, "Expect parameter name.")?);
                if !self.match_and_advance(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightParen, "Expect ')' after parameters.")?;

        self.consume(TokenType::LeftBrace, &format!("Expect '{{' before {kind} body."))?;
        let body = self.block()?;

        Ok(stmt::function(name, params, body))
    }

    fn var_declaration(&mut self) -> Result<Stmt, ()> {
        let name = self.consume(TokenType::Identifier, "Expect variable name.")?;

        let initializer = if self.match_and_advance(TokenType::Equal) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(stmt::var(name, initializer))
    }

    fn statement(&mut self) -> Result<Stmt, ()> {
        if self.match_and_advance(TokenType::Print) {
            self.print_statement()
        } else if self.match_and_advance(TokenType::Return) {
            self.return_statement()
        } else if self.match_and_advance(TokenType::While) {
            self.while_statement()
        } else if self.match_and_advance(TokenType::For) {
            self.for_statement()
        } else if self.match_and_advance(TokenType::If) {
            self.if_statement()
        } else if self.match_and_advance(TokenType::LeftBrace) {
            Ok(stmt::block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    fn print_statement(&mut self) -> Result<Stmt, ()> {
        let value = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after value.")?;
        Ok(stmt::print(value))
    }

    fn return_statement(&mut self) -> Result<Stmt, ()> {
        let keyword = self.previous().clone();
        let value = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenType::Semicolon, "Expect ';' after return value.")?;
        Ok(stmt::return_stmt(keyword, value))
    }

    fn while_statement(&mut self) -> Result<Stmt, ()> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expect ')' after condition.")?;
        let body = self.statement()?;
        Ok(stmt::while_stmt(condition, body))
    }

    /// Desugars `for (init; cond; incr) body` into a `while` loop wrapped in a block, per
    /// `original_source/src/parser/rec_des_parser.py` — there is no dedicated `For` AST node.
    fn for_statement(&mut self) -> Result<Stmt, ()> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_and_advance(TokenType::Semicolon) {
            None
        } else if self.match_and_advance(TokenType::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenType::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(TokenType::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenType::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = stmt::block(vec![body, stmt::expression(increment)]);
        }

        let condition = condition.unwrap_or_else(|| expr::literal(Value::Bool(true)));
        body = stmt::while_stmt(condition, body);

        if let Some(initializer) = initializer {
            body = stmt::block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Stmt, ()> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expect ')' after if condition.")?;

        let then_branch = self.statement()?;
        let else_branch = if self.match_and_advance(TokenType::Else) {
            Some(self.statement()?)
        } else {
            None
        };

        Ok(stmt::if_stmt(condition, then_branch, else_branch))
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ()> {
        let mut statements = Vec::new();
        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }
        self.consume(TokenType::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> Result<Stmt, ()> {
        let value = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after expression.")?;
        Ok(stmt::expression(value))
    }

    // ---------------------------------------------------------------- expressions, by precedence

    fn expression(&mut self) -> Result<Expr, ()> {
        self.assignment()
    }

    /// Right-associative and lowest precedence: parses the right-hand side as another assignment
    /// before checking that the left-hand side is actually a valid assignment target.
    fn assignment(&mut self) -> Result<Expr, ()> {
        let target = self.or()?;

        if self.match_and_advance(TokenType::Equal) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return match target.as_ref() {
                crate::ast::ExprKind::Variable { name } => Ok(expr::assign(name.clone(), value)),
                _ => {
                    // Reported but non-fatal: parsing resumes from here rather than
                    // synchronizing, so one bad assignment target doesn't discard the rest of
                    // the statement.
                    self.diagnostics.error_at(&equals, "Invalid assignment target.");
                    Ok(target)
                }
            };
        }

        Ok(target)
    }

    fn or(&mut self) -> Result<Expr, ()> {
        let mut left = self.and()?;
        while self.match_and_advance(TokenType::Or) {
            let operator = self.previous().clone();
            let right = self.and()?;
            left = expr::logical(left, operator, right);
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, ()> {
        let mut left = self.equality()?;
        while self.match_and_advance(TokenType::And) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            left = expr::logical(left, operator, right);
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ()> {
        self.binary_left_assoc(Self::comparison, &[TokenType::BangEqual, TokenType::EqualEqual])
    }

    fn comparison(&mut self) -> Result<Expr, ()> {
        self.binary_left_assoc(
            Self::term,
            &[
                TokenType::Greater,
                TokenType::GreaterEqual,
                TokenType::Less,
                TokenType::LessEqual,
            ],
        )
    }

    fn term(&mut self) -> Result<Expr, ()> {
        self.binary_left_assoc(Self::factor, &[TokenType::Minus, TokenType::Plus])
    }

    fn factor(&mut self) -> Result<Expr, ()> {
        self.binary_left_assoc(Self::unary, &[TokenType::Slash, TokenType::Star])
    }

    /// Shared shape for every left-associative binary precedence level: parse one operand at the
    /// next-higher precedence, then keep folding in `operator operand` pairs while the current
    /// token is one of `operators`.
    fn binary_left_assoc(
        &mut self,
        mut operand: impl FnMut(&mut Self) -> Result<Expr, ()>,
        operators: &[TokenType],
    ) -> Result<Expr, ()> {
        let mut left = operand(self)?;
        while operators.contains(&self.peek().kind) {
            self.advance();
            let operator = self.previous().clone();
            let right = operand(self)?;
            left = expr::binary(left, operator, right);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ()> {
        if self.match_and_advance(TokenType::Bang) || self.match_and_advance(TokenType::Minus) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(expr::unary(operator, right));
        }
        self.call()
    }

    fn call(&mut self) -> Result<Expr, ()> {
        let mut callee = self.primary()?;

        loop {
            if self.match_and_advance(TokenType::LeftParen) {
                callee = self.finish_call(callee)?;
            } else {
                break;
            }
        }

        Ok(callee)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, ()> {
        let mut arguments = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    self.error_at_current(&format!("Can't have more than {MAX_ARGUMENTS} arguments."));
                }
                arguments.push(self.expression()?);
                if !self.match_and_advance(TokenType::Comma) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenType::RightParen, "Expect ')' after arguments.")?;
        Ok(expr::call(callee, paren, arguments))
    }

    fn primary(&mut self) -> Result<Expr, ()> {
        if self.match_and_advance(TokenType::False) {
            return Ok(expr::literal(Value::Bool(false)));
        }
        if self.match_and_advance(TokenType::True) {
            return Ok(expr::literal(Value::Bool(true)));
        }
        if self.match_and_advance(TokenType::Nil) {
            return Ok(expr::literal(Value::Nil));
        }
        if self.match_and_advance(TokenType::Number) {
            return Ok(expr::literal(Value::Number(self.previous_literal_number())));
        }
        if self.match_and_advance(TokenType::StringLiteral) {
            return Ok(expr::literal(Value::from(self.previous_literal_string())));
        }
        if self.match_and_advance(TokenType::Identifier) {
            return Ok(expr::variable(self.previous().clone()));
        }
        if self.match_and_advance(TokenType::LeftParen) {
            let inner = self.expression()?;
            self.consume(TokenType::RightParen, "Expect ')' after expression.")?;
            return Ok(expr::grouping(inner));
        }

        self.error_at_current("Expect expression.");
        Err(())
    }

    fn previous_literal_number(&self) -> f64 {
        match self.previous().literal {
            Some(Literal::Number(n)) => n,
            _ => unreachable!("scanner always attaches a Literal::Number to a Number token"),
        }
    }

    fn previous_literal_string(&self) -> String {
        match &self.previous().literal {
            Some(Literal::String(s)) => s.clone(),
            _ => unreachable!("scanner always attaches a Literal::String to a StringLiteral token"),
        }
    }

    // ---------------------------------------------------------------- cursor machinery

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, kind: TokenType) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn match_and_advance(&mut self, kind: TokenType) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenType, message: &str) -> Result<Token, ()> {
        if self.check(kind) {
            return Ok(self.advance().clone());
        }
        self.error_at_current(message);
        Err(())
    }

    fn error_at_current(&mut self, message: &str) {
        let token = self.peek().clone();
        self.diagnostics.error_at(&token, message);
    }

    /// Discard tokens until we're at (what we guess is) a statement boundary, so one malformed
    /// statement doesn't cascade into spurious errors for the rest of the file.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenType::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenType::Class
                | TokenType::Fun
                | TokenType::Var
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scanner::scan_tokens;

    fn parse(source: &str) -> (Vec<Stmt>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens(source, &mut diagnostics);
        let statements = Parser::new(tokens, &mut diagnostics).parse();
        (statements, diagnostics)
    }

    #[test]
    fn parses_expression_statement() {
        let (statements, diagnostics) = parse("1 + 2 * 3;");
        assert!(!diagnostics.had_error());
        assert_eq!(1, statements.len());
    }

    #[test]
    fn precedence_groups_multiplication_tighter_than_addition() {
        let (statements, _) = parse("1 + 2 * 3;");
        let crate::ast::StmtKind::Expression(expr) = statements[0].as_ref() else {
            panic!("expected an expression statement");
        };
        let crate::ast::ExprKind::Binary { operator, .. } = expr.as_ref() else {
            panic!("expected a binary expression at the top");
        };
        assert_eq!(TokenType::Plus, operator.kind);
    }

    #[test]
    fn for_loop_desugars_to_a_block_with_a_while() {
        let (statements, diagnostics) = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(!diagnostics.had_error());
        assert!(matches!(statements[0].as_ref(), crate::ast::StmtKind::Block(_)));
    }

    #[test]
    fn invalid_assignment_target_is_an_error_but_does_not_desync_parsing() {
        let (statements, diagnostics) = parse("1 = 2; print 3;");
        assert!(diagnostics.had_error());
        // Reported, not fatal: both statements parse, rather than the first triggering
        // panic-mode synchronization and eating the second.
        assert_eq!(2, statements.len());
        assert!(matches!(statements[1].as_ref(), crate::ast::StmtKind::Print(_)));
    }

    #[test]
    fn missing_semicolon_is_an_error_and_recovers() {
        let (statements, diagnostics) = parse("print 1 2; print 3;");
        assert!(diagnostics.had_error());
        assert_eq!(1, statements.len());
    }

    #[test]
    fn function_declaration_parses_params_and_body() {
        let (statements, diagnostics) = parse("fun add(a, b) { return a + b; }");
        assert!(!diagnostics.had_error());
        assert!(matches!(statements[0].as_ref(), crate::ast::StmtKind::Function { .. }));
    }
}
