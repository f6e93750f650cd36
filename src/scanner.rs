//! Handle Lox's lexical analysis.
//!
//! Contains the [Scanner], which performs maximal-munch tokenization of a whole source string in
//! one pass, producing a vector of [Token]s terminated by a single [TokenType::Eof].
//!
//! # Note on terminology
//!
//! This module keeps the teacher codebase's habit of not assuming the reader already knows Crafting
//! Interpreters' terminology: "lexeme" is the exact source substring a token came from, and a
//! "token" bundles a lexeme together with its [TokenType] and (for literals) its decoded value.

use crate::diagnostics::Diagnostics;
use crate::token::{Literal, Token, TokenType};

/// Scans a whole string of Lox source code into a vector of [Token]s.
///
/// Lexical errors (an unterminated string, an unrecognized character) are reported to `diagnostics`
/// and scanning continues; they do not stop the scan or prevent a (partial) token stream from being
/// returned. The last token produced is always [TokenType::Eof].
pub fn scan_tokens(source: &str, diagnostics: &mut Diagnostics) -> Vec<Token> {
    Scanner::new(source).scan_all(diagnostics)
}

/// Scans Lox source code, maintaining the three cursors the algorithm needs: `start` (where the
/// token being scanned began), `current` (the next unread character), and `line` (the current
/// source line, for diagnostics).
struct Scanner<'a> {
    source: &'a [u8],
    start: usize,
    current: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Scanner {
            source: source.as_bytes(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    fn scan_all(mut self, diagnostics: &mut Diagnostics) -> Vec<Token> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            self.start = self.current;
            if let Some(token) = self.scan_token(diagnostics) {
                tokens.push(token);
            }
        }

        tokens.push(Token::new(TokenType::Eof, "", self.line));
        tokens
    }

    /// Scan a single token starting at `self.start`. Returns `None` for whitespace, comments, and
    /// malformed literals that produced no token (an unterminated string).
    fn scan_token(&mut self, diagnostics: &mut Diagnostics) -> Option<Token> {
        let c = self.advance();

        match c {
            b'(' => Some(self.make_token(TokenType::LeftParen)),
            b')' => Some(self.make_token(TokenType::RightParen)),
            b'{' => Some(self.make_token(TokenType::LeftBrace)),
            b'}' => Some(self.make_token(TokenType::RightBrace)),
            b',' => Some(self.make_token(TokenType::Comma)),
            b'.' => Some(self.make_token(TokenType::Dot)),
            b'-' => Some(self.make_token(TokenType::Minus)),
            b'+' => Some(self.make_token(TokenType::Plus)),
            b';' => Some(self.make_token(TokenType::Semicolon)),
            b'*' => Some(self.make_token(TokenType::Star)),
            b'!' => {
                let kind = if self.match_and_advance(b'=') {
                    TokenType::BangEqual
                } else {
                    TokenType::Bang
                };
                Some(self.make_token(kind))
            }
            b'=' => {
                let kind = if self.match_and_advance(b'=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                Some(self.make_token(kind))
            }
            b'<' => {
                let kind = if self.match_and_advance(b'=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                Some(self.make_token(kind))
            }
            b'>' => {
                let kind = if self.match_and_advance(b'=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                Some(self.make_token(kind))
            }
            b'/' => {
                if self.match_and_advance(b'/') {
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }
                    None
                } else {
                    Some(self.make_token(TokenType::Slash))
                }
            }
            b' ' | b'\r' | b'\t' => None,
            b'\n' => {
                self.line += 1;
                None
            }
            b'"' => self.string(diagnostics),
            c if c.is_ascii_digit() => Some(self.number()),
            c if is_id_start(c) => Some(self.identifier()),
            c => {
                diagnostics.lexical_error(self.line, &format!("Unexpected character {}.", c as char));
                None
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> u8 {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> u8 {
        self.source.get(self.current).copied().unwrap_or(b'\0')
    }

    fn peek_next(&self) -> u8 {
        self.source.get(self.current + 1).copied().unwrap_or(b'\0')
    }

    fn match_and_advance(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    /// Scan a string literal. Expects the opening `"` to have already been consumed.
    fn string(&mut self, diagnostics: &mut Diagnostics) -> Option<Token> {
        while self.peek() != b'"' && !self.is_at_end() {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            diagnostics.lexical_error(self.line, "Unterminated string.");
            return None;
        }

        self.advance(); // the closing quote
        let contents = self.text_between(self.start + 1, self.current - 1);
        Some(self.make_literal_token(TokenType::StringLiteral, Literal::String(contents)))
    }

    /// Scan a number literal. Expects the first digit to have already been consumed.
    fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // the '.'
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let lexeme = self.lexeme_text();
        let value: f64 = lexeme
            .parse()
            .expect("a scanned number literal must always parse as f64");
        self.make_literal_token(TokenType::Number, Literal::Number(value))
    }

    /// Scan an identifier or keyword.
    fn identifier(&mut self) -> Token {
        while is_id_continue(self.peek()) {
            self.advance();
        }

        let kind = keyword_type(self.lexeme_text().as_str()).unwrap_or(TokenType::Identifier);
        self.make_token(kind)
    }

    fn lexeme_text(&self) -> String {
        self.text_between(self.start, self.current)
    }

    fn text_between(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.source[start..end]).into_owned()
    }

    fn make_token(&self, kind: TokenType) -> Token {
        Token::new(kind, self.lexeme_text(), self.line)
    }

    fn make_literal_token(&self, kind: TokenType, literal: Literal) -> Token {
        Token::with_literal(kind, self.lexeme_text(), literal, self.line)
    }
}

/// Returns true if this char can start an identifier or keyword.
fn is_id_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

/// Returns true if this char can be used after the first character of an identifier or keyword.
fn is_id_continue(c: u8) -> bool {
    is_id_start(c) || c.is_ascii_digit()
}

/// Check if the identifier text is one of Lox's reserved keywords.
fn keyword_type(text: &str) -> Option<TokenType> {
    use TokenType::*;
    Some(match text {
        "and" => And,
        "class" => Class,
        "else" => Else,
        "false" => False,
        "for" => For,
        "fun" => Fun,
        "if" => If,
        "nil" => Nil,
        "or" => Or,
        "print" => Print,
        "return" => Return,
        "super" => Super,
        "this" => This,
        "true" => True,
        "var" => Var,
        "while" => While,
        _ => return None,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn scan(source: &str) -> Vec<TokenType> {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens(source, &mut diagnostics);
        assert!(!diagnostics.had_error(), "unexpected lexical error");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scanning_every_keyword() {
        use TokenType::*;

        let source_code = "class classic {
            fun fund() {
                if (ifree and anders or orvile) {
                    print printer;
                } else {
                    for (former = 0; former < 10; former = former + 1) {
                    nill = nil;
                    }
                    super.falseFlag = truede;
                    this.thistle = true;
                    superMario = false or true;
                    return returned;
                }
                var varied;
                while (whileLoop) {
                    0;
                }
            }
        }";

        #[rustfmt::skip]
        let expected_tokens = vec![
            Class, Identifier, LeftBrace,
                Fun, Identifier, LeftParen, RightParen, LeftBrace,
                    If, LeftParen, Identifier, And, Identifier, Or, Identifier, RightParen, LeftBrace,
                        Print, Identifier, Semicolon,
                    RightBrace, Else, LeftBrace,
                        For, LeftParen, Identifier, Equal, Number, Semicolon, Identifier, Less, Number, Semicolon, Identifier, Equal, Identifier, Plus, Number, RightParen, LeftBrace,
                            Identifier, Equal, Nil, Semicolon,
                        RightBrace,
                        Super, Dot, Identifier, Equal, Identifier, Semicolon,
                        This, Dot, Identifier, Equal,
                        True, Semicolon, Identifier, Equal, False, Or, True, Semicolon,
                        Return, Identifier, Semicolon,
                    RightBrace,
                    Var, Identifier, Semicolon,
                    While, LeftParen, Identifier, RightParen, LeftBrace,
                        Number, Semicolon,
                    RightBrace,
                RightBrace,
            RightBrace,
            Eof,
        ];

        assert_eq!(expected_tokens, scan(source_code));
    }

    #[test]
    fn number_literal_decodes_value() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("3.25;", &mut diagnostics);
        assert_eq!(Some(Literal::Number(3.25)), tokens[0].literal.clone());
    }

    #[test]
    fn string_literal_excludes_quotes() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("\"hi there\";", &mut diagnostics);
        assert_eq!(
            Some(Literal::String("hi there".to_owned())),
            tokens[0].literal.clone()
        );
    }

    #[test]
    fn unterminated_string_reports_error() {
        let mut diagnostics = Diagnostics::new();
        scan_tokens("\"oops", &mut diagnostics);
        assert!(diagnostics.had_error());
    }

    #[test]
    fn comment_is_skipped() {
        assert_eq!(vec![TokenType::Eof], scan("// a whole comment line\n"));
    }

    #[test]
    fn unexpected_character_reports_error_but_keeps_scanning() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("1 @ 2;", &mut diagnostics);
        assert!(diagnostics.had_error());
        assert_eq!(
            vec![TokenType::Number, TokenType::Number, TokenType::Semicolon, TokenType::Eof],
            tokens.into_iter().map(|t| t.kind).collect::<Vec<_>>()
        );
    }

    #[test]
    fn multiline_string_tracks_line_number() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("\"a\nb\";\nprint 1;", &mut diagnostics);
        // The string token's line is where it ends, not where it started (it advances `line` as
        // it consumes the embedded newline), matching the scanner's general rule of stamping a
        // token with the line last seen when the token finishes scanning.
        assert_eq!(2, tokens[0].line);
        assert_eq!(2, tokens[1].line); // the semicolon, same line the string token ended on
        assert_eq!(3, tokens[2].line); // print, after the second newline
    }
}
