//! Hand-written lexer for the `.iv` source grammar (spec §6.1).
//!
//! Tokens are scanned line-by-line; `//` comments run to end of line and
//! `/* */` comments nest. Everything else is a single-character punctuator
//! or one of the four "wide" token classes (`n32`, `f32`, `global`, `ident`).

use crate::ast::Span;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  OpenParen,
  CloseParen,
  OpenBrace,
  CloseBrace,
  OpenBracket,
  CloseBracket,
  At,
  Dollar,
  Eq,
  Hole,
  Question,
  Hash,
  N32,
  F32,
  Global,
  Ident,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
  pub kind: TokenKind,
  pub text: String,
  pub span: Span,
}

pub struct Lexer {
  lines: Vec<Vec<char>>,
  line: usize,
  col: usize,
}

fn is_ident_start(c: char) -> bool {
  c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
  c.is_alphanumeric() || c == '_'
}

impl Lexer {
  pub fn new(source: &str) -> Self {
    let lines = source.lines().map(|l| l.chars().collect()).collect();
    Lexer { lines, line: 0, col: 0 }
  }

  pub fn position(&self) -> (usize, usize) {
    (self.line, self.col)
  }

  fn peek(&self) -> Option<char> {
    self.lines.get(self.line).and_then(|l| l.get(self.col)).copied()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek()?;
    self.col += 1;
    Some(c)
  }

  fn span_from(&self, start_col: usize) -> Span {
    Span { line: self.line, col_start: start_col, col_end: self.col }
  }

  fn syntax_error(&self, message: impl Into<String>) -> Error {
    Error::Syntax { message: message.into(), line: self.line, col_start: self.col, col_end: self.col }
  }

  fn skip_block_comment(&mut self) -> crate::error::Result<()> {
    let start_line = self.line;
    let mut depth = 1usize;
    loop {
      match self.peek() {
        Some('/') if self.lines[self.line].get(self.col + 1) == Some(&'*') => {
          self.col += 2;
          depth += 1;
        }
        Some('*') if self.lines[self.line].get(self.col + 1) == Some(&'/') => {
          self.col += 2;
          depth -= 1;
          if depth == 0 {
            return Ok(());
          }
        }
        Some(_) => {
          self.col += 1;
        }
        None => {
          if self.line + 1 >= self.lines.len() {
            return Err(Error::Syntax {
              message: format!(
                "could not find terminating `*/`, starting from line {}",
                start_line + 1
              ),
              line: start_line,
              col_start: 0,
              col_end: 0,
            });
          }
          self.line += 1;
          self.col = 0;
        }
      }
    }
  }

  /// Advances past whitespace and comments; returns `false` at end of input.
  fn skip_trivia(&mut self) -> crate::error::Result<bool> {
    loop {
      while self.line < self.lines.len() && self.col >= self.lines[self.line].len() {
        self.line += 1;
        self.col = 0;
      }
      if self.line >= self.lines.len() {
        return Ok(false);
      }
      let c = self.lines[self.line][self.col];
      if c.is_whitespace() {
        self.col += 1;
        continue;
      }
      if c == '/' && self.lines[self.line].get(self.col + 1) == Some(&'/') {
        self.line += 1;
        self.col = 0;
        continue;
      }
      if c == '/' && self.lines[self.line].get(self.col + 1) == Some(&'*') {
        self.col += 2;
        self.skip_block_comment()?;
        continue;
      }
      return Ok(true);
    }
  }

  pub fn next_token(&mut self) -> crate::error::Result<Option<Token>> {
    if !self.skip_trivia()? {
      return Ok(None);
    }
    let start_col = self.col;
    let c = self.bump().unwrap();

    let single = match c {
      '(' => Some(TokenKind::OpenParen),
      ')' => Some(TokenKind::CloseParen),
      '{' => Some(TokenKind::OpenBrace),
      '}' => Some(TokenKind::CloseBrace),
      '[' => Some(TokenKind::OpenBracket),
      ']' => Some(TokenKind::CloseBracket),
      '@' => Some(TokenKind::At),
      '$' => Some(TokenKind::Dollar),
      '=' => Some(TokenKind::Eq),
      '?' => Some(TokenKind::Question),
      '#' => Some(TokenKind::Hash),
      '_' => Some(TokenKind::Hole),
      _ => None,
    };
    if let Some(kind) = single {
      return Ok(Some(Token { kind, text: c.to_string(), span: self.span_from(start_col) }));
    }

    if c == ':' && self.peek() == Some(':') {
      let mut text = String::from("::");
      self.col += 1;
      loop {
        let mut seg = String::new();
        while let Some(ch) = self.peek() {
          if is_ident_continue(ch) {
            seg.push(ch);
            self.col += 1;
          } else {
            break;
          }
        }
        if seg.is_empty() {
          return Err(self.syntax_error("expected identifier after `::`"));
        }
        text.push_str(&seg);
        if self.peek() == Some(':') && self.lines[self.line].get(self.col + 1) == Some(&':') {
          text.push_str("::");
          self.col += 2;
        } else {
          break;
        }
      }
      return Ok(Some(Token { kind: TokenKind::Global, text, span: self.span_from(start_col) }));
    }

    if c.is_ascii_digit() {
      let mut text = String::from(c);
      while let Some(ch) = self.peek() {
        if ch.is_alphanumeric() || ch == '_' {
          text.push(ch);
          self.col += 1;
        } else {
          break;
        }
      }
      return Ok(Some(Token { kind: TokenKind::N32, text, span: self.span_from(start_col) }));
    }

    if c == '+' || c == '-' {
      let mut text = String::from(c);
      while let Some(ch) = self.peek() {
        if ch.is_alphanumeric() || ch == '_' || ch == '.' || ch == '+' || ch == '-' {
          text.push(ch);
          self.col += 1;
        } else {
          break;
        }
      }
      return Ok(Some(Token { kind: TokenKind::F32, text, span: self.span_from(start_col) }));
    }

    if is_ident_start(c) {
      let mut text = String::from(c);
      while let Some(ch) = self.peek() {
        if is_ident_continue(ch) {
          text.push(ch);
          self.col += 1;
        } else {
          break;
        }
      }
      return Ok(Some(Token { kind: TokenKind::Ident, text, span: self.span_from(start_col) }));
    }

    Err(self.syntax_error(format!("unexpected character {c:?}")))
  }
}
