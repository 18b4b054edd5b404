//! Recursive-descent parser for the `.iv` grammar (spec §6.1), built on
//! [`super::lexer`]. Produces a [`Nets`] map, or a single [`Net`]/[`Tree`]
//! for the standalone `FromStr` entry points.

use crate::ast::lexer::{Lexer, Token, TokenKind};
use crate::ast::{Net, Nets, Span, Tree, TreeKind, F32, N32};
use crate::error::{Error, Result};

pub struct Parser {
  lexer: Lexer,
  lookahead: Option<Token>,
}

impl Parser {
  pub fn new(source: &str) -> Self {
    let mut lexer = Lexer::new(source);
    let lookahead = lexer.next_token().unwrap_or(None);
    Parser { lexer, lookahead }
  }

  fn bump(&mut self) -> Result<()> {
    self.lookahead = self.lexer.next_token()?;
    Ok(())
  }

  fn check(&self, kind: TokenKind) -> bool {
    self.lookahead.as_ref().map(|t| t.kind == kind).unwrap_or(false)
  }

  fn error_here(&self, message: impl Into<String>) -> Error {
    let (line, col) = self.lexer.position();
    Error::Syntax { message: message.into(), line, col_start: col, col_end: col }
  }

  fn expect(&mut self, kind: TokenKind) -> Result<String> {
    match &self.lookahead {
      Some(tok) if tok.kind == kind => {
        let text = tok.text.clone();
        self.bump()?;
        Ok(text)
      }
      Some(tok) => Err(self.error_here(format!("unexpected token {:?}", tok.text))),
      None => Err(self.error_here("unexpected end of input")),
    }
  }

  fn eat(&mut self, kind: TokenKind) -> Result<Option<String>> {
    if self.check(kind) {
      Ok(Some(self.expect(kind)?))
    } else {
      Ok(None)
    }
  }

  fn current_span(&self) -> Span {
    self.lookahead.as_ref().map(|t| t.span).unwrap_or(Span { line: self.lexer.position().0, col_start: 0, col_end: 0 })
  }

  pub fn parse_nets(&mut self) -> Result<Nets> {
    let mut nets = Nets::new();
    while let Some(name) = self.eat(TokenKind::Global)? {
      let net = self.parse_net()?;
      nets.insert(name, net);
    }
    if self.lookahead.is_some() {
      return Err(self.error_here("expected a global definition or end of input"));
    }
    Ok(nets)
  }

  pub fn parse_net_only(&mut self) -> Result<Net> {
    let net = self.parse_net()?;
    if self.lookahead.is_some() {
      return Err(self.error_here("unexpected trailing input after net"));
    }
    Ok(net)
  }

  pub fn parse_tree_only(&mut self) -> Result<Tree> {
    let tree = self.parse_tree()?;
    if self.lookahead.is_some() {
      return Err(self.error_here("unexpected trailing input after tree"));
    }
    Ok(tree)
  }

  fn parse_net(&mut self) -> Result<Net> {
    self.expect(TokenKind::OpenBrace)?;
    let root = self.parse_tree()?;
    let mut pairs = vec![];
    while self.eat(TokenKind::CloseBrace)?.is_none() {
      pairs.push(self.parse_pair()?);
    }
    Ok(Net { root, pairs })
  }

  fn parse_pair(&mut self) -> Result<(Tree, Tree)> {
    let a = self.parse_tree()?;
    self.expect(TokenKind::Eq)?;
    let b = self.parse_tree()?;
    Ok((a, b))
  }

  fn parse_tree(&mut self) -> Result<Tree> {
    let start = self.current_span();

    if self.check(TokenKind::N32) {
      let text = self.expect(TokenKind::N32)?;
      let n = parse_u32_like(&text, start)?;
      return Ok(Tree::new(TreeKind::N32(n), Some(start)));
    }
    if self.check(TokenKind::F32) {
      let text = self.expect(TokenKind::F32)?;
      let n = parse_f32_like(&text, start)?;
      return Ok(Tree::new(TreeKind::F32(n), Some(start)));
    }
    if self.check(TokenKind::Global) {
      let name = self.expect(TokenKind::Global)?;
      return Ok(Tree::new(TreeKind::Global(name), Some(start)));
    }
    if self.check(TokenKind::Ident) {
      let ident = self.expect(TokenKind::Ident)?;
      if self.eat(TokenKind::OpenParen)?.is_some() {
        let a = self.parse_tree()?;
        let b = self.parse_tree()?;
        self.expect(TokenKind::CloseParen)?;
        let end = self.current_span();
        let span = Span { line: start.line, col_start: start.col_start, col_end: end.col_end };
        return Ok(Tree::new(TreeKind::Comb(ident, Box::new(a), Box::new(b)), Some(span)));
      }
      return Ok(Tree::new(TreeKind::Var(ident), Some(start)));
    }
    if self.eat(TokenKind::At)?.is_some() {
      let mut ident = self.expect(TokenKind::Ident)?;
      if self.eat(TokenKind::Dollar)?.is_some() {
        ident.push('$');
      }
      self.expect(TokenKind::OpenParen)?;
      let a = self.parse_tree()?;
      let b = self.parse_tree()?;
      self.expect(TokenKind::CloseParen)?;
      let end = self.current_span();
      let span = Span { line: start.line, col_start: start.col_start, col_end: end.col_end };
      return Ok(Tree::new(TreeKind::ExtFn(ident, Box::new(a), Box::new(b)), Some(span)));
    }
    if self.eat(TokenKind::Question)?.is_some() {
      self.expect(TokenKind::OpenParen)?;
      let a = self.parse_tree()?;
      let b = self.parse_tree()?;
      let c = self.parse_tree()?;
      self.expect(TokenKind::CloseParen)?;
      let end = self.current_span();
      let span = Span { line: start.line, col_start: start.col_start, col_end: end.col_end };
      return Ok(Tree::new(TreeKind::Branch(Box::new(a), Box::new(b), Box::new(c)), Some(span)));
    }
    if self.eat(TokenKind::Hole)?.is_some() {
      return Ok(Tree::new(TreeKind::Erase, Some(start)));
    }
    if self.eat(TokenKind::Hash)?.is_some() {
      self.expect(TokenKind::OpenBracket)?;
      let inner = self.parse_tree()?;
      self.expect(TokenKind::CloseBracket)?;
      return Ok(Tree::new(TreeKind::BlackBox(Box::new(inner)), None));
    }

    Err(self.error_here(format!("unexpected token {:?}", self.lookahead.as_ref().map(|t| &t.text))))
  }
}

fn parse_u32_like(token: &str, span: Span) -> Result<N32> {
  let (digits, radix) = if let Some(rest) = token.strip_prefix("0b") {
    (rest, 2u32)
  } else if let Some(rest) = token.strip_prefix("0o") {
    (rest, 8)
  } else if let Some(rest) = token.strip_prefix("0x") {
    (rest, 16)
  } else {
    (token, 10)
  };

  let mut result: u64 = 0;
  for c in digits.chars() {
    if c == '_' {
      continue;
    }
    let digit = c.to_digit(radix).ok_or_else(|| Error::Syntax {
      message: format!("character {c:?} is not a valid digit with radix {radix}"),
      line: span.line,
      col_start: span.col_start,
      col_end: span.col_end,
    })?;
    result = result * radix as u64 + digit as u64;
    if result > u32::MAX as u64 {
      return Err(Error::NumericOverflow { literal: token.to_owned() });
    }
  }
  Ok(N32(result as u32))
}

fn parse_f32_like(token: &str, span: Span) -> Result<F32> {
  token
    .parse::<f32>()
    .map(F32::new)
    .map_err(|_| Error::Syntax {
      message: format!("{token:?} could not be understood as a float"),
      line: span.line,
      col_start: span.col_start,
      col_end: span.col_end,
    })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_a_net_with_pairs() {
    let mut p = Parser::new("::main { fn(r _) r = @n32_add(3 @n32_add(4 5)) }");
    let nets = p.parse_nets().unwrap();
    let net = &nets["::main"];
    assert_eq!(net.pairs.len(), 1);
  }

  #[test]
  fn parses_hex_and_rejects_overflow() {
    let t: Tree = "0xFFFFFFFF".parse().unwrap();
    assert_eq!(t.kind, TreeKind::N32(N32(0xFFFFFFFF)));
    assert!("0x1_0000_0000".parse::<Tree>().is_err());
  }

  #[test]
  fn parses_blackbox_and_branch() {
    let t: Tree = "?(#[a] b c)".parse().unwrap();
    match t.kind {
      TreeKind::Branch(a, _, _) => assert!(matches!(a.kind, TreeKind::BlackBox(_))),
      _ => panic!("expected branch"),
    }
  }
}
