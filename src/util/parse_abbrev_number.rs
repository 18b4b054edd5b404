//! Parses sizes like `64M`/`4G` for `--memory`-style CLI flags.

use std::fmt::Display;
use std::str::FromStr;

/// Parses a number with an optional `K`/`M`/`G` (or lowercase) suffix,
/// scaling by the corresponding power of 1024, into any integer type that
/// can represent the result.
pub fn parse_abbrev_number<T>(arg: &str) -> Result<T, String>
where
  T: TryFrom<u64> + FromStr,
  T::Err: Display,
  <T as TryFrom<u64>>::Error: Display,
{
  let (digits, scale) = match arg.chars().last() {
    Some(c) if c.eq_ignore_ascii_case(&'k') => (&arg[..arg.len() - 1], 1024u64),
    Some(c) if c.eq_ignore_ascii_case(&'m') => (&arg[..arg.len() - 1], 1024 * 1024),
    Some(c) if c.eq_ignore_ascii_case(&'g') => (&arg[..arg.len() - 1], 1024 * 1024 * 1024),
    _ => (arg, 1),
  };
  if scale == 1 {
    return digits.parse::<T>().map_err(|e| e.to_string());
  }
  let n: u64 = digits.parse().map_err(|e: std::num::ParseIntError| e.to_string())?;
  let scaled = n.checked_mul(scale).ok_or_else(|| format!("{arg:?} overflows u64"))?;
  T::try_from(scaled).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_plain_numbers() {
    assert_eq!(parse_abbrev_number::<usize>("1024").unwrap(), 1024);
  }

  #[test]
  fn parses_kilo_mega_giga_suffixes() {
    assert_eq!(parse_abbrev_number::<usize>("4K").unwrap(), 4 * 1024);
    assert_eq!(parse_abbrev_number::<usize>("64M").unwrap(), 64 * 1024 * 1024);
    assert_eq!(parse_abbrev_number::<usize>("1g").unwrap(), 1024 * 1024 * 1024);
  }
}
