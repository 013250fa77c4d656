//! Splits a shell-like command string into leading environment assignments
//! and the remaining executable command.
//!
//! Build command templates embed their target environment inline, e.g.
//! `GOOS=linux GOARCH=amd64 go build -ldflags="-s -w"`. The process spawner
//! needs those assignments as real environment variables, so the string is
//! split into the contiguous run of `NAME=VALUE` tokens at the front and the
//! command that follows.

use std::collections::BTreeMap;

/// A command string split into environment assignments and the command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
  /// Leading `NAME=VALUE` assignments, later duplicates overwriting earlier.
  pub env: BTreeMap<String, String>,
  /// Everything from the first non-assignment token on, rejoined with
  /// single spaces. Quoted spans survive as single tokens.
  pub command: String,
}

/// Parse a command string of the form `ENV=VAL ... executable args...`.
///
/// Tokenization is quote-aware: unquoted whitespace separates tokens, while
/// single- or double-quoted regions keep their spaces (and keep the quote
/// characters, so the command text can go through a shell unchanged). The
/// first token that does not match `NAME=VALUE` starts the command; tokens
/// after that point are never treated as assignments, even when they look
/// like one.
pub fn parse(input: &str) -> ParsedCommand {
  let tokens = tokenize(input);

  let mut env = BTreeMap::new();
  let mut boundary = tokens.len();
  for (i, token) in tokens.iter().enumerate() {
    match split_assignment(token) {
      Some((key, value)) => {
        env.insert(key.to_string(), value);
      }
      None => {
        boundary = i;
        break;
      }
    }
  }

  ParsedCommand {
    env,
    command: tokens[boundary..].join(" "),
  }
}

/// Split the input into whitespace-separated tokens, treating quoted spans
/// as atomic. Quote characters are retained in the token.
fn tokenize(input: &str) -> Vec<String> {
  let mut tokens = Vec::new();
  let mut current = String::new();
  let mut quote: Option<char> = None;

  for c in input.chars() {
    match quote {
      Some(q) => {
        current.push(c);
        if c == q {
          quote = None;
        }
      }
      None => {
        if c == '\'' || c == '"' {
          quote = Some(c);
          current.push(c);
        } else if c.is_whitespace() {
          if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
          }
        } else {
          current.push(c);
        }
      }
    }
  }
  if !current.is_empty() {
    tokens.push(current);
  }

  tokens
}

/// Match a single token against `NAME=VALUE`.
///
/// NAME is one or more word characters. VALUE may be single-quoted,
/// double-quoted (quotes stripped) or bare, including empty.
fn split_assignment(token: &str) -> Option<(&str, String)> {
  let (key, value) = token.split_once('=')?;
  if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
    return None;
  }
  Some((key, unquote(value)))
}

/// Strip one pair of matching surrounding quotes, if present.
fn unquote(value: &str) -> String {
  let bytes = value.as_bytes();
  if bytes.len() >= 2 {
    let first = bytes[0];
    if (first == b'\'' || first == b'"') && bytes[bytes.len() - 1] == first {
      return value[1..value.len() - 1].to_string();
    }
  }
  value.to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn assignments_then_command() {
    let parsed = parse("A=1 B='x y' go build -o bin ./cmd");
    assert_eq!(parsed.env.get("A").unwrap(), "1");
    assert_eq!(parsed.env.get("B").unwrap(), "x y");
    assert_eq!(parsed.command, "go build -o bin ./cmd");
  }

  #[test]
  fn empty_input() {
    let parsed = parse("");
    assert!(parsed.env.is_empty());
    assert!(parsed.command.is_empty());
  }

  #[test]
  fn assignment_after_boundary_stays_in_command() {
    let parsed = parse("GOOS=linux go test TAG=extra ./...");
    assert_eq!(parsed.env.len(), 1);
    assert_eq!(parsed.env.get("GOOS").unwrap(), "linux");
    assert_eq!(parsed.command, "go test TAG=extra ./...");
  }

  #[test]
  fn quoted_command_argument_survives() {
    let parsed = parse(r#"GOOS=linux GOARCH=amd64 go build -ldflags="-s -w""#);
    assert_eq!(parsed.env.get("GOOS").unwrap(), "linux");
    assert_eq!(parsed.env.get("GOARCH").unwrap(), "amd64");
    assert_eq!(parsed.command, r#"go build -ldflags="-s -w""#);
  }

  #[test]
  fn double_quoted_value() {
    let parsed = parse(r#"FLAGS="-s -w" make"#);
    assert_eq!(parsed.env.get("FLAGS").unwrap(), "-s -w");
    assert_eq!(parsed.command, "make");
  }

  #[test]
  fn bare_empty_value() {
    let parsed = parse("EMPTY= go build");
    assert_eq!(parsed.env.get("EMPTY").unwrap(), "");
    assert_eq!(parsed.command, "go build");
  }

  #[test]
  fn later_duplicate_wins() {
    let parsed = parse("A=1 A=2 go build");
    assert_eq!(parsed.env.get("A").unwrap(), "2");
  }

  #[test]
  fn command_only() {
    let parsed = parse("go build ./...");
    assert!(parsed.env.is_empty());
    assert_eq!(parsed.command, "go build ./...");
  }

  #[test]
  fn whitespace_runs_collapse_in_command() {
    // Known lossiness: unquoted whitespace runs are rejoined with one space.
    let parsed = parse("A=1  go   build");
    assert_eq!(parsed.command, "go build");
  }

  #[test]
  fn invalid_key_starts_command() {
    // A dash is not a word character, so this is not an assignment.
    let parsed = parse("-D=1 go build");
    assert!(parsed.env.is_empty());
    assert_eq!(parsed.command, "-D=1 go build");
  }

  #[test]
  fn unterminated_quote_kept_verbatim() {
    let parsed = parse("A='x go build");
    assert_eq!(parsed.env.get("A").unwrap(), "'x go build");
    assert!(parsed.command.is_empty());
  }
}
