//! Literal parser for sequence and mapping overrides.
//!
//! Accepts the literal syntax people type for lists on a command line:
//! - `None` / `null`, `True` / `true`, `False` / `false`
//! - integers and floats, with an optional sign and exponent
//! - single- or double-quoted strings with backslash escapes
//! - lists `[a, b]`, tuples `(a, b)` (both become arrays) and mappings `{'k': v}`
//!
//! A parenthesised single value without a trailing comma is just that value,
//! so `(5)` is `5` while `(5,)` is `[5]`.

use serde_json::{Map, Number, Value};

use crate::error::CoerceError;

/// Deepest nesting of lists, tuples and mappings accepted.
pub const MAX_DEPTH: usize = 64;

/// Parse a whole string as one literal value.
pub fn parse_literal(input: &str) -> Result<Value, CoerceError> {
    let mut parser = LiteralParser::new(input);
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos < parser.chars.len() {
        return Err(parser.error(format!("unexpected '{}' after value", parser.chars[parser.pos])));
    }
    Ok(value)
}

struct LiteralParser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    /// Step into a container; fails past [`MAX_DEPTH`].
    fn open(&mut self) -> Result<(), CoerceError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("nesting too deep (more than {} levels)", MAX_DEPTH)));
        }
        self.depth += 1;
        self.pos += 1;
        Ok(())
    }

    fn error(&self, reason: impl Into<String>) -> CoerceError {
        CoerceError::InvalidLiteral {
            input: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), CoerceError> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn parse_value(&mut self) -> Result<Value, CoerceError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.error("empty value")),
            Some('[') => {
                self.open()?;
                let (items, _) = self.parse_items(']')?;
                self.depth -= 1;
                Ok(Value::Array(items))
            }
            Some('(') => {
                self.open()?;
                let (mut items, trailing_comma) = self.parse_items(')')?;
                self.depth -= 1;
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Value::Array(items))
                }
            }
            Some('{') => {
                self.open()?;
                let mapping = self.parse_mapping()?;
                self.depth -= 1;
                Ok(mapping)
            }
            Some(q @ ('\'' | '"')) => {
                self.pos += 1;
                self.parse_string(q).map(Value::String)
            }
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => self.parse_number(),
            Some(c) if c.is_alphabetic() => self.parse_keyword(),
            Some(c) => Err(self.error(format!("unexpected '{}'", c))),
        }
    }

    /// Comma-separated values up to `close`; also reports a trailing comma.
    fn parse_items(&mut self, close: char) -> Result<(Vec<Value>, bool), CoerceError> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok((items, trailing_comma));
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    trailing_comma = true;
                }
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok((items, false));
                }
                Some(c) => return Err(self.error(format!("expected ',' or '{}', found '{}'", close, c))),
                None => return Err(self.error(format!("unclosed '{}'", close))),
            }
        }
    }

    fn parse_mapping(&mut self) -> Result<Value, CoerceError> {
        let mut map = Map::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }
            let key = match self.parse_value()? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                other => return Err(self.error(format!("mapping keys must be strings, found {}", other))),
            };
            self.expect(':')?;
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                Some(c) => return Err(self.error(format!("expected ',' or '}}', found '{}'", c))),
                None => return Err(self.error("unclosed '{'")),
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, CoerceError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => {
                    let escaped = self.peek().ok_or_else(|| self.error("dangling escape"))?;
                    self.pos += 1;
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                }
                c if c == quote => return Ok(out),
                c => out.push(c),
            }
        }
        Err(self.error("unterminated string"))
    }

    fn parse_number(&mut self) -> Result<Value, CoerceError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.' | '_'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().filter(|c| **c != '_').collect();

        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Number(i.into()));
        }
        if let Ok(u) = text.parse::<u64>() {
            return Ok(Value::Number(u.into()));
        }
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| self.error(format!("invalid number '{}'", text)))
    }

    fn parse_keyword(&mut self) -> Result<Value, CoerceError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "None" | "null" => Ok(Value::Null),
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            _ => Err(self.error(format!("unknown name '{}'", word))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_with_none() {
        assert_eq!(parse_literal("[8, None]").unwrap(), json!([8, null]));
    }

    #[test]
    fn test_scalars() {
        assert_eq!(parse_literal("0").unwrap(), json!(0));
        assert_eq!(parse_literal("-3").unwrap(), json!(-3));
        assert_eq!(parse_literal("1e-3").unwrap(), json!(0.001));
        assert_eq!(parse_literal(" True ").unwrap(), json!(true));
        assert_eq!(parse_literal("'adam'").unwrap(), json!("adam"));
    }

    #[test]
    fn test_tuples() {
        assert_eq!(parse_literal("(1, 2)").unwrap(), json!([1, 2]));
        assert_eq!(parse_literal("(5,)").unwrap(), json!([5]));
        assert_eq!(parse_literal("(5)").unwrap(), json!(5));
        assert_eq!(parse_literal("()").unwrap(), json!([]));
    }

    #[test]
    fn test_nested_and_mapping() {
        assert_eq!(
            parse_literal("[[1, 2], {'lr': 0.5, \"name\": 'sgd'}]").unwrap(),
            json!([[1, 2], {"lr": 0.5, "name": "sgd"}])
        );
    }

    #[test]
    fn test_nesting_limit() {
        let nested = format!("{}1{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse_literal(&nested).is_ok());

        let too_deep = format!("{}1{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert!(matches!(
            parse_literal(&too_deep),
            Err(CoerceError::InvalidLiteral { reason, .. }) if reason.starts_with("nesting too deep")
        ));

        // Unclosed runs stop at the limit instead of recursing through the input
        assert!(parse_literal(&"[".repeat(100_000)).is_err());
        assert!(parse_literal(&"{'a': ".repeat(10_000)).is_err());
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(parse_literal(r"'it\'s'").unwrap(), json!("it's"));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(parse_literal("").is_err());
        assert!(parse_literal("[1, 2").is_err());
        assert!(parse_literal("abc").is_err());
        assert!(parse_literal("[1] 2").is_err());
        assert!(parse_literal("'open").is_err());
        assert!(parse_literal("{1: }").is_err());
    }
}
