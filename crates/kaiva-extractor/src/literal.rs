//! Parser for Python-style literal structures
//!
//! Accepts the literal subset a model tends to emit when asked for a
//! "dictionary": dicts, lists, tuples, single/double/triple-quoted strings
//! (with `r`/`u` prefixes and implicit concatenation), integers, floats,
//! `True`, `False` and `None`. Trailing commas and `#` comments are allowed.
//! Produces a `serde_json::Value` so the rest of the pipeline handles one
//! value model regardless of dialect.

use serde_json::{Map, Number, Value};

/// Nesting limit for containers
const MAX_DEPTH: usize = 64;

/// Parse `input` as a single literal value
///
/// Leading and trailing whitespace is ignored; anything else after the
/// value is an error.
pub fn parse_literal(input: &str) -> Result<Value, String> {
    let mut parser = LiteralParser {
        src: input,
        pos: 0,
        depth: 0,
    };

    parser.skip_trivia();
    let value = parser.parse_value()?;
    parser.skip_trivia();

    match parser.peek() {
        Some(c) => Err(format!("unexpected '{}' at offset {}", c, parser.pos)),
        None => Ok(value),
    }
}

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> LiteralParser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        if self.eat(expected) {
            return Ok(());
        }
        match self.peek() {
            Some(c) => Err(format!("expected '{}' but found '{}' at offset {}", expected, c, self.pos)),
            None => Err(format!("expected '{}' but input ended", expected)),
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value, String> {
        if self.string_start().is_some() {
            return self.parse_strings().map(Value::String);
        }

        match self.peek() {
            None => Err("unexpected end of input".to_string()),
            Some('{') => self.nested(Self::parse_dict),
            Some('[') => self.nested(Self::parse_list),
            Some('(') => self.nested(Self::parse_parenthesized),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_name(),
            Some(c) => Err(format!("unexpected '{}' at offset {}", c, self.pos)),
        }
    }

    fn nested(&mut self, parse: fn(&mut Self) -> Result<Value, String>) -> Result<Value, String> {
        if self.depth >= MAX_DEPTH {
            return Err(format!("nesting deeper than {} levels", MAX_DEPTH));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_dict(&mut self) -> Result<Value, String> {
        self.expect('{')?;
        let mut map = Map::new();

        loop {
            self.skip_trivia();
            if self.eat('}') {
                return Ok(Value::Object(map));
            }

            let key = key_to_string(self.parse_value()?)?;
            self.skip_trivia();
            self.expect(':')?;
            self.skip_trivia();
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_trivia();
            if !self.eat(',') {
                self.skip_trivia();
                self.expect('}')?;
                return Ok(Value::Object(map));
            }
        }
    }

    fn parse_list(&mut self) -> Result<Value, String> {
        let (items, _) = self.parse_sequence('[', ']')?;
        Ok(Value::Array(items))
    }

    /// `(x)` is just `x`; `()`, `(x,)` and `(x, y)` are tuples
    fn parse_parenthesized(&mut self) -> Result<Value, String> {
        let (mut items, saw_comma) = self.parse_sequence('(', ')')?;
        if items.len() == 1 && !saw_comma {
            return Ok(items.remove(0));
        }
        Ok(Value::Array(items))
    }

    fn parse_sequence(&mut self, open: char, close: char) -> Result<(Vec<Value>, bool), String> {
        self.expect(open)?;
        let mut items = Vec::new();
        let mut saw_comma = false;

        loop {
            self.skip_trivia();
            if self.eat(close) {
                return Ok((items, saw_comma));
            }

            items.push(self.parse_value()?);

            self.skip_trivia();
            if self.eat(',') {
                saw_comma = true;
            } else {
                self.skip_trivia();
                self.expect(close)?;
                return Ok((items, saw_comma));
            }
        }
    }

    /// Returns `(raw, prefix_len)` if a string literal starts here
    fn string_start(&self) -> Option<(bool, usize)> {
        let is_quote = |c: Option<char>| matches!(c, Some('\'') | Some('"'));
        match self.peek() {
            Some('\'') | Some('"') => Some((false, 0)),
            Some('r') | Some('R') if is_quote(self.peek_second()) => Some((true, 1)),
            Some('u') | Some('U') if is_quote(self.peek_second()) => Some((false, 1)),
            _ => None,
        }
    }

    /// One or more adjacent string literals, concatenated
    fn parse_strings(&mut self) -> Result<String, String> {
        let mut out = String::new();

        while let Some((raw, prefix_len)) = self.string_start() {
            self.pos += prefix_len;
            self.parse_string_body(raw, &mut out)?;

            let after_literal = self.pos;
            self.skip_trivia();
            if self.string_start().is_none() {
                self.pos = after_literal;
                break;
            }
        }

        Ok(out)
    }

    fn parse_string_body(&mut self, raw: bool, out: &mut String) -> Result<(), String> {
        let start = self.pos;
        let quote = self.bump().ok_or_else(|| "expected string".to_string())?;

        let mut closing = String::new();
        closing.push(quote);
        closing.push(quote);
        let triple = self.rest().starts_with(&closing);
        if triple {
            self.pos += closing.len();
        }

        loop {
            let c = self
                .bump()
                .ok_or_else(|| format!("unterminated string starting at offset {}", start))?;

            if c == quote {
                if !triple {
                    return Ok(());
                }
                if self.rest().starts_with(&closing) {
                    self.pos += closing.len();
                    return Ok(());
                }
                out.push(c);
            } else if c == '\\' {
                if raw {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                } else {
                    self.parse_escape(out)?;
                }
            } else if c == '\n' && !triple {
                return Err(format!("line break inside string starting at offset {}", start));
            } else {
                out.push(c);
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), String> {
        let c = self
            .bump()
            .ok_or_else(|| "unterminated escape sequence".to_string())?;

        match c {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(c),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            'a' => out.push('\u{7}'),
            'x' => out.push(self.read_hex_char(2)?),
            'u' => out.push(self.read_hex_char(4)?),
            'U' => out.push(self.read_hex_char(8)?),
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).ok_or_else(|| format!("invalid octal escape {}", code))?);
            }
            // Unknown escapes keep their backslash
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn read_hex_char(&mut self, digits: usize) -> Result<char, String> {
        let mut code: u32 = 0;
        for _ in 0..digits {
            let d = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| format!("truncated \\x/\\u escape near offset {}", self.pos))?;
            code = code * 16 + d;
        }
        char::from_u32(code).ok_or_else(|| format!("invalid code point {:#x}", code))
    }

    fn parse_number(&mut self) -> Result<Value, String> {
        let start = self.pos;
        if matches!(self.peek(), Some('+') | Some('-')) {
            self.bump();
        }

        let mut prev = ' ';
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-') && (prev == 'e' || prev == 'E');
            if c.is_ascii_digit() || c == '_' || c == '.' || c == 'e' || c == 'E' || exponent_sign {
                prev = c;
                self.bump();
            } else {
                break;
            }
        }

        let text: String = self.src[start..self.pos].chars().filter(|c| *c != '_').collect();
        let is_float = text.contains(['.', 'e', 'E']);

        if !is_float {
            let digits = text.strip_prefix('+').unwrap_or(&text);
            return digits
                .parse::<Number>()
                .map(Value::Number)
                .map_err(|_| format!("invalid number '{}' at offset {}", text, start));
        }

        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("invalid number '{}' at offset {}", text, start))
    }

    fn parse_name(&mut self) -> Result<Value, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }

        match &self.src[start..self.pos] {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            name => Err(format!("unsupported name '{}' at offset {}", name, start)),
        }
    }
}

/// Dict keys must be scalars; they are stored as text
fn key_to_string(key: Value) -> Result<String, String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(true) => Ok("True".to_string()),
        Value::Bool(false) => Ok("False".to_string()),
        Value::Null => Ok("None".to_string()),
        Value::Array(_) | Value::Object(_) => Err("unhashable dict key".to_string()),
    }
}
