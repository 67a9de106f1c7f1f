//! `mapinfo.lua` evaluation
//!
//! Only the declarative subset maps actually ship is understood: local or
//! global assignments of table literals followed by a `return`. Anything that
//! needs a Lua interpreter (function calls, field access, arithmetic) is
//! rejected.

use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use crate::error::ParseError;
use crate::map::{RichMetadata, StartPos};

/// Evaluate the file and extract the rich metadata schema from the returned table
pub fn parse_mapinfo(source: &str) -> Result<RichMetadata, ParseError> {
    let raw = eval_lua_table(source)?;
    Ok(rich_from_value(raw))
}

/// Read the known fields out of an evaluated mapinfo table
pub fn rich_from_value(raw: Value) -> RichMetadata {
    let atmosphere = lookup(&raw, "atmosphere");

    let start_positions = lookup(&raw, "teams").map(|teams| {
        let mut entries: Vec<(f64, &Value)> = match teams {
            Value::Array(items) => items.iter().enumerate().map(|(i, v)| (i as f64, v)).collect(),
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| (k.parse::<f64>().unwrap_or(f64::MAX), v))
                .collect(),
            _ => Vec::new(),
        };
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        entries
            .into_iter()
            .filter_map(|(_, team)| start_pos(lookup(team, "startpos")?))
            .collect()
    });

    RichMetadata {
        name: string_field(&raw, "name"),
        shortname: string_field(&raw, "shortname"),
        description: string_field(&raw, "description"),
        author: string_field(&raw, "author"),
        version: string_field(&raw, "version"),
        mapfile: string_field(&raw, "mapfile"),
        modtype: number_field(&raw, "modtype"),
        map_hardness: number_field(&raw, "maphardness"),
        gravity: number_field(&raw, "gravity"),
        tidal_strength: number_field(&raw, "tidalstrength"),
        max_metal: number_field(&raw, "maxmetal"),
        extractor_radius: number_field(&raw, "extractorradius"),
        min_wind: atmosphere.and_then(|a| number_field(a, "minwind")),
        max_wind: atmosphere.and_then(|a| number_field(a, "maxwind")),
        min_depth: number_field(&raw, "mindepth"),
        max_depth: number_field(&raw, "maxdepth"),
        not_deformable: bool_field(&raw, "notdeformable"),
        void_water: bool_field(&raw, "voidwater"),
        void_ground: bool_field(&raw, "voidground"),
        auto_show_metal: bool_field(&raw, "autoshowmetal"),
        start_positions,
        raw,
    }
}

/// Case-insensitive key lookup; the engine lowercases mapinfo keys
fn lookup<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value
        .as_object()?
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
        .filter(|v| !v.is_null())
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    match lookup(value, key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(value: &Value, key: &str) -> Option<f64> {
    match lookup(value, key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn bool_field(value: &Value, key: &str) -> Option<bool> {
    lookup(value, key)?.as_bool()
}

fn start_pos(value: &Value) -> Option<StartPos> {
    Some(StartPos {
        x: number_field(value, "x")?,
        y: number_field(value, "y").unwrap_or(0.0),
        z: number_field(value, "z")?,
    })
}

/// Evaluate a Lua chunk made of table-literal assignments and return the
/// returned value as JSON
pub fn eval_lua_table(source: &str) -> Result<Value, ParseError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        env: HashMap::new(),
    };
    parser.chunk()
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Str(String),
    Num(f64),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Eq,
    Comma,
    Semi,
    Minus,
    Eof,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

fn err(line: usize, message: impl Into<String>) -> ParseError {
    ParseError::MapInfo {
        line,
        message: message.into(),
    }
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_at(0)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn tokenize(mut self) -> Result<Vec<(Tok, usize)>, ParseError> {
        let mut out = Vec::new();
        loop {
            self.skip_trivia()?;
            let line = self.line;
            let Some(c) = self.peek_at(0) else {
                out.push((Tok::Eof, line));
                return Ok(out);
            };
            let tok = match c {
                '{' => self.single(Tok::LBrace),
                '}' => self.single(Tok::RBrace),
                ']' => self.single(Tok::RBracket),
                '=' => self.single(Tok::Eq),
                ',' => self.single(Tok::Comma),
                ';' => self.single(Tok::Semi),
                '-' => self.single(Tok::Minus),
                '[' => match self.long_bracket_level() {
                    Some(level) => Tok::Str(self.long_bracket(level)?),
                    None => self.single(Tok::LBracket),
                },
                '"' | '\'' => Tok::Str(self.quoted(c)?),
                c if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) => {
                    Tok::Num(self.number()?)
                }
                c if c.is_alphabetic() || c == '_' => {
                    let mut ident = String::new();
                    while let Some(c) = self.peek_at(0).filter(|c| c.is_alphanumeric() || *c == '_') {
                        ident.push(c);
                        self.bump();
                    }
                    Tok::Ident(ident)
                }
                other => return Err(err(line, format!("unsupported character {:?}", other))),
            };
            out.push((tok, line));
        }
    }

    fn single(&mut self, tok: Tok) -> Tok {
        self.bump();
        tok
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek_at(0) {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('-') if self.peek_at(1) == Some('-') => {
                    self.pos += 2;
                    if self.peek_at(0) == Some('[') {
                        if let Some(level) = self.long_bracket_level() {
                            self.long_bracket(level)?;
                            continue;
                        }
                    }
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// `[[` is level 0, `[==[` is level 2
    fn long_bracket_level(&self) -> Option<usize> {
        let mut level = 0;
        while self.peek_at(1 + level) == Some('=') {
            level += 1;
        }
        (self.peek_at(1 + level) == Some('[')).then_some(level)
    }

    fn long_bracket(&mut self, level: usize) -> Result<String, ParseError> {
        let start = self.line;
        self.pos += level + 2;
        // a newline directly after the opening bracket is skipped
        if self.peek_at(0) == Some('\n') {
            self.bump();
        }
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(err(start, "unterminated long string")),
                Some(']')
                    if (0..level).all(|i| self.peek_at(i) == Some('='))
                        && self.peek_at(level) == Some(']') =>
                {
                    self.pos += level + 1;
                    return Ok(out);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.line;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(err(start, "unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(c) => out.push(c),
                    None => return Err(err(start, "unterminated string")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<f64, ParseError> {
        let line = self.line;
        if self.peek_at(0) == Some('0') && matches!(self.peek_at(1), Some('x' | 'X')) {
            self.pos += 2;
            let mut digits = String::new();
            while let Some(c) = self.peek_at(0).filter(|c| c.is_ascii_hexdigit()) {
                digits.push(c);
                self.bump();
            }
            return u64::from_str_radix(&digits, 16)
                .map(|n| n as f64)
                .map_err(|_| err(line, format!("invalid hex number 0x{}", digits)));
        }

        let mut text = String::new();
        while let Some(c) = self.peek_at(0) {
            let exponent_sign = matches!(c, '+' | '-') && text.ends_with(['e', 'E']);
            if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E') || exponent_sign {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        text.parse::<f64>()
            .map_err(|_| err(line, format!("invalid number {}", text)))
    }
}

struct Parser {
    tokens: Vec<(Tok, usize)>,
    pos: usize,
    env: HashMap<String, Value>,
}

impl Parser {
    fn peek(&self) -> &Tok {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].0
    }

    fn line(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].1
    }

    fn next(&mut self) -> Tok {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, tok: Tok) -> Result<(), ParseError> {
        let line = self.line();
        let got = self.next();
        if got == tok {
            Ok(())
        } else {
            Err(err(line, format!("expected {:?}, found {:?}", tok, got)))
        }
    }

    fn chunk(&mut self) -> Result<Value, ParseError> {
        loop {
            let line = self.line();
            match self.next() {
                Tok::Semi => {}
                Tok::Ident(kw) if kw == "local" => {
                    let name = self.ident()?;
                    self.expect(Tok::Eq)?;
                    let value = self.expr()?;
                    self.env.insert(name, value);
                }
                Tok::Ident(kw) if kw == "return" => {
                    let value = self.expr()?;
                    while *self.peek() == Tok::Semi {
                        self.next();
                    }
                    if *self.peek() != Tok::Eof {
                        return Err(err(self.line(), "statements after return"));
                    }
                    return Ok(value);
                }
                Tok::Ident(name) if *self.peek() == Tok::Eq => {
                    self.next();
                    let value = self.expr()?;
                    self.env.insert(name, value);
                }
                Tok::Eof => return Err(err(line, "no return statement")),
                other => return Err(err(line, format!("unsupported statement at {:?}", other))),
            }
        }
    }

    fn ident(&mut self) -> Result<String, ParseError> {
        let line = self.line();
        match self.next() {
            Tok::Ident(name) => Ok(name),
            other => Err(err(line, format!("expected a name, found {:?}", other))),
        }
    }

    fn expr(&mut self) -> Result<Value, ParseError> {
        let line = self.line();
        let value = match self.next() {
            Tok::Str(s) => Value::String(s),
            Tok::Num(n) => number(n, line)?,
            Tok::Minus => match self.next() {
                Tok::Num(n) => number(-n, line)?,
                other => return Err(err(line, format!("cannot negate {:?}", other))),
            },
            Tok::LBrace => self.table()?,
            Tok::Ident(kw) if kw == "true" => Value::Bool(true),
            Tok::Ident(kw) if kw == "false" => Value::Bool(false),
            Tok::Ident(kw) if kw == "nil" => Value::Null,
            Tok::Ident(name) => self
                .env
                .get(&name)
                .cloned()
                .ok_or_else(|| err(line, format!("unknown variable {}", name)))?,
            other => return Err(err(line, format!("unexpected {:?}", other))),
        };

        match self.peek() {
            Tok::Comma | Tok::Semi | Tok::RBrace | Tok::RBracket | Tok::Eof => Ok(value),
            Tok::Ident(_) => Ok(value),
            other => Err(err(self.line(), format!("unsupported expression near {:?}", other))),
        }
    }

    fn table(&mut self) -> Result<Value, ParseError> {
        let mut named: Vec<(String, Value)> = Vec::new();
        let mut positional: Vec<Value> = Vec::new();

        loop {
            if *self.peek() == Tok::RBrace {
                self.next();
                break;
            }

            match self.peek().clone() {
                Tok::LBracket => {
                    self.next();
                    let line = self.line();
                    let key = match self.expr()? {
                        Value::String(s) => s,
                        Value::Number(n) => n.to_string(),
                        other => return Err(err(line, format!("unsupported table key {}", other))),
                    };
                    self.expect(Tok::RBracket)?;
                    self.expect(Tok::Eq)?;
                    let value = self.expr()?;
                    named.push((key, value));
                }
                Tok::Ident(name) if self.tokens.get(self.pos + 1).map(|t| &t.0) == Some(&Tok::Eq) => {
                    self.pos += 2;
                    let value = self.expr()?;
                    named.push((name, value));
                }
                _ => positional.push(self.expr()?),
            }

            match self.next() {
                Tok::Comma | Tok::Semi => {}
                Tok::RBrace => break,
                other => return Err(err(self.line(), format!("expected ',' or '}}', found {:?}", other))),
            }
        }

        if named.is_empty() {
            return Ok(Value::Array(positional));
        }

        let mut object = Map::new();
        for (i, value) in positional.into_iter().enumerate() {
            object.insert((i + 1).to_string(), value);
        }
        for (key, value) in named {
            if value.is_null() {
                object.remove(&key);
            } else {
                object.insert(key, value);
            }
        }
        Ok(Value::Object(object))
    }
}

fn number(n: f64, line: usize) -> Result<Value, ParseError> {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return Ok(Value::Number(Number::from(n as i64)));
    }
    Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| err(line, "non-finite number"))
}
