//! Legacy `.smd` map descriptions (TDF syntax)
//!
//! ```text
//! [MAP]
//! {
//!     Gravity=130;
//!     [ATMOSPHERE] { MinWind=5; MaxWind=25; }
//!     [TEAM0] { StartPosX=1000; StartPosZ=1000; }
//! }
//! ```

use std::collections::HashMap;

use crate::error::ParseError;
use crate::map::{LegacyMetadata, StartPos};

/// A TDF section. Keys and section names are lowercased.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TdfSection {
    pub values: HashMap<String, String>,
    pub sections: Vec<(String, TdfSection)>,
}

impl TdfSection {
    pub fn section(&self, name: &str) -> Option<&TdfSection> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.value(key).and_then(|v| v.parse::<f64>().ok())
    }
}

/// Extract the legacy metadata schema from an `.smd` file
pub fn parse_smd(text: &str) -> Result<LegacyMetadata, ParseError> {
    let root = parse_tdf(text)?;
    let map = root.section("map").ok_or(ParseError::Smd {
        line: 1,
        message: "no [MAP] section".to_string(),
    })?;
    let atmosphere = map.section("atmosphere");

    let mut teams: Vec<(u32, StartPos)> = map
        .sections
        .iter()
        .filter_map(|(name, section)| {
            let team = name.strip_prefix("team")?.parse::<u32>().ok()?;
            Some((
                team,
                StartPos {
                    x: section.number("startposx")?,
                    y: 0.0,
                    z: section.number("startposz")?,
                },
            ))
        })
        .collect();
    teams.sort_by_key(|(team, _)| *team);

    Ok(LegacyMetadata {
        description: map.value("description").map(str::to_string),
        map_hardness: map.number("maphardness"),
        gravity: map.number("gravity"),
        tidal_strength: map.number("tidalstrength"),
        max_metal: map.number("maxmetal"),
        extractor_radius: map.number("extractorradius"),
        min_wind: atmosphere.and_then(|a| a.number("minwind")),
        max_wind: atmosphere.and_then(|a| a.number("maxwind")),
        start_positions: teams.into_iter().map(|(_, pos)| pos).collect(),
    })
}

/// Parse TDF text into a root section holding the top-level sections
pub fn parse_tdf(text: &str) -> Result<TdfSection, ParseError> {
    let mut cursor = Cursor {
        chars: text.chars().collect(),
        pos: 0,
        line: 1,
    };
    let root = cursor.body(false)?;
    Ok(root)
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Cursor {
    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Smd {
            line: self.line,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.chars.get(self.pos + i) == Some(&c))
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.starts_with("//") => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.starts_with("/*") => {
                    self.pos += 2;
                    while self.peek().is_some() && !self.starts_with("*/") {
                        self.bump();
                    }
                    self.pos = (self.pos + 2).min(self.chars.len());
                }
                _ => return,
            }
        }
    }

    fn take_until(&mut self, stop: &[char]) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if stop.contains(&c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    /// Parse entries until `}` (nested) or end of input (top level)
    fn body(&mut self, nested: bool) -> Result<TdfSection, ParseError> {
        let mut section = TdfSection::default();
        loop {
            self.skip_trivia();
            match self.peek() {
                None if nested => return Err(self.error("unterminated section")),
                None => return Ok(section),
                Some('}') if nested => {
                    self.bump();
                    return Ok(section);
                }
                Some('}') => return Err(self.error("unexpected '}'")),
                Some('[') => {
                    self.bump();
                    let name = self.take_until(&[']', '\n']);
                    if self.bump() != Some(']') {
                        return Err(self.error("unterminated section name"));
                    }
                    self.skip_trivia();
                    if self.bump() != Some('{') {
                        return Err(self.error(format!("expected '{{' after [{}]", name)));
                    }
                    let child = self.body(true)?;
                    section
                        .sections
                        .push((name.trim().to_ascii_lowercase(), child));
                }
                Some(_) => {
                    let key = self.take_until(&['=', ';', '{', '}', '\n']);
                    if self.bump() != Some('=') {
                        return Err(self.error(format!("expected '=' after {:?}", key.trim())));
                    }
                    let value = self.take_until(&[';', '}']);
                    if self.peek() == Some(';') {
                        self.bump();
                    }
                    section
                        .values
                        .insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
                }
            }
        }
    }
}
