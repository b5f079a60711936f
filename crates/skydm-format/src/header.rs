//! FITS header cards.
//!
//! A header is a sequence of 80-character ASCII cards. A value card has the
//! keyword in columns 1-8, the value indicator `= ` in columns 9-10, and a
//! value optionally followed by `/ comment`. Commentary cards (`COMMENT`,
//! `HISTORY`, blank keyword) carry free text only.

use std::fmt;

/// Length of one header card.
pub const CARD_LEN: usize = 80;

const KEYWORD_LEN: usize = 8;
const COMMENTARY_KEYWORDS: [&str; 3] = ["COMMENT", "HISTORY", ""];

/// The value of a header card.
#[derive(Clone, Debug, PartialEq)]
pub enum HeaderValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Value indicator present but no value given.
    Empty,
}

impl HeaderValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    fn parse(text: &str) -> Self {
        let text = text.trim();
        match text {
            "" => Self::Empty,
            "T" => Self::Bool(true),
            "F" => Self::Bool(false),
            _ => {
                if let Ok(v) = text.parse::<i64>() {
                    Self::Int(v)
                } else if let Ok(v) = text.replace(['D', 'd'], "E").parse::<f64>() {
                    Self::Float(v)
                } else {
                    Self::Str(text.to_string())
                }
            }
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("T"),
            Self::Bool(false) => f.write_str("F"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{}", format!("{v:?}").to_uppercase()),
            Self::Str(s) => write!(f, "'{:<8}'", s.replace('\'', "''")),
            Self::Empty => Ok(()),
        }
    }
}

/// One header card.
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub keyword: String,
    pub value: HeaderValue,
    pub comment: Option<String>,
}

impl Card {
    /// A value card.
    pub fn new(keyword: impl Into<String>, value: HeaderValue) -> Self {
        Self {
            keyword: keyword.into().to_ascii_uppercase(),
            value,
            comment: None,
        }
    }

    /// A commentary card (`COMMENT`, `HISTORY` or blank keyword).
    pub fn commentary(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into().to_ascii_uppercase(),
            value: HeaderValue::Empty,
            comment: Some(text.into()),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Returns `true` for free-text cards that carry no value.
    pub fn is_commentary(&self) -> bool {
        COMMENTARY_KEYWORDS.contains(&self.keyword.as_str())
    }

    /// Parse one 80-character card.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if !raw.is_ascii() {
            return Err("header contains non-ASCII characters".to_string());
        }
        if raw.len() != CARD_LEN {
            return Err(format!("card is {} characters long, expected {CARD_LEN}", raw.len()));
        }

        let keyword = raw[..KEYWORD_LEN].trim_end().to_string();
        if keyword.contains(' ') {
            return Err(format!("malformed keyword {keyword:?}"));
        }
        let rest = &raw[KEYWORD_LEN..];

        let is_value_card =
            !COMMENTARY_KEYWORDS.contains(&keyword.as_str()) && rest.starts_with("= ");
        if !is_value_card {
            return Ok(Self {
                keyword,
                value: HeaderValue::Empty,
                comment: Some(rest.trim_end().to_string()),
            });
        }

        let field = rest[2..].trim_start();
        let (value, comment) = if let Some(quoted) = field.strip_prefix('\'') {
            let (text, after) = split_quoted(quoted)
                .ok_or_else(|| format!("unterminated string value for keyword {keyword}"))?;
            (HeaderValue::Str(text), after)
        } else {
            match field.split_once('/') {
                Some((value, comment)) => (HeaderValue::parse(value), Some(comment)),
                None => (HeaderValue::parse(field), None),
            }
        };

        let comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        Ok(Self {
            keyword,
            value,
            comment,
        })
    }

    /// Render as a fixed-width 80-character card.
    pub fn to_padded(&self) -> String {
        let mut card = self.to_string();
        card.truncate(CARD_LEN);
        format!("{card:<CARD_LEN$}")
    }
}

/// Split a quoted string body at its closing quote. Doubled quotes are
/// literal quotes. Returns the trimmed string and the comment, if any.
fn split_quoted(body: &str) -> Option<(String, Option<&str>)> {
    let mut text = String::new();
    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '\'' {
            text.push(c);
            continue;
        }
        if chars.peek().is_some_and(|&(_, next)| next == '\'') {
            chars.next();
            text.push('\'');
            continue;
        }
        let after = &body[i + 1..];
        let comment = after.split_once('/').map(|(_, c)| c);
        return Some((text.trim_end().to_string(), comment));
    }
    None
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_commentary() {
            let text = self.comment.as_deref().unwrap_or_default();
            return write!(f, "{:<KEYWORD_LEN$}{text}", self.keyword);
        }
        let value = self.value.to_string();
        match self.value {
            HeaderValue::Str(_) => write!(f, "{:<KEYWORD_LEN$}= {value:<20}", self.keyword)?,
            _ => write!(f, "{:<KEYWORD_LEN$}= {value:>20}", self.keyword)?,
        }
        if let Some(comment) = &self.comment {
            write!(f, " / {comment}")?;
        }
        Ok(())
    }
}

/// An ordered list of header cards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Set `keyword` to `value`, replacing the first existing value card.
    pub fn set(&mut self, keyword: &str, value: HeaderValue) {
        let keyword = keyword.to_ascii_uppercase();
        match self
            .cards
            .iter_mut()
            .find(|c| !c.is_commentary() && c.keyword == keyword)
        {
            Some(card) => card.value = value,
            None => self.cards.push(Card::new(keyword, value)),
        }
    }

    /// Value of the first value card with `keyword`.
    pub fn get(&self, keyword: &str) -> Option<&HeaderValue> {
        self.cards
            .iter()
            .find(|c| !c.is_commentary() && c.keyword.eq_ignore_ascii_case(keyword))
            .map(|c| &c.value)
    }

    pub fn get_int(&self, keyword: &str) -> Option<i64> {
        self.get(keyword).and_then(HeaderValue::as_int)
    }

    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        self.get(keyword).and_then(HeaderValue::as_str)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.get(keyword).is_some()
    }

    /// Keywords of value cards, in header order, first occurrence only.
    pub fn keywords(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for card in self.cards.iter().filter(|c| !c.is_commentary()) {
            if !seen.contains(&card.keyword.as_str()) {
                seen.push(card.keyword.as_str());
            }
        }
        seen
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl FromIterator<Card> for Header {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Self {
            cards: iter.into_iter().collect(),
        }
    }
}
