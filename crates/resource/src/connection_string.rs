//! ADO.NET-style connection strings (`Key=Value;Key2="quoted;value"`)

use std::fmt;
use std::str::FromStr;

use azsecrets_credential::ConfigError;

const FIELD: &str = "DB_CONNECTION_STRING";

/// Keyword that turns on Always Encrypted
pub const COLUMN_ENCRYPTION_SETTING: &str = "Column Encryption Setting";

/// Keywords consumed here and never passed to the TDS driver
const CLIENT_ONLY_KEYWORDS: &[&str] = &[COLUMN_ENCRYPTION_SETTING];

const SERVER_KEYWORDS: &[&str] = &["server", "data source", "address", "addr", "network address"];
const DATABASE_KEYWORDS: &[&str] = &["database", "initial catalog"];
const SECRET_KEYWORDS: &[&str] = &["password", "pwd"];

/// A parsed connection string.
///
/// Keywords are matched case-insensitively; order and spelling of the
/// original entries are preserved.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    entries: Vec<(String, String)>,
}

impl ConnectionString {
    /// Parse `input`, reporting problems as invalid `DB_CONNECTION_STRING`
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        Parser::new(input).parse()
    }

    /// Value of `keyword`, last occurrence wins
    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(keyword))
            .map(|(_, v)| v.as_str())
    }

    fn get_any(&self, keywords: &[&str]) -> Option<&str> {
        keywords.iter().find_map(|k| self.get(k))
    }

    /// `Server` / `Data Source`
    pub fn server(&self) -> Option<&str> {
        self.get_any(SERVER_KEYWORDS)
    }

    /// `Database` / `Initial Catalog`
    pub fn database(&self) -> Option<&str> {
        self.get_any(DATABASE_KEYWORDS)
    }

    /// Whether `Column Encryption Setting=Enabled`
    pub fn column_encryption_enabled(&self) -> bool {
        self.get(COLUMN_ENCRYPTION_SETTING)
            .is_some_and(|v| v.eq_ignore_ascii_case("enabled"))
    }

    /// Connection string with client-only keywords removed, for the TDS driver
    pub fn to_driver_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            if CLIENT_ONLY_KEYWORDS
                .iter()
                .any(|k| k.eq_ignore_ascii_case(key))
            {
                continue;
            }
            if !out.is_empty() {
                out.push(';');
            }
            out.push_str(key);
            out.push('=');
            push_value(&mut out, value);
        }
        out
    }
}

impl FromStr for ConnectionString {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.entries {
            if SECRET_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(key)) {
                map.entry(key, &"[REDACTED]");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

fn push_value(out: &mut String, value: &str) {
    let needs_quotes = value.contains(';')
        || value.starts_with(['"', '\''])
        || value.trim() != value;
    if needs_quotes {
        out.push('"');
        out.push_str(&value.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(value);
    }
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn parse(mut self) -> Result<ConnectionString, ConfigError> {
        let mut entries = Vec::new();
        loop {
            self.skip_while(|c| c == ';' || c.is_whitespace());
            if self.chars.peek().is_none() {
                break;
            }
            let key = self.key()?;
            let value = self.value()?;
            entries.push((key, value));
        }
        Ok(ConnectionString { entries })
    }

    fn skip_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.chars.next_if(|c| pred(*c)).is_some() {}
    }

    fn key(&mut self) -> Result<String, ConfigError> {
        let mut key = String::new();
        loop {
            match self.chars.next() {
                Some('=') => break,
                Some(';') | None => {
                    return Err(ConfigError::invalid(
                        FIELD,
                        format!("entry '{}' has no '='", key.trim()),
                    ));
                }
                Some(c) => key.push(c),
            }
        }
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::invalid(FIELD, "entry with an empty keyword"));
        }
        Ok(key.to_string())
    }

    fn value(&mut self) -> Result<String, ConfigError> {
        self.skip_while(|c| c.is_whitespace() && c != ';');
        match self.chars.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                self.chars.next();
                let value = self.quoted(quote)?;
                self.skip_while(char::is_whitespace);
                match self.chars.next() {
                    Some(';') | None => Ok(value),
                    Some(c) => Err(ConfigError::invalid(
                        FIELD,
                        format!("unexpected '{c}' after quoted value"),
                    )),
                }
            }
            _ => {
                let mut value = String::new();
                while let Some(c) = self.chars.next_if(|c| *c != ';') {
                    value.push(c);
                }
                Ok(value.trim_end().to_string())
            }
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, ConfigError> {
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some(c) if c == quote => {
                    // doubled quote is a literal quote
                    if self.chars.next_if_eq(&quote).is_some() {
                        value.push(quote);
                    } else {
                        return Ok(value);
                    }
                }
                Some(c) => value.push(c),
                None => return Err(ConfigError::invalid(FIELD, "unterminated quoted value")),
            }
        }
    }
}
