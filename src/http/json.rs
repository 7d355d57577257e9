//! Field extraction from flat JSON objects.
//!
//! This is a scanner, not a parser: it looks for `"key"` followed by a colon
//! and reads the value that follows. Key order, unknown keys, whitespace and
//! trailing commas do not matter; the document as a whole is never validated.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("missing field `{0}`")]
    Missing(String),
    #[error("field `{field}` has an invalid value: {found}")]
    Invalid { field: String, found: String },
}

/// A raw value as found after `"key":`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    /// Quoted string, with `\"` and `\\` unescaped.
    Str(String),
    /// Bare word such as `true` or `false`.
    Word(String),
    /// Run of digits and `.`.
    Number(String),
}

impl Scalar {
    pub fn as_text(&self) -> &str {
        match self {
            Scalar::Str(s) | Scalar::Word(s) | Scalar::Number(s) => s,
        }
    }
}

/// Position right after the colon of the first `"key"` that is used as a key.
fn value_start(json: &str, key: &str) -> Option<usize> {
    let marker = format!("\"{}\"", key);
    let mut from = 0;
    while let Some(pos) = json[from..].find(&marker) {
        let after = from + pos + marker.len();
        let rest = &json[after..];
        let trimmed = rest.trim_start();
        if let Some(value) = trimmed.strip_prefix(':') {
            return Some(json.len() - value.len());
        }
        from = after;
    }
    None
}

/// Scan the value for `key`. `None` if the key is absent or the value is not
/// one of the recognized shapes.
pub fn scan(json: &str, key: &str) -> Option<Scalar> {
    let start = value_start(json, key)?;
    let rest = json[start..].trim_start();
    let first = rest.chars().next()?;

    if first == '"' {
        let mut out = String::new();
        let mut chars = rest[1..].chars();
        while let Some(c) = chars.next() {
            match c {
                '"' => return Some(Scalar::Str(out)),
                '\\' => out.push(chars.next()?),
                c => out.push(c),
            }
        }
        None
    } else if first.is_ascii_alphabetic() {
        let word: String = rest.chars().take_while(|c| c.is_ascii_alphanumeric()).collect();
        Some(Scalar::Word(word))
    } else if first.is_ascii_digit() {
        let number: String = rest
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        Some(Scalar::Number(number))
    } else {
        None
    }
}

/// A key that is present but whose value is not a recognized shape is
/// `Invalid`, not `Missing`.
fn required(json: &str, key: &str) -> Result<Scalar, ScanError> {
    if let Some(value) = scan(json, key) {
        return Ok(value);
    }
    match value_start(json, key) {
        None => Err(ScanError::Missing(key.to_string())),
        Some(start) => Err(ScanError::Invalid {
            field: key.to_string(),
            found: raw_token(&json[start..]),
        }),
    }
}

/// The unparsed text after the colon, up to the next separator.
fn raw_token(rest: &str) -> String {
    rest.trim_start()
        .chars()
        .take_while(|c| !matches!(c, ',' | '}' | ']') && !c.is_whitespace())
        .collect()
}

/// A string field. Numbers and bare words are rejected.
pub fn scan_string(json: &str, key: &str) -> Result<String, ScanError> {
    match required(json, key)? {
        Scalar::Str(s) => Ok(s),
        other => Err(ScanError::Invalid {
            field: key.to_string(),
            found: other.as_text().to_string(),
        }),
    }
}

/// A boolean field: exactly `true` or `false`.
pub fn scan_bool(json: &str, key: &str) -> Result<bool, ScanError> {
    match required(json, key)? {
        Scalar::Word(w) if w == "true" => Ok(true),
        Scalar::Word(w) if w == "false" => Ok(false),
        other => Err(ScanError::Invalid {
            field: key.to_string(),
            found: other.as_text().to_string(),
        }),
    }
}

/// A field whose text is used as-is: either a quoted string or a number.
pub fn scan_text(json: &str, key: &str) -> Result<String, ScanError> {
    match required(json, key)? {
        Scalar::Str(s) | Scalar::Number(s) => Ok(s),
        Scalar::Word(w) => Err(ScanError::Invalid {
            field: key.to_string(),
            found: w,
        }),
    }
}
