//! Directive option lists (`name;key=value;key=value`).

use crate::error::ParseErrorKind;

/// Ordered `key=value` options attached to a directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(Vec<(String, String)>);

impl Options {
    /// Parses the `;key=value` tail of a directive body.
    ///
    /// `text` is everything after the expression, including the leading `;`.
    /// An empty string yields no options.
    pub fn parse(text: &str) -> Result<Self, ParseErrorKind> {
        let mut options = Vec::new();
        let Some(rest) = text.strip_prefix(';') else {
            return if text.trim().is_empty() {
                Ok(Self(options))
            } else {
                Err(ParseErrorKind::MalformedOption(String::from(text)))
            };
        };
        for segment in rest.split(';') {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ParseErrorKind::MalformedOption(String::from(segment)))?;
            let key = key.trim();
            if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(ParseErrorKind::MalformedOption(String::from(segment)));
            }
            options.push((String::from(key), String::from(value.trim())));
        }
        Ok(Self(options))
    }

    /// Returns the value of `key`, compared case-insensitively.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `key` parsed as a positive integer.
    pub fn get_usize(&self, key: &str) -> Result<Option<usize>, ParseErrorKind> {
        self.get(key)
            .map(|value| {
                value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| invalid(key, value))
            })
            .transpose()
    }

    /// Returns `key` parsed as `true` or `false`.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ParseErrorKind> {
        self.get(key)
            .map(|value| {
                if value.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if value.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(invalid(key, value))
                }
            })
            .transpose()
    }

    /// Iterates over the options in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns true if there are no options.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn invalid(key: &str, value: &str) -> ParseErrorKind {
    ParseErrorKind::InvalidOptionValue {
        key: String::from(key),
        value: String::from(value),
    }
}
