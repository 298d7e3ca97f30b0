//! Alias matching and argument extraction.
//!
//! A [`Parser`] owns one alias rule (literal prefix or regex), an optional
//! argument delimiter and an ordered list of positional validators. Parsing
//! is pure: the same parser and message always produce the same outcome.

use crate::error::DispatchError;
use crate::message::Message;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Positional argument check. Receives the token and the message it came from.
pub type Validator = Arc<dyn Fn(&str, &dyn Message) -> bool + Send + Sync>;

/// Maps raw parser output to the typed command input.
pub type Adapter<T> = Arc<dyn Fn(ParserOutput) -> T + Send + Sync>;

/// How a parser recognizes its command.
#[derive(Debug, Clone)]
pub enum Alias {
    /// Case-sensitive prefix of the trimmed text.
    Literal(String),
    /// Regex that must match at the start of the trimmed text.
    Pattern(Regex),
}

impl Alias {
    /// Compile a pattern alias.
    pub fn pattern(pattern: &str) -> Result<Self, DispatchError> {
        Ok(Self::Pattern(compile(pattern)?))
    }

    /// Split `text` into the matched alias and the remainder.
    fn split<'t>(&self, text: &'t str) -> Option<(&'t str, &'t str)> {
        match self {
            Self::Literal(prefix) => text
                .strip_prefix(prefix.as_str())
                .map(|rest| (&text[..prefix.len()], rest)),
            Self::Pattern(re) => re
                .find(text)
                .filter(|m| m.start() == 0)
                .map(|m| (m.as_str(), &text[m.end()..])),
        }
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(prefix) => f.write_str(prefix),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// How a parser splits the text after its alias into arguments.
#[derive(Debug, Clone)]
pub enum Delimiter {
    /// Split on every occurrence of this exact string.
    Literal(String),
    /// Split on every match of this regex.
    Pattern(Regex),
}

impl Delimiter {
    fn split<'t>(&self, source: &'t str) -> Vec<&'t str> {
        match self {
            Self::Literal(separator) => source.split(separator.as_str()).collect(),
            Self::Pattern(re) => re.split(source).collect(),
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(separator) => write!(f, "{:?}", separator),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// Structured result of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOutput {
    /// The matched alias text.
    pub alias: String,
    /// Argument tokens, left to right.
    pub arguments: Vec<String>,
}

/// Result of running one parser against one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The message is not addressed to this parser.
    Pass,
    /// The alias matched but the arguments are malformed.
    Failed,
    /// The alias matched and all validators accepted.
    Parsed(ParserOutput),
}

/// One alias-matching and argument-extraction rule of a command.
pub struct Parser<T> {
    alias: Alias,
    delimiter: Option<Delimiter>,
    validators: Vec<Validator>,
    adapter: Adapter<T>,
}

impl<T> Parser<T> {
    /// Parser for a literal alias.
    pub fn literal<F>(alias: impl Into<String>, adapter: F) -> Self
    where
        F: Fn(ParserOutput) -> T + Send + Sync + 'static,
    {
        Self::with_alias(Alias::Literal(alias.into()), adapter)
    }

    /// Parser for a regex alias.
    pub fn pattern<F>(pattern: &str, adapter: F) -> Result<Self, DispatchError>
    where
        F: Fn(ParserOutput) -> T + Send + Sync + 'static,
    {
        Ok(Self::with_alias(Alias::pattern(pattern)?, adapter))
    }

    pub fn with_alias<F>(alias: Alias, adapter: F) -> Self
    where
        F: Fn(ParserOutput) -> T + Send + Sync + 'static,
    {
        Self {
            alias,
            delimiter: None,
            validators: Vec::new(),
            adapter: Arc::new(adapter),
        }
    }

    /// Split arguments on the exact string `separator`. Without a delimiter
    /// the whole remainder is a single argument.
    ///
    /// An empty separator leaves the remainder unsplit.
    pub fn delimiter(mut self, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        self.delimiter = (!separator.is_empty()).then_some(Delimiter::Literal(separator));
        self
    }

    /// Split arguments on every match of the regex `pattern`.
    pub fn delimiter_pattern(mut self, pattern: &str) -> Result<Self, DispatchError> {
        self.delimiter = Some(Delimiter::Pattern(compile(pattern)?));
        Ok(self)
    }

    /// Split arguments on runs of whitespace.
    pub fn whitespace(mut self) -> Self {
        self.delimiter = Some(Delimiter::Pattern(whitespace_regex().clone()));
        self
    }

    /// Append a positional validator.
    pub fn argument<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str, &dyn Message) -> bool + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn alias(&self) -> &Alias {
        &self.alias
    }

    /// Number of required positional arguments.
    pub fn arity(&self) -> usize {
        self.validators.len()
    }

    /// Match the message against this parser.
    pub fn parse(&self, message: &dyn Message) -> ParseOutcome {
        let Some(text) = message.text().map(str::trim).filter(|t| !t.is_empty()) else {
            return ParseOutcome::Pass;
        };

        let Some((alias, rest)) = self.alias.split(text) else {
            return ParseOutcome::Pass;
        };

        let arguments = self.tokenize(rest.trim());

        if arguments.len() < self.validators.len() {
            trace!(
                alias = %self.alias,
                expected = self.validators.len(),
                got = arguments.len(),
                "Too few arguments"
            );
            return ParseOutcome::Failed;
        }

        // Extra tokens past the declared validators are accepted unchecked.
        for (index, (validator, token)) in self.validators.iter().zip(&arguments).enumerate() {
            if !validator(token.as_str(), message) {
                trace!(alias = %self.alias, index, token = %token, "Argument rejected");
                return ParseOutcome::Failed;
            }
        }

        ParseOutcome::Parsed(ParserOutput {
            alias: alias.to_string(),
            arguments,
        })
    }

    /// Convert parser output to the command input.
    pub fn adapt(&self, output: ParserOutput) -> T {
        (self.adapter)(output)
    }

    fn tokenize(&self, source: &str) -> Vec<String> {
        match &self.delimiter {
            Some(delimiter) => delimiter
                .split(source)
                .into_iter()
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            None if source.is_empty() => Vec::new(),
            None => vec![source.to_string()],
        }
    }
}

impl Parser<ParserOutput> {
    /// Parser whose input is the raw [`ParserOutput`].
    pub fn raw(alias: impl Into<String>) -> Self {
        Self::literal(alias, |output| output)
    }
}

impl<T> fmt::Debug for Parser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("alias", &self.alias)
            .field("delimiter", &self.delimiter.as_ref().map(ToString::to_string))
            .field("arity", &self.validators.len())
            .finish()
    }
}

fn compile(pattern: &str) -> Result<Regex, DispatchError> {
    Regex::new(pattern).map_err(|source| DispatchError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn whitespace_regex() -> &'static Regex {
    static WHITESPACE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static whitespace regex is valid"))
}

/// Common validators.
pub mod validators {
    use crate::message::Message;
    use std::str::FromStr;

    /// Accepts runs of ASCII digits of any length.
    pub fn numeric(token: &str, _message: &dyn Message) -> bool {
        !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
    }

    /// Accepts tokens that parse as `T`.
    ///
    /// Pair with an adapter that parses the same token as `T`, so the adapter
    /// never sees a value it cannot represent.
    pub fn parses<T: FromStr + 'static>()
    -> impl Fn(&str, &dyn Message) -> bool + Send + Sync + 'static {
        |token, _| token.parse::<T>().is_ok()
    }

    /// Accepts tokens of at most `max` characters.
    pub fn max_len(max: usize) -> impl Fn(&str, &dyn Message) -> bool + Send + Sync + 'static {
        move |token, _| token.chars().count() <= max
    }

    /// Accepts one of the given words (case-insensitive).
    pub fn one_of(
        words: &'static [&'static str],
    ) -> impl Fn(&str, &dyn Message) -> bool + Send + Sync + 'static {
        move |token, _| words.iter().any(|w| w.eq_ignore_ascii_case(token))
    }
}
