//! Compiled trigger rules
//!
//! Tokens are written in YAML either as plain strings (literal substring
//! search) or as `{ regex: "..." }`. Path triggers are glob patterns where
//! `*` stays within one path segment and `**` spans any number of segments.

use glob::{MatchOptions, Pattern};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A trigger token as written in a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenSpec {
    /// Literal substring
    Literal(String),
    /// Regular expression
    Regex {
        /// Pattern source
        regex: String,
    },
}

impl TokenSpec {
    /// Raw pattern text
    pub fn pattern(&self) -> &str {
        match self {
            TokenSpec::Literal(s) => s,
            TokenSpec::Regex { regex } => regex,
        }
    }
}

impl fmt::Display for TokenSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSpec::Literal(s) => f.write_str(s),
            TokenSpec::Regex { regex } => write!(f, "/{}/", regex),
        }
    }
}

#[derive(Debug, Clone)]
enum TokenMatcher {
    Literal(String),
    Regex(Regex),
}

/// A compiled lexical or annotation token
#[derive(Debug, Clone)]
pub struct Token {
    spec: TokenSpec,
    matcher: TokenMatcher,
}

impl Token {
    /// Compile a token. Case-insensitive literals are compiled as escaped regexes.
    pub fn compile(spec: TokenSpec, ignore_case: bool) -> Result<Self, String> {
        if spec.pattern().is_empty() {
            return Err("empty trigger token".to_string());
        }

        let matcher = match &spec {
            TokenSpec::Literal(s) if !ignore_case => TokenMatcher::Literal(s.clone()),
            TokenSpec::Literal(s) => TokenMatcher::Regex(build_regex(&regex::escape(s), true)?),
            TokenSpec::Regex { regex } => TokenMatcher::Regex(build_regex(regex, ignore_case)?),
        };

        Ok(Self { spec, matcher })
    }

    /// The token as written
    pub fn spec(&self) -> &TokenSpec {
        &self.spec
    }

    /// First occurrence of this token in `content`
    pub fn find<'a>(&self, content: &'a str) -> Option<&'a str> {
        match &self.matcher {
            TokenMatcher::Literal(s) => content.find(s.as_str()).map(|start| &content[start..start + s.len()]),
            TokenMatcher::Regex(re) => re
                .find_iter(content)
                .map(|m| m.as_str())
                .find(|m| !m.is_empty()),
        }
    }
}

fn build_regex(pattern: &str, ignore_case: bool) -> Result<Regex, String> {
    RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|e| format!("invalid regex '{}': {}", pattern, e))
}

/// A compiled path glob
#[derive(Debug, Clone)]
pub struct PathTrigger {
    pattern: Pattern,
    options: MatchOptions,
}

impl PathTrigger {
    /// Compile a glob pattern
    pub fn compile(glob: &str, ignore_case: bool) -> Result<Self, String> {
        if glob.is_empty() {
            return Err("empty path pattern".to_string());
        }

        let pattern =
            Pattern::new(glob).map_err(|e| format!("invalid path pattern '{}': {}", glob, e))?;

        Ok(Self {
            pattern,
            options: MatchOptions {
                case_sensitive: !ignore_case,
                require_literal_separator: true,
                require_literal_leading_dot: false,
            },
        })
    }

    /// Pattern source
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Whether `path` matches this glob
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches_with(path, self.options)
    }
}

/// The skill-level trigger rules of one descriptor
#[derive(Debug, Clone, Default)]
pub struct TriggerSet {
    /// Glob patterns over the artifact path
    pub paths: Vec<PathTrigger>,
    /// Tokens searched in the artifact content
    pub lexical: Vec<Token>,
    /// Structural marker tokens searched in the artifact content
    pub annotations: Vec<Token>,
}

impl TriggerSet {
    /// True when no category has any rule
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.lexical.is_empty() && self.annotations.is_empty()
    }
}
