/// Rule tokenization
///
/// Pure functional scanning of rule strings like `/users/<int:id>` into typed
/// tokens. All functions are **pure**: same input → same output, no side effects.

use once_cell::sync::Lazy;
use regex::Regex;

/// Finds placeholders together with the backslash run in front of them.
///
/// Groups: 1 = backslashes, 2 = filter name (optional), 3 = parameter name.
static RULE_SYNTAX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\\*)(?:<(?:([^<>:]+):)?([a-zA-Z_][a-zA-Z_0-9]*)>)")
        .expect("rule syntax pattern is a valid regex")
});

/// Filter used when a placeholder names none
pub const DEFAULT_FILTER: &str = "default";

/// One piece of a rule
///
/// # Examples
///
/// ```
/// use freesia_router::route::pattern::{tokenize, Token};
///
/// let tokens = tokenize("/users/<int:id>");
/// assert_eq!(tokens, vec![Token::literal("/users/"), Token::param("int", "id")]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Text the path must contain verbatim
    Literal(String),
    /// A `<filter:name>` placeholder
    Param { filter: String, name: String },
}

impl Token {
    pub fn literal(text: impl Into<String>) -> Self {
        Token::Literal(text.into())
    }

    pub fn param(filter: impl Into<String>, name: impl Into<String>) -> Self {
        Token::Param {
            filter: filter.into(),
            name: name.into(),
        }
    }

    pub fn is_param(&self) -> bool {
        matches!(self, Token::Param { .. })
    }
}

/// Splits a rule into literal and parameter tokens (pure function)
///
/// # Escaping
///
/// A run of backslashes directly in front of a placeholder is halved. When the
/// run is odd the placeholder loses its meaning and is kept as literal text:
///
/// | rule            | tokens                                  |
/// |-----------------|-----------------------------------------|
/// | `/a/<x>`        | `Literal("/a/")`, `Param(default, x)`   |
/// | `/a/\<x>`       | `Literal("/a/<x>")`                     |
/// | `/a/\\<x>`      | `Literal("/a/\")`, `Param(default, x)`  |
/// | `/a/\\\<x>`     | `Literal("/a/\<x>")`                    |
///
/// Adjacent literal text is merged, so a rule never yields two literals in a
/// row and never yields an empty literal.
pub fn tokenize(rule: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut offset = 0;

    for caps in RULE_SYNTAX.captures_iter(rule) {
        let Some(whole) = caps.get(0) else { continue };
        literal.push_str(&rule[offset..whole.start()]);
        offset = whole.end();

        let slashes = caps.get(1).map_or(0, |m| m.len());
        literal.push_str(&"\\".repeat(slashes / 2));

        if slashes % 2 == 1 {
            // Escaped: keep "<...>" as plain text
            literal.push_str(&whole.as_str()[slashes..]);
            continue;
        }

        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }

        let filter = caps.get(2).map_or(DEFAULT_FILTER, |m| m.as_str());
        let name = caps.get(3).map_or("", |m| m.as_str());
        tokens.push(Token::param(filter, name));
    }

    literal.push_str(&rule[offset..]);
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }

    tokens
}
