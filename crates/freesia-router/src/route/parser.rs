/// Rule compilation
///
/// Turns the token stream from [`tokenize`](super::pattern::tokenize) into a
/// regex source with one named group per parameter, the ordered decoders for
/// those groups, and the reconstruction list used to build URLs back.

use std::fmt;

use crate::error::RouteError;
use crate::filter::{DecodeFn, EncodeFn, FilterRegistry, Value};

use super::pattern::{tokenize, Token};

/// Reconstruction entry: either fixed text or a slot filled by `encode`
#[derive(Clone)]
pub enum BuildToken {
    Literal(String),
    Param { name: String, encode: EncodeFn },
}

impl BuildToken {
    /// Renders this piece with `value` for parameter slots
    pub fn render(&self, value: Option<&Value>) -> Option<String> {
        match self {
            BuildToken::Literal(text) => Some(text.clone()),
            BuildToken::Param { encode, .. } => value.map(|v| encode(v)),
        }
    }
}

impl fmt::Debug for BuildToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildToken::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            BuildToken::Param { name, .. } => {
                f.debug_struct("Param").field("name", name).finish_non_exhaustive()
            }
        }
    }
}

/// Output of [`compile`]
#[derive(Clone)]
pub struct CompiledRule {
    /// Regex source for dynamic rules, the literal rule text for static ones
    pub pattern: String,
    /// Decoders in group declaration order
    pub decoders: Vec<(String, DecodeFn)>,
    pub builder: Vec<BuildToken>,
    pub is_static: bool,
}

impl CompiledRule {
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.decoders.iter().map(|(name, _)| name.as_str())
    }

    pub fn param_count(&self) -> usize {
        self.decoders.len()
    }
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("pattern", &self.pattern)
            .field("params", &self.param_names().collect::<Vec<_>>())
            .field("builder", &self.builder)
            .field("is_static", &self.is_static)
            .finish()
    }
}

/// Fold accumulator for compilation
///
/// Mutations stay local to the accumulator; each step consumes and returns it.
#[derive(Default)]
struct CompileState {
    pattern: String,
    literal_text: String,
    decoders: Vec<(String, DecodeFn)>,
    builder: Vec<BuildToken>,
}

impl CompileState {
    fn with_literal(mut self, text: String) -> Self {
        self.pattern.push_str(&regex::escape(&text));
        self.literal_text.push_str(&text);
        self.builder.push(BuildToken::Literal(text));
        self
    }

    fn with_param(
        mut self,
        rule: &str,
        filter: &str,
        name: String,
        registry: &FilterRegistry,
    ) -> Result<Self, RouteError> {
        if self.decoders.iter().any(|(existing, _)| *existing == name) {
            return Err(RouteError::DuplicateParam {
                rule: rule.to_string(),
                name,
            });
        }

        let spec = registry
            .lookup(filter)
            .map_err(|_| RouteError::UnknownFilter {
                rule: rule.to_string(),
                filter: filter.to_string(),
            })?;

        self.pattern
            .push_str(&format!("(?P<{}>{})", name, spec.pattern()));
        self.decoders.push((name.clone(), spec.decoder()));
        self.builder.push(BuildToken::Param {
            name,
            encode: spec.encoder(),
        });
        Ok(self)
    }

    fn finalize(self) -> CompiledRule {
        let is_static = self.decoders.is_empty();
        CompiledRule {
            // Static rules are matched by string equality on the unescaped text
            pattern: if is_static {
                self.literal_text
            } else {
                self.pattern
            },
            decoders: self.decoders,
            builder: self.builder,
            is_static,
        }
    }
}

/// Compiles a rule against the registered filters
///
/// # Examples
///
/// ```
/// use freesia_router::{compile, FilterRegistry};
///
/// let registry = FilterRegistry::new();
///
/// let compiled = compile("/test/<int:age>", &registry).unwrap();
/// assert_eq!(compiled.pattern, r"/test/(?P<age>-?\d+)");
/// assert!(!compiled.is_static);
///
/// let compiled = compile("/test", &registry).unwrap();
/// assert_eq!(compiled.pattern, "/test");
/// assert!(compiled.is_static);
/// ```
///
/// # Errors
///
/// - [`RouteError::UnknownFilter`] when a placeholder names an unregistered filter
/// - [`RouteError::DuplicateParam`] when a parameter name repeats
pub fn compile(rule: &str, registry: &FilterRegistry) -> Result<CompiledRule, RouteError> {
    tokenize(rule)
        .into_iter()
        .try_fold(CompileState::default(), |state, token| match token {
            Token::Literal(text) => Ok(state.with_literal(text)),
            Token::Param { filter, name } => state.with_param(rule, &filter, name, registry),
        })
        .map(CompileState::finalize)
}
