/// URL filters: the vocabulary behind `<name>` and `<filter:name>` placeholders
///
/// A filter is a named triple of (segment pattern, decode, encode). The compiler
/// splices the pattern into the rule's regex, the router runs `decode` on every
/// captured segment, and `encode` is kept on the route for building URLs back
/// from typed values.
///
/// The registry is an owned table. It is written while the application is
/// being set up and only read once rules start compiling.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Segment pattern of the fallback filter
pub const DEFAULT_PATTERN: &str = r"[^/]+";
/// Segment pattern of the `int` filter
pub const INT_PATTERN: &str = r"-?\d+";
/// Segment pattern of the `float` filter
pub const FLOAT_PATTERN: &str = r"-?[\d.]+";

/// A decoded path parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short type name used in conversion errors
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            // Plain decimal, never exponent notation; integral values keep ".0"
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{}.0", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Raised by a filter's decode function when a captured segment is malformed
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct DecodeError {
    message: String,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// `"'abc' is not a valid int"`
    pub fn invalid(raw: &str, expected: &str) -> Self {
        Self::new(format!("'{}' is not a valid {}", raw, expected))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Lookup miss in a [`FilterRegistry`]
#[derive(Error, Debug, Clone, PartialEq)]
#[error("url filter '{0}' is not registered")]
pub struct UnknownFilter(pub String);

pub type DecodeFn = Arc<dyn Fn(&str) -> Result<Value, DecodeError> + Send + Sync>;
pub type EncodeFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Segment pattern plus the converters in both directions
#[derive(Clone)]
pub struct FilterSpec {
    pattern: String,
    decode: DecodeFn,
    encode: EncodeFn,
}

impl FilterSpec {
    /// Creates a filter from a regex fragment and two converters
    ///
    /// The fragment must match a single path segment and must not contain
    /// capture groups of its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use freesia_router::{DecodeError, FilterSpec, Value};
    ///
    /// let yes_no = FilterSpec::new(
    ///     "yes|no",
    ///     |raw| match raw {
    ///         "yes" => Ok(Value::Bool(true)),
    ///         "no" => Ok(Value::Bool(false)),
    ///         other => Err(DecodeError::invalid(other, "yes/no")),
    ///     },
    ///     |value| if value.as_bool() == Some(true) { "yes".into() } else { "no".into() },
    /// );
    /// assert_eq!(yes_no.decode("no"), Ok(Value::Bool(false)));
    /// ```
    pub fn new<D, E>(pattern: impl Into<String>, decode: D, encode: E) -> Self
    where
        D: Fn(&str) -> Result<Value, DecodeError> + Send + Sync + 'static,
        E: Fn(&Value) -> String + Send + Sync + 'static,
    {
        Self {
            pattern: pattern.into(),
            decode: Arc::new(decode),
            encode: Arc::new(encode),
        }
    }

    /// Identity filter: `[^/]+`, segment kept as a string
    pub fn string() -> Self {
        Self::new(
            DEFAULT_PATTERN,
            |raw| Ok(Value::String(raw.to_string())),
            |value| value.to_string(),
        )
    }

    /// Signed integer filter: `-?\d+`, decoded as `i64`
    ///
    /// `\d` is Unicode-aware, so non-ASCII digits such as `٣` match the
    /// segment but are rejected by the decoder, which only reads ASCII
    /// digits. Such a request resolves to `BadRequest`, not a miss.
    pub fn int() -> Self {
        Self::new(
            INT_PATTERN,
            |raw| {
                raw.parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| DecodeError::invalid(raw, "int"))
            },
            |value| match value {
                Value::Float(v) => (v.trunc() as i64).to_string(),
                other => other.to_string(),
            },
        )
    }

    /// Float filter: `-?[\d.]+`, decoded as `f64`
    ///
    /// Encoding never uses exponent notation, so every finite value renders
    /// to text the pattern accepts.
    ///
    /// The pattern is deliberately loose; `1.2.3` matches the segment and is
    /// only rejected by the decoder.
    pub fn float() -> Self {
        Self::new(
            FLOAT_PATTERN,
            |raw| {
                raw.parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| DecodeError::invalid(raw, "float"))
            },
            |value| match value {
                Value::Int(i) => Value::Float(*i as f64).to_string(),
                other => other.to_string(),
            },
        )
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn decode(&self, raw: &str) -> Result<Value, DecodeError> {
        (self.decode)(raw)
    }

    pub fn encode(&self, value: &Value) -> String {
        (self.encode)(value)
    }

    pub(crate) fn decoder(&self) -> DecodeFn {
        Arc::clone(&self.decode)
    }

    pub(crate) fn encoder(&self) -> EncodeFn {
        Arc::clone(&self.encode)
    }
}

impl fmt::Debug for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSpec")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// Named filters available to the rule compiler
///
/// Always seeded with `default`, `str`, `int` and `float`.
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    filters: HashMap<String, FilterSpec>,
}

impl FilterRegistry {
    /// Creates a registry holding the built-in filters
    pub fn new() -> Self {
        let mut filters = HashMap::new();
        filters.insert("default".to_string(), FilterSpec::string());
        filters.insert("str".to_string(), FilterSpec::string());
        filters.insert("int".to_string(), FilterSpec::int());
        filters.insert("float".to_string(), FilterSpec::float());
        Self { filters }
    }

    /// Inserts or overwrites a filter
    pub fn register(&mut self, name: impl Into<String>, spec: FilterSpec) {
        let name = name.into();
        tracing::debug!(filter = %name, pattern = %spec.pattern, "registering url filter");
        self.filters.insert(name, spec);
    }

    /// Immutable builder form of [`register`](Self::register)
    pub fn with_filter(mut self, name: impl Into<String>, spec: FilterSpec) -> Self {
        self.register(name, spec);
        self
    }

    pub fn lookup(&self, name: &str) -> Result<&FilterSpec, UnknownFilter> {
        self.filters
            .get(name)
            .ok_or_else(|| UnknownFilter(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Registered filter names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_seeded() {
        let registry = FilterRegistry::new();
        assert_eq!(registry.names(), vec!["default", "float", "int", "str"]);
        assert_eq!(registry.lookup("default").unwrap().pattern(), DEFAULT_PATTERN);
        assert_eq!(registry.lookup("str").unwrap().pattern(), DEFAULT_PATTERN);
        assert_eq!(registry.lookup("int").unwrap().pattern(), INT_PATTERN);
        assert_eq!(registry.lookup("float").unwrap().pattern(), FLOAT_PATTERN);
    }

    #[test]
    fn test_unknown_lookup() {
        let registry = FilterRegistry::new();
        assert_eq!(
            registry.lookup("uuid").unwrap_err(),
            UnknownFilter("uuid".to_string())
        );
    }

    #[test]
    fn test_register_overwrites() {
        let registry = FilterRegistry::new().with_filter(
            "int",
            FilterSpec::new(r"\d+", |raw| Ok(Value::from(raw)), |v| v.to_string()),
        );
        assert_eq!(registry.lookup("int").unwrap().pattern(), r"\d+");
    }

    #[test]
    fn test_int_decode() {
        let int = FilterSpec::int();
        assert_eq!(int.decode("42"), Ok(Value::Int(42)));
        assert_eq!(int.decode("-7"), Ok(Value::Int(-7)));
        assert!(int.decode("99999999999999999999").is_err());
        assert_eq!(int.encode(&Value::Int(5)), "5");
        assert_eq!(int.encode(&Value::Float(5.9)), "5");
    }

    #[test]
    fn test_float_decode() {
        let float = FilterSpec::float();
        assert_eq!(float.decode("1.5"), Ok(Value::Float(1.5)));
        assert_eq!(float.decode("-3"), Ok(Value::Float(-3.0)));
        assert!(float.decode("1.2.3").is_err());
        assert!(float.decode(".").is_err());
        assert_eq!(float.encode(&Value::Float(1.0)), "1.0");
        assert_eq!(float.encode(&Value::Int(2)), "2.0");
    }

    #[test]
    fn test_float_encode_never_uses_exponents() {
        let float = FilterSpec::float();
        let pattern = regex::Regex::new(&format!("^(?:{})$", FLOAT_PATTERN)).unwrap();

        for (value, expected) in [
            (1e-5, "0.00001"),
            (1e16, "10000000000000000.0"),
            (1.23456789e18, "1234567890000000000.0"),
            (-0.25, "-0.25"),
        ] {
            let encoded = float.encode(&Value::Float(value));
            assert_eq!(encoded, expected);
            assert!(pattern.is_match(&encoded), "{encoded} rejected by float pattern");
            assert_eq!(float.decode(&encoded), Ok(Value::Float(value)));
        }
    }

    #[test]
    fn test_int_rejects_unicode_digits() {
        let int = FilterSpec::int();
        let pattern = regex::Regex::new(&format!("^(?:{})$", INT_PATTERN)).unwrap();
        assert!(pattern.is_match("\u{0663}"));
        assert!(int.decode("\u{0663}").is_err());
    }

    #[test]
    fn test_string_is_identity() {
        let s = FilterSpec::string();
        assert_eq!(s.decode("mike"), Ok(Value::String("mike".to_string())));
        assert_eq!(s.encode(&Value::from("mike")), "mike");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Int(3).as_int(), Some(3));
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Float(0.5).kind(), "float");
        assert_eq!(Value::Float(0.5).as_int(), None);
    }
}
