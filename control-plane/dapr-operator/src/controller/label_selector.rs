//! Set-based label selectors restricted to the operators release tracking
//! needs: `Exists`, `Equals` and a numeric `LessThan`.
//!
//! Requirements are validated with the API server's rules when built, so a
//! selector that exists here is one the server will also accept. The
//! rendered string form (`key`, `key=value`, `key<value`) is what goes into
//! `ListParams::labels`; the server evaluates `<` by parsing both sides as
//! 64-bit integers, which is also what [`Requirement::matches`] does.

use std::collections::BTreeMap;
use std::fmt;

use kube::api::ListParams;

const LABEL_NAME_MAX_LEN: usize = 63;
const LABEL_VALUE_MAX_LEN: usize = 63;
const DNS1123_SUBDOMAIN_MAX_LEN: usize = 253;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    Exists,
    Equals,
    LessThan,
}

impl Operator {
    fn arity(self) -> usize {
        match self {
            Operator::Exists => 0,
            Operator::Equals | Operator::LessThan => 1,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Exists => write!(f, "exists"),
            Operator::Equals => write!(f, "="),
            Operator::LessThan => write!(f, "<"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RequirementError {
    #[error("invalid label key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },
    #[error("invalid label value {value:?}: {reason}")]
    InvalidValue { value: String, reason: &'static str },
    #[error("operator {operator} takes {expected} value(s), got {got}")]
    ValueCount {
        operator: Operator,
        expected: usize,
        got: usize,
    },
    #[error("operator {operator} needs an integer value, got {value:?}")]
    NotAnInteger { operator: Operator, value: String },
}

/// One `(key, operator, values)` term of a selector.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Requirement {
    key: String,
    operator: Operator,
    values: Vec<String>,
}

impl Requirement {
    pub fn new<I, S>(
        key: &str,
        operator: Operator,
        values: I,
    ) -> Result<Self, RequirementError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        validate_key(key)?;
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.len() != operator.arity() {
            return Err(RequirementError::ValueCount {
                operator,
                expected: operator.arity(),
                got: values.len(),
            });
        }
        for value in &values {
            match operator {
                Operator::LessThan => {
                    if value.parse::<i64>().is_err() {
                        return Err(RequirementError::NotAnInteger {
                            operator,
                            value: value.clone(),
                        });
                    }
                }
                _ => validate_value(value)?,
            }
        }
        Ok(Self {
            key: key.to_string(),
            operator,
            values,
        })
    }

    pub fn exists(key: &str) -> Result<Self, RequirementError> {
        Self::new(key, Operator::Exists, std::iter::empty::<String>())
    }

    pub fn equals(key: &str, value: &str) -> Result<Self, RequirementError> {
        Self::new(key, Operator::Equals, [value])
    }

    pub fn less_than(key: &str, bound: i64) -> Result<Self, RequirementError> {
        Self::new(key, Operator::LessThan, [bound.to_string()])
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let Some(have) = labels.get(&self.key) else {
            return false;
        };
        match self.operator {
            Operator::Exists => true,
            Operator::Equals => self.values.first() == Some(have),
            Operator::LessThan => {
                let bound =
                    self.values.first().and_then(|b| b.parse::<i64>().ok());
                match (have.parse::<i64>(), bound) {
                    (Ok(have), Some(bound)) => have < bound,
                    _ => false,
                }
            }
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.operator, self.values.first()) {
            (Operator::Equals, Some(v)) => write!(f, "{}={}", self.key, v),
            (Operator::LessThan, Some(v)) => write!(f, "{}<{}", self.key, v),
            _ => write!(f, "{}", self.key),
        }
    }
}

/// Conjunction of requirements. Kept sorted, so two selectors built from
/// the same requirements in any order compare and render equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Selector {
    requirements: Vec<Requirement>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, requirement: Requirement) -> Self {
        let at = self
            .requirements
            .binary_search(&requirement)
            .unwrap_or_else(|i| i);
        self.requirements.insert(at, requirement);
        self
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// An empty selector matches every label set.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }

    pub fn list_params(&self) -> ListParams {
        ListParams::default().labels(&self.to_string())
    }
}

impl FromIterator<Requirement> for Selector {
    fn from_iter<T: IntoIterator<Item = Requirement>>(iter: T) -> Self {
        iter.into_iter().fold(Selector::new(), Selector::add)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, r) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", r)?;
        }
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<(), RequirementError> {
    let invalid = |reason| RequirementError::InvalidKey {
        key: key.to_string(),
        reason,
    };
    let name = match key.split_once('/') {
        Some((prefix, name)) => {
            check_dns_subdomain(prefix).map_err(invalid)?;
            name
        }
        None => key,
    };
    if name.is_empty() {
        return Err(invalid("name part must be non-empty"));
    }
    if name.len() > LABEL_NAME_MAX_LEN {
        return Err(invalid("name part must be no more than 63 characters"));
    }
    check_label_chars(name).map_err(invalid)
}

fn validate_value(value: &str) -> Result<(), RequirementError> {
    if value.is_empty() {
        return Ok(());
    }
    let invalid = |reason| RequirementError::InvalidValue {
        value: value.to_string(),
        reason,
    };
    if value.len() > LABEL_VALUE_MAX_LEN {
        return Err(invalid("must be no more than 63 characters"));
    }
    check_label_chars(value).map_err(invalid)
}

fn check_label_chars(s: &str) -> Result<(), &'static str> {
    let bytes = s.as_bytes();
    let alnum_ends = bytes.first().is_some_and(u8::is_ascii_alphanumeric)
        && bytes.last().is_some_and(u8::is_ascii_alphanumeric);
    if !alnum_ends {
        return Err("must begin and end with an alphanumeric character");
    }
    if !bytes
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
    {
        return Err("may only contain alphanumerics, '-', '_' or '.'");
    }
    Ok(())
}

fn check_dns_subdomain(prefix: &str) -> Result<(), &'static str> {
    if prefix.is_empty() {
        return Err("prefix part must be non-empty");
    }
    if prefix.len() > DNS1123_SUBDOMAIN_MAX_LEN {
        return Err("prefix part must be no more than 253 characters");
    }
    let lower_alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    for segment in prefix.split('.') {
        let bytes = segment.as_bytes();
        let ok = bytes.first().is_some_and(lower_alnum)
            && bytes.last().is_some_and(lower_alnum)
            && bytes.iter().all(|b| lower_alnum(b) || *b == b'-');
        if !ok {
            return Err("prefix part must be a lowercase DNS-1123 subdomain");
        }
    }
    Ok(())
}
