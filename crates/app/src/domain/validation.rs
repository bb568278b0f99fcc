//! Field-level input checks shared by the domains.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

/// Offending fields mapped to a human-readable message.
///
/// The first failure recorded for a field wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(BTreeMap<&'static str, String>);

impl Violations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &'static str, message: impl Into<String>) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut violations = Self::new();
        violations.add(field, message);
        violations
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// # Errors
    ///
    /// Returns `self` when any field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;

        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }

            write!(f, "{field}: {message}")?;
            first = false;
        }

        Ok(())
    }
}

/// Whether every element of `values` is distinct.
#[must_use]
pub fn all_unique<T: Ord>(values: &[T]) -> bool {
    let mut seen: Vec<&T> = values.iter().collect();
    seen.sort_unstable();
    seen.windows(2).all(|pair| pair[0] != pair[1])
}

/// Loose `local@domain.tld` shape check; deliverability is the mailer's problem.
#[must_use]
pub fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}
