//! Hostnames discovered from resource annotations
//!
//! A [`Hostname`] holds only the subdomain part of a managed name. The
//! configured top-level domain is appended when the record store is queried.

use crate::error::{Error, Result};
use std::fmt;

/// A subdomain label managed under the process-wide TLD
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hostname(String);

impl Hostname {
    /// Create a hostname from a subdomain label (e.g. `"app"` or `"api.staging"`)
    ///
    /// The label is validated against RFC 1035 rules.
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        validate_domain_name(&label)?;
        Ok(Self(label))
    }

    /// Parse a single annotation entry relative to `tld`
    ///
    /// The entry may be the bare subdomain (`app`) or the fully-qualified
    /// name (`app.example.com`, optionally with a trailing dot). Returns an
    /// error for the bare TLD itself or for names that fail validation.
    pub fn parse_relative(entry: &str, tld: &str) -> Result<Self> {
        let entry = entry.trim().trim_end_matches('.').to_ascii_lowercase();
        let tld = tld.trim().trim_end_matches('.').to_ascii_lowercase();

        if entry.is_empty() {
            return Err(Error::invalid_input("Hostname cannot be empty"));
        }

        if entry == tld {
            return Err(Error::invalid_input(format!(
                "Hostname '{}' is the bare TLD, not a subdomain",
                entry
            )));
        }

        let label = match entry.strip_suffix(&format!(".{}", tld)) {
            Some(label) => label.to_string(),
            None => entry,
        };

        Self::new(label)
    }

    /// Parse an annotation value that may list several hostnames
    ///
    /// Entries are comma separated. Invalid entries are returned in the
    /// second vector so the caller can log them.
    pub fn parse_annotation(value: &str, tld: &str) -> (Vec<Self>, Vec<Error>) {
        let mut hostnames = Vec::new();
        let mut rejected = Vec::new();

        for entry in value.split(',').filter(|e| !e.trim().is_empty()) {
            match Self::parse_relative(entry, tld) {
                Ok(hostname) => hostnames.push(hostname),
                Err(e) => rejected.push(e),
            }
        }

        (hostnames, rejected)
    }

    /// The subdomain label, as passed to the record store on create/update
    pub fn label(&self) -> &str {
        &self.0
    }

    /// The fully-qualified name under `tld`, as used for record lookups
    pub fn fqdn(&self, tld: &str) -> String {
        format!("{}.{}", self.0, tld.trim_end_matches('.'))
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate that a string is a valid domain name
///
/// This implements basic DNS domain name validation per RFC 1035.
/// It's not comprehensive but catches common errors.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::invalid_input("Domain name cannot be empty"));
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        return Err(Error::invalid_input(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::invalid_input(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(Error::invalid_input(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        // Check for valid characters (alphanumeric and hyphen, no wildcards)
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::invalid_input(format!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::invalid_input(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}
