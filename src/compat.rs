//! Client version compatibility gate.
//!
//! A client version is accepted only as an exact `MAJOR.MINOR.PATCH` of
//! plain decimal digits. Anything else is an error, never a `false`.

use std::sync::Arc;

use serde_json::Value;

use crate::error::VersionError;

/// Parsed `MAJOR.MINOR.PATCH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Parse a strict version string.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        if input.trim() != input {
            return Err(VersionError::Whitespace(input.to_string()));
        }

        let malformed = || VersionError::Malformed(input.to_string());
        let segments: Vec<&str> = input.split('.').collect();
        let [major, minor, patch] = segments.as_slice() else {
            return Err(malformed());
        };

        let number = |segment: &str| -> Result<u64, VersionError> {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            segment.parse().map_err(|_| malformed())
        };

        Ok(Self {
            major: number(major)?,
            minor: number(minor)?,
            patch: number(patch)?,
        })
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Final verdict for a version already known to be on the `0.1` line.
pub trait PatchPolicy: Send + Sync {
    fn is_compatible(&self, version: &Version) -> bool;
}

impl<F> PatchPolicy for F
where
    F: Fn(&Version) -> bool + Send + Sync,
{
    fn is_compatible(&self, version: &Version) -> bool {
        self(version)
    }
}

/// Default policy: every patch release of the `0.1` line is compatible.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyPatch;

impl PatchPolicy for AnyPatch {
    fn is_compatible(&self, _version: &Version) -> bool {
        true
    }
}

/// Decides whether a client version can talk to this engine.
#[derive(Clone)]
pub struct CompatibilityGate {
    policy: Arc<dyn PatchPolicy>,
}

impl Default for CompatibilityGate {
    fn default() -> Self {
        Self::new(Arc::new(AnyPatch))
    }
}

impl CompatibilityGate {
    pub fn new(policy: Arc<dyn PatchPolicy>) -> Self {
        Self { policy }
    }

    /// Check a version string.
    pub fn check(&self, version: &str) -> Result<bool, VersionError> {
        let version = Version::parse(version)?;
        if version.major != 0 || version.minor != 1 {
            return Ok(false);
        }
        Ok(self.policy.is_compatible(&version))
    }

    /// Check an arbitrary JSON value, rejecting non-strings.
    pub fn check_value(&self, value: &Value) -> Result<bool, VersionError> {
        match value {
            Value::String(s) => self.check(s),
            other => Err(VersionError::NotAString(json_type_name(other))),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
