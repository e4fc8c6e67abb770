//! Test-case catalog: declarative registry of expected outcomes
//!
//! The catalog is static external input. It is loaded once at startup from a
//! TOML file with two name lists and is immutable afterwards. A name may
//! appear in exactly one list.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// What a test program is expected to do when run under instrumentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedOutcome {
    /// Runs to completion, exit 0, output identical to the reference build.
    Safe,
    /// Triggers a violation: nonzero exit plus a diagnostic on stderr.
    Fault,
}

#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub expected: ExpectedOutcome,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    fault: Vec<String>,
    #[serde(default)]
    safe: Vec<String>,
}

/// The loaded catalog, ordered fault tests first, then safe tests.
#[derive(Debug)]
pub struct Catalog {
    cases: Vec<TestCase>,
    names: HashSet<String>,
}

impl Catalog {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let raw: RawCatalog = toml::from_str(&text)
            .with_context(|| format!("failed to parse catalog {}", path.display()))?;
        Self::from_lists(raw.fault, raw.safe)
    }

    /// Build a catalog from the two name lists, enforcing disjoint membership.
    pub fn from_lists(fault: Vec<String>, safe: Vec<String>) -> Result<Self> {
        let mut names = HashSet::new();
        let mut cases = Vec::with_capacity(fault.len() + safe.len());
        for (list, expected) in [
            (fault, ExpectedOutcome::Fault),
            (safe, ExpectedOutcome::Safe),
        ] {
            for name in list {
                if !names.insert(name.clone()) {
                    bail!("test {name} is registered more than once in the catalog");
                }
                cases.push(TestCase { name, expected });
            }
        }
        Ok(Self { cases, names })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// All cases in execution order: fault tests first, then safe tests.
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Names of `.c` sources under `src_dir` that are not registered here.
    ///
    /// This is the coverage audit: an unclassified test is worth a warning,
    /// never a hard failure.
    pub fn unregistered_sources(&self, src_dir: &Path) -> Result<Vec<String>> {
        let mut unknown = Vec::new();
        let entries = fs::read_dir(src_dir)
            .with_context(|| format!("failed to list test sources in {}", src_dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "c") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !self.contains(stem) {
                        unknown.push(stem.to_string());
                    }
                }
            }
        }
        unknown.sort();
        Ok(unknown)
    }
}
