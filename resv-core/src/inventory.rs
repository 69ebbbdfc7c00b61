use regex::Regex;

use crate::error::{ResvError, ResvResult};
use crate::types::VmRecord;

/// Name-based filter over an inventory snapshot.
///
/// The user pattern must match the entire display name: `web` does not
/// select `web1`, while `web.*` does.
#[derive(Debug, Clone)]
pub struct NameFilter {
    regex: Regex,
}

impl NameFilter {
    pub fn new(pattern: &str) -> ResvResult<Self> {
        let anchored = format!(r"\A(?:{})\z", pattern);
        let regex = Regex::new(&anchored).map_err(|source| ResvError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Retain the matching records of one snapshot. An empty result is
    /// valid, not an error.
    pub fn filter_vms(&self, vms: Vec<VmRecord>) -> Vec<VmRecord> {
        vms.into_iter().filter(|vm| self.matches(&vm.name)).collect()
    }
}
