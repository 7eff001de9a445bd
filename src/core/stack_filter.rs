//! Removal of uninteresting frames from error reports

use super::error_report::ErrorReport;
use std::collections::{BTreeSet, HashSet};
use std::ops::Bound;
use std::sync::Arc;

/// Origins stripped when no explicit list is configured
pub const DEFAULT_UNWANTED_PREFIXES: &[&str] = &[
    "alloc::", "axum::", "core::", "futures::", "hyper::", "rayon::", "std::", "tokio::", "tower::",
];

/// Strips frames whose origin starts with one of a set of prefixes
///
/// Prefixes are plain strings; ending them with a path separator (`std::`)
/// avoids matching unrelated crates such as `stdx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFilter {
    unwanted: BTreeSet<String>,
}

impl StackFilter {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            unwanted: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// Parse a comma-separated list, e.g. `"std::, tokio::"`
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(',').map(str::trim))
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.unwanted.iter().map(String::as_str)
    }

    /// Whether a frame origin starts with one of the unwanted prefixes
    ///
    /// Any matching prefix sorts at or before `origin`, so the floor entry
    /// is the first candidate. When the floor is not a prefix, no prefix
    /// longer than its common part with `origin` can match, and the search
    /// continues below that common part.
    pub fn is_unwanted(&self, origin: &str) -> bool {
        let mut bound = origin;
        loop {
            let floor = match self
                .unwanted
                .range::<str, _>((Bound::Unbounded, Bound::Included(bound)))
                .next_back()
            {
                Some(floor) => floor,
                None => return false,
            };
            if origin.starts_with(floor.as_str()) {
                return true;
            }
            let mut common = floor
                .bytes()
                .zip(origin.bytes())
                .take_while(|(a, b)| a == b)
                .count();
            while !origin.is_char_boundary(common) {
                common -= 1;
            }
            if common == 0 {
                return false;
            }
            bound = &origin[..common];
        }
    }

    /// Filter the frames of `report` and of every cause behind it
    ///
    /// Each distinct report is processed once, so cyclic cause chains
    /// terminate. Returns the number of reports processed.
    pub fn strip(&self, report: &Arc<ErrorReport>) -> usize {
        let mut seen: HashSet<*const ErrorReport> = HashSet::new();
        let mut current = Some(Arc::clone(report));

        while let Some(report) = current {
            if !seen.insert(Arc::as_ptr(&report)) {
                break;
            }
            report.retain_frames(|frame| !self.is_unwanted(&frame.origin));
            current = report.cause();
        }
        seen.len()
    }
}

impl Default for StackFilter {
    fn default() -> Self {
        Self::new(DEFAULT_UNWANTED_PREFIXES.iter().copied())
    }
}
