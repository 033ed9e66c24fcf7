//! Parent cycle detection.

use std::collections::{HashMap, HashSet};

use crate::error::{PageStoreError, Result};
use crate::page::Page;

/// Verify that following effective parents from every page terminates.
///
/// A chain ends at an empty parent or at a parent that is not in the list
/// (such a page is a root of the tree). `home` always counts as a root.
/// Fails with [`PageStoreError::CycleDetected`] naming the first page whose
/// chain revisits a path.
pub fn assert_no_cycles(pages: &[Page]) -> Result<()> {
    let parents: HashMap<&str, &str> = pages
        .iter()
        .map(|page| (page.path.as_str(), page.effective_parent()))
        .collect();

    for page in pages {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(page.path.as_str());

        let mut current = page.path.as_str();
        while let Some(&parent) = parents.get(current) {
            if parent.is_empty() || !parents.contains_key(parent) {
                break;
            }
            if !visited.insert(parent) {
                return Err(PageStoreError::CycleDetected {
                    path: page.path.clone(),
                });
            }
            current = parent;
        }
    }

    Ok(())
}
