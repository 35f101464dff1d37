//! `usecmap` chain resolution.
//!
//! A CMap may name a parent with `/Parent usecmap`, and the parent may name
//! its own parent. The chain is walked iteratively, then applied
//! deepest-ancestor-first so each descendant's own tables replace the
//! inherited ones (see [`CMap::inherit`]).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use pdfcmap_core::{CMap, CMapError};

/// Where `usecmap` parents are looked up by name.
pub trait CMapSource {
    /// Fetch the CMap called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CMapError::UnknownPredefined`] if no CMap has that name.
    fn cmap(&self, name: &str) -> Result<Arc<CMap>, CMapError>;
}

impl CMapSource for HashMap<String, Arc<CMap>> {
    fn cmap(&self, name: &str) -> Result<Arc<CMap>, CMapError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| CMapError::UnknownPredefined(name.to_string()))
    }
}

/// Flatten `cmap` over the ancestors named by its `usecmap` chain.
///
/// Returns `cmap` unchanged if it has no parent.
///
/// Only names fetched from `source` are tracked. `cmap` itself is not a
/// source entry, so an embedded CMap may reuse the name of one of its
/// ancestors (for example `/CMapName /UniJIS-UCS2-H def` over
/// `/UniJIS-UCS2-V usecmap`).
///
/// # Errors
///
/// Returns [`CMapError::CircularInheritance`] if the chain of source
/// entries revisits a name, or the source's error for a missing ancestor.
pub fn resolve_usecmap(cmap: CMap, source: &dyn CMapSource) -> Result<CMap, CMapError> {
    let mut visited: HashSet<String> = HashSet::new();

    let mut ancestors: Vec<Arc<CMap>> = Vec::new();
    let mut next = cmap.usecmap().map(str::to_string);
    while let Some(name) = next {
        if !visited.insert(name.clone()) {
            return Err(CMapError::CircularInheritance(name));
        }
        let parent = source.cmap(&name)?;
        next = parent.usecmap().map(str::to_string);
        ancestors.push(parent);
    }

    let Some((deepest, rest)) = ancestors.split_last() else {
        return Ok(cmap);
    };
    let mut inherited = CMap::clone(deepest);
    for ancestor in rest.iter().rev() {
        inherited = ancestor.inherit(&inherited);
    }
    Ok(cmap.inherit(&inherited))
}
