//! Registry of predefined CMaps.
//!
//! The programs are compiled into the binary. On first use every program is
//! parsed, every `usecmap` chain is flattened, and the result is kept for
//! the life of the process behind a [`OnceLock`]. Lookups hand out
//! `Arc<CMap>`; the registry itself is never mutated afterwards.
//!
//! The CJK programs carry only the common CID ranges of their collections
//! (ASCII, kana, frequent punctuation), not the full Adobe tables. Under
//! them `to_cid` returns 0 both for codes that are truly unmapped and for
//! valid codes whose range is missing here; `UniJIS-UCS2-H` gives 0 for
//! U+4E2D. Text for such codes is still available from
//! [`code_to_unicode`].

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use pdfcmap_core::{CMap, CMapError, CharCode};

use crate::cjk_encoding::intrinsic_encoding;
use crate::inherit::{CMapSource, resolve_usecmap};
use crate::parser::CMapParser;

macro_rules! programs {
    ($($name:literal),* $(,)?) => {
        &[$(($name, include_str!(concat!("../cmaps/", $name)))),*]
    };
}

/// Compiled-in CMap programs, by name.
static PROGRAMS: &[(&str, &str)] = programs![
    "Identity-H",
    "Identity-V",
    "UniGB-UCS2-H",
    "UniGB-UCS2-V",
    "UniGB-UTF16-H",
    "UniGB-UTF16-V",
    "UniJIS-UCS2-H",
    "UniJIS-UCS2-V",
    "UniJIS-UTF16-H",
    "UniJIS-UTF16-V",
    "UniCNS-UCS2-H",
    "UniCNS-UCS2-V",
    "UniCNS-UTF16-H",
    "UniCNS-UTF16-V",
    "UniKS-UCS2-H",
    "UniKS-UCS2-V",
    "UniKS-UTF16-H",
    "UniKS-UTF16-V",
    "GBK-EUC-H",
    "GBK-EUC-V",
    "ETen-B5-H",
    "ETen-B5-V",
    "90ms-RKSJ-H",
    "90ms-RKSJ-V",
    "KSCms-UHC-H",
    "KSCms-UHC-V",
];

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The set of flattened predefined CMaps.
#[derive(Debug)]
pub struct Registry {
    cmaps: HashMap<String, Arc<CMap>>,
}

impl Registry {
    /// The process-wide registry, built on first use.
    pub fn global() -> &'static Registry {
        REGISTRY.get_or_init(Registry::build)
    }

    fn build() -> Registry {
        let parser = CMapParser::new();
        let mut raw: HashMap<String, Arc<CMap>> = HashMap::with_capacity(PROGRAMS.len());
        for &(name, program) in PROGRAMS {
            match parser.parse(program.as_bytes()) {
                Ok(cmap) => {
                    raw.insert(name.to_string(), Arc::new(cmap));
                }
                Err(e) => tracing::error!(cmap = name, error = %e, "predefined CMap failed to load"),
            }
        }

        let mut cmaps = HashMap::with_capacity(raw.len());
        for (name, cmap) in &raw {
            match resolve_usecmap(CMap::clone(cmap), &raw) {
                Ok(flat) => {
                    cmaps.insert(name.clone(), Arc::new(flat));
                }
                Err(e) => tracing::error!(cmap = %name, error = %e, "predefined CMap failed to load"),
            }
        }
        Registry { cmaps }
    }

    /// Look up a predefined CMap.
    pub fn get(&self, name: &str) -> Option<Arc<CMap>> {
        self.cmaps.get(name).cloned()
    }

    /// Names of all loaded CMaps, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.cmaps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl CMapSource for Registry {
    fn cmap(&self, name: &str) -> Result<Arc<CMap>, CMapError> {
        self.get(name)
            .ok_or_else(|| CMapError::UnknownPredefined(name.to_string()))
    }
}

/// Fetch a predefined CMap by name.
///
/// # Errors
///
/// Returns [`CMapError::UnknownPredefined`] if `name` is not in the registry.
pub fn predefined_cmap(name: &str) -> Result<Arc<CMap>, CMapError> {
    Registry::global().cmap(name)
}

/// Whether `name` is a predefined CMap.
pub fn is_predefined(name: &str) -> bool {
    Registry::global().cmaps.contains_key(name)
}

/// Names of all predefined CMaps, sorted.
pub fn predefined_names() -> Vec<&'static str> {
    Registry::global().names()
}

/// Unicode text implied by a code of the predefined CMap `cmap_name`.
///
/// `Uni*` CMaps take UTF-16BE codes; legacy CJK CMaps take codes in their
/// national encoding. Returns `None` for CMaps whose codes carry no
/// character meaning (such as Identity-H) and for undecodable codes.
pub fn code_to_unicode(cmap_name: &str, code: CharCode, len: usize) -> Option<String> {
    intrinsic_encoding(cmap_name)?.decode(code, len)
}
