//! String interning for identifier names.
//!
//! Identifiers repeat constantly in real programs; the scope tree and the
//! checker compare names by `Atom` equality instead of string comparison.

use rustc_hash::FxHashMap;

/// An interned string handle. Copy, 4 bytes, compares by identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(u32);

impl Atom {
    /// Sentinel for "no atom" (synthetic or missing names).
    pub const NONE: Atom = Atom(u32::MAX);

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interner mapping strings to stable `Atom` handles.
#[derive(Debug, Default)]
pub struct Interner {
    map: FxHashMap<String, Atom>,
    strings: Vec<String>,
}

impl Interner {
    pub fn new() -> Interner {
        Interner::default()
    }

    /// Intern a string, returning its atom. Idempotent.
    pub fn intern(&mut self, text: &str) -> Atom {
        if let Some(&atom) = self.map.get(text) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        self.strings.push(text.to_string());
        self.map.insert(text.to_string(), atom);
        atom
    }

    /// Look up an already-interned string without inserting.
    pub fn get(&self, text: &str) -> Option<Atom> {
        self.map.get(text).copied()
    }

    /// Resolve an atom back to its text.
    ///
    /// Panics on `Atom::NONE` or a handle from another interner.
    pub fn resolve(&self, atom: Atom) -> &str {
        &self.strings[atom.index()]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
