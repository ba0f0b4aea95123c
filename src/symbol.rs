use lasso::{Spur, ThreadedRodeo};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// Thread-safe store interning the names used by string atoms and variable tokens.
///
/// Guarantees:
/// - Same string always produces the same key
/// - Different strings always produce different keys
/// - A key can be resolved back to the original string
pub struct SymbolStore {
    rodeo: ThreadedRodeo,
}

impl SymbolStore {
    /// Create a new empty symbol store.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Intern a string, returning its key.
    pub fn intern(&self, name: &str) -> Spur {
        self.rodeo.get_or_intern(name)
    }

    /// Resolve a key back to its string.
    /// Returns None if the key was not created by this store.
    pub fn resolve(&self, id: Spur) -> Option<&str> {
        self.rodeo.try_resolve(&id)
    }

    /// Check if a string has already been interned.
    pub fn contains(&self, name: &str) -> bool {
        self.rodeo.contains(name)
    }

    /// Number of distinct interned strings.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for SymbolStore {
    fn default() -> Self {
        Self::new()
    }
}

static SYMBOLS: OnceLock<SymbolStore> = OnceLock::new();

/// The process-wide symbol store backing every [`Symbol`].
pub fn symbols() -> &'static SymbolStore {
    SYMBOLS.get_or_init(SymbolStore::new)
}

/// An interned string.
///
/// Equality uses the interned key. Ordering and hashing go through the text,
/// so neither depends on the order in which strings were interned.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Symbol(Spur);

impl Symbol {
    pub fn intern(name: &str) -> Self {
        Symbol(symbols().intern(name))
    }

    pub fn as_str(self) -> &'static str {
        // Keys are only ever minted by the global store.
        symbols().resolve(self.0).unwrap_or_default()
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::intern(name)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_string_same_symbol() {
        assert_eq!(Symbol::intern("inc"), Symbol::intern("inc"));
        assert_ne!(Symbol::intern("inc"), Symbol::intern("double"));
    }

    #[test]
    fn symbol_resolves_to_its_name() {
        assert_eq!(Symbol::intern("Cons").as_str(), "Cons");
    }

    #[test]
    fn ordering_is_lexical_not_interning_order() {
        let z = Symbol::intern("zz-interned-first");
        let a = Symbol::intern("aa-interned-second");
        assert!(a < z);
    }

    #[test]
    fn hash_is_the_hash_of_the_text() {
        fn fx<T: Hash + ?Sized>(value: &T) -> u64 {
            let mut hasher = rustc_hash::FxHasher::default();
            value.hash(&mut hasher);
            hasher.finish()
        }

        // interned in reverse lexical order
        let late = Symbol::intern("hash-text-zz");
        let early = Symbol::intern("hash-text-aa");
        assert_eq!(fx(&late), fx("hash-text-zz"));
        assert_eq!(fx(&early), fx("hash-text-aa"));
    }

    #[test]
    fn local_store_is_independent() {
        let store = SymbolStore::new();
        assert!(store.is_empty());
        let id = store.intern("Nil");
        assert!(store.contains("Nil"));
        assert_eq!(store.resolve(id), Some("Nil"));
        assert_eq!(store.len(), 1);
    }
}
