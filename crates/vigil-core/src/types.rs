//! Target type descriptions and type-name resolution.
//!
//! Cast specifiers in a prompt name their target type either with a
//! primitive abbreviation (`ul`, `pc`, ...) or with a full parenthesized
//! type name resolved by the [`TypeResolver`] collaborator. Resolution is
//! expected to be slow for real targets, so results flow through an
//! explicit [`TypeCache`] that the frontend clears when the debug target's
//! objects are reloaded, never a process-wide singleton.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Shape of a resolved target type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind
{
    /// `void`
    Void,
    /// Character type; `signed` distinguishes `signed char`/`unsigned char`.
    Char
    {
        /// Signedness of the character type.
        signed: bool,
    },
    /// Integer type of a given bit width.
    Int
    {
        /// Signedness.
        signed: bool,
        /// Width in bits.
        bits: u32,
    },
    /// Floating point type of a given bit width.
    Float
    {
        /// Width in bits.
        bits: u32,
    },
    /// Pointer to another type.
    Pointer(Box<TypeHandle>),
    /// Function type (only produced for the `func` abbreviation).
    Function,
    /// A named type the resolver knows only by name (struct, enum, ...).
    Named,
}

/// A resolved target type: display name plus enough structure to retype
/// runtime values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHandle
{
    /// Canonical display name, e.g. `"unsigned long"` or `"char*"`.
    pub name: String,
    /// Structural kind.
    pub kind: TypeKind,
}

impl TypeHandle
{
    /// Build a handle from a name and kind.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self
    {
        Self { name: name.into(), kind }
    }

    /// Wrap this type in one level of pointer indirection.
    pub fn pointer_to(self) -> Self
    {
        let name = format!("{}*", self.name);
        TypeHandle { name, kind: TypeKind::Pointer(Box::new(self)) }
    }

    /// Whether values of this type read as character data when decoded.
    pub fn is_char_like(&self) -> bool
    {
        match &self.kind {
            TypeKind::Char { .. } => true,
            TypeKind::Pointer(inner) => inner.is_char_like(),
            _ => false,
        }
    }
}

/// Primitive abbreviation table used by cast specifiers.
///
/// Each leading `p` on an abbreviation adds one level of pointer
/// indirection on top of the base type listed here.
static KNOWN_TYPES: Lazy<HashMap<&'static str, TypeHandle>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("v", TypeHandle::new("void", TypeKind::Void));
    m.insert("c", TypeHandle::new("char", TypeKind::Char { signed: true }));
    m.insert("sc", TypeHandle::new("signed char", TypeKind::Char { signed: true }));
    m.insert("uc", TypeHandle::new("unsigned char", TypeKind::Char { signed: false }));
    m.insert("s", TypeHandle::new("short", TypeKind::Int { signed: true, bits: 16 }));
    m.insert("us", TypeHandle::new("unsigned short", TypeKind::Int { signed: false, bits: 16 }));
    m.insert("i", TypeHandle::new("int", TypeKind::Int { signed: true, bits: 32 }));
    m.insert("ui", TypeHandle::new("unsigned int", TypeKind::Int { signed: false, bits: 32 }));
    m.insert("l", TypeHandle::new("long", TypeKind::Int { signed: true, bits: 64 }));
    m.insert("ul", TypeHandle::new("unsigned long", TypeKind::Int { signed: false, bits: 64 }));
    m.insert("ll", TypeHandle::new("long long", TypeKind::Int { signed: true, bits: 64 }));
    m.insert("ull", TypeHandle::new("unsigned long long", TypeKind::Int { signed: false, bits: 64 }));
    m.insert("f", TypeHandle::new("float", TypeKind::Float { bits: 32 }));
    m.insert("d", TypeHandle::new("double", TypeKind::Float { bits: 64 }));
    m.insert("ld", TypeHandle::new("long double", TypeKind::Float { bits: 64 }));
    m.insert("func", TypeHandle::new("void()", TypeKind::Function));
    m
});

/// Look up a primitive abbreviation (without pointer prefixes).
pub fn known_type(abbrev: &str) -> Option<TypeHandle>
{
    KNOWN_TYPES.get(abbrev).cloned()
}

/// Abbreviations whose non-runtime cast lands in the string-like group.
pub fn is_string_abbrev(abbrev: &str) -> bool
{
    matches!(abbrev, "c" | "sc" | "uc" | "pc" | "psc" | "puc")
}

/// Abbreviations whose non-runtime cast lands in the integer-like group.
pub fn is_int_abbrev(abbrev: &str) -> bool
{
    matches!(abbrev, "s" | "us" | "i" | "ui" | "l" | "ul" | "ll" | "ull")
}

/// Abbreviations whose non-runtime cast lands in the float-like group.
pub fn is_float_abbrev(abbrev: &str) -> bool
{
    matches!(abbrev, "f" | "d" | "ld")
}

/// Resolves full type names against the debug target.
///
/// Implementations answer `None` for unknown names rather than erroring;
/// a cast against an unresolvable type is the caller's failure to report.
pub trait TypeResolver
{
    /// Resolve a type by its full display name (e.g. `"unsigned long"`).
    fn resolve(&self, name: &str) -> Option<TypeHandle>;
}

/// Explicit cache in front of a [`TypeResolver`].
///
/// Caches both hits and misses. The owner must call [`TypeCache::invalidate`]
/// when the target's objects are reloaded; cached handles are stale after
/// that point.
#[derive(Default)]
pub struct TypeCache
{
    entries: HashMap<String, Option<TypeHandle>>,
}

impl TypeCache
{
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self
    {
        Self { entries: HashMap::new() }
    }

    /// Resolve through the cache.
    pub fn resolve_with(&mut self, resolver: &dyn TypeResolver, name: &str) -> Option<TypeHandle>
    {
        if let Some(cached) = self.entries.get(name) {
            return cached.clone();
        }
        let resolved = resolver.resolve(name);
        tracing::trace!(type_name = name, hit = resolved.is_some(), "type lookup");
        self.entries.insert(name.to_string(), resolved.clone());
        resolved
    }

    /// Drop every cached entry. Call on a "target objects reloaded"
    /// notification.
    pub fn invalidate(&mut self)
    {
        tracing::debug!(entries = self.entries.len(), "type cache invalidated");
        self.entries.clear();
    }

    /// Number of cached names (hits and misses).
    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }
}

/// A resolver that recognizes the primitive table plus pointers to any
/// recognized type (`"char*"`, `"unsigned long**"`, ...).
///
/// Real targets replace this with a resolver backed by debug info; the
/// snapshot context and the tests use it directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimitiveResolver;

impl TypeResolver for PrimitiveResolver
{
    fn resolve(&self, name: &str) -> Option<TypeHandle>
    {
        let trimmed = name.trim();
        if let Some(base) = trimmed.strip_suffix('*') {
            return self.resolve(base).map(TypeHandle::pointer_to);
        }
        KNOWN_TYPES.values().find(|t| t.name == trimmed).cloned()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_known_type_lookup()
    {
        let ul = known_type("ul").unwrap();
        assert_eq!(ul.name, "unsigned long");
        assert_eq!(ul.kind, TypeKind::Int { signed: false, bits: 64 });
        assert!(known_type("zz").is_none());
    }

    #[test]
    fn test_pointer_wrapping()
    {
        let pc = known_type("c").unwrap().pointer_to();
        assert_eq!(pc.name, "char*");
        assert!(pc.is_char_like());
    }

    #[test]
    fn test_cache_hits_and_invalidation()
    {
        struct Counting(std::cell::Cell<u32>);
        impl TypeResolver for Counting
        {
            fn resolve(&self, name: &str) -> Option<TypeHandle>
            {
                self.0.set(self.0.get() + 1);
                PrimitiveResolver.resolve(name)
            }
        }

        let resolver = Counting(std::cell::Cell::new(0));
        let mut cache = TypeCache::new();
        assert!(cache.resolve_with(&resolver, "unsigned long").is_some());
        assert!(cache.resolve_with(&resolver, "unsigned long").is_some());
        assert_eq!(resolver.0.get(), 1);

        // Misses are cached too.
        assert!(cache.resolve_with(&resolver, "no_such_type").is_none());
        assert!(cache.resolve_with(&resolver, "no_such_type").is_none());
        assert_eq!(resolver.0.get(), 2);

        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.resolve_with(&resolver, "unsigned long").is_some());
        assert_eq!(resolver.0.get(), 3);
    }

    #[test]
    fn test_primitive_resolver_pointers()
    {
        let t = PrimitiveResolver.resolve("unsigned long*").unwrap();
        assert_eq!(t.name, "unsigned long*");
        assert!(matches!(t.kind, TypeKind::Pointer(_)));
    }
}
