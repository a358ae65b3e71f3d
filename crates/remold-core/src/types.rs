//! Type flyweight cache
//!
//! Type descriptors are interned by structural signature: two descriptors
//! with equal content get the same [`TypeId`], so type comparison on the hot
//! path is an integer compare. Descriptors reference other types by id, which
//! makes a class whose field has the class's own type an ordinary entry with
//! no cyclic ownership.
//!
//! A [`TypeCache`] is an explicit object. Callers construct one per batch and
//! share it (usually behind an `Arc`) between all parses of that batch.
//! Entries live as long as the cache; dropping the cache is the way to bound
//! its growth.
//!
//! Interning is safe from many threads: the check-then-insert sequence runs
//! under the intern index's entry lock, so identical signatures interned
//! concurrently always receive one id.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// The universal root class
pub const OBJECT: &str = "java.lang.Object";

/// Handle of an interned type descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Built-in value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Void,
    String,
    Null,
}

impl Primitive {
    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Double => "double",
            Primitive::Float => "float",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Short => "short",
            Primitive::Void => "void",
            Primitive::String => "String",
            Primitive::Null => "null",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "char" => Primitive::Char,
            "double" => Primitive::Double,
            "float" => Primitive::Float,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "short" => Primitive::Short,
            "void" => Primitive::Void,
            "String" | "java.lang.String" => Primitive::String,
            "null" => Primitive::Null,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
}

/// A declared member signature
///
/// The member's type is recorded by name, not by id, so that a class can
/// mention itself before it has been interned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub fqn: String,
    pub kind: ClassKind,
    pub members: Vec<Member>,
    pub supertype: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
}

impl ClassType {
    pub fn new(fqn: impl Into<String>) -> Self {
        Self {
            fqn: fqn.into(),
            kind: ClassKind::Class,
            members: Vec::new(),
            supertype: None,
            interfaces: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: ClassKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_member(mut self, name: impl Into<String>, signature: impl Into<String>) -> Self {
        self.members.push(Member {
            name: name.into(),
            signature: signature.into(),
        });
        self
    }

    pub fn with_supertype(mut self, supertype: Option<TypeId>) -> Self {
        self.supertype = supertype;
        self
    }

    pub fn with_interface(mut self, interface: TypeId) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// A structural type signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Primitive(Primitive),
    Array {
        elem: TypeId,
    },
    Class(ClassType),
    Method {
        declaring: TypeId,
        name: String,
        params: Vec<TypeId>,
        ret: Option<TypeId>,
    },
    /// A variable; fields carry their declaring class as owner
    Variable {
        name: String,
        owner: Option<TypeId>,
        ty: Option<TypeId>,
    },
}

impl Type {
    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            Type::Class(class) => Some(class),
            _ => None,
        }
    }
}

/// Leading lower-case-initial segments of a dotted name, excluding the last
///
/// `com.foo.Foo.Bar` is in package `com.foo`, `A.C` in the unnamed package.
pub fn package_of(fqn: &str) -> &str {
    let mut end = 0;
    let segments: Vec<&str> = fqn.split('.').collect();
    for segment in &segments[..segments.len().saturating_sub(1)] {
        if !segment.starts_with(|c: char| c.is_ascii_lowercase()) {
            break;
        }
        end += segment.len() + 1;
    }
    if end == 0 { "" } else { &fqn[..end - 1] }
}

/// Process-local, deduplicating store of type descriptors
pub struct TypeCache {
    index: DashMap<Type, TypeId>,
    arena: RwLock<Vec<Arc<Type>>>,
    classes: DashMap<String, Vec<TypeId>>,
    object: TypeId,
}

impl Default for TypeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCache {
    pub fn new() -> Self {
        let mut cache = Self {
            index: DashMap::new(),
            arena: RwLock::new(Vec::new()),
            classes: DashMap::new(),
            object: TypeId(0),
        };
        cache.object = cache.intern(Type::Class(ClassType::new(OBJECT)));
        cache
    }

    /// Return the handle of an identical descriptor, allocating one if needed
    pub fn intern(&self, ty: Type) -> TypeId {
        if let Some(id) = self.index.get(&ty) {
            return *id;
        }
        match self.index.entry(ty) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let ty = Arc::new(entry.key().clone());
                let id = {
                    let mut arena = self.arena.write();
                    arena.push(Arc::clone(&ty));
                    TypeId((arena.len() - 1) as u32)
                };
                if let Type::Class(class) = ty.as_ref() {
                    self.classes.entry(class.fqn.clone()).or_default().push(id);
                }
                trace!("Interned {} as {}", self.describe_type(&ty), id);
                entry.insert(id);
                id
            }
        }
    }

    /// Handle of an identical descriptor, without interning
    pub fn lookup(&self, ty: &Type) -> Option<TypeId> {
        self.index.get(ty).map(|id| *id)
    }

    pub fn get(&self, id: TypeId) -> Option<Arc<Type>> {
        self.arena.read().get(id.0 as usize).cloned()
    }

    pub fn class(&self, id: TypeId) -> Option<ClassType> {
        self.get(id).and_then(|ty| ty.as_class().cloned())
    }

    /// Most recently interned class with this name, or an empty shell for it
    pub fn build_class(&self, fqn: &str) -> TypeId {
        if let Some(ids) = self.classes.get(fqn)
            && let Some(id) = ids.last()
        {
            return *id;
        }
        self.intern(Type::Class(ClassType::new(fqn)))
    }

    pub fn object(&self) -> TypeId {
        self.object
    }

    pub fn primitive(&self, primitive: Primitive) -> TypeId {
        self.intern(Type::Primitive(primitive))
    }

    pub fn array(&self, elem: TypeId) -> TypeId {
        self.intern(Type::Array { elem })
    }

    /// Fully qualified name of a class, or of an array's element class
    pub fn fqn(&self, id: TypeId) -> Option<String> {
        match self.get(id)?.as_ref() {
            Type::Class(class) => Some(class.fqn.clone()),
            Type::Array { elem } => self.fqn(*elem),
            _ => None,
        }
    }

    pub fn package_name(&self, id: TypeId) -> String {
        self.fqn(id)
            .map(|fqn| package_of(&fqn).to_string())
            .unwrap_or_default()
    }

    /// Name with the package stripped (`a.Outer.Inner` gives `Outer.Inner`)
    pub fn class_name(&self, id: TypeId) -> Option<String> {
        let fqn = self.fqn(id)?;
        let package = package_of(&fqn);
        Some(if package.is_empty() {
            fqn
        } else {
            fqn[package.len() + 1..].to_string()
        })
    }

    /// Whether a value of type `from` can be used where `to` is expected
    pub fn is_assignable_from(&self, to: TypeId, from: TypeId) -> bool {
        if to == from {
            return true;
        }
        let (Some(target), Some(source)) = (self.get(to), self.get(from)) else {
            return false;
        };
        match (target.as_ref(), source.as_ref()) {
            (Type::Class(target), _) if target.fqn == OBJECT => true,
            (Type::Class(target), Type::Class(_)) => self.extends(from, &target.fqn),
            (Type::Array { elem: target }, Type::Array { elem: source }) => {
                self.is_assignable_from(*target, *source)
            }
            (Type::Primitive(a), Type::Primitive(b)) => a == b,
            _ => false,
        }
    }

    fn extends(&self, class: TypeId, fqn: &str) -> bool {
        let mut seen = HashSet::new();
        let mut pending = vec![class];
        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(current) = self.class(id) else {
                continue;
            };
            if current.fqn == fqn {
                return true;
            }
            pending.extend(current.supertype);
            pending.extend(current.interfaces.iter().copied());
        }
        false
    }

    /// Human-readable rendering of a type
    pub fn describe(&self, id: TypeId) -> String {
        match self.get(id) {
            Some(ty) => self.describe_type(&ty),
            None => format!("<unknown {id}>"),
        }
    }

    fn describe_type(&self, ty: &Type) -> String {
        match ty {
            Type::Primitive(p) => p.keyword().to_string(),
            Type::Array { elem } => format!("{}[]", self.describe(*elem)),
            Type::Class(class) => class.fqn.clone(),
            Type::Method {
                declaring,
                name,
                params,
                ret,
            } => {
                let params: Vec<String> = params.iter().map(|p| self.describe(*p)).collect();
                let ret = ret.map_or_else(|| "void".to_string(), |r| self.describe(r));
                format!(
                    "{}#{}({}) -> {}",
                    self.describe(*declaring),
                    name,
                    params.join(", "),
                    ret
                )
            }
            Type::Variable { name, owner, ty } => {
                let ty = ty.map_or_else(|| "?".to_string(), |t| self.describe(t));
                match owner {
                    Some(owner) => format!("{}.{}: {}", self.describe(*owner), name, ty),
                    None => format!("{name}: {ty}"),
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.arena.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for TypeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeCache")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name_derivation() {
        assert_eq!(package_of("com.foo.Foo.Bar"), "com.foo");
        assert_eq!(package_of("com.foo.Foo"), "com.foo");
        assert_eq!(package_of("a.A1"), "a");
        assert_eq!(package_of("a.A.B"), "a");
        assert_eq!(package_of("A.C"), "");
        assert_eq!(package_of("Foo"), "");
    }

    #[test]
    fn test_identical_signatures_share_handle() {
        let cache = TypeCache::new();
        let a = cache.intern(Type::Class(ClassType::new("a.A").with_member("n", "int")));
        let b = cache.intern(Type::Class(ClassType::new("a.A").with_member("n", "int")));
        assert_eq!(a, b);
        assert_eq!(cache.lookup(&Type::Class(ClassType::new("a.A").with_member("n", "int"))), Some(a));
    }

    #[test]
    fn test_changed_members_give_distinct_handle() {
        let cache = TypeCache::new();
        let a = cache.intern(Type::Class(ClassType::new("a.A").with_member("n", "int")));
        let b = cache.intern(Type::Class(ClassType::new("a.A").with_member("m", "int")));
        assert_ne!(a, b);
        assert_eq!(cache.build_class("a.A"), b);
    }

    #[test]
    fn test_changed_hierarchy_gives_distinct_handle() {
        let cache = TypeCache::new();
        let base = cache.build_class("a.Base");
        let plain = cache.intern(Type::Class(ClassType::new("a.A")));
        let derived = cache.intern(Type::Class(ClassType::new("a.A").with_supertype(Some(base))));
        assert_ne!(plain, derived);
    }

    #[test]
    fn test_assignability() {
        let cache = TypeCache::new();
        let a = cache.build_class("a.A");
        let b = cache.intern(Type::Class(ClassType::new("a.B").with_supertype(Some(a))));
        let c = cache.build_class("a.C");

        assert!(cache.is_assignable_from(a, b));
        assert!(!cache.is_assignable_from(b, a));
        assert!(!cache.is_assignable_from(a, c));

        let (a_arr, b_arr, c_arr) = (cache.array(a), cache.array(b), cache.array(c));
        assert!(cache.is_assignable_from(a_arr, b_arr));
        assert!(!cache.is_assignable_from(b_arr, a_arr));
        assert!(!cache.is_assignable_from(a_arr, c_arr));
        assert!(!cache.is_assignable_from(a_arr, cache.array(b_arr)));

        let object = cache.object();
        assert!(cache.is_assignable_from(object, a));
        assert!(cache.is_assignable_from(object, b_arr));
        assert!(!cache.is_assignable_from(a, object));
    }

    #[test]
    fn test_interface_assignability() {
        let cache = TypeCache::new();
        let i = cache.intern(Type::Class(ClassType::new("a.I").with_kind(ClassKind::Interface)));
        let a = cache.intern(Type::Class(ClassType::new("a.A").with_interface(i)));
        let b = cache.intern(Type::Class(ClassType::new("a.B").with_supertype(Some(a))));
        assert!(cache.is_assignable_from(i, b));
        assert!(!cache.is_assignable_from(b, i));
    }

    #[test]
    fn test_self_referential_field() {
        let cache = TypeCache::new();
        let a = cache.intern(Type::Class(ClassType::new("a.A").with_member("a", "a.A")));
        let field = cache.intern(Type::Variable {
            name: "a".into(),
            owner: Some(a),
            ty: Some(cache.build_class("a.A")),
        });
        match cache.get(field).unwrap().as_ref() {
            Type::Variable { ty, .. } => assert_eq!(*ty, Some(a)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_describe() {
        let cache = TypeCache::new();
        let a = cache.build_class("a.Outer.Inner");
        assert_eq!(cache.describe(cache.array(a)), "a.Outer.Inner[]");
        assert_eq!(cache.class_name(a).as_deref(), Some("Outer.Inner"));
        assert_eq!(cache.package_name(a), "a");
        assert_eq!(cache.describe(cache.primitive(Primitive::Int)), "int");
    }
}
