//! Type attribution
//!
//! Attribution runs over a whole batch of parsed units so that a class in one
//! unit can type the fields and methods used from another. It has two passes:
//!
//! 1. Every class declaration in the batch is collected and described by its
//!    members, supertype and interfaces, all as resolved names. The classes
//!    are then interned supertypes first, so each descriptor can point at its
//!    supertype's handle.
//! 2. Each unit is walked with a scope-aware visitor that attaches types to
//!    declarations, type names and expressions.
//!
//! An identifier naming a variable carries the variable descriptor, like the
//! name selected by a field access; the expression it forms has the
//! descriptor's value type. Bare uses of inherited fields get the descriptor
//! of the field in the class that declares it.
//!
//! Names that cannot be resolved are left untyped rather than reported.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use remold_core::types::OBJECT;
use remold_core::{
    Binding, ClassKind, ClassType, Cursor, Node, NodeId, Primitive, Result, SourceFile, Type,
    TypeCache, TypeId, Visitor, visit,
};
use tracing::{debug, trace};

use crate::scope::{is_variable_use, opens_scope};
use crate::syntax::{Java, JavaKind};
use crate::view::{AstNode, ClassDecl, CompilationUnit, VariableDecls, name_text, simple_name, var_name};

/// A resolved type name, before interning
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TypeName {
    Primitive(Primitive),
    Class(String),
    Array(Box<TypeName>),
}

impl TypeName {
    /// Text recorded in member signatures
    pub(crate) fn signature(&self) -> String {
        match self {
            TypeName::Primitive(p) => p.keyword().to_string(),
            TypeName::Class(fqn) => fqn.clone(),
            TypeName::Array(elem) => format!("{}[]", elem.signature()),
        }
    }

    pub(crate) fn parse(signature: &str) -> Option<Self> {
        if signature.is_empty() || signature == UNRESOLVED {
            return None;
        }
        if let Some(elem) = signature.strip_suffix("[]") {
            return Some(TypeName::Array(Box::new(Self::parse(elem)?)));
        }
        Some(match Primitive::from_keyword(signature) {
            Some(p) => TypeName::Primitive(p),
            None => TypeName::Class(signature.to_string()),
        })
    }
}

/// Signature text of a type that could not be resolved
const UNRESOLVED: &str = "?";

/// How simple and dotted type names resolve inside one unit
#[derive(Debug, Clone, Default)]
pub(crate) struct UnitNames {
    package: String,
    imports: Vec<String>,
}

impl UnitNames {
    pub(crate) fn of(root: &Node<Java>) -> Self {
        let Some(unit) = CompilationUnit::cast(root) else {
            return Self::default();
        };
        Self {
            package: unit.package_name(),
            imports: unit
                .imports()
                .filter(|i| !i.is_static())
                .map(|i| i.name())
                .collect(),
        }
    }

    pub(crate) fn qualify(&self, name: &str) -> String {
        if self.package.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", self.package)
        }
    }

    /// Fully qualified name of a class as written in this unit
    ///
    /// `enclosing` lists the classes around the use site, outermost first.
    pub(crate) fn resolve_class(
        &self,
        text: &str,
        enclosing: &[String],
        known: &HashSet<String>,
    ) -> Option<String> {
        match text.split_once('.') {
            Some((first, rest)) => Some(match self.resolve_simple(first, enclosing, known) {
                Some(outer) => format!("{outer}.{rest}"),
                None => text.to_string(),
            }),
            None => self.resolve_simple(text, enclosing, known),
        }
    }

    fn resolve_simple(&self, name: &str, enclosing: &[String], known: &HashSet<String>) -> Option<String> {
        for outer in enclosing.iter().rev() {
            if simple_name(outer) == name {
                return Some(outer.clone());
            }
            let nested = format!("{outer}.{name}");
            if known.contains(&nested) {
                return Some(nested);
            }
        }
        if let Some(import) = self
            .imports
            .iter()
            .find(|i| !i.ends_with(".*") && simple_name(i) == name)
        {
            return Some(import.clone());
        }
        let local = self.qualify(name);
        if known.contains(&local) {
            return Some(local);
        }
        let on_demand = self
            .imports
            .iter()
            .filter_map(|i| i.strip_suffix(".*"))
            .map(|package| format!("{package}.{name}"))
            .find(|candidate| known.contains(candidate));
        if on_demand.is_some() {
            return on_demand;
        }
        (name == simple_name(OBJECT)).then(|| OBJECT.to_string())
    }

    pub(crate) fn type_name(
        &self,
        node: &Node<Java>,
        enclosing: &[String],
        known: &HashSet<String>,
    ) -> Option<TypeName> {
        match node.kind() {
            JavaKind::Keyword => node
                .text()
                .and_then(Primitive::from_keyword)
                .map(TypeName::Primitive),
            JavaKind::ArrayType => Some(TypeName::Array(Box::new(self.type_name(
                node.child(0)?,
                enclosing,
                known,
            )?))),
            JavaKind::ParameterizedType => self.type_name(node.child(0)?, enclosing, known),
            JavaKind::Ident | JavaKind::FieldAccess => {
                let text = name_text(node)?;
                if let Some(primitive) = Primitive::from_keyword(&text) {
                    return Some(TypeName::Primitive(primitive));
                }
                self.resolve_class(&text, enclosing, known)
                    .map(TypeName::Class)
            }
            _ => None,
        }
    }
}

/// A class declaration described by resolved names
#[derive(Debug, Clone)]
struct ClassInfo {
    kind: ClassKind,
    members: Vec<(String, String)>,
    supertype: Option<String>,
    interfaces: Vec<String>,
}

/// Classes declared in a batch and their interned handles
pub(crate) struct Batch<'c> {
    pub cache: &'c TypeCache,
    pub known: HashSet<String>,
    ids: HashMap<String, TypeId>,
}

impl<'c> Batch<'c> {
    /// A batch that knows no declared classes
    pub(crate) fn empty(cache: &'c TypeCache) -> Self {
        Self {
            cache,
            known: HashSet::new(),
            ids: HashMap::new(),
        }
    }

    pub(crate) fn class_id(&self, fqn: &str) -> TypeId {
        match self.ids.get(fqn) {
            Some(id) => *id,
            None => self.cache.build_class(fqn),
        }
    }

    pub(crate) fn intern_name(&self, name: &TypeName) -> TypeId {
        match name {
            TypeName::Primitive(p) => self.cache.primitive(*p),
            TypeName::Class(fqn) => self.class_id(fqn),
            TypeName::Array(elem) => self.cache.array(self.intern_name(elem)),
        }
    }

    pub(crate) fn signature_type(&self, signature: &str) -> Option<TypeId> {
        TypeName::parse(signature).map(|name| self.intern_name(&name))
    }

    /// Declaring class and signature of a field or method, searching supertypes
    pub(crate) fn find_member(&self, class: TypeId, name: &str, method: bool) -> Option<(TypeId, String)> {
        let mut seen = HashSet::new();
        let mut pending = vec![class];
        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(current) = self.cache.class(id) else {
                continue;
            };
            let found = current
                .members
                .iter()
                .find(|m| m.name == name && m.signature.starts_with('(') == method);
            if let Some(member) = found {
                return Some((id, member.signature.clone()));
            }
            pending.extend(current.interfaces.iter().rev().copied());
            pending.extend(current.supertype);
        }
        None
    }

    fn intern_class(
        &mut self,
        fqn: &str,
        infos: &HashMap<String, ClassInfo>,
        visiting: &mut HashSet<String>,
    ) -> TypeId {
        if let Some(id) = self.ids.get(fqn) {
            return *id;
        }
        let Some(info) = infos.get(fqn) else {
            return self.cache.build_class(fqn);
        };
        if !visiting.insert(fqn.to_string()) {
            // cyclic inheritance; the declaration is interned by the outer call
            return self.cache.build_class(fqn);
        }
        let supertype = info
            .supertype
            .as_deref()
            .map(|s| self.intern_class(s, infos, visiting));
        let mut class = ClassType::new(fqn)
            .with_kind(info.kind)
            .with_supertype(supertype);
        for interface in &info.interfaces {
            let id = self.intern_class(interface, infos, visiting);
            class = class.with_interface(id);
        }
        for (name, signature) in &info.members {
            class = class.with_member(name, signature);
        }
        let id = self.cache.intern(Type::Class(class));
        self.ids.insert(fqn.to_string(), id);
        id
    }
}

/// Attribute a batch of units against `cache`
pub(crate) fn attribute_batch(
    cache: &TypeCache,
    units: Vec<SourceFile<Java>>,
) -> Result<Vec<SourceFile<Java>>> {
    let names: Vec<UnitNames> = units.iter().map(|u| UnitNames::of(&u.root)).collect();

    let mut declared = Vec::new();
    for (unit, source) in units.iter().enumerate() {
        if let Some(root) = CompilationUnit::cast(&source.root) {
            for class in root.classes() {
                collect(unit, &names[unit], class, &[], &mut declared);
            }
        }
    }
    let mut batch = Batch::empty(cache);
    batch.known = declared.iter().map(|d| d.fqn.clone()).collect();

    let infos: HashMap<String, ClassInfo> = declared
        .iter()
        .map(|d| (d.fqn.clone(), describe(&batch, &names[d.unit], d)))
        .collect();
    let mut visiting = HashSet::new();
    for declaration in &declared {
        batch.intern_class(&declaration.fqn, &infos, &mut visiting);
    }
    debug!("Interned {} declared classes", batch.ids.len());

    let batch = &batch;
    units
        .into_par_iter()
        .zip(names.into_par_iter())
        .map(|(source, names)| {
            let mut attributor = Attributor::new(batch, names);
            let root = visit(&mut attributor, &source.root)?;
            trace!("Attributed {}", source.path.display());
            Ok(SourceFile::new(source.path, root))
        })
        .collect()
}

struct Declared<'a> {
    fqn: String,
    unit: usize,
    decl: ClassDecl<'a>,
    /// The class itself and the classes around it, outermost first
    enclosing: Vec<String>,
}

fn collect<'a>(
    unit: usize,
    names: &UnitNames,
    class: ClassDecl<'a>,
    outer: &[String],
    out: &mut Vec<Declared<'a>>,
) {
    let fqn = match outer.last() {
        Some(o) => format!("{o}.{}", class.name()),
        None => names.qualify(class.name()),
    };
    let mut enclosing = outer.to_vec();
    enclosing.push(fqn.clone());
    for nested in class.nested() {
        collect(unit, names, nested, &enclosing, out);
    }
    out.push(Declared {
        fqn,
        unit,
        decl: class,
        enclosing,
    });
}

fn describe(batch: &Batch<'_>, names: &UnitNames, declared: &Declared<'_>) -> ClassInfo {
    let resolve = |node: &Node<Java>| names.type_name(node, &declared.enclosing, &batch.known);
    let signature = |node: Option<&Node<Java>>| {
        node.and_then(resolve)
            .map_or_else(|| UNRESOLVED.to_string(), |t| t.signature())
    };
    let class = declared.decl;

    let mut members = Vec::new();
    for field in class.fields() {
        let ty = signature(field.type_expr());
        members.extend(field.names().map(|name| (name.to_string(), ty.clone())));
    }
    for method in class.methods() {
        let params: Vec<String> = method.params().map(|p| signature(p.type_expr())).collect();
        let (name, ret) = match method.return_type() {
            Some(ret) => (method.name().to_string(), signature(Some(ret))),
            None => ("<init>".to_string(), Primitive::Void.keyword().to_string()),
        };
        members.push((name, format!("({}) -> {ret}", params.join(", "))));
    }

    let supertypes = |clause: Option<&Node<Java>>| -> Vec<String> {
        clause
            .into_iter()
            .flat_map(|c| c.children().iter().skip(1))
            .filter(|c| c.kind() != JavaKind::Comma)
            .filter_map(|c| match resolve(c) {
                Some(TypeName::Class(fqn)) => Some(fqn),
                _ => None,
            })
            .collect()
    };
    let extends = supertypes(class.extends());
    let implements = supertypes(class.implements());
    let (kind, supertype, interfaces) = if class.is_interface() {
        let interfaces = extends.into_iter().chain(implements).collect();
        (ClassKind::Interface, None, interfaces)
    } else {
        (ClassKind::Class, extends.into_iter().next(), implements)
    };
    ClassInfo {
        kind,
        members,
        supertype,
        interfaces,
    }
}

/// Whether a type expression sits where a type is expected
fn in_type_slot(cursor: &Cursor<Java>) -> bool {
    let node = cursor.node();
    let (Some(parent), Some(index)) = (cursor.parent_node(), cursor.index_in_parent()) else {
        return false;
    };
    if !node.kind().is_type() {
        return false;
    }
    match parent.kind() {
        JavaKind::VariableDecls => {
            parent
                .children()
                .iter()
                .position(|c| c.kind() != JavaKind::Modifiers)
                == Some(index)
        }
        JavaKind::MethodDecl => parent
            .child(index + 1)
            .is_some_and(|next| next.kind() == JavaKind::Ident),
        JavaKind::NewClass => index == 1,
        JavaKind::Extends | JavaKind::Implements | JavaKind::Throws | JavaKind::TypeArgs => index > 0,
        JavaKind::ParameterizedType | JavaKind::ArrayType => index == 0,
        _ => false,
    }
}

fn literal_type(text: &str) -> Primitive {
    let suffix = text.chars().last().unwrap_or_default();
    match text {
        "true" | "false" => Primitive::Boolean,
        "null" => Primitive::Null,
        t if t.starts_with('"') => Primitive::String,
        t if t.starts_with('\'') => Primitive::Char,
        _ if matches!(suffix, 'l' | 'L') => Primitive::Long,
        t if t.starts_with("0x") || t.starts_with("0X") => Primitive::Int,
        _ if matches!(suffix, 'f' | 'F') => Primitive::Float,
        t if matches!(suffix, 'd' | 'D') || t.contains(['.', 'e', 'E']) => Primitive::Double,
        _ => Primitive::Int,
    }
}

/// Attaches types to one unit
struct Attributor<'b> {
    batch: &'b Batch<'b>,
    names: UnitNames,
    enclosing: Vec<String>,
    classes: Vec<TypeId>,
    variables: HashMap<NodeId, TypeId>,
}

impl<'b> Attributor<'b> {
    fn new(batch: &'b Batch<'b>, names: UnitNames) -> Self {
        Self {
            batch,
            names,
            enclosing: Vec::new(),
            classes: Vec::new(),
            variables: HashMap::new(),
        }
    }

    fn cache(&self) -> &TypeCache {
        self.batch.cache
    }

    fn resolve(&self, node: &Node<Java>) -> Option<TypeId> {
        self.names
            .type_name(node, &self.enclosing, &self.batch.known)
            .map(|name| self.batch.intern_name(&name))
    }

    /// Type of the value `node` evaluates to
    fn expr_type(&self, node: &Node<Java>) -> Option<TypeId> {
        let ty = node.ty()?;
        match self.cache().get(ty)?.as_ref() {
            Type::Variable { ty, .. } => *ty,
            _ => Some(ty),
        }
    }

    /// Descriptor of field `name` inherited by the enclosing classes, innermost first
    fn inherited_field(&self, name: &str) -> Option<TypeId> {
        let (owner, signature) = self
            .classes
            .iter()
            .rev()
            .find_map(|class| self.batch.find_member(*class, name, false))?;
        Some(self.cache().intern(Type::Variable {
            name: name.to_string(),
            owner: Some(owner),
            ty: self.batch.signature_type(&signature),
        }))
    }

    fn declare(&mut self, scope: &Cursor<Java>, decls: &Node<Java>, var: &Node<Java>, field: bool) {
        let Some(name) = var_name(var) else {
            return;
        };
        let id = match self.variables.get(&var.id()) {
            Some(id) => *id,
            None => {
                let ty = VariableDecls::cast(decls)
                    .and_then(|d| d.type_expr())
                    .and_then(|t| self.resolve(t));
                let owner = if field { self.classes.last().copied() } else { None };
                let id = self.cache().intern(Type::Variable {
                    name: name.to_string(),
                    owner,
                    ty,
                });
                self.variables.insert(var.id(), id);
                id
            }
        };
        scope.declare(
            name,
            Binding {
                decl: var.id(),
                ty: Some(id),
            },
        );
    }

    fn ident_type(&self, node: &Node<Java>, cursor: &Cursor<Java>) -> Option<TypeId> {
        let text = node.text()?;
        if is_variable_use(cursor) {
            let variable = match cursor.resolve(text) {
                Some(binding) => binding.ty,
                None => self.inherited_field(text),
            };
            if variable.is_some() {
                return variable;
            }
        }
        // a class named as the target of a member access
        let target_of_access = cursor.parent_node().is_some_and(|p| p.kind() == JavaKind::FieldAccess)
            && cursor.index_in_parent() == Some(0);
        if target_of_access {
            return self
                .names
                .resolve_class(text, &self.enclosing, &self.batch.known)
                .map(|fqn| self.batch.class_id(&fqn));
        }
        None
    }

    fn field_access(&self, node: Node<Java>) -> Result<Node<Java>> {
        let (Some(target), Some(name)) = (node.child(0), node.child(2)) else {
            return Ok(node);
        };
        let (Some(target_ty), Some(member)) = (self.expr_type(target), name.text()) else {
            return Ok(node);
        };
        let fqn = match self.cache().get(target_ty).as_deref() {
            Some(Type::Array { .. }) if member == "length" => {
                let length = self.cache().primitive(Primitive::Int);
                return Ok(node.with_type(Some(length)));
            }
            Some(Type::Class(class)) => class.fqn.clone(),
            _ => return Ok(node),
        };
        let Some((owner, signature)) = self.batch.find_member(target_ty, member, false) else {
            let nested = format!("{fqn}.{member}");
            if self.batch.known.contains(&nested) {
                return Ok(node.with_type(Some(self.batch.class_id(&nested))));
            }
            return Ok(node);
        };
        let value = self.batch.signature_type(&signature);
        let variable = self.cache().intern(Type::Variable {
            name: member.to_string(),
            owner: Some(owner),
            ty: value,
        });
        let name = name.with_type(Some(variable));
        Ok(node.with_child(2, name)?.with_type(value))
    }

    fn invocation_type(&self, node: &Node<Java>) -> Option<TypeId> {
        let callee = node.child(0)?;
        let (owners, name) = match callee.kind() {
            JavaKind::FieldAccess => (vec![self.expr_type(callee.child(0)?)?], callee.child(2)?.text()?),
            _ => (self.classes.iter().rev().copied().collect(), callee.text()?),
        };
        let (_, signature) = owners
            .into_iter()
            .find_map(|owner| self.batch.find_member(owner, name, true))?;
        let (_, ret) = signature.rsplit_once(" -> ")?;
        if ret == Primitive::Void.keyword() {
            return None;
        }
        self.batch.signature_type(ret)
    }

    fn method_type(&self, node: &Node<Java>) -> Option<TypeId> {
        let method = crate::view::MethodDecl::cast(node)?;
        let declaring = self.classes.last().copied()?;
        let params = method
            .params()
            .filter_map(|p| p.type_expr().and_then(Node::ty))
            .collect();
        let ret = method
            .return_type()
            .filter(|t| t.text() != Some(Primitive::Void.keyword()))
            .and_then(Node::ty);
        let name = if method.is_constructor() {
            "<init>".to_string()
        } else {
            method.name().to_string()
        };
        Some(self.cache().intern(Type::Method {
            declaring,
            name,
            params,
            ret,
        }))
    }

    fn binary_type(&self, node: &Node<Java>) -> Option<TypeId> {
        let op = node.child(1)?.text()?;
        let left = self.expr_type(node.child(0)?);
        let right = self.expr_type(node.child(2)?);
        let string = self.cache().primitive(Primitive::String);
        match op {
            "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" => {
                Some(self.cache().primitive(Primitive::Boolean))
            }
            "+" if left == Some(string) || right == Some(string) => Some(string),
            _ => left,
        }
    }
}

impl Visitor<Java> for Attributor<'_> {
    fn enter(&mut self, cursor: &Cursor<Java>) -> Result<()> {
        let node = cursor.node();
        match node.kind() {
            JavaKind::ClassDecl => {
                let name = ClassDecl::cast(node).map(|c| c.name()).unwrap_or_default();
                let fqn = match self.enclosing.last() {
                    Some(outer) => format!("{outer}.{name}"),
                    None => self.names.qualify(name),
                };
                self.classes.push(self.batch.class_id(&fqn));
                self.enclosing.push(fqn);
            }
            JavaKind::ClassBody => {
                for decls in node.children_of(JavaKind::VariableDecls) {
                    for var in decls.children_of(JavaKind::NamedVar) {
                        self.declare(cursor, decls, var, true);
                    }
                }
            }
            JavaKind::NamedVar => {
                // fields were declared with their class body
                let field = cursor
                    .parent()
                    .and_then(|p| p.parent_node().map(|n| n.kind() == JavaKind::ClassBody))
                    .unwrap_or(false);
                if !field
                    && let Some(decls) = cursor.parent_node().cloned()
                    && let Some(scope) = cursor.enclosing(opens_scope)
                {
                    self.declare(&scope, &decls, node, false);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn visit(&mut self, node: Node<Java>, cursor: &Cursor<Java>) -> Result<Node<Java>> {
        let ty = match node.kind() {
            JavaKind::ClassDecl => {
                self.enclosing.pop();
                self.classes.pop()
            }
            JavaKind::NamedVar => self.variables.get(&node.id()).copied(),
            JavaKind::MethodDecl => self.method_type(&node),
            kind if kind.is_type() && in_type_slot(cursor) => self.resolve(&node),
            JavaKind::Ident => self.ident_type(&node, cursor),
            JavaKind::Keyword => match node.text() {
                Some("this") => self.classes.last().copied(),
                Some("super") => self
                    .classes
                    .last()
                    .and_then(|c| self.cache().class(*c))
                    .and_then(|c| c.supertype),
                _ => None,
            },
            JavaKind::Literal => node
                .text()
                .map(|t| self.cache().primitive(literal_type(t))),
            JavaKind::FieldAccess => return self.field_access(node),
            JavaKind::MethodInvocation => self.invocation_type(&node),
            JavaKind::NewClass => node.child(1).and_then(Node::ty),
            JavaKind::Parens => node.child(1).and_then(|c| self.expr_type(c)),
            JavaKind::Assign | JavaKind::AssignOp | JavaKind::Postfix => {
                node.child(0).and_then(|c| self.expr_type(c))
            }
            JavaKind::Prefix => match node.child(0).and_then(Node::text) {
                Some("!") => Some(self.cache().primitive(Primitive::Boolean)),
                _ => node.child(1).and_then(|c| self.expr_type(c)),
            },
            JavaKind::Binary => self.binary_type(&node),
            JavaKind::ArrayAccess => match node
                .child(0)
                .and_then(|c| self.expr_type(c))
                .and_then(|t| self.cache().get(t))
                .as_deref()
            {
                Some(Type::Array { elem }) => Some(*elem),
                _ => None,
            },
            _ => None,
        };
        Ok(match ty {
            Some(ty) => node.with_type(Some(ty)),
            None => node,
        })
    }
}
