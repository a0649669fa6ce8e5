//! Type descriptors: the symbols rules select from.
//!
//! A [`TypeDescriptor`] is an immutable description of one type in a loaded
//! module. Rules never mutate descriptors; they are shared as [`TypeRef`]
//! (`Arc<TypeDescriptor>`) and collected into ordered [`TypeSet`]s.
//!
//! Every structural property except `name` is optional on input. A property
//! that is absent for a given type (no base type, no attributes, ...) is
//! treated by predicates as "does not match", never as an error.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Shared, immutable handle to a type descriptor.
pub type TypeRef = Arc<TypeDescriptor>;

/// Ordered collection of types. Order is the module's order.
pub type TypeSet = Vec<TypeRef>;

/// Kind of type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
}

impl TypeKind {
    /// Parse a kind from its lowercase name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "class" => Some(TypeKind::Class),
            "interface" => Some(TypeKind::Interface),
            "struct" => Some(TypeKind::Struct),
            "enum" => Some(TypeKind::Enum),
            "delegate" => Some(TypeKind::Delegate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Struct => "struct",
            TypeKind::Enum => "enum",
            TypeKind::Delegate => "delegate",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access level of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible outside the module.
    #[default]
    Public,
    /// Visible within the module only.
    Internal,
    /// Visible to derived types.
    Protected,
    /// Visible to the declaring type only (nested types).
    Private,
}

impl Visibility {
    /// Parse a visibility from its lowercase name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "internal" => Some(Visibility::Internal),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }

    /// Lowercase name, as accepted by [`Visibility::parse`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Internal => "internal",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of one type in a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Simple type name (e.g., `OrderService`).
    pub name: String,
    /// Dotted namespace (empty for the global namespace).
    #[serde(default)]
    pub namespace: String,
    /// Declaration kind.
    #[serde(default)]
    pub kind: TypeKind,
    /// Access level.
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_sealed: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_static: bool,
    /// Declared inside another type.
    #[serde(default)]
    pub is_nested: bool,
    /// Generic parameter names, empty for non-generic types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generic_parameters: Vec<String>,
    /// Full name of the direct base type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
    /// Full names of every base type up the chain, nearest first.
    ///
    /// When empty, only `base_type` is consulted for inheritance checks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base_types: Vec<String>,
    /// Full names of implemented interfaces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    /// Full names of applied attributes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
    /// Full names of types this type references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl TypeDescriptor {
    /// Create a public class descriptor with no structural properties.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TypeDescriptor {
            name: name.into(),
            namespace: namespace.into(),
            kind: TypeKind::default(),
            visibility: Visibility::default(),
            is_sealed: false,
            is_abstract: false,
            is_static: false,
            is_nested: false,
            generic_parameters: Vec::new(),
            base_type: None,
            base_types: Vec::new(),
            interfaces: Vec::new(),
            attributes: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn sealed(mut self) -> Self {
        self.is_sealed = true;
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn static_type(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn nested(mut self) -> Self {
        self.is_nested = true;
        self
    }

    pub fn with_generic_parameter(mut self, param: impl Into<String>) -> Self {
        self.generic_parameters.push(param.into());
        self
    }

    pub fn with_base_type(mut self, base: impl Into<String>) -> Self {
        self.base_type = Some(base.into());
        self
    }

    pub fn with_interface(mut self, iface: impl Into<String>) -> Self {
        self.interfaces.push(iface.into());
        self
    }

    pub fn with_attribute(mut self, attr: impl Into<String>) -> Self {
        self.attributes.push(attr.into());
        self
    }

    pub fn with_dependency(mut self, dep: impl Into<String>) -> Self {
        self.dependencies.push(dep.into());
        self
    }

    /// Namespace-qualified name (`App.Services.OrderService`).
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_parameters.is_empty()
    }

    /// Returns true if `base` is the direct base type or appears in the base chain.
    pub fn inherits(&self, base: &str) -> bool {
        self.base_type.as_deref() == Some(base) || self.base_types.iter().any(|b| b == base)
    }

    pub fn implements(&self, iface: &str) -> bool {
        self.interfaces.iter().any(|i| i == iface)
    }

    /// Attribute presence. Matches the full name or the short name, with or
    /// without an `Attribute` suffix (`Serializable` finds `System.SerializableAttribute`).
    pub fn has_attribute(&self, attr: &str) -> bool {
        let wanted = attr.strip_suffix("Attribute").unwrap_or(attr);
        self.attributes.iter().any(|a| {
            let short = a.rsplit('.').next().unwrap_or(a);
            let short = short.strip_suffix("Attribute").unwrap_or(short);
            a == attr || short == wanted
        })
    }

    /// Returns true if the namespace equals `prefix` or is nested under it.
    pub fn resides_in(&self, prefix: &str) -> bool {
        self.namespace == prefix
            || self
                .namespace
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

/// Wrap descriptors into a [`TypeSet`].
pub fn type_set<I>(types: I) -> TypeSet
where
    I: IntoIterator<Item = TypeDescriptor>,
{
    types.into_iter().map(Arc::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_with_namespace() {
        let ty = TypeDescriptor::new("App.Services", "OrderService");
        assert_eq!(ty.full_name(), "App.Services.OrderService");
    }

    #[test]
    fn test_full_name_global_namespace() {
        let ty = TypeDescriptor::new("", "Program");
        assert_eq!(ty.full_name(), "Program");
    }

    #[test]
    fn test_resides_in_exact_and_nested() {
        let ty = TypeDescriptor::new("App.Services.Orders", "OrderService");
        assert!(ty.resides_in("App.Services.Orders"));
        assert!(ty.resides_in("App.Services"));
        assert!(ty.resides_in("App"));
        assert!(!ty.resides_in("App.Serv"));
        assert!(!ty.resides_in("App.Services.OrdersExtra"));
    }

    #[test]
    fn test_has_attribute_short_and_full_names() {
        let ty = TypeDescriptor::new("App", "Dto").with_attribute("System.SerializableAttribute");
        assert!(ty.has_attribute("System.SerializableAttribute"));
        assert!(ty.has_attribute("Serializable"));
        assert!(ty.has_attribute("SerializableAttribute"));
        assert!(!ty.has_attribute("Obsolete"));
    }

    #[test]
    fn test_inherits_uses_base_chain() {
        let mut ty = TypeDescriptor::new("App", "Derived").with_base_type("App.Middle");
        ty.base_types = vec!["App.Middle".to_string(), "App.Root".to_string()];
        assert!(ty.inherits("App.Middle"));
        assert!(ty.inherits("App.Root"));
        assert!(!ty.inherits("App.Other"));
    }

    #[test]
    fn test_deserialize_defaults() {
        let ty: TypeDescriptor = serde_json::from_str(r#"{"name":"Thing"}"#).unwrap();
        assert_eq!(ty.namespace, "");
        assert_eq!(ty.kind, TypeKind::Class);
        assert_eq!(ty.visibility, Visibility::Public);
        assert!(ty.base_type.is_none());
        assert!(!ty.is_generic());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(TypeKind::parse("Interface"), Some(TypeKind::Interface));
        assert_eq!(TypeKind::parse("record"), None);
    }

    #[test]
    fn test_visibility_name_round_trips_through_parse() {
        for vis in [
            Visibility::Public,
            Visibility::Internal,
            Visibility::Protected,
            Visibility::Private,
        ] {
            assert_eq!(Visibility::parse(vis.as_str()), Some(vis));
        }
        assert_eq!(Visibility::Internal.to_string(), "internal");
    }
}
