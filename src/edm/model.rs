//! Structural model types and the read-only model contract
//!
//! Entity types, complex types, entity sets and function imports are shared
//! through `Arc` handles; expression nodes hold the same handles, so a
//! resolved tree stays valid for as long as the model that produced it.

use super::kind::EdmSimpleType;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// What a structural property holds.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    /// A primitive-typed property.
    Simple(EdmSimpleType),
    /// A complex-typed property; drilled into with `/` path segments.
    Complex(Arc<ComplexType>),
}

/// A structural property of an entity or complex type.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name as addressed in URIs.
    pub name: String,
    /// Primitive or complex payload.
    pub kind: PropertyKind,
}

impl Property {
    /// The primitive kind, if this is a simple property.
    pub fn simple_type(&self) -> Option<EdmSimpleType> {
        match &self.kind {
            PropertyKind::Simple(kind) => Some(*kind),
            PropertyKind::Complex(_) => None,
        }
    }
}

/// A named complex type: a bag of structural properties without identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexType {
    /// Schema namespace.
    pub namespace: String,
    /// Type name within the namespace.
    pub name: String,
    properties: Vec<Arc<Property>>,
}

impl ComplexType {
    /// Look up a structural property by name.
    pub fn property(&self, name: &str) -> Option<Arc<Property>> {
        self.properties.iter().find(|p| p.name == name).cloned()
    }

    /// `Namespace.Name` form used in diagnostics and model references.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// A navigation property: a typed, named relationship to another entity set.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationProperty {
    /// Navigation property name as addressed in URIs.
    pub name: String,
    /// Name of the entity set the relationship targets.
    pub target_set: String,
    /// Whether the relationship is collection-valued.
    pub to_many: bool,
}

/// An entity type: keyed, structural, navigable.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityType {
    /// Schema namespace.
    pub namespace: String,
    /// Type name within the namespace.
    pub name: String,
    key: Vec<String>,
    properties: Vec<Arc<Property>>,
    navigations: Vec<Arc<NavigationProperty>>,
}

impl EntityType {
    /// Look up a structural property by name.
    pub fn property(&self, name: &str) -> Option<Arc<Property>> {
        self.properties.iter().find(|p| p.name == name).cloned()
    }

    /// Look up a navigation property by name.
    pub fn navigation(&self, name: &str) -> Option<Arc<NavigationProperty>> {
        self.navigations.iter().find(|n| n.name == name).cloned()
    }

    /// The declared key property names, in declaration order.
    pub fn key_property_names(&self) -> &[String] {
        &self.key
    }

    /// The resolved key properties, in declaration order.
    pub fn key_properties(&self) -> Vec<Arc<Property>> {
        self.key
            .iter()
            .filter_map(|name| self.property(name))
            .collect()
    }

    /// `Namespace.Name` form used in diagnostics and model references.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// An entity set exposed by the container.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySet {
    /// Entity set name, the first segment of most resource paths.
    pub name: String,
    /// Qualified name of the entity type the set contains.
    pub entity_type: String,
}

/// A function import returning entities from one of the container's sets.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionImport {
    /// Function import name as addressed in URIs.
    pub name: String,
    /// Entity set the returned entities belong to.
    pub entity_set: String,
    /// Whether the import returns a collection or a single entity.
    pub returns_collection: bool,
}

/// Read-only lookups the parser performs against a schema.
///
/// Implementations must be safe for concurrent reads; the parser holds the
/// model only for the duration of one resolve/parse call and never writes
/// through it.
pub trait EntityDataModel: Send + Sync {
    /// Entity set by name, from any container.
    fn entity_set(&self, name: &str) -> Option<Arc<EntitySet>>;

    /// Function import by name.
    fn function_import(&self, name: &str) -> Option<Arc<FunctionImport>>;

    /// Entity type by qualified `Namespace.Name`.
    fn entity_type(&self, qualified_name: &str) -> Option<Arc<EntityType>>;

    /// Complex type by qualified `Namespace.Name`.
    fn complex_type(&self, qualified_name: &str) -> Option<Arc<ComplexType>>;

    /// The entity type of a set, following the set's type reference.
    fn entity_type_of(&self, set: &EntitySet) -> Option<Arc<EntityType>> {
        self.entity_type(&set.entity_type)
    }
}

/// The EDM type annotation carried by every expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum EdmType {
    /// A primitive type.
    Simple(EdmSimpleType),
    /// A complex type, reached through complex-property segments.
    Complex(Arc<ComplexType>),
    /// An entity type, reached through to-one navigation segments.
    Entity(Arc<EntityType>),
}

impl EdmType {
    /// The primitive kind, if this annotation is simple.
    pub fn simple(&self) -> Option<EdmSimpleType> {
        match self {
            EdmType::Simple(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Human-readable type name for diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            EdmType::Simple(kind) => kind.name().to_string(),
            EdmType::Complex(ct) => ct.qualified_name(),
            EdmType::Entity(et) => et.qualified_name(),
        }
    }
}

impl fmt::Display for EdmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// Validation failures raised by [`ModelBuilder::build`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Two declarations share a name within the same namespace.
    #[error("duplicate {what} '{name}'")]
    Duplicate {
        /// Kind of declaration ("entity type", "entity set", ...).
        what: &'static str,
        /// The colliding name.
        name: String,
    },

    /// A property references a complex type that was not declared first.
    #[error("property '{property}' references unknown complex type '{complex_type}'")]
    UnknownComplexType {
        /// Declaring property.
        property: String,
        /// The missing complex type name.
        complex_type: String,
    },

    /// An entity set references an undeclared entity type.
    #[error("entity set '{set}' references unknown entity type '{entity_type}'")]
    UnknownSetType {
        /// The entity set.
        set: String,
        /// The missing type name.
        entity_type: String,
    },

    /// A key property is missing or not simple-typed.
    #[error("key property '{property}' of '{entity_type}' is missing or not simple-typed")]
    InvalidKeyProperty {
        /// The entity type declaring the key.
        entity_type: String,
        /// The offending key property name.
        property: String,
    },

    /// A navigation property references an undeclared entity set.
    #[error("navigation '{navigation}' of '{entity_type}' references unknown entity set '{set}'")]
    UnknownNavigationTarget {
        /// The declaring entity type.
        entity_type: String,
        /// The navigation property.
        navigation: String,
        /// The missing target set.
        set: String,
    },

    /// A function import references an undeclared entity set.
    #[error("function import '{function}' references unknown entity set '{set}'")]
    UnknownFunctionTarget {
        /// The function import.
        function: String,
        /// The missing target set.
        set: String,
    },
}

/// Property type reference used while declaring a model.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// A primitive property.
    Simple(EdmSimpleType),
    /// A complex property, referring to a previously declared complex type
    /// by unqualified name.
    Complex(String),
}

struct EntityTypeDecl {
    name: String,
    key: Vec<String>,
    properties: Vec<(String, TypeRef)>,
    navigations: Vec<(String, String, bool)>,
}

/// Declarative builder for an [`InMemoryModel`].
///
/// Declaration order matters only for complex types referencing other
/// complex types: the referenced type must be declared first.
pub struct ModelBuilder {
    namespace: String,
    complex_types: Vec<(String, Vec<(String, TypeRef)>)>,
    entity_types: Vec<EntityTypeDecl>,
    entity_sets: Vec<(String, String)>,
    function_imports: Vec<(String, String, bool)>,
}

impl ModelBuilder {
    /// Start a model in the given schema namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            complex_types: Vec::new(),
            entity_types: Vec::new(),
            entity_sets: Vec::new(),
            function_imports: Vec::new(),
        }
    }

    /// Declare a complex type.
    pub fn complex_type<P: Into<String>>(
        mut self,
        name: impl Into<String>,
        properties: Vec<(P, TypeRef)>,
    ) -> Self {
        self.complex_types.push((
            name.into(),
            properties.into_iter().map(|(n, t)| (n.into(), t)).collect(),
        ));
        self
    }

    /// Declare an entity type with its key property names, structural
    /// properties, and `(name, target_set, to_many)` navigation properties.
    pub fn entity_type<K, P, N, S>(
        mut self,
        name: impl Into<String>,
        key: Vec<K>,
        properties: Vec<(P, TypeRef)>,
        navigations: Vec<(N, S, bool)>,
    ) -> Self
    where
        K: Into<String>,
        P: Into<String>,
        N: Into<String>,
        S: Into<String>,
    {
        self.entity_types.push(EntityTypeDecl {
            name: name.into(),
            key: key.into_iter().map(Into::into).collect(),
            properties: properties.into_iter().map(|(n, t)| (n.into(), t)).collect(),
            navigations: navigations
                .into_iter()
                .map(|(n, s, m)| (n.into(), s.into(), m))
                .collect(),
        });
        self
    }

    /// Declare an entity set over an entity type (unqualified name).
    pub fn entity_set(mut self, name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        self.entity_sets.push((name.into(), entity_type.into()));
        self
    }

    /// Declare a function import returning entities of an entity set.
    pub fn function_import(
        mut self,
        name: impl Into<String>,
        entity_set: impl Into<String>,
        returns_collection: bool,
    ) -> Self {
        self.function_imports
            .push((name.into(), entity_set.into(), returns_collection));
        self
    }

    /// Validate the declarations and freeze them into a shareable model.
    pub fn build(self) -> Result<Arc<InMemoryModel>, ModelError> {
        let ns = &self.namespace;

        let mut complex: FxHashMap<String, Arc<ComplexType>> = FxHashMap::default();
        for (name, props) in &self.complex_types {
            if complex.contains_key(name) {
                return Err(ModelError::Duplicate {
                    what: "complex type",
                    name: name.clone(),
                });
            }
            let properties = resolve_properties(props, &complex)?;
            complex.insert(
                name.clone(),
                Arc::new(ComplexType {
                    namespace: ns.clone(),
                    name: name.clone(),
                    properties,
                }),
            );
        }

        let set_names: Vec<&str> = self.entity_sets.iter().map(|(n, _)| n.as_str()).collect();

        let mut entity_types: FxHashMap<String, Arc<EntityType>> = FxHashMap::default();
        for decl in &self.entity_types {
            let qualified = format!("{ns}.{}", decl.name);
            if entity_types.contains_key(&qualified) {
                return Err(ModelError::Duplicate {
                    what: "entity type",
                    name: decl.name.clone(),
                });
            }
            let properties = resolve_properties(&decl.properties, &complex)?;
            for key_name in &decl.key {
                let simple = properties
                    .iter()
                    .find(|p| &p.name == key_name)
                    .and_then(|p| p.simple_type());
                if simple.is_none() {
                    return Err(ModelError::InvalidKeyProperty {
                        entity_type: decl.name.clone(),
                        property: key_name.clone(),
                    });
                }
            }
            let mut navigations = Vec::with_capacity(decl.navigations.len());
            for (nav_name, target_set, to_many) in &decl.navigations {
                if !set_names.contains(&target_set.as_str()) {
                    return Err(ModelError::UnknownNavigationTarget {
                        entity_type: decl.name.clone(),
                        navigation: nav_name.clone(),
                        set: target_set.clone(),
                    });
                }
                navigations.push(Arc::new(NavigationProperty {
                    name: nav_name.clone(),
                    target_set: target_set.clone(),
                    to_many: *to_many,
                }));
            }
            entity_types.insert(
                qualified,
                Arc::new(EntityType {
                    namespace: ns.clone(),
                    name: decl.name.clone(),
                    key: decl.key.clone(),
                    properties,
                    navigations,
                }),
            );
        }

        let mut entity_sets: FxHashMap<String, Arc<EntitySet>> = FxHashMap::default();
        for (name, type_name) in &self.entity_sets {
            if entity_sets.contains_key(name) {
                return Err(ModelError::Duplicate {
                    what: "entity set",
                    name: name.clone(),
                });
            }
            let qualified = format!("{ns}.{type_name}");
            if !entity_types.contains_key(&qualified) {
                return Err(ModelError::UnknownSetType {
                    set: name.clone(),
                    entity_type: type_name.clone(),
                });
            }
            entity_sets.insert(
                name.clone(),
                Arc::new(EntitySet {
                    name: name.clone(),
                    entity_type: qualified,
                }),
            );
        }

        let mut function_imports: FxHashMap<String, Arc<FunctionImport>> = FxHashMap::default();
        for (name, set, returns_collection) in &self.function_imports {
            if function_imports.contains_key(name) {
                return Err(ModelError::Duplicate {
                    what: "function import",
                    name: name.clone(),
                });
            }
            if !entity_sets.contains_key(set) {
                return Err(ModelError::UnknownFunctionTarget {
                    function: name.clone(),
                    set: set.clone(),
                });
            }
            function_imports.insert(
                name.clone(),
                Arc::new(FunctionImport {
                    name: name.clone(),
                    entity_set: set.clone(),
                    returns_collection: *returns_collection,
                }),
            );
        }

        let complex_types = complex
            .into_iter()
            .map(|(name, ct)| (format!("{ns}.{name}"), ct))
            .collect();

        Ok(Arc::new(InMemoryModel {
            entity_sets,
            entity_types,
            complex_types,
            function_imports,
        }))
    }
}

fn resolve_properties(
    decls: &[(String, TypeRef)],
    complex: &FxHashMap<String, Arc<ComplexType>>,
) -> Result<Vec<Arc<Property>>, ModelError> {
    let mut out = Vec::with_capacity(decls.len());
    for (name, type_ref) in decls {
        let kind = match type_ref {
            TypeRef::Simple(kind) => PropertyKind::Simple(*kind),
            TypeRef::Complex(complex_name) => {
                let ct = complex.get(complex_name).cloned().ok_or_else(|| {
                    ModelError::UnknownComplexType {
                        property: name.clone(),
                        complex_type: complex_name.clone(),
                    }
                })?;
                PropertyKind::Complex(ct)
            }
        };
        out.push(Arc::new(Property {
            name: name.clone(),
            kind,
        }));
    }
    Ok(out)
}

/// A frozen, hash-indexed model; the crate's own [`EntityDataModel`]
/// implementation, used by tests and by embedders without a schema backend.
#[derive(Debug)]
pub struct InMemoryModel {
    entity_sets: FxHashMap<String, Arc<EntitySet>>,
    entity_types: FxHashMap<String, Arc<EntityType>>,
    complex_types: FxHashMap<String, Arc<ComplexType>>,
    function_imports: FxHashMap<String, Arc<FunctionImport>>,
}

impl EntityDataModel for InMemoryModel {
    fn entity_set(&self, name: &str) -> Option<Arc<EntitySet>> {
        self.entity_sets.get(name).cloned()
    }

    fn function_import(&self, name: &str) -> Option<Arc<FunctionImport>> {
        self.function_imports.get(name).cloned()
    }

    fn entity_type(&self, qualified_name: &str) -> Option<Arc<EntityType>> {
        self.entity_types.get(qualified_name).cloned()
    }

    fn complex_type(&self, qualified_name: &str) -> Option<Arc<ComplexType>> {
        self.complex_types.get(qualified_name).cloned()
    }
}
