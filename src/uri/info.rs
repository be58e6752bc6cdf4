//! The resolved-request aggregate
//!
//! [`UriInfo`] is assembled incrementally by the resolver and handed out
//! immutable: the resolver either finishes every validation or the caller
//! sees only the error, never a partial aggregate.

use crate::ast::{FilterExpression, LiteralValue, OrderByExpression};
use crate::edm::{EntitySet, EntityType, FunctionImport, NavigationProperty, Property};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

/// What kind of resource the path resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UriKind {
    /// Empty path: the service document.
    ServiceDocument,
    /// `$metadata`.
    Metadata,
    /// A collection of entities.
    EntitySet,
    /// A single entity.
    Entity,
    /// A simple property of an entity (optionally followed by `$value`).
    SimpleProperty,
    /// A complex property of an entity.
    ComplexProperty,
    /// `$links` between an entity and a navigation target.
    Links,
}

/// One resolved key: a key property paired with its literal value.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPredicate {
    /// The key property.
    pub property: Arc<Property>,
    /// The validated literal.
    pub value: LiteralValue,
}

/// One resolved navigation step of the path.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationSegment {
    /// The navigation property taken.
    pub navigation: Arc<NavigationProperty>,
    /// The entity set the step lands in.
    pub entity_set: Arc<EntitySet>,
    /// Key predicates applied to the step's target, if any.
    pub key_predicates: Vec<KeyPredicate>,
}

/// One `$select` item: navigation prefix plus a terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    /// Navigation properties leading to the selected scope.
    pub navigation: Vec<Arc<NavigationProperty>>,
    /// The selected structural property; `None` for `*` or a bare
    /// navigation selection.
    pub property: Option<Arc<Property>>,
    /// Whether the item ends in `*`.
    pub star: bool,
}

/// The `$format` system query option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Format {
    /// `atom`
    Atom,
    /// `json`
    Json,
    /// `xml`
    Xml,
    /// Any explicit MIME type (contains a `/`).
    Custom(String),
}

/// The `$inlinecount` system query option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InlineCount {
    /// `allpages`
    AllPages,
    /// `none`
    None,
}

/// Everything one request resolved to.
#[derive(Debug, Clone)]
pub struct UriInfo {
    pub(crate) kind: UriKind,
    pub(crate) start_entity_set: Option<Arc<EntitySet>>,
    pub(crate) target_entity_set: Option<Arc<EntitySet>>,
    pub(crate) target_entity_type: Option<Arc<EntityType>>,
    pub(crate) function_import: Option<Arc<FunctionImport>>,
    pub(crate) key_predicates: Vec<KeyPredicate>,
    pub(crate) navigation_segments: Vec<NavigationSegment>,
    pub(crate) property_path: Vec<Arc<Property>>,
    pub(crate) count: bool,
    pub(crate) value: bool,
    pub(crate) filter: Option<FilterExpression>,
    pub(crate) order_by: Option<OrderByExpression>,
    pub(crate) select: Vec<SelectItem>,
    pub(crate) expand: Vec<Vec<Arc<NavigationProperty>>>,
    pub(crate) top: Option<u32>,
    pub(crate) skip: Option<u32>,
    pub(crate) skip_token: Option<String>,
    pub(crate) format: Option<Format>,
    pub(crate) inline_count: Option<InlineCount>,
    pub(crate) custom_options: IndexMap<String, String>,
}

impl UriInfo {
    pub(crate) fn new(kind: UriKind) -> Self {
        Self {
            kind,
            start_entity_set: None,
            target_entity_set: None,
            target_entity_type: None,
            function_import: None,
            key_predicates: Vec::new(),
            navigation_segments: Vec::new(),
            property_path: Vec::new(),
            count: false,
            value: false,
            filter: None,
            order_by: None,
            select: Vec::new(),
            expand: Vec::new(),
            top: None,
            skip: None,
            skip_token: None,
            format: None,
            inline_count: None,
            custom_options: IndexMap::new(),
        }
    }

    /// What the path resolved to.
    pub fn kind(&self) -> UriKind {
        self.kind
    }

    /// The entity set the path started at.
    pub fn start_entity_set(&self) -> Option<&Arc<EntitySet>> {
        self.start_entity_set.as_ref()
    }

    /// The entity set the path ended at, after navigation.
    pub fn target_entity_set(&self) -> Option<&Arc<EntitySet>> {
        self.target_entity_set.as_ref()
    }

    /// The entity type of the target set.
    pub fn target_entity_type(&self) -> Option<&Arc<EntityType>> {
        self.target_entity_type.as_ref()
    }

    /// The function import the path started at, if any.
    pub fn function_import(&self) -> Option<&Arc<FunctionImport>> {
        self.function_import.as_ref()
    }

    /// Key predicates applied to the start entity set.
    pub fn key_predicates(&self) -> &[KeyPredicate] {
        &self.key_predicates
    }

    /// The navigation steps taken after the first segment.
    pub fn navigation_segments(&self) -> &[NavigationSegment] {
        &self.navigation_segments
    }

    /// Property segments addressing into the target entity, outermost
    /// first (complex properties, then possibly a simple one).
    pub fn property_path(&self) -> &[Arc<Property>] {
        &self.property_path
    }

    /// Whether the path ends in `$count`.
    pub fn count(&self) -> bool {
        self.count
    }

    /// Whether the path ends in `$value`.
    pub fn value(&self) -> bool {
        self.value
    }

    /// The parsed `$filter`, if supplied.
    pub fn filter(&self) -> Option<&FilterExpression> {
        self.filter.as_ref()
    }

    /// The parsed `$orderby`, if supplied.
    pub fn order_by(&self) -> Option<&OrderByExpression> {
        self.order_by.as_ref()
    }

    /// The validated `$select` items, in source order.
    pub fn select(&self) -> &[SelectItem] {
        &self.select
    }

    /// The validated `$expand` paths, in source order.
    pub fn expand(&self) -> &[Vec<Arc<NavigationProperty>>] {
        &self.expand
    }

    /// `$top`, if supplied.
    pub fn top(&self) -> Option<u32> {
        self.top
    }

    /// `$skip`, if supplied.
    pub fn skip(&self) -> Option<u32> {
        self.skip
    }

    /// `$skiptoken`, if supplied (opaque to this crate).
    pub fn skip_token(&self) -> Option<&str> {
        self.skip_token.as_deref()
    }

    /// `$format`, if supplied.
    pub fn format(&self) -> Option<&Format> {
        self.format.as_ref()
    }

    /// `$inlinecount`, if supplied.
    pub fn inline_count(&self) -> Option<InlineCount> {
        self.inline_count
    }

    /// Non-`$` query options, in request order.
    pub fn custom_options(&self) -> &IndexMap<String, String> {
        &self.custom_options
    }
}
