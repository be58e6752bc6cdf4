//! Entity Data Model (EDM) types and lookups
//!
//! The parser resolves property, navigation and entity-set names against an
//! [`EntityDataModel`]. The model is a read-only collaborator: this crate
//! never mutates it, and implementations must tolerate concurrent lookups
//! from multiple in-flight parses.

mod kind;
mod model;

pub use kind::EdmSimpleType;
pub use model::{
    ComplexType, EdmType, EntityDataModel, EntitySet, EntityType, FunctionImport, InMemoryModel,
    ModelBuilder, ModelError, NavigationProperty, Property, PropertyKind, TypeRef,
};
