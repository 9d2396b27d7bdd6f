//! JSON Schema composition
//!
//! A [`SchemaRegistry`] loads a list of schema documents and composes them
//! into a [`SchemaGraph`] in which every `$ref`, local or cross-document,
//! is already resolved. Validation never sees an unresolved reference.

mod compile;
mod model;
mod registry;

pub use compile::{SchemaDocument, compose};
pub use model::{
    Items, JsonType, Keywords, Pattern, Schema, SchemaGraph, SchemaId, SchemaKind, TypeSet,
};
pub use registry::SchemaRegistry;
