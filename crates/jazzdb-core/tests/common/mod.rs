#![allow(dead_code)]

use std::sync::Arc;

use jazzdb_core::query::{Join, Query};
use jazzdb_core::schema::{FieldDescriptor, ModelSchema, Schema};
use jazzdb_core::{Fragment, GenericDialect};

/// Classes, their students and the students' addresses.
pub fn school() -> Arc<Schema> {
    Arc::new(
        Schema::new()
            .model(
                "class",
                ModelSchema::new()
                    .field("id", FieldDescriptor::primary_key())
                    .field("name", FieldDescriptor::text().required())
                    .field("teacher", FieldDescriptor::text())
                    .field("funding", FieldDescriptor::integer())
                    .field("helper", FieldDescriptor::text())
                    .field("students", FieldDescriptor::has_many("student", "class")),
            )
            .model(
                "student",
                ModelSchema::new()
                    .field("id", FieldDescriptor::primary_key())
                    .field("name", FieldDescriptor::text())
                    .field("age", FieldDescriptor::integer())
                    .field("class", FieldDescriptor::has_one("class"))
                    .field("address", FieldDescriptor::has_one("address")),
            )
            .model(
                "address",
                ModelSchema::new()
                    .field("id", FieldDescriptor::primary_key())
                    .field("city", FieldDescriptor::text()),
            ),
    )
}

pub fn start(model: &str) -> Query {
    Query::start(model, school()).unwrap_or_else(|e| panic!("Failed to start {model}: {e}"))
}

pub fn sql(fragment: &Fragment) -> String {
    fragment.to_statement(&GenericDialect).sql
}

pub fn join_models(joins: &[Join]) -> Vec<&str> {
    joins.iter().map(|join| join.model.as_str()).collect()
}
