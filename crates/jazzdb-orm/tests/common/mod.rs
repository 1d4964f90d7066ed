//! Shared fixtures for ORM integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use jazzdb_core::connection::ConnectionResult;
use jazzdb_core::{
    BoxFuture, Connection, ConnectionError, Dialect, GenericDialect, ResultSet, RowMode, Session,
    SqlValue, Statement,
};
use jazzdb_orm::{BackendRegistry, Database, FieldDescriptor, Fragment, ModelSchema, Schema};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Routes log output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub fn school_schema() -> Schema {
    Schema::new()
        .model(
            "class",
            ModelSchema::new()
                .field("id", FieldDescriptor::primary_key())
                .field("name", FieldDescriptor::text().required())
                .field("teacher", FieldDescriptor::text())
                .field("funding", FieldDescriptor::real())
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
        )
}

const TABLES: [&str; 3] = [
    "CREATE TABLE class (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, teacher TEXT, funding REAL, helper TEXT)",
    "CREATE TABLE student (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, age INTEGER, class INTEGER REFERENCES class (id), address INTEGER REFERENCES address (id))",
    "CREATE TABLE address (id INTEGER PRIMARY KEY AUTOINCREMENT, city TEXT)",
];

const ROWS: [&str; 3] = [
    "INSERT INTO class (name, teacher, funding, helper) VALUES \
     ('Year 3', 'Sam', 10, NULL), ('Year 4', 'Sam', 20, NULL), ('Year 5', 'Sally', 30, 'Pat')",
    "INSERT INTO address (city) VALUES ('Leeds')",
    "INSERT INTO student (name, age, class, address) VALUES \
     ('Alice', 8, 1, 1), ('Bob', 9, 1, NULL), ('Carol', 10, 3, NULL), ('Dan', 11, 3, NULL)",
];

/// An in-memory database with the school tables but no rows.
pub async fn empty_school() -> Database {
    init_tracing();
    let db = Database::connect(&BackendRegistry::with_defaults(), "sqlite::memory:")
        .expect("sqlite backend");
    db.add_schema(school_schema()).expect("valid schema");
    for table in TABLES {
        db.execute(Fragment::sql(table)).await.expect("create table");
    }
    db
}

/// An in-memory database holding three classes and four students.
///
/// Year 3 (Sam) has Alice and Bob, Year 4 (Sam) has nobody, Year 5 (Sally,
/// helped by Pat) has Carol and Dan. Only Alice has an address.
pub async fn school() -> Database {
    let db = empty_school().await;
    for rows in ROWS {
        db.execute(Fragment::sql(rows)).await.expect("insert rows");
    }
    db
}

pub fn text(value: &str) -> SqlValue {
    SqlValue::Text(value.to_string())
}

/// A connection that records every statement instead of running it.
#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
    fail: Arc<Mutex<Option<String>>>,
}

impl Recorder {
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Makes statements with exactly this SQL fail.
    pub fn fail_on(&self, sql: &str) {
        *self.fail.lock().unwrap() = Some(sql.to_string());
    }

    fn record(&self, statement: &Statement) -> ConnectionResult<ResultSet> {
        self.log.lock().unwrap().push(statement.sql.clone());
        if self.fail.lock().unwrap().as_deref() == Some(statement.sql.as_str()) {
            return Err(ConnectionError::new("statement failed"));
        }
        Ok(ResultSet::default())
    }
}

impl Connection for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    fn dialect(&self) -> &dyn Dialect {
        &GenericDialect
    }

    fn execute<'a>(
        &'a self,
        statement: &'a Statement,
        _mode: RowMode,
    ) -> BoxFuture<'a, ConnectionResult<ResultSet>> {
        Box::pin(async move { self.record(statement) })
    }

    fn acquire(&self) -> BoxFuture<'_, ConnectionResult<Box<dyn Session>>> {
        let session = RecorderSession {
            recorder: self.clone(),
        };
        Box::pin(async move { Ok(Box::new(session) as Box<dyn Session>) })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

struct RecorderSession {
    recorder: Recorder,
}

impl Session for RecorderSession {
    fn execute<'a>(
        &'a mut self,
        statement: &'a Statement,
        _mode: RowMode,
    ) -> BoxFuture<'a, ConnectionResult<ResultSet>> {
        Box::pin(async move { self.recorder.record(statement) })
    }

    fn release(self: Box<Self>) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            self.recorder.log.lock().unwrap().push("<release>".to_string());
        })
    }
}

/// A database whose statements are recorded by the returned recorder.
pub fn recorded() -> (Database, Recorder) {
    init_tracing();
    let recorder = Recorder::default();
    let db = Database::new(Arc::new(recorder.clone()));
    db.add_schema(school_schema()).expect("valid schema");
    (db, recorder)
}
