//! Query sets against an in-memory SQLite school.

mod common;

use std::sync::Arc;

use common::{recorded, school, text};
use jazzdb_core::QueryError;
use jazzdb_orm::{
    count_all, filter, min, sql, OrmError, Projection, RawMode, Record, SqlValue, Values,
    ValuesOptions,
};

const FLAT: ValuesOptions = ValuesOptions {
    flat: true,
    distinct: false,
};

fn names(records: &[Record]) -> Vec<String> {
    let mut names: Vec<String> = records
        .iter()
        .filter_map(|record| record.value("name").and_then(SqlValue::as_str))
        .map(String::from)
        .collect();
    names.sort();
    names
}

fn arc_names(records: &[Arc<Record>]) -> Vec<String> {
    let records: Vec<Record> = records.iter().map(|record| Record::clone(record)).collect();
    names(&records)
}

#[tokio::test]
async fn test_fetches_every_record_in_order() {
    let db = school().await;
    let classes = db
        .model("class")
        .unwrap()
        .all()
        .order(["-name"])
        .unwrap()
        .fetch()
        .await
        .unwrap();

    let ordered: Vec<_> = classes
        .iter()
        .map(|class| class.value("name").cloned())
        .collect();
    assert_eq!(
        ordered,
        vec![Some(text("Year 5")), Some(text("Year 4")), Some(text("Year 3"))]
    );
    assert_eq!(classes[0].value("funding"), Some(&SqlValue::Float(30.0)));
    assert_eq!(classes[0].value("helper"), Some(&text("Pat")));
}

#[tokio::test]
async fn test_and_of_two_or_groups() {
    let db = school().await;
    let classes = db
        .model("class")
        .unwrap()
        .all()
        .filter([filter! { "name" => "Year 3" }, filter! { "teacher" => "Sam" }])
        .unwrap()
        .filter([filter! { "name" => "Year 5" }, filter! { "teacher" => "Sam" }])
        .unwrap()
        .fetch()
        .await
        .unwrap();

    assert_eq!(names(&classes), vec!["Year 3", "Year 4"]);
}

#[tokio::test]
async fn test_flat_values_with_one_field_are_plain_values() {
    let db = school().await;
    let classes = db.model("class").unwrap().all().order(["name"]).unwrap();

    let single = classes.values(["name"], FLAT).await.unwrap();
    assert_eq!(
        single,
        Values::Flat(vec![text("Year 3"), text("Year 4"), text("Year 5")])
    );

    let pairs = classes.values(["name", "teacher"], FLAT).await.unwrap();
    assert_eq!(
        pairs,
        Values::Arrays(vec![
            vec![text("Year 3"), text("Sam")],
            vec![text("Year 4"), text("Sam")],
            vec![text("Year 5"), text("Sally")],
        ])
    );
}

#[tokio::test]
async fn test_flat_without_fields_is_rejected() {
    let db = school().await;
    let err = db
        .model("class")
        .unwrap()
        .all()
        .values(Vec::<&str>::new(), FLAT)
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Query(QueryError::InvalidOption(_))));
    assert!(err.to_string().contains("can only set flat if there are fields"));
}

#[tokio::test]
async fn test_distinct_values() {
    let db = school().await;
    let teachers = db
        .model("class")
        .unwrap()
        .all()
        .order(["teacher"])
        .unwrap()
        .values(
            ["teacher"],
            ValuesOptions {
                flat: true,
                distinct: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(teachers, Values::Flat(vec![text("Sally"), text("Sam")]));
}

#[tokio::test]
async fn test_projected_paths_key_object_rows() {
    let db = school().await;
    let rows = db
        .model("student")
        .unwrap()
        .all()
        .filter(filter! { "name" => "Carol" })
        .unwrap()
        .values(["name", "class__teacher"], ValuesOptions::default())
        .await
        .unwrap()
        .into_objects()
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&text("Carol")));
    assert_eq!(rows[0].get("class__teacher"), Some(&text("Sally")));
}

#[tokio::test]
async fn test_comparison_operators() {
    let db = school().await;
    let students = db.model("student").unwrap().all();

    let older = students.filter(filter! { "age__gte" => 10 }).unwrap();
    assert_eq!(names(&older.fetch().await.unwrap()), vec!["Carol", "Dan"]);

    let youngest = students.filter(filter! { "age__LT" => 9 }).unwrap();
    assert_eq!(names(&youngest.fetch().await.unwrap()), vec!["Alice"]);

    let not_bob = students
        .filter(filter! { "name__neq" => "Bob", "age__lte" => 10 })
        .unwrap();
    assert_eq!(names(&not_bob.fetch().await.unwrap()), vec!["Alice", "Carol"]);
}

#[tokio::test]
async fn test_filters_across_relationships() {
    let db = school().await;

    let taught_by_sam = db
        .model("student")
        .unwrap()
        .all()
        .filter(filter! { "class__teacher" => "Sam" })
        .unwrap()
        .fetch()
        .await
        .unwrap();
    assert_eq!(names(&taught_by_sam), vec!["Alice", "Bob"]);

    let with_older_students = db
        .model("class")
        .unwrap()
        .all()
        .filter(filter! { "students__age__gte" => 10 })
        .unwrap()
        .fetch()
        .await
        .unwrap();
    assert_eq!(names(&with_older_students), vec!["Year 5"]);
}

#[tokio::test]
async fn test_paths_back_to_the_same_model() {
    let db = school().await;
    let students = db.model("student").unwrap();

    let classmates_of_bob = students
        .all()
        .filter(filter! { "class__students__name" => "Bob" })
        .unwrap();
    assert_eq!(
        names(&classmates_of_bob.fetch().await.unwrap()),
        vec!["Alice", "Bob"]
    );
    assert_eq!(classmates_of_bob.count().await.unwrap(), 2);

    let carols_classmates = students
        .all()
        .filter(filter! { "name" => "Carol" })
        .unwrap()
        .order(["class__students__name"])
        .unwrap()
        .values(["class__students__name"], FLAT)
        .await
        .unwrap();
    assert_eq!(
        carols_classmates,
        Values::Flat(vec![text("Carol"), text("Dan")])
    );

    let removed = students
        .all()
        .filter(filter! { "class__students__name" => "Dan" })
        .unwrap()
        .delete()
        .await
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(students.all().count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_hasmany_join_does_not_duplicate_records() {
    let db = school().await;
    let classes = db
        .model("class")
        .unwrap()
        .all()
        .filter(filter! { "students__age__gte" => 8 })
        .unwrap();

    assert_eq!(names(&classes.fetch().await.unwrap()), vec!["Year 3", "Year 5"]);
    assert_eq!(classes.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_isnull_finds_missing_relations() {
    let db = school().await;

    let empty_classes = db
        .model("class")
        .unwrap()
        .all()
        .filter(filter! { "students__isnull" => true })
        .unwrap()
        .fetch()
        .await
        .unwrap();
    assert_eq!(names(&empty_classes), vec!["Year 4"]);

    let students = db.model("student").unwrap().all();
    let homeless = students
        .filter(filter! { "address__isnull" => true })
        .unwrap()
        .fetch()
        .await
        .unwrap();
    assert_eq!(names(&homeless), vec!["Bob", "Carol", "Dan"]);

    let housed = students
        .filter(filter! { "address__isnull" => false })
        .unwrap()
        .fetch()
        .await
        .unwrap();
    assert_eq!(names(&housed), vec!["Alice"]);
}

#[tokio::test]
async fn test_fetched_record_as_filter_value() {
    let db = school().await;
    let year5 = db
        .model("class")
        .unwrap()
        .all()
        .filter(filter! { "name" => "Year 5" })
        .unwrap()
        .single()
        .await
        .unwrap()
        .unwrap();

    let students = db
        .model("student")
        .unwrap()
        .all()
        .filter(filter! { "class" => &year5 })
        .unwrap()
        .fetch()
        .await
        .unwrap();
    assert_eq!(names(&students), vec!["Carol", "Dan"]);
}

#[tokio::test]
async fn test_relationship_operator_is_rejected_before_sql() {
    let db = school().await;
    let err = db
        .model("class")
        .unwrap()
        .all()
        .filter(filter! { "students__gt" => 5 })
        .unwrap_err();
    assert!(matches!(
        err,
        OrmError::Query(QueryError::InvalidFilterOperator { .. })
    ));
}

#[tokio::test]
async fn test_aggregate_groups_by_plain_fields() {
    let db = school().await;
    let rows = db
        .model("class")
        .unwrap()
        .all()
        .order(["name"])
        .unwrap()
        .values(
            [Projection::field("name"), min("students__age").into()],
            ValuesOptions::default(),
        )
        .await
        .unwrap()
        .into_objects()
        .unwrap();

    let summary: Vec<_> = rows
        .iter()
        .map(|row| (row["name"].clone(), row["students__age__min"].clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (text("Year 3"), SqlValue::Int(8)),
            (text("Year 4"), SqlValue::Null),
            (text("Year 5"), SqlValue::Int(10)),
        ]
    );
}

#[tokio::test]
async fn test_count_per_related_group() {
    let db = school().await;
    let rows = db
        .model("student")
        .unwrap()
        .all()
        .order(["class__name"])
        .unwrap()
        .values(
            [Projection::field("class__name"), count_all().named("students").into()],
            FLAT,
        )
        .await
        .unwrap();

    assert_eq!(
        rows,
        Values::Arrays(vec![
            vec![text("Year 3"), SqlValue::Int(2)],
            vec![text("Year 5"), SqlValue::Int(2)],
        ])
    );
}

#[tokio::test]
async fn test_count_and_limit() {
    let db = school().await;
    let classes = db.model("class").unwrap().all();
    assert_eq!(classes.count().await.unwrap(), 3);

    let sams = classes.filter(filter! { "teacher" => "Sam" }).unwrap();
    assert_eq!(sams.count().await.unwrap(), 2);

    let richest = classes
        .order(["-funding"])
        .unwrap()
        .single()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(richest.value("name"), Some(&text("Year 5")));

    let two = classes.order(["name"]).unwrap().limit(2).fetch().await.unwrap();
    assert_eq!(names(&two), vec!["Year 3", "Year 4"]);
}

#[tokio::test]
async fn test_count_without_a_number_is_an_error() {
    let (db, recorder) = recorded();
    let err = db.model("class").unwrap().all().count().await.unwrap_err();
    assert!(matches!(err, OrmError::Backend(ref e) if e.message().contains("no rows")));
    assert_eq!(recorder.log().len(), 1);
}

#[tokio::test]
async fn test_single_returns_none_without_match() {
    let db = school().await;
    let missing = db
        .model("class")
        .unwrap()
        .all()
        .filter(filter! { "name" => "Year 9" })
        .unwrap()
        .single()
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_relations_resolve_lazily_and_once() {
    let db = school().await;
    let alice = db
        .model("student")
        .unwrap()
        .all()
        .filter(filter! { "name" => "Alice" })
        .unwrap()
        .single()
        .await
        .unwrap()
        .unwrap();

    let class = alice.relation("class").unwrap();
    assert_eq!(class.key(), SqlValue::Int(1));
    assert!(!class.is_loaded());

    let first = class.one().await.unwrap().unwrap();
    let second = class.one().await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.value("name"), Some(&text("Year 3")));

    let classmates = first.relation("students").unwrap().many().await.unwrap();
    assert_eq!(arc_names(&classmates), vec!["Alice", "Bob"]);

    let address = alice.relation("address").unwrap().one().await.unwrap().unwrap();
    assert_eq!(address.value("city"), Some(&text("Leeds")));
}

#[tokio::test]
async fn test_missing_relations_resolve_empty() {
    let db = school().await;
    let year4 = db
        .model("class")
        .unwrap()
        .all()
        .filter(filter! { "name" => "Year 4" })
        .unwrap()
        .single()
        .await
        .unwrap()
        .unwrap();
    assert!(year4.relation("students").unwrap().many().await.unwrap().is_empty());

    let bob = db
        .model("student")
        .unwrap()
        .all()
        .filter(filter! { "name" => "Bob" })
        .unwrap()
        .single()
        .await
        .unwrap()
        .unwrap();
    let address = bob.relation("address").unwrap();
    assert_eq!(address.key(), SqlValue::Null);
    assert!(address.one().await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_counts_changed_rows() {
    let db = school().await;
    let students = db.model("student").unwrap().all();

    let year3 = students.filter(filter! { "class__name" => "Year 3" }).unwrap();
    assert_eq!(year3.update([("age", 12)]).await.unwrap(), 2);

    let twelve = students.filter(filter! { "age" => 12 }).unwrap();
    assert_eq!(names(&twelve.fetch().await.unwrap()), vec!["Alice", "Bob"]);

    assert_eq!(year3.update(Vec::<(&str, i64)>::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_rejects_hasmany_fields() {
    let db = school().await;
    let err = db
        .model("class")
        .unwrap()
        .all()
        .update([("students", 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Query(QueryError::NotWritable { .. })));
}

#[tokio::test]
async fn test_delete_counts_removed_rows() {
    let db = school().await;
    let students = db.model("student").unwrap().all();

    let older = students.filter(filter! { "age__gte" => 10 }).unwrap();
    assert_eq!(older.delete().await.unwrap(), 2);
    assert_eq!(students.count().await.unwrap(), 2);

    let empty_classes = db
        .model("class")
        .unwrap()
        .all()
        .filter(filter! { "students__isnull" => true })
        .unwrap();
    assert_eq!(empty_classes.delete().await.unwrap(), 2);
    assert_eq!(db.model("class").unwrap().all().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_raw_sql_binds_values() {
    let db = school().await;
    assert_eq!(db.database_type(), "sqlite");

    let rows = db
        .sql(sql!("SELECT name FROM class WHERE teacher = {}", "Sally").unwrap())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&text("Year 5")));

    let injected = db
        .sql_as(
            sql!("SELECT name FROM class WHERE name = {}", "'; DROP TABLE class; --").unwrap(),
            RawMode::Flat,
        )
        .await
        .unwrap();
    assert!(injected.is_empty());
    assert_eq!(db.model("class").unwrap().all().count().await.unwrap(), 3);
}
