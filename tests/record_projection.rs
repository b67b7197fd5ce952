use chrono::NaiveDateTime;
use row_projection::cursor::DataSetCursor;
use row_projection::types::{DataSet, DataType, Field, Schema, Value};
use row_projection::{ConstructionPlan, MemberMode, ParserRegistry, Projectable, ProjectionError, TypeDescriptor};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Default, Clone, PartialEq)]
struct Person {
    id: i32,
    name: String,
}

impl Projectable for Person {
    fn describe(ty: &mut TypeDescriptor<Self>) {
        ty.constructor(Person::default)
            .property("Id", |p: &mut Person, v: i32| p.id = v)
            .property("Name", |p: &mut Person, v: String| p.name = v);
    }
}

fn dataset(columns: &[(&str, DataType)], rows: Vec<Vec<Value>>) -> DataSetCursor {
    let schema = Schema::new(columns.iter().map(|(n, t)| Field::new(*n, *t)).collect());
    DataSetCursor::new(DataSet::new(schema, rows))
}

fn collect<T: Projectable>(registry: &ParserRegistry, cursor: &mut DataSetCursor) -> Vec<T> {
    registry
        .project::<T>(cursor)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn projects_record_with_case_insensitive_columns() {
    let registry = ParserRegistry::new();
    let mut cursor = dataset(
        &[("id", DataType::Int32), ("NAME", DataType::Utf8)],
        vec![vec![Value::Int32(5), Value::Utf8("Ann".to_string())]],
    );

    let people = collect::<Person>(&registry, &mut cursor);
    assert_eq!(
        people,
        vec![Person {
            id: 5,
            name: "Ann".to_string()
        }]
    );
}

#[test]
fn any_letter_case_matches_the_member() {
    let registry = ParserRegistry::new();
    for column in ["ID", "Id", "iD", "id"] {
        let mut cursor = dataset(&[(column, DataType::Int32)], vec![vec![Value::Int32(9)]]);
        let person = registry.project_one::<Person>(&mut cursor).unwrap().unwrap();
        assert_eq!(person.id, 9, "column {column}");
    }
}

#[test]
fn unmatched_columns_are_ignored_and_missing_members_keep_defaults() {
    let registry = ParserRegistry::new();
    let mut cursor = dataset(
        &[("unrelated", DataType::Bool), ("id", DataType::Int32)],
        vec![vec![Value::Bool(true), Value::Int32(3)]],
    );
    let person = registry.project_one::<Person>(&mut cursor).unwrap().unwrap();
    assert_eq!(
        person,
        Person {
            id: 3,
            name: String::new()
        }
    );
}

#[test]
fn project_one_agrees_with_first_of_project() {
    let registry = ParserRegistry::new();
    let rows = vec![
        vec![Value::Int32(1), Value::Utf8("a".to_string())],
        vec![Value::Int32(2), Value::Utf8("b".to_string())],
    ];
    let columns = [("Id", DataType::Int32), ("Name", DataType::Utf8)];

    let mut first_cursor = dataset(&columns, rows.clone());
    let all = collect::<Person>(&registry, &mut first_cursor);

    let mut one_cursor = dataset(&columns, rows);
    let one = registry.project_one::<Person>(&mut one_cursor).unwrap();
    assert_eq!(one.as_ref(), all.first());
}

#[derive(Debug, PartialEq)]
struct Ledger {
    code: String,
    balance: Decimal,
    opened: Option<NaiveDateTime>,
    owner: Uuid,
    created_by_ctor: bool,
}

impl Ledger {
    fn new(code: String, balance: Decimal) -> Self {
        Self {
            code,
            balance,
            opened: None,
            owner: Uuid::nil(),
            created_by_ctor: true,
        }
    }

    fn with_owner(code: String, balance: Decimal, owner: Uuid) -> Self {
        Self {
            owner,
            ..Self::new(code, balance)
        }
    }
}

impl Projectable for Ledger {
    fn describe(ty: &mut TypeDescriptor<Self>) {
        ty.constructor(Ledger::with_owner)
            .constructor(Ledger::new)
            .property("Code", |l: &mut Ledger, v: String| l.code = v)
            .property("Balance", |l: &mut Ledger, v: Decimal| l.balance = v)
            .property("Opened", |l: &mut Ledger, v: Option<NaiveDateTime>| l.opened = v)
            .property("Owner", |l: &mut Ledger, v: Uuid| l.owner = v);
    }
}

#[test]
fn parameterized_constructor_is_fed_defaults_then_repopulated() {
    let registry = ParserRegistry::new();
    let projector = registry.projector::<Ledger>().unwrap();
    assert!(matches!(
        projector.plan(),
        ConstructionPlan::ParameterizedWithDefaults { arity: 2, .. }
    ));

    let owner = Uuid::parse_str("6f1c2c7e-1d2b-4f5a-9a3e-2b8e4c1d0a11").unwrap();
    let mut cursor = dataset(
        &[
            ("code", DataType::Utf8),
            ("balance", DataType::Decimal),
            ("opened", DataType::DateTime),
            ("owner", DataType::Uuid),
        ],
        vec![vec![
            Value::Utf8("L-1".to_string()),
            Value::Decimal(Decimal::new(12_550, 2)),
            Value::Null,
            Value::Uuid(owner),
        ]],
    );

    let ledger = registry.project_one::<Ledger>(&mut cursor).unwrap().unwrap();
    assert_eq!(
        ledger,
        Ledger {
            code: "L-1".to_string(),
            balance: Decimal::new(12_550, 2),
            opened: None,
            owner,
            created_by_ctor: true,
        }
    );
}

#[derive(Debug, Default, PartialEq)]
struct Reading {
    sensor: String,
    value: f64,
    raw: Vec<u8>,
    labels: Vec<String>,
}

impl Projectable for Reading {
    fn describe(ty: &mut TypeDescriptor<Self>) {
        ty.constructor(Reading::default)
            .field("Sensor", |r: &mut Reading| &mut r.sensor)
            .field("Value", |r: &mut Reading| &mut r.value)
            .field("Raw", |r: &mut Reading| &mut r.raw)
            .field("Labels", |r: &mut Reading| &mut r.labels);
    }
}

#[test]
fn fields_mode_skips_unsupported_members_silently() {
    let registry = ParserRegistry::new();
    let projector = registry.projector::<Reading>().unwrap();
    assert_eq!(projector.mode(), MemberMode::Fields);
    assert_eq!(projector.member_count(), 3);
    assert_eq!(projector.skipped()[0].name, "Labels");

    let mut cursor = dataset(
        &[
            ("sensor", DataType::Utf8),
            ("value", DataType::Float64),
            ("raw", DataType::Binary),
            ("labels", DataType::Utf8),
        ],
        vec![
            vec![
                Value::Utf8("t1".to_string()),
                Value::Float64(21.5),
                Value::Binary(vec![0xde, 0xad]),
                Value::Utf8("ignored".to_string()),
            ],
            vec![Value::Null, Value::Null, Value::Null, Value::Null],
        ],
    );

    let readings = collect::<Reading>(&registry, &mut cursor);
    assert_eq!(
        readings[0],
        Reading {
            sensor: "t1".to_string(),
            value: 21.5,
            raw: vec![0xde, 0xad],
            labels: Vec::new(),
        }
    );
    assert_eq!(readings[1], Reading::default());
}

struct Opaque;

impl Projectable for Opaque {}

#[test]
fn type_without_constructor_fails_on_first_build() {
    let registry = ParserRegistry::new();
    let mut cursor = dataset(&[("id", DataType::Int32)], vec![vec![Value::Int32(1)]]);

    let err = registry.project::<Opaque>(&mut cursor).err().unwrap();
    assert!(matches!(err, ProjectionError::UnconstructibleType { .. }));
    assert!(err.to_string().contains("zero-argument constructor"));

    // Nothing was consumed.
    let id = registry.project_one::<i32>(&mut cursor).unwrap();
    assert_eq!(id, Some(1));
}

#[derive(Debug, Default, PartialEq)]
struct Counter {
    hits: u32,
}

impl Projectable for Counter {
    fn describe(ty: &mut TypeDescriptor<Self>) {
        ty.constructor(Counter::default)
            .property("Hits", |c: &mut Counter, v: u32| c.hits = v);
    }
}

#[test]
fn conversion_failures_propagate() {
    let registry = ParserRegistry::new();
    let mut cursor = dataset(
        &[("hits", DataType::Int64)],
        vec![vec![Value::Int64(12)], vec![Value::Int64(-4)]],
    );

    let mut rows = registry.project::<Counter>(&mut cursor).unwrap();
    assert_eq!(rows.next().unwrap().unwrap(), Counter { hits: 12 });
    match rows.next().unwrap().unwrap_err() {
        ProjectionError::ConversionFailure { ordinal, target, raw, .. } => {
            assert_eq!((ordinal, target, raw.as_str()), (0, "u32", "-4"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(rows.next().is_none());
}
