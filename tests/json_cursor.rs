use row_projection::cursor::json::{json_cursor_from_path, json_cursor_from_str};
use row_projection::cursor::{CursorOptions, open_path};
use row_projection::types::{DataType, Field, Schema};
use row_projection::{ParserRegistry, Projectable, TypeDescriptor};
use rust_decimal::Decimal;

#[derive(Debug, Default, PartialEq)]
struct Player {
    id: u16,
    name: String,
    score: Decimal,
    nickname: Option<String>,
    initial: char,
}

impl Projectable for Player {
    fn describe(ty: &mut TypeDescriptor<Self>) {
        ty.constructor(Player::default)
            .field("id", |p: &mut Player| &mut p.id)
            .field("user.name", |p: &mut Player| &mut p.name)
            .field("score", |p: &mut Player| &mut p.score)
            .field("nickname", |p: &mut Player| &mut p.nickname)
            .field("USER.NAME", |p: &mut Player| &mut p.initial);
    }
}

fn player_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Int64),
        Field::new("user.name", DataType::Utf8),
        Field::new("score", DataType::Decimal),
        Field::new("nickname", DataType::Utf8),
    ])
}

#[test]
fn projects_json_fixture_with_nested_paths() {
    let registry = ParserRegistry::new();
    let mut cursor = json_cursor_from_path("tests/fixtures/people.json", &player_schema()).unwrap();

    let players: Vec<Player> = registry
        .project::<Player>(&mut cursor)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        players,
        vec![
            Player {
                id: 1,
                name: "Ada".to_string(),
                score: Decimal::new(985, 1),
                nickname: None,
                initial: '\0',
            },
            Player {
                id: 2,
                name: "Grace".to_string(),
                score: Decimal::new(8725, 2),
                nickname: Some("Amazing".to_string()),
                initial: '\0',
            },
        ]
    );

    // The second spelling of `user.name` collided with the first and was dropped.
    let projector = registry.projector::<Player>().unwrap();
    assert_eq!(projector.member_count(), 4);
    assert_eq!(projector.skipped()[0].name, "USER.NAME");
}

#[test]
fn ndjson_rows_project_to_json_values() {
    let schema = Schema::new(vec![Field::new("id", DataType::Int32), Field::new("user.name", DataType::Utf8)]);
    let input = r#"
{"id":1,"user":{"name":"Ada"}}
{"id":2}
"#;
    let mut cursor = json_cursor_from_str(input, &schema).unwrap();
    let rows: Vec<serde_json::Value> = ParserRegistry::new()
        .project::<serde_json::Value>(&mut cursor)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        rows,
        vec![
            serde_json::json!({"id": 1, "user.name": "Ada"}),
            serde_json::json!({"id": 2, "user.name": null}),
        ]
    );
}

#[test]
fn open_path_infers_json_from_extension() {
    let schema = Schema::new(vec![Field::new("user.name", DataType::Utf8)]);
    let mut cursor = open_path("tests/fixtures/people.json", &schema, &CursorOptions::default()).unwrap();
    let names: Vec<String> = ParserRegistry::new()
        .project::<String>(cursor.as_mut())
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names, vec!["Ada".to_string(), "Grace".to_string()]);
}

#[test]
fn json_errors_on_bad_cell() {
    let schema = Schema::new(vec![Field::new("id", DataType::Int32)]);
    let err = json_cursor_from_str(r#"[{"id": "abc"}]"#, &schema).err().unwrap();
    let msg = err.to_string();
    assert!(msg.contains("row 1"));
    assert!(msg.contains("column 'id'"));
}
