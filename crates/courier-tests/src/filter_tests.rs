use courier_core::{Filter, FilterError};
use serde_json::{Value, json};

fn record() -> Value {
    json!({
        "user": "42",
        "channel": "chat:index",
        "info": {"latency_ms": 310, "ratio": 0.5, "tags": ["a", "b"]},
        "data": {"kind": "join", "items": [{"id": 7}, {"id": 8}], "text": ""},
        "flags": {},
        "ok": true,
        "count": 0
    })
}

fn matches(expr: &str) -> bool {
    Filter::compile(expr)
        .unwrap_or_else(|e| panic!("{expr:?} failed to compile: {e}"))
        .matches(&record())
}

#[test]
fn test_equality_on_strings_and_numbers() {
    assert!(matches(r#"user == "42""#));
    assert!(matches("user == '42'"));
    assert!(!matches("user == 42"));
    assert!(matches("info.latency_ms == 310"));
    assert!(matches("info.latency_ms == 310.0"));
    assert!(matches("info.ratio != 1"));
}

#[test]
fn test_ordering_comparisons() {
    assert!(matches("info.latency_ms >= 250"));
    assert!(matches("info.latency_ms > 309.5"));
    assert!(!matches("info.latency_ms < 310"));
    assert!(matches("info.latency_ms <= 310"));
    assert!(matches(r#"channel > "chat:a""#));
    // Mixed types never order.
    assert!(!matches(r#"info.latency_ms > "1""#));
    assert!(!matches("missing < 1"));
}

#[test]
fn test_string_operators() {
    assert!(matches(r#"channel startswith "chat:""#));
    assert!(matches(r#"channel endswith ":index""#));
    assert!(matches(r#"channel contains "t:i""#));
    assert!(!matches(r#"info.latency_ms startswith "3""#));
}

#[test]
fn test_membership_operators() {
    assert!(matches(r#"info.tags contains "a""#));
    assert!(!matches(r#"info.tags contains "z""#));
    assert!(matches(r#"data contains "kind""#));
    assert!(matches(r#"data.kind in ["join", "leave"]"#));
    assert!(!matches(r#"data.kind in ["leave"]"#));
    assert!(matches("info.latency_ms in [1, 310.0]"));
    assert!(!matches("user in []"));
}

#[test]
fn test_paths_with_indexes_and_quoted_keys() {
    assert!(matches("data.items[0].id == 7"));
    assert!(matches("data.items[1].id == 8"));
    assert!(matches(r#"data["kind"] == "join""#));
    assert!(matches("data.items[5].id == null"));
    assert!(matches("user.name == null"));
}

#[test]
fn test_boolean_logic_and_precedence() {
    assert!(matches(r#"user == "1" || user == "42""#));
    assert!(matches(r#"user == "1" or user == "42""#));
    assert!(!matches(r#"user == "42" && channel == "news""#));
    // `and` binds tighter than `or`.
    assert!(matches(r#"user == "42" or channel == "x" and ok == false"#));
    assert!(!matches(r#"(user == "42" or channel == "x") and ok == false"#));
    assert!(matches(r#"not (data.kind in ["leave"])"#));
    assert!(matches("!missing"));
    assert!(matches("not not ok"));
}

#[test]
fn test_keywords_are_case_insensitive() {
    assert!(matches(r#"channel STARTSWITH "chat" AND ok == TRUE"#));
}

#[test]
fn test_truthiness() {
    assert!(matches("ok"));
    assert!(matches("user"));
    assert!(matches("info.tags"));
    assert!(!matches("count"));
    assert!(!matches("flags"));
    assert!(!matches("data.text"));
    assert!(!matches("missing"));
    assert!(!matches("null"));
}

#[test]
fn test_filter_applies_to_non_object_records() {
    let filter = Filter::compile("missing == null").unwrap();
    assert!(filter.matches(&json!([1, 2, 3])));
    assert!(filter.matches(&json!("text")));
}

#[test]
fn test_source_is_kept_and_from_str_works() {
    let filter: Filter = r#"user == "42""#.parse().unwrap();
    assert_eq!(filter.source(), r#"user == "42""#);
    assert!(filter.matches(&record()));
}

#[test]
fn test_compile_errors_report_positions() {
    assert_eq!(Filter::compile("").unwrap_err(), FilterError::Empty);
    assert_eq!(Filter::compile("   ").unwrap_err(), FilterError::Empty);

    assert_eq!(
        Filter::compile(r#"user = "42""#).unwrap_err(),
        FilterError::UnexpectedChar { ch: '=', pos: 5 }
    );
    assert_eq!(
        Filter::compile(r#"user == "42"#).unwrap_err(),
        FilterError::UnterminatedString { pos: 8 }
    );
    assert_eq!(
        Filter::compile(r#"(user == "42""#).unwrap_err(),
        FilterError::UnexpectedEnd
    );
    assert_eq!(
        Filter::compile(r#"user == "42")"#).unwrap_err(),
        FilterError::UnexpectedToken {
            found: ")".to_string(),
            pos: 12
        }
    );
    assert_eq!(Filter::compile("user ==").unwrap_err(), FilterError::UnexpectedEnd);
    assert_eq!(
        Filter::compile("user # 1").unwrap_err(),
        FilterError::UnexpectedChar { ch: '#', pos: 5 }
    );
}

#[test]
fn test_invalid_escapes_and_numbers() {
    let err = Filter::compile(r#"user == "a\q""#).unwrap_err();
    assert!(matches!(err, FilterError::InvalidEscape { ch: 'q', .. }));

    let err = Filter::compile("count == 1.2.3").unwrap_err();
    assert_eq!(
        err,
        FilterError::InvalidNumber {
            text: "1.2.3".to_string(),
            pos: 9
        }
    );
    assert_eq!(err.position(), Some(9));
}

#[test]
fn test_invalid_path_segments() {
    assert!(matches!(
        Filter::compile("data.").unwrap_err(),
        FilterError::UnexpectedEnd
    ));
    assert!(matches!(
        Filter::compile("data.items[-1]").unwrap_err(),
        FilterError::UnexpectedToken { .. }
    ));
    assert!(matches!(
        Filter::compile("user in [other]").unwrap_err(),
        FilterError::UnexpectedToken { .. }
    ));
}

#[test]
fn test_error_position_is_none_for_structural_errors() {
    assert_eq!(FilterError::Empty.position(), None);
    assert_eq!(FilterError::UnexpectedEnd.position(), None);
    assert_eq!(
        FilterError::UnterminatedString { pos: 3 }.to_string(),
        "Unterminated string starting at position 3"
    );
}

#[test]
fn test_deep_nesting_is_rejected() {
    let nested = |depth: usize| format!("{}ok{}", "(".repeat(depth), ")".repeat(depth));

    assert!(Filter::compile(&nested(128)).unwrap().matches(&record()));

    let err = Filter::compile(&nested(129)).unwrap_err();
    assert_eq!(err, FilterError::TooDeep { pos: 128 });
    assert_eq!(err.position(), Some(128));

    assert!(matches!(
        Filter::compile(&nested(5000)),
        Err(FilterError::TooDeep { .. })
    ));
    assert!(matches!(
        Filter::compile(&format!("{}ok", "not ".repeat(5000))),
        Err(FilterError::TooDeep { .. })
    ));
    assert!(matches!(
        Filter::compile(&format!("{}ok", "!(".repeat(3000))),
        Err(FilterError::TooDeep { .. })
    ));
}

#[test]
fn test_long_flat_chains_compile_and_evaluate() {
    let mut expr = vec!["missing"; 10_000].join(" or ");
    expr.push_str(" or ok");
    assert!(Filter::compile(&expr).unwrap().matches(&record()));

    let all = vec!["ok"; 10_000].join(" && ");
    assert!(Filter::compile(&all).unwrap().matches(&record()));
}
