use craft_grammar::{
    Clause, Environment, GrammarError, GrammarVariant, LeafRejection, ParseOptions, SelectorSet,
    Statement, Value, evaluate, parse,
};
use serde_json::json;

fn tree(raw: serde_json::Value) -> Statement {
    parse(&Value::from(raw), &ParseOptions::default()).unwrap()
}

fn strings_only(value: Value) -> Result<Value, LeafRejection> {
    match value {
        Value::Scalar(craft_grammar::Scalar::String(_)) => Ok(value),
        _ => Err(LeafRejection::expected("a string")),
    }
}

/// Evaluating the same inputs twice gives the same outcome
#[test]
fn test_evaluation_is_repeatable() {
    let trees = [
        tree(json!(["x", {"on amd64": ["y"]}, "z"])),
        tree(json!([{"on amd64": "a"}, {"on amd64,arm64": "b"}])),
        tree(json!([{"on arm64": "a"}, "else fail"])),
        tree(json!([{"try": 42}, {"else": "fallback"}])),
    ];
    let envs = [Environment::native("amd64"), Environment::native("arm64")];

    for t in &trees {
        for env in &envs {
            let first = evaluate(t, env, Some(&strings_only));
            let second = evaluate(t, env, Some(&strings_only));
            assert_eq!(first, second);
        }
    }
}

/// `other` is taken only when no named sibling matched
#[test]
fn test_default_only_if_unmatched() {
    let t = tree(json!([{"on amd64": "A"}, {"on other": "B"}]));
    assert_eq!(
        evaluate(&t, &Environment::native("amd64"), None).unwrap(),
        Value::string("A")
    );
    assert_eq!(
        evaluate(&t, &Environment::native("arm64"), None).unwrap(),
        Value::string("B")
    );
}

/// `other` listed first still defers to a later named sibling
#[test]
fn test_default_position_does_not_matter() {
    let t = tree(json!([{"on other": "B"}, {"on amd64": "A"}]));
    assert_eq!(
        evaluate(&t, &Environment::native("amd64"), None).unwrap(),
        Value::string("A")
    );
}

#[test]
fn test_ambiguity_detection() {
    let on_amd64 = |body: &str| {
        Statement::On(Clause::new(
            SelectorSet::parse("amd64").unwrap(),
            Statement::leaf(body),
        ))
    };
    let t = Statement::Sequence(vec![on_amd64("A"), on_amd64("B")]);
    let err = evaluate(&t, &Environment::native("amd64"), None).unwrap_err();
    match err {
        GrammarError::AmbiguousSelection { first, second, value, .. } => {
            assert_eq!(first, "on amd64");
            assert_eq!(second, "on amd64");
            assert_eq!(value, "amd64");
        }
        other => panic!("expected an ambiguity, got {:?}", other),
    }

    // No clause names arm64, so nothing is ambiguous.
    assert_eq!(
        evaluate(&t, &Environment::native("arm64"), None).unwrap(),
        Value::Unset
    );
}

/// Written out, the same pair of clauses is rejected before evaluation
#[test]
fn test_identical_clauses_rejected_when_parsed() {
    let raw = Value::from(json!([{"on amd64": "A"}, {"on amd64": "B"}]));
    let err = parse(&raw, &ParseOptions::default()).unwrap_err();
    assert!(err.is_construction_error());
    assert!(err.to_string().contains("found duplicate 'on amd64' statements"));
}

#[test]
fn test_list_concatenation_order() {
    let t = tree(json!(["x", {"on amd64": ["y"]}, "z"]));
    assert_eq!(
        evaluate(&t, &Environment::native("amd64"), None).unwrap(),
        Value::sequence(["x", "y", "z"])
    );
    assert_eq!(
        evaluate(&t, &Environment::native("arm64"), None).unwrap(),
        Value::sequence(["x", "z"])
    );
}

#[test]
fn test_try_else_fallback_on_type_failure() {
    let t = tree(json!([{"try": 42}, {"else": "fallback"}]));
    let value = evaluate(&t, &Environment::native("amd64"), Some(&strings_only)).unwrap();
    assert_eq!(value, Value::string("fallback"));

    // Without a validator nothing is rejected.
    let value = evaluate(&t, &Environment::native("amd64"), None).unwrap();
    assert_eq!(value, Value::integer(42));
}

#[test]
fn test_platform_wildcard() {
    let options = ParseOptions::new(GrammarVariant::Platform);
    let t = parse(&Value::from(json!({"for any": "v"})), &options).unwrap();
    for platform in ["jammy", "noble", "core24", "other", ""] {
        let env = Environment::native("amd64").with_platform(platform);
        assert_eq!(evaluate(&t, &env, None).unwrap(), Value::string("v"));
    }
}

#[test]
fn test_selector_validation_at_construction() {
    let options = ParseOptions::default().with_valid_architectures(["amd64", "arm64"]);
    let err = parse(&Value::from(json!({"on riscv64": "x"})), &options).unwrap_err();
    assert!(matches!(err, GrammarError::UnknownSelector { .. }));
    assert!(err.is_construction_error());
    insta::assert_snapshot!(err.to_string(), @"Unknown architecture: 'riscv64' in 'on' clause");
}

#[test]
fn test_dangling_else_at_construction() {
    for raw in [json!([{"else": "x"}]), json!({"else": "x"}), json!(["else fail"])] {
        let err = parse(&Value::from(raw), &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, GrammarError::MalformedStatement { .. }));
    }
}

#[test]
fn test_unset_is_distinguishable_at_top_level() {
    let t = tree(json!({"on arm64": "x"}));
    let value = evaluate(&t, &Environment::native("amd64"), None).unwrap();
    assert!(value.is_unset());
    let err = value.into_required(Some("source")).unwrap_err();
    assert_eq!(err.code(), "G-2-04");
}
