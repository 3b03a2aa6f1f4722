use crate::utils::{build_fixture, detached, get_test_data_path, int};
use serde_json::{Value, json};
use snek::{fold_constants, parse_json, parse_value, to_json};
use snek_ast::{filter::NodeFilter, nodes::NodeKind};

fn fixture_text(name: &str) -> String {
    let path = get_test_data_path().join("json").join(format!("{name}.json"));
    std::fs::read_to_string(path).unwrap()
}

fn error_chain(err: &anyhow::Error) -> String {
    format!("{err:#}")
}

#[test]
fn test_fold_and_replace_scenario() {
    let mut arena = parse_json(&fixture_text("constants")).unwrap();
    let root = arena.root().unwrap();
    let decl = arena.root_node().unwrap().body_get(0).unwrap();

    assert_eq!(fold_constants(&mut arena).unwrap(), 1);
    let folded = arena.find_node(decl).unwrap().child("value").unwrap();
    let dict = arena.to_dict(folded).unwrap();
    assert_eq!(dict["ast_type"], json!("Int"));
    assert_eq!(dict["value"], json!(3));
    assert_eq!(dict["src"], json!("9:5"));

    let five = detached(&mut arena, &int(5));
    arena.replace_in_tree(folded, five).unwrap();
    let before = arena.to_dict(root).unwrap();
    let decl_dict = &before["body"][0];
    assert_eq!(decl_dict["value"]["value"], json!(5));
    assert_eq!(decl_dict["value"]["lineno"], Value::Null);
    assert_eq!(decl_dict["target"]["id"], json!("x"));
    assert_eq!(decl_dict["annotation"]["id"], json!("int"));
    assert_eq!(decl_dict["is_constant"], json!(false));

    let second = &before["body"][1];
    assert_eq!(second["value"]["ast_type"], json!("BinOp"));
    assert_eq!(second["value"]["left"]["id"], json!("x"));
    assert!(arena.parent_links_consistent());

    // The synthesized literal serializes with null spans and still parses back.
    let rebuilt = parse_json(&to_json(&arena, false).unwrap()).unwrap();
    assert_eq!(
        arena.node_ref(root).unwrap(),
        rebuilt.node_ref(rebuilt.root().unwrap()).unwrap()
    );
    let rebuilt_decl = rebuilt.root_node().unwrap().body_get(0).unwrap();
    let rebuilt_five = rebuilt.find_node(rebuilt_decl).unwrap().child("value").unwrap();
    assert_eq!(rebuilt.find_node(rebuilt_five).unwrap().location, None);

    let reparsed = parse_value(&Value::Object(before)).unwrap();
    assert_eq!(
        arena.node_ref(root).unwrap(),
        reparsed.node_ref(reparsed.root().unwrap()).unwrap()
    );
}

#[test]
fn test_fold_constants_on_token_contract() {
    let mut arena = build_fixture("token");
    assert_eq!(fold_constants(&mut arena).unwrap(), 6);
    assert!(arena.parent_links_consistent());

    let root = arena.root().unwrap();
    let decimals = arena.root_node().unwrap().body_get(3).unwrap();
    let value = arena.find_node(decimals).unwrap().child("value").unwrap();
    assert_eq!(
        arena.to_dict(value).unwrap()["value"],
        json!(1_000_000_000_000_000_000_u64)
    );

    let fee = arena.root_node().unwrap().body_get(4).unwrap();
    let value = arena.find_node(fee).unwrap().child("value").unwrap();
    assert_eq!(arena.to_dict(value).unwrap()["value"], json!("0.025"));

    assert!(arena.get_descendants(root, &NodeKind::Pow.into()).is_empty());
    assert_eq!(fold_constants(&mut arena).unwrap(), 0);
}

#[test]
fn test_folding_leaves_runtime_expressions() {
    let mut arena = build_fixture("token");
    fold_constants(&mut arena).unwrap();
    let root = arena.root().unwrap();
    let binops = arena.get_descendants(root, &NodeKind::BinOp.into());
    assert!(!binops.is_empty());
    for id in binops {
        assert!(arena.fold(id).is_err());
    }
    assert_eq!(arena.len(), arena.get_descendants(root, &NodeFilter::new().include_self()).len());
}

#[test]
fn test_division_by_zero_is_reported() {
    let mut arena = parse_json(&fixture_text("division_by_zero")).unwrap();
    let err = fold_constants(&mut arena).unwrap_err();
    let chain = error_chain(&err);
    assert!(chain.contains("Constant folding failed at 1:"), "{chain}");
    assert!(chain.contains("division by zero"), "{chain}");
}

#[test]
fn test_invalid_json_is_reported() {
    let err = parse_json("{ not json").unwrap_err();
    assert!(error_chain(&err).starts_with("Parse tree is not valid JSON"));

    let err = parse_value(&json!([1, 2])).unwrap_err();
    assert!(error_chain(&err).starts_with("Failed to read parse tree"));
}

#[test]
fn test_unsupported_syntax_is_reported() {
    let err = parse_json(&fixture_text("unsupported")).unwrap_err();
    let chain = error_chain(&err);
    assert!(chain.starts_with("Failed to build AST"), "{chain}");
    assert!(chain.contains("Lambda"), "{chain}");
    assert!(chain.contains("1:0"), "{chain}");
}

#[test]
fn test_to_json_layouts() {
    let arena = parse_json(&fixture_text("constants")).unwrap();
    let compact = to_json(&arena, false).unwrap();
    let pretty = to_json(&arena, true).unwrap();
    assert!(!compact.contains('\n'));
    assert!(pretty.contains('\n'));
    assert!(compact.starts_with(r#"{"ast_type":"Module","node_id":1,"#));
    let a: Value = serde_json::from_str(&compact).unwrap();
    let b: Value = serde_json::from_str(&pretty).unwrap();
    assert_eq!(a, b);

    let rebuilt = parse_json(&compact).unwrap();
    assert_eq!(
        arena.node_ref(1).unwrap(),
        rebuilt.node_ref(rebuilt.root().unwrap()).unwrap()
    );
}
