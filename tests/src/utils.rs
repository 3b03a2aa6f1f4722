use serde_json::{Value, json};
use snek_ast::{
    arena::Arena,
    builder::build_ast,
    filter::NodeFilter,
    nodes::NodeKind,
    syntax_tree::SyntaxNode,
};

pub(crate) fn get_test_data_path() -> std::path::PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::env::current_dir().unwrap());
    manifest_dir.join("test_data")
}

/// Parse tree fixture `test_data/json/<name>.json`.
pub(crate) fn load_fixture(name: &str) -> Value {
    let path = get_test_data_path().join("json").join(format!("{name}.json"));
    let text = std::fs::read_to_string(&path).unwrap();
    serde_json::from_str(&text).unwrap()
}

/// Source text the fixture `name` was parsed from.
pub(crate) fn fixture_source(name: &str) -> String {
    let path = get_test_data_path().join("src").join(format!("{name}.snek"));
    std::fs::read_to_string(path).unwrap()
}

pub(crate) fn build_fixture(name: &str) -> Arena {
    build_json(&load_fixture(name))
}

pub(crate) fn build_json(value: &Value) -> Arena {
    try_build(value).unwrap()
}

pub(crate) fn try_build(value: &Value) -> Result<Arena, snek_ast::errors::AstError> {
    build_ast(&SyntaxNode::from_json(value)?)
}

/// Gives every node description without a span the span `line:0`.
pub(crate) fn spanned_at(mut value: Value, line: u32) -> Value {
    add_spans(&mut value, line);
    value
}

pub(crate) fn spanned(value: Value) -> Value {
    spanned_at(value, 1)
}

fn add_spans(value: &mut Value, line: u32) {
    match value {
        Value::Object(object) => {
            if object.contains_key("ast_type") && !object.contains_key("lineno") {
                object.insert("lineno".to_string(), json!(line));
                object.insert("col_offset".to_string(), json!(0));
                object.insert("end_lineno".to_string(), json!(line));
                object.insert("end_col_offset".to_string(), json!(1));
                object.insert("src".to_string(), json!("0:1"));
            }
            for (_, child) in object.iter_mut() {
                add_spans(child, line);
            }
        }
        Value::Array(items) => {
            for item in items {
                add_spans(item, line);
            }
        }
        _ => {}
    }
}

pub(crate) fn module(body: Vec<Value>) -> Value {
    json!({"ast_type": "Module", "body": body})
}

/// Module holding a single expression statement.
pub(crate) fn expr_module(expr: Value) -> Value {
    module(vec![json!({"ast_type": "Expr", "value": expr})])
}

/// Builds `expr` inside an expression statement and returns the arena and the expression id.
pub(crate) fn build_expr(expr: Value) -> (Arena, u32) {
    build_expr_at(expr, 1)
}

pub(crate) fn build_expr_at(expr: Value, line: u32) -> (Arena, u32) {
    let arena = build_json(&spanned_at(expr_module(expr), line));
    let id = expr_id(&arena);
    (arena, id)
}

pub(crate) fn expr_id(arena: &Arena) -> u32 {
    let statement = arena.root_node().unwrap().body_get(0).unwrap();
    arena.find_node(statement).unwrap().child("value").unwrap()
}

/// Builds a synthesized node from JSON without spans.
pub(crate) fn detached(arena: &mut Arena, value: &Value) -> u32 {
    arena
        .build_detached(&SyntaxNode::from_json(value).unwrap())
        .unwrap()
}

/// Pre-order descendants of the root of the given kind.
pub(crate) fn nodes_of(arena: &Arena, kind: NodeKind) -> Vec<u32> {
    arena.get_descendants(arena.root().unwrap(), &NodeFilter::new().kind(kind))
}

pub(crate) fn op(tag: &str) -> Value {
    json!({"ast_type": tag})
}

pub(crate) fn int(value: i64) -> Value {
    json!({"ast_type": "Int", "value": value})
}

pub(crate) fn big_int(value: &str) -> Value {
    json!({"ast_type": "Int", "value": value})
}

pub(crate) fn dec(value: &str) -> Value {
    json!({"ast_type": "Decimal", "value": value})
}

pub(crate) fn string(value: &str) -> Value {
    json!({"ast_type": "Str", "value": value})
}

pub(crate) fn boolean(value: bool) -> Value {
    json!({"ast_type": "NameConstant", "value": value})
}

pub(crate) fn name(id: &str) -> Value {
    json!({"ast_type": "Name", "id": id})
}

pub(crate) fn binop(left: Value, tag: &str, right: Value) -> Value {
    json!({"ast_type": "BinOp", "left": left, "op": op(tag), "right": right})
}

pub(crate) fn unary(tag: &str, operand: Value) -> Value {
    json!({"ast_type": "UnaryOp", "op": op(tag), "operand": operand})
}

pub(crate) fn compare(left: Value, tag: &str, right: Value) -> Value {
    json!({"ast_type": "Compare", "left": left, "op": op(tag), "right": right})
}

pub(crate) fn boolop(tag: &str, values: Vec<Value>) -> Value {
    json!({"ast_type": "BoolOp", "op": op(tag), "values": values})
}

pub(crate) fn list(elements: Vec<Value>) -> Value {
    json!({"ast_type": "List", "elements": elements})
}

pub(crate) fn subscript(value: Value, slice: Value) -> Value {
    json!({"ast_type": "Subscript", "value": value, "slice": slice})
}

pub(crate) fn if_exp(test: Value, body: Value, orelse: Value) -> Value {
    json!({"ast_type": "IfExp", "test": test, "body": body, "orelse": orelse})
}
