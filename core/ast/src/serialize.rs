//! Conversion of a subtree to an ordered JSON mapping.
//!
//! The mapping has the same shape the builder reads: `ast_type`, `node_id`, the span
//! keys, then the semantic fields in declared order. Key order and the skip list are
//! stable. Serialization is read-only and never folds.

use num_traits::ToPrimitive;
use serde_json::{Map, Value as Json};

use crate::{
    arena::Arena,
    errors::AstError,
    nodes::{Field, Location, Value},
    syntax_tree::{NODE_ID_KEY, TAG_KEY},
};

/// Metadata that is never part of a `to_dict` mapping.
pub const DICT_AST_SKIPLIST: &[&str] = &["parent", "annotations", "folded_value"];

impl Arena {
    /// Serializes the subtree under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AstError::NotFound`] if `id` or any node it references does not exist.
    pub fn to_dict(&self, id: u32) -> Result<Map<String, Json>, AstError> {
        let node = self.get_node(id)?;
        let mut dict = Map::new();
        dict.insert(TAG_KEY.to_string(), Json::from(node.kind.name()));
        dict.insert(NODE_ID_KEY.to_string(), Json::from(node.id));
        insert_span(&mut dict, node.location.as_ref());
        for (name, field) in node.fields() {
            debug_assert!(!DICT_AST_SKIPLIST.contains(&name));
            let value = match field {
                Field::Node(child) => Json::Object(self.to_dict(*child)?),
                Field::List(children) => Json::Array(
                    children
                        .iter()
                        .map(|child| self.to_dict(*child).map(Json::Object))
                        .collect::<Result<_, _>>()?,
                ),
                Field::Value(value) => value_to_json(value),
                Field::Absent => Json::Null,
            };
            dict.insert(name.to_string(), value);
        }
        Ok(dict)
    }
}

fn insert_span(dict: &mut Map<String, Json>, location: Option<&Location>) {
    let (lineno, col_offset, end_lineno, end_col_offset, src) = match location {
        Some(l) => (
            Json::from(l.start_line),
            Json::from(l.start_column),
            Json::from(l.end_line),
            Json::from(l.end_column),
            Json::from(format!(
                "{}:{}",
                l.offset_start,
                l.offset_end.saturating_sub(l.offset_start)
            )),
        ),
        None => (Json::Null, Json::Null, Json::Null, Json::Null, Json::Null),
    };
    dict.insert("lineno".to_string(), lineno);
    dict.insert("col_offset".to_string(), col_offset);
    dict.insert("end_lineno".to_string(), end_lineno);
    dict.insert("end_col_offset".to_string(), end_col_offset);
    dict.insert("src".to_string(), src);
}

/// Wide integers that do not fit a JSON number are written as decimal strings.
fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Int(int) => int
            .to_i64()
            .map(Json::from)
            .or_else(|| int.to_u64().map(Json::from))
            .unwrap_or_else(|| Json::String(int.to_string())),
        Value::Decimal(decimal) => Json::String(decimal.to_string()),
        Value::Str(text) => Json::String(text.clone()),
        Value::Bytes(bytes) => Json::String(format!("0x{}", hex::encode(bytes))),
        Value::Bool(b) => Json::Bool(*b),
    }
}
