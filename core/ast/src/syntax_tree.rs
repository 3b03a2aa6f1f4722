//! The untyped parse tree handed over by the external parser.
//!
//! A [`SyntaxNode`] is a tag, an ordered list of raw fields and an optional
//! span. It carries no knowledge of the node taxonomy; the [`Builder`](crate::builder::Builder)
//! is the only consumer and is responsible for validating it.
//!
//! Parse trees usually arrive as JSON objects in the shape produced by
//! [`Arena::to_dict`](crate::arena::Arena::to_dict):
//!
//! ```json
//! {
//!   "ast_type": "BinOp",
//!   "lineno": 1, "col_offset": 0, "end_lineno": 1, "end_col_offset": 5, "src": "0:5",
//!   "left": { "ast_type": "Int", "value": 1, ... },
//!   "op": { "ast_type": "Add" },
//!   "right": { "ast_type": "Int", "value": 2, ... }
//! }
//! ```

use crate::{errors::AstError, nodes::Location, serialize::DICT_AST_SKIPLIST};

pub(crate) const TAG_KEY: &str = "ast_type";
pub(crate) const NODE_ID_KEY: &str = "node_id";
pub(crate) const SPAN_KEYS: [&str; 5] = ["lineno", "col_offset", "end_lineno", "end_col_offset", "src"];

/// A raw field value.
#[derive(Clone, PartialEq, Debug)]
pub enum SyntaxValue {
    Node(SyntaxNode),
    List(Vec<SyntaxValue>),
    /// Numeric literal text, kept verbatim so wide integers survive.
    Number(String),
    Str(String),
    Bool(bool),
    Null,
}

/// A node of the generic parse tree.
#[derive(Clone, PartialEq, Debug)]
pub struct SyntaxNode {
    pub tag: String,
    pub fields: Vec<(String, SyntaxValue)>,
    pub location: Option<Location>,
    /// Set when the description spells out `"lineno": null`, the form used for nodes
    /// that never had a span. Such nodes are accepted without one.
    pub synthesized: bool,
}

impl SyntaxNode {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            fields: Vec::new(),
            location: None,
            synthesized: false,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<SyntaxValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&SyntaxValue> {
        self.fields
            .iter()
            .find_map(|(field, value)| (field == name).then_some(value))
    }

    /// Reads a node description from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`AstError::MalformedInput`] if `value` is not an object, has no
    /// string `ast_type` or carries a span key of the wrong type.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, AstError> {
        let serde_json::Value::Object(object) = value else {
            return Err(AstError::MalformedInput {
                reason: format!("expected a node object, found `{value}`"),
            });
        };
        let tag = object
            .get(TAG_KEY)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| AstError::MalformedInput {
                reason: format!("node object has no `{TAG_KEY}` string"),
            })?;
        let location = location_from_json(object)?;
        let synthesized =
            location.is_none() && matches!(object.get("lineno"), Some(serde_json::Value::Null));
        let mut fields = Vec::with_capacity(object.len());
        for (key, raw) in object {
            let key = key.as_str();
            if key == TAG_KEY
                || key == NODE_ID_KEY
                || SPAN_KEYS.contains(&key)
                || DICT_AST_SKIPLIST.contains(&key)
            {
                continue;
            }
            fields.push((key.to_string(), SyntaxValue::from_json(raw)?));
        }
        Ok(Self {
            tag: tag.to_string(),
            fields,
            location,
            synthesized,
        })
    }
}

impl SyntaxValue {
    /// # Errors
    ///
    /// Returns [`AstError::MalformedInput`] for nested objects that are not node descriptions.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, AstError> {
        Ok(match value {
            serde_json::Value::Null => SyntaxValue::Null,
            serde_json::Value::Bool(b) => SyntaxValue::Bool(*b),
            serde_json::Value::Number(n) => SyntaxValue::Number(n.to_string()),
            serde_json::Value::String(s) => SyntaxValue::Str(s.clone()),
            serde_json::Value::Array(items) => SyntaxValue::List(
                items
                    .iter()
                    .map(SyntaxValue::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(_) => SyntaxValue::Node(SyntaxNode::from_json(value)?),
        })
    }

    /// Short description used in error messages.
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            SyntaxValue::Node(_) => "a node",
            SyntaxValue::List(_) => "a list",
            SyntaxValue::Number(_) => "a number",
            SyntaxValue::Str(_) => "a string",
            SyntaxValue::Bool(_) => "a boolean",
            SyntaxValue::Null => "null",
        }
    }
}

impl From<SyntaxNode> for SyntaxValue {
    fn from(node: SyntaxNode) -> Self {
        SyntaxValue::Node(node)
    }
}

impl From<Vec<SyntaxNode>> for SyntaxValue {
    fn from(nodes: Vec<SyntaxNode>) -> Self {
        SyntaxValue::List(nodes.into_iter().map(SyntaxValue::Node).collect())
    }
}

impl From<&str> for SyntaxValue {
    fn from(value: &str) -> Self {
        SyntaxValue::Str(value.to_string())
    }
}

impl From<i64> for SyntaxValue {
    fn from(value: i64) -> Self {
        SyntaxValue::Number(value.to_string())
    }
}

impl From<bool> for SyntaxValue {
    fn from(value: bool) -> Self {
        SyntaxValue::Bool(value)
    }
}

fn span_number(
    object: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Result<Option<u32>, AstError> {
    match object.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| AstError::MalformedInput {
                reason: format!("span key `{key}` must be a non-negative integer, found `{value}`"),
            }),
    }
}

fn parse_src(src: &str) -> Option<(u32, u32)> {
    let (offset, length) = src.split_once(':')?;
    let offset: u32 = offset.parse().ok()?;
    let length: u32 = length.parse().ok()?;
    Some((offset, offset.checked_add(length)?))
}

/// A node has a span when it carries `lineno` or `src`; missing parts default to zero.
fn location_from_json(
    object: &serde_json::Map<String, serde_json::Value>,
) -> Result<Option<Location>, AstError> {
    let start_line = span_number(object, "lineno")?;
    let offsets = match object.get("src") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(src)) => {
            Some(parse_src(src).ok_or_else(|| AstError::MalformedInput {
                reason: format!("span key `src` must look like `offset:length`, found `{src}`"),
            })?)
        }
        Some(other) => {
            return Err(AstError::MalformedInput {
                reason: format!("span key `src` must be a string, found `{other}`"),
            });
        }
    };
    if start_line.is_none() && offsets.is_none() {
        return Ok(None);
    }
    let (offset_start, offset_end) = offsets.unwrap_or_default();
    let start_line = start_line.unwrap_or_default();
    Ok(Some(Location::new(
        offset_start,
        offset_end,
        start_line,
        span_number(object, "col_offset")?.unwrap_or_default(),
        span_number(object, "end_lineno")?.unwrap_or(start_line),
        span_number(object, "end_col_offset")?.unwrap_or_default(),
    )))
}
