//! JSON exchange format for trees.
//!
//! A node is an object:
//!
//! ```json
//! {
//!   "type": "call",
//!   "value": "print",
//!   "id": "n4",
//!   "sourceStart": [3, 4],
//!   "sourceEnd": [3, 16],
//!   "children": { "arg0": { "type": "literal", "value": "1" }, "arg1": null },
//!   "childrenOrder": ["arg0", "arg1"]
//! }
//! ```
//!
//! - `type` is required; everything else is optional.
//! - A `null` child decodes to an [`EMPTY_TYPE`](crate::tree::EMPTY_TYPE) placeholder.
//! - Without `childrenOrder`, children follow the order of the `children` object
//!   as written. Keys missing from `childrenOrder` are appended after the listed ones.
//! - `children` may also be an array; its entries get relation keys `"0"`, `"1"`, ….
//!
//! A placeholder is written back as `null` only when it carries no value, id,
//! span or children; otherwise it is written as a regular object.
//!
//! Serialization always writes `childrenOrder`, so parsing the output gives back
//! the same tree including relation keys and their order.

use indextree::NodeId;
use serde_json::{Map, Value};

use crate::span::SourceLocation;
use crate::tree::{Ast, AstNode, TreeError};

/// Errors raised while reading the exchange format.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The input is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A node is not a JSON object.
    #[error("expected a node object at {path}")]
    NotAnObject {
        /// Location of the offending value
        path: String,
    },

    /// A node has no `type`.
    #[error("node at {path} is missing \"type\"")]
    MissingType {
        /// Location of the node
        path: String,
    },

    /// A field has the wrong JSON type.
    #[error("field {field:?} at {path} must be {expected}")]
    InvalidField {
        /// Location of the node
        path: String,
        /// Field name
        field: &'static str,
        /// What was expected instead
        expected: &'static str,
    },

    /// A source location is not a `[line, column]` pair of non-negative integers.
    #[error("field {field:?} at {path} must be a [line, column] pair")]
    InvalidSourceLocation {
        /// Location of the node
        path: String,
        /// `sourceStart` or `sourceEnd`
        field: &'static str,
    },

    /// `childrenOrder` names a key absent from `children`.
    #[error("childrenOrder at {path} names unknown child {relation:?}")]
    UnknownChild {
        /// Location of the node
        path: String,
        /// The unknown key
        relation: String,
    },

    /// The decoded structure violates a tree invariant.
    #[error("at {path}: {source}")]
    Tree {
        /// Location of the node
        path: String,
        /// Underlying error
        source: TreeError,
    },
}

/// Options for writing the exchange format.
#[derive(Clone, Debug, Default)]
pub struct SerializeOptions {
    /// Whether to write explicit `sourceStart`/`sourceEnd` (default: false)
    pub source_spans: bool,
    /// Whether to pretty-print the JSON text (default: false)
    pub pretty: bool,
}

impl SerializeOptions {
    /// Create new default options (compact, no spans).
    pub fn new() -> Self {
        Self::default()
    }

    /// Include explicit source spans.
    pub fn source_spans(mut self) -> Self {
        self.source_spans = true;
        self
    }

    /// Pretty-print the JSON text.
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

/// Parse a tree from JSON text.
pub fn parse(json: &str) -> Result<Ast, ParseError> {
    let value: Value = serde_json::from_str(json)?;
    from_value(&value)
}

/// Build a tree from an already decoded JSON value.
pub fn from_value(value: &Value) -> Result<Ast, ParseError> {
    let path = String::new();
    let root = node_from_object(as_node_object(value, &path)?, &path)?;
    let mut ast = Ast::new(root);
    let root = ast.root();
    add_children(&mut ast, root, value, &path)?;
    Ok(ast)
}

fn as_node_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ParseError> {
    value.as_object().ok_or_else(|| ParseError::NotAnObject {
        path: display_path(path),
    })
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_owned()
    } else {
        path.to_owned()
    }
}

fn node_from_object(object: &Map<String, Value>, path: &str) -> Result<AstNode, ParseError> {
    let kind = match object.get("type") {
        None | Some(Value::Null) => {
            return Err(ParseError::MissingType {
                path: display_path(path),
            });
        }
        Some(Value::String(kind)) => kind.as_str(),
        Some(_) => {
            return Err(ParseError::InvalidField {
                path: display_path(path),
                field: "type",
                expected: "a string",
            });
        }
    };
    let mut node = AstNode::new(kind).map_err(|source| ParseError::Tree {
        path: display_path(path),
        source,
    })?;
    node.value = optional_string(object, "value", path)?;
    node.id = optional_string(object, "id", path)?;
    node.source_start = optional_location(object, "sourceStart", path)?;
    node.source_end = optional_location(object, "sourceEnd", path)?;
    Ok(node)
}

fn optional_string(
    object: &Map<String, Value>,
    field: &'static str,
    path: &str,
) -> Result<Option<String>, ParseError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ParseError::InvalidField {
            path: display_path(path),
            field,
            expected: "a string",
        }),
    }
}

fn optional_location(
    object: &Map<String, Value>,
    field: &'static str,
    path: &str,
) -> Result<Option<SourceLocation>, ParseError> {
    let Some(value) = object.get(field) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let invalid = || ParseError::InvalidSourceLocation {
        path: display_path(path),
        field,
    };
    let pair = value.as_array().filter(|a| a.len() == 2).ok_or_else(invalid)?;
    let component = |v: &Value| {
        v.as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(invalid)
    };
    Ok(Some(SourceLocation::new(
        component(&pair[0])?,
        component(&pair[1])?,
    )))
}

fn add_children(
    ast: &mut Ast,
    parent: NodeId,
    value: &Value,
    path: &str,
) -> Result<(), ParseError> {
    let object = as_node_object(value, path)?;
    let entries: Vec<(String, &Value)> = match object.get("children") {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Array(children)) => children
            .iter()
            .enumerate()
            .map(|(i, child)| (i.to_string(), child))
            .collect(),
        Some(Value::Object(children)) => ordered_children(object, children, path)?,
        Some(_) => {
            return Err(ParseError::InvalidField {
                path: display_path(path),
                field: "children",
                expected: "an object or an array",
            });
        }
    };

    for (relation, child_value) in entries {
        let child_path = format!("{path}/children/{relation}");
        let child_node = match child_value {
            Value::Null => AstNode::empty(),
            other => node_from_object(as_node_object(other, &child_path)?, &child_path)?,
        };
        let child = ast
            .append_new(parent, Some(&relation), child_node)
            .map_err(|source| ParseError::Tree {
                path: display_path(path),
                source,
            })?;
        if !child_value.is_null() {
            add_children(ast, child, child_value, &child_path)?;
        }
    }
    Ok(())
}

fn ordered_children<'a>(
    object: &Map<String, Value>,
    children: &'a Map<String, Value>,
    path: &str,
) -> Result<Vec<(String, &'a Value)>, ParseError> {
    let Some(order) = object.get("childrenOrder").filter(|v| !v.is_null()) else {
        return Ok(children.iter().map(|(k, v)| (k.clone(), v)).collect());
    };
    let invalid_order = || ParseError::InvalidField {
        path: display_path(path),
        field: "childrenOrder",
        expected: "an array of strings",
    };
    let order = order.as_array().ok_or_else(invalid_order)?;

    let mut entries = Vec::with_capacity(children.len());
    for relation in order {
        let relation = relation.as_str().ok_or_else(invalid_order)?;
        let child = children
            .get(relation)
            .ok_or_else(|| ParseError::UnknownChild {
                path: display_path(path),
                relation: relation.to_owned(),
            })?;
        entries.push((relation.to_owned(), child));
    }
    for (relation, child) in children {
        if !order.iter().any(|listed| listed.as_str() == Some(relation)) {
            entries.push((relation.clone(), child));
        }
    }
    Ok(entries)
}

impl Ast {
    /// Encode the subtree at `node` as a JSON value.
    pub fn to_value(&self, node: NodeId, options: &SerializeOptions) -> Value {
        let data = self.get(node);
        let mut object = Map::new();
        object.insert("type".into(), Value::String(data.kind.clone()));
        if let Some(value) = &data.value {
            object.insert("value".into(), Value::String(value.clone()));
        }
        if let Some(id) = &data.id {
            object.insert("id".into(), Value::String(id.clone()));
        }
        if options.source_spans {
            if let Some(start) = data.source_start {
                object.insert("sourceStart".into(), location_value(start));
            }
            if let Some(end) = data.source_end {
                object.insert("sourceEnd".into(), location_value(end));
            }
        }
        if self.child_count(node) > 0 {
            let mut children = Map::new();
            let mut order = Vec::new();
            for (child, relation) in self.children(node).zip(self.relations(node)) {
                let encoded = if self.is_bare_placeholder(child) {
                    Value::Null
                } else {
                    self.to_value(child, options)
                };
                children.insert(relation.to_owned(), encoded);
                order.push(Value::String(relation.to_owned()));
            }
            object.insert("children".into(), Value::Object(children));
            object.insert("childrenOrder".into(), Value::Array(order));
        }
        Value::Object(object)
    }

    /// A placeholder with nothing that `null` would lose.
    fn is_bare_placeholder(&self, node: NodeId) -> bool {
        let data = self.get(node);
        data.is_empty_placeholder()
            && data.value.is_none()
            && data.id.is_none()
            && data.source_start.is_none()
            && data.source_end.is_none()
            && self.child_count(node) == 0
    }

    /// Serialize the whole tree to compact JSON text.
    pub fn to_json(&self) -> String {
        self.to_json_with(&SerializeOptions::default())
    }

    /// Serialize the whole tree to JSON text.
    pub fn to_json_with(&self, options: &SerializeOptions) -> String {
        let value = self.to_value(self.root(), options);
        if options.pretty {
            format!("{value:#}")
        } else {
            value.to_string()
        }
    }
}

fn location_value(location: SourceLocation) -> Value {
    Value::Array(vec![location.line.into(), location.column.into()])
}
