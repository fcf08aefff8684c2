//! Structural JSON diff producing RFC 6902 `add`/`remove`/`replace` steps.
//!
//! Objects are compared key by key, arrays positionally. Surplus trailing
//! array elements are removed from the highest index down so the sequence can
//! be applied in order; missing trailing elements are appended.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PatchError, PatchResult};

/// One structural edit addressed by a JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    /// Insert a value that is absent from the source tree.
    Add {
        /// Pointer to the inserted location.
        path: String,
        /// Inserted value.
        value: Value,
    },
    /// Drop a value that is absent from the target tree.
    Remove {
        /// Pointer to the removed location.
        path: String,
    },
    /// Swap a value that differs between source and target.
    Replace {
        /// Pointer to the replaced location.
        path: String,
        /// Replacement value.
        value: Value,
    },
}

impl PatchOperation {
    /// Pointer addressed by the operation.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Add { path, .. } | Self::Remove { path } | Self::Replace { path, .. } => path,
        }
    }
}

/// Compute the operations that transform `from` into `to`.
#[must_use]
pub fn diff(from: &Value, to: &Value) -> Vec<PatchOperation> {
    let mut operations = Vec::new();
    diff_at("", from, to, &mut operations);
    operations
}

fn diff_at(path: &str, from: &Value, to: &Value, operations: &mut Vec<PatchOperation>) {
    if same_value(from, to) {
        return;
    }

    match (from, to) {
        (Value::Object(old), Value::Object(new)) => {
            for (key, old_value) in old {
                let child = child_path(path, key);
                match new.get(key) {
                    Some(new_value) => diff_at(&child, old_value, new_value, operations),
                    None => operations.push(PatchOperation::Remove { path: child }),
                }
            }
            for (key, new_value) in new {
                if !old.contains_key(key) {
                    operations.push(PatchOperation::Add {
                        path: child_path(path, key),
                        value: new_value.clone(),
                    });
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => {
            let shared = old.len().min(new.len());
            for (index, (old_value, new_value)) in old.iter().zip(new.iter()).enumerate() {
                diff_at(&format!("{path}/{index}"), old_value, new_value, operations);
            }
            for index in (shared..old.len()).rev() {
                operations.push(PatchOperation::Remove {
                    path: format!("{path}/{index}"),
                });
            }
            for (index, value) in new.iter().enumerate().skip(shared) {
                operations.push(PatchOperation::Add {
                    path: format!("{path}/{index}"),
                    value: value.clone(),
                });
            }
        }
        _ => operations.push(PatchOperation::Replace {
            path: path.to_string(),
            value: to.clone(),
        }),
    }
}

/// Numbers compare by magnitude so `1` and `1.0` are the same value.
fn same_value(from: &Value, to: &Value) -> bool {
    match (from, to) {
        (Value::Number(old), Value::Number(new)) if old != new => {
            matches!((old.as_f64(), new.as_f64()), (Some(a), Some(b)) if a == b)
        }
        _ => from == to,
    }
}

/// Apply `operations` to `document` in order.
///
/// # Errors
///
/// Returns a [`PatchError`] when a pointer is malformed or does not resolve
/// against the document as modified by the preceding operations.
pub fn apply(document: &mut Value, operations: &[PatchOperation]) -> PatchResult<()> {
    for operation in operations {
        match operation {
            PatchOperation::Add { path, value } => add(document, path, value.clone())?,
            PatchOperation::Remove { path } => remove(document, path)?,
            PatchOperation::Replace { path, value } => {
                let target = document
                    .pointer_mut(path)
                    .ok_or_else(|| PatchError::MissingPath {
                        pointer: path.clone(),
                    })?;
                *target = value.clone();
            }
        }
    }
    Ok(())
}

fn add(document: &mut Value, pointer: &str, value: Value) -> PatchResult<()> {
    if pointer.is_empty() {
        *document = value;
        return Ok(());
    }

    let (parent_pointer, token) = split_pointer(pointer)?;
    match parent_of(document, parent_pointer)? {
        Value::Object(map) => {
            map.insert(token, value);
            Ok(())
        }
        Value::Array(items) => {
            let index = if token == "-" {
                items.len()
            } else {
                parse_index(pointer, &token, items.len() + 1)?
            };
            items.insert(index, value);
            Ok(())
        }
        _ => Err(PatchError::ScalarParent {
            pointer: pointer.to_string(),
        }),
    }
}

fn remove(document: &mut Value, pointer: &str) -> PatchResult<()> {
    let (parent_pointer, token) = split_pointer(pointer)?;
    match parent_of(document, parent_pointer)? {
        Value::Object(map) => map
            .remove(&token)
            .map(|_| ())
            .ok_or_else(|| PatchError::MissingPath {
                pointer: pointer.to_string(),
            }),
        Value::Array(items) => {
            let index = parse_index(pointer, &token, items.len())?;
            items.remove(index);
            Ok(())
        }
        _ => Err(PatchError::ScalarParent {
            pointer: pointer.to_string(),
        }),
    }
}

fn parent_of<'a>(document: &'a mut Value, parent_pointer: &str) -> PatchResult<&'a mut Value> {
    document
        .pointer_mut(parent_pointer)
        .ok_or_else(|| PatchError::MissingPath {
            pointer: parent_pointer.to_string(),
        })
}

fn split_pointer(pointer: &str) -> PatchResult<(&str, String)> {
    if !pointer.starts_with('/') {
        return Err(PatchError::InvalidPointer {
            pointer: pointer.to_string(),
        });
    }
    let (parent, last) = pointer
        .rsplit_once('/')
        .ok_or_else(|| PatchError::InvalidPointer {
            pointer: pointer.to_string(),
        })?;
    Ok((parent, unescape(last)))
}

/// Parse an array index that must be strictly below `bound`.
fn parse_index(pointer: &str, token: &str, bound: usize) -> PatchResult<usize> {
    token
        .parse::<usize>()
        .ok()
        .filter(|index| *index < bound)
        .ok_or_else(|| PatchError::InvalidIndex {
            pointer: pointer.to_string(),
            index: token.to_string(),
        })
}

fn child_path(parent: &str, key: &str) -> String {
    format!("{parent}/{}", escape(key))
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn round_trip(from: &Value, to: &Value) -> Result<Value> {
        let mut document = from.clone();
        apply(&mut document, &diff(from, to))?;
        Ok(document)
    }

    #[test]
    fn identical_trees_produce_no_operations() {
        let tree = json!({"attributes": {"color": "red"}, "features": {}});
        assert!(diff(&tree, &tree.clone()).is_empty());
    }

    #[test]
    fn changed_leaf_becomes_single_replace() {
        let historical = json!({"attributes": {"color": "blue"}});
        let current = json!({"attributes": {"color": "red"}});

        assert_eq!(
            diff(&historical, &current),
            vec![PatchOperation::Replace {
                path: "/attributes/color".into(),
                value: json!("red"),
            }]
        );
    }

    #[test]
    fn added_and_removed_keys_are_reported() {
        let historical = json!({"attributes": {"old": 1, "kept": true}});
        let current = json!({"attributes": {"kept": true, "new": [1, 2]}, "features": {}});

        let operations = diff(&historical, &current);
        assert_eq!(
            operations,
            vec![
                PatchOperation::Remove {
                    path: "/attributes/old".into()
                },
                PatchOperation::Add {
                    path: "/attributes/new".into(),
                    value: json!([1, 2]),
                },
                PatchOperation::Add {
                    path: "/features".into(),
                    value: json!({}),
                },
            ]
        );
    }

    #[test]
    fn integer_and_float_with_same_value_are_equal() {
        let from = json!({"attributes": {"threshold": 1, "limit": 2}});
        let to = json!({"attributes": {"threshold": 1.0, "limit": 2.5}});
        assert_eq!(
            diff(&from, &to),
            vec![PatchOperation::Replace {
                path: "/attributes/limit".to_string(),
                value: json!(2.5),
            }]
        );
    }

    #[test]
    fn arrays_compare_positionally() {
        let historical = json!({"tags": ["a", "b", "c", "d"]});
        let current = json!({"tags": ["a", "x"]});

        assert_eq!(
            diff(&historical, &current),
            vec![
                PatchOperation::Replace {
                    path: "/tags/1".into(),
                    value: json!("x"),
                },
                PatchOperation::Remove {
                    path: "/tags/3".into()
                },
                PatchOperation::Remove {
                    path: "/tags/2".into()
                },
            ]
        );
    }

    #[test]
    fn keys_with_pointer_characters_are_escaped() -> Result<()> {
        let historical = json!({"features": {"a/b": 1, "m~n": 1}});
        let current = json!({"features": {"a/b": 2, "m~n": 1}});

        let operations = diff(&historical, &current);
        assert_eq!(operations[0].path(), "/features/a~1b");
        assert_eq!(round_trip(&historical, &current)?, current);
        Ok(())
    }

    #[test]
    fn applying_diff_reproduces_target() -> Result<()> {
        let cases = [
            (
                json!({"attributes": {"color": "blue", "size": 3}}),
                json!({"attributes": {"color": "red"}, "features": {"lamp": {"properties": {"on": true}}}}),
            ),
            (
                json!({"attributes": {"list": [1, 2, 3]}}),
                json!({"attributes": {"list": [1, {"nested": [true]}, 3, 4, 5]}}),
            ),
            (json!({"features": {"x": null}}), json!({})),
            (json!({"attributes": "scalar"}), json!({"attributes": {"now": "object"}})),
            (json!([1, 2, 3]), json!([])),
        ];

        for (from, to) in cases {
            assert_eq!(round_trip(&from, &to)?, to);
        }
        Ok(())
    }

    #[test]
    fn operations_serialize_as_rfc6902_objects() -> Result<()> {
        let operations = vec![
            PatchOperation::Replace {
                path: "/attributes/color".into(),
                value: json!("red"),
            },
            PatchOperation::Remove {
                path: "/features/old".into(),
            },
        ];

        assert_eq!(
            serde_json::to_value(&operations)?,
            json!([
                {"op": "replace", "path": "/attributes/color", "value": "red"},
                {"op": "remove", "path": "/features/old"}
            ])
        );
        Ok(())
    }

    #[test]
    fn apply_rejects_unresolvable_paths() {
        let mut document = json!({"attributes": {}});

        let missing = apply(
            &mut document,
            &[PatchOperation::Remove {
                path: "/attributes/ghost".into(),
            }],
        );
        assert_eq!(
            missing,
            Err(PatchError::MissingPath {
                pointer: "/attributes/ghost".into()
            })
        );

        let relative = apply(
            &mut document,
            &[PatchOperation::Add {
                path: "attributes".into(),
                value: json!(1),
            }],
        );
        assert!(matches!(relative, Err(PatchError::InvalidPointer { .. })));

        let mut list = json!([1]);
        let out_of_range = apply(
            &mut list,
            &[PatchOperation::Add {
                path: "/5".into(),
                value: json!(2),
            }],
        );
        assert!(matches!(out_of_range, Err(PatchError::InvalidIndex { .. })));
    }
}
