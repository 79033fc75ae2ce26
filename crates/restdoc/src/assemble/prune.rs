//! Removal of component schemas no served operation can reach.

use std::collections::HashSet;

use serde_json::{Map, Value};

/// Recursively collect all `$ref` string values in a JSON subtree.
fn collect_refs(value: &Value, refs: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == "$ref" {
                    if let Some(s) = v.as_str() {
                        refs.push(s.to_string());
                    }
                }
                collect_refs(v, refs);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_refs(item, refs);
            }
        }
        _ => {}
    }
}

/// Drop schemas under `section` (a JSON pointer such as `/definitions`)
/// that are not reachable from `paths`, following references between
/// schemas transitively. An emptied section is removed.
///
/// Returns the number of schemas removed.
pub(crate) fn prune_unreachable(doc: &mut Value, section: &str, ref_prefix: &str) -> usize {
    let mut pending = Vec::new();
    if let Some(paths) = doc.get("paths") {
        collect_refs(paths, &mut pending);
    }

    let mut reachable: HashSet<String> = HashSet::new();
    if let Some(schemas) = doc.pointer(section).and_then(Value::as_object) {
        while let Some(reference) = pending.pop() {
            let Some(name) = reference.strip_prefix(ref_prefix) else {
                continue;
            };
            if reachable.insert(name.to_string()) {
                if let Some(schema) = schemas.get(name) {
                    collect_refs(schema, &mut pending);
                }
            }
        }
    }

    let Some(schemas) = doc.pointer_mut(section).and_then(Value::as_object_mut) else {
        return 0;
    };
    let before = schemas.len();
    schemas.retain(|name, _| reachable.contains(name));
    let removed = before - schemas.len();
    if schemas.is_empty() {
        remove_pointer(doc, section);
    }
    removed
}

/// Remove the value at `pointer`, then any parent objects left empty.
fn remove_pointer(doc: &mut Value, pointer: &str) {
    let Some((parent, key)) = pointer.rsplit_once('/') else {
        return;
    };
    let Some(container) = object_at(doc, parent) else {
        return;
    };
    container.shift_remove(key);
    if container.is_empty() && !parent.is_empty() {
        remove_pointer(doc, parent);
    }
}

fn object_at<'v>(doc: &'v mut Value, pointer: &str) -> Option<&'v mut Map<String, Value>> {
    if pointer.is_empty() {
        doc.as_object_mut()
    } else {
        doc.pointer_mut(pointer)?.as_object_mut()
    }
}
