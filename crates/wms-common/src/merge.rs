//! Deep merge of layer attributes and option trees.
//!
//! Each mergeable type states its field policy explicitly through the
//! helpers below. `merge_json` applies the same contract to untyped
//! `serde_json::Value` trees.

use serde_json::Value;

/// A type whose values can be merged source-over-destination.
pub trait Merge {
    /// Merge `other` into `self`; fields `other` leaves undefined are kept.
    fn merge_from(&mut self, other: &Self);
}

/// Merge every source into `dst`, left to right.
pub fn merge<T: Merge>(dst: &mut T, sources: &[&T]) {
    for source in sources {
        dst.merge_from(source);
    }
}

/// Scalar policy: an undefined source never overwrites.
pub fn override_if_some<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
    if let Some(value) = src {
        *dst = Some(value.clone());
    }
}

/// Primitive-array policy: set union preserving destination order, new
/// source items appended in source order.
pub fn union_into<T: Clone + PartialEq>(dst: &mut Vec<T>, src: &[T]) {
    for item in src {
        if !dst.contains(item) {
            dst.push(item.clone());
        }
    }
}

/// Structured-array policy: a non-empty source replaces the destination.
pub fn replace_if_present<T: Clone>(dst: &mut Vec<T>, src: &[T]) {
    if !src.is_empty() {
        *dst = src.to_vec();
    }
}

/// Merge JSON `sources` into `dst`.
///
/// `null` counts as undefined; objects merge recursively, creating missing
/// containers; arrays of primitives are unioned; any other array replaces
/// the destination; scalars overwrite.
pub fn merge_json(dst: &mut Value, sources: &[&Value]) {
    for source in sources {
        merge_value(dst, source);
    }
}

fn merge_value(dst: &mut Value, src: &Value) {
    match src {
        Value::Null => {}
        Value::Object(src_map) => {
            if !dst.is_object() {
                *dst = Value::Object(serde_json::Map::new());
            }
            if let Value::Object(dst_map) = dst {
                for (key, value) in src_map {
                    if value.is_null() {
                        continue;
                    }
                    let slot = dst_map.entry(key.clone()).or_insert(Value::Null);
                    merge_value(slot, value);
                }
            }
        }
        Value::Array(src_items) => match dst {
            Value::Array(dst_items)
                if is_primitive_array(dst_items) && is_primitive_array(src_items) =>
            {
                union_into(dst_items, src_items);
            }
            _ => *dst = src.clone(),
        },
        scalar => *dst = scalar.clone(),
    }
}

fn is_primitive_array(items: &[Value]) -> bool {
    items
        .iter()
        .all(|v| matches!(v, Value::String(_) | Value::Number(_) | Value::Bool(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Attrs {
        crs: Vec<String>,
        boxes: Vec<(String, f64)>,
        opaque: Option<bool>,
    }

    impl Merge for Attrs {
        fn merge_from(&mut self, other: &Self) {
            union_into(&mut self.crs, &other.crs);
            replace_if_present(&mut self.boxes, &other.boxes);
            override_if_some(&mut self.opaque, &other.opaque);
        }
    }

    #[test]
    fn test_typed_policies() {
        let mut dst = Attrs {
            crs: vec!["EPSG:4326".into(), "EPSG:3857".into()],
            boxes: vec![("EPSG:4326".into(), 1.0)],
            opaque: Some(true),
        };
        let src = Attrs {
            crs: vec!["EPSG:3857".into(), "CRS:84".into()],
            boxes: vec![],
            opaque: None,
        };
        merge(&mut dst, &[&src]);

        assert_eq!(dst.crs, vec!["EPSG:4326", "EPSG:3857", "CRS:84"]);
        assert_eq!(dst.boxes.len(), 1);
        assert_eq!(dst.opaque, Some(true));
    }

    #[test]
    fn test_replace_if_present() {
        let mut dst = vec![1, 2];
        replace_if_present(&mut dst, &[3]);
        assert_eq!(dst, vec![3]);
    }

    #[test]
    fn test_merge_json_contract() {
        let mut dst = json!({
            "crs": ["EPSG:4326"],
            "styles": [{"name": "a"}],
            "opaque": false,
            "nested": {"keep": 1}
        });
        let src = json!({
            "crs": ["CRS:84", "EPSG:4326"],
            "styles": [{"name": "b"}],
            "opaque": null,
            "nested": {"add": 2},
            "created": {"deep": {"value": true}}
        });
        merge_json(&mut dst, &[&src]);

        assert_eq!(dst["crs"], json!(["EPSG:4326", "CRS:84"]));
        assert_eq!(dst["styles"], json!([{"name": "b"}]));
        assert_eq!(dst["opaque"], json!(false));
        assert_eq!(dst["nested"], json!({"keep": 1, "add": 2}));
        assert_eq!(dst["created"]["deep"]["value"], json!(true));
    }

    #[test]
    fn test_merge_json_sources_apply_in_order() {
        let mut dst = json!({});
        merge_json(&mut dst, &[&json!({"a": 1}), &json!({"a": 2}), &json!(null)]);
        assert_eq!(dst, json!({"a": 2}));
    }
}
