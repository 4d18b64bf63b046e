use serde_json::Value;

/// Walk a dotted path (`input.user.name`, `n1.result.items.0`) through a
/// JSON value. Numeric segments index into arrays.
pub fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(root, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_objects_and_arrays() {
        let root = json!({"input": {"items": [{"name": "a"}, {"name": "b"}]}});

        assert_eq!(lookup_path(&root, "input.items.1.name"), Some(&json!("b")));
        assert_eq!(lookup_path(&root, "input.items.9"), None);
        assert_eq!(lookup_path(&root, "input.missing"), None);
        assert_eq!(lookup_path(&root, ""), Some(&root));
    }
}
