use crate::{
    kernel::entities::Value,
    query::entities::QueryField,
};

/// Projects `value` onto the selection set `fields`.
///
/// Objects keep exactly the requested fields in request order, requested fields missing
/// from the value become `null`, and lists are projected element-wise. A selection on a
/// scalar yields `null`.
pub fn project(value: &Value, fields: &[QueryField]) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|item| project(item, fields)).collect()),
        Value::Object(map) => Value::Object(
            fields
                .iter()
                .map(|field| {
                    let selected = match map.get(&field.name) {
                        None => Value::Null,
                        Some(child) if field.sub_fields.is_empty() => child.clone(),
                        Some(child) => project(child, &field.sub_fields),
                    };
                    (field.name.clone(), selected)
                })
                .collect(),
        ),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        serde_json::json,
    };

    #[test]
    fn test_projects_only_requested_fields() {
        let value = json!({"a": 1, "b": {"c": 2, "d": 3}});
        let fields = vec![
            QueryField::new("a"),
            QueryField::nested("b", vec![QueryField::new("c")]),
        ];
        assert_eq!(project(&value, &fields), json!({"a": 1, "b": {"c": 2}}));
    }

    #[test]
    fn test_missing_fields_are_null() {
        let value = json!({"a": 1});
        let fields = vec![
            QueryField::new("a"),
            QueryField::new("missing"),
            QueryField::nested("nested", vec![QueryField::new("c")]),
        ];
        assert_eq!(
            project(&value, &fields),
            json!({"a": 1, "missing": null, "nested": null})
        );
    }

    #[test]
    fn test_lists_are_projected_element_wise() {
        let value = json!({
            "tokens": [
                {"identifier": "WEGLD-bd4d79", "decimals": 18},
                {"identifier": "MEX-455c57", "decimals": 18},
            ]
        });
        let fields = vec![QueryField::nested(
            "tokens",
            vec![QueryField::new("identifier")],
        )];
        assert_eq!(
            project(&value, &fields),
            json!({"tokens": [{"identifier": "WEGLD-bd4d79"}, {"identifier": "MEX-455c57"}]})
        );
    }

    #[test]
    fn test_selection_on_scalar_is_null() {
        let value = json!({"a": 1});
        let fields = vec![QueryField::nested("a", vec![QueryField::new("b")])];
        assert_eq!(project(&value, &fields), json!({"a": null}));
        assert_eq!(project(&json!("x"), &fields), Value::Null);
    }

    #[test]
    fn test_leaf_field_copies_whole_subtree() {
        let value = json!({"a": {"b": {"c": 1}}});
        assert_eq!(
            project(&value, &[QueryField::new("a")]),
            json!({"a": {"b": {"c": 1}}})
        );
    }

    #[test]
    fn test_projection_follows_requested_order() {
        let value = json!({"a": 1, "b": 2});
        let projected = project(&value, &[QueryField::new("b"), QueryField::new("a")]);
        let keys: Vec<&String> = projected.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
