//! Boundary validation for inbound report payloads
//!
//! Requests arrive as loose JSON. Everything is checked here and converted
//! into typed [`TodoItem`]s before any work is submitted.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::TodoItem;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("'todos' must be an array")]
    TodosNotArray,

    #[error("todos[{index}]: {reason}")]
    InvalidItem { index: usize, reason: String },
}

/// Validate a `{ "todos": [...] }` payload and extract the typed items
pub fn parse_todo_payload(body: &Value) -> Result<Vec<TodoItem>, ValidationError> {
    let object = body.as_object().ok_or(ValidationError::NotAnObject)?;

    let todos = object
        .get("todos")
        .and_then(Value::as_array)
        .ok_or(ValidationError::TodosNotArray)?;

    todos
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            TodoItem::deserialize(raw).map_err(|e| ValidationError::InvalidItem {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_valid_payload() {
        let body = json!({
            "todos": [
                { "id": 1, "text": "Write unit tests", "completed": false },
                { "id": 2, "text": "Deploy to staging", "completed": true }
            ]
        });

        let todos = parse_todo_payload(&body).unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[1].text, "Deploy to staging");
        assert!(todos[1].completed);
    }

    #[test]
    fn test_empty_array_is_valid() {
        let todos = parse_todo_payload(&json!({ "todos": [] })).unwrap();
        assert!(todos.is_empty());
    }

    #[test]
    fn test_missing_todos_rejected() {
        assert_eq!(
            parse_todo_payload(&json!({})),
            Err(ValidationError::TodosNotArray)
        );
    }

    #[test]
    fn test_non_array_todos_rejected() {
        assert_eq!(
            parse_todo_payload(&json!({ "todos": "not-an-array" })),
            Err(ValidationError::TodosNotArray)
        );
    }

    #[test]
    fn test_non_object_body_rejected() {
        assert_eq!(
            parse_todo_payload(&json!([1, 2, 3])),
            Err(ValidationError::NotAnObject)
        );
        assert_eq!(
            parse_todo_payload(&Value::Null),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn test_malformed_item_reports_index() {
        let body = json!({
            "todos": [
                { "id": 1, "text": "ok", "completed": true },
                { "id": "two", "text": "bad id", "completed": false }
            ]
        });

        match parse_todo_payload(&body) {
            Err(ValidationError::InvalidItem { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidItem, got {:?}", other),
        }
    }

    #[test]
    fn test_extra_fields_ignored() {
        let body = json!({
            "todos": [{ "id": 3, "text": "t", "completed": false, "priority": "high" }]
        });

        let todos = parse_todo_payload(&body).unwrap();
        assert_eq!(todos[0].id, 3);
    }

    proptest! {
        #[test]
        fn well_formed_items_always_parse(
            items in proptest::collection::vec((any::<i64>(), ".{0,40}", any::<bool>()), 0..20)
        ) {
            let todos: Vec<Value> = items
                .iter()
                .map(|(id, text, completed)| json!({ "id": id, "text": text, "completed": completed }))
                .collect();

            let parsed = parse_todo_payload(&json!({ "todos": todos })).unwrap();
            prop_assert_eq!(parsed.len(), items.len());
            for (item, (id, text, completed)) in parsed.iter().zip(items.iter()) {
                prop_assert_eq!(item.id, *id);
                prop_assert_eq!(&item.text, text);
                prop_assert_eq!(item.completed, *completed);
            }
        }

        #[test]
        fn scalar_todos_always_rejected(value in prop_oneof![
            any::<i64>().prop_map(|n| json!(n)),
            ".*".prop_map(|s| json!(s)),
            any::<bool>().prop_map(|b| json!(b)),
        ]) {
            prop_assert_eq!(
                parse_todo_payload(&json!({ "todos": value })),
                Err(ValidationError::TodosNotArray)
            );
        }
    }
}
