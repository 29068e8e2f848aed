use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::types::ApiResponse;

// Shape a successful response for printing.
// - data and meta are passed through; meta is dropped when absent or empty.
// - rateLimit is included only when asked for.
pub fn render_response(resp: &ApiResponse, include_rate: bool) -> Value {
    let mut obj = Map::new();
    obj.insert("data".into(), resp.data.clone().unwrap_or(Value::Null));
    if let Some(meta) = resp.meta.as_ref().filter(|m| !is_empty_object(m)) {
        obj.insert("meta".into(), meta.clone());
    }
    if include_rate {
        if let Some(rl) = &resp.rate_limit {
            obj.insert(
                "rateLimit".into(),
                serde_json::to_value(rl).unwrap_or(Value::Null),
            );
        }
    }
    Value::Object(obj)
}

// Items collected by a paginated walk.
pub fn render_items(items: Vec<Value>) -> Value {
    serde_json::json!({ "count": items.len(), "items": items })
}

pub fn render_error(err: &ApiError) -> Value {
    serde_json::json!({ "error": err })
}

fn is_empty_object(v: &Value) -> bool {
    v.as_object().is_some_and(Map::is_empty)
}
