use serde_json::json;

/// `{id, ok: true, result}`
pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

/// `{id, ok: false, error: {code, message, details?}}`; `code` is one of the
/// stable strings clients switch on (`bad_params`, `not_found`, `no_workspace`, ...).
pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut body = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        body["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": body,
    })
}
