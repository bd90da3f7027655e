//! Normalization of the gateway's loosely-typed response payloads.
//!
//! The REST API reports the same logical fields under different keys and
//! nesting depending on endpoint and gateway version (a handle may be a bare
//! string or an object, a status may be flat or wrapped). These helpers
//! extract a fixed internal representation and return `None` when no valid
//! value is present, so callers fail closed instead of guessing.

use serde_json::Value;

fn string_at<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| value.get(k).and_then(Value::as_str))
}

/// Extract a session handle from an open-session response.
///
/// Accepted shapes: `{"sessionHandle": "..."}`,
/// `{"sessionHandle": {"identifier" | "id" | "sessionId": "..."}}`, and the
/// nested `{"session": {"handle": "..."}}` variant.
pub fn session_handle(payload: &Value) -> Option<String> {
    match payload.get("sessionHandle") {
        Some(Value::String(s)) => return Some(s.clone()),
        Some(obj @ Value::Object(_)) => {
            if let Some(s) = string_at(obj, &["identifier", "id", "sessionId"]) {
                return Some(s.to_string());
            }
        }
        _ => {}
    }
    payload
        .get("session")
        .and_then(|s| s.get("handle"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Extract an operation handle from a statement-submission response.
///
/// Accepted shapes: `operationHandle` / `operation_handle`, each either a
/// bare string or an object keyed by `identifier` / `handle` / `id` /
/// `operationId`.
pub fn operation_handle(payload: &Value) -> Option<String> {
    let raw = payload
        .get("operationHandle")
        .or_else(|| payload.get("operation_handle"))?;
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => {
            string_at(raw, &["identifier", "handle", "id", "operationId"]).map(str::to_string)
        }
        _ => None,
    }
}

/// Extract an operation status string, uppercased.
///
/// Accepted shapes: `{"status": "..."}`, `{"status": {"status": "..."}}`,
/// and `{"operationStatus": "..."}`.
pub fn operation_status(payload: &Value) -> Option<String> {
    let raw = match payload.get("status") {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(obj @ Value::Object(_)) => obj.get("status").and_then(Value::as_str),
        _ => None,
    };
    raw.or_else(|| payload.get("operationStatus").and_then(Value::as_str))
        .map(str::to_uppercase)
}

/// Classification of a fetched result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// The page carries data rows.
    Payload,
    /// The operation has not produced this page yet; retry the same token.
    NotReady,
    /// End of stream; no further pages exist.
    Eos,
    /// Unrecognized result type.
    Other,
}

impl ResultKind {
    fn parse(result_type: Option<&str>) -> Self {
        match result_type.map(str::to_uppercase).as_deref() {
            Some("PAYLOAD") => ResultKind::Payload,
            Some("NOT_READY") => ResultKind::NotReady,
            Some("EOS") => ResultKind::Eos,
            _ => ResultKind::Other,
        }
    }
}

/// One token-addressed slice of an operation's output, normalized from the
/// raw fetch payload. The raw payload is retained for pass-through to
/// callers, who receive pages exactly as the gateway produced them.
#[derive(Debug, Clone)]
pub struct ResultPage {
    pub kind: ResultKind,
    /// Cluster job identifier, present only on pages of streaming statements.
    pub job_id: Option<String>,
    /// Column names, aligned with each row's field sequence.
    pub columns: Vec<String>,
    /// Data rows; each row is the ordered field sequence of one record.
    pub rows: Vec<Vec<Value>>,
    pub raw: Value,
}

impl ResultPage {
    pub fn from_value(raw: Value) -> Self {
        let kind = ResultKind::parse(raw.get("resultType").and_then(Value::as_str));
        let job_id = string_at(&raw, &["jobID", "jobId"]).map(str::to_string);

        let results = raw.get("results");
        let columns = results
            .and_then(|r| r.get("columns"))
            .and_then(Value::as_array)
            .map(|cols| {
                cols.iter()
                    .filter_map(|c| c.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let rows = results
            .and_then(|r| r.get("data"))
            .and_then(Value::as_array)
            .map(|data| {
                data.iter()
                    .map(|row| match row {
                        // JSON row format: {"kind": "INSERT", "fields": [...]}
                        Value::Object(_) => row
                            .get("fields")
                            .and_then(Value::as_array)
                            .cloned()
                            .unwrap_or_default(),
                        Value::Array(fields) => fields.clone(),
                        other => vec![other.clone()],
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            kind,
            job_id,
            columns,
            rows,
            raw,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_eos(&self) -> bool {
        self.kind == ResultKind::Eos
    }

    /// Look up a field of the first row by column name (case-insensitive).
    pub fn field_by_column(&self, name: &str) -> Option<&Value> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))?;
        self.rows.first()?.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_handle_plain_string() {
        let payload = json!({"sessionHandle": "sess-1", "properties": {}});
        assert_eq!(session_handle(&payload).as_deref(), Some("sess-1"));
    }

    #[test]
    fn test_session_handle_object_variants() {
        for key in ["identifier", "id", "sessionId"] {
            let payload = json!({"sessionHandle": {key: "sess-2"}});
            assert_eq!(session_handle(&payload).as_deref(), Some("sess-2"));
        }
    }

    #[test]
    fn test_session_handle_nested_session_object() {
        let payload = json!({"session": {"handle": "sess-3"}});
        assert_eq!(session_handle(&payload).as_deref(), Some("sess-3"));
    }

    #[test]
    fn test_session_handle_missing() {
        assert_eq!(session_handle(&json!({})), None);
        assert_eq!(session_handle(&json!({"sessionHandle": 42})), None);
    }

    #[test]
    fn test_operation_handle_string_and_snake_case() {
        let payload = json!({"operationHandle": "op-1"});
        assert_eq!(operation_handle(&payload).as_deref(), Some("op-1"));

        let payload = json!({"operation_handle": "op-2"});
        assert_eq!(operation_handle(&payload).as_deref(), Some("op-2"));
    }

    #[test]
    fn test_operation_handle_object_variants() {
        for key in ["identifier", "handle", "id", "operationId"] {
            let payload = json!({"operationHandle": {key: "op-3"}});
            assert_eq!(operation_handle(&payload).as_deref(), Some("op-3"));
        }
    }

    #[test]
    fn test_operation_handle_missing() {
        assert_eq!(operation_handle(&json!({})), None);
        assert_eq!(operation_handle(&json!({"operationHandle": {}})), None);
    }

    #[test]
    fn test_operation_status_shapes() {
        assert_eq!(
            operation_status(&json!({"status": "FINISHED"})).as_deref(),
            Some("FINISHED")
        );
        assert_eq!(
            operation_status(&json!({"status": {"status": "running"}})).as_deref(),
            Some("RUNNING")
        );
        assert_eq!(
            operation_status(&json!({"operationStatus": "error"})).as_deref(),
            Some("ERROR")
        );
        assert_eq!(operation_status(&json!({})), None);
    }

    #[test]
    fn test_result_kind_case_insensitive() {
        let page = ResultPage::from_value(json!({"resultType": "payload"}));
        assert_eq!(page.kind, ResultKind::Payload);
        let page = ResultPage::from_value(json!({"resultType": "Not_Ready"}));
        assert_eq!(page.kind, ResultKind::NotReady);
        let page = ResultPage::from_value(json!({"resultType": "EOS"}));
        assert!(page.is_eos());
        let page = ResultPage::from_value(json!({"resultType": "SOMETHING_NEW"}));
        assert_eq!(page.kind, ResultKind::Other);
        let page = ResultPage::from_value(json!({}));
        assert_eq!(page.kind, ResultKind::Other);
    }

    #[test]
    fn test_result_page_rows_fields_shape() {
        let page = ResultPage::from_value(json!({
            "resultType": "PAYLOAD",
            "results": {
                "columns": [{"name": "id"}, {"name": "status"}],
                "data": [
                    {"kind": "INSERT", "fields": [1, "RUNNING"]},
                    {"kind": "INSERT", "fields": [2, "FINISHED"]},
                ],
            },
            "jobID": "job-1",
        }));
        assert_eq!(page.row_count(), 2);
        assert_eq!(page.columns, vec!["id", "status"]);
        assert_eq!(page.job_id.as_deref(), Some("job-1"));
        assert_eq!(page.rows[1][1], json!("FINISHED"));
    }

    #[test]
    fn test_result_page_rows_plain_array_shape() {
        let page = ResultPage::from_value(json!({
            "resultType": "PAYLOAD",
            "results": {"data": [[1], [2], [3]]},
        }));
        assert_eq!(page.row_count(), 3);
        assert!(page.columns.is_empty());
    }

    #[test]
    fn test_result_page_job_id_variants() {
        let page = ResultPage::from_value(json!({"jobId": "job-2"}));
        assert_eq!(page.job_id.as_deref(), Some("job-2"));
        // A non-string job id is ignored rather than coerced
        let page = ResultPage::from_value(json!({"jobID": 7}));
        assert_eq!(page.job_id, None);
    }

    #[test]
    fn test_field_by_column_case_insensitive() {
        let page = ResultPage::from_value(json!({
            "resultType": "PAYLOAD",
            "results": {
                "columns": [{"name": "job id"}, {"name": "STATUS"}],
                "data": [{"fields": ["job-1", "RUNNING"]}],
            },
        }));
        assert_eq!(page.field_by_column("status"), Some(&json!("RUNNING")));
        assert_eq!(page.field_by_column("missing"), None);
    }

    #[test]
    fn test_field_by_column_no_rows() {
        let page = ResultPage::from_value(json!({
            "resultType": "EOS",
            "results": {"columns": [{"name": "status"}], "data": []},
        }));
        assert_eq!(page.field_by_column("status"), None);
    }
}
