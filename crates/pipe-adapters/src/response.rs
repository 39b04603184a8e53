//! Respuesta neutral y conversión desde `RunOutcome`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::debug;
use pipe_core::RunOutcome;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::encoder::FailureEncoder;
use crate::error::AdapterError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub body: Value,
    /// Cabeceras derivadas del contexto final (orden determinista).
    pub headers: BTreeMap<String, String>,
    /// Correlación con la ejecución del pipeline (`RunOutcome::run_id`).
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Traduce el resultado de una ejecución:
/// - éxito → 200 con `{"data": valor}`;
/// - falla → status del `FailureEncoder` con `{"error": mensaje}` y
///   `"cause"` cuando hay una causa raíz distinta.
pub fn respond<V, C, E>(outcome: RunOutcome<V, C, E>) -> Result<Response, AdapterError>
    where V: Serialize,
          E: FailureEncoder
{
    respond_with(outcome, |_| Vec::new())
}

/// Como `respond`, pero agrega cabeceras calculadas a partir del último
/// contexto conocido (si lo hay).
pub fn respond_with<V, C, E, H>(outcome: RunOutcome<V, C, E>, headers: H) -> Result<Response, AdapterError>
    where V: Serialize,
          E: FailureEncoder,
          H: FnOnce(&C) -> Vec<(String, String)>
{
    let RunOutcome { run_id, result, context } = outcome;
    let headers: BTreeMap<String, String> = context.as_ref().map(headers).unwrap_or_default().into_iter().collect();

    let (status, body) = match result {
        Ok(value) => (200, json!({ "data": serde_json::to_value(value)? })),
        Err(error) => {
            let mut body = json!({ "error": error.message() });
            if let Some(cause) = error.cause_message() {
                body["cause"] = Value::String(cause);
            }
            (error.status(), body)
        }
    };
    debug!("run {run_id}: responding with status {status}");

    Ok(Response { status,
                  body,
                  headers,
                  run_id,
                  generated_at: Utc::now() })
}

#[cfg(test)]
mod tests {
    use pipe_core::{ErrorFactory, PipelineError};

    use super::*;

    fn outcome<V>(result: Result<V, PipelineError>, context: Option<&'static str>) -> RunOutcome<V, &'static str, PipelineError> {
        RunOutcome { run_id: Uuid::new_v4(),
                     result,
                     context }
    }

    #[test]
    fn success_wraps_value_in_data() {
        let response = respond(outcome(Ok(vec![1, 2]), None)).expect("serializable");
        assert_eq!(response.status, 200);
        assert!(response.is_success());
        assert_eq!(response.body, json!({ "data": [1, 2] }));
        assert!(response.headers.is_empty());
    }

    #[test]
    fn failure_reports_message_and_cause() {
        let err = PipelineError::with_cause("validation failed".into(), PipelineError::assertion("must be positive"));
        let response = respond(outcome::<i32>(Err(err), None)).expect("serializable");
        assert_eq!(response.status, 422);
        assert_eq!(response.body, json!({ "error": "validation failed", "cause": "must be positive" }));
    }

    #[test]
    fn headers_come_from_context() {
        let response = respond_with(outcome(Ok(1), Some("tenant-9")), |ctx| vec![("x-tenant".into(), ctx.to_string())]).expect("serializable");
        assert_eq!(response.headers.get("x-tenant").map(String::as_str), Some("tenant-9"));
    }
}
