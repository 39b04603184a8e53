//! Ejecución secuencial de pasos (fail-fast).

use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;
use log::{debug, warn};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::step::{AnyValue, Step};

/// Resultado crudo (tipos borrados) de recorrer una lista de pasos.
pub(crate) struct Execution {
    pub result: Result<AnyValue, PipelineError>,
    /// Último contexto producido con éxito. `None` si un step hizo panic,
    /// porque el contexto se movió dentro de la función que falló.
    pub context: Option<AnyValue>,
}

impl Execution {
    fn failed(error: PipelineError, context: Option<AnyValue>) -> Self {
        Self { result: Err(error),
               context }
    }
}

/// Ejecuta `steps` en orden, encadenando valor y contexto.
///
/// Se detiene en la primera falla; ningún step posterior se ejecuta. Un panic
/// en la llamada síncrona o durante el `.await` del step se normaliza a
/// `PipelineError::Panicked` y se trata como cualquier otra falla.
pub(crate) async fn execute_steps(run_id: Uuid, steps: &[Step], value: AnyValue, context: AnyValue) -> Execution {
    let mut value = value;
    let mut context = context;

    for (index, step) in steps.iter().enumerate() {
        let pending = match panic::catch_unwind(AssertUnwindSafe(|| step.call(value, context))) {
            Ok(pending) => pending,
            Err(payload) => {
                let error = PipelineError::from_panic(payload);
                warn!("run {run_id}: step #{index} ({}) panicked: {error}", describe(step));
                return Execution::failed(error, None);
            }
        };

        let output = match AssertUnwindSafe(pending).catch_unwind().await {
            Ok(output) => output,
            Err(payload) => {
                let error = PipelineError::from_panic(payload);
                warn!("run {run_id}: step #{index} ({}) panicked while awaiting: {error}", describe(step));
                return Execution::failed(error, None);
            }
        };

        match output.result {
            Ok(next) => {
                value = next;
                context = output.context;
            }
            Err(error) => {
                debug!("run {run_id}: step #{index} ({}) failed: {error}", describe(step));
                return Execution::failed(error, Some(output.context));
            }
        }
    }

    Execution { result: Ok(value),
                context: Some(context) }
}

fn describe(step: &Step) -> String {
    match step.name() {
        Some(name) => format!("{:?} '{name}'", step.kind()),
        None => format!("{:?}", step.kind()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::step::constructors::{transform, transform_async};

    fn run(steps: &[Step], value: i32) -> Execution {
        tokio_test::block_on(execute_steps(Uuid::new_v4(), steps, Box::new(value), Box::new(())))
    }

    fn value_of(execution: Execution) -> Option<i32> {
        execution.result.ok().and_then(|v| v.downcast::<i32>().ok()).map(|v| *v)
    }

    #[test]
    fn empty_step_list_returns_input() {
        assert_eq!(value_of(run(&[], 7)), Some(7));
    }

    #[test]
    fn stops_at_first_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let steps = vec![transform(|_: i32, _: &()| Err::<i32, _>("boom".into())),
                         transform(move |v: i32, _: &()| {
                             counter.fetch_add(1, Ordering::SeqCst);
                             Ok(v)
                         })];
        let execution = run(&steps, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(execution.context.is_some());
        assert_eq!(execution.result.err().map(|e| e.to_string()).as_deref(), Some("boom"));
    }

    #[test]
    fn synchronous_panic_becomes_failure() {
        let steps = vec![transform(|_: i32, _: &()| -> crate::errors::StepResult<i32> { panic!("sync kaboom") })];
        let execution = run(&steps, 1);
        assert!(execution.context.is_none());
        assert!(matches!(execution.result, Err(PipelineError::Panicked { ref message }) if message == "sync kaboom"));
    }

    #[test]
    fn panic_inside_future_becomes_failure() {
        let steps = vec![transform_async(|v: i32, _: &()| async move {
                             if v > 0 {
                                 panic!("async kaboom");
                             }
                             Ok::<_, crate::errors::BoxError>(v)
                         })];
        let execution = run(&steps, 1);
        assert!(matches!(execution.result, Err(PipelineError::Panicked { ref message }) if message == "async kaboom"));
    }
}
