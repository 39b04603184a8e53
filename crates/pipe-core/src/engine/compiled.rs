use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use log::debug;
use uuid::Uuid;

use super::core::execute_steps;
use super::outcome::RunOutcome;
use crate::errors::PipelineError;
use crate::pipeline::{ErrorTransformer, ValueFactory};
use crate::step::{AnyValue, Step};

/// Pipeline ya resuelto: lista de pasos aplanada + contexto fijado +
/// transformador de errores.
///
/// Invocarlo repetidas veces no vuelve a recorrer la cadena de nodos. Es
/// barato de clonar y puede compartirse entre tareas concurrentes; cada
/// ejecución crea sus propios valor y contexto.
pub struct CompiledPipeline<I, V, C, E> {
    steps: Arc<[Step]>,
    context: ValueFactory,
    transformer: ErrorTransformer<E>,
    _types: PhantomData<fn(I) -> (V, C)>,
}

impl<I, V, C, E> CompiledPipeline<I, V, C, E>
    where I: Send + 'static,
          V: Send + 'static,
          C: Send + 'static,
          E: 'static
{
    pub(crate) fn new(steps: Arc<[Step]>, context: ValueFactory, transformer: ErrorTransformer<E>) -> Self {
        Self { steps,
               context,
               transformer,
               _types: PhantomData }
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Ejecuta el pipeline con `value` y devuelve sólo el `Result`.
    pub async fn run(&self, value: I) -> Result<V, E> {
        self.run_outcome(value).await.result
    }

    /// Ejecuta el pipeline y conserva además el último contexto conocido.
    pub async fn run_outcome(&self, value: I) -> RunOutcome<V, C, E> {
        self.run_erased(Box::new(value)).await
    }

    pub(crate) fn fail(&self, error: PipelineError) -> E {
        (self.transformer)(error)
    }

    pub(crate) async fn run_erased(&self, value: AnyValue) -> RunOutcome<V, C, E> {
        let run_id = Uuid::new_v4();
        debug!("run {run_id}: starting ({} steps)", self.steps.len());

        let execution = execute_steps(run_id, &self.steps, value, (self.context)()).await;
        let context = execution.context.and_then(|c| c.downcast::<C>().ok()).map(|c| *c);
        let result = match execution.result {
            Ok(value) => match value.downcast::<V>() {
                Ok(value) => Ok(*value),
                Err(_) => Err(PipelineError::TypeMismatch { expected: std::any::type_name::<V>() }),
            },
            Err(error) => Err(error),
        };

        match result {
            Ok(value) => {
                debug!("run {run_id}: completed");
                RunOutcome { run_id,
                             result: Ok(value),
                             context }
            }
            Err(error) => {
                debug!("run {run_id}: failed: {error}");
                RunOutcome { run_id,
                             result: Err(self.fail(error)),
                             context }
            }
        }
    }
}

impl<I, V, C, E> Clone for CompiledPipeline<I, V, C, E> {
    fn clone(&self) -> Self {
        Self { steps: Arc::clone(&self.steps),
               context: Arc::clone(&self.context),
               transformer: Arc::clone(&self.transformer),
               _types: PhantomData }
    }
}

impl<I, V, C, E> fmt::Debug for CompiledPipeline<I, V, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPipeline").field("steps", &self.steps).finish_non_exhaustive()
    }
}
