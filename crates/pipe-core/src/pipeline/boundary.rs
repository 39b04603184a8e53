//! Desenvoltura del `Result` en los bordes del sistema.

use std::any::type_name;
use std::future::Future;

use super::builder::Pipeline;
use crate::errors::PipelineError;

impl<I, V, C0, C, E> Pipeline<I, V, C0, C, E>
    where I: Send + 'static,
          V: Send + 'static,
          C0: Send + 'static,
          C: Send + 'static,
          E: 'static
{
    /// Ejecuta el pipeline y entrega el `Result` completo a `handler`,
    /// devolviendo directamente lo que éste produzca.
    pub async fn use_result<R, H, Fut>(&self, value: I, handler: H) -> R
        where H: FnOnce(Result<V, E>) -> Fut,
              Fut: Future<Output = R>
    {
        let result = self.run(value).await;
        handler(result).await
    }

    /// Ejecuta el pipeline y, si tuvo éxito, entrega el valor y el contexto
    /// final a `handler`. Si falló, el error se devuelve sin invocar a
    /// `handler`, de modo que el llamador lo propaga con `?`.
    pub async fn use_value<R, H, Fut>(&self, value: I, handler: H) -> Result<R, E>
        where H: FnOnce(V, C) -> Fut,
              Fut: Future<Output = R>
    {
        let compiled = self.compile();
        let outcome = compiled.run_outcome(value).await;
        let value = outcome.result?;
        match outcome.context {
            Some(context) => Ok(handler(value, context).await),
            None => Err(compiled.fail(PipelineError::TypeMismatch { expected: type_name::<C>() })),
        }
    }
}
