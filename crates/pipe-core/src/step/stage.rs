use std::sync::Arc;

use async_trait::async_trait;

use super::definition::{downcast, Step, StepKind, StepOutput};
use crate::errors::{PipelineError, StepResult};

/// Interfaz de alto nivel para steps reutilizables con nombre.
///
/// Útil cuando la lógica de un step vive en un tipo propio (con
/// dependencias inyectadas) en lugar de un closure. El nombre aparece en los
/// logs del engine.
#[async_trait]
pub trait Stage<V, C>: Send + Sync + 'static
    where V: Send + 'static,
          C: Send + Sync + 'static
{
    type Output: Send + 'static;

    /// Nombre amigable (por defecto el nombre del tipo).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, value: V, context: &C) -> StepResult<Self::Output>;
}

/// Adapta un `Stage` a un `Step` de transformación.
pub fn from_stage<V, C, S>(stage: S) -> Step
    where V: Send + 'static,
          C: Send + Sync + 'static,
          S: Stage<V, C>
{
    let name: Arc<str> = Arc::from(stage.name());
    let stage = Arc::new(stage);
    Step::new(StepKind::Transform, move |value, context| {
        let stage = Arc::clone(&stage);
        Box::pin(async move {
            let context = match downcast::<C>(context) {
                Ok(c) => c,
                Err((err, original)) => return StepOutput::failure(err, original),
            };
            let value = match downcast::<V>(value) {
                Ok(v) => v,
                Err((err, _)) => return StepOutput::failure(err, Box::new(context)),
            };
            match stage.run(value, &context).await {
                Ok(next) => StepOutput::success(Box::new(next), Box::new(context)),
                Err(err) => StepOutput::failure(PipelineError::Step(err), Box::new(context)),
            }
        })
    }).named(name)
}
