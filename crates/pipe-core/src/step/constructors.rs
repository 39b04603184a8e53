//! Construcción de `Step` a partir de funciones de usuario.
//!
//! Hay tres familias: transformación, actualización de contexto y aserción.
//! Las variantes síncronas se expresan sobre las asíncronas envolviendo el
//! resultado en un future ya resuelto (`future::ready`), por lo que el engine
//! sólo conoce un camino de ejecución.

use std::future::Future;
use std::sync::Arc;

use futures::future;

use super::definition::{downcast, AnyValue, Step, StepFuture, StepKind, StepOutput};
use crate::errors::{PipelineError, StepResult};

fn ready_failure(error: PipelineError, context: AnyValue) -> StepFuture {
    Box::pin(future::ready(StepOutput::failure(error, context)))
}

/// Desempaqueta (valor, contexto) con sus tipos reales. Si alguno no coincide
/// se devuelve el future de falla listo para retornar.
fn unpack<V, C>(value: AnyValue, context: AnyValue) -> Result<(V, C), StepFuture>
    where V: Send + 'static,
          C: Send + 'static
{
    let context = match downcast::<C>(context) {
        Ok(c) => c,
        Err((err, original)) => return Err(ready_failure(err, original)),
    };
    match downcast::<V>(value) {
        Ok(v) => Ok((v, context)),
        Err((err, _)) => Err(ready_failure(err, Box::new(context))),
    }
}

/// Step de transformación: `f(valor, &contexto) -> Result<nuevo_valor>`.
/// El contexto pasa sin cambios.
pub fn transform_async<V, C, NV, F, Fut>(f: F) -> Step
    where V: Send + 'static,
          C: Send + 'static,
          NV: Send + 'static,
          F: Fn(V, &C) -> Fut + Send + Sync + 'static,
          Fut: Future<Output = StepResult<NV>> + Send + 'static
{
    Step::new(StepKind::Transform, move |value, context| {
        let (value, context) = match unpack::<V, C>(value, context) {
            Ok(pair) => pair,
            Err(failed) => return failed,
        };
        let pending = f(value, &context);
        Box::pin(async move {
            match pending.await {
                Ok(next) => StepOutput::success(Box::new(next), Box::new(context)),
                Err(err) => StepOutput::failure(PipelineError::Step(err), Box::new(context)),
            }
        })
    })
}

pub fn transform<V, C, NV, F>(f: F) -> Step
    where V: Send + 'static,
          C: Send + 'static,
          NV: Send + 'static,
          F: Fn(V, &C) -> StepResult<NV> + Send + Sync + 'static
{
    transform_async(move |value: V, context: &C| future::ready(f(value, context)))
}

/// Step de contexto: `f(contexto, &valor) -> nuevo_contexto`. Nunca falla
/// (salvo panic) y deja el valor intacto.
pub fn context_async<V, C, NC, F, Fut>(f: F) -> Step
    where V: Send + 'static,
          C: Send + 'static,
          NC: Send + 'static,
          F: Fn(C, &V) -> Fut + Send + Sync + 'static,
          Fut: Future<Output = NC> + Send + 'static
{
    Step::new(StepKind::Context, move |value, context| {
        let (value, context) = match unpack::<V, C>(value, context) {
            Ok(pair) => pair,
            Err(failed) => return failed,
        };
        let pending = f(context, &value);
        Box::pin(async move {
            let next_context = pending.await;
            StepOutput::success(Box::new(value), Box::new(next_context))
        })
    })
}

pub fn context<V, C, NC, F>(f: F) -> Step
    where V: Send + 'static,
          C: Send + 'static,
          NC: Send + 'static,
          F: Fn(C, &V) -> NC + Send + Sync + 'static
{
    context_async(move |context: C, value: &V| future::ready(f(context, value)))
}

/// Step de aserción: deja pasar (valor, contexto) si el predicado es `true`,
/// si no falla con `PipelineError::Assertion { message }`.
pub fn assert_async<V, C, F, Fut>(predicate: F, message: impl Into<Arc<str>>) -> Step
    where V: Send + 'static,
          C: Send + 'static,
          F: Fn(&V, &C) -> Fut + Send + Sync + 'static,
          Fut: Future<Output = bool> + Send + 'static
{
    let message: Arc<str> = message.into();
    Step::new(StepKind::Assert, move |value, context| {
        let (value, context) = match unpack::<V, C>(value, context) {
            Ok(pair) => pair,
            Err(failed) => return failed,
        };
        let pending = predicate(&value, &context);
        let message = Arc::clone(&message);
        Box::pin(async move {
            if pending.await {
                StepOutput::success(Box::new(value), Box::new(context))
            } else {
                StepOutput::failure(PipelineError::assertion(&*message), Box::new(context))
            }
        })
    })
}

pub fn assert<V, C, F>(predicate: F, message: impl Into<Arc<str>>) -> Step
    where V: Send + 'static,
          C: Send + 'static,
          F: Fn(&V, &C) -> bool + Send + Sync + 'static
{
    assert_async(move |value: &V, context: &C| future::ready(predicate(value, context)),
                 message)
}
