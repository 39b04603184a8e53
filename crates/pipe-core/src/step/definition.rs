use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::errors::PipelineError;

/// Valor con tipo borrado que circula entre steps (tanto el valor principal
/// como el contexto). Cada step conoce estáticamente el tipo real y hace
/// `downcast` al recibirlo.
pub type AnyValue = Box<dyn Any + Send>;

/// Par producido por un step: resultado del valor + contexto siguiente.
pub struct StepOutput {
    pub result: Result<AnyValue, PipelineError>,
    pub context: AnyValue,
}

impl StepOutput {
    pub fn success(value: AnyValue, context: AnyValue) -> Self {
        Self { result: Ok(value),
               context }
    }

    pub fn failure(error: PipelineError, context: AnyValue) -> Self {
        Self { result: Err(error),
               context }
    }
}

pub type StepFuture = BoxFuture<'static, StepOutput>;

type StepFn = dyn Fn(AnyValue, AnyValue) -> StepFuture + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind { Transform, Context, Assert }

/// Unidad opaca de trabajo del pipeline.
///
/// Inmutable una vez construida; se clona barato (`Arc`) para compartir
/// historia entre ramas.
#[derive(Clone)]
pub struct Step {
    kind: StepKind,
    name: Option<Arc<str>>,
    run: Arc<StepFn>,
}

impl Step {
    pub fn new<F>(kind: StepKind, run: F) -> Self
        where F: Fn(AnyValue, AnyValue) -> StepFuture + Send + Sync + 'static
    {
        Self { kind,
               name: None,
               run: Arc::new(run) }
    }

    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Invoca la función del step. La llamada síncrona puede hacer panic; el
    /// engine la envuelve en `catch_unwind`.
    pub fn call(&self, value: AnyValue, context: AnyValue) -> StepFuture {
        (self.run)(value, context)
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
         .field("kind", &self.kind)
         .field("name", &self.name)
         .finish_non_exhaustive()
    }
}

/// Recupera el tipo concreto de un valor borrado. En caso de no coincidir se
/// devuelve el valor original junto con el error para no perderlo.
pub(crate) fn downcast<T: Any>(value: AnyValue) -> Result<T, (PipelineError, AnyValue)> {
    value.downcast::<T>()
         .map(|boxed| *boxed)
         .map_err(|original| (PipelineError::TypeMismatch { expected: type_name::<T>() }, original))
}
