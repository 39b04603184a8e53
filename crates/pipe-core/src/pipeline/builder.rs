//! Builder tipado del pipeline.
//!
//! `Pipeline<I, V, C0, C, E>` envuelve un `PipelineNode` con tipos borrados y
//! recuerda en tiempo de compilación:
//! - `I`: tipo del valor de entrada de `run`.
//! - `V`: tipo del valor tras el último step.
//! - `C0`: tipo del contexto inicial (el que acepta `compile_with`).
//! - `C`: tipo del contexto tras el último step de contexto.
//! - `E`: tipo de error que produce el pipeline (`PipelineError` por defecto).
//!
//! Cada método de encadenamiento toma `&self` y devuelve un pipeline nuevo,
//! así que ramificar es simplemente encadenar dos veces desde el mismo valor.
//!
//! ```ignore
//! let base = Pipeline::new().step(|v: i32, _| Ok(v * 2));
//! let plus = base.step(|v, _| Ok(v + 1));
//! let minus = base.step(|v, _| Ok(v - 1));
//! assert_eq!(plus.run(5).await?, 11);
//! assert_eq!(minus.run(5).await?, 9);
//! ```

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use super::node::{PipelineNode, ValueFactory};
use super::ErrorTransformer;
use crate::constants::DEFAULT_ASSERT_MESSAGE;
use crate::engine::{CompiledPipeline, RunOutcome};
use crate::errors::{ErrorFactory, PipelineError, StepResult};
use crate::step::{constructors, from_stage, AnyValue, Stage, Step};

pub struct Pipeline<I, V, C0, C, E = PipelineError> {
    node: Arc<PipelineNode>,
    transformer: ErrorTransformer<E>,
    _types: PhantomData<fn(I, C0) -> (V, C)>,
}

fn identity() -> ErrorTransformer<PipelineError> {
    Arc::new(|error: PipelineError| error)
}

impl<I> Pipeline<I, I, (), (), PipelineError> where I: Send + 'static
{
    /// Pipeline raíz sin contexto (`()`), sin pasos y sin transformador.
    pub fn new() -> Self {
        Self::with_context(())
    }
}

impl<I> Default for Pipeline<I, I, (), (), PipelineError> where I: Send + 'static
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, C0> Pipeline<I, I, C0, C0, PipelineError>
    where I: Send + 'static,
          C0: Clone + Send + Sync + 'static
{
    /// Pipeline raíz con contexto inicial. El contexto se clona al inicio de
    /// cada ejecución.
    pub fn with_context(context: C0) -> Self {
        let factory: ValueFactory = Arc::new(move || Box::new(context.clone()) as AnyValue);
        Self::from_node(Arc::new(PipelineNode::root(factory)), identity())
    }
}

impl<I, V, C0, C, E> Pipeline<I, V, C0, C, E>
    where I: Send + 'static,
          V: Send + 'static,
          C0: Send + 'static,
          C: Send + 'static,
          E: 'static
{
    fn from_node(node: Arc<PipelineNode>, transformer: ErrorTransformer<E>) -> Self {
        Self { node,
               transformer,
               _types: PhantomData }
    }

    fn push<NV, NC>(&self, step: Step) -> Pipeline<I, NV, C0, NC, E> {
        Pipeline { node: self.node.child(step),
                   transformer: Arc::clone(&self.transformer),
                   _types: PhantomData }
    }

    fn retarget<E2>(&self, transformer: ErrorTransformer<E2>) -> Pipeline<I, V, C0, C, E2> {
        Pipeline { node: Arc::clone(&self.node),
                   transformer,
                   _types: PhantomData }
    }

    /// Número total de pasos (incluida la historia de los ancestros).
    pub fn step_count(&self) -> usize {
        self.node.flatten().len()
    }

    // ----------------------------------------------------------------
    // Encadenamiento
    // ----------------------------------------------------------------

    /// Agrega un step de transformación síncrono.
    pub fn step<NV, F>(&self, f: F) -> Pipeline<I, NV, C0, C, E>
        where NV: Send + 'static,
              F: Fn(V, &C) -> StepResult<NV> + Send + Sync + 'static
    {
        self.push(constructors::transform(f))
    }

    /// Agrega un step de transformación asíncrono.
    pub fn step_async<NV, F, Fut>(&self, f: F) -> Pipeline<I, NV, C0, C, E>
        where NV: Send + 'static,
              F: Fn(V, &C) -> Fut + Send + Sync + 'static,
              Fut: Future<Output = StepResult<NV>> + Send + 'static
    {
        self.push(constructors::transform_async(f))
    }

    /// Agrega un `Stage` (step con nombre implementado como tipo propio).
    pub fn stage<S>(&self, stage: S) -> Pipeline<I, S::Output, C0, C, E>
        where C: Sync,
              S: Stage<V, C>
    {
        self.push(from_stage(stage))
    }

    /// Agrega un step que reemplaza el contexto. No puede fallar.
    pub fn context<NC, F>(&self, f: F) -> Pipeline<I, V, C0, NC, E>
        where NC: Send + 'static,
              F: Fn(C, &V) -> NC + Send + Sync + 'static
    {
        self.push(constructors::context(f))
    }

    pub fn context_async<NC, F, Fut>(&self, f: F) -> Pipeline<I, V, C0, NC, E>
        where NC: Send + 'static,
              F: Fn(C, &V) -> Fut + Send + Sync + 'static,
              Fut: Future<Output = NC> + Send + 'static
    {
        self.push(constructors::context_async(f))
    }

    /// Agrega una aserción: si `predicate` devuelve `false` el pipeline falla
    /// con `message`.
    pub fn assert<F>(&self, predicate: F, message: impl Into<Arc<str>>) -> Self
        where F: Fn(&V, &C) -> bool + Send + Sync + 'static
    {
        self.push(constructors::assert(predicate, message))
    }

    /// Como `assert`, con el mensaje por defecto `"Assertion failed"`.
    pub fn assert_default<F>(&self, predicate: F) -> Self
        where F: Fn(&V, &C) -> bool + Send + Sync + 'static
    {
        self.assert(predicate, DEFAULT_ASSERT_MESSAGE)
    }

    pub fn assert_async<F, Fut>(&self, predicate: F, message: impl Into<Arc<str>>) -> Self
        where F: Fn(&V, &C) -> Fut + Send + Sync + 'static,
              Fut: Future<Output = bool> + Send + 'static
    {
        self.push(constructors::assert_async(predicate, message))
    }

    // ----------------------------------------------------------------
    // Transformación de errores
    // ----------------------------------------------------------------

    /// Envuelve toda falla cruda en `PipelineError::Failed { message, cause }`.
    /// Reemplaza (no compone) cualquier transformador previo.
    pub fn fails_with(&self, message: impl Into<String>) -> Pipeline<I, V, C0, C, PipelineError> {
        self.fails_with_as::<PipelineError>(message)
    }

    /// Construye un `E2` con `message` y la falla cruda como causa.
    pub fn fails_with_as<E2>(&self, message: impl Into<String>) -> Pipeline<I, V, C0, C, E2>
        where E2: ErrorFactory + 'static
    {
        let message = message.into();
        self.retarget(Arc::new(move |cause: PipelineError| E2::with_cause(message.clone(), cause)))
    }

    /// Transformador arbitrario de la falla cruda.
    pub fn map_failure<E2, F>(&self, f: F) -> Pipeline<I, V, C0, C, E2>
        where E2: 'static,
              F: Fn(PipelineError) -> E2 + Send + Sync + 'static
    {
        self.retarget(Arc::new(f))
    }

    /// Siembra un valor inicial para `run_seeded`. Se clona en cada ejecución.
    pub fn with_input(&self, value: I) -> Self
        where I: Clone + Sync
    {
        let factory: ValueFactory = Arc::new(move || Box::new(value.clone()) as AnyValue);
        Self::from_node(self.node.with_initial_value(factory), Arc::clone(&self.transformer))
    }

    // ----------------------------------------------------------------
    // Compilación y ejecución
    // ----------------------------------------------------------------

    /// Fija el contexto inicial del nodo y devuelve un ejecutable reutilizable.
    pub fn compile(&self) -> CompiledPipeline<I, V, C, E> {
        CompiledPipeline::new(self.node.flatten(),
                              Arc::clone(self.node.initial_context()),
                              Arc::clone(&self.transformer))
    }

    /// Igual que `compile` pero con un contexto inicial distinto.
    pub fn compile_with(&self, context: C0) -> CompiledPipeline<I, V, C, E>
        where C0: Clone + Sync
    {
        let factory: ValueFactory = Arc::new(move || Box::new(context.clone()) as AnyValue);
        CompiledPipeline::new(self.node.flatten(), factory, Arc::clone(&self.transformer))
    }

    /// Equivalente a `self.compile().run(value)`.
    pub async fn run(&self, value: I) -> Result<V, E> {
        self.compile().run(value).await
    }

    pub async fn run_outcome(&self, value: I) -> RunOutcome<V, C, E> {
        self.compile().run_outcome(value).await
    }

    /// Ejecuta con el valor sembrado por `with_input`. Sin valor sembrado
    /// falla con `PipelineError::MissingInput` (pasando por el transformador).
    pub async fn run_seeded(&self) -> Result<V, E> {
        let compiled = self.compile();
        match self.node.initial_value() {
            Some(seed) => compiled.run_erased(seed()).await.result,
            None => Err(compiled.fail(PipelineError::MissingInput)),
        }
    }
}

impl<I, V, C0, C, E> Clone for Pipeline<I, V, C0, C, E> {
    fn clone(&self) -> Self {
        Self { node: Arc::clone(&self.node),
               transformer: Arc::clone(&self.transformer),
               _types: PhantomData }
    }
}

impl<I, V, C0, C, E> fmt::Debug for Pipeline<I, V, C0, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
         .field("own_steps", &self.node.own_steps().len())
         .field("branched_from_parent", &self.node.parent().is_some())
         .finish_non_exhaustive()
    }
}
