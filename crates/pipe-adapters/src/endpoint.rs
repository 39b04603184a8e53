//! `Endpoint`: un `Pipeline` con salida HTTP-like.
//!
//! Cada método de encadenamiento se reenvía explícitamente al pipeline
//! interno y devuelve un `Endpoint` nuevo; no hay intercepción dinámica.

use std::future::Future;
use std::sync::Arc;

use pipe_core::{ErrorFactory, Pipeline, PipelineError, Stage, StepResult};
use serde::Serialize;

use crate::encoder::FailureEncoder;
use crate::error::AdapterError;
use crate::response::{respond_with, Response};

pub struct Endpoint<I, V, C0, C, E = PipelineError> {
    name: Arc<str>,
    pipeline: Pipeline<I, V, C0, C, E>,
}

impl<I, V, C0, C, E> Endpoint<I, V, C0, C, E>
    where I: Send + 'static,
          V: Send + 'static,
          C0: Send + 'static,
          C: Send + 'static,
          E: 'static
{
    pub fn new(name: impl Into<Arc<str>>, pipeline: Pipeline<I, V, C0, C, E>) -> Self {
        Self { name: name.into(),
               pipeline }
    }

    fn wrap<NV, NC, NE>(&self, pipeline: Pipeline<I, NV, C0, NC, NE>) -> Endpoint<I, NV, C0, NC, NE> {
        Endpoint { name: Arc::clone(&self.name),
                   pipeline }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pipeline(&self) -> &Pipeline<I, V, C0, C, E> {
        &self.pipeline
    }

    pub fn step<NV, F>(&self, f: F) -> Endpoint<I, NV, C0, C, E>
        where NV: Send + 'static,
              F: Fn(V, &C) -> StepResult<NV> + Send + Sync + 'static
    {
        self.wrap(self.pipeline.step(f))
    }

    pub fn step_async<NV, F, Fut>(&self, f: F) -> Endpoint<I, NV, C0, C, E>
        where NV: Send + 'static,
              F: Fn(V, &C) -> Fut + Send + Sync + 'static,
              Fut: Future<Output = StepResult<NV>> + Send + 'static
    {
        self.wrap(self.pipeline.step_async(f))
    }

    pub fn stage<S>(&self, stage: S) -> Endpoint<I, S::Output, C0, C, E>
        where C: Sync,
              S: Stage<V, C>
    {
        self.wrap(self.pipeline.stage(stage))
    }

    pub fn context<NC, F>(&self, f: F) -> Endpoint<I, V, C0, NC, E>
        where NC: Send + 'static,
              F: Fn(C, &V) -> NC + Send + Sync + 'static
    {
        self.wrap(self.pipeline.context(f))
    }

    pub fn context_async<NC, F, Fut>(&self, f: F) -> Endpoint<I, V, C0, NC, E>
        where NC: Send + 'static,
              F: Fn(C, &V) -> Fut + Send + Sync + 'static,
              Fut: Future<Output = NC> + Send + 'static
    {
        self.wrap(self.pipeline.context_async(f))
    }

    pub fn assert<F>(&self, predicate: F, message: impl Into<Arc<str>>) -> Self
        where F: Fn(&V, &C) -> bool + Send + Sync + 'static
    {
        self.wrap(self.pipeline.assert(predicate, message))
    }

    pub fn assert_default<F>(&self, predicate: F) -> Self
        where F: Fn(&V, &C) -> bool + Send + Sync + 'static
    {
        self.wrap(self.pipeline.assert_default(predicate))
    }

    pub fn assert_async<F, Fut>(&self, predicate: F, message: impl Into<Arc<str>>) -> Self
        where F: Fn(&V, &C) -> Fut + Send + Sync + 'static,
              Fut: Future<Output = bool> + Send + 'static
    {
        self.wrap(self.pipeline.assert_async(predicate, message))
    }

    /// Siembra el valor de entrada del pipeline interno.
    pub fn with_input(&self, value: I) -> Self
        where I: Clone + Sync
    {
        self.wrap(self.pipeline.with_input(value))
    }

    pub fn fails_with(&self, message: impl Into<String>) -> Endpoint<I, V, C0, C, PipelineError> {
        self.wrap(self.pipeline.fails_with(message))
    }

    pub fn fails_with_as<E2>(&self, message: impl Into<String>) -> Endpoint<I, V, C0, C, E2>
        where E2: ErrorFactory + 'static
    {
        self.wrap(self.pipeline.fails_with_as::<E2>(message))
    }

    pub fn map_failure<E2, F>(&self, f: F) -> Endpoint<I, V, C0, C, E2>
        where E2: 'static,
              F: Fn(PipelineError) -> E2 + Send + Sync + 'static
    {
        self.wrap(self.pipeline.map_failure(f))
    }
}

impl<I, V, C0, C, E> Endpoint<I, V, C0, C, E>
    where I: Send + 'static,
          V: Serialize + Send + 'static,
          C0: Send + 'static,
          C: Send + 'static,
          E: FailureEncoder + 'static
{
    /// Ejecuta el pipeline y traduce el resultado a `Response`.
    pub async fn handle(&self, value: I) -> Result<Response, AdapterError> {
        self.handle_with(value, |_| Vec::new()).await
    }

    /// Como `handle`, con cabeceras derivadas del contexto final.
    pub async fn handle_with<H>(&self, value: I, headers: H) -> Result<Response, AdapterError>
        where H: FnOnce(&C) -> Vec<(String, String)>
    {
        let outcome = self.pipeline.run_outcome(value).await;
        log::debug!("endpoint '{}': run {} finished", self.name, outcome.run_id);
        respond_with(outcome, headers)
    }
}

impl<I, V, C0, C, E> Clone for Endpoint<I, V, C0, C, E> {
    fn clone(&self) -> Self {
        Self { name: Arc::clone(&self.name),
               pipeline: self.pipeline.clone() }
    }
}
