//! Builder inmutable del pipeline y su representación interna.
//!
//! - `node`: nodos con tipos borrados, compartición estructural y cache de
//!   aplanado.
//! - `builder`: `Pipeline`, la fachada tipada con los métodos de
//!   encadenamiento, compilación y ejecución.
//! - `boundary`: `use_result` / `use_value` para los bordes del sistema.

mod boundary;
mod builder;
mod node;

use std::sync::Arc;

use crate::errors::PipelineError;

pub use builder::Pipeline;
pub(crate) use node::ValueFactory;

/// Convierte la falla cruda en el error que expone el pipeline.
pub(crate) type ErrorTransformer<E> = Arc<dyn Fn(PipelineError) -> E + Send + Sync>;

/// Pipeline raíz sin contexto. Atajo de `Pipeline::new()`.
pub fn pipeline<I>() -> Pipeline<I, I, (), ()>
    where I: Send + 'static
{
    Pipeline::new()
}

/// Pipeline raíz con contexto inicial. Atajo de `Pipeline::with_context`.
pub fn pipeline_with_context<I, C>(context: C) -> Pipeline<I, I, C, C>
    where I: Send + 'static,
          C: Clone + Send + Sync + 'static
{
    Pipeline::with_context(context)
}
