//! pipe-core: motor de pipelines componibles (valor + contexto).
//!
//! Un `Pipeline` acumula pasos de forma inmutable; cada método de
//! encadenamiento devuelve un nodo nuevo y los nodos existentes nunca cambian,
//! por lo que varias ramas pueden derivar del mismo prefijo sin interferir.
//! La ejecución es secuencial y se detiene en la primera falla.
//!
//! Módulos:
//! - `step`: la unidad de trabajo y cómo se construye desde funciones.
//! - `pipeline`: nodos inmutables con compartición estructural y la fachada
//!   tipada `Pipeline`.
//! - `engine`: ejecución fail-fast, `CompiledPipeline` y `RunOutcome`.
//! - `errors`: `PipelineError` y `ErrorFactory`.

pub mod constants;
pub mod engine;
pub mod errors;
pub mod pipeline;
pub mod step;

pub use engine::{CompiledPipeline, RunOutcome};
pub use errors::{BoxError, ErrorFactory, PipelineError, StepResult};
pub use pipeline::{pipeline, pipeline_with_context, Pipeline};
pub use step::{Stage, StepKind};
