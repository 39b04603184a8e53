//! Engine de ejecución.
//!
//! Aplana los pasos de un nodo, los ejecuta en orden contra un valor y
//! contexto iniciales y se detiene en la primera falla.

mod compiled;
mod core;
mod outcome;

pub use compiled::CompiledPipeline;
pub use outcome::RunOutcome;
