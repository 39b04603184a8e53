//! Steps del pipeline.
//!
//! Un step es una función opaca `(valor, contexto) -> future<(Result, contexto)>`
//! con tipos borrados. Este módulo define:
//! - `Step`: la unidad que ejecuta el engine.
//! - `constructors`: cómo se construyen steps desde funciones de usuario
//!   (transformación, contexto, aserción; síncronas y asíncronas).
//! - `Stage`: interfaz de alto nivel para steps con nombre.

pub mod constructors;
mod definition;
mod stage;

pub use definition::{AnyValue, Step, StepFuture, StepKind, StepOutput};
pub use stage::{from_stage, Stage};
