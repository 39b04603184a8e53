//! pipe-adapters: capa de adaptación pipeline ↔ respuestas HTTP-like.
//!
//! Este crate provee:
//! - `Response`: respuesta neutral (status + cuerpo JSON) lista para que un
//!   framework web la traduzca a su propio tipo.
//! - `FailureEncoder`: cómo un tipo de error se traduce a status y mensaje.
//! - `respond` / `respond_with`: `RunOutcome` → `Response`.
//! - `Endpoint`: envoltorio de `Pipeline` que reenvía cada método de
//!   encadenamiento al nodo interno y agrega `handle`.
//!
//! Nota: aquí no hay lógica de pipeline; sólo se consume el `Result` final y
//! el contexto que entrega el core.

pub mod encoder;
pub mod endpoint;
pub mod error;
pub mod response;

pub use encoder::FailureEncoder;
pub use endpoint::Endpoint;
pub use error::AdapterError;
pub use response::{respond, respond_with, Response};
