//! Errores del motor de pipelines.
//!
//! Toda falla que ocurre dentro de una ejecución se representa primero como
//! `PipelineError` ("falla cruda"). El transformador de errores del nodo la
//! convierte luego en el tipo de error elegido por el autor del pipeline.

use std::any::Any;
use std::error::Error as StdError;

use thiserror::Error;

use crate::constants::UNKNOWN_PANIC_MESSAGE;

/// Error genérico que un step puede devolver. Cualquier `E: Error`, `&str` o
/// `String` se convierte con `?` o `.into()`.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Resultado que devuelve la función de usuario de un step de transformación.
pub type StepResult<T> = Result<T, BoxError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Un step devolvió `Err` explícitamente.
    #[error("{0}")]
    Step(BoxError),
    /// Un predicado de `assert` evaluó a `false`.
    #[error("{message}")]
    Assertion { message: String },
    /// Una función de usuario hizo panic (de forma síncrona o durante el `.await`).
    #[error("{message}")]
    Panicked { message: String },
    /// `run_seeded` sin valor inicial configurado con `with_input`.
    #[error("pipeline has no seeded input value")]
    MissingInput,
    /// Un valor borrado no tenía el tipo esperado por el step (error interno).
    #[error("internal: expected a value of type {expected}")]
    TypeMismatch { expected: &'static str },
    /// Falla transformada por `fails_with`, conserva la original como causa.
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        cause: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn step(err: impl Into<BoxError>) -> Self {
        Self::Step(err.into())
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion { message: message.into() }
    }

    /// Normaliza el payload de un panic a `PipelineError::Panicked`.
    /// Payloads que no son `&str` ni `String` usan un mensaje genérico.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(s) => *s,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(s) => (*s).to_string(),
                Err(_) => UNKNOWN_PANIC_MESSAGE.to_string(),
            },
        };
        Self::Panicked { message }
    }

    /// Causa directa si la falla fue transformada.
    pub fn cause(&self) -> Option<&PipelineError> {
        match self {
            Self::Failed { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Falla original al final de la cadena de causas.
    pub fn root_cause(&self) -> &PipelineError {
        let mut current = self;
        while let Some(next) = current.cause() {
            current = next;
        }
        current
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self.root_cause(), Self::Assertion { .. })
    }

    pub fn is_panic(&self) -> bool {
        matches!(self.root_cause(), Self::Panicked { .. })
    }
}

/// Tipos de error que `fails_with_as` sabe construir a partir de un mensaje y
/// la falla cruda que lo provocó.
pub trait ErrorFactory: Sized {
    fn with_cause(message: String, cause: PipelineError) -> Self;
}

impl ErrorFactory for PipelineError {
    fn with_cause(message: String, cause: PipelineError) -> Self {
        Self::Failed { message,
                       cause: Box::new(cause) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_variant_displays_inner_message() {
        let err = PipelineError::step("boom");
        assert_eq!(err.to_string(), "boom");
        assert!(err.cause().is_none());
    }

    #[test]
    fn failed_variant_keeps_cause_chain() {
        let err = PipelineError::with_cause("op failed".into(), PipelineError::assertion("must be positive"));
        assert_eq!(err.to_string(), "op failed");
        assert_eq!(err.cause().map(|c| c.to_string()).as_deref(), Some("must be positive"));
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("must be positive"));
        assert!(err.is_assertion());
    }

    #[test]
    fn root_cause_walks_nested_failures() {
        let inner = PipelineError::with_cause("inner".into(), PipelineError::step("disk full"));
        let outer = PipelineError::with_cause("outer".into(), inner);
        assert_eq!(outer.root_cause().to_string(), "disk full");
    }

    #[test]
    fn panic_payloads_are_stringified() {
        let from_str = PipelineError::from_panic(Box::new("kaboom"));
        assert_eq!(from_str.to_string(), "kaboom");

        let from_string = PipelineError::from_panic(Box::new(String::from("owned kaboom")));
        assert_eq!(from_string.to_string(), "owned kaboom");

        let opaque = PipelineError::from_panic(Box::new(42_u8));
        assert_eq!(opaque.to_string(), UNKNOWN_PANIC_MESSAGE);
        assert!(opaque.is_panic());
    }
}
