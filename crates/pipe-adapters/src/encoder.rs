//! Traducción de errores del pipeline a status + mensajes.

use pipe_core::PipelineError;

/// Contrato de traducción error → respuesta.
pub trait FailureEncoder {
    /// Status HTTP a usar para esta falla.
    fn status(&self) -> u16;
    /// Mensaje visible para el cliente.
    fn message(&self) -> String;
    /// Mensaje de la causa raíz, si difiere del mensaje visible.
    fn cause_message(&self) -> Option<String> {
        None
    }
}

impl FailureEncoder for PipelineError {
    fn status(&self) -> u16 {
        match self.root_cause() {
            PipelineError::Assertion { .. } => 422,
            PipelineError::Panicked { .. } | PipelineError::TypeMismatch { .. } => 500,
            _ => 400,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn cause_message(&self) -> Option<String> {
        self.cause().map(|_| self.root_cause().to_string())
    }
}
