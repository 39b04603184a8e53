use pipe_adapters::AdapterError;
use pipe_core::PipelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error del pipeline: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("Error de adaptador: {0}")]
    Adapter(#[from] AdapterError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_variant_format() {
        let err = AppError::Config("mala configuración".into());
        assert_eq!(err.to_string(), "Error de configuración: mala configuración");
    }

    #[test]
    fn test_io_variant_from() {
        let io_err = std::io::Error::other("falló IO");
        let err: AppError = io_err.into();
        assert_eq!(err.to_string(), "Error en IO: falló IO");
    }

    #[test]
    fn test_pipeline_variant_from() {
        let err: AppError = PipelineError::assertion("carrito vacío").into();
        assert_eq!(err.to_string(), "Error del pipeline: carrito vacío");
    }
}
