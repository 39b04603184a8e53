//! pipeflow: servicio de cotización de pedidos sobre `pipe-core`.
//!
//! - `config`: `AppConfig` desde variables de entorno / `.env`.
//! - `errors`: `AppError` de nivel aplicación.
//! - `pricing`: pipeline de cotización y sus endpoints.

pub mod config;
pub mod errors;
pub mod pricing;

pub use config::{AppConfig, PricingConfig};
pub use errors::AppError;
pub use pricing::{quote_pipeline, OrderRequest, Quote, QuoteError, QuoteRoutes};
