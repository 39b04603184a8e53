//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) una sola vez y expone `AppConfig`.
//!
//! Variables reconocidas:
//! - `PIPEFLOW_LOG`: filtro de logging para `env_logger` (por defecto `info`).
//! - `PIPEFLOW_TAX_RATE_BPS`: tasa de impuesto en puntos básicos (por defecto 1600).
//! - `PIPEFLOW_MAX_ITEMS`: máximo de líneas por pedido (por defecto 50).

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::errors::AppError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_TAX_RATE_BPS: u32 = 1600;
pub const DEFAULT_MAX_ITEMS: usize = 50;

/// Configuración global de la aplicación.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Filtro de logging (sintaxis de `env_logger`).
    pub log_filter: String,
    /// Parámetros del pipeline de cotización.
    pub pricing: PricingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingConfig {
    pub tax_rate_bps: u32,
    pub max_items: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { log_filter: DEFAULT_LOG_FILTER.to_string(),
               pricing: PricingConfig { tax_rate_bps: DEFAULT_TAX_RATE_BPS,
                                        max_items: DEFAULT_MAX_ITEMS } }
    }
}

impl AppConfig {
    /// Lee la configuración del entorno (tras cargar `.env`).
    pub fn from_env() -> Result<Self, AppError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda de
    /// variables; valores ausentes usan los defaults y valores inválidos son
    /// error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
        where F: Fn(&str) -> Option<String>
    {
        let defaults = Self::default();
        let log_filter = lookup("PIPEFLOW_LOG").unwrap_or(defaults.log_filter);
        let tax_rate_bps = parse_or(&lookup, "PIPEFLOW_TAX_RATE_BPS", defaults.pricing.tax_rate_bps)?;
        let max_items = parse_or(&lookup, "PIPEFLOW_MAX_ITEMS", defaults.pricing.max_items)?;
        if max_items == 0 {
            return Err(AppError::Config("PIPEFLOW_MAX_ITEMS debe ser mayor que 0".into()));
        }
        Ok(Self { log_filter,
                  pricing: PricingConfig { tax_rate_bps, max_items } })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
    where F: Fn(&str) -> Option<String>,
          T: std::str::FromStr
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim()
                        .parse()
                        .map_err(|_| AppError::Config(format!("{key} inválido: {raw:?}"))),
    }
}
