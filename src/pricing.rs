//! Cotización de pedidos construida sobre `pipe-core`.
//!
//! El pipeline base valida el pedido, calcula el subtotal, elige el tramo de
//! descuento (step de contexto) y aplica impuestos con un `Stage`. Las
//! variantes estándar y exprés derivan del mismo prefijo y sólo difieren en el
//! costo de envío.

use async_trait::async_trait;
use log::debug;
use pipe_adapters::{Endpoint, FailureEncoder};
use pipe_core::{pipeline_with_context, ErrorFactory, Pipeline, PipelineError, Stage, StepResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PricingConfig;

pub const STANDARD_SHIPPING_CENTS: u64 = 499;
pub const EXPRESS_SHIPPING_CENTS: u64 = 1299;

const BPS_SCALE: u128 = 10_000;
const OUT_OF_RANGE: &str = "importe fuera de rango";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub sku: String,
    pub quantity: u32,
    pub unit_price_cents: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer: String,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub express: bool,
}

/// Valor intermedio tras sumar las líneas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtotal {
    pub customer: String,
    pub cents: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub customer: String,
    pub subtotal_cents: u64,
    pub discount_cents: u64,
    pub tax_cents: u64,
    pub shipping_cents: u64,
    pub total_cents: u64,
}

impl Quote {
    fn with_shipping(self, shipping_cents: u64) -> StepResult<Self> {
        let total_cents = self.total_cents.checked_add(shipping_cents).ok_or(OUT_OF_RANGE)?;
        Ok(Self { total_cents,
                  shipping_cents,
                  ..self })
    }
}

/// Contexto del pipeline: parámetros de configuración más el descuento
/// elegido durante la ejecución.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingContext {
    pub tax_rate_bps: u32,
    pub max_items: usize,
    pub discount_bps: u32,
}

impl From<&PricingConfig> for PricingContext {
    fn from(cfg: &PricingConfig) -> Self {
        Self { tax_rate_bps: cfg.tax_rate_bps,
               max_items: cfg.max_items,
               discount_bps: 0 }
    }
}

/// Tramo de descuento según el subtotal (en puntos básicos).
pub fn discount_tier(subtotal_cents: u64) -> u32 {
    if subtotal_cents >= 50_000 {
        1_000
    } else if subtotal_cents >= 10_000 {
        500
    } else {
        0
    }
}

/// `cents * bps / 10_000` en `u128`; falla si el resultado no cabe en `u64`.
fn apply_bps(cents: u64, bps: u32) -> StepResult<u64> {
    let scaled = u128::from(cents) * u128::from(bps) / BPS_SCALE;
    u64::try_from(scaled).map_err(|_| OUT_OF_RANGE.into())
}

fn subtotal(order: OrderRequest, _ctx: &PricingContext) -> StepResult<Subtotal> {
    let mut cents: u64 = 0;
    for item in &order.items {
        if item.quantity == 0 {
            return Err(format!("cantidad inválida para {}", item.sku).into());
        }
        let line = item.unit_price_cents
                       .checked_mul(u64::from(item.quantity))
                       .ok_or_else(|| format!("importe fuera de rango en {}", item.sku))?;
        cents = cents.checked_add(line).ok_or(OUT_OF_RANGE)?;
    }
    Ok(Subtotal { customer: order.customer,
                  cents })
}

/// Aplica descuento e impuesto usando el contexto vigente.
pub struct ApplyTax;

#[async_trait]
impl Stage<Subtotal, PricingContext> for ApplyTax {
    type Output = Quote;

    fn name(&self) -> &str {
        "apply_tax"
    }

    async fn run(&self, value: Subtotal, context: &PricingContext) -> StepResult<Quote> {
        let discount_cents = apply_bps(value.cents, context.discount_bps)?;
        let taxable = value.cents.checked_sub(discount_cents).ok_or(OUT_OF_RANGE)?;
        let tax_cents = apply_bps(taxable, context.tax_rate_bps)?;
        let total_cents = taxable.checked_add(tax_cents).ok_or(OUT_OF_RANGE)?;
        debug!("quote for {}: taxable={taxable} tax={tax_cents}", value.customer);
        Ok(Quote { customer: value.customer,
                   subtotal_cents: value.cents,
                   discount_cents,
                   tax_cents,
                   shipping_cents: 0,
                   total_cents })
    }
}

/// Error expuesto por el endpoint de cotización.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct QuoteError {
    pub message: String,
    #[source]
    pub cause: PipelineError,
}

impl ErrorFactory for QuoteError {
    fn with_cause(message: String, cause: PipelineError) -> Self {
        Self { message, cause }
    }
}

impl FailureEncoder for QuoteError {
    fn status(&self) -> u16 {
        self.cause.status()
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn cause_message(&self) -> Option<String> {
        Some(self.cause.root_cause().to_string())
    }
}

pub type QuotePipeline = Pipeline<OrderRequest, Quote, PricingContext, PricingContext>;
pub type QuoteEndpoint = Endpoint<OrderRequest, Quote, PricingContext, PricingContext, QuoteError>;

/// Prefijo común: validación, subtotal, descuento e impuesto (sin envío).
pub fn quote_pipeline(cfg: &PricingConfig) -> QuotePipeline {
    pipeline_with_context::<OrderRequest, _>(PricingContext::from(cfg))
        .assert(|order: &OrderRequest, _| !order.items.is_empty(), "el pedido no tiene líneas")
        .assert(|order, ctx| order.items.len() <= ctx.max_items, "el pedido supera el máximo de líneas")
        .step(subtotal)
        .context(|ctx: PricingContext, sub: &Subtotal| PricingContext { discount_bps: discount_tier(sub.cents),
                                                                        ..ctx })
        .stage(ApplyTax)
}

/// Ramas con envío estándar y exprés, derivadas del mismo prefijo.
pub struct QuoteRoutes {
    pub standard: QuoteEndpoint,
    pub express: QuoteEndpoint,
}

impl QuoteRoutes {
    pub fn new(cfg: &PricingConfig) -> Self {
        let base = quote_pipeline(cfg);
        let standard = base.step(|quote: Quote, _| quote.with_shipping(STANDARD_SHIPPING_CENTS))
                           .fails_with_as::<QuoteError>("no se pudo cotizar el pedido");
        let express = base.step(|quote: Quote, _| quote.with_shipping(EXPRESS_SHIPPING_CENTS))
                          .fails_with_as::<QuoteError>("no se pudo cotizar el pedido exprés");
        Self { standard: Endpoint::new("quote.standard", standard),
               express: Endpoint::new("quote.express", express) }
    }

    /// Elige la rama según `order.express`.
    pub fn route(&self, order: &OrderRequest) -> &QuoteEndpoint {
        if order.express {
            &self.express
        } else {
            &self.standard
        }
    }
}

/// Cabeceras de respuesta derivadas del contexto final.
pub fn quote_headers(ctx: &PricingContext) -> Vec<(String, String)> {
    vec![("x-discount-bps".to_string(), ctx.discount_bps.to_string()),
         ("x-tax-rate-bps".to_string(), ctx.tax_rate_bps.to_string())]
}
