use std::fs;

use log::info;
use pipe_adapters::AdapterError;
use pipeflow::pricing::{quote_headers, LineItem, OrderRequest, QuoteRoutes};
use pipeflow::{AppConfig, AppError};

fn demo_orders() -> Vec<OrderRequest> {
    let item = |sku: &str, quantity, unit_price_cents| LineItem { sku: sku.to_string(),
                                                                  quantity,
                                                                  unit_price_cents };
    vec![OrderRequest { customer: "ana".into(),
                        items: vec![item("TEA-01", 2, 1500), item("MUG-02", 1, 2000)],
                        express: false },
         OrderRequest { customer: "luis".into(),
                        items: vec![item("GRINDER-9", 1, 12_000)],
                        express: true },
         OrderRequest { customer: "eva".into(),
                        items: Vec::new(),
                        express: false }]
}

/// Lee pedidos de un archivo JSON (arreglo) o usa los de demostración.
fn load_orders(path: Option<String>) -> Result<Vec<OrderRequest>, AppError> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(&path)?;
            let orders = serde_json::from_str(&raw).map_err(AdapterError::from)?;
            info!("loaded orders from {path}");
            Ok(orders)
        }
        None => Ok(demo_orders()),
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cfg = AppConfig::from_env()?;
    env_logger::Builder::new().parse_filters(&cfg.log_filter).init();
    info!("pricing config: {:?}", cfg.pricing);

    let routes = QuoteRoutes::new(&cfg.pricing);
    for order in load_orders(std::env::args().nth(1))? {
        let endpoint = routes.route(&order);
        let response = endpoint.handle_with(order.clone(), quote_headers).await?;
        info!("{} -> {} ({})", endpoint.name(), response.status, response.run_id);
        println!("{}", serde_json::to_string_pretty(&response).map_err(AdapterError::from)?);
    }
    Ok(())
}
