//! Service pricing routes

use axum::{response::IntoResponse, Json};
use serde::Deserialize;

use crate::api::response::DataResponse;
use crate::auth::RequireAuth;
use crate::engine::pricing::{
    compute_service_prices, BillableService, ServicePrices, ServiceQuote, ServiceSelection,
};

#[derive(Debug, Deserialize)]
pub struct ServicePricingRequest {
    #[serde(flatten)]
    pub selection: ServiceSelection,
    /// Prices currently shown on the form; unselected slots keep these
    #[serde(default)]
    pub previous: Option<ServicePrices>,
    /// Flip this service before pricing
    #[serde(default)]
    pub toggle: Option<BillableService>,
}

impl ServicePricingRequest {
    fn quote(self) -> ServiceQuote {
        let previous = self.previous.unwrap_or_default();
        match self.toggle {
            Some(service) => {
                let mut quote = ServiceQuote {
                    selection: self.selection,
                    prices: previous,
                };
                quote.toggle(service);
                quote
            }
            None => ServiceQuote {
                selection: self.selection,
                prices: compute_service_prices(self.selection, previous),
            },
        }
    }
}

/// POST /pricing/services
///
/// Tier prices for a service selection.
pub async fn price_services(
    auth: RequireAuth,
    Json(req): Json<ServicePricingRequest>,
) -> impl IntoResponse {
    let quote = req.quote();

    tracing::debug!(
        user_id = %auth.user_id,
        services = quote.selection.count(),
        "Priced services"
    );

    Json(DataResponse::new(quote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    #[test]
    fn toggle_flips_and_reprices() {
        let req: ServicePricingRequest = serde_json::from_value(serde_json::json!({
            "furnace": true,
            "ac": true,
            "hot_water_tank": true,
            "previous": {"furnace": "83.33", "ac": "83.33", "hot_water": "83.34"},
            "toggle": "ac"
        }))
        .unwrap();
        let quote = req.quote();

        assert!(!quote.selection.ac);
        assert_eq!(quote.prices.furnace, Decimal::new(10000, 2));
        assert_eq!(quote.prices.ac, Decimal::new(8333, 2));
    }

    #[test]
    fn plain_selection_uses_tiers() {
        let req: ServicePricingRequest =
            serde_json::from_value(serde_json::json!({"hot_water": true})).unwrap();
        let quote = req.quote();

        assert_eq!(quote.selection.count(), 1);
        assert_eq!(quote.prices.hot_water, Decimal::new(12500, 2));
    }
}
