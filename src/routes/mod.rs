pub mod catalog;
pub mod health;
pub mod inspections;
pub mod me;
pub mod pricing;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        .route("/catalog/service-types", get(catalog::list_service_types))
        .route("/catalog/checklist", get(catalog::get_checklist))
        .route("/catalog/items/:name", get(catalog::get_item))
        .route("/catalog/suggestions", get(catalog::list_suggestions))
        .route("/catalog/suggestions/:name", get(catalog::get_suggestion))
        .route("/catalog/plans", get(catalog::list_plans))
        // Protected routes
        .route("/me", get(me::get_me))
        // Inspections
        .route(
            "/inspections",
            post(inspections::create_inspection).get(inspections::list_inspections),
        )
        .route(
            "/inspections/:id",
            get(inspections::get_inspection)
                .put(inspections::replace_inspection)
                .delete(inspections::delete_inspection),
        )
        .route(
            "/inspections/:id/items/:index",
            patch(inspections::update_item),
        )
        .route(
            "/inspections/:id/equipment/:index",
            patch(inspections::update_equipment),
        )
        .route(
            "/inspections/:id/service-types",
            put(inspections::reselect_service_types),
        )
        .route(
            "/inspections/:id/suggestions/toggle",
            post(inspections::toggle_suggestion),
        )
        .route("/inspections/:id/summary", get(inspections::get_summary))
        .route("/inspections/:id/invoice", post(inspections::create_invoice))
        // Pricing
        .route("/pricing/services", post(pricing::price_services))
}
