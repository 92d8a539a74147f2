//! Catalog routes
//!
//! Read-only reference data: service types, derived checklists, upsell
//! suggestions and maintenance plans. Public.

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::api::response::DataResponse;
use crate::domain::{ServiceType, ServiceTypeResponse};
use crate::engine::{catalog, checklist};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ChecklistQuery {
    /// Comma separated, e.g. `furnace,ac`
    pub service_types: Option<String>,
}

fn parse_service_type_list(raw: &str) -> Result<Vec<ServiceType>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<ServiceType>().map_err(|e| ApiError::bad_request(e.to_string())))
        .collect()
}

/// GET /catalog/service-types
pub async fn list_service_types() -> impl IntoResponse {
    let types: Vec<ServiceTypeResponse> = ServiceType::ALL.iter().copied().map(Into::into).collect();
    Json(DataResponse::new(types))
}

/// GET /catalog/checklist?service_types=furnace,ac
///
/// Checklist definitions for a service selection. No selection yields an
/// empty list.
pub async fn get_checklist(
    Query(query): Query<ChecklistQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let selected = match query.service_types.as_deref() {
        Some(raw) => parse_service_type_list(raw)?,
        None => Vec::new(),
    };

    let definitions = checklist::derive_definitions(&selected);
    tracing::debug!(
        service_types = ?selected,
        items = definitions.len(),
        "Derived checklist"
    );

    Ok(Json(DataResponse::new(definitions)))
}

/// GET /catalog/items/:name
///
/// One checklist item with every service type that lists it.
pub async fn get_item(Path(name): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let definition = catalog::item_definition(&name)
        .ok_or_else(|| ApiError::not_found(format!("Checklist item not found: {name}")))?;
    Ok(Json(DataResponse::new(definition)))
}

/// GET /catalog/suggestions
pub async fn list_suggestions() -> impl IntoResponse {
    Json(DataResponse::new(catalog::all_suggestions()))
}

/// GET /catalog/suggestions/:name
///
/// Never 404s: unknown names resolve to the default pitch.
pub async fn get_suggestion(Path(name): Path<String>) -> impl IntoResponse {
    Json(DataResponse::new(catalog::suggestion_info(&name)))
}

/// GET /catalog/plans
pub async fn list_plans() -> impl IntoResponse {
    Json(DataResponse::new(catalog::maintenance_plans()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn service_type_list_parsing() {
        assert_eq!(
            parse_service_type_list("hot_water_tank, furnace,,").unwrap(),
            vec![ServiceType::HotWaterTank, ServiceType::Furnace]
        );
        assert!(parse_service_type_list("").unwrap().is_empty());
        assert!(parse_service_type_list("furnace,boiler").is_err());
    }
}
