//! Inspection routes
//!
//! Create, edit and report on tune-up inspections.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::{
    ChecklistItemState, EquipmentPatch, InspectionDetails, InspectionDraft, InspectionRecord,
    SaveInspectionRequest, ServiceType, UpdateItemRequest,
};
use crate::engine::catalog;
use crate::engine::pricing::{
    build_invoice, AdditionalWork, ApprovedSuggestion, BillableService, ServiceQuote,
    ServiceSelection, MAX_LINE_PRICE, MAX_TAX_RATE,
};
use crate::engine::report::{compose_invoice_report, compose_summary, SummaryDocument};
use crate::engine::{CompletionStats, InspectionSession};
use crate::error::{ApiError, ApiResult};
use crate::services::inspection_store::{self, LockedInspection};

async fn load(state: &AppState, id: Uuid) -> ApiResult<InspectionRecord> {
    inspection_store::fetch(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Inspection not found"))
}

fn summary_of(record: &InspectionRecord) -> SummaryDocument {
    let draft = &record.draft;
    compose_summary(
        &draft.details,
        &draft.items,
        &draft.equipment,
        &draft.selected_suggestions,
    )
}

/// POST /inspections
///
/// Create an inspection. Items are derived from the service types when the
/// payload has none.
pub async fn create_inspection(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<SaveInspectionRequest>,
) -> ApiResult<impl IntoResponse> {
    let draft = req.into_draft(Utc::now().date_naive());
    let record = inspection_store::create(&state.db, draft).await?;

    tracing::info!(
        user_id = %auth.user_id,
        inspection_id = %record.id,
        customer = %record.draft.details.customer_name,
        "Inspection saved"
    );

    Ok((StatusCode::CREATED, Json(DataResponse::new(record))))
}

/// GET /inspections
///
/// Saved inspections, newest first.
pub async fn list_inspections(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    _auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let (data, total) =
        inspection_store::list(&state.db, pagination.limit(), pagination.offset()).await?;

    Ok(Json(Paginated::new(data, &pagination, total)))
}

/// GET /inspections/:id
pub async fn get_inspection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    _auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let record = load(&state, id).await?;
    Ok(Json(DataResponse::new(record)))
}

/// PUT /inspections/:id
///
/// Full replace. Items and equipment are rewritten from the payload.
pub async fn replace_inspection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<SaveInspectionRequest>,
) -> ApiResult<impl IntoResponse> {
    let draft = req.into_draft(Utc::now().date_naive());
    let record = inspection_store::replace(&state.db, id, draft)
        .await?
        .ok_or_else(|| ApiError::not_found("Inspection not found"))?;

    tracing::info!(user_id = %auth.user_id, inspection_id = %id, "Inspection updated");

    Ok(Json(DataResponse::new(record)))
}

/// DELETE /inspections/:id
pub async fn delete_inspection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    if !inspection_store::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Inspection not found"));
    }

    tracing::info!(user_id = %auth.user_id, inspection_id = %id, "Inspection removed");

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Inspection deleted successfully")),
    ))
}

/// Saved inspection opened as an editable session. Holds the edit lock until
/// saved; dropping it discards the changes.
struct OpenInspection {
    lock: LockedInspection,
    details: InspectionDetails,
    session: InspectionSession,
}

impl OpenInspection {
    async fn load(state: &AppState, id: Uuid) -> ApiResult<Self> {
        let (lock, record) = inspection_store::lock(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::not_found("Inspection not found"))?;
        let draft = record.draft;
        Ok(Self {
            lock,
            details: draft.details,
            session: InspectionSession::restore(
                draft.service_types,
                draft.items,
                draft.equipment,
                draft.selected_suggestions,
            ),
        })
    }

    /// Write the whole inspection back.
    async fn save(self) -> ApiResult<InspectionRecord> {
        let (service_types, items, equipment, selected_suggestions) = self.session.into_parts();
        let draft = InspectionDraft {
            details: self.details,
            service_types,
            items,
            equipment,
            selected_suggestions,
        };
        Ok(self.lock.save(draft).await?)
    }
}

#[derive(Debug, Serialize)]
pub struct ItemUpdateResponse {
    pub index: usize,
    pub item: ChecklistItemState,
    pub completion: CompletionStats,
    pub open_issues: usize,
    pub completed: usize,
    pub not_completed: usize,
}

/// PATCH /inspections/:id/items/:index
///
/// Edit one checklist item by position, then save the whole inspection.
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(Uuid, usize)>,
    auth: RequireAuth,
    Json(req): Json<UpdateItemRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut open = OpenInspection::load(&state, id).await?;
    let session = &mut open.session;

    let Some(was_completed) = session.items().get(index).map(|i| i.completed) else {
        return Err(ApiError::not_found(format!("Checklist item {index} not found")));
    };

    if req.completed.is_some_and(|c| c != was_completed) {
        session.toggle_completed(index);
    }
    if let Some(severity) = req.severity {
        session.set_severity(index, severity);
    }
    if let Some(notes) = req.notes {
        session.set_notes(index, notes);
    }

    let response = ItemUpdateResponse {
        index,
        item: session.items()[index].clone(),
        completion: session.completion_stats(),
        open_issues: session.issues().len(),
        completed: session.completed().len(),
        not_completed: session.not_completed().len(),
    };
    open.save().await?;

    tracing::info!(
        user_id = %auth.user_id,
        inspection_id = %id,
        index,
        completed = response.item.completed,
        severity = response.item.severity,
        "Checklist item updated"
    );

    Ok(Json(DataResponse::new(response)))
}

/// PATCH /inspections/:id/equipment/:index
pub async fn update_equipment(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(Uuid, usize)>,
    auth: RequireAuth,
    Json(patch): Json<EquipmentPatch>,
) -> ApiResult<impl IntoResponse> {
    let mut open = OpenInspection::load(&state, id).await?;

    let record = open
        .session
        .update_equipment(index, patch)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("Equipment record {index} not found")))?;
    open.save().await?;

    tracing::info!(
        user_id = %auth.user_id,
        inspection_id = %id,
        index,
        service_type = %record.service_type,
        "Equipment updated"
    );

    Ok(Json(DataResponse::new(record)))
}

#[derive(Debug, Deserialize)]
pub struct ToggleSuggestionRequest {
    #[serde(alias = "suggestion")]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionSelectionResponse {
    pub name: String,
    pub selected: bool,
    pub selected_suggestions: Vec<String>,
}

/// POST /inspections/:id/suggestions/toggle
///
/// Add the suggestion if absent, remove it if present.
pub async fn toggle_suggestion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<ToggleSuggestionRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Suggestion name is required"));
    }

    let mut open = OpenInspection::load(&state, id).await?;
    let selected = open.session.toggle_suggestion(name);
    let selected_suggestions = open.session.selected_suggestions().to_vec();
    open.save().await?;

    tracing::info!(
        user_id = %auth.user_id,
        inspection_id = %id,
        suggestion = name,
        selected,
        "Suggestion toggled"
    );

    Ok(Json(DataResponse::new(SuggestionSelectionResponse {
        name: name.to_string(),
        selected,
        selected_suggestions,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ReselectRequest {
    #[serde(alias = "serviceTypes")]
    pub service_types: Vec<ServiceType>,
}

/// PUT /inspections/:id/service-types
///
/// Change the service selection. The checklist and equipment records are
/// rebuilt from scratch; selected suggestions are kept.
pub async fn reselect_service_types(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<ReselectRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut open = OpenInspection::load(&state, id).await?;
    open.session.reselect(&req.service_types);

    tracing::info!(
        user_id = %auth.user_id,
        inspection_id = %id,
        service_types = ?open.session.service_types(),
        items = open.session.items().len(),
        equipment = open.session.equipment().len(),
        "Service types changed, checklist rebuilt"
    );

    let record = open.save().await?;
    Ok(Json(DataResponse::new(record)))
}

/// GET /inspections/:id/summary
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    _auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let record = load(&state, id).await?;
    Ok(Json(DataResponse::new(summary_of(&record))))
}

/// Approved suggestion; the catalog price applies when none is given
#[derive(Debug, Deserialize)]
pub struct ApprovedSuggestionInput {
    #[serde(alias = "suggestion")]
    pub name: String,
    pub price: Option<Decimal>,
}

impl From<ApprovedSuggestionInput> for ApprovedSuggestion {
    fn from(input: ApprovedSuggestionInput) -> Self {
        let price = input
            .price
            .unwrap_or_else(|| catalog::suggestion_info(&input.name).price);
        Self {
            name: input.name,
            price,
        }
    }
}

/// Manual price overrides per billable service
#[derive(Debug, Default, Deserialize)]
pub struct PriceOverrides {
    pub furnace: Option<Decimal>,
    pub ac: Option<Decimal>,
    #[serde(alias = "hot_water_tank")]
    pub hot_water: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceRequest {
    /// Defaults to the billable services that were inspected
    pub selection: Option<ServiceSelection>,
    #[serde(default)]
    pub prices: PriceOverrides,
    #[serde(default)]
    pub approved_suggestions: Vec<ApprovedSuggestionInput>,
    #[serde(default)]
    pub additional_work: Vec<AdditionalWork>,
    /// Falls back to `INVOICE_TAX_RATE`
    pub tax_rate: Option<Decimal>,
}

fn check_price(what: &str, price: Decimal) -> ApiResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ApiError::bad_request(format!("{what} must not be negative")));
    }
    if price > MAX_LINE_PRICE {
        return Err(ApiError::bad_request(format!(
            "{what} must not exceed {MAX_LINE_PRICE}"
        )));
    }
    Ok(())
}

impl InvoiceRequest {
    /// Reject amounts the invoice cannot sensibly carry. Negative service
    /// overrides are allowed and floor at zero.
    fn validate(&self, tax_rate: Decimal) -> ApiResult<()> {
        if tax_rate.is_sign_negative() && !tax_rate.is_zero() {
            return Err(ApiError::bad_request("tax_rate must not be negative"));
        }
        if tax_rate > MAX_TAX_RATE {
            return Err(ApiError::bad_request(format!(
                "tax_rate must not exceed {MAX_TAX_RATE}"
            )));
        }

        let overrides = [self.prices.furnace, self.prices.ac, self.prices.hot_water];
        if overrides.into_iter().flatten().any(|p| p > MAX_LINE_PRICE) {
            return Err(ApiError::bad_request(format!(
                "Service price must not exceed {MAX_LINE_PRICE}"
            )));
        }
        for suggestion in &self.approved_suggestions {
            if let Some(price) = suggestion.price {
                check_price(&format!("Price of {}", suggestion.name), price)?;
            }
        }
        for work in &self.additional_work {
            check_price(&format!("Price of {}", work.description), work.price)?;
        }
        Ok(())
    }

    fn quote(&mut self, record: &InspectionRecord) -> ServiceQuote {
        let selection = self
            .selection
            .unwrap_or_else(|| ServiceSelection::from_service_types(&record.draft.service_types));
        let mut quote = ServiceQuote::for_selection(selection);

        let overrides = [
            (BillableService::Furnace, self.prices.furnace.take()),
            (BillableService::Ac, self.prices.ac.take()),
            (BillableService::HotWaterTank, self.prices.hot_water.take()),
        ];
        for (service, price) in overrides {
            if let Some(price) = price {
                quote.set_price(service, price);
            }
        }
        quote
    }
}

/// POST /inspections/:id/invoice
///
/// Price the visit and return the summary together with the invoice.
pub async fn create_invoice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(mut req): Json<InvoiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let tax_rate = req.tax_rate.unwrap_or(state.settings.invoice_tax_rate);
    req.validate(tax_rate)?;

    let record = load(&state, id).await?;
    let summary = summary_of(&record);

    let quote = req.quote(&record);
    let approved: Vec<ApprovedSuggestion> =
        req.approved_suggestions.into_iter().map(Into::into).collect();
    let invoice = build_invoice(&quote, &approved, &req.additional_work, tax_rate);

    tracing::info!(
        user_id = %auth.user_id,
        inspection_id = %id,
        lines = invoice.lines.len(),
        total = %invoice.totals.rounded().total,
        "Invoice generated"
    );

    Ok(Json(DataResponse::new(compose_invoice_report(summary, invoice))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn record(service_types: Vec<ServiceType>) -> InspectionRecord {
        InspectionRecord {
            id: Uuid::new_v4(),
            draft: InspectionDraft {
                details: InspectionDetails {
                    customer_name: "Dana Reyes".into(),
                    address: "88 Harbor St".into(),
                    technician_name: "Kim".into(),
                    inspection_date: NaiveDate::from_ymd_opt(2024, 9, 14).unwrap(),
                    general_notes: String::new(),
                },
                service_types,
                items: vec![],
                equipment: vec![],
                selected_suggestions: vec![],
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn invoice_selection_defaults_to_inspected_services() {
        let mut req: InvoiceRequest = serde_json::from_str("{}").unwrap();
        let quote = req.quote(&record(vec![
            ServiceType::Furnace,
            ServiceType::MiniSplit,
            ServiceType::HotWaterTank,
        ]));

        assert!(quote.selection.furnace);
        assert!(!quote.selection.ac);
        assert!(quote.selection.hot_water_tank);
        assert_eq!(quote.prices.furnace, Decimal::new(10000, 2));
        assert_eq!(quote.prices.hot_water, Decimal::new(10000, 2));
    }

    #[test]
    fn price_overrides_apply_after_tiering() {
        let mut req: InvoiceRequest = serde_json::from_str(
            r#"{"selection": {"furnace": true, "ac": true}, "prices": {"ac": "90"}}"#,
        )
        .unwrap();
        let quote = req.quote(&record(vec![]));

        assert_eq!(quote.prices.furnace, Decimal::new(10000, 2));
        assert_eq!(quote.prices.ac, Decimal::new(90, 0));
    }

    #[test]
    fn approved_suggestion_falls_back_to_catalog_price() {
        let req: InvoiceRequest = serde_json::from_str(
            r#"{"approved_suggestions": [{"suggestion": "Hard start kit"}, {"name": "Duct cleaning", "price": 199}]}"#,
        )
        .unwrap();
        let approved: Vec<ApprovedSuggestion> =
            req.approved_suggestions.into_iter().map(Into::into).collect();

        assert_eq!(approved[0].price, catalog::suggestion_info("Hard start kit").price);
        assert_eq!(approved[1].price, Decimal::new(199, 0));
    }

    #[test]
    fn oversized_and_negative_amounts_are_rejected() {
        let huge: InvoiceRequest = serde_json::from_str(
            r#"{"approved_suggestions": [
                {"name": "UV light", "price": "79228162514264337593543950335"},
                {"name": "Hard start kit", "price": "1"}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(huge.validate(Decimal::ZERO), Err(ApiError::BadRequest(_))));

        let negative: InvoiceRequest = serde_json::from_str(
            r#"{"additional_work": [{"description": "Goodwill credit", "price": "-40"}]}"#,
        )
        .unwrap();
        assert!(matches!(negative.validate(Decimal::ZERO), Err(ApiError::BadRequest(_))));

        let override_too_big: InvoiceRequest =
            serde_json::from_str(r#"{"prices": {"furnace": "5000000"}}"#).unwrap();
        assert!(override_too_big.validate(Decimal::ZERO).is_err());

        let plain: InvoiceRequest = serde_json::from_str("{}").unwrap();
        assert!(plain.validate(Decimal::new(-1, 2)).is_err());
        assert!(plain.validate(Decimal::new(2, 0)).is_err());
    }

    #[test]
    fn ordinary_invoice_passes_validation() {
        let req: InvoiceRequest = serde_json::from_str(
            r#"{
                "prices": {"ac": "-5"},
                "approved_suggestions": [{"name": "Duct cleaning", "price": "1000000"}],
                "additional_work": [{"description": "Replace capacitor", "price": "180.00"}]
            }"#,
        )
        .unwrap();
        assert!(req.validate(Decimal::new(7, 2)).is_ok());
        assert!(req.validate(MAX_TAX_RATE).is_ok());
    }
}
