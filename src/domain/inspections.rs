//! Inspection domain types
//!
//! Checklist state, equipment records and the persisted inspection aggregate,
//! plus the request DTOs that normalise client payloads into them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ServiceType;
use crate::engine::checklist;

/// Highest severity rating an item can carry
pub const MAX_SEVERITY: u8 = 10;

/// Clamp an arbitrary rating into `0..=MAX_SEVERITY`.
pub fn clamp_severity(value: i64) -> u8 {
    value.clamp(0, MAX_SEVERITY as i64) as u8
}

/// Per-item checklist state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistItemState {
    pub item_name: String,
    pub completed: bool,
    pub severity: u8,
    pub notes: String,
}

impl ChecklistItemState {
    pub fn fresh(item_name: impl Into<String>) -> Self {
        Self {
            item_name: item_name.into(),
            completed: false,
            severity: 0,
            notes: String::new(),
        }
    }

    pub fn has_issue(&self) -> bool {
        self.severity > 0
    }

    pub fn severity_band(&self) -> SeverityBand {
        SeverityBand::from_severity(self.severity)
    }
}

/// Technician-facing rating band for a severity value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    NoIssue,
    Minor,
    Moderate,
    Significant,
    Critical,
}

impl SeverityBand {
    pub fn from_severity(severity: u8) -> Self {
        match severity {
            0 => Self::NoIssue,
            1..=3 => Self::Minor,
            4..=6 => Self::Moderate,
            7..=8 => Self::Significant,
            _ => Self::Critical,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NoIssue => "No Issue",
            Self::Minor => "Minor",
            Self::Moderate => "Moderate",
            Self::Significant => "Significant",
            Self::Critical => "Critical",
        }
    }
}

/// Equipment details recorded for one serviced system
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EquipmentRecord {
    pub service_type: ServiceType,
    pub brand: String,
    pub model_number: String,
    pub serial_number: String,
}

impl EquipmentRecord {
    pub fn blank(service_type: ServiceType) -> Self {
        Self {
            service_type,
            brand: String::new(),
            model_number: String::new(),
            serial_number: String::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.brand.trim().is_empty()
            && self.model_number.trim().is_empty()
            && self.serial_number.trim().is_empty()
    }
}

/// Partial edit of an equipment record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EquipmentPatch {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default, alias = "modelNumber", alias = "model")]
    pub model_number: Option<String>,
    #[serde(default, alias = "serialNumber", alias = "serial")]
    pub serial_number: Option<String>,
}

/// Customer-facing header of an inspection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InspectionDetails {
    pub customer_name: String,
    pub address: String,
    pub technician_name: String,
    pub inspection_date: NaiveDate,
    pub general_notes: String,
}

/// Everything a save writes, before the store assigns identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InspectionDraft {
    #[serde(flatten)]
    pub details: InspectionDetails,
    pub service_types: Vec<ServiceType>,
    pub items: Vec<ChecklistItemState>,
    pub equipment: Vec<EquipmentRecord>,
    pub selected_suggestions: Vec<String>,
}

/// Persisted inspection aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InspectionRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub draft: InspectionDraft,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row in the saved-inspections list
#[derive(Debug, Clone, Serialize)]
pub struct InspectionListing {
    pub id: Uuid,
    pub customer_name: String,
    pub address: String,
    pub technician_name: String,
    pub inspection_date: NaiveDate,
    pub service_types: Vec<ServiceType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Checklist item as sent by clients
#[derive(Debug, Clone, Deserialize)]
pub struct ItemPayload {
    #[serde(alias = "itemName", alias = "label")]
    pub item_name: String,
    #[serde(default, alias = "checked")]
    pub completed: bool,
    #[serde(default)]
    pub severity: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<ItemPayload> for ChecklistItemState {
    fn from(p: ItemPayload) -> Self {
        Self {
            item_name: p.item_name.trim().to_string(),
            completed: p.completed,
            severity: clamp_severity(p.severity),
            notes: p.notes.unwrap_or_default(),
        }
    }
}

/// Equipment record as sent by clients
#[derive(Debug, Clone, Deserialize)]
pub struct EquipmentPayload {
    #[serde(alias = "serviceType")]
    pub service_type: ServiceType,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default, alias = "modelNumber", alias = "model")]
    pub model_number: Option<String>,
    #[serde(default, alias = "serialNumber", alias = "serial")]
    pub serial_number: Option<String>,
}

impl From<EquipmentPayload> for EquipmentRecord {
    fn from(p: EquipmentPayload) -> Self {
        Self {
            service_type: p.service_type,
            brand: p.brand.unwrap_or_default(),
            model_number: p.model_number.unwrap_or_default(),
            serial_number: p.serial_number.unwrap_or_default(),
        }
    }
}

/// Request DTO for creating or replacing an inspection
#[derive(Debug, Clone, Deserialize)]
pub struct SaveInspectionRequest {
    #[serde(default, alias = "customerName")]
    pub customer_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, alias = "technicianName")]
    pub technician_name: String,
    #[serde(default, alias = "inspectionDate")]
    pub inspection_date: Option<NaiveDate>,
    #[serde(default, alias = "general_notes", alias = "generalNotes")]
    pub notes: String,
    #[serde(default, alias = "selected_services", alias = "serviceTypes")]
    pub service_types: Vec<ServiceType>,
    #[serde(default)]
    pub items: Option<Vec<ItemPayload>>,
    #[serde(default)]
    pub equipment: Option<Vec<EquipmentPayload>>,
    #[serde(default, alias = "selectedSuggestions")]
    pub selected_suggestions: Vec<String>,
}

impl SaveInspectionRequest {
    /// Normalise the payload. Missing items are derived from the service
    /// types; missing equipment defaults to one blank record per type.
    pub fn into_draft(self, default_date: NaiveDate) -> InspectionDraft {
        let service_types = ServiceType::canonicalize(&self.service_types);

        let items = match self.items {
            Some(items) => items.into_iter().map(Into::into).collect(),
            None => checklist::derive_checklist(&service_types),
        };

        let equipment = match self.equipment {
            Some(equipment) => equipment.into_iter().map(Into::into).collect(),
            None => service_types
                .iter()
                .copied()
                .map(EquipmentRecord::blank)
                .collect(),
        };

        let mut selected_suggestions: Vec<String> = Vec::new();
        for name in self.selected_suggestions {
            let name = name.trim().to_string();
            if !name.is_empty() && !selected_suggestions.contains(&name) {
                selected_suggestions.push(name);
            }
        }

        InspectionDraft {
            details: InspectionDetails {
                customer_name: self.customer_name,
                address: self.address,
                technician_name: self.technician_name,
                inspection_date: self.inspection_date.unwrap_or(default_date),
                general_notes: self.notes,
            },
            service_types,
            items,
            equipment,
            selected_suggestions,
        }
    }
}

/// Request DTO for editing one checklist item in place
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default, alias = "checked")]
    pub completed: Option<bool>,
    #[serde(default)]
    pub severity: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()
    }

    #[test]
    fn clamp_severity_bounds() {
        assert_eq!(clamp_severity(-4), 0);
        assert_eq!(clamp_severity(7), 7);
        assert_eq!(clamp_severity(42), 10);
    }

    #[test]
    fn severity_bands() {
        assert_eq!(SeverityBand::from_severity(0), SeverityBand::NoIssue);
        assert_eq!(SeverityBand::from_severity(3), SeverityBand::Minor);
        assert_eq!(SeverityBand::from_severity(6), SeverityBand::Moderate);
        assert_eq!(SeverityBand::from_severity(8), SeverityBand::Significant);
        assert_eq!(SeverityBand::from_severity(10).label(), "Critical");
    }

    #[test]
    fn draft_derives_items_and_equipment_when_missing() {
        let req: SaveInspectionRequest = serde_json::from_value(serde_json::json!({
            "customer_name": "Dana Reyes",
            "selected_services": ["hot_water_tank", "furnace"],
        }))
        .unwrap();

        let draft = req.into_draft(date());
        assert_eq!(
            draft.service_types,
            vec![ServiceType::Furnace, ServiceType::HotWaterTank]
        );
        assert_eq!(
            draft.items,
            checklist::derive_checklist(&[ServiceType::Furnace, ServiceType::HotWaterTank])
        );
        assert_eq!(
            draft.equipment,
            vec![
                EquipmentRecord::blank(ServiceType::Furnace),
                EquipmentRecord::blank(ServiceType::HotWaterTank),
            ]
        );
        assert_eq!(draft.details.inspection_date, date());
    }

    #[test]
    fn draft_accepts_alternate_field_names() {
        let req: SaveInspectionRequest = serde_json::from_value(serde_json::json!({
            "customerName": "Sam",
            "generalNotes": "Filter was very dirty",
            "serviceTypes": ["ac"],
            "items": [
                { "label": "Check capacitor", "checked": true, "severity": 14 },
                { "itemName": "Clean condenser coil", "notes": "heavy debris" }
            ],
            "equipment": [
                { "serviceType": "ac", "brand": "Trane", "model": "XR14", "serialNumber": "S-1" }
            ],
            "selectedSuggestions": ["UV light", "UV light", " "]
        }))
        .unwrap();

        let draft = req.into_draft(date());
        assert_eq!(draft.details.customer_name, "Sam");
        assert_eq!(draft.details.general_notes, "Filter was very dirty");
        assert_eq!(draft.items[0].item_name, "Check capacitor");
        assert!(draft.items[0].completed);
        assert_eq!(draft.items[0].severity, 10);
        assert_eq!(draft.items[1].notes, "heavy debris");
        assert_eq!(draft.equipment[0].model_number, "XR14");
        assert_eq!(draft.selected_suggestions, vec!["UV light".to_string()]);
    }

    #[test]
    fn record_serializes_flat() {
        let record = InspectionRecord {
            id: Uuid::nil(),
            draft: InspectionDraft {
                details: InspectionDetails {
                    customer_name: "A".into(),
                    address: "1 Main St".into(),
                    technician_name: "T".into(),
                    inspection_date: date(),
                    general_notes: String::new(),
                },
                service_types: vec![ServiceType::Furnace],
                items: vec![],
                equipment: vec![],
                selected_suggestions: vec![],
            },
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["customer_name"], "A");
        assert_eq!(value["inspection_date"], "2024-10-01");
        assert_eq!(value["service_types"][0], "furnace");
    }
}
