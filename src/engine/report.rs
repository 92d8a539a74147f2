//! Summary and invoice documents handed to rendering and export.

use serde::Serialize;

use super::catalog::{self, Suggestion};
use super::pricing::InvoiceDocument;
use super::session::{completed_items, not_completed_items, CompletionStats};
use crate::domain::{ChecklistItemState, EquipmentRecord, InspectionDetails, SeverityBand};

/// Issue level shown on the customer summary
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueLevel {
    Low,
    Medium,
    High,
}

impl IssueLevel {
    pub fn from_severity(severity: u8) -> Self {
        match severity {
            7..=u8::MAX => Self::High,
            4..=6 => Self::Medium,
            _ => Self::Low,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IssueEntry {
    pub item_name: String,
    pub severity: u8,
    pub level: IssueLevel,
    pub band: SeverityBand,
    pub band_label: &'static str,
    pub completed: bool,
    pub notes: String,
}

impl From<&ChecklistItemState> for IssueEntry {
    fn from(item: &ChecklistItemState) -> Self {
        Self {
            item_name: item.item_name.clone(),
            severity: item.severity,
            level: IssueLevel::from_severity(item.severity),
            band: item.severity_band(),
            band_label: item.severity_band().label(),
            completed: item.completed,
            notes: item.notes.clone(),
        }
    }
}

/// Headline counters
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SummaryCounts {
    pub total_items: usize,
    pub completed: usize,
    pub issues: usize,
    pub recommendations: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SummaryDocument {
    #[serde(flatten)]
    pub details: InspectionDetails,
    pub counts: SummaryCounts,
    pub completion: CompletionStats,
    pub equipment: Vec<EquipmentRecord>,
    pub recommendations: Vec<Suggestion>,
    pub issues: Vec<IssueEntry>,
    pub completed: Vec<ChecklistItemState>,
    pub not_completed: Vec<ChecklistItemState>,
}

/// Summary plus invoice, fully resolved for export
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InvoiceReport {
    pub summary: SummaryDocument,
    pub invoice: InvoiceDocument,
}

/// Resolve selected suggestions and order them by descending price. Equal
/// prices keep selection order.
pub fn ranked_recommendations(selected_suggestions: &[String]) -> Vec<Suggestion> {
    let mut recommendations: Vec<Suggestion> = selected_suggestions
        .iter()
        .map(|name| catalog::suggestion_info(name))
        .collect();
    recommendations.sort_by(|a, b| b.price.cmp(&a.price));
    recommendations
}

pub fn compose_summary(
    details: &InspectionDetails,
    items: &[ChecklistItemState],
    equipment: &[EquipmentRecord],
    selected_suggestions: &[String],
) -> SummaryDocument {
    let recommendations = ranked_recommendations(selected_suggestions);
    let completion = CompletionStats::from_items(items);

    let issues: Vec<IssueEntry> = items
        .iter()
        .filter(|i| i.has_issue())
        .map(IssueEntry::from)
        .collect();
    let completed: Vec<ChecklistItemState> = completed_items(items).cloned().collect();
    let not_completed: Vec<ChecklistItemState> = not_completed_items(items).cloned().collect();

    SummaryDocument {
        details: details.clone(),
        counts: SummaryCounts {
            total_items: items.len(),
            completed: completed.len(),
            issues: issues.len(),
            recommendations: recommendations.len(),
        },
        completion,
        equipment: equipment.to_vec(),
        recommendations,
        issues,
        completed,
        not_completed,
    }
}

pub fn compose_invoice_report(summary: SummaryDocument, invoice: InvoiceDocument) -> InvoiceReport {
    InvoiceReport { summary, invoice }
}
