//! In-memory state of one inspection: checklist items, equipment records and
//! selected suggestions, plus the derived views over them.

use serde::Serialize;

use super::checklist;
use crate::domain::{
    clamp_severity, ChecklistItemState, EquipmentPatch, EquipmentRecord, ServiceType,
};

/// Items marked done, in checklist order.
pub fn completed_items(items: &[ChecklistItemState]) -> impl Iterator<Item = &ChecklistItemState> {
    items.iter().filter(|i| i.completed)
}

/// Items still open, in checklist order.
pub fn not_completed_items(items: &[ChecklistItemState]) -> impl Iterator<Item = &ChecklistItemState> {
    items.iter().filter(|i| !i.completed)
}

/// Completion counters
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CompletionStats {
    pub completed_count: usize,
    pub total_count: usize,
    pub percent: u8,
}

impl CompletionStats {
    pub fn from_items(items: &[ChecklistItemState]) -> Self {
        let completed_count = completed_items(items).count();
        let total_count = items.len();
        let percent = if total_count == 0 {
            0
        } else {
            // round half up on an integer ratio
            ((completed_count * 200 + total_count) / (total_count * 2)) as u8
        };

        Self {
            completed_count,
            total_count,
            percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionSession {
    service_types: Vec<ServiceType>,
    items: Vec<ChecklistItemState>,
    equipment: Vec<EquipmentRecord>,
    selected_suggestions: Vec<String>,
}

impl InspectionSession {
    /// Start a session for the selected service types.
    pub fn new(selected: &[ServiceType]) -> Self {
        let service_types = ServiceType::canonicalize(selected);
        let items = checklist::derive_checklist(&service_types);
        let equipment = service_types
            .iter()
            .copied()
            .map(EquipmentRecord::blank)
            .collect();

        Self {
            service_types,
            items,
            equipment,
            selected_suggestions: Vec::new(),
        }
    }

    /// Rebuild a session from saved state without re-deriving anything.
    pub fn restore(
        service_types: Vec<ServiceType>,
        items: Vec<ChecklistItemState>,
        equipment: Vec<EquipmentRecord>,
        selected_suggestions: Vec<String>,
    ) -> Self {
        Self {
            service_types,
            items,
            equipment,
            selected_suggestions,
        }
    }

    /// Change the service selection. Checklist and equipment are rebuilt from
    /// scratch; suggestions are kept.
    pub fn reselect(&mut self, selected: &[ServiceType]) {
        let suggestions = std::mem::take(&mut self.selected_suggestions);
        *self = Self::new(selected);
        self.selected_suggestions = suggestions;
    }

    pub fn service_types(&self) -> &[ServiceType] {
        &self.service_types
    }

    pub fn items(&self) -> &[ChecklistItemState] {
        &self.items
    }

    pub fn equipment(&self) -> &[EquipmentRecord] {
        &self.equipment
    }

    pub fn selected_suggestions(&self) -> &[String] {
        &self.selected_suggestions
    }

    pub fn toggle_completed(&mut self, index: usize) -> Option<&ChecklistItemState> {
        let item = self.items.get_mut(index)?;
        item.completed = !item.completed;
        Some(item)
    }

    /// Out-of-range ratings are clamped into `0..=10`.
    pub fn set_severity(&mut self, index: usize, value: i64) -> Option<&ChecklistItemState> {
        let item = self.items.get_mut(index)?;
        item.severity = clamp_severity(value);
        Some(item)
    }

    pub fn set_notes(&mut self, index: usize, text: impl Into<String>) -> Option<&ChecklistItemState> {
        let item = self.items.get_mut(index)?;
        item.notes = text.into();
        Some(item)
    }

    pub fn update_equipment(
        &mut self,
        index: usize,
        patch: EquipmentPatch,
    ) -> Option<&EquipmentRecord> {
        let record = self.equipment.get_mut(index)?;
        if let Some(brand) = patch.brand {
            record.brand = brand;
        }
        if let Some(model_number) = patch.model_number {
            record.model_number = model_number;
        }
        if let Some(serial_number) = patch.serial_number {
            record.serial_number = serial_number;
        }
        Some(record)
    }

    /// Add the suggestion if absent, remove it if present. Returns whether it
    /// is selected afterwards.
    pub fn toggle_suggestion(&mut self, name: &str) -> bool {
        if let Some(pos) = self.selected_suggestions.iter().position(|s| s == name) {
            self.selected_suggestions.remove(pos);
            false
        } else {
            self.selected_suggestions.push(name.to_string());
            true
        }
    }

    pub fn completion_stats(&self) -> CompletionStats {
        CompletionStats::from_items(&self.items)
    }

    /// Items rated above zero, whether or not they are completed.
    pub fn issues(&self) -> Vec<&ChecklistItemState> {
        self.items.iter().filter(|i| i.has_issue()).collect()
    }

    pub fn completed(&self) -> Vec<&ChecklistItemState> {
        completed_items(&self.items).collect()
    }

    pub fn not_completed(&self) -> Vec<&ChecklistItemState> {
        not_completed_items(&self.items).collect()
    }

    pub fn into_parts(
        self,
    ) -> (
        Vec<ServiceType>,
        Vec<ChecklistItemState>,
        Vec<EquipmentRecord>,
        Vec<String>,
    ) {
        (
            self.service_types,
            self.items,
            self.equipment,
            self.selected_suggestions,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session() -> InspectionSession {
        InspectionSession::restore(
            vec![ServiceType::Furnace],
            vec![
                ChecklistItemState::fresh("a"),
                ChecklistItemState::fresh("b"),
                ChecklistItemState::fresh("c"),
            ],
            vec![EquipmentRecord::blank(ServiceType::Furnace)],
            vec![],
        )
    }

    #[test]
    fn new_session_has_items_and_blank_equipment() {
        let s = InspectionSession::new(&[ServiceType::HotWaterTank, ServiceType::Ac]);
        assert_eq!(s.service_types(), &[ServiceType::Ac, ServiceType::HotWaterTank]);
        assert_eq!(s.equipment().len(), 2);
        assert!(s.equipment().iter().all(EquipmentRecord::is_blank));
        assert_eq!(
            s.items(),
            &checklist::derive_checklist(&[ServiceType::Ac, ServiceType::HotWaterTank])[..]
        );
    }

    #[test]
    fn mutations_are_index_addressed() {
        let mut s = session();
        assert!(s.toggle_completed(1).unwrap().completed);
        assert_eq!(s.set_severity(2, 6).unwrap().severity, 6);
        s.set_notes(0, "cracked heat exchanger");

        let names: Vec<_> = s.items().iter().map(|i| i.item_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(s.items()[0].notes, "cracked heat exchanger");

        assert!(!s.toggle_completed(1).unwrap().completed);
    }

    #[test]
    fn out_of_range_index_is_a_no_op() {
        let mut s = session();
        let before = s.clone();
        assert!(s.toggle_completed(3).is_none());
        assert!(s.set_severity(9, 5).is_none());
        assert!(s.set_notes(99, "x").is_none());
        assert_eq!(s, before);
    }

    #[test]
    fn severity_is_clamped() {
        let mut s = session();
        assert_eq!(s.set_severity(0, 11).unwrap().severity, 10);
        assert_eq!(s.set_severity(0, -3).unwrap().severity, 0);
    }

    #[test]
    fn completion_stats_round_and_handle_empty() {
        let mut s = session();
        assert_eq!(
            s.completion_stats(),
            CompletionStats {
                completed_count: 0,
                total_count: 3,
                percent: 0
            }
        );
        s.toggle_completed(0);
        assert_eq!(s.completion_stats().percent, 33);
        s.toggle_completed(1);
        assert_eq!(s.completion_stats().percent, 67);

        let empty = InspectionSession::new(&[]);
        assert_eq!(empty.completion_stats().percent, 0);
        assert_eq!(empty.completion_stats().total_count, 0);
    }

    #[test]
    fn percent_rounds_half_up() {
        let mut items = vec![ChecklistItemState::fresh("x"); 8];
        items[0].completed = true;
        // 1/8 = 12.5%
        assert_eq!(CompletionStats::from_items(&items).percent, 13);
    }

    #[test]
    fn issues_and_not_completed_overlap_without_matching() {
        let mut s = session();
        // a: completed with severity 5 -> issue only
        s.toggle_completed(0);
        s.set_severity(0, 5);
        // b: incomplete, severity 0 -> not completed only
        // c: incomplete with severity 2 -> both
        s.set_severity(2, 2);

        let issues: Vec<_> = s.issues().iter().map(|i| i.item_name.clone()).collect();
        let open: Vec<_> = s.not_completed().iter().map(|i| i.item_name.clone()).collect();

        assert_eq!(issues, vec!["a", "c"]);
        assert_eq!(open, vec!["b", "c"]);
    }

    #[test]
    fn completed_and_not_completed_split_the_checklist() {
        let mut s = session();
        assert!(s.completed().is_empty());

        s.toggle_completed(2);
        s.toggle_completed(0);
        s.set_severity(2, 8);

        let done: Vec<_> = s.completed().iter().map(|i| i.item_name.clone()).collect();
        let open: Vec<_> = s.not_completed().iter().map(|i| i.item_name.clone()).collect();

        // checklist order, not toggle order; severity does not move an item
        assert_eq!(done, vec!["a", "c"]);
        assert_eq!(open, vec!["b"]);
        assert_eq!(done.len(), s.completion_stats().completed_count);
    }

    #[test]
    fn reselect_discards_prior_checklist() {
        let mut s = InspectionSession::new(&[ServiceType::Furnace]);
        s.toggle_completed(0);
        s.toggle_suggestion("UV light");
        s.reselect(&[ServiceType::Furnace, ServiceType::Ac]);

        assert!(s.items().iter().all(|i| !i.completed));
        assert_eq!(s.equipment().len(), 2);
        assert_eq!(s.selected_suggestions(), &["UV light".to_string()]);
    }

    #[test]
    fn equipment_patch_and_suggestion_toggle() {
        let mut s = session();
        let patch = EquipmentPatch {
            brand: Some("Carrier".into()),
            ..Default::default()
        };
        assert_eq!(s.update_equipment(0, patch).unwrap().brand, "Carrier");
        assert!(s.update_equipment(4, EquipmentPatch::default()).is_none());

        assert!(s.toggle_suggestion("Humidifier"));
        assert!(s.toggle_suggestion("UV light"));
        assert!(!s.toggle_suggestion("Humidifier"));
        assert_eq!(s.selected_suggestions(), &["UV light".to_string()]);
    }
}
