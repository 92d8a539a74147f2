//! Checklist derivation from a set of selected service types.

use indexmap::IndexMap;
use std::collections::BTreeSet;

use super::catalog::{self, ChecklistItemDefinition};
use crate::domain::{ChecklistItemState, ServiceType};

/// Merge the catalog items of every selected type into one list.
///
/// Types are visited in canonical order and items in catalog order. An item
/// shared by several selected types appears once, at its first position, and
/// its applicable set is the union of the selected types that list it.
pub fn derive_definitions(selected: &[ServiceType]) -> Vec<ChecklistItemDefinition> {
    let mut merged: IndexMap<String, ChecklistItemDefinition> = IndexMap::new();

    for service_type in ServiceType::canonicalize(selected) {
        for item in catalog::items_for_service_type(service_type) {
            merged
                .entry(item.name.clone())
                .or_insert_with(|| ChecklistItemDefinition {
                    applicable_service_types: BTreeSet::new(),
                    ..item
                })
                .applicable_service_types
                .insert(service_type);
        }
    }

    merged.into_values().collect()
}

/// Fresh checklist state for the selected types. Empty selection yields an
/// empty list.
pub fn derive_checklist(selected: &[ServiceType]) -> Vec<ChecklistItemState> {
    derive_definitions(selected)
        .into_iter()
        .map(|def| ChecklistItemState::fresh(def.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn selections() -> Vec<Vec<ServiceType>> {
        use ServiceType::*;
        vec![
            vec![],
            vec![Furnace],
            vec![HotWaterTank],
            vec![Furnace, Ac],
            vec![Ac, MiniSplit],
            vec![Furnace, HotWaterTank],
            vec![Furnace, Ac, HotWaterTank],
            vec![Furnace, Ac, MiniSplit, HotWaterTank],
        ]
    }

    #[test]
    fn empty_selection_is_empty() {
        assert!(derive_checklist(&[]).is_empty());
        assert!(derive_definitions(&[]).is_empty());
    }

    #[test]
    fn derived_names_are_unique() {
        for selected in selections() {
            let items = derive_checklist(&selected);
            let unique: HashSet<_> = items.iter().map(|i| i.item_name.as_str()).collect();
            assert_eq!(unique.len(), items.len(), "duplicates for {selected:?}");
        }
    }

    #[test]
    fn covers_every_selected_type() {
        for selected in selections() {
            let derived: HashSet<_> = derive_checklist(&selected)
                .into_iter()
                .map(|i| i.item_name)
                .collect();
            for t in &selected {
                let own = catalog::items_for_service_type(*t);
                assert!(derived.len() >= own.len());
                assert!(own.iter().all(|i| derived.contains(&i.name)));
            }
        }
    }

    #[test]
    fn applicable_set_is_union_of_selected_referencing_types() {
        for selected in selections() {
            for def in derive_definitions(&selected) {
                let expected: BTreeSet<_> = selected
                    .iter()
                    .copied()
                    .filter(|t| {
                        catalog::items_for_service_type(*t)
                            .iter()
                            .any(|i| i.name == def.name)
                    })
                    .collect();
                assert_eq!(def.applicable_service_types, expected, "{}", def.name);
            }
        }
    }

    #[test]
    fn shared_item_keeps_first_position() {
        use ServiceType::*;
        let furnace_only = derive_checklist(&[Furnace]);
        let both = derive_checklist(&[Ac, Furnace]);

        // furnace items lead, in catalog order, regardless of selection order
        assert_eq!(&both[..furnace_only.len()], &furnace_only[..]);
        let capacitor = both
            .iter()
            .filter(|i| i.item_name == "Check capacitor")
            .count();
        assert_eq!(capacitor, 1);
    }

    #[test]
    fn derivation_is_deterministic_and_fresh() {
        use ServiceType::*;
        let a = derive_checklist(&[Furnace, Ac, HotWaterTank]);
        let b = derive_checklist(&[HotWaterTank, Ac, Furnace, Ac]);
        assert_eq!(a, b);
        assert!(a
            .iter()
            .all(|i| !i.completed && i.severity == 0 && i.notes.is_empty()));
    }
}
