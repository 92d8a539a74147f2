//! Service type domain types
//!
//! The categories of equipment a technician can service on a visit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Service type enum
///
/// Declaration order is the canonical order used when deriving checklists
/// and default equipment records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Furnace,
    #[serde(alias = "air_conditioning", alias = "heat_pump")]
    Ac,
    #[serde(alias = "minisplit")]
    MiniSplit,
    #[serde(alias = "water_heater")]
    HotWaterTank,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        ServiceType::Furnace,
        ServiceType::Ac,
        ServiceType::MiniSplit,
        ServiceType::HotWaterTank,
    ];

    /// Storage / wire key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Furnace => "furnace",
            Self::Ac => "ac",
            Self::MiniSplit => "mini_split",
            Self::HotWaterTank => "hot_water_tank",
        }
    }

    /// Customer-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Furnace => "Furnace",
            Self::Ac => "AC/Heat Pump",
            Self::MiniSplit => "Mini Split",
            Self::HotWaterTank => "Hot Water Tank",
        }
    }

    /// Returns the selected types in canonical order with duplicates removed.
    pub fn canonicalize(selected: &[ServiceType]) -> Vec<ServiceType> {
        Self::ALL
            .iter()
            .copied()
            .filter(|t| selected.contains(t))
            .collect()
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown service type: {0}")]
pub struct UnknownServiceType(pub String);

impl FromStr for ServiceType {
    type Err = UnknownServiceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "furnace" => Ok(Self::Furnace),
            "ac" | "air_conditioning" | "heat_pump" => Ok(Self::Ac),
            "mini_split" | "minisplit" => Ok(Self::MiniSplit),
            "hot_water_tank" | "water_heater" => Ok(Self::HotWaterTank),
            other => Err(UnknownServiceType(other.to_string())),
        }
    }
}

/// Response DTO for a selectable service type
#[derive(Debug, Clone, Serialize)]
pub struct ServiceTypeResponse {
    pub id: ServiceType,
    pub label: &'static str,
}

impl From<ServiceType> for ServiceTypeResponse {
    fn from(t: ServiceType) -> Self {
        Self {
            id: t,
            label: t.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn canonicalize_orders_and_dedupes() {
        let selected = [
            ServiceType::HotWaterTank,
            ServiceType::Furnace,
            ServiceType::HotWaterTank,
        ];
        assert_eq!(
            ServiceType::canonicalize(&selected),
            vec![ServiceType::Furnace, ServiceType::HotWaterTank]
        );
    }

    #[test]
    fn parses_storage_keys_and_aliases() {
        for t in ServiceType::ALL {
            assert_eq!(t.as_str().parse::<ServiceType>(), Ok(t));
        }
        assert_eq!("Heat_Pump".parse::<ServiceType>(), Ok(ServiceType::Ac));
        assert!("boiler".parse::<ServiceType>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_keys() {
        let json = serde_json::to_string(&ServiceType::HotWaterTank).unwrap();
        assert_eq!(json, "\"hot_water_tank\"");
        let back: ServiceType = serde_json::from_str("\"mini_split\"").unwrap();
        assert_eq!(back, ServiceType::MiniSplit);
    }
}
