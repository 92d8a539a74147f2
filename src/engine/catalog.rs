//! Static catalog: checklist items per service type, upsell suggestions and
//! maintenance plan tiers.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::domain::ServiceType;

/// Pitch used for suggestions the catalog does not know
pub const DEFAULT_PITCH: &str =
    "Recommended upgrade for improved system performance and efficiency.";

/// Checklist item definition
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChecklistItemDefinition {
    pub name: String,
    pub category: String,
    pub applicable_service_types: BTreeSet<ServiceType>,
}

/// Upsell suggestion
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Suggestion {
    pub name: String,
    pub pitch: String,
    pub price: Decimal,
}

/// Membership plan tier
#[derive(Debug, Clone, Serialize)]
pub struct MaintenancePlan {
    pub key: &'static str,
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<&'static str>,
    pub tagline: &'static str,
    pub best_for: &'static [&'static str],
    pub includes: &'static [&'static str],
    pub member_perks: &'static [&'static str],
    pub fine_print: &'static [&'static str],
}

type Section = (&'static str, &'static [&'static str]);

const FURNACE: &[Section] = &[
    (
        "Thermostat & Controls",
        &["Verify thermostat operation", "Check call for heat signal"],
    ),
    (
        "Safety Components",
        &[
            "Inspect flame sensor (clean if needed)",
            "Test ignitor",
            "Check high-limit switch",
            "Inspect pressure switch & tubing",
            "Check rollout switches",
        ],
    ),
    (
        "Burner & Combustion",
        &[
            "Inspect burners for rust/debris",
            "Clean burner assembly (if needed)",
            "Inspect flue/vent for blockage",
            "Test for proper combustion",
            "Check gas pressure (in/out)",
        ],
    ),
    (
        "Electrical & Motors",
        &[
            "Measure amp draw on blower motor",
            "Check capacitor",
            "Inspect wiring & tighten connections",
            "Inspect control board diagnostics",
        ],
    ),
    (
        "Airflow",
        &[
            "Inspect air filter (replace if needed)",
            "Check blower wheel cleanliness",
            "Inspect return & supply ducts",
        ],
    ),
    (
        "General",
        &[
            "Lubricate moving parts (if applicable)",
            "Check for carbon monoxide leaks",
            "Test furnace operation through cycle",
            "Check for gas leaks",
        ],
    ),
];

const AC: &[Section] = &[
    ("Thermostat & Controls", &["Verify thermostat operation"]),
    (
        "Electrical & Motors",
        &[
            "Check capacitor",
            "Inspect contactor",
            "Inspect wiring & tighten connections",
            "Measure compressor amp draw",
            "Measure condenser fan motor amp draw",
        ],
    ),
    (
        "Refrigerant",
        &[
            "Check refrigerant pressures",
            "Measure superheat/subcooling",
            "Inspect refrigerant lines & insulation",
        ],
    ),
    (
        "Coils & Drainage",
        &[
            "Clean condenser coil",
            "Inspect evaporator coil",
            "Clear condensate drain line",
            "Check condensate pump (if applicable)",
        ],
    ),
    (
        "Airflow",
        &[
            "Inspect air filter (replace if needed)",
            "Check blower wheel cleanliness",
            "Measure temperature split",
        ],
    ),
    (
        "General",
        &[
            "Check outdoor unit level & clearance",
            "Test reversing valve (heat pump)",
            "Test system operation through cycle",
        ],
    ),
];

const MINI_SPLIT: &[Section] = &[
    (
        "Thermostat & Controls",
        &["Verify remote/wall controller operation"],
    ),
    (
        "Indoor Units",
        &[
            "Clean indoor unit filters",
            "Clean indoor coil & blower wheel",
            "Clear condensate drain line",
        ],
    ),
    (
        "Outdoor Unit",
        &[
            "Clean condenser coil",
            "Check outdoor unit level & clearance",
            "Inspect wiring & tighten connections",
        ],
    ),
    (
        "Refrigerant",
        &[
            "Check refrigerant pressures",
            "Inspect line set & insulation",
        ],
    ),
    (
        "General",
        &[
            "Measure temperature split",
            "Test system operation through cycle",
        ],
    ),
];

const HOT_WATER_TANK: &[Section] = &[
    (
        "Safety Components",
        &[
            "Test temperature & pressure relief valve",
            "Check for gas leaks",
            "Check for carbon monoxide leaks",
        ],
    ),
    (
        "Burner & Combustion",
        &[
            "Inspect flue/vent for blockage",
            "Inspect burner/heating elements",
            "Check thermostat/gas valve setting",
        ],
    ),
    (
        "Tank",
        &[
            "Flush tank sediment",
            "Inspect anode rod",
            "Inspect tank for corrosion or leaks",
            "Check expansion tank",
        ],
    ),
    (
        "General",
        &["Inspect water connections & shutoff valve"],
    ),
];

// (name, price in cents, pitch)
const SUGGESTIONS: &[(&str, i64, &str)] = &[
    (
        "Power surge protector",
        27500,
        "Protect your expensive HVAC equipment from electrical surges and power spikes that can cause costly damage. A surge protector can save you thousands in repair costs and extend the life of your system.",
    ),
    (
        "Smart Thermostat",
        35000,
        "Save up to 23% on your energy bills while enjoying perfect comfort. Control your home temperature from anywhere, create automatic schedules, and get energy usage insights. Most customers see payback within 2 years.",
    ),
    (
        "Leak detector sensor",
        9500,
        "Detect water leaks before they cause major damage to your home. Get instant alerts on your phone and prevent thousands in water damage repairs. Peace of mind for your most valuable investment.",
    ),
    (
        "Smart air register vents",
        45000,
        "Achieve room-by-room temperature control and stop wasting energy heating or cooling unused spaces. Balance your home comfort and reduce energy bills by up to 30% in multi-story homes.",
    ),
    (
        "Air purifier",
        120000,
        "Breathe cleaner, healthier air by removing 99.97% of airborne particles including allergens, dust, pet dander, and viruses. Essential for family members with allergies, asthma, or respiratory concerns.",
    ),
    (
        "UV light",
        65000,
        "Kill up to 99% of mold, bacteria, and viruses in your HVAC system. Improve indoor air quality, reduce illness, and eliminate musty odors. A chemical-free solution for healthier air your family breathes.",
    ),
    (
        "Humidifier",
        75000,
        "Combat dry winter air that damages wood furniture, causes static electricity, and irritates skin and sinuses. Maintain optimal 30-50% humidity for comfort and protect your home. Also helps your heating system work more efficiently.",
    ),
    (
        "De humidifier",
        180000,
        "Prevent mold growth, musty odors, and structural damage from excess moisture. Essential for basement and humid climate comfort. Protects your home investment and improves air quality.",
    ),
    (
        "Compressor blanket",
        22500,
        "Reduce outdoor unit noise by up to 50% and protect your compressor from harsh weather. Extend equipment life while keeping your outdoor space peaceful. Great for units near bedrooms or patios.",
    ),
    (
        "Hard start kit",
        22500,
        "Reduce startup stress on your AC compressor, lower energy consumption, and prevent premature failure. Especially beneficial for older units or homes with voltage fluctuations. Can add years to your system life.",
    ),
    (
        "Powered anode rod",
        32500,
        "Extend your water heater life by 2-3x by preventing tank corrosion. Unlike traditional rods, powered rods never need replacement and work better in all water conditions. A one-time investment that protects your water heater for decades.",
    ),
];

const STANDARD_PERKS: &[&str] = &[
    "Priority scheduling goal: within 48 hours when reasonably possible",
    "10% off repairs and add-ons to existing systems",
    "$500 off installation of a new HVAC system",
];

const CREDIT_FINE_PRINT: &[&str] = &[
    "Credits do not roll over and cannot be combined into one larger credit.",
    "Eligible services are defined by the Covered Services List (ask your technician).",
];

const PLANS: &[MaintenancePlan] = &[
    MaintenancePlan {
        key: "bronze",
        name: "Bronze",
        badge: None,
        tagline: "Essential coverage for one HVAC system with an annual tune-up.",
        best_for: &[
            "Homeowners who want basic annual maintenance",
            "Single-system homes wanting member discounts",
        ],
        includes: &[
            "Coverage for 1 HVAC system at the service address",
            "1 HVAC tune-up per membership year",
        ],
        member_perks: &[
            "Priority scheduling goal: within 48 hours when reasonably possible",
            "10% off repairs and add-ons to existing systems",
            "$500 off installation of a new HVAC system",
            "Reduced service call/dispatch fee: $75 for non-tune-up issues",
        ],
        fine_print: &[
            "Repairs, parts, and upgrades found during tune-ups are quoted separately unless specifically covered.",
            "Bronze does not include the $125 Service Visit Credit benefit.",
        ],
    },
    MaintenancePlan {
        key: "silver",
        name: "Silver",
        badge: None,
        tagline: "One annual tune-up plus service visit credits for eligible covered items.",
        best_for: &[
            "Homeowners who want an annual tune-up and small repair coverage",
            "Customers who value service visit credits for eligible items",
        ],
        includes: &[
            "Coverage for 1 HVAC system at the service address",
            "1 HVAC tune-up per membership year",
            "2 complimentary service visit credits (up to $125 per visit) for eligible covered services",
        ],
        member_perks: STANDARD_PERKS,
        fine_print: CREDIT_FINE_PRINT,
    },
    MaintenancePlan {
        key: "gold",
        name: "Gold",
        badge: Some("Most Popular"),
        tagline: "Flexible tune-up coverage for one system or two systems, plus service visit credits.",
        best_for: &[
            "Homes with 2 HVAC systems",
            "Customers wanting spring/fall tune-ups on one system",
        ],
        includes: &[
            "Option A: Cover 2 HVAC systems + 1 annual tune-up per system (2 total)",
            "Option B: Cover 1 HVAC system + 2 tune-ups per year",
            "2 complimentary service visit credits (up to $125 per visit) for eligible covered services",
        ],
        member_perks: STANDARD_PERKS,
        fine_print: CREDIT_FINE_PRINT,
    },
    MaintenancePlan {
        key: "platinum",
        name: "Platinum",
        badge: None,
        tagline: "Top-tier coverage: Gold tune-up options plus annual water heater maintenance.",
        best_for: &[
            "Homeowners wanting HVAC + water heater annual maintenance",
            "Customers who want the broadest membership coverage",
        ],
        includes: &[
            "Option A: Cover 2 HVAC systems + 1 annual tune-up per system (2 total)",
            "Option B: Cover 1 HVAC system + 2 tune-ups per year",
            "1 annual water heater maintenance visit (for 1 water heater)",
            "2 complimentary service visit credits (up to $125 per visit) for eligible covered services",
        ],
        member_perks: STANDARD_PERKS,
        fine_print: CREDIT_FINE_PRINT,
    },
    MaintenancePlan {
        key: "minisplit",
        name: "Ductless Mini-Split",
        badge: None,
        tagline: "Annual maintenance for ductless systems (covers your outdoor unit + the covered head units).",
        best_for: &[
            "Homes with ductless mini-split systems",
            "Customers who want annual performance + cleaning checks",
        ],
        includes: &[
            "Coverage for the outdoor unit serving the covered heads",
            "Coverage for the included indoor head units",
            "1 annual mini-split maintenance visit per membership year",
        ],
        member_perks: &[
            "Priority scheduling goal: within 48 hours when reasonably possible",
            "10% off repairs and add-ons to existing systems",
            "$500 off installation of a new HVAC system",
            "Reduced service call/dispatch fee: $75 for visits outside the included maintenance",
        ],
        fine_print: &[
            "Deep cleaning (e.g., full blower wheel removal), repairs, and parts are quoted separately unless specifically included.",
            "Refrigerant-related work is not included unless explicitly stated.",
        ],
    },
];

fn sections(service_type: ServiceType) -> &'static [Section] {
    match service_type {
        ServiceType::Furnace => FURNACE,
        ServiceType::Ac => AC,
        ServiceType::MiniSplit => MINI_SPLIT,
        ServiceType::HotWaterTank => HOT_WATER_TANK,
    }
}

/// Every service type whose table lists `name`.
fn types_listing(name: &str) -> BTreeSet<ServiceType> {
    ServiceType::ALL
        .iter()
        .copied()
        .filter(|t| {
            sections(*t)
                .iter()
                .any(|(_, items)| items.contains(&name))
        })
        .collect()
}

/// Items for one service type, in catalog order. Applicable sets are merged
/// across every type that lists the same name.
pub fn items_for_service_type(service_type: ServiceType) -> Vec<ChecklistItemDefinition> {
    sections(service_type)
        .iter()
        .flat_map(|(category, items)| {
            items.iter().map(move |name| ChecklistItemDefinition {
                name: (*name).to_string(),
                category: (*category).to_string(),
                applicable_service_types: types_listing(name),
            })
        })
        .collect()
}

/// Look up a definition by name across all service types.
pub fn item_definition(name: &str) -> Option<ChecklistItemDefinition> {
    ServiceType::ALL.iter().find_map(|t| {
        sections(*t).iter().find_map(|(category, items)| {
            items
                .iter()
                .find(|item| **item == name)
                .map(|item| ChecklistItemDefinition {
                    name: (*item).to_string(),
                    category: (*category).to_string(),
                    applicable_service_types: types_listing(item),
                })
        })
    })
}

fn suggestion_from_entry(entry: &(&str, i64, &str)) -> Suggestion {
    let (name, cents, pitch) = *entry;
    Suggestion {
        name: name.to_string(),
        pitch: pitch.to_string(),
        price: Decimal::new(cents, 2),
    }
}

/// All upsell suggestions, in catalog order.
pub fn all_suggestions() -> Vec<Suggestion> {
    SUGGESTIONS.iter().map(suggestion_from_entry).collect()
}

/// Pitch and price for a suggestion. Unknown names get the default pitch and
/// a zero price.
pub fn suggestion_info(name: &str) -> Suggestion {
    SUGGESTIONS
        .iter()
        .find(|(known, _, _)| *known == name)
        .map(suggestion_from_entry)
        .unwrap_or_else(|| {
            tracing::debug!(suggestion = name, "Unknown suggestion, using placeholder");
            Suggestion {
                name: name.to_string(),
                pitch: DEFAULT_PITCH.to_string(),
                price: Decimal::ZERO,
            }
        })
}

pub fn maintenance_plans() -> &'static [MaintenancePlan] {
    PLANS
}
