//! Tiered service pricing and invoice totals.
//!
//! All amounts are `Decimal` and accumulate exactly; rounding to cents only
//! happens through [`display_amount`]. Sums saturate at `Decimal::MAX`
//! instead of panicking; callers bound their inputs with [`MAX_LINE_PRICE`]
//! and [`MAX_TAX_RATE`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ServiceType;

/// Flat price when one service is selected
pub const SINGLE_SERVICE_PRICE: Decimal = Decimal::from_parts(12500, 0, 0, false, 2);
/// Per-service price when two are selected
pub const DOUBLE_SERVICE_PRICE: Decimal = Decimal::from_parts(10000, 0, 0, false, 2);
/// Per-service price when three are selected (the last slot absorbs the odd cent)
pub const TRIPLE_SERVICE_PRICE: Decimal = Decimal::from_parts(8333, 0, 0, false, 2);
pub const TRIPLE_SERVICE_REMAINDER_PRICE: Decimal = Decimal::from_parts(8334, 0, 0, false, 2);

/// Largest price accepted for a single invoice line (1,000,000.00)
pub const MAX_LINE_PRICE: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 2);
/// Largest tax rate accepted (100%)
pub const MAX_TAX_RATE: Decimal = Decimal::ONE;

/// Services that can appear as priced invoice lines
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BillableService {
    Furnace,
    Ac,
    HotWaterTank,
}

impl BillableService {
    pub const ALL: [BillableService; 3] = [Self::Furnace, Self::Ac, Self::HotWaterTank];

    pub fn service_type(&self) -> ServiceType {
        match self {
            Self::Furnace => ServiceType::Furnace,
            Self::Ac => ServiceType::Ac,
            Self::HotWaterTank => ServiceType::HotWaterTank,
        }
    }

    pub fn line_description(&self) -> &'static str {
        match self {
            Self::Furnace => "Furnace Tune-Up",
            Self::Ac => "AC/Heat Pump Service",
            Self::HotWaterTank => "Hot Water Tank Service",
        }
    }
}

/// Which billable services are on the invoice
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceSelection {
    #[serde(default)]
    pub furnace: bool,
    #[serde(default)]
    pub ac: bool,
    #[serde(default, alias = "hot_water")]
    pub hot_water_tank: bool,
}

impl ServiceSelection {
    pub fn is_selected(&self, service: BillableService) -> bool {
        match service {
            BillableService::Furnace => self.furnace,
            BillableService::Ac => self.ac,
            BillableService::HotWaterTank => self.hot_water_tank,
        }
    }

    fn flag_mut(&mut self, service: BillableService) -> &mut bool {
        match service {
            BillableService::Furnace => &mut self.furnace,
            BillableService::Ac => &mut self.ac,
            BillableService::HotWaterTank => &mut self.hot_water_tank,
        }
    }

    pub fn count(&self) -> usize {
        [self.furnace, self.ac, self.hot_water_tank]
            .iter()
            .filter(|f| **f)
            .count()
    }

    /// Billable services implied by the inspected service types.
    pub fn from_service_types(types: &[ServiceType]) -> Self {
        let mut selection = Self::default();
        for service in BillableService::ALL {
            if types.contains(&service.service_type()) {
                *selection.flag_mut(service) = true;
            }
        }
        selection
    }
}

/// Per-service prices
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServicePrices {
    pub furnace: Decimal,
    pub ac: Decimal,
    #[serde(alias = "hot_water_tank")]
    pub hot_water: Decimal,
}

impl Default for ServicePrices {
    fn default() -> Self {
        Self {
            furnace: SINGLE_SERVICE_PRICE,
            ac: SINGLE_SERVICE_PRICE,
            hot_water: SINGLE_SERVICE_PRICE,
        }
    }
}

impl ServicePrices {
    pub fn get(&self, service: BillableService) -> Decimal {
        match service {
            BillableService::Furnace => self.furnace,
            BillableService::Ac => self.ac,
            BillableService::HotWaterTank => self.hot_water,
        }
    }

    fn get_mut(&mut self, service: BillableService) -> &mut Decimal {
        match service {
            BillableService::Furnace => &mut self.furnace,
            BillableService::Ac => &mut self.ac,
            BillableService::HotWaterTank => &mut self.hot_water,
        }
    }
}

/// Tier prices for the selected services.
///
/// The tier depends only on how many services are selected. Slots that are
/// not selected keep their previous value.
pub fn compute_service_prices(selection: ServiceSelection, previous: ServicePrices) -> ServicePrices {
    let tier = match selection.count() {
        1 => ServicePrices::default(),
        2 => ServicePrices {
            furnace: DOUBLE_SERVICE_PRICE,
            ac: DOUBLE_SERVICE_PRICE,
            hot_water: DOUBLE_SERVICE_PRICE,
        },
        3 => ServicePrices {
            furnace: TRIPLE_SERVICE_PRICE,
            ac: TRIPLE_SERVICE_PRICE,
            hot_water: TRIPLE_SERVICE_REMAINDER_PRICE,
        },
        _ => return previous,
    };

    let mut prices = previous;
    for service in BillableService::ALL {
        if selection.is_selected(service) {
            *prices.get_mut(service) = tier.get(service);
        }
    }
    prices
}

/// Service selection plus prices, as edited on the invoice form
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceQuote {
    pub selection: ServiceSelection,
    pub prices: ServicePrices,
}

impl ServiceQuote {
    pub fn for_selection(selection: ServiceSelection) -> Self {
        Self {
            selection,
            prices: compute_service_prices(selection, ServicePrices::default()),
        }
    }

    /// Flip a service and recompute tier prices. Discards manual overrides on
    /// the selected slots.
    pub fn toggle(&mut self, service: BillableService) {
        let flag = self.selection.flag_mut(service);
        *flag = !*flag;
        self.prices = compute_service_prices(self.selection, self.prices);
    }

    /// Manual price override; negative values are floored at zero.
    pub fn set_price(&mut self, service: BillableService, price: Decimal) {
        *self.prices.get_mut(service) = price.max(Decimal::ZERO);
    }

    /// Prices of the selected services, in furnace / ac / hot water order.
    pub fn selected_prices(&self) -> Vec<(BillableService, Decimal)> {
        BillableService::ALL
            .iter()
            .copied()
            .filter(|s| self.selection.is_selected(*s))
            .map(|s| (s, self.prices.get(s)))
            .collect()
    }
}

/// A suggestion the customer approved, at the quoted price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApprovedSuggestion {
    #[serde(alias = "suggestion")]
    pub name: String,
    #[serde(default)]
    pub price: Decimal,
}

/// Ad-hoc work line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdditionalWork {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Decimal,
}

fn sum_amounts(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, amount| acc.saturating_add(amount))
}

pub fn compute_suggestion_and_work_total(
    approved: &[ApprovedSuggestion],
    additional_work: &[AdditionalWork],
) -> Decimal {
    sum_amounts(
        approved
            .iter()
            .map(|s| s.price)
            .chain(additional_work.iter().map(|w| w.price)),
    )
}

/// Invoice totals; `total = subtotal + tax`
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl InvoiceTotals {
    /// Totals rounded to cents for display.
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: round_cents(self.subtotal),
            tax: round_cents(self.tax),
            total: round_cents(self.total),
        }
    }
}

pub fn compute_invoice_totals(
    selected_service_prices: &[Decimal],
    suggestion_total: Decimal,
    work_total: Decimal,
    tax_rate: Decimal,
) -> InvoiceTotals {
    let subtotal = sum_amounts(
        selected_service_prices
            .iter()
            .copied()
            .chain([suggestion_total, work_total]),
    );
    let tax = subtotal.saturating_mul(tax_rate);

    InvoiceTotals {
        subtotal,
        tax,
        total: subtotal.saturating_add(tax),
    }
}

/// One priced invoice line
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvoiceLine {
    Service {
        service: BillableService,
        description: String,
        price: Decimal,
    },
    Suggestion {
        name: String,
        price: Decimal,
    },
    AdHoc {
        description: String,
        price: Decimal,
    },
}

impl InvoiceLine {
    pub fn price(&self) -> Decimal {
        match self {
            Self::Service { price, .. } | Self::Suggestion { price, .. } | Self::AdHoc { price, .. } => {
                *price
            }
        }
    }
}

/// Totals formatted to cents for rendering
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DisplayTotals {
    pub subtotal: String,
    pub tax: String,
    pub total: String,
}

impl From<&InvoiceTotals> for DisplayTotals {
    fn from(totals: &InvoiceTotals) -> Self {
        Self {
            subtotal: display_amount(totals.subtotal),
            tax: display_amount(totals.tax),
            total: display_amount(totals.total),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InvoiceDocument {
    pub lines: Vec<InvoiceLine>,
    /// Approved suggestions plus ad-hoc work
    pub extras_total: Decimal,
    pub tax_rate: Decimal,
    #[serde(flatten)]
    pub totals: InvoiceTotals,
    pub display: DisplayTotals,
}

/// Assemble the invoice: selected services, then approved suggestions, then
/// ad-hoc work.
pub fn build_invoice(
    quote: &ServiceQuote,
    approved: &[ApprovedSuggestion],
    additional_work: &[AdditionalWork],
    tax_rate: Decimal,
) -> InvoiceDocument {
    let services = quote.selected_prices();

    let mut lines: Vec<InvoiceLine> =
        Vec::with_capacity(services.len() + approved.len() + additional_work.len());
    lines.extend(services.iter().map(|(service, price)| InvoiceLine::Service {
        service: *service,
        description: service.line_description().to_string(),
        price: *price,
    }));
    lines.extend(approved.iter().map(|s| InvoiceLine::Suggestion {
        name: s.name.clone(),
        price: s.price,
    }));
    lines.extend(additional_work.iter().map(|w| InvoiceLine::AdHoc {
        description: w.description.clone(),
        price: w.price,
    }));

    let service_prices: Vec<Decimal> = services.iter().map(|(_, price)| *price).collect();
    let totals = compute_invoice_totals(
        &service_prices,
        sum_amounts(approved.iter().map(|s| s.price)),
        sum_amounts(additional_work.iter().map(|w| w.price)),
        tax_rate,
    );
    debug_assert_eq!(sum_amounts(lines.iter().map(InvoiceLine::price)), totals.subtotal);

    InvoiceDocument {
        lines,
        extras_total: compute_suggestion_and_work_total(approved, additional_work),
        tax_rate,
        display: DisplayTotals::from(&totals),
        totals,
    }
}

pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// `$1,234.50`-style rendering is left to the caller; this yields `1234.50`.
pub fn display_amount(amount: Decimal) -> String {
    format!("{:.2}", round_cents(amount))
}
