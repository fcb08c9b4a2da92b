use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::catalog::Catalog;
use crate::domain::configuration::ConfigState;

/// Capacity above the model minimum is charged per whole step of this size.
pub const CAPACITY_STEP_LB: u32 = 1_000;

fn capacity_step_price() -> Decimal {
    Decimal::from(1_800)
}

fn annual_telematics_savings_per_unit() -> Decimal {
    Decimal::from(4_200)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetDiscount {
    pub discount: Decimal,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTrace {
    pub currency: String,
    pub steps: Vec<PricingTraceStep>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetTotals {
    pub quantity: u32,
    pub unit_price: Decimal,
    pub monthly_per_unit: Decimal,
    pub discount: FleetDiscount,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total_one_time: Decimal,
    pub total_monthly: Decimal,
    pub estimated_annual_savings: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub totals: FleetTotals,
    pub trace: PricingTrace,
}

pub trait PricingEngine: Send + Sync {
    fn price(&self, catalog: &Catalog, state: &ConfigState, currency: &str) -> PricingResult;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicPricingEngine;

impl PricingEngine for DeterministicPricingEngine {
    fn price(&self, catalog: &Catalog, state: &ConfigState, currency: &str) -> PricingResult {
        price_with_trace(catalog, state, currency)
    }
}

/// `floor((capacity - capacity_min) / 1000) * 1800`; zero without a model or below minimum.
pub fn capacity_upcharge(state: &ConfigState) -> Decimal {
    let Some(model) = &state.selected_model else {
        return Decimal::ZERO;
    };
    let steps = state.capacity.saturating_sub(model.capacity_min) / CAPACITY_STEP_LB;
    Decimal::from(steps) * capacity_step_price()
}

/// One-time price of a single configured unit before fleet discount.
pub fn unit_price(catalog: &Catalog, state: &ConfigState) -> Decimal {
    unit_price_breakdown(catalog, state).iter().map(|step| step.amount).sum()
}

/// The components that make up [`unit_price`], one trace step each.
pub fn unit_price_breakdown(catalog: &Catalog, state: &ConfigState) -> Vec<PricingTraceStep> {
    let Some(model) = &state.selected_model else {
        return Vec::new();
    };

    let power = catalog.power_type(state.power_type);
    let tire = catalog.tire_type(state.tire_type);
    let display = catalog.display_package(state.display_package);

    let mut steps = vec![
        trace_step("base", &model.name, model.base_price),
        trace_step("capacity", &format!("{} lb", state.capacity), capacity_upcharge(state)),
        trace_step("mast_height", &state.mast_height.label, state.mast_height.price),
        trace_step("power_type", &power.label, power.price),
        trace_step("tire_type", &tire.label, tire.price),
        trace_step("display_package", &display.label, display.price),
    ];

    steps.extend(
        state
            .selected_addons
            .iter()
            .filter_map(|addon_id| catalog.find_addon(addon_id))
            .map(|addon| trace_step("addon", &addon.name, addon.one_time_price)),
    );

    steps
}

/// Monthly recurring price per unit.
pub fn monthly_recurring(catalog: &Catalog, state: &ConfigState) -> Decimal {
    state
        .selected_addons
        .iter()
        .filter_map(|addon_id| catalog.find_addon(addon_id))
        .map(|addon| addon.monthly_price)
        .sum()
}

/// Tier containing `quantity`, or the first tier when none does.
pub fn fleet_discount(catalog: &Catalog, quantity: u32) -> FleetDiscount {
    let tiers = catalog.fleet_discount_tiers();
    tiers
        .iter()
        .find(|tier| tier.contains(quantity))
        .or_else(|| tiers.first())
        .map(|tier| FleetDiscount { discount: tier.discount, label: tier.label.clone() })
        .unwrap_or_else(|| FleetDiscount {
            discount: Decimal::ZERO,
            label: "Standard pricing".to_owned(),
        })
}

/// Projected yearly savings per unit from telematics; zero unless telematics is selected.
pub fn estimated_annual_savings(state: &ConfigState) -> Decimal {
    if state.has_telematics() {
        annual_telematics_savings_per_unit()
    } else {
        Decimal::ZERO
    }
}

pub fn totals(catalog: &Catalog, state: &ConfigState) -> FleetTotals {
    let quantity = Decimal::from(state.quantity);
    let unit_price = unit_price(catalog, state);
    let monthly_per_unit = monthly_recurring(catalog, state);
    let discount = fleet_discount(catalog, state.quantity);

    let subtotal = unit_price * quantity;
    let discount_amount = subtotal * discount.discount;

    FleetTotals {
        quantity: state.quantity,
        unit_price,
        monthly_per_unit,
        subtotal,
        discount_amount,
        total_one_time: subtotal - discount_amount,
        total_monthly: monthly_per_unit * quantity,
        estimated_annual_savings: estimated_annual_savings(state) * quantity,
        discount,
    }
}

pub fn price_with_trace(catalog: &Catalog, state: &ConfigState, currency: &str) -> PricingResult {
    let totals = totals(catalog, state);
    let mut steps = unit_price_breakdown(catalog, state);
    steps.push(trace_step(
        "subtotal",
        &format!("unit_price * {}", totals.quantity),
        totals.subtotal,
    ));
    steps.push(trace_step("fleet_discount", &totals.discount.label, -totals.discount_amount));
    steps.push(trace_step("total_one_time", "subtotal - fleet_discount", totals.total_one_time));
    steps.push(trace_step(
        "total_monthly",
        &format!("monthly_per_unit * {}", totals.quantity),
        totals.total_monthly,
    ));

    PricingResult { totals, trace: PricingTrace { currency: currency.to_owned(), steps } }
}

fn trace_step(stage: &str, detail: &str, amount: Decimal) -> PricingTraceStep {
    PricingTraceStep { stage: stage.to_owned(), detail: detail.to_owned(), amount }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        capacity_upcharge, estimated_annual_savings, fleet_discount, monthly_recurring,
        price_with_trace, totals, unit_price, unit_price_breakdown,
    };
    use crate::cpq::catalog::Catalog;
    use crate::domain::configuration::{ConfigState, ConfigUpdate};
    use crate::domain::forklift::{AddonId, DisplayPackage, ModelId, PowerType, TireType};

    fn compact_at_5000(catalog: &Catalog) -> ConfigState {
        ConfigState::initial(catalog)
            .overwrite(
                catalog,
                &ConfigUpdate {
                    model: Some(ModelId("cx-3000".to_owned())),
                    capacity: Some(5_000),
                    ..Default::default()
                },
            )
            .expect("valid fixture")
    }

    #[test]
    fn unit_price_for_compact_model_at_5000_lb() {
        let catalog = Catalog::reference();
        let state = compact_at_5000(&catalog);

        assert_eq!(capacity_upcharge(&state), Decimal::from(3_600));
        assert_eq!(unit_price(&catalog, &state), Decimal::from(32_100));
    }

    #[test]
    fn no_model_prices_to_zero() {
        let catalog = Catalog::reference();
        let state = ConfigState::initial(&catalog);

        assert_eq!(unit_price(&catalog, &state), Decimal::ZERO);
        assert!(unit_price_breakdown(&catalog, &state).is_empty());
        let fleet = totals(&catalog, &state);
        assert_eq!(fleet.total_one_time, Decimal::ZERO);
        assert_eq!(fleet.total_monthly, Decimal::ZERO);
    }

    #[test]
    fn options_and_addons_add_to_unit_price() {
        let catalog = Catalog::reference();
        let state = compact_at_5000(&catalog)
            .overwrite(
                &catalog,
                &ConfigUpdate {
                    mast_height: Some(240),
                    power_type: Some(PowerType::Electric),
                    tire_type: Some(TireType::Pneumatic),
                    display_package: Some(DisplayPackage::Enhanced),
                    addons: Some(vec![
                        AddonId("extended-warranty".to_owned()),
                        AddonId("telematics-sub".to_owned()),
                    ]),
                    ..Default::default()
                },
            )
            .expect("valid update");

        // 32100 + 4800 + 3500 + 800 + 1200 + 3200
        assert_eq!(unit_price(&catalog, &state), Decimal::from(45_600));
        assert_eq!(monthly_recurring(&catalog, &state), Decimal::from(89));
        assert_eq!(
            unit_price_breakdown(&catalog, &state).iter().map(|step| step.amount).sum::<Decimal>(),
            unit_price(&catalog, &state)
        );
    }

    #[test]
    fn partial_capacity_steps_round_down() {
        let catalog = Catalog::reference();
        let mut state = compact_at_5000(&catalog);
        state.capacity = 4_999;
        assert_eq!(capacity_upcharge(&state), Decimal::from(1_800));
    }

    #[test]
    fn fleet_discount_matches_tier_and_falls_back_to_first() {
        let catalog = Catalog::reference();
        let discount = fleet_discount(&catalog, 7);
        assert_eq!(discount.discount, Decimal::new(6, 2));
        assert_eq!(discount.label, "6% fleet discount");

        let out_of_range = fleet_discount(&catalog, 99);
        assert_eq!(out_of_range.discount, Decimal::ZERO);
        assert_eq!(out_of_range.label, "Standard pricing");
    }

    #[test]
    fn fleet_totals_for_seven_units() {
        let catalog = Catalog::reference();
        let state = compact_at_5000(&catalog)
            .overwrite(&catalog, &ConfigUpdate { quantity: Some(7), ..Default::default() })
            .expect("valid update");

        let fleet = totals(&catalog, &state);
        assert_eq!(fleet.unit_price, Decimal::from(32_100));
        assert_eq!(fleet.subtotal, Decimal::from(224_700));
        assert_eq!(fleet.discount_amount, Decimal::from(13_482));
        assert_eq!(fleet.total_one_time, Decimal::from(211_218));
        assert_eq!(fleet.total_monthly, Decimal::ZERO);
    }

    #[test]
    fn telematics_savings_scale_with_quantity() {
        let catalog = Catalog::reference();
        let state = compact_at_5000(&catalog)
            .overwrite(
                &catalog,
                &ConfigUpdate {
                    addons: Some(vec![
                        AddonId("telematics-sub".to_owned()),
                        AddonId("maintenance-plan".to_owned()),
                    ]),
                    quantity: Some(3),
                    ..Default::default()
                },
            )
            .expect("valid update");

        assert_eq!(estimated_annual_savings(&state), Decimal::from(4_200));
        let fleet = totals(&catalog, &state);
        assert_eq!(fleet.estimated_annual_savings, Decimal::from(12_600));
        assert_eq!(fleet.total_monthly, Decimal::from(714));
    }

    #[test]
    fn trace_ends_with_fleet_totals() {
        let catalog = Catalog::reference();
        let state = compact_at_5000(&catalog);
        let result = price_with_trace(&catalog, &state, "USD");

        assert_eq!(result.trace.currency, "USD");
        let stages: Vec<&str> = result.trace.steps.iter().map(|step| step.stage.as_str()).collect();
        assert_eq!(stages.first(), Some(&"base"));
        assert_eq!(stages.last(), Some(&"total_monthly"));
        assert!(stages.contains(&"fleet_discount"));
    }
}
