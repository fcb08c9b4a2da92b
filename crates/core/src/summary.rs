use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::catalog::Catalog;
use crate::cpq::pricing::{self, FleetTotals};
use crate::domain::configuration::ConfigState;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySpec {
    pub name: String,
    pub value: String,
    pub price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryAddon {
    pub id: String,
    pub name: String,
    pub one_time_price: Decimal,
    pub monthly_price: Decimal,
}

/// Snapshot of a finished configuration, ready to be serialized and handed to sales.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSummary {
    pub model_id: String,
    pub model_name: String,
    pub series: String,
    pub base_price: Decimal,
    pub specifications: Vec<SummarySpec>,
    pub color: String,
    pub addons: Vec<SummaryAddon>,
    pub totals: FleetTotals,
    pub currency: String,
    pub generated_at: DateTime<Utc>,
}

impl QuoteSummary {
    pub fn build(
        catalog: &Catalog,
        state: &ConfigState,
        currency: &str,
    ) -> Result<Self, DomainError> {
        let model = state.selected_model.as_ref().ok_or(DomainError::NoModelSelected)?;
        let power = catalog.power_type(state.power_type);
        let tire = catalog.tire_type(state.tire_type);
        let display = catalog.display_package(state.display_package);

        let specifications = vec![
            spec("Capacity", format!("{} lb", state.capacity), pricing::capacity_upcharge(state)),
            spec("Mast Height", state.mast_height.label.clone(), state.mast_height.price),
            spec("Power Type", power.label.clone(), power.price),
            spec("Tire Type", tire.label.clone(), tire.price),
            spec("Display Package", display.label.clone(), display.price),
            spec("Environment", state.environment.label().to_owned(), Decimal::ZERO),
        ];

        let addons = state
            .selected_addons
            .iter()
            .filter_map(|addon_id| catalog.find_addon(addon_id))
            .map(|addon| SummaryAddon {
                id: addon.id.0.clone(),
                name: addon.name.clone(),
                one_time_price: addon.one_time_price,
                monthly_price: addon.monthly_price,
            })
            .collect();

        let color = catalog
            .find_color(&state.color)
            .map(|color| color.label.clone())
            .unwrap_or_else(|| state.color.clone());

        Ok(Self {
            model_id: model.id.0.clone(),
            model_name: model.name.clone(),
            series: model.series.clone(),
            base_price: model.base_price,
            specifications,
            color,
            addons,
            totals: pricing::totals(catalog, state),
            currency: currency.to_owned(),
            generated_at: Utc::now(),
        })
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn spec(name: &str, value: String, price: Decimal) -> SummarySpec {
    SummarySpec { name: name.to_owned(), value, price }
}
