use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::configuration::{MAX_QUANTITY, MIN_QUANTITY};
use crate::domain::forklift::{
    Addon, AddonId, DisplayPackage, DisplayPackageOption, Environment, FleetDiscountTier,
    MastHeightOption, Model, ModelId, PaintColor, PowerType, PowerTypeOption, TireType,
    TireTypeOption, TELEMATICS_HARDWARE,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("catalog validation failed: {0}")]
    Validation(String),
}

/// Immutable reference data for the configurator.
///
/// Option tables for the enumerations are stored in variant order, one entry per variant,
/// so lookups by enum value are plain indexing. Every constructor other than
/// [`Catalog::reference`] goes through [`Catalog::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Catalog {
    models: Vec<Model>,
    capacity_options: Vec<u32>,
    mast_heights: Vec<MastHeightOption>,
    power_types: Vec<PowerTypeOption>,
    tire_types: Vec<TireTypeOption>,
    display_packages: Vec<DisplayPackageOption>,
    addons: Vec<Addon>,
    colors: Vec<PaintColor>,
    fleet_discounts: Vec<FleetDiscountTier>,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    models: Vec<Model>,
    #[serde(default)]
    capacity_options: Vec<u32>,
    mast_heights: Vec<MastHeightOption>,
    power_types: Vec<PowerTypeOption>,
    tire_types: Vec<TireTypeOption>,
    display_packages: Vec<DisplayPackageOption>,
    addons: Vec<Addon>,
    colors: Vec<PaintColor>,
    fleet_discounts: Vec<FleetDiscountTier>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::reference()
    }
}

impl Catalog {
    /// Built-in catalog: three model series, the standard option tables and five fleet tiers.
    pub fn reference() -> Self {
        Self {
            models: vec![
                Model {
                    id: ModelId("cx-3000".to_owned()),
                    name: "CX-3000".to_owned(),
                    series: "Compact Series".to_owned(),
                    capacity_min: 3_000,
                    capacity_max: 5_000,
                    environments: vec![Environment::Indoor, Environment::Outdoor],
                    base_price: Decimal::from(28_500),
                    description: "Versatile compact forklift ideal for warehouse aisles and dock \
                                  operations. Low maintenance, high maneuverability."
                        .to_owned(),
                },
                Model {
                    id: ModelId("hx-6000".to_owned()),
                    name: "HX-6000".to_owned(),
                    series: "Heavy Duty Series".to_owned(),
                    capacity_min: 5_000,
                    capacity_max: 8_000,
                    environments: vec![Environment::Indoor, Environment::Outdoor],
                    base_price: Decimal::from(42_000),
                    description: "High-performance unit for demanding logistics environments. \
                                  Built for continuous multi-shift operation."
                        .to_owned(),
                },
                Model {
                    id: ModelId("mx-10000".to_owned()),
                    name: "MX-10000".to_owned(),
                    series: "Max Capacity Series".to_owned(),
                    capacity_min: 8_000,
                    capacity_max: 12_000,
                    environments: vec![Environment::Outdoor],
                    base_price: Decimal::from(61_000),
                    description: "Maximum capacity for heavy industrial loads. Reinforced \
                                  chassis, advanced hydraulics, all-terrain capability."
                        .to_owned(),
                },
            ],
            capacity_options: vec![3_000, 4_000, 5_000, 6_000, 7_000, 8_000, 10_000, 12_000],
            mast_heights: vec![
                mast("Standard - 188\"", 188, 0),
                mast("Extended - 216\"", 216, 2_200),
                mast("Triple Stage - 240\"", 240, 4_800),
            ],
            power_types: vec![
                PowerTypeOption {
                    value: PowerType::Electric,
                    label: "Electric".to_owned(),
                    price: Decimal::from(3_500),
                },
                PowerTypeOption {
                    value: PowerType::Lpg,
                    label: "LPG".to_owned(),
                    price: Decimal::ZERO,
                },
                PowerTypeOption {
                    value: PowerType::Diesel,
                    label: "Diesel".to_owned(),
                    price: Decimal::from(1_200),
                },
            ],
            tire_types: vec![
                TireTypeOption {
                    value: TireType::Cushion,
                    label: "Cushion".to_owned(),
                    price: Decimal::ZERO,
                },
                TireTypeOption {
                    value: TireType::Pneumatic,
                    label: "Pneumatic".to_owned(),
                    price: Decimal::from(800),
                },
                TireTypeOption {
                    value: TireType::SolidPneumatic,
                    label: "Solid Pneumatic".to_owned(),
                    price: Decimal::from(1_400),
                },
            ],
            display_packages: vec![
                DisplayPackageOption {
                    value: DisplayPackage::Standard,
                    label: "Standard Display".to_owned(),
                    price: Decimal::ZERO,
                    description: "Basic operational gauges and indicators".to_owned(),
                },
                DisplayPackageOption {
                    value: DisplayPackage::Enhanced,
                    label: "Enhanced Display".to_owned(),
                    price: Decimal::from(1_200),
                    description: "LCD screen with diagnostics and hour meter".to_owned(),
                },
                DisplayPackageOption {
                    value: DisplayPackage::Advanced,
                    label: "Advanced Display".to_owned(),
                    price: Decimal::from(2_800),
                    description: "Full color touchscreen with fleet integration. Includes \
                                  Telematics hardware."
                        .to_owned(),
                },
            ],
            addons: vec![
                Addon {
                    id: AddonId(TELEMATICS_HARDWARE.to_owned()),
                    name: "Telematics Hardware".to_owned(),
                    description: "GPS tracking, impact detection, and usage monitoring hardware \
                                  module."
                        .to_owned(),
                    one_time_price: Decimal::from(1_800),
                    monthly_price: Decimal::ZERO,
                    tag: None,
                },
                Addon {
                    id: AddonId("telematics-sub".to_owned()),
                    name: "Telematics Subscription".to_owned(),
                    description: "Cloud dashboard, real-time alerts, utilization reports, and \
                                  fleet analytics."
                        .to_owned(),
                    one_time_price: Decimal::ZERO,
                    monthly_price: Decimal::from(89),
                    tag: Some("Recurring".to_owned()),
                },
                Addon {
                    id: AddonId("extended-warranty".to_owned()),
                    name: "Extended Warranty".to_owned(),
                    description: "5-year comprehensive warranty covering powertrain, hydraulics, \
                                  and electronics."
                        .to_owned(),
                    one_time_price: Decimal::from(3_200),
                    monthly_price: Decimal::ZERO,
                    tag: None,
                },
                Addon {
                    id: AddonId("maintenance-plan".to_owned()),
                    name: "Preventive Maintenance Plan".to_owned(),
                    description: "Scheduled maintenance visits, fluid analysis, and priority \
                                  parts availability."
                        .to_owned(),
                    one_time_price: Decimal::ZERO,
                    monthly_price: Decimal::from(149),
                    tag: Some("Recurring".to_owned()),
                },
            ],
            colors: vec![
                color("industrial-yellow", "Industrial Yellow"),
                color("safety-orange", "Safety Orange"),
                color("fleet-blue", "Fleet Blue"),
                color("forest-green", "Forest Green"),
                color("graphite", "Graphite"),
            ],
            fleet_discounts: vec![
                tier(1, 2, 0, "Standard pricing"),
                tier(3, 5, 3, "3% fleet discount"),
                tier(6, 10, 6, "6% fleet discount"),
                tier(11, 15, 8, "8% fleet discount"),
                tier(16, 20, 12, "12% volume discount"),
            ],
        }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        let document = toml::from_str::<CatalogDocument>(&raw)
            .map_err(|source| CatalogError::ParseFile { path: path.to_path_buf(), source })?;
        Self::from_document(document)
    }

    /// Loads `path` when given, otherwise returns the built-in reference catalog.
    pub fn load_or_reference(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::reference()),
        }
    }

    fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        let mut power_types = document.power_types;
        power_types.sort_by_key(|option| option.value.index());
        let mut tire_types = document.tire_types;
        tire_types.sort_by_key(|option| option.value.index());
        let mut display_packages = document.display_packages;
        display_packages.sort_by_key(|option| option.value.index());
        let mut fleet_discounts = document.fleet_discounts;
        fleet_discounts.sort_by_key(|tier| tier.min);

        let catalog = Self {
            models: document.models,
            capacity_options: document.capacity_options,
            mast_heights: document.mast_heights,
            power_types,
            tire_types,
            display_packages,
            addons: document.addons,
            colors: document.colors,
            fleet_discounts,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        validate_models(&self.models)?;
        validate_capacity_options(&self.capacity_options)?;
        validate_mast_heights(&self.mast_heights)?;
        validate_variant_table(
            "power_types",
            &self.power_types.iter().map(|option| option.value.index()).collect::<Vec<_>>(),
            PowerType::ALL.len(),
        )?;
        validate_variant_table(
            "tire_types",
            &self.tire_types.iter().map(|option| option.value.index()).collect::<Vec<_>>(),
            TireType::ALL.len(),
        )?;
        validate_variant_table(
            "display_packages",
            &self.display_packages.iter().map(|option| option.value.index()).collect::<Vec<_>>(),
            DisplayPackage::ALL.len(),
        )?;
        let option_prices = self
            .power_types
            .iter()
            .map(|option| option.price)
            .chain(self.tire_types.iter().map(|option| option.price))
            .chain(self.display_packages.iter().map(|option| option.price));
        for price in option_prices {
            if price < Decimal::ZERO {
                return Err(CatalogError::Validation(
                    "option prices must not be negative".to_string(),
                ));
            }
        }
        validate_addons(&self.addons)?;
        validate_colors(&self.colors)?;
        validate_fleet_discounts(&self.fleet_discounts)?;
        Ok(())
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn capacity_options(&self) -> &[u32] {
        &self.capacity_options
    }

    pub fn mast_heights(&self) -> &[MastHeightOption] {
        &self.mast_heights
    }

    pub fn power_types(&self) -> &[PowerTypeOption] {
        &self.power_types
    }

    pub fn tire_types(&self) -> &[TireTypeOption] {
        &self.tire_types
    }

    pub fn display_packages(&self) -> &[DisplayPackageOption] {
        &self.display_packages
    }

    pub fn addons(&self) -> &[Addon] {
        &self.addons
    }

    pub fn colors(&self) -> &[PaintColor] {
        &self.colors
    }

    pub fn fleet_discount_tiers(&self) -> &[FleetDiscountTier] {
        &self.fleet_discounts
    }

    pub fn find_model(&self, model_id: &ModelId) -> Option<&Model> {
        self.models.iter().find(|model| &model.id == model_id)
    }

    pub fn find_mast_height(&self, height_in: u32) -> Option<&MastHeightOption> {
        self.mast_heights.iter().find(|option| option.height_in == height_in)
    }

    pub fn find_addon(&self, addon_id: &AddonId) -> Option<&Addon> {
        self.addons.iter().find(|addon| &addon.id == addon_id)
    }

    pub fn find_color(&self, value: &str) -> Option<&PaintColor> {
        self.colors.iter().find(|color| color.value == value)
    }

    pub fn power_type(&self, power_type: PowerType) -> &PowerTypeOption {
        &self.power_types[power_type.index()]
    }

    pub fn tire_type(&self, tire_type: TireType) -> &TireTypeOption {
        &self.tire_types[tire_type.index()]
    }

    pub fn display_package(&self, display_package: DisplayPackage) -> &DisplayPackageOption {
        &self.display_packages[display_package.index()]
    }

    /// The first mast height is the standard mast every new configuration starts with.
    pub fn standard_mast_height(&self) -> &MastHeightOption {
        &self.mast_heights[0]
    }

    pub fn default_color(&self) -> &PaintColor {
        &self.colors[0]
    }

    /// Capacity options offered for `model`, in catalog order.
    pub fn available_capacities(&self, model: &Model) -> Vec<u32> {
        self.capacity_options
            .iter()
            .copied()
            .filter(|capacity| *capacity >= model.capacity_min && *capacity <= model.capacity_max)
            .collect()
    }
}

fn mast(label: &str, height_in: u32, price: i64) -> MastHeightOption {
    MastHeightOption { label: label.to_owned(), height_in, price: Decimal::from(price) }
}

fn color(value: &str, label: &str) -> PaintColor {
    PaintColor { value: value.to_owned(), label: label.to_owned() }
}

fn tier(min: u32, max: u32, discount_pct: i64, label: &str) -> FleetDiscountTier {
    FleetDiscountTier { min, max, discount: Decimal::new(discount_pct, 2), label: label.to_owned() }
}

fn validate_models(models: &[Model]) -> Result<(), CatalogError> {
    if models.is_empty() {
        return Err(CatalogError::Validation("catalog must contain at least one model".to_string()));
    }

    let mut seen = HashSet::new();
    for model in models {
        if model.id.0.trim().is_empty() {
            return Err(CatalogError::Validation("model id must not be empty".to_string()));
        }
        if !seen.insert(model.id.clone()) {
            return Err(CatalogError::Validation(format!("duplicate model id `{}`", model.id)));
        }
        if model.capacity_min > model.capacity_max {
            return Err(CatalogError::Validation(format!(
                "model `{}` has capacity_min above capacity_max",
                model.id
            )));
        }
        if model.environments.is_empty() {
            return Err(CatalogError::Validation(format!(
                "model `{}` must allow at least one environment",
                model.id
            )));
        }
        if model.base_price < Decimal::ZERO {
            return Err(CatalogError::Validation(format!(
                "model `{}` has a negative base price",
                model.id
            )));
        }
    }

    Ok(())
}

fn validate_capacity_options(options: &[u32]) -> Result<(), CatalogError> {
    if options.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(CatalogError::Validation(
            "capacity_options must be strictly ascending".to_string(),
        ));
    }
    Ok(())
}

fn validate_mast_heights(mast_heights: &[MastHeightOption]) -> Result<(), CatalogError> {
    if mast_heights.is_empty() {
        return Err(CatalogError::Validation(
            "catalog must contain at least one mast height".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for option in mast_heights {
        if !seen.insert(option.height_in) {
            return Err(CatalogError::Validation(format!(
                "duplicate mast height `{}`",
                option.height_in
            )));
        }
        if option.price < Decimal::ZERO {
            return Err(CatalogError::Validation(format!(
                "mast height `{}` has a negative price",
                option.height_in
            )));
        }
    }

    Ok(())
}

/// `indexes` must already be sorted; a valid table is exactly `0..variant_count`.
fn validate_variant_table(
    table: &str,
    indexes: &[usize],
    variant_count: usize,
) -> Result<(), CatalogError> {
    let complete = indexes.len() == variant_count
        && indexes.iter().enumerate().all(|(position, index)| position == *index);
    if complete {
        return Ok(());
    }

    Err(CatalogError::Validation(format!(
        "{table} must list every variant exactly once ({variant_count} entries expected)"
    )))
}

fn validate_addons(addons: &[Addon]) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for addon in addons {
        if !seen.insert(addon.id.clone()) {
            return Err(CatalogError::Validation(format!("duplicate add-on id `{}`", addon.id)));
        }
        if addon.one_time_price < Decimal::ZERO || addon.monthly_price < Decimal::ZERO {
            return Err(CatalogError::Validation(format!(
                "add-on `{}` has a negative price",
                addon.id
            )));
        }
    }

    if !seen.contains(&AddonId::telematics_hardware()) {
        return Err(CatalogError::Validation(format!(
            "add-on `{TELEMATICS_HARDWARE}` is required by the advanced display package"
        )));
    }

    Ok(())
}

fn validate_colors(colors: &[PaintColor]) -> Result<(), CatalogError> {
    if colors.is_empty() {
        return Err(CatalogError::Validation("catalog must contain at least one color".to_string()));
    }

    let mut seen = HashSet::new();
    for color in colors {
        if !seen.insert(color.value.as_str()) {
            return Err(CatalogError::Validation(format!("duplicate color `{}`", color.value)));
        }
    }

    Ok(())
}

/// Tiers must be sorted by `min` and cover the quantity domain without gaps or overlaps.
fn validate_fleet_discounts(tiers: &[FleetDiscountTier]) -> Result<(), CatalogError> {
    let (Some(first), Some(last)) = (tiers.first(), tiers.last()) else {
        return Err(CatalogError::Validation(
            "catalog must contain at least one fleet discount tier".to_string(),
        ));
    };

    if first.min != MIN_QUANTITY || last.max != MAX_QUANTITY {
        return Err(CatalogError::Validation(format!(
            "fleet discount tiers must span {MIN_QUANTITY}..={MAX_QUANTITY}"
        )));
    }

    for tier in tiers {
        if tier.min > tier.max {
            return Err(CatalogError::Validation(format!(
                "fleet discount tier `{}` has min above max",
                tier.label
            )));
        }
        if tier.discount < Decimal::ZERO || tier.discount > Decimal::ONE {
            return Err(CatalogError::Validation(format!(
                "fleet discount tier `{}` must have a discount between 0 and 1",
                tier.label
            )));
        }
    }

    for pair in tiers.windows(2) {
        if pair[0].max.checked_add(1) != Some(pair[1].min) {
            return Err(CatalogError::Validation(format!(
                "fleet discount tiers `{}` and `{}` leave a gap or overlap",
                pair[0].label, pair[1].label
            )));
        }
    }

    Ok(())
}
