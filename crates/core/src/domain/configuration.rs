use serde::{Deserialize, Serialize};

use crate::cpq::catalog::Catalog;
use crate::domain::forklift::{
    AddonId, DisplayPackage, Environment, MastHeightOption, Model, ModelId, PowerType, TireType,
};
use crate::errors::{CatalogReference, DomainError};
use crate::flows::states::Step;

pub const MIN_QUANTITY: u32 = 1;
pub const MAX_QUANTITY: u32 = 20;
pub const DEFAULT_CAPACITY: u32 = 5_000;

pub fn clamp_quantity(requested: i64) -> u32 {
    // Lossless: the clamped value always fits the u32 bounds.
    requested.clamp(i64::from(MIN_QUANTITY), i64::from(MAX_QUANTITY)) as u32
}

/// One in-progress forklift build.
///
/// States are values: every update produces a new `ConfigState` and leaves the previous one
/// untouched, so callers can keep the old value around for change detection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigState {
    pub step: Step,
    pub selected_model: Option<Model>,
    pub capacity: u32,
    pub mast_height: MastHeightOption,
    pub power_type: PowerType,
    pub tire_type: TireType,
    pub display_package: DisplayPackage,
    pub environment: Environment,
    pub color: String,
    pub selected_addons: Vec<AddonId>,
    pub quantity: u32,
}

impl ConfigState {
    pub fn initial(catalog: &Catalog) -> Self {
        Self {
            step: Step::BaseModel,
            selected_model: None,
            capacity: DEFAULT_CAPACITY,
            mast_height: catalog.standard_mast_height().clone(),
            power_type: PowerType::Lpg,
            tire_type: TireType::Cushion,
            display_package: DisplayPackage::Standard,
            environment: Environment::Indoor,
            color: catalog.default_color().value.clone(),
            selected_addons: Vec::new(),
            quantity: MIN_QUANTITY,
        }
    }

    pub fn has_addon(&self, addon_id: &AddonId) -> bool {
        self.selected_addons.contains(addon_id)
    }

    pub fn has_telematics(&self) -> bool {
        self.selected_addons.iter().any(AddonId::is_telematics)
    }

    /// Returns a copy with the fields of `update` written over this state.
    ///
    /// Catalog references are resolved here; an unknown reference fails the whole update.
    /// Quantity and capacity are clamped into range. Cross-field rules are not applied;
    /// that is the resolver's job.
    pub fn overwrite(&self, catalog: &Catalog, update: &ConfigUpdate) -> Result<Self, DomainError> {
        let mut next = self.clone();

        if let Some(step) = update.step {
            next.step = step;
        }

        if let Some(model_id) = &update.model {
            let model = catalog
                .find_model(model_id)
                .ok_or_else(|| unknown(CatalogReference::Model, &model_id.0))?;
            next.capacity = model.capacity_min;
            next.selected_model = Some(model.clone());
        }

        if let Some(capacity) = update.capacity {
            next.capacity = capacity;
        }
        if let Some(model) = &next.selected_model {
            next.capacity = model.clamp_capacity(next.capacity);
        }

        if let Some(height_in) = update.mast_height {
            next.mast_height = catalog
                .find_mast_height(height_in)
                .ok_or_else(|| unknown(CatalogReference::MastHeight, &height_in.to_string()))?
                .clone();
        }

        if let Some(power_type) = update.power_type {
            next.power_type = power_type;
        }
        if let Some(tire_type) = update.tire_type {
            next.tire_type = tire_type;
        }
        if let Some(display_package) = update.display_package {
            next.display_package = display_package;
        }
        if let Some(environment) = update.environment {
            next.environment = environment;
        }

        if let Some(color) = &update.color {
            next.color = catalog
                .find_color(color)
                .ok_or_else(|| unknown(CatalogReference::Color, color))?
                .value
                .clone();
        }

        if let Some(addons) = &update.addons {
            let mut selected: Vec<AddonId> = Vec::with_capacity(addons.len());
            for addon_id in addons {
                if catalog.find_addon(addon_id).is_none() {
                    return Err(unknown(CatalogReference::Addon, &addon_id.0));
                }
                if !selected.contains(addon_id) {
                    selected.push(addon_id.clone());
                }
            }
            next.selected_addons = selected;
        }

        if let Some(quantity) = update.quantity {
            next.quantity = clamp_quantity(quantity);
        }

        Ok(next)
    }

    /// Fields whose values differ between `self` and `other`, in declaration order.
    pub fn changed_fields(&self, other: &Self) -> Vec<ConfigField> {
        let checks = [
            (ConfigField::Step, self.step != other.step),
            (
                ConfigField::Model,
                self.selected_model.as_ref().map(|model| &model.id)
                    != other.selected_model.as_ref().map(|model| &model.id),
            ),
            (ConfigField::Capacity, self.capacity != other.capacity),
            (ConfigField::MastHeight, self.mast_height != other.mast_height),
            (ConfigField::PowerType, self.power_type != other.power_type),
            (ConfigField::TireType, self.tire_type != other.tire_type),
            (ConfigField::DisplayPackage, self.display_package != other.display_package),
            (ConfigField::Environment, self.environment != other.environment),
            (ConfigField::Color, self.color != other.color),
            (ConfigField::Addons, self.selected_addons != other.selected_addons),
            (ConfigField::Quantity, self.quantity != other.quantity),
        ];

        checks.into_iter().filter_map(|(field, changed)| changed.then_some(field)).collect()
    }
}

fn unknown(kind: CatalogReference, value: &str) -> DomainError {
    DomainError::UnknownCatalogReference { kind, value: value.to_owned() }
}

/// Sparse set of field assignments. `None` leaves the field as it is.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub step: Option<Step>,
    pub model: Option<ModelId>,
    pub capacity: Option<u32>,
    pub mast_height: Option<u32>,
    pub power_type: Option<PowerType>,
    pub tire_type: Option<TireType>,
    pub display_package: Option<DisplayPackage>,
    pub environment: Option<Environment>,
    pub color: Option<String>,
    pub addons: Option<Vec<AddonId>>,
    pub quantity: Option<i64>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigField {
    Step,
    Model,
    Capacity,
    MastHeight,
    PowerType,
    TireType,
    DisplayPackage,
    Environment,
    Color,
    Addons,
    Quantity,
}

impl ConfigField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Step => "step",
            Self::Model => "model",
            Self::Capacity => "capacity",
            Self::MastHeight => "mast_height",
            Self::PowerType => "power_type",
            Self::TireType => "tire_type",
            Self::DisplayPackage => "display_package",
            Self::Environment => "environment",
            Self::Color => "color",
            Self::Addons => "addons",
            Self::Quantity => "quantity",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{clamp_quantity, ConfigField, ConfigState, ConfigUpdate};
    use crate::cpq::catalog::Catalog;
    use crate::domain::forklift::{AddonId, ModelId, PowerType};
    use crate::errors::{CatalogReference, DomainError};
    use crate::flows::states::Step;

    #[test]
    fn initial_state_uses_catalog_defaults() {
        let catalog = Catalog::reference();
        let state = ConfigState::initial(&catalog);

        assert_eq!(state.step, Step::BaseModel);
        assert!(state.selected_model.is_none());
        assert_eq!(state.capacity, 5_000);
        assert_eq!(state.mast_height.height_in, 188);
        assert_eq!(state.power_type, PowerType::Lpg);
        assert_eq!(state.color, "industrial-yellow");
        assert!(state.selected_addons.is_empty());
        assert_eq!(state.quantity, 1);
    }

    #[test]
    fn quantity_is_clamped_not_rejected() {
        assert_eq!(clamp_quantity(25), 20);
        assert_eq!(clamp_quantity(0), 1);
        assert_eq!(clamp_quantity(-4), 1);
        assert_eq!(clamp_quantity(7), 7);
    }

    #[test]
    fn selecting_a_model_resets_capacity_to_its_minimum() {
        let catalog = Catalog::reference();
        let state = ConfigState::initial(&catalog)
            .overwrite(
                &catalog,
                &ConfigUpdate { model: Some(ModelId("hx-6000".to_owned())), ..Default::default() },
            )
            .expect("known model");

        assert_eq!(state.capacity, 5_000);
        assert_eq!(state.selected_model.map(|model| model.name), Some("HX-6000".to_owned()));
    }

    #[test]
    fn capacity_is_clamped_into_model_range() {
        let catalog = Catalog::reference();
        let state = ConfigState::initial(&catalog)
            .overwrite(
                &catalog,
                &ConfigUpdate {
                    model: Some(ModelId("cx-3000".to_owned())),
                    capacity: Some(9_000),
                    ..Default::default()
                },
            )
            .expect("known model");

        assert_eq!(state.capacity, 5_000);
    }

    #[test]
    fn addon_list_is_deduplicated_in_order() {
        let catalog = Catalog::reference();
        let state = ConfigState::initial(&catalog)
            .overwrite(
                &catalog,
                &ConfigUpdate {
                    addons: Some(vec![
                        AddonId("maintenance-plan".to_owned()),
                        AddonId("telematics-hw".to_owned()),
                        AddonId("maintenance-plan".to_owned()),
                    ]),
                    ..Default::default()
                },
            )
            .expect("known add-ons");

        assert_eq!(
            state.selected_addons,
            vec![AddonId("maintenance-plan".to_owned()), AddonId("telematics-hw".to_owned())]
        );
    }

    #[test]
    fn unknown_references_fail_without_touching_state() {
        let catalog = Catalog::reference();
        let state = ConfigState::initial(&catalog);

        let error = state
            .overwrite(
                &catalog,
                &ConfigUpdate {
                    quantity: Some(4),
                    addons: Some(vec![AddonId("jetpack".to_owned())]),
                    ..Default::default()
                },
            )
            .expect_err("unknown add-on");

        assert_eq!(
            error,
            DomainError::UnknownCatalogReference {
                kind: CatalogReference::Addon,
                value: "jetpack".to_owned()
            }
        );
        assert_eq!(state.quantity, 1);

        let error = state
            .overwrite(&catalog, &ConfigUpdate { mast_height: Some(300), ..Default::default() })
            .expect_err("unknown mast height");
        assert!(matches!(
            error,
            DomainError::UnknownCatalogReference { kind: CatalogReference::MastHeight, .. }
        ));
    }

    #[test]
    fn changed_fields_reports_only_differences() {
        let catalog = Catalog::reference();
        let before = ConfigState::initial(&catalog);
        let after = before
            .overwrite(
                &catalog,
                &ConfigUpdate {
                    quantity: Some(3),
                    color: Some("graphite".to_owned()),
                    ..Default::default()
                },
            )
            .expect("valid update");

        assert_eq!(before.changed_fields(&after), vec![ConfigField::Color, ConfigField::Quantity]);
        assert!(after.changed_fields(&after).is_empty());
        assert!(ConfigUpdate::default().is_empty());
    }
}
