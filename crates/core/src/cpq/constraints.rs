use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::configuration::{ConfigField, ConfigState, MAX_QUANTITY, MIN_QUANTITY};
use crate::domain::forklift::{AddonId, DisplayPackage, Environment, PowerType};

/// Heaviest capacity an electric drivetrain is offered for.
pub const ELECTRIC_MAX_CAPACITY: u32 = 6_000;

pub const POWER_TYPE_UNAVAILABLE: &str = "POWER_TYPE_UNAVAILABLE";
pub const ELECTRIC_CAPACITY_EXCEEDED: &str = "ELECTRIC_CAPACITY_EXCEEDED";
pub const DIESEL_NOT_ALLOWED_INDOORS: &str = "DIESEL_NOT_ALLOWED_INDOORS";
pub const TELEMATICS_REQUIRED: &str = "TELEMATICS_REQUIRED";
pub const TELEMATICS_LOCKED: &str = "TELEMATICS_LOCKED";

/// A change the resolver made on top of what the caller asked for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub code: String,
    pub field: ConfigField,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub code: String,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub state: ConfigState,
    pub adjustments: Vec<Adjustment>,
    pub passes: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ResolutionMode {
    /// Each rule runs at most once per update.
    #[default]
    SinglePass,
    /// Rules re-run until a pass makes no change, up to `max_passes` passes.
    FixedPoint { max_passes: u32 },
}

pub trait ConstraintResolver: Send + Sync {
    fn resolve(&self, previous: &ConfigState, proposed: ConfigState) -> Resolution;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicConstraintResolver {
    mode: ResolutionMode,
}

impl DeterministicConstraintResolver {
    pub fn new(mode: ResolutionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }
}

impl ConstraintResolver for DeterministicConstraintResolver {
    fn resolve(&self, previous: &ConfigState, proposed: ConfigState) -> Resolution {
        let resolution = match self.mode {
            ResolutionMode::SinglePass => resolve_constraints(previous, proposed),
            ResolutionMode::FixedPoint { max_passes } => {
                resolve_constraints_to_fixed_point(previous, proposed, max_passes)
            }
        };

        for adjustment in &resolution.adjustments {
            debug!(
                event_name = "configurator.resolver.adjustment",
                code = %adjustment.code,
                field = adjustment.field.as_str(),
                passes = resolution.passes,
                "{}",
                adjustment.message
            );
        }

        resolution
    }
}

/// Applies every rule once, in fixed order, comparing `proposed` against `previous` to
/// decide which fields changed.
///
/// Rules do not re-check each other: a change made by a later rule is not fed back into
/// an earlier one.
pub fn resolve_constraints(previous: &ConfigState, proposed: ConfigState) -> Resolution {
    let mut state = proposed;
    let adjustments = run_pass(previous, &mut state);
    Resolution { state, adjustments, passes: 1 }
}

pub fn resolve_constraints_to_fixed_point(
    previous: &ConfigState,
    proposed: ConfigState,
    max_passes: u32,
) -> Resolution {
    let mut state = proposed;
    let mut adjustments = Vec::new();
    let mut passes = 0;

    while passes < max_passes.max(1) {
        passes += 1;
        let pass_adjustments = run_pass(previous, &mut state);
        if pass_adjustments.is_empty() {
            break;
        }
        adjustments.extend(pass_adjustments);
    }

    Resolution { state, adjustments, passes }
}

fn run_pass(previous: &ConfigState, state: &mut ConfigState) -> Vec<Adjustment> {
    let rules: [fn(&ConfigState, &mut ConfigState) -> Option<Adjustment>; 5] = [
        reject_unavailable_power_type,
        force_lpg_above_electric_capacity,
        force_lpg_indoors,
        require_telematics_for_advanced_display,
        keep_telematics_while_advanced,
    ];

    rules.iter().filter_map(|rule| rule(previous, state)).collect()
}

/// Mirrors the disabled power type buttons: a newly requested power type that the current
/// capacity or environment rules out is dropped in favour of the previous one.
fn reject_unavailable_power_type(
    previous: &ConfigState,
    state: &mut ConfigState,
) -> Option<Adjustment> {
    let requested = state.power_type;
    if requested == previous.power_type || is_power_type_allowed(state, requested) {
        return None;
    }

    state.power_type = previous.power_type;
    Some(Adjustment {
        code: POWER_TYPE_UNAVAILABLE.to_owned(),
        field: ConfigField::PowerType,
        message: format!(
            "{} power is not available for this configuration; kept {}",
            requested.as_str(),
            previous.power_type.as_str()
        ),
    })
}

fn force_lpg_above_electric_capacity(
    previous: &ConfigState,
    state: &mut ConfigState,
) -> Option<Adjustment> {
    let capacity_changed = state.capacity != previous.capacity;
    if !capacity_changed
        || state.capacity <= ELECTRIC_MAX_CAPACITY
        || state.power_type != PowerType::Electric
    {
        return None;
    }

    state.power_type = PowerType::Lpg;
    Some(Adjustment {
        code: ELECTRIC_CAPACITY_EXCEEDED.to_owned(),
        field: ConfigField::PowerType,
        message: format!(
            "electric power is limited to {ELECTRIC_MAX_CAPACITY} lb; switched to lpg for {} lb",
            state.capacity
        ),
    })
}

fn force_lpg_indoors(previous: &ConfigState, state: &mut ConfigState) -> Option<Adjustment> {
    let moved_indoors =
        state.environment == Environment::Indoor && previous.environment != Environment::Indoor;
    if !moved_indoors || state.power_type != PowerType::Diesel {
        return None;
    }

    state.power_type = PowerType::Lpg;
    Some(Adjustment {
        code: DIESEL_NOT_ALLOWED_INDOORS.to_owned(),
        field: ConfigField::PowerType,
        message: "diesel power is outdoor only; switched to lpg".to_owned(),
    })
}

fn require_telematics_for_advanced_display(
    previous: &ConfigState,
    state: &mut ConfigState,
) -> Option<Adjustment> {
    let telematics = AddonId::telematics_hardware();
    let switched_to_advanced = state.display_package.requires_telematics()
        && !previous.display_package.requires_telematics();
    if !switched_to_advanced || state.has_addon(&telematics) {
        return None;
    }

    state.selected_addons.push(telematics);
    Some(Adjustment {
        code: TELEMATICS_REQUIRED.to_owned(),
        field: ConfigField::Addons,
        message: "the advanced display includes telematics hardware; add-on selected".to_owned(),
    })
}

fn keep_telematics_while_advanced(
    previous: &ConfigState,
    state: &mut ConfigState,
) -> Option<Adjustment> {
    let telematics = AddonId::telematics_hardware();
    let stays_advanced = state.display_package.requires_telematics()
        && previous.display_package.requires_telematics();
    if !stays_advanced || state.has_addon(&telematics) {
        return None;
    }
    let position = previous.selected_addons.iter().position(|addon| addon == &telematics)?;

    let position = position.min(state.selected_addons.len());
    state.selected_addons.insert(position, telematics);
    Some(Adjustment {
        code: TELEMATICS_LOCKED.to_owned(),
        field: ConfigField::Addons,
        message: "telematics hardware is included with the advanced display and cannot be \
                  removed"
            .to_owned(),
    })
}

/// Whether `power_type` may be selected given the state's capacity and environment.
pub fn is_power_type_allowed(state: &ConfigState, power_type: PowerType) -> bool {
    match power_type {
        PowerType::Electric => state.capacity <= ELECTRIC_MAX_CAPACITY,
        PowerType::Diesel => state.environment == Environment::Outdoor,
        PowerType::Lpg => true,
    }
}

/// Whether the selected model is rated for `environment`. Always true before a model is chosen.
pub fn is_environment_supported(state: &ConfigState, environment: Environment) -> bool {
    state.selected_model.as_ref().map_or(true, |model| model.supports(environment))
}

/// Whether `addon_id` is forced on and cannot be toggled off.
pub fn is_addon_locked(state: &ConfigState, addon_id: &AddonId) -> bool {
    state.display_package == DisplayPackage::Advanced && addon_id == &AddonId::telematics_hardware()
}

/// Checks the cross-field invariants of a resolved state.
pub fn check_invariants(state: &ConfigState) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();

    if let Some(model) = &state.selected_model {
        if state.capacity < model.capacity_min || state.capacity > model.capacity_max {
            violations.push(ConstraintViolation {
                code: "CAPACITY_OUT_OF_RANGE".to_owned(),
                message: format!(
                    "capacity {} lb is outside {} ({})",
                    state.capacity,
                    model.name,
                    model.capacity_range_label()
                ),
                suggestion: Some("Pick a capacity offered for the selected model".to_owned()),
            });
        }
    }

    if state.power_type == PowerType::Electric && state.capacity > ELECTRIC_MAX_CAPACITY {
        violations.push(ConstraintViolation {
            code: ELECTRIC_CAPACITY_EXCEEDED.to_owned(),
            message: format!("electric power is limited to {ELECTRIC_MAX_CAPACITY} lb"),
            suggestion: Some("Use lpg or diesel power".to_owned()),
        });
    }

    if state.power_type == PowerType::Diesel && state.environment != Environment::Outdoor {
        violations.push(ConstraintViolation {
            code: DIESEL_NOT_ALLOWED_INDOORS.to_owned(),
            message: "diesel power requires an outdoor environment".to_owned(),
            suggestion: Some("Use electric or lpg power indoors".to_owned()),
        });
    }

    if state.display_package == DisplayPackage::Advanced
        && !state.has_addon(&AddonId::telematics_hardware())
    {
        violations.push(ConstraintViolation {
            code: TELEMATICS_REQUIRED.to_owned(),
            message: "the advanced display requires telematics hardware".to_owned(),
            suggestion: Some("Select the telematics hardware add-on".to_owned()),
        });
    }

    if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&state.quantity) {
        violations.push(ConstraintViolation {
            code: "QUANTITY_OUT_OF_RANGE".to_owned(),
            message: format!("quantity {} is outside {MIN_QUANTITY}..={MAX_QUANTITY}", state.quantity),
            suggestion: None,
        });
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::{
        check_invariants, is_addon_locked, is_environment_supported, is_power_type_allowed,
        resolve_constraints, resolve_constraints_to_fixed_point, ConstraintResolver,
        DeterministicConstraintResolver,
        ResolutionMode, DIESEL_NOT_ALLOWED_INDOORS, ELECTRIC_CAPACITY_EXCEEDED,
        POWER_TYPE_UNAVAILABLE, TELEMATICS_LOCKED, TELEMATICS_REQUIRED,
    };
    use crate::cpq::catalog::Catalog;
    use crate::domain::configuration::{ConfigState, ConfigUpdate};
    use crate::domain::forklift::{AddonId, DisplayPackage, Environment, ModelId, PowerType};

    fn state_with(catalog: &Catalog, update: ConfigUpdate) -> ConfigState {
        ConfigState::initial(catalog).overwrite(catalog, &update).expect("valid fixture update")
    }

    fn heavy_duty_electric(catalog: &Catalog) -> ConfigState {
        state_with(
            catalog,
            ConfigUpdate {
                model: Some(ModelId("hx-6000".to_owned())),
                power_type: Some(PowerType::Electric),
                ..Default::default()
            },
        )
    }

    #[test]
    fn raising_capacity_above_electric_limit_forces_lpg() {
        let catalog = Catalog::reference();
        let previous = heavy_duty_electric(&catalog);
        let proposed = previous
            .overwrite(&catalog, &ConfigUpdate { capacity: Some(6_500), ..Default::default() })
            .expect("valid update");

        let resolution = resolve_constraints(&previous, proposed);

        assert_eq!(resolution.state.capacity, 6_500);
        assert_eq!(resolution.state.power_type, PowerType::Lpg);
        assert_eq!(resolution.adjustments.len(), 1);
        assert_eq!(resolution.adjustments[0].code, ELECTRIC_CAPACITY_EXCEEDED);
    }

    #[test]
    fn moving_indoors_with_diesel_forces_lpg() {
        let catalog = Catalog::reference();
        let previous = state_with(
            &catalog,
            ConfigUpdate {
                environment: Some(Environment::Outdoor),
                power_type: Some(PowerType::Diesel),
                ..Default::default()
            },
        );
        let proposed = previous
            .overwrite(
                &catalog,
                &ConfigUpdate { environment: Some(Environment::Indoor), ..Default::default() },
            )
            .expect("valid update");

        let resolution = resolve_constraints(&previous, proposed);

        assert_eq!(resolution.state.power_type, PowerType::Lpg);
        assert_eq!(resolution.adjustments[0].code, DIESEL_NOT_ALLOWED_INDOORS);
    }

    #[test]
    fn advanced_display_adds_and_locks_telematics() {
        let catalog = Catalog::reference();
        let previous = ConfigState::initial(&catalog);
        let proposed = previous
            .overwrite(
                &catalog,
                &ConfigUpdate {
                    display_package: Some(DisplayPackage::Advanced),
                    ..Default::default()
                },
            )
            .expect("valid update");

        let advanced = resolve_constraints(&previous, proposed);
        assert!(advanced.state.has_addon(&AddonId::telematics_hardware()));
        assert_eq!(advanced.adjustments[0].code, TELEMATICS_REQUIRED);
        assert!(is_addon_locked(&advanced.state, &AddonId::telematics_hardware()));

        let removal = advanced
            .state
            .overwrite(&catalog, &ConfigUpdate { addons: Some(Vec::new()), ..Default::default() })
            .expect("valid update");
        let locked = resolve_constraints(&advanced.state, removal);
        assert_eq!(locked.state.selected_addons, vec![AddonId::telematics_hardware()]);
        assert_eq!(locked.adjustments[0].code, TELEMATICS_LOCKED);
    }

    #[test]
    fn locked_telematics_keeps_its_position() {
        let catalog = Catalog::reference();
        let previous = state_with(
            &catalog,
            ConfigUpdate {
                display_package: Some(DisplayPackage::Advanced),
                addons: Some(vec![
                    AddonId("extended-warranty".to_owned()),
                    AddonId::telematics_hardware(),
                    AddonId("maintenance-plan".to_owned()),
                ]),
                ..Default::default()
            },
        );
        let proposed = previous
            .overwrite(
                &catalog,
                &ConfigUpdate {
                    addons: Some(vec![
                        AddonId("extended-warranty".to_owned()),
                        AddonId("maintenance-plan".to_owned()),
                    ]),
                    ..Default::default()
                },
            )
            .expect("valid update");

        let resolution = resolve_constraints(&previous, proposed);
        assert_eq!(
            resolution.state.selected_addons,
            vec![
                AddonId("extended-warranty".to_owned()),
                AddonId::telematics_hardware(),
                AddonId("maintenance-plan".to_owned()),
            ]
        );
    }

    #[test]
    fn leaving_advanced_display_keeps_telematics_but_unlocks_it() {
        let catalog = Catalog::reference();
        let previous = state_with(
            &catalog,
            ConfigUpdate {
                display_package: Some(DisplayPackage::Advanced),
                addons: Some(vec![AddonId::telematics_hardware()]),
                ..Default::default()
            },
        );
        let proposed = previous
            .overwrite(
                &catalog,
                &ConfigUpdate {
                    display_package: Some(DisplayPackage::Enhanced),
                    ..Default::default()
                },
            )
            .expect("valid update");

        let enhanced = resolve_constraints(&previous, proposed);
        assert!(enhanced.state.has_addon(&AddonId::telematics_hardware()));
        assert!(!is_addon_locked(&enhanced.state, &AddonId::telematics_hardware()));

        let removal = enhanced
            .state
            .overwrite(&catalog, &ConfigUpdate { addons: Some(Vec::new()), ..Default::default() })
            .expect("valid update");
        let removed = resolve_constraints(&enhanced.state, removal);
        assert!(removed.state.selected_addons.is_empty());
        assert!(removed.adjustments.is_empty());
    }

    #[test]
    fn unavailable_power_type_requests_are_rejected() {
        let catalog = Catalog::reference();
        let previous = state_with(
            &catalog,
            ConfigUpdate { model: Some(ModelId("mx-10000".to_owned())), ..Default::default() },
        );
        assert!(!is_power_type_allowed(&previous, PowerType::Electric));
        assert!(!is_power_type_allowed(&previous, PowerType::Diesel));

        let proposed = previous
            .overwrite(
                &catalog,
                &ConfigUpdate { power_type: Some(PowerType::Electric), ..Default::default() },
            )
            .expect("valid update");
        let resolution = resolve_constraints(&previous, proposed);

        assert_eq!(resolution.state.power_type, PowerType::Lpg);
        assert_eq!(resolution.adjustments[0].code, POWER_TYPE_UNAVAILABLE);
        assert!(check_invariants(&resolution.state).is_empty());
    }

    #[test]
    fn fixed_point_mode_settles_after_a_quiet_pass() {
        let catalog = Catalog::reference();
        let previous = heavy_duty_electric(&catalog);
        let proposed = previous
            .overwrite(
                &catalog,
                &ConfigUpdate {
                    capacity: Some(8_000),
                    display_package: Some(DisplayPackage::Advanced),
                    ..Default::default()
                },
            )
            .expect("valid update");

        let single = resolve_constraints(&previous, proposed.clone());
        let fixed = resolve_constraints_to_fixed_point(&previous, proposed.clone(), 8);

        assert_eq!(single.state, fixed.state);
        assert_eq!(fixed.passes, 2);
        assert_eq!(fixed.adjustments.len(), 2);

        let resolver =
            DeterministicConstraintResolver::new(ResolutionMode::FixedPoint { max_passes: 1 });
        assert_eq!(resolver.resolve(&previous, proposed).passes, 1);
    }

    #[test]
    fn invariant_check_flags_inconsistent_states() {
        let catalog = Catalog::reference();
        let mut state = heavy_duty_electric(&catalog);
        state.capacity = 7_000;
        state.display_package = DisplayPackage::Advanced;

        let codes: Vec<String> =
            check_invariants(&state).into_iter().map(|violation| violation.code).collect();
        assert_eq!(codes, vec![ELECTRIC_CAPACITY_EXCEEDED, TELEMATICS_REQUIRED]);
    }

    #[test]
    fn environment_support_follows_the_selected_model() {
        let catalog = Catalog::reference();
        let initial = ConfigState::initial(&catalog);
        assert!(is_environment_supported(&initial, Environment::Indoor));

        let outdoor_only = state_with(
            &catalog,
            ConfigUpdate { model: Some(ModelId("mx-10000".to_owned())), ..Default::default() },
        );
        assert!(!is_environment_supported(&outdoor_only, Environment::Indoor));
        assert!(is_environment_supported(&outdoor_only, Environment::Outdoor));

        let compact = state_with(
            &catalog,
            ConfigUpdate { model: Some(ModelId("cx-3000".to_owned())), ..Default::default() },
        );
        assert!(Environment::ALL.iter().all(|env| is_environment_supported(&compact, *env)));
    }
}
