use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cpq::catalog::Catalog;
use crate::cpq::constraints::{
    is_addon_locked, Adjustment, DeterministicConstraintResolver, Resolution,
};
use crate::cpq::pricing::{DeterministicPricingEngine, PricingResult};
use crate::cpq::{ConfiguratorRuntime, DeterministicConfiguratorRuntime};
use crate::domain::configuration::{ConfigField, ConfigState, ConfigUpdate};
use crate::domain::forklift::{AddonId, ModelId};
use crate::errors::DomainError;
use crate::flows::{Step, WizardContext, WizardEngine, WizardEvent, WizardProgress};
use crate::summary::QuoteSummary;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(format!("cfg-{}", Uuid::new_v4()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a front end can ask a session to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Update(ConfigUpdate),
    SelectModel(ModelId),
    SelectColor(String),
    ToggleAddon(AddonId),
    AdjustQuantity(i64),
    Next,
    Back,
    GoTo(Step),
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Update(_) => "update",
            Self::SelectModel(_) => "select_model",
            Self::SelectColor(_) => "select_color",
            Self::ToggleAddon(_) => "toggle_addon",
            Self::AdjustQuantity(_) => "adjust_quantity",
            Self::Next => "next",
            Self::Back => "back",
            Self::GoTo(_) => "go_to",
        }
    }

    fn wizard_event(&self) -> Option<WizardEvent> {
        match self {
            Self::Next => Some(WizardEvent::Next),
            Self::Back => Some(WizardEvent::Back),
            Self::GoTo(step) => Some(WizardEvent::GoTo(*step)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionOutcome {
    pub previous: ConfigState,
    pub changed: Vec<ConfigField>,
    pub adjustments: Vec<Adjustment>,
}

pub type DefaultRuntime =
    DeterministicConfiguratorRuntime<DeterministicConstraintResolver, DeterministicPricingEngine>;

/// One user's walk through the wizard. Owns its state and progress; the catalog is shared.
pub struct ConfiguratorSession<T = DefaultRuntime> {
    id: SessionId,
    catalog: Arc<Catalog>,
    runtime: T,
    wizard: WizardEngine,
    state: ConfigState,
    progress: WizardProgress,
    currency: String,
}

impl ConfiguratorSession<DefaultRuntime> {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_runtime(catalog, DefaultRuntime::default())
    }
}

impl<T> ConfiguratorSession<T>
where
    T: ConfiguratorRuntime,
{
    pub fn with_runtime(catalog: Arc<Catalog>, runtime: T) -> Self {
        let state = ConfigState::initial(&catalog);
        Self {
            id: SessionId::generate(),
            catalog,
            runtime,
            wizard: WizardEngine::new(),
            state,
            progress: WizardProgress::default(),
            currency: "USD".to_owned(),
        }
    }

    pub fn with_id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &ConfigState {
        &self.state
    }

    pub fn progress(&self) -> &WizardProgress {
        &self.progress
    }

    pub fn pricing(&self) -> PricingResult {
        self.runtime.price(&self.catalog, &self.state, &self.currency)
    }

    pub fn summary(&self) -> Result<QuoteSummary, DomainError> {
        QuoteSummary::build(&self.catalog, &self.state, &self.currency)
    }

    /// Applies one intent. On error the session is left exactly as it was.
    pub fn dispatch(&mut self, intent: Intent) -> Result<SessionOutcome, DomainError> {
        let result = self.try_dispatch(&intent);
        match &result {
            Ok(outcome) => info!(
                event_name = "configurator.session.intent_applied",
                session_id = %self.id,
                intent = intent.name(),
                step = self.state.step.label(),
                changed = ?outcome.changed.iter().map(ConfigField::as_str).collect::<Vec<_>>(),
                adjustments = outcome.adjustments.len(),
                "intent applied"
            ),
            Err(error) => warn!(
                event_name = "configurator.session.intent_rejected",
                session_id = %self.id,
                intent = intent.name(),
                error = %error,
                "intent rejected"
            ),
        }
        result
    }

    fn try_dispatch(&mut self, intent: &Intent) -> Result<SessionOutcome, DomainError> {
        if let Some(event) = intent.wizard_event() {
            let context = WizardContext { model_selected: self.state.selected_model.is_some() };
            let transition =
                self.wizard.apply(self.state.step, &event, &self.progress, &context)?;
            let update = ConfigUpdate { step: Some(transition.to), ..Default::default() };
            let resolution = self.runtime.apply_update(&self.catalog, &self.state, &update)?;
            self.progress.record(&transition);
            return Ok(self.commit(resolution));
        }

        let Some(update) = self.update_for(intent) else {
            return Ok(self.commit(Resolution {
                state: self.state.clone(),
                adjustments: Vec::new(),
                passes: 0,
            }));
        };
        let resolution = self.runtime.apply_update(&self.catalog, &self.state, &update)?;
        Ok(self.commit(resolution))
    }

    /// Translates a helper intent into a field update. `None` means the intent is a no-op.
    fn update_for(&self, intent: &Intent) -> Option<ConfigUpdate> {
        match intent {
            Intent::Update(update) => Some(update.clone()),
            Intent::SelectModel(model_id) => {
                Some(ConfigUpdate { model: Some(model_id.clone()), ..Default::default() })
            }
            Intent::SelectColor(color) => {
                Some(ConfigUpdate { color: Some(color.clone()), ..Default::default() })
            }
            Intent::ToggleAddon(addon_id) => {
                if is_addon_locked(&self.state, addon_id) {
                    return None;
                }
                let mut addons = self.state.selected_addons.clone();
                if self.state.has_addon(addon_id) {
                    addons.retain(|selected| selected != addon_id);
                } else {
                    addons.push(addon_id.clone());
                }
                Some(ConfigUpdate { addons: Some(addons), ..Default::default() })
            }
            Intent::AdjustQuantity(delta) => Some(ConfigUpdate {
                quantity: Some(i64::from(self.state.quantity).saturating_add(*delta)),
                ..Default::default()
            }),
            Intent::Next | Intent::Back | Intent::GoTo(_) => None,
        }
    }

    fn commit(&mut self, resolution: Resolution) -> SessionOutcome {
        let previous = std::mem::replace(&mut self.state, resolution.state);
        let changed = previous.changed_fields(&self.state);
        SessionOutcome { previous, changed, adjustments: resolution.adjustments }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{ConfiguratorSession, Intent, SessionId};
    use crate::cpq::catalog::Catalog;
    use crate::cpq::constraints::ELECTRIC_CAPACITY_EXCEEDED;
    use crate::domain::configuration::{ConfigField, ConfigUpdate};
    use crate::domain::forklift::{AddonId, DisplayPackage, ModelId, PowerType};
    use crate::errors::DomainError;
    use crate::flows::{Step, WizardError};

    fn session() -> ConfiguratorSession {
        ConfiguratorSession::new(Arc::new(Catalog::reference()))
            .with_id(SessionId("cfg-test".to_owned()))
    }

    #[test]
    fn walks_the_wizard_after_selecting_a_model() {
        let mut session = session();

        let error = session.dispatch(Intent::Next).expect_err("model required");
        assert!(matches!(error, DomainError::Wizard(WizardError::CannotProceed { .. })));
        assert_eq!(session.state().step, Step::BaseModel);

        session.dispatch(Intent::SelectModel(ModelId("cx-3000".to_owned()))).expect("model");
        let outcome = session.dispatch(Intent::Next).expect("advance");

        assert_eq!(outcome.changed, vec![ConfigField::Step]);
        assert_eq!(session.state().step, Step::Specifications);
        assert!(session.progress().is_completed(Step::BaseModel));

        session.dispatch(Intent::Back).expect("back");
        assert_eq!(session.state().step, Step::BaseModel);
        session.dispatch(Intent::GoTo(Step::Specifications)).expect("completed frontier");
        let error = session.dispatch(Intent::GoTo(Step::Summary)).expect_err("locked");
        assert_eq!(error, DomainError::Wizard(WizardError::StepLocked { target: Step::Summary }));
    }

    #[test]
    fn reports_adjustments_from_the_resolver() {
        let mut session = session();
        session.dispatch(Intent::SelectModel(ModelId("hx-6000".to_owned()))).expect("model");
        session
            .dispatch(Intent::Update(ConfigUpdate {
                power_type: Some(PowerType::Electric),
                ..Default::default()
            }))
            .expect("electric at 5000 lb");

        let outcome = session
            .dispatch(Intent::Update(ConfigUpdate { capacity: Some(7_000), ..Default::default() }))
            .expect("capacity change");

        assert_eq!(session.state().power_type, PowerType::Lpg);
        assert_eq!(outcome.changed, vec![ConfigField::Capacity, ConfigField::PowerType]);
        assert_eq!(outcome.adjustments[0].code, ELECTRIC_CAPACITY_EXCEEDED);
        assert_eq!(outcome.previous.power_type, PowerType::Electric);
    }

    #[test]
    fn toggling_a_locked_addon_changes_nothing() {
        let mut session = session();
        session.dispatch(Intent::SelectModel(ModelId("cx-3000".to_owned()))).expect("model");
        session
            .dispatch(Intent::Update(ConfigUpdate {
                display_package: Some(DisplayPackage::Advanced),
                ..Default::default()
            }))
            .expect("advanced display");

        let outcome =
            session.dispatch(Intent::ToggleAddon(AddonId::telematics_hardware())).expect("no-op");
        assert!(outcome.changed.is_empty());
        assert!(session.state().has_addon(&AddonId::telematics_hardware()));

        let warranty = AddonId("extended-warranty".to_owned());
        session.dispatch(Intent::ToggleAddon(warranty.clone())).expect("add");
        assert!(session.state().has_addon(&warranty));
        session.dispatch(Intent::ToggleAddon(warranty.clone())).expect("remove");
        assert!(!session.state().has_addon(&warranty));
    }

    #[test]
    fn quantity_adjustments_saturate_at_bounds() {
        let mut session = session();
        session.dispatch(Intent::AdjustQuantity(-5)).expect("clamped");
        assert_eq!(session.state().quantity, 1);
        session.dispatch(Intent::AdjustQuantity(6)).expect("adjust");
        assert_eq!(session.state().quantity, 7);
        session.dispatch(Intent::AdjustQuantity(i64::MAX)).expect("clamped");
        assert_eq!(session.state().quantity, 20);
    }

    #[test]
    fn rejected_intents_leave_state_untouched() {
        let mut session = session();
        session.dispatch(Intent::SelectModel(ModelId("cx-3000".to_owned()))).expect("model");
        let before = session.state().clone();

        let error =
            session.dispatch(Intent::SelectColor("hot-pink".to_owned())).expect_err("unknown color");
        assert!(matches!(error, DomainError::UnknownCatalogReference { .. }));
        assert_eq!(session.state(), &before);

        session.dispatch(Intent::SelectColor("graphite".to_owned())).expect("known color");
        assert_eq!(session.state().color, "graphite");
    }

    #[test]
    fn summary_follows_session_state() {
        let mut session = session();
        assert_eq!(session.summary().expect_err("no model"), DomainError::NoModelSelected);

        session.dispatch(Intent::SelectModel(ModelId("cx-3000".to_owned()))).expect("model");
        let summary = session.summary().expect("model selected");
        assert_eq!(summary.model_id, "cx-3000");
        assert_eq!(session.pricing().totals.unit_price, summary.totals.unit_price);
    }
}
