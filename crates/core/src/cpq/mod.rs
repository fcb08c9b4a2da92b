pub mod catalog;
pub mod constraints;
pub mod pricing;

use serde::{Deserialize, Serialize};

use crate::domain::configuration::{ConfigState, ConfigUpdate};
use crate::errors::DomainError;

use self::{
    catalog::Catalog,
    constraints::{ConstraintResolver, DeterministicConstraintResolver, Resolution},
    pricing::{DeterministicPricingEngine, PricingEngine, PricingResult},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguratorEvaluation {
    pub resolution: Resolution,
    pub pricing: PricingResult,
}

pub trait ConfiguratorRuntime: Send + Sync {
    /// The only way a configuration changes: overwrite the requested fields, then let the
    /// resolver normalize the result against `state`. Neither argument is modified.
    fn apply_update(
        &self,
        catalog: &Catalog,
        state: &ConfigState,
        update: &ConfigUpdate,
    ) -> Result<Resolution, DomainError>;

    fn price(&self, catalog: &Catalog, state: &ConfigState, currency: &str) -> PricingResult;

    fn evaluate(
        &self,
        catalog: &Catalog,
        state: &ConfigState,
        update: &ConfigUpdate,
        currency: &str,
    ) -> Result<ConfiguratorEvaluation, DomainError> {
        let resolution = self.apply_update(catalog, state, update)?;
        let pricing = self.price(catalog, &resolution.state, currency);
        Ok(ConfiguratorEvaluation { resolution, pricing })
    }
}

pub struct DeterministicConfiguratorRuntime<R, P> {
    resolver: R,
    pricing_engine: P,
}

impl<R, P> DeterministicConfiguratorRuntime<R, P> {
    pub fn new(resolver: R, pricing_engine: P) -> Self {
        Self { resolver, pricing_engine }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }
}

impl Default
    for DeterministicConfiguratorRuntime<DeterministicConstraintResolver, DeterministicPricingEngine>
{
    fn default() -> Self {
        Self::new(DeterministicConstraintResolver::default(), DeterministicPricingEngine)
    }
}

impl<R, P> ConfiguratorRuntime for DeterministicConfiguratorRuntime<R, P>
where
    R: ConstraintResolver,
    P: PricingEngine,
{
    fn apply_update(
        &self,
        catalog: &Catalog,
        state: &ConfigState,
        update: &ConfigUpdate,
    ) -> Result<Resolution, DomainError> {
        let proposed = state.overwrite(catalog, update)?;
        Ok(self.resolver.resolve(state, proposed))
    }

    fn price(&self, catalog: &Catalog, state: &ConfigState, currency: &str) -> PricingResult {
        self.pricing_engine.price(catalog, state, currency)
    }
}

/// [`ConfiguratorRuntime::apply_update`] with the default single-pass resolver.
pub fn apply_update(
    catalog: &Catalog,
    state: &ConfigState,
    update: &ConfigUpdate,
) -> Result<Resolution, DomainError> {
    DeterministicConfiguratorRuntime::default().apply_update(catalog, state, update)
}
