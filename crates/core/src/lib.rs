pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod session;
pub mod summary;

pub use cpq::catalog::{Catalog, CatalogError};
pub use cpq::constraints::{Adjustment, Resolution, ResolutionMode};
pub use cpq::pricing::{FleetDiscount, FleetTotals, PricingResult};
pub use cpq::{apply_update, ConfiguratorRuntime, DeterministicConfiguratorRuntime};
pub use domain::configuration::{ConfigField, ConfigState, ConfigUpdate};
pub use domain::forklift::{AddonId, DisplayPackage, Environment, ModelId, PowerType, TireType};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{Step, WizardError};
pub use session::{ConfiguratorSession, Intent, SessionId, SessionOutcome};
pub use summary::QuoteSummary;
