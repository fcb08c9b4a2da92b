pub mod engine;
pub mod states;

pub use engine::{WizardEngine, WizardError};
pub use states::{Step, WizardContext, WizardEvent, WizardProgress, WizardTransition};
