use thiserror::Error;

use crate::flows::states::{Step, WizardContext, WizardEvent, WizardProgress, WizardTransition};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("cannot leave step {step:?}: {reason}")]
    CannotProceed { step: Step, reason: String },
    #[error("step {target:?} is not reachable yet")]
    StepLocked { target: Step },
    #[error("step {step:?} is the last step")]
    AtLastStep { step: Step },
}

/// Step sequencing for the configurator: Base Model, Specifications, Add-ons,
/// Fleet & Pricing, Summary.
#[derive(Clone, Debug, Default)]
pub struct WizardEngine;

impl WizardEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn initial_step(&self) -> Step {
        Step::BaseModel
    }

    pub fn can_proceed(&self, step: Step, context: &WizardContext) -> Result<(), WizardError> {
        if step == Step::BaseModel && !context.model_selected {
            return Err(WizardError::CannotProceed {
                step,
                reason: "select a base model to continue".to_owned(),
            });
        }
        Ok(())
    }

    pub fn apply(
        &self,
        current: Step,
        event: &WizardEvent,
        progress: &WizardProgress,
        context: &WizardContext,
    ) -> Result<WizardTransition, WizardError> {
        let (to, completed) = match event {
            WizardEvent::Next => {
                self.can_proceed(current, context)?;
                let to = current.next().ok_or(WizardError::AtLastStep { step: current })?;
                (to, Some(current))
            }
            WizardEvent::Back => (current.previous().unwrap_or(current), None),
            WizardEvent::GoTo(target) => {
                let target = *target;
                if target != current {
                    if !progress.is_reachable(target) {
                        return Err(WizardError::StepLocked { target });
                    }
                    // Every step past the first renders the selected model.
                    if target != Step::BaseModel {
                        self.can_proceed(Step::BaseModel, context)?;
                    }
                }
                (target, None)
            }
        };

        Ok(WizardTransition { from: current, to, event: event.clone(), completed })
    }
}
