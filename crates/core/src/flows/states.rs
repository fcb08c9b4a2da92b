use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    BaseModel,
    Specifications,
    Addons,
    FleetPricing,
    Summary,
}

impl Step {
    pub const ALL: [Self; 5] =
        [Self::BaseModel, Self::Specifications, Self::Addons, Self::FleetPricing, Self::Summary];

    pub fn index(&self) -> usize {
        match self {
            Self::BaseModel => 0,
            Self::Specifications => 1,
            Self::Addons => 2,
            Self::FleetPricing => 3,
            Self::Summary => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::BaseModel => "Base Model",
            Self::Specifications => "Specifications",
            Self::Addons => "Add-ons",
            Self::FleetPricing => "Fleet & Pricing",
            Self::Summary => "Summary",
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardEvent {
    Next,
    Back,
    GoTo(Step),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WizardContext {
    pub model_selected: bool,
}

/// Steps the user has completed, in completion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WizardProgress {
    completed: Vec<Step>,
}

impl WizardProgress {
    pub fn completed(&self) -> &[Step] {
        &self.completed
    }

    pub fn is_completed(&self, step: Step) -> bool {
        self.completed.contains(&step)
    }

    pub fn mark_completed(&mut self, step: Step) {
        if !self.is_completed(step) {
            self.completed.push(step);
        }
    }

    /// A step can be opened directly once completed, or when it is at most one step past the
    /// furthest completed step.
    pub fn is_reachable(&self, step: Step) -> bool {
        let frontier = self.completed.iter().map(Step::index).max().unwrap_or(0);
        self.is_completed(step) || step.index() <= frontier + 1
    }

    pub fn record(&mut self, transition: &WizardTransition) {
        if let Some(step) = transition.completed {
            self.mark_completed(step);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardTransition {
    pub from: Step,
    pub to: Step,
    pub event: WizardEvent,
    pub completed: Option<Step>,
}
