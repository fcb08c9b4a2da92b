use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::cpq::catalog::CatalogError;
use crate::flows::WizardError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogReference {
    Model,
    MastHeight,
    Addon,
    Color,
}

impl fmt::Display for CatalogReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Model => "model",
            Self::MastHeight => "mast height",
            Self::Addon => "add-on",
            Self::Color => "color",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{kind} `{value}` is not in the catalog")]
    UnknownCatalogReference { kind: CatalogReference, value: String },
    #[error("no base model has been selected")]
    NoModelSelected,
    #[error(transparent)]
    Wizard(#[from] WizardError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("catalog failure: {0}")]
    Catalog(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The configuration could not be updated. Check the selected options and try again."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<CatalogError> for ApplicationError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value.to_string())
    }
}

impl From<ConfigError> for ApplicationError {
    fn from(value: ConfigError) -> Self {
        Self::Configuration(value.to_string())
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Catalog(message) | ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, CatalogReference, DomainError, InterfaceError};
    use crate::flows::{Step, WizardError};

    #[test]
    fn domain_error_maps_to_bad_request_interface_error() {
        let interface = ApplicationError::from(DomainError::UnknownCatalogReference {
            kind: CatalogReference::Model,
            value: "zx-1".to_owned(),
        })
        .into_interface("session-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ref message,
            } if correlation_id == "session-1" && message.contains("zx-1")
        ));
        assert_eq!(
            interface.user_message(),
            "The configuration could not be updated. Check the selected options and try again."
        );
    }

    #[test]
    fn wizard_errors_surface_as_domain_errors() {
        let error = DomainError::from(WizardError::CannotProceed {
            step: Step::BaseModel,
            reason: "select a base model to continue".to_owned(),
        });
        assert!(error.to_string().contains("select a base model"));
    }

    #[test]
    fn catalog_error_maps_to_internal() {
        let interface =
            ApplicationError::Catalog("tiers leave a gap".to_owned()).into_interface("session-2");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
