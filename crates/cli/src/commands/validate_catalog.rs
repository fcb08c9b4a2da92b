use std::path::Path;

use anyhow::Context;
use fleetcfg_core::{Catalog, CatalogError};

use crate::commands::CommandResult;

pub fn run(path: &Path) -> CommandResult {
    match check(path) {
        Ok(catalog) => CommandResult::success(
            "validate-catalog",
            format!(
                "catalog `{}` is valid: {} models, {} add-ons, {} discount tiers",
                path.display(),
                catalog.models().len(),
                catalog.addons().len(),
                catalog.fleet_discount_tiers().len()
            ),
        ),
        Err(error) => {
            let (error_class, exit_code) = match error.downcast_ref::<CatalogError>() {
                Some(CatalogError::ReadFile { .. }) => ("catalog_read", 2),
                Some(CatalogError::ParseFile { .. }) => ("catalog_parse", 3),
                Some(CatalogError::Validation(_)) | None => ("catalog_validation", 4),
            };
            CommandResult::failure("validate-catalog", error_class, format!("{error:#}"), exit_code)
        }
    }
}

fn check(path: &Path) -> anyhow::Result<Catalog> {
    let catalog = Catalog::load(path)
        .with_context(|| format!("catalog `{}` was rejected", path.display()))?;
    Ok(catalog)
}
