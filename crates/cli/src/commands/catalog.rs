use fleetcfg_core::config::LoadOptions;
use fleetcfg_core::Catalog;
use rust_decimal::Decimal;

use crate::commands::{load_context, CommandResult};

pub fn run(options: LoadOptions, json: bool) -> CommandResult {
    let (config, catalog) = match load_context("catalog", options) {
        Ok(context) => context,
        Err(failure) => return failure,
    };

    if json {
        return CommandResult::json("catalog", &catalog);
    }

    CommandResult { exit_code: 0, output: render(&catalog, &config.pricing.currency) }
}

fn render(catalog: &Catalog, currency: &str) -> String {
    let money = |amount: Decimal| format!("{currency} {}", amount.round_dp(2));
    let mut lines = vec!["models:".to_string()];

    for model in catalog.models() {
        let environments =
            model.environments.iter().map(|env| env.label()).collect::<Vec<_>>().join("/");
        lines.push(format!(
            "- {} {} ({}) {} | {} | from {}",
            model.id,
            model.name,
            model.series,
            model.capacity_range_label(),
            environments,
            money(model.base_price)
        ));
    }

    lines.push("mast heights:".to_string());
    lines.extend(
        catalog
            .mast_heights()
            .iter()
            .map(|mast| format!("- {} ({}) +{}", mast.height_in, mast.label, money(mast.price))),
    );

    lines.push("power types:".to_string());
    lines.extend(catalog.power_types().iter().map(|option| {
        format!("- {} ({}) +{}", option.value.as_str(), option.label, money(option.price))
    }));

    lines.push("tire types:".to_string());
    lines.extend(catalog.tire_types().iter().map(|option| {
        format!("- {} ({}) +{}", option.value.as_str(), option.label, money(option.price))
    }));

    lines.push("display packages:".to_string());
    lines.extend(catalog.display_packages().iter().map(|option| {
        format!("- {} ({}) +{}", option.value.as_str(), option.label, money(option.price))
    }));

    lines.push("add-ons:".to_string());
    lines.extend(catalog.addons().iter().map(|addon| {
        format!(
            "- {} ({}) +{} one-time, +{}/mo",
            addon.id,
            addon.name,
            money(addon.one_time_price),
            money(addon.monthly_price)
        )
    }));

    lines.push("colors:".to_string());
    lines.extend(
        catalog.colors().iter().map(|color| format!("- {} ({})", color.value, color.label)),
    );

    lines.push("fleet discounts:".to_string());
    lines.extend(catalog.fleet_discount_tiers().iter().map(|tier| {
        format!("- {}-{} units: {}", tier.min, tier.max, tier.label)
    }));

    lines.join("\n")
}
