use std::sync::Arc;

use clap::Args;
use fleetcfg_core::config::LoadOptions;
use fleetcfg_core::cpq::constraints::{is_environment_supported, DeterministicConstraintResolver};
use fleetcfg_core::cpq::pricing::DeterministicPricingEngine;
use fleetcfg_core::{
    Adjustment, AddonId, ApplicationError, ConfigUpdate, ConfiguratorSession,
    DeterministicConfiguratorRuntime, DisplayPackage, Environment, Intent, ModelId, PowerType,
    QuoteSummary, Step, TireType,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::{load_context, CommandResult};

#[derive(Debug, Clone, Args)]
pub struct QuoteArgs {
    #[arg(long, help = "Base model id, e.g. cx-3000")]
    pub model: String,
    #[arg(long, help = "Load capacity in lb; clamped into the model's range")]
    pub capacity: Option<u32>,
    #[arg(long, help = "Mast height in inches (188, 216, 240)")]
    pub mast_height: Option<u32>,
    #[arg(long, help = "electric | lpg | diesel")]
    pub power: Option<PowerType>,
    #[arg(long, help = "cushion | pneumatic | solid-pneumatic")]
    pub tire: Option<TireType>,
    #[arg(long, help = "standard | enhanced | advanced")]
    pub display: Option<DisplayPackage>,
    #[arg(long, help = "indoor | outdoor")]
    pub environment: Option<Environment>,
    #[arg(long, help = "Paint color value, e.g. safety-orange")]
    pub color: Option<String>,
    #[arg(long = "addon", help = "Add-on id; repeat for several")]
    pub addons: Vec<String>,
    #[arg(long, allow_hyphen_values = true, help = "Fleet size; clamped into 1..=20")]
    pub quantity: Option<i64>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

impl QuoteArgs {
    fn update(&self) -> ConfigUpdate {
        ConfigUpdate {
            capacity: self.capacity,
            mast_height: self.mast_height,
            power_type: self.power,
            tire_type: self.tire,
            display_package: self.display,
            environment: self.environment,
            color: self.color.clone(),
            addons: (!self.addons.is_empty())
                .then(|| self.addons.iter().map(|id| AddonId(id.clone())).collect()),
            quantity: self.quantity,
            ..ConfigUpdate::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct QuoteReport {
    session_id: String,
    adjustments: Vec<Adjustment>,
    warnings: Vec<String>,
    summary: QuoteSummary,
}

pub fn run(options: LoadOptions, args: &QuoteArgs) -> CommandResult {
    let (config, catalog) = match load_context("quote", options) {
        Ok(context) => context,
        Err(failure) => return failure,
    };

    let runtime = DeterministicConfiguratorRuntime::new(
        DeterministicConstraintResolver::new(config.pricing.resolution_mode()),
        DeterministicPricingEngine,
    );
    let mut session = ConfiguratorSession::with_runtime(Arc::new(catalog), runtime)
        .with_currency(config.pricing.currency.clone());

    let mut intents = vec![Intent::SelectModel(ModelId(args.model.clone()))];
    let update = args.update();
    if !update.is_empty() {
        intents.push(Intent::Update(update));
    }
    intents.extend(std::iter::repeat(Intent::Next).take(Step::ALL.len() - 1));

    let mut adjustments = Vec::new();
    for intent in intents {
        match session.dispatch(intent) {
            Ok(outcome) => adjustments.extend(outcome.adjustments),
            Err(error) => {
                let interface = ApplicationError::from(error).into_interface(session.id().0.clone());
                return CommandResult::failure(
                    "quote",
                    "invalid_selection",
                    format!("{}: {interface}", interface.user_message()),
                    1,
                );
            }
        }
    }

    let summary = match session.summary() {
        Ok(summary) => summary,
        Err(error) => return CommandResult::failure("quote", "invalid_selection", error.to_string(), 1),
    };
    let mut warnings = Vec::new();
    let state = session.state();
    if !is_environment_supported(state, state.environment) {
        warnings.push(format!(
            "{} is not rated for {} use",
            summary.model_name,
            state.environment.as_str()
        ));
    }
    let report =
        QuoteReport { session_id: session.id().0.clone(), adjustments, warnings, summary };

    if args.json {
        return CommandResult::json("quote", &report);
    }
    CommandResult { exit_code: 0, output: render(&report) }
}

fn render(report: &QuoteReport) -> String {
    let summary = &report.summary;
    let money = |amount: Decimal| format!("{} {}", summary.currency, amount.round_dp(2));
    let totals = &summary.totals;

    let mut lines = vec![format!(
        "{} {} ({}) base {}",
        summary.model_name,
        summary.series,
        summary.model_id,
        money(summary.base_price)
    )];
    lines.extend(
        summary
            .specifications
            .iter()
            .map(|spec| format!("- {}: {} (+{})", spec.name, spec.value, money(spec.price))),
    );
    lines.push(format!("- Color: {}", summary.color));
    lines.extend(summary.addons.iter().map(|addon| {
        format!(
            "- Add-on: {} (+{}, +{}/mo)",
            addon.name,
            money(addon.one_time_price),
            money(addon.monthly_price)
        )
    }));

    lines.push(format!("unit price: {}", money(totals.unit_price)));
    lines.push(format!("quantity: {}", totals.quantity));
    lines.push(format!("subtotal: {}", money(totals.subtotal)));
    lines.push(format!(
        "{}: -{}",
        totals.discount.label,
        money(totals.discount_amount)
    ));
    lines.push(format!("total one-time: {}", money(totals.total_one_time)));
    lines.push(format!("total monthly: {}", money(totals.total_monthly)));
    if totals.estimated_annual_savings > Decimal::ZERO {
        lines.push(format!(
            "estimated annual savings: {}",
            money(totals.estimated_annual_savings)
        ));
    }

    for adjustment in &report.adjustments {
        lines.push(format!("note [{}]: {}", adjustment.code, adjustment.message));
    }
    lines.extend(report.warnings.iter().map(|warning| format!("warning: {warning}")));

    lines.join("\n")
}
