use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use formbar_cli::settings::Settings;
use formbar_cli::simulate::{
    InspectReport, SimulationResult, inspect_form, resolve_eval_url, run_simulation,
};
use formbar_core::Unavailable;
use formbar_markup::FormMarkup;
use formbar_remote::{HttpEvaluator, HttpEvaluatorConfig};

use crate::cli::{InspectArgs, SimulateArgs};

pub fn run_inspect(args: &InspectArgs) -> Result<InspectReport> {
    let span = info_span!("inspect", form = %args.form.display());
    let _guard = span.enter();
    let form = FormMarkup::load(&args.form)
        .with_context(|| format!("load form {}", args.form.display()))?;
    Ok(inspect_form(form))
}

pub fn run_simulate(args: &SimulateArgs, settings: &Settings) -> Result<SimulationResult> {
    let span = info_span!("simulate", form = %args.form.display());
    let _guard = span.enter();
    let form = FormMarkup::load(&args.form)
        .with_context(|| format!("load form {}", args.form.display()))?;
    let debounce = settings.dispatch.debounce();
    let url = resolve_eval_url(
        args.eval_url.as_deref(),
        settings.evaluator.url.as_deref(),
        form.eval_url.as_deref(),
    );
    match url {
        Some(url) => {
            let mut config =
                HttpEvaluatorConfig::new(url).with_timeout(settings.evaluator.timeout());
            if let Some(user_agent) = &settings.evaluator.user_agent {
                config = config.with_user_agent(user_agent.clone());
            }
            let evaluator = HttpEvaluator::new(config).context("configure rule evaluator")?;
            info!(url = evaluator.url(), "using remote rule evaluator");
            run_simulation(form, evaluator, &args.set, debounce)
        }
        None => {
            warn!("no rule evaluator configured, every conditional evaluates as false");
            run_simulation(form, Unavailable, &args.set, debounce)
        }
    }
}
