//! Subcommand implementations.

use std::path::Path;

use anyhow::{Context, Result};
use dynafactor::{
    Pipeline,
    features::AssetFailure,
    model::{DynamicFit, IpcaPanel, NestedFit, StaticFit},
    primitives::LoadingMatrix,
    utils::{factor_table_from_frame, factor_table_to_frame, read_csv, write_csv},
};
use polars::prelude::*;

/// Failures printed before the list is cut short.
const MAX_LISTED_FAILURES: usize = 10;

fn read(path: &Path) -> Result<DataFrame> {
    read_csv(path).with_context(|| format!("reading {}", path.display()))
}

fn write(df: &DataFrame, path: &Path) -> Result<()> {
    write_csv(df, path).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

fn report_failures(failures: &[AssetFailure]) {
    if failures.is_empty() {
        return;
    }
    println!("{} asset/feature pairs failed and were left missing:", failures.len());
    for failure in failures.iter().take(MAX_LISTED_FAILURES) {
        println!("  {:12} {:20} {:14} {}", failure.symbol, failure.feature, failure.kind.to_string(), failure.reason);
    }
    if failures.len() > MAX_LISTED_FAILURES {
        println!("  ... and {} more", failures.len() - MAX_LISTED_FAILURES);
    }
}

/// Γ as a frame: | factor | characteristic... |.
fn gamma_frame(gamma: &LoadingMatrix) -> Result<DataFrame> {
    let mut columns = vec![Column::new(
        "factor".into(),
        gamma.factors().iter().map(|f| f.as_str()).collect::<Vec<_>>(),
    )];
    for (l, name) in gamma.characteristics().iter().enumerate() {
        columns.push(Column::new(name.as_str().into(), gamma.gamma().column(l).to_vec()));
    }
    Ok(DataFrame::new(columns)?)
}

/// One row per nested specification: | spec | n_factors | r_squared | n_assets | n_obs | error |.
fn static_summary(fits: &[NestedFit]) -> Result<DataFrame> {
    fn ok(fit: &NestedFit) -> Option<&StaticFit> {
        fit.outcome.as_ref().ok()
    }
    Ok(df! {
        "spec" => fits.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        "n_factors" => fits.iter().map(|f| f.factors.len() as u32).collect::<Vec<_>>(),
        "r_squared" => fits.iter().map(|f| ok(f).map(|s| s.r_squared)).collect::<Vec<_>>(),
        "n_assets" => fits.iter().map(|f| ok(f).map(|s| s.n_assets as u32)).collect::<Vec<_>>(),
        "n_obs" => fits.iter().map(|f| ok(f).map(|s| s.n_obs as u32)).collect::<Vec<_>>(),
        "error" => fits
            .iter()
            .map(|f| f.outcome.as_ref().err().map(ToString::to_string))
            .collect::<Vec<_>>(),
    }?)
}

fn print_static(fits: &[NestedFit]) {
    println!("\nStatic zero-intercept regressions");
    println!("{}", "-".repeat(60));
    println!("{:6} {:>10} {:>8} {:>10}  factors", "spec", "R²", "assets", "rows");
    for fit in fits {
        let factors: Vec<&str> = fit.factors.iter().map(|f| f.as_str()).collect();
        match &fit.outcome {
            Ok(s) => println!(
                "{:6} {:>10.4} {:>8} {:>10}  {}",
                fit.name,
                s.r_squared,
                s.n_assets,
                s.n_obs,
                factors.join(",")
            ),
            Err(e) => println!(
                "{:6} {:>10} {:>8} {:>10}  {} ({e})",
                fit.name,
                "-",
                "-",
                "-",
                factors.join(",")
            ),
        }
    }
    println!();
}

fn print_dynamic(fit: &DynamicFit) {
    println!("\nDynamic regression: R² = {:.4} ({} assets, {} rows)", fit.r_squared, fit.n_assets, fit.n_obs);
    println!("{}", "-".repeat(60));
    print!("{:8}", "Γ");
    for name in fit.gamma.characteristics() {
        print!(" {name:>12}");
    }
    println!();
    for (k, factor) in fit.gamma.factors().iter().enumerate() {
        print!("{:8}", factor.as_str());
        for value in fit.gamma.gamma().row(k) {
            print!(" {value:>12.4}");
        }
        println!();
    }
    println!();
}

fn write_ipca(panel: &IpcaPanel, path: &Path, rates: Option<&Path>) -> Result<()> {
    write(panel.frame(), path)?;
    if let Some(path) = rates {
        write(&panel.observation_rates()?, path)?;
    }
    println!(
        "Instrumented panel: {} rows, {} assets, {} periods, {} characteristics",
        panel.n_obs(),
        panel.index().n_assets(),
        panel.index().n_periods(),
        panel.characteristics().len()
    );
    Ok(())
}

pub(crate) fn returns(pipeline: &Pipeline, input: &Path, risk_free: &Path, output: &Path) -> Result<()> {
    let run = pipeline.returns(&read(input)?, &read(risk_free)?)?;
    report_failures(&run.failures);
    write(&run.panel, output)
}

pub(crate) fn features(pipeline: &Pipeline, input: &Path, output: &Path) -> Result<()> {
    let run = pipeline.features(&read(input)?)?;
    report_failures(&run.failures);
    write(&run.panel, output)
}

pub(crate) fn factors(pipeline: &Pipeline, input: &Path, output: &Path) -> Result<()> {
    let table = pipeline.factors(&read(input)?)?;
    println!("{} factors over {} dates, {} complete", table.n_factors(), table.len(), table.complete().len());
    write(&factor_table_to_frame(&table)?, output)
}

pub(crate) fn static_models(
    pipeline: &Pipeline,
    input: &Path,
    factors: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let table = factor_table_from_frame(&read(factors)?)?;
    let fits = pipeline.static_models(&read(input)?, &table);
    print_static(&fits);

    if let Some(path) = output {
        let full = fits
            .last()
            .context("no factors configured for the static regression")?
            .outcome
            .as_ref()
            .map_err(|e| anyhow::anyhow!("full specification failed: {e}"))?;
        write(&full.beta_frame()?, path)?;
    }
    Ok(())
}

pub(crate) fn dynamic_model(
    pipeline: &Pipeline,
    input: &Path,
    factors: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let table = factor_table_from_frame(&read(factors)?)?;
    let fit = pipeline.dynamic_model(&read(input)?, &table)?;
    print_dynamic(&fit);
    if let Some(path) = output {
        write(&fit.panel, path)?;
    }
    Ok(())
}

pub(crate) fn ipca_panel(pipeline: &Pipeline, input: &Path, output: &Path) -> Result<()> {
    let panel = pipeline.ipca_panel(&read(input)?)?;
    write_ipca(&panel, output, None)
}

pub(crate) fn run_all(pipeline: &Pipeline, input: &Path, risk_free: &Path, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let out = pipeline.run(&read(input)?, &read(risk_free)?)?;

    report_failures(&out.failures);
    write(&out.returns, &output_dir.join("returns.csv"))?;
    write(&out.features, &output_dir.join("features.csv"))?;
    write(&factor_table_to_frame(&out.factors)?, &output_dir.join("factors.csv"))?;

    print_static(&out.static_fits);
    write(&static_summary(&out.static_fits)?, &output_dir.join("static_r2.csv"))?;
    if let Some(Ok(full)) = out.static_fits.last().map(|f| &f.outcome) {
        write(&full.beta_frame()?, &output_dir.join("static_betas.csv"))?;
    }

    match &out.dynamic {
        Ok(fit) => {
            print_dynamic(fit);
            write(&fit.panel, &output_dir.join("dynamic_panel.csv"))?;
            write(&gamma_frame(&fit.gamma)?, &output_dir.join("dynamic_gamma.csv"))?;
        }
        Err(e) => println!("Dynamic regression skipped: {e}"),
    }

    match &out.ipca {
        Ok(panel) => write_ipca(
            panel,
            &output_dir.join("ipca_panel.csv"),
            Some(&output_dir.join("ipca_obs_rates.csv")),
        )?,
        Err(e) => println!("Instrumented panel skipped: {e}"),
    }
    Ok(())
}
