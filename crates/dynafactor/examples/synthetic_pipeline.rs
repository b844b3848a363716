//! Example: The Full Pipeline on a Synthetic Crypto Panel
//!
//! This example walks through every stage on simulated data:
//! 1. Simulate daily OHLCV bars and a risk-free rate table
//! 2. Compute returns, the market benchmark and the rolling characteristics
//! 3. Build the market and long-short factor returns
//! 4. Fit the nested static regressions and the instrumented dynamic regression
//! 5. Prepare the instrumented principal components panel
//!
//! Run with `RUST_LOG=debug` to see the per-stage logs.

use dynafactor::{Pipeline, PipelineConfig};
use polars::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};
use tracing_subscriber::EnvFilter;

const N_ASSETS: usize = 40;
const N_DAYS: usize = 365;
/// 2023-01-01 as days since the Unix epoch.
const START: i32 = 19_358;

fn simulate(rng: &mut StdRng) -> Result<(DataFrame, DataFrame), Box<dyn std::error::Error>> {
    let market = Normal::new(0.0005, 0.03)?;
    let intraday = Normal::new(0.0, 0.015)?;
    let market_path: Vec<f64> = (0..N_DAYS).map(|_| market.sample(rng)).collect();

    let mut symbol = Vec::new();
    let mut date = Vec::new();
    let (mut open, mut high, mut low, mut close) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
    let (mut volume, mut market_cap) = (Vec::new(), Vec::new());

    for i in 0..N_ASSETS {
        let beta = rng.gen_range(0.5..1.8);
        let idio = Normal::new(0.0, rng.gen_range(0.01..0.06))?;
        let supply = 10f64.powf(rng.gen_range(5.0..9.0));
        let turnover = rng.gen_range(0.005..0.05);
        // listings are staggered so the cross-section grows over time
        let listed = if i % 5 == 0 { rng.gen_range(0..N_DAYS / 3) } else { 0 };

        let mut prev = rng.gen_range(0.5..200.0);
        for (t, m) in market_path.iter().enumerate().skip(listed) {
            let o = prev * f64::exp(intraday.sample(rng) / 3.0);
            let c = prev * f64::exp(beta * m + idio.sample(rng));
            let h = o.max(c) * f64::exp(intraday.sample(rng).abs());
            let l = o.min(c) * f64::exp(-intraday.sample(rng).abs());
            // roughly one day in fifty without trades
            let v = if rng.gen_bool(0.02) { 0.0 } else { c * supply * turnover * rng.gen_range(0.3..3.0) };

            symbol.push(format!("COIN{i:02}"));
            date.push(START + t as i32);
            open.push(o);
            high.push(h);
            low.push(l);
            close.push(c);
            volume.push(v);
            market_cap.push(c * supply);
            prev = c;
        }
    }

    let panel = df! {
        "symbol" => symbol,
        "date" => date,
        "open" => open,
        "high" => high,
        "low" => low,
        "close" => close,
        "volume" => volume,
        "market_cap" => market_cap,
    }?
    .lazy()
    .with_column(col("date").cast(DataType::Date))
    .collect()?;

    // weekday-only rate fixings, forward-filled over weekends by the pipeline
    let days: Vec<i32> = (-10..N_DAYS as i32).filter(|d| (d + 4).rem_euclid(7) < 5).map(|d| START + d).collect();
    let rates: Vec<f64> = days.iter().map(|d| 4.5 + 0.5 * (f64::from(d - START) / 120.0).sin()).collect();
    let risk_free = df! { "date" => days, "risk_free_annual" => rates }?
        .lazy()
        .with_column(col("date").cast(DataType::Date))
        .collect()?;

    Ok((panel, risk_free))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("=== dynafactor on a synthetic panel ===\n");

    // =========================================================================
    // SIMULATE DATA
    // =========================================================================

    let mut rng = StdRng::seed_from_u64(2024);
    let (panel, risk_free) = simulate(&mut rng)?;
    println!("Simulated {} rows for {} assets over {} days\n", panel.height(), N_ASSETS, N_DAYS);

    // =========================================================================
    // RUN EVERY STAGE
    // =========================================================================

    let pipeline = Pipeline::new(PipelineConfig::default());
    let out = pipeline.run(&panel, &risk_free)?;

    println!("Feature failures: {}", out.failures.len());
    println!(
        "Factor table: {} factors over {} dates ({} complete)\n",
        out.factors.n_factors(),
        out.factors.len(),
        out.factors.complete().len()
    );

    let means = out.factors.means();
    println!("{:<8} {:>12}", "factor", "mean daily");
    for (name, mean) in out.factors.names().iter().zip(means.iter()) {
        println!("{:<8} {:>12.6}", name.as_str(), mean);
    }

    // =========================================================================
    // STATIC REGRESSIONS
    // =========================================================================

    println!("\n{:<6} {:>10} {:>8} {:>8}", "spec", "R²", "assets", "rows");
    for nested in &out.static_fits {
        match &nested.outcome {
            Ok(fit) => println!("{:<6} {:>10.4} {:>8} {:>8}", nested.name, fit.r_squared, fit.n_assets, fit.n_obs),
            Err(e) => println!("{:<6} failed: {e}", nested.name),
        }
    }

    // =========================================================================
    // DYNAMIC REGRESSION
    // =========================================================================

    match &out.dynamic {
        Ok(fit) => {
            println!("\nDynamic R² = {:.4} over {} rows", fit.r_squared, fit.n_obs);
            print!("{:<8}", "Γ");
            for c in fit.gamma.characteristics() {
                print!(" {c:>11}");
            }
            println!();
            for (k, factor) in fit.gamma.factors().iter().enumerate() {
                print!("{:<8}", factor.as_str());
                for v in fit.gamma.gamma().row(k) {
                    print!(" {v:>11.4}");
                }
                println!();
            }
        }
        Err(e) => println!("\nDynamic regression failed: {e}"),
    }

    // =========================================================================
    // INSTRUMENTED PANEL
    // =========================================================================

    match &out.ipca {
        Ok(ipca) => {
            println!(
                "\nInstrumented panel: {} rows, {} assets, {} periods",
                ipca.n_obs(),
                ipca.index().n_assets(),
                ipca.index().n_periods()
            );
            println!("{}", ipca.observation_rates()?.head(Some(5)));
        }
        Err(e) => println!("\nInstrumented panel failed: {e}"),
    }

    Ok(())
}
