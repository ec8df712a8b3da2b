//! Rotation walkthrough: how arm positions and hint text move together.
//!
//! Prints each rotation block for a 3-arm and a 5-arm configuration, then plays a
//! short drifting-bandit experiment with a chooser that follows the hint.
//!
//! Run:
//! `RUST_LOG=mabsim=debug cargo run --example rotation_walkthrough`

use mabsim::{run_experiment, BanditKind, ExperimentConfig, Rotator, TrialView};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

fn show(arms: Vec<f64>, hints: &[&str]) -> mabsim::Result<()> {
    let mut rot = Rotator::new(arms, hints)?;
    println!("original arms: {:?}", rot.arms());
    for block in rot.remaining_cycle() {
        println!("  step {}: arms={:?}", block.step_index, block.arms);
        for h in &block.hints {
            println!("    hint: {h}");
        }
    }
    Ok(())
}

fn main() -> mabsim::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    show(vec![10.0, 40.0, 70.0], &["{min}, {mid}, {max}"])?;
    show(
        vec![10.0, 20.0, 40.0, 30.0, 70.0],
        &["{min2}, {min1} {mid}, {max1}, {max2}"],
    )?;

    let cfg = ExperimentConfig::from_json_str(
        r#"{
            "bandit": "drifting",
            "narms": 3,
            "arm_means": [[10, 40, 70]],
            "arm_stds": [8, 8, 8],
            "hints": ["no hint", "A previous player did best with {max}."],
            "ntrials": 1,
            "n_iters": 8,
            "drift_rate": 1.5
        }"#,
    )?;

    let mut follow = |v: &TrialView<'_>| -> Option<usize> {
        let rest = v.hint.split("arm ").nth(1)?;
        rest.trim_end_matches('.').parse().ok()
    };
    let mut rng = StdRng::seed_from_u64(31825);
    let records = run_experiment(&cfg, &mut follow, &mut rng)?;

    println!("\n{} bandit, {} records", BanditKind::Drifting, records.len());
    for r in &records {
        let final_prop = r.optimal_proportion().last().copied().unwrap_or(0.0);
        println!(
            "  arms={:?} hint={:?} optimal={:.2} history={:?}",
            r.arms, r.hint, final_prop, r.history
        );
    }
    Ok(())
}
