//! Scenario tests for environment dynamics, driven the way an experiment drives them:
//! one seeded generator, rotated arm blocks installed between runs.

use mabsim::{BanditKind, Dynamics, Environment, Error, Rotator};
use rand::rngs::StdRng;
use rand::SeedableRng;

const SEED: u64 = 31825;

fn configured(d: Dynamics, means: &[f64], std: f64) -> Environment {
    let mut env = Environment::new(d);
    env.configure(means.len(), means, &vec![std; means.len()])
        .unwrap();
    env
}

#[test]
fn every_variant_honors_the_common_contract() {
    let mut rng = StdRng::seed_from_u64(SEED);
    for kind in BanditKind::ALL {
        let mut env = Environment::from_kind(kind);
        let ctx = kind.is_contextual().then_some(1);

        assert!(matches!(
            env.reward(0, ctx, &mut rng),
            Err(Error::UnconfiguredEnvironment)
        ));

        env.configure(3, &[10.0, 40.0, 70.0], &[4.0; 3]).unwrap();
        for t in 0..25 {
            let r = env.reward(t % 3, ctx, &mut rng).unwrap();
            assert!(r.is_finite(), "{kind}: non-finite reward");
            assert_eq!(env.means().unwrap().len(), 3);
            assert_eq!(env.stds().unwrap().len(), 3);
        }
        assert!(matches!(
            env.reward(3, ctx, &mut rng),
            Err(Error::InvalidAction { action: 3, arm_count: 3 })
        ));
    }
}

#[test]
fn stationary_rewards_concentrate_on_arm_means() {
    let mut rng = StdRng::seed_from_u64(SEED);
    let means = [10.0, 40.0, 70.0];
    let mut env = configured(Dynamics::Stationary, &means, 4.0);
    for (a, m) in means.iter().enumerate() {
        let n = 400;
        let avg = (0..n)
            .map(|_| env.reward(a, None, &mut rng).unwrap())
            .sum::<f64>()
            / n as f64;
        assert!((avg - m).abs() < 1.5, "arm {a}: avg={avg} mean={m}");
    }
}

#[test]
fn drift_accumulates_regardless_of_chosen_arm() {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut env = configured(Dynamics::drifting(2.0).unwrap(), &[10.0, 20.0, 30.0, 40.0], 1.0);
    let mut snapshots = vec![env.means().unwrap().to_vec()];
    for _ in 0..10 {
        env.reward(0, None, &mut rng).unwrap();
        snapshots.push(env.means().unwrap().to_vec());
    }
    for w in snapshots.windows(2) {
        // Every arm moved, not only the pulled one.
        for (before, after) in w[0].iter().zip(&w[1]) {
            assert_ne!(before, after);
        }
    }
}

#[test]
fn stepwise_shift_repeats_every_change_step() {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut env = configured(Dynamics::stepwise(3).unwrap(), &[10.0, 20.0, 30.0, 40.0, 50.0], 1.0);
    for call in 1..=9u64 {
        env.reward(4, None, &mut rng).unwrap();
        let m = env.means().unwrap();
        if call < 3 {
            assert_eq!(m, &[10.0, 20.0, 30.0, 40.0, 50.0]);
        } else {
            // floor(5 / 2) = 2 arms zeroed; the rest untouched
            assert_eq!(m, &[0.0, 0.0, 30.0, 40.0, 50.0]);
        }
    }
}

#[test]
fn rotated_blocks_reset_delay_line() {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut rot = Rotator::new(vec![10.0, 40.0, 70.0], &["{max}"]).unwrap();
    let mut env = configured(Dynamics::time_delayed(3), &[0.0; 3], 1.0);

    while !rot.cycle_complete() {
        let block = rot.advance();
        env.install_means(&block.arms).unwrap();
        assert_eq!(env.means().unwrap(), block.arms.as_slice());
        // Each block starts with an empty queue: the first two rewards are 0.
        assert_eq!(env.reward(0, None, &mut rng).unwrap(), 0.0);
        assert_eq!(env.reward(0, None, &mut rng).unwrap(), 0.0);
        let r = env.reward(0, None, &mut rng).unwrap();
        assert!((r - block.arms[0]).abs() < 6.0, "r={r} arm0={}", block.arms[0]);
    }
}

#[test]
fn moving_average_tracks_running_mean_within_block() {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut env = configured(Dynamics::new(BanditKind::MovingAverage), &[10.0, 40.0, 70.0], 0.0);
    // std 0: samples equal the means, so the running mean is exact.
    assert_eq!(env.reward(0, None, &mut rng).unwrap(), 10.0);
    assert_eq!(env.reward(2, None, &mut rng).unwrap(), 40.0);
    assert_eq!(env.reward(1, None, &mut rng).unwrap(), 40.0);
    assert_eq!(env.reward(1, None, &mut rng).unwrap(), 40.0);
    assert_eq!(env.reward(0, None, &mut rng).unwrap(), 34.0);

    env.install_means(&[70.0, 10.0, 40.0]).unwrap();
    assert_eq!(env.reward(0, None, &mut rng).unwrap(), 70.0);
}

#[test]
fn three_context_shuffle_preserves_multiset() {
    let mut rng = StdRng::seed_from_u64(SEED);
    let original = [10.0, 20.0, 30.0, 40.0, 50.0];
    let mut env = configured(Dynamics::ThreeContext, &original, 1.0);
    for _ in 0..20 {
        env.reward(0, Some(2), &mut rng).unwrap();
        let mut m = env.means().unwrap().to_vec();
        m.sort_by(f64::total_cmp);
        assert_eq!(m, original.to_vec());
    }
    env.reward(0, Some(1), &mut rng).unwrap();
    assert_eq!(env.means().unwrap(), &[50.0, 40.0, 30.0, 20.0, 10.0]);
}

#[test]
fn identical_seeds_reproduce_identical_runs() {
    let run = || {
        let mut rng = StdRng::seed_from_u64(SEED);
        BanditKind::ALL
            .into_iter()
            .flat_map(|kind| {
                let mut env = Environment::from_kind(kind);
                env.configure(3, &[10.0, 40.0, 70.0], &[4.0; 3]).unwrap();
                let ctx = kind.is_contextual().then_some(2);
                (0..10)
                    .map(|t| env.reward(t % 3, ctx, &mut rng).unwrap())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}
