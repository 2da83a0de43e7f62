mod logger;

use std::process;

use anyhow::ensure;
use clap::{ArgAction, Parser};
use gavl::{AvlTree, Comparator, FromSign};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Values closer than this compare as equal.
const EPSILON: f64 = 1e-9;

/// Fills an AVL tree with random doubles, then shrinks and refills it, checking the tree's
/// shape after every phase.
#[derive(Debug, Parser)]
#[clap(version)]
struct Demo {
    /// Generate 2^k - 1 values
    #[clap(short = 'k', long, default_value_t = 4)]
    exponent: u32,
    /// Seed for the value generator; random when omitted
    #[clap(long, env = "GAVL_SEED")]
    seed: Option<u64>,
    /// Lower end of the value range (inclusive)
    #[clap(long, default_value_t = 0.0)]
    min: f64,
    /// Upper end of the value range (exclusive)
    #[clap(long, default_value_t = 100.0)]
    max: f64,
    /// Enables verbose logging
    #[clap(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn compare_approx(a: &f64, b: &f64) -> i32 {
    if (a - b).abs() < EPSILON {
        0
    } else if a < b {
        -1
    } else {
        1
    }
}

fn main() {
    if let Err(err) = run() {
        log::error!("{:?}", err);
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let demo = Demo::parse();
    logger::init(demo.verbose);

    ensure!(
        (1..=24).contains(&demo.exponent),
        "exponent must lie in 1..=24, got {}",
        demo.exponent
    );
    ensure!(
        demo.min < demo.max,
        "empty value range {}..{}",
        demo.min,
        demo.max
    );

    let seed = demo.seed.unwrap_or_else(|| rand::rng().random());
    log::info!("generating {} values with seed {seed}", (1usize << demo.exponent) - 1);

    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let values: Vec<f64> = (0..(1usize << demo.exponent) - 1)
        .map(|_| rng.random_range(demo.min..demo.max))
        .collect();

    let mut tree = AvlTree::with_comparator(FromSign(compare_approx));

    for &value in &values {
        if !tree.insert(value) {
            log::debug!("{value} is already present");
        }
        ensure!(tree.contains(&value), "{value} missing right after insertion");
    }
    report("filled", &tree)?;

    let half = values.len() / 2;
    for value in &values[..half] {
        tree.remove(value);
        ensure!(!tree.contains(value), "{value} still present after removal");
    }
    report("halved", &tree)?;

    tree.extend(values.iter().copied());
    ensure!(
        values.iter().all(|value| tree.contains(value)),
        "refilled tree is missing values"
    );
    report("refilled", &tree)?;

    Ok(())
}

fn report<C>(phase: &str, tree: &AvlTree<f64, C>) -> anyhow::Result<()>
where
    C: Comparator<f64>,
{
    let values: Vec<String> = tree.iter().map(|value| format!("{value:.4}")).collect();
    let (lower, upper) = tree.height_bounds();
    let height = tree.height();

    println!("{phase}: [{}]", values.join(", "));
    println!(
        "{phase}: {} elements, height {height}, bounds {lower}..={upper}",
        tree.len()
    );

    ensure!(
        lower <= height && height <= upper,
        "height {height} outside of {lower}..={upper}"
    );
    tree.validate()?;

    Ok(())
}
