//! Prints a random instance in the solver's input format.
//!
//! `cargo run --example random -- [seed] [--solve]`; with `--solve` the
//! maximum weight is printed to stderr as well.

use nalgebra::DMatrix;
use rand::{rngs::StdRng, Rng, SeedableRng};

const MAX_SIZE: usize = 10;
const MAX_WEIGHT: i64 = 1000;

fn main() -> anyhow::Result<()> {
    let mut seed = None;
    let mut solve = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--solve" => solve = true,
            other => seed = Some(other.parse::<u64>()?),
        }
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let n = rng.gen_range(1..=MAX_SIZE);
    let weights = DMatrix::from_fn(n, n, |_, _| rng.gen_range(0..MAX_WEIGHT));

    println!("{n}");
    for row in weights.row_iter() {
        let line = row.iter().map(|w| format!("{w:3}")).collect::<Vec<_>>();
        println!("{}", line.join(" "));
    }

    if solve {
        eprintln!("{}", kuhn_munkres::max_weight(&weights)?);
    }
    Ok(())
}
