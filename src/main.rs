use std::io::{self, Read, Write};

use anyhow::Context;

fn run<R: Read, W: Write>(input: R, mut output: W) -> anyhow::Result<()> {
    let weights = kuhn_munkres::input::read_instance(input).context("reading weight matrix")?;
    let weight = kuhn_munkres::max_weight(&weights).context("solving assignment")?;
    writeln!(output, "{weight}")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    run(io::stdin().lock(), io::stdout().lock())
}
