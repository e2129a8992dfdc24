// Long-lived coprocess computing separating weight vectors.
// Reads blank-line terminated batches of cost rows from stdin and answers
// each with the share values and the achieved margin, or `Infeasible`.

use pareto_router::cli::CliErr;
use pareto_router::separation::run_service;
use std::env;
use std::error::Error;
use std::io;

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args();
    args.next();

    let dim: usize = args.next().ok_or(CliErr("No cost dimension given"))?.parse()?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    run_service(dim, stdin.lock(), stdout.lock())?;

    Ok(())
}
