mod report;

use clap::Parser;
use log::{debug, info};
use report::{render_summary, JsonReport};
use std::error::Error;
use std::path::PathBuf;
use trussolve::{Fix, Solution, Solver, SolverOptions, Structure, DEFAULT_SINGULAR_TOLERANCE};

/// Solve a 2D pin-jointed truss described in a JSON file.
#[derive(Debug, Parser)]
#[command(name = "trussolve", version, about)]
struct Args {
    /// Structure file with `joints` and `members` arrays.
    input: PathBuf,

    /// Include the derivation of every equation in the output.
    #[arg(long)]
    trace: bool,

    /// Print the solution as JSON instead of a text report.
    #[arg(long)]
    json: bool,

    /// Apply every suggested fix and solve the corrected structure.
    #[arg(long)]
    apply_fixes: bool,

    /// Smallest accepted pivot once every equation is scaled to unit maximum.
    #[arg(long, default_value_t = DEFAULT_SINGULAR_TOLERANCE)]
    tolerance: f64,

    /// Show solver progress on standard error.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    // RUST_LOG still wins when it is set; --verbose only raises the default.
    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    // Read the structure in full. Parsing is all or nothing, so a broken
    // reference anywhere in the file stops here before any solving happens.
    let input = std::fs::read_to_string(&args.input)?;
    let structure = Structure::from_json(&input)?;
    info!(
        "loaded {} joints and {} members from {}",
        structure.joint_count(),
        structure.member_count(),
        args.input.display()
    );

    // Solve for the outside reaction forces from global equilibrium, then for
    // the member forces with the method of joints.
    // See: https://en.wikipedia.org/wiki/Truss#Analysis
    let solver = Solver::new(
        SolverOptions::default()
            .with_singular_tolerance(args.tolerance)
            .with_trace(args.trace),
    );
    let (structure, solution, applied) = if args.apply_fixes {
        solve_applying_fixes(&solver, structure)
    } else {
        let solution = solver.solve(&structure);
        (structure, solution, Vec::new())
    };
    debug!("finished in state {:?}", solution.state);

    // Print either a report for people or JSON for other tools. Both list the
    // fixes that were applied so the reader knows the input was changed.
    if args.json {
        let output = JsonReport {
            applied_fixes: &applied,
            solution: &solution,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", render_summary(&structure, &solution, &applied));
    }

    Ok(())
}

/// Repeatedly apply the first offered fix and solve again from scratch.
///
/// Returns the corrected structure, its solution and the fixes applied, in
/// order. Each fix removes one member, so the loop ends once nothing is left
/// to fix.
fn solve_applying_fixes(
    solver: &Solver,
    mut structure: Structure,
) -> (Structure, Solution, Vec<Fix>) {
    let mut applied = Vec::new();
    let mut solution = solver.solve(&structure);
    loop {
        let Some(fix) = solution.fixes().next() else {
            break;
        };
        info!("applying fix: {fix}");
        structure = fix.apply(&structure);
        applied.push(fix);
        solution = solver.solve(&structure);
    }
    (structure, solution, applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trussolve::{vector, SolveState, Support};

    #[test]
    fn fixes_are_applied_until_none_remain() {
        let mut structure = Structure::new();
        let a = structure.add_joint("A", vector(0.0, 0.0));
        let b = structure.add_joint("B", vector(4.0, 0.0));
        let c = structure.add_joint("C", vector(2.0, 2.0));
        structure.set_support(a, Support::PIN).expect("joint exists");
        structure.set_support(b, Support::ROLLER_Y).expect("joint exists");
        structure.add_member(a, b).expect("joints exist");
        structure.add_member(b, c).expect("joints exist");
        structure.add_member(a, c).expect("joints exist");
        let looped = structure.add_member(c, c).expect("joint exists");
        let duplicate = structure.add_member(b, a).expect("joints exist");

        let (fixed, solution, applied) = solve_applying_fixes(&Solver::default(), structure);
        assert_eq!(
            applied,
            vec![Fix::RemoveMember(looped), Fix::RemoveMember(duplicate)]
        );
        assert_eq!(fixed.member_count(), 3);
        assert_eq!(solution.state, SolveState::Solved);

        let output = serde_json::to_value(JsonReport {
            applied_fixes: &applied,
            solution: &solution,
        })
        .expect("serializable");
        assert_eq!(output["appliedFixes"][0]["id"], looped.0);
        assert_eq!(output["state"], "Solved");
    }
}
