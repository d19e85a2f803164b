use clap::{ArgAction, Parser, Subcommand};
use optlab_search::{GradientOptions, HookeJeevesOptions, ScalarOptions};
use optlab_solver::{
    AllocationDisplay, BigMBuilder, ConstraintOp, Iteration, LpProblem, PivotRule, SolutionStatus, Solver, Tableau,
    TableauDisplay, TransportProblem, TransportSolver,
};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "optlab")]
#[command(about = "Classical numerical optimization methods", long_about = None)]
struct Cli {
    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a linear program with the Big-M simplex method
    Simplex {
        /// JSON file containing an LP problem (bundled example when omitted)
        file: Option<PathBuf>,
        /// JSON file containing a raw tableau (array of rows) instead of a problem
        #[arg(long, conflicts_with = "file")]
        tableau: Option<PathBuf>,
        /// Number of decision variable columns in a raw tableau
        #[arg(long, default_value_t = 2)]
        decision: usize,
        /// Penalty constant for artificial variables
        #[arg(long, default_value_t = BigMBuilder::DEFAULT_BIG_M)]
        big_m: f64,
        /// Use Bland's anti-cycling rule
        #[arg(long)]
        bland: bool,
        /// Print every intermediate tableau
        #[arg(short, long)]
        steps: bool,
    },
    /// Solve a balanced transportation problem
    Transport {
        /// JSON file containing costs, supply, and demand (bundled example when omitted)
        file: Option<PathBuf>,
    },
    /// Minimize e^x + 1/x with the one-dimensional methods
    Scalar {
        /// Left end of the search interval
        #[arg(long, default_value_t = 0.1)]
        a: f64,
        /// Right end of the search interval
        #[arg(long, default_value_t = 1.0)]
        b: f64,
        /// Starting point for Newton's method
        #[arg(long, default_value_t = 0.5)]
        x0: f64,
        #[arg(long, default_value_t = 1e-6)]
        tol: f64,
    },
    /// Minimize e^(x^2 + y^2) + ln(4 + y^2) with pattern search and gradient descent
    Multivariate {
        /// Starting point
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, default_values_t = vec![1.0, 2.0])]
        x0: Vec<f64>,
        /// Initial step length
        #[arg(long, default_value_t = 0.5)]
        step: f64,
        #[arg(long, default_value_t = 1e-6)]
        tol: f64,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Simplex {
            file,
            tableau,
            decision,
            big_m,
            bland,
            steps,
        } => {
            let rule = if bland { PivotRule::Bland } else { PivotRule::Dantzig };
            let solver = Solver::new().with_big_m(big_m).with_rule(rule);
            match tableau {
                Some(path) => run_tableau(&solver, &path, decision, steps),
                None => {
                    let problem = match file {
                        Some(path) => parse_json(&path),
                        None => reference_lp(),
                    };
                    solve_problem(&solver, &problem, big_m, steps);
                }
            }
        }
        Commands::Transport { file } => {
            let problem = match file {
                Some(path) => parse_json(&path),
                None => reference_transport(),
            };
            solve_transport(&problem);
        }
        Commands::Scalar { a, b, x0, tol } => run_scalar(a, b, x0, tol),
        Commands::Multivariate { x0, step, tol } => run_multivariate(&x0, step, tol),
    }
}

fn init_logging(verbose: u8) {
    if verbose == 0 {
        return;
    }
    let level = match verbose {
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(path: &Path) -> T {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };
    match serde_json::from_str(&source) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error parsing {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

/// Maximize 3x1 - 2x2 subject to three mixed constraints
fn reference_lp() -> LpProblem {
    let mut problem = LpProblem::new(vec!["x1".to_string(), "x2".to_string()]);
    problem.set_objective(vec![3.0, -2.0], false);
    problem.add_constraint("c1", vec![2.0, 1.0], ConstraintOp::Le, 11.0);
    problem.add_constraint("c2", vec![-3.0, 2.0], ConstraintOp::Le, 10.0);
    problem.add_constraint("c3", vec![3.0, 4.0], ConstraintOp::Ge, 20.0);
    problem
}

fn reference_transport() -> TransportProblem {
    TransportProblem::new(
        vec![
            vec![2.0, 4.0, 5.0, 1.0],
            vec![2.0, 3.0, 9.0, 4.0],
            vec![3.0, 4.0, 22.0, 5.0],
        ],
        vec![60.0, 70.0, 20.0],
        vec![40.0, 30.0, 30.0, 50.0],
    )
}

fn print_step(step: &Iteration<'_>, headers: &[String]) {
    println!("Iteration {} ({:?}):", step.index, step.status);
    print!("{}", TableauDisplay::new(step.tableau).with_headers(headers));
    println!();
}

fn solve_problem(solver: &Solver, problem: &LpProblem, big_m: f64, steps: bool) {
    let headers = match BigMBuilder::new().with_big_m(big_m).build(problem) {
        Ok(built) => built.headers,
        Err(e) => {
            eprintln!("Invalid problem: {}", e);
            std::process::exit(1);
        }
    };

    let solution = solver.solve_with(problem, |step| {
        if steps {
            print_step(step, &headers);
        }
    });

    match solution.status {
        SolutionStatus::Optimal => {
            println!("Status: OPTIMAL");
            println!("Objective: {:.4}", solution.objective_value);
            println!("Iterations: {}", solution.iterations);
            println!();
            println!("Variables:");
            for (name, value) in problem.variables.iter().zip(&solution.values) {
                println!("  {:20} {:10.4}", name, value);
            }
        }
        SolutionStatus::Infeasible => {
            println!("Status: INFEASIBLE");
            println!("No solution exists that satisfies all constraints.");
            std::process::exit(1);
        }
        SolutionStatus::Unbounded => {
            println!("Status: UNBOUNDED");
            println!("The problem has no finite optimal solution.");
            std::process::exit(1);
        }
        SolutionStatus::Error => {
            println!("Status: ERROR");
            println!("Solver encountered an error.");
            std::process::exit(1);
        }
    }
}

fn run_tableau(solver: &Solver, path: &Path, decision: usize, steps: bool) {
    let rows: Vec<Vec<f64>> = parse_json(path);
    let tableau = match Tableau::new(rows) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Invalid tableau: {}", e);
            std::process::exit(1);
        }
    };
    let headers: Vec<String> = std::iter::once("Z".to_string())
        .chain((1..tableau.num_columns()).map(|j| format!("x{}", j)))
        .collect();

    let result = solver.run_with(tableau, decision, |step| {
        if steps {
            print_step(step, &headers);
        }
    });

    match result {
        Ok(run) => {
            println!("Final tableau:");
            print!("{}", TableauDisplay::new(&run.tableau).with_headers(&headers));
            println!();
            println!("Solution:");
            for (i, value) in run.values.iter().enumerate() {
                println!("  x{}: {:.2}", i + 1, value);
            }
            println!();
            println!("Objective value: f = {:.2}", run.objective_value);
            println!("Iterations: {}", run.iterations);
        }
        Err(failure) => {
            eprintln!("Simplex failed: {}", failure);
            eprint!("{}", TableauDisplay::new(&failure.tableau).with_headers(&headers));
            std::process::exit(1);
        }
    }
}

fn solve_transport(problem: &TransportProblem) {
    match TransportSolver::new().solve(problem) {
        Ok(solution) => {
            println!("Northwest corner plan:");
            print!("{}", AllocationDisplay::new(&solution.initial));
            println!("Cost: {}", solution.initial_cost);
            println!();
            println!("Optimal plan ({} improvement steps):", solution.iterations);
            print!("{}", AllocationDisplay::new(&solution.allocation));
            println!("Cost: {}", solution.cost);
        }
        Err(e) => {
            eprintln!("Transport error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_scalar(a: f64, b: f64, x0: f64, tol: f64) {
    let f = |x: f64| x.exp() + 1.0 / x;
    let df = |x: f64| x.exp() - 1.0 / (x * x);
    let d2f = |x: f64| x.exp() + 2.0 / (x * x * x);
    let options = ScalarOptions::default().with_tol(tol);

    let results = [
        ("Golden section", optlab_search::golden_section(f, a, b, &options)),
        ("Tangent intersection", optlab_search::tangent_intersection(f, df, a, b, &options)),
        ("Newton", optlab_search::newton(f, df, d2f, x0, &options)),
    ];

    let mut failed = false;
    for (name, result) in results {
        match result {
            Ok(min) => {
                println!("{}:", name);
                println!("  x min:      {}", min.x);
                println!("  f(x min):   {}", min.f_min);
                println!("  iterations: {}", min.iterations);
            }
            Err(e) => {
                eprintln!("{}: {}", name, e);
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
}

fn run_multivariate(x0: &[f64], step: f64, tol: f64) {
    if x0.len() != 2 {
        eprintln!("Starting point must have two coordinates, got {}", x0.len());
        std::process::exit(1);
    }

    let f = |x: &[f64]| (x[0] * x[0] + x[1] * x[1]).exp() + (4.0 + x[1] * x[1]).ln();
    let grad = |x: &[f64]| {
        let e = (x[0] * x[0] + x[1] * x[1]).exp();
        vec![2.0 * x[0] * e, 2.0 * x[1] * e + 2.0 * x[1] / (4.0 + x[1] * x[1])]
    };

    println!("Start: {:?}, f = {}", x0, f(x0));

    let hj = HookeJeevesOptions {
        step,
        tol,
        ..HookeJeevesOptions::default()
    };
    let gd = GradientOptions {
        step,
        tol,
        ..GradientOptions::default()
    };
    let results = [
        ("Hooke-Jeeves", optlab_search::hooke_jeeves(f, x0, &hj)),
        ("Gradient descent", optlab_search::gradient_descent(f, grad, x0, &gd)),
    ];

    let mut failed = false;
    for (name, result) in results {
        match result {
            Ok(min) => println!(
                "{}: minimum at {:?}, f = {}, iterations = {}",
                name, min.x, min.f_min, min.iterations
            ),
            Err(e) => {
                eprintln!("{}: {}", name, e);
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
}
