mod ingest;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use goalplan_core::{
    optimize, CapacitySpec, Catalog, GoalSet, GoalSpec, OptimizationResult, ResultStatus,
    Scenario,
};
use goalplan_solver::{SolveOptions, Solver};

#[derive(Parser)]
#[command(name = "goalplan")]
#[command(about = "Goal-programming supplier allocation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a supplier CSV file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
    /// Allocate purchases across suppliers for one yield scenario
    Solve {
        /// Supplier CSV file
        file: PathBuf,
        /// Total demand to satisfy
        #[arg(long)]
        demand: f64,
        /// Goal as NAME=WEIGHT:TARGET[:METRIC]; repeatable
        #[arg(long = "goal", required = true)]
        goals: Vec<String>,
        /// Yield scenario (average, high, low)
        #[arg(long, default_value = "average")]
        scenario: String,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Give up on the solve after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Run all three yield scenarios with the same configuration
    Scenarios {
        /// Supplier CSV file
        file: PathBuf,
        /// Total demand to satisfy
        #[arg(long)]
        demand: f64,
        /// Goal as NAME=WEIGHT:TARGET[:METRIC]; repeatable
        #[arg(long = "goal", required = true)]
        goals: Vec<String>,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Give up on each solve after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { file } => {
            let catalog = load_catalog(&file);
            let mut metrics: Vec<&str> = Vec::new();
            let mut derived = 0;
            for record in catalog.records() {
                for name in record.metrics.keys() {
                    if !metrics.contains(&name.as_str()) {
                        metrics.push(name);
                    }
                }
                if matches!(record.capacity, CapacitySpec::Derived { .. }) {
                    derived += 1;
                }
            }
            println!("✓ {} is valid", file.display());
            println!("  {} suppliers", catalog.len());
            println!("  {} metrics ({})", metrics.len(), metrics.join(", "));
            println!("  {} scenario-derived capacities", derived);
        }
        Commands::Solve {
            file,
            demand,
            goals,
            scenario,
            format,
            timeout_secs,
        } => {
            let catalog = load_catalog(&file);
            let goal_set = build_goal_set(&goals);
            let scenario = parse_scenario(&scenario);
            let result = run(&catalog, demand, &goal_set, scenario, timeout_secs);

            if format == "json" {
                print_json(&result);
            } else {
                print_result(&goal_set, &result);
            }
            if !result.is_optimal() {
                std::process::exit(1);
            }
        }
        Commands::Scenarios {
            file,
            demand,
            goals,
            format,
            timeout_secs,
        } => {
            let catalog = load_catalog(&file);
            let goal_set = build_goal_set(&goals);

            if format == "json" {
                let mut results = BTreeMap::new();
                for scenario in Scenario::ALL {
                    results.insert(
                        scenario.name(),
                        run(&catalog, demand, &goal_set, scenario, timeout_secs),
                    );
                }
                print_json(&results);
            } else {
                for scenario in Scenario::ALL {
                    let result = run(&catalog, demand, &goal_set, scenario, timeout_secs);
                    println!("=== {} yield ===", scenario);
                    print_result(&goal_set, &result);
                    println!();
                }
            }
        }
    }
}

fn load_catalog(file: &Path) -> Catalog {
    match ingest::read_catalog(file) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error reading {}: {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn build_goal_set(specs: &[String]) -> GoalSet {
    let mut goals = Vec::new();
    for spec in specs {
        match parse_goal(spec) {
            Ok(goal) => goals.push(goal),
            Err(e) => {
                eprintln!("Invalid --goal {}: {}", spec, e);
                std::process::exit(1);
            }
        }
    }
    match GoalSet::build(goals) {
        Ok(goal_set) => goal_set,
        Err(e) => {
            eprintln!("Invalid goal set: {}", e);
            std::process::exit(1);
        }
    }
}

fn parse_scenario(name: &str) -> Scenario {
    match name.parse() {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Parses `NAME=WEIGHT:TARGET[:METRIC]`, e.g. `cost=1:50000` or
/// `water=0.5:120000:water_per_bag`.
fn parse_goal(spec: &str) -> Result<GoalSpec, String> {
    let (name, rest) = spec
        .split_once('=')
        .ok_or_else(|| "expected NAME=WEIGHT:TARGET[:METRIC]".to_string())?;
    let mut parts = rest.splitn(3, ':');
    let weight: f64 = parts
        .next()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| "missing weight".to_string())?
        .parse()
        .map_err(|_| "weight is not a number".to_string())?;
    let target: f64 = parts
        .next()
        .ok_or_else(|| "missing target".to_string())?
        .parse()
        .map_err(|_| "target is not a number".to_string())?;
    Ok(match parts.next() {
        Some(metric) => GoalSpec::with_metric(name, metric, weight, target),
        None => GoalSpec::new(name, weight, target),
    })
}

fn run(
    catalog: &Catalog,
    demand: f64,
    goal_set: &GoalSet,
    scenario: Scenario,
    timeout_secs: Option<u64>,
) -> OptimizationResult {
    let options = SolveOptions {
        timeout: timeout_secs.map(Duration::from_secs),
        cancel: None,
    };
    match optimize(catalog, demand, goal_set, scenario, &Solver::new(), &options) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing result: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_result(goal_set: &GoalSet, result: &OptimizationResult) {
    match result.status {
        ResultStatus::Optimal => {
            println!("Status: OPTIMAL");
            println!();
            println!("Purchase plan:");
            for line in &result.purchase {
                println!("  {:20} {:>8}", line.supplier_id, line.quantity);
            }
            println!();
            println!("Goals:");
            for goal in goal_set.goals() {
                let achieved = result.totals[&goal.name];
                let deviation = &result.deviations[&goal.name];
                println!(
                    "  {:12} target {:>10.1}   achieved {:>10.1}   over {:>8.1}   under {:>8.1}",
                    goal.name, goal.target, achieved, deviation.over, deviation.under
                );
            }
            println!();
            println!("Selected suppliers:");
            for record in &result.selected_suppliers {
                let capacity = match record.capacity {
                    CapacitySpec::Fixed(units) => format!("capacity {}", units),
                    CapacitySpec::Derived {
                        farm_size,
                        yield_per_unit_area,
                    } => format!(
                        "farm_size {}, yield_per_unit_area {}",
                        farm_size, yield_per_unit_area
                    ),
                };
                let metrics: Vec<String> = record
                    .metrics
                    .iter()
                    .map(|(name, value)| format!("{} {}", name, value))
                    .collect();
                println!("  {}: {} ({})", record.id, metrics.join(", "), capacity);
            }
        }
        ResultStatus::Infeasible => {
            println!("Status: INFEASIBLE");
            match result.reason {
                Some(goalplan_core::FailureReason::Timeout) => {
                    println!("The solver did not answer within the time limit.");
                }
                Some(goalplan_core::FailureReason::Unbounded) => {
                    println!("The problem has no finite optimal solution.");
                }
                _ => {
                    println!("No allocation satisfies all constraints.");
                }
            }
        }
    }
}
