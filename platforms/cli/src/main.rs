use clap::Parser;
use dtm::{
    analyze_all, run_all, Machine, MachineError, Outcome, Program, ProgramLoader,
    ProgramManager, Report, Step, MAX_EXECUTION_STEPS,
};
use log::{debug, error, info, LevelFilter};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// The program file to execute (`.dtm` or `.json`)
    #[clap(short, long, conflicts_with = "builtin")]
    program: Option<PathBuf>,

    /// The name of a bundled program to execute
    #[clap(short, long)]
    builtin: Option<String>,

    /// List the bundled programs and exit
    #[clap(short, long)]
    list: bool,

    /// An input string; may be repeated. Defaults to the program's own inputs
    #[clap(short, long)]
    input: Vec<String>,

    /// Give up on a run after this many steps
    #[clap(short, long, default_value_t = MAX_EXECUTION_STEPS)]
    max_steps: usize,

    /// Print each step of the execution
    #[clap(short = 'd', long, conflicts_with = "json")]
    debug: bool,

    /// Analyze the program instead of running it
    #[clap(short, long)]
    check: bool,

    /// Print the run reports as JSON
    #[clap(short, long)]
    json: bool,

    /// Enable more verbose logging
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .parse_default_env()
        .init();
    info!("{} v{}", env!("CARGO_BIN_NAME"), env!("CARGO_PKG_VERSION"));

    if cli.list {
        list_programs();
        return ExitCode::SUCCESS;
    }

    let program = match load(&cli) {
        Ok(program) => program,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.check {
        return check(&program);
    }

    let inputs = if cli.input.is_empty() {
        debug!("No input given; running the program's {} input(s)", program.inputs.len());
        program.inputs.clone()
    } else {
        cli.input.clone()
    };

    let reports = if cli.debug {
        inputs
            .iter()
            .map(|input| trace(&program, input, cli.max_steps))
            .collect()
    } else {
        run_all(&program, &inputs, cli.max_steps)
    };

    if cli.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to encode reports: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    if reports.iter().all(|r| r.outcome.is_halted()) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn load(cli: &Cli) -> Result<Program, MachineError> {
    match (&cli.program, &cli.builtin) {
        (Some(path), _) => ProgramLoader::load_program(path),
        (None, Some(name)) => ProgramManager::get_program_by_name(name),
        (None, None) => Err(MachineError::ValidationError(
            "Either --program or --builtin is required".to_string(),
        )),
    }
}

fn list_programs() {
    for index in 0..ProgramManager::get_program_count() {
        if let Ok(info) = ProgramManager::get_program_info(index) {
            println!(
                "{:<20} start: {:<8} states: {:<4} rules: {:<5} inputs: {}",
                info.name, info.initial_state, info.state_count, info.rule_count, info.input_count
            );
        }
    }
}

fn check(program: &Program) -> ExitCode {
    let findings = analyze_all(program);

    if findings.is_empty() {
        println!("{}: no problems found", program.name);
        return ExitCode::SUCCESS;
    }

    for finding in findings {
        println!("{}: {}", program.name, MachineError::from(finding));
    }
    ExitCode::FAILURE
}

/// Runs one input step by step, printing every configuration along the way.
fn trace(program: &Program, input: &str, max_steps: usize) -> Report {
    let mut machine = Machine::from_program(program, input);

    let print_state = |machine: &Machine| {
        println!(
            "Step: {}, State: {}, Head: {}, Tape: [{}]",
            machine.step_count(),
            machine.state(),
            machine.head(),
            machine.tape()
        );
    };

    println!("Input: {}", input);
    print_state(&machine);

    let outcome = loop {
        if machine.halted() {
            println!("\nMachine halted.");
            break Outcome::Halted {
                steps: machine.step_count(),
            };
        }
        if machine.step_count() >= max_steps {
            println!("\nStep limit reached.");
            break Outcome::Exhausted {
                steps: machine.step_count(),
            };
        }
        match machine.step() {
            Step::Moved => print_state(&machine),
            Step::Stalled => {
                println!(
                    "\nMachine stalled: no rule for state {} reading {}.",
                    machine.state(),
                    machine.symbol()
                );
                break Outcome::Stalled {
                    steps: machine.step_count(),
                    state: machine.state().clone(),
                    symbol: machine.symbol().clone(),
                };
            }
        }
    };
    println!();

    Report {
        input: input.to_string(),
        outcome,
        state: machine.state().clone(),
        head: machine.head(),
        tape: machine.into_tape().render(),
    }
}

fn print_report(report: &Report) {
    let status = match &report.outcome {
        Outcome::Halted { steps } => format!("halted after {} steps", steps),
        Outcome::Stalled {
            steps,
            state,
            symbol,
        } => format!(
            "stalled after {} steps in state {} reading {}",
            steps, state, symbol
        ),
        Outcome::Exhausted { steps } => format!("gave up after {} steps", steps),
    };

    println!("{} -> {}", report.input, status);
    println!("  state: {}, head: {}", report.state, report.head);
    println!("  tape: {}", report.tape_string());
}
