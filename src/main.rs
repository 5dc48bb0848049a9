use clap::{Parser, Subcommand};
use qbex::bytecode;
use qbex::error::ExecError;
use qbex::executor;
use qbex::instructions::{GateClass, StandardGate, GATE_IDENTS};
use std::fs;
use std::process::ExitCode;

const QBEX_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "qbex", version = QBEX_VERSION,
    about = "qbex - quantum bytecode execution backend.\n\
             Decodes a binary instruction stream, runs it on a state-vector simulator\n\
             and samples classical measurement outcomes.",
    long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a bytecode file and prints the measurement histogram.
    Run {
        /// Bytecode file path
        program: String,
        /// Number of shots to sample
        #[arg(long, default_value_t = 1024)]
        shots: u32,
        /// Seed for deterministic execution (omit for entropy seeding)
        #[arg(long)]
        seed: Option<u64>,
        /// Print the report as json instead of a histogram
        #[arg(long)]
        json: bool,
    },
    /// Decodes a bytecode file and prints the instruction listing.
    Disasm {
        /// Bytecode file path
        program: String,
    },
    /// Prints the gate catalogue with arities and executability.
    Gates,
}

fn run(program: &str, shots: u32, seed: Option<u64>, json: bool) -> Result<(), ExecError> {
    let bytes = fs::read(program)
        .map_err(|err| ExecError::Internal(format!("cannot read {}: {}", program, err)))?;

    let report = match seed {
        Some(seed) => executor::execute_seeded(&bytes, shots, seed)?,
        None => executor::execute(&bytes, shots)?,
    };

    if json {
        // serialization of the report cannot fail, it is plain integers
        println!("{}", serde_json::to_string_pretty(&report).unwrap());
    } else {
        println!("measurements ({} shots):", report.shots);
        for entry in &report.entries {
            println!("  {:016b} : {}", entry.value, entry.count);
        }
        if report.entries.is_empty() {
            println!("  (empty)");
        }
    }
    Ok(())
}

fn disasm(program: &str) -> Result<(), ExecError> {
    let bytes = fs::read(program)
        .map_err(|err| ExecError::Internal(format!("cannot read {}: {}", program, err)))?;
    let instructions = bytecode::decode(&bytes)?;
    for instruction in &instructions {
        println!("{}", instruction);
    }
    Ok(())
}

fn gates() {
    println!("{:<8} {:>6} {:>7}  executable", "gate", "params", "targets");
    for (id, ident) in GATE_IDENTS.iter().enumerate() {
        let gate = StandardGate::from_id(id as u8).unwrap();
        let descriptor = gate.descriptor();
        println!(
            "{:<8} {:>6} {:>7}  {}",
            ident,
            descriptor.num_params,
            descriptor.num_targets,
            if descriptor.class == GateClass::Unsupported {
                "no"
            } else {
                "yes"
            }
        );
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            program,
            shots,
            seed,
            json,
        } => run(&program, shots, seed, json),
        Commands::Disasm { program } => disasm(&program),
        Commands::Gates => {
            gates();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            // the process exit code mirrors the wire error code
            ExitCode::from(err.code())
        }
    }
}
