// EES Border Checkpoint Simulator - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/ees-border-sim --flights flights.json
// ```
//
// Or search the minimal desk counts for a schedule:
//
// ```console
// $ ./target/release/ees-border-sim --flights flights.json --passbox --statistic p95 --target-wait-s 600 --workers 4
// ```

use anyhow::{bail, Context};
use clap::Parser;
use ees_border_sim::flight::{Flight, StaticAirportLookup};
use ees_border_sim::simulation::{
    CapacitySolver, LoggingConfig, PassboxReport, RunReport, RunResult, Simulation,
};
use ees_border_sim::types::config::CliArgs;
use ees_border_sim::types::{OutputFormat, SimulationConfig, StationKey, StationKind, Terminal};
use serde::Serialize;
use std::fs;
use std::process;
use tracing::{error, info};

/// JSON document of a single run
#[derive(Serialize)]
struct RunOutput<'a> {
    result: &'a RunResult,
    report: &'a RunReport,
}

/// JSON document of a capacity search
#[derive(Serialize)]
struct PassboxOutput<'a> {
    passbox: &'a PassboxReport,
    report: &'a RunReport,
}

fn main() {
    // Parse CLI arguments first to check for special flags
    let args = CliArgs::parse();

    // Handle special CLI flags that don't require full initialization
    if args.print_config {
        match SimulationConfig::default().print_json() {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Failed to serialize default configuration: {}", e);
                process::exit(1);
            }
        }
    }

    // The guard flushes file logging on drop, keep it for the whole run
    let mut logging = LoggingConfig::from_cli_flags(args.verbose, args.debug);
    if args.log_json {
        logging = logging.with_json_format();
    }
    if let Some(dir) = &args.log_dir {
        logging = logging.with_file_logging(dir.as_str());
    }
    let _logging = match logging.init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    info!("Starting EES border checkpoint simulator");

    // Load configuration from CLI arguments and optional config file
    let config = match SimulationConfig::from_cli_args(args.clone()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("Configuration validation failed: {}", e);
        process::exit(1);
    }

    info!("Configuration loaded and validated successfully");

    if args.dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - simulation will not be executed.");
        print_configuration_summary(&config);
        return;
    }

    print_startup_banner(&config);

    if let Err(e) = run(&args, config) {
        error!("Simulation failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }

    info!("EES border checkpoint simulator completed successfully");
}

/// Run a single simulation or a capacity search and emit the results
fn run(args: &CliArgs, config: SimulationConfig) -> anyhow::Result<()> {
    let format = OutputFormat::from_cli(args.output_format.as_deref()).map_err(anyhow::Error::msg)?;
    let flights = load_flights(args.flights.as_deref())?;
    let until_s = args.until_min.map(|minutes| minutes * 60.0);
    let lookup = StaticAirportLookup::standard();

    let (summary, json) = if args.passbox {
        eprintln!("Searching capacities for {} flights...", flights.len());
        let passbox = CapacitySolver::new(config.clone(), &lookup)?
            .solve(&flights, until_s)
            .context("Capacity search failed")?;

        let mut solved = config.clone();
        for (station, capacity) in &passbox.capacities {
            solved.set_capacity(*station, *capacity);
        }
        let report = RunReport::build(&passbox.final_run, &solved);
        let summary = format!("{}\n{}", passbox.generate_summary_report(), report.generate_summary_report());
        let json = serde_json::to_string_pretty(&PassboxOutput { passbox: &passbox, report: &report });
        (summary, json)
    } else {
        eprintln!("Simulating {} flights...", flights.len());
        let result = Simulation::new(config.clone(), &lookup)?
            .run(&flights, until_s)
            .context("Simulation run failed")?;
        let report = RunReport::build(&result, &config);
        let json = serde_json::to_string_pretty(&RunOutput { result: &result, report: &report });
        (report.generate_summary_report(), json)
    };

    let content = match format {
        OutputFormat::Summary => summary.clone(),
        OutputFormat::Json => json.context("Failed to serialize results")?,
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &content).with_context(|| format!("Failed to write results to '{}'", path))?;
            info!("Results written to: {}", path);
            eprintln!("{}", summary);
            eprintln!("Results written to: {}", path);
        }
        None => {
            println!("{}", content);
            if format == OutputFormat::Json {
                eprintln!("{}", summary);
            }
        }
    }

    Ok(())
}

/// Read a flight schedule (JSON array of flights)
fn load_flights(path: Option<&str>) -> anyhow::Result<Vec<Flight>> {
    let Some(path) = path else {
        bail!("No flight schedule given (use --flights <FILE>)");
    };
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read flight schedule '{}'", path))?;
    let flights: Vec<Flight> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse flight schedule '{}'", path))?;

    info!(
        "Loaded {} flights ({} active) from {}",
        flights.len(),
        flights.iter().filter(|flight| flight.active).count(),
        path
    );
    Ok(flights)
}

/// Print startup banner and configuration summary
fn print_startup_banner(config: &SimulationConfig) {
    eprintln!("EES Border Checkpoint Simulator");
    eprintln!("===============================");
    eprintln!("Passenger flow and desk capacity simulation for border control");
    eprintln!();

    print_configuration_summary(config);
}

/// Print configuration summary
fn print_configuration_summary(config: &SimulationConfig) {
    eprintln!("Configuration:");
    eprintln!(
        "  Passenger Mix: Easypass {:.0}%, EU manual {:.0}%, TCN AT {:.0}%, TCN V {:.0}%",
        config.mix.easypass * 100.0,
        config.mix.eu_manual * 100.0,
        config.mix.tcn_at * 100.0,
        config.mix.tcn_v * 100.0
    );
    eprintln!("  EES Registered: {:.1}%", config.ees_registered_share * 100.0);
    for terminal in Terminal::ALL {
        eprintln!(
            "  Kiosks (SSS) {}: {}",
            terminal,
            if config.sss_enabled_at(terminal) { "enabled" } else { "disabled" }
        );
    }
    for kind in StationKind::ALL {
        let capacity = |terminal| config.capacity(StationKey::new(terminal, kind));
        eprintln!(
            "  {:<9} capacity T1 {:>3}, T2 {:>3}, mean service {:.1} s",
            kind.to_string(),
            capacity(Terminal::T1),
            capacity(Terminal::T2),
            config.station(kind).service_time.expected_s()
        );
    }
    eprintln!(
        "  Service Level: {} wait <= {:.1} min",
        config.service_level.statistic,
        config.service_level.max_wait_s / 60.0
    );
    eprintln!(
        "  Passbox: bounds {}-{}, {:?}, {} probe(s), {} worker(s)",
        config.passbox.lower_bound,
        config.passbox.upper_bound,
        config.passbox.mode,
        config.passbox.probes_per_capacity,
        config.passbox.workers
    );
    eprintln!("  Random Seed: {}", config.seed);
    eprintln!();
}
