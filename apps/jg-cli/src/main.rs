use clap::{Parser, Subcommand};
use jg_app::{AppResult, Controller, ControllerConfig, FsmState};
use jg_controls::{NullDisplay, PortWriter, ValveBank};
use jg_core::{Clock, Fault, ManualClock};
use jg_program::FAILSAFE_NAME;
use jg_upload::{NoiseParams, generate, load_yaml};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, trace};

#[derive(Parser)]
#[command(name = "jg-cli")]
#[command(about = "Jetting grid CLI - encode and simulate valve programs", long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a program file and print a summary
    Check {
        /// Path to the program YAML file
        program_path: PathBuf,
    },
    /// Encode a program into the upload byte stream
    Encode {
        /// Path to the program YAML file
        program_path: PathBuf,
        /// Output file (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate a program from coherent noise
    Generate {
        /// Generator parameters YAML file (optional, defaults apply)
        #[arg(long)]
        params: Option<PathBuf>,
        /// Output program YAML file (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload a program into a simulated controller and play it
    Simulate {
        /// Path to the program YAML file
        program_path: PathBuf,
        /// Playback time after the upload [ms]
        #[arg(long)]
        duration_ms: u32,
        /// Loop period [ms]
        #[arg(long, default_value_t = 1)]
        tick_ms: u32,
        /// Controller config YAML file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Check { program_path } => cmd_check(&program_path),
        Commands::Encode {
            program_path,
            output,
        } => cmd_encode(&program_path, output.as_deref()),
        Commands::Generate { params, output } => cmd_generate(params.as_deref(), output.as_deref()),
        Commands::Simulate {
            program_path,
            duration_ms,
            tick_ms,
            config,
        } => cmd_simulate(&program_path, duration_ms, tick_ms, config.as_deref()),
    }
}

fn cmd_check(program_path: &Path) -> AppResult<()> {
    println!("Checking program: {}", program_path.display());
    let program = load_yaml(program_path)?;
    let max_points = program
        .lines
        .iter()
        .map(|l| l.points.len())
        .max()
        .unwrap_or(0);

    println!("✓ Program is valid");
    println!("  Name: {}", program.name);
    println!("  Lines: {}", program.lines.len());
    println!("  Cycle duration: {} ms", program.total_duration_ms());
    println!("  Most points on a line: {}", max_points);
    Ok(())
}

fn cmd_encode(program_path: &Path, output: Option<&Path>) -> AppResult<()> {
    let program = load_yaml(program_path)?;
    let bytes = program.encode_upload()?;

    match output {
        Some(path) => {
            std::fs::write(path, &bytes)?;
            eprintln!("✓ Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn cmd_generate(params_path: Option<&Path>, output: Option<&Path>) -> AppResult<()> {
    let params = match params_path {
        Some(path) => NoiseParams::load_yaml(path)?,
        None => NoiseParams::default(),
    };
    let program = generate(&params)?;
    let yaml = program.to_yaml_string()?;

    match output {
        Some(path) => {
            std::fs::write(path, &yaml)?;
            eprintln!(
                "✓ Wrote {} lines ({} ms) to {}",
                program.lines.len(),
                program.total_duration_ms(),
                path.display()
            );
        }
        None => print!("{yaml}"),
    }
    Ok(())
}

/// Port expander stand-in.
struct SimPort;

impl PortWriter for SimPort {
    fn write_port(&mut self, channel: u8, mask: u16) {
        trace!(channel, mask, "port write");
    }
}

type SimController = Controller<ValveBank<SimPort>, NullDisplay, fn(&Fault)>;

fn report_fault(fault: &Fault) {
    eprintln!("✗ {fault}");
}

fn cmd_simulate(
    program_path: &Path,
    duration_ms: u32,
    tick_ms: u32,
    config_path: Option<&Path>,
) -> AppResult<()> {
    let program = load_yaml(program_path)?;
    let config = match config_path {
        Some(path) => ControllerConfig::load_yaml(path)?,
        None => ControllerConfig::default(),
    };
    let tick_ms = tick_ms.max(1);
    let upload_deadline_ms = config.upload_timeout_ms.saturating_add(1000);

    println!("Simulating program: {}", program.name);
    let mut controller: SimController = Controller::new(
        config,
        ValveBank::new(SimPort),
        NullDisplay,
        report_fault as fn(&Fault),
        0,
    )?;
    let mut sim = Simulation {
        clock: ManualClock::new(0),
        tick_ms,
        open: Vec::new(),
        pump_enable: false,
    };

    // Upload
    controller.feed(&program.encode_upload()?);
    sim.run_until(&mut controller, upload_deadline_ms, |c| {
        c.state() == FsmState::Uploading
    });
    sim.run_until(&mut controller, upload_deadline_ms, |c| {
        c.state() != FsmState::Uploading
    });
    if controller.store().name() == FAILSAFE_NAME {
        println!("✗ Upload did not complete, running {}", controller.store().name());
    } else {
        println!(
            "✓ Uploaded {} lines in {} ms",
            controller.store().line_count(),
            sim.clock.now_ms()
        );
    }

    // Playback
    controller.feed(b"play\n");
    let end = sim.clock.now_ms().saturating_add(duration_ms);
    sim.run_until(&mut controller, end, |c| c.state() == FsmState::Halted);

    if let Some(fault) = controller.fault() {
        println!("✗ Halted at {} ms: {}", sim.clock.now_ms(), fault);
    } else {
        println!("✓ Played {} ms, final line {}", duration_ms, controller.position());
    }
    Ok(())
}

struct Simulation {
    clock: ManualClock,
    tick_ms: u32,
    open: Vec<u8>,
    pump_enable: bool,
}

impl Simulation {
    /// Tick until `until_ms` or until `done` holds, printing replies, valve
    /// changes and pump enable transitions.
    fn run_until<F>(&mut self, controller: &mut SimController, until_ms: u32, done: F)
    where
        F: Fn(&SimController) -> bool,
    {
        while self.clock.now_ms() < until_ms {
            self.clock.advance(self.tick_ms);
            let now = self.clock.now_ms();
            let out = controller.tick(now);

            for reply in controller.take_replies() {
                println!("  [{:>7} ms] < {}", now, reply);
            }

            let open: Vec<u8> = controller
                .valves()
                .open_valves()
                .map(|v| v.number())
                .collect();
            if open != self.open {
                println!(
                    "  [{:>7} ms] line {:>4}: {} valve(s) open {}",
                    now,
                    controller.position(),
                    open.len(),
                    format_valves(&open)
                );
                self.open = open;
            }

            if out.pump_enable != self.pump_enable {
                let word = if out.pump_enable { "enabled" } else { "disabled" };
                println!("  [{:>7} ms] pump {}", now, word);
                self.pump_enable = out.pump_enable;
            }

            if done(controller) {
                break;
            }
        }
    }
}

fn format_valves(valves: &[u8]) -> String {
    const SHOWN: usize = 16;
    let mut text = valves
        .iter()
        .take(SHOWN)
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    if valves.len() > SHOWN {
        text.push_str(" ...");
    }
    format!("[{text}]")
}
