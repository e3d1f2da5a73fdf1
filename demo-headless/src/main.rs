use clap::Parser;
use flood_evac_core::{render_ascii, HazardSeeding, Simulation, SimulationConfig, TickMetrics};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Flood evacuation demo with configurable parameters
#[derive(Parser, Debug)]
#[command(name = "flood-evac-demo")]
#[command(about = "Agent-based flood evacuation simulation", long_about = None)]
struct Args {
    /// Floorplan file (W wall, F furniture, D door, E exit, S spawn, _ empty)
    #[arg(short, long, default_value = "demo-headless/floorplans/floorplan_default.txt")]
    floor_plan_file: PathBuf,

    /// Number of humans to spawn
    #[arg(short = 'n', long, default_value_t = 10)]
    human_count: usize,

    /// Share of humans that collaborate (0-100)
    #[arg(short, long, default_value_t = 50.0)]
    collaboration_percentage: f64,

    /// Flood spread intensity per tick (0-1)
    #[arg(long, default_value_t = 0.1)]
    fire_probability: f64,

    /// Spawn on floorplan S markers instead of random cells
    #[arg(long)]
    fixed_spawn: bool,

    /// Number of random initial flood cells
    #[arg(long, default_value_t = 1)]
    flood_seeds: usize,

    /// Show every human's field of view in rendered frames
    #[arg(long)]
    visualise_vision: bool,

    /// Write the metrics history (JSON and CSV) to the output directory
    #[arg(long)]
    save_plots: bool,

    /// RNG seed (drawn and printed when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Stop after this many ticks even if people remain
    #[arg(short, long, default_value_t = 500)]
    max_ticks: u64,

    /// Report interval in ticks
    #[arg(short, long, default_value_t = 5)]
    report_interval: u64,

    /// Print an ASCII frame at every report
    #[arg(long)]
    render: bool,

    /// Directory for saved metrics
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> flood_evac_core::Result<()> {
    println!("=== Flood Evacuation Demo ===\n");

    let config = SimulationConfig {
        floor_plan_file: args.floor_plan_file.clone(),
        human_count: args.human_count,
        collaboration_percentage: args.collaboration_percentage,
        fire_probability: args.fire_probability,
        random_spawn: !args.fixed_spawn,
        visualise_vision: args.visualise_vision,
        save_plots: args.save_plots,
        seed: args.seed,
        hazard: HazardSeeding::Random {
            count: args.flood_seeds,
        },
        ..Default::default()
    };

    let mut sim = Simulation::from_config(config)?;
    let (rows, cols) = (sim.world().grid().rows(), sim.world().grid().cols());
    println!(
        "Floorplan {} ({}x{}), {} humans, {:.0}% collaborating, intensity {:.2}",
        args.floor_plan_file.display(),
        rows,
        cols,
        args.human_count,
        args.collaboration_percentage,
        args.fire_probability
    );
    println!("Seed: {}\n", sim.seed());

    if args.render {
        println!("{}", render_ascii(rows, cols, &sim.portray()));
    }

    println!(" Tick | Alive | Escaped | Dead | Normal | Panic | Incap | Carrying | Flooded");
    println!("------|-------|---------|------|--------|-------|-------|----------|--------");
    if let Some(row) = sim.metrics().latest() {
        print_row(row);
    }

    let interval = args.report_interval.max(1);
    while sim.world().tick() < args.max_ticks && !sim.is_finished() {
        let report = sim.step();
        if report.tick % interval == 0 || sim.is_finished() {
            if let Some(row) = sim.metrics().latest() {
                print_row(row);
            }
            if args.render {
                println!("{}", render_ascii(rows, cols, &sim.portray()));
            }
        }
    }

    let metrics = sim.metrics();
    let (verbal, physical, morale) = metrics.collaboration_totals();
    println!("\n=== Simulation Complete ===");
    println!("Ticks run: {}", sim.world().tick());
    if let Some(row) = metrics.latest() {
        println!("Escaped: {}, Dead: {}, Still inside: {}", row.escaped, row.dead, row.alive);
    }
    println!("Survival rate: {:.1}%", metrics.survival_rate() * 100.0);
    println!("Collaboration: {verbal} verbal, {physical} physical, {morale} morale");

    if sim.config().save_plots {
        fs::create_dir_all(&args.output_dir)?;
        let json = args.output_dir.join("metrics.json");
        let csv = args.output_dir.join("metrics.csv");
        metrics.write_json(&json)?;
        fs::write(&csv, metrics.to_csv())?;
        println!("Metrics written to {} and {}", json.display(), csv.display());
    }
    Ok(())
}

fn print_row(row: &TickMetrics) {
    println!(
        "{:5} | {:5} | {:7} | {:4} | {:6} | {:5} | {:5} | {:8} | {:7}",
        row.tick,
        row.alive,
        row.escaped,
        row.dead,
        row.normal,
        row.panic,
        row.incapacitated,
        row.carrying,
        row.flooded_cells
    );
}
