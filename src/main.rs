use rbsim::{bench_collision, bench_forces};
use rbsim::{Scenario, ScenarioConfig};

use anyhow::Result;
use clap::Parser;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short, default_value = "drop.yaml")]
    file_name: String,

    /// Wall-clock seconds to let the simulation run before stopping
    #[arg(short, long, default_value_t = 5.0)]
    duration: f64,

    /// Run the scaling benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(file_name);
    let file = File::open(&config_path)?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)?;

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.bench {
        bench_collision();
        bench_forces();
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let scenario = Scenario::build_scenario(scenario_cfg);
    let mut sim = scenario.into_simulation()?;

    sim.start()?;
    std::thread::sleep(Duration::from_secs_f64(args.duration));
    sim.finish()?;

    println!("t = {:.3}", sim.time()?);
    let positions = sim.positions()?;
    let velocities = sim.velocities()?;
    for (i, (x, v)) in positions.iter().zip(velocities.iter()).enumerate() {
        println!(
            "body {i}: x = [{:8.3}, {:8.3}, {:8.3}], v = [{:8.3}, {:8.3}, {:8.3}]",
            x.x, x.y, x.z, v.x, v.y, v.z
        );
    }

    Ok(())
}
