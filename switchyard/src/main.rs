use switchyard::*;
use switchyard::input::scenario;
use switchyard::simulation::{RunStatus, SimConfig};
use log::LevelFilter;
use std::path::PathBuf;
use structopt::StructOpt;

/// Switchyard -- tick-based railway network simulation
#[derive(StructOpt, Debug)]
#[structopt(name = "switchyard")]
struct Opt {
    /// Verbose mode (-v, -vv, -vvv)
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: u8,

    /// Scenario file. The built-in diamond network is used if omitted.
    #[structopt(parse(from_os_str))]
    scenario: Option<PathBuf>,

    /// Abandon the run after this many ticks (0 for no limit)
    #[structopt(short = "t", long = "max-ticks", default_value = "10000")]
    max_ticks: u64,

    /// Output JSON history file
    #[structopt(short = "j", long = "json", parse(from_os_str))]
    json: Option<PathBuf>,

    /// Output component visit ticks to file
    #[structopt(short = "n", long = "visits", parse(from_os_str))]
    visits: Option<PathBuf>,
}

fn run(opt: &Opt) -> AppResult<bool> {
    let scenario = match opt.scenario {
        Some(ref path) => get_scenario(path)?,
        None => get_scenario_string(scenario::DEMO)?,
    };

    let config = SimConfig {
        max_ticks: if opt.max_ticks == 0 { None } else { Some(opt.max_ticks) },
    };

    let (status, sim) = evaluate_scenario(scenario, config)?;
    let report = sim.report();
    println!("{}", report);

    if let Some(ref json) = opt.json {
        use std::fs::File;
        use std::io::BufWriter;
        let file = File::create(json)?;
        let mut writer = BufWriter::new(&file);
        switchyard::output::json::json_history(&sim.network, sim.history(), &report, &mut writer)?;
    }

    if let Some(ref visits) = opt.visits {
        use std::fs::File;
        use std::io::{BufWriter, Write};
        let string = switchyard::output::history::visits(&sim.network, sim.history())?;
        let file = File::create(visits)?;
        let mut writer = BufWriter::new(&file);
        write!(writer, "{}", string)?;
    }

    match status {
        RunStatus::Completed { .. } => Ok(report.success()),
        RunStatus::TickBudgetExhausted { ticks, running } => {
            println!("Gave up after {} ticks with {} trains still running.", ticks, running);
            Ok(false)
        }
    }
}

pub fn main() {
    let opt = Opt::from_args();
    let level = match opt.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    match run(&opt) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            println!("Error:\n{}", e.as_fail());
            std::process::exit(1);
        }
    }
}
