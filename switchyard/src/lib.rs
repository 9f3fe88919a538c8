extern crate smallvec;
extern crate regex;
extern crate failure;
#[macro_use] extern crate failure_derive;

pub mod input;
pub mod output;
pub mod railway;
pub mod simulation;


use std::path::Path;
use input::scenario::Scenario;
use simulation::{RunStatus, SimConfig, Simulation};

pub type AppResult<T> = Result<T, failure::Error>;

pub fn read_file(f: &Path) -> AppResult<String> {
    use std::fs::File;
    use std::io::prelude::*;
    use std::io::BufReader;

    let file = File::open(f)?;
    let mut file = BufReader::new(&file);
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

pub fn get_scenario(f: &Path) -> AppResult<Scenario> {
    let contents = read_file(f)?;
    get_scenario_string(&contents)
}

pub fn get_scenario_string(s: &str) -> AppResult<Scenario> {
    use input::scenario::{parse_scenario, build_scenario};
    let statements = parse_scenario(s)?;
    let scenario = build_scenario(&statements)?;
    Ok(scenario)
}

/// Places the scenario's trains and runs the simulation to completion
/// (or until the tick budget runs out).
pub fn evaluate_scenario(scenario: Scenario, config: SimConfig) -> AppResult<(RunStatus, Simulation)> {
    let mut sim = scenario.into_simulation(config)?;
    let status = sim.run();
    Ok((status, sim))
}
