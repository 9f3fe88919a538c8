use regex::Regex;
use std::collections::HashMap;
use log::debug;

use crate::railway::network::{ComponentId, Direction, Length, Network, NetworkError, SignalState};
use crate::simulation::{SimConfig, Simulation, SimulationError};

pub type NameMap = HashMap<String, ComponentId>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Segment(String, Length),
    Attach(String, Length, String, Direction), // new segment, length, existing segment, side of existing
    Connect(String, Direction, String, Direction),
    Terminator(String, String, Direction), // terminator name, segment, side
    Signal(String, Direction, Option<SignalState>),
    Train(String, String, Direction, String), // train name, start segment, direction, destination
}

#[derive(Debug, Fail)]
pub enum ParseError {
    #[fail(display = "error in regular expression: {}", _0)]
    RegexError(String),
    #[fail(display = "error converting number on line {}", _0)]
    NumberError(usize),
    #[fail(display = "unrecognized statement on line {}: {}", _0, _1)]
    Unrecognized(usize, String),
}

#[derive(Debug, Fail)]
pub enum ScenarioError {
    #[fail(display = "unknown name \"{}\"", _0)]
    UnknownName(String),
    #[fail(display = "name \"{}\" is already in use", _0)]
    DuplicateName(String),
    #[fail(display = "{}", _0)]
    Network(#[cause] NetworkError),
    #[fail(display = "{}", _0)]
    Simulation(#[cause] SimulationError),
}

impl From<NetworkError> for ScenarioError {
    fn from(e: NetworkError) -> ScenarioError {
        ScenarioError::Network(e)
    }
}

impl From<SimulationError> for ScenarioError {
    fn from(e: SimulationError) -> ScenarioError {
        ScenarioError::Simulation(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainSpec {
    pub name: String,
    pub start: ComponentId,
    pub direction: Direction,
    pub destination: ComponentId,
}

#[derive(Debug)]
pub struct Scenario {
    pub network: Network,
    pub names: NameMap,
    pub trains: Vec<TrainSpec>,
}

/// The diamond network: a train on SegA bound for TermB can take either
/// SegB or the shorter SegD.
///
/// ```text
/// TermA -- SegA 20 --+-- SegB 20 --+-- SegC 10 -- TermB
///                    \-- SegD 10 --/
/// ```
pub const DEMO: &str = "
segment SegA 20
attach SegB 20 SegA up
attach SegC 10 SegB up
attach SegD 10 SegA up
connect SegD up SegC down
terminator TermA SegA down
terminator TermB SegC up
train TestTrain SegA up TermB
";

fn regex(re: &str) -> Result<Regex, ParseError> {
    Regex::new(re).map_err(|e| ParseError::RegexError(format!("{:?}", e)))
}

fn direction(s: &str) -> Direction {
    if s == "up" { Direction::Up } else { Direction::Down }
}

/// Parses the scenario format, one statement per line:
///
/// * segment SegA 20
/// * attach SegB 20 SegA up
/// * connect SegD up SegC down
/// * terminator TermB SegC up
/// * signal SegB up green
/// * train t1 SegA up TermB
///
/// Blank lines and lines starting with `#` are ignored.
pub fn parse_scenario(input: &str) -> Result<Vec<Statement>, ParseError> {
    let mut statements = Vec::new();
    let blank_re = regex(r"^\s*(#.*)?$")?;
    let segment_re = regex(r"^\s*segment\s+(\w+)\s+(\d+)\s*$")?;
    let attach_re = regex(r"^\s*attach\s+(\w+)\s+(\d+)\s+(\w+)\s+(up|down)\s*$")?;
    let connect_re = regex(r"^\s*connect\s+(\w+)\s+(up|down)\s+(\w+)\s+(up|down)\s*$")?;
    let terminator_re = regex(r"^\s*terminator\s+(\w+)\s+(\w+)\s+(up|down)\s*$")?;
    let signal_re = regex(r"^\s*signal\s+(\w+)\s+(up|down)(?:\s+(red|green))?\s*$")?;
    let train_re = regex(r"(?x) ^ \s* train \s+ (?P<name>\w+) \s+
            (?P<start>\w+) \s+
            (?P<dir>up|down) \s+
            (?P<dest>\w+) \s*
            $")?;

    for (idx, line) in input.lines().enumerate() {
        let lineno = idx + 1;
        if blank_re.is_match(line) {
            continue;
        }
        if let Some(groups) = segment_re.captures(line) {
            let length = groups[2].parse::<Length>().map_err(|_e| ParseError::NumberError(lineno))?;
            statements.push(Statement::Segment(groups[1].to_string(), length));
            continue;
        }
        if let Some(groups) = attach_re.captures(line) {
            let length = groups[2].parse::<Length>().map_err(|_e| ParseError::NumberError(lineno))?;
            statements.push(Statement::Attach(groups[1].to_string(), length,
                                              groups[3].to_string(), direction(&groups[4])));
            continue;
        }
        if let Some(groups) = connect_re.captures(line) {
            statements.push(Statement::Connect(groups[1].to_string(), direction(&groups[2]),
                                               groups[3].to_string(), direction(&groups[4])));
            continue;
        }
        if let Some(groups) = terminator_re.captures(line) {
            statements.push(Statement::Terminator(groups[1].to_string(), groups[2].to_string(),
                                                  direction(&groups[3])));
            continue;
        }
        if let Some(groups) = signal_re.captures(line) {
            let state = groups.get(3).map(|m| match m.as_str() {
                "green" => SignalState::Green,
                _ => SignalState::Red,
            });
            statements.push(Statement::Signal(groups[1].to_string(), direction(&groups[2]), state));
            continue;
        }
        if let Some(groups) = train_re.captures(line) {
            statements.push(Statement::Train(groups["name"].to_string(), groups["start"].to_string(),
                                             direction(&groups["dir"]), groups["dest"].to_string()));
            continue;
        }
        return Err(ParseError::Unrecognized(lineno, line.to_string()));
    }

    Ok(statements)
}

fn lookup(names: &NameMap, name: &str) -> Result<ComponentId, ScenarioError> {
    names.get(name)
        .cloned()
        .ok_or_else(|| ScenarioError::UnknownName(name.to_string()))
}

fn register(names: &mut NameMap, name: &str, id: ComponentId) {
    names.insert(name.to_string(), id);
}

fn fresh(names: &NameMap, name: &str) -> Result<(), ScenarioError> {
    if names.contains_key(name) {
        return Err(ScenarioError::DuplicateName(name.to_string()));
    }
    Ok(())
}

/// Builds the network and train list described by the statements.
pub fn build_scenario(statements: &[Statement]) -> Result<Scenario, ScenarioError> {
    let mut network = Network::new();
    let mut names = NameMap::new();
    let mut trains: Vec<TrainSpec> = Vec::new();

    for stmt in statements {
        debug!("Scenario statement {:?}", stmt);
        match *stmt {
            Statement::Segment(ref name, length) => {
                fresh(&names, name)?;
                let id = network.create_segment(name, length)?;
                register(&mut names, name, id);
            }
            Statement::Attach(ref name, length, ref existing, d) => {
                fresh(&names, name)?;
                let src = lookup(&names, existing)?;
                let id = network.attach_segment(src, d, name, length)?;
                register(&mut names, name, id);
            }
            Statement::Connect(ref a, da, ref b, db) => {
                let a = lookup(&names, a)?;
                let b = lookup(&names, b)?;
                network.connect_segments(a, da, b, db)?;
            }
            Statement::Terminator(ref name, ref segment, d) => {
                fresh(&names, name)?;
                let segment = lookup(&names, segment)?;
                let id = network.add_terminator(segment, d, name)?;
                register(&mut names, name, id);
            }
            Statement::Signal(ref segment, d, state) => {
                let segment = lookup(&names, segment)?;
                network.add_signal(segment, d)?;
                if let Some(state) = state {
                    network.set_signal(segment, d, state)?;
                }
            }
            Statement::Train(ref name, ref start, d, ref destination) => {
                if trains.iter().any(|t| &t.name == name) {
                    return Err(ScenarioError::DuplicateName(name.clone()));
                }
                trains.push(TrainSpec {
                    name: name.clone(),
                    start: lookup(&names, start)?,
                    direction: d,
                    destination: lookup(&names, destination)?,
                });
            }
        }
    }

    Ok(Scenario { network: network, names: names, trains: trains })
}

impl Scenario {
    pub fn into_simulation(self, config: SimConfig) -> Result<Simulation, ScenarioError> {
        let mut sim = Simulation::new(self.network, config);
        for t in &self.trains {
            sim.add_train(&t.name, t.start, t.direction, t.destination)?;
        }
        Ok(sim)
    }
}
