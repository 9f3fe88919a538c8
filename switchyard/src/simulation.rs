//! Discrete tick simulation of trains on a network.
//!
//! Each tick runs, in order:
//!
//! 1. the traffic controller, once,
//! 2. `advance` on every active train, in the order they were added,
//! 3. collision checks between every pair of active trains,
//! 4. retirement of trains that are no longer running.
//!
//! A train crashed in step 3 stays in the active list until step 4, so it
//! is still compared against the remaining trains of the same tick.

use log::{info, warn};

use crate::railway::network::{ComponentId, Direction, Network};
use crate::railway::traffic::{ControlReport, DijkstraController, TrafficController};
use crate::railway::train::{Train, TrainId, TrainState};
use crate::output::history::{History, NetworkLogEvent, Tick, TrainLogEvent};
use crate::output::report::{Report, TrainSummary};

pub const DEFAULT_MAX_TICKS: Tick = 10_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimConfig {
    /// Give up after this many ticks. `None` runs until every train is done.
    pub max_ticks: Option<Tick>,
}

impl Default for SimConfig {
    fn default() -> SimConfig {
        SimConfig { max_ticks: Some(DEFAULT_MAX_TICKS) }
    }
}

#[derive(Debug, PartialEq, Eq, Fail)]
pub enum SimulationError {
    #[fail(display = "train \"{}\" must start on a segment", _0)]
    StartNotSegment(String),
    #[fail(display = "destination of train \"{}\" must be a terminator", _0)]
    DestinationNotTerminator(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Completed { ticks: Tick },
    /// Trains were still running when the tick budget ran out,
    /// e.g. because one of them can never be routed.
    TickBudgetExhausted { ticks: Tick, running: usize },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: Tick,
    pub control: ControlReport,
    pub collisions: Vec<(TrainId, TrainId)>,
    pub retired: Vec<TrainId>,
}

pub struct Simulation<C = DijkstraController> {
    pub network: Network,
    pub controller: C,
    config: SimConfig,
    running: Vec<Train>,
    finished: Vec<Train>,
    tick: Tick,
    history: History,
}

impl Simulation<DijkstraController> {
    pub fn new(network: Network, config: SimConfig) -> Self {
        Simulation::with_controller(network, DijkstraController::new(), config)
    }
}

impl<C: TrafficController> Simulation<C> {
    pub fn with_controller(network: Network, controller: C, config: SimConfig) -> Self {
        Simulation {
            network: network,
            controller: controller,
            config: config,
            running: Vec::new(),
            finished: Vec::new(),
            tick: 0,
            history: History::default(),
        }
    }

    /// Places a train on the network, heading for `destination`.
    pub fn add_train(&mut self,
                     name: &str,
                     start: ComponentId,
                     direction: Direction,
                     destination: ComponentId)
                     -> Result<TrainId, SimulationError> {
        if self.network.segment(start).is_err() {
            return Err(SimulationError::StartNotSegment(name.to_string()));
        }
        if !self.network.is_terminator(destination) {
            return Err(SimulationError::DestinationNotTerminator(name.to_string()));
        }
        let id = self.history.add_train(name);
        let mut train = Train::new(id, name, start, direction);
        train.set_destination(destination);
        self.history.log_train(id, self.tick, TrainLogEvent::Enter(start));
        info!("Train {} placed on {} heading {} for {}",
              name, self.network.name(start), direction, self.network.name(destination));
        self.running.push(train);
        Ok(id)
    }

    pub fn running(&self) -> &[Train] { &self.running }
    pub fn finished(&self) -> &[Train] { &self.finished }
    pub fn ticks(&self) -> Tick { self.tick }
    pub fn history(&self) -> &History { &self.history }
    pub fn config(&self) -> &SimConfig { &self.config }

    pub fn train(&self, id: TrainId) -> Option<&Train> {
        self.running.iter().chain(self.finished.iter()).find(|t| t.id() == id)
    }

    /// Runs one simulation step.
    pub fn tick(&mut self) -> TickReport {
        self.tick += 1;
        let tick = self.tick;

        let control = self.controller.update_network(&mut self.network, &self.running);
        if let Some(id) = control.routed {
            self.history.log_network(tick, NetworkLogEvent::Routed(id));
        }
        for id in &control.failed {
            self.history.log_network(tick, NetworkLogEvent::CommitFailed(*id));
        }
        for id in &control.no_path {
            self.history.log_network(tick, NetworkLogEvent::NoPath(*id));
        }

        for train in self.running.iter_mut() {
            let advance = train.advance(&self.network);
            if let Some(event) = TrainLogEvent::from_advance(&advance) {
                self.history.log_train(train.id(), tick, event);
            }
        }

        let mut collisions = Vec::new();
        for j in 1..self.running.len() {
            let (head, tail) = self.running.split_at_mut(j);
            let other = &mut tail[0];
            for train in head.iter_mut() {
                if train.check_collision(other, &self.network) {
                    collisions.push((train.id(), other.id()));
                    self.history.log_train(train.id(), tick, TrainLogEvent::Collided(other.id()));
                    self.history.log_train(other.id(), tick, TrainLogEvent::Collided(train.id()));
                }
            }
        }

        let mut retired = Vec::new();
        let (active, done): (Vec<Train>, Vec<Train>) = self.running.drain(..)
            .partition(|t| t.state() == TrainState::Running);
        self.running = active;
        for train in done {
            info!("Removing train {} from simulation ({})", train.name(), train.state().as_str());
            self.history.log_train(train.id(), tick, TrainLogEvent::Finished(train.state()));
            retired.push(train.id());
            self.finished.push(train);
        }

        TickReport {
            tick: tick,
            control: control,
            collisions: collisions,
            retired: retired,
        }
    }

    /// Ticks until no train is running or the tick budget is spent.
    pub fn run(&mut self) -> RunStatus {
        while !self.running.is_empty() {
            if let Some(max) = self.config.max_ticks {
                if self.tick >= max {
                    warn!("Tick budget of {} exhausted with {} trains still running",
                          max, self.running.len());
                    return RunStatus::TickBudgetExhausted {
                        ticks: self.tick,
                        running: self.running.len(),
                    };
                }
            }
            self.tick();
        }
        RunStatus::Completed { ticks: self.tick }
    }

    pub fn report(&self) -> Report {
        Report {
            ticks: self.tick,
            finished: self.finished.iter().map(|t| TrainSummary::new(t, &self.network)).collect(),
            running: self.running.iter().map(|t| TrainSummary::new(t, &self.network)).collect(),
        }
    }
}
