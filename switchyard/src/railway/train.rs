use log::{debug, error, info, warn};

use super::network::*;

pub type TrainId = usize;

/// `Crashed` and `Success` are terminal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrainState {
    Running,
    Crashed,
    Success,
}

impl TrainState {
    pub fn as_str(&self) -> &'static str {
        match *self {
            TrainState::Running => "running",
            TrainState::Crashed => "crashed",
            TrainState::Success => "success",
        }
    }
}

/// What happened to a train during one call to [`Train::advance`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Train is not running.
    Idle,
    Moved,
    Entered(ComponentId),
    Arrived(ComponentId),
    /// Waiting at a red signal.
    Stopped,
    /// Standing at a terminator which is not its destination.
    Held,
    Fault(SwitchingFault),
}

#[derive(Clone, Debug)]
pub struct Train {
    id: TrainId,
    name: String,
    current: ComponentId,
    destination: Option<ComponentId>,
    direction: Direction,
    // Zero-based position inside the current component,
    // counted in the direction of travel.
    offset: Length,
    distance: u32,
    stopped: u32,
    faults: u32,
    state: TrainState,
}

impl Train {
    pub fn new(id: TrainId, name: &str, start: ComponentId, direction: Direction) -> Train {
        Train {
            id: id,
            name: name.to_string(),
            current: start,
            destination: None,
            direction: direction,
            offset: 0,
            distance: 0,
            stopped: 0,
            faults: 0,
            state: TrainState::Running,
        }
    }

    pub fn id(&self) -> TrainId { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn current(&self) -> ComponentId { self.current }
    pub fn destination(&self) -> Option<ComponentId> { self.destination }
    pub fn direction(&self) -> Direction { self.direction }
    pub fn offset(&self) -> Length { self.offset }
    pub fn distance_traveled(&self) -> u32 { self.distance }
    pub fn stopped_time(&self) -> u32 { self.stopped }
    pub fn faults(&self) -> u32 { self.faults }
    pub fn state(&self) -> TrainState { self.state }

    pub fn set_destination(&mut self, destination: ComponentId) {
        self.destination = Some(destination);
    }

    /// Turns the train around without moving it.
    pub fn reverse(&mut self, network: &Network) {
        self.offset = network.length(self.current).saturating_sub(1 + self.offset);
        self.direction = self.direction.reverse();
    }

    /// Position inside the current component, counted from the end the
    /// train would have entered through when travelling in direction `d`.
    pub fn position(&self, network: &Network, d: Direction) -> Length {
        if self.direction == d {
            self.offset
        } else {
            network.length(self.current).saturating_sub(1 + self.offset)
        }
    }

    /// Moves the train one unit along the network.
    pub fn advance(&mut self, network: &Network) -> Advance {
        if self.state != TrainState::Running {
            warn!("Advancing train {} which is not running", self.name);
            return Advance::Idle;
        }

        if network.is_terminator(self.current) {
            self.stopped += 1;
            debug!("Train {} held at terminator {}", self.name, network.name(self.current));
            return Advance::Held;
        }

        if self.offset + 1 < network.length(self.current) {
            self.offset += 1;
            self.distance += 1;
            return Advance::Moved;
        }

        match network.traverse(self.current, self.direction) {
            Traversal::Progressed(next) => {
                self.current = next;
                self.offset = 0;
                self.distance += 1;
                if Some(next) == self.destination {
                    self.state = TrainState::Success;
                    info!("Train {} has reached its destination {}", self.name, network.name(next));
                    Advance::Arrived(next)
                } else {
                    if network.is_terminator(next) {
                        warn!("Train {} ran into terminator {} which is not its destination",
                              self.name, network.name(next));
                    }
                    Advance::Entered(next)
                }
            }
            Traversal::BlockedBySignal => {
                self.stopped += 1;
                debug!("Train {} stopped at red signal on {}, direction {}",
                       self.name, network.name(self.current), self.direction);
                Advance::Stopped
            }
            Traversal::SwitchingFault(fault) => {
                self.faults += 1;
                error!("CRASH RISK: train {} on {}: {}", self.name, network.name(self.current), fault);
                Advance::Fault(fault)
            }
        }
    }

    pub fn collides_with(&self, other: &Train, network: &Network) -> bool {
        self.current == other.current &&
            self.position(network, self.direction) == other.position(network, self.direction)
    }

    /// Marks both trains as crashed if they occupy the same spot.
    /// Trains that already reached their destination take no part.
    pub fn check_collision(&mut self, other: &mut Train, network: &Network) -> bool {
        if self.state == TrainState::Success || other.state == TrainState::Success {
            return false;
        }
        if !self.collides_with(other, network) {
            return false;
        }
        error!("Train {} collided with {} on component {}",
               self.name, other.name, network.name(self.current));
        self.state = TrainState::Crashed;
        other.state = TrainState::Crashed;
        true
    }
}
