use crate::railway::network::{ComponentId, Network, SwitchingFault};
use crate::railway::train::{Advance, TrainId, TrainState};

pub type Tick = u64;

#[derive(Debug, Default)]
pub struct History {
    pub network: Vec<(Tick, NetworkLogEvent)>,
    pub trains: Vec<(String, Vec<(Tick, TrainLogEvent)>)>, // indexed by TrainId
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkLogEvent {
    Routed(TrainId),
    CommitFailed(TrainId),
    NoPath(TrainId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainLogEvent {
    Enter(ComponentId),
    Stopped,
    Held,
    Fault(SwitchingFault),
    Collided(TrainId),
    Finished(TrainState),
}

impl TrainLogEvent {
    /// Events worth recording for an advance outcome. Plain moves are not logged.
    pub fn from_advance(advance: &Advance) -> Option<TrainLogEvent> {
        match *advance {
            Advance::Entered(c) | Advance::Arrived(c) => Some(TrainLogEvent::Enter(c)),
            Advance::Stopped => Some(TrainLogEvent::Stopped),
            Advance::Held => Some(TrainLogEvent::Held),
            Advance::Fault(ref f) => Some(TrainLogEvent::Fault(f.clone())),
            Advance::Moved | Advance::Idle => None,
        }
    }
}

impl History {
    pub fn add_train(&mut self, name: &str) -> TrainId {
        self.trains.push((name.to_string(), Vec::new()));
        self.trains.len() - 1
    }

    pub fn log_network(&mut self, tick: Tick, event: NetworkLogEvent) {
        self.network.push((tick, event));
    }

    pub fn log_train(&mut self, train: TrainId, tick: Tick, event: TrainLogEvent) {
        if let Some(&mut (_, ref mut events)) = self.trains.get_mut(train) {
            events.push((tick, event));
        }
    }

    pub fn train_events(&self, train: TrainId) -> &[(Tick, TrainLogEvent)] {
        self.trains.get(train).map(|&(_, ref e)| e.as_slice()).unwrap_or(&[])
    }
}

/// Print one train component visit per line on the following format:
/// `trainname tick componentname`.
pub fn visits(network: &Network, h: &History) -> Result<String, failure::Error> {
    use std::fmt::Write;
    let mut s = String::new();
    for &(ref train_name, ref events) in &h.trains {
        for &(tick, ref ev) in events {
            if let TrainLogEvent::Enter(c) = *ev {
                write!(s, "{} {} {}\n", train_name, tick, network.name(c))?;
            }
        }
    }
    Ok(s)
}
