use std::fmt;

use crate::railway::network::Network;
use crate::railway::train::{Train, TrainId, TrainState};

/// Final state and metrics of one train.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainSummary {
    pub id: TrainId,
    pub name: String,
    pub state: TrainState,
    pub location: String,
    pub distance: u32,
    pub stopped: u32,
    pub faults: u32,
}

impl TrainSummary {
    pub fn new(train: &Train, network: &Network) -> TrainSummary {
        TrainSummary {
            id: train.id(),
            name: train.name().to_string(),
            state: train.state(),
            location: network.name(train.current()).to_string(),
            distance: train.distance_traveled(),
            stopped: train.stopped_time(),
            faults: train.faults(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Report {
    pub ticks: u64,
    pub finished: Vec<TrainSummary>,
    pub running: Vec<TrainSummary>,
}

impl Report {
    pub fn all_safe(&self) -> bool {
        self.finished.iter().all(|t| t.state == TrainState::Success)
    }

    pub fn all_finished(&self) -> bool {
        self.running.is_empty()
    }

    /// Every train reached its destination and none is left on the network.
    pub fn success(&self) -> bool {
        self.all_safe() && self.all_finished()
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "YES" } else { "NO" }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for t in self.finished.iter().chain(self.running.iter()) {
            writeln!(f, "Train {}: {} at {}", t.name, t.state.as_str(), t.location)?;
            writeln!(f, "  travelled: {} units", t.distance)?;
            writeln!(f, "  stopped time: {} ticks", t.stopped)?;
            if t.faults > 0 {
                writeln!(f, "  switching faults: {}", t.faults)?;
            }
        }
        writeln!(f, "Simulation results after {} ticks:", self.ticks)?;
        writeln!(f, "  All trains safe? {}", yes_no(self.all_safe()))?;
        write!(f, "  All trains finished? {}", yes_no(self.all_finished()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(state: TrainState) -> TrainSummary {
        TrainSummary {
            id: 0,
            name: "t".to_string(),
            state: state,
            location: "X".to_string(),
            distance: 3,
            stopped: 0,
            faults: 0,
        }
    }

    #[test]
    fn success_needs_safe_and_finished() {
        let ok = Report { ticks: 3, finished: vec![summary(TrainState::Success)], running: vec![] };
        assert!(ok.success());
        let crashed = Report {
            ticks: 3,
            finished: vec![summary(TrainState::Success), summary(TrainState::Crashed)],
            running: vec![],
        };
        assert!(!crashed.all_safe());
        assert!(!crashed.success());
        let stuck = Report { ticks: 3, finished: vec![], running: vec![summary(TrainState::Running)] };
        assert!(stuck.all_safe());
        assert!(!stuck.success());
        assert!(format!("{}", stuck).ends_with("All trains finished? NO"));
    }
}
