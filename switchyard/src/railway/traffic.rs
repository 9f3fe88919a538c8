//! Traffic control: choosing and committing train routes.

use smallvec::SmallVec;
use std::collections::HashMap;
use log::{debug, info, warn};

use super::network::Network;
use super::pathfinder::{find_path, Path};
use super::train::{Train, TrainId, TrainState};

/// Outcome of one control pass over the running trains.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ControlReport {
    /// Train whose route was committed in this pass.
    pub routed: Option<TrainId>,
    pub no_path: SmallVec<[TrainId; 4]>,
    pub failed: SmallVec<[TrainId; 4]>,
}

pub trait TrafficController {
    /// Switches junctions in `network` for the trains, once per tick.
    fn update_network(&mut self, network: &mut Network, trains: &[Train]) -> ControlReport;
}

/// Routes trains along their shortest paths, one train per pass.
///
/// Paths are cached per train on first success and reused until
/// [`DijkstraController::invalidate`] or
/// [`DijkstraController::invalidate_all`] is called. The cache does not
/// follow changes to the network topology.
#[derive(Debug, Default)]
pub struct DijkstraController {
    paths: HashMap<TrainId, Path>,
}

impl DijkstraController {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn cached_path(&self, train: TrainId) -> Option<&Path> {
        self.paths.get(&train)
    }

    pub fn invalidate(&mut self, train: TrainId) {
        self.paths.remove(&train);
    }

    pub fn invalidate_all(&mut self) {
        self.paths.clear();
    }

    #[cfg(test)]
    pub(crate) fn seed_path(&mut self, train: TrainId, path: Path) {
        self.paths.insert(train, path);
    }
}

impl TrafficController for DijkstraController {
    fn update_network(&mut self, network: &mut Network, trains: &[Train]) -> ControlReport {
        let mut report = ControlReport::default();
        for train in trains.iter().filter(|t| t.state() == TrainState::Running) {
            if !self.paths.contains_key(&train.id()) {
                match find_path(network, train) {
                    Some(path) => {
                        info!("Path found for train {} ({} segments, length {})",
                              train.name(), path.segments.len(), path.length);
                        self.paths.insert(train.id(), path);
                    }
                    None => {
                        warn!("No path found for train {}", train.name());
                        report.no_path.push(train.id());
                        continue;
                    }
                }
            }

            if let Some(path) = self.paths.get(&train.id()) {
                // One committed route per pass. Other trains wait for a later tick.
                if set_path(network, path) {
                    debug!("Route committed for train {}", train.name());
                    report.routed = Some(train.id());
                    break;
                }
                warn!("Failed to set optimal path for train {}", train.name());
                report.failed.push(train.id());
            }
        }
        report
    }
}

/// Switches every junction along the path, in order. Stops at the first
/// pair that cannot be routed; junctions switched before that stay switched.
pub fn set_path(network: &mut Network, path: &Path) -> bool {
    path.segments.windows(2).all(|pair| network.route_segment(pair[0], pair[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::network::{ComponentId, Direction, Direction::*, Traversal};

    // TermA - SegA 20 - SegB 20 - SegC 10 - TermB
    //                \- SegD 10 -/
    fn diamond() -> (Network, [ComponentId; 6]) {
        let mut n = Network::new();
        let a = n.create_segment("SegA", 20).unwrap();
        let b = n.attach_segment(a, Up, "SegB", 20).unwrap();
        let c = n.attach_segment(b, Up, "SegC", 10).unwrap();
        let d = n.attach_segment(a, Up, "SegD", 10).unwrap();
        n.connect_segments(d, Up, c, Down).unwrap();
        let ta = n.add_terminator(a, Down, "TermA").unwrap();
        let tb = n.add_terminator(c, Up, "TermB").unwrap();
        (n, [a, b, c, d, ta, tb])
    }

    fn train(id: TrainId, start: ComponentId, direction: Direction, destination: ComponentId) -> Train {
        let mut t = Train::new(id, &format!("T{}", id), start, direction);
        t.set_destination(destination);
        t
    }

    #[test]
    fn commits_shortest_route() {
        let (mut n, [a, _, c, d, _, tb]) = diamond();
        let mut ctl = DijkstraController::new();
        let report = ctl.update_network(&mut n, &[train(0, a, Up, tb)]);
        assert_eq!(report.routed, Some(0));
        assert_eq!(ctl.cached_path(0).unwrap().segments, vec![a, d, c]);
        assert_eq!(n.traverse(a, Up), Traversal::Progressed(d));
        assert_eq!(n.traverse(d, Up), Traversal::Progressed(c));
    }

    #[test]
    fn stops_after_first_committed_train() {
        let (mut n, [a, b, c, _, ta, tb]) = diamond();
        let mut ctl = DijkstraController::new();
        let trains = [train(0, a, Up, tb), train(1, c, Down, ta)];
        let report = ctl.update_network(&mut n, &trains);
        assert_eq!(report.routed, Some(0));
        assert!(ctl.cached_path(1).is_none());

        let trains = [train(1, b, Down, ta), train(0, a, Up, tb)];
        let report = ctl.update_network(&mut n, &trains);
        assert_eq!(report.routed, Some(1));
        assert_eq!(ctl.cached_path(1).unwrap().segments, vec![b, a]);
    }

    #[test]
    fn unreachable_train_is_skipped_every_pass() {
        let (mut n, [a, _, c, _, ta, tb]) = diamond();
        let mut ctl = DijkstraController::new();
        let trains = [train(0, a, Up, ta), train(1, c, Up, tb)];
        for _ in 0..3 {
            let report = ctl.update_network(&mut n, &trains);
            assert_eq!(report.no_path.as_slice(), &[0]);
            assert_eq!(report.routed, Some(1));
            assert!(ctl.cached_path(0).is_none());
        }
    }

    #[test]
    fn failed_commit_is_not_rolled_back() {
        let (mut n, [a, b, c, d, _, _]) = diamond();
        let stray = n.create_segment("Stray", 5).unwrap();
        let path = Path { segments: vec![a, d, stray, d, c], length: 55 };
        assert!(!set_path(&mut n, &path));
        // The first pair was switched before the failure.
        assert_eq!(n.traverse(a, Up), Traversal::Progressed(d));
        // Pairs after the failure were never attempted.
        assert_eq!(n.connector(n.next_connector(c, Down).unwrap()).unwrap().selection(),
                   (Some(b), Some(c)));
    }

    #[test]
    fn failed_commit_moves_on_to_next_train() {
        let (mut n, [a, b, _, d, ta, tb]) = diamond();
        let stray = n.create_segment("Stray", 5).unwrap();
        let mut ctl = DijkstraController::new();
        ctl.seed_path(0, Path { segments: vec![a, d, stray], length: 35 });
        let trains = [train(0, a, Up, tb), train(1, b, Down, ta)];
        let report = ctl.update_network(&mut n, &trains);
        assert_eq!(report.failed.as_slice(), &[0]);
        assert_eq!(report.routed, Some(1));
        assert!(report.no_path.is_empty());
        // The failed path stays cached and is retried on the next pass.
        assert_eq!(ctl.cached_path(0).unwrap().segments, vec![a, d, stray]);
        assert_eq!(n.traverse(b, Down), Traversal::Progressed(a));
    }

    #[test]
    fn invalidation_forces_new_search() {
        let (mut n, [a, b, c, d, _, tb]) = diamond();
        let mut ctl = DijkstraController::new();
        let trains = [train(0, a, Up, tb)];
        ctl.update_network(&mut n, &trains);
        assert_eq!(ctl.cached_path(0).unwrap().segments, vec![a, d, c]);

        // A train now on SegB keeps its stale cached route until invalidated.
        let moved = [train(0, b, Up, tb)];
        ctl.update_network(&mut n, &moved);
        assert_eq!(ctl.cached_path(0).unwrap().segments, vec![a, d, c]);
        ctl.invalidate(0);
        ctl.update_network(&mut n, &moved);
        assert_eq!(ctl.cached_path(0).unwrap().segments, vec![b, c]);
        ctl.invalidate_all();
        assert!(ctl.cached_path(0).is_none());
    }

    #[test]
    fn finished_trains_are_ignored() {
        let (mut n, [_, _, c, _, _, tb]) = diamond();
        let mut ctl = DijkstraController::new();
        let mut t = train(0, c, Up, tb);
        for _ in 0..10 {
            t.advance(&n);
        }
        assert_eq!(t.state(), TrainState::Success);
        assert_eq!(ctl.update_network(&mut n, &[t]), ControlReport::default());
    }
}
