use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use log::{debug, trace};

use super::network::{ComponentId, Direction, Length, Network};
use super::train::Train;

/// Segments to pass through, starting with the one the train is on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    pub segments: Vec<ComponentId>,
    pub length: Length,
}

#[derive(Eq, PartialEq, Debug)]
struct Frontier {
    distance: Length,
    id: usize,
    vertex: ComponentId,
    path: Vec<ComponentId>,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Frontier) -> Ordering {
        // Flipped to make the (maximum) BinaryHeap pop the shortest distance.
        other.distance.cmp(&self.distance)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Frontier) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra search from segment `start` to `destination` (a junction or
/// terminator), keeping to `direction` throughout. Junction selections are
/// ignored. Returns `None` if the destination cannot be reached.
pub fn shortest_path(network: &Network,
                     start: ComponentId,
                     direction: Direction,
                     destination: ComponentId)
                     -> Option<Path> {
    let first = network.segment(start).ok()?;
    let vertex = first.end(direction)?;

    let mut best: HashMap<ComponentId, Length> = HashMap::new();
    let mut queue = BinaryHeap::new();
    let mut counter = 0;

    best.insert(vertex, first.length());
    queue.push(Frontier {
        distance: first.length(),
        id: counter,
        vertex: vertex,
        path: vec![start],
    });

    while let Some(Frontier { distance, vertex, path, .. }) = queue.pop() {
        if vertex == destination {
            debug!("Path found to {} with length {}", network.name(destination), distance);
            return Some(Path { segments: path, length: distance });
        }

        let arrived = path[path.len() - 1];
        trace!("Exploring from {} via {}", network.name(arrived), network.name(vertex));
        for next in network.next_segments(vertex, arrived) {
            let next_vertex = match network.next_connector(next, direction) {
                Some(v) => v,
                None => continue,
            };
            let next_distance = match distance.checked_add(network.length(next)) {
                Some(d) => d,
                None => {
                    debug!("Distance through {} overflows, skipping", network.name(next));
                    continue;
                }
            };
            let known = best.entry(next_vertex).or_insert(Length::max_value());
            if next_distance < *known {
                *known = next_distance;
                counter += 1;
                let mut next_path = path.clone();
                next_path.push(next);
                queue.push(Frontier {
                    distance: next_distance,
                    id: counter,
                    vertex: next_vertex,
                    path: next_path,
                });
            }
        }
    }

    debug!("No path from {} to {}", network.name(start), network.name(destination));
    None
}

/// Shortest path from the train's current position to its destination.
pub fn find_path(network: &Network, train: &Train) -> Option<Path> {
    let destination = train.destination()?;
    shortest_path(network, train.current(), train.direction(), destination)
}
