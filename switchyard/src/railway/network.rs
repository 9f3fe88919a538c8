//! Rail network graph.
//!
//! All track components live in a single arena owned by [`Network`] and refer
//! to each other by [`ComponentId`]. Segments carry length and signals,
//! junctions carry the current switch selection, and terminators mark the
//! ends of the line.

use smallvec::SmallVec;
use std::fmt;
use log::{debug, error};

pub type ComponentId = usize;
pub type Length = u32;

/// Logical travel direction. `Up` is the "away" end of a segment,
/// `Down` the "toward" end.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn reverse(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// `Disabled` means that no signal is installed at that end.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SignalState {
    Red,
    Green,
    Disabled,
}

#[derive(Debug)]
pub struct Segment {
    name: String,
    length: Length,
    ends: [Option<ComponentId>; 2],
    signals: [SignalState; 2],
}

impl Segment {
    fn new(name: &str, length: Length) -> Segment {
        Segment {
            name: name.to_string(),
            length: length,
            ends: [None, None],
            signals: [SignalState::Disabled, SignalState::Disabled],
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn length(&self) -> Length { self.length }

    /// Connector (junction or terminator) at the given end.
    pub fn end(&self, d: Direction) -> Option<ComponentId> {
        self.ends[d.index()]
    }

    pub fn signal(&self, d: Direction) -> SignalState {
        self.signals[d.index()]
    }
}

/// A junction joining any number of segments. Only the two selected
/// segments are linked for traversal at any time.
#[derive(Debug)]
pub struct Connector {
    name: String,
    segments: SmallVec<[ComponentId; 4]>,
    selected: [Option<ComponentId>; 2],
}

impl Connector {
    fn new(name: &str) -> Connector {
        Connector {
            name: name.to_string(),
            segments: SmallVec::new(),
            selected: [None, None],
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn segments(&self) -> &[ComponentId] { &self.segments }

    pub fn selection(&self) -> (Option<ComponentId>, Option<ComponentId>) {
        (self.selected[0], self.selected[1])
    }

    pub fn is_connected(&self, segment: ComponentId) -> bool {
        self.segments.contains(&segment)
    }

    /// Adds a segment to the junction. The first two segments connected
    /// become the initial selection.
    pub fn connect(&mut self, segment: ComponentId) {
        if self.is_connected(segment) {
            return;
        }
        self.segments.push(segment);
        if self.selected[0].is_none() {
            self.selected[0] = Some(segment);
        } else if self.selected[1].is_none() {
            self.selected[1] = Some(segment);
        }
    }

    /// Switches the junction so that `s1` and `s2` are linked.
    /// Leaves the junction untouched unless both are connected to it.
    pub fn select(&mut self, s1: ComponentId, s2: ComponentId) -> bool {
        if !self.is_connected(s1) || !self.is_connected(s2) {
            return false;
        }
        self.selected = [Some(s1), Some(s2)];
        true
    }

    /// Segments reachable through this junction when arriving from `src`,
    /// regardless of the current selection.
    pub fn next_segments(&self, src: ComponentId) -> SmallVec<[ComponentId; 4]> {
        if !self.is_connected(src) {
            error!("Junction {} queried from segment {} which is not connected to it", self.name, src);
            return SmallVec::new();
        }
        self.segments.iter().cloned().filter(|s| *s != src).collect()
    }

    fn traverse(&self, id: ComponentId, src: ComponentId) -> Traversal {
        match self.selected {
            [Some(a), Some(b)] if a == src => Traversal::Progressed(b),
            [Some(a), Some(b)] if b == src => Traversal::Progressed(a),
            _ => Traversal::SwitchingFault(SwitchingFault::NotSelected { junction: id, from: src }),
        }
    }
}

/// End of the line, bound to exactly one segment.
#[derive(Debug)]
pub struct Terminator {
    name: String,
    segment: ComponentId,
}

impl Terminator {
    pub fn name(&self) -> &str { &self.name }
    pub fn segment(&self) -> ComponentId { self.segment }
}

#[derive(Debug)]
pub enum Component {
    Segment(Segment),
    Junction(Connector),
    Terminator(Terminator),
}

impl Component {
    pub fn name(&self) -> &str {
        match *self {
            Component::Segment(ref s) => s.name(),
            Component::Junction(ref c) => c.name(),
            Component::Terminator(ref t) => t.name(),
        }
    }

    pub fn length(&self) -> Length {
        match *self {
            Component::Segment(ref s) => s.length(),
            Component::Junction(_) | Component::Terminator(_) => 0,
        }
    }
}

/// Outcome of asking the network to move past the end of a component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Traversal {
    Progressed(ComponentId),
    BlockedBySignal,
    SwitchingFault(SwitchingFault),
}

/// A train tried to pass a connector that was not set for it.
#[derive(Clone, Debug, PartialEq, Eq, Fail)]
pub enum SwitchingFault {
    #[fail(display = "junction {} is not switched for traffic from component {}", junction, from)]
    NotSelected { junction: ComponentId, from: ComponentId },
    #[fail(display = "terminator {} entered from component {} it is not bound to", terminator, from)]
    WrongTerminator { terminator: ComponentId, from: ComponentId },
    #[fail(display = "segment {} has no connection in direction {}", segment, direction)]
    Unconnected { segment: ComponentId, direction: Direction },
    #[fail(display = "unknown component {}", component)]
    UnknownComponent { component: ComponentId },
}

#[derive(Debug, PartialEq, Eq, Fail)]
pub enum NetworkError {
    #[fail(display = "unknown component {}", _0)]
    UnknownComponent(ComponentId),
    #[fail(display = "component \"{}\" is not a segment", _0)]
    NotASegment(String),
    #[fail(display = "segment \"{}\" must have a positive length", _0)]
    ZeroLength(String),
    #[fail(display = "segment \"{}\" is already connected in direction {}", _0, _1)]
    EndConnected(String, Direction),
    #[fail(display = "segment \"{}\" already has a signal in direction {}", _0, _1)]
    SignalExists(String, Direction),
    #[fail(display = "segment \"{}\" has no signal in direction {}", _0, _1)]
    NoSignal(String, Direction),
    #[fail(display = "signals can only be set to red or green")]
    DisableSignal,
}

/// Owner of every segment, junction and terminator.
#[derive(Debug, Default)]
pub struct Network {
    components: Vec<Component>,
}

impl Network {
    pub fn new() -> Network {
        Default::default()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    pub fn name(&self, id: ComponentId) -> &str {
        self.components.get(id).map(|c| c.name()).unwrap_or("<unknown>")
    }

    pub fn length(&self, id: ComponentId) -> Length {
        self.components.get(id).map(|c| c.length()).unwrap_or(0)
    }

    /// Looks up a segment or terminator by name. Junctions are named
    /// automatically and are not searched.
    pub fn find(&self, name: &str) -> Option<ComponentId> {
        self.components.iter().position(|c| match *c {
            Component::Junction(_) => false,
            _ => c.name() == name,
        })
    }

    pub fn segment(&self, id: ComponentId) -> Result<&Segment, NetworkError> {
        match self.components.get(id) {
            Some(Component::Segment(s)) => Ok(s),
            Some(c) => Err(NetworkError::NotASegment(c.name().to_string())),
            None => Err(NetworkError::UnknownComponent(id)),
        }
    }

    fn segment_mut(&mut self, id: ComponentId) -> Result<&mut Segment, NetworkError> {
        match self.components.get_mut(id) {
            Some(Component::Segment(s)) => Ok(s),
            Some(c) => Err(NetworkError::NotASegment(c.name().to_string())),
            None => Err(NetworkError::UnknownComponent(id)),
        }
    }

    pub fn connector(&self, id: ComponentId) -> Option<&Connector> {
        match self.components.get(id) {
            Some(Component::Junction(c)) => Some(c),
            _ => None,
        }
    }

    pub fn is_terminator(&self, id: ComponentId) -> bool {
        match self.components.get(id) {
            Some(Component::Terminator(_)) => true,
            _ => false,
        }
    }

    /// Connector beyond `segment` in direction `d`, ignoring signals and switches.
    pub fn next_connector(&self, segment: ComponentId, d: Direction) -> Option<ComponentId> {
        self.segment(segment).ok().and_then(|s| s.end(d))
    }

    /// Segments reachable from a junction or terminator other than `from`.
    pub fn next_segments(&self, vertex: ComponentId, from: ComponentId) -> SmallVec<[ComponentId; 4]> {
        match self.components.get(vertex) {
            Some(Component::Junction(c)) => c.next_segments(from),
            Some(Component::Terminator(t)) => {
                Some(t.segment).into_iter().filter(|s| *s != from).collect()
            }
            _ => SmallVec::new(),
        }
    }

    fn push(&mut self, component: Component) -> ComponentId {
        let id = self.components.len();
        debug!("Adding component {} \"{}\"", id, component.name());
        self.components.push(component);
        id
    }

    fn new_junction(&mut self) -> ComponentId {
        let name = format!("J{}", self.components.len());
        self.push(Component::Junction(Connector::new(&name)))
    }

    /// Links the `d` end of a segment to a connector. Both ids must be valid.
    fn wire(&mut self, segment: ComponentId, d: Direction, connector: ComponentId) {
        if let Component::Segment(ref mut s) = self.components[segment] {
            s.ends[d.index()] = Some(connector);
        }
        if let Component::Junction(ref mut c) = self.components[connector] {
            c.connect(segment);
        }
    }

    fn require_junction(&self, connector: ComponentId, segment: ComponentId, d: Direction)
                        -> Result<(), NetworkError> {
        match self.connector(connector) {
            Some(_) => Ok(()),
            None => Err(NetworkError::EndConnected(self.name(segment).to_string(), d)),
        }
    }

    /// Creates an isolated segment.
    pub fn create_segment(&mut self, name: &str, length: Length) -> Result<ComponentId, NetworkError> {
        if length == 0 {
            return Err(NetworkError::ZeroLength(name.to_string()));
        }
        Ok(self.push(Component::Segment(Segment::new(name, length))))
    }

    /// Creates a segment continuing from the `d` end of `src`, through the
    /// junction at that end. The junction is created if `src` has none there.
    pub fn attach_segment(&mut self, src: ComponentId, d: Direction, name: &str, length: Length)
                          -> Result<ComponentId, NetworkError> {
        if length == 0 {
            return Err(NetworkError::ZeroLength(name.to_string()));
        }
        let junction = match self.segment(src)?.end(d) {
            Some(c) => {
                self.require_junction(c, src, d)?;
                c
            }
            None => {
                let j = self.new_junction();
                self.wire(src, d, j);
                j
            }
        };
        let segment = self.push(Component::Segment(Segment::new(name, length)));
        self.wire(segment, d.reverse(), junction);
        Ok(segment)
    }

    /// Joins the `da` end of `a` and the `db` end of `b` in one junction,
    /// reusing a junction already present on either side.
    pub fn connect_segments(&mut self, a: ComponentId, da: Direction, b: ComponentId, db: Direction)
                            -> Result<ComponentId, NetworkError> {
        let end_a = self.segment(a)?.end(da);
        let end_b = self.segment(b)?.end(db);
        let junction = match (end_a, end_b) {
            (Some(_), Some(_)) => {
                return Err(NetworkError::EndConnected(self.name(b).to_string(), db));
            }
            (Some(c), None) => {
                self.require_junction(c, a, da)?;
                c
            }
            (None, Some(c)) => {
                self.require_junction(c, b, db)?;
                c
            }
            (None, None) => self.new_junction(),
        };
        self.wire(a, da, junction);
        self.wire(b, db, junction);
        Ok(junction)
    }

    pub fn add_terminator(&mut self, segment: ComponentId, d: Direction, name: &str)
                          -> Result<ComponentId, NetworkError> {
        if self.segment(segment)?.end(d).is_some() {
            return Err(NetworkError::EndConnected(self.name(segment).to_string(), d));
        }
        let terminator = self.push(Component::Terminator(Terminator {
            name: name.to_string(),
            segment: segment,
        }));
        self.wire(segment, d, terminator);
        Ok(terminator)
    }

    /// Installs a signal at the `d` end of a segment. New signals show red.
    pub fn add_signal(&mut self, segment: ComponentId, d: Direction) -> Result<(), NetworkError> {
        let s = self.segment_mut(segment)?;
        if s.signals[d.index()] != SignalState::Disabled {
            return Err(NetworkError::SignalExists(s.name.clone(), d));
        }
        s.signals[d.index()] = SignalState::Red;
        Ok(())
    }

    pub fn set_signal(&mut self, segment: ComponentId, d: Direction, state: SignalState)
                      -> Result<(), NetworkError> {
        if state == SignalState::Disabled {
            return Err(NetworkError::DisableSignal);
        }
        let s = self.segment_mut(segment)?;
        if s.signals[d.index()] == SignalState::Disabled {
            return Err(NetworkError::NoSignal(s.name.clone(), d));
        }
        s.signals[d.index()] = state;
        Ok(())
    }

    pub fn signal_state(&self, segment: ComponentId, d: Direction) -> Result<SignalState, NetworkError> {
        Ok(self.segment(segment)?.signal(d))
    }

    /// Switches the junction between `src` and `dst`. The junction at the up
    /// end of `src` is tried before the one at its down end.
    pub fn route_segment(&mut self, src: ComponentId, dst: ComponentId) -> bool {
        let ends = match self.segment(src) {
            Ok(s) => [s.end(Direction::Up), s.end(Direction::Down)],
            Err(_) => return false,
        };
        for end in ends.iter().flatten() {
            if let Component::Junction(ref mut c) = self.components[*end] {
                if c.select(src, dst) {
                    debug!("Junction {} switched to {} <-> {}", c.name, src, dst);
                    return true;
                }
            }
        }
        false
    }

    /// Moves past the end of `current` in direction `d`.
    pub fn traverse(&self, current: ComponentId, d: Direction) -> Traversal {
        self.traverse_from(current, current, d)
    }

    /// Traverses `component` for a train arriving from `src`.
    pub fn traverse_from(&self, component: ComponentId, src: ComponentId, d: Direction) -> Traversal {
        match self.components.get(component) {
            Some(Component::Segment(s)) => {
                if s.signal(d) == SignalState::Red {
                    return Traversal::BlockedBySignal;
                }
                match s.end(d) {
                    Some(next) => self.traverse_from(next, src, d),
                    None => Traversal::SwitchingFault(SwitchingFault::Unconnected {
                        segment: component,
                        direction: d,
                    }),
                }
            }
            Some(Component::Junction(c)) => c.traverse(component, src),
            Some(Component::Terminator(t)) => {
                if t.segment == src {
                    Traversal::Progressed(component)
                } else {
                    Traversal::SwitchingFault(SwitchingFault::WrongTerminator {
                        terminator: component,
                        from: src,
                    })
                }
            }
            None => Traversal::SwitchingFault(SwitchingFault::UnknownComponent { component: component }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::Direction::*;

    // A(20) -up-> J -> B(20), with terminators at both outer ends.
    fn two_segments() -> (Network, ComponentId, ComponentId, ComponentId) {
        let mut n = Network::new();
        let a = n.create_segment("A", 20).unwrap();
        let b = n.attach_segment(a, Up, "B", 20).unwrap();
        n.add_terminator(a, Down, "TA").unwrap();
        n.add_terminator(b, Up, "TB").unwrap();
        let j = n.next_connector(a, Up).unwrap();
        (n, a, b, j)
    }

    #[test]
    fn attach_creates_and_selects_junction() {
        let (n, a, b, j) = two_segments();
        assert_eq!(n.next_connector(b, Down), Some(j));
        let c = n.connector(j).unwrap();
        assert_eq!(c.segments(), &[a, b]);
        assert_eq!(c.selection(), (Some(a), Some(b)));
        assert_eq!(n.traverse(a, Up), Traversal::Progressed(b));
        assert_eq!(n.traverse(b, Down), Traversal::Progressed(a));
    }

    #[test]
    fn red_signal_blocks_departure() {
        let (mut n, a, b, _) = two_segments();
        n.add_signal(a, Up).unwrap();
        assert_eq!(n.signal_state(a, Up), Ok(SignalState::Red));
        assert_eq!(n.traverse(a, Up), Traversal::BlockedBySignal);
        // Only the departing side matters.
        assert_eq!(n.traverse(a, Down), Traversal::Progressed(n.find("TA").unwrap()));
        n.set_signal(a, Up, SignalState::Green).unwrap();
        assert_eq!(n.traverse(a, Up), Traversal::Progressed(b));
    }

    #[test]
    fn add_and_set_signal_are_not_interchangeable() {
        let (mut n, a, _, _) = two_segments();
        assert_eq!(n.set_signal(a, Up, SignalState::Green),
                   Err(NetworkError::NoSignal("A".to_string(), Up)));
        assert_eq!(n.signal_state(a, Up), Ok(SignalState::Disabled));
        n.add_signal(a, Up).unwrap();
        n.set_signal(a, Up, SignalState::Green).unwrap();
        assert_eq!(n.add_signal(a, Up), Err(NetworkError::SignalExists("A".to_string(), Up)));
        assert_eq!(n.signal_state(a, Up), Ok(SignalState::Green));
        assert_eq!(n.set_signal(a, Up, SignalState::Disabled), Err(NetworkError::DisableSignal));
    }

    #[test]
    fn select_requires_membership() {
        let (mut n, a, b, j) = two_segments();
        let stray = n.create_segment("X", 5).unwrap();
        if let Component::Junction(ref mut c) = n.components[j] {
            assert!(!c.select(a, stray));
            assert_eq!(c.selection(), (Some(a), Some(b)));
            assert!(c.select(b, a));
            assert_eq!(c.selection(), (Some(b), Some(a)));
        } else {
            panic!("not a junction");
        }
    }

    #[test]
    fn connect_is_idempotent() {
        let mut c = Connector::new("J");
        c.connect(3);
        c.connect(4);
        c.connect(3);
        assert_eq!(c.segments(), &[3, 4]);
        assert_eq!(c.selection(), (Some(3), Some(4)));
    }

    #[test]
    fn traversing_unselected_junction_is_a_fault() {
        let (mut n, a, b, j) = two_segments();
        let c = n.attach_segment(a, Up, "C", 10).unwrap();
        assert_eq!(n.next_segments(j, a).into_vec(), vec![b, c]);
        assert_eq!(n.traverse(c, Down),
                   Traversal::SwitchingFault(SwitchingFault::NotSelected { junction: j, from: c }));
        assert!(n.route_segment(c, a));
        assert_eq!(n.traverse(c, Down), Traversal::Progressed(a));
        assert_eq!(n.traverse(b, Down),
                   Traversal::SwitchingFault(SwitchingFault::NotSelected { junction: j, from: b }));
    }

    #[test]
    fn terminator_only_accepts_its_segment() {
        let (n, a, b, _) = two_segments();
        let tb = n.find("TB").unwrap();
        assert_eq!(n.traverse(b, Up), Traversal::Progressed(tb));
        assert_eq!(n.traverse_from(tb, a, Up),
                   Traversal::SwitchingFault(SwitchingFault::WrongTerminator { terminator: tb, from: a }));
        assert!(n.is_terminator(tb));
        assert_eq!(n.length(tb), 0);
    }

    #[test]
    fn route_segment_falls_back_to_down_junction() {
        // X and Y join A at its down end, U at its up end.
        let mut n = Network::new();
        let a = n.create_segment("A", 10).unwrap();
        let x = n.attach_segment(a, Down, "X", 10).unwrap();
        let y = n.attach_segment(a, Down, "Y", 10).unwrap();
        let u = n.attach_segment(a, Up, "U", 10).unwrap();
        let up_j = n.next_connector(a, Up).unwrap();
        let down_j = n.next_connector(a, Down).unwrap();
        assert_eq!(n.connector(down_j).unwrap().selection(), (Some(a), Some(x)));
        assert!(n.route_segment(a, y));
        assert_eq!(n.connector(down_j).unwrap().selection(), (Some(a), Some(y)));
        assert_eq!(n.connector(up_j).unwrap().selection(), (Some(a), Some(u)));
        assert!(n.route_segment(a, u));
        assert_eq!(n.connector(down_j).unwrap().selection(), (Some(a), Some(y)));
    }

    #[test]
    fn route_segment_needs_a_shared_junction() {
        let (mut n, a, b, _) = two_segments();
        let unrelated = n.create_segment("Z", 1).unwrap();
        assert!(!n.route_segment(a, unrelated));
        assert!(n.route_segment(a, b));
    }

    #[test]
    fn find_skips_junctions() {
        let (mut n, _, _, j) = two_segments();
        let name = n.name(j).to_string();
        let s = n.create_segment(&name, 3).unwrap();
        assert_eq!(n.find(&name), Some(s));
        assert!(n.is_terminator(n.find("TB").unwrap()));
        assert_eq!(n.find("nothing"), None);
    }

    #[test]
    fn construction_errors_leave_network_unchanged() {
        let (mut n, a, b, _) = two_segments();
        let count = n.components().len();
        assert_eq!(n.add_terminator(a, Up, "T"), Err(NetworkError::EndConnected("A".to_string(), Up)));
        assert_eq!(n.attach_segment(b, Up, "C", 5), Err(NetworkError::EndConnected("B".to_string(), Up)));
        assert_eq!(n.connect_segments(a, Up, b, Down),
                   Err(NetworkError::EndConnected("B".to_string(), Down)));
        assert_eq!(n.create_segment("Z", 0), Err(NetworkError::ZeroLength("Z".to_string())));
        let tb = n.find("TB").unwrap();
        assert_eq!(n.add_signal(tb, Up), Err(NetworkError::NotASegment("TB".to_string())));
        assert_eq!(n.components().len(), count);
    }

    #[test]
    fn connect_segments_reuses_existing_junction() {
        let mut n = Network::new();
        let a = n.create_segment("A", 20).unwrap();
        let b = n.attach_segment(a, Up, "B", 20).unwrap();
        let c = n.attach_segment(b, Up, "C", 10).unwrap();
        let d = n.attach_segment(a, Up, "D", 10).unwrap();
        let j2 = n.next_connector(b, Up).unwrap();
        assert_eq!(n.connect_segments(d, Up, c, Down), Ok(j2));
        assert_eq!(n.connector(j2).unwrap().segments(), &[b, c, d]);

        let e = n.create_segment("E", 3).unwrap();
        let f = n.create_segment("F", 3).unwrap();
        let j = n.connect_segments(e, Up, f, Down).unwrap();
        assert_eq!(n.traverse(e, Up), Traversal::Progressed(f));
        assert_eq!(n.name(j), format!("J{}", j));
    }
}
