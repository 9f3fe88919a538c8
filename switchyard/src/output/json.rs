use failure::Error;
use std::io;

use super::history::{History, NetworkLogEvent, TrainLogEvent};
use super::report::Report;
use crate::railway::network::{Component, Network};

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn train_event(network: &Network, h: &History, ev: &TrainLogEvent) -> (&'static str, String) {
    match *ev {
        TrainLogEvent::Enter(c) => ("enter", network.name(c).to_string()),
        TrainLogEvent::Stopped => ("stopped", String::new()),
        TrainLogEvent::Held => ("held", String::new()),
        TrainLogEvent::Fault(ref f) => ("fault", format!("{}", f)),
        TrainLogEvent::Collided(other) => {
            ("collided", h.trains.get(other).map(|t| t.0.clone()).unwrap_or_default())
        }
        TrainLogEvent::Finished(state) => ("finished", state.as_str().to_string()),
    }
}

pub fn json_history<W: io::Write>(network: &Network,
                                  history: &History,
                                  report: &Report,
                                  f: &mut W)
                                  -> Result<(), Error> {
    let train_name = |id: usize| history.trains.get(id).map(|t| escape(&t.0)).unwrap_or_default();

    write!(f, "{{ \"network\": {{\n")?;
    write!(f, "\"components\": [")?;
    let mut first = true;
    for c in network.components() {
        if first { first = false; } else { write!(f, ", ")?; }
        let kind = match *c {
            Component::Segment(_) => "segment",
            Component::Junction(_) => "junction",
            Component::Terminator(_) => "terminator",
        };
        write!(f, "{{ \"name\": \"{}\", \"kind\": \"{}\", \"length\": {} }}",
               escape(c.name()), kind, c.length())?;
    }
    write!(f, "],\n")?;

    write!(f, "\"events\": [")?;
    let mut first = true;
    for &(tick, ref ev) in &history.network {
        if first { first = false; } else { write!(f, ", ")?; }
        let (event, train) = match *ev {
            NetworkLogEvent::Routed(t) => ("routed", t),
            NetworkLogEvent::CommitFailed(t) => ("commit_failed", t),
            NetworkLogEvent::NoPath(t) => ("no_path", t),
        };
        write!(f, "{{ \"tick\": {}, \"event\": \"{}\", \"train\": \"{}\" }}",
               tick, event, train_name(train))?;
    }
    write!(f, "] }},\n")?;

    write!(f, "\"trains\": {{")?;
    let mut first = true;
    for &(ref name, ref events) in &history.trains {
        if first { first = false; } else { write!(f, ", ")?; }
        write!(f, "\"{}\": [", escape(name))?;
        let mut first_event = true;
        for &(tick, ref ev) in events {
            if first_event { first_event = false; } else { write!(f, ", ")?; }
            let (event, value) = train_event(network, history, ev);
            write!(f, "{{ \"tick\": {}, \"event\": \"{}\", \"value\": \"{}\" }}",
                   tick, event, escape(&value))?;
        }
        write!(f, "]")?;
    }
    write!(f, "}},\n")?;

    write!(f, "\"report\": {{ \"ticks\": {}, \"success\": {}, \"trains\": [",
           report.ticks, report.success())?;
    let mut first = true;
    for t in report.finished.iter().chain(report.running.iter()) {
        if first { first = false; } else { write!(f, ", ")?; }
        write!(f,
               "{{ \"name\": \"{}\", \"state\": \"{}\", \"location\": \"{}\", \"distance\": {}, \
                \"stopped\": {}, \"faults\": {} }}",
               escape(&t.name), t.state.as_str(), escape(&t.location), t.distance, t.stopped, t.faults)?;
    }
    write!(f, "] }} }}\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::railway::network::Direction;
    use crate::railway::train::TrainState;
    use crate::output::report::TrainSummary;

    #[test]
    fn writes_history_and_report() {
        let mut n = Network::new();
        let a = n.create_segment("A\"1", 2).unwrap();
        let t = n.add_terminator(a, Direction::Up, "End").unwrap();
        let mut h = History::default();
        let id = h.add_train("t1");
        h.log_network(1, NetworkLogEvent::Routed(id));
        h.log_train(id, 2, TrainLogEvent::Enter(t));
        h.log_train(id, 2, TrainLogEvent::Finished(TrainState::Success));
        let report = Report {
            ticks: 2,
            finished: vec![TrainSummary {
                id: id,
                name: "t1".to_string(),
                state: TrainState::Success,
                location: "End".to_string(),
                distance: 2,
                stopped: 0,
                faults: 0,
            }],
            running: vec![],
        };
        let mut out = Vec::new();
        json_history(&n, &h, &report, &mut out).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("{ \"name\": \"A\\\"1\", \"kind\": \"segment\", \"length\": 2 }"));
        assert!(s.contains("{ \"tick\": 1, \"event\": \"routed\", \"train\": \"t1\" }"));
        assert!(s.contains("\"t1\": [{ \"tick\": 2, \"event\": \"enter\", \"value\": \"End\" }, \
                            { \"tick\": 2, \"event\": \"finished\", \"value\": \"success\" }]"));
        assert!(s.contains("\"report\": { \"ticks\": 2, \"success\": true"));
    }
}
