//! Railway network model, routing and trains.

pub mod network;
pub mod pathfinder;
pub mod traffic;
pub mod train;
