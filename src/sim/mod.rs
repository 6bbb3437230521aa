pub mod bridge;
pub mod context;
pub mod controller;
pub mod event;
pub mod scheduler;
pub mod sequencer;
pub mod session;
