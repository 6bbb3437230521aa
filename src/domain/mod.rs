pub mod catalog;
pub mod input;
pub mod levels;
pub mod physics;
