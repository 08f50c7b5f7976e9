pub mod ai;
pub mod control;
pub mod engine;
pub mod narration;
pub mod roster;
pub mod runner;
pub mod selection;
pub mod state;

#[cfg(test)]
pub(crate) mod tests;
