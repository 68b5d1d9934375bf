pub mod accumulator;
pub mod display;
pub mod engine;
pub mod event;
pub mod ledger;
