// Library root
// -----------
// The binary (`main.rs`) only parses flags and wires these modules together.
//
// Module responsibilities:
// - `config`: `USERINFO` parsing, account credentials and run tunables.
// - `service`: starts (and always stops) the local API service.
// - `api`: HTTP calls to the reward API and their response types.
// - `processor`: the per-account claim sequence.
// - `report`: per-account results and the final summary.
// - `ui`: colored console output and visible waits.
pub mod api;
pub mod config;
pub mod error;
pub mod processor;
pub mod report;
pub mod service;
pub mod ui;
