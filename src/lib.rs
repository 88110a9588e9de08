//! Result logging with a moving-average heuristic and a tiny next-result
//! regression model.

pub mod analysis;
pub mod bootstrap;
pub mod dashboard;
pub mod feed;
pub mod logging;
pub mod model;
pub mod present;
pub mod repl;
pub mod session;
pub mod state;
pub mod trainer;
