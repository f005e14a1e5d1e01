//! SpaceTrader market data exploration dashboard.
//!
//! Loads the public marketplace CSV once, derives time-differenced columns,
//! and serves a page whose location/symbol filter tables drive three charts.

pub mod charts;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod page;
pub mod prepare;
pub mod schema;
pub mod server;

#[cfg(feature = "python")]
mod python;

pub use charts::{Figure, FigureSet, LinearFit};
pub use config::Cli;
pub use dashboard::{on_selection_change, SelectionUpdate};
pub use error::DashError;
pub use filter::{filter_observations, FilterSelection};
pub use prepare::{prepare, prepare_frame, MarketData};
pub use server::{handle_request, run, serve, AppState};
