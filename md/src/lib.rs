pub mod buffer;
pub mod comm;
pub mod config;
pub mod coupler;
pub mod deck;
pub mod domain;
pub mod engine;
pub mod error;
pub mod field;
pub mod force;
pub mod profile;
pub mod units;
pub mod xyz;

pub use buffer::{select_buffer_atoms, BufferPair, Side, Slab};
pub use comm::{average_blocks, Communicator, SerialCommunicator};
pub use config::HacConfig;
pub use coupler::{CouplingSchedule, CouplingSummary, ExchangeReport, HybridCoupler, Targets};
pub use deck::InputDeck;
pub use domain::{Domain, Setup};
pub use engine::{CommandSink, MdEngine};
pub use error::{ConfigError, EngineError, HacError, Result};
pub use field::{FieldArray, FieldShape, FieldSolver, FieldState, PrescribedFlow, SolverClock};
pub use force::LangevinBoundary;
