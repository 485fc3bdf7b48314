#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::float_cmp
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Vehicle state normalizer (bus-agnostic).
//!
//! Turns one cycle of decoded bus signals into a `CarStateSnapshot` for the
//! control stack. Decoding, the speed filter and value tables are reached
//! through the `carstate_traits` seams.
//!
//! ## Architecture
//!
//! - **Variants**: static descriptor table, one row per model (`variant` module)
//! - **Schema**: per-session bus subscription lists (`schema` module)
//! - **Steering**: offset calibration (`steering`) and secondary-sensor rate (`rate_ring`)
//! - **Cruise**: availability, engagement, standstill, lockout (`cruise` module)
//! - **Normalizer**: per-tick assembly over an explicit `SessionState` (`normalizer`)
//!
//! ## Determinism
//!
//! The normalizer reads no wall clock. Elapsed time is an input, and all
//! memory lives in `SessionState`, so replaying the same frames yields the
//! same snapshots.

pub mod builder;
pub mod config;
pub mod conversions;
pub mod cruise;
pub mod error;
pub mod filter;
pub mod frame;
pub mod gear;
pub mod mocks;
pub mod normalizer;
pub mod rate_ring;
pub mod schema;
pub mod session;
mod signals;
pub mod snapshot;
pub mod speed;
pub mod steering;
pub mod util;
pub mod variant;

pub use builder::{CarState, CarStateBuilder, Missing, Set, build_normalizer};
pub use config::NormalizerCfg;
pub use error::{BuildError, Bus, CarStateError, Result};
pub use frame::DecodedFrame;
pub use normalizer::{StateNormalizer, required_signals};
pub use schema::{BusSchema, FreshnessCheck, SessionSchema, SignalRequest, build_schema};
pub use session::SessionState;
pub use snapshot::{CarStateSnapshot, CruiseState, GearShifter, WheelSpeeds};
pub use variant::{SessionConfig, VariantDescriptor, VariantProfile, VehicleVariant};
