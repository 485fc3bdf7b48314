use thiserror::Error;

/// Which of the two per-cycle frames a signal was expected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    /// Primary vehicle (powertrain) bus.
    Pt,
    /// Camera / driver-assist bus.
    Cam,
}

impl core::fmt::Display for Bus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Bus::Pt => f.write_str("pt"),
            Bus::Cam => f.write_str("cam"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CarStateError {
    /// A signal the active variant depends on was absent from the decoded frame.
    /// The schema handed to the bus stack and the normalizer disagree; not recoverable.
    #[error("missing signal {bus}:{message}.{signal}")]
    MissingSignal {
        bus: Bus,
        message: String,
        signal: String,
    },
    #[error("unknown vehicle variant: {0}")]
    UnknownVariant(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("missing session config")]
    MissingSession,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// The loaded config file failed validation.
    #[error("config rejected: {0}")]
    RejectedConfig(String),
    /// The normalizer reads a signal that the bus schema never subscribes to.
    #[error("schema does not subscribe {bus}:{message}.{signal}")]
    SchemaMismatch {
        bus: Bus,
        message: &'static str,
        signal: &'static str,
    },
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
