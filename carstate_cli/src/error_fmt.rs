//! Human-readable error descriptions and structured JSON error formatting.

use carstate_core::error::{BuildError, CarStateError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSession => {
                "What happened: No vehicle session was configured.\nLikely causes: The builder was used without with_session(...).\nHow to fix: Provide a [vehicle] section in the config.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in [control].\nHow to fix: Edit the config file, then rerun."
            ),
            BuildError::RejectedConfig(msg) => format!(
                "What happened: Configuration is invalid ({msg}).\nLikely causes: Empty [vehicle].variant, out-of-range [control] values or an unknown [logging].rotation.\nHow to fix: Edit the TOML config and try again."
            ),
            BuildError::SchemaMismatch { bus, message, signal } => format!(
                "What happened: The normalizer reads {bus}:{message}.{signal} but the bus schema never subscribes to it.\nLikely causes: A variant table entry was changed without updating the schema.\nHow to fix: This is a build defect; report it with the variant name."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<CarStateError>() {
        return match ce {
            CarStateError::MissingSignal { bus, message, signal } => format!(
                "What happened: Signal {bus}:{message}.{signal} was missing from a decoded frame.\nLikely causes: The recording was captured for a different variant or the bus stack dropped the signal.\nHow to fix: Check [vehicle].variant and regenerate frames from `carstate schema`."
            ),
            CarStateError::UnknownVariant(name) => format!(
                "What happened: Unknown vehicle variant {name:?}.\nLikely causes: Typo in [vehicle].variant.\nHow to fix: Run `carstate variants` for the supported names."
            ),
        };
    }

    // String-based heuristics for errors coming from config loading
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.starts_with("read config") {
        return format!(
            "What happened: Could not read the config file.\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config FILE pointing at a readable TOML file. Details: {msg}"
        );
    }
    if lower.starts_with("parse config") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid or incomplete.\nLikely causes: Missing [vehicle] section or out-of-range values.\nHow to fix: Edit the TOML config and try again. Details: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Details: {msg}"
    )
}

/// Stable exit codes: 3 for config validation/build errors, 4 for frame/schema
/// mismatches at runtime, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 3;
    }
    match err.downcast_ref::<CarStateError>() {
        Some(CarStateError::UnknownVariant(_)) => 3,
        Some(CarStateError::MissingSignal { .. }) => 4,
        None => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSession => "MissingSession",
            BuildError::InvalidConfig(_) => "InvalidConfig",
            BuildError::RejectedConfig(_) => "RejectedConfig",
            BuildError::SchemaMismatch { .. } => "SchemaMismatch",
        };
    }
    match err.downcast_ref::<CarStateError>() {
        Some(CarStateError::MissingSignal { .. }) => "MissingSignal",
        Some(CarStateError::UnknownVariant(_)) => "UnknownVariant",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let msg = humanize(err);
    let reason = reason_name(err);
    if let Some(CarStateError::MissingSignal {
        bus,
        message,
        signal,
    }) = err.downcast_ref::<CarStateError>()
    {
        return json!({
            "reason": reason,
            "details": { "bus": bus.to_string(), "message": message, "signal": signal },
            "message": msg,
        })
        .to_string();
    }
    json!({ "reason": reason, "message": msg }).to_string()
}
