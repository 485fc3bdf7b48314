//! JSON-lines replay of recorded bus cycles through the normalizer.
//!
//! Each non-blank input line is one cycle:
//! `{"elapsed_s": 0.01, "pt": {"valid": true, "signals": {"MSG.SIG": 1.0}}, "cam": {...}}`

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use carstate_core::{CarState, DecodedFrame};
use carstate_traits::Clock;
use eyre::{Result, WrapErr};
use serde::Deserialize;

fn default_valid() -> bool {
    true
}

/// Decoded values of one bus, keyed `"MESSAGE.SIGNAL"`.
#[derive(Debug, Deserialize)]
pub struct FrameRecord {
    #[serde(default = "default_valid")]
    pub valid: bool,
    #[serde(default)]
    pub signals: BTreeMap<String, f64>,
}

impl Default for FrameRecord {
    fn default() -> Self {
        Self {
            valid: true,
            signals: BTreeMap::new(),
        }
    }
}

impl FrameRecord {
    pub fn to_frame(&self) -> Result<DecodedFrame> {
        let mut frame = DecodedFrame::new(self.valid);
        for (key, value) in &self.signals {
            let Some((message, signal)) = key.split_once('.') else {
                eyre::bail!("signal key {key:?} is not MESSAGE.SIGNAL");
            };
            frame.set(message, signal, *value);
        }
        Ok(frame)
    }
}

#[derive(Debug, Deserialize)]
pub struct CycleRecord {
    /// Seconds since the previous record.
    pub elapsed_s: f64,
    pub pt: FrameRecord,
    #[serde(default)]
    pub cam: FrameRecord,
}

impl CycleRecord {
    /// Non-finite or negative intervals collapse to zero.
    pub fn elapsed(&self) -> Duration {
        match Duration::try_from_secs_f64(self.elapsed_s) {
            Ok(d) => d,
            Err(_) => {
                tracing::warn!(elapsed_s = self.elapsed_s, "unusable elapsed_s; using 0");
                Duration::ZERO
            }
        }
    }
}

/// How a replay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub cycles: usize,
    pub interrupted: bool,
}

/// Replay every record in `input`, writing one snapshot JSON line per cycle to `out`.
///
/// When `clock` is given, sleeps each record's interval before processing it.
pub fn run_replay<R, W>(
    car: &mut CarState,
    input: R,
    out: &mut W,
    clock: Option<&dyn Clock>,
    limit: Option<usize>,
    shutdown: &AtomicBool,
) -> Result<ReplayOutcome>
where
    R: BufRead,
    W: Write,
{
    let mut outcome = ReplayOutcome {
        cycles: 0,
        interrupted: false,
    };
    for (idx, line) in input.lines().enumerate() {
        if limit.is_some_and(|n| outcome.cycles >= n) {
            break;
        }
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!(cycles = outcome.cycles, "replay interrupted");
            outcome.interrupted = true;
            break;
        }
        let lineno = idx + 1;
        let line = line.wrap_err_with(|| format!("read line {lineno}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let rec: CycleRecord =
            serde_json::from_str(trimmed).wrap_err_with(|| format!("parse line {lineno}"))?;
        let pt = rec.pt.to_frame().wrap_err_with(|| format!("line {lineno}"))?;
        let cam = rec.cam.to_frame().wrap_err_with(|| format!("line {lineno}"))?;
        let elapsed = rec.elapsed();

        if let Some(clock) = clock {
            clock.sleep(elapsed);
        }

        let snap = car
            .update(&pt, &cam, elapsed)
            .wrap_err_with(|| format!("cycle at line {lineno}"))?;
        serde_json::to_writer(&mut *out, &snap)?;
        writeln!(out)?;
        outcome.cycles += 1;
        tracing::trace!(cycle = outcome.cycles, v_ego = snap.v_ego, "cycle normalized");
    }
    out.flush()?;
    Ok(outcome)
}
