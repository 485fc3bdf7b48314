//! Cruise availability, engagement, standstill and low-speed lockout.

use carstate_traits::SignalFrame;

use crate::error::{Bus, CarStateError};
use crate::session::{ACC_TYPE_PERMANENT_LOCKOUT, ACC_TYPE_STANDARD, SessionState};
use crate::signals::{code, flag, read};
use crate::snapshot::CruiseState;
use crate::util::KPH_TO_MS;
use crate::variant::{CruiseSource, LockoutRule, VariantProfile};

/// `PCM_CRUISE.CRUISE_STATE` code reported while held at a stop.
pub const CRUISE_STATE_STANDSTILL: i64 = 7;
/// `PCM_CRUISE_2.LOW_SPEED_LOCKOUT` code meaning "locked out".
pub const LOW_SPEED_LOCKOUT_ACTIVE: i64 = 2;

/// Cruise state codes of plain (non-adaptive) cruise control.
#[inline]
pub fn is_non_adaptive(cruise_state: i64) -> bool {
    (1..=6).contains(&cruise_state)
}

/// Classifies cruise state per variant, updating the session's lockout latch
/// and last-seen cruise state.
#[derive(Debug, Clone, Copy)]
pub struct CruiseStateClassifier<'p> {
    profile: &'p VariantProfile,
}

impl<'p> CruiseStateClassifier<'p> {
    pub fn new(profile: &'p VariantProfile) -> Self {
        Self { profile }
    }

    pub fn classify<P, C>(
        &self,
        pt: &P,
        cam: &C,
        session: &mut SessionState,
    ) -> Result<CruiseState, CarStateError>
    where
        P: SignalFrame + ?Sized,
        C: SignalFrame + ?Sized,
    {
        let d = self.profile.descriptor();
        let mut out = CruiseState::default();

        match d.cruise {
            CruiseSource::Dsu => {
                out.available = flag(read(pt, Bus::Pt, "DSU_CRUISE", "MAIN_ON")?);
                out.speed = read(pt, Bus::Pt, "DSU_CRUISE", "SET_SPEED")? * KPH_TO_MS;
            }
            CruiseSource::SingleState => {
                out.available = true;
                out.speed = 0.0;
            }
            CruiseSource::Pcm => {
                out.available = flag(read(pt, Bus::Pt, "PCM_CRUISE_2", "MAIN_ON")?);
                out.speed = read(pt, Bus::Pt, "PCM_CRUISE_2", "SET_SPEED")? * KPH_TO_MS;
            }
        }

        if d.second_gen_assist {
            session.acc_type = code(read(cam, Bus::Cam, "ACC_CONTROL", "ACC_TYPE")?);
        }
        self.update_lockout(pt, session)?;

        if d.cruise == CruiseSource::SingleState {
            out.enabled = flag(read(pt, Bus::Pt, "PCM_CRUISE_SM", "CRUISE_CONTROL_STATE")?);
            out.non_adaptive = false;
        } else {
            let status = code(read(pt, Bus::Pt, "PCM_CRUISE", "CRUISE_STATE")?);
            session.pcm_acc_status = Some(status);
            out.enabled = flag(read(pt, Bus::Pt, "PCM_CRUISE", "CRUISE_ACTIVE")?);
            out.non_adaptive = is_non_adaptive(status);
        }

        // These platforms resume from a stop without the driver's restart gesture.
        out.standstill = if d.no_stop_timer || self.profile.gas_interceptor() {
            false
        } else {
            session.pcm_acc_status == Some(CRUISE_STATE_STANDSTILL)
        };

        Ok(out)
    }

    fn update_lockout<P: SignalFrame + ?Sized>(
        &self,
        pt: &P,
        session: &mut SessionState,
    ) -> Result<(), CarStateError> {
        let refresh = match self.profile.descriptor().lockout {
            LockoutRule::NotTracked => false,
            LockoutRule::Always => true,
            LockoutRule::WhenAccTypeOne => {
                if session.acc_type == ACC_TYPE_STANDARD {
                    true
                } else {
                    if session.acc_type == ACC_TYPE_PERMANENT_LOCKOUT
                        && !session.lockout_quirk_reported
                    {
                        session.lockout_quirk_reported = true;
                        tracing::warn!(
                            variant = %self.profile.variant(),
                            "ACC type 2 reports permanent low-speed lockout; ignoring lockout signal"
                        );
                    }
                    false
                }
            }
        };
        if refresh {
            let v = code(read(pt, Bus::Pt, "PCM_CRUISE_2", "LOW_SPEED_LOCKOUT")?);
            session.low_speed_lockout = v == LOW_SPEED_LOCKOUT_ACTIVE;
        }
        Ok(())
    }
}
