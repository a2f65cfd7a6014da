use crate::{
    constants::{
        DEFAULT_CRACK_GAP, DEFAULT_SHOCK_DURATION, DEFAULT_SHOCK_SPEED, DEFAULT_SOURCE_LIMIT,
        MAX_SHOCK_PARAM, MAX_SOURCE_LIMIT,
    },
    error::SmashError,
};

/// User-facing knobs of a smash run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmashSettings {
    /// Number of fracture cells to request. 0 lets the fracturer decide.
    pub source_limit: u32,
    /// Gap between neighbouring pieces (world units).
    pub crack_gap: f32,
    /// How fast the shock front travels away from the impact (units per second).
    pub shock_speed: f32,
    /// How long the shock front keeps growing (seconds).
    pub shock_duration: f32,
    /// Release pieces that lose their path to the ground.
    pub detect_disconnected: bool,
}

impl Default for SmashSettings {
    fn default() -> Self {
        Self {
            source_limit: DEFAULT_SOURCE_LIMIT,
            crack_gap: DEFAULT_CRACK_GAP,
            shock_speed: DEFAULT_SHOCK_SPEED,
            shock_duration: DEFAULT_SHOCK_DURATION,
            detect_disconnected: false,
        }
    }
}

impl SmashSettings {
    pub fn validate(&self) -> Result<(), SmashError> {
        if self.source_limit > MAX_SOURCE_LIMIT {
            return Err(SmashError::InvalidSetting {
                name: "source_limit",
                value: self.source_limit as f32,
            });
        }
        check_range("crack_gap", self.crack_gap, 1.0)?;
        check_range("shock_speed", self.shock_speed, MAX_SHOCK_PARAM)?;
        check_range("shock_duration", self.shock_duration, MAX_SHOCK_PARAM)?;
        Ok(())
    }
}

/// `0..=max`, NaN rejected.
fn check_range(name: &'static str, value: f32, max: f32) -> Result<(), SmashError> {
    if (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(SmashError::InvalidSetting { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let s = SmashSettings::default();
        assert_eq!(s.source_limit, 32);
        assert_eq!(s.shock_speed, 343.0);
        assert!(!s.detect_disconnected);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn out_of_range_values_are_named() {
        let s = SmashSettings {
            crack_gap: 1.5,
            ..Default::default()
        };
        assert_eq!(
            s.validate(),
            Err(SmashError::InvalidSetting {
                name: "crack_gap",
                value: 1.5
            })
        );

        let s = SmashSettings {
            source_limit: MAX_SOURCE_LIMIT + 1,
            ..Default::default()
        };
        assert!(matches!(
            s.validate(),
            Err(SmashError::InvalidSetting { name: "source_limit", .. })
        ));

        let s = SmashSettings {
            shock_duration: f32::NAN,
            ..Default::default()
        };
        assert!(s.validate().is_err());

        let s = SmashSettings {
            shock_speed: -1.0,
            ..Default::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let s = SmashSettings {
            source_limit: 0,
            crack_gap: 1.0,
            shock_speed: 0.0,
            shock_duration: MAX_SHOCK_PARAM,
            detect_disconnected: true,
        };
        assert!(s.validate().is_ok());
    }
}
