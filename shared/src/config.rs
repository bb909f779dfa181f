/// Physics tuning for the table simulation.
///
/// Per-frame coefficients (`friction`, `spin_decay`) are applied as
/// `coefficient^(1/sub_steps)` on every sub-step so that one frame of
/// motion is independent of the sub-step count.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PhysicsConfig {
    /// Fixed sub-steps per frame
    pub sub_steps: u32,
    /// Linear velocity retained per frame
    pub friction: f64,
    pub rail_friction: f64,
    pub cushion_bounce: f64,
    /// Spin retained per frame, and per cushion hit on the hit axis
    pub spin_decay: f64,
    /// Spin to acceleration factor
    pub max_spin: f64,
    /// Fraction of the normal spin difference moved between colliding balls
    pub spin_transfer: f64,
    pub collision_spin_damping: f64,
    /// Lower bound on the separating impulse of an approaching pair
    pub min_impulse: f64,
    /// Per-axis speed below which a moving ball comes to rest
    pub stop_speed: f64,
    pub corner_approach_dot: f64,
    pub side_approach_dot: f64,
    pub min_radial_speed: f64,
    /// Cue ball speed at full power (units per frame)
    pub max_shot_speed: f64,
    pub english_spin_scale: f64,
    /// Per-axis speed at which a preview run is considered settled
    pub prediction_rest_speed: f64,
    pub prediction_max_frames: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            sub_steps: 16,
            friction: 0.99,
            rail_friction: 0.75,
            cushion_bounce: 0.75,
            spin_decay: 0.95,
            max_spin: 0.3,
            spin_transfer: 0.8,
            collision_spin_damping: 0.9,
            min_impulse: 0.01,
            stop_speed: 0.03,
            corner_approach_dot: 0.45,
            side_approach_dot: 0.7,
            min_radial_speed: 0.05,
            max_shot_speed: 18.0,
            english_spin_scale: 0.02,
            prediction_rest_speed: 0.028,
            prediction_max_frames: 300,
        }
    }
}

fn check_unit_interval(name: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(format!("{} must be finite and within [0, 1]", name));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("{} must be finite and > 0", name));
    }
    Ok(())
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sub_steps == 0 || self.sub_steps > 256 {
            return Err("sub_steps must be in 1..=256".to_string());
        }
        check_positive("friction", self.friction)?;
        if self.friction > 1.0 {
            return Err("friction must be <= 1".to_string());
        }
        check_unit_interval("rail_friction", self.rail_friction)?;
        check_unit_interval("cushion_bounce", self.cushion_bounce)?;
        check_unit_interval("spin_decay", self.spin_decay)?;
        check_unit_interval("spin_transfer", self.spin_transfer)?;
        check_unit_interval("collision_spin_damping", self.collision_spin_damping)?;
        if !self.max_spin.is_finite() || self.max_spin < 0.0 {
            return Err("max_spin must be finite and >= 0".to_string());
        }
        check_positive("min_impulse", self.min_impulse)?;
        check_positive("stop_speed", self.stop_speed)?;
        for (name, value) in [
            ("corner_approach_dot", self.corner_approach_dot),
            ("side_approach_dot", self.side_approach_dot),
        ] {
            if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
                return Err(format!("{} must be within [-1, 1]", name));
            }
        }
        if !self.min_radial_speed.is_finite() || self.min_radial_speed < 0.0 {
            return Err("min_radial_speed must be finite and >= 0".to_string());
        }
        check_positive("max_shot_speed", self.max_shot_speed)?;
        if !self.english_spin_scale.is_finite() || self.english_spin_scale < 0.0 {
            return Err("english_spin_scale must be finite and >= 0".to_string());
        }
        check_positive("prediction_rest_speed", self.prediction_rest_speed)?;
        if self.prediction_max_frames == 0 {
            return Err("prediction_max_frames must be > 0".to_string());
        }
        Ok(())
    }
}
