use tenball_shared::config::PhysicsConfig;

/// Per-match settings owned by `GameState`
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Seeds rack shuffling and jitter
    pub rng_seed: u64,
    /// Frames between a scratch settling and the cue ball coming back
    pub scratch_restore_delay_frames: u64,
    /// Frames between a game ending and the next rack. `None` waits for an
    /// explicit re-rack.
    pub rerack_delay_frames: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            scratch_restore_delay_frames: 30,
            rerack_delay_frames: None,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.scratch_restore_delay_frames == 0 {
            return Err("scratch_restore_delay_frames must be > 0".into());
        }
        if self.rerack_delay_frames == Some(0) {
            return Err("rerack_delay_frames must be > 0 when set".into());
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub frame_rate_hz: u32,
    pub broadcast_rate_hz: u32,
    pub max_connections: usize,
    /// Seat 2 is played by the built-in bot
    pub bot_opponent: bool,
    pub match_config: MatchConfig,
    pub physics: PhysicsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9001".to_string(),
            frame_rate_hz: 60,
            broadcast_rate_hz: 30,
            max_connections: 64,
            bot_opponent: false,
            match_config: MatchConfig::default(),
            physics: PhysicsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `TENBALL_LISTEN_ADDR`, `TENBALL_SEED` and
    /// `TENBALL_BOT`.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();
        if let Some(addr) = lookup("TENBALL_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(seed) = lookup("TENBALL_SEED") {
            config.match_config.rng_seed = seed
                .trim()
                .parse()
                .map_err(|e| format!("TENBALL_SEED {:?}: {}", seed, e))?;
        }
        if let Some(bot) = lookup("TENBALL_BOT") {
            config.bot_opponent = match bot.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                other => return Err(format!("TENBALL_BOT {:?} is not a boolean", other)),
            };
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("listen_addr must not be empty".into());
        }
        if self.frame_rate_hz == 0 {
            return Err("frame_rate_hz must be > 0".into());
        }
        if self.broadcast_rate_hz == 0 || self.broadcast_rate_hz > self.frame_rate_hz {
            return Err(format!(
                "broadcast_rate_hz must be in 1..={}",
                self.frame_rate_hz
            ));
        }
        if self.max_connections == 0 {
            return Err("max_connections must be > 0".into());
        }
        self.match_config.validate()?;
        self.physics.validate()
    }
}
