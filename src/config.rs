use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use config_file::FromConfigFile;
use serde::Deserialize;

use crate::controller;
use crate::olaoutput::UNIVERSE_SIZE;

pub const MAX_PIXELS: usize = UNIVERSE_SIZE / 3;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub pixel_count: usize,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_brightness")]
    pub brightness: f32,
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MqttConfig {
    pub url: String,
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
    pub unique_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_ola_addr")]
    pub ola_addr: SocketAddr,
    #[serde(default)]
    pub universe: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            ola_addr: default_ola_addr(),
            universe: 0,
        }
    }
}

fn default_tick_ms() -> u64 {
    20
}

fn default_brightness() -> f32 {
    1.0
}

fn default_topic_prefix() -> String {
    "lichtband".to_string()
}

fn default_ola_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7770))
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, String> {
        let config = Config::from_config_file(path)
            .map_err(|err| format!("Cannot read {}: {err}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.pixel_count == 0 || self.pixel_count > MAX_PIXELS {
            return Err(format!(
                "pixel_count must be between 1 and {MAX_PIXELS}, got {}",
                self.pixel_count
            ));
        }
        if self.tick_ms == 0 {
            return Err("tick_ms must be at least 1".to_string());
        }
        controller::validate_brightness(self.brightness)?;
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
