use json::JsonValue;
use palette::Srgb;

use crate::composer::Pixel;
use crate::controller::MAX_TICK_PERIOD_MS;
use crate::effects::flame::{DEFAULT_COOLING, MAX_COOLING};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelEffect {
    Flash,
    Wave,
    Wavelet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetAll(Pixel),
    SetOne {
        index: usize,
        color: Pixel,
    },
    SetList(Vec<Pixel>),
    Gradient {
        start: usize,
        count: usize,
        from: Pixel,
        to: Pixel,
    },
    Brightness(f32),
    PanelOff,
    Panel {
        effect: PanelEffect,
        duration_ms: u32,
        length: f32,
        freq: f32,
        color: Pixel,
    },
    Flame {
        duration_ms: u32,
        period_ms: u32,
        color: Pixel,
        randomness: u32,
        count: usize,
    },
}

/// The topic suffixes commands are accepted on.
pub const TOPICS: [&str; 7] = [
    "color",
    "pixel",
    "pixels",
    "gradient",
    "brightness",
    "panel",
    "flame",
];

impl Command {
    /// Decodes a JSON payload received on the topic named `kind`.
    pub fn parse(kind: &str, payload: &str) -> Result<Command, String> {
        let json = json::parse(payload).map_err(|err| format!("Invalid JSON: {err}"))?;
        if !json.is_object() {
            return Err(format!("Expected a JSON object, got {json}"));
        }

        match kind {
            "color" => Ok(Command::SetAll(color(&json))),
            "pixel" => Ok(Command::SetOne {
                index: required_usize(&json, "index")?,
                color: color(&json),
            }),
            "pixels" => pixel_list(&json["pixels"]).map(Command::SetList),
            "gradient" => Ok(Command::Gradient {
                start: optional_usize(&json, "start", 0)?,
                count: required_usize(&json, "count")?,
                from: color(&json["from"]),
                to: color(&json["to"]),
            }),
            "brightness" => match json["value"].as_f32() {
                Some(value) => Ok(Command::Brightness(value)),
                None => Err(format!("Unexpected brightness value: {}", json["value"])),
            },
            "panel" => panel(&json),
            "flame" => Ok(Command::Flame {
                duration_ms: duration(&json)?,
                period_ms: bounded_u32(&json, "period", 0, MAX_TICK_PERIOD_MS)?,
                color: color(&json),
                randomness: bounded_u32(&json, "randomness", DEFAULT_COOLING, MAX_COOLING)?,
                count: required_usize(&json, "count")?,
            }),
            _ => Err(format!("Unknown command: {kind}")),
        }
    }
}

fn panel(json: &JsonValue) -> Result<Command, String> {
    let effect = match json["action"].as_str() {
        Some("off") => return Ok(Command::PanelOff),
        Some("flash") => PanelEffect::Flash,
        Some("wave") => PanelEffect::Wave,
        Some("wavelet") => PanelEffect::Wavelet,
        Some(other) => return Err(format!("Unexpected panel action: {other}")),
        None => return Err(format!("Missing panel action in {json}")),
    };

    let (length, freq) = if effect == PanelEffect::Flash {
        (0.0, 0.0)
    } else {
        (required_f32(json, "length")?, required_f32(json, "freq")?)
    };

    Ok(Command::Panel {
        effect,
        duration_ms: duration(json)?,
        length,
        freq,
        color: color(json),
    })
}

/// Missing channels are 0, values above 255 saturate.
fn color(json: &JsonValue) -> Pixel {
    let channel = |key: &str| json[key].as_f64().unwrap_or(0.0).clamp(0.0, 255.0) as u8;
    Srgb::new(channel("red"), channel("green"), channel("blue"))
}

fn pixel_list(json: &JsonValue) -> Result<Vec<Pixel>, String> {
    if !json.is_array() {
        return Err(format!("Expected an array of channels, got {json}"));
    }

    let mut channels = Vec::with_capacity(json.len());
    for value in json.members() {
        match value.as_f64() {
            Some(v) => channels.push(v.clamp(0.0, 255.0) as u8),
            None => return Err(format!("Unexpected channel value: {value}")),
        }
    }
    if channels.len() % 3 != 0 {
        log::warn!("Ignoring {} trailing channels", channels.len() % 3);
    }

    Ok(channels
        .chunks_exact(3)
        .map(|rgb| Srgb::new(rgb[0], rgb[1], rgb[2]))
        .collect())
}

/// Negative durations mean the action is already over.
fn duration(json: &JsonValue) -> Result<u32, String> {
    match json["duration"].as_f64() {
        Some(ms) => Ok(ms.clamp(0.0, u32::MAX as f64) as u32),
        None => Err(format!("Unexpected duration: {}", json["duration"])),
    }
}

fn required_f32(json: &JsonValue, key: &str) -> Result<f32, String> {
    json[key]
        .as_f32()
        .ok_or_else(|| format!("Unexpected {key}: {}", json[key]))
}

fn required_usize(json: &JsonValue, key: &str) -> Result<usize, String> {
    json[key]
        .as_usize()
        .ok_or_else(|| format!("Unexpected {key}: {}", json[key]))
}

fn optional_usize(json: &JsonValue, key: &str, default: usize) -> Result<usize, String> {
    if json[key].is_null() {
        return Ok(default);
    }
    required_usize(json, key)
}

fn bounded_u32(json: &JsonValue, key: &str, default: u32, max: u32) -> Result<u32, String> {
    let value = optional_usize(json, key, default as usize)?;
    match u32::try_from(value) {
        Ok(value) if value <= max => Ok(value),
        _ => Err(format!("{key} {value} outside of 0..={max}")),
    }
}
