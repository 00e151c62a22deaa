//! Scene configuration with optional overrides from an inline JSON block
//! and from URL parameters.

use serde::{Deserialize, Serialize};

use crate::util::cwarn;

/// Tuning for the rabbit actor. The animation durations must match the
/// keyframes of the same name in `index.html`; if they drift apart the
/// completion events never line up and the sprite stalls in its current
/// phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RabbitConfig {
    /// Unscaled sprite dimensions in px.
    pub sprite_width: f64,
    pub sprite_height: f64,
    pub scale: f64,
    /// Paired with the `rabbit-drop` keyframes.
    pub drop_duration_ms: u32,
    /// Paired with the `rabbit-jump` keyframes.
    pub jump_duration_ms: u32,
    pub jump_distance: f64,
    pub cooldown_ms: u32,
    /// Pointer distance below which an idle rabbit jumps.
    pub trigger_distance: f64,
    pub glow_range: f64,
    pub glow_exponent: f64,
    pub max_proximity_glow: f64,
    pub max_proximity_spread: f64,
    pub click_radius: f64,
    pub glow_boost_per_click: f64,
    pub max_glow_bonus: f64,
}

impl Default for RabbitConfig {
    fn default() -> Self {
        Self {
            sprite_width: 32.0,
            sprite_height: 32.0,
            scale: 3.0,
            drop_duration_ms: 900,
            jump_duration_ms: 600,
            jump_distance: 220.0,
            cooldown_ms: 1200,
            trigger_distance: 160.0,
            glow_range: 420.0,
            glow_exponent: 2.2,
            max_proximity_glow: 2.5,
            max_proximity_spread: 1.8,
            click_radius: 60.0,
            glow_boost_per_click: 0.2,
            max_glow_bonus: 1.0,
        }
    }
}

impl RabbitConfig {
    pub fn rendered_width(&self) -> f64 {
        self.sprite_width * self.scale
    }

    pub fn rendered_height(&self) -> f64 {
        self.sprite_height * self.scale
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub intro_lines: Vec<String>,
    pub type_speed_ms: u32,
    /// Pause after the last typed character before the scene starts.
    pub outro_pause_ms: u32,
    pub skip_intro: bool,
    pub rabbit: RabbitConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            intro_lines: vec![
                "guest@crt:~$ ./welcome.sh".to_string(),
                "BOOT OK. phosphor warm, signal locked.".to_string(),
                "scanning burrow ............ found.".to_string(),
                "one (1) rabbit inbound. be gentle.".to_string(),
            ],
            type_speed_ms: 28,
            outro_pause_ms: 900,
            skip_intro: false,
            rabbit: RabbitConfig::default(),
        }
    }
}

/// Defaults, then the inline `#scene-config` JSON block if present, then
/// URL parameters on top.
pub fn load() -> SceneConfig {
    let mut cfg = inline_config().unwrap_or_default();
    apply_url_overrides(&mut cfg);
    cfg
}

fn inline_config() -> Option<SceneConfig> {
    let document = web_sys::window()?.document()?;
    let node = document.get_element_by_id("scene-config")?;
    let text = node.text_content()?;
    match serde_json::from_str(&text) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            cwarn(&format!("ignoring inline scene-config: {err}"));
            None
        }
    }
}

const URL_KEYS: [&str; 3] = ["skip", "scale", "speed"];

fn apply_url_overrides(cfg: &mut SceneConfig) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(search) = window.location().search() else {
        return;
    };
    let Ok(params) = web_sys::UrlSearchParams::new_with_str(&search) else {
        return;
    };
    for key in URL_KEYS {
        if let Some(value) = params.get(key) {
            apply_override(cfg, key, &value);
        }
    }
}

fn apply_override(cfg: &mut SceneConfig, key: &str, value: &str) {
    match key {
        "skip" => cfg.skip_intro = value != "0",
        "scale" => {
            if let Ok(scale) = value.parse::<f64>() {
                if scale > 0.0 {
                    cfg.rabbit.scale = scale;
                }
            }
        }
        "speed" => {
            if let Ok(speed) = value.parse::<u32>() {
                cfg.type_speed_ms = speed.max(1);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults_for_the_rest() {
        let cfg: SceneConfig =
            serde_json::from_str(r#"{"skip_intro": true, "rabbit": {"scale": 2.0}}"#).unwrap();
        assert!(cfg.skip_intro);
        assert_eq!(cfg.rabbit.scale, 2.0);
        assert_eq!(cfg.rabbit.jump_distance, RabbitConfig::default().jump_distance);
        assert_eq!(cfg.type_speed_ms, SceneConfig::default().type_speed_ms);
    }

    #[test]
    fn url_overrides_parse_and_ignore_junk() {
        let mut cfg = SceneConfig::default();
        apply_override(&mut cfg, "skip", "1");
        apply_override(&mut cfg, "scale", "2.5");
        apply_override(&mut cfg, "speed", "0");
        apply_override(&mut cfg, "scale", "bogus");
        apply_override(&mut cfg, "unknown", "7");
        assert!(cfg.skip_intro);
        assert_eq!(cfg.rabbit.scale, 2.5);
        assert_eq!(cfg.type_speed_ms, 1);
    }

    #[test]
    fn skip_zero_means_do_not_skip() {
        let mut cfg = SceneConfig::default();
        apply_override(&mut cfg, "skip", "0");
        assert!(!cfg.skip_intro);
    }

    #[test]
    fn rendered_size_scales_the_sprite() {
        let cfg = RabbitConfig::default();
        assert_eq!(cfg.rendered_width(), 96.0);
        assert_eq!(cfg.rendered_height(), 96.0);
    }
}
