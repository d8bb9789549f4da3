use std::path::PathBuf;

use crate::error::FlowerError;

const TEXT_FONT_VAR: &str = "FLOWER_CLOCK_TEXT_FONT";
const TITLE_FONT_VAR: &str = "FLOWER_CLOCK_TITLE_FONT";
const SEED_VAR: &str = "FLOWER_CLOCK_SEED";
const REHEARSE_VAR: &str = "FLOWER_CLOCK_REHEARSE";

/// Runtime settings. Layout values are in logical pixels.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Length of a full petal.
    pub petal_radius: f32,
    /// Half-width of a full petal at its widest control point.
    pub petal_width: f32,
    /// Distance from the center to the hour labels.
    pub label_radius: f32,
    /// Distance of the fall floor above the bottom edge.
    pub floor_margin: f32,
    /// Optional TTF/OTF for labels, legend and readout.
    pub text_font: Option<PathBuf>,
    /// Optional TTF/OTF for the title.
    pub title_font: Option<PathBuf>,
    /// Fixed seed for the fall RNG (random per session when absent).
    pub seed: Option<u64>,
    /// Start one fall on the first frame, regardless of the time of day.
    pub rehearse: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            petal_radius: 210.0,
            petal_width: 38.0,
            label_radius: 255.0,
            floor_margin: 40.0,
            text_font: None,
            title_font: None,
            seed: None,
            rehearse: false,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, FlowerError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FlowerError> {
        let mut settings = Self::default();

        settings.text_font = lookup(TEXT_FONT_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        settings.title_font = lookup(TITLE_FONT_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        if let Some(raw) = lookup(SEED_VAR) {
            let seed = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| FlowerError::InvalidSetting {
                    var: SEED_VAR,
                    value: raw.clone(),
                })?;
            settings.seed = Some(seed);
        }

        if let Some(raw) = lookup(REHEARSE_VAR) {
            settings.rehearse = parse_flag(&raw).ok_or(FlowerError::InvalidSetting {
                var: REHEARSE_VAR,
                value: raw.clone(),
            })?;
        }

        Ok(settings)
    }

    /// RNG for the fall controller, honoring the configured seed.
    pub fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.petal_radius, 210.0);
        assert_eq!(settings.petal_width, 38.0);
        assert_eq!(settings.label_radius, 255.0);
        assert_eq!(settings.floor_margin, 40.0);
        assert!(settings.text_font.is_none());
        assert!(settings.seed.is_none());
        assert!(!settings.rehearse);
    }

    #[test]
    fn test_reads_fonts_seed_and_rehearsal() {
        let settings = Settings::from_lookup(lookup_from(&[
            (TEXT_FONT_VAR, "/fonts/Trispace.ttf"),
            (TITLE_FONT_VAR, "  "),
            (SEED_VAR, " 42 "),
            (REHEARSE_VAR, "Yes"),
        ]))
        .unwrap();
        assert_eq!(settings.text_font, Some(PathBuf::from("/fonts/Trispace.ttf")));
        assert!(settings.title_font.is_none());
        assert_eq!(settings.seed, Some(42));
        assert!(settings.rehearse);
    }

    #[test]
    fn test_invalid_seed_is_rejected() {
        let err = Settings::from_lookup(lookup_from(&[(SEED_VAR, "forty-two")])).unwrap_err();
        match err {
            FlowerError::InvalidSetting { var, value } => {
                assert_eq!(var, SEED_VAR);
                assert_eq!(value, "forty-two");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_rehearse_flag_is_rejected() {
        assert!(Settings::from_lookup(lookup_from(&[(REHEARSE_VAR, "maybe")])).is_err());
        let off = Settings::from_lookup(lookup_from(&[(REHEARSE_VAR, "off")])).unwrap();
        assert!(!off.rehearse);
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let settings = Settings {
            seed: Some(7),
            ..Settings::default()
        };
        let a: Vec<u32> = (0..4).map(|_| settings.rng().u32(..)).collect();
        assert!(a.iter().all(|&v| v == a[0]));
    }
}
