use crate::domain::generation::GenerationConfig;
use crate::domain::vitals::{Bed, MetricType};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxConfig {
    pub influx: InfluxSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
}

impl InfluxSettings {
    /// Presence check only; the sink validates the values itself.
    pub fn check(&self) -> anyhow::Result<()> {
        for (field, value) in [
            ("url", &self.url),
            ("token", &self.token),
            ("org", &self.org),
            ("bucket", &self.bucket),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("influx config is missing `{}`", field);
            }
        }
        Ok(())
    }
}

/// Run description consumed by the generator binary. The library itself only
/// ever sees the resolved `GenerationConfig`.
#[derive(Debug, Deserialize, Clone)]
pub struct GenerationSettings {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub metrics: Vec<MetricType>,
    pub beds: Vec<u8>,
    pub interval_minutes: f64,
    #[serde(default)]
    pub batch_size: Option<usize>,
}

impl GenerationSettings {
    pub fn to_config(&self) -> GenerationConfig {
        GenerationConfig {
            start: self.start,
            end: self.end,
            metrics: self.metrics.clone(),
            beds: self.beds.iter().map(|&n| Bed(n)).collect(),
            interval_minutes: self.interval_minutes,
        }
    }
}

pub fn load_influx_config() -> anyhow::Result<InfluxConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/influx"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_generation_config() -> anyhow::Result<GenerationSettings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/generation"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_check() {
        let settings = InfluxSettings {
            url: "http://localhost:8086".into(),
            token: "secret".into(),
            org: "ward".into(),
            bucket: "vitals".into(),
        };
        assert!(settings.check().is_ok());

        let missing = InfluxSettings {
            token: String::new(),
            ..settings
        };
        assert!(missing.check().is_err());
    }

    #[test]
    fn test_generation_settings_resolve_to_config() {
        let settings = GenerationSettings {
            start: "2024-01-15T08:00:00Z".parse().unwrap(),
            end: "2024-01-15T09:00:00Z".parse().unwrap(),
            metrics: vec![MetricType::HeartRate],
            beds: vec![1, 3],
            interval_minutes: 5.0,
            batch_size: None,
        };
        let config = settings.to_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.beds, vec![Bed(1), Bed(3)]);
    }
}
