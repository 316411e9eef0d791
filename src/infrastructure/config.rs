use crate::domain::tuning::TuningMethod;
use config::builder::{ConfigBuilder, DefaultState};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct TunerConfig {
    pub server: ServerSettings,
    pub tuning: TuningSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_address: String,
}

/// Defaults applied to every new tuning record.
#[derive(Debug, Deserialize, Clone)]
pub struct TuningSettings {
    pub default_lambda: f64,
    pub acceptable_filter_time: f64,
    pub default_method: TuningMethod,
}

impl Default for TuningSettings {
    fn default() -> Self {
        Self {
            default_lambda: 10.0,
            acceptable_filter_time: 0.5,
            default_method: TuningMethod::Lambda,
        }
    }
}

fn with_defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
    let tuning = TuningSettings::default();
    Ok(config::Config::builder()
        .set_default("server.bind_address", "0.0.0.0:8080")?
        .set_default("tuning.default_lambda", tuning.default_lambda)?
        .set_default("tuning.acceptable_filter_time", tuning.acceptable_filter_time)?
        .set_default("tuning.default_method", "lambda")?)
}

/// Defaults, then `config/tuner.*` if present, then `TUNER__*` variables
/// (e.g. `TUNER__TUNING__DEFAULT_LAMBDA=12`).
pub fn load_tuner_config() -> anyhow::Result<TunerConfig> {
    let settings = with_defaults()?
        .add_source(config::File::with_name("config/tuner").required(false))
        .add_source(config::Environment::with_prefix("TUNER").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> TunerConfig {
        with_defaults()
            .unwrap()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_apply_without_file() {
        let config = parse("");
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.tuning.default_lambda, 10.0);
        assert_eq!(config.tuning.acceptable_filter_time, 0.5);
        assert_eq!(config.tuning.default_method, TuningMethod::Lambda);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = parse(
            r#"
            [server]
            bind_address = "127.0.0.1:9000"

            [tuning]
            default_lambda = 25.0
            default_method = "cohen_coon"
            "#,
        );
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.tuning.default_lambda, 25.0);
        assert_eq!(config.tuning.acceptable_filter_time, 0.5);
        assert_eq!(config.tuning.default_method, TuningMethod::CohenCoon);
    }
}
