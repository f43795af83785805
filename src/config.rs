//! Configuration management

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ingest: IngestConfig,
    pub analysis: AnalysisConfig,
    pub engine: EngineConfig,
    pub server: ServerConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Glob selecting the daily raw files (e.g. one month of `*2017-10*` directories)
    pub path_pattern: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Area code used for the device-level drill-down
    pub area_code: String,
    /// Number of devices kept in the device ranking
    pub top_n: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// `:memory:` or a path to a SQLite database file
    pub url: String,
    /// Materialize the daily table instead of defining it as a view
    #[serde(default = "default_persist")]
    pub persist: bool,
}

fn default_persist() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory the report command writes chart pages into
    pub dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn load(config_path: &str) -> Result<Self> {
        let builder = config::Config::builder()
            .set_default("ingest.path_pattern", "data/csv/*2017-10*/*")?
            .set_default("analysis.area_code", "cg")?
            .set_default("analysis.top_n", 20)?
            .set_default("engine.url", ":memory:")?
            .set_default("engine.persist", true)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.http_port", 8080)?
            .set_default("output.dir", "charts")?
            .set_default("logging.level", "info")?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("IPDR").separator("__"));

        let settings = builder.build()?;
        let config: Config = settings.try_deserialize()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.ingest.path_pattern.trim().is_empty() {
            anyhow::bail!("Ingest path_pattern cannot be empty");
        }

        if self.analysis.area_code.trim().is_empty() {
            anyhow::bail!("Analysis area_code cannot be empty");
        }
        if self.analysis.top_n == 0 {
            anyhow::bail!("Invalid top_n: 0 is not allowed");
        }

        if self.engine.url.is_empty() {
            anyhow::bail!("Engine URL cannot be empty");
        }

        if self.server.http_port == 0 {
            anyhow::bail!("Invalid http_port: 0 is not allowed");
        }
        if self.server.host.is_empty() {
            anyhow::bail!("Server host cannot be empty");
        }

        // Validate logging level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("Invalid logging level '{}'. Must be one of: {:?}", self.logging.level, valid_levels);
        }

        Ok(())
    }
}

#[cfg(test)]
impl Config {
    /// Defaults matching `load` without any file or environment override
    pub fn for_tests(path_pattern: &str) -> Self {
        Self {
            ingest: IngestConfig {
                path_pattern: path_pattern.to_string(),
            },
            analysis: AnalysisConfig {
                area_code: "cg".to_string(),
                top_n: 20,
            },
            engine: EngineConfig {
                url: ":memory:".to_string(),
                persist: true,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                http_port: 8080,
            },
            output: OutputConfig {
                dir: "charts".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}
