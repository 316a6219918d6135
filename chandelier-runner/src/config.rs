//! TOML run configuration.
//!
//! ```toml
//! [backtest]
//! symbols = ["600519", "000001"]
//! start_date = "2024-01-01"
//! end_date = "2024-12-31"
//! initial_capital = 20000.0
//! commission_rate = 0.001
//!
//! [indicator]
//! length = 14
//! multiplier = 2.0
//! use_close = true
//! smoothing = "sma"        # or "wilder"
//! direction_seed = "short" # or "long", "midpoint"
//!
//! [signal]
//! trend_filter = false
//! trend_period = 20
//! ```
//!
//! Every section and key is optional; missing values take the engine defaults.

use std::path::Path;

use chandelier_core::{
    BacktestParams, ChandelierParams, EngineError, StrategyConfig, TrendFilter,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content-addressable identifier of a run configuration.
pub type RunId = String;

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<EngineError> for ConfigError {
    fn from(err: EngineError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

/// `[backtest]`: universe, date window and ledger parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub symbols: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub initial_capital: f64,
    pub commission_rate: f64,
}

impl Default for BacktestSection {
    fn default() -> Self {
        let params = BacktestParams::default();
        Self {
            symbols: Vec::new(),
            start_date: None,
            end_date: None,
            initial_capital: params.initial_capital,
            commission_rate: params.commission_rate,
        }
    }
}

/// `[signal]`: optional trend filter on Buy signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSection {
    pub trend_filter: bool,
    pub trend_period: usize,
}

impl Default for SignalSection {
    fn default() -> Self {
        Self {
            trend_filter: false,
            trend_period: TrendFilter::default().period,
        }
    }
}

/// A complete run configuration as read from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub backtest: BacktestSection,
    pub indicator: ChandelierParams,
    pub signal: SignalSection,
}

impl RunConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy().validate()?;
        if let (Some(start), Some(end)) = (self.backtest.start_date, self.backtest.end_date) {
            if start > end {
                return Err(ConfigError::Invalid(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
        }
        if self.backtest.symbols.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid("empty symbol in [backtest].symbols".into()));
        }
        Ok(())
    }

    /// The engine-level view of this configuration.
    pub fn strategy(&self) -> StrategyConfig {
        StrategyConfig {
            chandelier: self.indicator.clone(),
            trend_filter: self.signal.trend_filter.then(|| TrendFilter {
                period: self.signal.trend_period,
            }),
            backtest: BacktestParams {
                initial_capital: self.backtest.initial_capital,
                commission_rate: self.backtest.commission_rate,
            },
        }
    }

    /// Deterministic BLAKE3 hash of the serialized configuration.
    ///
    /// Two runs with identical configs share the same id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chandelier_core::{DirectionSeed, Smoothing};

    const FULL: &str = r#"
[backtest]
symbols = ["600519", "000001"]
start_date = "2024-01-01"
end_date = "2024-12-31"
initial_capital = 50000.0
commission_rate = 0.0005

[indicator]
length = 22
multiplier = 3.0
use_close = false
smoothing = "wilder"
direction_seed = "midpoint"

[signal]
trend_filter = true
trend_period = 30
"#;

    #[test]
    fn parses_every_section() {
        let config = RunConfig::from_toml(FULL).unwrap();
        assert_eq!(config.backtest.symbols, vec!["600519", "000001"]);
        assert_eq!(
            config.backtest.start_date,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(config.indicator.length, 22);
        assert_eq!(config.indicator.smoothing, Smoothing::Wilder);
        assert_eq!(config.indicator.direction_seed, DirectionSeed::Midpoint);
        assert!(!config.indicator.use_close);

        let strategy = config.strategy();
        assert_eq!(strategy.trend_filter, Some(TrendFilter { period: 30 }));
        assert_eq!(strategy.backtest.initial_capital, 50_000.0);
        assert_eq!(strategy.backtest.commission_rate, 0.0005);
    }

    #[test]
    fn empty_document_takes_defaults() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config, RunConfig::default());
        let strategy = config.strategy();
        assert_eq!(strategy.chandelier, ChandelierParams::default());
        assert!(strategy.trend_filter.is_none());
        assert_eq!(strategy.backtest, BacktestParams::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = RunConfig::from_toml("[indicator]\nmultiplier = 3.5\n").unwrap();
        assert_eq!(config.indicator.multiplier, 3.5);
        assert_eq!(config.indicator.length, 14);
    }

    #[test]
    fn rejects_invalid_parameters() {
        let err = RunConfig::from_toml("[indicator]\nlength = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");

        let err = RunConfig::from_toml("[backtest]\ncommission_rate = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }

    #[test]
    fn rejects_inverted_date_window() {
        let toml = "[backtest]\nstart_date = \"2024-06-01\"\nend_date = \"2024-01-01\"\n";
        let err = RunConfig::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("after end_date"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = RunConfig::from_toml("[indicator\nlength = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn run_id_is_deterministic_and_sensitive() {
        let a = RunConfig::from_toml(FULL).unwrap();
        assert_eq!(a.run_id().unwrap(), a.run_id().unwrap());

        let mut b = a.clone();
        b.indicator.multiplier = 2.5;
        assert_ne!(a.run_id().unwrap(), b.run_id().unwrap());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RunConfig::from_file(Path::new("/nonexistent/run.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/run.toml"));
    }
}
