//! Run configuration — TOML-loadable, validated, content-addressed.
//!
//! ```toml
//! [backtest]
//! initial_equity = 100000.0
//! start_date = "2010-01-04"
//!
//! [strategy]
//! slow_window = 200
//! fast_window = 50
//! entry_policy = { kind = "pyramid", max_units = 5000.0 }
//!
//! [sizing]
//! trade_size = 10000.0
//! ```
//!
//! Every section and field is optional; omitted values fall back to the
//! reference strategy defaults.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use hubline_core::sizers::FixedAllocation;
use hubline_core::{BacktestConfig, EntryPolicy, ReferenceParams};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("hash config: {0}")]
    Hash(#[from] serde_json::Error),
    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Everything needed to reproduce one backtest run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RunConfig {
    pub backtest: BacktestSection,
    pub strategy: StrategySection,
    pub sizing: SizingSection,
}

/// `[backtest]`: capital and date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BacktestSection {
    pub initial_equity: f64,
    /// Inclusive; bars before it are dropped.
    pub start_date: Option<NaiveDate>,
    /// Inclusive; bars after it are dropped.
    pub end_date: Option<NaiveDate>,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_equity: 100_000.0,
            start_date: None,
            end_date: None,
        }
    }
}

/// `[strategy]`: reference strategy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StrategySection {
    pub slow_window: usize,
    pub fast_window: usize,
    pub rsi_window: usize,
    pub rsi_entry: f64,
    pub rsi_exit: f64,
    pub entry_policy: EntryPolicy,
}

impl Default for StrategySection {
    fn default() -> Self {
        let params = ReferenceParams::default();
        Self {
            slow_window: params.slow_window,
            fast_window: params.fast_window,
            rsi_window: params.rsi_window,
            rsi_entry: params.rsi_entry,
            rsi_exit: params.rsi_exit,
            entry_policy: params.entry_policy,
        }
    }
}

/// `[sizing]`: currency allocation per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SizingSection {
    pub trade_size: f64,
    pub max_units: Option<f64>,
    pub whole_units: bool,
}

impl Default for SizingSection {
    fn default() -> Self {
        Self {
            trade_size: 10_000.0,
            max_units: None,
            whole_units: false,
        }
    }
}

impl RunConfig {
    /// Read, parse and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject configurations the engine cannot run meaningfully.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;
        if !(bt.initial_equity.is_finite() && bt.initial_equity > 0.0) {
            return Err(ConfigError::invalid(
                "backtest.initial_equity",
                format!("must be positive, got {}", bt.initial_equity),
            ));
        }
        if let (Some(start), Some(end)) = (bt.start_date, bt.end_date) {
            if start > end {
                return Err(ConfigError::invalid(
                    "backtest.start_date",
                    format!("{start} is after end_date {end}"),
                ));
            }
        }

        let st = &self.strategy;
        for (field, window) in [
            ("strategy.slow_window", st.slow_window),
            ("strategy.fast_window", st.fast_window),
            ("strategy.rsi_window", st.rsi_window),
        ] {
            if window == 0 {
                return Err(ConfigError::invalid(field, "window must be at least 1"));
            }
        }
        if st.fast_window >= st.slow_window {
            return Err(ConfigError::invalid(
                "strategy.fast_window",
                format!(
                    "fast window {} must be shorter than slow window {}",
                    st.fast_window, st.slow_window
                ),
            ));
        }
        for (field, level) in [
            ("strategy.rsi_entry", st.rsi_entry),
            ("strategy.rsi_exit", st.rsi_exit),
        ] {
            if !(0.0..=100.0).contains(&level) {
                return Err(ConfigError::invalid(
                    field,
                    format!("RSI threshold {level} outside 0..=100"),
                ));
            }
        }
        if let EntryPolicy::Pyramid { max_units } = st.entry_policy {
            if !(max_units.is_finite() && max_units > 0.0) {
                return Err(ConfigError::invalid(
                    "strategy.entry_policy",
                    format!("pyramid max_units must be positive, got {max_units}"),
                ));
            }
        }

        let sz = &self.sizing;
        if !(sz.trade_size.is_finite() && sz.trade_size > 0.0) {
            return Err(ConfigError::invalid(
                "sizing.trade_size",
                format!("must be positive, got {}", sz.trade_size),
            ));
        }
        if let Some(max_units) = sz.max_units {
            if !(max_units.is_finite() && max_units > 0.0) {
                return Err(ConfigError::invalid(
                    "sizing.max_units",
                    format!("must be positive, got {max_units}"),
                ));
            }
        }
        Ok(())
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn reference_params(&self) -> ReferenceParams {
        let st = &self.strategy;
        ReferenceParams {
            slow_window: st.slow_window,
            fast_window: st.fast_window,
            rsi_window: st.rsi_window,
            rsi_entry: st.rsi_entry,
            rsi_exit: st.rsi_exit,
            entry_policy: st.entry_policy,
        }
    }

    pub fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig::new(self.backtest.initial_equity, self.sizing.trade_size)
            .with_range(self.backtest.start_date, self.backtest.end_date)
    }

    pub fn sizer(&self) -> FixedAllocation {
        let mut sizer = FixedAllocation::new();
        if let Some(max_units) = self.sizing.max_units {
            sizer = sizer.with_max_units(max_units);
        }
        if self.sizing.whole_units {
            sizer = sizer.whole_units();
        }
        sizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_reference_defaults() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.reference_params(), ReferenceParams::default());
        assert_eq!(config.backtest.initial_equity, 100_000.0);
        assert_eq!(config.sizing.trade_size, 10_000.0);
    }

    #[test]
    fn parses_all_sections() {
        let toml = r#"
[backtest]
initial_equity = 50000.0
start_date = "2012-01-03"
end_date = "2019-12-31"

[strategy]
slow_window = 100
fast_window = 20
rsi_window = 2
rsi_entry = 10.0
rsi_exit = 90.0
entry_policy = { kind = "pyramid", max_units = 2500.0 }

[sizing]
trade_size = 5000.0
max_units = 1000.0
whole_units = true
"#;
        let config = RunConfig::from_toml(toml).unwrap();
        assert_eq!(config.backtest.initial_equity, 50_000.0);
        assert_eq!(
            config.backtest.start_date,
            NaiveDate::from_ymd_opt(2012, 1, 3)
        );
        assert_eq!(config.strategy.slow_window, 100);
        assert_eq!(
            config.strategy.entry_policy,
            EntryPolicy::Pyramid { max_units: 2500.0 }
        );

        let bt = config.backtest_config();
        assert_eq!(bt.allocation, 5_000.0);
        assert_eq!(bt.end, NaiveDate::from_ymd_opt(2019, 12, 31));

        let sizer = config.sizer();
        assert_eq!(sizer.max_units, Some(1_000.0));
        assert!(sizer.whole_units);
    }

    #[test]
    fn unknown_fields_rejected() {
        let err = RunConfig::from_toml("[strategy]\nfast = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let err = RunConfig::from_toml("[broker]\nfee = 1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn fast_window_must_be_shorter() {
        let err = RunConfig::from_toml("[strategy]\nslow_window = 20\nfast_window = 20\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "strategy.fast_window",
                ..
            }
        ));
    }

    #[test]
    fn invalid_values_rejected() {
        let cases = [
            ("[backtest]\ninitial_equity = 0.0\n", "backtest.initial_equity"),
            (
                "[backtest]\nstart_date = \"2020-01-02\"\nend_date = \"2019-01-02\"\n",
                "backtest.start_date",
            ),
            ("[strategy]\nrsi_window = 0\n", "strategy.rsi_window"),
            ("[strategy]\nrsi_exit = 120.0\n", "strategy.rsi_exit"),
            (
                "[strategy]\nentry_policy = { kind = \"pyramid\", max_units = 0.0 }\n",
                "strategy.entry_policy",
            ),
            ("[sizing]\ntrade_size = -5.0\n", "sizing.trade_size"),
            ("[sizing]\nmax_units = 0.0\n", "sizing.max_units"),
        ];
        for (toml, expected) in cases {
            match RunConfig::from_toml(toml) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected, "{toml}"),
                other => panic!("expected invalid {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn run_id_is_deterministic_and_sensitive() {
        let a = RunConfig::default();
        let mut b = RunConfig::default();
        assert_eq!(a.run_id().unwrap(), b.run_id().unwrap());
        assert_eq!(a.run_id().unwrap().len(), 64);

        b.strategy.rsi_entry = 25.0;
        assert_ne!(a.run_id().unwrap(), b.run_id().unwrap());
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = RunConfig::default();
        config.backtest.start_date = NaiveDate::from_ymd_opt(2015, 6, 1);
        config.strategy.entry_policy = EntryPolicy::Pyramid { max_units: 800.0 };
        let text = config.to_toml().unwrap();
        assert_eq!(RunConfig::from_toml(&text).unwrap(), config);
    }
}
