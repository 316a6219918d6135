//! Direction state and discrete trade signals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trend direction carried by the Chandelier state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// `+1` for long, `-1` for short.
    pub fn as_i8(self) -> i8 {
        match self {
            Direction::Long => 1,
            Direction::Short => -1,
        }
    }

    pub fn is_long(self) -> bool {
        self == Direction::Long
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.as_i8())
    }
}

/// Discrete per-bar signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "buy",
            Signal::Sell => "sell",
            Signal::Hold => "hold",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Signal::Buy),
            "sell" => Ok(Signal::Sell),
            "hold" => Ok(Signal::Hold),
            other => Err(format!("unknown signal '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::Long.as_i8(), 1);
        assert_eq!(Direction::Short.as_i8(), -1);
        assert_eq!(Direction::Long.to_string(), "+1");
        assert_eq!(Direction::Short.to_string(), "-1");
    }

    #[test]
    fn signal_parses_case_insensitively() {
        assert_eq!("BUY".parse::<Signal>(), Ok(Signal::Buy));
        assert_eq!("sell".parse::<Signal>(), Ok(Signal::Sell));
        assert!("short".parse::<Signal>().is_err());
    }

    #[test]
    fn signal_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Signal::Hold).unwrap(), "\"hold\"");
    }
}
