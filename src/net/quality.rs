//! Network quality tiers
//!
//! Measured ping and packet loss pick a tier; the tier picks the lag window
//! and which of prediction, reconciliation and interpolation stay on.

use serde::{Deserialize, Serialize};

use crate::Millis;

/// Link measurements reported by the transport
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkStats {
    pub ping_ms: Millis,
    /// Fraction of packets lost (0-1)
    pub packet_loss: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl NetworkQuality {
    pub fn from_stats(stats: NetworkStats) -> Self {
        let NetworkStats { ping_ms, packet_loss } = stats;
        if ping_ms < 50 && packet_loss < 0.01 {
            NetworkQuality::Excellent
        } else if ping_ms < 100 && packet_loss < 0.05 {
            NetworkQuality::Good
        } else if ping_ms < 200 && packet_loss < 0.10 {
            NetworkQuality::Fair
        } else {
            NetworkQuality::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkQuality::Excellent => "Excellent",
            NetworkQuality::Good => "Good",
            NetworkQuality::Fair => "Fair",
            NetworkQuality::Poor => "Poor",
        }
    }

    /// Lag-compensation window for this tier
    pub fn lag_compensation_ms(&self) -> Millis {
        match self {
            NetworkQuality::Excellent => 50,
            NetworkQuality::Good => 100,
            NetworkQuality::Fair => 200,
            NetworkQuality::Poor => 300,
        }
    }

    pub fn modes(&self) -> NetModes {
        match self {
            NetworkQuality::Excellent | NetworkQuality::Good => NetModes::default(),
            NetworkQuality::Fair => NetModes {
                prediction: false,
                reconciliation: true,
                interpolation: false,
            },
            NetworkQuality::Poor => NetModes {
                prediction: false,
                reconciliation: false,
                interpolation: false,
            },
        }
    }
}

/// Which smoothing techniques are active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetModes {
    /// Record local inputs for replay
    pub prediction: bool,
    /// Correct the local champion against the server
    pub reconciliation: bool,
    /// Ease remote champions instead of snapping them
    pub interpolation: bool,
}

impl Default for NetModes {
    fn default() -> Self {
        Self {
            prediction: true,
            reconciliation: true,
            interpolation: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(ping_ms: Millis, packet_loss: f32) -> NetworkStats {
        NetworkStats { ping_ms, packet_loss }
    }

    #[test]
    fn test_tiers_from_stats() {
        assert_eq!(NetworkQuality::from_stats(stats(30, 0.0)), NetworkQuality::Excellent);
        assert_eq!(NetworkQuality::from_stats(stats(30, 0.02)), NetworkQuality::Good);
        assert_eq!(NetworkQuality::from_stats(stats(150, 0.0)), NetworkQuality::Fair);
        assert_eq!(NetworkQuality::from_stats(stats(90, 0.2)), NetworkQuality::Poor);
        assert_eq!(NetworkQuality::from_stats(stats(400, 0.0)), NetworkQuality::Poor);
    }

    #[test]
    fn test_worse_links_widen_window_and_drop_modes() {
        assert_eq!(NetworkQuality::Good.lag_compensation_ms(), 100);
        assert_eq!(NetworkQuality::Poor.lag_compensation_ms(), 300);

        let fair = NetworkQuality::Fair.modes();
        assert!(fair.reconciliation);
        assert!(!fair.prediction && !fair.interpolation);

        let poor = NetworkQuality::Poor.modes();
        assert!(!poor.prediction && !poor.reconciliation && !poor.interpolation);
        assert_eq!(NetworkQuality::Excellent.modes(), NetModes::default());
    }
}
