//! The seven sensor metrics a snapshot carries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DashError;

/// One scalar field of a [`Snapshot`](crate::Snapshot), selectable for charting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Temp,
    Humidity,
    Pressure,
    X,
    Y,
    Z,
    Altitude,
}

impl Metric {
    /// All metrics in snapshot field order.
    pub const ALL: [Metric; 7] = [
        Self::Temp,
        Self::Humidity,
        Self::Pressure,
        Self::X,
        Self::Y,
        Self::Z,
        Self::Altitude,
    ];

    /// Order offered by the metric picker.
    pub const PICKER_ORDER: [Metric; 7] = [
        Self::Temp,
        Self::Humidity,
        Self::Pressure,
        Self::Altitude,
        Self::X,
        Self::Y,
        Self::Z,
    ];

    /// Wire id, as used in upstream payloads and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            Self::Temp => "temp",
            Self::Humidity => "humidity",
            Self::Pressure => "pressure",
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::Altitude => "altitude",
        }
    }

    /// Series label shown on the chart legend.
    pub fn label(self) -> &'static str {
        match self {
            Self::Temp => "Temperature (°C)",
            Self::Humidity => "Humidity (%)",
            Self::Pressure => "Pressure (Pa)",
            Self::X => "X Acceleration (m/s²)",
            Self::Y => "Y Acceleration (m/s²)",
            Self::Z => "Z Acceleration (m/s²)",
            Self::Altitude => "Altitude (m)",
        }
    }

    /// Name shown in the metric picker.
    pub fn picker_name(self) -> &'static str {
        match self {
            Self::Temp => "Temperature",
            Self::Humidity => "Humidity",
            Self::Pressure => "Pressure",
            Self::X => "X Acceleration",
            Self::Y => "Y Acceleration",
            Self::Z => "Z Acceleration",
            Self::Altitude => "Altitude",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Temp => "°C",
            Self::Humidity => "%",
            Self::Pressure => "Pa",
            Self::X | Self::Y | Self::Z => "m/s²",
            Self::Altitude => "m",
        }
    }

    /// Next metric in picker order, wrapping around.
    pub fn next(self) -> Self {
        let idx = self.picker_index();
        Self::PICKER_ORDER[(idx + 1) % Self::PICKER_ORDER.len()]
    }

    /// Previous metric in picker order, wrapping around.
    pub fn prev(self) -> Self {
        let idx = self.picker_index();
        let len = Self::PICKER_ORDER.len();
        Self::PICKER_ORDER[(idx + len - 1) % len]
    }

    /// Position of this metric in [`Metric::PICKER_ORDER`].
    pub fn picker_index(self) -> usize {
        Self::PICKER_ORDER
            .iter()
            .position(|&m| m == self)
            .unwrap_or(0)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Metric {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.id() == s)
            .ok_or_else(|| DashError::UnknownMetric(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_temp() {
        assert_eq!(Metric::default(), Metric::Temp);
    }

    #[test]
    fn parses_every_id() {
        for m in Metric::ALL {
            assert_eq!(m.id().parse::<Metric>().unwrap(), m);
        }
    }

    #[test]
    fn rejects_unknown_ids() {
        for bad in ["", "Temp", "TEMP", "speed", "alt"] {
            let err = bad.parse::<Metric>().unwrap_err();
            assert!(matches!(err, DashError::UnknownMetric(ref s) if s == bad));
        }
    }

    #[test]
    fn next_cycles_picker_order() {
        let mut m = Metric::Temp;
        let mut seen = Vec::new();
        for _ in 0..Metric::PICKER_ORDER.len() {
            seen.push(m);
            m = m.next();
        }
        assert_eq!(seen, Metric::PICKER_ORDER.to_vec());
        assert_eq!(m, Metric::Temp);
    }

    #[test]
    fn prev_undoes_next() {
        for m in Metric::ALL {
            assert_eq!(m.next().prev(), m);
        }
        assert_eq!(Metric::Temp.prev(), Metric::Z);
    }

    #[test]
    fn labels_carry_units() {
        for m in Metric::ALL {
            assert!(m.label().contains(m.unit()), "{m:?} label lacks unit");
        }
    }

    #[test]
    fn serde_uses_lowercase_ids() {
        let json = serde_json::to_string(&Metric::Altitude).unwrap();
        assert_eq!(json, "\"altitude\"");
        let back: Metric = serde_json::from_str("\"x\"").unwrap();
        assert_eq!(back, Metric::X);
    }
}
