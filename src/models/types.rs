use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn from_change(percentage_change: f64) -> Self {
        if percentage_change > 0.0 {
            Self::Up
        } else if percentage_change < 0.0 {
            Self::Down
        } else {
            Self::Flat
        }
    }
}
