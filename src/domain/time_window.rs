use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::gateway::HistoricalWindow;

/// Lookback offered by the chart window selector. Sampled daily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter)]
pub enum TimeWindow {
    #[strum(to_string = "7D")]
    Week,
    #[default]
    #[strum(to_string = "30D")]
    Month,
    #[strum(to_string = "90D")]
    Quarter,
}

impl TimeWindow {
    pub fn days(&self) -> i64 {
        match self {
            TimeWindow::Week => 7,
            TimeWindow::Month => 30,
            TimeWindow::Quarter => 90,
        }
    }

    pub fn interval_days(&self) -> i64 {
        1
    }

    pub fn historical(&self) -> HistoricalWindow {
        HistoricalWindow::from_days(self.days(), self.interval_days())
    }
}
