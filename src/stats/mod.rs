//! Stats module - descriptive statistics and weather aggregates

mod aggregator;
mod calculator;

pub use aggregator::{
    AggregateError, CorrelationMatrix, MonthlyAverages, WeatherAggregates, WeatherAggregator,
};
pub use calculator::StatsCalculator;
