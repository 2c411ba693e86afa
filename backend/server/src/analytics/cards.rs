//! Insight cards with a one week ahead sales forecast.
//!
//! The forecast fits a single feature linear regression of `sales_amount` on the
//! day ordinal of each sale (days since 0001-01-01, that day being 1) and
//! predicts at seven days past the latest sale.
use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use ledger::models::SalesRecord;
use linfa::{
    DatasetBase,
    traits::{Fit, Predict},
};
use linfa_linear::{FittedLinearRegression, LinearError, LinearRegression};
use ndarray::{Array1, Array2, ShapeError};
use serde::Serialize;
use thiserror::Error;

use super::sum_by;

pub const FORECAST_HORIZON_DAYS: f64 = 7.0;

pub const TOP_PRODUCT_TITLE: &str = "Top Selling Product";
pub const LOW_REGION_TITLE: &str = "Lowest Performing Region";
pub const FORECAST_TITLE: &str = "Sales Forecast (AI Predicted)";

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Failed to shape training data: {0}")]
    Shape(#[from] ShapeError),

    #[error("Failed to fit regression: {0}")]
    Fit(#[from] LinearError<f64>),

    #[error("Regression produced no prediction")]
    EmptyPrediction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightCard {
    pub title: String,
    pub value: String,
}

impl InsightCard {
    fn new(title: &str, value: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            value: value.into(),
        }
    }
}

pub fn insight_cards(records: &[SalesRecord]) -> Result<Vec<InsightCard>, ForecastError> {
    let by_product = sum_by(records, |record| Some(record.product.as_str()));
    let by_region = sum_by(records, |record| Some(record.region.as_str()));

    let (Some(top_product), Some(low_region)) = (
        first_extreme(&by_product, |candidate, best| candidate > best),
        first_extreme(&by_region, |candidate, best| candidate < best),
    ) else {
        return Ok(Vec::new());
    };

    let forecast = forecast(records)?;

    Ok(vec![
        InsightCard::new(TOP_PRODUCT_TITLE, top_product),
        InsightCard::new(LOW_REGION_TITLE, low_region),
        InsightCard::new(FORECAST_TITLE, format!("${forecast:.2}")),
    ])
}

/// Label with the most extreme total, earliest label winning ties.
fn first_extreme<'a>(
    totals: &BTreeMap<&'a str, f64>,
    beats: impl Fn(f64, f64) -> bool,
) -> Option<&'a str> {
    totals
        .iter()
        .fold(None, |best: Option<(&'a str, f64)>, (label, total)| match best {
            Some((_, best_total)) if !beats(*total, best_total) => best,
            _ => Some((*label, *total)),
        })
        .map(|(label, _)| label)
}

/// Predicted sales one horizon past the latest dated sale.
///
/// With fewer than two distinct dates there is no slope to fit, so the mean
/// amount stands in for the prediction.
pub fn forecast(records: &[SalesRecord]) -> Result<f64, ForecastError> {
    let points: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|record| {
            record
                .date()
                .map(|date| (f64::from(date.num_days_from_ce()), record.sales_amount))
        })
        .collect();

    let distinct_days: BTreeSet<i64> = points.iter().map(|(day, _)| *day as i64).collect();
    if distinct_days.len() < 2 {
        return Ok(mean(records));
    }

    let latest_day = points
        .iter()
        .map(|(day, _)| *day)
        .fold(f64::MIN, f64::max);

    let (days, amounts): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();
    let features = Array2::from_shape_vec((days.len(), 1), days)?;
    let targets = Array1::from(amounts);

    let dataset = DatasetBase::from(features).with_targets(targets);
    let model: FittedLinearRegression<f64> = LinearRegression::default().fit(&dataset)?;

    let next = Array2::from_shape_vec((1, 1), vec![latest_day + FORECAST_HORIZON_DAYS])?;
    let prediction: Array1<f64> = model.predict(&next);

    prediction.first().copied().ok_or(ForecastError::EmptyPrediction)
}

fn mean(records: &[SalesRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }

    records.iter().map(|record| record.sales_amount).sum::<f64>() / records.len() as f64
}
