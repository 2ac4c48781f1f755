use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::classify::{ClassificationBasis, ClassificationResult};
use crate::corpus::Label;

/// One past prediction as reported by the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub id:         u64,
    /// Stored file name of the uploaded image (no directory component).
    pub filename:   String,
    pub result:     Label,
    pub confidence: f64,
    pub basis:      ClassificationBasis,
    pub timestamp:  DateTime<Local>,
    pub image_url:  String,
    /// The user who submitted the sample, when the client said so.
    pub user_id:    Option<u64>,
}

/// Aggregate counts over the whole log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSummary {
    pub total_predictions: usize,
    pub infected_count:    usize,
    pub healthy_count:     usize,
    /// Share of infected results as a percentage, one decimal place.
    pub infection_rate:    f64,
}

/// Append-only in-memory prediction history.
#[derive(Debug, Default)]
pub struct PredictionLog {
    records: Mutex<Vec<PredictionRecord>>,
}

impl PredictionLog {
    pub fn new() -> Self {
        PredictionLog::default()
    }

    /// Appends a record for `result` and returns it. Ids start at 1.
    pub fn record(&self, filename: &str, result: &ClassificationResult, user_id: Option<u64>) -> PredictionRecord {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let record = PredictionRecord {
            id:         records.len() as u64 + 1,
            filename:   filename.to_owned(),
            result:     result.label,
            confidence: result.confidence,
            basis:      result.basis,
            timestamp:  Local::now(),
            image_url:  format!("/uploads/{}", filename),
            user_id,
        };
        records.push(record.clone());
        record
    }

    /// All records, oldest first.
    pub fn all(&self) -> Vec<PredictionRecord> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn summary(&self) -> PredictionSummary {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let total = records.len();
        let infected = records.iter().filter(|r| r.result == Label::Infected).count();
        let infection_rate = if total == 0 {
            0.0
        } else {
            (infected as f64 / total as f64 * 1000.0).round() / 10.0
        };
        PredictionSummary {
            total_predictions: total,
            infected_count:    infected,
            healthy_count:     total - infected,
            infection_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
