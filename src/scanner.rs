use anyhow::{bail, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;

use crate::config::{Config, HeuristicConfig};
use crate::decision::{decide, Label};
use crate::features::SignalExtractor;
use crate::ledger::{LedgerEntry, ScanLedger, Verdict};
use crate::model::{LinearModel, UrlModel};
use crate::scorer::risk_score;

/// What a scan hands back to the caller once the verdict is persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub url: String,
    pub prediction: Label,
    pub confidence: f64,
    pub risk_score: u8,
    pub reasons: Vec<String>,
}

/// Runs the whole pipeline for one URL: signals -> model -> risk score ->
/// decision -> ledger. Stateless apart from the ledger append, so any number
/// of scans may run in parallel.
pub struct Scanner {
    heuristics: HeuristicConfig,
    extractor: SignalExtractor,
    model: Box<dyn UrlModel>,
    ledger: ScanLedger,
}

impl Scanner {
    pub fn new(
        heuristics: HeuristicConfig,
        extractor: SignalExtractor,
        model: Box<dyn UrlModel>,
        ledger: ScanLedger,
    ) -> Self {
        Self {
            heuristics,
            extractor,
            model,
            ledger,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let extractor = SignalExtractor::new(config)?;
        let model = LinearModel::load_or_default(config.model_path.as_deref());
        let ledger = ScanLedger::open(Path::new(&config.database_path))?;
        Ok(Self::new(
            config.heuristics.clone(),
            extractor,
            Box::new(model),
            ledger,
        ))
    }

    /// Scan one URL. Empty input is rejected before anything runs or is
    /// persisted; a ledger failure surfaces as an error with no verdict
    /// returned.
    pub async fn scan(&self, url: &str) -> Result<ScanReport> {
        let url = url.trim();
        if url.is_empty() {
            bail!("URL is required");
        }

        let (features, signals) = self.extractor.extract(url).await;
        let prediction = self.model.predict(features.as_slice());
        let confidence = prediction.confidence();

        let score = risk_score(confidence, &signals, &self.heuristics.weights);
        let decision = decide(
            &prediction.label,
            confidence,
            &signals,
            score,
            url,
            &self.heuristics,
        );

        let verdict = Verdict {
            url: url.to_string(),
            label: decision.label,
            confidence,
            risk_score: decision.risk_score,
            reasons: decision.reasons,
            timestamp: Utc::now(),
        };
        let entry_id = self.ledger.append(&verdict)?;

        log::info!(
            "scan #{entry_id}: {url} -> {} (confidence {:.4}, risk {})",
            verdict.label,
            confidence,
            verdict.risk_score
        );

        Ok(ScanReport {
            url: verdict.url,
            prediction: verdict.label,
            confidence: round4(confidence),
            risk_score: verdict.risk_score,
            reasons: verdict.reasons,
        })
    }

    pub fn history(&self, limit: u32) -> Result<Vec<LedgerEntry>> {
        self.ledger.recent(limit)
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
