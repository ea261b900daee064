//! Memoized analysis runs.

use crate::dataset::RawTable;
use crate::error::Result;
use crate::pipeline::{run_analysis, AnalysisParams, AnalysisReport};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Caches reports keyed by the input table and parameters, so repeated
/// requests with unchanged inputs skip the model search.
#[derive(Debug, Default)]
pub struct Analyzer {
    cache: Mutex<HashMap<u64, Arc<AnalysisReport>>>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the analysis, or return the memoized report when this exact
    /// table and parameter set has been analyzed before.
    pub fn analyze(&self, table: &RawTable, params: &AnalysisParams) -> Result<Arc<AnalysisReport>> {
        let key = cache_key(table, params);

        if let Some(hit) = self.lock().get(&key) {
            debug!(key, "analysis cache hit");
            return Ok(Arc::clone(hit));
        }

        // Computed outside the lock: a slow model search must not block
        // cache reads for other inputs.
        let report = Arc::new(run_analysis(table, params)?);
        self.lock().insert(key, Arc::clone(&report));
        Ok(report)
    }

    /// Drop every memoized report.
    pub fn invalidate(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Arc<AnalysisReport>>> {
        // A poisoned lock only means another analysis panicked; the map
        // itself is still usable.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn cache_key(table: &RawTable, params: &AnalysisParams) -> u64 {
    let mut hasher = DefaultHasher::new();
    table.hash(&mut hasher);
    params.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::load_csv_bytes;

    fn monthly_csv() -> String {
        let mut csv = String::from("date,customer,category,amount\n");
        for i in 0..48usize {
            let year = 2020 + i / 12;
            let month = i % 12 + 1;
            let amount = 1000.0
                + 12.0 * i as f64
                + 200.0 * (i as f64 * std::f64::consts::TAU / 12.0).sin();
            csv.push_str(&format!(
                "{year}-{month:02}-15,C{:02},Retail,{amount:.2}\n",
                i % 7
            ));
        }
        csv
    }

    #[test]
    fn identical_inputs_share_a_report() {
        let table = load_csv_bytes(monthly_csv().as_bytes()).unwrap();
        let params = AnalysisParams::default();
        let analyzer = Analyzer::new();

        let first = analyzer.analyze(&table, &params).unwrap();
        let second = analyzer.analyze(&table, &params).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(analyzer.len(), 1);
    }

    #[test]
    fn changed_params_miss_the_cache() {
        let table = load_csv_bytes(monthly_csv().as_bytes()).unwrap();
        let analyzer = Analyzer::new();

        let base = AnalysisParams::default();
        let mut wider = base.clone();
        wider.horizon = 9;

        let first = analyzer.analyze(&table, &base).unwrap();
        let second = analyzer.analyze(&table, &wider).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(analyzer.len(), 2);
    }

    #[test]
    fn invalidate_clears_everything() {
        let table = load_csv_bytes(monthly_csv().as_bytes()).unwrap();
        let analyzer = Analyzer::new();
        analyzer.analyze(&table, &AnalysisParams::default()).unwrap();
        assert!(!analyzer.is_empty());

        analyzer.invalidate();
        assert!(analyzer.is_empty());
    }

    #[test]
    fn failed_runs_are_not_cached() {
        let table = load_csv_bytes(monthly_csv().as_bytes()).unwrap();
        let analyzer = Analyzer::new();

        let mut bad = AnalysisParams::default();
        bad.horizon = 0;
        assert!(analyzer.analyze(&table, &bad).is_err());
        assert!(analyzer.is_empty());
    }
}
