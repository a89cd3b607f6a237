pub mod average;
pub mod chart;
pub mod editor;
pub mod engine;
pub mod report;
pub mod scale;

use crate::config::Config;
use crate::core::average::{TestBook, TestScore};
use crate::core::chart::ChartRow;
use crate::core::engine::{CalculationError, CalculationResult};
use crate::core::scale::GradeScale;
use crate::utils::store::{
    AVERAGE_BACKUP_KEY, AVERAGE_TESTS_KEY, CUSTOM_SCALE_KEY, LAST_RESULT_KEY, PreferenceStore,
};
use anyhow::Result;
use std::path::Path;

/// Configuration plus the preference store it points at. Everything the
/// engine needs from the store is read here and passed in explicitly.
pub struct Session {
    pub config: Config,
    pub store: PreferenceStore,
}

impl Session {
    pub fn new(config: Config, cwd: &Path) -> Self {
        let store = PreferenceStore::open(
            config.store.resolved_path(cwd),
            config.store.enabled,
        );
        Self { config, store }
    }

    pub fn active_scale(&self) -> GradeScale {
        self.store.active_scale()
    }

    /// Runs a calculation on the active scale and remembers it when it
    /// succeeds. A store that cannot be written never hides the result.
    pub fn calculate(
        &self,
        total_raw: &str,
        wrong_raw: &str,
    ) -> Result<CalculationResult, CalculationError> {
        let scale = self.active_scale();
        let outcome = engine::calculate_from_input(total_raw, wrong_raw, &scale);

        if let Ok(result) = &outcome {
            match self.store.save(LAST_RESULT_KEY, result) {
                Ok(true) => {}
                Ok(false) => tracing::debug!("preference store disabled, last result not saved"),
                Err(err) => {
                    tracing::warn!(error = %format!("{err:#}"), "could not save last result")
                }
            }
        }

        outcome
    }

    pub fn last_result(&self) -> Option<CalculationResult> {
        self.store.load(LAST_RESULT_KEY, None)
    }

    pub fn chart(&self, total: i64) -> Vec<ChartRow> {
        chart::chart_table(total, self.config.general.chart_limit, &self.active_scale())
    }

    pub fn test_book(&self) -> TestBook {
        TestBook::from_saved(self.store.load::<Vec<TestScore>>(AVERAGE_TESTS_KEY, Vec::new()))
    }

    pub fn save_test_book(&self, book: &TestBook) -> Result<bool> {
        self.store.save(AVERAGE_TESTS_KEY, book)
    }

    pub fn clear_test_book(&self) -> Result<bool> {
        self.store.remove(AVERAGE_TESTS_KEY)
    }

    /// Copies the tests to the backup key; the working list is untouched.
    pub fn backup_test_book(&self, book: &TestBook) -> Result<bool> {
        self.store.save(AVERAGE_BACKUP_KEY, book)
    }

    /// Callers must only pass scales that validated cleanly.
    pub fn save_scale(&self, scale: &GradeScale) -> Result<bool> {
        self.store.save(CUSTOM_SCALE_KEY, scale)
    }

    pub fn reset_scale(&self) -> Result<bool> {
        self.store.remove(CUSTOM_SCALE_KEY)
    }
}
