//! The application-state container.
//!
//! A `Workspace` owns the in-memory snapshot, the optional backing store and
//! the configuration. Hierarchy, authorization and statistics are computed
//! from the snapshot on demand by the pure functions in their own modules.
//!
//! RULES:
//!   - A failed read never becomes fatal: the workspace falls back to seed data.
//!   - A failed write keeps the optimistic local copy and reports a warning.
//!   - A snapshot is swapped in only after a complete, successful read.

use crate::{
    analysis::{analyze_or_fallback, Analyzer},
    auth::{self, Session},
    authz::{can_view_evaluation, check_can_initiate},
    config::AppConfig,
    dataset::Dataset,
    error::{EvalError, EvalResult},
    hierarchy::OrgChart,
    model::{Employee, SavedEvaluation},
    rubric::ScoreInput,
    seed,
    stats::{refresh_average_scores, DashboardStats},
    store::EvalStore,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Store,
    Seed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveOutcome {
    pub persisted: bool,
    pub warning: Option<String>,
}

impl SaveOutcome {
    fn saved() -> Self {
        Self { persisted: true, warning: None }
    }

    fn local_only(warning: String) -> Self {
        Self { persisted: false, warning: Some(warning) }
    }
}

pub struct Workspace {
    pub config: AppConfig,
    store: Option<EvalStore>,
    dataset: Dataset,
    source: DataSource,
}

impl Workspace {
    /// Open the configured store, falling back to seed data from `data_dir`.
    pub fn open(config: AppConfig, data_dir: &str) -> Self {
        let seed = seed::load_seed(data_dir);
        let opened = EvalStore::open(&config.db_path).and_then(|s| {
            s.migrate()?;
            Ok(s)
        });
        match opened {
            Ok(store) => Self::with_store(config, store, seed),
            Err(e) => {
                log::warn!("Store {} unavailable ({e}); running on seed data", config.db_path);
                Self::offline(config, seed)
            }
        }
    }

    /// Load from `store`. An empty store is initialised with `seed`; an
    /// unreadable one is dropped so seed data never overwrites it.
    pub fn with_store(config: AppConfig, store: EvalStore, seed: Dataset) -> Self {
        match store.load_dataset() {
            Ok(ds) if !ds.is_empty() => {
                log::info!("Loaded organization from {}", store.path().unwrap_or(":memory:"));
                let mut ws = Self { config, store: Some(store), dataset: ds, source: DataSource::Store };
                ws.refresh_averages();
                ws
            }
            Ok(_) => {
                log::info!("Store is empty; initialising with seed organization");
                let mut ws = Self { config, store: Some(store), dataset: seed, source: DataSource::Seed };
                ws.refresh_averages();
                if ws.persist().persisted {
                    ws.source = DataSource::Store;
                }
                ws
            }
            Err(e) => {
                log::warn!("Cannot read store ({e}); running on seed data without persistence");
                Self::offline(config, seed)
            }
        }
    }

    /// A workspace with no backend. Every save reports a warning.
    pub fn offline(config: AppConfig, dataset: Dataset) -> Self {
        let mut ws = Self { config, store: None, dataset, source: DataSource::Seed };
        ws.refresh_averages();
        ws
    }

    /// In-memory store seeded with the built-in organization (used in tests).
    pub fn build_test() -> EvalResult<Self> {
        let store = EvalStore::in_memory()?;
        store.migrate()?;
        Ok(Self::with_store(AppConfig::default_test(), store, seed::builtin_dataset()))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn store(&self) -> Option<&EvalStore> {
        self.store.as_ref()
    }

    pub fn chart(&self) -> OrgChart<'_> {
        OrgChart::with_policy(&self.dataset.employees, self.config.root_policy, self.config.max_depth)
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::compute(
            &self.dataset.employees,
            &self.dataset.departments,
            &self.dataset.evaluations,
        )
    }

    // ── Session ──────────────────────────────────────────────────────

    pub fn login(&self, identity: &str, password: &str) -> EvalResult<Session> {
        auth::login(&self.dataset, identity, password, &self.config.system_password)
    }

    /// The viewer is resolved against the current snapshot on every call.
    fn viewer(&self, session: &Session) -> EvalResult<&Employee> {
        self.dataset
            .employee(&session.viewer_id)
            .ok_or_else(|| EvalError::UnknownEmployee { id: session.viewer_id.clone() })
    }

    fn target(&self, id: &str) -> EvalResult<&Employee> {
        self.dataset
            .employee(id)
            .ok_or_else(|| EvalError::UnknownEmployee { id: id.to_string() })
    }

    /// Everyone the viewer may start an evaluation for.
    pub fn evaluable_by(&self, session: &Session) -> EvalResult<Vec<&Employee>> {
        let viewer = self.viewer(session)?;
        Ok(self
            .dataset
            .employees
            .iter()
            .filter(|e| check_can_initiate(viewer, e).is_ok())
            .collect())
    }

    pub fn visible_evaluations(&self, session: &Session) -> EvalResult<Vec<&SavedEvaluation>> {
        let viewer = self.viewer(session)?;
        let chart = self.chart();
        Ok(self
            .dataset
            .evaluations
            .iter()
            .filter(|ev| can_view_evaluation(self.config.view_policy, viewer, ev, &chart))
            .collect())
    }

    // ── Evaluations ──────────────────────────────────────────────────

    /// Authorize, score, analyze and record a new evaluation.
    ///
    /// Refusals (self, non-subordinate, bad scores) happen before any state
    /// changes. Analyzer failures are absorbed into the fallback analysis.
    pub fn submit_evaluation(
        &mut self,
        session: &Session,
        target_id: &str,
        scores: &[ScoreInput],
        analyzer: &dyn Analyzer,
        now: DateTime<Utc>,
    ) -> EvalResult<(SavedEvaluation, SaveOutcome)> {
        let viewer = self.viewer(session)?;
        let target = self.target(target_id)?;
        check_can_initiate(viewer, target)?;
        let criteria = self.config.rubric.score(scores)?;
        let analysis = analyze_or_fallback(analyzer, target, &criteria);
        let evaluation = SavedEvaluation::new(&target.id, &viewer.id, criteria, analysis, now);

        log::info!(
            "Evaluation {} of {} by {} recorded",
            evaluation.id,
            evaluation.employee_id,
            evaluation.evaluator_id
        );
        self.dataset.evaluations.push(evaluation.clone());
        self.refresh_averages();
        let outcome = self.persist();
        Ok((evaluation, outcome))
    }

    /// Remove one evaluation from history.
    pub fn delete_evaluation(&mut self, id: &str) -> EvalResult<SaveOutcome> {
        self.dataset.remove_evaluation(id)?;
        self.refresh_averages();
        let Some(store) = &self.store else {
            return Ok(SaveOutcome::local_only("No backend; deletion kept locally".into()));
        };
        Ok(match store.delete_evaluation(id) {
            Ok(()) => SaveOutcome::saved(),
            Err(e) => {
                log::warn!("Failed to delete evaluation {id} from store: {e}");
                SaveOutcome::local_only(format!("Deletion not persisted: {e}"))
            }
        })
    }

    // ── Administration ───────────────────────────────────────────────

    pub fn add_department(&mut self, name: &str) -> EvalResult<SaveOutcome> {
        self.dataset.add_department(name)?;
        Ok(self.persist())
    }

    pub fn rename_department(&mut self, old: &str, new: &str) -> EvalResult<SaveOutcome> {
        self.dataset.rename_department(old, new)?;
        Ok(self.persist())
    }

    pub fn remove_department(&mut self, name: &str) -> EvalResult<SaveOutcome> {
        self.dataset.remove_department(name)?;
        Ok(self.persist())
    }

    pub fn upsert_employee(&mut self, employee: Employee) -> EvalResult<SaveOutcome> {
        self.dataset.upsert_employee(employee)?;
        self.refresh_averages();
        Ok(self.persist())
    }

    pub fn remove_employee(&mut self, id: &str) -> EvalResult<SaveOutcome> {
        self.dataset.remove_employee(id)?;
        self.refresh_averages();
        Ok(self.persist())
    }

    /// Replace the whole snapshot (bulk import / full write from a client).
    pub fn replace_dataset(&mut self, dataset: Dataset) -> SaveOutcome {
        self.dataset = dataset;
        self.refresh_averages();
        self.persist()
    }

    /// Re-read from the store. On failure the current snapshot stays untouched.
    pub fn reload(&mut self) -> EvalResult<()> {
        let Some(store) = &self.store else {
            log::debug!("Reload skipped: no backend");
            return Ok(());
        };
        let fresh = store.load_dataset().map_err(|e| {
            log::warn!("Reload failed, keeping current snapshot: {e}");
            e
        })?;
        self.dataset = fresh;
        self.source = DataSource::Store;
        self.refresh_averages();
        Ok(())
    }

    fn refresh_averages(&mut self) {
        let Dataset { employees, evaluations, .. } = &mut self.dataset;
        refresh_average_scores(employees, evaluations);
    }

    fn persist(&mut self) -> SaveOutcome {
        let Some(store) = &mut self.store else {
            return SaveOutcome::local_only("No backend; changes kept locally".into());
        };
        match store.replace_all(&self.dataset) {
            Ok(()) => SaveOutcome::saved(),
            Err(e) => {
                log::warn!("Save failed, keeping local copy: {e}");
                SaveOutcome::local_only(format!("Changes not persisted: {e}"))
            }
        }
    }
}
