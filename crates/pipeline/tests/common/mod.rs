//! In-memory collaborator fakes shared by the pipeline integration
//! tests. Each fake records enough call history to assert on cascade
//! order and cache behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use mealscan_core::config::PipelineConfig;
use mealscan_core::error::CoreError;
use mealscan_core::job::{AnalysisInput, AnalysisJob, InputKind, JobStatus, NewJob};
use mealscan_core::nutrients::NutrientsPer100g;
use mealscan_core::ports::{
    FoodCandidate, LocalFoodSearch, NutritionProvider, PersistenceStore, ProviderFood,
    SearchHit, Translator, VisionExtractor,
};
use mealscan_core::snapshot::{AnalysisSnapshot, StoredSnapshot};
use mealscan_core::types::DbId;
use mealscan_events::EventBus;
use mealscan_pipeline::{
    AnalysisService, MatchEngine, MemoryCache, PipelineRunner, SubmitRequest,
};

// ---------------------------------------------------------------------------
// Vision
// ---------------------------------------------------------------------------

/// Scripted extraction results keyed by the raw input reference.
#[derive(Default)]
pub struct FakeVision {
    pub scripts: Mutex<HashMap<String, Vec<FoodCandidate>>>,
    pub fail: std::sync::atomic::AtomicBool,
}

impl FakeVision {
    pub fn script(&self, input_ref: &str, candidates: Vec<FoodCandidate>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(input_ref.to_string(), candidates);
    }
}

#[async_trait]
impl VisionExtractor for FakeVision {
    async fn extract(
        &self,
        input: &AnalysisInput,
        _locale: &str,
    ) -> Result<Vec<FoodCandidate>, CoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::ProviderUnavailable("vision offline".into()));
        }
        Ok(self
            .scripts
            .lock()
            .unwrap()
            .get(input.as_ref_str())
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Local search
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeSearch {
    pub rows: Mutex<HashMap<String, SearchHit>>,
    pub calls: AtomicU32,
}

impl FakeSearch {
    pub fn seed(&self, normalized_name: &str, per_100g: NutrientsPer100g, rank: f64) {
        self.rows.lock().unwrap().insert(
            normalized_name.to_string(),
            SearchHit {
                name: normalized_name.to_string(),
                per_100g,
                rank,
            },
        );
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalFoodSearch for FakeSearch {
    async fn search(&self, normalized_name: &str) -> Result<Option<SearchHit>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.lock().unwrap().get(normalized_name).cloned())
    }
}

// ---------------------------------------------------------------------------
// Nutrition provider
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeProvider {
    pub rows: Mutex<HashMap<String, ProviderFood>>,
    pub calls: AtomicU32,
    /// Number of leading calls that fail with `ProviderUnavailable`.
    pub failures_before_success: AtomicU32,
}

impl FakeProvider {
    pub fn seed(&self, normalized_name: &str, food: ProviderFood) {
        self.rows
            .lock()
            .unwrap()
            .insert(normalized_name.to_string(), food);
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NutritionProvider for FakeProvider {
    async fn lookup(
        &self,
        normalized_name: &str,
        _locale: &str,
    ) -> Result<Option<ProviderFood>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_before_success.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_before_success
                .store(remaining - 1, Ordering::SeqCst);
            return Err(CoreError::ProviderUnavailable("simulated timeout".into()));
        }
        Ok(self.rows.lock().unwrap().get(normalized_name).cloned())
    }
}

// ---------------------------------------------------------------------------
// Translator
// ---------------------------------------------------------------------------

/// Translates by prefixing the locale, or fails when told to.
#[derive(Default)]
pub struct FakeTranslator {
    pub fail: std::sync::atomic::AtomicBool,
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str, target_locale: &str) -> Result<String, CoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::ProviderUnavailable("translator offline".into()));
        }
        Ok(format!("[{target_locale}] {text}"))
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreInner {
    jobs: Vec<AnalysisJob>,
    results: Vec<StoredSnapshot>,
    next_job_id: DbId,
    next_result_id: DbId,
}

/// Append-only in-memory persistence, mirroring the Postgres contract.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    pub fn result_count(&self, job_id: DbId) -> usize {
        self.inner
            .lock()
            .unwrap()
            .results
            .iter()
            .filter(|r| r.job_id == job_id)
            .count()
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn create_job(&self, new_job: &NewJob) -> Result<AnalysisJob, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_job_id += 1;
        let job = AnalysisJob {
            id: inner.next_job_id,
            status: JobStatus::Pending,
            input: new_job.input.clone(),
            locale: new_job.locale.clone(),
            created_at: Utc::now(),
        };
        inner.jobs.push(job.clone());
        Ok(job)
    }

    async fn find_job(&self, job_id: DbId) -> Result<Option<AnalysisJob>, CoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .jobs
            .iter()
            .find(|j| j.id == job_id)
            .cloned())
    }

    async fn find_active_duplicate(
        &self,
        input: &AnalysisInput,
        locale: &str,
    ) -> Result<Option<AnalysisJob>, CoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .jobs
            .iter()
            .find(|j| {
                j.input == *input
                    && j.locale == locale
                    && matches!(j.status, JobStatus::Pending | JobStatus::Processing)
            })
            .cloned())
    }

    async fn claim_next_pending(&self) -> Result<Option<AnalysisJob>, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        for job in inner.jobs.iter_mut() {
            if job.status == JobStatus::Pending {
                job.status = JobStatus::Processing;
                return Ok(Some(job.clone()));
            }
        }
        Ok(None)
    }

    async fn claim_for_processing(&self, job_id: DbId) -> Result<bool, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.jobs.iter_mut().find(|j| j.id == job_id) {
            Some(job) if job.status == JobStatus::Pending => {
                job.status = JobStatus::Processing;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(CoreError::NotFound {
                entity: "analysis job",
                id: job_id,
            }),
        }
    }

    async fn update_job_status(
        &self,
        job_id: DbId,
        status: JobStatus,
    ) -> Result<(), CoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.jobs.iter_mut().find(|j| j.id == job_id) {
            Some(job) => {
                job.status = status;
                Ok(())
            }
            None => Err(CoreError::NotFound {
                entity: "analysis job",
                id: job_id,
            }),
        }
    }

    async fn append_result(
        &self,
        job_id: DbId,
        snapshot: &AnalysisSnapshot,
    ) -> Result<StoredSnapshot, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_result_id += 1;
        let stored = StoredSnapshot {
            id: inner.next_result_id,
            job_id,
            public_token: format!("tok-{}", inner.next_result_id),
            created_at: Utc::now(),
            snapshot: snapshot.clone(),
        };
        inner.results.push(stored.clone());
        Ok(stored)
    }

    async fn latest_result(&self, job_id: DbId) -> Result<Option<StoredSnapshot>, CoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .results
            .iter()
            .filter(|r| r.job_id == job_id)
            .max_by_key(|r| r.id)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Everything a scenario needs, with handles kept on the fakes.
pub struct Harness {
    pub vision: Arc<FakeVision>,
    pub search: Arc<FakeSearch>,
    pub provider: Arc<FakeProvider>,
    pub translator: Arc<FakeTranslator>,
    pub store: Arc<MemoryStore>,
    pub bus: Arc<EventBus>,
    pub service: AnalysisService,
}

pub fn harness() -> Harness {
    harness_with_config(PipelineConfig {
        // Keep retry pauses negligible in tests.
        provider_retry_initial_delay: std::time::Duration::from_millis(1),
        ..PipelineConfig::default()
    })
}

pub fn harness_with_config(config: PipelineConfig) -> Harness {
    let vision = Arc::new(FakeVision::default());
    let search = Arc::new(FakeSearch::default());
    let provider = Arc::new(FakeProvider::default());
    let translator = Arc::new(FakeTranslator::default());
    let store = Arc::new(MemoryStore::default());
    let bus = Arc::new(EventBus::default());

    let matcher = MatchEngine::new(
        search.clone(),
        provider.clone(),
        Arc::new(MemoryCache::new()),
        config.clone(),
    );
    let runner = PipelineRunner::new(vision.clone(), translator.clone(), matcher, config);
    let service = AnalysisService::new(store.clone(), runner, bus.clone());

    Harness {
        vision,
        search,
        provider,
        translator,
        store,
        bus,
        service,
    }
}

pub fn text_request(text: &str, locale: &str) -> SubmitRequest {
    SubmitRequest {
        input_kind: InputKind::Text,
        input_ref: text.to_string(),
        locale: locale.to_string(),
    }
}

/// Submit a text job and run it the way the worker loop does: claim
/// the next pending job, then execute it.
pub async fn run_to_completion(h: &Harness, text: &str, locale: &str) -> DbId {
    let job = h.service.submit(text_request(text, locale)).await.unwrap();
    let claimed = h
        .store
        .claim_next_pending()
        .await
        .unwrap()
        .expect("a pending job to claim");
    assert_eq!(claimed.id, job.id);
    h.service.execute(claimed).await.unwrap();
    job.id
}

/// A plain vision candidate with rough macros.
pub fn candidate(name: &str, portion_g: f64, calories: f64) -> FoodCandidate {
    FoodCandidate {
        name: name.to_string(),
        portion_g,
        calories,
        protein_g: calories / 20.0,
        carbs_g: calories / 10.0,
        fat_g: calories / 40.0,
    }
}

/// Per-100g values for seeding the fakes.
pub fn per100(calories: f64, protein_g: f64, carbs_g: f64, fat_g: f64) -> NutrientsPer100g {
    NutrientsPer100g {
        calories,
        protein_g,
        carbs_g,
        fat_g,
        fiber_g: 0.5,
        sugars_g: 0.5,
        saturated_fat_g: fat_g / 3.0,
    }
}
