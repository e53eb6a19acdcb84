//! Adapter that turns an image into a [`ClassificationResult`].
//!
//! The model is loaded lazily on first use, walking [`Backend::FALLBACK_CHAIN`]
//! until one backend comes up; that model is cached for later calls. A failed
//! inference is retried exactly once on a freshly loaded portable model. Any
//! remaining failure degrades to [`ClassificationResult::unknown`].

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::labels::LabelRules;
use crate::model::{ClassificationResult, LabelScore, WasteCategory};
use crate::ports::{Backend, ImageModel, ModelLoader, PortError};
use crate::upload::ImageData;

/// Number of candidate labels requested from the model.
pub const TOP_K: usize = 5;

enum ModelState {
    Uninitialized,
    Ready(Arc<dyn ImageModel>),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Observable state of the cached model handle.
pub enum ModelStatus {
    /// No classification has been attempted yet.
    Uninitialized,
    /// A model is cached on the given backend.
    Ready(Backend),
    /// The last initialization attempt failed on every backend.
    Failed,
}

/// Classifies waste images through a lazily loaded model.
pub struct WasteClassifier {
    loader: Arc<dyn ModelLoader>,
    rules: LabelRules,
    state: Mutex<ModelState>,
}

impl WasteClassifier {
    /// Create a classifier using the default label rules.
    #[must_use]
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            rules: LabelRules::default(),
            state: Mutex::new(ModelState::Uninitialized),
        }
    }

    /// Current state of the model handle.
    pub async fn status(&self) -> ModelStatus {
        match &*self.state.lock().await {
            ModelState::Uninitialized => ModelStatus::Uninitialized,
            ModelState::Ready(model) => ModelStatus::Ready(model.backend()),
            ModelState::Failed => ModelStatus::Failed,
        }
    }

    /// Classify an image. Never fails; see the module docs for the degradation path.
    pub async fn classify(&self, image: &ImageData) -> ClassificationResult {
        let model = match self.ensure_model().await {
            Ok(model) => model,
            Err(err) => {
                tracing::error!(error = %err, "no inference backend could be initialized");
                return ClassificationResult::unknown();
            }
        };

        let candidates = match model.classify(image, TOP_K).await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(
                    backend = %model.backend(),
                    error = %err,
                    "initial inference failed, retrying on portable backend"
                );
                match self.retry_on_portable(image).await {
                    Ok(candidates) => candidates,
                    Err(retry_err) => {
                        tracing::error!(error = %retry_err, "inference failed on all backends");
                        return ClassificationResult::unknown();
                    }
                }
            }
        };

        tracing::debug!(image = %image.name, ?candidates, "top-k outputs");
        self.pick(&candidates)
    }

    /// Choose the first candidate with a specific category, else the top one.
    #[must_use]
    pub fn pick(&self, candidates: &[LabelScore]) -> ClassificationResult {
        let mapped: Vec<(&LabelScore, WasteCategory)> = candidates
            .iter()
            .take(TOP_K)
            .map(|candidate| (candidate, self.rules.categorize(&candidate.label)))
            .collect();

        let picked = mapped
            .iter()
            .find(|(_, category)| *category != WasteCategory::Mixed)
            .or_else(|| mapped.first());

        match picked {
            Some((candidate, category)) => ClassificationResult {
                label: candidate.label.clone(),
                score: sanitize_score(candidate.score),
                category: *category,
            },
            None => ClassificationResult::unknown(),
        }
    }

    async fn ensure_model(&self) -> Result<Arc<dyn ImageModel>, PortError> {
        let mut state = self.state.lock().await;
        if let ModelState::Ready(model) = &*state {
            return Ok(Arc::clone(model));
        }

        let mut last_error = None;
        for backend in Backend::FALLBACK_CHAIN {
            match self.loader.load(backend).await {
                Ok(model) => {
                    tracing::info!(%backend, "image model initialized");
                    *state = ModelState::Ready(Arc::clone(&model));
                    return Ok(model);
                }
                Err(err) => {
                    tracing::warn!(%backend, error = %err, "backend failed to initialize");
                    last_error = Some(err);
                }
            }
        }

        *state = ModelState::Failed;
        Err(last_error.unwrap_or_else(|| PortError::Internal("empty backend chain".into())))
    }

    async fn retry_on_portable(&self, image: &ImageData) -> Result<Vec<LabelScore>, PortError> {
        let model = {
            let mut state = self.state.lock().await;
            let model = self.loader.load(Backend::Portable).await?;
            *state = ModelState::Ready(Arc::clone(&model));
            model
        };
        model.classify(image, TOP_K).await
    }
}

fn sanitize_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::upload::AcceptedMime;

    type Outcome = Result<Vec<LabelScore>, String>;

    struct ScriptedModel {
        backend: Backend,
        outcomes: StdMutex<VecDeque<Outcome>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageModel for ScriptedModel {
        fn backend(&self) -> Backend {
            self.backend
        }

        async fn classify(
            &self,
            _image: &ImageData,
            top_k: usize,
        ) -> Result<Vec<LabelScore>, PortError> {
            assert_eq!(top_k, TOP_K, "adapter must ask for the top five");
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.outcomes.lock().unwrap().pop_front();
            match next {
                Some(Ok(candidates)) => Ok(candidates),
                Some(Err(reason)) => Err(PortError::Inference(reason)),
                None => Err(PortError::Inference("script exhausted".into())),
            }
        }
    }

    #[derive(Default)]
    struct ScriptedLoader {
        /// Per-backend queue of load results; `None` entries fail to load.
        scripts: StdMutex<HashMap<Backend, VecDeque<Option<Vec<Outcome>>>>>,
        loads: StdMutex<Vec<Backend>>,
    }

    impl ScriptedLoader {
        fn on(self, backend: Backend, model: Option<Vec<Outcome>>) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .entry(backend)
                .or_default()
                .push_back(model);
            self
        }

        fn loads(&self) -> Vec<Backend> {
            self.loads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelLoader for ScriptedLoader {
        async fn load(&self, backend: Backend) -> Result<Arc<dyn ImageModel>, PortError> {
            self.loads.lock().unwrap().push(backend);
            let script = self
                .scripts
                .lock()
                .unwrap()
                .get_mut(&backend)
                .and_then(VecDeque::pop_front)
                .flatten();
            match script {
                Some(outcomes) => Ok(Arc::new(ScriptedModel {
                    backend,
                    outcomes: StdMutex::new(outcomes.into()),
                    calls: AtomicUsize::new(0),
                })),
                None => Err(PortError::BackendUnavailable {
                    backend,
                    reason: String::from("scripted failure"),
                }),
            }
        }
    }

    fn image() -> ImageData {
        ImageData {
            name: String::from("photo.jpg"),
            mime: AcceptedMime::Jpeg,
            bytes: vec![0xFF, 0xD8, 0xFF],
        }
    }

    fn labels(pairs: &[(&str, f64)]) -> Vec<LabelScore> {
        pairs
            .iter()
            .map(|(label, score)| LabelScore::new(*label, *score))
            .collect()
    }

    fn classifier(loader: ScriptedLoader) -> (Arc<ScriptedLoader>, WasteClassifier) {
        let loader = Arc::new(loader);
        let classifier = WasteClassifier::new(Arc::clone(&loader) as Arc<dyn ModelLoader>);
        (loader, classifier)
    }

    #[tokio::test]
    async fn picks_first_specific_category_in_model_order() {
        let top = labels(&[
            ("plastic water bottle", 0.4),
            ("glass jar", 0.35),
            ("banana", 0.1),
            ("tin can", 0.1),
            ("newspaper", 0.05),
        ]);
        let (_, classifier) =
            classifier(ScriptedLoader::default().on(Backend::Accelerated, Some(vec![Ok(top)])));

        let result = classifier.classify(&image()).await;

        assert_eq!(result.label, "plastic water bottle");
        assert!((result.score - 0.4).abs() < f64::EPSILON);
        assert_eq!(result.category, WasteCategory::Plastic);
        assert!((crate::pricing::estimate_price(result.category, 1.0) - 18.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn lower_ranked_specific_label_beats_mixed_top_label() {
        let top = labels(&[("banana", 0.9), ("orange", 0.05), ("carton", 0.03)]);
        let (_, classifier) =
            classifier(ScriptedLoader::default().on(Backend::Accelerated, Some(vec![Ok(top)])));

        let result = classifier.classify(&image()).await;

        assert_eq!(result.label, "carton");
        assert_eq!(result.category, WasteCategory::Paper);
    }

    #[tokio::test]
    async fn all_mixed_uses_top_ranked_candidate() {
        let top = labels(&[
            ("banana", 0.6),
            ("orange", 0.2),
            ("lemon", 0.1),
            ("fig", 0.05),
            ("pineapple", 0.05),
        ]);
        let (_, classifier) =
            classifier(ScriptedLoader::default().on(Backend::Accelerated, Some(vec![Ok(top)])));

        let result = classifier.classify(&image()).await;

        assert_eq!(result.label, "banana");
        assert!((result.score - 0.6).abs() < f64::EPSILON);
        assert_eq!(result.category, WasteCategory::Mixed);
    }

    #[test]
    fn empty_candidates_yield_sentinel() {
        let (_, classifier) = classifier(ScriptedLoader::default());
        assert_eq!(classifier.pick(&[]), ClassificationResult::unknown());
    }

    #[test]
    fn candidates_past_top_five_are_ignored() {
        let (_, classifier) = classifier(ScriptedLoader::default());
        let top = labels(&[
            ("banana", 0.5),
            ("orange", 0.2),
            ("lemon", 0.1),
            ("fig", 0.1),
            ("pineapple", 0.05),
            ("newspaper", 0.05),
        ]);
        assert_eq!(classifier.pick(&top).category, WasteCategory::Mixed);
    }

    #[test]
    fn scores_are_clamped() {
        let (_, classifier) = classifier(ScriptedLoader::default());
        assert!(classifier.pick(&labels(&[("carton", f64::NAN)])).score.abs() < f64::EPSILON);
        assert!((classifier.pick(&labels(&[("carton", 1.7)])).score - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn falls_back_through_backends_and_caches_the_first_success() {
        let first = labels(&[("newspaper", 0.8)]);
        let second = labels(&[("beer bottle", 0.7)]);
        let (loader, classifier) = classifier(
            ScriptedLoader::default()
                .on(Backend::Accelerated, None)
                .on(Backend::Portable, Some(vec![Ok(first), Ok(second)])),
        );
        assert_eq!(classifier.status().await, ModelStatus::Uninitialized);

        assert_eq!(
            classifier.classify(&image()).await.category,
            WasteCategory::Paper
        );
        assert_eq!(
            classifier.classify(&image()).await.category,
            WasteCategory::Glass
        );

        assert_eq!(loader.loads(), vec![Backend::Accelerated, Backend::Portable]);
        assert_eq!(
            classifier.status().await,
            ModelStatus::Ready(Backend::Portable)
        );
    }

    #[tokio::test]
    async fn default_backend_is_the_last_resort() {
        let (loader, classifier) = classifier(
            ScriptedLoader::default()
                .on(Backend::Accelerated, None)
                .on(Backend::Portable, None)
                .on(Backend::Default, Some(vec![Ok(labels(&[("screw", 0.9)]))])),
        );

        let result = classifier.classify(&image()).await;

        assert_eq!(result.category, WasteCategory::Metal);
        assert_eq!(
            loader.loads(),
            vec![Backend::Accelerated, Backend::Portable, Backend::Default]
        );
        assert_eq!(classifier.status().await, ModelStatus::Ready(Backend::Default));
    }

    #[tokio::test]
    async fn inference_failure_retries_once_on_portable() {
        let (loader, classifier) = classifier(
            ScriptedLoader::default()
                .on(Backend::Accelerated, Some(vec![Err("device lost".into())]))
                .on(
                    Backend::Portable,
                    Some(vec![Ok(labels(&[("wine bottle", 0.66)]))]),
                ),
        );

        let result = classifier.classify(&image()).await;

        assert_eq!(result.label, "wine bottle");
        assert_eq!(result.category, WasteCategory::Glass);
        assert_eq!(loader.loads(), vec![Backend::Accelerated, Backend::Portable]);
        assert_eq!(
            classifier.status().await,
            ModelStatus::Ready(Backend::Portable)
        );
    }

    #[tokio::test]
    async fn failure_on_both_attempts_yields_sentinel() {
        let (loader, classifier) = classifier(
            ScriptedLoader::default()
                .on(Backend::Accelerated, Some(vec![Err("first".into())]))
                .on(Backend::Portable, Some(vec![Err("second".into())])),
        );

        let result = classifier.classify(&image()).await;

        assert_eq!(result, ClassificationResult::unknown());
        assert_eq!(loader.loads(), vec![Backend::Accelerated, Backend::Portable]);
    }

    #[tokio::test]
    async fn failed_portable_reload_yields_sentinel() {
        let (_, classifier) = classifier(
            ScriptedLoader::default()
                .on(Backend::Accelerated, Some(vec![Err("first".into())]))
                .on(Backend::Portable, None),
        );

        assert_eq!(
            classifier.classify(&image()).await,
            ClassificationResult::unknown()
        );
        assert_eq!(
            classifier.status().await,
            ModelStatus::Ready(Backend::Accelerated)
        );
    }

    #[tokio::test]
    async fn no_backend_yields_sentinel_and_retries_next_time() {
        let (loader, classifier) = classifier(
            ScriptedLoader::default()
                .on(Backend::Accelerated, None)
                .on(Backend::Portable, None)
                .on(Backend::Default, None)
                .on(Backend::Accelerated, Some(vec![Ok(labels(&[("carton", 0.5)]))])),
        );

        assert_eq!(
            classifier.classify(&image()).await,
            ClassificationResult::unknown()
        );
        assert_eq!(classifier.status().await, ModelStatus::Failed);

        assert_eq!(
            classifier.classify(&image()).await.category,
            WasteCategory::Paper
        );
        assert_eq!(loader.loads().len(), 4);
    }
}
