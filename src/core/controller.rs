//! Session state machine: Idle, Loading, Success, Failed.
//!
//! Every operation commits its outcome in one step and then notifies
//! subscribers. Operations that enter `Loading` hold a [`LoadingGuard`], so
//! the flag is cleared on every exit path, including the operation future
//! being dropped half way through.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

use super::encoder;
use super::error::AvatarError;
use super::sample::SampleSource;
use super::session::{GenerationResult, SessionState, SourceImage};
use crate::api::ImageGenerator;

/// Callback run after every committed transition
pub type Observer = Box<dyn Fn(&SessionState) + Send + Sync>;

/// Handle returned by [`SessionController::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Default name of the saved avatar
pub const DOWNLOAD_FILENAME: &str = "cartoon-avatar.png";

pub struct SessionController {
    state: SessionState,
    generator: Arc<dyn ImageGenerator>,
    samples: Arc<dyn SampleSource>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
    download_filename: String,
}

impl SessionController {
    pub fn new(generator: Arc<dyn ImageGenerator>, samples: Arc<dyn SampleSource>) -> Self {
        Self {
            state: SessionState::default(),
            generator,
            samples,
            observers: Vec::new(),
            next_subscription: 0,
            download_filename: DOWNLOAD_FILENAME.to_string(),
        }
    }

    pub fn with_download_filename(mut self, filename: impl Into<String>) -> Self {
        self.download_filename = filename.into();
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Register a callback invoked after each state transition
    pub fn subscribe(
        &mut self,
        observer: impl Fn(&SessionState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn notify(&self) {
        for (_, observer) in &self.observers {
            observer(&self.state);
        }
    }

    /// Replace the source image. Never enters `Loading`.
    pub fn select_image(&mut self, source: SourceImage) {
        tracing::info!(
            "Selected image {} ({}, {} bytes)",
            source.name,
            source.mime_type,
            source.size()
        );
        self.state.preview = Some(source.preview.clone());
        self.state.source_image = Some(source);
        self.state.clear_outcome();
        self.notify();
    }

    /// Read an image from disk and select it
    pub async fn select_file(&mut self, path: &Path) -> Result<(), AvatarError> {
        let source = SourceImage::from_file(path).await?;
        if !encoder::is_image_mime(&source.mime_type) {
            return Err(AvatarError::InvalidImage);
        }
        self.select_image(source);
        Ok(())
    }

    /// Drop the current source image and any outcome
    pub fn clear_image(&mut self) {
        self.state.source_image = None;
        self.state.preview = None;
        self.state.clear_outcome();
        self.notify();
    }

    /// Fetch a sample photo and make it the source image
    pub async fn select_sample(&mut self, url: &str) {
        if self.state.is_loading {
            tracing::warn!("Ignoring sample selection while another operation is running");
            return;
        }

        let samples = Arc::clone(&self.samples);
        let mut guard = LoadingGuard::begin(self, |state| {
            state.source_image = None;
            state.preview = Some(url.to_string());
        });

        let fetched = samples.fetch(url).await;

        guard.commit(|state| match fetched {
            Ok(source) => {
                tracing::info!("Loaded sample {} ({} bytes)", url, source.size());
                state.preview = Some(source.preview.clone());
                state.source_image = Some(source);
            }
            Err(e) => {
                tracing::error!("Failed to load sample {}: {}", url, e);
                state.preview = None;
                state.error = Some(AvatarError::SampleFetch.user_message());
            }
        });
    }

    /// Send the current source image to the model
    pub async fn generate(&mut self) {
        if self.state.is_loading {
            tracing::warn!("Ignoring generate while another operation is running");
            return;
        }

        let Some(source) = self.state.source_image.clone() else {
            self.state.clear_outcome();
            self.state.error = Some(AvatarError::NoSourceImage.user_message());
            self.notify();
            return;
        };

        let generator = Arc::clone(&self.generator);
        let mut guard = LoadingGuard::begin(self, |_| {});

        let outcome = run_generation(generator.as_ref(), &source).await;

        guard.commit(|state| match outcome {
            Ok(result) => {
                tracing::info!("Generated avatar ({} base64 chars)", result.payload().len());
                state.result = Some(result);
            }
            Err(e) => {
                tracing::error!("Generation failed: {}", e);
                state.error = Some(e.user_message());
            }
        });
    }

    /// Write the generated avatar into `dir`. Returns `None` when there is
    /// nothing to download. Session state is left untouched.
    pub async fn download(&self, dir: &Path) -> Result<Option<PathBuf>, AvatarError> {
        let Some(result) = &self.state.result else {
            return Ok(None);
        };

        let bytes = encoder::decode(result.payload())?;
        fs::create_dir_all(dir).await?;
        let path = dir.join(&self.download_filename);
        fs::write(&path, &bytes).await?;

        tracing::info!("Saved avatar to: {}", path.display());
        Ok(Some(path))
    }
}

async fn run_generation(
    generator: &dyn ImageGenerator,
    source: &SourceImage,
) -> Result<GenerationResult, AvatarError> {
    let encoded = source.encode();
    generator
        .generate(&encoded.base64, &encoded.mime_type)
        .await?
        .map(|payload| GenerationResult::from_base64(&payload))
        .ok_or(AvatarError::NoImageReturned)
}

/// Holds a controller in `Loading` until committed or dropped
struct LoadingGuard<'a> {
    controller: &'a mut SessionController,
    committed: bool,
}

impl<'a> LoadingGuard<'a> {
    /// Clear the previous outcome, apply `prepare`, then enter `Loading`
    fn begin(
        controller: &'a mut SessionController,
        prepare: impl FnOnce(&mut SessionState),
    ) -> Self {
        controller.state.clear_outcome();
        prepare(&mut controller.state);
        controller.state.is_loading = true;
        controller.notify();
        Self {
            controller,
            committed: false,
        }
    }

    /// Leave `Loading` with the final outcome in a single transition
    fn commit(&mut self, apply: impl FnOnce(&mut SessionState)) {
        let state = &mut self.controller.state;
        state.is_loading = false;
        apply(state);
        self.committed = true;
        self.controller.notify();
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            tracing::warn!("Operation abandoned while loading");
            self.controller.state.is_loading = false;
            self.controller.notify();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::SessionStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum Reply {
        Image(&'static str),
        NoImage,
        Fail,
    }

    struct MockGenerator {
        reply: Reply,
        calls: AtomicUsize,
        seen: Mutex<Option<(String, String)>>,
    }

    impl MockGenerator {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageGenerator for MockGenerator {
        async fn generate(
            &self,
            base64_image: &str,
            mime_type: &str,
        ) -> Result<Option<String>, AvatarError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen.lock().unwrap() = Some((base64_image.to_string(), mime_type.to_string()));
            match self.reply {
                Reply::Image(data) => Ok(Some(data.to_string())),
                Reply::NoImage => Ok(None),
                Reply::Fail => Err(AvatarError::RemoteFailure),
            }
        }
    }

    struct MockSamples {
        bytes: Option<Vec<u8>>,
    }

    #[async_trait]
    impl SampleSource for MockSamples {
        async fn fetch(&self, url: &str) -> Result<SourceImage, AvatarError> {
            match &self.bytes {
                Some(bytes) => Ok(crate::core::sample::sample_image(
                    url,
                    bytes.clone(),
                    Some("image/jpeg".into()),
                )),
                None => Err(AvatarError::SampleFetch),
            }
        }
    }

    /// A future that never completes, to exercise abandonment
    struct StuckGenerator;

    #[async_trait]
    impl ImageGenerator for StuckGenerator {
        async fn generate(&self, _: &str, _: &str) -> Result<Option<String>, AvatarError> {
            std::future::pending().await
        }
    }

    fn controller(
        generator: Arc<dyn ImageGenerator>,
        sample: Option<Vec<u8>>,
    ) -> SessionController {
        SessionController::new(generator, Arc::new(MockSamples { bytes: sample }))
    }

    fn record_statuses(controller: &mut SessionController) -> Arc<Mutex<Vec<SessionStatus>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        controller.subscribe(move |state| sink.lock().unwrap().push(state.status()));
        seen
    }

    fn png_source(len: usize) -> SourceImage {
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.resize(len, 0);
        SourceImage::new("face.png", bytes, "image/png", "file:///face.png")
    }

    #[test]
    fn test_select_image_resets_outcome() {
        let mut ctl = controller(MockGenerator::new(Reply::NoImage), None);
        ctl.state.error = Some("old".into());
        ctl.state.result = Some(GenerationResult::from_base64("old"));

        let source = png_source(64);
        ctl.select_image(source.clone());

        let state = ctl.state();
        assert!(!state.is_loading());
        assert!(state.result().is_none());
        assert!(state.error().is_none());
        assert_eq!(state.source_image(), Some(&source));
        assert_eq!(state.preview(), Some("file:///face.png"));
        assert_eq!(state.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_clear_image() {
        let mut ctl = controller(MockGenerator::new(Reply::NoImage), None);
        ctl.select_image(png_source(16));
        ctl.clear_image();
        assert!(ctl.state().source_image().is_none());
        assert!(ctl.state().preview().is_none());
    }

    #[tokio::test]
    async fn test_generate_without_source_never_calls_model() {
        let generator = MockGenerator::new(Reply::Image("x"));
        let mut ctl = controller(generator.clone(), None);
        let statuses = record_statuses(&mut ctl);

        ctl.generate().await;

        assert_eq!(generator.calls(), 0);
        assert_eq!(ctl.state().error(), Some("Please upload an image first."));
        assert!(!ctl.state().is_loading());
        assert_eq!(*statuses.lock().unwrap(), vec![SessionStatus::Failed]);
    }

    #[tokio::test]
    async fn test_generate_success_wraps_payload_as_data_uri() {
        let generator = MockGenerator::new(Reply::Image("iVBORw0KG"));
        let mut ctl = controller(generator.clone(), None);
        ctl.select_image(png_source(10 * 1024));
        let statuses = record_statuses(&mut ctl);

        ctl.generate().await;

        let state = ctl.state();
        assert_eq!(state.status(), SessionStatus::Success);
        assert_eq!(
            state.result().unwrap().data_uri,
            "data:image/png;base64,iVBORw0KG"
        );
        assert_eq!(
            *statuses.lock().unwrap(),
            vec![SessionStatus::Loading, SessionStatus::Success]
        );

        let (sent, mime) = generator.seen.lock().unwrap().clone().unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(encoder::decode(&sent).unwrap().len(), 10 * 1024);
    }

    #[tokio::test]
    async fn test_generate_without_image_in_reply_is_distinct_failure() {
        let mut ctl = controller(MockGenerator::new(Reply::NoImage), None);
        ctl.select_image(png_source(32));

        ctl.generate().await;

        let state = ctl.state();
        assert!(!state.is_loading());
        assert!(state.result().is_none());
        assert_eq!(
            state.error(),
            Some("The model did not return an image. Please try a different photo.")
        );
    }

    #[tokio::test]
    async fn test_generate_transport_failure_clears_loading() {
        let mut ctl = controller(MockGenerator::new(Reply::Fail), None);
        ctl.select_image(png_source(32));

        ctl.generate().await;

        let state = ctl.state();
        assert!(!state.is_loading());
        assert_eq!(state.error(), Some("Failed to communicate with the AI model."));
        assert_eq!(state.status(), SessionStatus::Failed);
    }

    #[tokio::test]
    async fn test_new_generation_clears_previous_result() {
        let mut ctl = controller(MockGenerator::new(Reply::NoImage), None);
        ctl.select_image(png_source(32));
        ctl.state.result = Some(GenerationResult::from_base64("stale"));

        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&snapshots);
        ctl.subscribe(move |state| sink.lock().unwrap().push(state.clone()));

        ctl.generate().await;

        let snapshots = snapshots.lock().unwrap();
        let loading = &snapshots[0];
        assert!(loading.is_loading());
        assert!(loading.result().is_none());
        assert!(loading.error().is_none());
    }

    #[tokio::test]
    async fn test_overlapping_generate_is_rejected() {
        let generator = MockGenerator::new(Reply::Image("x"));
        let mut ctl = controller(generator.clone(), None);
        ctl.select_image(png_source(32));
        ctl.state.is_loading = true;

        ctl.generate().await;
        ctl.select_sample("https://x/sample.jpg").await;

        assert_eq!(generator.calls(), 0);
        assert!(ctl.state().is_loading());
        assert!(ctl.state().source_image().is_some());
    }

    #[tokio::test]
    async fn test_abandoned_generation_does_not_stay_loading() {
        let mut ctl = controller(Arc::new(StuckGenerator), None);
        ctl.select_image(png_source(32));

        let timeout = std::time::Duration::from_millis(20);
        let timed_out = tokio::time::timeout(timeout, ctl.generate()).await;

        assert!(timed_out.is_err());
        assert!(!ctl.state().is_loading());
    }

    #[tokio::test]
    async fn test_select_sample_success() {
        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3];
        let mut ctl = controller(MockGenerator::new(Reply::NoImage), Some(jpeg.clone()));
        let statuses = record_statuses(&mut ctl);

        ctl.select_sample("https://x/sample.jpg").await;

        let state = ctl.state();
        let source = state.source_image().unwrap();
        assert_eq!(source.bytes, jpeg);
        assert_eq!(source.mime_type, "image/jpeg");
        assert_eq!(state.preview(), Some("https://x/sample.jpg"));
        assert_eq!(
            *statuses.lock().unwrap(),
            vec![SessionStatus::Loading, SessionStatus::Idle]
        );
    }

    #[tokio::test]
    async fn test_select_sample_failure() {
        let mut ctl = controller(MockGenerator::new(Reply::NoImage), None);
        ctl.select_image(png_source(32));

        ctl.select_sample("https://x/missing.jpg").await;

        let state = ctl.state();
        assert!(!state.is_loading());
        assert!(state.source_image().is_none());
        assert!(state.preview().is_none());
        assert_eq!(state.error(), Some("Failed to load sample image. Please try again."));
    }

    #[tokio::test]
    async fn test_select_file_reads_and_encodes_photo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.bin");
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[7u8; 32]);
        std::fs::write(&path, &bytes).unwrap();

        let mut ctl = controller(MockGenerator::new(Reply::NoImage), None);
        ctl.select_file(&path).await.unwrap();

        let encoded = ctl.state().source_image().unwrap().encode();
        assert_eq!(encoded.mime_type, "image/png");
        assert_eq!(encoder::decode(&encoded.base64).unwrap(), bytes);
    }

    #[tokio::test]
    async fn test_select_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(MockGenerator::new(Reply::NoImage), None);
        let result = ctl.select_file(&dir.path().join("missing.png")).await;
        assert!(matches!(result, Err(AvatarError::Io(_))));
        assert_eq!(ctl.state(), &SessionState::default());
    }

    #[tokio::test]
    async fn test_select_file_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let mut ctl = controller(MockGenerator::new(Reply::NoImage), None);
        let result = ctl.select_file(&path).await;

        assert!(matches!(result, Err(AvatarError::InvalidImage)));
        assert!(ctl.state().source_image().is_none());
    }

    #[tokio::test]
    async fn test_download_writes_decoded_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(MockGenerator::new(Reply::Image("iVBORw0KGgo=")), None);

        assert_eq!(ctl.download(dir.path()).await.unwrap(), None);

        ctl.select_image(png_source(32));
        ctl.generate().await;
        let before = ctl.state().clone();

        let path = ctl.download(dir.path()).await.unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), "cartoon-avatar.png");
        assert_eq!(
            std::fs::read(&path).unwrap(),
            vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]
        );
        assert_eq!(ctl.state(), &before);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut ctl = controller(MockGenerator::new(Reply::NoImage), None);
        let count = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&count);
        let id = ctl.subscribe(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        ctl.select_image(png_source(8));
        assert!(ctl.unsubscribe(id));
        ctl.select_image(png_source(8));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!ctl.unsubscribe(id));
    }
}
