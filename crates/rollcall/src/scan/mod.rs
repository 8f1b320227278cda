//! QR check-in scan loop.
//!
//! The loop owns a [`FrameSource`] for its lifetime, hands each frame to a
//! [`QrDecoder`] and marks the first student whose code decodes cleanly.
//! It is driven on a single task; the only await points are acquiring the
//! device, waiting for a frame and the post-success delay.

mod source;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{AttendanceStatus, QrPayload};
use crate::registry::{MarkOutcome, Registry};

pub use source::{LineFrameSource, TextDecoder};

/// One captured image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Raw pixel data (for text sources, the payload bytes).
    pub data: Vec<u8>,
}

impl Frame {
    /// Wrap text as a single-row frame, for sources that already decode.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::from_bytes(text.as_bytes().to_vec())
    }

    /// Wrap one line of raw bytes as a single-row frame.
    #[must_use]
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            width: u32::try_from(data.len()).unwrap_or(u32::MAX),
            height: 1,
            data,
        }
    }
}

/// A camera or anything else that yields frames.
#[async_trait::async_trait]
pub trait FrameSource: Send {
    /// Acquire the device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceAccess`] if the device is unavailable or access
    /// was denied.
    async fn acquire(&mut self) -> Result<()>;

    /// Wait for the next frame. `None` means the source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceAccess`] if the device fails mid-stream.
    async fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Release the device. Must be safe to call more than once.
    fn release(&mut self);
}

/// Finds a QR symbol in a frame.
pub trait QrDecoder: Send {
    /// The symbol's text, or `None` if the frame holds no readable symbol.
    fn decode(&mut self, frame: &Frame) -> Option<String>;
}

/// Where the loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanState {
    /// Not started.
    Idle,
    /// Waiting for the next frame.
    AwaitingFrame,
    /// Decoding a frame.
    Decoding,
    /// A student was marked; the loop is finishing.
    Success,
    /// No symbol in the last frame.
    Retry,
    /// The last symbol was not a check-in code.
    Invalid,
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingFrame => write!(f, "awaiting frame"),
            Self::Decoding => write!(f, "decoding"),
            Self::Success => write!(f, "success"),
            Self::Retry => write!(f, "retry"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// A message for whoever is watching the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    /// No code in view.
    PointCamera,
    /// A code was read but it is not a check-in code.
    InvalidCode {
        /// Why the payload was rejected.
        message: String,
    },
    /// A student was marked present.
    Marked {
        /// The marked student's ID.
        student_id: String,
        /// The marked student's name.
        name: String,
    },
    /// The frame source could not be used.
    DeviceError {
        /// What went wrong.
        message: String,
    },
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PointCamera => write!(f, "Point camera at QR code"),
            Self::InvalidCode { .. } => write!(f, "Invalid QR code"),
            Self::Marked { student_id, name } => {
                write!(f, "Attendance marked for {name} ({student_id})")
            }
            Self::DeviceError { message } => write!(f, "Unable to access camera: {message}"),
        }
    }
}

/// Receives scan progress.
pub trait ScanObserver {
    /// A status message to show.
    fn status(&mut self, status: &ScanStatus);

    /// The loop moved to `state`.
    fn state_changed(&mut self, state: ScanState) {
        let _ = state;
    }
}

/// How a scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A student was marked.
    Marked(MarkOutcome),
    /// The handle was stopped.
    Cancelled,
    /// The source ran out of frames.
    SourceClosed,
    /// The device could not be used; the loop did not run to completion.
    DeviceUnavailable(String),
}

/// A cloneable stop signal for a running scan.
#[derive(Debug, Clone, Default)]
pub struct ScanHandle {
    stop_signal: Arc<AtomicBool>,
}

impl ScanHandle {
    /// Create a new handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop before its next tick.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }

    /// Clear the stop signal so the handle can drive another scan.
    pub fn reset(&self) {
        self.stop_signal.store(false, Ordering::SeqCst);
    }
}

/// The scan state machine.
#[derive(Debug)]
pub struct ScanLoop {
    success_delay: Duration,
    state: ScanState,
}

impl ScanLoop {
    /// Create a loop that pauses for `success_delay` after marking.
    #[must_use]
    pub fn new(success_delay: Duration) -> Self {
        Self {
            success_delay,
            state: ScanState::Idle,
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Run until a student is marked, the handle is stopped, or the source
    /// closes. The source is released on every exit path.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the mark cannot be persisted. Device and
    /// decode failures are reported through the outcome and the observer.
    pub async fn run<S, D, O>(
        &mut self,
        registry: &mut Registry,
        source: &mut S,
        decoder: &mut D,
        handle: &ScanHandle,
        observer: &mut O,
    ) -> Result<ScanOutcome>
    where
        S: FrameSource + ?Sized,
        D: QrDecoder + ?Sized,
        O: ScanObserver + ?Sized,
    {
        self.set_state(ScanState::Idle, observer);

        if let Err(e) = source.acquire().await {
            let message = device_message(e);
            warn!("Frame source unavailable: {}", message);
            observer.status(&ScanStatus::DeviceError {
                message: message.clone(),
            });
            source.release();
            return Ok(ScanOutcome::DeviceUnavailable(message));
        }
        info!("Scan started");

        let result = self.poll(registry, source, decoder, handle, observer).await;
        source.release();
        debug!("Frame source released");
        result
    }

    async fn poll<S, D, O>(
        &mut self,
        registry: &mut Registry,
        source: &mut S,
        decoder: &mut D,
        handle: &ScanHandle,
        observer: &mut O,
    ) -> Result<ScanOutcome>
    where
        S: FrameSource + ?Sized,
        D: QrDecoder + ?Sized,
        O: ScanObserver + ?Sized,
    {
        loop {
            if handle.should_stop() {
                info!("Scan cancelled");
                return Ok(ScanOutcome::Cancelled);
            }

            self.set_state(ScanState::AwaitingFrame, observer);
            let frame = match source.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("Frame source closed");
                    return Ok(ScanOutcome::SourceClosed);
                }
                Err(e) => {
                    let message = device_message(e);
                    warn!("Frame source failed: {}", message);
                    observer.status(&ScanStatus::DeviceError {
                        message: message.clone(),
                    });
                    return Ok(ScanOutcome::DeviceUnavailable(message));
                }
            };

            self.set_state(ScanState::Decoding, observer);
            let Some(text) = decoder.decode(&frame) else {
                self.set_state(ScanState::Retry, observer);
                observer.status(&ScanStatus::PointCamera);
                tokio::task::yield_now().await;
                continue;
            };

            let payload = match QrPayload::parse(&text) {
                Ok(payload) => payload,
                Err(e) => {
                    debug!("Rejected scanned payload: {}", e);
                    self.set_state(ScanState::Invalid, observer);
                    observer.status(&ScanStatus::InvalidCode {
                        message: e.to_string(),
                    });
                    tokio::task::yield_now().await;
                    continue;
                }
            };

            let outcome = registry.mark_attendance(&payload.student_id, AttendanceStatus::Present)?;
            let name = registry
                .find_student(&payload.student_id)
                .map_or(payload.name, |s| s.name.clone());

            self.set_state(ScanState::Success, observer);
            info!("Scan marked {} present", payload.student_id);
            observer.status(&ScanStatus::Marked {
                student_id: payload.student_id,
                name,
            });

            tokio::time::sleep(self.success_delay).await;
            return Ok(ScanOutcome::Marked(outcome));
        }
    }

    fn set_state<O: ScanObserver + ?Sized>(&mut self, state: ScanState, observer: &mut O) {
        self.state = state;
        observer.state_changed(state);
    }
}

fn device_message(err: Error) -> String {
    match err {
        Error::DeviceAccess { message } => message,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use std::collections::VecDeque;

    /// Plays back a fixed list of frames.
    #[derive(Default)]
    struct ScriptedSource {
        frames: VecDeque<Frame>,
        deny: bool,
        acquired: bool,
        releases: usize,
        stop_after: Option<(usize, ScanHandle)>,
        served: usize,
    }

    impl ScriptedSource {
        fn texts(texts: &[&str]) -> Self {
            Self {
                frames: texts.iter().map(|t| Frame::from_text(t)).collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait::async_trait]
    impl FrameSource for ScriptedSource {
        async fn acquire(&mut self) -> Result<()> {
            if self.deny {
                return Err(Error::device_access("permission denied"));
            }
            self.acquired = true;
            Ok(())
        }

        async fn next_frame(&mut self) -> Result<Option<Frame>> {
            self.served += 1;
            if let Some((n, handle)) = &self.stop_after {
                if self.served >= *n {
                    handle.stop();
                }
            }
            Ok(self.frames.pop_front())
        }

        fn release(&mut self) {
            self.acquired = false;
            self.releases += 1;
        }
    }

    #[derive(Default)]
    struct Recorder {
        statuses: Vec<ScanStatus>,
        states: Vec<ScanState>,
    }

    impl ScanObserver for Recorder {
        fn status(&mut self, status: &ScanStatus) {
            self.statuses.push(status.clone());
        }

        fn state_changed(&mut self, state: ScanState) {
            self.states.push(state);
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::load(Storage::open_in_memory().unwrap());
        registry.add_student("S1", "Ann", None, "10A").unwrap();
        registry
    }

    async fn run(source: &mut ScriptedSource, registry: &mut Registry) -> (ScanOutcome, Recorder) {
        let mut observer = Recorder::default();
        let handle = ScanHandle::new();
        let outcome = ScanLoop::new(Duration::ZERO)
            .run(registry, source, &mut TextDecoder, &handle, &mut observer)
            .await
            .unwrap();
        (outcome, observer)
    }

    #[tokio::test]
    async fn test_valid_payload_marks_and_terminates() {
        let mut registry = registry();
        let mut source = ScriptedSource::texts(&[
            "",
            r#"{"studentId":"S1","name":"Ann","class":"10A"}"#,
            r#"{"studentId":"S1"}"#,
        ]);

        let (outcome, observer) = run(&mut source, &mut registry).await;

        let ScanOutcome::Marked(mark) = outcome else {
            panic!("expected a mark");
        };
        assert_eq!(mark.record().student_id, "S1");
        assert_eq!(registry.attendance().len(), 1);
        assert_eq!(source.frames.len(), 1);
        assert_eq!(source.releases, 1);
        assert!(!source.acquired);
        assert_eq!(
            observer.statuses,
            vec![
                ScanStatus::PointCamera,
                ScanStatus::Marked {
                    student_id: "S1".to_string(),
                    name: "Ann".to_string(),
                },
            ]
        );
        assert_eq!(observer.states.last(), Some(&ScanState::Success));
    }

    #[tokio::test]
    async fn test_invalid_payload_keeps_polling() {
        let mut registry = registry();
        let mut source = ScriptedSource::texts(&["not json", r#"{"name":"Ann"}"#]);

        let (outcome, observer) = run(&mut source, &mut registry).await;

        assert_eq!(outcome, ScanOutcome::SourceClosed);
        assert!(registry.attendance().is_empty());
        assert_eq!(observer.statuses.len(), 2);
        assert!(observer
            .statuses
            .iter()
            .all(|s| matches!(s, ScanStatus::InvalidCode { .. })));
        assert!(observer.states.contains(&ScanState::Invalid));
        assert_eq!(source.releases, 1);
    }

    #[tokio::test]
    async fn test_denied_device_is_inert() {
        let mut registry = registry();
        let mut source = ScriptedSource {
            deny: true,
            ..ScriptedSource::texts(&[r#"{"studentId":"S1"}"#])
        };

        let (outcome, observer) = run(&mut source, &mut registry).await;

        assert_eq!(
            outcome,
            ScanOutcome::DeviceUnavailable("permission denied".to_string())
        );
        assert_eq!(source.served, 0);
        assert!(registry.attendance().is_empty());
        assert!(matches!(
            observer.statuses[0],
            ScanStatus::DeviceError { .. }
        ));
    }

    #[tokio::test]
    async fn test_stop_prevents_next_tick() {
        let mut registry = registry();
        let handle = ScanHandle::new();
        let mut source = ScriptedSource {
            stop_after: Some((1, handle.clone())),
            ..ScriptedSource::texts(&["", r#"{"studentId":"S1"}"#])
        };
        let mut observer = Recorder::default();

        let outcome = ScanLoop::new(Duration::ZERO)
            .run(
                &mut registry,
                &mut source,
                &mut TextDecoder,
                &handle,
                &mut observer,
            )
            .await
            .unwrap();

        assert_eq!(outcome, ScanOutcome::Cancelled);
        assert_eq!(source.served, 1);
        assert!(registry.attendance().is_empty());
        assert_eq!(source.releases, 1);
    }

    #[tokio::test]
    async fn test_frame_in_flight_completes_after_stop() {
        let mut registry = registry();
        let handle = ScanHandle::new();
        let mut source = ScriptedSource {
            stop_after: Some((1, handle.clone())),
            ..ScriptedSource::texts(&[r#"{"studentId":"S1"}"#])
        };
        let mut observer = Recorder::default();

        let outcome = ScanLoop::new(Duration::ZERO)
            .run(
                &mut registry,
                &mut source,
                &mut TextDecoder,
                &handle,
                &mut observer,
            )
            .await
            .unwrap();

        assert!(matches!(outcome, ScanOutcome::Marked(_)));
        assert_eq!(registry.attendance().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_waits_out_delay_before_returning() {
        let mut registry = registry();
        let mut source = ScriptedSource::texts(&[r#"{"studentId":"S1"}"#]);
        let mut observer = Recorder::default();
        let handle = ScanHandle::new();
        let mut scan = ScanLoop::new(Duration::from_secs(2));
        let started = tokio::time::Instant::now();

        {
            let mut decoder = TextDecoder;
            let run = scan.run(
                &mut registry,
                &mut source,
                &mut decoder,
                &handle,
                &mut observer,
            );
            tokio::pin!(run);

            let early = tokio::time::timeout(Duration::from_millis(1999), &mut run).await;
            assert!(early.is_err());

            let outcome = run.await.unwrap();
            assert!(matches!(outcome, ScanOutcome::Marked(_)));
        }

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(scan.state(), ScanState::Success);
        assert_eq!(source.releases, 1);
        assert!(!source.acquired);
    }

    #[tokio::test]
    async fn test_unknown_student_uses_payload_name() {
        let mut registry = registry();
        let mut source =
            ScriptedSource::texts(&[r#"{"studentId":"S9","name":"Zed","class":"9C"}"#]);

        let (_, observer) = run(&mut source, &mut registry).await;

        assert_eq!(
            observer.statuses,
            vec![ScanStatus::Marked {
                student_id: "S9".to_string(),
                name: "Zed".to_string(),
            }]
        );
    }

    #[test]
    fn test_handle_shares_signal() {
        let handle = ScanHandle::new();
        let clone = handle.clone();
        assert!(!clone.should_stop());

        handle.stop();
        assert!(clone.should_stop());

        clone.reset();
        assert!(!handle.should_stop());
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(ScanStatus::PointCamera.to_string(), "Point camera at QR code");
        let marked = ScanStatus::Marked {
            student_id: "S1".to_string(),
            name: "Ann".to_string(),
        };
        assert_eq!(marked.to_string(), "Attendance marked for Ann (S1)");
        assert_eq!(ScanState::AwaitingFrame.to_string(), "awaiting frame");
    }
}
