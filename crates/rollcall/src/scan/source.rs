//! Text-based frame source for scanners that decode on the device.
//!
//! Keyboard-wedge QR scanners type the decoded payload followed by a newline,
//! so each input line is treated as one frame already holding its symbol.
//! Lines are passed on as raw bytes; a garbled line is a bad code, not a
//! device failure.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Split, Stdin};

use crate::error::{Error, Result};

use super::{Frame, FrameSource, QrDecoder};

/// Yields one frame per line of input.
#[derive(Debug)]
pub struct LineFrameSource<R> {
    lines: Split<R>,
    acquired: bool,
}

impl<R: AsyncBufRead + Unpin + Send> LineFrameSource<R> {
    /// Read frames from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.split(b'\n'),
            acquired: false,
        }
    }
}

impl LineFrameSource<BufReader<Stdin>> {
    /// Read frames from standard input.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait::async_trait]
impl<R: AsyncBufRead + Unpin + Send> FrameSource for LineFrameSource<R> {
    async fn acquire(&mut self) -> Result<()> {
        self.acquired = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        if !self.acquired {
            return Err(Error::device_access("frame source not acquired"));
        }
        let line = self
            .lines
            .next_segment()
            .await
            .map_err(|e| Error::device_access(format!("read failed: {e}")))?;
        Ok(line.map(|mut bytes| {
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            Frame::from_bytes(bytes)
        }))
    }

    fn release(&mut self) {
        self.acquired = false;
    }
}

/// Treats the frame bytes as the symbol text.
///
/// Invalid UTF-8 is replaced rather than dropped so the payload check can
/// report it as an unreadable code.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDecoder;

impl QrDecoder for TextDecoder {
    fn decode(&mut self, frame: &Frame) -> Option<String> {
        let text = String::from_utf8_lossy(&frame.data);
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::scan::{ScanHandle, ScanLoop, ScanObserver, ScanOutcome, ScanStatus};
    use crate::storage::Storage;
    use std::time::Duration;

    impl ScanObserver for Vec<ScanStatus> {
        fn status(&mut self, status: &ScanStatus) {
            self.push(status.clone());
        }
    }

    #[tokio::test]
    async fn test_lines_become_frames() {
        let mut source = LineFrameSource::new(&b"first\n\nsecond\n"[..]);
        source.acquire().await.unwrap();

        let mut decoder = TextDecoder;
        let mut decoded = Vec::new();
        while let Some(frame) = source.next_frame().await.unwrap() {
            decoded.push(decoder.decode(&frame));
        }
        assert_eq!(
            decoded,
            vec![Some("first".to_string()), None, Some("second".to_string())]
        );
    }

    #[tokio::test]
    async fn test_frames_require_acquire() {
        let mut source = LineFrameSource::new(&b"first\n"[..]);
        let err = source.next_frame().await.unwrap_err();
        assert!(err.is_device_access());

        source.acquire().await.unwrap();
        source.release();
        assert!(source.next_frame().await.is_err());
    }

    #[tokio::test]
    async fn test_non_utf8_line_is_a_frame() {
        let mut source = LineFrameSource::new(&b"\xff\xfe garbage\r\nnext\n"[..]);
        source.acquire().await.unwrap();

        let frame = source.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.data, b"\xff\xfe garbage");
        let text = TextDecoder.decode(&frame).unwrap();
        assert!(text.ends_with("garbage"));

        let frame = source.next_frame().await.unwrap().unwrap();
        assert_eq!(TextDecoder.decode(&frame).as_deref(), Some("next"));
    }

    #[tokio::test]
    async fn test_garbled_line_does_not_end_scan() {
        let mut registry = Registry::load(Storage::open_in_memory().unwrap());
        registry.add_student("S1", "Ann", None, "10A").unwrap();
        let mut source =
            LineFrameSource::new(&b"\xff\xfe garbage\n{\"studentId\":\"S1\"}\n"[..]);
        let mut statuses = Vec::new();

        let outcome = ScanLoop::new(Duration::ZERO)
            .run(
                &mut registry,
                &mut source,
                &mut TextDecoder,
                &ScanHandle::new(),
                &mut statuses,
            )
            .await
            .unwrap();

        assert!(matches!(outcome, ScanOutcome::Marked(_)));
        assert!(matches!(statuses[0], ScanStatus::InvalidCode { .. }));
        assert_eq!(registry.attendance().len(), 1);
    }
}
