//! Flip-dot display driver
//!
//! This module provides functionality for:
//! - Describing the panel geometry (sub-panel tiling, width, mirroring)
//! - Tracking whether the latest frame differs from what the panel shows
//! - Encoding frames in the controller's wire format and pushing them
//!   through a [`Transport`]
//!
//! Only changed frames are sent. The "last flushed" snapshot advances on a
//! successful write and nowhere else, so a failed write leaves the display
//! dirty and the next flush retries with whatever is current by then.

pub mod bitmap;
pub mod geometry;
pub mod protocol;

pub use bitmap::Bitmap;
pub use geometry::{Layout, PanelGeometry, PanelWidth};

use image::RgbaImage;
use thiserror::Error;

use crate::transport::{Transport, TransportConfig, TransportError};

/// Display failures
#[derive(Debug, Error)]
pub enum DisplayError {
    /// A frame of the wrong size was handed in; a programming error
    #[error("frame is {actual_width}x{actual_height}, display is {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// The transport rejected the frame; the display stays dirty
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A flip-dot board behind a transport
pub struct Display {
    geometry: PanelGeometry,
    transport: Box<dyn Transport>,
    current: Option<Bitmap>,
    flushed: Option<Bitmap>,
    dirty: bool,
}

impl Display {
    /// Create a display over an already open transport
    pub fn new(geometry: PanelGeometry, transport: Box<dyn Transport>) -> Self {
        Self {
            geometry,
            transport,
            current: None,
            flushed: None,
            dirty: false,
        }
    }

    /// Open the configured transport and create a display over it
    pub fn open(geometry: PanelGeometry, config: &TransportConfig) -> Result<Self, TransportError> {
        let transport = config.open()?;
        Ok(Self::new(geometry, transport))
    }

    pub fn width(&self) -> u32 {
        self.geometry.width()
    }

    pub fn height(&self) -> u32 {
        self.geometry.height()
    }

    pub fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }

    /// Description of the underlying link
    pub fn describe_transport(&self) -> String {
        self.transport.describe()
    }

    /// Replace the current frame
    ///
    /// `image` must already be binarized and exactly `width × height`. The
    /// display becomes dirty if nothing was flushed yet or any dot differs
    /// from the last flushed frame. No I/O happens here.
    pub fn set_image_data(&mut self, image: &RgbaImage) -> Result<(), DisplayError> {
        let (actual_width, actual_height) = image.dimensions();
        if actual_width != self.width() || actual_height != self.height() {
            return Err(DisplayError::SizeMismatch {
                width: self.width(),
                height: self.height(),
                actual_width,
                actual_height,
            });
        }

        let bitmap = Bitmap::from_rgba(image);
        self.dirty = self.flushed.as_ref() != Some(&bitmap);
        self.current = Some(bitmap);
        Ok(())
    }

    /// Whether the current frame still has to be sent
    ///
    /// Before the first [`set_image_data`](Self::set_image_data) there is
    /// nothing to send and this returns `false`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Send the current frame if it is dirty
    ///
    /// A clean display is a no-op. On a transport error the snapshot is left
    /// alone and the display stays dirty; calling `flush` again retries.
    pub fn flush(&mut self) -> Result<(), DisplayError> {
        if !self.dirty {
            return Ok(());
        }
        let Some(current) = self.current.as_ref() else {
            return Ok(());
        };

        let bytes = protocol::encode(current, &self.geometry);
        self.transport.write(&bytes)?;

        log::debug!(
            "Flushed {} bytes ({} dots on) to {}",
            bytes.len(),
            current.count_on(),
            self.transport.describe()
        );

        self.flushed = Some(current.clone());
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    /// Records every write; can be told to fail
    #[derive(Clone, Default)]
    struct FakeTransport {
        writes: Arc<Mutex<Vec<Vec<u8>>>>,
        fail: Arc<AtomicBool>,
    }

    impl FakeTransport {
        fn write_count(&self) -> usize {
            self.writes.lock().unwrap().len()
        }
    }

    impl Transport for FakeTransport {
        fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(TransportError::Write {
                    target: "fake".to_string(),
                    source: io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"),
                });
            }
            self.writes.lock().unwrap().push(bytes.to_vec());
            Ok(())
        }

        fn describe(&self) -> String {
            "fake".to_string()
        }
    }

    /// A 28×14 board. Sub-panels are 7 dots tall (one data byte per
    /// column), so 14 rows take two sub-panels stacked at addresses 1 and 2.
    fn geometry() -> PanelGeometry {
        PanelGeometry::new(
            Layout::new(vec![vec![1], vec![2]]).unwrap(),
            PanelWidth::W28,
            false,
        )
    }

    fn frame(value: u8) -> RgbaImage {
        RgbaImage::from_pixel(28, 14, Rgba([value, value, value, 255]))
    }

    fn display() -> (Display, FakeTransport) {
        let transport = FakeTransport::default();
        (Display::new(geometry(), Box::new(transport.clone())), transport)
    }

    #[test]
    fn test_dimensions_follow_geometry() {
        let (display, _) = display();
        assert_eq!(display.width(), 28);
        assert_eq!(display.height(), 14);
        assert!(!display.is_dirty());
    }

    #[test]
    fn test_identical_frames_are_dirty_only_before_first_flush() {
        let (mut display, transport) = display();

        display.set_image_data(&frame(255)).unwrap();
        assert!(display.is_dirty());
        display.flush().unwrap();
        assert!(!display.is_dirty());

        for _ in 0..3 {
            display.set_image_data(&frame(255)).unwrap();
            assert!(!display.is_dirty());
            display.flush().unwrap();
        }
        assert_eq!(transport.write_count(), 1);

        display.set_image_data(&frame(0)).unwrap();
        assert!(display.is_dirty());
    }

    #[test]
    fn test_unflushed_frames_stay_dirty() {
        let (mut display, transport) = display();

        display.set_image_data(&frame(0)).unwrap();
        assert!(display.is_dirty());
        display.set_image_data(&frame(0)).unwrap();
        assert!(display.is_dirty());
        assert_eq!(transport.write_count(), 0);
    }

    #[test]
    fn test_returning_to_flushed_frame_is_clean() {
        let (mut display, _) = display();

        display.set_image_data(&frame(0)).unwrap();
        display.flush().unwrap();
        display.set_image_data(&frame(255)).unwrap();
        assert!(display.is_dirty());
        display.set_image_data(&frame(0)).unwrap();
        assert!(!display.is_dirty());
    }

    #[test]
    fn test_failed_write_keeps_snapshot_and_dirty() {
        let (mut display, transport) = display();

        display.set_image_data(&frame(0)).unwrap();
        display.flush().unwrap();
        let before = display.flushed.clone();

        transport.fail.store(true, Ordering::SeqCst);
        display.set_image_data(&frame(255)).unwrap();
        assert!(matches!(display.flush(), Err(DisplayError::Transport(_))));
        assert!(display.is_dirty());
        assert_eq!(display.flushed.clone(), before);

        transport.fail.store(false, Ordering::SeqCst);
        display.flush().unwrap();
        assert!(!display.is_dirty());
        assert_eq!(display.flushed.as_ref().map(Bitmap::count_on), Some(28 * 14));
        assert_eq!(transport.write_count(), 2);

        display.set_image_data(&frame(255)).unwrap();
        assert!(!display.is_dirty());
    }

    #[test]
    fn test_retry_sends_latest_frame() {
        let (mut display, transport) = display();
        transport.fail.store(true, Ordering::SeqCst);

        display.set_image_data(&frame(255)).unwrap();
        assert!(display.flush().is_err());

        transport.fail.store(false, Ordering::SeqCst);
        display.set_image_data(&frame(0)).unwrap();
        assert!(display.is_dirty());
        display.flush().unwrap();

        let writes = transport.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert!(writes[0][3..31].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_flush_when_clean_does_not_write() {
        let (mut display, transport) = display();
        display.flush().unwrap();
        assert_eq!(transport.write_count(), 0);
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let (mut display, _) = display();
        let result = display.set_image_data(&RgbaImage::new(28, 7));

        match result {
            Err(DisplayError::SizeMismatch {
                width,
                height,
                actual_width,
                actual_height,
            }) => {
                assert_eq!((width, height), (28, 14));
                assert_eq!((actual_width, actual_height), (28, 7));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!display.is_dirty());
    }

    #[test]
    fn test_network_28x14_as_two_stacked_panels_sends_one_frame() {
        use std::io::Read;
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = TransportConfig::Network {
            host: "127.0.0.1".to_string(),
            port,
        };

        let mut display = Display::open(geometry(), &config).unwrap();
        let (mut peer, _) = listener.accept().unwrap();

        display.set_image_data(&frame(255)).unwrap();
        assert!(display.is_dirty());
        display.flush().unwrap();

        display.set_image_data(&frame(255)).unwrap();
        assert!(!display.is_dirty());
        display.flush().unwrap();
        drop(display);

        let mut received = Vec::new();
        peer.read_to_end(&mut received).unwrap();
        assert_eq!(received.len(), protocol::frame_len(&geometry()));
        assert_eq!(&received[..3], &[0x80, 0x84, 0x01]);
        assert!(received[3..31].iter().all(|&b| b == 0x7F));
        assert_eq!(&received[received.len() - 3..], &[0x80, 0x82, 0x8F]);
    }
}
