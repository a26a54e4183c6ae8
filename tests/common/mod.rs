//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bgcutout::{
    BackgroundRemover, ImageRepresentation, MemoryStore, RemovalError, StoreSnapshot,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::sync::{Arc, Mutex};

/// Encode a small gradient image in the given format
pub fn create_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut image = RgbImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let intensity = ((x + y) % 100) as u8;
        *pixel = image::Rgb([intensity, 128, 255 - intensity]);
    }

    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut std::io::Cursor::new(&mut buffer), format)
        .expect("encoding a test image should succeed");
    buffer
}

/// A JPEG-looking buffer of exactly `len` bytes
pub fn jpeg_of_len(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    let magic = [0xFF, 0xD8, 0xFF, 0xE0];
    let n = magic.len().min(len);
    data[..n].copy_from_slice(&magic[..n]);
    data
}

/// Wraps a remover and records what the store looked like when it was called
pub struct RecordingRemover {
    inner: Arc<dyn BackgroundRemover>,
    store: Arc<MemoryStore>,
    seen: Mutex<Vec<StoreSnapshot>>,
}

impl RecordingRemover {
    pub fn new(inner: Arc<dyn BackgroundRemover>, store: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            store,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<StoreSnapshot> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackgroundRemover for RecordingRemover {
    async fn remove_background(
        &self,
        image: &ImageRepresentation,
    ) -> Result<ImageRepresentation, RemovalError> {
        self.seen.lock().unwrap().push(self.store.snapshot());
        self.inner.remove_background(image).await
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
