//! Shared helpers for integration tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Shared buffer that can stand in for stderr and be read afterwards.
#[derive(Clone, Default)]
pub struct SpyBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SpyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let data = self.inner.lock().expect("buffer lock");
        String::from_utf8_lossy(&data).into_owned()
    }
}

impl Write for SpyBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut data = self.inner.lock().expect("buffer lock");
        data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
