//! Shared test utilities for the archiver crate.

use crate::output::{OutputSink, Verbosity};
use camino::Utf8PathBuf;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// In-memory writer whose clones share one buffer, so tests can inspect
/// what an [`OutputSink`] wrote after handing it a boxed clone.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl SharedBuffer {
    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A sink writing into a fresh [`SharedBuffer`].
pub fn buffered_sink(verbosity: Verbosity) -> (OutputSink, SharedBuffer) {
    let buffer = SharedBuffer::default();
    (OutputSink::new(Box::new(buffer.clone()), verbosity), buffer)
}

/// Temporary directory and its UTF-8 path.
pub fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
    (temp, path)
}
