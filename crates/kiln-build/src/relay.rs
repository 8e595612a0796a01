//! Output relaying for child processes
//!
//! Tool banners should start on a fresh line after our own progress text, so
//! relayed output gets exactly one line break before its first byte.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// One-shot flag shared by every writer relaying the same invocation.
///
/// The line break is written while the flag is held, so another writer's
/// first bytes can't overtake it.
#[derive(Debug, Clone, Default)]
pub struct Latch(Arc<Mutex<bool>>);

impl Latch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `first` if no writer has tripped the latch yet
    fn trip_with(&self, first: impl FnOnce() -> io::Result<()>) -> io::Result<()> {
        let mut tripped = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if !*tripped {
            first()?;
            *tripped = true;
        }
        Ok(())
    }

    pub fn is_tripped(&self) -> bool {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Writer decorator that inserts a line break before the first byte written
#[derive(Debug)]
pub struct LeadingNewlineWriter<W: Write> {
    inner: W,
    latch: Latch,
    started: bool,
}

impl<W: Write> LeadingNewlineWriter<W> {
    /// Decorate a writer with its own latch
    pub fn new(inner: W) -> Self {
        Self::sharing(inner, Latch::new())
    }

    /// Decorate a writer with a latch shared with other writers
    pub fn sharing(inner: W, latch: Latch) -> Self {
        Self {
            inner,
            latch,
            started: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for LeadingNewlineWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !buf.is_empty() && !self.started {
            let inner = &mut self.inner;
            self.latch.trip_with(|| {
                inner.write_all(b"\n")?;
                inner.flush()
            })?;
            self.started = true;
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
