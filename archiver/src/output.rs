//! User-facing output with verbosity levels.
//!
//! Diagnostics go through the `log` facade; this module carries the lines a
//! person running a build reads. The sink is passed explicitly to every
//! component that prints, and output suppression is scoped: the previous
//! verbosity comes back when the scope ends, whichever way it ends.

use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::io::Write;

/// Output verbosity, from silent to debug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Verbosity {
    /// Nothing is printed.
    Quiet,
    /// Progress and per-package lines.
    #[default]
    Normal,
    /// Adds backend detail.
    Verbose,
    /// Adds per-file detail.
    VeryVerbose,
    /// Everything.
    Debug,
}

impl Verbosity {
    /// Map `-q` and the number of `-v` flags to a level.
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            2 => Self::VeryVerbose,
            _ => Self::Debug,
        }
    }
}

/// Destination for user-facing lines.
pub struct OutputSink {
    writer: RefCell<Box<dyn Write>>,
    verbosity: Cell<Verbosity>,
}

impl OutputSink {
    /// Wrap `writer` at the given verbosity.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, verbosity: Verbosity) -> Self {
        Self {
            writer: RefCell::new(writer),
            verbosity: Cell::new(verbosity),
        }
    }

    /// A sink writing to standard error.
    #[must_use]
    pub fn stderr(verbosity: Verbosity) -> Self {
        Self::new(Box::new(std::io::stderr()), verbosity)
    }

    /// Current verbosity.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity.get()
    }

    /// Whether a message at `level` would be printed.
    #[must_use]
    pub fn is_enabled(&self, level: Verbosity) -> bool {
        level != Verbosity::Quiet && level <= self.verbosity.get()
    }

    /// Print a line at normal verbosity.
    pub fn writeln(&self, message: impl Display) {
        self.writeln_at(Verbosity::Normal, message);
    }

    /// Print a line if `level` is enabled.
    pub fn writeln_at(&self, level: Verbosity, message: impl Display) {
        if self.is_enabled(level) {
            self.emit(format_args!("{message}\n"));
        }
    }

    /// Print `text` without a trailing newline if `level` is enabled.
    pub fn write_at(&self, level: Verbosity, text: impl Display) {
        if self.is_enabled(level) {
            self.emit(format_args!("{text}"));
        }
    }

    fn emit(&self, args: std::fmt::Arguments<'_>) {
        let mut writer = self.writer.borrow_mut();
        if writer.write_fmt(args).and_then(|()| writer.flush()).is_err() {
            // Best-effort output; ignore write failures.
        }
    }

    /// Drop to [`Verbosity::Quiet`] until the returned guard is dropped.
    #[must_use = "output is restored as soon as the guard is dropped"]
    pub fn suppress(&self) -> SuppressGuard<'_> {
        let previous = self.verbosity.replace(Verbosity::Quiet);
        SuppressGuard {
            sink: self,
            previous,
        }
    }

    /// Run `scope` with ancillary output suppressed when `active` is true.
    ///
    /// The previous verbosity is restored on return, on error results, and on
    /// unwinding.
    pub fn with_suppressed_ancillary_output<T>(&self, active: bool, scope: impl FnOnce() -> T) -> T {
        if !active {
            return scope();
        }
        let _guard = self.suppress();
        scope()
    }
}

/// Restores the sink's verbosity on drop.
pub struct SuppressGuard<'a> {
    sink: &'a OutputSink,
    previous: Verbosity,
}

impl Drop for SuppressGuard<'_> {
    fn drop(&mut self) {
        self.sink.verbosity.set(self.previous);
    }
}
