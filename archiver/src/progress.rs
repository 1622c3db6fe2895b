//! Per-package progress reporting.
//!
//! With progress rendering on and normal verbosity, a single bar is redrawn
//! in place:
//!
//! ```text
//!  3/12 [=======>--------------------]  25% - Installing vendor/name (1.2.3)
//! ```
//!
//! Otherwise each package gets one `Dumping package ...` line.

use crate::output::{OutputSink, Verbosity};
use satis::Package;

const BAR_WIDTH: usize = 28;
const CLEAR_LINE: &str = "\r\x1b[2K";

/// Redrawable progress bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressBar {
    max: usize,
    current: usize,
    package_name: String,
    package_version: String,
    drawn: bool,
}

impl ProgressBar {
    /// Bar for `max` steps.
    #[must_use]
    pub const fn new(max: usize) -> Self {
        Self {
            max,
            current: 0,
            package_name: String::new(),
            package_version: String::new(),
            drawn: false,
        }
    }

    /// Steps completed.
    #[must_use]
    pub const fn current(&self) -> usize {
        self.current
    }

    /// Set the package shown after the bar.
    pub fn set_package(&mut self, name: &str, version: &str) {
        name.clone_into(&mut self.package_name);
        version.clone_into(&mut self.package_version);
    }

    /// Redraw the bar.
    pub fn display(&mut self, output: &OutputSink) {
        let prefix = if self.drawn { CLEAR_LINE } else { "" };
        output.write_at(Verbosity::Normal, format_args!("{prefix}{}", self.render()));
        self.drawn = true;
    }

    /// Complete one step and redraw.
    pub fn advance(&mut self, output: &OutputSink) {
        self.current = self.current.saturating_add(1).min(self.max);
        self.display(output);
    }

    /// Fill the bar and end its line.
    pub fn finish(&mut self, output: &OutputSink) {
        self.current = self.max;
        self.display(output);
        self.end_line(output);
    }

    /// End the bar's line without filling it.
    pub fn end_line(&mut self, output: &OutputSink) {
        if self.drawn {
            output.write_at(Verbosity::Normal, "\n");
            self.drawn = false;
        }
    }

    /// The bar's current text.
    #[must_use]
    pub fn render(&self) -> String {
        let (percent, filled) = if self.max == 0 {
            (100, BAR_WIDTH)
        } else {
            (self.current * 100 / self.max, self.current * BAR_WIDTH / self.max)
        };
        let mut bar = "=".repeat(filled);
        if filled < BAR_WIDTH {
            bar.push('>');
            bar.push_str(&"-".repeat(BAR_WIDTH - filled - 1));
        }
        let digits = self.max.to_string().len();
        format!(
            " {current:>digits$}/{max} [{bar}] {percent:>3}% - Installing {name} ({version})",
            current = self.current,
            max = self.max,
            name = self.package_name,
            version = self.package_version,
        )
    }
}

/// Rich bar or plain lines, chosen once per run.
#[derive(Debug)]
pub enum ProgressReporter {
    /// In-place progress bar.
    Rich(ProgressBar),
    /// One line per package.
    Plain,
}

impl ProgressReporter {
    /// Reporter for `total` packages.
    ///
    /// The bar is only used when `render_progress` is set and `output` is at
    /// normal verbosity; quieter output shows nothing and louder output keeps
    /// the per-package lines readable.
    #[must_use]
    pub fn new(render_progress: bool, output: &OutputSink, total: usize) -> Self {
        if render_progress && output.verbosity() == Verbosity::Normal {
            Self::Rich(ProgressBar::new(total))
        } else {
            Self::Plain
        }
    }

    /// Whether the bar is in use.
    #[must_use]
    pub const fn is_rich(&self) -> bool {
        matches!(self, Self::Rich(_))
    }

    /// Announce `package` before it is processed.
    pub fn begin(&mut self, package: &Package, output: &OutputSink) {
        match self {
            Self::Rich(bar) => {
                bar.set_package(package.name(), package.pretty_version());
                bar.display(output);
            }
            Self::Plain => output.writeln(format!(
                "Dumping package '{}' in version '{}'.",
                package.name(),
                package.pretty_version()
            )),
        }
    }

    /// Record that the current package is done.
    pub fn advance(&mut self, output: &OutputSink) {
        if let Self::Rich(bar) = self {
            bar.advance(output);
        }
    }

    /// Finish after the last package.
    pub fn finish(&mut self, output: &OutputSink) {
        if let Self::Rich(bar) = self {
            bar.finish(output);
        }
    }

    /// Leave the bar where it is, for example before reporting an error.
    pub fn interrupt(&mut self, output: &OutputSink) {
        if let Self::Rich(bar) = self {
            bar.end_line(output);
        }
    }
}
