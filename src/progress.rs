//! Progress reporting for record-by-record passes.

/// A snapshot of a running pass over an input file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Short name of the pass (e.g., "Importing words").
    pub stage_description: String,
    /// Records handled so far.
    pub current_item: u64,
    /// Records in the file.
    pub total_items: u64,
    /// The record just handled, if any.
    pub message: Option<String>,
}

/// Receives every [`ProgressUpdate`] of a pass. The binary renders these as a
/// progress bar; tests and library callers usually pass nothing.
pub type ProgressCallback = Box<dyn FnMut(ProgressUpdate)>;

/// Wraps an optional callback so passes can report unconditionally.
pub(crate) struct Reporter<'a> {
    callback: Option<&'a mut ProgressCallback>,
    stage: &'static str,
    total: u64,
    current: u64,
}

impl<'a> Reporter<'a> {
    pub(crate) fn start(
        callback: Option<&'a mut ProgressCallback>,
        stage: &'static str,
        total: usize,
    ) -> Self {
        let mut reporter = Self {
            callback,
            stage,
            total: total as u64,
            current: 0,
        };
        reporter.emit(None);
        reporter
    }

    /// Marks one more record as handled.
    pub(crate) fn advance(&mut self, message: impl Into<String>) {
        self.current += 1;
        self.emit(Some(message.into()));
    }

    fn emit(&mut self, message: Option<String>) {
        if let Some(cb) = self.callback.as_deref_mut() {
            cb(ProgressUpdate {
                stage_description: self.stage.to_string(),
                current_item: self.current,
                total_items: self.total,
                message,
            });
        }
    }
}
