//! Types for standardized reports to the user about non-fatal pipeline
//! conditions.
//!
//! Fatal errors abort the run through [`crate::error::MultiomeError`];
//! everything that merely degrades the output (zero overlaps, empty plot
//! data, dropped rows) is collected here so the caller can surface it once,
//! at the end of the run.

/// The [`RunOutput<U>`] type pairs a pipeline result with the [`Report`] of
/// non-fatal issues raised while producing it.
pub struct RunOutput<U> {
    value: U,
    report: Report,
}

impl<U> RunOutput<U> {
    pub fn new(value: U, report: Report) -> Self {
        Self { value, report }
    }

    pub fn value(&self) -> &U {
        &self.value
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn into_parts(self) -> (U, Report) {
        (self.value, self.report)
    }
}

/// A type to (semi) standardize reporting to the user.
#[derive(Clone, Debug, Default)]
pub struct Report {
    entries: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, message: String) {
        self.entries.push(message)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn issues(&self) -> &[String] {
        &self.entries
    }
}
