use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::document::XmlDocument;
use super::error::{EfattureError, ValidationError};

/// Errors accumulated by one or more validators.
///
/// Keyed by code: inserting a code twice keeps its first position but the
/// latest message, so a rule that fails on several repeated groups reports the
/// last failure. Every recorded violation is still available, in order, via
/// [`ValidationReport::violations`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    by_code: Vec<ValidationError>,
    all: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation.
    pub fn insert(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.push(ValidationError::new(code, message));
    }

    pub fn push(&mut self, error: ValidationError) {
        match self.by_code.iter_mut().find(|e| e.code == error.code) {
            Some(slot) => slot.message.clone_from(&error.message),
            None => self.by_code.push(error.clone()),
        }
        self.all.push(error);
    }

    /// Merge `other` into `self`; on code collision `other` wins.
    pub fn merge(&mut self, other: ValidationReport) {
        for error in other.all {
            self.push(error);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Number of distinct codes.
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.by_code.iter().any(|e| e.code == code)
    }

    /// Latest message recorded for `code`.
    pub fn get(&self, code: &str) -> Option<&str> {
        self.by_code
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.message.as_str())
    }

    /// One entry per code, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.by_code.iter()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.by_code.iter().map(|e| e.code.as_str())
    }

    /// Every recorded violation, duplicates included.
    pub fn violations(&self) -> &[ValidationError] {
        &self.all
    }

    pub fn first(&self) -> Option<&ValidationError> {
        self.by_code.first()
    }

    /// `Err` carrying the first error, if any.
    pub fn into_result(self) -> Result<(), EfattureError> {
        match self.by_code.into_iter().next() {
            Some(first) => Err(EfattureError::Validation(first)),
            None => Ok(()),
        }
    }
}

/// A check run over a whole document.
pub trait DocumentValidator: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Collect every violation found in `document`.
    fn errors(&self, document: &XmlDocument) -> Result<ValidationReport, EfattureError>;
}

/// Immutable ordered list of validators attached to a document.
#[derive(Clone)]
pub struct ValidatorChain {
    validators: Arc<[Arc<dyn DocumentValidator>]>,
}

impl Default for ValidatorChain {
    fn default() -> Self {
        Self {
            validators: Arc::from(Vec::new()),
        }
    }
}

impl fmt::Debug for ValidatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ValidatorChain {
    pub fn builder() -> ValidatorChainBuilder {
        ValidatorChainBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.validators.iter().map(|v| v.name())
    }

    /// Run every validator in order and merge their reports; later
    /// validators override earlier ones on the same code.
    pub fn run(&self, document: &XmlDocument) -> Result<ValidationReport, EfattureError> {
        let mut report = ValidationReport::new();
        for validator in self.validators.iter() {
            let found = validator.errors(document)?;
            debug!(
                validator = validator.name(),
                errors = found.len(),
                "validator finished"
            );
            report.merge(found);
        }
        Ok(report)
    }
}

#[derive(Default)]
pub struct ValidatorChainBuilder {
    validators: Vec<Arc<dyn DocumentValidator>>,
}

impl ValidatorChainBuilder {
    pub fn with(mut self, validator: impl DocumentValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn with_shared(mut self, validator: Arc<dyn DocumentValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn build(self) -> ValidatorChain {
        ValidatorChain {
            validators: Arc::from(self.validators),
        }
    }
}
