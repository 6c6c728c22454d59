//! User-corrected extraction values sent back to the service.

use crate::extraction::{Extraction, ExtractionGroup, ExtractionResult};

use std::collections::BTreeMap;

use serde::Serialize;

/// Corrected flat and compound extractions.
///
/// Serializes as `{"extractions": {...}, "compoundExtractions": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub extractions: BTreeMap<String, Extraction>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub compound_extractions: BTreeMap<String, Vec<ExtractionGroup>>,
}

impl Feedback {
    pub fn new(extractions: impl IntoIterator<Item = Extraction>) -> Self {
        Self {
            extractions: extractions
                .into_iter()
                .map(|e| (e.name.clone(), e))
                .collect(),
            compound_extractions: BTreeMap::new(),
        }
    }

    /// Start from the analysed values so untouched fields are confirmed too.
    pub fn from_result(result: &ExtractionResult) -> Self {
        Self {
            extractions: result
                .extractions()
                .map(|e| (e.name.clone(), e.clone()))
                .collect(),
            compound_extractions: result.compound_extractions().clone(),
        }
    }

    pub fn with_compound(mut self, name: impl Into<String>, groups: Vec<ExtractionGroup>) -> Self {
        self.compound_extractions.insert(name.into(), groups);
        self
    }

    /// Replace the value of an extraction, keeping entity and box.
    pub fn correct(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.extractions.get_mut(name) {
            Some(extraction) => {
                extraction.value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.extractions.is_empty() && self.compound_extractions.is_empty()
    }
}
