//! Structured analysis output: flat extractions, compound extractions
//! (line items and other repeating groups) and candidate pools.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Position of an extraction on a page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractionBox {
    pub page: u32,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A single named field produced by analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// Field name. Not part of the wire object; filled from the enclosing key.
    #[serde(skip)]
    pub name: String,
    pub entity: String,
    pub value: String,
    #[serde(rename = "box", default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<ExtractionBox>,
    /// Name of the candidate pool for this field, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<String>,
}

impl Extraction {
    pub fn new(
        name: impl Into<String>,
        entity: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entity: entity.into(),
            value: value.into(),
            bounding_box: None,
            candidates: None,
        }
    }
}

/// One group of a compound extraction, e.g. a single line item.
pub type ExtractionGroup = BTreeMap<String, Extraction>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractionResultWire {
    #[serde(default)]
    extractions: BTreeMap<String, Extraction>,
    #[serde(default)]
    compound_extractions: BTreeMap<String, Vec<BTreeMap<String, Extraction>>>,
    #[serde(default)]
    line_items: Option<Vec<BTreeMap<String, Extraction>>>,
    #[serde(default)]
    candidates: BTreeMap<String, Vec<Extraction>>,
}

/// Immutable snapshot of one analysis response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    extractions: BTreeMap<String, Extraction>,
    compound: BTreeMap<String, Vec<ExtractionGroup>>,
    candidates: BTreeMap<String, Vec<Extraction>>,
}

pub const LINE_ITEMS: &str = "lineItems";

impl ExtractionResult {
    pub fn new(
        extractions: impl IntoIterator<Item = Extraction>,
        compound: BTreeMap<String, Vec<ExtractionGroup>>,
        candidates: BTreeMap<String, Vec<Extraction>>,
    ) -> Self {
        Self {
            extractions: extractions
                .into_iter()
                .map(|e| (e.name.clone(), e))
                .collect(),
            compound,
            candidates,
        }
    }

    /// Parse the service's extraction JSON.
    ///
    /// Accepts `lineItems` either inside `compoundExtractions` or at top level.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let wire: ExtractionResultWire = serde_json::from_slice(bytes)?;

        let mut compound = wire.compound_extractions;
        if let Some(items) = wire.line_items {
            compound.entry(LINE_ITEMS.to_string()).or_insert(items);
        }

        let compound = compound
            .into_iter()
            .map(|(name, groups)| (name, groups.into_iter().map(name_group).collect()))
            .collect();

        let candidates = wire
            .candidates
            .into_iter()
            .map(|(pool, entries)| {
                let entries = entries
                    .into_iter()
                    .map(|mut e| {
                        e.name = pool.clone();
                        e
                    })
                    .collect();
                (pool, entries)
            })
            .collect();

        Ok(Self {
            extractions: name_group(wire.extractions),
            compound,
            candidates,
        })
    }

    /// Look up a flat extraction by name.
    pub fn extraction(&self, name: &str) -> Option<&Extraction> {
        self.extractions.get(name)
    }

    pub fn extractions(&self) -> impl Iterator<Item = &Extraction> {
        self.extractions.values()
    }

    pub fn compound(&self, name: &str) -> Option<&[ExtractionGroup]> {
        self.compound.get(name).map(Vec::as_slice)
    }

    pub fn compound_extractions(&self) -> &BTreeMap<String, Vec<ExtractionGroup>> {
        &self.compound
    }

    pub fn line_items(&self) -> &[ExtractionGroup] {
        self.compound(LINE_ITEMS).unwrap_or(&[])
    }

    pub fn candidates(&self, pool: &str) -> &[Extraction] {
        self.candidates.get(pool).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.extractions.is_empty() && self.compound.is_empty()
    }
}

fn name_group(group: BTreeMap<String, Extraction>) -> ExtractionGroup {
    group
        .into_iter()
        .map(|(name, mut extraction)| {
            extraction.name = name.clone();
            (name, extraction)
        })
        .collect()
}
