//! Field catalog: the per-pass index of board fields.
//!
//! Fetched once at the start of every pass and read-only for the remainder of
//! that pass. Option lists are never cached across passes — administrators
//! add, remove, and rename options between runs.

use std::collections::HashMap;

use crate::{Field, FieldOption};

/// In-memory index mapping field names to [`Field`] definitions.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    by_name: HashMap<String, Field>,
}

impl FieldCatalog {
    /// Builds a catalog from the fields fetched for one pass.
    ///
    /// If the tracker ever reported duplicate field names, the last one wins;
    /// a well-formed board has unique names.
    pub fn new(fields: Vec<Field>) -> Self {
        let by_name = fields.into_iter().map(|f| (f.name.clone(), f)).collect();
        Self { by_name }
    }

    /// Resolves a field by its human name (e.g. `"Status"`).
    ///
    /// Absence is not an error: rules depending on a missing field are
    /// skipped by the rule engine.
    pub fn resolve(&self, field_name: &str) -> Option<&Field> {
        self.by_name.get(field_name)
    }

    /// Resolves a field and the first of its options whose name contains
    /// `target` (see [`Field::option_matching`]).
    pub fn field_option(&self, field_name: &str, target: &str) -> Option<(&Field, &FieldOption)> {
        let field = self.resolve(field_name)?;
        let option = field.option_matching(target)?;
        Some((field, option))
    }
}
