//! Completeness check run before any balance check.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::closing::ClosingField;
use crate::state::TillState;

/// Closing fields that must hold a non-zero value before submitting.
const REQUIRED_FIGURES: [(ClosingField, FormField); 3] = [
    (ClosingField::CardTotal, FormField::CardTotal),
    (ClosingField::CardClose, FormField::CardClose),
    (ClosingField::Sales, FormField::Sales),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    CardTotal,
    CardClose,
    Sales,
    Attachments,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FormField::CardTotal => "cardTotal",
            FormField::CardClose => "cardClose",
            FormField::Sales => "sales",
            FormField::Attachments => "attachments",
        })
    }
}

/// Fields failing the last validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeSet<FormField>);

impl FormErrors {
    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = FormField> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<FormField> for FormErrors {
    fn from_iter<I: IntoIterator<Item = FormField>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Flag every required figure equal to zero, and a missing attachment.
///
/// A figure deliberately entered as `0` is indistinguishable from one never
/// filled in, so both are flagged.
pub fn validate(state: &TillState) -> FormErrors {
    let mut errors: FormErrors = REQUIRED_FIGURES
        .iter()
        .filter(|(figure, _)| state.closing.get(*figure).is_zero())
        .map(|(_, field)| *field)
        .collect();
    if state.attachments.is_empty() {
        errors.0.insert(FormField::Attachments);
    }
    errors
}
