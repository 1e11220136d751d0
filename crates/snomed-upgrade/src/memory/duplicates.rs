//! Detection of child content made redundant by a parent snapshot.

use std::collections::BTreeMap;

use snomed_types::Component;

/// Returns the ids of `own` components that `inherited` already holds in an
/// identical state.
///
/// A matching id with any difference in state, such as an extension
/// inactivating an international concept, is not redundant.
pub fn find_redundant_components<'a, I>(own: I, inherited: &BTreeMap<String, Component>) -> Vec<String>
where
    I: IntoIterator<Item = &'a Component>,
{
    own.into_iter()
        .filter(|component| inherited.get(&component.id) == Some(*component))
        .map(|component| component.id.clone())
        .collect()
}
