//! Post-upgrade content automations over in-memory branch content.
//!
//! Each pass looks at content authored on the code system branch and writes
//! its changes as a single commit on that branch.

use std::collections::{BTreeMap, HashSet};

use snomed_types::well_known::{
    ACCEPTABILITY_ID, CONCEPT_ID, CONCEPT_NON_CURRENT, DESCRIPTION_INACTIVATION_INDICATOR_REFSET,
    OWL_AXIOM_REFSET, REFERENCED_COMPONENT_ID, REFSET_ID, VALUE_ID,
};
use snomed_types::{CodeSystem, Component, ComponentKind};
use tracing::info;
use uuid::Uuid;

use crate::collaborators::ContentAutomations;
use crate::error::CollaboratorResult;

use super::InMemoryTerminologyStore;

fn is_inactive(visible: &BTreeMap<String, Component>, id: Option<&str>) -> bool {
    id.and_then(|id| visible.get(id))
        .is_some_and(|component| !component.active)
}

impl InMemoryTerminologyStore {
    /// Inactivates active members authored on the branch that `stale` selects.
    fn inactivate_own_members<F>(&self, code_system: &CodeSystem, label: &str, stale: F) -> CollaboratorResult<()>
    where
        F: Fn(&Component, &BTreeMap<String, Component>) -> bool,
    {
        let path = code_system.branch_path.as_str();
        let mut state = self.write();
        let (own, visible) = state.own_and_visible(path)?;
        let inactivated: Vec<Component> = own
            .values()
            .filter(|member| member.kind == ComponentKind::ReferenceSetMember && member.active)
            .filter(|member| stale(member, &visible))
            .map(Component::inactivated)
            .collect();

        let count = inactivated.len();
        if count > 0 {
            state.commit(path, inactivated, Vec::new(), false)?;
        }
        info!("Inactivated {} {} on {}", count, label, path);
        Ok(())
    }
}

impl ContentAutomations for InMemoryTerminologyStore {
    fn propagate_description_inactivation(&self, code_system: &CodeSystem) -> CollaboratorResult<()> {
        let path = code_system.branch_path.as_str();
        let indicator_refset = DESCRIPTION_INACTIVATION_INDICATOR_REFSET.to_string();
        let mut state = self.write();
        let (own, visible) = state.own_and_visible(path)?;

        let already_indicated: HashSet<&str> = visible
            .values()
            .filter(|member| member.active && member.property(REFSET_ID) == Some(indicator_refset.as_str()))
            .filter_map(|member| member.property(REFERENCED_COMPONENT_ID))
            .collect();

        let indicators: Vec<Component> = own
            .values()
            .filter(|description| description.kind == ComponentKind::Description && description.active)
            .filter(|description| is_inactive(&visible, description.property(CONCEPT_ID)))
            .filter(|description| !already_indicated.contains(description.id.as_str()))
            .map(|description| {
                Component::new(
                    Uuid::new_v4().to_string(),
                    ComponentKind::ReferenceSetMember,
                    description.module_id,
                )
                .with_property(REFSET_ID, indicator_refset.as_str())
                .with_property(REFERENCED_COMPONENT_ID, description.id.as_str())
                .with_property(VALUE_ID, CONCEPT_NON_CURRENT.to_string())
            })
            .collect();

        let count = indicators.len();
        if count > 0 {
            state.commit(path, indicators, Vec::new(), false)?;
        }
        info!("Added {} description inactivation indicators on {}", count, path);
        Ok(())
    }

    fn propagate_language_refset_inactivation(&self, code_system: &CodeSystem) -> CollaboratorResult<()> {
        self.inactivate_own_members(code_system, "language refset members", |member, visible| {
            member.property(ACCEPTABILITY_ID).is_some()
                && is_inactive(visible, member.property(REFERENCED_COMPONENT_ID))
        })
    }

    fn propagate_additional_axiom_inactivation(&self, code_system: &CodeSystem) -> CollaboratorResult<()> {
        let axiom_refset = OWL_AXIOM_REFSET.to_string();
        self.inactivate_own_members(code_system, "additional axioms", |member, visible| {
            member.property(REFSET_ID) == Some(axiom_refset.as_str())
                && is_inactive(visible, member.property(REFERENCED_COMPONENT_ID))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snomed_types::well_known::{OWL_EXPRESSION, PREFERRED, US_ENGLISH_LANGUAGE_REFSET};

    const MODULE: u64 = 900000000000207008;
    const EXTENSION_MODULE: u64 = 11000000102;

    /// MAIN inactivates concept 100 after the extension authored content on it.
    fn store() -> (InMemoryTerminologyStore, CodeSystem) {
        let store = InMemoryTerminologyStore::new();
        store.create_branch("MAIN").unwrap();
        store
            .commit("MAIN", vec![Component::new("100", ComponentKind::Concept, MODULE)])
            .unwrap();
        store.create_branch("MAIN/SNOMEDCT-A").unwrap();
        let extension = CodeSystem::new("SNOMEDCT-A", "MAIN/SNOMEDCT-A");
        store.persist_code_system(extension.clone()).unwrap();

        store
            .commit(
                "MAIN/SNOMEDCT-A",
                vec![
                    Component::new("d1", ComponentKind::Description, EXTENSION_MODULE)
                        .with_property(CONCEPT_ID, "100"),
                    Component::new("lang-1", ComponentKind::ReferenceSetMember, EXTENSION_MODULE)
                        .with_property(REFSET_ID, US_ENGLISH_LANGUAGE_REFSET.to_string())
                        .with_property(REFERENCED_COMPONENT_ID, "d1")
                        .with_property(ACCEPTABILITY_ID, PREFERRED.to_string()),
                    Component::new("axiom-1", ComponentKind::ReferenceSetMember, EXTENSION_MODULE)
                        .with_property(REFSET_ID, OWL_AXIOM_REFSET.to_string())
                        .with_property(REFERENCED_COMPONENT_ID, "100")
                        .with_property(OWL_EXPRESSION, "SubClassOf(:100 :138875005)"),
                ],
            )
            .unwrap();
        // Extension adopts the inactivation of 100 directly for these tests.
        store
            .commit(
                "MAIN/SNOMEDCT-A",
                vec![Component::new("100", ComponentKind::Concept, MODULE).inactivated()],
            )
            .unwrap();
        (store, extension)
    }

    #[test]
    fn test_description_on_inactive_concept_gets_indicator_once() {
        let (store, extension) = store();

        store.propagate_description_inactivation(&extension).unwrap();
        store.propagate_description_inactivation(&extension).unwrap();

        let indicators: Vec<Component> = store
            .own_content("MAIN/SNOMEDCT-A")
            .unwrap()
            .into_values()
            .filter(|c| {
                c.property(REFSET_ID)
                    == Some(DESCRIPTION_INACTIVATION_INDICATOR_REFSET.to_string().as_str())
            })
            .collect();
        assert_eq!(indicators.len(), 1);
        assert_eq!(indicators[0].property(REFERENCED_COMPONENT_ID), Some("d1"));
        assert_eq!(
            indicators[0].property(VALUE_ID),
            Some(CONCEPT_NON_CURRENT.to_string().as_str())
        );
        assert_eq!(indicators[0].module_id, EXTENSION_MODULE);
        assert!(store.component("MAIN/SNOMEDCT-A", "d1").unwrap().active);
    }

    #[test]
    fn test_language_members_of_inactive_descriptions_inactivated() {
        let (store, extension) = store();
        store.propagate_language_refset_inactivation(&extension).unwrap();
        assert!(store.component("MAIN/SNOMEDCT-A", "lang-1").unwrap().active);

        store
            .commit(
                "MAIN/SNOMEDCT-A",
                vec![store.component("MAIN/SNOMEDCT-A", "d1").unwrap().inactivated()],
            )
            .unwrap();
        store.propagate_language_refset_inactivation(&extension).unwrap();

        assert!(!store.component("MAIN/SNOMEDCT-A", "lang-1").unwrap().active);
    }

    #[test]
    fn test_axioms_of_inactive_concepts_inactivated() {
        let (store, extension) = store();
        store.propagate_additional_axiom_inactivation(&extension).unwrap();

        let axiom = store.component("MAIN/SNOMEDCT-A", "axiom-1").unwrap();
        assert!(!axiom.active);
        assert_eq!(axiom.effective_time, None);
    }
}
