use super::{RuleDefinition, RuleError};
use std::collections::HashMap;

/// Rules keyed by id, iterated in registration order.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    definitions: Vec<RuleDefinition>,
    index: HashMap<String, usize>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule. Fails if another rule already uses the same id.
    pub fn register(&mut self, definition: RuleDefinition) -> Result<&mut Self, RuleError> {
        let id = definition.id().to_string();
        if self.index.contains_key(&id) {
            return Err(RuleError::DuplicateRuleId(id));
        }

        self.index.insert(id, self.definitions.len());
        self.definitions.push(definition);
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&RuleDefinition> {
        self.index.get(id).map(|&i| &self.definitions[i])
    }

    pub fn has(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn entries(&self) -> &[RuleDefinition] {
        &self.definitions
    }

    pub fn ids(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl IntoIterator for RuleRegistry {
    type Item = RuleDefinition;
    type IntoIter = std::vec::IntoIter<RuleDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.definitions.into_iter()
    }
}

/// Build a fresh registry, registering `rules` in order.
pub fn create_registry<I>(rules: I) -> Result<RuleRegistry, RuleError>
where
    I: IntoIterator<Item = RuleDefinition>,
{
    let mut registry = RuleRegistry::new();
    for rule in rules {
        registry.register(rule)?;
    }
    Ok(registry)
}
