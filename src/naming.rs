//! Class-name generation (semantic, hash, sequential)

use crate::config::{NamingConfig, NamingStrategy};
use crate::core::constants::SEMANTIC_DIGEST_LENGTH;
use crate::selector;
use crate::types::Rule;
use std::collections::HashMap;

/// Holds the sequential counter and the registry of issued digest names.
/// Both live as long as the owning engine; `reset` clears them.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    config: NamingConfig,
    counter: u64,
    registry: HashMap<String, String>,
}

impl NameGenerator {
    pub fn new(config: NamingConfig) -> Self {
        Self {
            config,
            counter: 0,
            registry: HashMap::new(),
        }
    }

    pub fn config(&self) -> &NamingConfig {
        &self.config
    }

    /// Name for the configured strategy. `seed` is a selector or element
    /// id; `content` is the canonical text of the final declarations.
    pub fn generate(&mut self, seed: &str, content: &str) -> String {
        self.generate_with(self.config.strategy, seed, content)
    }

    pub fn generate_with(&mut self, strategy: NamingStrategy, seed: &str, content: &str) -> String {
        let prefix = self.config.prefix.as_str();
        let suffix = self.config.suffix.as_str();

        match strategy {
            NamingStrategy::Semantic => {
                let full = digest(content);
                let short = &full[..SEMANTIC_DIGEST_LENGTH];
                let name = format!("{}{}-{}{}", prefix, selector::slug(seed), short, suffix);
                self.register(name, full)
            }
            NamingStrategy::Hash => {
                let full = digest(content);
                let length = self.config.hash_length.min(full.len());
                let name = format!("{}{}{}", prefix, &full[..length], suffix);
                self.register(name, full)
            }
            NamingStrategy::Sequential => {
                self.counter += 1;
                format!("{}-{}{}", prefix.trim_end_matches('-'), self.counter, suffix)
            }
        }
    }

    fn register(&mut self, name: String, full_digest: String) -> String {
        match self.registry.get(&name) {
            Some(existing) if *existing != full_digest => {
                log::warn!(
                    "Class name '{}' already issued for different declarations (digest {} vs {})",
                    name,
                    existing,
                    full_digest
                );
            }
            Some(_) => {}
            None => {
                self.registry.insert(name.clone(), full_digest);
            }
        }
        name
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn issued_names(&self) -> usize {
        self.registry.len()
    }

    /// Clears the sequential counter and the issued-name registry
    pub fn reset(&mut self) {
        self.counter = 0;
        self.registry.clear();
    }
}

/// Hex md5 of `content`
pub fn digest(content: &str) -> String {
    hex::encode(md5::compute(content.as_bytes()).0)
}

/// Canonical text of a rule set for content addressing. Selectors are left
/// out so identical declarations name identically whatever the source.
pub fn fingerprint(rules: &[Rule]) -> String {
    let mut out = String::new();
    for rule in rules {
        out.push_str(&rule.scope().key());
        out.push('{');
        for decl in &rule.declarations {
            out.push_str(&decl.property);
            out.push(':');
            out.push_str(&decl.value);
            if decl.important {
                out.push_str("!important");
            }
            out.push(';');
        }
        out.push('}');
    }
    out
}
