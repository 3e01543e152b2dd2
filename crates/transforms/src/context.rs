//! Per-run state shared by the passes of one obfuscation run.
use crate::HelperKind;
use indexmap::{IndexMap, IndexSet};
use murk_oracle::cipher::{Cipher, Key};
use murk_utils::errors::TransformError;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::debug;

/// Original → replacement identifiers plus the pool of names reserved for synthetic
/// bindings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NameMapping {
    names: IndexMap<String, String>,
    reserved: VecDeque<String>,
    /// Identifiers no replacement or synthetic name may take.
    #[serde(skip)]
    taken: IndexSet<String>,
}

impl NameMapping {
    pub fn new(
        names: IndexMap<String, String>,
        reserved: Vec<String>,
        taken: IndexSet<String>,
    ) -> Self {
        Self {
            names,
            reserved: reserved.into(),
            taken,
        }
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.names.get(original).map(String::as_str)
    }

    /// Replaces `ident` with its mapping entry, if any.
    pub fn substitute(&self, ident: &mut String) {
        if let Some(replacement) = self.names.get(ident.as_str()) {
            ident.clone_from(replacement);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn reserved_remaining(&self) -> usize {
        self.reserved.len()
    }

    /// True if `name` is an original, a replacement, or an identifier the module reads.
    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name) || self.names.values().any(|v| v == name)
    }

    fn take_reserved(&mut self) -> Option<String> {
        self.reserved.pop_front()
    }
}

/// State for one obfuscation run. Nothing here outlives the run, so independent runs can
/// proceed concurrently.
#[derive(Debug)]
pub struct PassContext {
    mapping: NameMapping,
    helpers: IndexMap<HelperKind, String>,
    synthetic: Vec<String>,
    key: Option<Key>,
}

impl PassContext {
    pub fn new(mapping: NameMapping) -> Self {
        Self {
            mapping,
            helpers: IndexMap::new(),
            synthetic: Vec::new(),
            key: None,
        }
    }

    pub const fn mapping(&self) -> &NameMapping {
        &self.mapping
    }

    pub fn substitute(&self, ident: &mut String) {
        self.mapping.substitute(ident);
    }

    /// Draws the next name from the reserved pool.
    pub fn take_reserved(&mut self, pass: &'static str) -> Result<String, TransformError> {
        let name = self
            .mapping
            .take_reserved()
            .ok_or(TransformError::ReservedPoolExhausted { pass })?;
        debug!("{pass}: reserved name {name}");
        self.synthetic.push(name.clone());
        Ok(name)
    }

    /// Name of the helper of `kind`, drawing it from the reserved pool on first use.
    pub fn helper_name(
        &mut self,
        kind: HelperKind,
        pass: &'static str,
    ) -> Result<String, TransformError> {
        if let Some(name) = self.helpers.get(&kind) {
            return Ok(name.clone());
        }
        let name = self.take_reserved(pass)?;
        self.helpers.insert(kind, name.clone());
        Ok(name)
    }

    /// Name of the helper of `kind` if some pass has used it this run.
    pub fn helper(&self, kind: HelperKind) -> Option<&str> {
        self.helpers.get(&kind).map(String::as_str)
    }

    /// The run's cipher key, generated on first use and shared by every sealed function.
    pub fn cipher_key(&mut self, cipher: &dyn Cipher) -> Result<Key, TransformError> {
        if let Some(key) = &self.key {
            return Ok(key.clone());
        }
        let key = cipher.generate_key()?;
        self.key = Some(key.clone());
        Ok(key)
    }

    /// Reserved names handed out so far, in order.
    pub fn synthetic_names(&self) -> &[String] {
        &self.synthetic
    }
}
