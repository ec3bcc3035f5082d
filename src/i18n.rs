//! String lookup injected into renderers.
//!
//! Message catalogs live in the page; the grid only asks for a key within a
//! namespace and falls back to the key itself.

use std::collections::HashMap;

use serde::Deserialize;

pub trait Translate {
    fn translate(&self, key: &str, namespace: &str) -> String;
}

/// Returns keys unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Untranslated;

impl Translate for Untranslated {
    fn translate(&self, key: &str, _namespace: &str) -> String {
        key.to_string()
    }
}

/// Lookup table handed over by the page: `{namespace: {key: text}}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TranslationTable {
    namespaces: HashMap<String, HashMap<String, String>>,
}

impl TranslationTable {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Translate for TranslationTable {
    fn translate(&self, key: &str, namespace: &str) -> String {
        self.namespaces
            .get(namespace)
            .and_then(|ns| ns.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_fallback() {
        let table =
            TranslationTable::from_json(r#"{"background":{"missing":"Valeurs manquantes"}}"#).unwrap();
        assert_eq!(table.translate("missing", "background"), "Valeurs manquantes");
        assert_eq!(table.translate("outliers", "background"), "outliers");
        assert_eq!(table.translate("missing", "other"), "missing");
        assert_eq!(Untranslated.translate("k", "ns"), "k");
    }
}
