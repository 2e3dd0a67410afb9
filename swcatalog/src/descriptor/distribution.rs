//! Distribution (`.dist`) documents.
//!
//! Two things are extracted:
//!
//! - the unsupported machine models, which only exist inside installer
//!   JavaScript (`var nonSupportedModels = ['MacBookPro9,2', ...];`);
//! - the `auxinfo` key/value pairs, either directly under `auxinfo` or inside
//!   one nested `dict`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use super::tree::{parse_document, Element};
use super::DescriptorError;

/// Script variable holding the unsupported models.
const NON_SUPPORTED_MODELS: &str = "nonSupportedModels";

/// Data extracted from a distribution document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionInfo {
    /// Machine models this product cannot be installed on.
    pub compatibility: Vec<String>,
    /// `auxinfo` key/value pairs.
    pub aux_info: BTreeMap<String, String>,
}

impl DistributionInfo {
    /// Whether `model` is listed as unsupported.
    pub fn excludes(&self, model: &str) -> bool {
        self.compatibility.iter().any(|m| m == model)
    }
}

/// Parse a distribution file; unreadable or malformed files yield the empty
/// result, which filters nothing.
pub fn parse_distribution(path: &Path) -> DistributionInfo {
    match try_parse_distribution(path) {
        Ok(info) => info,
        Err(e) => {
            warn!(error = %e, "Ignoring distribution document");
            DistributionInfo::default()
        }
    }
}

/// Parse a distribution file, reporting failures.
pub fn try_parse_distribution(path: &Path) -> Result<DistributionInfo, DescriptorError> {
    let bytes = fs::read(path).map_err(|e| DescriptorError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let root = parse_document(&bytes).map_err(|e| DescriptorError::Xml {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let info = extract_distribution(&root);
    debug!(
        path = %path.display(),
        unsupported = info.compatibility.len(),
        aux_keys = info.aux_info.len(),
        "Parsed distribution"
    );
    Ok(info)
}

/// Extract compatibility and auxinfo from a parsed document.
pub(crate) fn extract_distribution(root: &Element) -> DistributionInfo {
    let compatibility = root
        .descendants("script")
        .iter()
        .flat_map(|script| unsupported_models(&script.text()))
        .collect();

    let aux_info = root
        .descendants("auxinfo")
        .first()
        .map(|auxinfo| parse_auxinfo(auxinfo))
        .unwrap_or_default();

    DistributionInfo {
        compatibility,
        aux_info,
    }
}

/// Models assigned to `nonSupportedModels` in script text.
pub(crate) fn unsupported_models(script: &str) -> Vec<String> {
    script
        .lines()
        .filter(|line| line.contains(NON_SUPPORTED_MODELS) && line.contains('='))
        .filter_map(|line| {
            let (_, value) = line.split_once('=')?;
            let start = value.find('[')?;
            let end = value[start..].find(']')? + start;
            Some(quoted_tokens(&value[start + 1..end]))
        })
        .flatten()
        .collect()
}

/// Every single- or double-quoted token in `list`, quotes removed.
fn quoted_tokens(list: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = list.chars();

    while let Some(c) = chars.next() {
        if c != '\'' && c != '"' {
            continue;
        }
        let token: String = chars.by_ref().take_while(|&ch| ch != c).collect();
        let token = token.trim();
        if !token.is_empty() {
            tokens.push(token.to_string());
        }
    }

    tokens
}

/// Pair `key` and `string` elements under `auxinfo`.
///
/// Only element siblings take part, so whitespace between elements never
/// shifts the pairing. A pending key and a pending value flush together as
/// soon as both are present; a second key (or value) before that replaces
/// the pending one, and whatever is left at the end is dropped.
pub(crate) fn parse_auxinfo(auxinfo: &Element) -> BTreeMap<String, String> {
    let container = auxinfo
        .elements()
        .find(|element| element.name == "dict")
        .unwrap_or(auxinfo);

    let mut pairs = BTreeMap::new();
    let mut key: Option<String> = None;
    let mut value: Option<String> = None;

    for element in container.elements() {
        let text = element.text();
        match element.name.as_str() {
            "key" if !text.is_empty() => key = Some(text),
            "string" if !text.is_empty() => value = Some(text),
            _ => {}
        }
        if let (Some(k), Some(v)) = (&key, &value) {
            pairs.insert(k.clone(), v.clone());
            key = None;
            value = None;
        }
    }

    pairs
}
