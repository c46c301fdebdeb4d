//! Sandboxed variant application.
//!
//! Variant changes are compiled into a closed set of [`Transform`]s and
//! interpreted against a [`Document`] snapshot. Anything outside that set,
//! including arbitrary code, is rejected at compile time.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

use crate::domain::aggregates::VariantChange;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
    #[error("attribute not allowed: {0}")]
    ForbiddenAttribute(String),
    #[error("invalid style property: {0}")]
    InvalidStyleProperty(String),
    #[error("unsafe value: {0}")]
    UnsafeValue(String),
    #[error("unsafe redirect target: {0}")]
    UnsafeRedirect(String),
    #[error("custom code changes are not executed")]
    CodeExecutionRejected,
}

/// A single element of a page snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub style: BTreeMap<String, String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub elements: Vec<Element>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum SimpleSelector {
    Universal,
    Tag(String),
    Id(String),
    Class(String),
    TagClass(String, String),
    Attribute { name: String, value: Option<String> },
}

impl SimpleSelector {
    fn matches(&self, el: &Element) -> bool {
        match self {
            SimpleSelector::Universal => true,
            SimpleSelector::Tag(tag) => el.tag.eq_ignore_ascii_case(tag),
            SimpleSelector::Id(id) => el.id.as_deref() == Some(id.as_str()),
            SimpleSelector::Class(class) => el.classes.iter().any(|c| c == class),
            SimpleSelector::TagClass(tag, class) => el.tag.eq_ignore_ascii_case(tag) && el.classes.iter().any(|c| c == class),
            SimpleSelector::Attribute { name, value } => match (el.attributes.get(name), value) {
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
                (None, _) => false,
            },
        }
    }
}

/// Comma-separated list of simple selectors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    source: String,
    parts: Vec<SimpleSelector>,
}

impl Selector {
    pub fn matches(&self, el: &Element) -> bool { self.parts.iter().any(|p| p.matches(el)) }
    pub fn as_str(&self) -> &str { &self.source }
}

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl FromStr for Selector {
    type Err = TransformError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let invalid = || TransformError::InvalidSelector(source.to_string());
        let mut parts = Vec::new();
        for raw in source.split(',') {
            let s = raw.trim();
            let part = if s == "*" {
                SimpleSelector::Universal
            } else if let Some(id) = s.strip_prefix('#') {
                if !is_ident(id) { return Err(invalid()); }
                SimpleSelector::Id(id.to_string())
            } else if let Some(class) = s.strip_prefix('.') {
                if !is_ident(class) { return Err(invalid()); }
                SimpleSelector::Class(class.to_string())
            } else if let Some(inner) = s.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
                match inner.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim().trim_matches(|c: char| c == '"' || c == '\'');
                        if !is_ident(name.trim()) { return Err(invalid()); }
                        SimpleSelector::Attribute { name: name.trim().to_string(), value: Some(value.to_string()) }
                    }
                    None => {
                        if !is_ident(inner.trim()) { return Err(invalid()); }
                        SimpleSelector::Attribute { name: inner.trim().to_string(), value: None }
                    }
                }
            } else if let Some((tag, class)) = s.split_once('.') {
                if !is_ident(tag) || !is_ident(class) { return Err(invalid()); }
                SimpleSelector::TagClass(tag.to_string(), class.to_string())
            } else {
                if !is_ident(s) { return Err(invalid()); }
                SimpleSelector::Tag(s.to_string())
            };
            parts.push(part);
        }
        Ok(Self { source: source.to_string(), parts })
    }
}

impl Serialize for Selector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// The closed set of operations a variant may perform.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Transform {
    SetText { selector: Selector, value: String },
    SetStyle { selector: Selector, property: String, value: String },
    SetAttribute { selector: Selector, name: String, value: String },
    Redirect { location: String },
    ForceFlag { flag_id: String, enabled: bool },
    Config { key: String, value: Value },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedChange {
    pub index: usize,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledVariant {
    pub transforms: Vec<Transform>,
    pub rejected: Vec<RejectedChange>,
}

fn contains_script(value: &str) -> bool {
    let lowered: String = value.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_lowercase();
    lowered.contains("javascript:") || lowered.contains("vbscript:") || lowered.contains("expression(")
}

fn check_redirect(target: &str) -> Result<String, TransformError> {
    let t = target.trim();
    let relative = t.starts_with('/') && !t.starts_with("//");
    let absolute = t.starts_with("https://") || t.starts_with("http://");
    if (relative || absolute) && !contains_script(t) {
        Ok(t.to_string())
    } else {
        Err(TransformError::UnsafeRedirect(target.to_string()))
    }
}

impl Transform {
    pub fn compile(change: &VariantChange) -> Result<Transform, TransformError> {
        match change {
            VariantChange::ElementText { selector, value } => Ok(Transform::SetText {
                selector: selector.parse()?,
                value: value.clone(),
            }),
            VariantChange::ElementStyle { selector, property, value } => {
                let property = property.trim().to_ascii_lowercase();
                if !is_ident(&property) {
                    return Err(TransformError::InvalidStyleProperty(property));
                }
                if contains_script(value) {
                    return Err(TransformError::UnsafeValue(value.clone()));
                }
                Ok(Transform::SetStyle { selector: selector.parse()?, property, value: value.clone() })
            }
            VariantChange::ElementAttribute { selector, property, value } => {
                let name = property.trim().to_ascii_lowercase();
                if !is_ident(&name) || name.starts_with("on") || name == "srcdoc" {
                    return Err(TransformError::ForbiddenAttribute(property.clone()));
                }
                if contains_script(value) {
                    return Err(TransformError::UnsafeValue(value.clone()));
                }
                Ok(Transform::SetAttribute { selector: selector.parse()?, name, value: value.clone() })
            }
            VariantChange::Redirect { value } => Ok(Transform::Redirect { location: check_redirect(value)? }),
            VariantChange::FeatureFlag { property, value } => Ok(Transform::ForceFlag { flag_id: property.clone(), enabled: *value }),
            VariantChange::ConfigValue { property, value } => Ok(Transform::Config { key: property.clone(), value: value.clone() }),
            VariantChange::CustomCode { .. } => Err(TransformError::CodeExecutionRejected),
        }
    }
}

/// Compiles every change independently; rejected ones are logged and reported.
pub fn compile_changes(variant_id: &str, changes: &[VariantChange]) -> CompiledVariant {
    let mut compiled = CompiledVariant::default();
    for (index, change) in changes.iter().enumerate() {
        match Transform::compile(change) {
            Ok(t) => compiled.transforms.push(t),
            Err(e) => {
                warn!(variant_id, index, error = %e, "rejected variant change");
                compiled.rejected.push(RejectedChange { index, reason: e.to_string() });
            }
        }
    }
    compiled
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    pub elements_changed: usize,
    pub redirect: Option<String>,
    pub flags: BTreeMap<String, bool>,
    pub config: BTreeMap<String, Value>,
}

impl Document {
    pub fn apply(&mut self, transforms: &[Transform]) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();
        for t in transforms {
            match t {
                Transform::SetText { selector, value } => {
                    outcome.elements_changed += self.each_match(selector, |el| el.text = value.clone());
                }
                Transform::SetStyle { selector, property, value } => {
                    outcome.elements_changed += self.each_match(selector, |el| { el.style.insert(property.clone(), value.clone()); });
                }
                Transform::SetAttribute { selector, name, value } => {
                    outcome.elements_changed += self.each_match(selector, |el| { el.attributes.insert(name.clone(), value.clone()); });
                }
                Transform::Redirect { location } => {
                    if outcome.redirect.is_none() {
                        outcome.redirect = Some(location.clone());
                    }
                }
                Transform::ForceFlag { flag_id, enabled } => { outcome.flags.insert(flag_id.clone(), *enabled); }
                Transform::Config { key, value } => { outcome.config.insert(key.clone(), value.clone()); }
            }
        }
        outcome
    }

    fn each_match(&mut self, selector: &Selector, mut f: impl FnMut(&mut Element)) -> usize {
        let mut n = 0;
        for el in self.elements.iter_mut().filter(|el| selector.matches(el)) {
            f(el);
            n += 1;
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> Document {
        Document {
            elements: vec![
                Element { tag: "h1".into(), id: Some("hero-title".into()), classes: vec!["hero".into()], text: "New drop".into(), ..Default::default() },
                Element { tag: "button".into(), classes: vec!["cta".into(), "primary".into()], text: "Shop".into(), ..Default::default() },
                Element { tag: "a".into(), attributes: BTreeMap::from([("data-track".into(), "nav".into())]), ..Default::default() },
            ],
        }
    }

    fn change(v: serde_json::Value) -> VariantChange { serde_json::from_value(v).unwrap() }

    #[test]
    fn test_selector_parsing() {
        assert!("#hero-title".parse::<Selector>().is_ok());
        assert!("button.cta, h1".parse::<Selector>().is_ok());
        assert!("[data-track=nav]".parse::<Selector>().is_ok());
        assert!("div > span".parse::<Selector>().is_err());
        assert!("#".parse::<Selector>().is_err());
    }

    #[test]
    fn test_applies_text_style_and_attribute() {
        let changes = vec![
            change(json!({"type": "element_text", "selector": "#hero-title", "value": "Drop 04 is live"})),
            change(json!({"type": "element_style", "selector": "button.cta", "property": "background-color", "value": "#ff3366"})),
            change(json!({"type": "element_attribute", "selector": "[data-track=nav]", "property": "href", "value": "/sale"})),
        ];
        let compiled = compile_changes("v1", &changes);
        assert!(compiled.rejected.is_empty());

        let mut doc = page();
        let outcome = doc.apply(&compiled.transforms);
        assert_eq!(outcome.elements_changed, 3);
        assert_eq!(doc.elements[0].text, "Drop 04 is live");
        assert_eq!(doc.elements[1].style["background-color"], "#ff3366");
        assert_eq!(doc.elements[2].attributes["href"], "/sale");
    }

    #[test]
    fn test_custom_code_is_never_executed() {
        let compiled = compile_changes("v1", &[change(json!({"type": "custom_code", "customCode": "document.body.innerHTML=''"}))]);
        assert!(compiled.transforms.is_empty());
        assert_eq!(compiled.rejected.len(), 1);
        assert_eq!(compiled.rejected[0].reason, TransformError::CodeExecutionRejected.to_string());
    }

    #[test]
    fn test_rejects_script_sinks() {
        let bad = [
            json!({"type": "element_attribute", "selector": "a", "property": "onclick", "value": "steal()"}),
            json!({"type": "element_attribute", "selector": "a", "property": "href", "value": "java script:alert(1)"}),
            json!({"type": "element_style", "selector": "a", "property": "width", "value": "expression(alert(1))"}),
            json!({"type": "redirect", "value": "javascript:alert(1)"}),
            json!({"type": "redirect", "value": "//evil.example"}),
        ];
        for v in bad {
            assert!(Transform::compile(&change(v.clone())).is_err(), "{v} should be rejected");
        }
    }

    #[test]
    fn test_one_bad_change_does_not_block_the_rest() {
        let changes = vec![
            change(json!({"type": "element_text", "selector": "div > p", "value": "x"})),
            change(json!({"type": "element_text", "selector": "h1", "value": "ok"})),
        ];
        let compiled = compile_changes("v1", &changes);
        assert_eq!(compiled.transforms.len(), 1);
        assert_eq!(compiled.rejected[0].index, 0);
    }

    #[test]
    fn test_redirect_flags_and_config_are_reported() {
        let changes = vec![
            change(json!({"type": "redirect", "value": "/collections/new"})),
            change(json!({"type": "feature_flag", "property": "flag_checkout", "value": true})),
            change(json!({"type": "config_value", "property": "cta_color", "value": "red"})),
        ];
        let mut doc = page();
        let outcome = doc.apply(&compile_changes("v1", &changes).transforms);
        assert_eq!(outcome.redirect.as_deref(), Some("/collections/new"));
        assert_eq!(outcome.flags["flag_checkout"], true);
        assert_eq!(outcome.config["cta_color"], json!("red"));
        assert_eq!(outcome.elements_changed, 0);
        assert_eq!(doc, page());
    }
}
