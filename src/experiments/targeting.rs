//! Eligibility rules for experiments and feature flags. Every condition must
//! hold; there is no OR or NOT composition.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::domain::aggregates::{DeviceType, FlagTargeting, Targeting};

/// What the server knows about the visitor being evaluated.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: String,
    pub device_type: Option<DeviceType>,
    pub viewport_width: Option<u32>,
    #[serde(default = "default_new_user")]
    pub is_new_user: bool,
    pub url: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

fn default_new_user() -> bool { true }

impl UserContext {
    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self {
            user_id: None,
            session_id: session_id.into(),
            device_type: None,
            viewport_width: None,
            is_new_user: true,
            url: None,
            country: None,
            attributes: BTreeMap::new(),
        }
    }

    /// User id when signed in, otherwise the session id.
    pub fn identity(&self) -> &str {
        self.user_id.as_deref().filter(|u| !u.is_empty()).unwrap_or(&self.session_id)
    }

    pub fn device(&self) -> DeviceType {
        self.device_type
            .or_else(|| self.viewport_width.map(DeviceType::from_viewport_width))
            .unwrap_or(DeviceType::Desktop)
    }

    /// Custom attribute lookup, falling back to the built-in fields.
    pub fn attribute(&self, key: &str) -> Option<Value> {
        if let Some(v) = self.attributes.get(key) {
            return Some(v.clone());
        }
        match key {
            "deviceType" => serde_json::to_value(self.device()).ok(),
            "isNewUser" => Some(Value::Bool(self.is_new_user)),
            "country" => self.country.clone().map(Value::String),
            "url" => self.url.clone().map(Value::String),
            "userId" => self.user_id.clone().map(Value::String),
            _ => None,
        }
    }
}

pub fn matches_targeting(targeting: &Targeting, ctx: &UserContext) -> bool {
    if !targeting.device.is_empty() && !targeting.device.contains(&ctx.device()) {
        return false;
    }
    if let Some(new_users) = targeting.new_users {
        if new_users != ctx.is_new_user { return false; }
    }
    if let Some(returning) = targeting.returning_users {
        if returning == ctx.is_new_user { return false; }
    }
    for (key, expected) in &targeting.custom_attributes {
        if ctx.attribute(key).as_ref() != Some(expected) {
            return false;
        }
    }
    matches_url(targeting, ctx)
}

/// URL conditions only apply when the visitor's URL is known.
fn matches_url(targeting: &Targeting, ctx: &UserContext) -> bool {
    let Some(url) = ctx.url.as_deref() else { return true };
    if let Some(exact) = targeting.url.as_deref() {
        if exact != url { return false; }
    }
    if let Some(pattern) = targeting.url_pattern.as_deref() {
        match Regex::new(pattern) {
            Ok(re) => if !re.is_match(url) { return false; },
            Err(e) => {
                warn!(pattern, error = %e, "invalid urlPattern in experiment targeting");
                return false;
            }
        }
    }
    true
}

pub fn matches_flag_targeting(targeting: &FlagTargeting, ctx: &UserContext) -> bool {
    if !targeting.user_ids.is_empty() {
        match ctx.user_id.as_ref() {
            Some(id) if targeting.user_ids.contains(id) => {}
            _ => return false,
        }
    }
    if !targeting.countries.is_empty() {
        if let Some(country) = ctx.country.as_deref() {
            if !targeting.countries.iter().any(|c| c.eq_ignore_ascii_case(country)) {
                return false;
            }
        }
    }
    if !targeting.devices.is_empty() && !targeting.devices.contains(&ctx.device()) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> UserContext { UserContext::for_session("sess-1") }

    #[test]
    fn test_identity_prefers_user_id() {
        let mut c = ctx();
        assert_eq!(c.identity(), "sess-1");
        c.user_id = Some("user-9".into());
        assert_eq!(c.identity(), "user-9");
        c.user_id = Some(String::new());
        assert_eq!(c.identity(), "sess-1");
    }

    #[test]
    fn test_device_condition() {
        let t = Targeting { device: vec![DeviceType::Mobile], ..Default::default() };
        let mut c = ctx();
        assert!(!matches_targeting(&t, &c));
        c.viewport_width = Some(390);
        assert!(matches_targeting(&t, &c));
    }

    #[test]
    fn test_new_and_returning_conditions() {
        let mut c = ctx();
        let only_new = Targeting { new_users: Some(true), ..Default::default() };
        let only_returning = Targeting { returning_users: Some(true), ..Default::default() };
        assert!(matches_targeting(&only_new, &c));
        assert!(!matches_targeting(&only_returning, &c));
        c.is_new_user = false;
        assert!(!matches_targeting(&only_new, &c));
        assert!(matches_targeting(&only_returning, &c));
    }

    #[test]
    fn test_custom_attributes_are_anded() {
        let mut t = Targeting::default();
        t.custom_attributes.insert("tier".into(), json!("gold"));
        t.custom_attributes.insert("isNewUser".into(), json!(true));
        let mut c = ctx();
        assert!(!matches_targeting(&t, &c));
        c.attributes.insert("tier".into(), json!("gold"));
        assert!(matches_targeting(&t, &c));
        c.is_new_user = false;
        assert!(!matches_targeting(&t, &c));
    }

    #[test]
    fn test_url_conditions() {
        let t = Targeting { url_pattern: Some(r"/collections/\w+".into()), ..Default::default() };
        let mut c = ctx();
        assert!(matches_targeting(&t, &c));
        c.url = Some("https://fashun.co.in/collections/hoodies".into());
        assert!(matches_targeting(&t, &c));
        c.url = Some("https://fashun.co.in/cart".into());
        assert!(!matches_targeting(&t, &c));

        let broken = Targeting { url_pattern: Some("(".into()), ..Default::default() };
        assert!(!matches_targeting(&broken, &c));
    }

    #[test]
    fn test_flag_targeting_requires_listed_user() {
        let t = FlagTargeting { user_ids: vec!["user-1".into()], ..Default::default() };
        let mut c = ctx();
        assert!(!matches_flag_targeting(&t, &c));
        c.user_id = Some("user-1".into());
        assert!(matches_flag_targeting(&t, &c));
    }

    #[test]
    fn test_flag_targeting_country_only_when_known() {
        let t = FlagTargeting { countries: vec!["IN".into()], ..Default::default() };
        let mut c = ctx();
        assert!(matches_flag_targeting(&t, &c));
        c.country = Some("us".into());
        assert!(!matches_flag_targeting(&t, &c));
        c.country = Some("in".into());
        assert!(matches_flag_targeting(&t, &c));
    }
}
