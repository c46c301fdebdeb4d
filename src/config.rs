use std::time::Duration;

/// Service settings, read from the environment after `.env` is loaded.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_host: String,
    pub port: u16,
    pub nats_url: Option<String>,
    pub images: ImageSettings,
    pub rum: RumSettings,
}

#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub freepik_api_key: Option<String>,
    pub pexels_api_key: Option<String>,
    pub freepik_base_url: String,
    pub pexels_base_url: String,
    pub unsplash_base_url: String,
    pub picsum_base_url: String,
    pub timeout: Duration,
    pub enable_fallback: bool,
    pub log_errors: bool,
}

#[derive(Debug, Clone)]
pub struct RumSettings {
    /// Fraction of sessions kept, `0.0..=1.0`.
    pub sample_rate: f64,
    pub buffer_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".into(),
            port: 8083,
            nats_url: None,
            images: ImageSettings::default(),
            rum: RumSettings::default(),
        }
    }
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            freepik_api_key: None,
            pexels_api_key: None,
            freepik_base_url: "https://api.freepik.com/v1".into(),
            pexels_base_url: "https://api.pexels.com/v1".into(),
            unsplash_base_url: "https://source.unsplash.com".into(),
            picsum_base_url: "https://picsum.photos".into(),
            timeout: Duration::from_millis(10_000),
            enable_fallback: true,
            log_errors: true,
        }
    }
}

impl Default for RumSettings {
    fn default() -> Self {
        Self { sample_rate: 1.0, buffer_capacity: 10_000 }
    }
}

impl Settings {
    pub fn bind_addr(&self) -> String { format!("{}:{}", self.bind_host, self.port) }
}

pub fn load_settings() -> Settings {
    from_lookup(|key| std::env::var(key).ok())
}

/// Builds settings from an arbitrary key lookup; unparsable values keep the default.
pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Some(v) = get("BIND_HOST") { settings.bind_host = v; }
    if let Some(v) = get("PORT").and_then(|v| v.parse().ok()) { settings.port = v; }
    settings.nats_url = get("NATS_URL").filter(|v| !v.trim().is_empty());

    let images = &mut settings.images;
    images.freepik_api_key = get("FREEPIK_API_KEY").filter(|v| !v.trim().is_empty());
    images.pexels_api_key = get("PEXELS_API_KEY").filter(|v| !v.trim().is_empty());
    if let Some(v) = get("FREEPIK_BASE_URL") { images.freepik_base_url = trim_slash(v); }
    if let Some(v) = get("PEXELS_BASE_URL") { images.pexels_base_url = trim_slash(v); }
    if let Some(v) = get("UNSPLASH_BASE_URL") { images.unsplash_base_url = trim_slash(v); }
    if let Some(v) = get("PICSUM_BASE_URL") { images.picsum_base_url = trim_slash(v); }
    if let Some(ms) = get("IMAGE_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok()) {
        images.timeout = Duration::from_millis(ms);
    }
    if let Some(v) = get("IMAGE_FALLBACK_ENABLED").and_then(|v| parse_bool(&v)) { images.enable_fallback = v; }
    if let Some(v) = get("IMAGE_LOG_ERRORS").and_then(|v| parse_bool(&v)) { images.log_errors = v; }

    if let Some(rate) = get("RUM_SAMPLE_RATE").and_then(|v| v.parse::<f64>().ok()) {
        if (0.0..=1.0).contains(&rate) { settings.rum.sample_rate = rate; }
    }
    if let Some(cap) = get("RUM_BUFFER_CAPACITY").and_then(|v| v.parse::<usize>().ok()) {
        settings.rum.buffer_capacity = cap.max(1);
    }

    settings
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn trim_slash(v: String) -> String { v.trim_end_matches('/').to_string() }

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let s = from_lookup(|_| None);
        assert_eq!(s.bind_addr(), "0.0.0.0:8083");
        assert!(s.images.freepik_api_key.is_none());
        assert_eq!(s.images.timeout, Duration::from_secs(10));
        assert!(s.images.enable_fallback);
        assert_eq!(s.rum.sample_rate, 1.0);
    }

    #[test]
    fn test_reads_overrides() {
        let s = from_lookup(lookup(&[
            ("PORT", "9000"),
            ("FREEPIK_API_KEY", "abc"),
            ("PEXELS_BASE_URL", "http://localhost:1234/"),
            ("IMAGE_TIMEOUT_MS", "250"),
            ("IMAGE_FALLBACK_ENABLED", "false"),
            ("RUM_SAMPLE_RATE", "0.25"),
        ]));
        assert_eq!(s.port, 9000);
        assert_eq!(s.images.freepik_api_key.as_deref(), Some("abc"));
        assert_eq!(s.images.pexels_base_url, "http://localhost:1234");
        assert_eq!(s.images.timeout, Duration::from_millis(250));
        assert!(!s.images.enable_fallback);
        assert_eq!(s.rum.sample_rate, 0.25);
    }

    #[test]
    fn test_ignores_invalid_values() {
        let s = from_lookup(lookup(&[("PORT", "nope"), ("RUM_SAMPLE_RATE", "3"), ("NATS_URL", " ")]));
        assert_eq!(s.port, 8083);
        assert_eq!(s.rum.sample_rate, 1.0);
        assert!(s.nats_url.is_none());
    }
}
