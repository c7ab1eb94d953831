use crate::core::config::TileServerConfig;
use crate::core::geo::TileKey;

/// Trait representing anything that can produce tile URLs for a given key.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `key`.
    fn url(&self, key: TileKey) -> String;
}

/// URL template source, e.g. `https://{s}.tile.example.org/{z}/{x}/{y}.png`
#[derive(Debug, Clone)]
pub struct TemplateSource {
    template: String,
    subdomains: Vec<String>,
}

impl TemplateSource {
    pub fn new(template: impl Into<String>, subdomains: Vec<String>) -> Self {
        Self {
            template: template.into(),
            subdomains,
        }
    }

    pub fn from_config(config: &TileServerConfig) -> Self {
        Self::new(config.url_template.clone(), config.subdomains.clone())
    }
}

impl TileSource for TemplateSource {
    fn url(&self, key: TileKey) -> String {
        let subdomain = if self.subdomains.is_empty() {
            ""
        } else {
            let idx = ((key.x + key.y) % self.subdomains.len() as u32) as usize;
            self.subdomains[idx].as_str()
        };
        self.template
            .replace("{s}", subdomain)
            .replace("{z}", &key.zoom.to_string())
            .replace("{x}", &key.x.to_string())
            .replace("{y}", &key.y.to_string())
    }
}
