use std::path::{Path, PathBuf};

use crate::error::Error;

/// Project configuration loaded from `.doclink.toml`.
///
/// A missing config file yields defaults: bundle `main`, graphs in the
/// current directory, Swift as the primary language, and no extra pages.
#[derive(Debug)]
pub struct Config {
    /// Bundle identifier symbol graphs register under.
    pub bundle: String,
    /// Display name for the article and tutorial containers.
    pub display_name: String,
    /// Directory scanned for `*.symbols.json` files.
    pub graphs: PathBuf,
    /// Language that wins cross-language ties.
    pub primary_language: String,
    /// Article pages grafted under the articles container.
    pub articles: Vec<String>,
    /// Tutorial pages grafted under the tutorial container.
    pub tutorials: Vec<String>,
    /// Overview pages grafted under the tutorial overview container.
    pub tutorial_overviews: Vec<String>,
}

/// Raw TOML structure for `.doclink.toml`.
#[derive(serde::Deserialize)]
struct DoclinkTomlConfig {
    #[serde(default)]
    bundle: Option<String>,
    #[serde(default, rename = "display-name")]
    display_name: Option<String>,
    #[serde(default)]
    graphs: Option<PathBuf>,
    #[serde(default, rename = "primary-language")]
    primary_language: Option<String>,
    #[serde(default)]
    articles: Vec<String>,
    #[serde(default)]
    tutorials: Vec<String>,
    #[serde(default, rename = "tutorial-overviews")]
    tutorial_overviews: Vec<String>,
}

impl Config {
    /// Load config from `.doclink.toml` in the given root directory.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found) or
    /// `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(".doclink.toml");
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::defaults(root));
            }
            Err(e) => return Err(Error::Io(e)),
        };
        let raw: DoclinkTomlConfig = toml::from_str(&content)?;

        let bundle = raw.bundle.unwrap_or_else(|| "main".to_string());
        let display_name = raw
            .display_name
            .unwrap_or_else(|| default_display_name(&bundle));
        Ok(Self {
            display_name,
            bundle,
            graphs: root.join(raw.graphs.unwrap_or_else(|| PathBuf::from("."))),
            primary_language: raw.primary_language.unwrap_or_else(|| "swift".to_string()),
            articles: raw.articles,
            tutorials: raw.tutorials,
            tutorial_overviews: raw.tutorial_overviews,
        })
    }

    fn defaults(root: &Path) -> Self {
        Self {
            bundle: "main".to_string(),
            display_name: default_display_name("main"),
            graphs: root.to_path_buf(),
            primary_language: "swift".to_string(),
            articles: Vec::new(),
            tutorials: Vec::new(),
            tutorial_overviews: Vec::new(),
        }
    }
}

/// The last dot-separated segment of a bundle id, capitalized as-is.
fn default_display_name(bundle: &str) -> String {
    bundle
        .rsplit('.')
        .next()
        .unwrap_or(bundle)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_defaults_to_last_bundle_segment() {
        assert_eq!(default_display_name("com.example.ShapeKit"), "ShapeKit");
        assert_eq!(default_display_name("main"), "main");
    }

    #[test]
    fn full_config_parses() {
        let raw: DoclinkTomlConfig = toml::from_str(
            r#"
            bundle = "com.example.shapes"
            display-name = "Shapes"
            graphs = "graphs"
            primary-language = "swift"
            articles = ["GettingStarted"]
            tutorials = ["DrawingCircles"]
            "#,
        )
        .unwrap();
        assert_eq!(raw.bundle.as_deref(), Some("com.example.shapes"));
        assert_eq!(raw.articles, vec!["GettingStarted".to_string()]);
    }
}
