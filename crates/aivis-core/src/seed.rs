use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Provider slugs accepted in seed files. Kept in sync with the provider
/// enum in `aivis-providers` (asserted by a test in `aivis-monitor`).
pub const KNOWN_PROVIDERS: &[&str] = &["openai", "anthropic", "gemini", "perplexity", "grok"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSeed {
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
    pub providers: Vec<String>,
    /// Defaults to true: seeded prompts are auto-monitored unless opted out.
    #[serde(default)]
    pub subscribed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandSeed {
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub prompts: Vec<PromptSeed>,
}

impl BrandSeed {
    /// Generate a URL-safe slug from the brand name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else if c == ' ' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|&c| c != '\0')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub brands: Vec<BrandSeed>,
}

/// Load and validate the seed configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_seed(path: &Path) -> Result<SeedFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let seed_file: SeedFile = serde_yaml::from_str(&content)?;

    validate_seed(&seed_file)?;

    Ok(seed_file)
}

fn validate_seed(seed_file: &SeedFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_slugs = HashSet::new();

    for brand in &seed_file.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        let lower_name = brand.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{}'",
                brand.name
            )));
        }

        let slug = brand.slug();
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand slug: '{}' (from brand '{}')",
                slug, brand.name
            )));
        }

        for prompt in &brand.prompts {
            if prompt.text.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "brand '{}' has a prompt with empty text",
                    brand.name
                )));
            }

            if prompt.providers.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "prompt '{}' lists no providers",
                    prompt.text
                )));
            }

            for provider in &prompt.providers {
                if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "prompt '{}' names unknown provider '{}'; known: {}",
                        prompt.text,
                        provider,
                        KNOWN_PROVIDERS.join(", ")
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brand(name: &str, prompts: Vec<PromptSeed>) -> BrandSeed {
        BrandSeed {
            name: name.to_string(),
            domain: None,
            prompts,
        }
    }

    fn prompt(text: &str, providers: &[&str]) -> PromptSeed {
        PromptSeed {
            text: text.to_string(),
            category: None,
            providers: providers.iter().map(|s| (*s).to_string()).collect(),
            subscribed: None,
        }
    }

    #[test]
    fn slug_simple_name() {
        let b = brand("Fieldstone Coffee", vec![]);
        assert_eq!(b.slug(), "fieldstone-coffee");
    }

    #[test]
    fn slug_special_characters() {
        let b = brand("Miller & Sons'", vec![]);
        assert_eq!(b.slug(), "miller-sons");
    }

    #[test]
    fn slug_accented_characters() {
        // Non-ASCII chars are stripped; no dash inserted between adjacent ASCII chars
        let b = brand("Café Brûlée", vec![]);
        assert_eq!(b.slug(), "caf-brle");
    }

    #[test]
    fn validate_rejects_empty_brand_name() {
        let seed = SeedFile {
            brands: vec![brand("  ", vec![])],
        };
        let err = validate_seed(&seed).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn validate_rejects_duplicate_name_case_insensitive() {
        let seed = SeedFile {
            brands: vec![brand("Acme", vec![]), brand("acme", vec![])],
        };
        let err = validate_seed(&seed).unwrap_err();
        assert!(err.to_string().contains("duplicate brand name"));
    }

    #[test]
    fn validate_rejects_unknown_provider() {
        let seed = SeedFile {
            brands: vec![brand("Acme", vec![prompt("best widgets?", &["copilot"])])],
        };
        let err = validate_seed(&seed).unwrap_err();
        assert!(err.to_string().contains("unknown provider 'copilot'"));
    }

    #[test]
    fn validate_rejects_prompt_without_providers() {
        let seed = SeedFile {
            brands: vec![brand("Acme", vec![prompt("best widgets?", &[])])],
        };
        let err = validate_seed(&seed).unwrap_err();
        assert!(err.to_string().contains("no providers"));
    }

    #[test]
    fn validate_accepts_valid_seed() {
        let seed = SeedFile {
            brands: vec![
                brand("Acme", vec![prompt("best widgets?", &["openai", "anthropic"])]),
                brand("Globex", vec![]),
            ],
        };
        assert!(validate_seed(&seed).is_ok());
    }

    #[test]
    fn load_seed_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("seed.yaml");
        assert!(
            path.exists(),
            "seed.yaml missing at {path:?} — required for this test"
        );
        let result = load_seed(&path);
        assert!(result.is_ok(), "failed to load seed.yaml: {result:?}");
        let seed = result.unwrap();
        assert!(!seed.brands.is_empty());
        assert!(seed.brands.iter().any(|b| !b.prompts.is_empty()));
    }
}
