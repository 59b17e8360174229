//! Project-level configuration
//!
//! The traced project's `tsconfig.json` path aliases. Resolving an aliased
//! import (`@shared/util` -> `src/shared/util.ts`) shows up in traces as a
//! `findSourceFile` span, so we collect the alias targets and flag those spans.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;

use super::ConfigError;

/// Files checked for `compilerOptions.paths`, in order.
const CONFIG_FILES: [&str; 2] = ["tsconfig.json", "jsconfig.json"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsConfig {
    #[serde(default)]
    compiler_options: CompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
struct CompilerOptions {
    #[serde(default)]
    paths: IndexMap<String, Vec<String>>,
}

/// Path fragments targeted by the project's path aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMappings {
    /// Config file the fragments came from, if any was found.
    pub source: Option<PathBuf>,
    pub fragments: Vec<String>,
}

impl PathMappings {
    /// Load path mappings from `tsconfig.json` (or `jsconfig.json`) in `project_dir`.
    ///
    /// A project without either file has no mappings; that is not an error.
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let Some(config_path) = CONFIG_FILES
            .iter()
            .map(|name| project_dir.join(name))
            .find(|path| path.is_file())
        else {
            log::debug!("No tsconfig/jsconfig in {}", project_dir.display());
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        let fragments = parse_fragments(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.clone(),
            source,
        })?;

        log::debug!(
            "Loaded {} path mapping(s) from {}",
            fragments.len(),
            config_path.display()
        );
        Ok(Self {
            source: Some(config_path),
            fragments,
        })
    }
}

/// Extract alias target fragments from tsconfig contents.
pub fn parse_fragments(contents: &str) -> Result<Vec<String>, serde_json::Error> {
    let config: TsConfig = serde_json::from_str(&strip_jsonc(contents))?;

    let fragments: IndexSet<String> = config
        .compiler_options
        .paths
        .values()
        .flatten()
        .filter_map(|target| to_fragment(target))
        .collect();
    Ok(fragments.into_iter().collect())
}

/// `./src/shared/*` -> `src/shared`. Wildcard-only targets yield nothing.
fn to_fragment(target: &str) -> Option<String> {
    let target = target.trim();
    let target = target.strip_prefix("./").unwrap_or(target);
    let target = target
        .strip_suffix("/*")
        .or_else(|| target.strip_suffix('*'))
        .unwrap_or(target);
    (!target.is_empty()).then(|| target.to_string())
}

/// Strip `//` and `/* */` comments and trailing commas, which tsconfig allows
/// but JSON doesn't. String literals are left untouched.
///
/// Comments go first so a comma followed only by comments still counts as
/// trailing.
fn strip_jsonc(input: &str) -> String {
    strip_trailing_commas(&strip_comments(input))
}

fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek().copied()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                // Keep tokens on either side of the comment apart.
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    out
}

fn strip_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars.clone().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}' | ']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}
