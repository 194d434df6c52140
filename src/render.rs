//! Terminal and JSON rendering of resolution outcomes.
//!
//! Rendering sits outside the engine: it receives the resolved module and
//! every presentation setting (notably the command prefix) explicitly.

use colored::Colorize;
use serde::Serialize;

use crate::catalog::download_url;
use crate::error::ResolveError;
use crate::model::types::{Module, ModuleMatch, Resolution};

/// Options for rendering a search outcome.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Prefix placed before each command name.
    pub prefix: String,

    /// Commands listed before the list is cut off with "...".
    pub max_commands: usize,

    /// Emit ANSI colors.
    pub color: bool,

    /// Catalog API root for the download link; no link when `None`.
    pub download_base: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            prefix: ".".to_string(),
            max_commands: 8,
            color: false,
            download_base: None,
        }
    }
}

impl RenderOptions {
    fn bold(&self, s: &str) -> String {
        if self.color {
            s.bold().to_string()
        } else {
            s.to_string()
        }
    }

    fn accent(&self, s: &str) -> String {
        if self.color {
            s.cyan().to_string()
        } else {
            s.to_string()
        }
    }

    fn failure(&self, s: &str) -> String {
        if self.color {
            s.red().bold().to_string()
        } else {
            s.to_string()
        }
    }
}

/// Human-readable description of a found module.
pub fn render_found(module: &Module, query: &str, found: &ModuleMatch, opts: &RenderOptions) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Found the module {} by query: {}\n",
        opts.bold(&module.name),
        opts.bold(query)
    ));
    if let Some(field) = found.matched_field {
        out.push_str(&format!(
            "Found by: {} ({} stage)\n",
            field.label(),
            found.stage
        ));
    }
    let description = if module.description.trim().is_empty() {
        "No description"
    } else {
        module.description.as_str()
    };
    out.push_str(&format!("Description: {description}\n"));
    if let Some(dev) = module.developer.as_deref().filter(|d| !d.is_empty()) {
        out.push_str(&format!("Developer: @{dev}\n"));
    }

    if !module.commands.is_empty() {
        out.push('\n');
        for (i, cmd) in module.commands.iter().enumerate() {
            if i >= opts.max_commands {
                out.push_str("...\n");
                break;
            }
            let description = if cmd.description.trim().is_empty() {
                "No description"
            } else {
                cmd.description.as_str()
            };
            out.push_str(&format!(
                "{}. {} - {}\n",
                i + 1,
                opts.accent(&format!("{}{}", opts.prefix, cmd.command)),
                description
            ));
        }
    }

    if let Some(base) = &opts.download_base {
        out.push_str(&format!("\nDownload: {}\n", download_url(base, module.id)));
    }
    out
}

pub fn render_not_found(opts: &RenderOptions) -> String {
    format!("{}\n", opts.failure("Not found"))
}

/// User-facing text for a resolution error.
pub fn render_resolve_error(err: &ResolveError, opts: &RenderOptions) -> String {
    let text = match err {
        ResolveError::EmptyQuery => "No args".to_string(),
        ResolveError::MalformedQuery(_) => "Request too short / not found".to_string(),
        other => other.to_string(),
    };
    format!("{}\n", opts.failure(&text))
}

/// Machine-readable outcome for `--json`.
#[derive(Debug, Serialize)]
pub struct SearchReport<'a> {
    pub status: &'static str,
    pub query: &'a str,
    pub matcher: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<&'a Module>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> SearchReport<'a> {
    pub fn from_resolution(
        query: &'a str,
        matcher: &'static str,
        resolution: &Resolution,
        module: Option<&'a Module>,
    ) -> Self {
        match resolution {
            Resolution::Found(m) => Self {
                status: "found",
                query,
                matcher,
                module_id: Some(m.module_id),
                matched_field: m.matched_field.map(|f| f.as_str()),
                stage: Some(m.stage.as_str()),
                score: Some(m.score),
                module,
                error: None,
            },
            Resolution::NotFound => Self::empty("not_found", query, matcher, None),
        }
    }

    pub fn error(query: &'a str, matcher: &'static str, message: String) -> Self {
        Self::empty("error", query, matcher, Some(message))
    }

    fn empty(status: &'static str, query: &'a str, matcher: &'static str, error: Option<String>) -> Self {
        Self {
            status,
            query,
            matcher,
            module_id: None,
            matched_field: None,
            stage: None,
            score: None,
            module: None,
            error,
        }
    }
}
