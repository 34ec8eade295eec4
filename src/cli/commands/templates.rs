//! Templates command implementation
//!
//! Lists, shows, adds and removes order templates kept in the template store.

use super::shared::{RunStats, open_template_store, setup_logging};
use crate::app::models::Template;
use crate::app::services::template_store::{TemplateStore, load_template_file};
use crate::cli::args::{TemplateAction, TemplatesArgs};
use crate::config::OutputFormat;
use crate::{Error, Result};
use colored::*;
use tracing::{debug, info};

/// Templates command runner
pub async fn run_templates(args: TemplatesArgs) -> Result<RunStats> {
    setup_logging(args.get_log_level(), false)?;

    let store = open_template_store(args.templates_dir.as_deref())?;
    debug!("Template store: {}", store.dir().display());

    let output = execute(&store, &args.action, args.output_format)?;
    println!("{}", output);

    Ok(RunStats::default())
}

/// Run one template action and render its output
fn execute(store: &TemplateStore, action: &TemplateAction, format: OutputFormat) -> Result<String> {
    match action {
        TemplateAction::List => {
            let templates = store.list()?;
            info!("Found {} templates in {}", templates.len(), store.dir().display());
            match format {
                OutputFormat::Human => Ok(render_list(&templates)),
                OutputFormat::Json => to_json(&templates),
            }
        }
        TemplateAction::Show { name } => {
            let template = store.get(name)?;
            match format {
                OutputFormat::Human => toml::to_string_pretty(&template)
                    .map_err(|e| Error::toml(name.clone(), e.to_string())),
                OutputFormat::Json => to_json(&template),
            }
        }
        TemplateAction::Add { file } => {
            let template = load_template_file(file)?;
            let path = store.save(&template)?;
            Ok(format!(
                "{} '{}' -> {}",
                "Saved template".bright_green(),
                template.name,
                path.display()
            ))
        }
        TemplateAction::Remove { name } => {
            store.delete(name)?;
            Ok(format!("{} '{}'", "Removed template".bright_green(), name))
        }
    }
}

fn render_list(templates: &[Template]) -> String {
    if templates.is_empty() {
        return "No templates stored".to_string();
    }

    let mut lines = vec![format!("{}", "Stored templates:".bright_green().bold())];
    for template in templates {
        let matchpoints: Vec<&str> = template
            .matchpoints
            .keys()
            .into_iter()
            .map(|m| m.as_str())
            .collect();
        lines.push(format!(
            "  {} [{}] {} fields",
            template.name.bright_white().bold(),
            matchpoints.join(", "),
            template.fields.len()
        ));
    }
    lines.join("\n")
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::json("templates", "Failed to serialize templates", e))
}
