//! Subcommand implementations.
//!
//! Every command writes its report to `out` so it can be captured in tests.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, bail, Context as _};
use tracing::{debug, info, warn};
use twoway_sql_core::{Comparison, ParametersContext, Template};

/// How `render` prints its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// SQL on the first line, one bind per following line.
    #[default]
    Text,
    /// The evaluated collection as pretty JSON.
    Json,
}

fn load_template(path: &Path) -> anyhow::Result<Template> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read template {}", path.display()))?;
    debug!(path = %path.display(), len = source.len(), "Loaded template");
    Template::parse(&source).with_context(|| format!("invalid template {}", path.display()))
}

/// Builds the evaluation context from a JSON parameters file and
/// `NAME=OP` operator overrides.
fn load_context(params: Option<&Path>, operators: &[String]) -> anyhow::Result<ParametersContext> {
    let mut context = match params {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read parameters {}", path.display()))?;
            let json: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("invalid JSON in {}", path.display()))?;
            ParametersContext::from_json(json).ok_or_else(|| {
                anyhow!("parameters in {} must be a JSON object", path.display())
            })?
        }
        None => ParametersContext::new(),
    };

    for entry in operators {
        let (name, operator) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("operator override '{entry}' is not NAME=OP"))?;
        let comparison: Comparison = operator.parse()?;
        context.set_operator(name.trim(), comparison);
    }
    Ok(context)
}

/// Parses every file, printing one line per file.
///
/// Fails if any file does not parse.
pub fn check(files: &[impl AsRef<Path>], out: &mut impl Write) -> anyhow::Result<()> {
    let mut failed = 0;
    for file in files {
        let path = file.as_ref();
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read template {}", path.display()))?;
        match Template::parse(&source) {
            Ok(template) => {
                writeln!(out, "{}: ok ({} nodes)", path.display(), template.nodes().len())?;
            }
            Err(err) => {
                failed += 1;
                warn!(path = %path.display(), "Template failed to parse");
                writeln!(
                    out,
                    "{}:{}:{}: {}",
                    path.display(),
                    err.line,
                    err.column,
                    err.kind
                )?;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} templates failed to parse", files.len());
    }
    info!("Checked {} templates", files.len());
    Ok(())
}

/// Evaluates a template and prints the result.
pub fn render(
    file: &Path,
    params: Option<&Path>,
    operators: &[String],
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let template = load_template(file)?;
    let context = load_context(params, operators)?;
    let collection = template
        .evaluate(&context)
        .with_context(|| format!("failed to render {}", file.display()))?;

    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&collection)?)?;
        }
        OutputFormat::Text => {
            writeln!(out, "{}", collection.sql())?;
            for (i, bind) in collection.binds().iter().enumerate() {
                let value = serde_json::to_string(&bind.value)?;
                match &bind.sql_type {
                    Some(sql_type) => {
                        writeln!(out, "  ${} {} = {value} ({sql_type})", i + 1, bind.name)?;
                    }
                    None => writeln!(out, "  ${} {} = {value}", i + 1, bind.name)?,
                }
            }
        }
    }
    Ok(())
}

/// Prints the template with every directive removed.
pub fn sample(file: &Path, out: &mut impl Write) -> anyhow::Result<()> {
    let template = load_template(file)?;
    writeln!(out, "{}", template.to_sample_sql())?;
    Ok(())
}

/// Prints the parameter names, one per line.
pub fn params(file: &Path, out: &mut impl Write) -> anyhow::Result<()> {
    let template = load_template(file)?;
    for name in template.parameter_names() {
        writeln!(out, "{name}")?;
    }
    Ok(())
}
