//! Wrapping script files as macros that recreate them at run time.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use globset::Glob;
use minijinja::{Environment, context};

use crate::domain::literal;
use crate::domain::model::{SourceFile, WrapperUnit};
use crate::infra::config::Wrappers;
use crate::infra::fs::Staging;

const WRAPPER_TEMPLATE_NAME: &str = "wrapper";

/// Renders [`WrapperUnit`]s and stages one wrapper file per script.
pub struct WrapperGenerator {
    env: Environment<'static>,
    settings: Wrappers,
}

impl WrapperGenerator {
    /// Create a generator with the built-in wrapper template loaded.
    pub fn new(settings: Wrappers) -> Result<Self> {
        Ok(Self {
            env: default_environment()?,
            settings,
        })
    }

    /// Derive the wrapper for one script file.
    pub fn unit_for(&self, source: &SourceFile) -> Result<WrapperUnit> {
        let basename = source
            .basename()
            .with_context(|| format!("invalid script file name {}", source.path.display()))?;
        let stem = source
            .stem()
            .with_context(|| format!("invalid script file name {}", source.path.display()))?;

        Ok(WrapperUnit {
            name: format!("{}{}", self.settings.prefix, stem),
            basename: basename.to_owned(),
            statements: literal::put_statements(source.lines()),
        })
    }

    /// File name of the generated wrapper, `<name>.<extension>`.
    pub fn file_name(&self, unit: &WrapperUnit) -> String {
        format!("{}.{}", unit.name, self.settings.extension)
    }

    pub fn render(&self, unit: &WrapperUnit) -> Result<String> {
        let template = self
            .env
            .get_template(WRAPPER_TEMPLATE_NAME)
            .map_err(|err| anyhow!("wrapper template unavailable: {err}"))?;
        template
            .render(context! {
                file_name => self.file_name(unit),
                name => &unit.name,
                basename => &unit.basename,
                statements => &unit.statements,
            })
            .map_err(|err| anyhow!("failed to render wrapper '{}': {err}", unit.name))
    }

    /// Stage a wrapper beside every script in the source directory. Returns the
    /// staged wrapper paths.
    pub fn stage_all(&self, staging: &mut Staging) -> Result<Vec<PathBuf>> {
        let dir = Path::new(&self.settings.source_dir);
        let matcher = Glob::new(&self.settings.script_glob)
            .with_context(|| format!("invalid script pattern '{}'", self.settings.script_glob))?
            .compile_matcher();

        let scripts = staging.list(dir, &matcher)?;
        let mut staged = Vec::with_capacity(scripts.len());
        for script in scripts {
            let path = dir.join(&script);
            let source = SourceFile::new(path.clone(), staging.read(&path)?);
            let unit = self.unit_for(&source)?;
            let rendered = self.render(&unit)?;
            let output = dir.join(self.file_name(&unit));
            tracing::debug!(
                script = %path.display(),
                wrapper = %output.display(),
                lines = unit.statements.len(),
                "wrapped script"
            );
            staging.stage(output.clone(), rendered);
            staged.push(output);
        }
        Ok(staged)
    }
}

fn default_environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.add_template(WRAPPER_TEMPLATE_NAME, WRAPPER_TEMPLATE)
        .map_err(|err| anyhow!("failed to register wrapper template: {err}"))?;
    Ok(env)
}

const WRAPPER_TEMPLATE: &str = r#"/**
  @file {{ file_name }}
  @brief Creates the {{ basename }} file
  @details Writes {{ basename }} to the work directory
  Usage:

      %{{ name }}()

**/

%macro {{ name }}();
data _null_;
  file "%sysfunc(pathname(work))/{{ basename }}";
{% for statement in statements %}
{{ statement }}
{% endfor %}
run;
%mend;
"#;
