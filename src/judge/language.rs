use crate::backend::toolchain::Toolchain;
use crate::config::types::LanguageId;
use serde::{Deserialize, Serialize};

/// Compile/run envelope for one language. Immutable once the table is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LanguageProfile {
    pub id: LanguageId,
    /// Short key, e.g. "python"
    pub name: String,
    pub display_name: String,
    /// Source file extension without the dot
    pub extension: String,
    /// Canonical source file name; `solution.<extension>` when unset
    #[serde(default)]
    pub source_name: Option<String>,
    /// Compile command template, absent for interpreted languages
    #[serde(default)]
    pub compile: Option<String>,
    /// Run command template
    pub run: String,
    /// Container image (isolated backend only)
    #[serde(default)]
    pub image: Option<String>,
}

/// Values substituted into command templates for one workspace.
///
/// Paths must already be quoted for the shell that will run the command.
pub struct CommandContext<'a> {
    pub file: &'a str,
    pub dir: &'a str,
    pub exe: &'a str,
    pub toolchain: &'a Toolchain,
}

impl LanguageProfile {
    pub fn source_filename(&self) -> String {
        self.source_name
            .clone()
            .unwrap_or_else(|| format!("solution.{}", self.extension))
    }

    pub fn requires_compilation(&self) -> bool {
        self.compile.is_some()
    }

    pub fn compile_command(&self, ctx: &CommandContext<'_>) -> Option<String> {
        self.compile.as_deref().map(|template| render(template, ctx))
    }

    pub fn run_command(&self, ctx: &CommandContext<'_>) -> String {
        render(&self.run, ctx)
    }
}

fn render(template: &str, ctx: &CommandContext<'_>) -> String {
    template
        .replace("{python}", &ctx.toolchain.python)
        .replace("{cc}", &ctx.toolchain.cc)
        .replace("{cxx}", &ctx.toolchain.cxx)
        .replace("{file}", ctx.file)
        .replace("{dir}", ctx.dir)
        .replace("{exe}", ctx.exe)
}
