use crate::backend::{self, toolchain, DockerBackend, ExecutionBackend};
use crate::config::loader::{ExecutorMode, JudgeConfig};
use crate::config::types::{ExecutionRequest, LanguageId};
use crate::judge::language::{CommandContext, LanguageProfile};
use crate::judge::{InMemoryRepository, JudgeService, LanguageTable, ProblemFile};
use crate::safety::workspace::WorkspaceRoot;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Workspaces older than this are leftovers from a crashed run
const STALE_WORKSPACE_AGE: Duration = Duration::from_secs(60 * 60);

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./judge.json, or built-in defaults when absent)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override executor.mode from the config file
    #[arg(long, global = true, value_enum)]
    executor: Option<ExecutorMode>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Judge a source file against every test case of a problem file
    Submit {
        /// Problem file (JSON: problem + test_cases)
        #[arg(long)]
        problem: PathBuf,
        /// Language id (see `languages`)
        #[arg(long)]
        language: LanguageId,
        /// Source file to judge
        #[arg(long)]
        source: PathBuf,
    },
    /// Compile and run a source file once
    Execute {
        #[arg(long)]
        language: LanguageId,
        #[arg(long)]
        source: PathBuf,
        /// File fed to the program's stdin
        #[arg(long)]
        stdin: Option<PathBuf>,
        /// Wall-clock limit in milliseconds
        #[arg(long, default_value_t = 2000)]
        time_ms: u64,
        /// Memory limit in KB (container backend only)
        #[arg(long, default_value_t = 262_144)]
        memory_kb: u64,
    },
    /// List supported languages
    Languages,
    /// Check that the selected backend's toolchains are installed
    CheckDeps {
        /// Show detailed version information
        #[arg(long, short)]
        verbose: bool,
    },
}

pub fn run() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => JudgeConfig::load_from_file(path)?,
        None => JudgeConfig::load_default()?,
    };
    if let Some(mode) = cli.executor {
        config.executor.mode = mode;
    }
    let languages = Arc::new(config.language_table()?);

    match cli.command {
        Commands::Submit {
            problem,
            language,
            source,
        } => {
            let problem_file = ProblemFile::load(&problem)?;
            let source_code = read_file(&source)?;
            sweep_workspaces(&config);

            let repository = Arc::new(InMemoryRepository::new());
            let problem_id = repository.insert_problem_file(problem_file)?;
            let backend = backend::from_config(&config, languages.clone());
            let service = JudgeService::new(backend, languages, repository);

            let report = service.submit_code(problem_id, language, &source_code)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Execute {
            language,
            source,
            stdin,
            time_ms,
            memory_kb,
        } => {
            let source_code = read_file(&source)?;
            let input = match stdin {
                Some(path) => read_file(&path)?,
                None => String::new(),
            };
            sweep_workspaces(&config);

            let backend = backend::from_config(&config, languages);
            if !backend.is_available() {
                anyhow::bail!("{} execution backend is not available", backend.kind());
            }
            let request = ExecutionRequest::new(source_code, language, input, time_ms, memory_kb);
            let result = backend.execute(&request);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Languages => {
            for (id, name) in languages.display_names() {
                println!("{:>4}  {}", id, name);
            }
        }
        Commands::CheckDeps { verbose } => match config.executor.mode {
            ExecutorMode::Local => check_language_dependencies(&languages, verbose)?,
            ExecutorMode::Docker => check_container_runtime(&config, languages, verbose)?,
        },
    }

    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn sweep_workspaces(config: &JudgeConfig) {
    let root = WorkspaceRoot::new(config.temp_root());
    match root.sweep_stale(STALE_WORKSPACE_AGE) {
        Ok(0) => {}
        Ok(cleaned) => log::info!("Removed {} stale workspace(s)", cleaned),
        Err(e) => log::warn!("Stale workspace sweep failed: {}", e),
    }
}

/// Host programs a profile invokes, compiled binaries excluded
fn required_programs(profile: &LanguageProfile) -> Vec<String> {
    const EXE_MARKER: &str = "{exe}";
    let ctx = CommandContext {
        file: "source",
        dir: ".",
        exe: EXE_MARKER,
        toolchain: &toolchain::HOST,
    };

    let mut programs = Vec::new();
    let commands = profile
        .compile_command(&ctx)
        .into_iter()
        .chain(std::iter::once(profile.run_command(&ctx)));
    for command in commands {
        if let Some(program) = command.split_whitespace().next() {
            if program != EXE_MARKER && !programs.iter().any(|p| p == program) {
                programs.push(program.to_string());
            }
        }
    }
    programs
}

fn version_flag(program: &str) -> &'static str {
    // The JDK tools only know the single-dash spelling
    if program == "java" || program == "javac" {
        "-version"
    } else {
        "--version"
    }
}

fn check_language_dependencies(languages: &LanguageTable, verbose: bool) -> Result<()> {
    use std::process::Command;

    println!("🔍 Checking language dependencies...");
    println!();

    let mut missing_languages = Vec::new();

    for profile in languages.iter() {
        let mut lang_ok = true;
        let mut versions = Vec::new();

        for program in required_programs(profile) {
            match Command::new(&program).arg(version_flag(&program)).output() {
                Ok(output) if output.status.success() => {
                    let version_info = if !output.stdout.is_empty() {
                        String::from_utf8_lossy(&output.stdout)
                    } else {
                        String::from_utf8_lossy(&output.stderr)
                    }
                    .lines()
                    .next()
                    .unwrap_or("")
                    .to_string();
                    versions.push(format!("  {} -> {}", program, version_info.trim()));
                }
                Ok(_) => {
                    lang_ok = false;
                    versions.push(format!("  {} -> FAILED", program));
                }
                Err(_) => {
                    lang_ok = false;
                    versions.push(format!("  {} -> NOT FOUND", program));
                }
            }
        }

        if lang_ok {
            println!("✅ [{}] {} - OK", profile.id, profile.display_name);
        } else {
            println!("❌ [{}] {} - MISSING", profile.id, profile.display_name);
            missing_languages.push(profile.display_name.clone());
        }
        if verbose {
            for version in versions {
                println!("{}", version);
            }
            println!();
        }
    }

    println!();
    if missing_languages.is_empty() {
        println!("🎉 All language dependencies are installed!");
        if verbose {
            println!();
            println!("💡 Usage example:");
            println!("  judge execute --language 71 --source solution.py --stdin input.txt");
        }
        Ok(())
    } else {
        anyhow::bail!(
            "Missing language dependencies: {}",
            missing_languages.join(", ")
        )
    }
}

fn check_container_runtime(
    config: &JudgeConfig,
    languages: Arc<LanguageTable>,
    verbose: bool,
) -> Result<()> {
    println!("🔍 Checking container runtime ({})...", config.docker.binary);
    println!();

    let images: Vec<(String, Option<String>)> = languages
        .iter()
        .map(|p| (p.display_name.clone(), p.image.clone()))
        .collect();
    let backend = DockerBackend::from_config(config, languages);
    if !backend.is_available() {
        anyhow::bail!(
            "Container runtime is not reachable; check that `{} info` succeeds",
            config.docker.binary
        );
    }
    println!("✅ Container runtime - OK");

    let mut missing = Vec::new();
    for (name, image) in &images {
        match image {
            Some(image) => {
                if verbose {
                    println!("  {} -> {}", name, image);
                }
            }
            None => missing.push(name.clone()),
        }
    }

    if missing.is_empty() {
        println!("🎉 Every language has a container image configured");
        Ok(())
    } else {
        anyhow::bail!("Languages without a container image: {}", missing.join(", "))
    }
}
