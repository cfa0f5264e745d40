use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;

use crate::collab::{Analyzer, Generator};
use crate::error::{PhotoboothError, Result};

/// `EX_TEMPFAIL` from sysexits.h; scripts use it to report throttling.
const EXIT_RATE_LIMITED: i32 = 75;

/// Values substituted into a command template.
#[derive(Debug, Default)]
struct Vars<'a> {
    image: &'a str,
    prompt: &'a str,
    name: &'a str,
    temp: &'a str,
}

fn render(template: &[String], vars: &Vars<'_>) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            arg.replace("{image}", vars.image)
                .replace("{prompt}", vars.prompt)
                .replace("{name}", vars.name)
                .replace("{temp}", vars.temp)
        })
        .collect()
}

async fn run(service: &'static str, argv: Vec<String>) -> Result<String> {
    let Some((program, args)) = argv.split_first() else {
        return Err(PhotoboothError::Config(format!("{service} command is empty")));
    };
    tracing::debug!(service, %program, "spawning collaborator");

    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| PhotoboothError::Collaborator {
            service,
            detail: format!("cannot run {program}: {e}"),
        })?;
    check_status(service, &output)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn check_status(service: &'static str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let code = output.status.code();
    if code == Some(EXIT_RATE_LIMITED) || stderr.to_lowercase().contains("rate limit") {
        return Err(PhotoboothError::RateLimited {
            service,
            detail: stderr,
        });
    }
    Err(PhotoboothError::Collaborator {
        service,
        detail: match code {
            Some(c) => format!("exit code {c}: {stderr}"),
            None => format!("terminated by signal: {stderr}"),
        },
    })
}

/// Runs an external program whose trimmed stdout is the directive.
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    template: Vec<String>,
    temp: String,
}

impl CommandAnalyzer {
    pub fn new(template: Vec<String>, temp: &Path) -> Self {
        Self {
            template,
            temp: temp.to_string_lossy().into_owned(),
        }
    }
}

#[async_trait]
impl Analyzer for CommandAnalyzer {
    async fn analyze(&self, image: &Path) -> Result<String> {
        let image = image.to_string_lossy();
        let vars = Vars {
            image: &image,
            temp: &self.temp,
            ..Vars::default()
        };
        let stdout = run("analysis", render(&self.template, &vars)).await?;
        let directive = stdout.trim();
        if directive.is_empty() {
            return Err(PhotoboothError::Collaborator {
                service: "analysis",
                detail: "empty directive".into(),
            });
        }
        Ok(directive.to_string())
    }
}

/// Runs an external program that prints the artifact path as its last line.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    template: Vec<String>,
    temp: String,
}

impl CommandGenerator {
    pub fn new(template: Vec<String>, temp: &Path) -> Self {
        Self {
            template,
            temp: temp.to_string_lossy().into_owned(),
        }
    }
}

#[async_trait]
impl Generator for CommandGenerator {
    async fn generate(
        &self,
        directive: &str,
        image: &Path,
        original_name: &str,
    ) -> Result<PathBuf> {
        let image = image.to_string_lossy();
        let vars = Vars {
            image: &image,
            prompt: directive,
            name: original_name,
            temp: &self.temp,
        };
        let stdout = run("generation", render(&self.template, &vars)).await?;
        let artifact = stdout
            .lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| PhotoboothError::Collaborator {
                service: "generation",
                detail: "no artifact path printed".into(),
            })?;
        if !artifact.is_file() {
            return Err(PhotoboothError::Collaborator {
                service: "generation",
                detail: format!("artifact {} does not exist", artifact.display()),
            });
        }
        Ok(artifact)
    }
}
