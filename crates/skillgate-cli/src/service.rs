use crate::cli::{Command, OutputFormat};
use crate::config::Config;
use anyhow::Result;
use serde::Serialize;
use skillgate_engine::{Engine, SkillDirectories, SkillSource};
use skillgate_types::{Artifact, Budget, ComposedContext};
use std::path::PathBuf;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// One reviewed file in JSON output
#[derive(Debug, Serialize)]
struct ReviewOutput {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<ComposedContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Review service - wires config, skill discovery and the engine together
pub struct ReviewService {
    config: Config,
}

impl ReviewService {
    /// Create a new review service
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run a single command
    pub async fn run(self, command: Command) -> Result<()> {
        // Initialize logging
        skillgate_logging::init_logging(&self.config.logging.level, self.config.logging.format)?;

        info!(
            "Budget config: max_size={}, unit={:?}",
            self.config.budget.max_size, self.config.budget.unit
        );

        let sources = self.discover_sources()?;
        let engine = Engine::from_sources(sources)?.with_size_unit(self.config.budget.unit);
        info!("Registry loaded with {} skills", engine.registry().len());

        match command {
            Command::Review {
                files,
                budget,
                format,
            } => {
                let budget = Budget::new(budget.unwrap_or(self.config.budget.max_size));
                self.review(engine, files, budget, format).await
            }
            Command::List => {
                println!("{}", engine.registry().summary());
                Ok(())
            }
            Command::Check => {
                println!("{} skill(s) OK", engine.registry().len());
                Ok(())
            }
        }
    }

    /// Collect skill sources from every configured directory
    fn discover_sources(&self) -> Result<Vec<SkillSource>> {
        let mut directories = SkillDirectories::new();

        if self.config.skills.personal {
            directories = directories.with_personal_skills();
        }
        if self.config.skills.project {
            directories = directories.with_project_skills();
        }
        for dir in self.config.skill_directories() {
            directories = directories.add_directory(dir);
        }

        let sources = directories.discover()?;
        if sources.is_empty() {
            warn!(
                "No skills found in {} director(ies)",
                directories.directories().len()
            );
        }
        Ok(sources)
    }

    async fn review(
        &self,
        engine: Engine,
        files: Vec<PathBuf>,
        budget: Budget,
        format: OutputFormat,
    ) -> Result<()> {
        let outputs = review_files(engine, files, budget).await?;
        let failures = outputs.iter().filter(|o| o.error.is_some()).count();

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outputs)?),
            OutputFormat::Text => print!("{}", render_text(&outputs)),
        }

        if failures > 0 {
            anyhow::bail!("{} of {} file(s) failed", failures, outputs.len());
        }
        Ok(())
    }
}

/// Read and review every file; read and review failures stay with their file
async fn review_files(engine: Engine, files: Vec<PathBuf>, budget: Budget) -> Result<Vec<ReviewOutput>> {
    let reads = read_artifacts(files).await?;

    let batch: Vec<Artifact> = reads
        .iter()
        .filter_map(|(_, read)| read.as_ref().ok().cloned())
        .collect();
    let mut reviewed = tokio::task::spawn_blocking(move || engine.review_batch(&batch, budget))
        .await?
        .into_iter();

    let mut outputs = Vec::with_capacity(reads.len());
    for (path, read) in reads {
        let result = match read {
            Ok(_) => reviewed
                .next()
                .ok_or_else(|| anyhow::anyhow!("Missing review result for {}", path))?
                .map_err(|e| e.to_string()),
            Err(e) => Err(e),
        };

        match result {
            Ok(context) => outputs.push(ReviewOutput {
                path,
                context: Some(context),
                error: None,
            }),
            Err(e) => {
                error!("Failed to review {}: {}", path, e);
                outputs.push(ReviewOutput {
                    path,
                    context: None,
                    error: Some(e),
                });
            }
        }
    }
    Ok(outputs)
}

/// Read files concurrently, keeping input order. A file that cannot be read
/// is returned as an error for that file only.
async fn read_artifacts(files: Vec<PathBuf>) -> Result<Vec<(String, std::result::Result<Artifact, String>)>> {
    let mut set = JoinSet::new();
    for (index, path) in files.into_iter().enumerate() {
        set.spawn(async move {
            let display = path.display().to_string();
            let read = tokio::fs::read_to_string(&path)
                .await
                .map(|content| Artifact::new(display.clone(), content))
                .map_err(|e| format!("Failed to read {}: {}", display, e));
            (index, display, read)
        });
    }

    let mut reads = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        reads.push(joined?);
    }
    reads.sort_by_key(|(index, _, _)| *index);
    Ok(reads
        .into_iter()
        .map(|(_, path, read)| (path, read))
        .collect())
}

fn render_text(outputs: &[ReviewOutput]) -> String {
    let mut text = String::new();
    for output in outputs {
        text.push_str(&format!("# {}\n\n", output.path));
        match (&output.context, &output.error) {
            (Some(context), _) if context.text.is_empty() => {
                text.push_str("(no matching skills)\n\n");
            }
            (Some(context), _) => {
                text.push_str(&context.text);
                text.push_str(&format!(
                    "\n<!-- {} module(s), {}/{} used -->\n\n",
                    context.manifest.included.len(),
                    context.manifest.total_size,
                    context.manifest.budget
                ));
            }
            (None, Some(e)) => text.push_str(&format!("error: {}\n\n", e)),
            (None, None) => {}
        }
    }
    text
}
