//! The generation pipeline: request in, persisted article + terminal job
//! status out.
//!
//! One run validates the request, produces an outline when none was given,
//! generates the body in two ordered halves, derives a summary, persists the
//! article and writes the terminal job status - reporting progress
//! milestones along the way. Each generation step is retried on transient
//! provider failures; the whole run races a wall-clock deadline.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::GenerationConfig;
use crate::domains::articles::ArticleStore;
use crate::kernel::jobs::{progress, GenerationRequest, Job, JobResult, JobStatus, JobStore};

use super::error::GenerationError;
use super::generator::TextGenerator;

/// Characters of the first half quoted in the second-half prompt.
const CONTINUITY_EXCERPT_CHARS: usize = 200;

/// Tunables for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Overall wall-clock deadline per job
    pub timeout: Duration,
    /// Attempt cap per generation step
    pub max_retries: u32,
    /// Fixed delay between attempts
    pub retry_delay: Duration,
    /// Output bound per generation call
    pub max_tokens: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

impl From<&GenerationConfig> for PipelineConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            timeout: config.timeout,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            max_tokens: config.max_tokens,
        }
    }
}

/// Turns generation requests into finished articles.
pub struct Pipeline {
    generator: Arc<dyn TextGenerator>,
    articles: Arc<dyn ArticleStore>,
    jobs: Arc<dyn JobStore>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        articles: Arc<dyn ArticleStore>,
        jobs: Arc<dyn JobStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            generator,
            articles,
            jobs,
            config,
        }
    }

    /// Run the full pipeline for one job, racing the configured deadline.
    ///
    /// A terminal status is always written before this returns: on success
    /// the completion write happens inside [`Self::execute`]; every failure
    /// path (deadline included) goes through [`Self::record_failure`].
    pub async fn run(&self, job: &Job) -> Result<JobResult, GenerationError> {
        let outcome = match tokio::time::timeout(self.config.timeout, self.execute(job)).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    job_id = %job.id,
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "generation deadline elapsed"
                );
                Err(GenerationError::Timeout(self.config.timeout))
            }
        };

        if let Err(generation_error) = &outcome {
            self.record_failure(job, generation_error).await;
        }
        outcome
    }

    async fn execute(&self, job: &Job) -> Result<JobResult, GenerationError> {
        let data = &job.data;
        validate(data)?;

        info!(
            job_id = %job.id,
            title = %data.title,
            category = %data.category,
            keyword_count = data.keywords.len(),
            outline_len = data.outline.len(),
            "starting article generation"
        );
        self.report_progress(&job.id, progress::STARTED).await?;

        let outline = if data.outline.is_empty() {
            let outline = self.generate_outline(job).await?;
            self.report_progress(&job.id, progress::OUTLINE_READY).await?;
            outline
        } else {
            data.outline.clone()
        };

        let (first_sections, second_sections) = split_outline(&outline);

        let first_half = self
            .generate_step(job, "first half", &first_half_prompt(data, &first_sections))
            .await?;
        self.report_progress(&job.id, progress::FIRST_HALF_DONE).await?;

        let second_half = self
            .generate_step(
                job,
                "second half",
                &second_half_prompt(data, &first_half, &second_sections),
            )
            .await?;

        let content = format!("{}\n\n{}", first_half.trim(), second_half.trim());
        let summary = derive_summary(data);

        self.articles
            .complete(&job.id, &content, &summary)
            .await
            .map_err(|e| GenerationError::SaveFailed(e.to_string()))?;

        let result = JobResult {
            title: data.title.clone(),
            content,
            summary,
        };
        match self
            .jobs
            .update_status(
                &job.id,
                JobStatus::Completed,
                progress::COMPLETED,
                Some(result.clone()),
                None,
            )
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => warn!(job_id = %job.id, "job record missing at completion"),
            Err(e) => {
                return Err(GenerationError::Unexpected(format!(
                    "failed to record completion: {e}"
                )))
            }
        }

        info!(
            job_id = %job.id,
            content_len = result.content.len(),
            "article generation finished"
        );
        Ok(result)
    }

    /// Produce an outline from title/category/keywords.
    async fn generate_outline(&self, job: &Job) -> Result<Vec<String>, GenerationError> {
        let text = self
            .generate_step(job, "outline", &outline_prompt(&job.data))
            .await?;
        let outline: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        if outline.is_empty() {
            return Err(GenerationError::ContentGenerationFailed);
        }
        info!(job_id = %job.id, sections = outline.len(), "outline generated");
        Ok(outline)
    }

    /// One generation call under the retry policy.
    ///
    /// Transient provider failures retry up to `max_retries` attempts with a
    /// fixed delay; quota and credential failures are terminal immediately.
    /// Exhausted retries surface as `ContentGenerationFailed`.
    async fn generate_step(
        &self,
        job: &Job,
        step: &str,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.generator.generate(prompt, self.config.max_tokens).await {
                Ok(text) => return Ok(text),
                Err(provider_error) => {
                    let classified = GenerationError::from(provider_error);
                    if !classified.is_retryable() {
                        error!(
                            job_id = %job.id,
                            step,
                            attempt,
                            error = %classified,
                            "generation step failed terminally"
                        );
                        return Err(classified);
                    }
                    if attempt >= self.config.max_retries {
                        error!(
                            job_id = %job.id,
                            step,
                            attempt,
                            error = %classified,
                            "generation step exhausted retries"
                        );
                        return Err(GenerationError::ContentGenerationFailed);
                    }
                    warn!(
                        job_id = %job.id,
                        step,
                        attempt,
                        max_retries = self.config.max_retries,
                        error = %classified,
                        "generation step failed, retrying"
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            }
        }
    }

    async fn report_progress(&self, job_id: &str, progress: u8) -> Result<(), GenerationError> {
        match self
            .jobs
            .update_status(job_id, JobStatus::Running, progress, None, None)
            .await
        {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(GenerationError::Unexpected(format!(
                "job {job_id} disappeared during progress update"
            ))),
            Err(e) => Err(GenerationError::Unexpected(format!(
                "failed to update progress: {e}"
            ))),
        }
    }

    /// Record a failure on both the article and the job.
    ///
    /// Progress resets to 0 on a forced failure. The article write comes
    /// first so a crash between the two still leaves an auditable record;
    /// an article-store failure here is logged, never silently dropped.
    async fn record_failure(&self, job: &Job, generation_error: &GenerationError) {
        let message = generation_error.user_message();
        error!(job_id = %job.id, error = %generation_error, "generation failed");

        if let Err(e) = self.articles.mark_error(&job.id, &message).await {
            warn!(job_id = %job.id, error = %e, "failed to record article error state");
        }
        match self
            .jobs
            .update_status(&job.id, JobStatus::Failed, 0, None, Some(message))
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => warn!(job_id = %job.id, "job record missing during failure write"),
            Err(e) => error!(job_id = %job.id, error = %e, "failed to write terminal job status"),
        }
    }
}

fn validate(data: &GenerationRequest) -> Result<(), GenerationError> {
    if data.title.trim().is_empty() {
        return Err(GenerationError::Validation("title is required".to_string()));
    }
    if !data.keywords.iter().any(|keyword| !keyword.trim().is_empty()) {
        return Err(GenerationError::Validation(
            "at least one keyword is required".to_string(),
        ));
    }
    Ok(())
}

/// Split the outline into the two generation passes, front-loading the
/// extra section on odd counts.
fn split_outline(outline: &[String]) -> (Vec<String>, Vec<String>) {
    let midpoint = outline.len().div_ceil(2);
    (outline[..midpoint].to_vec(), outline[midpoint..].to_vec())
}

fn derive_summary(data: &GenerationRequest) -> String {
    format!(
        "An article about {}. Covers {}.",
        data.title,
        data.keywords.join(", ")
    )
}

fn outline_prompt(data: &GenerationRequest) -> String {
    format!(
        "Create a detailed outline for an article about {}.\n\
         Category: {}\n\
         Keywords: {}\n\n\
         The outline should include:\n\
         1. Introduction\n\
         2. 3-4 main sections\n\
         3. Conclusion",
        data.title,
        data.category,
        data.keywords.join(", ")
    )
}

fn first_half_prompt(
    data: &GenerationRequest,
    sections: &[String],
) -> String {
    let audience = data
        .keywords
        .first()
        .map(String::as_str)
        .unwrap_or("general");
    format!(
        "Write the first half of an article titled \"{}\" for readers interested in {}.\n\n\
         Follow this outline, including concrete information and practical advice:\n\n{}",
        data.title,
        audience,
        sections.join("\n")
    )
}

fn second_half_prompt(
    data: &GenerationRequest,
    first_half: &str,
    sections: &[String],
) -> String {
    let excerpt: String = first_half.chars().take(CONTINUITY_EXCERPT_CHARS).collect();
    format!(
        "Write the second half of \"{}\", continuing the first half.\n\
         The first half begins:\n\n{}...\n\n\
         Follow this outline so the second half flows naturally from the first:\n\n{}",
        data.title,
        excerpt,
        sections.join("\n")
    )
}
