//! Generation pipeline behavior: retry policy, deadline, terminal writes.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{
    request_without_outline, sample_request, FailingGenerator, FixedGenerator, StalledGenerator,
    TestHarness,
};
use server_core::domains::articles::{ArticleStatus, ArticleStore};
use server_core::kernel::generation::{GeneratorError, PipelineConfig};
use server_core::kernel::jobs::{poll_until_terminal, JobStatus, JobStore, PollOutcome};

#[tokio::test]
async fn test_end_to_end_completion_with_explicit_outline() {
    let harness = TestHarness::new();
    let generator = Arc::new(FixedGenerator::new("Generated section text."));
    let pipeline = harness.pipeline(generator.clone());

    let job = harness.submit(sample_request()).await;
    let result = pipeline.run(&job).await.expect("pipeline should succeed");

    assert_eq!(result.title, "Example");
    assert!(!result.content.is_empty());
    assert!(!result.summary.is_empty());

    let settled = harness.jobs.get(&job.id).await.unwrap().expect("job kept");
    assert_eq!(settled.status, JobStatus::Completed);
    assert_eq!(settled.progress, 100);
    let stored = settled.result.expect("completed job carries its result");
    assert_eq!(stored.title, "Example");
    assert!(!stored.content.is_empty());
    assert!(settled.error.is_none());

    // Two body halves, no outline call
    assert_eq!(generator.calls(), 2);

    // The article moved to completed alongside the job
    let article = harness
        .articles
        .get(&job.id)
        .await
        .unwrap()
        .expect("article kept");
    assert_eq!(article.status, ArticleStatus::Completed);
    assert_eq!(article.content, stored.content);

    assert_eq!(harness.jobs.pending_count().await.unwrap(), 0);
    assert_eq!(harness.jobs.completed_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_missing_outline_adds_one_generation_call() {
    let harness = TestHarness::new();
    let generator = Arc::new(FixedGenerator::new("1. Introduction\n2. Body\n3. Conclusion"));
    let pipeline = harness.pipeline(generator.clone());

    let job = harness.submit(request_without_outline()).await;
    pipeline.run(&job).await.expect("pipeline should succeed");

    // Outline + first half + second half
    assert_eq!(generator.calls(), 3);
}

#[tokio::test]
async fn test_progress_is_monotone_until_terminal() {
    let harness = TestHarness::new();
    let generator =
        Arc::new(FixedGenerator::new("text").with_delay(Duration::from_millis(20)));
    let pipeline = harness.pipeline(generator);

    let job = harness.submit(sample_request()).await;
    let job_id = job.id.clone();
    let run = tokio::spawn(async move { pipeline.run(&job).await });

    let mut observed = Vec::new();
    loop {
        let snapshot = harness
            .jobs
            .get(&job_id)
            .await
            .unwrap()
            .expect("job exists");
        observed.push(snapshot.progress);
        if snapshot.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    run.await.unwrap().expect("pipeline should succeed");

    assert!(
        observed.windows(2).all(|pair| pair[0] <= pair[1]),
        "progress regressed: {observed:?}"
    );
    assert_eq!(*observed.last().unwrap(), 100);
}

#[tokio::test]
async fn test_quota_failure_short_circuits_without_retry_delay() {
    let harness = TestHarness::new();
    let generator = Arc::new(FailingGenerator::new(GeneratorError::RateLimited(
        "429".to_string(),
    )));
    // A long retry delay proves the quota path never sleeps
    let pipeline = harness.pipeline_with_config(
        generator.clone(),
        PipelineConfig {
            retry_delay: Duration::from_secs(5),
            ..TestHarness::fast_config()
        },
    );

    let job = harness.submit(sample_request()).await;
    let started = Instant::now();
    let error = pipeline.run(&job).await.expect_err("quota must fail the job");
    assert!(started.elapsed() < Duration::from_secs(1));

    assert_eq!(generator.calls(), 1);
    assert!(error.user_message().contains("quota"));

    let settled = harness.jobs.get(&job.id).await.unwrap().expect("job kept");
    assert_eq!(settled.status, JobStatus::Failed);
    assert_eq!(settled.progress, 0);
    assert!(settled.error.expect("failure message").contains("quota"));
    assert!(settled.result.is_none());
}

#[tokio::test]
async fn test_transient_failures_retry_until_exhaustion() {
    let harness = TestHarness::new();
    let generator = Arc::new(FailingGenerator::new(GeneratorError::Server(
        "503".to_string(),
    )));
    let pipeline = harness.pipeline(generator.clone());

    let job = harness.submit(sample_request()).await;
    pipeline.run(&job).await.expect_err("retries must exhaust");

    // Exactly max_retries attempts of the failing step
    assert_eq!(generator.calls(), TestHarness::fast_config().max_retries);

    let settled = harness.jobs.get(&job.id).await.unwrap().expect("job kept");
    assert_eq!(settled.status, JobStatus::Failed);
    assert!(settled
        .error
        .expect("failure message")
        .contains("generation failed"));
}

#[tokio::test]
async fn test_invalid_api_key_is_terminal_without_retry() {
    let harness = TestHarness::new();
    let generator = Arc::new(FailingGenerator::new(GeneratorError::InvalidApiKey(
        "401".to_string(),
    )));
    let pipeline = harness.pipeline(generator.clone());

    let job = harness.submit(sample_request()).await;
    pipeline.run(&job).await.expect_err("bad credential must fail");

    assert_eq!(generator.calls(), 1);
    let settled = harness.jobs.get(&job.id).await.unwrap().expect("job kept");
    assert_eq!(settled.status, JobStatus::Failed);
    assert!(settled.error.expect("failure message").contains("API key"));
}

#[tokio::test]
async fn test_deadline_forces_failed_status() {
    let harness = TestHarness::new();
    let pipeline = harness.pipeline_with_config(
        Arc::new(StalledGenerator),
        PipelineConfig {
            timeout: Duration::from_millis(100),
            ..TestHarness::fast_config()
        },
    );

    let job = harness.submit(sample_request()).await;
    let started = Instant::now();
    pipeline.run(&job).await.expect_err("deadline must fire");
    assert!(started.elapsed() < Duration::from_secs(2));

    let settled = harness.jobs.get(&job.id).await.unwrap().expect("job kept");
    assert_eq!(settled.status, JobStatus::Failed);
    assert_eq!(settled.progress, 0);
    assert!(settled
        .error
        .expect("failure message")
        .contains("timed out"));
}

#[tokio::test]
async fn test_validation_fails_fast_without_calling_the_provider() {
    let harness = TestHarness::new();
    let generator = Arc::new(FixedGenerator::new("text"));
    let pipeline = harness.pipeline(generator.clone());

    let mut request = sample_request();
    request.title = "   ".to_string();
    let job = harness.submit(request).await;

    pipeline.run(&job).await.expect_err("validation must fail");
    assert_eq!(generator.calls(), 0);

    let settled = harness.jobs.get(&job.id).await.unwrap().expect("job kept");
    assert_eq!(settled.status, JobStatus::Failed);
    assert!(settled
        .error
        .expect("failure message")
        .contains("Invalid request"));
}

#[tokio::test]
async fn test_save_failure_is_terminal_and_named() {
    let harness = TestHarness::new();
    let generator = Arc::new(FixedGenerator::new("text"));
    let pipeline = harness.pipeline(generator.clone());

    // Job without an article placeholder: the save step has nothing to update
    let job = harness
        .jobs
        .create(sample_request())
        .await
        .expect("job record");

    pipeline.run(&job).await.expect_err("save must fail");

    // Generation itself ran to completion before the save failed
    assert_eq!(generator.calls(), 2);

    let settled = harness.jobs.get(&job.id).await.unwrap().expect("job kept");
    assert_eq!(settled.status, JobStatus::Failed);
    assert!(settled.error.expect("failure message").contains("save"));
    assert!(settled.result.is_none());
}

#[tokio::test]
async fn test_failed_generation_marks_article_for_audit() {
    let harness = TestHarness::new();
    let generator = Arc::new(FailingGenerator::new(GeneratorError::RateLimited(
        "429".to_string(),
    )));
    let pipeline = harness.pipeline(generator);

    let job = harness.submit(sample_request()).await;
    pipeline.run(&job).await.expect_err("quota must fail");

    let article = harness
        .articles
        .get(&job.id)
        .await
        .unwrap()
        .expect("article kept for audit");
    assert_eq!(article.status, ArticleStatus::Error);
    assert!(article.error_message.expect("audit message").contains("quota"));
}

#[tokio::test]
async fn test_poller_observes_eventual_completion() {
    let harness = TestHarness::new();
    let generator =
        Arc::new(FixedGenerator::new("text").with_delay(Duration::from_millis(10)));
    let pipeline = harness.pipeline(generator);

    let job = harness.submit(sample_request()).await;
    let job_for_run = job.clone();
    let run = tokio::spawn(async move { pipeline.run(&job_for_run).await });

    let outcome = poll_until_terminal(
        harness.jobs.as_ref(),
        &job.id,
        Duration::from_millis(5),
        200,
    )
    .await
    .unwrap();
    run.await.unwrap().expect("pipeline should succeed");

    match outcome {
        PollOutcome::Terminal(settled) => {
            assert_eq!(settled.status, JobStatus::Completed);
            assert_eq!(settled.progress, 100);
            assert!(!settled.result.expect("result").content.is_empty());
        }
        PollOutcome::TimedOut { attempts } => {
            panic!("polling timed out after {attempts} attempts")
        }
    }
}
