//! Full pass over the happy path: discover, fetch, compute, write, publish,
//! report and record, then a restarted pass that must not redo anything.

mod common;

use common::{read_json, Env, BUCKET, INPUT_BODY, NOW_MILLIS};
use jobrelay_core::application::{JobOutcome, SkipReason};
use jobrelay_core::domain::{Job, JobStatus, Outcome};
use serde_json::json;

fn job_one() -> Job {
    Job::new("J1", "https://files.test/J1/input.txt").with_filename("input.txt")
}

#[tokio::test]
async fn test_single_job_completes_end_to_end() {
    let env = Env::new(vec![job_one()]);
    let orchestrator = env.orchestrator(true).await;

    let summary = orchestrator.run_batch(|_| {}).await.unwrap();

    assert_eq!(summary.discovered, 1);
    assert_eq!(summary.handled, 1);
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.report_warnings, 0);

    // Input saved under its display name
    let input = env.input_dir().join("input.txt");
    assert_eq!(std::fs::read_to_string(&input).unwrap(), INPUT_BODY);
    assert_eq!(
        env.fetcher.calls(),
        vec![("https://files.test/J1/input.txt".to_string(), input.clone())]
    );

    // Status sequence
    assert_eq!(
        env.store.applied_statuses("J1"),
        vec![JobStatus::Queued, JobStatus::Running, JobStatus::Completed]
    );

    // Artifact pair
    let metrics = read_json(&env.output_file("J1", "results_J1.json"));
    assert_eq!(metrics["run_successful"], json!(true));
    assert_eq!(metrics["error_messages"], json!([]));
    assert_eq!(metrics["line_count"], json!(3));

    let csv = std::fs::read_to_string(env.output_file("J1", "results_J1.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("line_number,length,has_comma,preview"));
    assert_eq!(lines.next(), Some("1,10,true,\"alpha,beta\""));
    assert_eq!(lines.next(), Some("2,5,false,gamma"));
    assert_eq!(csv.lines().count(), 4);

    // Published under prefix/outputs_<id>/
    let keys: Vec<String> = env.objects.uploads().into_iter().map(|u| u.key).collect();
    assert_eq!(
        keys,
        vec![
            "processed-runs/outputs_J1/results_J1.json".to_string(),
            "processed-runs/outputs_J1/results_J1.csv".to_string(),
        ]
    );
    assert!(env.objects.uploads().iter().all(|u| u.public && u.bucket == BUCKET));

    // Terminal update carries both URLs and no error
    let remote = env.store.job("J1").unwrap();
    assert_eq!(remote.status, JobStatus::Completed);
    assert_eq!(
        remote.results_json_url.as_deref(),
        Some("https://runs-bucket.s3.mock-region-1.amazonaws.com/processed-runs/outputs_J1/results_J1.json")
    );
    assert_eq!(
        remote.results_csv_url.as_deref(),
        Some("https://runs-bucket.s3.mock-region-1.amazonaws.com/processed-runs/outputs_J1/results_J1.csv")
    );
    assert_eq!(remote.error_message, None);

    // Ledger persisted on disk
    let ledger = env.ledger_document();
    assert_eq!(
        ledger["downloaded_ids"]["J1"],
        json!({
            "filename": "input.txt",
            "saved_to": input.display().to_string(),
            "ts": NOW_MILLIS / 1000,
            "outcome": "completed"
        })
    );
}

#[tokio::test]
async fn test_restarted_pass_skips_handled_job() {
    let env = Env::new(vec![job_one()]);

    let first = env.orchestrator(true).await;
    let jobs = first.discover().await.unwrap();
    first.process_all(&jobs).await;
    let updates_after_first = env.store.attempted_updates().len();
    drop(first);

    // Same job offered again (store still says processing somewhere)
    let second = env.orchestrator(true).await;
    let outcome = second.process_job(&jobs[0]).await;

    assert_eq!(outcome, JobOutcome::Skipped(SkipReason::AlreadyHandled));
    assert_eq!(env.fetcher.call_count(), 1);
    assert_eq!(env.store.attempted_updates().len(), updates_after_first);
    assert_eq!(env.objects.uploads().len(), 2);
}

#[tokio::test]
async fn test_second_batch_finds_nothing_new() {
    let env = Env::new(vec![job_one()]);
    env.orchestrator(true).await.run_batch(|_| {}).await.unwrap();

    let summary = env.orchestrator(true).await.run_batch(|_| {}).await.unwrap();

    assert_eq!(summary.discovered, 0);
    assert_eq!(summary.handled, 0);
    assert_eq!(env.fetcher.call_count(), 1);
}

#[tokio::test]
async fn test_queued_step_can_be_disabled() {
    let env = Env::new(vec![job_one()]);

    env.orchestrator(false).await.run_batch(|_| {}).await.unwrap();

    assert_eq!(
        env.store.applied_statuses("J1"),
        vec![JobStatus::Running, JobStatus::Completed]
    );
}

#[tokio::test]
async fn test_jobs_are_processed_in_listing_order() {
    let env = Env::new(vec![
        Job::new("A", "https://files.test/a"),
        Job::new("B", "https://files.test/b").with_filename("b.txt"),
        Job::new("C", "https://files.test/c").with_filename("c.txt"),
    ]);

    let summary = env.orchestrator(true).await.run_batch(|_| {}).await.unwrap();
    assert_eq!(summary.completed, 3);

    let order: Vec<String> = env
        .store
        .applied_updates()
        .into_iter()
        .filter(|(_, u)| u.status == Some(JobStatus::Completed))
        .map(|(id, _)| id)
        .collect();
    assert_eq!(order, vec!["A", "B", "C"]);

    // Each job fully finished before the next one started
    let ids: Vec<String> = env
        .store
        .applied_updates()
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(ids, vec!["A", "A", "A", "B", "B", "B", "C", "C", "C"]);

    // No display name: derived from the URL
    let saved = env.ledger_document()["downloaded_ids"]["A"]["filename"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(saved.starts_with("upload_"));
    assert!(env.input_dir().join(&saved).exists());
}

#[tokio::test]
async fn test_handled_outcome_reported() {
    let env = Env::new(vec![job_one()]);
    let outcome = env.orchestrator(true).await.process_job(&job_one()).await;

    assert_eq!(
        outcome,
        JobOutcome::Handled {
            outcome: Outcome::Completed,
            report_error: None,
        }
    );
}
