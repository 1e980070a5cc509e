//! Whole batch runs: partitions, checkpoint/resume, interruption

use crate::common::{html, page, run_config, target_for};
use contact_miner::config::{Config, RunnerKind};
use contact_miner::input::{InputStats, LoadedInput};
use contact_miner::storage::{Checkpoint, Partition, SqliteSink, SQLITE_FILE};
use contact_miner::{run_batch, ShutdownSignal, Target};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// A site whose homepage must be requested exactly once over all runs
async fn site_with_email(mailbox: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(page(&format!(
            r#"<a href="mailto:{}@acme.test">Write to us</a>"#,
            mailbox
        ))))
        .expect(1)
        .mount(&server)
        .await;
    server
}

async fn missing_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    server
}

/// Serves a page and requests shutdown while the target is in flight
struct ShutdownOnRequest {
    signal: ShutdownSignal,
    template: ResponseTemplate,
}

impl Respond for ShutdownOnRequest {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.signal.trigger();
        self.template.clone()
    }
}

/// Like `site_with_email`, but its homepage request triggers `signal`
async fn site_triggering_shutdown(mailbox: &str, signal: &ShutdownSignal) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ShutdownOnRequest {
            signal: signal.clone(),
            template: html(page(&format!(
                r#"<a href="mailto:{}@acme.test">Write to us</a>"#,
                mailbox
            ))),
        })
        .expect(1)
        .mount(&server)
        .await;
    server
}

fn input_of(servers: &[&MockServer]) -> LoadedInput {
    let targets: Vec<Target> = servers.iter().map(|s| target_for(s)).collect();
    LoadedInput {
        stats: InputStats {
            rows: targets.len(),
            ..InputStats::default()
        },
        targets,
    }
}

fn csv_rows(dir: &Path, partition: Partition) -> Vec<csv::StringRecord> {
    let path = dir.join(format!("{}.csv", partition.name()));
    csv::Reader::from_path(path)
        .unwrap()
        .records()
        .collect::<Result<_, _>>()
        .unwrap()
}

/// Sorted values of the `email` column of a partition
fn emails_in(dir: &Path, partition: Partition) -> Vec<String> {
    let path = dir.join(format!("{}.csv", partition.name()));
    let mut reader = csv::Reader::from_path(path).unwrap();
    let column = reader
        .headers()
        .unwrap()
        .iter()
        .position(|h| h == "email")
        .unwrap();
    let mut emails: Vec<String> = reader
        .records()
        .map(|r| r.unwrap()[column].to_string())
        .collect();
    emails.sort();
    emails
}

fn resume(config: &Config) -> Config {
    let mut config = config.clone();
    config.checkpoint.resume = true;
    config
}

#[tokio::test]
async fn test_resume_skips_completed_targets() {
    let dir = TempDir::new().unwrap();
    let info = site_with_email("info").await;
    let sales = site_with_email("sales").await;
    let gone = missing_site().await;
    let hello = site_with_email("hello").await;

    let config = run_config(RunnerKind::Concurrent, dir.path());
    let first = run_batch(&config, input_of(&[&info, &sales]), ShutdownSignal::new())
        .await
        .unwrap();
    assert!(!first.interrupted());
    assert_eq!(first.analytics.totals.attempted, 2);
    assert_eq!(first.analytics.totals.emails_found, 2);

    let second = run_batch(
        &resume(&config),
        input_of(&[&info, &sales, &gone, &hello]),
        ShutdownSignal::new(),
    )
    .await
    .unwrap();

    assert!(second.analytics.resumed);
    assert_eq!(second.analytics.input.skipped_completed, 2);
    assert_eq!(second.analytics.input.dispatched, 2);
    assert_eq!(second.analytics.processed, 2);
    assert_eq!(second.analytics.totals.attempted, 4);
    assert_eq!(second.analytics.totals.succeeded, 3);
    assert_eq!(second.analytics.totals.emails_found, 3);
    assert_eq!(
        second.analytics.totals.failures_by_reason.get("http_error_404"),
        Some(&1)
    );

    let checkpoint = Checkpoint::load(&config.checkpoint_path())
        .unwrap()
        .unwrap();
    assert_eq!(checkpoint.completed.len(), 4);
    assert_eq!(checkpoint.emails_found, 3);

    let success = csv_rows(dir.path(), Partition::Success);
    assert_eq!(success.len(), 3);
    let mut ids: Vec<&str> = success.iter().map(|r| &r[0]).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
    assert_eq!(csv_rows(dir.path(), Partition::Failed).len(), 1);
    assert_eq!(csv_rows(dir.path(), Partition::AllCombined).len(), 4);

    let sqlite = SqliteSink::new(&dir.path().join(SQLITE_FILE), false).unwrap();
    assert_eq!(sqlite.count(Partition::AllCombined).unwrap(), 4);

    assert!(dir.path().join("analytics.json").exists());
    let summary = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
    assert!(summary.contains("http_error_404"));
}

#[tokio::test]
async fn test_interrupted_run_resumes_to_completion() {
    let dir = TempDir::new().unwrap();
    let info = site_with_email("info").await;
    let office = site_with_email("office").await;

    let config = run_config(RunnerKind::Pool, dir.path());
    let shutdown = ShutdownSignal::new();
    shutdown.trigger();

    let interrupted = run_batch(&config, input_of(&[&info, &office]), shutdown)
        .await
        .unwrap();
    assert!(interrupted.interrupted());
    assert_eq!(interrupted.analytics.processed, 0);

    let finished = run_batch(
        &resume(&config),
        input_of(&[&info, &office]),
        ShutdownSignal::new(),
    )
    .await
    .unwrap();
    assert!(!finished.interrupted());
    assert_eq!(finished.analytics.input.skipped_completed, 0);
    assert_eq!(finished.analytics.totals.succeeded, 2);
    assert_eq!(csv_rows(dir.path(), Partition::Success).len(), 2);
}

#[tokio::test]
async fn test_fresh_run_discards_previous_outputs() {
    let dir = TempDir::new().unwrap();
    let config = run_config(RunnerKind::Pool, dir.path());

    let first = site_with_email("info").await;
    run_batch(&config, input_of(&[&first]), ShutdownSignal::new())
        .await
        .unwrap();

    let second = site_with_email("sales").await;
    let report = run_batch(&config, input_of(&[&second]), ShutdownSignal::new())
        .await
        .unwrap();

    assert!(!report.analytics.resumed);
    assert_eq!(report.analytics.totals.attempted, 1);
    let rows = csv_rows(dir.path(), Partition::AllCombined);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].iter().any(|cell| cell == "sales@acme.test"));
}

#[tokio::test]
async fn test_mid_run_interrupt_matches_uninterrupted_run() {
    const MAILBOXES: [&str; 5] = ["info", "sales", "office", "hello", "team"];

    let baseline_dir = TempDir::new().unwrap();
    let mut baseline_sites = Vec::new();
    for mailbox in MAILBOXES {
        baseline_sites.push(site_with_email(mailbox).await);
    }
    let baseline_config = run_config(RunnerKind::Pool, baseline_dir.path());
    let baseline = run_batch(
        &baseline_config,
        input_of(&baseline_sites.iter().collect::<Vec<_>>()),
        ShutdownSignal::new(),
    )
    .await
    .unwrap();
    assert!(!baseline.interrupted());
    let baseline_checkpoint = Checkpoint::load(&baseline_config.checkpoint_path())
        .unwrap()
        .unwrap();

    // One worker takes the targets in input order; the third one stops dispatch
    let dir = TempDir::new().unwrap();
    let shutdown = ShutdownSignal::new();
    let mut sites = Vec::new();
    for (index, mailbox) in MAILBOXES.iter().enumerate() {
        let site = if index == 2 {
            site_triggering_shutdown(mailbox, &shutdown).await
        } else {
            site_with_email(mailbox).await
        };
        sites.push(site);
    }
    let mut config = run_config(RunnerKind::Pool, dir.path());
    config.runner.workers = 1;

    let first = run_batch(&config, input_of(&sites.iter().collect::<Vec<_>>()), shutdown)
        .await
        .unwrap();
    assert!(first.interrupted());
    assert_eq!(first.analytics.processed, 3);
    let partial = Checkpoint::load(&config.checkpoint_path()).unwrap().unwrap();
    assert_eq!(partial.completed.len(), 3);
    assert_eq!(emails_in(dir.path(), Partition::Success).len(), 3);

    let finished = run_batch(
        &resume(&config),
        input_of(&sites.iter().collect::<Vec<_>>()),
        ShutdownSignal::new(),
    )
    .await
    .unwrap();
    assert!(!finished.interrupted());
    assert_eq!(finished.analytics.input.skipped_completed, 3);
    assert_eq!(finished.analytics.processed, 2);

    let checkpoint = Checkpoint::load(&config.checkpoint_path()).unwrap().unwrap();
    assert_eq!(checkpoint.completed.len(), baseline_checkpoint.completed.len());
    assert_eq!(checkpoint.emails_found, baseline_checkpoint.emails_found);
    assert_eq!(
        emails_in(dir.path(), Partition::Success),
        emails_in(baseline_dir.path(), Partition::Success)
    );
    assert_eq!(
        csv_rows(dir.path(), Partition::AllCombined).len(),
        csv_rows(baseline_dir.path(), Partition::AllCombined).len()
    );
}
