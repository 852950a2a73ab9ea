use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use cmdmonitor::extracts::process::{HostProcessTable, HostProcesses};
use cmdmonitor::extracts::process_manager::{ManagerSettings, MonitorManager, ProcessEventHandler};
use cmdmonitor::extracts::scanner::ProcessScanner;
use cmdmonitor::process_identification::types::{ProcessLocation, TrackedProcess, TrackedStatus};
use tempfile::TempDir;

#[derive(Default)]
struct Completions(Mutex<Vec<TrackedProcess>>);

#[async_trait]
impl ProcessEventHandler for Completions {
    async fn on_completed(&self, process: TrackedProcess) -> Result<()> {
        self.0.lock().unwrap().push(process);
        Ok(())
    }
}

#[tokio::test]
async fn tagged_shell_command_is_tracked_until_it_exits() {
    let dir = TempDir::new().unwrap();
    let host: Arc<dyn HostProcessTable> = Arc::new(HostProcesses::new());
    let scanner = ProcessScanner::new(Arc::clone(&host), None, dir.path().join("tags.txt"));
    let settings = ManagerSettings {
        scan_interval: Duration::from_millis(200),
        max_processes: 20,
        retention: Duration::from_secs(600),
    };
    let completions = Arc::new(Completions::default());
    let manager =
        MonitorManager::new(scanner, host, settings).with_event_handler(completions.clone());

    let mut child = Command::new("sh")
        .args(["-c", "sleep 2; true # MONITOR:lifecycle"])
        .spawn()
        .unwrap();
    let pid = child.id();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut seen_running = false;
    while Instant::now() < deadline {
        manager.scan_and_update().await;
        if let Some(entry) = manager.get(pid).await {
            if entry.is_running() {
                seen_running = true;
                // reap as soon as the shell exits so it does not linger as a zombie
                let _ = child.try_wait();
            } else {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    let _ = child.wait();
    manager.scan_and_update().await;
    manager.wait_for_handlers().await;

    assert!(seen_running, "tagged process was never tracked");
    let entry = manager.get(pid).await.expect("entry kept during retention");
    assert_eq!(entry.status, TrackedStatus::Completed);
    assert_eq!(entry.exit_code, Some(0));
    assert_eq!(entry.location, ProcessLocation::Host);
    assert!(entry.duration >= Duration::from_secs(1), "{:?}", entry.duration);
    assert!(entry.duration <= Duration::from_secs(4), "{:?}", entry.duration);

    let completed = completions.0.lock().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].pid(), pid);
}
