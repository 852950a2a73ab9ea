//! In-memory stand-ins for the host process table and the container runtime.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::extracts::containers::{ContainerError, ContainerResult, ContainerRuntime};
use crate::extracts::process::{HostProcessTable, PS_COLUMNS, USAGE_COLUMNS};
use crate::process_identification::types::{ContainerId, ProcessInfo};

const HOST_NAMESPACE: &str = "pid:[4026531836]";

pub(crate) fn process_info(pid: u32, command_line: &str, started: DateTime<Utc>) -> ProcessInfo {
    let mut tokens = command_line.split_whitespace().map(str::to_string);
    ProcessInfo {
        pid,
        ppid: 1,
        command: tokens.next().unwrap_or_default(),
        args: tokens.collect(),
        start_time: started,
        user: "root".into(),
        working_dir: "/".into(),
        status: "Sleeping".into(),
        cpu_time: Duration::from_secs(1),
        memory_bytes: 1024 * 1024,
        container_pid: None,
        namespace_only: false,
    }
}

struct HostEntry {
    info: ProcessInfo,
    namespace: String,
    ns_pid: Option<u32>,
}

#[derive(Default)]
pub(crate) struct FakeHost {
    processes: Mutex<HashMap<u32, HostEntry>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, info: ProcessInfo) {
        let entry = HostEntry {
            ns_pid: Some(info.pid),
            info,
            namespace: HOST_NAMESPACE.into(),
        };
        self.processes.lock().unwrap().insert(entry.info.pid, entry);
    }

    /// A host-visible process living in another PID namespace.
    pub fn add_namespaced(&self, info: ProcessInfo, namespace: &str, ns_pid: u32) {
        let entry = HostEntry {
            info,
            namespace: namespace.into(),
            ns_pid: Some(ns_pid),
        };
        self.processes.lock().unwrap().insert(entry.info.pid, entry);
    }

    pub fn remove(&self, pid: u32) {
        self.processes.lock().unwrap().remove(&pid);
    }

    pub fn set_cpu_time(&self, pid: u32, cpu_time: Duration) {
        if let Some(entry) = self.processes.lock().unwrap().get_mut(&pid) {
            entry.info.cpu_time = cpu_time;
        }
    }
}

impl HostProcessTable for FakeHost {
    fn pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self.processes.lock().unwrap().keys().copied().collect();
        pids.sort_unstable();
        pids
    }

    fn read(&self, pid: u32) -> Option<ProcessInfo> {
        self.processes.lock().unwrap().get(&pid).map(|e| e.info.clone())
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.processes.lock().unwrap().contains_key(&pid)
    }

    fn pid_namespace(&self, pid: u32) -> Option<String> {
        self.processes.lock().unwrap().get(&pid).map(|e| e.namespace.clone())
    }

    fn namespace_pid(&self, pid: u32) -> Option<u32> {
        self.processes.lock().unwrap().get(&pid).and_then(|e| e.ns_pid)
    }
}

struct FakeProcess {
    ppid: u32,
    args: String,
    etime: String,
    cwd: String,
    rss_kib: u64,
    cpu_time: String,
}

#[derive(Default)]
struct FakeContainer {
    main_pid: u32,
    processes: BTreeMap<u32, FakeProcess>,
    files: HashMap<String, String>,
}

/// Answers the handful of `ps`/`cat`/`readlink` invocations the inspector issues.
#[derive(Default)]
pub(crate) struct FakeRuntime {
    containers: Mutex<BTreeMap<ContainerId, FakeContainer>>,
    fail_exec: AtomicBool,
    fail_list: AtomicBool,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_container(&self, id: &str, main_pid: u32) -> ContainerId {
        let id = ContainerId::from(id);
        self.containers.lock().unwrap().insert(
            id.clone(),
            FakeContainer {
                main_pid,
                ..Default::default()
            },
        );
        id
    }

    pub fn remove_container(&self, id: &ContainerId) {
        self.containers.lock().unwrap().remove(id);
    }

    pub fn add_process(&self, id: &ContainerId, pid: u32, ppid: u32, args: &str) {
        self.add_process_with(id, pid, ppid, args, "05:00", "/");
    }

    pub fn add_process_with(
        &self,
        id: &ContainerId,
        pid: u32,
        ppid: u32,
        args: &str,
        etime: &str,
        cwd: &str,
    ) {
        if let Some(container) = self.containers.lock().unwrap().get_mut(id) {
            container.processes.insert(
                pid,
                FakeProcess {
                    ppid,
                    args: args.into(),
                    etime: etime.into(),
                    cwd: cwd.into(),
                    rss_kib: 1024,
                    cpu_time: "00:00:00".into(),
                },
            );
        }
    }

    pub fn remove_process(&self, id: &ContainerId, pid: u32) {
        if let Some(container) = self.containers.lock().unwrap().get_mut(id) {
            container.processes.remove(&pid);
        }
    }

    pub fn set_usage(&self, id: &ContainerId, pid: u32, rss_kib: u64, cpu_time: &str) {
        if let Some(process) = self
            .containers
            .lock()
            .unwrap()
            .get_mut(id)
            .and_then(|c| c.processes.get_mut(&pid))
        {
            process.rss_kib = rss_kib;
            process.cpu_time = cpu_time.into();
        }
    }

    pub fn add_file(&self, id: &ContainerId, path: &str, content: &str) {
        if let Some(container) = self.containers.lock().unwrap().get_mut(id) {
            container.files.insert(path.into(), content.into());
        }
    }

    pub fn fail_exec(&self, fail: bool) {
        self.fail_exec.store(fail, Ordering::SeqCst);
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }
}

fn failed(args: &[String], status: i32, stderr: &str) -> ContainerError {
    ContainerError::CommandFailed {
        command: args.join(" "),
        status: Some(status),
        stderr: stderr.into(),
    }
}

fn row(pid: u32, p: &FakeProcess) -> String {
    format!("{:>5} {:>5} {:<8} {:>11} {}\n", pid, p.ppid, "root", p.etime, p.args)
}

fn proc_pid(path: &str, suffix: &str) -> Option<u32> {
    path.strip_prefix("/proc/")?.strip_suffix(suffix)?.parse().ok()
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_running(&self) -> ContainerResult<Vec<ContainerId>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ContainerError::InvalidOutput("daemon unreachable".into()));
        }
        Ok(self.containers.lock().unwrap().keys().cloned().collect())
    }

    async fn main_pid(&self, id: &ContainerId) -> ContainerResult<u32> {
        self.containers
            .lock()
            .unwrap()
            .get(id)
            .map(|c| c.main_pid)
            .ok_or_else(|| ContainerError::InvalidOutput(format!("no such container {id}")))
    }

    async fn exec(&self, id: &ContainerId, args: &[String]) -> ContainerResult<String> {
        if self.fail_exec.load(Ordering::SeqCst) {
            return Err(failed(args, 126, "exec failed"));
        }

        let containers = self.containers.lock().unwrap();
        let Some(container) = containers.get(id) else {
            return Err(failed(args, 1, "No such container"));
        };
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();

        match argv.as_slice() {
            ["ps", "-eo", columns] if *columns == PS_COLUMNS => Ok(container
                .processes
                .iter()
                .map(|(pid, p)| row(*pid, p))
                .collect()),
            ["ps", "-p", pid, "-o", columns] => {
                let pid: u32 = pid.parse().map_err(|_| failed(args, 1, "bad pid"))?;
                let p = container
                    .processes
                    .get(&pid)
                    .ok_or_else(|| failed(args, 1, ""))?;
                match *columns {
                    "pid=" => Ok(format!("{pid:>5}\n")),
                    "ppid=" => Ok(format!("{:>5}\n", p.ppid)),
                    "args=" => Ok(format!("{}\n", p.args)),
                    c if c == PS_COLUMNS => Ok(row(pid, p)),
                    c if c == USAGE_COLUMNS => Ok(format!("{:>6} {}\n", p.rss_kib, p.cpu_time)),
                    _ => Err(failed(args, 1, "unsupported format")),
                }
            }
            ["cat", path] => {
                if let Some(pid) = proc_pid(path, "/cmdline") {
                    let p = container
                        .processes
                        .get(&pid)
                        .ok_or_else(|| failed(args, 1, "No such file or directory"))?;
                    let mut raw = p.args.split_whitespace().collect::<Vec<_>>().join("\0");
                    raw.push('\0');
                    return Ok(raw);
                }
                container
                    .files
                    .get(*path)
                    .cloned()
                    .ok_or_else(|| failed(args, 1, "No such file or directory"))
            }
            ["readlink", path] => proc_pid(path, "/cwd")
                .and_then(|pid| container.processes.get(&pid))
                .map(|p| format!("{}\n", p.cwd))
                .ok_or_else(|| failed(args, 1, "")),
            _ => Err(failed(args, 127, "command not found")),
        }
    }
}
