// src/exec/command.rs

//! Task body that runs a shell command.
//!
//! Used for tasks defined in a TOML batch file. The child is spawned with
//! `kill_on_drop(true)`, so when the executor aborts the body on timeout the
//! process is killed with it.

use std::process::Stdio;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::task::{BodyFuture, TaskBody, TaskContext};

/// Environment variable carrying the task id into the child process.
pub const TASK_ID_ENV: &str = "INITDAG_TASK_ID";

#[derive(Debug, Clone)]
pub struct ShellCommandBody {
    cmd: Arc<str>,
}

impl ShellCommandBody {
    pub fn new(cmd: impl Into<Arc<str>>) -> Self {
        Self { cmd: cmd.into() }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }
}

impl TaskBody for ShellCommandBody {
    fn run(&self, ctx: TaskContext) -> BodyFuture {
        let cmd = Arc::clone(&self.cmd);
        Box::pin(async move { run_command(ctx.id(), &cmd).await })
    }
}

/// Run `cmd` through the platform shell. Exit status 0 is success; any other
/// exit status is a reported failure (`Ok(false)`).
async fn run_command(task: &str, cmd: &str) -> anyhow::Result<bool> {
    info!(task = %task, cmd = %cmd, "starting task process");

    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .env(TASK_ID_ENV, task)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning process for task '{task}'"))?;

    // Always drain both pipes so the child never blocks on a full buffer.
    if let Some(stdout) = child.stdout.take() {
        let task_name = task.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %task_name, "stdout: {}", line);
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        let task_name = task.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %task_name, "stderr: {}", line);
            }
        });
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{task}'"))?;

    if status.success() {
        debug!(task = %task, "task process exited successfully");
        Ok(true)
    } else {
        warn!(
            task = %task,
            exit_code = status.code().unwrap_or(-1),
            "task process exited with failure"
        );
        Ok(false)
    }
}
