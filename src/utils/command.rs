use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::core::error::AppError;

/// stdout / stderr 各自的最大捕获字节数
pub const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;
/// 未指定超时时的默认超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);
/// 超时或被信号终止时的返回码
pub const TIMEOUT_RETURN_CODE: i32 = -1;
/// 进程无法启动时的返回码
pub const SPAWN_FAILURE_RETURN_CODE: i32 = -3;

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// 命令执行结果分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutcome {
    Success,
    /// 非零退出码，但属于调用方声明的"键不存在"退出码
    BenignEmpty,
    Failed,
    /// 超时被杀死，或被信号终止且没有退出码
    TimedOut,
    SpawnFailed,
}

/// 命令执行结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    pub outcome: CommandOutcome,
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub command: String,
    pub execution_time_ms: u64,
    /// 输出超过上限被截断
    #[serde(default)]
    pub truncated: bool,
}

impl CommandResult {
    fn spawn_failure(command: String, reason: String, elapsed: Duration) -> Self {
        CommandResult {
            success: false,
            outcome: CommandOutcome::SpawnFailed,
            return_code: SPAWN_FAILURE_RETURN_CODE,
            stdout: String::new(),
            stderr: reason,
            command,
            execution_time_ms: elapsed.as_millis() as u64,
            truncated: false,
        }
    }

    fn timed_out(command: String, stdout: String, timeout: Duration, elapsed: Duration) -> Self {
        CommandResult {
            success: false,
            outcome: CommandOutcome::TimedOut,
            return_code: TIMEOUT_RETURN_CODE,
            stdout,
            stderr: format!("命令执行超时（>{}ms）", timeout.as_millis()),
            command,
            execution_time_ms: elapsed.as_millis() as u64,
            truncated: false,
        }
    }

    /// stdout 第一行（trim 后）
    pub fn first_line(&self) -> Option<&str> {
        self.stdout.trim().lines().next().map(str::trim)
    }

    /// 是否是"键不存在"类的良性结果
    pub fn is_benign_empty(&self) -> bool {
        self.outcome == CommandOutcome::BenignEmpty
    }

    /// 把失败结果转换为错误分类；成功和良性空结果返回 `None`
    pub fn to_error(&self) -> Option<AppError> {
        match self.outcome {
            CommandOutcome::Success | CommandOutcome::BenignEmpty => None,
            CommandOutcome::TimedOut => Some(AppError::ProcessTimeout {
                command: self.command.clone(),
                elapsed_ms: self.execution_time_ms,
            }),
            CommandOutcome::SpawnFailed => Some(AppError::ProcessSpawnFailure {
                command: self.command.clone(),
                reason: self.stderr.clone(),
            }),
            CommandOutcome::Failed => Some(AppError::CommandFailed {
                command: self.command.clone(),
                return_code: self.return_code,
                stderr: truncate_chars(self.stderr.trim(), 200),
            }),
        }
    }
}

/// 单次请求的环境变量覆盖层
///
/// 只作用于本次启动的子进程：`set` 叠加在父进程环境之上，`unset` 从子进程环境中移除。
/// 不会修改当前进程的环境变量。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    set: BTreeMap<String, String>,
    unset: Vec<String>,
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set.insert(key.into(), value.into());
        self
    }

    pub fn unset(mut self, key: impl Into<String>) -> Self {
        self.unset.push(key.into());
        self
    }

    /// 移除当前进程环境中所有以 `prefix` 开头（不区分大小写）的变量
    pub fn without_prefix(prefix: &str) -> Self {
        Self::without_prefix_in(prefix, std::env::vars_os().map(|(k, _)| k))
    }

    pub(crate) fn without_prefix_in<I>(prefix: &str, names: I) -> Self
    where
        I: IntoIterator<Item = std::ffi::OsString>,
    {
        let prefix = prefix.to_lowercase();
        let unset = names
            .into_iter()
            .filter_map(|name| name.into_string().ok())
            .filter(|name| name.to_lowercase().starts_with(&prefix))
            .collect();
        Self {
            set: BTreeMap::new(),
            unset,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    pub fn unset_keys(&self) -> &[String] {
        &self.unset
    }

    fn apply(&self, command: &mut Command) {
        for key in &self.unset {
            command.env_remove(key);
        }
        command.envs(&self.set);
    }
}

/// 单次执行参数
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// 为空时使用执行器的默认超时
    pub timeout: Option<Duration>,
    /// 为空时直接继承父进程环境（不复制）
    pub env: Option<EnvOverlay>,
    /// 视为"键不存在"的非零退出码
    pub benign_exit_codes: Vec<i32>,
}

impl ExecOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    pub fn env(mut self, overlay: EnvOverlay) -> Self {
        self.env = Some(overlay);
        self
    }

    pub fn benign(mut self, codes: &[i32]) -> Self {
        self.benign_exit_codes = codes.to_vec();
        self
    }
}

/// 进程执行抽象
///
/// 实现必须是全函数：任何失败都表示为 `CommandResult`，不会 panic 或返回错误。
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(&self, argv: &[String], options: ExecOptions) -> CommandResult;
}

/// 命令执行器
///
/// 直接启动 argv[0]（Windows 下经由 `cmd /C` 以解析 `.cmd` 包装脚本），
/// 超时后杀死子进程，输出按上限截断。不做重试。
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    default_timeout: Duration,
    max_output: usize,
}

impl CommandExecutor {
    pub fn new() -> Self {
        CommandExecutor {
            default_timeout: DEFAULT_TIMEOUT,
            max_output: MAX_OUTPUT_BYTES,
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_max_output(mut self, max_output: usize) -> Self {
        self.max_output = max_output;
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    async fn run(&self, argv: &[String], options: ExecOptions) -> CommandResult {
        let command_str = argv.join(" ");
        let start = Instant::now();

        let Some(mut command) = build_command(argv) else {
            return CommandResult::spawn_failure(command_str, "空命令".to_string(), start.elapsed());
        };

        let timeout = options.timeout.unwrap_or(self.default_timeout);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(overlay) = &options.env {
            overlay.apply(&mut command);
        }

        tracing::debug!(command = %command_str, timeout_ms = timeout.as_millis() as u64, "执行命令");

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(command = %command_str, error = %e, "命令启动失败");
                return CommandResult::spawn_failure(command_str, e.to_string(), start.elapsed());
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = self.max_output;
        let mut out = BoundedBuffer::default();
        let mut err = BoundedBuffer::default();

        let run = async {
            let (status, _, _) = tokio::join!(
                child.wait(),
                read_bounded(stdout, limit, &mut out),
                read_bounded(stderr, limit, &mut err)
            );
            status
        };
        let waited = tokio::time::timeout(timeout, run).await;

        let status = match waited {
            Ok(status) => status,
            // 子进程已退出但管道仍被其后台子进程占用：按已退出处理，保留已读到的输出
            Err(_) => match child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!(command = %command_str, "子进程已退出，输出管道未关闭");
                    Ok(status)
                }
                _ => {
                    if let Err(e) = child.kill().await {
                        tracing::debug!(command = %command_str, error = %e, "杀死超时进程失败");
                    }
                    tracing::warn!(
                        command = %command_str,
                        timeout_ms = timeout.as_millis() as u64,
                        "命令执行超时，已终止子进程"
                    );
                    let stdout = String::from_utf8_lossy(&out.bytes).to_string();
                    let mut result =
                        CommandResult::timed_out(command_str, stdout, timeout, start.elapsed());
                    result.truncated = out.truncated;
                    return result;
                }
            },
        };

        let elapsed = start.elapsed();
        let status = match status {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(command = %command_str, error = %e, "等待子进程失败");
                return CommandResult::spawn_failure(command_str, e.to_string(), elapsed);
            }
        };

        let stdout = String::from_utf8_lossy(&out.bytes).to_string();
        let stderr = String::from_utf8_lossy(&err.bytes).to_string();
        let truncated = out.truncated || err.truncated;
        if truncated {
            tracing::warn!(command = %command_str, max_bytes = limit, "命令输出超过上限，已截断");
        }

        let (outcome, return_code) = classify(status, &options.benign_exit_codes);
        if outcome == CommandOutcome::TimedOut {
            let mut result = CommandResult::timed_out(command_str, stdout, timeout, elapsed);
            result.truncated = truncated;
            tracing::warn!(command = %result.command, "命令被信号终止");
            return result;
        }

        match outcome {
            CommandOutcome::Success => tracing::debug!(
                command = %command_str,
                elapsed_ms = elapsed.as_millis() as u64,
                "命令执行成功"
            ),
            CommandOutcome::BenignEmpty => tracing::debug!(
                command = %command_str,
                return_code,
                "配置查询返回空"
            ),
            _ => tracing::warn!(
                command = %command_str,
                return_code,
                stderr = %truncate_chars(stderr.trim(), 200),
                "命令执行失败"
            ),
        }

        CommandResult {
            success: outcome == CommandOutcome::Success,
            outcome,
            return_code,
            stdout,
            stderr,
            command: command_str,
            execution_time_ms: elapsed.as_millis() as u64,
            truncated,
        }
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for CommandExecutor {
    async fn execute(&self, argv: &[String], options: ExecOptions) -> CommandResult {
        self.run(argv, options).await
    }
}

#[cfg(target_os = "windows")]
fn build_command(argv: &[String]) -> Option<Command> {
    if argv.is_empty() || argv[0].is_empty() {
        return None;
    }
    let mut command = Command::new("cmd");
    command.arg("/C").args(argv).creation_flags(CREATE_NO_WINDOW);
    Some(command)
}

#[cfg(not(target_os = "windows"))]
fn build_command(argv: &[String]) -> Option<Command> {
    let (program, args) = argv.split_first()?;
    if program.is_empty() {
        return None;
    }
    let mut command = Command::new(program);
    command.args(args);
    Some(command)
}

/// 退出状态分类：无退出码（被信号终止）优先判为超时
fn classify(status: ExitStatus, benign_exit_codes: &[i32]) -> (CommandOutcome, i32) {
    match status.code() {
        None => (CommandOutcome::TimedOut, TIMEOUT_RETURN_CODE),
        Some(0) => (CommandOutcome::Success, 0),
        Some(code) if benign_exit_codes.contains(&code) => (CommandOutcome::BenignEmpty, code),
        Some(code) => (CommandOutcome::Failed, code),
    }
}

#[derive(Default)]
struct BoundedBuffer {
    bytes: Vec<u8>,
    truncated: bool,
}

/// 读取至多 `limit` 字节，超出部分继续读取并丢弃，避免子进程阻塞在写管道上。
/// 写入调用方持有的缓冲区，超时后已读到的部分仍然可用。
async fn read_bounded<R>(reader: Option<R>, limit: usize, buffer: &mut BoundedBuffer)
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return;
    };

    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let remaining = limit.saturating_sub(buffer.bytes.len());
                let take = n.min(remaining);
                buffer.bytes.extend_from_slice(&chunk[..take]);
                if take < n {
                    buffer.truncated = true;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "读取子进程输出失败");
                break;
            }
        }
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
