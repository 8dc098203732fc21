// 测试用的命令执行器
//
// 按工具家族模拟配置存储：
// - npm / yarn / pnpm：`config set|get|delete`，支持 `--location=user|global`
// - bun：`pm config set|get|rm`，读取或删除不存在的键返回 1
// - pip：`config set|get|unset`，读取或删除不存在的键返回 1
// - git：`config --global [--unset] <key> [value]`，读取不存在的键返回 1，删除返回 5
// - 缓存：`cache clean|verify|purge`、`store prune` 直接成功；`cache dir`、`store path`
//   返回对应缓存配置项的值

use crate::utils::{CommandOutcome, CommandResult, CommandRunner, ExecOptions};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const USER: &str = "user";
const GLOBAL: &str = "global";

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub argv: Vec<String>,
    pub options: ExecOptions,
}

impl RecordedCall {
    pub fn command(&self) -> String {
        self.argv.join(" ")
    }
}

#[derive(Default)]
struct FakeState {
    versions: HashMap<String, String>,
    /// (binary, scope, key) → value
    store: HashMap<(String, String, String), String>,
    /// 写入返回成功但不落盘的键：(binary, key)
    ignored_writes: HashSet<(String, String)>,
    /// 删除返回成功但不生效的键：(binary, key)
    sticky_keys: HashSet<(String, String)>,
    /// 命令字符串 → 固定结果
    scripted: HashMap<String, CommandResult>,
    calls: Vec<RecordedCall>,
}

#[derive(Default)]
pub(crate) struct FakeRunner {
    state: Mutex<FakeState>,
    /// 每条命令返回前的等待
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记某个可执行文件已安装，`--version` 输出 `version`
    pub fn with_tool(self, binary: &str, version: &str) -> Self {
        self.lock()
            .versions
            .insert(binary.to_string(), version.to_string());
        self
    }

    /// 每条命令都等待 `delay` 后才返回（配合暂停的 tokio 时钟使用）
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 同一时刻正在执行的命令数的峰值
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn set_value(&self, binary: &str, scope: &str, key: &str, value: &str) {
        self.lock().store.insert(
            (binary.to_string(), scope.to_string(), key.to_string()),
            value.to_string(),
        );
    }

    pub fn value(&self, binary: &str, scope: &str, key: &str) -> Option<String> {
        self.lock()
            .store
            .get(&(binary.to_string(), scope.to_string(), key.to_string()))
            .cloned()
    }

    pub fn ignore_writes(&self, binary: &str, key: &str) {
        self.lock()
            .ignored_writes
            .insert((binary.to_string(), key.to_string()));
    }

    pub fn make_sticky(&self, binary: &str, key: &str) {
        self.lock()
            .sticky_keys
            .insert((binary.to_string(), key.to_string()));
    }

    pub fn script(&self, command: &str, result: CommandResult) {
        self.lock().scripted.insert(command.to_string(), result);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.lock().calls.iter().map(RecordedCall::command).collect()
    }

    pub fn count_of(&self, command: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.command() == command)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn handle(&self, argv: &[String], options: &ExecOptions) -> CommandResult {
        let command = argv.join(" ");
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            argv: argv.to_vec(),
            options: options.clone(),
        });

        if let Some(result) = state.scripted.get(&command) {
            return result.clone();
        }

        let Some((binary, args)) = argv.split_first() else {
            return spawn_failed(&command);
        };
        let Some(version) = state.versions.get(binary).cloned() else {
            return spawn_failed(&command);
        };

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        if args == ["--version"] {
            return ok(&command, &format!("{version}\n"));
        }

        let (code, stdout) = match binary.as_str() {
            "git" => handle_git(&mut state, &args),
            _ => handle_config_cli(&mut state, binary, &args),
        };

        finish(&command, code, stdout, options)
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn execute(&self, argv: &[String], options: ExecOptions) -> CommandResult {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.handle(argv, &options);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn handle_git(state: &mut FakeState, args: &[&str]) -> (i32, String) {
    let positional: Vec<&str> = args
        .iter()
        .copied()
        .filter(|a| *a != "config" && *a != "--global")
        .collect();
    let store_key = |key: &str| ("git".to_string(), USER.to_string(), key.to_string());

    match positional.as_slice() {
        ["--unset", key] => {
            if state.sticky_keys.contains(&("git".to_string(), key.to_string())) {
                return (0, String::new());
            }
            match state.store.remove(&store_key(key)) {
                Some(_) => (0, String::new()),
                None => (5, String::new()),
            }
        }
        [key, value] => {
            if !state.ignored_writes.contains(&("git".to_string(), key.to_string())) {
                state.store.insert(store_key(key), value.to_string());
            }
            (0, String::new())
        }
        [key] => match state.store.get(&store_key(key)) {
            Some(value) => (0, format!("{value}\n")),
            None => (1, String::new()),
        },
        _ => (129, String::new()),
    }
}

fn handle_config_cli(state: &mut FakeState, binary: &str, args: &[&str]) -> (i32, String) {
    let scope = args
        .iter()
        .find_map(|a| a.strip_prefix("--location="))
        .map(str::to_string);
    let positional: Vec<&str> = args
        .iter()
        .copied()
        .filter(|a| !a.starts_with("--") && *a != "pm")
        .collect();
    let strict = matches!(binary, "bun" | "pip");
    let write_scope = scope.clone().unwrap_or_else(|| USER.to_string());
    let store_key =
        |scope: &str, key: &str| (binary.to_string(), scope.to_string(), key.to_string());

    match positional.as_slice() {
        ["ping"] => (0, "PONG\n".to_string()),
        ["cache", "clean" | "verify" | "purge"] | ["store", "prune"] => (0, String::new()),
        ["cache", "dir"] | ["store", "path"] => {
            let key = match binary {
                "yarn" => "cache-folder",
                "pnpm" => "store-dir",
                "pip" => "global.cache-dir",
                _ => "cache",
            };
            match state.store.get(&store_key(USER, key)) {
                Some(value) => (0, format!("{value}\n")),
                None => (0, String::new()),
            }
        }
        ["config", "set", key, value] => {
            if !state
                .ignored_writes
                .contains(&(binary.to_string(), key.to_string()))
            {
                state
                    .store
                    .insert(store_key(&write_scope, key), value.to_string());
            }
            (0, String::new())
        }
        ["config", "delete" | "unset" | "rm", key] => {
            if state
                .sticky_keys
                .contains(&(binary.to_string(), key.to_string()))
            {
                return (0, String::new());
            }
            match state.store.remove(&store_key(&write_scope, key)) {
                Some(_) => (0, String::new()),
                None if strict => (1, String::new()),
                None => (0, String::new()),
            }
        }
        ["config", "get", key] => {
            let value = match &scope {
                Some(scope) => state.store.get(&store_key(scope, key)).cloned(),
                None => state
                    .store
                    .get(&store_key(USER, key))
                    .or_else(|| state.store.get(&store_key(GLOBAL, key)))
                    .cloned(),
            };
            match value {
                Some(value) => (0, format!("{value}\n")),
                None if strict => (1, String::new()),
                None if scope.is_some() => (0, "undefined\n".to_string()),
                None => (0, "null\n".to_string()),
            }
        }
        _ => (1, String::new()),
    }
}

fn finish(command: &str, code: i32, stdout: String, options: &ExecOptions) -> CommandResult {
    let outcome = match code {
        0 => CommandOutcome::Success,
        c if options.benign_exit_codes.contains(&c) => CommandOutcome::BenignEmpty,
        _ => CommandOutcome::Failed,
    };
    CommandResult {
        success: code == 0,
        outcome,
        return_code: code,
        stdout,
        stderr: if code == 0 {
            String::new()
        } else {
            format!("exit {code}")
        },
        command: command.to_string(),
        execution_time_ms: 1,
        truncated: false,
    }
}

pub(crate) fn ok(command: &str, stdout: &str) -> CommandResult {
    CommandResult {
        success: true,
        outcome: CommandOutcome::Success,
        return_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
        command: command.to_string(),
        execution_time_ms: 1,
        truncated: false,
    }
}

pub(crate) fn failed(command: &str, code: i32, stderr: &str) -> CommandResult {
    CommandResult {
        success: false,
        outcome: CommandOutcome::Failed,
        return_code: code,
        stdout: String::new(),
        stderr: stderr.to_string(),
        command: command.to_string(),
        execution_time_ms: 1,
        truncated: false,
    }
}

pub(crate) fn timed_out(command: &str) -> CommandResult {
    CommandResult {
        success: false,
        outcome: CommandOutcome::TimedOut,
        return_code: crate::utils::TIMEOUT_RETURN_CODE,
        stdout: String::new(),
        stderr: "命令执行超时（>5000ms）".to_string(),
        command: command.to_string(),
        execution_time_ms: 5000,
        truncated: false,
    }
}

fn spawn_failed(command: &str) -> CommandResult {
    CommandResult {
        success: false,
        outcome: CommandOutcome::SpawnFailed,
        return_code: crate::utils::SPAWN_FAILURE_RETURN_CODE,
        stdout: String::new(),
        stderr: "No such file or directory (os error 2)".to_string(),
        command: command.to_string(),
        execution_time_ms: 0,
        truncated: false,
    }
}
