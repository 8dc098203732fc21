// devkit 命令行入口：解析参数后调用 commands，结果以 JSON 输出到 stdout

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;

use devkit::commands::{self, AppState};
use devkit::models::LogLevel;
use devkit::{init_logger, load_engine_config, update_log_level, write_engine_config};

#[derive(Debug, Clone, Parser, PartialEq, Eq)]
#[command(
    name = "devkit",
    version,
    about = "开发工具代理、镜像源与缓存目录配置"
)]
struct CliArgs {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
enum CliCommand {
    /// 列出所有工具
    List,
    /// 查询工具状态（不指定则查询全部）
    Info { tool_ids: Vec<String> },
    /// 是否已安装
    Installed { tool_id: String },
    /// 查询版本
    Version { tool_id: String },
    /// 列出工具分类
    Categories,
    /// 按分类列出工具（如 package_manager、dev_tool）
    Category { name: String },

    /// 为一个或多个工具启用代理
    EnableProxy {
        proxy_url: String,
        #[arg(required = true)]
        tool_ids: Vec<String>,
    },
    /// 为一个或多个工具禁用代理
    DisableProxy {
        #[arg(required = true)]
        tool_ids: Vec<String>,
    },
    /// 工具当前是否配置了代理
    ProxyEnabled { tool_id: String },
    SetRegistry { tool_id: String, url: String },
    /// 设置缓存目录，目录不存在时自动创建
    SetCacheDir { tool_id: String, dir: String },
    /// 清理工具缓存
    CleanCache { tool_id: String },
    /// 缓存路径和占用空间
    CacheInfo { tool_id: String },
    /// 镜像源测速（不指定地址则测当前镜像源）
    TestRegistry { tool_id: String, url: Option<String> },

    /// 代理是否可用
    TestProxy { proxy_url: String },
    /// 代理连通性详细结果
    ProbeProxy { proxy_url: String },

    /// 单个配置键的分层快照
    Precedence { tool_id: String, key: String },
    /// npm 配置诊断报告
    NpmDiagnose,
    /// 把配置值固定到 npm user 层
    NpmPin { key: String, value: String },
    /// 清理 npm global 配置（不指定键则清理默认清单）
    NpmClearGlobal { keys: Vec<String> },
    NpmPing { url: String },

    /// 引擎配置
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
enum ConfigAction {
    /// 输出当前引擎配置
    Show,
    /// 修改并保存日志级别
    SetLogLevel {
        #[arg(value_parser = parse_log_level)]
        level: LogLevel,
    },
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    LogLevel::parse(value)
        .ok_or_else(|| format!("无效的日志级别: {value}（可选 error/warn/info/debug/trace）"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let config = load_engine_config();
    if let Err(e) = init_logger(&config.log_config) {
        eprintln!("日志系统初始化失败: {e}");
    }
    tracing::debug!(command = ?args.command, "执行命令");

    let state = AppState::new(config);
    run(&state, args.command).await
}

async fn run(state: &AppState, command: CliCommand) -> anyhow::Result<()> {
    match command {
        CliCommand::List => print_json(&commands::list_tools(state)),
        CliCommand::Info { tool_ids } => {
            print_json(&commands::get_tools_info(state, &tool_ids).await)
        }
        CliCommand::Installed { tool_id } => print_json(
            &commands::is_installed(state, &tool_id)
                .await
                .map_err(anyhow::Error::msg)?,
        ),
        CliCommand::Version { tool_id } => print_json(
            &commands::get_version(state, &tool_id)
                .await
                .map_err(anyhow::Error::msg)?,
        ),
        CliCommand::Categories => print_json(&commands::get_categories(state)),
        CliCommand::Category { name } => print_json(
            &commands::get_tools_by_category(state, &name).map_err(anyhow::Error::msg)?,
        ),

        CliCommand::EnableProxy {
            proxy_url,
            tool_ids,
        } => {
            let batch = commands::enable_proxy_batch(state, &tool_ids, &proxy_url).await;
            print_json(&batch)?;
            exit_on_failure(batch.failure_count == 0)
        }
        CliCommand::DisableProxy { tool_ids } => {
            let batch = commands::disable_proxy_batch(state, &tool_ids).await;
            print_json(&batch)?;
            exit_on_failure(batch.failure_count == 0)
        }
        CliCommand::ProxyEnabled { tool_id } => print_json(
            &commands::is_proxy_enabled(state, &tool_id)
                .await
                .map_err(anyhow::Error::msg)?,
        ),
        CliCommand::SetRegistry { tool_id, url } => {
            let result = commands::set_registry(state, &tool_id, &url)
                .await
                .map_err(anyhow::Error::msg)?;
            print_json(&result)?;
            exit_on_failure(result.success)
        }
        CliCommand::SetCacheDir { tool_id, dir } => {
            let result = commands::set_cache_dir(state, &tool_id, &dir)
                .await
                .map_err(anyhow::Error::msg)?;
            print_json(&result)?;
            exit_on_failure(result.success)
        }
        CliCommand::CleanCache { tool_id } => {
            let result = commands::clean_cache(state, &tool_id)
                .await
                .map_err(anyhow::Error::msg)?;
            print_json(&result)?;
            exit_on_failure(result.success)
        }
        CliCommand::CacheInfo { tool_id } => print_json(
            &commands::get_cache_info(state, &tool_id)
                .await
                .map_err(anyhow::Error::msg)?,
        ),
        CliCommand::TestRegistry { tool_id, url } => {
            let ping = commands::test_registry(state, &tool_id, url.as_deref())
                .await
                .map_err(anyhow::Error::msg)?;
            print_json(&ping)?;
            exit_on_failure(ping.success)
        }

        CliCommand::TestProxy { proxy_url } => {
            print_json(&commands::test_proxy(state, &proxy_url).await)
        }
        CliCommand::ProbeProxy { proxy_url } => {
            print_json(&commands::probe_proxy(state, &proxy_url).await)
        }

        CliCommand::Precedence { tool_id, key } => print_json(
            &commands::get_precedence_snapshot(state, &tool_id, &key)
                .await
                .map_err(anyhow::Error::msg)?,
        ),
        CliCommand::NpmDiagnose => print_json(
            &commands::npm_diagnose(state)
                .await
                .map_err(anyhow::Error::msg)?,
        ),
        CliCommand::NpmPin { key, value } => {
            let result = commands::npm_pin_user_value(state, &key, &value)
                .await
                .map_err(anyhow::Error::msg)?;
            print_json(&result)?;
            exit_on_failure(result.success)
        }
        CliCommand::NpmClearGlobal { keys } => {
            let batch = commands::npm_clear_global_config(state, &keys)
                .await
                .map_err(anyhow::Error::msg)?;
            print_json(&batch)?;
            exit_on_failure(batch.failure_count == 0)
        }
        CliCommand::NpmPing { url } => print_json(
            &commands::npm_ping_registry(state, &url)
                .await
                .map_err(anyhow::Error::msg)?,
        ),

        CliCommand::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => print_json(&state.config),
            ConfigAction::SetLogLevel { level } => {
                let mut config = state.config.clone();
                config.log_config.level = level;
                write_engine_config(&config).context("保存引擎配置失败")?;
                // 本次进程立即生效；日志系统未初始化时只保存配置
                if let Err(e) = update_log_level(level) {
                    tracing::debug!(error = %e, "未能热更新日志级别");
                }
                print_json(&config)
            }
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("序列化输出失败")?;
    println!("{json}");
    Ok(())
}

fn exit_on_failure(success: bool) -> anyhow::Result<()> {
    if !success {
        bail!("操作未全部成功，详见上方输出");
    }
    Ok(())
}
