//! Edge Ledger - 离线分期收款账本节点
//!
//! # 架构概述
//!
//! 代理在无网络的村庄收取分期款，数据先写入本地 SQLite，联网后与远端文档存储同步。
//!
//! - **账本存储** (`ledger`): 按业主分区的本地存储
//! - **还款计划** (`schedule`): 到期日推进、到期判断
//! - **收款流程** (`collection`): 金额校验 + 原子写入
//! - **会话** (`session`): 业主 / 代理登录
//! - **同步** (`cloud_sync`): push → publish → pull
//!
//! # 模块结构
//!
//! ```text
//! edge-ledger/src/
//! ├── core/          # 配置
//! ├── db/            # SQLite 连接池 + repository
//! ├── ledger/        # 业主分区存储
//! ├── session/       # 登录、凭证
//! ├── cloud_sync/    # 同步引擎、远端存储、后台 worker
//! ├── services/      # 业主后台、报表
//! └── utils/         # 日志
//! ```

pub mod cloud_sync;
pub mod collection;
pub mod core;
pub mod db;
pub mod ledger;
pub mod schedule;
pub mod services;
pub mod session;
pub mod utils;

// Re-export 公共类型
pub use cloud_sync::{MemoryRemoteStore, RemoteStore, SyncEngine, SyncReport, SyncWorker};
pub use collection::CollectionService;
pub use core::Config;
pub use ledger::{Ledger, LedgerStore};
pub use session::{Principal, Session, SessionContext};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

// Security logging macro - 登录成功/失败等安全事件
#[macro_export]
macro_rules! security_log {
    (WARN, $event:expr, $($arg:tt)*) => {
        tracing::warn!(
            target: "security",
            event = $event,
            timestamp = chrono::Local::now().to_rfc3339(),
            level = "WARN",
            $($arg)*
        );
    };
    (ERROR, $event:expr, $($arg:tt)*) => {
        tracing::error!(
            target: "security",
            event = $event,
            timestamp = chrono::Local::now().to_rfc3339(),
            level = "ERROR",
            $($arg)*
        );
    };
    (INFO, $event:expr, $($arg:tt)*) => {
        tracing::info!(
            target: "security",
            event = $event,
            timestamp = chrono::Local::now().to_rfc3339(),
            level = "INFO",
            $($arg)*
        );
    };
}

/// 设置运行环境: 工作目录、日志
pub fn setup_environment(config: &Config) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.work_dir)?;
    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    init_logger_with_file(&config.log_level, config.log_json, Some(&log_dir))?;

    match cleanup_old_logs(&log_dir) {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, "Old log files removed"),
        Err(e) => tracing::warn!("Failed to clean up old logs: {e}"),
    }
    Ok(())
}
