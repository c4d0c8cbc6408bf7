//! 服务层 - 账本上层服务
//!
//! # 服务列表
//!
//! - [`AdminService`] - 业主后台：村庄、产品、代理、客户、分期销售的创建
//! - [`ReportService`] - 报表与导出：统计、村庄应收、快照

pub mod admin;
pub mod reports;

pub use admin::AdminService;
pub use reports::ReportService;
