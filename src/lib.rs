// ==========================================
// 井下矿山作业成本系统 - 核心库
// ==========================================
// 技术栈: Rust + rust_xlsxwriter
// 系统定位: 成本汇总与报表导出 (批处理, 快照只读)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 业务规则 (归一化 / 汇总)
pub mod engine;

// 报表层 - 工件生成 (Excel / CSV)
pub mod report;

// 配置层 - 报表品牌与货币默认值
pub mod config;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    CurrencyReference, GroupField, Guardia, ReportArtifact, ReportContext,
};

// 领域实体
pub use domain::{CostRecord, CostRollup, CostSummary, RawRow};

// 引擎
pub use engine::{
    CostAggregator, DataIssue, IssueKind, NormalizeOutcome, RecordNormalizer, SchemaShape,
};

// 报表
pub use report::{CsvReportRenderer, ExcelReportRenderer, ReportError};

// 配置
pub use config::ReportConfig;

// API
pub use api::{
    ApiError, ApiResult, CostRecordSource, ExchangeRateProvider, ReportApi, ReportOutcome,
    ReportRequest,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "井下矿山作业成本系统";
