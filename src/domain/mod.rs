// ==========================================
// 井下矿山作业成本系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod record;
pub mod rollup;
pub mod types;

// 重导出核心类型
pub use record::{CostRecord, RawRow};
pub use rollup::{CostRollup, CostSummary};
pub use types::{CurrencyReference, GroupField, Guardia, ReportArtifact, ReportContext};
