// ==========================================
// 井下矿山作业成本系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎 (归一化 / 汇总)
// 红线: 引擎无状态,纯函数,不做 I/O
// 红线: 行级数据问题吸收计数,绝不中断整个流水线
// ==========================================

pub mod aggregator;
pub mod normalizer;

// 重导出核心引擎
pub use aggregator::CostAggregator;
pub use normalizer::{DataIssue, IssueKind, NormalizeOutcome, RecordNormalizer, SchemaShape};
