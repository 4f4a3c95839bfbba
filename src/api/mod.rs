// ==========================================
// 井下矿山作业成本系统 - API 层
// ==========================================
// 职责: 编排 取数 → 归一化 → 汇总 → 渲染,
//       对外提供报表与看板接口
// ==========================================

pub mod error;
pub mod report_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use report_api::{
    CostRecordSource, ExchangeRateProvider, ReportApi, ReportOutcome, ReportRequest,
};
