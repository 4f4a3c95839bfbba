// ==========================================
// 井下矿山作业成本系统 - 报表层
// ==========================================
// 职责: 从规范化记录 + 汇总行生成二进制工件
// 契约: 三页工作簿 (汇总/明细/类别分析) + 降级 CSV
// 红线: 工件要么完整 (允许降级省略), 要么不产出;
//       绝不返回半成品
// ==========================================

pub mod csv;
pub mod error;
pub mod excel;
pub mod labels;

// 重导出核心类型
pub use csv::CsvReportRenderer;
pub use error::ReportError;
pub use excel::{ExcelReportRenderer, WorkbookOutput};
pub use labels::{DetailColumn, SUMMARY_MEASURE_LABELS};
