// ==========================================
// 井下矿山作业成本系统 - 报表层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 报表层错误类型
#[derive(Error, Debug)]
pub enum ReportError {
    // ===== 流水线级 =====
    /// 请求期间无可用数据; 调用方呈现"无数据",不视为异常
    #[error("无可用数据, 不生成工件")]
    NoData,

    // ===== 工件写入 =====
    #[error("工作簿写入失败: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV 缓冲回收失败: {0}")]
    CsvBuffer(String),
}
