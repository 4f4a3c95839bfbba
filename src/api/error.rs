// ==========================================
// 井下矿山作业成本系统 - API 层错误类型
// ==========================================
// 职责: 转换下层错误为带显式原因的用户可读错误
// 工具: thiserror 派生宏
// ==========================================

use crate::report::error::ReportError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 输入校验 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ===== 外部协作方 =====
    /// 外部取数协作方失败 (连接/查询)
    #[error("成本记录取数失败: {0}")]
    SourceFailure(#[source] anyhow::Error),

    // ===== 渲染 =====
    /// 样式化与降级渲染均失败
    #[error("报表渲染失败: {0}")]
    RenderFailure(#[from] ReportError),
}

/// API 层结果类型
pub type ApiResult<T> = Result<T, ApiError>;
