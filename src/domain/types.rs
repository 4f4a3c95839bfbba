// ==========================================
// 井下矿山作业成本系统 - 领域类型定义
// ==========================================
// 职责: 班次/分组维度/货币参考/报表上下文
// ==========================================

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==========================================
// 班次 (Guardia)
// ==========================================
// 序列化格式: 与 costos 表存储值一致 ("Día" / "Noche")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Guardia {
    #[serde(rename = "Día")]
    Dia,
    #[serde(rename = "Noche")]
    Noche,
}

impl Guardia {
    /// 宽容解析班次字符串
    ///
    /// 历史数据混有带重音/不带重音/英文的写法,一律接受
    pub fn parse(raw: &str) -> Option<Guardia> {
        match raw.trim().to_lowercase().as_str() {
            "día" | "dia" | "day" | "d" => Some(Guardia::Dia),
            "noche" | "night" | "n" => Some(Guardia::Noche),
            _ => None,
        }
    }
}

impl fmt::Display for Guardia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guardia::Dia => write!(f, "Día"),
            Guardia::Noche => write!(f, "Noche"),
        }
    }
}

// ==========================================
// 分组维度 (Group Field)
// ==========================================
// 汇总引擎支持任意有序组合,默认 [Location]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupField {
    Location, // 劳动面/掘进面 (labor)
    Shift,    // 班次 (guardia)
    Category, // 物料类别 (categoría)
    Date,     // 日期 (fecha)
}

impl fmt::Display for GroupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupField::Location => write!(f, "LOCATION"),
            GroupField::Shift => write!(f, "SHIFT"),
            GroupField::Category => write!(f, "CATEGORY"),
            GroupField::Date => write!(f, "DATE"),
        }
    }
}

// ==========================================
// 货币参考 (Currency Reference)
// ==========================================
// 外部配置注入的标量,核心不负责刷新
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrencyReference {
    /// 美元汇率 (PEN / USD)
    pub dolar_exchange_rate: Decimal,
    /// 金价 (PEN / 克)
    pub gold_price_per_gram: Decimal,
}

impl Default for CurrencyReference {
    fn default() -> Self {
        Self {
            // 上游配置缺失时的兜底值
            dolar_exchange_rate: Decimal::new(375, 2),
            gold_price_per_gram: Decimal::new(24000, 2),
        }
    }
}

// ==========================================
// 报表上下文 (Report Context)
// ==========================================
// 显式传递的请求身份 + 固定时间戳
// 红线: 渲染器不得读取环境时间,保证可复现
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportContext {
    /// 下载用户名 (报表审计头第2行)
    pub user: String,
    /// 用户角色
    pub role: String,
    /// 生成时间 (固定注入,非环境读取)
    pub generated_at: NaiveDateTime,
    /// 报表运行标识 (日志关联)
    pub report_id: Uuid,
}

impl ReportContext {
    /// 创建报表上下文 (当前本地时间)
    pub fn new(user: &str, role: &str) -> Self {
        Self::with_timestamp(user, role, chrono::Local::now().naive_local())
    }

    /// 创建固定时间戳的报表上下文
    ///
    /// 测试与确定性校验使用此构造
    pub fn with_timestamp(user: &str, role: &str, generated_at: NaiveDateTime) -> Self {
        Self {
            user: user.to_string(),
            role: role.to_string(),
            generated_at,
            report_id: Uuid::new_v4(),
        }
    }
}

// ==========================================
// 报表工件 (Report Artifact)
// ==========================================
// 内存二进制,每次请求生成并返回,核心不落盘不缓存
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    /// 工件字节
    pub bytes: Vec<u8>,
    /// MIME 类型
    pub mime: &'static str,
    /// 建议文件名
    pub filename: String,
}

/// Excel 工件 MIME 类型
pub const MIME_XLSX: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// CSV 降级工件 MIME 类型
pub const MIME_CSV: &str = "text/csv";
