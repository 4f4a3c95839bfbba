// ==========================================
// 井下矿山作业成本系统 - 配置层
// ==========================================
// 职责: 报表品牌与货币默认值
// 存储: JSON 配置文件 (缺失时使用内置默认)
// 说明: 汇率/金价由上游市场行情协作方刷新,
//       此处只保存兜底默认值
// ==========================================

use crate::domain::types::CurrencyReference;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ==========================================
// ReportConfig - 报表配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// 品牌名 (文件名前缀)
    pub brand: String,
    /// 报表主标题 (每页审计头第 1 行前缀)
    pub report_title: String,
    /// 美元汇率兜底值 (PEN / USD)
    pub default_exchange_rate: Decimal,
    /// 金价兜底值 (PEN / 克)
    pub default_gold_price: Decimal,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            brand: "Pukamani".to_string(),
            report_title: "REPORTE DE COSTOS OPERATIVOS".to_string(),
            default_exchange_rate: Decimal::new(375, 2),
            default_gold_price: Decimal::new(24000, 2),
        }
    }
}

impl ReportConfig {
    /// 从 JSON 文件加载配置
    ///
    /// # 参数
    /// - path: 配置文件路径
    ///
    /// # 返回
    /// - Ok(config): 加载成功
    /// - Err: 文件不可读或 JSON 非法 (缺失键用默认值补齐)
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: ReportConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// 兜底货币参考 (上游行情不可用时)
    pub fn currency_reference(&self) -> CurrencyReference {
        CurrencyReference {
            dolar_exchange_rate: self.default_exchange_rate,
            gold_price_per_gram: self.default_gold_price,
        }
    }
}
