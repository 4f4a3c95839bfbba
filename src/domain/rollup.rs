// ==========================================
// 井下矿山作业成本系统 - 汇总实体
// ==========================================
// 职责: 分组汇总行与看板 KPI 合计
// 生命周期: 每次报表生成即时重算,不持久化
// ==========================================

use crate::domain::types::GroupField;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// CostRollup - 成本汇总行
// ==========================================
// 默认按劳动面分组,一个分组键一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRollup {
    /// 分组键 (维度, 取值), 保持调用方给定的维度顺序
    pub group: Vec<(GroupField, String)>,
    /// 进尺合计 (米)
    pub advance_m: Decimal,
    /// 矿石吨位合计 (TM)
    pub tonnage_tm: Decimal,
    /// 总成本合计 (索尔)
    pub total_cost: Decimal,
    /// 单位成本 = 总成本 / 进尺; 进尺为 0 时取 0
    pub unit_cost: Decimal,
}

impl CostRollup {
    /// 取指定维度的键值
    pub fn key(&self, field: GroupField) -> Option<&str> {
        self.group
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }
}

// ==========================================
// CostSummary - 看板 KPI 合计
// ==========================================
// 供驾驶舱展示层消费 (展示层本身在核心之外)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    /// 总支出 (索尔)
    pub total_pen: Decimal,
    /// 美元等值 (按注入汇率折算)
    pub total_usd: Decimal,
    /// 进尺合计 (米)
    pub advance_total: Decimal,
    /// 矿石吨位合计 (TM)
    pub tonnage_total: Decimal,
    /// 记录条数
    pub record_count: usize,
}
