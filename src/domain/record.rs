// ==========================================
// 井下矿山作业成本系统 - 消耗记录实体
// ==========================================
// 职责: 规范化后的单条成本/进尺记录
// 来源: 班报录入 (上游协作方写入), 核心只读
// ==========================================

use crate::domain::types::Guardia;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 原始查询行
///
/// 外部持久化协作方返回的键值行,列名大小写与
/// 历史版本不一致,由归一化引擎统一处理
pub type RawRow = serde_json::Map<String, serde_json::Value>;

// ==========================================
// CostRecord - 规范化消耗记录
// ==========================================
// 不变量: 所有数值字段非负
// 不变量: cantidad × 单价 与 总成本在 2 位小数容差内一致
// 不变量: 每个 (日期, 班次, 劳动面) 批次只有一行携带
//         advance_m / tonnage_tm,由上游录入路径保证;
//         核心按原值求和,绝不重新分配 (重分配需要上游才有的信息)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    /// 日期 (历史数据可能缺失或无法解析)
    pub date: Option<NaiveDate>,
    /// 班次
    pub shift: Guardia,
    /// 劳动面/掘进面编码 (必填)
    pub location: String,
    /// 物料类别: Explosivos / Accesorios / Madera / Aceros
    /// 以及历史自由值 (AVANCE, General) (必填)
    pub category: String,
    /// 物料名称 (纯进尺行为 None)
    pub material: Option<String>,
    /// 计量单位
    pub unit: String,
    /// 消耗数量
    pub quantity: Decimal,
    /// 单价 (未知时为 0)
    pub unit_price: Decimal,
    /// 总成本 (索尔)
    pub total_cost: Decimal,
    /// 进尺 (米), 默认 0
    pub advance_m: Decimal,
    /// 矿石吨位 (TM), 默认 0
    pub tonnage_tm: Decimal,
    /// 录入人
    pub recorded_by: String,
}

impl CostRecord {
    /// 校验数量×单价与总成本的一致性 (2 位小数容差)
    ///
    /// 任一侧为 0 视为"独立提供",不参与校验
    pub fn cost_consistent(&self) -> bool {
        if self.quantity == Decimal::ZERO || self.unit_price == Decimal::ZERO {
            return true;
        }
        let derived = (self.quantity * self.unit_price).round_dp(2);
        let diff = (derived - self.total_cost.round_dp(2)).abs();
        diff <= Decimal::new(1, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(quantity: Decimal, unit_price: Decimal, total_cost: Decimal) -> CostRecord {
        CostRecord {
            date: None,
            shift: Guardia::Dia,
            location: "T-101".to_string(),
            category: "Explosivos".to_string(),
            material: Some("Dinamita 65%".to_string()),
            unit: "und".to_string(),
            quantity,
            unit_price,
            total_cost,
            advance_m: Decimal::ZERO,
            tonnage_tm: Decimal::ZERO,
            recorded_by: "operador1".to_string(),
        }
    }

    #[test]
    fn cost_consistent_within_tolerance() {
        assert!(record(dec!(10), dec!(5), dec!(50)).cost_consistent());
        assert!(record(dec!(3), dec!(3.333), dec!(10.00)).cost_consistent());
    }

    #[test]
    fn cost_inconsistent_beyond_tolerance() {
        assert!(!record(dec!(10), dec!(5), dec!(55)).cost_consistent());
    }

    #[test]
    fn zero_side_means_independently_supplied() {
        assert!(record(dec!(0), dec!(5), dec!(120)).cost_consistent());
        assert!(record(dec!(10), dec!(0), dec!(120)).cost_consistent());
    }
}
