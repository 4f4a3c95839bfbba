// ==========================================
// 井下矿山作业成本系统 - 成本汇总引擎
// ==========================================
// 职责: 按任意分组维度组合计算成本汇总行,
//       类别透视 (Pareto), 货币折算, 看板 KPI 合计
// 红线: 纯函数,无副作用; Decimal 精确累加
// 红线: 分组输出按首次出现顺序,保证报表可复现
// ==========================================

use crate::domain::record::CostRecord;
use crate::domain::rollup::{CostRollup, CostSummary};
use crate::domain::types::{CurrencyReference, GroupField};
use rust_decimal::Decimal;
use std::collections::HashMap;

// ==========================================
// CostAggregator - 成本汇总引擎
// ==========================================
// 红线: 无状态引擎,所有方法都是纯函数
pub struct CostAggregator;

impl CostAggregator {
    /// 创建新的汇总引擎
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 按分组维度组合计算汇总行
    ///
    /// # 参数
    /// - records: 规范化记录
    /// - group_by: 有序分组维度集 (默认调用方传 [Location])
    ///
    /// # 返回
    /// 汇总行序列,按分组键首次出现顺序排列
    ///
    /// # 数值语义
    /// - Decimal 精确累加,避免分位漂移
    /// - 单位成本 = 总成本/进尺, 进尺为 0 时取 0 (不抛除零)
    /// - 进尺/吨位按原值求和,不重新分配 (上游保证单行携带)
    pub fn aggregate(&self, records: &[CostRecord], group_by: &[GroupField]) -> Vec<CostRollup> {
        let mut rollups: Vec<CostRollup> = Vec::new();
        let mut index: HashMap<Vec<String>, usize> = HashMap::new();

        for record in records {
            let key: Vec<String> = group_by
                .iter()
                .map(|field| Self::key_of(record, *field))
                .collect();

            let pos = match index.get(&key) {
                Some(pos) => *pos,
                None => {
                    let group = group_by
                        .iter()
                        .zip(key.iter())
                        .map(|(f, v)| (*f, v.clone()))
                        .collect();
                    rollups.push(CostRollup {
                        group,
                        advance_m: Decimal::ZERO,
                        tonnage_tm: Decimal::ZERO,
                        total_cost: Decimal::ZERO,
                        unit_cost: Decimal::ZERO,
                    });
                    index.insert(key, rollups.len() - 1);
                    rollups.len() - 1
                }
            };

            let rollup = &mut rollups[pos];
            rollup.advance_m += record.advance_m;
            rollup.tonnage_tm += record.tonnage_tm;
            rollup.total_cost += record.total_cost;
        }

        // 派生单位成本 (零进尺守护)
        for rollup in &mut rollups {
            rollup.unit_cost = if rollup.advance_m > Decimal::ZERO {
                rollup.total_cost / rollup.advance_m
            } else {
                Decimal::ZERO
            };
        }

        tracing::debug!(
            records = records.len(),
            groups = rollups.len(),
            "成本汇总完成"
        );
        rollups
    }

    /// 类别成本透视 (报表第 3 页数据源)
    ///
    /// # 返回
    /// (类别, 成本合计),按成本严格降序;
    /// 成本相同时按类别名升序,保证确定性 (Pareto 契约)
    pub fn pivot_by_category(&self, records: &[CostRecord]) -> Vec<(String, Decimal)> {
        let rollups = self.aggregate(records, &[GroupField::Category]);
        let mut pivot: Vec<(String, Decimal)> = rollups
            .into_iter()
            .map(|r| {
                let category = r
                    .key(GroupField::Category)
                    .unwrap_or_default()
                    .to_string();
                (category, r.total_cost)
            })
            .collect();
        pivot.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pivot
    }

    /// 货币折算: 索尔合计 → 替代货币
    ///
    /// 汇率为 0 属上游数据质量问题,此处守护取 0 不抛错
    pub fn to_alt_currency(&self, total: Decimal, rate: Decimal) -> Decimal {
        if rate == Decimal::ZERO {
            Decimal::ZERO
        } else {
            total / rate
        }
    }

    /// 看板 KPI 合计
    ///
    /// # 参数
    /// - records: 规范化记录
    /// - currency: 注入的货币参考 (核心不负责刷新)
    pub fn summarize(&self, records: &[CostRecord], currency: &CurrencyReference) -> CostSummary {
        let mut total_pen = Decimal::ZERO;
        let mut advance_total = Decimal::ZERO;
        let mut tonnage_total = Decimal::ZERO;
        for record in records {
            total_pen += record.total_cost;
            advance_total += record.advance_m;
            tonnage_total += record.tonnage_tm;
        }
        CostSummary {
            total_pen,
            total_usd: self.to_alt_currency(total_pen, currency.dolar_exchange_rate),
            advance_total,
            tonnage_total,
            record_count: records.len(),
        }
    }

    /// 记录在指定维度上的键值投影
    fn key_of(record: &CostRecord, field: GroupField) -> String {
        match field {
            GroupField::Location => record.location.clone(),
            GroupField::Shift => record.shift.to_string(),
            GroupField::Category => record.category.clone(),
            GroupField::Date => record
                .date
                .map(|d| d.to_string())
                .unwrap_or_default(),
        }
    }
}

impl Default for CostAggregator {
    fn default() -> Self {
        Self::new()
    }
}
