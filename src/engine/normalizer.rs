// ==========================================
// 井下矿山作业成本系统 - 记录归一化引擎
// ==========================================
// 职责: 把历史版本列名不一致的原始查询行
//       映射为规范化 CostRecord
// 输入: 外部持久化协作方的键值行 (无版本标签)
// 输出: 规范化记录序列 + 跳过计数 + 问题清单
// 红线: 单行数据坏不拖垮整批,数值坏值替 0 并计数
// ==========================================

use crate::domain::record::{CostRecord, RawRow};
use crate::domain::types::Guardia;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;

// ==========================================
// 历史表结构版本 (Schema Shape)
// ==========================================
// costos 表跨版本改过列名,按键集打标签分派,
// 每个版本一张固定列映射表,不做散落的模糊匹配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaShape {
    /// 图表版: precio_total / detalle / mineral_tm
    CostosV2,
    /// 早期版: costo_pen / insumo / tm
    CostosV1,
}

/// 单个版本的列映射表
struct ColumnMap {
    date: &'static str,
    shift: &'static str,
    location: &'static str,
    category: &'static str,
    material: &'static str,
    unit: &'static str,
    quantity: &'static str,
    unit_price: &'static str,
    total_cost: &'static str,
    advance: &'static str,
    tonnage: &'static str,
    /// 同一版本内录入人列名也出现过两种写法
    recorded_by: &'static [&'static str],
}

const COSTOS_V2: ColumnMap = ColumnMap {
    date: "fecha",
    shift: "guardia",
    location: "labor",
    category: "categoria",
    material: "detalle",
    unit: "unidad",
    quantity: "cantidad",
    unit_price: "precio_unit",
    total_cost: "precio_total",
    advance: "avance",
    tonnage: "mineral_tm",
    recorded_by: &["usuario_registro", "usuario"],
};

const COSTOS_V1: ColumnMap = ColumnMap {
    date: "fecha",
    shift: "guardia",
    location: "labor",
    category: "categoria",
    material: "insumo",
    unit: "unidad",
    quantity: "cantidad",
    unit_price: "precio_unit",
    total_cost: "costo_pen",
    advance: "avance",
    tonnage: "tm",
    recorded_by: &["usuario_registro", "usuario"],
};

impl SchemaShape {
    /// 按批次键集识别表结构版本
    ///
    /// # 参数
    /// - keys: 全批次小写列名并集
    ///
    /// # 返回
    /// - Some(shape): 识别成功
    /// - None: 未知结构 (整批跳过,不报错)
    pub fn detect(keys: &HashSet<String>) -> Option<SchemaShape> {
        if keys.contains("precio_total") {
            Some(SchemaShape::CostosV2)
        } else if keys.contains("costo_pen") {
            Some(SchemaShape::CostosV1)
        } else {
            None
        }
    }

    fn columns(&self) -> &'static ColumnMap {
        match self {
            SchemaShape::CostosV2 => &COSTOS_V2,
            SchemaShape::CostosV1 => &COSTOS_V1,
        }
    }
}

impl fmt::Display for SchemaShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaShape::CostosV2 => write!(f, "COSTOS_V2"),
            SchemaShape::CostosV1 => write!(f, "COSTOS_V1"),
        }
    }
}

// ==========================================
// 可恢复数据问题 (Data Issue)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    /// 数值解析失败,替 0
    BadNumeric,
    /// 负值钳为 0
    NegativeValue,
    /// 必填字段缺失,整行跳过
    MissingRequired,
    /// 数量×单价与总成本超出容差
    CostMismatch,
    /// 日期无法解析,置空
    BadDate,
    /// 班次无法解析,默认白班
    BadShift,
    /// 整批表结构未知
    UnknownSchema,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::BadNumeric => write!(f, "BAD_NUMERIC"),
            IssueKind::NegativeValue => write!(f, "NEGATIVE_VALUE"),
            IssueKind::MissingRequired => write!(f, "MISSING_REQUIRED"),
            IssueKind::CostMismatch => write!(f, "COST_MISMATCH"),
            IssueKind::BadDate => write!(f, "BAD_DATE"),
            IssueKind::BadShift => write!(f, "BAD_SHIFT"),
            IssueKind::UnknownSchema => write!(f, "UNKNOWN_SCHEMA"),
        }
    }
}

/// 单条可恢复问题记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIssue {
    /// 原始行下标 (0 起)
    pub row: usize,
    /// 规范化字段名
    pub field: String,
    /// 问题类别
    pub kind: IssueKind,
    /// 问题描述
    pub detail: String,
}

// ==========================================
// 归一化结果 (Normalize Outcome)
// ==========================================
// 显式返回 (值, 可恢复问题清单),不用异常做控制流
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    /// 规范化记录,保持输入顺序
    pub records: Vec<CostRecord>,
    /// 因必填字段缺失被跳过的行数
    pub skipped: usize,
    /// 吸收的可恢复问题
    pub issues: Vec<DataIssue>,
}

impl NormalizeOutcome {
    /// 可恢复问题条数
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }
}

// ==========================================
// RecordNormalizer - 归一化引擎
// ==========================================
// 红线: 无状态引擎,所有方法都是纯函数
pub struct RecordNormalizer;

impl RecordNormalizer {
    /// 创建新的归一化引擎
    pub fn new() -> Self {
        Self
    }

    /// 归一化一批原始查询行
    ///
    /// # 参数
    /// - rows: 原始键值行 (列名大小写混杂)
    ///
    /// # 返回
    /// 归一化结果; 单行问题吸收计数,绝不返回 Err
    pub fn normalize(&self, rows: &[RawRow]) -> NormalizeOutcome {
        let mut outcome = NormalizeOutcome::default();
        if rows.is_empty() {
            return outcome;
        }

        // 全批次小写列名并集 → 版本识别
        let keys: HashSet<String> = rows
            .iter()
            .flat_map(|r| r.keys().map(|k| k.to_lowercase()))
            .collect();

        let batch_shape = match SchemaShape::detect(&keys) {
            Some(shape) => shape,
            None => {
                tracing::warn!(rows = rows.len(), "未知表结构版本, 整批跳过");
                outcome.skipped = rows.len();
                outcome.issues.push(DataIssue {
                    row: 0,
                    field: "*".to_string(),
                    kind: IssueKind::UnknownSchema,
                    detail: format!("无法识别列集: {} 列", keys.len()),
                });
                return outcome;
            }
        };
        tracing::debug!(shape = %batch_shape, rows = rows.len(), "表结构版本识别完成");

        for (idx, row) in rows.iter().enumerate() {
            // 统一小写键,消除历史大小写混杂 (Costo_PEN vs costo_pen)
            let lower: HashMap<String, &Value> = row
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect();

            // 混合批次各行按自带版本标记映射, 无标记行退回批次版本;
            // 否则 V1 行经 V2 表映射会静默丢总成本
            let row_keys: HashSet<String> = lower.keys().cloned().collect();
            let shape = SchemaShape::detect(&row_keys).unwrap_or(batch_shape);
            let cols = shape.columns();

            match self.map_row(idx, &lower, cols, &mut outcome.issues) {
                Some(record) => outcome.records.push(record),
                None => outcome.skipped += 1,
            }
        }

        if outcome.skipped > 0 || !outcome.issues.is_empty() {
            tracing::warn!(
                records = outcome.records.len(),
                skipped = outcome.skipped,
                issues = outcome.issues.len(),
                "归一化吸收了数据质量问题"
            );
        }
        outcome
    }

    // ==========================================
    // 行映射
    // ==========================================

    /// 映射单行; 必填字段缺失返回 None (行跳过)
    fn map_row(
        &self,
        idx: usize,
        lower: &HashMap<String, &Value>,
        cols: &ColumnMap,
        issues: &mut Vec<DataIssue>,
    ) -> Option<CostRecord> {
        // 必填非数值字段: 劳动面 / 类别
        let location = match read_string(lower, cols.location) {
            Some(v) => v,
            None => {
                push_issue(issues, idx, "location", IssueKind::MissingRequired, "劳动面缺失");
                return None;
            }
        };
        let category = match read_string(lower, cols.category) {
            Some(v) => v,
            None => {
                push_issue(issues, idx, "category", IssueKind::MissingRequired, "类别缺失");
                return None;
            }
        };

        let material = read_string(lower, cols.material);
        let unit = read_string(lower, cols.unit).unwrap_or_default();
        let recorded_by = cols
            .recorded_by
            .iter()
            .find_map(|key| read_string(lower, key))
            .unwrap_or_default();

        let date = self.read_date(idx, lower, cols.date, issues);
        let shift = self.read_shift(idx, lower, cols.shift, issues);

        let quantity = self.read_decimal(idx, lower, cols.quantity, "quantity", issues);
        let unit_price = self.read_decimal(idx, lower, cols.unit_price, "unit_price", issues);
        let (total_supplied, total_present) =
            self.read_decimal_raw(idx, lower, cols.total_cost, "total_cost", issues);
        let advance_m = self.read_decimal(idx, lower, cols.advance, "advance_m", issues);
        let tonnage_tm = self.read_decimal(idx, lower, cols.tonnage, "tonnage_tm", issues);

        // 总成本缺失时由数量×单价推导; 两侧都有且超容差时保留供给值并计数
        let total_cost = if !total_present
            && quantity > Decimal::ZERO
            && unit_price > Decimal::ZERO
        {
            (quantity * unit_price).round_dp(2)
        } else {
            total_supplied
        };

        let record = CostRecord {
            date,
            shift,
            location,
            category,
            material,
            unit,
            quantity,
            unit_price,
            total_cost,
            advance_m,
            tonnage_tm,
            recorded_by,
        };

        if !record.cost_consistent() {
            push_issue(
                issues,
                idx,
                "total_cost",
                IssueKind::CostMismatch,
                &format!(
                    "cantidad {} × precio {} ≠ total {}",
                    record.quantity, record.unit_price, record.total_cost
                ),
            );
        }
        Some(record)
    }

    /// 读取数值字段, 坏值/空值替 0 并计数, 负值钳 0
    fn read_decimal(
        &self,
        idx: usize,
        lower: &HashMap<String, &Value>,
        key: &str,
        field: &str,
        issues: &mut Vec<DataIssue>,
    ) -> Decimal {
        self.read_decimal_raw(idx, lower, key, field, issues).0
    }

    /// 同上, 并返回"列值是否真实存在" (总成本推导需要区分)
    fn read_decimal_raw(
        &self,
        idx: usize,
        lower: &HashMap<String, &Value>,
        key: &str,
        field: &str,
        issues: &mut Vec<DataIssue>,
    ) -> (Decimal, bool) {
        let value = match lower.get(key) {
            // 列整体不存在于该版本快照: 静默取默认值
            None => return (Decimal::ZERO, false),
            Some(v) => *v,
        };
        let parsed = match value {
            Value::Null => {
                push_issue(issues, idx, field, IssueKind::BadNumeric, "空值替 0");
                return (Decimal::ZERO, false);
            }
            Value::Number(n) => n
                .as_f64()
                .and_then(|f| Decimal::try_from(f).ok()),
            Value::String(s) => parse_decimal_str(s),
            _ => None,
        };
        match parsed {
            Some(d) if d < Decimal::ZERO => {
                push_issue(
                    issues,
                    idx,
                    field,
                    IssueKind::NegativeValue,
                    &format!("负值 {} 钳为 0", d),
                );
                (Decimal::ZERO, true)
            }
            Some(d) => (d, true),
            None => {
                push_issue(
                    issues,
                    idx,
                    field,
                    IssueKind::BadNumeric,
                    &format!("无法解析 {:?}, 替 0", value),
                );
                (Decimal::ZERO, false)
            }
        }
    }

    /// 读取日期; 接受 YYYY-MM-DD / DD/MM/YYYY / ISO 日期时间前缀
    fn read_date(
        &self,
        idx: usize,
        lower: &HashMap<String, &Value>,
        key: &str,
        issues: &mut Vec<DataIssue>,
    ) -> Option<NaiveDate> {
        let raw = match lower.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim(),
            _ => return None,
        };
        // 只按字符边界截取 ISO 日期前缀; 多字节串截不齐就整串送解析
        let candidate = if raw.len() > 10 {
            raw.get(..10).unwrap_or(raw)
        } else {
            raw
        };
        NaiveDate::parse_from_str(candidate, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(candidate, "%d/%m/%Y"))
            .map(Some)
            .unwrap_or_else(|_| {
                push_issue(
                    issues,
                    idx,
                    "date",
                    IssueKind::BadDate,
                    &format!("日期无法解析: {}", raw),
                );
                None
            })
    }

    /// 读取班次; 解析失败默认白班并计数
    fn read_shift(
        &self,
        idx: usize,
        lower: &HashMap<String, &Value>,
        key: &str,
        issues: &mut Vec<DataIssue>,
    ) -> Guardia {
        match lower.get(key) {
            Some(Value::String(s)) => Guardia::parse(s).unwrap_or_else(|| {
                push_issue(
                    issues,
                    idx,
                    "shift",
                    IssueKind::BadShift,
                    &format!("班次无法解析: {}, 默认白班", s),
                );
                Guardia::Dia
            }),
            _ => {
                push_issue(issues, idx, "shift", IssueKind::BadShift, "班次缺失, 默认白班");
                Guardia::Dia
            }
        }
    }
}

impl Default for RecordNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 读取字符串字段, 空串视为缺失; 数字编码容忍为字符串
fn read_string(lower: &HashMap<String, &Value>, key: &str) -> Option<String> {
    match lower.get(key) {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// 十进制字符串解析; 容忍拉美小数逗号写法
fn parse_decimal_str(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<Decimal>()
        .or_else(|_| trimmed.replace(',', ".").parse::<Decimal>())
        .ok()
}

fn push_issue(issues: &mut Vec<DataIssue>, row: usize, field: &str, kind: IssueKind, detail: &str) {
    tracing::warn!(row, field, %kind, detail, "数据质量问题");
    issues.push(DataIssue {
        row,
        field: field.to_string(),
        kind,
        detail: detail.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRow {
        match value {
            Value::Object(map) => map,
            _ => panic!("test row must be an object"),
        }
    }

    #[test]
    fn detects_v2_shape_from_precio_total() {
        let rows = vec![raw(json!({
            "Fecha": "2026-08-01",
            "Guardia": "Día",
            "Labor": "T-101",
            "Categoria": "Explosivos",
            "Detalle": "Dinamita 65%",
            "Unidad": "und",
            "Cantidad": 10,
            "Precio_Total": 50.0,
            "Avance": 2.0,
            "Mineral_TM": 0,
            "Usuario_Registro": "operador1"
        }))];
        let outcome = RecordNormalizer::new().normalize(&rows);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.skipped, 0);
        let rec = &outcome.records[0];
        assert_eq!(rec.location, "T-101");
        assert_eq!(rec.material.as_deref(), Some("Dinamita 65%"));
        assert_eq!(rec.total_cost, Decimal::new(500, 1));
    }

    #[test]
    fn detects_v1_shape_from_costo_pen() {
        let rows = vec![raw(json!({
            "fecha": "15/08/2026",
            "guardia": "noche",
            "labor": "RAMPA-2",
            "categoria": "Madera",
            "insumo": "Puntal 7'",
            "unidad": "pza",
            "cantidad": "4",
            "precio_unit": "12.5",
            "costo_pen": "50",
            "avance": 0,
            "tm": 18,
            "usuario": "capataz"
        }))];
        let outcome = RecordNormalizer::new().normalize(&rows);
        assert_eq!(outcome.records.len(), 1);
        let rec = &outcome.records[0];
        assert_eq!(rec.shift, Guardia::Noche);
        assert_eq!(rec.material.as_deref(), Some("Puntal 7'"));
        assert_eq!(rec.tonnage_tm, Decimal::from(18));
        assert_eq!(rec.recorded_by, "capataz");
        assert_eq!(
            rec.date,
            Some(NaiveDate::from_ymd_opt(2026, 8, 15).unwrap())
        );
    }

    #[test]
    fn unknown_shape_skips_batch_without_error() {
        let rows = vec![raw(json!({"foo": 1, "bar": 2}))];
        let outcome = RecordNormalizer::new().normalize(&rows);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.issues[0].kind, IssueKind::UnknownSchema);
    }

    #[test]
    fn malformed_numeric_substitutes_zero_and_counts() {
        let rows = vec![raw(json!({
            "labor": "T-101",
            "categoria": "Aceros",
            "detalle": "Barreno 6'",
            "guardia": "Día",
            "cantidad": "no-numerico",
            "precio_total": 120.0
        }))];
        let outcome = RecordNormalizer::new().normalize(&rows);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].quantity, Decimal::ZERO);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::BadNumeric && i.field == "quantity"));
    }

    #[test]
    fn negative_numeric_clamped_to_zero() {
        let rows = vec![raw(json!({
            "labor": "T-101",
            "categoria": "Explosivos",
            "guardia": "Día",
            "cantidad": -3,
            "precio_total": 10.0,
            "detalle": "Mecha"
        }))];
        let outcome = RecordNormalizer::new().normalize(&rows);
        assert_eq!(outcome.records[0].quantity, Decimal::ZERO);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::NegativeValue));
    }

    #[test]
    fn missing_category_drops_row_and_counts_skip() {
        let rows = vec![
            raw(json!({
                "labor": "T-101",
                "guardia": "Día",
                "cantidad": 5,
                "precio_total": 25.0,
                "detalle": "Fulminante"
            })),
            raw(json!({
                "labor": "T-101",
                "categoria": "Accesorios",
                "guardia": "Día",
                "cantidad": 5,
                "precio_total": 25.0,
                "detalle": "Fulminante"
            })),
        ];
        let outcome = RecordNormalizer::new().normalize(&rows);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.records.len(), 1);
    }

    #[test]
    fn missing_total_cost_derived_from_quantity_and_price() {
        let rows = vec![raw(json!({
            "labor": "T-101",
            "categoria": "Explosivos",
            "guardia": "Día",
            "cantidad": 10,
            "precio_unit": 5,
            "precio_total": null,
            "detalle": "Dinamita"
        }))];
        let outcome = RecordNormalizer::new().normalize(&rows);
        assert_eq!(outcome.records[0].total_cost, Decimal::from(50));
    }

    #[test]
    fn cost_mismatch_keeps_supplied_value_with_issue() {
        let rows = vec![raw(json!({
            "labor": "T-101",
            "categoria": "Explosivos",
            "guardia": "Día",
            "cantidad": 10,
            "precio_unit": 5,
            "precio_total": 80.0,
            "detalle": "Dinamita"
        }))];
        let outcome = RecordNormalizer::new().normalize(&rows);
        assert_eq!(outcome.records[0].total_cost, Decimal::from(80));
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::CostMismatch));
    }

    #[test]
    fn empty_input_yields_empty_outcome() {
        let outcome = RecordNormalizer::new().normalize(&[]);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.skipped, 0);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn preserves_input_order() {
        let rows: Vec<RawRow> = (0..5)
            .map(|i| {
                raw(json!({
                    "labor": format!("T-{}", i),
                    "categoria": "Explosivos",
                    "guardia": "Día",
                    "cantidad": 1,
                    "precio_total": 1.0,
                    "detalle": "x"
                }))
            })
            .collect();
        let outcome = RecordNormalizer::new().normalize(&rows);
        let locations: Vec<&str> = outcome.records.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(locations, vec!["T-0", "T-1", "T-2", "T-3", "T-4"]);
    }
}
