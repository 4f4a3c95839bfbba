// ==========================================
// 井下矿山作业成本系统 - 显示标签翻译表
// ==========================================
// 契约: 列顺序与标签文本是对外输出契约,
//       会计/管理端按表头文本解析,不得改动
// 规则: 标签含 "S/" 货币标记 → 货币数字格式,
//       其余数字列 → 普通两位小数格式
// ==========================================

use crate::domain::record::CostRecord;
use crate::domain::types::GroupField;
use rust_decimal::Decimal;

// ==========================================
// 汇总页 (Resumen Gerencial)
// ==========================================

/// 分组维度 → 汇总页表头标签
pub fn group_field_label(field: GroupField) -> &'static str {
    match field {
        GroupField::Location => "Labor / Ubicación",
        GroupField::Shift => "Guardia",
        GroupField::Category => "Rubro / Categoría",
        GroupField::Date => "Fecha",
    }
}

/// 汇总页度量列标签, 固定顺序
pub const SUMMARY_MEASURE_LABELS: [&str; 4] = [
    "Avance (m)",
    "Mineral Extraído (TM)",
    "Gasto Total (S/)",
    "Costo Unitario (S/m)",
];

// ==========================================
// 透视页 (Análisis Gráfico)
// ==========================================

/// 类别透视列标签
pub const PIVOT_LABELS: [&str; 2] = ["Rubro / Categoría", "Costo Total (S/)"];

// ==========================================
// 明细页 (Base de Datos Detallada)
// ==========================================

/// 明细页单元格值
pub enum CellValue {
    Text(String),
    Number(Decimal),
}

/// 明细页列, 固定顺序与标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailColumn {
    Date,
    Shift,
    Location,
    Category,
    Material,
    Unit,
    Quantity,
    UnitPrice,
    TotalCost,
    Advance,
    Tonnage,
    RecordedBy,
}

/// 明细页全列序 (输出契约)
pub const DETAIL_COLUMNS: [DetailColumn; 12] = [
    DetailColumn::Date,
    DetailColumn::Shift,
    DetailColumn::Location,
    DetailColumn::Category,
    DetailColumn::Material,
    DetailColumn::Unit,
    DetailColumn::Quantity,
    DetailColumn::UnitPrice,
    DetailColumn::TotalCost,
    DetailColumn::Advance,
    DetailColumn::Tonnage,
    DetailColumn::RecordedBy,
];

impl DetailColumn {
    /// 表头显示标签
    pub fn label(&self) -> &'static str {
        match self {
            DetailColumn::Date => "Fecha",
            DetailColumn::Shift => "Guardia",
            DetailColumn::Location => "Ubicación (Labor)",
            DetailColumn::Category => "Rubro / Categoría",
            DetailColumn::Material => "Material / Detalle",
            DetailColumn::Unit => "Unidad",
            DetailColumn::Quantity => "Cant. Consumida",
            DetailColumn::UnitPrice => "Precio Unit. (S/)",
            DetailColumn::TotalCost => "Costo Total (S/)",
            DetailColumn::Advance => "Avance (m)",
            DetailColumn::Tonnage => "Mineral (TM)",
            DetailColumn::RecordedBy => "Digitado Por",
        }
    }

    /// 从记录取该列的单元格值
    pub fn value_of(&self, record: &CostRecord) -> CellValue {
        match self {
            DetailColumn::Date => CellValue::Text(
                record.date.map(|d| d.to_string()).unwrap_or_default(),
            ),
            DetailColumn::Shift => CellValue::Text(record.shift.to_string()),
            DetailColumn::Location => CellValue::Text(record.location.clone()),
            DetailColumn::Category => CellValue::Text(record.category.clone()),
            DetailColumn::Material => {
                CellValue::Text(record.material.clone().unwrap_or_default())
            }
            DetailColumn::Unit => CellValue::Text(record.unit.clone()),
            DetailColumn::Quantity => CellValue::Number(record.quantity),
            DetailColumn::UnitPrice => CellValue::Number(record.unit_price),
            DetailColumn::TotalCost => CellValue::Number(record.total_cost),
            DetailColumn::Advance => CellValue::Number(record.advance_m),
            DetailColumn::Tonnage => CellValue::Number(record.tonnage_tm),
            DetailColumn::RecordedBy => CellValue::Text(record.recorded_by.clone()),
        }
    }
}

/// 明细页有效列: 输入中完全缺失的可选列整列省略,不渲染空列
pub fn active_detail_columns(records: &[CostRecord]) -> Vec<DetailColumn> {
    DETAIL_COLUMNS
        .iter()
        .copied()
        .filter(|col| match col {
            DetailColumn::Date => records.iter().any(|r| r.date.is_some()),
            DetailColumn::Material => records.iter().any(|r| r.material.is_some()),
            _ => true,
        })
        .collect()
}

/// 货币列判定: 标签含 "S/" 标记
pub fn is_currency_label(label: &str) -> bool {
    label.contains("S/")
}

/// 货币数字格式 (索尔)
pub const CURRENCY_FORMAT: &str = "#,##0.00 \"S/\"";

/// 普通两位小数格式
pub const NUMBER_FORMAT: &str = "#,##0.00";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Guardia;

    fn base_record() -> CostRecord {
        CostRecord {
            date: None,
            shift: Guardia::Dia,
            location: "T-101".to_string(),
            category: "Explosivos".to_string(),
            material: None,
            unit: "und".to_string(),
            quantity: Decimal::ONE,
            unit_price: Decimal::ONE,
            total_cost: Decimal::ONE,
            advance_m: Decimal::ZERO,
            tonnage_tm: Decimal::ZERO,
            recorded_by: "op".to_string(),
        }
    }

    #[test]
    fn currency_marker_detection() {
        assert!(is_currency_label("Costo Total (S/)"));
        assert!(is_currency_label("Costo Unitario (S/m)"));
        assert!(!is_currency_label("Avance (m)"));
        assert!(!is_currency_label("Mineral (TM)"));
    }

    #[test]
    fn absent_optional_columns_omitted() {
        let records = vec![base_record()];
        let cols = active_detail_columns(&records);
        assert!(!cols.contains(&DetailColumn::Date));
        assert!(!cols.contains(&DetailColumn::Material));
        assert_eq!(cols.len(), DETAIL_COLUMNS.len() - 2);
    }

    #[test]
    fn present_optional_columns_kept_in_contract_order() {
        let mut rec = base_record();
        rec.material = Some("Dinamita".to_string());
        rec.date = chrono::NaiveDate::from_ymd_opt(2026, 8, 1);
        let cols = active_detail_columns(&[rec]);
        assert_eq!(cols.len(), DETAIL_COLUMNS.len());
        assert_eq!(cols[0], DetailColumn::Date);
        assert_eq!(cols[4], DetailColumn::Material);
    }
}
