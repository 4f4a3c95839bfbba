// ==========================================
// 井下矿山作业成本系统 - CSV 降级导出
// ==========================================
// 职责: 样式化渲染失败时的窄契约兜底出口
// 契约: 明细行扁平导出, 表头标签与 Excel 明细页一致,
//       无样式/无汇总/无图表
// ==========================================

use crate::domain::record::CostRecord;
use crate::report::error::ReportError;
use crate::report::labels::{active_detail_columns, CellValue};

// ==========================================
// CsvReportRenderer - 降级渲染器
// ==========================================
pub struct CsvReportRenderer;

impl CsvReportRenderer {
    /// 创建降级渲染器
    pub fn new() -> Self {
        Self
    }

    /// 渲染明细 CSV
    ///
    /// # 参数
    /// - records: 规范化明细记录
    ///
    /// # 返回
    /// - Ok(bytes): UTF-8 CSV 字节
    /// - Err(ReportError::NoData): 明细为空
    pub fn render(&self, records: &[CostRecord]) -> Result<Vec<u8>, ReportError> {
        if records.is_empty() {
            return Err(ReportError::NoData);
        }

        let columns = active_detail_columns(records);
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

        let labels: Vec<&str> = columns.iter().map(|c| c.label()).collect();
        writer.write_record(&labels)?;

        for record in records {
            let cells: Vec<String> = columns
                .iter()
                .map(|column| match column.value_of(record) {
                    CellValue::Text(text) => text,
                    // 固定两位小数, 与 Excel 明细页数字格式一致
                    CellValue::Number(value) => format!("{:.2}", value.round_dp(2)),
                })
                .collect();
            writer.write_record(&cells)?;
        }

        writer
            .into_inner()
            .map_err(|e| ReportError::CsvBuffer(e.to_string()))
    }
}

impl Default for CsvReportRenderer {
    fn default() -> Self {
        Self::new()
    }
}
