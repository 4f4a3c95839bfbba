// ==========================================
// 井下矿山作业成本系统 - Excel 报表渲染器
// ==========================================
// 职责: 生成三页样式化工作簿 + 四个嵌入图表
//   第 1 页 Resumen Gerencial   - 汇总行
//   第 2 页 Base de Datos Detallada - 明细行
//   第 3 页 Análisis Gráfico    - 类别透视 + 图表
// 契约: 每页 3 行审计头 (标题/生成人/时间戳),
//       表头固定第 5 行, 数据从第 6 行起
// 红线: 时间戳只取 ReportContext, 渲染可复现
// 红线: 可降级省略 (图表页无数据即跳过), 不渲染半成品
// ==========================================

use crate::config::ReportConfig;
use crate::domain::record::CostRecord;
use crate::domain::rollup::CostRollup;
use crate::domain::types::{GroupField, ReportContext};
use crate::report::error::ReportError;
use crate::report::labels::{
    active_detail_columns, group_field_label, is_currency_label, CellValue, CURRENCY_FORMAT,
    NUMBER_FORMAT, PIVOT_LABELS, SUMMARY_MEASURE_LABELS,
};
use chrono::{Datelike, Timelike};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{
    Chart, ChartType, Color, DocProperties, ExcelDateTime, Format, FormatAlign, FormatBorder,
    Workbook, Worksheet,
};

// ==========================================
// 布局常量 (输出契约, 消费方按行号解析)
// ==========================================

/// 表头行 (0 起算; Excel 第 5 行)
const HEADER_ROW: u32 = 4;
/// 数据起始行 (Excel 第 6 行)
const DATA_START_ROW: u32 = 5;

/// 页名 (契约)
const SHEET_SUMMARY: &str = "Resumen Gerencial";
const SHEET_DETAIL: &str = "Base de Datos Detallada";
const SHEET_PIVOT: &str = "Análisis Gráfico";

/// 页副标题 (审计头第 1 行后缀)
const SUBTITLE_SUMMARY: &str = "RESUMEN EJECUTIVO DE COSTOS";
const SUBTITLE_DETAIL: &str = "REGISTRO DETALLADO DE CONSUMOS";
const SUBTITLE_PIVOT: &str = "ANÁLISIS POR CATEGORÍA";

/// 企业蓝表头填充色
const HEADER_FILL: u32 = 0x1F4E78;
/// 审计头灰色
const META_GREY: u32 = 0x555555;

/// 渲染结果
#[derive(Debug)]
pub struct WorkbookOutput {
    /// 工作簿字节
    pub bytes: Vec<u8>,
    /// 图表页因无类别数据被省略 (降级, 非失败)
    pub chart_sheet_omitted: bool,
}

/// 单元格格式集
struct SheetFormats {
    title: Format,
    meta: Format,
    header: Format,
    currency: Format,
    number: Format,
    text: Format,
}

impl SheetFormats {
    fn build() -> Self {
        let border = FormatBorder::Thin;
        Self {
            title: Format::new()
                .set_bold()
                .set_font_size(16)
                .set_font_color(Color::RGB(HEADER_FILL)),
            meta: Format::new()
                .set_italic()
                .set_font_size(10)
                .set_font_color(Color::RGB(META_GREY)),
            header: Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(border),
            currency: Format::new().set_num_format(CURRENCY_FORMAT).set_border(border),
            number: Format::new().set_num_format(NUMBER_FORMAT).set_border(border),
            text: Format::new().set_align(FormatAlign::Left).set_border(border),
        }
    }

    /// 数字列按标签货币标记选格式
    fn numeric_for(&self, label: &str) -> &Format {
        if is_currency_label(label) {
            &self.currency
        } else {
            &self.number
        }
    }
}

// ==========================================
// ExcelReportRenderer - 工作簿渲染器
// ==========================================
pub struct ExcelReportRenderer {
    config: ReportConfig,
}

impl ExcelReportRenderer {
    /// 创建渲染器
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// 渲染三页工作簿
    ///
    /// # 参数
    /// - records: 规范化明细记录
    /// - rollups: 汇总行 (与明细同一快照计算)
    /// - group_by: 汇总所用分组维度 (决定汇总页前导列)
    /// - ctx: 报表上下文 (身份 + 固定时间戳)
    ///
    /// # 返回
    /// - Ok(output): 完整工作簿字节 (可能省略图表页)
    /// - Err(ReportError::NoData): 明细为空, 不产出工件
    pub fn render(
        &self,
        records: &[CostRecord],
        rollups: &[CostRollup],
        group_by: &[GroupField],
        ctx: &ReportContext,
    ) -> Result<WorkbookOutput, ReportError> {
        if records.is_empty() {
            return Err(ReportError::NoData);
        }

        let formats = SheetFormats::build();
        let mut workbook = Workbook::new();

        // 文档元数据时间取自上下文, 保证相同输入字节一致
        let created = ExcelDateTime::from_ymd(
            ctx.generated_at.year() as u16,
            ctx.generated_at.month() as u8,
            ctx.generated_at.day() as u8,
        )?
        .and_hms(
            ctx.generated_at.hour() as u16,
            ctx.generated_at.minute() as u8,
            ctx.generated_at.second() as u16,
        )?;
        workbook.set_properties(
            &DocProperties::new()
                .set_author(&ctx.user)
                .set_creation_datetime(&created),
        );

        // ===== 第 1 页: 汇总 =====
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name(SHEET_SUMMARY)?;
            self.write_summary_sheet(sheet, rollups, group_by, ctx, &formats)?;
        }

        // ===== 第 2 页: 明细 =====
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name(SHEET_DETAIL)?;
            self.write_detail_sheet(sheet, records, ctx, &formats)?;
        }

        // ===== 第 3 页: 类别透视 + 图表 =====
        // 透视为空时整页省略 (降级), 工作簿仍然完整
        let pivot = crate::engine::CostAggregator::new().pivot_by_category(records);
        let chart_sheet_omitted = pivot.is_empty();
        if chart_sheet_omitted {
            tracing::warn!(report_id = %ctx.report_id, "类别透视无数据, 省略图表页");
        } else {
            let sheet = workbook.add_worksheet();
            sheet.set_name(SHEET_PIVOT)?;
            self.write_pivot_sheet(sheet, &pivot, ctx, &formats)?;
        }

        let bytes = workbook.save_to_buffer()?;
        tracing::info!(
            report_id = %ctx.report_id,
            sheets = if chart_sheet_omitted { 2 } else { 3 },
            detail_rows = records.len(),
            summary_rows = rollups.len(),
            bytes = bytes.len(),
            "工作簿渲染完成"
        );
        Ok(WorkbookOutput {
            bytes,
            chart_sheet_omitted,
        })
    }

    // ==========================================
    // 各页渲染
    // ==========================================

    fn write_summary_sheet(
        &self,
        sheet: &mut Worksheet,
        rollups: &[CostRollup],
        group_by: &[GroupField],
        ctx: &ReportContext,
        formats: &SheetFormats,
    ) -> Result<(), ReportError> {
        self.write_report_header(sheet, SUBTITLE_SUMMARY, ctx, formats)?;

        // 表头: 分组维度标签 + 固定度量标签
        let mut labels: Vec<&str> = group_by.iter().map(|f| group_field_label(*f)).collect();
        labels.extend(SUMMARY_MEASURE_LABELS);
        self.write_table_header(sheet, &labels, formats)?;

        for (i, rollup) in rollups.iter().enumerate() {
            let row = DATA_START_ROW + i as u32;
            let mut col: u16 = 0;
            for (_, value) in &rollup.group {
                sheet.write_string_with_format(row, col, value, &formats.text)?;
                col += 1;
            }
            let measures: [Decimal; 4] = [
                rollup.advance_m,
                rollup.tonnage_tm,
                rollup.total_cost,
                rollup.unit_cost,
            ];
            for (j, value) in measures.iter().enumerate() {
                let label = SUMMARY_MEASURE_LABELS[j];
                sheet.write_number_with_format(
                    row,
                    col,
                    value.to_f64().unwrap_or(0.0),
                    formats.numeric_for(label),
                )?;
                col += 1;
            }
        }

        self.finish_table(sheet, labels.len() as u16, rollups.len() as u32)?;
        Ok(())
    }

    fn write_detail_sheet(
        &self,
        sheet: &mut Worksheet,
        records: &[CostRecord],
        ctx: &ReportContext,
        formats: &SheetFormats,
    ) -> Result<(), ReportError> {
        self.write_report_header(sheet, SUBTITLE_DETAIL, ctx, formats)?;

        // 整列缺失的可选列省略, 不渲染空列
        let columns = active_detail_columns(records);
        let labels: Vec<&str> = columns.iter().map(|c| c.label()).collect();
        self.write_table_header(sheet, &labels, formats)?;

        for (i, record) in records.iter().enumerate() {
            let row = DATA_START_ROW + i as u32;
            for (j, column) in columns.iter().enumerate() {
                let col = j as u16;
                match column.value_of(record) {
                    CellValue::Text(text) => {
                        sheet.write_string_with_format(row, col, text, &formats.text)?;
                    }
                    CellValue::Number(value) => {
                        sheet.write_number_with_format(
                            row,
                            col,
                            value.to_f64().unwrap_or(0.0),
                            formats.numeric_for(column.label()),
                        )?;
                    }
                }
            }
        }

        self.finish_table(sheet, columns.len() as u16, records.len() as u32)?;
        Ok(())
    }

    fn write_pivot_sheet(
        &self,
        sheet: &mut Worksheet,
        pivot: &[(String, Decimal)],
        ctx: &ReportContext,
        formats: &SheetFormats,
    ) -> Result<(), ReportError> {
        self.write_report_header(sheet, SUBTITLE_PIVOT, ctx, formats)?;

        let labels: Vec<&str> = PIVOT_LABELS.to_vec();
        self.write_table_header(sheet, &labels, formats)?;

        for (i, (category, cost)) in pivot.iter().enumerate() {
            let row = DATA_START_ROW + i as u32;
            sheet.write_string_with_format(row, 0, category, &formats.text)?;
            sheet.write_number_with_format(
                row,
                1,
                cost.to_f64().unwrap_or(0.0),
                &formats.currency,
            )?;
        }

        self.finish_table(sheet, labels.len() as u16, pivot.len() as u32)?;
        self.insert_charts(sheet, pivot.len() as u32)?;
        Ok(())
    }

    // ==========================================
    // 图表 (四个图共用同一透视区域, 视觉一致)
    // ==========================================

    fn insert_charts(&self, sheet: &mut Worksheet, rows: u32) -> Result<(), ReportError> {
        let last_row = DATA_START_ROW + rows - 1;
        let categories = (SHEET_PIVOT, DATA_START_ROW, 0u16, last_row, 0u16);
        let values = (SHEET_PIVOT, DATA_START_ROW, 1u16, last_row, 1u16);

        // 横向条形图 (Pareto)
        let mut bar = Chart::new(ChartType::Bar);
        bar.set_style(10);
        bar.title().set_name("Gasto Total por Categoría (Pareto)");
        bar.x_axis().set_name("Categoría");
        bar.y_axis().set_name("Soles (S/)");
        bar.add_series()
            .set_name(PIVOT_LABELS[1])
            .set_categories(categories)
            .set_values(values);
        sheet.insert_chart(4, 4, &bar)?; // E5

        // 饼图
        let mut pie = Chart::new(ChartType::Pie);
        pie.title().set_name("Distribución de Costos por Categoría");
        pie.add_series()
            .set_name(PIVOT_LABELS[1])
            .set_categories(categories)
            .set_values(values);
        sheet.insert_chart(19, 4, &pie)?; // E20

        // 纵向柱状图
        let mut column = Chart::new(ChartType::Column);
        column.set_style(11);
        column.title().set_name("Comparación de Costos por Categoría");
        column.x_axis().set_name("Categoría");
        column.y_axis().set_name("Soles (S/)");
        column
            .add_series()
            .set_name(PIVOT_LABELS[1])
            .set_categories(categories)
            .set_values(values);
        sheet.insert_chart(4, 12, &column)?; // M5

        // 折线图
        let mut line = Chart::new(ChartType::Line);
        line.set_style(13);
        line.title().set_name("Tendencia de Costos");
        line.y_axis().set_name("Soles (S/)");
        line.add_series()
            .set_name(PIVOT_LABELS[1])
            .set_categories(categories)
            .set_values(values);
        sheet.insert_chart(19, 12, &line)?; // M20

        Ok(())
    }

    // ==========================================
    // 公共布局
    // ==========================================

    /// 3 行审计头: 标题 / 生成人 / 发布时间
    fn write_report_header(
        &self,
        sheet: &mut Worksheet,
        subtitle: &str,
        ctx: &ReportContext,
        formats: &SheetFormats,
    ) -> Result<(), ReportError> {
        let title = format!("{} - {}", self.config.report_title, subtitle);
        sheet.write_string_with_format(0, 0, title, &formats.title)?;
        sheet.write_string_with_format(
            1,
            0,
            format!("Generado por: {} ({})", ctx.user.to_uppercase(), ctx.role),
            &formats.meta,
        )?;
        sheet.write_string_with_format(
            2,
            0,
            format!(
                "Fecha de Emisión: {}",
                ctx.generated_at.format("%d/%m/%Y %H:%M:%S")
            ),
            &formats.meta,
        )?;
        Ok(())
    }

    /// 第 5 行表头 + 按表头文本自适应列宽
    fn write_table_header(
        &self,
        sheet: &mut Worksheet,
        labels: &[&str],
        formats: &SheetFormats,
    ) -> Result<(), ReportError> {
        for (i, label) in labels.iter().enumerate() {
            let col = i as u16;
            sheet.write_string_with_format(HEADER_ROW, col, *label, &formats.header)?;
            sheet.set_column_width(col, (label.chars().count() + 8) as f64)?;
        }
        Ok(())
    }

    /// 自动筛选 + 冻结表头窗格
    fn finish_table(
        &self,
        sheet: &mut Worksheet,
        cols: u16,
        data_rows: u32,
    ) -> Result<(), ReportError> {
        if cols == 0 {
            return Ok(());
        }
        let last_row = HEADER_ROW + data_rows;
        sheet.autofilter(HEADER_ROW, 0, last_row, cols - 1)?;
        sheet.set_freeze_panes(DATA_START_ROW, 0)?;
        Ok(())
    }
}
