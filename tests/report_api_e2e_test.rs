// ==========================================
// ReportApi 端到端测试
// ==========================================
// 职责: 验证 取数 → 归一化 → 汇总 → 渲染 全链路,
//       无数据呈现/降级出口/协作方失败传播
// ==========================================

use std::io::Cursor;
use std::sync::Arc;

use anyhow::anyhow;
use calamine::{Reader, Xlsx};
use chrono::NaiveDate;
use minecost::{
    ApiError, CostRecordSource, CurrencyReference, ExchangeRateProvider, Guardia, RawRow,
    ReportApi, ReportConfig, ReportOutcome, ReportRequest,
};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

// ==========================================
// 测试辅助: 内存取数源 + 固定行情源
// ==========================================

struct InMemorySource {
    rows: Vec<RawRow>,
}

impl CostRecordSource for InMemorySource {
    fn fetch_cost_records(
        &self,
        _date_from: NaiveDate,
        _date_to: NaiveDate,
        _location_filter: Option<&str>,
        _shift_filter: Option<Guardia>,
    ) -> anyhow::Result<Vec<RawRow>> {
        Ok(self.rows.clone())
    }
}

struct FailingSource;

impl CostRecordSource for FailingSource {
    fn fetch_cost_records(
        &self,
        _date_from: NaiveDate,
        _date_to: NaiveDate,
        _location_filter: Option<&str>,
        _shift_filter: Option<Guardia>,
    ) -> anyhow::Result<Vec<RawRow>> {
        Err(anyhow!("conexión rechazada"))
    }
}

struct FixedRates;

impl ExchangeRateProvider for FixedRates {
    fn currency_reference(&self) -> CurrencyReference {
        CurrencyReference {
            dolar_exchange_rate: dec!(4.00),
            gold_price_per_gram: dec!(250),
        }
    }
}

fn raw(value: Value) -> RawRow {
    match value {
        Value::Object(map) => map,
        _ => panic!("test row must be an object"),
    }
}

fn sample_rows() -> Vec<RawRow> {
    vec![
        raw(json!({
            "fecha": "2026-08-10",
            "guardia": "Día",
            "labor": "T-101",
            "categoria": "Explosivos",
            "detalle": "Dinamita 65%",
            "unidad": "und",
            "cantidad": 10,
            "precio_total": 50.0,
            "avance": 2.0,
            "mineral_tm": 0,
            "usuario_registro": "operador1"
        })),
        raw(json!({
            "fecha": "2026-08-10",
            "guardia": "Noche",
            "labor": "RAMPA-2",
            "categoria": "Madera",
            "detalle": "Puntal 7'",
            "unidad": "pza",
            "cantidad": 4,
            "precio_total": 48.0,
            "avance": 0,
            "mineral_tm": 12,
            "usuario_registro": "capataz"
        })),
    ]
}

fn api_with(rows: Vec<RawRow>) -> ReportApi {
    ReportApi::new(
        Arc::new(InMemorySource { rows }),
        Arc::new(FixedRates),
        ReportConfig::default(),
    )
}

fn request() -> ReportRequest {
    ReportRequest {
        date_from: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        date_to: NaiveDate::from_ymd_opt(2026, 8, 31).unwrap(),
        location: None,
        shift: None,
    }
}

// ==========================================
// 正常链路
// ==========================================

/// 全链路: 工件为 xlsx, 三页可回读, 无降级
#[test]
fn full_pipeline_generates_xlsx_artifact() {
    let api = api_with(sample_rows());
    let outcome = api
        .generate_report(&request(), "jquispe", "Supervisor")
        .unwrap();

    match outcome {
        ReportOutcome::Generated {
            artifact,
            skipped,
            issues,
            degraded,
        } => {
            assert_eq!(skipped, 0);
            assert_eq!(issues, 0);
            assert!(!degraded);
            assert_eq!(
                artifact.mime,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            );
            assert!(artifact.filename.starts_with("Reporte_Pukamani_"));
            assert!(artifact.filename.ends_with(".xlsx"));

            let mut workbook = Xlsx::new(Cursor::new(artifact.bytes)).unwrap();
            assert_eq!(workbook.sheet_names().len(), 3);
            let detail = workbook.worksheet_range("Base de Datos Detallada").unwrap();
            assert_eq!(detail.height(), 5 + 2);
        }
        other => panic!("expected Generated, got {:?}", other),
    }
}

/// 身份缺失用访客兜底, 不拒绝请求
#[test]
fn blank_identity_falls_back_to_guest() {
    let api = api_with(sample_rows());
    let outcome = api.generate_report(&request(), "", "").unwrap();
    assert!(matches!(outcome, ReportOutcome::Generated { .. }));
}

/// 样式化渲染失败 → 降级 CSV 工件 (degraded 标记 + text/csv)
///
/// Excel 单元格字符串上限 32,767 字符, 超限的劳动面编码
/// 让工作簿写入报错, 流水线改走扁平 CSV 出口
#[test]
fn excel_failure_degrades_to_csv_artifact() {
    let mut rows = sample_rows();
    let oversized_location = "X".repeat(40_000);
    rows[0].insert("labor".to_string(), json!(oversized_location));
    let api = api_with(rows);

    match api.generate_report(&request(), "jquispe", "Supervisor").unwrap() {
        ReportOutcome::Generated {
            artifact,
            degraded,
            ..
        } => {
            assert!(degraded);
            assert_eq!(artifact.mime, "text/csv");
            assert!(artifact.filename.starts_with("Reporte_Pukamani_"));
            assert!(artifact.filename.ends_with(".csv"));
            let text = String::from_utf8(artifact.bytes).unwrap();
            assert!(text.starts_with("Fecha,Guardia"));
        }
        other => panic!("expected degraded Generated, got {:?}", other),
    }
}

/// 看板合计: 美元等值按注入汇率折算
#[test]
fn dashboard_summary_uses_injected_rate() {
    let api = api_with(sample_rows());
    let summary = api.dashboard_summary(&request()).unwrap().unwrap();

    assert_eq!(summary.total_pen, dec!(98));
    assert_eq!(summary.total_usd, dec!(24.5));
    assert_eq!(summary.advance_total, dec!(2));
    assert_eq!(summary.tonnage_total, dec!(12));
    assert_eq!(summary.record_count, 2);
}

// ==========================================
// 无数据与数据质量
// ==========================================

/// 场景 3: 期间无记录 → NoData, 不是异常, 不是工件
#[test]
fn empty_period_surfaces_no_data() {
    let api = api_with(Vec::new());
    let outcome = api.generate_report(&request(), "jquispe", "Supervisor").unwrap();
    assert!(matches!(outcome, ReportOutcome::NoData { skipped: 0 }));

    let summary = api.dashboard_summary(&request()).unwrap();
    assert!(summary.is_none());
}

/// 场景 4: 缺类别行被跳过计数, 其余仍出报表
#[test]
fn bad_row_skipped_report_still_generated() {
    let mut rows = sample_rows();
    rows.push(raw(json!({
        "fecha": "2026-08-11",
        "guardia": "Día",
        "labor": "T-101",
        "detalle": "Sin categoría",
        "cantidad": 1,
        "precio_total": 5.0
    })));
    let api = api_with(rows);

    match api.generate_report(&request(), "jquispe", "Supervisor").unwrap() {
        ReportOutcome::Generated { skipped, .. } => assert_eq!(skipped, 1),
        other => panic!("expected Generated, got {:?}", other),
    }
}

/// 整批列名未知 → 归一化后为空 → NoData (跳过计数保留)
#[test]
fn unknown_schema_batch_surfaces_no_data_with_skips() {
    let rows = vec![raw(json!({"columna_rara": 1}))];
    let api = api_with(rows);
    match api.generate_report(&request(), "jquispe", "Supervisor").unwrap() {
        ReportOutcome::NoData { skipped } => assert_eq!(skipped, 1),
        other => panic!("expected NoData, got {:?}", other),
    }
}

// ==========================================
// 失败传播
// ==========================================

/// 取数协作方失败 → ApiError::SourceFailure
#[test]
fn source_failure_propagates_as_api_error() {
    let api = ReportApi::new(Arc::new(FailingSource), Arc::new(FixedRates), ReportConfig::default());
    let err = api
        .generate_report(&request(), "jquispe", "Supervisor")
        .unwrap_err();
    assert!(matches!(err, ApiError::SourceFailure(_)));
}

/// 日期区间倒置 → 无效输入
#[test]
fn inverted_date_range_rejected() {
    let api = api_with(sample_rows());
    let bad = ReportRequest {
        date_from: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        date_to: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        location: None,
        shift: None,
    };
    let err = api.generate_report(&bad, "jquispe", "Supervisor").unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}
