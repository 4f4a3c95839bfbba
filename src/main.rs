// ==========================================
// 井下矿山作业成本系统 - 命令行入口
// ==========================================
// 用途: 从 JSON 行转储生成报表工件
// 用法: minecost-report <rows.json> <salida.xlsx|salida.csv>
//       [--user U] [--role R] [--config config.json]
// ==========================================

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use minecost::{
    CostRecordSource, CsvReportRenderer, CurrencyReference, ExchangeRateProvider, Guardia,
    RawRow, RecordNormalizer, ReportApi, ReportConfig, ReportOutcome, ReportRequest,
};

/// JSON 文件取数源 (过滤条件由转储文件本身决定)
struct JsonFileSource {
    rows: Vec<RawRow>,
}

impl CostRecordSource for JsonFileSource {
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

/// 配置兜底行情源 (无外部行情协作方时)
struct ConfigRates {
    reference: CurrencyReference,
}

impl ExchangeRateProvider for ConfigRates {
    fn currency_reference(&self) -> CurrencyReference {
        self.reference
    }
}

struct CliArgs {
    input: String,
    output: String,
    user: String,
    role: String,
    config: Option<String>,
}

fn parse_args() -> Result<CliArgs> {
    let mut positional: Vec<String> = Vec::new();
    let mut user = "Invitado".to_string();
    let mut role = "Lector".to_string();
    let mut config = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--user" => user = args.next().context("--user 需要一个值")?,
            "--role" => role = args.next().context("--role 需要一个值")?,
            "--config" => config = Some(args.next().context("--config 需要一个值")?),
            other if other.starts_with("--") => bail!("未知选项: {}", other),
            _ => positional.push(arg),
        }
    }
    if positional.len() != 2 {
        bail!("用法: minecost-report <rows.json> <salida.xlsx|salida.csv> [--user U] [--role R]");
    }
    let output = positional.pop().unwrap_or_default();
    let input = positional.pop().unwrap_or_default();
    Ok(CliArgs {
        input,
        output,
        user,
        role,
        config,
    })
}

fn main() -> Result<()> {
    // 初始化日志系统
    minecost::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", minecost::APP_NAME);
    tracing::info!("系统版本: {}", minecost::VERSION);
    tracing::info!("==================================================");

    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => ReportConfig::load_from_file(path)
            .with_context(|| format!("配置加载失败: {}", path))?,
        None => ReportConfig::default(),
    };

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("无法读取输入文件: {}", args.input))?;
    let rows: Vec<RawRow> =
        serde_json::from_str(&raw).context("输入必须是 JSON 对象数组")?;
    tracing::info!(rows = rows.len(), "已加载原始行");

    // CSV 出口: 直接走降级渲染器 (窄契约兄弟接口)
    if args.output.ends_with(".csv") {
        let outcome = RecordNormalizer::new().normalize(&rows);
        if outcome.records.is_empty() {
            tracing::info!(skipped = outcome.skipped, "期间无可用记录, 不生成工件");
            return Ok(());
        }
        let bytes = CsvReportRenderer::new().render(&outcome.records)?;
        std::fs::write(&args.output, bytes)
            .with_context(|| format!("无法写出: {}", args.output))?;
        tracing::info!(
            output = %args.output,
            records = outcome.records.len(),
            skipped = outcome.skipped,
            issues = outcome.issue_count(),
            "CSV 导出完成"
        );
        return Ok(());
    }

    let reference = config.currency_reference();
    let api = ReportApi::new(
        Arc::new(JsonFileSource { rows }),
        Arc::new(ConfigRates { reference }),
        config,
    );

    // 转储文件即快照, 期间过滤交给上游, 此处取全量
    let request = ReportRequest {
        date_from: NaiveDate::MIN,
        date_to: NaiveDate::MAX,
        location: None,
        shift: None,
    };

    match api.generate_report(&request, &args.user, &args.role)? {
        ReportOutcome::NoData { skipped } => {
            tracing::info!(skipped, "期间无可用记录, 不生成工件");
        }
        ReportOutcome::Generated {
            artifact,
            skipped,
            issues,
            degraded,
        } => {
            std::fs::write(&args.output, &artifact.bytes)
                .with_context(|| format!("无法写出: {}", args.output))?;
            tracing::info!(
                output = %args.output,
                suggested_name = %artifact.filename,
                mime = artifact.mime,
                skipped,
                issues,
                degraded,
                "报表生成完成"
            );
        }
    }
    Ok(())
}
