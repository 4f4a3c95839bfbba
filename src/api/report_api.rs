// ==========================================
// 井下矿山作业成本系统 - 报表 API
// ==========================================
// 职责: 编排单次报表请求:
//       取数 → 归一化 → 汇总 → 渲染 → 工件
// 架构: API 层 → 引擎层 (纯函数) → 报表层
// 红线: 请求之间无共享可变状态, 可并行
// 红线: 行级/页级问题就地吸收; 只有整段无数据
//       以 NoData 呈现, 绝不以异常呈现
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ReportConfig;
use crate::domain::record::RawRow;
use crate::domain::rollup::CostSummary;
use crate::domain::types::{
    CurrencyReference, GroupField, Guardia, ReportArtifact, ReportContext, MIME_CSV, MIME_XLSX,
};
use crate::engine::{CostAggregator, NormalizeOutcome, RecordNormalizer};
use crate::report::{CsvReportRenderer, ExcelReportRenderer, ReportError};

// ==========================================
// 协作方接口 (核心之外的系统, 只约定边界)
// ==========================================

/// 外部持久化协作方: 成本记录快照查询
///
/// 返回的行可能带历史版本不一致的列名,
/// 由归一化引擎防御处理
pub trait CostRecordSource: Send + Sync {
    /// 查询期间内的原始成本行
    fn fetch_cost_records(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
        location_filter: Option<&str>,
        shift_filter: Option<Guardia>,
    ) -> anyhow::Result<Vec<RawRow>>;
}

/// 外部行情协作方: 汇率/金价参考
pub trait ExchangeRateProvider: Send + Sync {
    /// 当前货币参考 (核心视为不透明标量)
    fn currency_reference(&self) -> CurrencyReference;
}

// ==========================================
// 请求与结果
// ==========================================

/// 报表请求
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    /// 劳动面过滤 (None = 全部)
    pub location: Option<String>,
    /// 班次过滤 (None = 全部)
    pub shift: Option<Guardia>,
}

/// 报表结果
///
/// 整段无可用数据是业务状态,不是错误
#[derive(Debug)]
pub enum ReportOutcome {
    /// 期间无可用记录 (归一化后为空)
    NoData {
        /// 因必填字段缺失被跳过的行数
        skipped: usize,
    },
    /// 工件生成完成
    Generated {
        artifact: ReportArtifact,
        /// 跳过行数
        skipped: usize,
        /// 吸收的数据质量问题数
        issues: usize,
        /// 样式化渲染失败, 已降级为 CSV
        degraded: bool,
    },
}

// ==========================================
// ReportApi - 报表接口
// ==========================================
pub struct ReportApi {
    source: Arc<dyn CostRecordSource>,
    rates: Arc<dyn ExchangeRateProvider>,
    config: ReportConfig,
    normalizer: RecordNormalizer,
    aggregator: CostAggregator,
}

impl ReportApi {
    /// 创建报表 API
    ///
    /// # 参数
    /// - source: 持久化协作方 (快照查询)
    /// - rates: 行情协作方 (汇率参考)
    /// - config: 报表配置 (品牌/标题/兜底汇率)
    pub fn new(
        source: Arc<dyn CostRecordSource>,
        rates: Arc<dyn ExchangeRateProvider>,
        config: ReportConfig,
    ) -> Self {
        Self {
            source,
            rates,
            config,
            normalizer: RecordNormalizer::new(),
            aggregator: CostAggregator::new(),
        }
    }

    // ==========================================
    // 报表生成
    // ==========================================

    /// 生成报表 (当前时间戳)
    ///
    /// # 参数
    /// - request: 期间与过滤条件
    /// - user / role: 请求身份 (仅用于审计头, 不做鉴权)
    ///
    /// # 返回
    /// - Ok(ReportOutcome): 工件或 NoData
    /// - Err(ApiError): 取数失败 / 两级渲染均失败
    pub fn generate_report(
        &self,
        request: &ReportRequest,
        user: &str,
        role: &str,
    ) -> ApiResult<ReportOutcome> {
        // 身份缺失用访客兜底,不拒绝请求
        let user = if user.trim().is_empty() { "Invitado" } else { user };
        let role = if role.trim().is_empty() { "Lector" } else { role };
        self.generate_report_with_context(request, &ReportContext::new(user, role))
    }

    /// 生成报表 (显式上下文, 固定时间戳可复现)
    pub fn generate_report_with_context(
        &self,
        request: &ReportRequest,
        ctx: &ReportContext,
    ) -> ApiResult<ReportOutcome> {
        let span = tracing::info_span!(
            "generate_report",
            report_id = %ctx.report_id,
            user = %ctx.user,
        );
        let _guard = span.enter();

        let outcome = self.fetch_normalized(request)?;
        if outcome.records.is_empty() {
            // 整段无数据: 呈现为业务状态,不尝试渲染
            tracing::info!(skipped = outcome.skipped, "期间无可用记录");
            return Ok(ReportOutcome::NoData {
                skipped: outcome.skipped,
            });
        }

        let rollups = self
            .aggregator
            .aggregate(&outcome.records, &[GroupField::Location]);

        // 样式化渲染优先; 失败降级为扁平 CSV
        let excel = ExcelReportRenderer::new(self.config.clone());
        match excel.render(&outcome.records, &rollups, &[GroupField::Location], ctx) {
            Ok(output) => Ok(ReportOutcome::Generated {
                artifact: ReportArtifact {
                    bytes: output.bytes,
                    mime: MIME_XLSX,
                    filename: self.artifact_filename(ctx, "xlsx"),
                },
                skipped: outcome.skipped,
                issues: outcome.issue_count(),
                degraded: false,
            }),
            Err(ReportError::NoData) => Ok(ReportOutcome::NoData {
                skipped: outcome.skipped,
            }),
            Err(err) => {
                tracing::warn!(error = %err, "样式化渲染失败, 降级为 CSV");
                let bytes = CsvReportRenderer::new().render(&outcome.records)?;
                Ok(ReportOutcome::Generated {
                    artifact: ReportArtifact {
                        bytes,
                        mime: MIME_CSV,
                        filename: self.artifact_filename(ctx, "csv"),
                    },
                    skipped: outcome.skipped,
                    issues: outcome.issue_count(),
                    degraded: true,
                })
            }
        }
    }

    // ==========================================
    // 看板合计 (展示层在核心之外)
    // ==========================================

    /// 期间 KPI 合计
    ///
    /// # 返回
    /// - Ok(None): 期间无可用记录
    /// - Ok(Some(summary)): 合计 (含注入汇率折算的美元等值)
    pub fn dashboard_summary(&self, request: &ReportRequest) -> ApiResult<Option<CostSummary>> {
        let outcome = self.fetch_normalized(request)?;
        if outcome.records.is_empty() {
            return Ok(None);
        }
        let currency = self.rates.currency_reference();
        Ok(Some(self.aggregator.summarize(&outcome.records, &currency)))
    }

    // ==========================================
    // 内部
    // ==========================================

    /// 取数 + 归一化 (行级问题已吸收计数)
    fn fetch_normalized(&self, request: &ReportRequest) -> ApiResult<NormalizeOutcome> {
        if request.date_from > request.date_to {
            return Err(ApiError::InvalidInput(format!(
                "起始日期 {} 晚于结束日期 {}",
                request.date_from, request.date_to
            )));
        }

        let rows = self
            .source
            .fetch_cost_records(
                request.date_from,
                request.date_to,
                request.location.as_deref(),
                request.shift,
            )
            .map_err(ApiError::SourceFailure)?;
        tracing::debug!(rows = rows.len(), "取数完成");

        Ok(self.normalizer.normalize(&rows))
    }

    /// 工件文件名: Reporte_<品牌>_<YYYY-MM-DD_HHMM>.<ext>
    fn artifact_filename(&self, ctx: &ReportContext, ext: &str) -> String {
        format!(
            "Reporte_{}_{}.{}",
            self.config.brand,
            ctx.generated_at.format("%Y-%m-%d_%H%M"),
            ext
        )
    }
}
