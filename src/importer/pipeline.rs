// ==========================================
// 电商运营后台 - 批量导入管道
// ==========================================
// 职责: 整合导入流程，从文件到存储
// 流程: 解析 → 表头归一化 → 映射 → 校验 → 清洗 → 文件内去重 → (试运行: 预览) → 分批落库 → 汇总
// 约束: 每次调用独立，不持有跨调用可变状态
// ==========================================

use crate::config::{ConfigManager, ImportSettings};
use crate::db::open_sqlite_connection;
use crate::domain::import::{BatchImportConfig, ImportResult};
use crate::domain::record::CandidateRecord;
use crate::domain::types::{EntityKind, FileType};
use crate::importer::batch_executor::BatchExecutor;
use crate::importer::conflict_handler::{detect_intra_file_duplicates, policy_for};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::dq_validator::DqValidator;
use crate::importer::error::{ImportError, ImportOutcome};
use crate::importer::field_mapper::{normalize_headers, transform};
use crate::importer::file_parser::FormatRegistry;
use crate::importer::import_traits::BatchImporter;
use crate::importer::reporter::ResultReporter;
use crate::repository::activity_log_repo::{ActivityLogger, SqliteActivityLog};
use crate::repository::entity_store::EntityStore;
use crate::repository::entity_store_impl::SqliteEntityStore;
use crate::repository::error::StoreError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

const SYSTEM_ACTOR: &str = "system";

// ==========================================
// BatchImportPipeline - 批量导入管道
// ==========================================
pub struct BatchImportPipeline {
    // 协作方
    store: Arc<dyn EntityStore>,
    activity_log: Arc<dyn ActivityLogger>,

    // 运行参数
    settings: ImportSettings,
    formats: FormatRegistry,
    actor_id: String,
    cancel: CancellationToken,
}

impl BatchImportPipeline {
    /// 创建导入管道
    ///
    /// # 参数
    /// - store: 目标实体存储
    /// - activity_log: 审计日志
    /// - settings: 节流间隔 / 预览行数 / 批次上限
    pub fn new(
        store: Arc<dyn EntityStore>,
        activity_log: Arc<dyn ActivityLogger>,
        settings: ImportSettings,
    ) -> Self {
        Self {
            store,
            activity_log,
            settings,
            formats: FormatRegistry::default(),
            actor_id: SYSTEM_ACTOR.to_string(),
            cancel: CancellationToken::new(),
        }
    }

    /// 基于单个 SQLite 文件装配管道
    ///
    /// 存储 / 审计 / 运行参数共用一个连接，运行参数从 config_kv 读取
    pub async fn open_sqlite(db_path: &str) -> ImportOutcome<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| StoreError::DatabaseConnectionError(e.to_string()))?;
        let conn = Arc::new(Mutex::new(conn));

        let store = SqliteEntityStore::from_connection(conn.clone())?;
        let activity_log = SqliteActivityLog::new(conn.clone())?;
        let settings = ImportSettings::load(&ConfigManager::from_connection(conn)?).await?;
        info!(
            db_path,
            preview_limit = settings.preview_limit,
            max_batch_size = settings.max_batch_size,
            "SQLite 导入管道已装配"
        );

        Ok(Self::new(Arc::new(store), Arc::new(activity_log), settings))
    }

    /// 审计事件中的操作人
    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = actor_id.into();
        self
    }

    /// 调用方取消令牌（在批次边界生效）
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 替换格式注册表（自定义适配器）
    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn reporter(&self) -> ResultReporter {
        ResultReporter::new(self.activity_log.clone(), self.actor_id.clone())
    }
}

#[async_trait]
impl BatchImporter for BatchImportPipeline {
    #[instrument(
        skip(self, bytes, config),
        fields(run_id = tracing::field::Empty, entity_kind = %kind, bytes = bytes.len())
    )]
    async fn import_bytes(
        &self,
        bytes: &[u8],
        kind: EntityKind,
        config: &BatchImportConfig,
    ) -> ImportOutcome<ImportResult> {
        let started = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());

        config
            .validate(self.settings.max_batch_size)
            .map_err(ImportError::InvalidConfig)?;
        info!(
            file_type = %config.file_type,
            conflict_resolution = %config.conflict_resolution,
            batch_size = config.batch_size,
            dry_run = config.dry_run,
            "开始批量导入"
        );

        // === 步骤 1: 解析 ===
        debug!("步骤 1: 解析文件");
        let parsed = self.formats.parse(bytes, config).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;
        let parsed = if config.normalize_headers {
            normalize_headers(parsed, kind)
        } else {
            parsed
        };
        let total = parsed.total_rows;
        info!(total_rows = total, headers = parsed.headers.len(), "文件解析完成");

        // === 步骤 2: 映射 ===
        debug!("步骤 2: 字段映射");
        let mapped = transform(parsed.rows, &config.mappings);

        // === 步骤 3: 校验 ===
        debug!("步骤 3: 行校验");
        let report = DqValidator::new(kind).validate(mapped, &config.validation_rules);
        info!(
            valid = report.valid.len(),
            invalid = report.errors.len(),
            warnings = report.warnings.len(),
            "行校验完成"
        );

        let mut result = ImportResult::new(run_id, kind, total);
        result.dry_run = config.dry_run;
        result.errors = report.errors;
        result.warnings = report.warnings;

        // === 步骤 4: 清洗 + 文件内去重 ===
        debug!("步骤 4: 清洗并检测文件内重复");
        let preview_rows = config.dry_run.then(|| report.valid.clone());
        let records: Vec<CandidateRecord> = report
            .valid
            .into_iter()
            .map(|(row_number, row)| DataCleaner.clean(kind, row_number, row))
            .collect();
        let (records, duplicate_errors) = detect_intra_file_duplicates(records);
        if !duplicate_errors.is_empty() {
            warn!(duplicates = duplicate_errors.len(), "文件内自然键重复");
        }
        result.errors.extend(duplicate_errors);

        // === 试运行: 只返回预览，不触碰存储 ===
        if let Some(rows) = preview_rows {
            let kept: HashSet<usize> = records.iter().map(CandidateRecord::row_number).collect();
            result.preview = Some(
                rows.into_iter()
                    .filter(|(row_number, _)| kept.contains(row_number))
                    .take(self.settings.preview_limit)
                    .map(|(_, row)| row)
                    .collect(),
            );
            result.elapsed_ms = started.elapsed().as_millis() as u64;
            self.reporter().report(&mut result).await;
            info!("试运行完成，未写入存储");
            return Ok(result);
        }

        // === 步骤 5: 分批落库 ===
        debug!(records = records.len(), "步骤 5: 分批落库");
        let policy = policy_for(config.conflict_resolution);
        let executor = BatchExecutor::new(
            self.store.clone(),
            self.settings.batch_pacing,
            self.cancel.clone(),
        );
        let execution = executor
            .execute(kind, &records, config.batch_size, policy.as_ref())
            .await;
        for outcome in execution.outcomes {
            result.absorb(outcome);
        }
        result.cancelled = execution.cancelled;

        // === 步骤 6: 汇总 + 审计 ===
        result.elapsed_ms = started.elapsed().as_millis() as u64;
        self.reporter().report(&mut result).await;

        info!(
            total = result.total,
            imported = result.imported,
            updated = result.updated,
            skipped = result.skipped,
            errors = result.errors.len(),
            cancelled = result.cancelled,
            elapsed_ms = result.elapsed_ms,
            "批量导入完成"
        );

        Ok(result)
    }

    #[instrument(skip(self, file_path, config), fields(entity_kind = %kind))]
    async fn import_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        kind: EntityKind,
        config: &BatchImportConfig,
    ) -> ImportOutcome<ImportResult> {
        let path = file_path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ImportError::FileNotFound(path.display().to_string()),
            _ => ImportError::FileReadError(format!("{}: {}", path.display(), e)),
        })?;

        let by_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(FileType::from_extension);
        if let Some(file_type) = by_extension.filter(|t| *t != config.file_type) {
            warn!(
                file_path = %path.display(),
                extension_type = %file_type,
                declared = %config.file_type,
                "扩展名与声明类型不一致，以内容检测为准"
            );
        }

        info!(file_path = %path.display(), size = bytes.len(), "读取导入文件");
        self.import_bytes(&bytes, kind, config).await
    }
}
