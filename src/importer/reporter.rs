// ==========================================
// 电商运营后台 - 导入结果汇总
// ==========================================
// 职责: 错误按行号排序 + 每次调用写入一条审计事件
// 红线: 审计写入失败只记录日志，不影响导入结果
// ==========================================

use crate::domain::action_log::{ActivityEvent, ImportAuditMetadata, ACTION_BATCH_IMPORT};
use crate::domain::import::ImportResult;
use crate::repository::activity_log_repo::ActivityLogger;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct ResultReporter {
    activity_log: Arc<dyn ActivityLogger>,
    actor_id: String,
}

impl ResultReporter {
    pub fn new(activity_log: Arc<dyn ActivityLogger>, actor_id: impl Into<String>) -> Self {
        Self {
            activity_log,
            actor_id: actor_id.into(),
        }
    }

    /// 整理结果并写入审计事件
    ///
    /// # 返回
    /// - bool: 审计是否写入成功（仅供观测）
    pub async fn report(&self, result: &mut ImportResult) -> bool {
        finalize(result);

        let event = ActivityEvent {
            event_id: Uuid::new_v4().to_string(),
            actor_id: self.actor_id.clone(),
            action: ACTION_BATCH_IMPORT.to_string(),
            entity_kind: result.entity_kind,
            metadata: ImportAuditMetadata::from(&*result),
            created_at: Utc::now().naive_utc(),
        };

        match self.activity_log.record(event).await {
            Ok(()) => {
                info!(
                    run_id = %result.run_id,
                    entity_kind = %result.entity_kind,
                    total = result.total,
                    imported = result.imported,
                    updated = result.updated,
                    skipped = result.skipped,
                    errors = result.errors.len(),
                    "导入审计已记录"
                );
                true
            }
            Err(e) => {
                warn!(run_id = %result.run_id, error = %e, "导入审计写入失败，已忽略");
                false
            }
        }
    }
}

/// 错误 / 警告按行号稳定排序（同一行保持产生顺序）
pub fn finalize(result: &mut ImportResult) {
    result.errors.sort_by_key(|e| e.row);
    result.warnings.sort_by_key(|w| w.row);
}
