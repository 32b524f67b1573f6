// ==========================================
// 电商运营后台 - 操作日志领域模型
// ==========================================
// 用途: 每次批量导入写入一条审计事件
// 对齐: activity_logs 表
// ==========================================

use crate::domain::import::ImportResult;
use crate::domain::types::EntityKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 批量导入的审计动作名
pub const ACTION_BATCH_IMPORT: &str = "batch_import";

// ==========================================
// ActivityEvent - 审计事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub event_id: String,
    pub actor_id: String,
    pub action: String,
    pub entity_kind: EntityKind,
    pub metadata: ImportAuditMetadata,
    pub created_at: NaiveDateTime,
}

// ==========================================
// ImportAuditMetadata - 导入摘要
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportAuditMetadata {
    pub run_id: String,
    pub total: usize,
    pub imported: usize,
    pub updated: usize,
    pub skipped: usize,
    pub error_count: usize,
    pub dry_run: bool,
    pub cancelled: bool,
}

impl From<&ImportResult> for ImportAuditMetadata {
    fn from(result: &ImportResult) -> Self {
        Self {
            run_id: result.run_id.clone(),
            total: result.total,
            imported: result.imported,
            updated: result.updated,
            skipped: result.skipped,
            error_count: result.errors.len(),
            dry_run: result.dry_run,
            cancelled: result.cancelled,
        }
    }
}
