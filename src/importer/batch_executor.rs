// ==========================================
// 电商运营后台 - 分批执行器实现
// ==========================================
// 职责: 候选记录切分为固定大小批次，严格串行落库
// 调度: 单一挂起点位于批次边界（节流间隔 + 取消检查）
// 红线: 批次失败不重试，不终止后续批次
// ==========================================

use crate::domain::import::{BatchOutcome, RowError};
use crate::domain::record::CandidateRecord;
use crate::domain::types::EntityKind;
use crate::importer::conflict_handler::{resolve, RowAction, UniqueViolationHandling};
use crate::importer::import_traits::ConflictPolicy;
use crate::repository::entity_store::EntityStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 执行汇总
#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub outcomes: Vec<BatchOutcome>,
    pub cancelled: bool,
}

pub struct BatchExecutor {
    store: Arc<dyn EntityStore>,
    pacing: Duration,
    cancel: CancellationToken,
}

impl BatchExecutor {
    /// # 参数
    /// - store: 持久化协作方
    /// - pacing: 批次间隔（0 表示不等待）
    /// - cancel: 调用方取消令牌（仅在批次边界生效）
    pub fn new(store: Arc<dyn EntityStore>, pacing: Duration, cancel: CancellationToken) -> Self {
        Self {
            store,
            pacing,
            cancel,
        }
    }

    /// 串行执行全部批次
    ///
    /// 第 N+1 批在第 N 批完成（含失败）后才开始
    pub async fn execute(
        &self,
        kind: EntityKind,
        records: &[CandidateRecord],
        batch_size: usize,
        policy: &dyn ConflictPolicy,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let batch_size = batch_size.max(1);
        let total_batches = records.len().div_ceil(batch_size);
        info!(
            records = records.len(),
            batch_size,
            total_batches,
            policy = %policy.resolution(),
            "开始分批落库"
        );

        for (index, batch) in records.chunks(batch_size).enumerate() {
            if index > 0 {
                self.pause_between_batches().await;
            }
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                warn!(
                    processed = index,
                    total_batches, "导入已取消，剩余批次不再执行"
                );
                break;
            }

            let outcome = self.run_batch(kind, index, batch, policy).await;
            info!(
                batch = index + 1,
                total_batches,
                imported = outcome.imported,
                updated = outcome.updated,
                skipped = outcome.skipped,
                errors = outcome.errors.len(),
                "批次完成"
            );
            report.outcomes.push(outcome);
        }

        report
    }

    /// 批次间节流（等待期间收到取消立即返回）
    async fn pause_between_batches(&self) {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(self.pacing) => {}
        }
    }

    async fn run_batch(
        &self,
        kind: EntityKind,
        index: usize,
        batch: &[CandidateRecord],
        policy: &dyn ConflictPolicy,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            batch_index: index,
            ..Default::default()
        };
        let first_row = batch.first().map(CandidateRecord::row_number).unwrap_or(0);

        // === 查找已存在记录 ===
        let mut seen = HashSet::new();
        let keys: Vec<String> = batch
            .iter()
            .filter_map(CandidateRecord::natural_key)
            .filter(|k| seen.insert(k.clone()))
            .collect();

        let existing = if keys.is_empty() {
            Default::default()
        } else {
            match self.store.find_existing(kind, &keys).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(batch = index + 1, error = %e, "查找已存在记录失败");
                    outcome.errors.push(RowError::persistence(
                        first_row,
                        format!("第 {} 批查找已存在记录失败: {}", index + 1, e),
                    ));
                    return outcome;
                }
            }
        };

        // === 逐行判定 ===
        let mut inserts = Vec::new();
        let mut updates = Vec::new();
        for record in batch {
            match resolve(record, &existing, policy) {
                RowAction::Insert => inserts.push(record.clone()),
                RowAction::Update { existing_id } => {
                    debug!(row = record.row_number(), %existing_id, "记录已存在，合并更新");
                    updates.push(record.clone());
                }
                RowAction::Skip { existing_id } => {
                    debug!(row = record.row_number(), %existing_id, "记录已存在，跳过");
                    outcome.skipped += 1;
                }
                RowAction::Reject { existing_id } => {
                    outcome.errors.push(RowError::conflict(
                        record.row_number(),
                        kind.natural_key_field(),
                        format!(
                            "{} 已存在: {}（记录 {}）",
                            kind.natural_key_field(),
                            record.natural_key().unwrap_or_default(),
                            existing_id
                        ),
                    ));
                }
            }
        }

        // === 写入新增 ===
        if !inserts.is_empty() {
            match self.store.insert(kind, &inserts).await {
                Ok(ids) => outcome.imported += ids.len(),
                Err(e)
                    if e.is_unique_violation()
                        && policy.on_unique_violation() == UniqueViolationHandling::SkipBatch =>
                {
                    warn!(batch = index + 1, rows = inserts.len(), error = %e, "唯一约束冲突，整批计为跳过");
                    outcome.skipped += inserts.len();
                }
                Err(e) => {
                    warn!(batch = index + 1, error = %e, "批次写入失败");
                    outcome.errors.push(RowError::persistence(
                        first_row,
                        format!("第 {} 批写入失败（{} 行）: {}", index + 1, inserts.len(), e),
                    ));
                }
            }
        }

        // === 合并更新 ===
        if !updates.is_empty() {
            match self
                .store
                .upsert(kind, &updates, kind.natural_key_field())
                .await
            {
                Ok(_) => outcome.updated += updates.len(),
                Err(e) => {
                    warn!(batch = index + 1, error = %e, "批次更新失败");
                    outcome.errors.push(RowError::persistence(
                        first_row,
                        format!("第 {} 批更新失败（{} 行）: {}", index + 1, updates.len(), e),
                    ));
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::RowErrorStage;
    use crate::domain::value::CellValue;
    use crate::importer::conflict_handler::policy_for;
    use crate::domain::types::ConflictResolution;
    use crate::repository::error::{StoreError, StoreResult};
    use async_trait::async_trait;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    /// 内存存储：记录调用，可注入失败
    #[derive(Default)]
    struct MemoryStore {
        existing: HashMap<String, String>,
        insert_sizes: Mutex<Vec<usize>>,
        upsert_sizes: Mutex<Vec<usize>>,
        fail_insert_with: Option<fn() -> StoreError>,
    }

    #[async_trait]
    impl EntityStore for MemoryStore {
        async fn find_existing(
            &self,
            _kind: EntityKind,
            natural_keys: &[String],
        ) -> StoreResult<HashMap<String, String>> {
            Ok(natural_keys
                .iter()
                .filter_map(|k| self.existing.get(k).map(|id| (k.clone(), id.clone())))
                .collect())
        }

        async fn insert(
            &self,
            _kind: EntityKind,
            batch: &[CandidateRecord],
        ) -> StoreResult<Vec<String>> {
            self.insert_sizes.lock().unwrap().push(batch.len());
            if let Some(fail) = self.fail_insert_with {
                return Err(fail());
            }
            Ok(batch.iter().map(|r| format!("id-{}", r.row_number())).collect())
        }

        async fn upsert(
            &self,
            _kind: EntityKind,
            batch: &[CandidateRecord],
            _conflict_key: &str,
        ) -> StoreResult<Vec<String>> {
            self.upsert_sizes.lock().unwrap().push(batch.len());
            Ok(batch.iter().map(|r| format!("id-{}", r.row_number())).collect())
        }
    }

    fn products(count: usize) -> Vec<CandidateRecord> {
        (1..=count)
            .map(|row| {
                let mut fields = BTreeMap::new();
                fields.insert("sku".to_string(), CellValue::text(format!("SKU-{}", row)));
                CandidateRecord::new(EntityKind::Product, row, fields)
            })
            .collect()
    }

    fn executor(store: Arc<MemoryStore>) -> BatchExecutor {
        BatchExecutor::new(store, Duration::ZERO, CancellationToken::new())
    }

    #[tokio::test]
    async fn test_batches_are_sized_exactly() {
        let store = Arc::new(MemoryStore::default());
        let policy = policy_for(ConflictResolution::Skip);

        let report = executor(store.clone())
            .execute(EntityKind::Product, &products(120), 50, policy.as_ref())
            .await;

        assert_eq!(*store.insert_sizes.lock().unwrap(), vec![50, 50, 20]);
        assert_eq!(report.outcomes.len(), 3);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_existing_rows_routed_by_policy() {
        let mut store = MemoryStore::default();
        store.existing.insert("SKU-2".to_string(), "db-2".to_string());
        let store = Arc::new(store);

        let update = policy_for(ConflictResolution::Update);
        let report = executor(store.clone())
            .execute(EntityKind::Product, &products(3), 50, update.as_ref())
            .await;

        assert_eq!(report.outcomes[0].imported, 2);
        assert_eq!(report.outcomes[0].updated, 1);
        assert_eq!(*store.upsert_sizes.lock().unwrap(), vec![1]);

        let reject = policy_for(ConflictResolution::Error);
        let report = executor(store.clone())
            .execute(EntityKind::Product, &products(3), 50, reject.as_ref())
            .await;

        let errors = &report.outcomes[0].errors;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 2);
        assert_eq!(errors[0].stage, RowErrorStage::Conflict);
    }

    #[tokio::test]
    async fn test_unique_violation_under_skip_counts_batch_as_skipped() {
        let store = Arc::new(MemoryStore {
            fail_insert_with: Some(|| StoreError::UniqueViolation("sku".to_string())),
            ..Default::default()
        });
        let policy = policy_for(ConflictResolution::Skip);

        let report = executor(store.clone())
            .execute(EntityKind::Product, &products(4), 50, policy.as_ref())
            .await;

        assert_eq!(report.outcomes[0].skipped, 4);
        assert!(report.outcomes[0].errors.is_empty());
    }

    #[tokio::test]
    async fn test_generic_failure_records_one_error_and_continues() {
        let store = Arc::new(MemoryStore {
            fail_insert_with: Some(|| StoreError::DatabaseQueryError("disk full".to_string())),
            ..Default::default()
        });
        let policy = policy_for(ConflictResolution::Skip);

        let report = executor(store.clone())
            .execute(EntityKind::Product, &products(5), 2, policy.as_ref())
            .await;

        // 三批均被尝试，每批一条错误
        assert_eq!(store.insert_sizes.lock().unwrap().len(), 3);
        let rows: Vec<usize> = report
            .outcomes
            .iter()
            .flat_map(|o| o.errors.iter().map(|e| e.row))
            .collect();
        assert_eq!(rows, vec![1, 3, 5]);
        assert!(report.outcomes.iter().all(|o| o.imported == 0));
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let store = Arc::new(MemoryStore::default());
        let token = CancellationToken::new();
        token.cancel();
        let policy = policy_for(ConflictResolution::Skip);

        let report = BatchExecutor::new(store.clone(), Duration::from_millis(10), token)
            .execute(EntityKind::Product, &products(10), 5, policy.as_ref())
            .await;

        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
        assert!(store.insert_sizes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_pacing_stops_at_boundary() {
        let store = Arc::new(MemoryStore::default());
        let token = CancellationToken::new();
        let policy = policy_for(ConflictResolution::Skip);
        let executor = BatchExecutor::new(store.clone(), Duration::from_secs(30), token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });
        let report = executor
            .execute(EntityKind::Product, &products(10), 5, policy.as_ref())
            .await;
        canceller.await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(*store.insert_sizes.lock().unwrap(), vec![5]);
    }
}
