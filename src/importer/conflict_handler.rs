// ==========================================
// 电商运营后台 - 冲突处理器实现
// ==========================================
// 职责: 按自然键判定 新增 / 更新 / 跳过 / 拒绝
// 自然键: 商品 sku / 客户 email / 订单 order_number（大小写敏感，精确匹配）
// 文件内重复: 首次出现者生效，后续出现者记为冲突错误（与策略无关）
// ==========================================

use crate::domain::import::RowError;
use crate::domain::record::CandidateRecord;
use crate::domain::types::ConflictResolution;
use crate::importer::import_traits::ConflictPolicy;
use std::collections::HashMap;

/// 单行处置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    Insert,
    Update { existing_id: String },
    Skip { existing_id: String },
    Reject { existing_id: String },
}

/// 批次写入报告唯一约束冲突时的处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueViolationHandling {
    /// 整批受影响行计为 skipped
    SkipBatch,
    /// 记为一条批次错误
    RecordError,
}

// ==========================================
// 策略实现
// ==========================================
pub struct SkipPolicy;

impl ConflictPolicy for SkipPolicy {
    fn resolution(&self) -> ConflictResolution {
        ConflictResolution::Skip
    }

    fn decide(&self, existing_id: Option<&str>) -> RowAction {
        match existing_id {
            Some(id) => RowAction::Skip {
                existing_id: id.to_string(),
            },
            None => RowAction::Insert,
        }
    }

    fn on_unique_violation(&self) -> UniqueViolationHandling {
        UniqueViolationHandling::SkipBatch
    }
}

pub struct UpdatePolicy;

impl ConflictPolicy for UpdatePolicy {
    fn resolution(&self) -> ConflictResolution {
        ConflictResolution::Update
    }

    fn decide(&self, existing_id: Option<&str>) -> RowAction {
        match existing_id {
            Some(id) => RowAction::Update {
                existing_id: id.to_string(),
            },
            None => RowAction::Insert,
        }
    }

    fn on_unique_violation(&self) -> UniqueViolationHandling {
        UniqueViolationHandling::RecordError
    }
}

pub struct ErrorPolicy;

impl ConflictPolicy for ErrorPolicy {
    fn resolution(&self) -> ConflictResolution {
        ConflictResolution::Error
    }

    fn decide(&self, existing_id: Option<&str>) -> RowAction {
        match existing_id {
            Some(id) => RowAction::Reject {
                existing_id: id.to_string(),
            },
            None => RowAction::Insert,
        }
    }

    fn on_unique_violation(&self) -> UniqueViolationHandling {
        UniqueViolationHandling::RecordError
    }
}

/// 策略注册（新增策略只需在此扩展，执行器不变）
pub fn policy_for(resolution: ConflictResolution) -> Box<dyn ConflictPolicy> {
    match resolution {
        ConflictResolution::Skip => Box::new(SkipPolicy),
        ConflictResolution::Update => Box::new(UpdatePolicy),
        ConflictResolution::Error => Box::new(ErrorPolicy),
    }
}

/// 结合已存在记录查找结果判定单行
///
/// 行无自然键时短路为新增
pub fn resolve(
    record: &CandidateRecord,
    existing: &HashMap<String, String>,
    policy: &dyn ConflictPolicy,
) -> RowAction {
    match record.natural_key() {
        Some(key) => policy.decide(existing.get(&key).map(String::as_str)),
        None => RowAction::Insert,
    }
}

/// 检测文件内自然键重复
///
/// # 返回
/// - (保留的记录, 重复行错误)：保留首次出现者，后续出现者不进入持久化
pub fn detect_intra_file_duplicates(
    records: Vec<CandidateRecord>,
) -> (Vec<CandidateRecord>, Vec<RowError>) {
    let mut first_occurrence: HashMap<String, usize> = HashMap::new();
    let mut kept = Vec::with_capacity(records.len());
    let mut errors = Vec::new();

    for record in records {
        if let Some(key) = record.natural_key() {
            if let Some(first_row) = first_occurrence.get(&key) {
                errors.push(RowError::conflict(
                    record.row_number(),
                    record.kind().natural_key_field(),
                    format!("{} 与第 {} 行重复: {}", record.kind().natural_key_field(), first_row, key),
                ));
                continue;
            }
            first_occurrence.insert(key, record.row_number());
        }
        kept.push(record);
    }

    (kept, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::RowErrorStage;
    use crate::domain::types::EntityKind;
    use crate::domain::value::CellValue;
    use std::collections::BTreeMap;

    fn product(row: usize, sku: Option<&str>) -> CandidateRecord {
        let mut fields = BTreeMap::new();
        if let Some(sku) = sku {
            fields.insert("sku".to_string(), CellValue::text(sku));
        }
        fields.insert("name".to_string(), CellValue::text("Widget"));
        CandidateRecord::new(EntityKind::Product, row, fields)
    }

    fn existing() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("A1".to_string(), "id-1".to_string());
        map
    }

    #[test]
    fn test_skip_policy() {
        let policy = policy_for(ConflictResolution::Skip);
        assert_eq!(
            resolve(&product(1, Some("A1")), &existing(), policy.as_ref()),
            RowAction::Skip {
                existing_id: "id-1".to_string()
            }
        );
        assert_eq!(
            resolve(&product(2, Some("B2")), &existing(), policy.as_ref()),
            RowAction::Insert
        );
        assert_eq!(policy.on_unique_violation(), UniqueViolationHandling::SkipBatch);
    }

    #[test]
    fn test_update_policy() {
        let policy = policy_for(ConflictResolution::Update);
        assert_eq!(policy.resolution(), ConflictResolution::Update);
        assert_eq!(
            resolve(&product(1, Some("A1")), &existing(), policy.as_ref()),
            RowAction::Update {
                existing_id: "id-1".to_string()
            }
        );
        assert_eq!(policy.on_unique_violation(), UniqueViolationHandling::RecordError);
    }

    #[test]
    fn test_error_policy() {
        let policy = policy_for(ConflictResolution::Error);
        assert!(matches!(
            resolve(&product(1, Some("A1")), &existing(), policy.as_ref()),
            RowAction::Reject { .. }
        ));
    }

    #[test]
    fn test_missing_natural_key_always_inserts() {
        for resolution in [
            ConflictResolution::Skip,
            ConflictResolution::Update,
            ConflictResolution::Error,
        ] {
            let policy = policy_for(resolution);
            assert_eq!(
                resolve(&product(1, None), &existing(), policy.as_ref()),
                RowAction::Insert
            );
        }
    }

    #[test]
    fn test_natural_key_case_sensitive() {
        let policy = policy_for(ConflictResolution::Skip);
        assert_eq!(
            resolve(&product(1, Some("a1")), &existing(), policy.as_ref()),
            RowAction::Insert
        );
    }

    #[test]
    fn test_detect_intra_file_duplicates() {
        let records = vec![
            product(1, Some("A1")),
            product(2, Some("B2")),
            product(3, Some("A1")),
            product(4, None),
            product(5, None),
        ];

        let (kept, errors) = detect_intra_file_duplicates(records);

        assert_eq!(kept.len(), 4);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 3);
        assert_eq!(errors[0].stage, RowErrorStage::Conflict);
        assert_eq!(errors[0].field.as_deref(), Some("sku"));
        assert!(errors[0].message.contains("第 1 行"));
    }
}
