// ==========================================
// 电商运营后台 - 领域模型层
// ==========================================
// 职责: 定义导入配置、动态行值、候选记录、审计事件
// 红线: 不含数据访问逻辑,不含管道逻辑
// ==========================================

pub mod action_log;
pub mod import;
pub mod record;
pub mod types;
pub mod value;

// 重导出核心类型
pub use action_log::{ActivityEvent, ImportAuditMetadata, ACTION_BATCH_IMPORT};
pub use import::{
    BatchImportConfig, BatchOutcome, CustomValidation, CustomValidator, FormatOptions,
    ImportMapping, ImportResult, ParsedData, RowError, RowErrorStage, ValidationRules,
};
pub use record::CandidateRecord;
pub use types::{ConflictResolution, EntityKind, FileType, Transformation};
pub use value::{CellValue, RawRow};
