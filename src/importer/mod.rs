// ==========================================
// 电商运营后台 - 导入层
// ==========================================
// 职责: 外部文件 → 目标实体记录
// 支持: CSV, 电子表格 (.xlsx), JSON, XML
// ==========================================

// 模块声明
pub mod batch_executor;
pub mod conflict_handler;
pub mod data_cleaner;
pub mod dq_validator;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod import_traits;
pub mod pipeline;
pub mod reporter;

// 重导出核心类型
pub use batch_executor::{BatchExecutor, ExecutionReport};
pub use conflict_handler::{
    policy_for, ErrorPolicy, RowAction, SkipPolicy, UniqueViolationHandling, UpdatePolicy,
};
pub use data_cleaner::DataCleaner;
pub use dq_validator::{DqValidator, ValidationReport};
pub use error::{ImportError, ImportOutcome};
pub use file_parser::{CsvAdapter, FormatRegistry, JsonAdapter, SpreadsheetAdapter, XmlAdapter};
pub use pipeline::BatchImportPipeline;
pub use reporter::ResultReporter;

// 重导出 Trait 接口
pub use import_traits::{BatchImporter, ConflictPolicy, FormatAdapter};
