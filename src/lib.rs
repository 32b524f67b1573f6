// ==========================================
// 电商运营后台 - 批量数据导入核心库
// ==========================================
// 范围: 商品 / 客户 / 订单 的文件批量导入
// 技术栈: Rust + SQLite
// 调用方式: 作为库函数由外层应用调用，返回 ImportResult
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 存储与审计协作方
pub mod repository;

// 导入层 - 批量导入管道
pub mod importer;

// 配置层 - 运行参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ConflictResolution, EntityKind, FileType, Transformation};

// 导入模型
pub use domain::{
    BatchImportConfig, CandidateRecord, CellValue, CustomValidation, ImportMapping, ImportResult,
    ParsedData, RawRow, RowError, RowErrorStage, ValidationRules,
};

// 导入管道
pub use importer::{BatchImportPipeline, BatchImporter, ImportError, ImportOutcome};

// 协作方
pub use repository::{
    ActivityLogger, EntityStore, SqliteActivityLog, SqliteEntityStore, StoreError, StoreResult,
};

// 配置
pub use config::{ConfigManager, ImportConfigReader, ImportSettings};

// ==========================================
// 常量定义
// ==========================================

// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
