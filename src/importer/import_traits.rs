// ==========================================
// 电商运营后台 - 批量导入 Trait
// ==========================================
// 职责: 定义导入管道各环节接口（不包含实现）
// 流程: 解析 → 映射 → 校验 → 冲突判定 → 分批落库 → 汇总
// ==========================================

use crate::domain::import::{BatchImportConfig, FormatOptions, ImportResult, ParsedData};
use crate::domain::types::{ConflictResolution, EntityKind, FileType};
use crate::importer::conflict_handler::{RowAction, UniqueViolationHandling};
use crate::importer::error::ImportOutcome;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// BatchImporter Trait
// ==========================================
// 用途: 批量导入主接口
// 实现者: BatchImportPipeline
#[async_trait]
pub trait BatchImporter: Send + Sync {
    /// 从内存字节导入
    ///
    /// # 参数
    /// - bytes: 上传文件内容
    /// - kind: 目标实体类别
    /// - config: 单次导入配置
    ///
    /// # 返回
    /// - Ok(ImportResult): 导入结果（行级错误收集在 errors 中）
    /// - Err: 格式错误 / 配置错误（整次导入终止，未触碰任何行）
    async fn import_bytes(
        &self,
        bytes: &[u8],
        kind: EntityKind,
        config: &BatchImportConfig,
    ) -> ImportOutcome<ImportResult>;

    /// 从本地文件导入
    ///
    /// # 返回
    /// - Err(ImportError::FileNotFound): 文件不存在
    /// - 其余同 import_bytes
    async fn import_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        kind: EntityKind,
        config: &BatchImportConfig,
    ) -> ImportOutcome<ImportResult>;
}

// ==========================================
// FormatAdapter Trait
// ==========================================
// 用途: 文件解析接口（每种格式一个实现）
// 实现者: CsvAdapter, SpreadsheetAdapter, JsonAdapter, XmlAdapter
pub trait FormatAdapter: Send + Sync {
    /// 适配器负责的文件类型
    fn file_type(&self) -> FileType;

    /// 解析原始字节为表头 + 行字典
    ///
    /// # 参数
    /// - bytes: 文件内容
    /// - has_header: 首行是否为表头（仅表格类格式有效）
    /// - options: 分隔符 / 工作表名 / XML 条目标签
    ///
    /// # 返回
    /// - Ok(ParsedData): 解析结果
    /// - Err: 格式错误
    fn parse(
        &self,
        bytes: &[u8],
        has_header: bool,
        options: &FormatOptions,
    ) -> ImportOutcome<ParsedData>;
}

// ==========================================
// ConflictPolicy Trait
// ==========================================
// 用途: 已存在记录的处理策略（每种策略一个实现）
// 实现者: SkipPolicy, UpdatePolicy, ErrorPolicy
pub trait ConflictPolicy: Send + Sync {
    /// 策略标识
    fn resolution(&self) -> ConflictResolution;

    /// 单行判定
    ///
    /// # 参数
    /// - existing_id: 按自然键命中的已存在记录 ID（None 表示未命中）
    ///
    /// # 返回
    /// - RowAction: 新增 / 更新 / 跳过 / 拒绝
    fn decide(&self, existing_id: Option<&str>) -> RowAction;

    /// 存储层在批次写入时报告唯一约束冲突时的处理方式
    fn on_unique_violation(&self) -> UniqueViolationHandling;
}
