// ==========================================
// 电商运营后台 - 批量导入领域模型
// ==========================================
// 职责: 导入配置 / 中间产物 / 导入结果
// 生命周期: 单次导入调用内有效，不落库
// ==========================================

use crate::domain::types::{ConflictResolution, EntityKind, FileType, Transformation};
use crate::domain::value::{CellValue, RawRow};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::Arc;

// ==========================================
// ImportMapping - 字段映射声明
// ==========================================
// 一条映射: 源列 → 目标字段（可选转换 + 默认值）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportMapping {
    pub source_field: String,
    pub target_field: String,
    #[serde(
        default,
        alias = "transformation",
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub transformations: Vec<Transformation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<CellValue>,
}

impl ImportMapping {
    pub fn new(source_field: impl Into<String>, target_field: impl Into<String>) -> Self {
        Self {
            source_field: source_field.into(),
            target_field: target_field.into(),
            transformations: Vec::new(),
            default_value: None,
        }
    }

    pub fn with_transformation(mut self, transformation: Transformation) -> Self {
        self.transformations.push(transformation);
        self
    }

    pub fn with_default(mut self, value: impl Into<CellValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Transformation),
    Many(Vec<Transformation>),
}

/// 兼容 `"transformation": "trim"` 与 `"transformations": ["trim", "uppercase"]`
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Transformation>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(t)) => vec![t],
        Some(OneOrMany::Many(v)) => v,
    })
}

// ==========================================
// 自定义校验器
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl CustomValidation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn fail(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}

/// 调用方提供的行级校验函数（仅代码注入，不参与序列化）
pub type CustomValidator = Arc<dyn Fn(&RawRow) -> CustomValidation + Send + Sync>;

// ==========================================
// ValidationRules - 校验规则
// ==========================================
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// 文件内取值必须唯一的字段（后出现者判为校验失败）
    #[serde(default)]
    pub unique_fields: Vec<String>,
    #[serde(skip)]
    pub custom_validator: Option<CustomValidator>,
}

impl ValidationRules {
    pub fn required(fields: &[&str]) -> Self {
        Self {
            required_fields: fields.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_custom_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&RawRow) -> CustomValidation + Send + Sync + 'static,
    {
        self.custom_validator = Some(Arc::new(validator));
        self
    }
}

impl fmt::Debug for ValidationRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRules")
            .field("required_fields", &self.required_fields)
            .field("unique_fields", &self.unique_fields)
            .field("custom_validator", &self.custom_validator.is_some())
            .finish()
    }
}

// ==========================================
// FormatOptions - 格式相关选项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatOptions {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub sheet_name: Option<String>,
    #[serde(default = "default_xml_item_tag")]
    pub xml_item_tag: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            sheet_name: None,
            xml_item_tag: default_xml_item_tag(),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

fn default_xml_item_tag() -> String {
    "item".to_string()
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    50
}

// ==========================================
// BatchImportConfig - 单次导入配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchImportConfig {
    pub file_type: FileType,
    #[serde(default = "default_true")]
    pub has_header: bool,
    #[serde(flatten)]
    pub options: FormatOptions,
    #[serde(default)]
    pub mappings: Vec<ImportMapping>,
    #[serde(default)]
    pub validation_rules: ValidationRules,
    #[serde(default)]
    pub conflict_resolution: ConflictResolution,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub dry_run: bool,
    /// 按实体别名表归一化表头（如 "Variant SKU" → "sku"）
    #[serde(default)]
    pub normalize_headers: bool,
}

impl BatchImportConfig {
    pub fn new(file_type: FileType) -> Self {
        Self {
            file_type,
            has_header: true,
            options: FormatOptions::default(),
            mappings: Vec::new(),
            validation_rules: ValidationRules::default(),
            conflict_resolution: ConflictResolution::default(),
            batch_size: default_batch_size(),
            dry_run: false,
            normalize_headers: false,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// 运行前配置检查
    ///
    /// # 返回
    /// - Err(String): 不合法原因（由调用方包装为 InvalidConfig）
    pub fn validate(&self, max_batch_size: usize) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size 必须大于 0".to_string());
        }
        if self.batch_size > max_batch_size {
            return Err(format!(
                "batch_size {} 超过上限 {}",
                self.batch_size, max_batch_size
            ));
        }
        if !self.options.delimiter.is_ascii() {
            return Err(format!("分隔符必须是 ASCII 字符: {:?}", self.options.delimiter));
        }
        if self.options.xml_item_tag.trim().is_empty() {
            return Err("xml_item_tag 不能为空".to_string());
        }
        for mapping in &self.mappings {
            if mapping.source_field.is_empty() || mapping.target_field.is_empty() {
                return Err("映射的 source_field / target_field 不能为空".to_string());
            }
        }
        Ok(())
    }
}

// ==========================================
// ParsedData - 格式适配器输出
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedData {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub total_rows: usize,
}

impl ParsedData {
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        let total_rows = rows.len();
        Self {
            headers,
            rows,
            total_rows,
        }
    }
}

// ==========================================
// RowError - 行级问题
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowErrorStage {
    Validation,  // 校验失败
    Conflict,    // 冲突拒绝
    Persistence, // 批次写入失败
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize, // 1-based 数据行号
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    pub stage: RowErrorStage,
}

impl RowError {
    pub fn validation(row: usize, field: Option<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            field,
            message: message.into(),
            stage: RowErrorStage::Validation,
        }
    }

    pub fn conflict(row: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            row,
            field: Some(field.to_string()),
            message: message.into(),
            stage: RowErrorStage::Conflict,
        }
    }

    pub fn persistence(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            field: None,
            message: message.into(),
            stage: RowErrorStage::Persistence,
        }
    }
}

// ==========================================
// BatchOutcome - 单批次结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub batch_index: usize,
    pub imported: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<RowError>,
}

// ==========================================
// ImportResult - 导入结果
// ==========================================
// 计数跨批次单调累加
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub run_id: String,
    pub entity_kind: EntityKind,
    pub total: usize,
    pub imported: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<RowError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RowError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Vec<RawRow>>,
    pub dry_run: bool,
    pub cancelled: bool,
    pub batches_processed: usize,
    pub elapsed_ms: u64,
}

impl ImportResult {
    pub fn new(run_id: impl Into<String>, entity_kind: EntityKind, total: usize) -> Self {
        Self {
            run_id: run_id.into(),
            entity_kind,
            total,
            imported: 0,
            updated: 0,
            skipped: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            preview: None,
            dry_run: false,
            cancelled: false,
            batches_processed: 0,
            elapsed_ms: 0,
        }
    }

    /// 累加单批次结果
    pub fn absorb(&mut self, outcome: BatchOutcome) {
        self.imported += outcome.imported;
        self.updated += outcome.updated;
        self.skipped += outcome.skipped;
        self.errors.extend(outcome.errors);
        self.batches_processed += 1;
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// 成功落库（新增 + 更新）
    pub fn persisted(&self) -> usize {
        self.imported + self.updated
    }
}
