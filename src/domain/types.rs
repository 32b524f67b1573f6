// ==========================================
// 电商运营后台 - 导入领域类型定义
// ==========================================
// 职责: 实体类别 / 文件类型 / 冲突策略 / 字段转换
// 序列化格式: 小写 (与前端配置 JSON 一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 目标实体类别 (Entity Kind)
// ==========================================
// 决定字段白名单与自然键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Product,  // 商品
    Customer, // 客户
    Order,    // 订单
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Product => "product",
            EntityKind::Customer => "customer",
            EntityKind::Order => "order",
        }
    }

    /// 自然键字段名（用于冲突检测）
    pub fn natural_key_field(&self) -> &'static str {
        match self {
            EntityKind::Product => "sku",
            EntityKind::Customer => "email",
            EntityKind::Order => "order_number",
        }
    }

    /// 存储表名
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Product => "products",
            EntityKind::Customer => "customers",
            EntityKind::Order => "orders",
        }
    }

    pub fn all() -> [EntityKind; 3] {
        [EntityKind::Product, EntityKind::Customer, EntityKind::Order]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "product" | "products" => Ok(EntityKind::Product),
            "customer" | "customers" => Ok(EntityKind::Customer),
            "order" | "orders" => Ok(EntityKind::Order),
            other => Err(format!("未知实体类别: {}", other)),
        }
    }
}

// ==========================================
// 文件类型 (File Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    #[serde(alias = "excel", alias = "xlsx")]
    Spreadsheet,
    Json,
    Xml,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Csv => "csv",
            FileType::Spreadsheet => "spreadsheet",
            FileType::Json => "json",
            FileType::Xml => "xml",
        }
    }

    /// 根据扩展名推断文件类型
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Some(FileType::Csv),
            "xlsx" => Some(FileType::Spreadsheet),
            "json" => Some(FileType::Json),
            "xml" => Some(FileType::Xml),
            _ => None,
        }
    }

    /// 根据内容首个非空白字符嗅探文本格式
    ///
    /// # 规则
    /// - `[` / `{` → JSON
    /// - `<` → XML
    /// - ZIP 魔数 `PK` → 电子表格
    /// - 其他 → CSV
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(b"PK\x03\x04") {
            return FileType::Spreadsheet;
        }
        let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        match body.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'[') | Some(b'{') => FileType::Json,
            Some(b'<') => FileType::Xml,
            _ => FileType::Csv,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 冲突处理策略 (Conflict Resolution)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictResolution {
    #[default]
    Skip,   // 已存在 → 跳过
    Update, // 已存在 → 合并更新
    Error,  // 已存在 → 记为错误
}

impl fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictResolution::Skip => write!(f, "skip"),
            ConflictResolution::Update => write!(f, "update"),
            ConflictResolution::Error => write!(f, "error"),
        }
    }
}

// ==========================================
// 字段转换 (Transformation)
// ==========================================
// 链式应用时按 precedence() 升序执行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transformation {
    Trim,
    Uppercase,
    Lowercase,
    Number,
    Boolean,
}

impl Transformation {
    /// 固定优先级: trim → uppercase/lowercase → number → boolean
    pub fn precedence(&self) -> u8 {
        match self {
            Transformation::Trim => 0,
            Transformation::Uppercase | Transformation::Lowercase => 1,
            Transformation::Number => 2,
            Transformation::Boolean => 3,
        }
    }
}
