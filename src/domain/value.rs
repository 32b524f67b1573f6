// ==========================================
// 电商运营后台 - 单元格值
// ==========================================
// 职责: 解析 → 映射 → 校验 全流程中的动态字段值
// 约定: NaN 作为"非数字"哨兵值，由校验器拦截
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;

/// 原始行 / 映射后行（列名 → 值）
pub type RawRow = HashMap<String, CellValue>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// 缺失判定: 不存在 / Null / 空白字符串
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, CellValue::Number(n) if n.is_nan())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 宽松数值解析
    ///
    /// # 规则
    /// - 去除首尾空白与货币符号（€ $ £）
    /// - 小数逗号视为小数点（"9,99" → 9.99）
    /// - NaN / 无法解析 → None
    pub fn to_decimal(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Number(n) if n.is_nan() => None,
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => parse_decimal_text(s),
            CellValue::Bool(_) | CellValue::Null => None,
        }
    }

    /// 整数解析（小数部分截断）
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            other => other.to_decimal().filter(|n| n.is_finite()).map(|n| n.trunc() as i64),
        }
    }
}

/// 解析文本数值（货币符号 / 小数逗号容错）
pub fn parse_decimal_text(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '€' | '$' | '£') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let normalized = if cleaned.contains(',') && !cleaned.contains('.') {
        cleaned.replace(',', ".")
    } else {
        cleaned.replace(',', "")
    };
    normalized.parse::<f64>().ok().filter(|n| !n.is_nan())
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<JsonValue> for CellValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => CellValue::Null,
            JsonValue::Bool(b) => CellValue::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => CellValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => CellValue::Text(s),
            // 嵌套结构不展开，按 JSON 文本保留
            nested => CellValue::Text(nested.to_string()),
        }
    }
}

impl From<CellValue> for JsonValue {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Null => JsonValue::Null,
            CellValue::Bool(b) => JsonValue::Bool(b),
            CellValue::Integer(i) => JsonValue::Number(i.into()),
            CellValue::Number(n) => Number::from_f64(n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            CellValue::Text(s) => JsonValue::String(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}
