// ==========================================
// 电商运营后台 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 只有格式错误 / 配置错误会中断整次导入，行级问题一律收集到结果
// ==========================================

use crate::repository::error::StoreError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("文件格式不支持: {0}（仅支持 csv/spreadsheet/json/xml）")]
    UnsupportedFormat(String),

    #[error("文件内容与声明类型不符: 声明 {declared}，实际 {detected}")]
    FormatMismatch { declared: String, detected: String },

    // ===== 格式解析错误 =====
    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("电子表格解析失败: {0}")]
    SpreadsheetParseError(String),

    #[error("JSON 解析失败: {0}")]
    JsonParseError(String),

    #[error("XML 解析失败: {0}")]
    XmlParseError(String),

    // ===== 配置错误 =====
    #[error("导入配置无效: {0}")]
    InvalidConfig(String),

    // ===== 存储错误（仅装配阶段，见 open_sqlite）=====
    #[error("存储访问失败: {0}")]
    Store(#[from] StoreError),

    // ===== 调用方注册的适配器返回的错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否属于格式错误（整次导入在触碰任何行之前终止）
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ImportError::UnsupportedFormat(_)
                | ImportError::FormatMismatch { .. }
                | ImportError::CsvParseError(_)
                | ImportError::SpreadsheetParseError(_)
                | ImportError::JsonParseError(_)
                | ImportError::XmlParseError(_)
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ImportError::FileNotFound(err.to_string()),
            _ => ImportError::FileReadError(err.to_string()),
        }
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::SpreadsheetParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::JsonParseError(err.to_string())
    }
}

// 实现 From<quick_xml::Error>
impl From<quick_xml::Error> for ImportError {
    fn from(err: quick_xml::Error) -> Self {
        ImportError::XmlParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportOutcome<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_format_error() {
        assert!(ImportError::JsonParseError("x".into()).is_format_error());
        assert!(ImportError::FormatMismatch {
            declared: "json".into(),
            detected: "csv".into()
        }
        .is_format_error());
        assert!(!ImportError::InvalidConfig("batch_size".into()).is_format_error());
        assert!(!ImportError::FileNotFound("a.csv".into()).is_format_error());
    }

    #[test]
    fn test_io_not_found_maps_to_file_not_found() {
        let err: ImportError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, ImportError::FileNotFound(_)));
    }
}
