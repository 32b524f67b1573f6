// ==========================================
// 电商运营后台 - 行校验器实现
// ==========================================
// 职责: 必填 → 实体结构规则 → 文件内唯一 → 自定义校验
// 红线: 单行失败不终止整次导入，错误按 1-based 行号收集
// ==========================================

use crate::domain::import::{RowError, ValidationRules};
use crate::domain::types::EntityKind;
use crate::domain::value::{CellValue, RawRow};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use url::Url;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

const PRODUCT_NUMERIC_FIELDS: [&str; 4] = ["price", "compare_at_price", "stock_quantity", "weight"];
const ORDER_NUMERIC_FIELDS: [&str; 1] = ["total_amount"];
const MIN_SKU_LEN: usize = 3;
const MAX_NAME_LEN: usize = 255;
const MAX_DESCRIPTION_LEN: usize = 5000;

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value.trim())
}

/// 单条违规
#[derive(Debug, Clone, PartialEq)]
struct Violation {
    field: Option<String>,
    message: String,
}

impl Violation {
    fn on(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }
}

/// 校验输出
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// (1-based 行号, 行)
    pub valid: Vec<(usize, RawRow)>,
    pub errors: Vec<RowError>,
    pub warnings: Vec<RowError>,
}

pub struct DqValidator {
    kind: EntityKind,
}

impl DqValidator {
    pub fn new(kind: EntityKind) -> Self {
        Self { kind }
    }

    /// 逐行校验
    ///
    /// # 返回
    /// - valid: 零违规的行（保持原始顺序）
    /// - errors: 每个失败行一条，消息合并该行全部违规（"; " 分隔）
    /// - warnings: 不阻断导入的提示（价格为 0、SKU 过短、描述过长、图片 URL 无效）
    pub fn validate(&self, rows: Vec<RawRow>, rules: &ValidationRules) -> ValidationReport {
        let mut report = ValidationReport::default();
        let mut seen_unique: HashMap<&str, HashSet<String>> = rules
            .unique_fields
            .iter()
            .map(|f| (f.as_str(), HashSet::new()))
            .collect();

        for (idx, row) in rows.into_iter().enumerate() {
            let row_number = idx + 1;

            let mut violations = self.check_required(&row, &rules.required_fields);
            violations.extend(self.check_structure(&row));
            violations.extend(check_unique(&row, &rules.unique_fields, &mut seen_unique));
            if let Some(validator) = &rules.custom_validator {
                let outcome = validator(&row);
                if !outcome.valid || !outcome.errors.is_empty() {
                    let messages = if outcome.errors.is_empty() {
                        vec!["自定义校验未通过".to_string()]
                    } else {
                        outcome.errors
                    };
                    violations.extend(messages.into_iter().map(|message| Violation {
                        field: None,
                        message,
                    }));
                }
            }

            if violations.is_empty() {
                for (field, message) in self.check_warnings(&row) {
                    report
                        .warnings
                        .push(RowError::validation(row_number, Some(field.to_string()), message));
                }
                report.valid.push((row_number, row));
            } else {
                let field = violations.iter().find_map(|v| v.field.clone());
                let message = violations
                    .into_iter()
                    .map(|v| v.message)
                    .collect::<Vec<_>>()
                    .join("; ");
                debug!(row_number, %message, "行校验失败");
                report
                    .errors
                    .push(RowError::validation(row_number, field, message));
            }
        }

        report
    }

    // ===== 规则 1: 必填 =====
    fn check_required(&self, row: &RawRow, required: &[String]) -> Vec<Violation> {
        required
            .iter()
            .filter(|field| row.get(field.as_str()).map_or(true, CellValue::is_blank))
            .map(|field| Violation::on(field, format!("缺少必填字段: {}", field)))
            .collect()
    }

    // ===== 规则 2: 实体结构规则 =====
    fn check_structure(&self, row: &RawRow) -> Vec<Violation> {
        let mut violations = Vec::new();

        match self.kind {
            EntityKind::Product => {
                for field in PRODUCT_NUMERIC_FIELDS {
                    violations.extend(check_non_negative(row, field));
                }
                if let Some(name) = row.get("name") {
                    let len = name.to_string().trim().chars().count();
                    if len > MAX_NAME_LEN {
                        violations.push(Violation::on(
                            "name",
                            format!("商品名称超过 {} 个字符: {}", MAX_NAME_LEN, len),
                        ));
                    }
                }
            }
            EntityKind::Customer => match row.get("email") {
                Some(v) if !v.is_blank() => {
                    let email = v.to_string();
                    if !is_valid_email(&email) {
                        violations.push(Violation::on(
                            "email",
                            format!("邮箱格式不正确: {}", email.trim()),
                        ));
                    }
                }
                _ => violations.push(Violation::on("email", "客户邮箱不能为空")),
            },
            EntityKind::Order => {
                if row.get("order_number").map_or(true, CellValue::is_blank) {
                    violations.push(Violation::on("order_number", "订单号不能为空"));
                }
                for field in ORDER_NUMERIC_FIELDS {
                    violations.extend(check_non_negative(row, field));
                }
                if let Some(v) = row.get("customer_email").filter(|v| !v.is_blank()) {
                    let email = v.to_string();
                    if !is_valid_email(&email) {
                        violations.push(Violation::on(
                            "customer_email",
                            format!("客户邮箱格式不正确: {}", email.trim()),
                        ));
                    }
                }
            }
        }

        violations
    }

    fn check_warnings(&self, row: &RawRow) -> Vec<(&'static str, String)> {
        let mut warnings = Vec::new();
        if self.kind != EntityKind::Product {
            return warnings;
        }

        if row.get("price").and_then(CellValue::to_decimal) == Some(0.0) {
            warnings.push(("price", "价格为 0".to_string()));
        }
        if let Some(sku) = row.get("sku").filter(|v| !v.is_blank()) {
            let sku = sku.to_string();
            if sku.trim().chars().count() < MIN_SKU_LEN {
                warnings.push(("sku", format!("SKU 过短: {}", sku.trim())));
            }
        }
        if let Some(description) = row.get("description") {
            let len = description.to_string().chars().count();
            if len > MAX_DESCRIPTION_LEN {
                warnings.push((
                    "description",
                    format!("描述超过 {} 个字符: {}", MAX_DESCRIPTION_LEN, len),
                ));
            }
        }
        if let Some(image_url) = row.get("image_url").filter(|v| !v.is_blank()) {
            let image_url = image_url.to_string();
            if Url::parse(image_url.trim()).is_err() {
                warnings.push(("image_url", format!("图片 URL 无效: {}", image_url.trim())));
            }
        }

        warnings
    }
}

/// 数值字段: 存在时必须可解析且 ≥ 0
fn check_non_negative(row: &RawRow, field: &str) -> Option<Violation> {
    let value = row.get(field).filter(|v| !v.is_blank())?;
    match value.to_decimal() {
        None => Some(Violation::on(field, format!("{} 不是有效数字: {}", field, value))),
        Some(n) if n < 0.0 => Some(Violation::on(field, format!("{} 不能为负数: {}", field, value))),
        Some(_) => None,
    }
}

// ===== 规则 3: 文件内唯一 =====
fn check_unique<'a>(
    row: &RawRow,
    unique_fields: &'a [String],
    seen: &mut HashMap<&'a str, HashSet<String>>,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    for field in unique_fields {
        let Some(value) = row.get(field.as_str()).filter(|v| !v.is_blank()) else {
            continue;
        };
        let key = value.to_string().trim().to_string();
        let values = seen.entry(field.as_str()).or_default();
        if !values.insert(key.clone()) {
            violations.push(Violation::on(
                field,
                format!("{} 在文件内重复: {}", field, key),
            ));
        }
    }
    violations
}
