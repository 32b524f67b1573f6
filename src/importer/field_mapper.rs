// ==========================================
// 电商运营后台 - 字段映射器实现
// ==========================================
// 职责: 源列 → 目标字段映射 + 值转换 + 默认值
// 约束: 纯函数，无 I/O
// ==========================================

use crate::domain::import::{ImportMapping, ParsedData};
use crate::domain::types::{EntityKind, Transformation};
use crate::domain::value::{parse_decimal_text, CellValue, RawRow};
use std::collections::HashMap;
use tracing::debug;

/// 按映射声明投影所有行
///
/// # 规则
/// - 无映射: 原样透传
/// - 有映射: 输出行仅包含各映射的 target_field（未映射列丢弃）
/// - 转换按固定优先级执行: trim → uppercase/lowercase → number → boolean
/// - 转换结果为空（缺失 / Null / 空串）且声明了默认值时，使用默认值
pub fn transform(rows: Vec<RawRow>, mappings: &[ImportMapping]) -> Vec<RawRow> {
    if mappings.is_empty() {
        return rows;
    }

    rows.iter().map(|row| map_row(row, mappings)).collect()
}

fn map_row(row: &RawRow, mappings: &[ImportMapping]) -> RawRow {
    let mut output = HashMap::with_capacity(mappings.len());

    for mapping in mappings {
        let mut value = row
            .get(&mapping.source_field)
            .cloned()
            .unwrap_or(CellValue::Null);

        for transformation in ordered(&mapping.transformations) {
            value = apply(transformation, value);
        }

        if value.is_blank() {
            if let Some(default) = &mapping.default_value {
                value = default.clone();
            }
        }

        output.insert(mapping.target_field.clone(), value);
    }

    output
}

/// 稳定排序，同优先级保持声明顺序
fn ordered(transformations: &[Transformation]) -> Vec<Transformation> {
    let mut sorted = transformations.to_vec();
    sorted.sort_by_key(Transformation::precedence);
    sorted
}

/// 单个值转换
///
/// - number: 空值 → Null（保留默认值生效的机会）；非数字 → NaN 哨兵值，交由校验器拦截
/// - boolean: true/1/yes/y/是 → true，其余非空值 → false
pub fn apply(transformation: Transformation, value: CellValue) -> CellValue {
    match transformation {
        Transformation::Trim => match value {
            CellValue::Text(s) => CellValue::Text(s.trim().to_string()),
            other => other,
        },
        Transformation::Uppercase => match value {
            CellValue::Text(s) => CellValue::Text(s.to_uppercase()),
            other => other,
        },
        Transformation::Lowercase => match value {
            CellValue::Text(s) => CellValue::Text(s.to_lowercase()),
            other => other,
        },
        Transformation::Number => match value {
            v if v.is_blank() => CellValue::Null,
            CellValue::Integer(i) => CellValue::Integer(i),
            CellValue::Number(n) => CellValue::Number(n),
            CellValue::Bool(b) => CellValue::Integer(i64::from(b)),
            CellValue::Text(s) => CellValue::Number(parse_decimal_text(&s).unwrap_or(f64::NAN)),
            CellValue::Null => CellValue::Null,
        },
        Transformation::Boolean => match value {
            v if v.is_blank() => CellValue::Null,
            CellValue::Bool(b) => CellValue::Bool(b),
            CellValue::Integer(i) => CellValue::Bool(i != 0),
            CellValue::Number(n) => CellValue::Bool(n != 0.0 && !n.is_nan()),
            CellValue::Text(s) => CellValue::Bool(matches!(
                s.trim().to_lowercase().as_str(),
                "true" | "1" | "yes" | "y" | "是"
            )),
            CellValue::Null => CellValue::Null,
        },
    }
}

// ==========================================
// 表头别名归一化
// ==========================================
// 常见平台导出列名 → 内部字段名（大小写不敏感）

fn header_aliases(kind: EntityKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        EntityKind::Product => &[
            ("variant sku", "sku"),
            ("title", "name"),
            ("product name", "name"),
            ("body (html)", "description"),
            ("body_html", "description"),
            ("variant price", "price"),
            ("variant compare at price", "compare_at_price"),
            ("variant inventory qty", "stock_quantity"),
            ("inventory_quantity", "stock_quantity"),
            ("inventory", "stock_quantity"),
            ("variant weight", "weight"),
            ("variant grams", "weight"),
            ("type", "category"),
            ("product_type", "category"),
            ("published", "status"),
            ("image src", "image_url"),
            ("image alt text", "image_alt"),
            ("seo title", "seo_title"),
            ("seo description", "seo_description"),
        ],
        EntityKind::Customer => &[
            ("e-mail", "email"),
            ("email address", "email"),
            ("first name", "first_name"),
            ("last name", "last_name"),
            ("phone number", "phone"),
        ],
        EntityKind::Order => &[
            ("order number", "order_number"),
            ("order #", "order_number"),
            ("name", "order_number"),
            ("email", "customer_email"),
            ("total", "total_amount"),
            ("financial status", "status"),
        ],
    }
}

/// 解析单个表头的归一化名称（去空白 + 小写，命中别名则替换）
pub fn normalize_header(kind: EntityKind, header: &str) -> String {
    let lowered = header.trim().to_lowercase();
    header_aliases(kind)
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, target)| target.to_string())
        .unwrap_or(lowered)
}

/// 按实体别名表重命名表头与行键
///
/// 归一化后重名的列以先出现者为准
pub fn normalize_headers(parsed: ParsedData, kind: EntityKind) -> ParsedData {
    let renames: Vec<(String, String)> = parsed
        .headers
        .iter()
        .map(|h| (h.clone(), normalize_header(kind, h)))
        .collect();

    let mut headers = Vec::with_capacity(renames.len());
    let mut kept: HashMap<String, String> = HashMap::new();
    for (original, normalized) in &renames {
        if kept.contains_key(normalized) {
            debug!(header = %original, target = %normalized, "归一化后列名重复，忽略");
            continue;
        }
        if original != normalized {
            debug!(header = %original, target = %normalized, "表头归一化");
        }
        kept.insert(normalized.clone(), original.clone());
        headers.push(normalized.clone());
    }

    let rows = parsed
        .rows
        .into_iter()
        .map(|mut row| {
            kept.iter()
                .filter_map(|(normalized, original)| {
                    row.remove(original).map(|v| (normalized.clone(), v))
                })
                .collect()
        })
        .collect();

    ParsedData::new(headers, rows)
}
