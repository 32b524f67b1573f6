// ==========================================
// 电商运营后台 - 落库前清洗器实现
// ==========================================
// 职责: 字段白名单 + 类型收敛（string / number / integer）
// 红线: 白名单之外的列一律丢弃，防止任意列注入存储
// ==========================================

use crate::domain::record::CandidateRecord;
use crate::domain::types::EntityKind;
use crate::domain::value::{CellValue, RawRow};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Integer,
}

/// 实体字段目录（允许落库的目标字段及其类型）
pub fn field_catalog(kind: EntityKind) -> &'static [(&'static str, FieldType)] {
    use FieldType::*;
    match kind {
        EntityKind::Product => &[
            ("sku", String),
            ("name", String),
            ("description", String),
            ("price", Number),
            ("compare_at_price", Number),
            ("cost_price", Number),
            ("stock_quantity", Integer),
            ("weight", Number),
            ("category", String),
            ("vendor", String),
            ("tags", String),
            ("barcode", String),
            ("status", String),
            ("image_url", String),
            ("image_alt", String),
            ("seo_title", String),
            ("seo_description", String),
        ],
        EntityKind::Customer => &[
            ("email", String),
            ("first_name", String),
            ("last_name", String),
            ("phone", String),
            ("company", String),
            ("address", String),
            ("city", String),
            ("country", String),
            ("postal_code", String),
            ("tags", String),
            ("notes", String),
        ],
        EntityKind::Order => &[
            ("order_number", String),
            ("customer_email", String),
            ("status", String),
            ("payment_status", String),
            ("currency", String),
            ("subtotal", Number),
            ("tax_amount", Number),
            ("shipping_amount", Number),
            ("total_amount", Number),
            ("items_count", Integer),
            ("notes", String),
        ],
    }
}

pub fn field_type(kind: EntityKind, field: &str) -> Option<FieldType> {
    field_catalog(kind)
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, ty)| *ty)
}

pub struct DataCleaner;

impl DataCleaner {
    /// 已校验行 → 候选记录
    ///
    /// # 规则
    /// - 未知字段丢弃
    /// - 空值不写入（upsert 时保留已存在值）
    /// - 字符串去除首尾空白；数值 / 整数按宽松规则解析，无法解析则丢弃该字段
    pub fn clean(&self, kind: EntityKind, row_number: usize, row: RawRow) -> CandidateRecord {
        let mut fields = BTreeMap::new();

        for (name, value) in row {
            let Some(ty) = field_type(kind, &name) else {
                debug!(row_number, field = %name, "字段不在白名单内，已丢弃");
                continue;
            };
            if value.is_blank() {
                continue;
            }

            match coerce(ty, &value) {
                Some(coerced) => {
                    fields.insert(name, coerced);
                }
                None => {
                    debug!(row_number, field = %name, %value, "字段类型收敛失败，已丢弃");
                }
            }
        }

        CandidateRecord::new(kind, row_number, fields)
    }
}

fn coerce(ty: FieldType, value: &CellValue) -> Option<CellValue> {
    match ty {
        FieldType::String => Some(CellValue::Text(value.to_string().trim().to_string())),
        FieldType::Number => value.to_decimal().map(CellValue::Number),
        FieldType::Integer => value.to_integer().map(CellValue::Integer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, CellValue)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_clean_drops_unknown_fields() {
        let record = DataCleaner.clean(
            EntityKind::Product,
            4,
            row(&[
                ("sku", CellValue::text(" A100 ")),
                ("admin_flag", CellValue::Bool(true)),
            ]),
        );

        assert_eq!(record.row_number(), 4);
        assert_eq!(record.fields().len(), 1);
        assert_eq!(record.get("sku"), Some(&CellValue::text("A100")));
    }

    #[test]
    fn test_clean_coerces_types() {
        let record = DataCleaner.clean(
            EntityKind::Product,
            1,
            row(&[
                ("price", CellValue::text("9,99 €")),
                ("stock_quantity", CellValue::text("12.0")),
                ("barcode", CellValue::Integer(4006381333931)),
            ]),
        );

        assert_eq!(record.get("price"), Some(&CellValue::Number(9.99)));
        assert_eq!(record.get("stock_quantity"), Some(&CellValue::Integer(12)));
        assert_eq!(record.get("barcode"), Some(&CellValue::text("4006381333931")));
    }

    #[test]
    fn test_clean_skips_blank_values() {
        let record = DataCleaner.clean(
            EntityKind::Customer,
            1,
            row(&[
                ("email", CellValue::text("ann@example.com")),
                ("phone", CellValue::text("  ")),
                ("company", CellValue::Null),
            ]),
        );

        assert_eq!(record.fields().len(), 1);
        assert_eq!(record.natural_key(), Some("ann@example.com".to_string()));
    }

    #[test]
    fn test_field_catalog_contains_natural_keys() {
        for kind in EntityKind::all() {
            assert_eq!(
                field_type(kind, kind.natural_key_field()),
                Some(FieldType::String)
            );
        }
    }
}
