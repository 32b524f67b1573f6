// ==========================================
// 电商运营后台 - 候选实体记录
// ==========================================
// 职责: 进入持久化边界的字段集合（按实体类别打标签）
// 红线: 只能由字段目录清洗产生，字段必在白名单内
// ==========================================

use crate::domain::types::EntityKind;
use crate::domain::value::CellValue;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    kind: EntityKind,
    row_number: usize,
    fields: BTreeMap<String, CellValue>,
}

impl CandidateRecord {
    pub(crate) fn new(
        kind: EntityKind,
        row_number: usize,
        fields: BTreeMap<String, CellValue>,
    ) -> Self {
        Self {
            kind,
            row_number,
            fields,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// 源文件中的 1-based 数据行号
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn fields(&self) -> &BTreeMap<String, CellValue> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.fields.get(field)
    }

    /// 自然键（缺失或空白 → None，视为始终新增）
    pub fn natural_key(&self) -> Option<String> {
        self.fields
            .get(self.kind.natural_key_field())
            .filter(|v| !v.is_blank())
            .map(|v| v.to_string().trim().to_string())
    }

    pub fn to_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), JsonValue::from(v.clone())))
            .collect();
        JsonValue::Object(map)
    }
}
