// ==========================================
// 电商运营后台 - 实体存储 Repository 实现
// ==========================================
// 职责: 实现 EntityStore（使用 rusqlite）
// 存储: products / customers / orders，字段以 data_json 保存
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{configure_sqlite_connection, init_import_schema, open_sqlite_connection};
use crate::domain::record::CandidateRecord;
use crate::domain::types::EntityKind;
use crate::repository::entity_store::EntityStore;
use crate::repository::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// 单条 IN 查询的最大参数数（低于 SQLite 默认变量上限）
const LOOKUP_CHUNK_SIZE: usize = 500;

// ==========================================
// SqliteEntityStore
// ==========================================
pub struct SqliteEntityStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEntityStore {
    /// 创建新的存储实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> StoreResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| StoreError::DatabaseConnectionError(e.to_string()))?;
        init_import_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（会再次应用统一 PRAGMA 与建表，幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> StoreResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| StoreError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_import_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::LockError(e.to_string()))
    }

    /// 统计指定类别记录数
    pub fn count(&self, kind: EntityKind) -> StoreResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table_name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 按自然键读取记录字段
    pub fn get_by_natural_key(
        &self,
        kind: EntityKind,
        natural_key: &str,
    ) -> StoreResult<Option<JsonValue>> {
        let conn = self.get_conn()?;
        let raw: Option<String> = conn
            .query_row(
                &format!(
                    "SELECT data_json FROM {} WHERE natural_key = ?1",
                    kind.table_name()
                ),
                params![natural_key],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|s| serde_json::from_str(&s).map_err(StoreError::from))
            .transpose()
    }

    /// 在事务中插入单条记录
    fn insert_tx(tx: &Transaction, record: &CandidateRecord) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();

        tx.execute(
            &format!(
                "INSERT INTO {} (id, natural_key, data_json, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                record.kind().table_name()
            ),
            params![
                id,
                record.natural_key(),
                record.to_json().to_string(),
                now,
                now,
            ],
        )?;

        Ok(id)
    }

    /// 在事务中合并更新单条记录（缺失字段保留原值）
    fn merge_tx(
        tx: &Transaction,
        record: &CandidateRecord,
        natural_key: &str,
    ) -> StoreResult<Option<String>> {
        let table = record.kind().table_name();
        let existing: Option<(String, String)> = tx
            .query_row(
                &format!("SELECT id, data_json FROM {} WHERE natural_key = ?1", table),
                params![natural_key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((id, data_json)) = existing else {
            return Ok(None);
        };

        let mut merged: Map<String, JsonValue> = match serde_json::from_str(&data_json)? {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        if let JsonValue::Object(incoming) = record.to_json() {
            merged.extend(incoming);
        }

        let now = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();
        tx.execute(
            &format!(
                "UPDATE {} SET data_json = ?1, updated_at = ?2 WHERE id = ?3",
                table
            ),
            params![JsonValue::Object(merged).to_string(), now, id],
        )?;

        Ok(Some(id))
    }
}

#[async_trait]
impl EntityStore for SqliteEntityStore {
    async fn find_existing(
        &self,
        kind: EntityKind,
        natural_keys: &[String],
    ) -> StoreResult<HashMap<String, String>> {
        let conn = self.get_conn()?;
        let mut found = HashMap::new();

        for chunk in natural_keys.chunks(LOOKUP_CHUNK_SIZE) {
            let placeholders = (1..=chunk.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT natural_key, id FROM {} WHERE natural_key IN ({})",
                kind.table_name(),
                placeholders
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (key, id) = row?;
                found.insert(key, id);
            }
        }

        Ok(found)
    }

    async fn insert(
        &self,
        kind: EntityKind,
        batch: &[CandidateRecord],
    ) -> StoreResult<Vec<String>> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::DatabaseTransactionError(e.to_string()))?;

        let mut ids = Vec::with_capacity(batch.len());
        for record in batch {
            if record.kind() != kind {
                return Err(StoreError::InternalError(format!(
                    "记录类别 {} 与目标类别 {} 不一致",
                    record.kind(),
                    kind
                )));
            }
            // 任一失败时 tx 被丢弃，整批回滚
            ids.push(Self::insert_tx(&tx, record)?);
        }

        tx.commit()
            .map_err(|e| StoreError::DatabaseTransactionError(e.to_string()))?;
        Ok(ids)
    }

    async fn upsert(
        &self,
        kind: EntityKind,
        batch: &[CandidateRecord],
        conflict_key: &str,
    ) -> StoreResult<Vec<String>> {
        if conflict_key != kind.natural_key_field() {
            return Err(StoreError::InternalError(format!(
                "不支持的冲突键 {}（{} 的自然键为 {}）",
                conflict_key,
                kind,
                kind.natural_key_field()
            )));
        }

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::DatabaseTransactionError(e.to_string()))?;

        let mut ids = Vec::with_capacity(batch.len());
        for record in batch {
            let merged = match record.natural_key() {
                Some(key) => Self::merge_tx(&tx, record, &key)?,
                None => None,
            };
            let id = match merged {
                Some(id) => id,
                None => Self::insert_tx(&tx, record)?,
            };
            ids.push(id);
        }

        tx.commit()
            .map_err(|e| StoreError::DatabaseTransactionError(e.to_string()))?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::CellValue;
    use std::collections::BTreeMap;

    fn setup_store() -> SqliteEntityStore {
        let conn = Connection::open_in_memory().unwrap();
        SqliteEntityStore::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn product(row: usize, sku: Option<&str>, name: &str, price: f64) -> CandidateRecord {
        let mut fields = BTreeMap::new();
        if let Some(sku) = sku {
            fields.insert("sku".to_string(), CellValue::text(sku));
        }
        fields.insert("name".to_string(), CellValue::text(name));
        fields.insert("price".to_string(), CellValue::Number(price));
        CandidateRecord::new(EntityKind::Product, row, fields)
    }

    #[tokio::test]
    async fn test_insert_and_find_existing() {
        let store = setup_store();
        let ids = store
            .insert(
                EntityKind::Product,
                &[product(1, Some("A1"), "Widget", 9.99), product(2, None, "Loose", 1.0)],
            )
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);

        let found = store
            .find_existing(EntityKind::Product, &["A1".to_string(), "ZZ".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found.get("A1"), Some(&ids[0]));
        assert_eq!(store.count(EntityKind::Product).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_unique_violation_rolls_back_batch() {
        let store = setup_store();
        store
            .insert(EntityKind::Product, &[product(1, Some("A1"), "Widget", 9.99)])
            .await
            .unwrap();

        let err = store
            .insert(
                EntityKind::Product,
                &[product(1, Some("B2"), "Other", 1.0), product(2, Some("A1"), "Dup", 2.0)],
            )
            .await
            .unwrap_err();

        assert!(err.is_unique_violation());
        // B2 随整批回滚
        assert_eq!(store.count(EntityKind::Product).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_merges_provided_fields_only() {
        let store = setup_store();
        let mut fields = BTreeMap::new();
        fields.insert("sku".to_string(), CellValue::text("A1"));
        fields.insert("name".to_string(), CellValue::text("Widget"));
        fields.insert("vendor".to_string(), CellValue::text("Acme"));
        store
            .insert(
                EntityKind::Product,
                &[CandidateRecord::new(EntityKind::Product, 1, fields)],
            )
            .await
            .unwrap();

        let mut update = BTreeMap::new();
        update.insert("sku".to_string(), CellValue::text("A1"));
        update.insert("name".to_string(), CellValue::text("Widget v2"));
        let ids = store
            .upsert(
                EntityKind::Product,
                &[CandidateRecord::new(EntityKind::Product, 1, update)],
                "sku",
            )
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);

        let stored = store
            .get_by_natural_key(EntityKind::Product, "A1")
            .unwrap()
            .unwrap();
        assert_eq!(stored["name"], "Widget v2");
        assert_eq!(stored["vendor"], "Acme");
        assert_eq!(store.count(EntityKind::Product).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_inserts_unknown_key() {
        let store = setup_store();
        store
            .upsert(EntityKind::Product, &[product(1, Some("N1"), "New", 3.0)], "sku")
            .await
            .unwrap();

        assert_eq!(store.count(EntityKind::Product).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_rejects_foreign_conflict_key() {
        let store = setup_store();
        let err = store
            .upsert(EntityKind::Product, &[product(1, Some("N1"), "New", 3.0)], "email")
            .await
            .unwrap_err();

        assert!(!err.is_unique_violation());
    }
}
