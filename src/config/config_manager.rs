// ==========================================
// 电商运营后台 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{
    ImportConfigReader, DEFAULT_BATCH_PACING_MS, DEFAULT_MAX_BATCH_SIZE, DEFAULT_PREVIEW_LIMIT,
};
use crate::db::{configure_sqlite_connection, init_import_schema, open_sqlite_connection};
use crate::repository::error::{StoreError, StoreResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
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

    /// 从已有连接创建（对传入连接再次应用统一 PRAGMA 与建表，幂等）
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

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 全部 global 配置快照（按键排序）
    pub fn get_config_snapshot(&self) -> StoreResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 读取并解析配置值；缺失或格式错误时使用默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> StoreResult<T>
    where
        T: FromStr + Copy,
    {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_batch_pacing_ms(&self) -> StoreResult<u64> {
        self.get_parsed_or_default(config_keys::IMPORT_BATCH_PACING_MS, DEFAULT_BATCH_PACING_MS)
    }

    async fn get_preview_limit(&self) -> StoreResult<usize> {
        self.get_parsed_or_default(config_keys::IMPORT_PREVIEW_LIMIT, DEFAULT_PREVIEW_LIMIT)
    }

    async fn get_max_batch_size(&self) -> StoreResult<usize> {
        let value =
            self.get_parsed_or_default(config_keys::IMPORT_MAX_BATCH_SIZE, DEFAULT_MAX_BATCH_SIZE)?;
        if value == 0 {
            warn!(config_key = config_keys::IMPORT_MAX_BATCH_SIZE, "上限不能为 0，使用默认值");
            return Ok(DEFAULT_MAX_BATCH_SIZE);
        }
        Ok(value)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 批量导入
    pub const IMPORT_BATCH_PACING_MS: &str = "import_batch_pacing_ms";
    pub const IMPORT_PREVIEW_LIMIT: &str = "import_preview_limit";
    pub const IMPORT_MAX_BATCH_SIZE: &str = "import_max_batch_size";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::import_config_trait::ImportSettings;
    use std::time::Duration;

    fn setup() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let manager = setup();
        let settings = ImportSettings::load(&manager).await.unwrap();
        assert_eq!(settings, ImportSettings::default());
        assert_eq!(settings.batch_pacing, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_overrides_and_bad_values() {
        let manager = setup();
        manager
            .set_global_config_value(config_keys::IMPORT_BATCH_PACING_MS, "0")
            .unwrap();
        manager
            .set_global_config_value(config_keys::IMPORT_PREVIEW_LIMIT, "25")
            .unwrap();
        manager
            .set_global_config_value(config_keys::IMPORT_MAX_BATCH_SIZE, "lots")
            .unwrap();

        let settings = ImportSettings::load(&manager).await.unwrap();
        assert_eq!(settings.batch_pacing, Duration::ZERO);
        assert_eq!(settings.preview_limit, 25);
        assert_eq!(settings.max_batch_size, 1000);
    }

    #[test]
    fn test_set_overwrites_and_snapshot() {
        let manager = setup();
        manager.set_global_config_value("a", "1").unwrap();
        manager.set_global_config_value("a", "2").unwrap();

        let snapshot = manager.get_config_snapshot().unwrap();
        assert_eq!(snapshot.get("a").map(String::as_str), Some("2"));
        assert_eq!(snapshot.len(), 1);
    }
}
