// ==========================================
// 电商运营后台 - 操作日志数据仓储
// ==========================================
// 对齐: activity_logs 表
// 红线: 每次导入调用写入一条审计事件
// ==========================================

use crate::db::{configure_sqlite_connection, init_import_schema};
use crate::domain::action_log::{ActivityEvent, ImportAuditMetadata};
use crate::domain::types::EntityKind;
use crate::repository::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ActivityLogger Trait
// ==========================================
// 用途: 审计/操作日志协作方
// 实现者: SqliteActivityLog
#[async_trait]
pub trait ActivityLogger: Send + Sync {
    /// 写入一条审计事件
    async fn record(&self, event: ActivityEvent) -> StoreResult<()>;
}

// ==========================================
// SqliteActivityLog - 操作日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct SqliteActivityLog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteActivityLog {
    /// 创建新的操作日志仓储（幂等建表）
    pub fn new(conn: Arc<Mutex<Connection>>) -> StoreResult<Self> {
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

    /// 查询某操作人的审计事件（按时间倒序）
    pub fn find_by_actor(&self, actor_id: &str) -> StoreResult<Vec<ActivityEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, actor_id, action, entity_kind, metadata_json, created_at
            FROM activity_logs
            WHERE actor_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )?;

        let rows = stmt.query_map(params![actor_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (event_id, actor_id, action, kind, metadata_json, created_at) = row?;
            let entity_kind: EntityKind =
                kind.parse().map_err(StoreError::SerializationError)?;
            let metadata: ImportAuditMetadata = serde_json::from_str(&metadata_json)?;
            let created_at = NaiveDateTime::parse_from_str(&created_at, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| StoreError::SerializationError(e.to_string()))?;

            events.push(ActivityEvent {
                event_id,
                actor_id,
                action,
                entity_kind,
                metadata,
                created_at,
            });
        }

        Ok(events)
    }
}

#[async_trait]
impl ActivityLogger for SqliteActivityLog {
    async fn record(&self, event: ActivityEvent) -> StoreResult<()> {
        let metadata_json = serde_json::to_string(&event.metadata)?;
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO activity_logs (
                id, actor_id, action, entity_kind, metadata_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                event.event_id,
                event.actor_id,
                event.action,
                event.entity_kind.as_str(),
                metadata_json,
                event.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(())
    }
}
