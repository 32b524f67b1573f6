// ==========================================
// 电商运营后台 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供存储与审计协作方接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod activity_log_repo;
pub mod entity_store;
pub mod entity_store_impl;
pub mod error;

// 重导出核心仓储
pub use activity_log_repo::{ActivityLogger, SqliteActivityLog};
pub use entity_store::EntityStore;
pub use entity_store_impl::SqliteEntityStore;
pub use error::{StoreError, StoreResult};
