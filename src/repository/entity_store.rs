// ==========================================
// 电商运营后台 - 实体存储 Repository Trait
// ==========================================
// 职责: 定义导入管道依赖的持久化协作方接口（不包含实现）
// 红线: Repository 不含业务规则，只做数据读写
// ==========================================

use crate::domain::record::CandidateRecord;
use crate::domain::types::EntityKind;
use crate::repository::error::StoreResult;
use async_trait::async_trait;
use std::collections::HashMap;

// ==========================================
// EntityStore Trait
// ==========================================
// 用途: 目标实体集合（商品/客户/订单）的批量读写
// 实现者: SqliteEntityStore
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// 按自然键批量查找已存在记录
    ///
    /// # 参数
    /// - kind: 实体类别
    /// - natural_keys: 待查找的自然键列表
    ///
    /// # 返回
    /// - Ok(HashMap<自然键, 记录ID>): 仅包含已存在的键
    async fn find_existing(
        &self,
        kind: EntityKind,
        natural_keys: &[String],
    ) -> StoreResult<HashMap<String, String>>;

    /// 批量插入（单批次原子）
    ///
    /// # 返回
    /// - Ok(Vec<String>): 新记录 ID（由存储生成）
    /// - Err(StoreError::UniqueViolation): 唯一约束冲突，整批未写入
    /// - Err(...): 其他存储错误
    async fn insert(&self, kind: EntityKind, batch: &[CandidateRecord])
        -> StoreResult<Vec<String>>;

    /// 批量 upsert（按冲突键合并，导入中缺失的字段保留原值）
    ///
    /// # 参数
    /// - conflict_key: 冲突字段名（等于实体类别的自然键字段）
    ///
    /// # 返回
    /// - Ok(Vec<String>): 受影响记录 ID
    async fn upsert(
        &self,
        kind: EntityKind,
        batch: &[CandidateRecord],
        conflict_key: &str,
    ) -> StoreResult<Vec<String>>;
}
