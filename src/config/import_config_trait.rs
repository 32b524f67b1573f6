// ==========================================
// 电商运营后台 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的运行参数读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::StoreResult;
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_BATCH_PACING_MS: u64 = 100;
pub const DEFAULT_PREVIEW_LIMIT: usize = 10;
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 与单次调用无关的运行参数
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 批次间节流间隔（毫秒）
    ///
    /// # 默认值
    /// - 100
    async fn get_batch_pacing_ms(&self) -> StoreResult<u64>;

    /// 试运行预览行数上限
    ///
    /// # 默认值
    /// - 10
    async fn get_preview_limit(&self) -> StoreResult<usize>;

    /// 单批次最大行数（超出视为配置错误）
    ///
    /// # 默认值
    /// - 1000
    async fn get_max_batch_size(&self) -> StoreResult<usize>;
}

// ==========================================
// ImportSettings - 管道运行参数
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSettings {
    pub batch_pacing: Duration,
    pub preview_limit: usize,
    pub max_batch_size: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            batch_pacing: Duration::from_millis(DEFAULT_BATCH_PACING_MS),
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl ImportSettings {
    /// 从配置读取器加载
    pub async fn load(reader: &dyn ImportConfigReader) -> StoreResult<Self> {
        Ok(Self {
            batch_pacing: Duration::from_millis(reader.get_batch_pacing_ms().await?),
            preview_limit: reader.get_preview_limit().await?,
            max_batch_size: reader.get_max_batch_size().await?,
        })
    }

    /// 无节流（测试 / 本地批处理）
    pub fn without_pacing(mut self) -> Self {
        self.batch_pacing = Duration::ZERO;
        self
    }
}
