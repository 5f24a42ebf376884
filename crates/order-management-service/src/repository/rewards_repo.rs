//! 商家积分配置仓储

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::traits::RewardsRepositoryTrait;
use crate::error::Result;
use crate::models::{RewardTier, RewardsConfig};

/// 商家积分配置仓储
pub struct RewardsRepository {
    pool: PgPool,
}

impl RewardsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 获取商家积分配置
    pub async fn get_config(&self, seller_id: &str) -> Result<Option<RewardsConfig>> {
        let config = sqlx::query_as::<_, RewardsConfig>(
            r#"
            SELECT seller_id, is_active, points_per_currency_unit, min_purchase_cents,
                   max_redemption_percent, point_value_cents, created_at, updated_at
            FROM seller_rewards_config
            WHERE seller_id = $1
            "#,
        )
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(config)
    }

    /// 在事务中获取商家积分配置
    pub async fn get_config_in_tx(
        tx: &mut PgConnection,
        seller_id: &str,
    ) -> Result<Option<RewardsConfig>> {
        let config = sqlx::query_as::<_, RewardsConfig>(
            r#"
            SELECT seller_id, is_active, points_per_currency_unit, min_purchase_cents,
                   max_redemption_percent, point_value_cents, created_at, updated_at
            FROM seller_rewards_config
            WHERE seller_id = $1
            "#,
        )
        .bind(seller_id)
        .fetch_optional(tx)
        .await?;

        Ok(config)
    }

    /// 在事务中列出商家全部积分等级（含未启用，由调用方过滤）
    pub async fn list_tiers_in_tx(tx: &mut PgConnection, seller_id: &str) -> Result<Vec<RewardTier>> {
        let tiers = sqlx::query_as::<_, RewardTier>(
            r#"
            SELECT id, seller_id, name, min_purchase_cents, multiplier, is_active, created_at
            FROM seller_reward_tiers
            WHERE seller_id = $1
            ORDER BY min_purchase_cents ASC
            "#,
        )
        .bind(seller_id)
        .fetch_all(tx)
        .await?;

        Ok(tiers)
    }
}

#[async_trait]
impl RewardsRepositoryTrait for RewardsRepository {
    async fn get_config(&self, seller_id: &str) -> Result<Option<RewardsConfig>> {
        RewardsRepository::get_config(self, seller_id).await
    }
}
