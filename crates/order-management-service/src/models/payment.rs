//! 支付记录实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::enums::{PaymentMethod, PaymentStatus};

/// 支付记录
///
/// 与订单一一对应，记录凭证引用与审核结果
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// 下单时的应付金额
    pub amount_cents: i64,
    /// 转账凭证引用（文件存储由外部负责）
    #[sqlx(default)]
    pub receipt_ref: Option<String>,
    /// 转账附加信息（银行、账户、申报金额），内容不做解释
    #[sqlx(default)]
    pub transfer_metadata: Option<Value>,
    #[sqlx(default)]
    pub rejection_reason: Option<String>,
    #[sqlx(default)]
    pub reviewer_id: Option<String>,
    #[sqlx(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 转账附加信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_amount: Option<String>,
}

impl TransferMetadata {
    pub fn is_empty(&self) -> bool {
        self.bank.is_none() && self.account.is_none() && self.declared_amount.is_none()
    }
}
