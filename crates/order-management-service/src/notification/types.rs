//! 通知类型定义
//!
//! 核心只产出通知记录，实际推送（App Push、短信、邮件）由外部负责

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum NotificationType {
    /// 下单成功（买家）
    OrderPlaced,
    /// 新订单（商家）
    NewOrder,
    /// 买家已上传转账凭证（商家）
    PaymentReceiptUploaded,
    /// 收款已确认
    PaymentConfirmed,
    /// 凭证被拒绝（买家）
    PaymentRejected,
    /// 商家已送达（买家）
    OrderDelivered,
    /// 买家已确认收货（商家）
    OrderReceived,
    /// 订单已完成
    OrderCompleted,
    /// 获得积分（买家）
    PointsEarned,
    /// 积分已抵扣（买家）
    PointsRedeemed,
    /// 订单超时取消（买家）
    OrderExpired,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderPlaced => "order_placed",
            Self::NewOrder => "new_order",
            Self::PaymentReceiptUploaded => "payment_receipt_uploaded",
            Self::PaymentConfirmed => "payment_confirmed",
            Self::PaymentRejected => "payment_rejected",
            Self::OrderDelivered => "order_delivered",
            Self::OrderReceived => "order_received",
            Self::OrderCompleted => "order_completed",
            Self::PointsEarned => "points_earned",
            Self::PointsRedeemed => "points_redeemed",
            Self::OrderExpired => "order_expired",
        }
    }
}

/// 通知记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub user_id: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub order_id: Option<i64>,
    /// 业务附加数据
    pub data: Value,
}

impl NotificationRecord {
    pub fn new(
        user_id: impl Into<String>,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        order_id: Option<i64>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            notification_type,
            title: title.into(),
            message: message.into(),
            order_id,
            data: json!({}),
        }
    }

    /// 附加业务数据
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// 已持久化的通知
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoredNotification {
    pub id: i64,
    pub user_id: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[sqlx(default)]
    pub order_id: Option<i64>,
    pub data: Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// 通知构建器
///
/// 为每类业务事件提供预设的标题与正文
pub struct NotificationBuilder;

impl NotificationBuilder {
    /// 下单成功（发给买家）
    pub fn order_placed(buyer_id: &str, order_id: i64, order_no: &str, total_cents: i64) -> NotificationRecord {
        NotificationRecord::new(
            buyer_id,
            NotificationType::OrderPlaced,
            "下单成功",
            format!("订单 {} 已创建，请在付款期限内完成支付", order_no),
            Some(order_id),
        )
        .with_data(json!({ "orderNo": order_no, "totalCents": total_cents }))
    }

    /// 新订单（发给商家）
    pub fn new_order(seller_id: &str, order_id: i64, order_no: &str, total_cents: i64) -> NotificationRecord {
        NotificationRecord::new(
            seller_id,
            NotificationType::NewOrder,
            "新订单",
            format!("您有一笔新订单 {}", order_no),
            Some(order_id),
        )
        .with_data(json!({ "orderNo": order_no, "totalCents": total_cents }))
    }

    /// 买家已上传转账凭证（发给商家）
    pub fn receipt_uploaded(seller_id: &str, order_id: i64, order_no: &str, payment_id: i64) -> NotificationRecord {
        NotificationRecord::new(
            seller_id,
            NotificationType::PaymentReceiptUploaded,
            "待审核转账凭证",
            format!("订单 {} 的买家已上传转账凭证，请审核", order_no),
            Some(order_id),
        )
        .with_data(json!({ "orderNo": order_no, "paymentId": payment_id }))
    }

    /// 收款已确认（买家、商家各一条）
    pub fn payment_confirmed(user_id: &str, order_id: i64, order_no: &str) -> NotificationRecord {
        NotificationRecord::new(
            user_id,
            NotificationType::PaymentConfirmed,
            "付款已确认",
            format!("订单 {} 的付款已确认", order_no),
            Some(order_id),
        )
        .with_data(json!({ "orderNo": order_no }))
    }

    /// 凭证被拒绝（发给买家）
    pub fn payment_rejected(buyer_id: &str, order_id: i64, order_no: &str, reason: Option<&str>) -> NotificationRecord {
        let message = match reason {
            Some(reason) => format!("订单 {} 的转账凭证未通过审核：{}", order_no, reason),
            None => format!("订单 {} 的转账凭证未通过审核，请重新上传", order_no),
        };
        NotificationRecord::new(
            buyer_id,
            NotificationType::PaymentRejected,
            "转账凭证被拒绝",
            message,
            Some(order_id),
        )
        .with_data(json!({ "orderNo": order_no, "reason": reason }))
    }

    /// 商家已送达（发给买家）
    pub fn order_delivered(buyer_id: &str, order_id: i64, order_no: &str) -> NotificationRecord {
        NotificationRecord::new(
            buyer_id,
            NotificationType::OrderDelivered,
            "订单已送达",
            format!("订单 {} 已送达，请确认收货", order_no),
            Some(order_id),
        )
    }

    /// 买家已确认收货（发给商家）
    pub fn order_received(seller_id: &str, order_id: i64, order_no: &str) -> NotificationRecord {
        NotificationRecord::new(
            seller_id,
            NotificationType::OrderReceived,
            "买家已确认收货",
            format!("订单 {} 的买家已确认收货", order_no),
            Some(order_id),
        )
    }

    /// 订单已完成
    pub fn order_completed(user_id: &str, order_id: i64, order_no: &str) -> NotificationRecord {
        NotificationRecord::new(
            user_id,
            NotificationType::OrderCompleted,
            "订单已完成",
            format!("订单 {} 已完成", order_no),
            Some(order_id),
        )
    }

    /// 获得积分（发给买家）
    pub fn points_earned(buyer_id: &str, order_id: i64, points: i64, new_balance: i64) -> NotificationRecord {
        NotificationRecord::new(
            buyer_id,
            NotificationType::PointsEarned,
            "获得积分",
            format!("您获得了 {} 积分，当前余额 {}", points, new_balance),
            Some(order_id),
        )
        .with_data(json!({ "points": points, "balance": new_balance }))
    }

    /// 积分已抵扣（发给买家）
    pub fn points_redeemed(
        buyer_id: &str,
        order_id: i64,
        points: i64,
        discount_cents: i64,
        new_total_cents: i64,
    ) -> NotificationRecord {
        NotificationRecord::new(
            buyer_id,
            NotificationType::PointsRedeemed,
            "积分抵扣成功",
            format!("已使用 {} 积分抵扣 {} 分", points, discount_cents),
            Some(order_id),
        )
        .with_data(json!({
            "points": points,
            "discountCents": discount_cents,
            "newTotalCents": new_total_cents
        }))
    }

    /// 订单超时取消（发给买家）
    pub fn order_expired(buyer_id: &str, order_id: i64, order_no: &str) -> NotificationRecord {
        NotificationRecord::new(
            buyer_id,
            NotificationType::OrderExpired,
            "订单已取消",
            format!("订单 {} 超过付款期限未支付，已自动取消", order_no),
            Some(order_id),
        )
        .with_data(json!({ "orderNo": order_no }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_placed_notification() {
        let record = NotificationBuilder::order_placed("buyer-1", 7, "OD1", 8000);
        assert_eq!(record.user_id, "buyer-1");
        assert_eq!(record.notification_type, NotificationType::OrderPlaced);
        assert_eq!(record.order_id, Some(7));
        assert_eq!(record.data["totalCents"], 8000);
        assert!(record.message.contains("OD1"));
    }

    #[test]
    fn test_payment_rejected_with_reason() {
        let record = NotificationBuilder::payment_rejected("buyer-1", 7, "OD1", Some("金额不符"));
        assert!(record.message.contains("金额不符"));
        assert_eq!(record.data["reason"], "金额不符");

        let record = NotificationBuilder::payment_rejected("buyer-1", 7, "OD1", None);
        assert!(record.message.contains("重新上传"));
        assert!(record.data["reason"].is_null());
    }

    #[test]
    fn test_points_redeemed_data() {
        let record = NotificationBuilder::points_redeemed("buyer-1", 7, 100, 3500, 4500);
        assert_eq!(record.notification_type, NotificationType::PointsRedeemed);
        assert_eq!(record.data["discountCents"], 3500);
        assert_eq!(record.data["newTotalCents"], 4500);
    }

    #[test]
    fn test_notification_type_serialization() {
        assert_eq!(
            serde_json::to_string(&NotificationType::PaymentReceiptUploaded).unwrap(),
            "\"payment_receipt_uploaded\""
        );
        assert_eq!(NotificationType::OrderExpired.as_str(), "order_expired");
    }
}
