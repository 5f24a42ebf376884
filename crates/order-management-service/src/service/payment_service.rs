//! 支付审核服务
//!
//! 支付状态机：`pending → pending_review → {confirmed | rejected}`
//!
//! - 上传凭证：转账订单进入待审核，被拒绝后可重新上传
//! - 审核凭证：仅订单所属商家可操作；通过时同一事务内确认订单并发放积分
//! - 拒绝转账凭证时付款期限至少顺延一个默认支付期限，逾期未重新上传由过期清理取消
//! - 现金支付只能确认，不能拒绝；未确认的现金订单按付款期限过期
//!
//! 锁顺序固定为先订单后支付，与过期清理保持一致。
//! 已审核的支付重复审核返回既有结果，不产生任何副作用

use chrono::{DateTime, Duration, Utc};
use market_shared::config::OrderSettings;
use market_shared::observability::metrics;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::error::{OrderError, Result};
use crate::models::{OrderStatus, PaymentMethod, PaymentStatus};
use crate::notification::{NotificationBuilder, NotificationSender};
use crate::repository::{OrderRepository, PointsRepository};
use crate::service::dto::{
    UploadReceiptRequest, UploadReceiptResponse, ValidateReceiptRequest, ValidateReceiptResponse,
};
use crate::service::loyalty_service::LoyaltyService;

/// 支付审核服务
pub struct PaymentService {
    pool: PgPool,
    order_repo: OrderRepository,
    sender: NotificationSender,
    settings: OrderSettings,
}

impl PaymentService {
    pub fn new(pool: PgPool, sender: NotificationSender, settings: OrderSettings) -> Self {
        Self {
            order_repo: OrderRepository::new(pool.clone()),
            pool,
            sender,
            settings,
        }
    }

    // ==================== 上传凭证 ====================

    /// 上传转账凭证
    #[instrument(skip(self, request), fields(order_id = request.order_id))]
    pub async fn upload_receipt(&self, request: UploadReceiptRequest) -> Result<UploadReceiptResponse> {
        let receipt_ref = request.receipt_ref.trim();
        if receipt_ref.is_empty() {
            return Err(OrderError::InvalidAttachment);
        }

        let metadata = request
            .transfer_metadata
            .as_ref()
            .filter(|m| !m.is_empty())
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| OrderError::Internal(format!("转账信息序列化失败: {}", e)))?;

        let mut tx = self.pool.begin().await?;

        let order = OrderRepository::lock_order_in_tx(&mut tx, request.order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(request.order_id))?;

        if order.status != OrderStatus::Placed {
            return Err(OrderError::not_eligible(
                order.id,
                format!("订单状态为 {}，不能上传凭证", order.status.as_str()),
            ));
        }
        if order.payment_method == PaymentMethod::Cash {
            return Err(OrderError::not_eligible(order.id, "现金支付订单无需上传凭证"));
        }
        if !order.payment_status.accepts_receipt() {
            return Err(OrderError::not_eligible(order.id, "订单已确认付款"));
        }

        let payment = OrderRepository::lock_payment_by_order_in_tx(&mut tx, order.id)
            .await?
            .ok_or_else(|| {
                OrderError::Internal(format!("订单缺少支付记录: order_id={}", order.id))
            })?;

        let rows = OrderRepository::attach_receipt_in_tx(
            &mut tx,
            payment.id,
            payment.status,
            receipt_ref,
            metadata.as_ref(),
        )
        .await?;
        if rows == 0 {
            return Err(OrderError::ConcurrentModification);
        }

        let rows = OrderRepository::update_payment_status_in_tx(
            &mut tx,
            order.id,
            order.payment_status,
            PaymentStatus::PendingReview,
        )
        .await?;
        if rows == 0 {
            return Err(OrderError::ConcurrentModification);
        }

        tx.commit().await?;

        self.sender
            .dispatch(vec![NotificationBuilder::receipt_uploaded(
                &order.seller_id,
                order.id,
                &order.order_no,
                payment.id,
            )])
            .await;

        info!(
            payment_id = payment.id,
            previous_status = payment.status.as_str(),
            "转账凭证已上传，等待商家审核"
        );

        Ok(UploadReceiptResponse {
            payment_id: payment.id,
            status: PaymentStatus::PendingReview,
        })
    }

    // ==================== 审核凭证 ====================

    /// 审核转账凭证（或确认现金收款）
    #[instrument(skip(self, request), fields(payment_id = request.payment_id, approved = request.approved))]
    pub async fn validate_receipt(
        &self,
        request: ValidateReceiptRequest,
    ) -> Result<ValidateReceiptResponse> {
        let payment = self
            .order_repo
            .get_payment(request.payment_id)
            .await?
            .ok_or(OrderError::PaymentNotFound(request.payment_id))?;

        let mut tx = self.pool.begin().await?;

        // 1. 先锁订单再锁支付
        let order = OrderRepository::lock_order_in_tx(&mut tx, payment.order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(payment.order_id))?;

        if order.seller_id != request.reviewer_id {
            return Err(OrderError::Forbidden(format!(
                "审核人 {} 不是订单 {} 的商家",
                request.reviewer_id, order.id
            )));
        }

        let payment = OrderRepository::lock_payment_in_tx(&mut tx, payment.id)
            .await?
            .ok_or(OrderError::PaymentNotFound(payment.id))?;

        // 2. 已审核或订单已离开 placed（例如已被过期取消）时返回既有结果
        if payment.status.is_reviewed() || order.status != OrderStatus::Placed {
            info!(
                payment_status = payment.status.as_str(),
                order_status = order.status.as_str(),
                "支付已处理，返回既有结果"
            );
            let points_awarded = if payment.status == PaymentStatus::Confirmed {
                PointsRepository::earned_for_order_in_tx(&mut tx, &order.buyer_id, order.id)
                    .await?
            } else {
                0
            };
            return Ok(ValidateReceiptResponse::settled(
                &payment,
                &order,
                points_awarded,
            ));
        }

        if !payment.status.is_reviewable(payment.method) {
            return Err(OrderError::not_eligible(
                order.id,
                format!(
                    "支付状态为 {}，{} 支付不能审核",
                    payment.status.as_str(),
                    payment.method.as_str()
                ),
            ));
        }

        if !request.approved && payment.method == PaymentMethod::Cash {
            return Err(OrderError::not_eligible(
                order.id,
                "现金支付不能拒绝，未收款的订单将按付款期限自动取消",
            ));
        }

        let response = if request.approved {
            // 3a. 确认收款，同一事务内发放积分
            let rows =
                OrderRepository::confirm_payment_in_tx(&mut tx, order.id, order.payment_status)
                    .await?;
            if rows == 0 {
                return Err(OrderError::ConcurrentModification);
            }
            let rows = OrderRepository::review_payment_in_tx(
                &mut tx,
                payment.id,
                payment.status,
                PaymentStatus::Confirmed,
                Some(request.reviewer_id.as_str()),
                None,
            )
            .await?;
            if rows == 0 {
                return Err(OrderError::ConcurrentModification);
            }

            let award = LoyaltyService::accrue_points_in_tx(&mut tx, &order).await?;

            tx.commit().await?;

            let mut records = vec![
                NotificationBuilder::payment_confirmed(&order.buyer_id, order.id, &order.order_no),
                NotificationBuilder::payment_confirmed(&order.seller_id, order.id, &order.order_no),
            ];
            if let Some(award) = &award {
                records.push(NotificationBuilder::points_earned(
                    &order.buyer_id,
                    order.id,
                    award.points,
                    award.new_balance,
                ));
                metrics::record_points_accrued(award.points as u64);
            }
            self.sender.dispatch(records).await;
            metrics::record_payment_review("confirmed");

            let points_awarded = award.map(|a| a.points).unwrap_or(0);
            info!(order_id = order.id, points_awarded, "支付已确认");

            ValidateReceiptResponse {
                payment_id: payment.id,
                order_id: order.id,
                payment_status: PaymentStatus::Confirmed,
                order_status: OrderStatus::SellerConfirmed,
                points_awarded,
                already_reviewed: false,
            }
        } else {
            // 3b. 拒绝，订单状态保持 placed，买家可重新上传
            let reason = request
                .rejection_reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty());

            let rows = OrderRepository::update_payment_status_in_tx(
                &mut tx,
                order.id,
                order.payment_status,
                PaymentStatus::Rejected,
            )
            .await?;
            if rows == 0 {
                return Err(OrderError::ConcurrentModification);
            }
            let rows = OrderRepository::review_payment_in_tx(
                &mut tx,
                payment.id,
                payment.status,
                PaymentStatus::Rejected,
                Some(request.reviewer_id.as_str()),
                reason,
            )
            .await?;
            if rows == 0 {
                return Err(OrderError::ConcurrentModification);
            }

            let expires_at = OrderRepository::extend_expiration_in_tx(
                &mut tx,
                order.id,
                reupload_deadline(&self.settings, Utc::now()),
            )
            .await?;

            tx.commit().await?;

            self.sender
                .dispatch(vec![NotificationBuilder::payment_rejected(
                    &order.buyer_id,
                    order.id,
                    &order.order_no,
                    reason,
                )])
                .await;
            metrics::record_payment_review("rejected");

            if reason.is_none() {
                warn!(order_id = order.id, "支付被拒绝且未填写原因");
            }
            info!(order_id = order.id, expires_at = %expires_at, "支付已拒绝，等待买家重新上传");

            ValidateReceiptResponse {
                payment_id: payment.id,
                order_id: order.id,
                payment_status: PaymentStatus::Rejected,
                order_status: order.status,
                points_awarded: 0,
                already_reviewed: false,
            }
        };

        Ok(response)
    }
}

/// 转账凭证被拒绝后重新上传的最晚时间
fn reupload_deadline(settings: &OrderSettings, now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(settings.default_expiration_minutes.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reupload_deadline_uses_default_window() {
        let now = Utc::now();
        let settings = OrderSettings::default();

        assert_eq!(reupload_deadline(&settings, now), now + Duration::minutes(15));
    }

    #[test]
    fn test_reupload_deadline_never_in_past() {
        let now = Utc::now();
        let settings = OrderSettings {
            default_expiration_minutes: 0,
            ..OrderSettings::default()
        };

        assert!(reupload_deadline(&settings, now) > now);
    }
}
