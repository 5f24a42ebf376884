//! HTTP 请求体与查询参数
//!
//! 只做格式校验；业务规则（凭证为空、付款期限上限等）由服务层判断

use serde::Deserialize;
use validator::Validate;

use crate::models::{PaymentMethod, TransferMetadata};
use crate::service::{
    PlaceOrderRequest, RedeemPointsRequest, UploadReceiptRequest, ValidateReceiptRequest,
};

/// 下单请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderBody {
    #[validate(length(min = 1, max = 128, message = "买家ID长度必须在1-128个字符之间"))]
    pub buyer_id: String,
    #[validate(length(min = 1, max = 128, message = "商家ID长度必须在1-128个字符之间"))]
    pub seller_id: String,
    pub payment_method: PaymentMethod,
    #[validate(range(min = 1, message = "付款期限必须大于0"))]
    pub expiration_minutes: Option<i64>,
    #[validate(length(max = 500, message = "收货地址不能超过500个字符"))]
    pub delivery_address: Option<String>,
    #[validate(length(max = 500, message = "配送备注不能超过500个字符"))]
    pub delivery_notes: Option<String>,
}

impl From<PlaceOrderBody> for PlaceOrderRequest {
    fn from(body: PlaceOrderBody) -> Self {
        Self {
            buyer_id: body.buyer_id,
            seller_id: body.seller_id,
            payment_method: body.payment_method,
            expiration_minutes: body.expiration_minutes,
            delivery_address: body.delivery_address,
            delivery_notes: body.delivery_notes,
        }
    }
}

/// 上传转账凭证请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceiptBody {
    #[serde(default)]
    #[validate(length(max = 1024, message = "凭证引用不能超过1024个字符"))]
    pub receipt_ref: String,
    #[serde(default)]
    pub transfer_metadata: Option<TransferMetadata>,
}

impl UploadReceiptBody {
    pub fn into_request(self, order_id: i64) -> UploadReceiptRequest {
        UploadReceiptRequest {
            order_id,
            receipt_ref: self.receipt_ref,
            transfer_metadata: self.transfer_metadata,
        }
    }
}

/// 审核凭证请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidateReceiptBody {
    #[validate(length(min = 1, max = 128, message = "审核人ID长度必须在1-128个字符之间"))]
    pub reviewer_id: String,
    pub approved: bool,
    #[validate(length(max = 500, message = "拒绝原因不能超过500个字符"))]
    pub rejection_reason: Option<String>,
}

impl ValidateReceiptBody {
    pub fn into_request(self, payment_id: i64) -> ValidateReceiptRequest {
        ValidateReceiptRequest {
            payment_id,
            reviewer_id: self.reviewer_id,
            approved: self.approved,
            rejection_reason: self.rejection_reason,
        }
    }
}

/// 商家操作请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SellerActionBody {
    #[validate(length(min = 1, max = 128, message = "商家ID长度必须在1-128个字符之间"))]
    pub seller_id: String,
}

/// 买家操作请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BuyerActionBody {
    #[validate(length(min = 1, max = 128, message = "买家ID长度必须在1-128个字符之间"))]
    pub buyer_id: String,
}

/// 积分抵扣请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RedeemPointsBody {
    #[validate(length(min = 1, max = 128, message = "商家ID长度必须在1-128个字符之间"))]
    pub seller_id: String,
    #[validate(range(min = 1, message = "抵扣积分必须大于0"))]
    pub points_to_use: i64,
}

impl RedeemPointsBody {
    pub fn into_request(self, order_id: i64) -> RedeemPointsRequest {
        RedeemPointsRequest {
            order_id,
            seller_id: self.seller_id,
            points_to_use: self.points_to_use,
        }
    }
}

/// 抵扣资格查询参数
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityQuery {
    #[validate(length(min = 1, max = 128, message = "商家ID长度必须在1-128个字符之间"))]
    pub seller_id: String,
}

/// 积分流水查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}
