//! `/api/affiliate` handlers.

use axum::extract::State;
use serde_json::{json, Value};

use super::{data, done, message, page, ApiJson, ApiQuery, ApiResult, AppState};
use crate::services::affiliate::{AffiliateCommand, AffiliateParams, AffiliateUpdate};
use crate::services::parse_action;
use crate::StoreError;

fn require_id(id: Option<&str>) -> Result<&str, StoreError> {
    id.filter(|id| !id.is_empty()).ok_or_else(|| StoreError::Validation("Affiliate ID is required".into()))
}

pub async fn query(State(s): State<AppState>, ApiQuery(p): ApiQuery<AffiliateParams>) -> ApiResult {
    let svc = &s.affiliate;
    let affiliate_id = require_id(p.affiliate_id.as_deref())?;
    svc.affiliate(affiliate_id).await?;
    Ok(match p.action.as_deref().unwrap_or("dashboard") {
        "dashboard" => data(svc.dashboard(affiliate_id).await?),
        "commissions" => page("commissions", svc.commissions(affiliate_id, &p).await?),
        "payouts" => data(json!({ "payouts": svc.payouts(affiliate_id).await? })),
        "promotional-content" => data(json!({ "content": svc.promotional_content().await? })),
        "analytics" => data(svc.analytics(affiliate_id).await?),
        _ => return Err(StoreError::InvalidAction.into()),
    })
}

pub async fn command(State(s): State<AppState>, ApiJson(body): ApiJson<Value>) -> ApiResult {
    let svc = &s.affiliate;
    Ok(match parse_action(body, AffiliateCommand::ACTIONS)? {
        AffiliateCommand::Register { personal_info, social_media, kind, user_id } => {
            let registration = svc.register(personal_info, social_media, kind, user_id).await?;
            done(
                "Application submitted successfully! We will review and get back to you within 2-3 business days.",
                registration,
            )
        }
        AffiliateCommand::RequestPayout { affiliate_id, amount, payment_method } => {
            let affiliate_id = require_id(affiliate_id.as_deref())?;
            done("Payout request submitted successfully!", svc.request_payout(affiliate_id, amount, payment_method).await?)
        }
        AffiliateCommand::TrackClick { affiliate_id, affiliate_code, ip_address, user_agent, referrer_url, landing_page } => {
            svc.track_click(affiliate_id, affiliate_code, ip_address, user_agent, referrer_url, landing_page).await?;
            message("Click tracked successfully")
        }
    })
}

pub async fn update(State(s): State<AppState>, ApiJson(body): ApiJson<Value>) -> ApiResult {
    let svc = &s.affiliate;
    let command: AffiliateUpdate = parse_action(body, AffiliateUpdate::ACTIONS)?;
    let affiliate_id = require_id(command.affiliate_id())?.to_string();
    Ok(match command {
        AffiliateUpdate::UpdateProfile { personal_info, social_media, .. } => {
            done("Profile updated successfully", svc.update_profile(&affiliate_id, personal_info, social_media).await?)
        }
        AffiliateUpdate::UpdatePaymentDetails { bank_details, .. } => {
            svc.update_payment_details(&affiliate_id, bank_details).await?;
            message("Payment details updated successfully")
        }
    })
}
