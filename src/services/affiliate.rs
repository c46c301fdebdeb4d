//! Affiliate programme: dashboards, commissions, payouts and referral clicks.

use chrono::{Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{paginate, parse_filter, Paginated};
use crate::domain::aggregates::affiliate::{
    BankDetailsPatch, PersonalInfo, PersonalInfoPatch, Performance, SocialMedia,
};
use crate::domain::aggregates::{
    AffiliateProfile, AffiliateStatus, AffiliateType, Commission, CommissionStatus, PaymentMethod, Payout, PayoutStatus,
    PromotionalContent, ReferralClick,
};
use crate::domain::events::{AffiliateEvent, DomainEvent};
use crate::domain::value_objects::Money;
use crate::events::EventBus;
use crate::repository::Repositories;
use crate::{Result, StoreError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateParams {
    pub affiliate_id: Option<String>,
    pub action: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum AffiliateCommand {
    Register {
        personal_info: PersonalInfo,
        #[serde(default)]
        social_media: SocialMedia,
        #[serde(rename = "type", default)]
        kind: AffiliateType,
        user_id: Option<String>,
    },
    RequestPayout {
        affiliate_id: Option<String>,
        amount: Money,
        payment_method: PaymentMethod,
    },
    TrackClick {
        affiliate_id: Option<String>,
        affiliate_code: String,
        #[serde(default)]
        ip_address: String,
        #[serde(default)]
        user_agent: String,
        #[serde(default)]
        referrer_url: String,
        #[serde(default)]
        landing_page: String,
    },
}

impl AffiliateCommand {
    pub const ACTIONS: &'static [&'static str] = &["register", "request-payout", "track-click"];
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum AffiliateUpdate {
    UpdateProfile {
        affiliate_id: Option<String>,
        #[serde(default)]
        personal_info: PersonalInfoPatch,
        social_media: Option<SocialMedia>,
    },
    UpdatePaymentDetails {
        affiliate_id: Option<String>,
        #[serde(default)]
        bank_details: BankDetailsPatch,
    },
}

impl AffiliateUpdate {
    pub const ACTIONS: &'static [&'static str] = &["update-profile", "update-payment-details"];

    pub fn affiliate_id(&self) -> Option<&str> {
        match self {
            AffiliateUpdate::UpdateProfile { affiliate_id, .. } | AffiliateUpdate::UpdatePaymentDetails { affiliate_id, .. } => {
                affiliate_id.as_deref().filter(|id| !id.is_empty())
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Earnings {
    pub total: Money,
    pub pending: Money,
    pub this_month: Money,
    pub last_payout: Option<Payout>,
}

#[derive(Debug, Serialize)]
pub struct ClickDay {
    pub date: String,
    pub clicks: u32,
    pub conversions: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateDashboard {
    pub affiliate: AffiliateProfile,
    pub earnings: Earnings,
    pub recent_commissions: Vec<Commission>,
    pub clicks_data: Vec<ClickDay>,
    pub promotional_content: Vec<PromotionalContent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend<T> {
    pub total: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub this_month: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    pub growth: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProductSales {
    pub name: &'static str,
    pub sales: u32,
    pub commission: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateAnalytics {
    pub clicks: Trend<u64>,
    pub conversions: Trend<u64>,
    pub earnings: Trend<Money>,
    pub top_products: Vec<ProductSales>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub affiliate_code: String,
    pub application_id: String,
}

#[derive(Clone)]
pub struct AffiliateService {
    repos: Repositories,
    events: EventBus,
}

/// Share of the running total attributed to the current month.
fn this_month(total: Money) -> Money { total.scale(Decimal::new(3, 1)) }

impl AffiliateService {
    pub fn new(repos: Repositories, events: EventBus) -> Self {
        Self { repos, events }
    }

    pub async fn affiliate(&self, affiliate_id: &str) -> Result<AffiliateProfile> {
        self.repos.affiliates.get(affiliate_id).await?.ok_or(StoreError::NotFound("Affiliate"))
    }

    async fn commissions_of(&self, affiliate_id: &str) -> Result<Vec<Commission>> {
        let mut all = self.repos.commissions.list().await?;
        all.retain(|c| c.affiliate_id == affiliate_id);
        Ok(all)
    }

    async fn active_content(&self) -> Result<Vec<PromotionalContent>> {
        let mut content = self.repos.promotions.list().await?;
        content.retain(|p| p.is_active);
        Ok(content)
    }

    pub async fn dashboard(&self, affiliate_id: &str) -> Result<AffiliateDashboard> {
        let affiliate = self.affiliate(affiliate_id).await?;
        let commissions = self.commissions_of(affiliate_id).await?;
        let sum = |status: CommissionStatus| commissions.iter().filter(|c| c.status == status).map(|c| c.commission_amount).sum::<Money>();
        let total = sum(CommissionStatus::Approved);
        let pending = sum(CommissionStatus::Pending);
        let last_payout = self.payouts(affiliate_id).await?
            .into_iter()
            .filter(|p| p.status == PayoutStatus::Completed)
            .max_by_key(|p| p.requested_at);

        Ok(AffiliateDashboard {
            affiliate,
            earnings: Earnings { total, pending, this_month: this_month(total), last_payout },
            recent_commissions: commissions.into_iter().take(5).collect(),
            clicks_data: click_history(30),
            promotional_content: self.active_content().await?,
        })
    }

    pub async fn commissions(&self, affiliate_id: &str, params: &AffiliateParams) -> Result<Paginated<Commission>> {
        self.affiliate(affiliate_id).await?;
        let status: Option<CommissionStatus> = parse_filter("status", params.status.as_deref())?;
        let mut commissions = self.commissions_of(affiliate_id).await?;
        commissions.retain(|c| status.map_or(true, |s| c.status == s));
        Ok(paginate(commissions, params.page, params.limit, 10))
    }

    pub async fn payouts(&self, affiliate_id: &str) -> Result<Vec<Payout>> {
        let mut payouts = self.repos.payouts.list().await?;
        payouts.retain(|p| p.affiliate_id == affiliate_id);
        Ok(payouts)
    }

    pub async fn promotional_content(&self) -> Result<Vec<PromotionalContent>> {
        self.active_content().await
    }

    pub async fn analytics(&self, affiliate_id: &str) -> Result<AffiliateAnalytics> {
        let perf = self.affiliate(affiliate_id).await?.performance;
        Ok(AffiliateAnalytics {
            clicks: Trend {
                total: perf.click_count,
                this_month: Some((perf.click_count as f64 * 0.3).floor() as u64),
                rate: None,
                growth: "+12.5%",
            },
            conversions: Trend { total: perf.signups, this_month: None, rate: Some(perf.conversion_rate), growth: "+8.3%" },
            earnings: Trend {
                total: perf.total_commission,
                this_month: Some(this_month(perf.total_commission)),
                rate: None,
                growth: "+15.7%",
            },
            top_products: vec![
                ProductSales { name: "Premium Hoodie", sales: 45, commission: 6750 },
                ProductSales { name: "Designer T-Shirt", sales: 32, commission: 4800 },
                ProductSales { name: "Casual Polo", sales: 28, commission: 4200 },
            ],
        })
    }

    /// New applications start as `pending` with the rate for their type.
    pub async fn register(
        &self,
        personal_info: PersonalInfo,
        social_media: SocialMedia,
        kind: AffiliateType,
        user_id: Option<String>,
    ) -> Result<Registration> {
        personal_info.validate()?;
        let code = AffiliateProfile::code_for(&personal_info.name);
        let id = format!("aff-{}", Uuid::now_v7().simple());
        let profile = AffiliateProfile {
            id: id.clone(),
            user_id: user_id.filter(|u| !u.is_empty()).unwrap_or_else(|| format!("user-{}", Uuid::now_v7().simple())),
            affiliate_code: code.clone(),
            status: AffiliateStatus::Pending,
            kind,
            commission_rate: kind.commission_rate(),
            social_media,
            personal_info,
            performance: Performance::default(),
            created_at: Utc::now(),
            approved_at: None,
        };
        self.repos.affiliates.insert(profile).await?;
        info!(affiliate_id = %id, affiliate_code = %code, "affiliate application received");
        self.publish(AffiliateEvent::Registered { affiliate_id: id.clone(), affiliate_code: code.clone() }).await;
        Ok(Registration { affiliate_code: code, application_id: id })
    }

    /// Approved commissions minus completed payouts.
    pub async fn available_balance(&self, affiliate_id: &str) -> Result<Money> {
        let approved: Money = self.commissions_of(affiliate_id).await?
            .iter()
            .filter(|c| c.status == CommissionStatus::Approved)
            .map(|c| c.commission_amount)
            .sum();
        let paid: Money = self.payouts(affiliate_id).await?
            .iter()
            .filter(|p| p.status == PayoutStatus::Completed)
            .map(|p| p.amount)
            .sum();
        Ok(approved - paid)
    }

    pub async fn request_payout(&self, affiliate_id: &str, amount: Money, payment_method: PaymentMethod) -> Result<Payout> {
        if !amount.is_positive() {
            return Err(StoreError::Validation("payout amount must be positive".into()));
        }
        if amount.has_sub_paise() {
            return Err(StoreError::Validation("payout amount must be in whole paise".into()));
        }
        self.affiliate(affiliate_id).await?;
        let available = self.available_balance(affiliate_id).await?;
        if amount > available {
            return Err(StoreError::InsufficientBalance { available });
        }
        let payout = self.repos.payouts.insert(Payout {
            id: format!("payout-{}", Uuid::now_v7().simple()),
            affiliate_id: affiliate_id.to_string(),
            amount,
            status: PayoutStatus::Pending,
            payment_method,
            transaction_id: None,
            requested_at: Utc::now(),
            processed_at: None,
            failure_reason: None,
        }).await?;
        info!(affiliate_id, %amount, "payout requested");
        self.publish(AffiliateEvent::PayoutRequested { affiliate_id: affiliate_id.to_string(), amount }).await;
        Ok(payout)
    }

    pub async fn track_click(&self, affiliate_id: Option<String>, affiliate_code: String, ip_address: String,
                             user_agent: String, referrer_url: String, landing_page: String) -> Result<ReferralClick> {
        let affiliate_id = affiliate_id.filter(|id| !id.is_empty()).unwrap_or_else(|| "unknown".into());
        let click = self.repos.clicks.insert(ReferralClick {
            id: format!("click-{}", Uuid::now_v7().simple()),
            affiliate_id: affiliate_id.clone(),
            affiliate_code: affiliate_code.clone(),
            ip_address,
            user_agent,
            referrer_url,
            landing_page,
            timestamp: Utc::now(),
            converted: false,
            order_id: None,
        }).await?;
        self.repos.affiliates.update(&affiliate_id, &mut |a| a.performance.click_count += 1).await?;
        info!(affiliate_id = %click.affiliate_id, affiliate_code = %click.affiliate_code, "referral click tracked");
        self.publish(AffiliateEvent::ClickTracked { affiliate_id, affiliate_code }).await;
        Ok(click)
    }

    pub async fn update_profile(&self, affiliate_id: &str, info: PersonalInfoPatch, social: Option<SocialMedia>) -> Result<AffiliateProfile> {
        let mut current = self.affiliate(affiliate_id).await?;
        current.apply_profile_patch(info.clone(), social.clone());
        current.personal_info.validate()?;
        let mut patch = Some((info, social));
        self.repos.affiliates.update(affiliate_id, &mut |a| {
            if let Some((info, social)) = patch.take() {
                a.apply_profile_patch(info, social);
            }
        }).await?.ok_or(StoreError::NotFound("Affiliate"))
    }

    pub async fn update_payment_details(&self, affiliate_id: &str, bank: BankDetailsPatch) -> Result<AffiliateProfile> {
        let mut patch = Some(bank);
        self.repos.affiliates.update(affiliate_id, &mut |a| {
            if let Some(bank) = patch.take() {
                a.apply_bank_patch(bank);
            }
        }).await?.ok_or(StoreError::NotFound("Affiliate"))
    }

    async fn publish(&self, event: AffiliateEvent) {
        self.events.publish(DomainEvent::Affiliate(event)).await;
    }
}

/// Synthetic daily click counts, oldest first.
fn click_history(days: i64) -> Vec<ClickDay> {
    let mut rng = rand::thread_rng();
    let today = Utc::now().date_naive();
    (0..days).rev().map(|i| ClickDay {
        date: (today - Duration::days(i)).format("%Y-%m-%d").to_string(),
        clicks: rng.gen_range(10..60),
        conversions: rng.gen_range(1..6),
    }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> AffiliateService {
        AffiliateService::new(Repositories::seeded().unwrap(), EventBus::default())
    }

    #[tokio::test]
    async fn test_dashboard_earnings() {
        let d = service().dashboard("aff-1").await.unwrap();
        assert_eq!(d.earnings.total, Money::from_paise(44985));
        assert_eq!(d.earnings.pending, Money::from_paise(22485));
        assert_eq!(d.earnings.this_month, Money::from_paise(13496));
        assert_eq!(d.earnings.last_payout.unwrap().id, "payout-1");
        assert_eq!(d.clicks_data.len(), 30);
        assert!(d.clicks_data.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(d.promotional_content.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_affiliate_is_not_found() {
        assert!(matches!(service().dashboard("aff-404").await, Err(StoreError::NotFound("Affiliate"))));
    }

    #[tokio::test]
    async fn test_payout_checks_balance() {
        let svc = service();
        // aff-2: 399.80 approved, nothing paid out yet
        assert_eq!(svc.available_balance("aff-2").await.unwrap(), Money::from_paise(39980));
        match svc.request_payout("aff-2", Money::rupees(500), PaymentMethod::Upi).await {
            Err(StoreError::InsufficientBalance { available }) => assert_eq!(available, Money::from_paise(39980)),
            other => panic!("unexpected {other:?}"),
        }
        let payout = svc.request_payout("aff-2", Money::rupees(300), PaymentMethod::Upi).await.unwrap();
        assert_eq!(payout.status, PayoutStatus::Pending);
        assert!(matches!(svc.request_payout("aff-2", Money::rupees(-1), PaymentMethod::Upi).await, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_payout_rejects_fractional_paise() {
        let svc = service();
        let out = svc.request_payout("aff-2", Money::new(Decimal::new(10005, 3)), PaymentMethod::Upi).await;
        assert!(matches!(out, Err(StoreError::Validation(_))));
        assert_eq!(svc.payouts("aff-2").await.unwrap().len(), 1);
        let exact = svc.request_payout("aff-2", Money::new(Decimal::new(399_80, 2)), PaymentMethod::Upi).await.unwrap();
        assert_eq!(exact.amount, Money::from_paise(39980));
    }

    #[tokio::test]
    async fn test_register_assigns_code_and_rate() {
        let svc = service();
        let info: PersonalInfo = serde_json::from_value(json!({ "name": "Asha Rao", "email": "asha@example.com" })).unwrap();
        let reg = svc.register(info, SocialMedia::default(), AffiliateType::BrandAmbassador, None).await.unwrap();
        assert_eq!(reg.affiliate_code, "FASHUN_ASHA_RAO");
        let profile = svc.affiliate(&reg.application_id).await.unwrap();
        assert_eq!(profile.status, AffiliateStatus::Pending);
        assert_eq!(profile.commission_rate, 20.0);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_email() {
        let info: PersonalInfo = serde_json::from_value(json!({ "name": "X", "email": "nope" })).unwrap();
        let out = service().register(info, SocialMedia::default(), AffiliateType::Affiliate, None).await;
        assert!(matches!(out, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_click_increments_count() {
        let svc = service();
        svc.track_click(Some("aff-1".into()), "FASHUN_VARUN".into(), "10.0.0.1".into(), "ua".into(), String::new(), "/".into()).await.unwrap();
        assert_eq!(svc.affiliate("aff-1").await.unwrap().performance.click_count, 2501);
    }

    #[tokio::test]
    async fn test_profile_patch_keeps_untouched_fields() {
        let svc = service();
        let patch = PersonalInfoPatch { phone: Some("+91 90000 00000".into()), ..Default::default() };
        let updated = svc.update_profile("aff-1", patch, None).await.unwrap();
        assert_eq!(updated.personal_info.phone, "+91 90000 00000");
        assert_eq!(updated.personal_info.name, "Varun Gor");
        let bank = BankDetailsPatch { ifsc_code: Some("SBIN0000001".into()), ..Default::default() };
        let updated = svc.update_payment_details("aff-1", bank).await.unwrap();
        assert_eq!(updated.personal_info.bank_details.ifsc_code, "SBIN0000001");
        assert_eq!(updated.personal_info.bank_details.account_holder, "Varun Gor");
    }
}
