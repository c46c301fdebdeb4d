//! Affiliate Aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateProfile {
    pub id: String,
    pub user_id: String,
    pub affiliate_code: String,
    pub status: AffiliateStatus,
    #[serde(rename = "type")]
    pub kind: AffiliateType,
    pub commission_rate: f64,
    pub social_media: SocialMedia,
    pub personal_info: PersonalInfo,
    pub performance: Performance,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffiliateStatus { Pending, Active, Suspended, Rejected }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffiliateType { #[default] Affiliate, Influencer, BrandAmbassador }

impl AffiliateType {
    /// Commission percentage granted at registration.
    pub fn commission_rate(&self) -> f64 {
        match self {
            AffiliateType::Influencer => 15.0,
            AffiliateType::BrandAmbassador => 20.0,
            AffiliateType::Affiliate => 10.0,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialMedia {
    pub instagram: Option<String>,
    pub youtube: Option<String>,
    pub tiktok: Option<String>,
    pub twitter: Option<String>,
    pub followers: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub bank_details: BankDetails,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub account_number: String,
    pub ifsc_code: String,
    pub account_holder: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub total_sales: Money,
    pub total_commission: Money,
    pub click_count: u64,
    pub conversion_rate: f64,
    pub signups: u64,
}

/// Partial profile update; absent fields keep their current value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfoPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetailsPatch {
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
    pub account_holder: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
    pub id: String,
    pub affiliate_id: String,
    pub order_id: String,
    pub customer_email: String,
    pub product_id: String,
    pub product_name: String,
    pub order_value: Money,
    pub commission_rate: f64,
    pub commission_amount: Money,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus { Pending, Approved, Paid, Cancelled }

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payout {
    pub id: String,
    pub affiliate_id: String,
    pub amount: Money,
    pub status: PayoutStatus,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus { Pending, Processing, Completed, Failed }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod { BankTransfer, Upi, Paypal }

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionalContent {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub content: ContentBody,
    pub target_audience: String,
    pub campaign_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType { Banner, SocialPost, EmailTemplate, VideoScript }

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBody {
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub description: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub copy_text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralClick {
    pub id: String,
    pub affiliate_id: String,
    pub affiliate_code: String,
    pub ip_address: String,
    pub user_agent: String,
    pub referrer_url: String,
    pub landing_page: String,
    pub timestamp: DateTime<Utc>,
    pub converted: bool,
    pub order_id: Option<String>,
}

impl AffiliateProfile {
    /// `FASHUN_` followed by the upper-cased name with whitespace runs as `_`.
    pub fn code_for(name: &str) -> String {
        let joined = name.split_whitespace().collect::<Vec<_>>().join("_");
        format!("FASHUN_{}", joined.to_uppercase())
    }

    pub fn apply_profile_patch(&mut self, info: PersonalInfoPatch, social: Option<SocialMedia>) {
        if let Some(v) = info.name { self.personal_info.name = v; }
        if let Some(v) = info.email { self.personal_info.email = v; }
        if let Some(v) = info.phone { self.personal_info.phone = v; }
        if let Some(v) = info.address { self.personal_info.address = v; }
        if let Some(s) = social {
            let current = &mut self.social_media;
            if s.instagram.is_some() { current.instagram = s.instagram; }
            if s.youtube.is_some() { current.youtube = s.youtube; }
            if s.tiktok.is_some() { current.tiktok = s.tiktok; }
            if s.twitter.is_some() { current.twitter = s.twitter; }
            if s.followers.is_some() { current.followers = s.followers; }
        }
    }

    pub fn apply_bank_patch(&mut self, patch: BankDetailsPatch) {
        let bank = &mut self.personal_info.bank_details;
        if let Some(v) = patch.account_number { bank.account_number = v; }
        if let Some(v) = patch.ifsc_code { bank.ifsc_code = v; }
        if let Some(v) = patch.account_holder { bank.account_holder = v; }
    }
}
