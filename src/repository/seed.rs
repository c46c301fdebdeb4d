//! Demo records loaded at startup.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeMap;

use crate::domain::aggregates::affiliate::{BankDetails, ContentBody, ContentType, PersonalInfo, Performance, SocialMedia};
use crate::domain::aggregates::experiment::{ExperimentType, Targeting};
use crate::domain::aggregates::inventory::{
    AlertSeverity, AlertType, MovementType, PurchaseOrderItem, StockLocation, Supplier, TransferItem, WarehouseStatus,
};
use crate::domain::aggregates::*;
use crate::domain::value_objects::{Money, Percentage, Sku};
use crate::Result;

fn ts(raw: &str) -> DateTime<Utc> {
    raw.parse().unwrap_or_default()
}

pub struct SeedData {
    pub warehouses: Vec<Warehouse>,
    pub items: Vec<InventoryItem>,
    pub alerts: Vec<StockAlert>,
    pub purchase_orders: Vec<PurchaseOrder>,
    pub transfers: Vec<StockTransfer>,
    pub movements: Vec<StockMovement>,
    pub affiliates: Vec<AffiliateProfile>,
    pub commissions: Vec<Commission>,
    pub payouts: Vec<Payout>,
    pub promotions: Vec<PromotionalContent>,
    pub experiments: Vec<ExperimentConfig>,
    pub feature_flags: Vec<FeatureFlag>,
}

impl SeedData {
    pub fn build() -> Result<Self> {
        Ok(Self {
            warehouses: warehouses(),
            items: items()?,
            alerts: alerts()?,
            purchase_orders: purchase_orders()?,
            transfers: transfers()?,
            movements: movements()?,
            affiliates: affiliates(),
            commissions: commissions(),
            payouts: payouts(),
            promotions: promotions(),
            experiments: vec![demo_experiment()],
            feature_flags: vec![demo_flag()?],
        })
    }
}

fn warehouse(id: &str, name: &str, location: &str, address: &str, manager: &str, phone: &str, email: &str,
             capacity: u32, utilization: u8, zones: &[&str], created: &str) -> Warehouse {
    Warehouse {
        id: id.into(), name: name.into(), location: location.into(), address: address.into(),
        manager: manager.into(), phone: phone.into(), email: email.into(), capacity,
        current_utilization: utilization, status: WarehouseStatus::Active,
        zones: zones.iter().map(|z| z.to_string()).collect(), created_at: ts(created),
    }
}

fn warehouses() -> Vec<Warehouse> {
    vec![
        warehouse("wh-mumbai-001", "Mumbai Central Warehouse", "Mumbai, Maharashtra",
                  "Plot No. 45, Industrial Area, Andheri East, Mumbai - 400099", "Rajesh Kumar",
                  "+91 98765 43210", "rajesh.kumar@fashun.co.in", 50_000, 75, &["A", "B", "C", "D"], "2024-01-15T10:00:00Z"),
        warehouse("wh-delhi-002", "Delhi North Warehouse", "Delhi, India",
                  "Sector 25, Industrial Area, Gurgaon, Delhi NCR - 122001", "Priya Sharma",
                  "+91 87654 32109", "priya.sharma@fashun.co.in", 30_000, 60, &["A", "B", "C"], "2024-02-01T10:00:00Z"),
        warehouse("wh-bangalore-003", "Bangalore South Warehouse", "Bangalore, Karnataka",
                  "Electronic City Phase 2, Bangalore - 560100", "Amit Patel",
                  "+91 76543 21098", "amit.patel@fashun.co.in", 40_000, 45, &["A", "B"], "2024-03-01T10:00:00Z"),
    ]
}

fn urban_threads() -> Supplier {
    Supplier {
        id: "sup-001".into(), name: "Urban Threads Pvt Ltd".into(), contact_person: "Vikram Singh".into(),
        phone: "+91 98765 11111".into(), email: "orders@urbanthreads.com".into(),
    }
}

fn cotton_craft() -> Supplier {
    Supplier {
        id: "sup-002".into(), name: "Cotton Craft Industries".into(), contact_person: "Sunita Devi".into(),
        phone: "+91 87654 22222".into(), email: "supply@cottoncraft.in".into(),
    }
}

fn location(zone: &str, aisle: &str, shelf: &str, bin: &str) -> StockLocation {
    StockLocation { zone: zone.into(), aisle: aisle.into(), shelf: shelf.into(), bin: bin.into() }
}

fn items() -> Result<Vec<InventoryItem>> {
    Ok(vec![
        InventoryItem {
            id: "inv-001".into(), product_id: "prod-hoodie-001".into(), product_name: "Premium Oversized Hoodie".into(),
            sku: Sku::new("FUC-HOD-001-L-BLK")?, warehouse_id: "wh-mumbai-001".into(),
            warehouse_name: "Mumbai Central Warehouse".into(), category: "Hoodies".into(), size: "L".into(), color: "Black".into(),
            quantity: 45, reserved_quantity: 5, available_quantity: 40, reorder_level: 20, max_stock_level: 200,
            unit_cost: 1200, total_value: 54_000, location: location("A", "01", "03", "B12"),
            last_updated: ts("2025-01-16T14:30:00Z"), last_stock_check: ts("2025-01-15T09:00:00Z"),
            batch_number: Some("BATCH-001-2025".into()), expiry_date: None, supplier: urban_threads(),
        },
        InventoryItem {
            id: "inv-002".into(), product_id: "prod-tshirt-001".into(), product_name: "Designer Graphic T-Shirt".into(),
            sku: Sku::new("FUC-TSH-001-M-WHT")?, warehouse_id: "wh-mumbai-001".into(),
            warehouse_name: "Mumbai Central Warehouse".into(), category: "T-Shirts".into(), size: "M".into(), color: "White".into(),
            quantity: 15, reserved_quantity: 2, available_quantity: 13, reorder_level: 25, max_stock_level: 150,
            unit_cost: 450, total_value: 6_750, location: location("B", "02", "01", "T08"),
            last_updated: ts("2025-01-16T12:15:00Z"), last_stock_check: ts("2025-01-14T16:00:00Z"),
            batch_number: Some("BATCH-002-2025".into()), expiry_date: None, supplier: cotton_craft(),
        },
        InventoryItem {
            id: "inv-003".into(), product_id: "prod-polo-001".into(), product_name: "Classic Polo Shirt".into(),
            sku: Sku::new("FUC-POL-001-L-NVY")?, warehouse_id: "wh-delhi-002".into(),
            warehouse_name: "Delhi North Warehouse".into(), category: "Polo Shirts".into(), size: "L".into(), color: "Navy".into(),
            quantity: 8, reserved_quantity: 1, available_quantity: 7, reorder_level: 15, max_stock_level: 100,
            unit_cost: 650, total_value: 5_200, location: location("A", "01", "02", "P05"),
            last_updated: ts("2025-01-16T11:45:00Z"), last_stock_check: ts("2025-01-13T10:30:00Z"),
            batch_number: Some("BATCH-003-2025".into()), expiry_date: None, supplier: urban_threads(),
        },
    ])
}

fn alerts() -> Result<Vec<StockAlert>> {
    Ok(vec![
        StockAlert {
            id: "alert-001".into(), kind: AlertType::LowStock, severity: AlertSeverity::High, item_id: "inv-002".into(),
            product_name: "Designer Graphic T-Shirt".into(), sku: Sku::new("FUC-TSH-001-M-WHT")?,
            warehouse_id: "wh-mumbai-001".into(), warehouse_name: "Mumbai Central Warehouse".into(),
            current_quantity: 15, reorder_level: Some(25),
            message: "Stock level (15) is below reorder point (25). Immediate reorder recommended.".into(),
            is_resolved: false, created_at: ts("2025-01-16T08:00:00Z"), resolved_at: None, resolved_by: None,
        },
        StockAlert {
            id: "alert-002".into(), kind: AlertType::LowStock, severity: AlertSeverity::Critical, item_id: "inv-003".into(),
            product_name: "Classic Polo Shirt".into(), sku: Sku::new("FUC-POL-001-L-NVY")?,
            warehouse_id: "wh-delhi-002".into(), warehouse_name: "Delhi North Warehouse".into(),
            current_quantity: 8, reorder_level: Some(15),
            message: "Critical stock level (8) detected. Urgent reorder required to prevent stockout.".into(),
            is_resolved: false, created_at: ts("2025-01-16T06:30:00Z"), resolved_at: None, resolved_by: None,
        },
    ])
}

fn purchase_orders() -> Result<Vec<PurchaseOrder>> {
    Ok(vec![
        PurchaseOrder {
            id: "po-001".into(), order_number: "PO-2025-001".into(), supplier_id: "sup-001".into(),
            supplier_name: "Urban Threads Pvt Ltd".into(), warehouse_id: "wh-mumbai-001".into(),
            warehouse_name: "Mumbai Central Warehouse".into(), status: PurchaseOrderStatus::Sent,
            items: vec![PurchaseOrderItem {
                product_id: "prod-hoodie-001".into(), product_name: "Premium Oversized Hoodie".into(),
                sku: Sku::new("FUC-HOD-001-L-BLK")?, quantity_ordered: 100, quantity_received: 0,
                unit_cost: 1200, total_cost: 120_000,
            }],
            total_amount: 120_000, order_date: ts("2025-01-15T10:00:00Z"), expected_delivery: ts("2025-01-22T10:00:00Z"),
            actual_delivery: None, notes: Some("Urgent restock for high-demand item".into()),
            created_by: "Rajesh Kumar".into(), approved_by: Some("Inventory Manager".into()),
        },
        PurchaseOrder {
            id: "po-002".into(), order_number: "PO-2025-002".into(), supplier_id: "sup-002".into(),
            supplier_name: "Cotton Craft Industries".into(), warehouse_id: "wh-mumbai-001".into(),
            warehouse_name: "Mumbai Central Warehouse".into(), status: PurchaseOrderStatus::Pending,
            items: vec![PurchaseOrderItem {
                product_id: "prod-tshirt-001".into(), product_name: "Designer Graphic T-Shirt".into(),
                sku: Sku::new("FUC-TSH-001-M-WHT")?, quantity_ordered: 75, quantity_received: 0,
                unit_cost: 450, total_cost: 33_750,
            }],
            total_amount: 33_750, order_date: ts("2025-01-16T09:00:00Z"), expected_delivery: ts("2025-01-20T10:00:00Z"),
            actual_delivery: None, notes: Some("Reorder for low stock item".into()),
            created_by: "Rajesh Kumar".into(), approved_by: None,
        },
    ])
}

fn transfers() -> Result<Vec<StockTransfer>> {
    Ok(vec![StockTransfer {
        id: "tr-001".into(), transfer_number: "TR-2025-001".into(),
        from_warehouse_id: "wh-mumbai-001".into(), from_warehouse_name: "Mumbai Central Warehouse".into(),
        to_warehouse_id: "wh-delhi-002".into(), to_warehouse_name: "Delhi North Warehouse".into(),
        status: TransferStatus::InTransit,
        items: vec![TransferItem {
            product_id: "prod-polo-001".into(), product_name: "Classic Polo Shirt".into(),
            sku: Sku::new("FUC-POL-001-L-NVY")?, quantity: 20, transferred_quantity: Some(20),
        }],
        requested_by: "Priya Sharma".into(), approved_by: Some("Rajesh Kumar".into()),
        request_date: ts("2025-01-15T14:00:00Z"), completed_date: None,
        tracking_number: Some("TR123456789".into()), notes: Some("Urgent transfer to meet Delhi demand".into()),
    }])
}

fn movements() -> Result<Vec<StockMovement>> {
    Ok(vec![StockMovement {
        id: "mov-001".into(), kind: MovementType::Inbound, item_id: "inv-001".into(),
        product_name: "Premium Oversized Hoodie".into(), sku: Sku::new("FUC-HOD-001-L-BLK")?,
        warehouse_id: "wh-mumbai-001".into(), quantity: 50, previous_quantity: 25, new_quantity: 75,
        reason: "Purchase Order Receipt".into(), reference: Some("PO-2024-089".into()),
        performed_by: "Rajesh Kumar".into(), timestamp: ts("2025-01-10T14:30:00Z"), notes: None,
    }])
}

fn affiliates() -> Vec<AffiliateProfile> {
    vec![
        AffiliateProfile {
            id: "aff-1".into(), user_id: "user-123".into(), affiliate_code: "FASHUN_VARUN".into(),
            status: AffiliateStatus::Active, kind: AffiliateType::Influencer, commission_rate: 15.0,
            social_media: SocialMedia {
                instagram: Some("@varun_fashion".into()), youtube: Some("VarunStyleHub".into()),
                followers: Some(50_000), ..Default::default()
            },
            personal_info: PersonalInfo {
                name: "Varun Gor".into(), email: "varun@example.com".into(), phone: "+91 98765 43210".into(),
                address: "Mumbai, Maharashtra".into(),
                bank_details: BankDetails { account_number: "****7890".into(), ifsc_code: "HDFC0001234".into(), account_holder: "Varun Gor".into() },
            },
            performance: Performance { total_sales: Money::rupees(125_000), total_commission: Money::rupees(18_750), click_count: 2500, conversion_rate: 5.2, signups: 130 },
            created_at: ts("2024-01-15T10:00:00Z"), approved_at: Some(ts("2024-01-16T14:30:00Z")),
        },
        AffiliateProfile {
            id: "aff-2".into(), user_id: "user-456".into(), affiliate_code: "FASHUN_STYLE".into(),
            status: AffiliateStatus::Active, kind: AffiliateType::BrandAmbassador, commission_rate: 20.0,
            social_media: SocialMedia {
                instagram: Some("@style_guru_india".into()), tiktok: Some("@styleguru".into()),
                followers: Some(85_000), ..Default::default()
            },
            personal_info: PersonalInfo {
                name: "Priya Sharma".into(), email: "priya@example.com".into(), phone: "+91 87654 32109".into(),
                address: "Delhi, India".into(),
                bank_details: BankDetails { account_number: "****5678".into(), ifsc_code: "ICICI0001234".into(), account_holder: "Priya Sharma".into() },
            },
            performance: Performance { total_sales: Money::rupees(89_000), total_commission: Money::rupees(17_800), click_count: 1800, conversion_rate: 6.1, signups: 110 },
            created_at: ts("2024-02-01T10:00:00Z"), approved_at: Some(ts("2024-02-03T09:15:00Z")),
        },
    ]
}

fn commission(id: &str, affiliate: &str, order: &str, email: &str, product: &str, name: &str,
              value: Money, rate: f64, amount: Money, status: CommissionStatus, created: &str) -> Commission {
    Commission {
        id: id.into(), affiliate_id: affiliate.into(), order_id: order.into(), customer_email: email.into(),
        product_id: product.into(), product_name: name.into(), order_value: value, commission_rate: rate,
        commission_amount: amount, status, created_at: ts(created), paid_at: None,
    }
}

fn commissions() -> Vec<Commission> {
    vec![
        commission("comm-1", "aff-1", "ORD-001", "customer@example.com", "prod-1", "Premium Hoodie",
                   Money::rupees(2999), 15.0, Money::from_paise(44985), CommissionStatus::Approved, "2025-01-15T14:30:00Z"),
        commission("comm-2", "aff-1", "ORD-002", "customer2@example.com", "prod-2", "Designer T-Shirt",
                   Money::rupees(1499), 15.0, Money::from_paise(22485), CommissionStatus::Pending, "2025-01-16T10:15:00Z"),
        commission("comm-3", "aff-2", "ORD-003", "customer3@example.com", "prod-3", "Casual Polo",
                   Money::rupees(1999), 20.0, Money::from_paise(39980), CommissionStatus::Approved, "2025-01-16T16:45:00Z"),
    ]
}

fn payouts() -> Vec<Payout> {
    vec![
        Payout {
            id: "payout-1".into(), affiliate_id: "aff-1".into(), amount: Money::rupees(12_500), status: PayoutStatus::Completed,
            payment_method: PaymentMethod::BankTransfer, transaction_id: Some("TXN123456789".into()),
            requested_at: ts("2025-01-10T10:00:00Z"), processed_at: Some(ts("2025-01-12T14:30:00Z")), failure_reason: None,
        },
        Payout {
            id: "payout-2".into(), affiliate_id: "aff-2".into(), amount: Money::rupees(8_900), status: PayoutStatus::Processing,
            payment_method: PaymentMethod::Upi, transaction_id: None,
            requested_at: ts("2025-01-15T09:00:00Z"), processed_at: None, failure_reason: None,
        },
    ]
}

fn promotions() -> Vec<PromotionalContent> {
    vec![
        PromotionalContent {
            id: "promo-1".into(), title: "Winter Collection Launch".into(), kind: ContentType::SocialPost,
            content: ContentBody {
                image_url: Some("/api/placeholder/1080/1080".into()), video_url: None,
                description: "Discover the hottest winter trends with FASHUN.CO.IN".into(),
                hashtags: vec!["#FASHUN".into(), "#WinterFashion".into(), "#Style2025".into()],
                copy_text: "Get ready to slay this winter! Use my code FASHUN_VARUN for 15% off on the entire winter collection! #FASHUN #WinterVibes".into(),
            },
            target_audience: "Fashion enthusiasts aged 18-35".into(), campaign_id: None, is_active: true,
            created_at: ts("2025-01-10T12:00:00Z"),
        },
        PromotionalContent {
            id: "promo-2".into(), title: "Hoodie Collection Banner".into(), kind: ContentType::Banner,
            content: ContentBody {
                image_url: Some("/api/placeholder/1200/600".into()), video_url: None,
                description: "Premium hoodies for every occasion".into(), hashtags: vec![],
                copy_text: "Premium Hoodies Starting at \u{20b9}1,999 - Use Code: FASHUN_STYLE".into(),
            },
            target_audience: "Young adults interested in streetwear".into(), campaign_id: None, is_active: true,
            created_at: ts("2025-01-12T15:30:00Z"),
        },
    ]
}

fn demo_experiment() -> ExperimentConfig {
    let variant = |id: &str, name: &str, is_control: bool, changes: Vec<VariantChange>| ExperimentVariant {
        id: id.into(), name: name.into(), description: String::new(), traffic_weight: 50.0,
        is_control, changes, conversion_goals: vec!["add_to_cart".into()],
    };
    ExperimentConfig {
        id: "exp_hero_cta".into(),
        name: "Homepage hero call to action".into(),
        description: "Compares the current hero button with a louder drop announcement.".into(),
        hypothesis: "Naming the drop in the CTA lifts add-to-cart rate.".into(),
        status: ExperimentStatus::Running,
        kind: ExperimentType::Split,
        traffic_allocation: Percentage::FULL,
        start_date: ts("2025-01-15T00:00:00Z"),
        end_date: None,
        target_metrics: vec!["add_to_cart".into()],
        targeting: Targeting::default(),
        variants: vec![
            variant("control", "Shop Now", true, vec![]),
            variant("drop_cta", "Shop the Drop", false, vec![
                VariantChange::ElementText { selector: ".hero-cta".into(), value: "Shop the Drop".into() },
                VariantChange::ElementStyle { selector: ".hero-cta".into(), property: "background-color".into(), value: "#111111".into() },
            ]),
        ],
        statistical_significance: 95.0,
        minimum_detectable_effect: 5.0,
        estimated_duration: 14,
    }
}

fn demo_flag() -> Result<FeatureFlag> {
    let mut variations = BTreeMap::new();
    variations.insert("on".to_string(), json!({ "layout": "single-page" }));
    variations.insert("off".to_string(), json!(null));
    Ok(FeatureFlag {
        id: "flag_one_page_checkout".into(),
        name: "One page checkout".into(),
        description: "Collapses shipping and payment into a single step.".into(),
        enabled: true,
        rollout_percentage: Percentage::new(50.0)?,
        targeting: None,
        variations,
        default_variation: "on".into(),
    })
}
