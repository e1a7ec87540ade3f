//! Normalized product records
//!
//! Upstream listings vary in field casing and naming across tenant
//! versions. `ProductRecord::from_raw` folds the known aliases into one
//! shape and keeps the untouched source object in `metadata` so callers
//! can reach fields the normalization does not cover.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::endpoints::{DEFAULT_MEMBERSHIPS_PATH, DEFAULT_ROOMS_PATH, MEMBERSHIPS_ENDPOINT_SETTING, ROOMS_ENDPOINT_SETTING};

/// Catalog partitions exposed by the tenant API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Memberships,
    Rooms,
}

impl ProductType {
    /// Stable lowercase name used in cache keys and record tagging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Memberships => "memberships",
            ProductType::Rooms => "rooms",
        }
    }

    /// Settings key holding the listing path override for this partition.
    pub fn endpoint_setting(&self) -> &'static str {
        match self {
            ProductType::Memberships => MEMBERSHIPS_ENDPOINT_SETTING,
            ProductType::Rooms => ROOMS_ENDPOINT_SETTING,
        }
    }

    /// Default listing path for this partition.
    pub fn default_path(&self) -> &'static str {
        match self {
            ProductType::Memberships => DEFAULT_MEMBERSHIPS_PATH,
            ProductType::Rooms => DEFAULT_ROOMS_PATH,
        }
    }

    pub fn all() -> [ProductType; 2] {
        [ProductType::Memberships, ProductType::Rooms]
    }
}

/// One normalized catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub name: String,
    pub description: String,
    pub price: String,
    #[serde(rename = "billingPeriod")]
    pub billing_period: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "ctaUrl")]
    pub cta_url: String,
    pub availability: String,
    pub metadata: Value,
}

impl ProductRecord {
    /// Normalize one raw upstream object into a record tagged with the
    /// partition it came from. The first alias present wins; scalars are
    /// coerced to strings and anything else becomes empty.
    pub fn from_raw(raw: &Value, product_type: ProductType) -> Self {
        Self {
            id: scalar(raw, &["id", "Id", "ID"]),
            product_type,
            name: scalar(raw, &["name", "Name", "title"]),
            description: scalar(raw, &["description", "Description"]),
            price: scalar(raw, &["price", "Price"]),
            billing_period: scalar(raw, &["billingPeriod", "BillingPeriod"]),
            image_url: scalar(raw, &["imageUrl", "image", "Image"]),
            cta_url: scalar(raw, &["ctaUrl", "url", "Url"]),
            availability: scalar(raw, &["availability", "Availability"]),
            metadata: raw.clone(),
        }
    }
}

fn scalar(raw: &Value, aliases: &[&str]) -> String {
    for key in aliases {
        match raw.get(key) {
            Some(Value::String(s)) => return s.clone(),
            Some(Value::Number(n)) => return n.to_string(),
            Some(Value::Bool(b)) => return b.to_string(),
            _ => {}
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_fields_map_directly() {
        let raw = json!({
            "id": 42,
            "name": "Hot Desk",
            "description": "Flexible seat",
            "price": "99.00",
            "billingPeriod": "Month",
            "imageUrl": "https://t.example/desk.png",
            "ctaUrl": "https://t.example/signup",
            "availability": "available",
        });
        let record = ProductRecord::from_raw(&raw, ProductType::Memberships);
        assert_eq!(record.id, "42");
        assert_eq!(record.name, "Hot Desk");
        assert_eq!(record.price, "99.00");
        assert_eq!(record.billing_period, "Month");
        assert_eq!(record.image_url, "https://t.example/desk.png");
        assert_eq!(record.cta_url, "https://t.example/signup");
        assert_eq!(record.product_type, ProductType::Memberships);
    }

    #[test]
    fn pascal_case_aliases_are_folded() {
        let raw = json!({
            "Id": "m-7",
            "Name": "Meeting Room A",
            "Description": "Seats eight",
            "Price": 25,
            "Image": "https://t.example/room.png",
            "Url": "https://t.example/book",
        });
        let record = ProductRecord::from_raw(&raw, ProductType::Rooms);
        assert_eq!(record.id, "m-7");
        assert_eq!(record.name, "Meeting Room A");
        assert_eq!(record.price, "25");
        assert_eq!(record.image_url, "https://t.example/room.png");
        assert_eq!(record.cta_url, "https://t.example/book");
    }

    #[test]
    fn first_present_alias_wins() {
        let raw = json!({"name": "lower", "Name": "upper", "title": "titled"});
        let record = ProductRecord::from_raw(&raw, ProductType::Rooms);
        assert_eq!(record.name, "lower");

        let raw = json!({"Name": "upper", "title": "titled"});
        let record = ProductRecord::from_raw(&raw, ProductType::Rooms);
        assert_eq!(record.name, "upper");
    }

    #[test]
    fn missing_and_non_scalar_fields_become_empty() {
        let raw = json!({"id": {"nested": true}, "name": ["list"]});
        let record = ProductRecord::from_raw(&raw, ProductType::Memberships);
        assert_eq!(record.id, "");
        assert_eq!(record.name, "");
        assert_eq!(record.description, "");
    }

    #[test]
    fn metadata_preserves_the_raw_object() {
        let raw = json!({"id": 1, "tariffGroup": "legacy"});
        let record = ProductRecord::from_raw(&raw, ProductType::Memberships);
        assert_eq!(record.metadata["tariffGroup"], "legacy");
    }

    #[test]
    fn record_serializes_with_wire_names() {
        let record = ProductRecord::from_raw(&json!({"id": 1}), ProductType::Rooms);
        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["type"], "rooms");
        assert!(out.get("billingPeriod").is_some());
        assert!(out.get("imageUrl").is_some());
        assert!(out.get("ctaUrl").is_some());
    }
}
