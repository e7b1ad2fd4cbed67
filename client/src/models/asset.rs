use serde::{Deserialize, Serialize};
use time::Date;

use super::common::{null_as_default, wire_date, DbId};

/// Physical item that can be requested. Owned by the asset directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "assetId", alias = "AssetId")]
    pub asset_id: DbId,
    #[serde(
        rename = "assetName",
        alias = "AssetName",
        default,
        deserialize_with = "null_as_default"
    )]
    pub name: String,
    #[serde(rename = "assetDescription", alias = "AssetDescription", default)]
    pub description: Option<String>,
    #[serde(rename = "model", alias = "Model", default)]
    pub model: Option<String>,
    #[serde(rename = "serialNumber", alias = "SerialNumber", default)]
    pub serial_number: Option<String>,
    #[serde(rename = "value", alias = "Value", default)]
    pub value: Option<f64>,
    #[serde(rename = "location", alias = "Location", default)]
    pub location: Option<String>,
    #[serde(rename = "manufacturingDate", alias = "ManufacturingDate", default, with = "wire_date")]
    pub manufacturing_date: Option<Date>,
    #[serde(rename = "expiryDate", alias = "ExpiryDate", default, with = "wire_date")]
    pub expiry_date: Option<Date>,
    #[serde(rename = "assetStatus", alias = "AssetStatus", alias = "Asset_Status", default)]
    pub status: Option<String>,
    #[serde(rename = "categoryId", alias = "CategoryId", default)]
    pub category_id: Option<DbId>,
    #[serde(rename = "subCategoryId", alias = "SubCategoryId", default)]
    pub sub_category_id: Option<DbId>,
    #[serde(rename = "assetImage", alias = "AssetImage", default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "categoryId", alias = "CategoryId")]
    pub category_id: DbId,
    #[serde(
        rename = "categoryName",
        alias = "CategoryName",
        default,
        deserialize_with = "null_as_default"
    )]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    #[serde(rename = "subCategoryId", alias = "SubCategoryId")]
    pub sub_category_id: DbId,
    #[serde(
        rename = "subCategoryName",
        alias = "SubCategoryName",
        default,
        deserialize_with = "null_as_default"
    )]
    pub name: String,
    #[serde(rename = "quantity", alias = "Quantity", default)]
    pub quantity: Option<i64>,
    #[serde(rename = "categoryId", alias = "CategoryId", default)]
    pub category_id: Option<DbId>,
}
