//! Typed, time-bounded access to the storefront tables.
//!
//! Every call goes through [`TimeoutConfig::run`] with its [`RemoteStep`],
//! so a hung backend surfaces as [`CommerceError::Timeout`] for that step.
//! Rows are validated here, at the data-access boundary.

use craft_data::{RemoteStep, TimeoutConfig};
use craft_db::{Db, Query, Row};
use serde::de::DeserializeOwned;

use crate::cart::{Promocode, PromocodeRecord};
use crate::catalog::{Category, Product, ProductRecord};
use crate::checkout::{NewOrder, NewOrderItem, OrderItemRecord, OrderRecord, ShippingRegion};
use crate::error::CommerceError;
use crate::ids::{OrderId, ProductId, PromocodeId, UserId};
use crate::profile::Profile;

/// Table names.
pub mod tables {
    pub const PRODUCTS: &str = "products";
    pub const CATEGORIES: &str = "categories";
    pub const PROMOCODES: &str = "promocodes";
    pub const SHIPPING_REGIONS: &str = "shipping_regions";
    pub const ORDERS: &str = "orders";
    pub const ORDER_ITEMS: &str = "order_items";
    pub const PROFILES: &str = "profiles";
}

/// Repository over the backend tables.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    db: Db,
    timeouts: TimeoutConfig,
}

impl RemoteStore {
    pub fn new(db: Db, timeouts: TimeoutConfig) -> Self {
        Self { db, timeouts }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    /// Select rows and convert each one, skipping rows that fail validation.
    async fn select_valid<R, T>(&self, step: RemoteStep, query: Query) -> Result<Vec<T>, CommerceError>
    where
        R: DeserializeOwned,
        T: TryFrom<R, Error = CommerceError>,
    {
        let result = self.timeouts.run(step, self.db.query(&query)).await?;
        let mut valid = Vec::with_capacity(result.len());
        for row in result.iter() {
            match row.deserialize::<R>().map_err(CommerceError::from).and_then(T::try_from) {
                Ok(item) => valid.push(item),
                Err(e) => tracing::warn!(table = %query.table, error = %e, "skipping invalid row"),
            }
        }
        Ok(valid)
    }

    /// All products, by name.
    pub async fn products(&self) -> Result<Vec<Product>, CommerceError> {
        self.select_valid::<ProductRecord, Product>(
            RemoteStep::Catalog,
            Query::table(tables::PRODUCTS).order_asc("name"),
        )
        .await
    }

    /// One product by id.
    pub async fn product(&self, id: &ProductId) -> Result<Option<Product>, CommerceError> {
        let query = Query::table(tables::PRODUCTS).eq("id", id.as_str());
        let record: Option<ProductRecord> = self
            .timeouts
            .run(RemoteStep::Catalog, self.db.query_one(&query))
            .await?;
        record.map(Product::try_from).transpose()
    }

    /// All categories, by name.
    pub async fn categories(&self) -> Result<Vec<Category>, CommerceError> {
        let query = Query::table(tables::CATEGORIES).order_asc("name");
        Ok(self
            .timeouts
            .run(RemoteStep::Catalog, self.db.query_as::<Category>(&query))
            .await?)
    }

    /// Active shipping regions, by name.
    pub async fn active_regions(&self) -> Result<Vec<ShippingRegion>, CommerceError> {
        self.select_valid::<ShippingRegion, RegionRow>(
            RemoteStep::Regions,
            Query::table(tables::SHIPPING_REGIONS)
                .eq("is_active", true)
                .order_asc("name"),
        )
        .await
        .map(|rows| rows.into_iter().map(|r| r.0).collect())
    }

    /// The active promocode with exactly this code.
    pub async fn active_promocode(&self, code: &str) -> Result<Option<Promocode>, CommerceError> {
        let query = Query::table(tables::PROMOCODES)
            .eq("code", code)
            .eq("is_active", true);
        let record: Option<PromocodeRecord> = self
            .timeouts
            .run(RemoteStep::PromocodeLookup, self.db.query_one(&query))
            .await?;
        record.map(Promocode::try_from).transpose()
    }

    /// Re-read a promocode by id, active or not.
    pub async fn promocode(&self, id: &PromocodeId) -> Result<Option<(Promocode, bool)>, CommerceError> {
        let query = Query::table(tables::PROMOCODES).eq("id", id.as_str());
        let record: Option<PromocodeRecord> = self
            .timeouts
            .run(RemoteStep::PromocodeUsage, self.db.query_one(&query))
            .await?;
        match record {
            Some(record) => {
                let active = record.is_active.unwrap_or(true);
                Ok(Some((Promocode::try_from(record)?, active)))
            }
            None => Ok(None),
        }
    }

    /// Advance `used_count` by one if it still equals `promocode.used_count`.
    ///
    /// Returns `false` when another checkout got there first.
    pub async fn increment_promocode_usage(&self, promocode: &Promocode) -> Result<bool, CommerceError> {
        let query = Query::table(tables::PROMOCODES)
            .eq("id", promocode.id.as_str())
            .eq("used_count", promocode.used_count);
        let changes = Row::new().with("used_count", promocode.used_count + 1);
        let updated = self
            .timeouts
            .run(RemoteStep::PromocodeUsage, self.db.update(&query, changes))
            .await?;
        Ok(updated > 0)
    }

    /// Write an order header.
    pub async fn insert_order(&self, order: &NewOrder) -> Result<OrderRecord, CommerceError> {
        Ok(self
            .timeouts
            .run(RemoteStep::OrderInsert, self.db.insert_one(tables::ORDERS, order))
            .await?)
    }

    /// Write the lines of an order.
    pub async fn insert_order_items(&self, items: &[NewOrderItem]) -> Result<Vec<OrderItemRecord>, CommerceError> {
        Ok(self
            .timeouts
            .run(
                RemoteStep::OrderItemsInsert,
                self.db.insert_many(tables::ORDER_ITEMS, items),
            )
            .await?)
    }

    /// Delete an order and its lines, lines first.
    pub async fn delete_order(&self, id: &OrderId) -> Result<(), CommerceError> {
        let items = Query::table(tables::ORDER_ITEMS).eq("order_id", id.as_str());
        let header = Query::table(tables::ORDERS).eq("id", id.as_str());
        self.timeouts
            .run(RemoteStep::OrderRollback, async {
                self.db.delete(&items).await?;
                self.db.delete(&header).await
            })
            .await?;
        Ok(())
    }

    /// A user's orders, newest first.
    pub async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<OrderRecord>, CommerceError> {
        let query = Query::table(tables::ORDERS)
            .eq("user_id", user_id.as_str())
            .order_desc("created_at");
        Ok(self
            .timeouts
            .run(RemoteStep::OrderHistory, self.db.query_as(&query))
            .await?)
    }

    /// Lines of one order.
    pub async fn order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItemRecord>, CommerceError> {
        let query = Query::table(tables::ORDER_ITEMS).eq("order_id", order_id.as_str());
        Ok(self
            .timeouts
            .run(RemoteStep::OrderHistory, self.db.query_as(&query))
            .await?)
    }

    /// A user's profile, if one was saved.
    pub async fn profile(&self, user_id: &UserId) -> Result<Option<Profile>, CommerceError> {
        let query = Query::table(tables::PROFILES).eq("id", user_id.as_str());
        Ok(self
            .timeouts
            .run(RemoteStep::Profile, self.db.query_one(&query))
            .await?)
    }

    /// Insert or update a profile keyed by user id.
    pub async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, CommerceError> {
        Ok(self
            .timeouts
            .run(
                RemoteStep::Profile,
                self.db.upsert_one(tables::PROFILES, profile, "id"),
            )
            .await?)
    }
}

/// Validated region row.
struct RegionRow(ShippingRegion);

impl TryFrom<ShippingRegion> for RegionRow {
    type Error = CommerceError;

    fn try_from(region: ShippingRegion) -> Result<Self, Self::Error> {
        region.validated().map(RegionRow)
    }
}
