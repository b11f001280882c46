//! Inventory resource endpoints
//!
//! All calls go through [`StockroomClient::send`], so they share the session
//! recovery of every other request, and unwrap the `data` envelope.

use super::{ClientError, StockroomClient};
use crate::types::DataEnvelope;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Collections exposed by the inventory API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Branches,
    Warehouses,
    Accounts,
    Suppliers,
    PurchaseOrders,
    PurchaseReturns,
    StockTakes,
    Transfers,
    PriceBooks,
    DamageItems,
    SalesPlans,
}

impl Resource {
    pub const ALL: [Self; 11] = [
        Self::Branches,
        Self::Warehouses,
        Self::Accounts,
        Self::Suppliers,
        Self::PurchaseOrders,
        Self::PurchaseReturns,
        Self::StockTakes,
        Self::Transfers,
        Self::PriceBooks,
        Self::DamageItems,
        Self::SalesPlans,
    ];

    /// Collection name as it appears in URLs
    pub const fn name(self) -> &'static str {
        match self {
            Self::Branches => "branches",
            Self::Warehouses => "warehouses",
            Self::Accounts => "accounts",
            Self::Suppliers => "suppliers",
            Self::PurchaseOrders => "purchase-orders",
            Self::PurchaseReturns => "purchase-returns",
            Self::StockTakes => "stock-takes",
            Self::Transfers => "transfers",
            Self::PriceBooks => "price-books",
            Self::DamageItems => "damage-items",
            Self::SalesPlans => "sales-plans",
        }
    }

    /// Path of the collection
    pub fn path(self) -> String {
        format!("/{}", self.name())
    }

    /// Path of one item in the collection
    pub fn item_path(self, id: &str) -> String {
        format!("/{}/{}", self.name(), id)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|resource| resource.name() == normalized)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|r| r.name()).collect();
                format!("unknown resource '{s}', expected one of: {}", known.join(", "))
            })
    }
}

impl StockroomClient {
    /// List a collection, with optional filter/paging query parameters
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: Resource,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let request = query.iter().fold(
            self.request(Method::GET, &resource.path()),
            |request, (key, value)| request.query(*key, *value),
        );
        self.fetch_data(request).await
    }

    /// Fetch one item
    pub async fn get<T: DeserializeOwned>(
        &self,
        resource: Resource,
        id: &str,
    ) -> Result<T, ClientError> {
        let request = self.request(Method::GET, &resource.item_path(id));
        self.fetch_data(request).await
    }

    /// Create an item
    pub async fn create<B, T>(&self, resource: Resource, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, &resource.path()).json(body)?;
        self.fetch_data(request).await
    }

    /// Replace an item
    pub async fn update<B, T>(
        &self,
        resource: Resource,
        id: &str,
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(Method::PUT, &resource.item_path(id))
            .json(body)?;
        self.fetch_data(request).await
    }

    /// Delete an item
    pub async fn delete(&self, resource: Resource, id: &str) -> Result<(), ClientError> {
        let request = self.request(Method::DELETE, &resource.item_path(id));
        self.send(request).await?;
        Ok(())
    }

    async fn fetch_data<T: DeserializeOwned>(
        &self,
        request: super::RequestDescriptor,
    ) -> Result<T, ClientError> {
        let envelope: DataEnvelope<T> = self.execute(request).await?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_paths() {
        assert_eq!(Resource::PurchaseOrders.path(), "/purchase-orders");
        assert_eq!(Resource::Branches.item_path("b-12"), "/branches/b-12");
    }

    #[test]
    fn test_resource_from_str_accepts_underscores() {
        assert_eq!("stock_takes".parse::<Resource>(), Ok(Resource::StockTakes));
        assert_eq!("Price-Books".parse::<Resource>(), Ok(Resource::PriceBooks));
        assert!("customers".parse::<Resource>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for resource in Resource::ALL {
            assert_eq!(resource.to_string().parse::<Resource>(), Ok(resource));
        }
    }
}
