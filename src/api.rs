use crate::client::Config;
use crate::endpoints::keys;
use crate::error::Result;
use crate::rest::ApiContext;
use crate::schemas::{names, SchemaRegistry};
use crate::transport::{HttpMethod, HttpRequester};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// High-level client exposing one method per remote operation.
///
/// Every method validates its payload against the operation's schema
/// before anything touches the network, then submits through the
/// authenticated request pipeline.
///
/// The client is built from an immutable [`Config`] snapshot. Device
/// initialization returns the communication key used by all other
/// endpoints; fold it into a new snapshot with [`Config::with_cmc_key`]
/// and construct a new client from that.
pub struct EtimsClient {
    ctx: ApiContext,
    schemas: SchemaRegistry,
}

impl EtimsClient {
    /// Create a client with the default HTTP requester
    pub fn new(config: Config) -> Self {
        EtimsClient {
            ctx: ApiContext::new(config),
            schemas: SchemaRegistry::with_defaults(),
        }
    }

    /// Create a client dispatching through the given requester
    pub fn with_requester(config: Config, requester: Arc<dyn HttpRequester>) -> Self {
        EtimsClient {
            ctx: ApiContext::with_requester(config, requester),
            schemas: SchemaRegistry::with_defaults(),
        }
    }

    /// The configuration snapshot this client was built from
    pub fn config(&self) -> &Config {
        self.ctx.config()
    }

    /// The underlying request context, for raw endpoint access
    pub fn context(&self) -> &ApiContext {
        &self.ctx
    }

    fn call(
        &self,
        method: HttpMethod,
        endpoint_key: &str,
        schema: &str,
        payload: impl Serialize,
    ) -> Result<Value> {
        let payload = serde_json::to_value(payload)?;
        let normalized = self.schemas.validate(schema, &payload)?;
        self.ctx.execute(method, endpoint_key, &normalized)
    }

    /// Register this device and obtain the communication key.
    /// This is the one call made without the business-identity headers.
    pub fn initialize_device(&self, payload: impl Serialize) -> Result<Value> {
        self.call(
            HttpMethod::Post,
            keys::DEVICE_INIT,
            names::DEVICE_INIT,
            payload,
        )
    }

    /// Fetch the standard code classifications updated since a watermark
    pub fn select_code_list(&self, payload: impl Serialize) -> Result<Value> {
        self.call(HttpMethod::Get, keys::CODE_LIST, names::CODE_SELECT, payload)
    }

    /// Register or update an item in the item master
    pub fn save_item(&self, payload: impl Serialize) -> Result<Value> {
        self.call(HttpMethod::Post, keys::ITEM_SAVE, names::ITEM_SAVE, payload)
    }

    /// List items updated since a watermark
    pub fn select_items(&self, payload: impl Serialize) -> Result<Value> {
        self.call(HttpMethod::Get, keys::ITEM_LIST, names::ITEM_SELECT, payload)
    }

    /// List branches registered for the taxpayer
    pub fn select_branches(&self, payload: impl Serialize) -> Result<Value> {
        self.call(
            HttpMethod::Get,
            keys::BRANCH_LIST,
            names::BRANCH_SELECT,
            payload,
        )
    }

    /// Register a customer against the current branch
    pub fn save_branch_customer(&self, payload: impl Serialize) -> Result<Value> {
        self.call(
            HttpMethod::Post,
            keys::BRANCH_CUSTOMER_SAVE,
            names::BRANCH_CUSTOMER_SAVE,
            payload,
        )
    }

    /// Submit a sales transaction
    pub fn save_sales(&self, payload: impl Serialize) -> Result<Value> {
        self.call(HttpMethod::Post, keys::SALES_SAVE, names::SALES_SAVE, payload)
    }

    /// List purchase transactions awaiting confirmation
    pub fn select_purchases(&self, payload: impl Serialize) -> Result<Value> {
        self.call(
            HttpMethod::Get,
            keys::PURCHASE_LIST,
            names::PURCHASE_SELECT,
            payload,
        )
    }

    /// Confirm and record a purchase transaction
    pub fn save_purchase(&self, payload: impl Serialize) -> Result<Value> {
        self.call(
            HttpMethod::Post,
            keys::PURCHASE_SAVE,
            names::PURCHASE_SAVE,
            payload,
        )
    }

    /// Report the absolute stock level for an item
    pub fn save_stock_master(&self, payload: impl Serialize) -> Result<Value> {
        self.call(
            HttpMethod::Post,
            keys::STOCK_MASTER_SAVE,
            names::STOCK_MASTER_SAVE,
            payload,
        )
    }

    /// Record a stock movement (in/out/adjustment)
    pub fn save_stock_movement(&self, payload: impl Serialize) -> Result<Value> {
        self.call(
            HttpMethod::Post,
            keys::STOCK_MOVE_SAVE,
            names::STOCK_MOVE_SAVE,
            payload,
        )
    }
}
