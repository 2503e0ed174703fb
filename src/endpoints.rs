use std::collections::BTreeMap;

/// Well-known endpoint keys for the default descriptor table
pub mod keys {
    pub const DEVICE_INIT: &str = "device-init";
    pub const CODE_LIST: &str = "code-list";
    pub const ITEM_SAVE: &str = "item-save";
    pub const ITEM_LIST: &str = "item-list";
    pub const BRANCH_LIST: &str = "branch-list";
    pub const BRANCH_CUSTOMER_SAVE: &str = "branch-customer-save";
    pub const SALES_SAVE: &str = "sales-save";
    pub const PURCHASE_LIST: &str = "purchase-list";
    pub const PURCHASE_SAVE: &str = "purchase-save";
    pub const STOCK_MASTER_SAVE: &str = "stock-master-save";
    pub const STOCK_MOVE_SAVE: &str = "stock-move-save";
}

/// Mapping from logical operation keys to network paths.
///
/// Callers supply only keys, never raw paths; the request pipeline resolves
/// them here and rejects path-like keys outright. The designated
/// initialization key is the one endpoint that is dispatched without the
/// business-identity headers, since it is what produces the communication
/// key those headers carry.
#[derive(Debug, Clone)]
pub struct EndpointMap {
    paths: BTreeMap<String, String>,
    init_key: String,
}

impl EndpointMap {
    /// Create an empty map with the given initialization key
    pub fn new(init_key: impl Into<String>) -> Self {
        EndpointMap {
            paths: BTreeMap::new(),
            init_key: init_key.into(),
        }
    }

    /// Register an endpoint key
    pub fn with(mut self, key: impl Into<String>, path: impl Into<String>) -> Self {
        self.paths.insert(key.into(), path.into());
        self
    }

    /// Resolve a key to its network path
    pub fn get(&self, key: &str) -> Option<&str> {
        self.paths.get(key).map(String::as_str)
    }

    /// Check whether a key names the initialization endpoint
    pub fn is_init(&self, key: &str) -> bool {
        self.init_key == key
    }

    /// Registered keys, in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }
}

impl Default for EndpointMap {
    /// The standard endpoint table for the transaction API
    fn default() -> Self {
        EndpointMap::new(keys::DEVICE_INIT)
            .with(keys::DEVICE_INIT, "/selectInitOsdcInfo")
            .with(keys::CODE_LIST, "/selectCodeList")
            .with(keys::ITEM_SAVE, "/saveItem")
            .with(keys::ITEM_LIST, "/selectItemList")
            .with(keys::BRANCH_LIST, "/selectBhfList")
            .with(keys::BRANCH_CUSTOMER_SAVE, "/saveBhfCustomer")
            .with(keys::SALES_SAVE, "/saveTrnsSalesOsdc")
            .with(keys::PURCHASE_LIST, "/selectTrnsPurchaseSalesList")
            .with(keys::PURCHASE_SAVE, "/insertTrnsPurchase")
            .with(keys::STOCK_MASTER_SAVE, "/saveStockMaster")
            .with(keys::STOCK_MOVE_SAVE, "/insertStockIO")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_resolves_keys() {
        let map = EndpointMap::default();
        assert_eq!(map.get(keys::DEVICE_INIT), Some("/selectInitOsdcInfo"));
        assert_eq!(map.get(keys::SALES_SAVE), Some("/saveTrnsSalesOsdc"));
        assert_eq!(map.get("no-such-key"), None);
    }

    #[test]
    fn test_init_key_designation() {
        let map = EndpointMap::default();
        assert!(map.is_init(keys::DEVICE_INIT));
        assert!(!map.is_init(keys::SALES_SAVE));
    }

    #[test]
    fn test_custom_table() {
        let map = EndpointMap::new("boot")
            .with("boot", "/boot")
            .with("ping", "/ping");
        assert_eq!(map.get("ping"), Some("/ping"));
        assert!(map.is_init("boot"));
        assert_eq!(map.keys().count(), 2);
    }
}
