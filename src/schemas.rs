use crate::error::{Error, Result};
use crate::schema::{Field, Rule, Schema};
use serde_json::Value;
use std::collections::BTreeMap;

/// Names of the registered payload schemas
pub mod names {
    pub const DEVICE_INIT: &str = "deviceInit";
    pub const CODE_SELECT: &str = "codeSelect";
    pub const ITEM_SAVE: &str = "itemSave";
    pub const ITEM_SELECT: &str = "itemSelect";
    pub const BRANCH_SELECT: &str = "branchSelect";
    pub const BRANCH_CUSTOMER_SAVE: &str = "branchCustomerSave";
    pub const SALES_SAVE: &str = "salesSave";
    pub const PURCHASE_SELECT: &str = "purchaseSelect";
    pub const PURCHASE_SAVE: &str = "purchaseSave";
    pub const STOCK_MASTER_SAVE: &str = "stockMasterSave";
    pub const STOCK_MOVE_SAVE: &str = "stockMoveSave";
}

const TIN_PATTERN: &str = r"^[A-Z]\d{9}[A-Z]$";
const TIMESTAMP_PATTERN: &str = r"^\d{14}$";
const DATE_PATTERN: &str = r"^\d{8}$";

/// Holds the immutable, named payload schemas, built once at startup.
///
/// Looking up a name that was never registered is a programming error
/// ([`Error::UnknownSchema`]), distinct from a payload failing validation.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Schema>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        SchemaRegistry {
            schemas: BTreeMap::new(),
        }
    }

    /// Create a registry holding the standard endpoint schemas
    pub fn with_defaults() -> Self {
        let mut registry = SchemaRegistry::new();
        registry.register(device_init());
        registry.register(code_select());
        registry.register(item_save());
        registry.register(date_select(names::ITEM_SELECT));
        registry.register(date_select(names::BRANCH_SELECT));
        registry.register(branch_customer_save());
        registry.register(sales_save());
        registry.register(date_select(names::PURCHASE_SELECT));
        registry.register(purchase_save());
        registry.register(stock_master_save());
        registry.register(stock_move_save());
        registry
    }

    /// Register a schema under its own name
    pub fn register(&mut self, schema: Schema) {
        self.schemas.insert(schema.name().to_string(), schema);
    }

    /// Look up a schema by name
    pub fn get(&self, name: &str) -> Result<&Schema> {
        self.schemas
            .get(name)
            .ok_or_else(|| Error::UnknownSchema(name.to_string()))
    }

    /// Validate a payload against the named schema, returning the
    /// normalized payload
    pub fn validate(&self, name: &str, payload: &Value) -> Result<Value> {
        self.get(name)?.validate(payload)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn device_init() -> Schema {
    Schema::new(names::DEVICE_INIT)
        .field("tin", Field::string().required().pattern(TIN_PATTERN))
        .field("bhfId", Field::string().required().min_len(2).max_len(2))
        .field("dvcSrlNo", Field::string().required().max_len(100))
}

fn code_select() -> Schema {
    Schema::new(names::CODE_SELECT)
        .field("lastReqDt", Field::string().required().pattern(TIMESTAMP_PATTERN))
}

/// The list/search endpoints all take a single watermark timestamp
fn date_select(name: &str) -> Schema {
    Schema::new(name)
        .field("lastReqDt", Field::string().required().pattern(TIMESTAMP_PATTERN))
}

fn item_save() -> Schema {
    Schema::new(names::ITEM_SAVE)
        .field("itemCd", Field::string().required().max_len(20))
        .field("itemClsCd", Field::string().required().max_len(10))
        .field("itemTyCd", Field::string().required().allowed(["1", "2", "3"]))
        .field("itemNm", Field::string().required().max_len(200))
        .field("itemStdNm", Field::string().max_len(200))
        .field("orgnNatCd", Field::string().min_len(2).max_len(2))
        .field("pkgUnitCd", Field::string().required().max_len(5))
        .field("qtyUnitCd", Field::string().required().max_len(5))
        .field(
            "taxTyCd",
            Field::string().required().allowed(["A", "B", "C", "D", "E"]),
        )
        .field("btchNo", Field::string().max_len(10))
        .field("bcd", Field::string().max_len(20))
        .field("dftPrc", Field::number().required().min(0.0))
        .field("isrcAplcbYn", Field::string().required().allowed(["Y", "N"]))
        .field("useYn", Field::string().required().allowed(["Y", "N"]))
}

fn branch_customer_save() -> Schema {
    Schema::new(names::BRANCH_CUSTOMER_SAVE)
        .field("custNo", Field::string().required().max_len(9))
        .field("custTin", Field::string().required().pattern(TIN_PATTERN))
        .field("custNm", Field::string().required().max_len(60))
        .field("adrs", Field::string().max_len(200))
        .field("telNo", Field::string().max_len(20))
        .field("email", Field::string().max_len(40))
        .field("useYn", Field::string().required().allowed(["Y", "N"]))
}

fn sales_item() -> Schema {
    Schema::new("salesItem")
        .field("itemSeq", Field::integer().required().min(1.0))
        .field("itemCd", Field::string().required().max_len(20))
        .field("itemClsCd", Field::string().max_len(10))
        .field("itemNm", Field::string().required().max_len(200))
        .field("pkgUnitCd", Field::string().max_len(5))
        .field("qtyUnitCd", Field::string().max_len(5))
        .field("qty", Field::number().required().min(0.0))
        .field("prc", Field::number().required().min(0.0))
        .field("splyAmt", Field::number().required())
        .field("dcRt", Field::number().min(0.0).max(100.0))
        .field("dcAmt", Field::number().min(0.0))
        .field(
            "taxTyCd",
            Field::string().required().allowed(["A", "B", "C", "D", "E"]),
        )
        .field("taxblAmt", Field::number().required())
        .field("taxAmt", Field::number().required())
        .field("totAmt", Field::number().required())
}

fn sales_save() -> Schema {
    Schema::new(names::SALES_SAVE)
        .field("invcNo", Field::integer().required().min(1.0))
        .field("orgInvcNo", Field::integer().min(0.0))
        .field("custTin", Field::string().pattern(TIN_PATTERN))
        .field("custNm", Field::string().max_len(60))
        .field("salesTyCd", Field::string().required().allowed(["N", "C", "P"]))
        .field("rcptTyCd", Field::string().required().allowed(["S", "R"]))
        .field(
            "pmtTyCd",
            Field::string()
                .required()
                .allowed(["01", "02", "03", "04", "05", "06", "07"]),
        )
        .field("salesSttsCd", Field::string().required().allowed(["01", "02", "05"]))
        .field("cfmDt", Field::string().required().pattern(TIMESTAMP_PATTERN))
        .field("salesDt", Field::string().required().pattern(DATE_PATTERN))
        .field("totItemCnt", Field::integer().required().min(1.0))
        .field("totTaxblAmt", Field::number().required().min(0.0))
        .field("totTaxAmt", Field::number().required().min(0.0))
        .field("totAmt", Field::number().required().min(0.0))
        .field("remark", Field::string().max_len(400))
        .field("itemList", Field::array(Field::object(sales_item())).required())
        .rule(Rule::min_items("itemList", 1))
        // refund receipts must reference the original invoice
        .rule(Rule::required_if("orgInvcNo", "rcptTyCd", "R"))
}

fn purchase_item() -> Schema {
    Schema::new("purchaseItem")
        .field("itemSeq", Field::integer().required().min(1.0))
        .field("itemCd", Field::string().required().max_len(20))
        .field("itemNm", Field::string().required().max_len(200))
        .field("qty", Field::number().required().min(0.0))
        .field("prc", Field::number().required().min(0.0))
        .field("splyAmt", Field::number().required())
        .field(
            "taxTyCd",
            Field::string().required().allowed(["A", "B", "C", "D", "E"]),
        )
        .field("taxblAmt", Field::number().required())
        .field("taxAmt", Field::number().required())
        .field("totAmt", Field::number().required())
}

fn purchase_save() -> Schema {
    Schema::new(names::PURCHASE_SAVE)
        .field("invcNo", Field::integer().required().min(1.0))
        .field("orgInvcNo", Field::integer().min(0.0))
        .field("spplrTin", Field::string().pattern(TIN_PATTERN))
        .field("spplrNm", Field::string().max_len(60))
        .field("regTyCd", Field::string().required().allowed(["M", "A"]))
        .field("pchsTyCd", Field::string().required().allowed(["N", "C", "R"]))
        .field("pchsSttsCd", Field::string().required().allowed(["01", "02", "05"]))
        .field("pchsDt", Field::string().required().pattern(DATE_PATTERN))
        .field("totItemCnt", Field::integer().required().min(1.0))
        .field("totTaxblAmt", Field::number().required().min(0.0))
        .field("totTaxAmt", Field::number().required().min(0.0))
        .field("totAmt", Field::number().required().min(0.0))
        .field("itemList", Field::array(Field::object(purchase_item())).required())
        .rule(Rule::min_items("itemList", 1))
}

fn stock_master_save() -> Schema {
    Schema::new(names::STOCK_MASTER_SAVE)
        .field("itemCd", Field::string().required().max_len(20))
        .field("rsdQty", Field::number().required().min(0.0))
}

fn stock_item() -> Schema {
    Schema::new("stockItem")
        .field("itemSeq", Field::integer().required().min(1.0))
        .field("itemCd", Field::string().required().max_len(20))
        .field("itemNm", Field::string().required().max_len(200))
        .field("qty", Field::number().required().min(0.0))
        .field("prc", Field::number().required().min(0.0))
        .field("splyAmt", Field::number().required())
        .field("totAmt", Field::number().required())
}

fn stock_move_save() -> Schema {
    Schema::new(names::STOCK_MOVE_SAVE)
        .field("sarNo", Field::integer().required().min(1.0))
        .field("orgSarNo", Field::integer().min(0.0))
        .field(
            "sarTyCd",
            Field::string()
                .required()
                .allowed(["01", "02", "03", "04", "05", "06", "11", "12", "13"]),
        )
        .field("ocrnDt", Field::string().required().pattern(DATE_PATTERN))
        .field("totItemCnt", Field::integer().required().min(1.0))
        .field("totTaxblAmt", Field::number().min(0.0))
        .field("totTaxAmt", Field::number().min(0.0))
        .field("totAmt", Field::number().required().min(0.0))
        .field("remark", Field::string().max_len(400))
        .field("itemList", Field::array(Field::object(stock_item())).required())
        .rule(Rule::min_items("itemList", 1))
}
