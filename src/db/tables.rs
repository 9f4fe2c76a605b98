use chrono::Utc;
use rand::Rng;
use serde_json::Value;

use crate::db::value::Record;
use crate::error::ShimError;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// How a table's `id` column gets its value on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// `INTEGER PRIMARY KEY`; the store assigns it.
    RowId,
    /// Text id synthesized before insert as `<prefix>_<epoch-millis>_<9 base36 chars>`.
    Synthesized { prefix: &'static str },
}

/// The fixed set of tables the shim knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Product,
    ExchangeRate,
    Review,
    User,
    Supplier,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Product,
        Table::ExchangeRate,
        Table::Review,
        Table::User,
        Table::Supplier,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Product => "products",
            Table::ExchangeRate => "exchange_rates",
            Table::Review => "reviews",
            Table::User => "users",
            Table::Supplier => "suppliers",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Product => &[
                "id",
                "name",
                "description",
                "price",
                "currency",
                "stock",
                "category",
                "sellerId",
                "imageUrl",
                "createdAt",
            ],
            Table::ExchangeRate => &[
                "id",
                "currency",
                "rate",
                "isStable",
                "volatility",
                "lastUpdated",
            ],
            Table::Review => &["id", "productId", "userId", "rating", "comment", "createdAt"],
            Table::User => &["id", "email", "name", "role", "createdAt"],
            Table::Supplier => &[
                "id",
                "externalId",
                "name",
                "country",
                "contactEmail",
                "rating",
                "createdAt",
                "updatedAt",
            ],
        }
    }

    /// Column used for upserts; `None` means the table cannot be upserted.
    pub fn natural_key(self) -> Option<&'static str> {
        match self {
            Table::ExchangeRate => Some("currency"),
            Table::Supplier => Some("externalId"),
            Table::Product | Table::Review | Table::User => None,
        }
    }

    pub fn id_strategy(self) -> IdStrategy {
        match self {
            Table::Supplier => IdStrategy::Synthesized { prefix: "supp" },
            _ => IdStrategy::RowId,
        }
    }

    /// Column bumped to `CURRENT_TIMESTAMP` when an upsert takes the update branch.
    pub fn updated_at_column(self) -> Option<&'static str> {
        match self {
            Table::Supplier => Some("updatedAt"),
            _ => None,
        }
    }

    /// Resolves a caller-supplied column name to the table's own identifier.
    pub fn column(self, name: &str) -> Result<&'static str, ShimError> {
        self.columns()
            .iter()
            .copied()
            .find(|c| *c == name)
            .ok_or_else(|| ShimError::UnknownColumn {
                table: self.name(),
                column: name.to_string(),
            })
    }

    /// Inserts a synthesized `id` into `data` when the table needs one and the caller gave none.
    pub fn assign_generated_id(self, data: &mut Record) {
        if let IdStrategy::Synthesized { prefix } = self.id_strategy()
            && data.get("id").is_none_or(Value::is_null)
        {
            data.insert("id".to_string(), Value::String(synthesize_id(prefix)));
        }
    }
}

pub(crate) fn synthesize_id(prefix: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect();
    format!("{prefix}_{}_{suffix}", Utc::now().timestamp_millis())
}
