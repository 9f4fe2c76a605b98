//! SQL DDL for initializing the database schema.
//! Applied statement by statement every time a connection opens, so every
//! statement must be idempotent.

/// SQLite schema includes:
/// - `products`, `reviews`, `users` (integer row ids, read-mostly)
/// - `exchange_rates` (one row per `currency`)
/// - `suppliers` (synthesized text id, one row per `externalId`)
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Catalog
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NULL,
    price REAL NULL,
    currency TEXT NULL,
    stock INTEGER NULL,
    category TEXT NULL,
    sellerId INTEGER NULL,
    imageUrl TEXT NULL,
    createdAt TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);

CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    productId INTEGER NOT NULL,
    userId INTEGER NULL,
    rating INTEGER NOT NULL,
    comment TEXT NULL,
    createdAt TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_reviews_product ON reviews(productId);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL,
    name TEXT NULL,
    role TEXT NULL,
    createdAt TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- ---------------------------------------------------------------------------
-- Exchange rates (natural key: currency)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS exchange_rates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    currency TEXT NOT NULL UNIQUE,
    rate REAL NOT NULL,
    isStable INTEGER NOT NULL DEFAULT 0,
    volatility REAL NOT NULL DEFAULT 0,
    lastUpdated TEXT NOT NULL -- RFC3339
);

-- ---------------------------------------------------------------------------
-- Suppliers (natural key: externalId)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS suppliers (
    id TEXT PRIMARY KEY NOT NULL, -- supp_<millis>_<base36>
    externalId TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    country TEXT NULL,
    contactEmail TEXT NULL,
    rating REAL NULL,
    createdAt TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updatedAt TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;
