//! `SQLite` schema bootstrap logic.
//!
//! All table definitions use `CREATE TABLE IF NOT EXISTS` and are re-run
//! on every server startup.

use sqlx::SqlitePool;

use crate::Result;

/// Apply all table definitions to the connected `SQLite` database.
///
/// Creates the session, catalog, and order tables idempotently.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS conversation_session (
    phone_number    TEXT PRIMARY KEY NOT NULL,
    current_state   TEXT NOT NULL CHECK(current_state IN (
                        'WELCOME','MENU','CATEGORY','CHECKOUT_NAME','CHECKOUT_TYPE',
                        'CHECKOUT_ADDRESS','CHECKOUT_PAYMENT','CONFIRM','CART',
                        'AWAITING_ORDER_NUMBER')),
    context_json    TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS category (
    id              TEXT PRIMARY KEY NOT NULL,
    name            TEXT NOT NULL,
    display_order   INTEGER NOT NULL DEFAULT 0,
    active          INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS product (
    id              TEXT PRIMARY KEY NOT NULL,
    category_id     TEXT NOT NULL REFERENCES category(id),
    name            TEXT NOT NULL,
    description     TEXT,
    price_cents     INTEGER NOT NULL CHECK(price_cents >= 0),
    active          INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS customer_order (
    id                  TEXT PRIMARY KEY NOT NULL,
    order_number        INTEGER NOT NULL UNIQUE,
    channel             TEXT NOT NULL,
    order_type          TEXT NOT NULL CHECK(order_type IN ('PRESENCIAL','DELIVERY')),
    status              TEXT NOT NULL CHECK(status IN ('pending','confirmed','preparing','ready',
                            'out_for_delivery','delivered','cancelled')),
    customer_name       TEXT NOT NULL,
    phone               TEXT NOT NULL,
    delivery_address    TEXT,
    payment_method      TEXT NOT NULL CHECK(payment_method IN ('DINHEIRO','PIX','CARTAO')),
    subtotal_cents      INTEGER NOT NULL,
    delivery_fee_cents  INTEGER NOT NULL,
    total_cents         INTEGER NOT NULL,
    created_at          TEXT NOT NULL,
    CHECK(total_cents = subtotal_cents + delivery_fee_cents)
);

CREATE TABLE IF NOT EXISTS order_item (
    id                  TEXT PRIMARY KEY NOT NULL,
    order_id            TEXT NOT NULL REFERENCES customer_order(id),
    product_id          TEXT NOT NULL,
    product_name        TEXT NOT NULL,
    quantity            INTEGER NOT NULL CHECK(quantity > 0),
    unit_price_cents    INTEGER NOT NULL,
    total_price_cents   INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_product_category ON product(category_id);
CREATE INDEX IF NOT EXISTS idx_order_phone ON customer_order(phone);
CREATE INDEX IF NOT EXISTS idx_order_item_order ON order_item(order_id);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
