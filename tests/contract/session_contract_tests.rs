//! Contract tests for the persisted session row.
//!
//! Other tools read `conversation_session` directly, so the stored state
//! codes and the `context_json` field names are part of the interface.

use std::sync::Arc;

use serde_json::{json, Value};

use order_intercom::models::money::Money;
use order_intercom::models::order::{OrderType, PaymentMethod};
use order_intercom::models::session::{CartLine, ConversationState, SessionContext};
use order_intercom::persistence::db;
use order_intercom::persistence::session_repo::SessionRepo;

const PHONE: &str = "5511988887777";

async fn stored_row(pool: &sqlx::SqlitePool) -> (String, Value) {
    let (state, context_json): (String, String) = sqlx::query_as(
        "SELECT current_state, context_json FROM conversation_session WHERE phone_number = ?1",
    )
    .bind(PHONE)
    .fetch_one(pool)
    .await
    .expect("session row");
    (state, serde_json::from_str(&context_json).expect("json context"))
}

#[tokio::test]
async fn context_is_stored_with_camel_case_fields() {
    let pool = Arc::new(db::connect_memory().await.expect("db"));
    let repo = SessionRepo::new(Arc::clone(&pool));

    let context = SessionContext {
        cart: vec![CartLine {
            product_id: "p-burger".into(),
            product_name: "X-Burger".into(),
            quantity: 2,
            unit_price: Money::from_cents(2500),
        }],
        selected_category: Some("cat-lanches".into()),
        customer_name: Some("Maria".into()),
        order_type: Some(OrderType::Delivery),
        delivery_address: Some("Rua A, 10".into()),
        payment_method: Some(PaymentMethod::Pix),
    };
    repo.save(PHONE, ConversationState::CheckoutPayment, &context)
        .await
        .expect("save");

    let (state, stored) = stored_row(&pool).await;
    assert_eq!(state, "CHECKOUT_PAYMENT");
    assert_eq!(
        stored,
        json!({
            "cart": [{
                "productId": "p-burger",
                "productName": "X-Burger",
                "quantity": 2,
                "price": 2500
            }],
            "selectedCategory": "cat-lanches",
            "customerName": "Maria",
            "orderType": "DELIVERY",
            "deliveryAddress": "Rua A, 10",
            "paymentMethod": "PIX"
        })
    );
}

#[tokio::test]
async fn first_contact_stores_welcome_with_empty_cart() {
    let pool = Arc::new(db::connect_memory().await.expect("db"));
    let repo = SessionRepo::new(Arc::clone(&pool));

    repo.get_or_create(PHONE).await.expect("create");

    let (state, stored) = stored_row(&pool).await;
    assert_eq!(state, "WELCOME");
    assert_eq!(stored, json!({ "cart": [] }));
}

#[tokio::test]
async fn externally_written_context_is_readable() {
    let pool = Arc::new(db::connect_memory().await.expect("db"));
    sqlx::query(
        "INSERT INTO conversation_session
             (phone_number, current_state, context_json, created_at, updated_at)
         VALUES (?1, 'CART', ?2, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
    )
    .bind(PHONE)
    .bind(r#"{"cart":[{"productId":"p1","productName":"Suco","quantity":1,"price":700}]}"#)
    .execute(pool.as_ref())
    .await
    .expect("insert");

    let session = SessionRepo::new(pool)
        .get_or_create(PHONE)
        .await
        .expect("load");
    assert_eq!(session.current_state, ConversationState::Cart);
    assert_eq!(session.context.cart.len(), 1);
    assert_eq!(session.context.cart[0].unit_price, Money::from_cents(700));
    assert!(session.context.customer_name.is_none());
}

#[tokio::test]
async fn unknown_state_code_is_rejected_by_schema() {
    let pool = db::connect_memory().await.expect("db");
    let result = sqlx::query(
        "INSERT INTO conversation_session
             (phone_number, current_state, context_json, created_at, updated_at)
         VALUES (?1, 'BROWSING', '{}', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
    )
    .bind(PHONE)
    .execute(&pool)
    .await;
    assert!(result.is_err());
}
