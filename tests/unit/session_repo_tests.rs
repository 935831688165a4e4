use std::sync::Arc;

use order_intercom::models::money::Money;
use order_intercom::models::order::OrderType;
use order_intercom::models::session::{ConversationState, SessionContext};
use order_intercom::persistence::{db, session_repo::SessionRepo};

const PHONE: &str = "5511988887777";

/// In-memory `connect_memory()` creates every table.
#[tokio::test]
async fn in_memory_connect_creates_all_tables() {
    let pool = db::connect_memory()
        .await
        .expect("in-memory connect should succeed");

    let tables = [
        "conversation_session",
        "category",
        "product",
        "customer_order",
        "order_item",
    ];

    for table in tables {
        let query = format!("SELECT COUNT(*) AS cnt FROM {table}");
        let row: (i64,) = sqlx::query_as(&query)
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("table '{table}' should be queryable: {e}"));
        assert_eq!(row.0, 0, "table '{table}' should start empty");
    }
}

#[tokio::test]
async fn schema_bootstrap_is_idempotent() {
    let pool = db::connect_memory().await.expect("db connect");
    order_intercom::persistence::schema::bootstrap_schema(&pool)
        .await
        .expect("second bootstrap");
}

#[tokio::test]
async fn first_contact_creates_welcome_session() {
    let repo = SessionRepo::new(Arc::new(db::connect_memory().await.expect("db connect")));

    assert!(repo.get(PHONE).await.expect("get").is_none());

    let session = repo.get_or_create(PHONE).await.expect("create");
    assert_eq!(session.phone_number, PHONE);
    assert_eq!(session.current_state, ConversationState::Welcome);
    assert!(session.context.cart_is_empty());
}

#[tokio::test]
async fn get_or_create_does_not_overwrite_existing_session() {
    let repo = SessionRepo::new(Arc::new(db::connect_memory().await.expect("db connect")));
    repo.save(PHONE, ConversationState::Menu, &SessionContext::default())
        .await
        .expect("save");

    let session = repo.get_or_create(PHONE).await.expect("get_or_create");
    assert_eq!(session.current_state, ConversationState::Menu);
}

#[tokio::test]
async fn save_overwrites_state_and_context() {
    let repo = SessionRepo::new(Arc::new(db::connect_memory().await.expect("db connect")));
    repo.get_or_create(PHONE).await.expect("create");

    let mut context = SessionContext {
        customer_name: Some("Maria".into()),
        order_type: Some(OrderType::Delivery),
        delivery_address: Some("Rua das Flores, 123".into()),
        ..SessionContext::default()
    };
    context.add_to_cart("p1", "X-Burger", Money::from_cents(2_500));

    repo.save(PHONE, ConversationState::CheckoutPayment, &context)
        .await
        .expect("save");

    let loaded = repo.get(PHONE).await.expect("get").expect("exists");
    assert_eq!(loaded.current_state, ConversationState::CheckoutPayment);
    assert_eq!(loaded.context, context);
    assert!(loaded.updated_at >= loaded.created_at);
}

#[tokio::test]
async fn last_write_wins() {
    let repo = SessionRepo::new(Arc::new(db::connect_memory().await.expect("db connect")));

    let mut first = SessionContext::default();
    first.add_to_cart("p1", "X-Burger", Money::from_cents(2_500));
    repo.save(PHONE, ConversationState::Category, &first)
        .await
        .expect("first save");
    repo.save(PHONE, ConversationState::Welcome, &SessionContext::default())
        .await
        .expect("second save");

    let loaded = repo.get(PHONE).await.expect("get").expect("exists");
    assert_eq!(loaded.current_state, ConversationState::Welcome);
    assert!(loaded.context.cart_is_empty());
}

#[tokio::test]
async fn sessions_are_isolated_per_phone() {
    let repo = SessionRepo::new(Arc::new(db::connect_memory().await.expect("db connect")));
    repo.save(PHONE, ConversationState::Cart, &SessionContext::default())
        .await
        .expect("save");

    let other = repo.get_or_create("5521977776666").await.expect("create");
    assert_eq!(other.current_state, ConversationState::Welcome);
}

#[tokio::test]
async fn corrupt_context_is_a_db_error() {
    let pool = Arc::new(db::connect_memory().await.expect("db connect"));
    sqlx::query(
        "INSERT INTO conversation_session
             (phone_number, current_state, context_json, created_at, updated_at)
         VALUES (?1, 'WELCOME', 'not json', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
    )
    .bind(PHONE)
    .execute(pool.as_ref())
    .await
    .expect("raw insert");

    let repo = SessionRepo::new(pool);
    assert!(matches!(
        repo.get(PHONE).await,
        Err(order_intercom::AppError::Db(_))
    ));
}
