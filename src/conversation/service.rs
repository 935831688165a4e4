//! Per-message pipeline: load session → intercept or step → save.

use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use super::engine::Engine;
use super::interceptor::Interceptor;
use super::{CatalogGateway, OrderLookup, OrderSink, Turn};
use crate::config::GlobalConfig;
use crate::models::money::Money;
use crate::persistence::catalog_repo::CatalogRepo;
use crate::persistence::db::Database;
use crate::persistence::order_repo::OrderRepo;
use crate::persistence::session_repo::SessionRepo;
use crate::Result;

/// Drives one conversational turn against durable session state.
///
/// Holds no per-phone state of its own: every call reads the session,
/// computes the turn, and overwrites the session.
#[derive(Clone)]
pub struct ConversationService {
    sessions: SessionRepo,
    catalog: Arc<dyn CatalogGateway>,
    orders: Arc<dyn OrderSink>,
    lookup: Arc<dyn OrderLookup>,
    delivery_fee: Money,
    status_page_size: u32,
}

impl ConversationService {
    /// Assemble a service from explicit collaborators.
    #[must_use]
    pub fn new(
        sessions: SessionRepo,
        catalog: Arc<dyn CatalogGateway>,
        orders: Arc<dyn OrderSink>,
        lookup: Arc<dyn OrderLookup>,
        delivery_fee: Money,
        status_page_size: u32,
    ) -> Self {
        Self {
            sessions,
            catalog,
            orders,
            lookup,
            delivery_fee,
            status_page_size,
        }
    }

    /// Assemble a service backed entirely by the `SQLite` pool.
    #[must_use]
    pub fn from_db(db: &Arc<Database>, config: &GlobalConfig) -> Self {
        let order_repo = Arc::new(OrderRepo::new(Arc::clone(db)));
        Self::new(
            SessionRepo::new(Arc::clone(db)),
            Arc::new(CatalogRepo::new(Arc::clone(db))),
            Arc::clone(&order_repo) as Arc<dyn OrderSink>,
            order_repo,
            Money::from_cents(config.delivery_fee_cents),
            config.status_page_size,
        )
    }

    /// Process one inbound message and persist the resulting session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the session cannot be loaded or saved, or
    /// a catalog/order query fails. The session is left untouched on error.
    pub async fn handle_message(&self, phone: &str, message: &str) -> Result<Turn> {
        let span = info_span!("conversation_turn", phone = %phone);
        async move {
            let session = self.sessions.get_or_create(phone).await?;
            let state = session.current_state;

            let interceptor = Interceptor::new(self.lookup.as_ref(), self.status_page_size);
            let turn = match interceptor
                .intercept(phone, state, &session.context, message)
                .await?
            {
                Some(turn) => turn,
                None => {
                    let engine =
                        Engine::new(self.catalog.as_ref(), self.orders.as_ref(), self.delivery_fee);
                    engine.step(phone, state, session.context, message).await?
                }
            };

            self.sessions
                .save(phone, turn.state, &turn.context)
                .await?;

            info!(from = %state, to = %turn.state, "turn processed");
            Ok(turn)
        }
        .instrument(span)
        .await
    }
}
