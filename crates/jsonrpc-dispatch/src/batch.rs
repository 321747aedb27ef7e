//! Fan-out of parsed payloads to the dispatcher.

use futures::future::join_all;
use tracing::debug;

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::error::JsonRpcError;
use crate::parser::{ParsedItem, ParsedPayload};
use crate::response::{JsonRpcMessage, ResponsePayload};
use crate::types::RequestId;

/// Runs each item of a payload through the dispatcher and assembles the
/// outward payload. Items are independent; responses keep input order and
/// notifications leave no trace in the output.
#[derive(Debug, Clone)]
pub struct BatchCoordinator {
    dispatcher: Dispatcher,
    concurrent: bool,
    max_batch_size: Option<usize>,
}

impl BatchCoordinator {
    pub fn new(dispatcher: Dispatcher, config: &ServerConfig) -> Self {
        Self {
            dispatcher,
            concurrent: config.concurrent_batches,
            max_batch_size: config.max_batch_size,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn run(&self, payload: ParsedPayload) -> ResponsePayload {
        match payload {
            ParsedPayload::Single(item) => ResponsePayload::single(self.process_item(item).await),
            ParsedPayload::Batch(items) => self.run_batch(items).await,
        }
    }

    async fn run_batch(&self, items: Vec<ParsedItem>) -> ResponsePayload {
        if self.max_batch_size.is_some_and(|limit| items.len() > limit) {
            debug!(size = items.len(), limit = ?self.max_batch_size, "Batch exceeds size limit");
            return ResponsePayload::Single(JsonRpcError::invalid_request(RequestId::Null).into());
        }

        debug!(size = items.len(), concurrent = self.concurrent, "Processing batch");
        let responses = if self.concurrent {
            join_all(items.into_iter().map(|item| self.process_item(item))).await
        } else {
            let mut responses = Vec::with_capacity(items.len());
            for item in items {
                responses.push(self.process_item(item).await);
            }
            responses
        };

        ResponsePayload::batch(responses.into_iter().flatten().collect())
    }

    async fn process_item(&self, item: ParsedItem) -> Option<JsonRpcMessage> {
        match item {
            Ok(request) => self.dispatcher.dispatch(request).await,
            Err(invalid) => Some(invalid.into()),
        }
    }
}
