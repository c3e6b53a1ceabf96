pub mod completion_url;
pub mod in_memory_transaction_store;
pub mod postgres_transaction_store;

pub use completion_url::TemplateCompletionUrl;
pub use in_memory_transaction_store::InMemoryTransactionStore;
pub use postgres_transaction_store::PostgresTransactionStore;
