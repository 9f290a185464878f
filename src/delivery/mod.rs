pub mod client;  // Supabase REST client
pub mod retry;

// Re-export commonly used types
pub use client::{DeliveryError, RecordSink, SupabaseClient};
pub use retry::{deliver_with_retry, RetryPolicy};
