pub mod checkout;
pub mod models;
pub mod orchestrator;
pub mod repository;

pub use checkout::{CheckoutAttempt, CheckoutState, CustomerDetails};
pub use models::{mint_order_id, NewOrder, NewOrderItem, Order, OrderItem, OrderStatus};
pub use orchestrator::{CheckoutError, CheckoutOrchestrator, CheckoutPolicy, FinalizeOutcome, ReturnUrls};
pub use repository::{InMemoryOrderLedger, OrderRepository};
