//! Business logic services.
//!
//! Services compose repositories and external clients into the operations the
//! HTTP layer calls. Each service borrows the shared pool; none owns state.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService};
pub use checkout::{CheckoutError, CheckoutService};
pub use orders::{OrderError, OrderService};
