// Billing: hosted checkout, billing portal, and the subscription mirror kept in
// sync by signed provider webhooks.
// All payment provider calls go through `provider::BillingProvider`.

pub mod handlers;
pub mod provider;
pub mod store;
pub mod webhook;
