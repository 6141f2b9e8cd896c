//! AWS provider for ClusterFlow
//!
//! Reads cluster credentials from AWS Secrets Manager. The region comes from
//! the resource descriptor; account credentials come from the usual AWS
//! provider chain (environment, profile, instance role).
//!
//! Every Secrets Manager failure maps onto one `SecretError` variant and is
//! never retried here.

pub mod secrets;

pub use secrets::SecretsManagerStore;
