// # Zone Provider Implementations
//
// Providers that ship with the core crate. Network-backed providers live in
// their own crates (see `ptrsync-provider-route53`).

pub mod memory;

pub use memory::{MemoryZoneProvider, SubmittedChange};
