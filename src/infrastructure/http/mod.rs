//! HTTP ingress infrastructure.

pub mod ingress;
