// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod backend;
mod memory;
mod sqlite;

pub use backend::{CertificateStore, StoreError, StoreErrorCode};
pub use memory::MemoryCertificateStore;
pub use sqlite::{SqliteCertificateStore, SCHEMA_SQL};

pub const CRATE_NAME: &str = "certval-store";
