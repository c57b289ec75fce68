//! Types shared across signing, transfer and listing.
//!
//! This module defines the operation kinds, sign requests, signed URLs and
//! transfer results.

mod common;
mod requests;
mod responses;

pub use common::*;
pub use requests::*;
pub use responses::*;
