//! Response envelopes and pagination shared by the route handlers

pub mod pagination;
pub mod response;
