//! # Route Modules
//!
//! | Prefix        | Module       | Surface                         |
//! |---------------|--------------|---------------------------------|
//! | `/login`, `/validate` | [`auth`] | credential issue and check |
//! | `/patients/*` | [`patients`] | patient CRUD and provisioning   |

pub mod auth;
pub mod patients;
