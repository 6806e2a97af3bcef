// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod browse;
pub mod catalog;
pub mod credential;
pub mod error;
pub mod model;
pub mod search;
pub mod state;

pub use browse::*;
pub use catalog::*;
pub use credential::*;
pub use error::*;
pub use model::*;
pub use search::*;
pub use state::*;
