// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod error;
pub mod feed;
pub mod filter;
pub mod forms;
pub mod ids;
pub mod location;
pub mod model;
pub mod money;
pub mod nav;
pub mod session;
pub mod state;

pub use error::*;
pub use feed::*;
pub use filter::*;
pub use forms::*;
pub use ids::*;
pub use location::*;
pub use model::*;
pub use nav::*;
pub use session::*;
pub use state::*;
